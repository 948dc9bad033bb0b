//! Object placement markup stored in the `objects.xml` member.
//!
//! ```xml
//! <!--Open Horizon mission-->
//! <mission location="ocean01">
//!     <object name="N" id="TYPE" x="F" y="F" z="F" yaw="F" editor_y="F"/>
//! </mission>
//! ```
//!
//! The root must name a location. Object attributes are lenient: anything
//! missing or unparseable reads as empty text or zero, so hand-edited files
//! still load.

use std::io;
use std::str::FromStr;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::archive::OBJECTS_MEMBER;
use crate::error::{MissionError, MissionResult};
use crate::object::{Angle, PlacedObject, Position};

const HEADER_COMMENT: &str = "Open Horizon mission";
const ROOT_ELEMENT: &str = "mission";
const OBJECT_ELEMENT: &str = "object";
const LOCATION_ATTR: &str = "location";

/// Decoded contents of the markup member.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectData {
    pub location_id: String,
    pub objects: Vec<PlacedObject>,
}

fn write_error(err: impl std::fmt::Display) -> MissionError {
    MissionError::write_failed(OBJECTS_MEMBER, io::Error::new(io::ErrorKind::Other, err.to_string()))
}

fn malformed(message: impl Into<String>) -> MissionError {
    MissionError::MalformedMission(message.into())
}

/// Renders the markup for a location and its objects.
///
/// Floats use the shortest representation that parses back to the same value.
pub fn encode(location_id: &str, objects: &[PlacedObject]) -> MissionResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    writer
        .write_event(Event::Comment(BytesText::new(HEADER_COMMENT)))
        .map_err(write_error)?;

    let root = BytesStart::new(ROOT_ELEMENT).with_attributes([(LOCATION_ATTR, location_id)]);
    writer.write_event(Event::Start(root)).map_err(write_error)?;

    for object in objects {
        let x = object.position.x.to_string();
        let y = object.stored_y().to_string();
        let z = object.position.z.to_string();
        let yaw = object.yaw.degrees().to_string();
        let editor_y = object.editor_vertical_offset.to_string();
        let element = BytesStart::new(OBJECT_ELEMENT).with_attributes([
            ("name", object.name.as_str()),
            ("id", object.type_id.as_str()),
            ("x", x.as_str()),
            ("y", y.as_str()),
            ("z", z.as_str()),
            ("yaw", yaw.as_str()),
            ("editor_y", editor_y.as_str()),
        ]);
        writer.write_event(Event::Empty(element)).map_err(write_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
        .map_err(write_error)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(write_error)
}

fn read_attributes(element: &BytesStart<'_>) -> MissionResult<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|err| malformed(err.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|err| malformed(err.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

fn lookup<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn number<T: FromStr + Default>(attributes: &[(String, String)], key: &str) -> T {
    lookup(attributes, key)
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or_default()
}

fn decode_root(element: &BytesStart<'_>) -> MissionResult<String> {
    let attributes = read_attributes(element)?;
    match lookup(&attributes, LOCATION_ATTR) {
        Some(location) if !location.is_empty() => Ok(location.to_string()),
        Some(_) => Err(malformed("root 'location' attribute is empty")),
        None => Err(malformed("root has no 'location' attribute")),
    }
}

fn decode_object(element: &BytesStart<'_>) -> MissionResult<PlacedObject> {
    let attributes = read_attributes(element)?;
    let editor_vertical_offset: f32 = number(&attributes, "editor_y");
    // `y` carries the offset and is written with f64 precision, so the subtraction is exact.
    let stored_y: f64 = number(&attributes, "y");
    Ok(PlacedObject {
        name: lookup(&attributes, "name").unwrap_or_default().to_string(),
        type_id: lookup(&attributes, "id").unwrap_or_default().to_string(),
        position: Position {
            x: number(&attributes, "x"),
            y: (stored_y - f64::from(editor_vertical_offset)) as f32,
            z: number(&attributes, "z"),
        },
        yaw: Angle::from_degrees(number(&attributes, "yaw")),
        editor_vertical_offset,
    })
}

/// Parses the markup member. No partial result is returned on error.
pub fn decode(text: &str) -> MissionResult<ObjectData> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut location_id: Option<String> = None;
    let mut objects = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|err| {
            malformed(format!(
                "objects markup at byte {}: {err}",
                reader.buffer_position()
            ))
        })?;
        match event {
            Event::Start(element) => {
                visit(&element, depth, &mut location_id, &mut objects)?;
                depth += 1;
            }
            Event::Empty(element) => {
                visit(&element, depth, &mut location_id, &mut objects)?;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 && location_id.is_some() {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let location_id = location_id.ok_or_else(|| malformed("document has no root element"))?;
    Ok(ObjectData {
        location_id,
        objects,
    })
}

fn visit(
    element: &BytesStart<'_>,
    depth: usize,
    location_id: &mut Option<String>,
    objects: &mut Vec<PlacedObject>,
) -> MissionResult<()> {
    match (depth, location_id.is_some()) {
        (0, false) => *location_id = Some(decode_root(element)?),
        (1, true) if element.name().as_ref() == OBJECT_ELEMENT.as_bytes() => {
            objects.push(decode_object(element)?)
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/markup_tests.rs"]
mod tests;
