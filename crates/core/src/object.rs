use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Heading angle. Held in degrees so the persisted form round-trips exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle {
    degrees: f32,
}

impl Angle {
    pub fn from_degrees(degrees: f32) -> Self {
        Self { degrees }
    }

    pub fn from_radians(radians: f32) -> Self {
        Self {
            degrees: radians.to_degrees(),
        }
    }

    pub fn degrees(self) -> f32 {
        self.degrees
    }

    pub fn radians(self) -> f32 {
        self.degrees.to_radians()
    }
}

/// One object placed in a mission.
///
/// `position.y` is the true world height. `editor_vertical_offset` is the
/// editor's display anchor and is added to `y` only in the persisted form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub name: String,
    pub type_id: String,
    pub position: Position,
    pub yaw: Angle,
    pub editor_vertical_offset: f32,
}

impl PlacedObject {
    pub fn new(name: impl Into<String>, type_id: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            type_id: type_id.into(),
            position,
            yaw: Angle::default(),
            editor_vertical_offset: 0.0,
        }
    }

    pub fn with_yaw(mut self, yaw: Angle) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn with_editor_offset(mut self, offset: f32) -> Self {
        self.editor_vertical_offset = offset;
        self
    }

    /// Height written to the `y` attribute.
    ///
    /// Summed in f64 so that subtracting the offset again gives back `position.y` exactly.
    pub fn stored_y(&self) -> f64 {
        f64::from(self.position.y) + f64::from(self.editor_vertical_offset)
    }

    /// Label shown in object listings, e.g. `alpha (f14d)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.type_id)
    }
}
