use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mission_core::{
    location_label, markup, read_mission, validate, ArchiveReader, FsStorage, Highlighter,
    LineHighlight, LuaCompiler, Mission, MissionModel, PlacedObject, ScriptDocument, TomlCatalog,
    DEFAULT_SCRIPT,
};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Open Horizon mission tool")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty mission with the default script.
    New {
        path: PathBuf,
        #[arg(short, long)]
        location: String,
    },
    /// Print the location, objects and archive members of a mission.
    Info {
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Compile the mission script. Exits with 1 when it does not compile.
    Check { path: PathBuf },
    /// Print the script with the color class of every span.
    Highlight { path: PathBuf },
    /// Extract every archive member into a directory.
    Unpack {
        path: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Build a mission archive from an objects file and an optional script.
    Pack {
        path: PathBuf,
        #[arg(long)]
        objects: PathBuf,
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// List the locations of a catalog file.
    Locations {
        #[arg(long)]
        catalog: PathBuf,
    },
}

#[derive(Serialize)]
struct MissionInfo<'a> {
    location: &'a str,
    objects: &'a [PlacedObject],
    members: Vec<String>,
    script_lines: usize,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::New { path, location } => new_mission(&path, &location)?,
        Command::Info { path, json } => print_info(&path, json)?,
        Command::Check { path } => {
            if !check_script(&path)? {
                return Ok(ExitCode::from(1));
            }
        }
        Command::Highlight { path } => print_highlight(&path)?,
        Command::Unpack { path, output } => unpack(&path, &output)?,
        Command::Pack {
            path,
            objects,
            script,
        } => pack(&path, &objects, script.as_deref())?,
        Command::Locations { catalog } => list_locations(&catalog)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

fn new_mission(path: &Path, location: &str) -> Result<()> {
    let mut model = MissionModel::new();
    model.new_mission(location)?;
    ensure_parent(path)?;
    model.save_as(&FsStorage, path)?;
    info!(path = %path.display(), "mission created");
    Ok(())
}

fn print_info(path: &Path, json: bool) -> Result<()> {
    let mission = read_mission(&FsStorage, path)?;
    let members = ArchiveReader::open(&FsStorage, path)?.member_names();
    let info = MissionInfo {
        location: &mission.location_id,
        objects: &mission.objects,
        members,
        script_lines: mission.script_source.lines().count(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("location: {}", info.location);
    println!("members:  {}", info.members.join(", "));
    println!("script:   {} lines", info.script_lines);
    println!("objects:  {}", info.objects.len());
    for label in mission.object_labels() {
        println!("  {label}");
    }
    Ok(())
}

/// Returns whether the script compiles.
fn check_script(path: &Path) -> Result<bool> {
    let mission = read_mission(&FsStorage, path)?;
    let diagnostic = validate(&LuaCompiler::new(), &mission.script_source);
    if diagnostic.is_clean() {
        println!("{}: ok", path.display());
    } else {
        println!("{}: {}", path.display(), diagnostic.message);
    }
    Ok(diagnostic.is_clean())
}

fn describe_spans(highlight: &LineHighlight) -> String {
    highlight
        .spans
        .iter()
        .map(|span| {
            format!(
                "{}@{}..{}",
                span.class.label(),
                span.range.start,
                span.range.end
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_highlight(path: &Path) -> Result<()> {
    let mission = read_mission(&FsStorage, path)?;
    let document = ScriptDocument::with_text(Highlighter::lua(), &mission.script_source);
    for (index, (line, highlight)) in document
        .lines()
        .zip(document.highlights())
        .enumerate()
    {
        println!("{:>4} | {line}", index + 1);
        if !highlight.spans.is_empty() {
            println!("     | {}", describe_spans(highlight));
        }
    }
    Ok(())
}

/// Member names are flattened to their file name so nothing escapes `output`.
/// Two members that flatten to the same file are rejected before anything is written.
fn member_target(output: &Path, member: &str) -> Result<PathBuf> {
    match Path::new(member).file_name() {
        Some(name) => Ok(output.join(name)),
        None => bail!("archive member '{member}' has no file name"),
    }
}

fn unpack(path: &Path, output: &Path) -> Result<()> {
    let mut reader = ArchiveReader::open(&FsStorage, path)?;
    let mut targets = BTreeMap::new();
    for member in reader.member_names() {
        let target = member_target(output, &member)?;
        if let Some(previous) = targets.get(&target) {
            bail!(
                "archive members '{previous}' and '{member}' both unpack to {}",
                target.display()
            );
        }
        targets.insert(target, member);
    }

    fs::create_dir_all(output).with_context(|| format!("create {}", output.display()))?;
    for (target, member) in targets {
        let bytes = reader.read_member(&member)?;
        fs::write(&target, bytes).with_context(|| format!("write {}", target.display()))?;
        debug!(member = %member, target = %target.display(), "member extracted");
    }
    Ok(())
}

fn pack(path: &Path, objects: &Path, script: Option<&Path>) -> Result<()> {
    let markup_text =
        fs::read_to_string(objects).with_context(|| format!("read {}", objects.display()))?;
    let data = markup::decode(&markup_text)
        .with_context(|| format!("parse {}", objects.display()))?;
    let script_source = match script {
        Some(script) => {
            fs::read_to_string(script).with_context(|| format!("read {}", script.display()))?
        }
        None => DEFAULT_SCRIPT.to_string(),
    };

    let mut model = MissionModel::new();
    model.load(
        Mission {
            location_id: data.location_id,
            objects: data.objects,
            script_source,
        },
        None,
    )?;
    ensure_parent(path)?;
    model.save_as(&FsStorage, path)?;
    info!(path = %path.display(), objects = model.objects().len(), "mission packed");
    Ok(())
}

fn list_locations(catalog: &Path) -> Result<()> {
    let catalog = TomlCatalog::load(catalog)?;
    for entry in &catalog.locations {
        println!("{}", location_label(entry));
    }
    Ok(())
}
