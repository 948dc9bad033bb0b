mod config;
pub mod editor;

pub use config::{EditorConfig, ResolvedConfig};
pub use editor::{EditorError, MissionEditor};
