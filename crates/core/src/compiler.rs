//! Script compiler collaborator.
//!
//! The editor never looks inside the scripting language; it hands the whole
//! text to a [`ScriptCompiler`] and shows whatever message comes back.

use serde::{Deserialize, Serialize};

/// Result of one validation pass. An empty message means the script compiles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
}

impl Diagnostic {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.message.is_empty()
    }
}

pub trait ScriptCompiler {
    /// `Err` carries the compiler's own failure text.
    fn compile(&self, source: &str) -> Result<(), String>;
}

impl<F> ScriptCompiler for F
where
    F: Fn(&str) -> Result<(), String>,
{
    fn compile(&self, source: &str) -> Result<(), String> {
        self(source)
    }
}

/// Runs `compiler` over `source` and maps the outcome to a [`Diagnostic`].
pub fn validate(compiler: &dyn ScriptCompiler, source: &str) -> Diagnostic {
    match compiler.compile(source) {
        Ok(()) => Diagnostic::clean(),
        Err(message) if message.is_empty() => Diagnostic::failed("script failed to compile"),
        Err(message) => Diagnostic::failed(message),
    }
}

/// Lua 5.4 front end. Compiles the chunk without running it.
#[cfg(feature = "lua")]
pub struct LuaCompiler {
    lua: mlua::Lua,
    chunk_name: String,
}

#[cfg(feature = "lua")]
impl LuaCompiler {
    pub fn new() -> Self {
        Self {
            lua: mlua::Lua::new(),
            chunk_name: crate::archive::SCRIPT_MEMBER.to_string(),
        }
    }
}

#[cfg(feature = "lua")]
impl Default for LuaCompiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "lua")]
impl ScriptCompiler for LuaCompiler {
    fn compile(&self, source: &str) -> Result<(), String> {
        self.lua
            .load(source)
            .set_name(self.chunk_name.as_str())
            .into_function()
            .map(|_| ())
            .map_err(|err| match err {
                mlua::Error::SyntaxError { message, .. } => message,
                other => other.to_string(),
            })
    }
}
