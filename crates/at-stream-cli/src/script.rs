//! YAML command scripts.
//!
//! ```yaml
//! session:
//!   max_response_len: 512
//!   max_line_len: 128
//! commands:
//!   - name: VERSION
//!   - name: SETVER
//!     args: ["version", 2]
//!   - name: CFG
//!     args: [1, null, "x"]
//! ```

use std::path::Path;

use at_stream_protocol::{Argument, SessionConfig};
use serde::{Deserialize, Serialize};

use crate::error::CliAppError;

/// A script argument as written in YAML or on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptArgument {
    /// A YAML integer.
    Integer(i32),
    /// A YAML string.
    Text(String),
    /// YAML `null` or `~`.
    Null,
}

impl ScriptArgument {
    /// Interpret a command-line token.
    ///
    /// `null` is a null argument, anything that parses as `i32` is an integer,
    /// and everything else is text. Surrounding double quotes are stripped so
    /// that `'"42"'` passes the text `42`.
    pub fn from_cli(token: &str) -> Self {
        if token == "null" {
            return ScriptArgument::Null;
        }
        if let Some(text) = token
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
        {
            return ScriptArgument::Text(text.to_string());
        }
        match token.parse::<i32>() {
            Ok(value) => ScriptArgument::Integer(value),
            Err(_) => ScriptArgument::Text(token.to_string()),
        }
    }

    /// Borrow as a protocol argument.
    pub fn as_argument(&self) -> Argument<'_> {
        match self {
            ScriptArgument::Integer(value) => Argument::Integer(*value),
            ScriptArgument::Text(text) => Argument::from(text.as_str()),
            ScriptArgument::Null => Argument::Null,
        }
    }
}

/// One command to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptCommand {
    /// Command name, without the `AT+` prefix.
    pub name: String,
    /// Arguments, in order.
    #[serde(default)]
    pub args: Vec<ScriptArgument>,
}

impl ScriptCommand {
    /// Build a command from a name and raw command-line tokens.
    pub fn from_cli(name: &str, tokens: &[String]) -> Self {
        ScriptCommand {
            name: name.to_string(),
            args: tokens.iter().map(|t| ScriptArgument::from_cli(t)).collect(),
        }
    }

    /// The arguments as protocol values.
    pub fn arguments(&self) -> Vec<Argument<'_>> {
        self.args.iter().map(ScriptArgument::as_argument).collect()
    }
}

/// A sequence of commands plus optional session limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Buffer limits; defaults apply when omitted.
    #[serde(default)]
    pub session: Option<SessionConfig>,
    /// Commands to execute in order.
    #[serde(default)]
    pub commands: Vec<ScriptCommand>,
}

impl Script {
    /// Parse a script from YAML text.
    pub fn from_yaml(text: &str) -> Result<Script, CliAppError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a script from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Script, CliAppError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}
