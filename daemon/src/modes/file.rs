//! On-disk definitions format
//!
//! A definitions file is a JSON object describing the root mode. Every mode
//! has the same shape, so child modes nest recursively. Key order of
//! `defines` and `modes` is preserved because later defines may reference
//! earlier ones.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::LoadError;

/// One mode as written in a definitions file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeDefinition {
    /// Named grammar templates, usable as `$name` from this point on
    pub defines: IndexMap<String, String>,

    pub commands: Vec<CommandDefinition>,

    /// Child modes keyed by the name used to enter them
    pub modes: IndexMap<String, ModeDefinition>,
}

/// One spoken command as written in a definitions file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub grammar: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

impl ModeDefinition {
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a definitions file
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}
