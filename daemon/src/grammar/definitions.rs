//! Named grammar definitions referenced through `$name`

use std::collections::HashMap;

use tracing::warn;

use super::node::{GrammarNode, Sequence};
use super::parser::{parse, GrammarError};

/// Built-in name for open dictation
pub const DICTATION: &str = "dictate";
/// Built-in name for the wildcard matcher
pub const WILDCARD: &str = "wildcard";

/// Compiler context holding every named grammar template.
///
/// Passed to each grammar parse. Cloning takes a full snapshot, which is how
/// a failed reload restores the previous set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definitions {
    templates: HashMap<String, Sequence>,
}

impl Definitions {
    /// A context holding only the reserved built-ins
    pub fn with_builtins() -> Self {
        let mut templates = HashMap::new();
        templates.insert(DICTATION.to_string(), vec![GrammarNode::Dictation]);
        templates.insert(WILDCARD.to_string(), vec![GrammarNode::Wildcard]);
        Self { templates }
    }

    pub fn is_reserved(name: &str) -> bool {
        name.eq_ignore_ascii_case(DICTATION) || name.eq_ignore_ascii_case(WILDCARD)
    }

    /// Register a template under `name` (case-insensitive).
    ///
    /// Reserved names are rejected; shadowing an earlier user definition is
    /// allowed and logged.
    pub fn define(&mut self, name: &str, template: Sequence) -> Result<(), GrammarError> {
        let name = name.to_lowercase();
        if Self::is_reserved(&name) {
            return Err(GrammarError::ReservedName { name });
        }
        if self.templates.contains_key(&name) {
            warn!(define = %name, "overwriting define");
        }
        self.templates.insert(name, template);
        Ok(())
    }

    /// Compile `source` against the current definitions and register it
    pub fn define_source(&mut self, name: &str, source: &str) -> Result<(), GrammarError> {
        if Self::is_reserved(name) {
            return Err(GrammarError::ReservedName {
                name: name.to_lowercase(),
            });
        }
        let template = parse(source, self)?;
        self.define(name, template)
    }

    /// Deep copy of the template registered under `name`
    pub fn lookup(&self, name: &str) -> Option<Sequence> {
        self.templates.get(&name.to_lowercase()).cloned()
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(&name.to_lowercase())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.templates.len()
    }
}

impl Default for Definitions {
    fn default() -> Self {
        Self::with_builtins()
    }
}
