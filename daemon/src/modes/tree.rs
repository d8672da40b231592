//! Mode hierarchy built from a definitions file
//!
//! Modes live in an arena and refer to each other by [`ModeId`]. Each
//! command owns exactly one grammar, so a command is addressed by the
//! [`GrammarId`] the recognition engine reports.

use indexmap::IndexMap;
use tracing::{debug, info};

use super::command::Command;
use super::file::ModeDefinition;
use super::{LoadError, ModeId};
use crate::grammar::Definitions;
use crate::recognition::GrammarId;
use crate::session::FunctionRegistry;

/// One node of the mode tree
#[derive(Debug, Clone)]
pub struct Mode {
    /// Lowercased name; empty for the root
    pub name: String,
    pub parent: Option<ModeId>,
    /// Child modes keyed by lowercased name
    pub children: IndexMap<String, ModeId>,
    /// Grammars of this mode's commands, in definition order
    pub grammars: Vec<GrammarId>,
}

impl Mode {
    /// Name suitable for logs
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "<global>"
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModeTree {
    modes: Vec<Mode>,
    commands: Vec<Command>,
}

impl ModeTree {
    /// A tree holding only an empty root mode
    pub fn empty() -> Self {
        Self {
            modes: vec![Mode {
                name: String::new(),
                parent: None,
                children: IndexMap::new(),
                grammars: Vec::new(),
            }],
            commands: Vec::new(),
        }
    }

    /// Build the whole tree, registering each mode's defines into
    /// `definitions` as it goes. Any failure aborts the build.
    pub fn build(
        root: &ModeDefinition,
        definitions: &mut Definitions,
        functions: &FunctionRegistry,
    ) -> Result<Self, LoadError> {
        let mut tree = Self {
            modes: Vec::new(),
            commands: Vec::new(),
        };
        tree.build_mode("", None, root, definitions, functions)?;

        info!(
            modes = tree.modes.len(),
            commands = tree.commands.len(),
            "mode tree built"
        );
        Ok(tree)
    }

    fn build_mode(
        &mut self,
        name: &str,
        parent: Option<ModeId>,
        def: &ModeDefinition,
        definitions: &mut Definitions,
        functions: &FunctionRegistry,
    ) -> Result<ModeId, LoadError> {
        let id = ModeId(self.modes.len());
        self.modes.push(Mode {
            name: name.to_lowercase(),
            parent,
            children: IndexMap::new(),
            grammars: Vec::new(),
        });

        for (define, text) in &def.defines {
            definitions
                .define_source(define, text)
                .map_err(|source| LoadError::Define {
                    name: define.to_lowercase(),
                    source,
                })?;
        }

        let commands = def
            .commands
            .iter()
            .map(|command| Command::build(id, command, definitions, functions))
            .collect::<Result<Vec<_>, _>>()?;

        for (child_name, child_def) in &def.modes {
            let key = child_name.to_lowercase();
            if self.modes[id.0].children.contains_key(&key) {
                return Err(LoadError::DuplicateMode { name: key });
            }
            let child = self.build_mode(&key, Some(id), child_def, definitions, functions)?;
            self.modes[id.0].children.insert(key, child);
        }

        let mut grammars = Vec::with_capacity(commands.len());
        for command in commands {
            grammars.push(GrammarId(self.commands.len()));
            self.commands.push(command);
        }
        debug!(mode = %self.modes[id.0].display_name(), grammars = grammars.len(), "mode compiled");
        self.modes[id.0].grammars = grammars;

        Ok(id)
    }

    pub fn root(&self) -> ModeId {
        ModeId(0)
    }

    pub fn mode(&self, id: ModeId) -> Option<&Mode> {
        self.modes.get(id.0)
    }

    /// Grammars of a mode; empty for an unknown id
    pub fn grammars(&self, id: ModeId) -> &[GrammarId] {
        self.mode(id).map(|m| m.grammars.as_slice()).unwrap_or(&[])
    }

    /// Look up a child of `parent` by name (case-insensitive)
    pub fn child(&self, parent: ModeId, name: &str) -> Option<ModeId> {
        self.mode(parent)?.children.get(&name.to_lowercase()).copied()
    }

    /// First mode with the given name, searching depth-first from the root
    pub fn find_by_name(&self, name: &str) -> Option<ModeId> {
        let name = name.to_lowercase();
        self.preorder().into_iter().find(|id| self.modes[id.0].name == name)
    }

    /// The command that owns a grammar
    pub fn command(&self, id: GrammarId) -> Option<&Command> {
        self.commands.get(id.0)
    }

    /// Mode ids, parents before children
    pub fn preorder(&self) -> Vec<ModeId> {
        let mut order = Vec::with_capacity(self.modes.len());
        let mut pending = vec![self.root()];
        while let Some(id) = pending.pop() {
            order.push(id);
            if let Some(mode) = self.mode(id) {
                pending.extend(mode.children.values().rev().copied());
            }
        }
        order
    }

    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}
