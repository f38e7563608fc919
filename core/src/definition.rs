use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::Command;
use crate::error::{DefinitionError, DefinitionLoadError};
use crate::schema::{ArgSchema, OptionSchema};

/// Serializable description of a whole command tree.
///
/// Building goes through the regular [`Command`] builder calls, so a file
/// definition is subject to every invariant a hand-written one is.
///
/// # Examples
///
/// ```
/// use command_tree_core::CommandDefinition;
///
/// let definition = CommandDefinition::from_json_str(r#"{
///     "name": "vcs",
///     "version": "0.3.0",
///     "options": [{ "name": "verbose", "short": "v", "kind": "boolean" }],
///     "commands": [
///         { "name": "commit", "options": [{ "name": "message", "short": "m" }] }
///     ]
/// }"#)?;
///
/// assert_eq!(definition.command_count(), 2);
/// let command = definition.build()?;
/// assert_eq!(command.sub_commands()[0].name(), "commit");
/// assert!(command.find_option("verbose").unwrap().is_flag());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgSchema>,
    /// Sub-commands.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDefinition>,
}

impl CommandDefinition {
    pub fn from_json_str(input: &str) -> Result<Self, DefinitionLoadError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, DefinitionLoadError> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Reads a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self, DefinitionLoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let contents = fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loading command definition");
        match extension.as_deref() {
            Some("json") => Self::from_json_str(&contents),
            Some("yaml" | "yml") => Self::from_yaml_str(&contents),
            other => Err(DefinitionLoadError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Total number of commands in the tree, this one included.
    pub fn command_count(&self) -> usize {
        1 + self
            .commands
            .iter()
            .map(CommandDefinition::command_count)
            .sum::<usize>()
    }

    /// Builds the command tree.
    ///
    /// An option without a long alias gets its name as long alias.
    pub fn build(&self) -> Result<Command, DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }

        let mut command = Command::new(&self.name);
        if let Some(version) = &self.version {
            command = command.with_version(version);
        }
        if let Some(description) = &self.description {
            command = command.with_description(description);
        }
        for option in &self.options {
            let mut option = option.clone();
            if option.long.is_none() {
                option.long = Some(option.name.clone());
            }
            command = command.with_option(option)?;
        }
        for argument in &self.arguments {
            command = command.with_argument(argument.clone())?;
        }
        for sub in &self.commands {
            command = command.with_sub_command(sub.build()?)?;
        }
        Ok(command)
    }
}
