//! Error types for command definition, argument binding and dispatch.
//!
//! Failures are split by the phase that produces them:
//!
//! - [`DefinitionError`]: a builder call violated a schema invariant. These
//!   are programming mistakes in the CLI definition.
//! - [`BindingError`]: the runtime argument vector does not fit the declared
//!   schema. Reported to the user together with help text.
//! - [`DefinitionLoadError`]: a declarative definition file could not be
//!   read or parsed.
//! - [`DispatchError`]: a handler or pre-processor failed, or output could
//!   not be written.

use thiserror::Error;

/// Errors raised by builder calls on [`Command`](crate::Command).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Command, option or argument name is empty or whitespace-only.
    #[error("name cannot be empty")]
    EmptyName,
    /// Two options on the same command share a name.
    #[error("command '{command}' already has an option named '{name}'")]
    DuplicateOption { command: String, name: String },
    /// Two options on the same command share a short or long alias.
    #[error("command '{command}': alias '{alias}' of option '{name}' is already in use")]
    DuplicateAlias {
        command: String,
        name: String,
        alias: String,
    },
    /// Two positional arguments on the same command share a name.
    #[error("command '{command}' already has an argument named '{name}'")]
    DuplicateArgument { command: String, name: String },
    /// Two sibling sub-commands share a name.
    #[error("command '{command}' already has a sub-command named '{name}'")]
    DuplicateSubCommand { command: String, name: String },
    /// An argument was declared after a multi-valued argument.
    #[error("command '{command}': argument '{name}' cannot follow multi-valued argument '{multiple}'")]
    ArgumentAfterMultiple {
        command: String,
        name: String,
        multiple: String,
    },
    /// A positional argument was declared on a command that has sub-commands.
    #[error("command '{command}' has sub-commands and cannot take positional argument '{name}'")]
    ArgumentsWithSubCommands { command: String, name: String },
    /// A sub-command was declared on a command that has positional arguments.
    #[error("command '{command}' has positional arguments and cannot take sub-command '{name}'")]
    SubCommandsWithArguments { command: String, name: String },
    /// The schema was changed after runtime arguments were bound.
    #[error("command '{command}' already has runtime arguments; its schema is frozen")]
    SchemaFrozen { command: String },
    /// A boolean option was marked as multi-valued.
    #[error("flag '{name}' cannot be multiple")]
    MultipleFlag { name: String },
    /// The declared default does not match the declared kind.
    #[error("default value of '{name}' does not match its kind ({kind})")]
    DefaultKindMismatch { name: String, kind: String },
    /// A legacy option/argument string could not be translated.
    #[error("invalid option string '{0}'")]
    InvalidOptString(String),
}

/// Errors raised while binding runtime arguments to a command's schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// Both the short and the long alias of one option were supplied.
    #[error("option '{name}' was given as both -{short} and --{long}")]
    DuplicateAlias {
        name: String,
        short: char,
        long: String,
    },
    /// A single-valued option was supplied more than once.
    #[error("option '{name}' can only be specified once")]
    Multiplicity { name: String },
    /// A numeric option or argument received a non-numeric value.
    #[error("'{name}': expected number value, got '{value}'")]
    InvalidNumber { name: String, value: String },
    /// A string or numeric option was given without a value.
    #[error("option '{name}' expects a value")]
    MissingValue { name: String },
    /// A required option or argument was not supplied.
    #[error("missing required value for '{name}'")]
    MissingRequired { name: String },
}

/// Errors raised while loading a declarative command definition.
#[derive(Debug, Error)]
pub enum DefinitionLoadError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The file extension is neither JSON nor YAML.
    #[error("unsupported definition format: {0}")]
    UnsupportedFormat(String),
    /// The definition parsed but violates a builder invariant.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Errors that escape a dispatch run.
///
/// Unknown sub-commands and missing handlers are not errors: they resolve
/// to help output and a failure [`ReturnCode`](crate::ReturnCode).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler or pre-processor returned an error. Passed through as-is.
    #[error(transparent)]
    Handler(anyhow::Error),
    /// Help, completion or diagnostic output could not be written.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for builder results.
pub type Result<T> = std::result::Result<T, DefinitionError>;
