//! Option and positional argument descriptors.
//!
//! Descriptors are plain data. They are built through the factory functions
//! ([`flag`], [`string_option`], [`numeric_option`], [`multi_string_option`],
//! [`string_arg`], [`numeric_arg`], [`multi_string_arg`]) and refined with
//! chained `with_*` calls. Cross-option uniqueness is not checked here; that
//! happens when a descriptor is added to a [`Command`](crate::Command).

use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;
use crate::value::{Value, ValueKind};

/// Schema for a named option (`-s` / `--long`).
///
/// # Examples
///
/// ```
/// use command_tree_core::{flag, numeric_option, ValueKind};
///
/// let force = flag("force").with_short('f').with_description("Overwrite files");
/// assert_eq!(force.kind, ValueKind::Boolean);
/// assert!(force.matches("-f"));
/// assert!(force.matches("--force"));
///
/// let jobs = numeric_option("jobs").with_default(4.0);
/// assert_eq!(jobs.long.as_deref(), Some("jobs"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSchema {
    /// Unique key within a command.
    pub name: String,
    /// Single-character alias (`-x`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    /// Word alias (`--word`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    /// Kind of value accepted.
    #[serde(default)]
    pub kind: ValueKind,
    /// Repeated occurrences collect into a list.
    #[serde(default)]
    pub multiple: bool,
    /// Must be supplied when a handler runs.
    #[serde(default)]
    pub required: bool,
    /// Value used when the option is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OptionSchema {
    /// Creates an option of `kind` whose long alias is its name.
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            short: None,
            long: Some(name.to_string()),
            kind,
            multiple: false,
            required: false,
            default: None,
            description: None,
        }
    }

    /// Sets the single-character alias.
    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Replaces the long alias (defaults to the option name).
    pub fn with_long(mut self, long: &str) -> Self {
        self.long = Some(long.to_string());
        self
    }

    /// Removes the long alias, leaving the option reachable only by `short`.
    pub fn without_long(mut self) -> Self {
        self.long = None;
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks the option as required.
    pub fn mark_required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks as allowing multiple occurrences.
    pub fn allow_multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Returns `true` for boolean options.
    pub fn is_flag(&self) -> bool {
        self.kind == ValueKind::Boolean
    }

    /// Spelled short alias (`-f`).
    pub fn short_alias(&self) -> Option<String> {
        self.short.map(|c| format!("-{c}"))
    }

    /// Spelled long alias (`--force`).
    pub fn long_alias(&self) -> Option<String> {
        self.long.as_ref().map(|l| format!("--{l}"))
    }

    /// All spelled aliases, short first.
    pub fn aliases(&self) -> Vec<String> {
        self.short_alias().into_iter().chain(self.long_alias()).collect()
    }

    /// Checks if `spelled` is one of this option's aliases.
    pub fn matches(&self, spelled: &str) -> bool {
        self.aliases().iter().any(|a| a == spelled)
    }

    /// Returns `true` if `other` shares a name, short or long alias.
    pub fn collides_with(&self, other: &OptionSchema) -> bool {
        self.name == other.name
            || (self.short.is_some() && self.short == other.short)
            || (self.long.is_some() && self.long == other.long)
    }

    /// Checks the shape constraints that need no other option to evaluate.
    ///
    /// Returns the descriptor with its default normalized (multi-valued
    /// defaults become lists).
    pub fn validate_shape(mut self) -> Result<Self, DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        if self.is_flag() && self.multiple {
            return Err(DefinitionError::MultipleFlag { name: self.name });
        }
        self.default = normalize_default(&self.name, self.kind, self.multiple, self.default)?;
        Ok(self)
    }
}

/// Schema for a positional argument.
///
/// # Examples
///
/// ```
/// use command_tree_core::{multi_string_arg, string_arg};
///
/// let src = string_arg("source").mark_required();
/// assert!(src.required);
///
/// let rest = multi_string_arg("files");
/// assert!(rest.multiple);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgSchema {
    /// Name of the argument.
    pub name: String,
    /// Kind of value accepted.
    #[serde(default)]
    pub kind: ValueKind,
    /// Consumes every remaining positional token.
    #[serde(default)]
    pub multiple: bool,
    /// Must be supplied when a handler runs.
    #[serde(default)]
    pub required: bool,
    /// Value used when no token is left for this slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ArgSchema {
    /// Creates an optional single-valued argument of `kind`.
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            multiple: false,
            required: false,
            default: None,
            description: None,
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks the argument as required.
    pub fn mark_required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks as accepting multiple values.
    pub fn allow_multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Usage spelling: `<name>`, `[name]`, `<name...>` or `[name...]`.
    pub fn usage(&self) -> String {
        let dots = if self.multiple { "..." } else { "" };
        if self.required {
            format!("<{}{dots}>", self.name)
        } else {
            format!("[{}{dots}]", self.name)
        }
    }

    /// Checks the shape constraints that need no other argument to evaluate.
    pub fn validate_shape(mut self) -> Result<Self, DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        if self.kind == ValueKind::Boolean && self.multiple {
            return Err(DefinitionError::MultipleFlag { name: self.name });
        }
        self.default = normalize_default(&self.name, self.kind, self.multiple, self.default)?;
        Ok(self)
    }
}

fn normalize_default(
    name: &str,
    kind: ValueKind,
    multiple: bool,
    default: Option<Value>,
) -> Result<Option<Value>, DefinitionError> {
    let Some(default) = default else {
        return Ok(None);
    };
    let is_list = matches!(default, Value::List(_));
    if !default.matches_kind(kind) || (is_list && !multiple) {
        return Err(DefinitionError::DefaultKindMismatch {
            name: name.to_string(),
            kind: kind.to_string(),
        });
    }
    Ok(Some(if multiple { default.into_list() } else { default }))
}

/// Creates a boolean option.
pub fn flag(name: &str) -> OptionSchema {
    OptionSchema::new(name, ValueKind::Boolean)
}

/// Creates a single-valued string option.
pub fn string_option(name: &str) -> OptionSchema {
    OptionSchema::new(name, ValueKind::String)
}

/// Creates a single-valued numeric option.
pub fn numeric_option(name: &str) -> OptionSchema {
    OptionSchema::new(name, ValueKind::Number)
}

/// Creates a repeatable string option; binds to a list.
pub fn multi_string_option(name: &str) -> OptionSchema {
    OptionSchema::new(name, ValueKind::String).allow_multiple()
}

/// Creates a single string argument.
pub fn string_arg(name: &str) -> ArgSchema {
    ArgSchema::new(name, ValueKind::String)
}

/// Creates a single numeric argument.
pub fn numeric_arg(name: &str) -> ArgSchema {
    ArgSchema::new(name, ValueKind::Number)
}

/// Creates a trailing argument that collects every remaining token.
pub fn multi_string_arg(name: &str) -> ArgSchema {
    ArgSchema::new(name, ValueKind::String).allow_multiple()
}
