//! Compatibility shim for commander-style option strings.
//!
//! Translates strings such as `-n, --name <name>` or `[files...]` into the
//! regular [`OptionSchema`] / [`ArgSchema`] model. Nothing downstream knows
//! the string form existed.
//!
//! | String                      | Result                         |
//! |-----------------------------|--------------------------------|
//! | `-f, --force`               | flag `force`                   |
//! | `-n, --name <name>`         | string option `name`           |
//! | `--tag <tag...>`            | multi-valued string option     |
//! | `--count <count:number>`    | numeric option                 |
//! | `<file>` / `[file]`         | required / optional argument   |
//! | `[files...]`                | multi-valued argument          |
//! | `<n:number>`                | numeric argument               |

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::command::Command;
use crate::error::{DefinitionError, Result};
use crate::schema::{ArgSchema, OptionSchema};
use crate::value::ValueKind;

// SAFETY: These regexes are compile-time constants and are validated by tests.
static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:-(?P<short>[A-Za-z0-9?])(?:,\s*|\s+|$))?(?:--(?P<long>[A-Za-z0-9][A-Za-z0-9_-]*))?(?:\s+(?P<value>[<\[].+[>\]]))?$",
    )
    .expect("static regex must compile")
});
static SLOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<open>[<\[])(?P<name>[A-Za-z0-9_-]+)(?::(?P<kind>[a-z]+))?(?P<dots>\.\.\.)?(?P<close>[>\]])$")
        .expect("static regex must compile")
});

/// Parses an option string.
///
/// # Examples
///
/// ```
/// use command_tree_core::optstring::option;
/// use command_tree_core::ValueKind;
///
/// let name = option("-n, --name <name>")?;
/// assert_eq!((name.short, name.long.as_deref()), (Some('n'), Some("name")));
/// assert_eq!(name.kind, ValueKind::String);
///
/// let force = option("-f, --force")?;
/// assert!(force.is_flag());
///
/// assert!(option("force").is_err());
/// # Ok::<(), command_tree_core::DefinitionError>(())
/// ```
pub fn option(spec: &str) -> Result<OptionSchema> {
    let invalid = || DefinitionError::InvalidOptString(spec.to_string());
    let caps = OPTION_RE.captures(spec.trim()).ok_or_else(invalid)?;

    let short = caps
        .name("short")
        .and_then(|m| m.as_str().chars().next());
    let long = caps.name("long").map(|m| m.as_str());
    let name = match (long, short) {
        (Some(long), _) => long.to_string(),
        (None, Some(short)) => short.to_string(),
        (None, None) => return Err(invalid()),
    };

    let mut schema = match caps.name("value") {
        Some(value) => {
            let slot = SLOT_RE.captures(value.as_str()).ok_or_else(invalid)?;
            let (kind, multiple) = slot_shape(&slot).ok_or_else(invalid)?;
            let schema = OptionSchema::new(&name, kind);
            if multiple {
                schema.allow_multiple()
            } else {
                schema
            }
        }
        None => OptionSchema::new(&name, ValueKind::Boolean),
    };

    schema = match long {
        Some(long) => schema.with_long(long),
        None => schema.without_long(),
    };
    if let Some(short) = short {
        schema = schema.with_short(short);
    }
    schema.validate_shape()
}

/// Parses an argument string: `<name>`, `[name]`, `[names...]`,
/// `<n:number>`.
pub fn argument(spec: &str) -> Result<ArgSchema> {
    let invalid = || DefinitionError::InvalidOptString(spec.to_string());
    let caps = SLOT_RE.captures(spec.trim()).ok_or_else(invalid)?;
    let (kind, multiple) = slot_shape(&caps).ok_or_else(invalid)?;

    let mut schema = ArgSchema::new(&caps["name"], kind);
    if &caps["open"] == "<" {
        schema = schema.mark_required();
    }
    if multiple {
        schema = schema.allow_multiple();
    }
    schema.validate_shape()
}

/// Kind and multiplicity of a `<name:kind...>` slot; `None` for mismatched
/// brackets or an unknown kind.
fn slot_shape(caps: &Captures<'_>) -> Option<(ValueKind, bool)> {
    let brackets = (&caps["open"], &caps["close"]);
    if brackets != ("<", ">") && brackets != ("[", "]") {
        return None;
    }
    let kind = match caps.name("kind").map(|m| m.as_str()) {
        None | Some("string") => ValueKind::String,
        Some("number") => ValueKind::Number,
        Some(_) => return None,
    };
    Some((kind, caps.name("dots").is_some()))
}

impl Command {
    /// Adds an option described by an option string.
    pub fn with_optstring(&self, spec: &str, description: &str) -> Result<Command> {
        self.with_option(option(spec)?.with_description(description))
    }

    /// Adds a positional argument described by an argument string.
    pub fn with_argstring(&self, spec: &str, description: &str) -> Result<Command> {
        self.with_argument(argument(spec)?.with_description(description))
    }
}
