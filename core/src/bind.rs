//! Binder: typed values from a raw parse and a command's declared schema.
//!
//! [`bind`] is a pure function of its inputs. It never mutates the
//! descriptors it is given, and the same argument vector bound against the
//! same schema always yields an equal [`ParsedArgs`].

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::BindingError;
use crate::schema::{ArgSchema, OptionSchema};
use crate::tokenize::{Occurrence, RawArgs, TokenHints, tokenize};
use crate::value::{Value, ValueKind};

/// Bound values for one command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedArgs {
    /// Option name → bound value. Flags are always present.
    pub options: BTreeMap<String, Value>,
    /// Argument name → bound value.
    pub arguments: BTreeMap<String, Value>,
    /// Residual positional tokens, in order. The first one drives dispatch.
    pub positionals: Vec<String>,
    /// The raw parse these values were bound from.
    #[serde(skip)]
    pub raw: RawArgs,
}

impl ParsedArgs {
    /// Looks up a value by name, options first.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.options.get(name).or_else(|| self.arguments.get(name))
    }

    /// First residual positional token.
    pub fn first_positional(&self) -> Option<&str> {
        self.positionals.first().map(String::as_str)
    }
}

/// Binds `argv` against the declared options and arguments.
///
/// When `merge` holds an ancestor's raw parse it is overlaid underneath the
/// new one, so ancestor-only values stay visible unless shadowed.
///
/// # Errors
///
/// - [`BindingError::DuplicateAlias`] if an option's short and long alias
///   both occur.
/// - [`BindingError::Multiplicity`] if a single-valued option occurs twice.
/// - [`BindingError::InvalidNumber`] if a numeric value does not parse.
/// - [`BindingError::MissingValue`] if a non-boolean option has no value.
///
/// # Examples
///
/// ```
/// use command_tree_core::bind::bind;
/// use command_tree_core::{flag, numeric_option, string_arg, Value};
///
/// let options = [flag("force").with_short('f'), numeric_option("jobs")];
/// let arguments = [string_arg("target")];
///
/// let parsed = bind(&["-f", "--jobs", "2", "out"], &options, &arguments, None).unwrap();
/// assert_eq!(parsed.options["force"], Value::Bool(true));
/// assert_eq!(parsed.options["jobs"], Value::Number(2.0));
/// assert_eq!(parsed.arguments["target"], Value::from("out"));
/// ```
pub fn bind<S: AsRef<str>>(
    argv: &[S],
    options: &[OptionSchema],
    arguments: &[ArgSchema],
    merge: Option<&RawArgs>,
) -> Result<ParsedArgs, BindingError> {
    let mut raw = tokenize(argv, &hints_for(options));
    if let Some(base) = merge {
        raw = raw.merged_over(base);
    }
    bind_raw(raw, options, arguments)
}

/// Tokenizer hints for a schema: every alias of a boolean option is a switch.
pub fn hints_for(options: &[OptionSchema]) -> TokenHints {
    TokenHints::with_switches(
        options
            .iter()
            .filter(|o| o.is_flag())
            .flat_map(OptionSchema::aliases),
    )
}

/// Binds an already tokenized parse. See [`bind`] for the error cases.
pub fn bind_raw(
    raw: RawArgs,
    options: &[OptionSchema],
    arguments: &[ArgSchema],
) -> Result<ParsedArgs, BindingError> {
    let mut bound_options = BTreeMap::new();
    for option in options {
        if let Some(value) = bind_option(option, &raw)? {
            bound_options.insert(option.name.clone(), value);
        }
    }

    let bound_arguments = bind_arguments(arguments, &raw.positionals)?;

    debug!(
        options = bound_options.len(),
        arguments = bound_arguments.len(),
        positionals = ?raw.positionals,
        "Bound runtime arguments"
    );

    Ok(ParsedArgs {
        options: bound_options,
        arguments: bound_arguments,
        positionals: raw.positionals.clone(),
        raw,
    })
}

/// Checks that every required option and argument received a value.
///
/// Kept separate from [`bind`] so that help and completion requests succeed
/// on commands whose required values are missing.
pub fn check_required(
    parsed: &ParsedArgs,
    options: &[OptionSchema],
    arguments: &[ArgSchema],
) -> Result<(), BindingError> {
    let missing_option = options
        .iter()
        .filter(|o| o.required && !o.is_flag())
        .find(|o| !parsed.options.contains_key(&o.name))
        .map(|o| o.name.clone());
    let missing_argument = || {
        arguments
            .iter()
            .filter(|a| a.required)
            .find(|a| !parsed.arguments.contains_key(&a.name))
            .map(|a| a.name.clone())
    };

    match missing_option.or_else(missing_argument) {
        Some(name) => Err(BindingError::MissingRequired { name }),
        None => Ok(()),
    }
}

fn bind_option(option: &OptionSchema, raw: &RawArgs) -> Result<Option<Value>, BindingError> {
    let short = option.short_alias().and_then(|a| raw.occurrences(&a));
    let long = option.long_alias().and_then(|a| raw.occurrences(&a));

    if short.is_some() && long.is_some() {
        return Err(BindingError::DuplicateAlias {
            name: option.name.clone(),
            short: option.short.unwrap_or_default(),
            long: option.long.clone().unwrap_or_default(),
        });
    }

    let occurrences = short.or(long);

    if option.is_flag() {
        let present = occurrences.map(|occ| occ.iter().any(switch_is_on));
        let default = option
            .default
            .as_ref()
            .and_then(Value::as_bool)
            .unwrap_or(false);
        return Ok(Some(Value::Bool(present.unwrap_or(default))));
    }

    let Some(occurrences) = occurrences else {
        return Ok(option.default.clone());
    };

    if occurrences.len() > 1 && !option.multiple {
        return Err(BindingError::Multiplicity {
            name: option.name.clone(),
        });
    }

    let mut values = occurrences
        .iter()
        .map(|occ| match occ {
            Some(text) => coerce(&option.name, option.kind, text),
            None => Err(BindingError::MissingValue {
                name: option.name.clone(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(if option.multiple {
        Some(Value::List(values))
    } else {
        values.pop()
    })
}

fn bind_arguments(
    arguments: &[ArgSchema],
    positionals: &[String],
) -> Result<BTreeMap<String, Value>, BindingError> {
    let mut bound = BTreeMap::new();
    let mut remaining = positionals.iter();

    for argument in arguments {
        let value = if argument.multiple {
            let values = remaining
                .by_ref()
                .map(|token| coerce(&argument.name, argument.kind, token))
                .collect::<Result<Vec<_>, _>>()?;
            if values.is_empty() {
                argument.default.clone()
            } else {
                Some(Value::List(values))
            }
        } else {
            match remaining.next() {
                Some(token) => Some(coerce(&argument.name, argument.kind, token)?),
                None => argument.default.clone(),
            }
        };

        if let Some(value) = value {
            bound.insert(argument.name.clone(), value);
        }
    }

    Ok(bound)
}

/// `--flag=false` (and `0`/`no`) turns a switch off; anything else is on.
fn switch_is_on(occurrence: &Occurrence) -> bool {
    !matches!(occurrence.as_deref(), Some("false" | "0" | "no"))
}

fn coerce(name: &str, kind: ValueKind, text: &str) -> Result<Value, BindingError> {
    match kind {
        ValueKind::Number => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
            .ok_or_else(|| BindingError::InvalidNumber {
                name: name.to_string(),
                value: text.to_string(),
            }),
        ValueKind::String => Ok(Value::String(text.to_string())),
        ValueKind::Boolean => Ok(Value::Bool(switch_is_on(&Some(text.to_string())))),
    }
}
