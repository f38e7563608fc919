//! Raw token parser.
//!
//! Splits an argument vector into alias occurrences and residual positional
//! tokens using conventional dash syntax. Knows nothing about the command
//! tree; the only schema input is the set of aliases that never take a value
//! ([`TokenHints`]).
//!
//! # Examples
//!
//! ```
//! use command_tree_core::tokenize::{tokenize, TokenHints};
//!
//! let hints = TokenHints::with_switches(["--force"]);
//! let raw = tokenize(&["sub", "--force", "file", "--name=bob", "-n", "3"], &hints);
//!
//! assert_eq!(raw.positionals, vec!["sub", "file"]);
//! assert_eq!(raw.single("--name"), Some("bob"));
//! assert_eq!(raw.single("-n"), Some("3"));
//! assert!(raw.contains("--force"));
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::trace;

/// One occurrence of an alias: `None` for a bare switch, `Some` for a value.
pub type Occurrence = Option<String>;

/// Preliminary parse of an argument vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawArgs {
    /// Spelled alias (`-f`, `--force`) → every occurrence in order.
    pub values: BTreeMap<String, Vec<Occurrence>>,
    /// Bare tokens in order, including everything after `--`.
    pub positionals: Vec<String>,
}

impl RawArgs {
    /// Returns `true` if the alias occurred at least once.
    pub fn contains(&self, alias: &str) -> bool {
        self.values.contains_key(alias)
    }

    /// Returns the occurrences of an alias.
    pub fn occurrences(&self, alias: &str) -> Option<&[Occurrence]> {
        self.values.get(alias).map(Vec::as_slice)
    }

    /// Returns the value of the first occurrence, if it carried one.
    pub fn single(&self, alias: &str) -> Option<&str> {
        self.values.get(alias)?.first()?.as_deref()
    }

    /// Overlays `self` on top of an ancestor parse.
    ///
    /// Aliases missing from `self` are taken from `base`; positionals always
    /// come from `self`.
    pub fn merged_over(mut self, base: &RawArgs) -> RawArgs {
        for (alias, occurrences) in &base.values {
            self.values
                .entry(alias.clone())
                .or_insert_with(|| occurrences.clone());
        }
        self
    }

    fn push(&mut self, alias: String, value: Occurrence) {
        self.values.entry(alias).or_default().push(value);
    }
}

/// Aliases that are known switches and never consume the next token.
#[derive(Debug, Clone, Default)]
pub struct TokenHints {
    switches: HashSet<String>,
}

impl TokenHints {
    pub fn with_switches<I, S>(switches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            switches: switches.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_switch(&self, alias: &str) -> bool {
        self.switches.contains(alias)
    }
}

/// Returns `true` if `token` looks like an option rather than a value.
///
/// Negative numbers (`-5`, `-0.5`) are values.
pub fn is_flag_like(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && token.parse::<f64>().is_err()
}

/// Tokenizes `argv` into a [`RawArgs`].
pub fn tokenize<S: AsRef<str>>(argv: &[S], hints: &TokenHints) -> RawArgs {
    let tokens: Vec<&str> = argv.iter().map(AsRef::as_ref).collect();
    let mut raw = RawArgs::default();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];

        if token == "--" {
            raw.positionals
                .extend(tokens[i + 1..].iter().map(|t| t.to_string()));
            break;
        }

        if let Some(body) = token.strip_prefix("--").filter(|b| !b.is_empty()) {
            match body.split_once('=') {
                Some((name, value)) => raw.push(format!("--{name}"), Some(value.to_string())),
                None => {
                    let alias = format!("--{body}");
                    let value = take_value(&alias, &tokens, &mut i, hints);
                    raw.push(alias, value);
                }
            }
        } else if is_flag_like(token) {
            tokenize_short_cluster(&token[1..], &tokens, &mut i, hints, &mut raw);
        } else {
            raw.positionals.push(token.to_string());
        }

        i += 1;
    }

    trace!(values = ?raw.values, positionals = ?raw.positionals, "Tokenized arguments");
    raw
}

fn tokenize_short_cluster(
    body: &str,
    tokens: &[&str],
    i: &mut usize,
    hints: &TokenHints,
    raw: &mut RawArgs,
) {
    if let Some((letters, assigned)) = body.split_once('=') {
        let mut chars = letters.chars().peekable();
        while let Some(ch) = chars.next() {
            let value = chars.peek().is_none().then(|| assigned.to_string());
            raw.push(format!("-{ch}"), value);
        }
        return;
    }

    for (offset, ch) in body.char_indices() {
        let alias = format!("-{ch}");
        let rest = &body[offset + ch.len_utf8()..];

        if rest.is_empty() {
            let value = take_value(&alias, tokens, i, hints);
            raw.push(alias, value);
            return;
        }
        // `-n5` binds the numeric tail to the letter.
        if rest.parse::<f64>().is_ok() {
            raw.push(alias, Some(rest.to_string()));
            return;
        }
        raw.push(alias, None);
    }
}

fn take_value(alias: &str, tokens: &[&str], i: &mut usize, hints: &TokenHints) -> Occurrence {
    if hints.is_switch(alias) {
        return None;
    }
    match tokens.get(*i + 1) {
        Some(next) if *next != "--" && !is_flag_like(next) => {
            *i += 1;
            Some(next.to_string())
        }
        _ => None,
    }
}
