//! Shell completion.
//!
//! The generated script calls the program back with the reserved
//! `get-completions` token followed by the words typed so far; the
//! dispatcher answers with [`CompletionGenerator::candidates`].

use crate::bind::hints_for;
use crate::command::Command;
use crate::tokenize::tokenize;

/// Produces completion scripts and candidate lists.
pub trait CompletionGenerator: Send + Sync {
    /// Shell script that wires completion for `program`.
    fn script(&self, command: &Command, program: &str) -> String;

    /// Candidates for the last word of `partial`, resolved relative to
    /// `command`.
    fn candidates(&self, command: &Command, partial: &[String]) -> Vec<String>;
}

const BASH_TEMPLATE: &str = r#"# bash completion for {prog}
_{func}_completions() {
    local words=("${COMP_WORDS[@]:1:COMP_CWORD}")
    local IFS=$' \t\n'
    COMPREPLY=($({prog} get-completions "${words[@]}" 2>/dev/null))
}
complete -o default -F _{func}_completions {prog}
"#;

/// Bash completion via `complete -F`.
///
/// # Examples
///
/// ```
/// use command_tree_core::completion::{BashCompletion, CompletionGenerator};
/// use command_tree_core::{flag, Command};
///
/// let cmd = Command::new("vcs")
///     .with_option(flag("verbose"))?
///     .with_sub_command(Command::new("commit"))?
///     .with_sub_command(Command::new("clone"))?;
///
/// let words = vec!["c".to_string()];
/// assert_eq!(BashCompletion.candidates(&cmd, &words), vec!["commit", "clone"]);
///
/// let words = vec!["--v".to_string()];
/// assert_eq!(BashCompletion.candidates(&cmd, &words), vec!["--verbose"]);
/// # Ok::<(), command_tree_core::DefinitionError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BashCompletion;

impl CompletionGenerator for BashCompletion {
    fn script(&self, _command: &Command, program: &str) -> String {
        BASH_TEMPLATE
            .replace("{func}", &function_name(program))
            .replace("{prog}", program)
    }

    fn candidates(&self, command: &Command, partial: &[String]) -> Vec<String> {
        let (word, preceding) = match partial.split_last() {
            Some((last, rest)) => (last.as_str(), rest),
            None => ("", partial),
        };

        // Each level re-tokenizes with its own switches so option values are
        // consumed the way the binder consumes them.
        let mut current = command.with_help_flag();
        let mut depth = 0;
        loop {
            let raw = tokenize(preceding, &hints_for(&current.all_options()));
            let Some(sub) = raw
                .positionals
                .get(depth)
                .and_then(|token| current.find_sub_command(token))
            else {
                break;
            };
            current = current.child_of(sub);
            depth += 1;
        }

        let flags = current.all_options().into_iter().flat_map(|o| o.aliases());
        let words = current
            .sub_commands()
            .iter()
            .map(|sub| sub.name().to_string())
            .chain(current.all_arguments().into_iter().map(|a| a.name));

        let pool: Vec<String> = if word.starts_with('-') {
            flags.collect()
        } else if word.is_empty() {
            words.chain(flags).collect()
        } else {
            words.collect()
        };

        let mut seen = Vec::new();
        for candidate in pool {
            if candidate.starts_with(word) && !seen.contains(&candidate) {
                seen.push(candidate);
            }
        }
        seen
    }
}

/// Shell function identifier derived from the program's file name.
fn function_name(program: &str) -> String {
    let base = program.rsplit('/').next().unwrap_or(program);
    base.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{flag, string_arg, string_option};

    fn tree() -> Command {
        let remote = Command::new("remote")
            .with_option(flag("prune"))
            .unwrap()
            .with_sub_command(Command::new("add").with_argument(string_arg("url")).unwrap())
            .unwrap();
        Command::new("vcs")
            .with_option(flag("verbose").with_short('v'))
            .unwrap()
            .with_sub_command(remote)
            .unwrap()
    }

    fn words(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_script_references_program() {
        let script = BashCompletion.script(&tree(), "/usr/local/bin/vcs-tool");
        assert!(script.contains("_vcs_tool_completions()"));
        assert!(script.contains("/usr/local/bin/vcs-tool get-completions"));
        assert!(script.contains("complete -o default -F _vcs_tool_completions /usr/local/bin/vcs-tool"));
    }

    #[test]
    fn test_candidates_walk_into_sub_commands() {
        let found = BashCompletion.candidates(&tree(), &words(&["remote", ""]));
        assert_eq!(found, vec!["add", "--prune", "-v", "--verbose", "-h", "--help"]);
    }

    #[test]
    fn test_flag_candidates_include_inherited() {
        let found = BashCompletion.candidates(&tree(), &words(&["remote", "add", "--"]));
        assert_eq!(found, vec!["--prune", "--verbose", "--help"]);
    }

    #[test]
    fn test_argument_names_are_candidates() {
        let found = BashCompletion.candidates(&tree(), &words(&["remote", "add", "u"]));
        assert_eq!(found, vec!["url"]);
    }

    #[test]
    fn test_option_values_are_not_taken_for_sub_commands() {
        let cmd = tree()
            .with_option(string_option("user").with_short('u'))
            .unwrap();
        let found = BashCompletion.candidates(&cmd, &words(&["-u", "ada", "remote", "a"]));
        assert_eq!(found, vec!["add"]);

        let found = BashCompletion.candidates(&cmd, &words(&["--user=ada", "remote", "add", "u"]));
        assert_eq!(found, vec!["url"]);
    }

    #[test]
    fn test_child_switch_does_not_swallow_next_word() {
        let found = BashCompletion.candidates(&tree(), &words(&["remote", "--prune", "add", "u"]));
        assert_eq!(found, vec!["url"]);
    }

    #[test]
    fn test_empty_partial_lists_root() {
        let found = BashCompletion.candidates(&tree(), &[]);
        assert_eq!(found, vec!["remote", "-v", "--verbose", "-h", "--help"]);
    }
}
