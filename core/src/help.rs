//! Help text rendering.

use std::fmt::Write;

use crate::command::Command;
use crate::schema::OptionSchema;

/// Renders the help text for a command.
///
/// The dispatcher only calls the formatter and prints the result.
pub trait HelpFormatter: Send + Sync {
    fn format_help(&self, command: &Command) -> String;
}

/// Plain-text layout: title, description, usage line, then the commands,
/// arguments and options sections with aligned description columns.
///
/// # Examples
///
/// ```
/// use command_tree_core::help::{DefaultHelpFormatter, HelpFormatter};
/// use command_tree_core::{flag, string_arg, Command};
///
/// let cmd = Command::new("deploy")
///     .with_version("1.2.0")
///     .with_option(flag("force").with_short('f').with_description("Skip checks"))?
///     .with_argument(string_arg("target").mark_required())?;
///
/// let text = DefaultHelpFormatter.format_help(&cmd);
/// assert!(text.starts_with("deploy 1.2.0"));
/// assert!(text.contains("Usage: deploy [options] <target>"));
/// assert!(text.contains("-f, --force"));
/// # Ok::<(), command_tree_core::DefinitionError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHelpFormatter;

impl HelpFormatter for DefaultHelpFormatter {
    fn format_help(&self, command: &Command) -> String {
        let options = command.all_options();
        let arguments = command.all_arguments();
        let mut out = String::new();

        match command.version() {
            Some(version) => {
                let _ = writeln!(out, "{} {version}", command.full_name());
            }
            None => {
                let _ = writeln!(out, "{}", command.full_name());
            }
        }
        if let Some(description) = command.description() {
            let _ = writeln!(out, "{description}");
        }

        let mut usage = format!("Usage: {}", command.full_name());
        if !options.is_empty() {
            usage.push_str(" [options]");
        }
        if !command.sub_commands().is_empty() {
            usage.push_str(" <command>");
        }
        for argument in &arguments {
            usage.push(' ');
            usage.push_str(&argument.usage());
        }
        let _ = writeln!(out, "\n{usage}");

        let commands: Vec<(String, String)> = command
            .sub_commands()
            .iter()
            .map(|sub| {
                (
                    sub.name().to_string(),
                    sub.description().unwrap_or_default().to_string(),
                )
            })
            .collect();
        write_section(&mut out, "Commands", &commands);

        let arguments: Vec<(String, String)> = arguments
            .iter()
            .map(|argument| {
                let mut text = argument.description.clone().unwrap_or_default();
                if argument.required {
                    annotate(&mut text, "[required]");
                }
                if let Some(default) = &argument.default {
                    annotate(&mut text, &format!("[default: {default}]"));
                }
                (argument.usage(), text)
            })
            .collect();
        write_section(&mut out, "Arguments", &arguments);

        let options: Vec<(String, String)> = options
            .iter()
            .map(|option| (option_spelling(option), option_text(option)))
            .collect();
        write_section(&mut out, "Options", &options);

        out.trim_end().to_string()
    }
}

/// `-f, --force`, `    --name <string>`, `-t, --tag <string...>`.
fn option_spelling(option: &OptionSchema) -> String {
    let short = option
        .short_alias()
        .map(|s| if option.long.is_some() { format!("{s}, ") } else { s })
        .unwrap_or_else(|| "    ".to_string());
    let mut spelling = format!("{short}{}", option.long_alias().unwrap_or_default());
    if !option.is_flag() {
        let dots = if option.multiple { "..." } else { "" };
        let _ = write!(spelling, " <{}{dots}>", option.kind);
    }
    spelling
}

fn option_text(option: &OptionSchema) -> String {
    let mut text = option.description.clone().unwrap_or_default();
    if option.required {
        annotate(&mut text, "[required]");
    }
    // A false flag default is implicit.
    if let Some(default) = option.default.as_ref().filter(|d| d.as_bool() != Some(false)) {
        annotate(&mut text, &format!("[default: {default}]"));
    }
    text
}

fn annotate(text: &mut String, note: &str) {
    if !text.is_empty() {
        text.push_str("  ");
    }
    text.push_str(note);
}

fn write_section(out: &mut String, title: &str, rows: &[(String, String)]) {
    if rows.is_empty() {
        return;
    }
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
    let _ = writeln!(out, "\n{title}:");
    for (left, right) in rows {
        if right.is_empty() {
            let _ = writeln!(out, "  {left}");
        } else {
            let _ = writeln!(out, "  {left:<width$}  {right}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{flag, multi_string_option, numeric_option, string_arg};

    #[test]
    fn test_lists_sub_commands() {
        let cmd = Command::new("vcs")
            .with_description("Toy version control")
            .with_sub_command(Command::new("commit").with_description("Record changes"))
            .unwrap()
            .with_sub_command(Command::new("remote"))
            .unwrap();
        let text = DefaultHelpFormatter.format_help(&cmd);
        assert!(text.contains("Toy version control"));
        assert!(text.contains("Usage: vcs <command>"));
        assert!(text.contains("  commit  Record changes"));
        assert!(text.contains("  remote"));
    }

    #[test]
    fn test_option_annotations() {
        let cmd = Command::new("run")
            .with_option(numeric_option("jobs").with_short('j').with_default(4.0))
            .unwrap()
            .with_option(multi_string_option("tag").mark_required())
            .unwrap()
            .with_option(flag("quiet"))
            .unwrap();
        let text = DefaultHelpFormatter.format_help(&cmd);
        assert!(text.contains("-j, --jobs <number>"));
        assert!(text.contains("[default: 4]"));
        assert!(text.contains("    --tag <string...>"));
        assert!(text.contains("[required]"));
        assert!(!text.contains("[default: false]"));
    }

    #[test]
    fn test_argument_section() {
        let cmd = Command::new("greet")
            .with_argument(string_arg("name").with_default("world"))
            .unwrap();
        let text = DefaultHelpFormatter.format_help(&cmd);
        assert!(text.contains("Usage: greet [name]"));
        assert!(text.contains("Arguments:\n  [name]  [default: world]"));
    }

    #[test]
    fn test_short_only_option_has_no_trailing_separator() {
        let cmd = Command::new("app")
            .with_option(flag("x").with_short('x').without_long())
            .unwrap();
        let text = DefaultHelpFormatter.format_help(&cmd);
        assert!(text.contains("  -x\n") || text.ends_with("  -x"));
    }
}
