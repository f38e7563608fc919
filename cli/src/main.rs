use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use command_tree_core::bind::check_required;
use command_tree_core::{
    Action, BashCompletion, Command, CommandDefinition, CompletionGenerator,
    DefaultHelpFormatter, HelpFormatter, Settings, Value, init_logging, route,
};
use serde::Serialize;
use tracing::debug;

/// Output format for `parse`.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "cmdtree", version)]
#[command(about = "Inspect and exercise declarative command tree definitions")]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Enable debug logging on stderr (same as COMMAND_TREE_DEBUG=1).
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Load a definition file and check every builder invariant.
    Check(CheckArgs),
    /// Print the help text of a command in a definition file.
    Help(HelpArgs),
    /// Print a bash completion script for a definition file.
    Completion(CompletionArgs),
    /// Bind and resolve arguments against a definition file.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Definition file (.json, .yaml or .yml).
    file: PathBuf,
}

#[derive(Debug, Args)]
struct HelpArgs {
    /// Definition file (.json, .yaml or .yml).
    file: PathBuf,
    /// Sub-command path below the root (e.g. `remote add`).
    path: Vec<String>,
}

#[derive(Debug, Args)]
struct CompletionArgs {
    /// Definition file (.json, .yaml or .yml).
    file: PathBuf,
    /// Program name the script completes (defaults to the root command name).
    #[arg(long)]
    program: Option<String>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Definition file (.json, .yaml or .yml).
    file: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Arguments to bind, given after `--`.
    #[arg(last = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Resolution result printed by `parse`.
#[derive(Debug, Serialize)]
struct ParseOutput {
    command: Vec<String>,
    action: &'static str,
    options: BTreeMap<String, Value>,
    arguments: BTreeMap<String, Value>,
    rest: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidates: Option<Vec<String>>,
}

fn main() {
    let cli = Cli::parse();

    let settings = Settings::from_env();
    let debug = settings.debug || cli.debug;
    init_logging(&settings.with_debug(debug));

    let result = match cli.command {
        CliCommand::Check(args) => run_check(args),
        CliCommand::Help(args) => run_help(args),
        CliCommand::Completion(args) => run_completion(args),
        CliCommand::Parse(args) => run_parse(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load(path: &Path) -> Result<(CommandDefinition, Command), String> {
    let definition = CommandDefinition::load(path)
        .map_err(|err| format!("Failed to load '{}': {err}", path.display()))?;
    let command = definition
        .build()
        .map_err(|err| format!("Invalid definition '{}': {err}", path.display()))?;
    debug!(path = %path.display(), command = %command.name(), "Built command tree");
    Ok((definition, command))
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let (definition, _) = load(&args.file)?;
    println!(
        "Validated definition '{}' with {} command(s).",
        definition.name,
        definition.command_count()
    );
    Ok(())
}

fn run_help(args: HelpArgs) -> Result<(), String> {
    let (_, command) = load(&args.file)?;

    let mut current = &command;
    for name in &args.path {
        current = current.find_sub_command(name).ok_or_else(|| {
            format!("Unknown sub-command '{name}' under '{}'", current.name())
        })?;
    }

    // Route to the command with the help flag so inherited options show up.
    let mut tokens = args.path.clone();
    tokens.push("--help".to_string());
    let bound = command
        .try_with_runtime_args(tokens)
        .map_err(|err| err.to_string())?;
    let resolved = route(&bound).map_err(|err| err.error.to_string())?;
    println!("{}", DefaultHelpFormatter.format_help(resolved.command()));
    Ok(())
}

fn run_completion(args: CompletionArgs) -> Result<(), String> {
    let (_, command) = load(&args.file)?;
    let program = args.program.unwrap_or_else(|| command.name().to_string());
    print!("{}", BashCompletion.script(&command, &program));
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let (_, command) = load(&args.file)?;
    let bound = command
        .try_with_runtime_args(args.args)
        .map_err(|err| err.to_string())?;
    let resolved = route(&bound).map_err(|err| err.error.to_string())?;
    let target = resolved.command();
    let parsed = target.parsed().cloned().unwrap_or_default();

    let (action, candidates) = match &resolved.action {
        Action::ShowHelp => ("help", None),
        Action::Completion => ("completion", None),
        Action::Candidates(partial) => (
            "candidates",
            Some(BashCompletion.candidates(target, partial)),
        ),
        Action::Invoke => {
            check_required(&parsed, &target.all_options(), &target.all_arguments())
                .map_err(|err| err.to_string())?;
            ("invoke", None)
        }
    };

    let mut path = target.path().to_vec();
    path.push(target.name().to_string());
    let output = ParseOutput {
        command: path,
        action,
        options: parsed.options,
        arguments: parsed.arguments,
        rest: parsed.positionals,
        candidates,
    };

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&output)
            .map_err(|err| format!("JSON serialization failed: {err}"))?,
        OutputFormat::Yaml => serde_yaml::to_string(&output)
            .map_err(|err| format!("YAML serialization failed: {err}"))?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
