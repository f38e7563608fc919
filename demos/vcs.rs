//! Nested sub-command example.
//!
//! `vcs` shows inherited root options, a pre-processor chain that builds up
//! the context on the way down, async handlers and an interactive prompt.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-tree-demos --bin vcs -- -v -u ada commit -m "first"
//! cargo run -p command-tree-demos --bin vcs -- remote add upstream https://example.org/up.git
//! cargo run -p command-tree-demos --bin vcs -- remote list
//! source <(cargo run -q -p command-tree-demos --bin vcs -- completion)
//! ```

use std::process::ExitCode;

use anyhow::anyhow;
use command_tree_core::{
    Command, Context, DefinitionError, LinePrompt, Prompt, ReturnCode, Settings, flag,
    init_logging, string_arg, string_option,
};
use tracing::debug;

const DEFAULT_REMOTE: (&str, &str) = ("origin", "https://example.org/vcs.git");

/// Who is running the command; opened by the root pre-processor.
#[derive(Debug, Clone)]
struct Session {
    user: String,
    verbose: bool,
}

/// Known remotes; loaded by the `remote` pre-processor.
#[derive(Debug, Clone, Default)]
struct Remotes(Vec<(String, String)>);

fn build() -> Result<Command, DefinitionError> {
    let commit = Command::new("commit")
        .with_description("Record changes")
        .with_option(
            string_option("message")
                .with_short('m')
                .with_description("Commit message; prompted for when omitted"),
        )?
        .with_option(flag("amend").with_description("Replace the previous commit"))?
        .with_async_handler(run_commit);

    let add = Command::new("add")
        .with_description("Add a remote")
        .with_argument(string_arg("name").mark_required())?
        .with_argument(string_arg("url").mark_required())?
        .with_async_handler(run_add_remote);

    let list = Command::new("list")
        .with_description("List remotes")
        .with_handler(run_list_remotes);

    let remote = Command::new("remote")
        .with_description("Manage remotes")
        .with_pre_processor(load_remotes)
        .with_sub_command(add)?
        .with_sub_command(list)?;

    Command::new("vcs")
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_description("A toy version control front end")
        .with_option(flag("verbose").with_short('v').with_description("Print more"))?
        .with_option(
            string_option("user")
                .with_short('u')
                .with_default("anonymous")
                .with_description("Author name"),
        )?
        .with_pre_processor(open_session)
        .with_sub_command(commit)?
        .with_sub_command(remote)
}

fn open_session(cmd: &Command, ctx: &Context) -> anyhow::Result<Option<Context>> {
    let session = Session {
        user: cmd.string("user").unwrap_or("anonymous").to_string(),
        verbose: cmd.flag("verbose"),
    };
    debug!(user = %session.user, "Opened session");
    Ok(Some(ctx.with("session", session)))
}

fn load_remotes(_: &Command, ctx: &Context) -> anyhow::Result<Option<Context>> {
    let (name, url) = DEFAULT_REMOTE;
    let remotes = Remotes(vec![(name.to_string(), url.to_string())]);
    Ok(Some(ctx.with("remotes", remotes)))
}

fn current_session(ctx: &Context) -> anyhow::Result<Session> {
    ctx.get::<Session>("session")
        .cloned()
        .ok_or_else(|| anyhow!("no session in context"))
}

async fn run_commit(cmd: Command, ctx: Context) -> anyhow::Result<ReturnCode> {
    let session = current_session(&ctx)?;
    let message = match cmd.string("message") {
        Some(message) => message.to_string(),
        None => {
            let mut prompt = LinePrompt::stdio();
            prompt.ask("Commit message", Some("WIP")).await?
        }
    };
    if message.trim().is_empty() {
        eprintln!("error: empty commit message");
        return Ok(ReturnCode::Failure);
    }

    let verb = if cmd.flag("amend") { "Amended" } else { "Committed" };
    println!("{verb} \"{message}\"");
    if session.verbose {
        println!("author: {}", session.user);
    }
    Ok(ReturnCode::Success)
}

async fn run_add_remote(cmd: Command, ctx: Context) -> anyhow::Result<ReturnCode> {
    let session = current_session(&ctx)?;
    let remotes = ctx.get::<Remotes>("remotes").cloned().unwrap_or_default();
    let name = cmd.string("name").unwrap_or_default();
    let url = cmd.string("url").unwrap_or_default();

    if remotes.0.iter().any(|(existing, _)| existing == name) {
        eprintln!("error: remote '{name}' already exists");
        return Ok(ReturnCode::Failure);
    }

    println!("Added remote '{name}' -> {url}");
    if session.verbose {
        println!("by: {}", session.user);
    }
    Ok(ReturnCode::Success)
}

fn run_list_remotes(_: &Command, ctx: &Context) -> anyhow::Result<()> {
    if let Some(Remotes(remotes)) = ctx.get::<Remotes>("remotes") {
        for (name, url) in remotes {
            println!("{name}\t{url}");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging(&Settings::from_env());

    let app = match build() {
        Ok(app) => app,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match app.with_env_args().run() {
        Ok(code) => code.into(),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
