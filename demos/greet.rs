//! Greeting example.
//!
//! A single command with a flag, string/numeric/multi-valued options and an
//! optional positional argument.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-tree-demos --bin greet -- --times 2 -s Ada
//! cargo run -p command-tree-demos --bin greet -- --help
//! ```

use std::process::ExitCode;

use anyhow::bail;
use command_tree_core::{
    Command, Context, DefinitionError, Settings, flag, init_logging, multi_string_option, numeric_option,
    string_arg, string_option,
};

const MAX_TIMES: f64 = 100.0;

fn build() -> Result<Command, DefinitionError> {
    Command::new("greet")
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_description("Print a greeting")
        .with_option(flag("shout").with_short('s').with_description("Upper-case the greeting"))?
        .with_option(
            numeric_option("times")
                .with_short('t')
                .with_default(1.0)
                .with_description("How many times to greet"),
        )?
        .with_option(
            string_option("greeting")
                .with_short('g')
                .with_default("Hello")
                .with_description("Greeting word"),
        )?
        .with_option(multi_string_option("tag").with_description("Labels appended to the line"))?
        .with_argument(
            string_arg("name")
                .with_default("world")
                .with_description("Who to greet"),
        )
        .map(|command| command.with_handler(greet))
}

fn greet(cmd: &Command, _: &Context) -> anyhow::Result<()> {
    let times = cmd.number("times").unwrap_or(1.0);
    if times < 1.0 || times.fract() != 0.0 {
        bail!("--times must be a positive whole number, got {times}");
    }
    if times > MAX_TIMES {
        bail!("--times must be at most {MAX_TIMES}, got {times}");
    }

    let mut line = format!(
        "{}, {}!",
        cmd.string("greeting").unwrap_or("Hello"),
        cmd.string("name").unwrap_or("world")
    );
    let tags = cmd.strings("tag");
    if !tags.is_empty() {
        line.push_str(&format!(" [{}]", tags.join(", ")));
    }
    if cmd.flag("shout") {
        line = line.to_uppercase();
    }

    for _ in 0..times as u32 {
        println!("{line}");
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
