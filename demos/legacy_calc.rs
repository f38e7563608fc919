//! Option-string example.
//!
//! Declares its interface with commander-style strings, which are translated
//! into the regular option/argument schema.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-tree-demos --bin legacy-calc -- 1 2 3
//! cargo run -p command-tree-demos --bin legacy-calc -- -o mean -p 3 1 2 2
//! ```

use std::process::ExitCode;

use anyhow::bail;
use command_tree_core::optstring;
use command_tree_core::{Command, Context, DefinitionError, Settings, init_logging};

const OPERATIONS: &[&str] = &["sum", "product", "mean", "min", "max"];

fn build() -> Result<Command, DefinitionError> {
    Command::new("legacy-calc")
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_description("Fold a list of numbers")
        .with_option(
            optstring::option("-o, --operation <op>")?
                .with_default("sum")
                .with_description("One of sum, product, mean, min, max"),
        )?
        .with_option(
            optstring::option("-p, --precision <digits:number>")?
                .with_default(2.0)
                .with_description("Decimal places in the result"),
        )?
        .with_optstring("-v, --verbose", "Echo the operands")?
        .with_argstring("<values:number...>", "Numbers to fold")
        .map(|command| command.with_handler(calculate))
}

fn calculate(cmd: &Command, _: &Context) -> anyhow::Result<()> {
    let operation = cmd.string("operation").unwrap_or("sum");
    let precision = cmd.number("precision").unwrap_or(2.0);
    if !(0.0..=12.0).contains(&precision) || precision.fract() != 0.0 {
        bail!("precision must be a whole number between 0 and 12, got {precision}");
    }

    let values: Vec<f64> = cmd
        .value("values")
        .and_then(|v| v.as_list())
        .map(|items| items.iter().filter_map(|item| item.as_f64()).collect())
        .unwrap_or_default();

    let result = match operation {
        "sum" => values.iter().sum(),
        "product" => values.iter().product(),
        "mean" => values.iter().sum::<f64>() / values.len() as f64,
        "min" => values.iter().copied().fold(f64::INFINITY, f64::min),
        "max" => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        other => bail!(
            "unknown operation '{other}' (expected one of {})",
            OPERATIONS.join(", ")
        ),
    };

    if cmd.flag("verbose") {
        let operands: Vec<String> = values.iter().map(f64::to_string).collect();
        println!("{operation}({})", operands.join(", "));
    }
    println!("{result:.prec$}", prec = precision as usize);
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
