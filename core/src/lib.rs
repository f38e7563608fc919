//! Declarative command trees for command-line programs.
//!
//! This crate builds an immutable tree of [`Command`]s, binds a raw argument
//! vector to each command's declared options and arguments, resolves the
//! sub-command path named by the positional tokens, and runs the
//! pre-processor chain and handler of the command it lands on:
//!
//! - [`OptionSchema`] / [`ArgSchema`]: value slots built with the factory
//!   functions ([`flag`], [`string_option`], [`numeric_arg`], …).
//! - [`tokenize`]: the raw token parser (`--long=v`, `-abc`, `--`).
//! - [`bind`]: typed binding with alias, multiplicity and number checks.
//! - [`Command`]: the copy-on-write builder; every call returns a new
//!   snapshot.
//! - [`dispatch`]: resolution precedence (sub-command, help, completion,
//!   handler) and the [`Dispatcher`] that executes it.
//! - [`Context`]: the persistent map threaded through pre-processors.
//!
//! Help text ([`help`]), shell completion ([`completion`]), prompts
//! ([`prompt`]), commander-style option strings ([`optstring`]) and file
//! definitions ([`definition`]) sit around the core.
//!
//! # Example
//!
//! ```
//! use command_tree_core::*;
//!
//! let deploy = Command::new("deploy")
//!     .with_argument(string_arg("target").mark_required())?
//!     .with_handler(|cmd, ctx| {
//!         let user = ctx.get::<String>("user").map(String::as_str).unwrap_or("?");
//!         assert_eq!(user, "ops");
//!         assert!(cmd.flag("force"));
//!         assert_eq!(cmd.string("target"), Some("prod"));
//!         Ok(ReturnCode::Success)
//!     });
//!
//! let app = Command::new("app")
//!     .with_version("1.0.0")
//!     .with_option(flag("force").with_short('f'))?
//!     .with_pre_processor(|_, ctx| Ok(Some(ctx.with("user", String::from("ops")))))
//!     .with_sub_command(deploy)?;
//!
//! let bound = app.try_with_runtime_args(["-f", "deploy", "prod"]).unwrap();
//! let (mut out, mut err) = (Vec::new(), Vec::new());
//! let code = Dispatcher::new(&mut out, &mut err)
//!     .dispatch_blocking(&bound, Context::new())
//!     .unwrap();
//! assert_eq!(code, ReturnCode::Success);
//! # Ok::<(), DefinitionError>(())
//! ```

pub mod bind;
pub mod command;
pub mod completion;
pub mod config;
pub mod context;
pub mod definition;
pub mod dispatch;
pub mod error;
pub mod help;
pub mod optstring;
pub mod prompt;
pub mod schema;
pub mod tokenize;
pub mod value;

pub use bind::ParsedArgs;
pub use command::{Command, Handler};
pub use completion::{BashCompletion, CompletionGenerator};
pub use config::{Settings, init_logging};
pub use context::{Context, PreProcessor};
pub use definition::CommandDefinition;
pub use dispatch::{Action, Dispatcher, IntoReturnCode, ReturnCode, Route, route};
pub use error::{BindingError, DefinitionError, DefinitionLoadError, DispatchError};
pub use help::{DefaultHelpFormatter, HelpFormatter};
pub use prompt::{LinePrompt, Prompt};
pub use schema::{
    ArgSchema, OptionSchema, flag, multi_string_arg, multi_string_option, numeric_arg,
    numeric_option, string_arg, string_option,
};
pub use value::{Value, ValueKind};
