//! Resolution and dispatch.
//!
//! [`route`] walks the residual positional tokens from the root command,
//! recursing into sub-commands and re-binding each child from the original
//! token vector. At the command where the walk stops it picks one of the
//! terminal [`Action`]s, evaluated in this order against the first residual
//! token (`arg0`):
//!
//! 1. `arg0` names a sub-command: recurse into it.
//! 2. The help flag is set or `arg0` is `help`: show help.
//! 3. `arg0` is `completion`: print the shell completion script.
//! 4. `arg0` is a completion query (`get-completions`): print candidates.
//! 5. Otherwise invoke: run the pre-processor chain, then the handler.
//!
//! [`Dispatcher`] executes a route. The handler call is the only point where
//! dispatch suspends.

use std::io::{self, Stderr, Stdout, Write};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::bind::{ParsedArgs, bind_raw, check_required, hints_for};
use crate::command::{Command, Handler};
use crate::completion::{BashCompletion, CompletionGenerator};
use crate::context::Context;
use crate::error::{BindingError, DispatchError};
use crate::help::{DefaultHelpFormatter, HelpFormatter};
use crate::tokenize::tokenize;

/// Positional token that shows help.
pub const HELP_COMMAND: &str = "help";
/// Positional token that prints the completion script.
pub const COMPLETION_COMMAND: &str = "completion";
/// Positional tokens that print completion candidates.
pub const COMPLETION_QUERIES: &[&str] = &["get-completions"];

/// Two-valued outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    Success,
    Failure,
}

impl ReturnCode {
    /// Process exit code: `0` or `1`.
    pub fn code(self) -> i32 {
        match self {
            ReturnCode::Success => 0,
            ReturnCode::Failure => 1,
        }
    }

    pub fn is_success(self) -> bool {
        self == ReturnCode::Success
    }
}

impl From<ReturnCode> for std::process::ExitCode {
    fn from(code: ReturnCode) -> Self {
        match code {
            ReturnCode::Success => std::process::ExitCode::SUCCESS,
            ReturnCode::Failure => std::process::ExitCode::FAILURE,
        }
    }
}

/// Conversion of handler results into a [`ReturnCode`].
pub trait IntoReturnCode {
    fn into_return_code(self) -> ReturnCode;
}

impl IntoReturnCode for ReturnCode {
    fn into_return_code(self) -> ReturnCode {
        self
    }
}

impl IntoReturnCode for () {
    fn into_return_code(self) -> ReturnCode {
        ReturnCode::Success
    }
}

impl IntoReturnCode for bool {
    fn into_return_code(self) -> ReturnCode {
        if self {
            ReturnCode::Success
        } else {
            ReturnCode::Failure
        }
    }
}

impl IntoReturnCode for Option<ReturnCode> {
    fn into_return_code(self) -> ReturnCode {
        self.unwrap_or(ReturnCode::Success)
    }
}

/// What to do at the command where resolution stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ShowHelp,
    Completion,
    /// Partial token sequence that followed the completion query.
    Candidates(Vec<String>),
    Invoke,
}

/// The bound commands from the root to the resolved command, plus the action.
#[derive(Debug, Clone)]
pub struct Route {
    pub chain: Vec<Command>,
    pub action: Action,
}

impl Route {
    /// The root command snapshot.
    pub fn root(&self) -> &Command {
        &self.chain[0]
    }

    /// The command resolution stopped at.
    pub fn command(&self) -> &Command {
        &self.chain[self.chain.len() - 1]
    }
}

/// A child command failed to bind during resolution.
#[derive(Debug)]
pub struct RouteError {
    /// The (unbound) command whose arguments were rejected.
    pub command: Command,
    pub error: BindingError,
}

/// Resolves `command` down the tree without running any user code.
///
/// An unbound command is bound to an empty token vector first.
///
/// # Examples
///
/// ```
/// use command_tree_core::dispatch::{route, Action};
/// use command_tree_core::{flag, Command};
///
/// let root = Command::new("app")
///     .with_option(flag("force"))?
///     .with_sub_command(Command::new("sub"))?;
///
/// let resolved = route(&root.try_with_runtime_args(["sub", "--force"]).unwrap()).unwrap();
/// assert_eq!(resolved.command().full_name(), "app sub");
/// assert!(resolved.command().flag("force"));
/// assert_eq!(resolved.action, Action::Invoke);
///
/// let resolved = route(&root.try_with_runtime_args(["help"]).unwrap()).unwrap();
/// assert_eq!(resolved.action, Action::ShowHelp);
/// # Ok::<(), command_tree_core::DefinitionError>(())
/// ```
pub fn route(command: &Command) -> Result<Route, RouteError> {
    let root = if command.is_bound() {
        command.clone()
    } else {
        command
            .try_with_runtime_args(Vec::<String>::new())
            .map_err(|error| RouteError {
                command: command.clone(),
                error,
            })?
    };

    let mut chain = vec![root];
    loop {
        let current = &chain[chain.len() - 1];
        let arg0 = current.parsed().and_then(ParsedArgs::first_positional);

        if let Some(sub) = arg0.and_then(|token| current.find_sub_command(token)) {
            debug!(command = %current.full_name(), token = ?arg0, "Recursing into sub-command");
            let child = descend(current, sub)?;
            chain.push(child);
            continue;
        }

        let action = if current.flag(crate::command::HELP_FLAG) || arg0 == Some(HELP_COMMAND) {
            Action::ShowHelp
        } else if arg0 == Some(COMPLETION_COMMAND) {
            Action::Completion
        } else if let (None, Some(words)) = (arg0, current.completion_words()) {
            Action::Candidates(words.to_vec())
        } else if let Some(query) = arg0.filter(|t| COMPLETION_QUERIES.contains(t)) {
            Action::Candidates(tokens_after(current.runtime_args().unwrap_or_default(), query))
        } else {
            Action::Invoke
        };

        debug!(command = %current.full_name(), action = ?action, "Resolved command");
        return Ok(Route { chain, action });
    }
}

/// Builds and binds the transient child of `parent` named by its first
/// residual token.
fn descend(parent: &Command, sub: &Command) -> Result<Command, RouteError> {
    let child = parent.child_of(sub);
    let tokens = parent.runtime_tokens();
    let options = child.all_options();

    let mut raw = tokenize(tokens.as_slice(), &hints_for(&options));
    let consumed: Vec<String> = child.path()[1..]
        .iter()
        .cloned()
        .chain(std::iter::once(child.name().to_string()))
        .collect();
    if raw.positionals.starts_with(&consumed) {
        raw.positionals.drain(..consumed.len());
    } else {
        // The child's hints split the tokens differently; fall back to the
        // parent's residual list advanced past arg0.
        raw.positionals = parent
            .parsed()
            .map(|p| p.positionals.iter().skip(1).cloned().collect())
            .unwrap_or_default();
    }
    if let Some(parent_parsed) = parent.parsed() {
        raw = raw.merged_over(&parent_parsed.raw);
    }

    let mut parsed = bind_raw(raw, &options, child.arguments()).map_err(|error| RouteError {
        command: child.clone(),
        error,
    })?;
    if let Some(parent_parsed) = parent.parsed() {
        for (name, value) in &parent_parsed.arguments {
            parsed
                .arguments
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }

    Ok(child.with_binding(tokens, parsed))
}

fn tokens_after(tokens: &[String], marker: &str) -> Vec<String> {
    tokens
        .iter()
        .position(|t| t == marker)
        .map(|idx| tokens[idx + 1..].to_vec())
        .unwrap_or_default()
}

/// Executes routes, writing help and completion output to its sinks.
///
/// # Examples
///
/// ```
/// use command_tree_core::{Command, Context, Dispatcher, ReturnCode};
///
/// let cmd = Command::new("hello")
///     .with_handler(|_, _| Ok(()))
///     .try_with_runtime_args(["help"])
///     .unwrap();
///
/// let (mut out, mut err) = (Vec::new(), Vec::new());
/// let code = Dispatcher::new(&mut out, &mut err)
///     .dispatch_blocking(&cmd, Context::new())
///     .unwrap();
///
/// assert_eq!(code, ReturnCode::Success);
/// assert!(String::from_utf8(out).unwrap().contains("Usage: hello"));
/// ```
pub struct Dispatcher<W: Write, E: Write> {
    out: W,
    err: E,
    formatter: Arc<dyn HelpFormatter>,
    completion: Arc<dyn CompletionGenerator>,
    program: Option<String>,
}

impl Dispatcher<Stdout, Stderr> {
    /// A dispatcher writing to the process's stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<W: Write, E: Write> Dispatcher<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self {
            out,
            err,
            formatter: Arc::new(DefaultHelpFormatter),
            completion: Arc::new(BashCompletion),
            program: None,
        }
    }

    pub fn with_formatter(mut self, formatter: impl HelpFormatter + 'static) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn with_completion(mut self, completion: impl CompletionGenerator + 'static) -> Self {
        self.completion = Arc::new(completion);
        self
    }

    /// Program name used in the completion script (defaults to the root
    /// command's name).
    pub fn with_program_name(mut self, program: &str) -> Self {
        self.program = Some(program.to_string());
        self
    }

    /// Resolves and runs `command`.
    ///
    /// Binding failures print the error and help to the error sink and
    /// yield [`ReturnCode::Failure`]. Handler and pre-processor errors are
    /// returned unmodified as [`DispatchError::Handler`].
    pub async fn dispatch(
        &mut self,
        command: &Command,
        context: Context,
    ) -> Result<ReturnCode, DispatchError> {
        let route = match route(command) {
            Ok(route) => route,
            Err(RouteError { command, error }) => {
                self.report_binding_error(&command, &error)?;
                return Ok(ReturnCode::Failure);
            }
        };

        let target = route.command();
        match &route.action {
            Action::ShowHelp => {
                writeln!(self.out, "{}", self.formatter.format_help(target))?;
                Ok(ReturnCode::Success)
            }
            Action::Completion => {
                let program = self
                    .program
                    .clone()
                    .unwrap_or_else(|| route.root().name().to_string());
                writeln!(self.out, "{}", self.completion.script(route.root(), &program))?;
                Ok(ReturnCode::Success)
            }
            Action::Candidates(partial) => {
                let candidates = self.completion.candidates(target, partial);
                writeln!(self.out, "{}", candidates.join(" "))?;
                Ok(ReturnCode::Success)
            }
            Action::Invoke => self.invoke(&route, context).await,
        }
    }

    /// [`dispatch`](Dispatcher::dispatch) driven to completion on the
    /// current thread.
    pub fn dispatch_blocking(
        &mut self,
        command: &Command,
        context: Context,
    ) -> Result<ReturnCode, DispatchError> {
        futures::executor::block_on(self.dispatch(command, context))
    }

    /// Prints `error: …` followed by the command's help to the error sink.
    pub fn report_binding_error(
        &mut self,
        command: &Command,
        error: &BindingError,
    ) -> Result<(), DispatchError> {
        warn!(command = %command.full_name(), error = %error, "Runtime arguments rejected");
        writeln!(self.err, "error: {error}\n")?;
        writeln!(self.err, "{}", self.formatter.format_help(command))?;
        Ok(())
    }

    async fn invoke(&mut self, route: &Route, context: Context) -> Result<ReturnCode, DispatchError> {
        let target = route.command();
        let parsed = target.parsed().cloned().unwrap_or_default();
        if let Err(error) = check_required(&parsed, &target.all_options(), &target.all_arguments())
        {
            self.report_binding_error(target, &error)?;
            return Ok(ReturnCode::Failure);
        }

        let mut context = context.with_root(route.root());
        for command in &route.chain {
            for pre_processor in command.pre_processors() {
                if let Some(next) = pre_processor(command, &context).map_err(DispatchError::Handler)?
                {
                    context = next;
                }
            }
        }

        match target.handler() {
            Some(Handler::Sync(handler)) => {
                debug!(command = %target.full_name(), "Invoking handler");
                handler(target, &context).map_err(DispatchError::Handler)
            }
            Some(Handler::Async(handler)) => {
                debug!(command = %target.full_name(), "Awaiting async handler");
                handler(target.clone(), context)
                    .await
                    .map_err(DispatchError::Handler)
            }
            None => {
                warn!(command = %target.full_name(), "No handler defined");
                writeln!(
                    self.err,
                    "warning: no handler defined for '{}'\n",
                    target.full_name()
                )?;
                writeln!(self.out, "{}", self.formatter.format_help(target))?;
                Ok(ReturnCode::Failure)
            }
        }
    }
}

impl Command {
    /// Runs this command against the process arguments with an empty
    /// context, writing to stdout/stderr.
    ///
    /// An unbound command is bound to `std::env::args()` first.
    pub fn run(&self) -> Result<ReturnCode, DispatchError> {
        self.run_with_context(Context::new())
    }

    /// Like [`run`](Command::run) with an explicit starting context.
    pub fn run_with_context(&self, context: Context) -> Result<ReturnCode, DispatchError> {
        futures::executor::block_on(self.run_async(context))
    }

    /// Async form of [`run_with_context`](Command::run_with_context), for
    /// embedding in an existing executor.
    pub async fn run_async(&self, context: Context) -> Result<ReturnCode, DispatchError> {
        let mut dispatcher = Dispatcher::stdio();
        if self.is_bound() {
            return dispatcher.dispatch(self, context).await;
        }
        match self.try_with_runtime_args(std::env::args().skip(1)) {
            Ok(bound) => dispatcher.dispatch(&bound, context).await,
            Err(error) => {
                dispatcher.report_binding_error(&self.with_help_flag(), &error)?;
                Ok(ReturnCode::Failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{flag, numeric_arg, numeric_option, string_arg, string_option};

    fn tree() -> Command {
        let remote = Command::new("remote")
            .with_sub_command(
                Command::new("add")
                    .with_argument(string_arg("name"))
                    .unwrap(),
            )
            .unwrap();
        Command::new("vcs")
            .with_option(flag("verbose").with_short('v'))
            .unwrap()
            .with_sub_command(remote)
            .unwrap()
    }

    #[test]
    fn test_route_descends_nested_sub_commands() {
        let bound = tree().try_with_runtime_args(["remote", "add", "origin"]).unwrap();
        let route = route(&bound).unwrap();
        let names: Vec<_> = route.chain.iter().map(Command::full_name).collect();
        assert_eq!(names, vec!["vcs", "vcs remote", "vcs remote add"]);
        assert_eq!(route.command().string("name"), Some("origin"));
        assert_eq!(route.command().positionals(), ["origin".to_string()]);
    }

    #[test]
    fn test_child_sees_flag_given_before_sub_command() {
        let bound = tree().try_with_runtime_args(["-v", "remote", "add", "x"]).unwrap();
        let route = route(&bound).unwrap();
        assert!(route.command().flag("verbose"));
    }

    #[test]
    fn test_unknown_token_falls_through_to_invoke() {
        let bound = tree().try_with_runtime_args(["nope"]).unwrap();
        let route = route(&bound).unwrap();
        assert_eq!(route.chain.len(), 1);
        assert_eq!(route.action, Action::Invoke);
    }

    #[test]
    fn test_help_token_and_flag_resolve_to_help() {
        let by_token = route(&tree().try_with_runtime_args(["remote", "help"]).unwrap()).unwrap();
        assert_eq!(by_token.command().full_name(), "vcs remote");
        assert_eq!(by_token.action, Action::ShowHelp);

        let by_flag = route(&tree().try_with_runtime_args(["--help"]).unwrap()).unwrap();
        assert_eq!(by_flag.action, Action::ShowHelp);
    }

    #[test]
    fn test_completion_actions() {
        let script = route(&tree().try_with_runtime_args(["completion"]).unwrap()).unwrap();
        assert_eq!(script.action, Action::Completion);

        let query = route(
            &tree()
                .try_with_runtime_args(["get-completions", "remote", "--v"])
                .unwrap(),
        )
        .unwrap();
        assert_eq!(
            query.action,
            Action::Candidates(vec!["remote".to_string(), "--v".to_string()])
        );
    }

    #[test]
    fn test_completion_words_skip_option_checks() {
        let cmd = Command::new("build")
            .with_option(numeric_option("jobs").with_short('j'))
            .unwrap()
            .with_argument(numeric_arg("count"))
            .unwrap();

        let bound = cmd.try_with_runtime_args(["get-completions", "--jobs", ""]).unwrap();
        assert_eq!(bound.runtime_args(), Some(&[][..]));
        let resolved = route(&bound).unwrap();
        assert_eq!(
            resolved.action,
            Action::Candidates(vec!["--jobs".to_string(), String::new()])
        );

        let bound = cmd.try_with_runtime_args(["-j", "2", "get-completions", "-j", "x"]).unwrap();
        assert_eq!(bound.number("jobs"), Some(2.0));
        assert_eq!(bound.value("count"), None);
    }

    #[test]
    fn test_completion_query_after_sub_command_path() {
        let bound = tree()
            .try_with_runtime_args(["-v", "remote", "get-completions", "add", ""])
            .unwrap();
        let resolved = route(&bound).unwrap();
        assert_eq!(resolved.command().full_name(), "vcs remote");
        assert_eq!(
            resolved.action,
            Action::Candidates(vec!["add".to_string(), String::new()])
        );
    }

    #[test]
    fn test_query_token_as_option_value_is_bound() {
        let cmd = Command::new("app")
            .with_option(string_option("name"))
            .unwrap()
            .with_handler(|_, _| Ok(()));
        let bound = cmd.try_with_runtime_args(["--name", "get-completions"]).unwrap();
        assert_eq!(bound.string("name"), Some("get-completions"));
        assert_eq!(route(&bound).unwrap().action, Action::Invoke);
    }

    #[test]
    fn test_child_binding_error_names_child() {
        let root = Command::new("app")
            .with_sub_command(
                Command::new("calc")
                    .with_option(numeric_option("n"))
                    .unwrap(),
            )
            .unwrap();
        let bound = root.try_with_runtime_args(["calc", "--n", "x"]).unwrap();
        let err = route(&bound).unwrap_err();
        assert_eq!(err.command.full_name(), "app calc");
        assert!(matches!(err.error, BindingError::InvalidNumber { .. }));
    }

    #[test]
    fn test_child_option_may_shadow_parent_option() {
        let root = Command::new("app")
            .with_option(string_option("mode").with_short('m'))
            .unwrap()
            .with_sub_command(
                Command::new("sub")
                    .with_option(flag("mode"))
                    .unwrap(),
            )
            .unwrap();
        let bound = root.try_with_runtime_args(["sub", "--mode"]);
        // The root sees `--mode` without a value.
        assert!(matches!(bound, Err(BindingError::MissingValue { .. })));

        let bound = root.try_with_runtime_args(["--mode=x", "sub"]).unwrap();
        let route = route(&bound).unwrap();
        assert!(route.command().flag("mode"));
    }

    #[test]
    fn test_missing_required_fails_at_invoke_but_not_help() {
        let cmd = Command::new("app")
            .with_argument(string_arg("file").mark_required())
            .unwrap()
            .with_handler(|_, _| Ok(()));

        let (mut out, mut err) = (Vec::new(), Vec::new());
        let bound = cmd.try_with_runtime_args(Vec::<String>::new()).unwrap();
        let code = Dispatcher::new(&mut out, &mut err)
            .dispatch_blocking(&bound, Context::new())
            .unwrap();
        assert_eq!(code, ReturnCode::Failure);
        assert!(String::from_utf8_lossy(&err).contains("missing required value for 'file'"));

        let bound = cmd.try_with_runtime_args(["--help"]).unwrap();
        let code = Dispatcher::new(Vec::new(), Vec::new())
            .dispatch_blocking(&bound, Context::new())
            .unwrap();
        assert_eq!(code, ReturnCode::Success);
    }

    #[test]
    fn test_into_return_code() {
        assert_eq!(().into_return_code(), ReturnCode::Success);
        assert_eq!(false.into_return_code(), ReturnCode::Failure);
        assert_eq!(None::<ReturnCode>.into_return_code(), ReturnCode::Success);
        assert_eq!(ReturnCode::Failure.code(), 1);
    }
}
