//! The immutable command tree node and its builder API.
//!
//! Every builder call returns a new [`Command`]; the receiver keeps its
//! configuration. Collections are shared behind [`Arc`] and copied on write,
//! so snapshots are cheap to take and safe to read from anywhere.
//!
//! # Examples
//!
//! ```
//! use command_tree_core::{flag, string_arg, Command};
//!
//! let base = Command::new("deploy");
//! let configured = base
//!     .with_description("Deploy the current build")
//!     .with_option(flag("force").with_short('f'))?
//!     .with_argument(string_arg("target").mark_required())?;
//!
//! assert!(base.options().is_empty());
//! assert_eq!(configured.options().len(), 1);
//! assert_eq!(configured.arguments()[0].name, "target");
//! # Ok::<(), command_tree_core::DefinitionError>(())
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::bind::{ParsedArgs, bind, hints_for};
use crate::context::{Context, PreProcessor};
use crate::dispatch::{COMPLETION_QUERIES, IntoReturnCode, ReturnCode};
use crate::error::{BindingError, DefinitionError, Result};
use crate::help::{DefaultHelpFormatter, HelpFormatter};
use crate::schema::{ArgSchema, OptionSchema, flag};
use crate::tokenize::tokenize;
use crate::value::Value;

/// Name of the auto-injected help flag.
pub const HELP_FLAG: &str = "help";

/// Synchronous handler.
pub type SyncHandler =
    Arc<dyn Fn(&Command, &Context) -> anyhow::Result<ReturnCode> + Send + Sync>;

/// Asynchronous handler; the dispatcher awaits the returned future.
pub type AsyncHandler =
    Arc<dyn Fn(Command, Context) -> BoxFuture<'static, anyhow::Result<ReturnCode>> + Send + Sync>;

/// The function invoked when dispatch terminates at a command.
#[derive(Clone)]
pub enum Handler {
    Sync(SyncHandler),
    Async(AsyncHandler),
}

/// A node in the command tree.
#[derive(Clone)]
pub struct Command {
    name: String,
    version: Option<String>,
    description: Option<String>,
    options: Arc<Vec<OptionSchema>>,
    arguments: Arc<Vec<ArgSchema>>,
    sub_commands: Arc<Vec<Command>>,
    handler: Option<Handler>,
    pre_processors: Arc<Vec<PreProcessor>>,
    parent_options: Arc<Vec<OptionSchema>>,
    parent_arguments: Arc<Vec<ArgSchema>>,
    path: Arc<Vec<String>>,
    runtime_args: Option<Arc<Vec<String>>>,
    parsed: Option<Arc<ParsedArgs>>,
    completion_words: Option<Arc<Vec<String>>>,
}

impl Command {
    /// Creates a root command with only a name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: None,
            description: None,
            options: Arc::default(),
            arguments: Arc::default(),
            sub_commands: Arc::default(),
            handler: None,
            pre_processors: Arc::default(),
            parent_options: Arc::default(),
            parent_arguments: Arc::default(),
            path: Arc::default(),
            runtime_args: None,
            parsed: None,
            completion_words: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Options declared on this command.
    pub fn options(&self) -> &[OptionSchema] {
        &self.options
    }

    /// Positional arguments in declaration (binding) order.
    pub fn arguments(&self) -> &[ArgSchema] {
        &self.arguments
    }

    pub fn sub_commands(&self) -> &[Command] {
        &self.sub_commands
    }

    /// Options inherited from ancestors. Only populated during dispatch.
    pub fn parent_options(&self) -> &[OptionSchema] {
        &self.parent_options
    }

    /// Arguments inherited from ancestors. Only populated during dispatch.
    pub fn parent_arguments(&self) -> &[ArgSchema] {
        &self.parent_arguments
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    pub fn pre_processors(&self) -> &[PreProcessor] {
        &self.pre_processors
    }

    /// Names of the ancestors this command was dispatched through, root first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Space-separated path including this command (e.g. `git remote add`).
    pub fn full_name(&self) -> String {
        self.path
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The raw tokens this command was bound from.
    pub fn runtime_args(&self) -> Option<&[String]> {
        self.runtime_args.as_deref().map(Vec::as_slice)
    }

    /// The bound values, once runtime arguments were supplied.
    pub fn parsed(&self) -> Option<&ParsedArgs> {
        self.parsed.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.parsed.is_some()
    }

    /// Words that followed a completion query, left unbound.
    pub fn completion_words(&self) -> Option<&[String]> {
        self.completion_words.as_deref().map(Vec::as_slice)
    }

    /// Own options followed by inherited ones that no own option shadows.
    pub fn all_options(&self) -> Vec<OptionSchema> {
        let inherited = self
            .parent_options
            .iter()
            .filter(|p| !self.options.iter().any(|o| o.collides_with(p)));
        self.options.iter().chain(inherited).cloned().collect()
    }

    /// Inherited arguments that no own argument shadows, followed by own ones.
    pub fn all_arguments(&self) -> Vec<ArgSchema> {
        let inherited = self
            .parent_arguments
            .iter()
            .filter(|p| !self.arguments.iter().any(|a| a.name == p.name));
        inherited.chain(self.arguments.iter()).cloned().collect()
    }

    /// Finds a direct sub-command by name.
    pub fn find_sub_command(&self, name: &str) -> Option<&Command> {
        self.sub_commands.iter().find(|c| c.name == name)
    }

    /// Finds an own or inherited option by name.
    pub fn find_option(&self, name: &str) -> Option<OptionSchema> {
        self.all_options().into_iter().find(|o| o.name == name)
    }

    // ----- builder -----

    pub fn with_version(&self, version: &str) -> Command {
        let mut next = self.clone();
        next.version = Some(version.to_string());
        next
    }

    pub fn with_description(&self, description: &str) -> Command {
        let mut next = self.clone();
        next.description = Some(description.to_string());
        next
    }

    /// Adds an option.
    ///
    /// # Errors
    ///
    /// - [`DefinitionError::SchemaFrozen`] once runtime arguments are bound.
    /// - [`DefinitionError::DuplicateOption`] / [`DefinitionError::DuplicateAlias`]
    ///   if the name or an alias collides with an own or inherited option.
    /// - Shape errors from [`OptionSchema::validate_shape`].
    pub fn with_option(&self, option: OptionSchema) -> Result<Command> {
        self.ensure_unfrozen()?;
        let option = option.validate_shape()?;

        for existing in self.options.iter().chain(self.parent_options.iter()) {
            if existing.name == option.name {
                return Err(DefinitionError::DuplicateOption {
                    command: self.name.clone(),
                    name: option.name,
                });
            }
            let short_clash = option.short.is_some() && option.short == existing.short;
            let long_clash = option.long.is_some() && option.long == existing.long;
            if short_clash || long_clash {
                let alias = if short_clash {
                    option.short_alias()
                } else {
                    option.long_alias()
                };
                return Err(DefinitionError::DuplicateAlias {
                    command: self.name.clone(),
                    name: option.name.clone(),
                    alias: alias.unwrap_or_default(),
                });
            }
        }

        let mut next = self.clone();
        Arc::make_mut(&mut next.options).push(option);
        Ok(next)
    }

    /// Adds a positional argument after the existing ones.
    ///
    /// # Errors
    ///
    /// - [`DefinitionError::SchemaFrozen`] once runtime arguments are bound.
    /// - [`DefinitionError::ArgumentsWithSubCommands`] if sub-commands exist.
    /// - [`DefinitionError::ArgumentAfterMultiple`] if a multi-valued
    ///   argument was already declared.
    /// - [`DefinitionError::DuplicateArgument`] on a name collision.
    pub fn with_argument(&self, argument: ArgSchema) -> Result<Command> {
        self.ensure_unfrozen()?;
        let argument = argument.validate_shape()?;

        if !self.sub_commands.is_empty() {
            return Err(DefinitionError::ArgumentsWithSubCommands {
                command: self.name.clone(),
                name: argument.name,
            });
        }
        if let Some(multiple) = self.arguments.iter().find(|a| a.multiple) {
            return Err(DefinitionError::ArgumentAfterMultiple {
                command: self.name.clone(),
                name: argument.name,
                multiple: multiple.name.clone(),
            });
        }
        if self.arguments.iter().any(|a| a.name == argument.name) {
            return Err(DefinitionError::DuplicateArgument {
                command: self.name.clone(),
                name: argument.name,
            });
        }

        let mut next = self.clone();
        Arc::make_mut(&mut next.arguments).push(argument);
        Ok(next)
    }

    /// Adds a sub-command.
    ///
    /// # Errors
    ///
    /// - [`DefinitionError::SchemaFrozen`] once runtime arguments are bound.
    /// - [`DefinitionError::EmptyName`] for a blank sub-command name.
    /// - [`DefinitionError::SubCommandsWithArguments`] if arguments exist.
    /// - [`DefinitionError::DuplicateSubCommand`] on a sibling name collision.
    pub fn with_sub_command(&self, sub_command: Command) -> Result<Command> {
        self.ensure_unfrozen()?;
        if sub_command.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        if !self.arguments.is_empty() {
            return Err(DefinitionError::SubCommandsWithArguments {
                command: self.name.clone(),
                name: sub_command.name,
            });
        }
        if self.find_sub_command(&sub_command.name).is_some() {
            return Err(DefinitionError::DuplicateSubCommand {
                command: self.name.clone(),
                name: sub_command.name,
            });
        }

        let mut next = self.clone();
        Arc::make_mut(&mut next.sub_commands).push(sub_command);
        Ok(next)
    }

    /// Sets a synchronous handler.
    ///
    /// The handler's result converts through [`IntoReturnCode`]: `()` and
    /// `true` mean success, `false` means failure.
    pub fn with_handler<F, R>(&self, handler: F) -> Command
    where
        F: Fn(&Command, &Context) -> anyhow::Result<R> + Send + Sync + 'static,
        R: IntoReturnCode,
    {
        let mut next = self.clone();
        next.handler = Some(Handler::Sync(Arc::new(move |command, context| {
            handler(command, context).map(IntoReturnCode::into_return_code)
        })));
        next
    }

    /// Sets an asynchronous handler.
    pub fn with_async_handler<F, Fut, R>(&self, handler: F) -> Command
    where
        F: Fn(Command, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: IntoReturnCode,
    {
        let mut next = self.clone();
        next.handler = Some(Handler::Async(Arc::new(move |command, context| {
            handler(command, context)
                .map(|result| result.map(IntoReturnCode::into_return_code))
                .boxed()
        })));
        next
    }

    /// Appends a pre-processor. Pre-processors run in declaration order.
    pub fn with_pre_processor<F>(&self, pre_processor: F) -> Command
    where
        F: Fn(&Command, &Context) -> anyhow::Result<Option<Context>> + Send + Sync + 'static,
    {
        let mut next = self.clone();
        Arc::make_mut(&mut next.pre_processors).push(Arc::new(pre_processor));
        next
    }

    /// Binds runtime arguments, freezing the schema.
    ///
    /// Injects the `help` / `-h` flag unless an option named `help` exists.
    ///
    /// A completion query standing where a sub-command name could stand
    /// (`get-completions` after the options and sub-command path) ends
    /// binding: only the tokens before it are bound, and the words after it
    /// are kept verbatim for the completion generator.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_tree_core::{numeric_option, BindingError, Command};
    ///
    /// let cmd = Command::new("calc").with_option(numeric_option("number"))?;
    ///
    /// let bound = cmd.try_with_runtime_args(["--number", "4"]).unwrap();
    /// assert_eq!(bound.number("number"), Some(4.0));
    /// assert!(bound.with_option(numeric_option("other")).is_err());
    ///
    /// let err = cmd.try_with_runtime_args(["--number", "abc"]).unwrap_err();
    /// assert!(matches!(err, BindingError::InvalidNumber { .. }));
    /// # Ok::<(), command_tree_core::DefinitionError>(())
    /// ```
    pub fn try_with_runtime_args<I, S>(&self, tokens: I) -> std::result::Result<Command, BindingError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let mut next = self.with_help_flag();
        if let Some(idx) = next.completion_query_index(&tokens) {
            let words = tokens.split_off(idx + 1);
            tokens.truncate(idx);
            next.completion_words = Some(Arc::new(words));
        }
        let parsed = bind(&tokens, &next.all_options(), &next.arguments, None)?;
        next.runtime_args = Some(Arc::new(tokens));
        next.parsed = Some(Arc::new(parsed));
        Ok(next)
    }

    /// Binds runtime arguments; on failure prints the error and help text to
    /// stderr and exits the process with the failure code.
    pub fn with_runtime_args<I, S>(&self, tokens: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.try_with_runtime_args(tokens) {
            Ok(bound) => bound,
            Err(err) => {
                eprintln!("error: {err}\n");
                eprintln!("{}", DefaultHelpFormatter.format_help(&self.with_help_flag()));
                std::process::exit(ReturnCode::Failure.code());
            }
        }
    }

    /// [`with_runtime_args`](Command::with_runtime_args) over the live
    /// process arguments (program name excluded).
    pub fn with_env_args(&self) -> Command {
        self.with_runtime_args(std::env::args().skip(1))
    }

    // ----- bound values -----

    /// Bound value of an option or argument.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.parsed.as_deref()?.get(name)
    }

    /// Bound flag value; `false` when unbound or unknown.
    pub fn flag(&self, name: &str) -> bool {
        self.value(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(Value::as_f64)
    }

    /// Bound list of strings; empty when absent.
    pub fn strings(&self, name: &str) -> Vec<&str> {
        self.value(name)
            .and_then(Value::as_strings)
            .unwrap_or_default()
    }

    /// Residual positional tokens.
    pub fn positionals(&self) -> &[String] {
        self.parsed
            .as_deref()
            .map(|p| p.positionals.as_slice())
            .unwrap_or_default()
    }

    // ----- crate internals -----

    /// Position of the first completion query that is neither an option
    /// value nor preceded by a positional other than a sub-command path.
    fn completion_query_index(&self, tokens: &[String]) -> Option<usize> {
        let hints = hints_for(&self.tree_options());
        tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| COMPLETION_QUERIES.contains(&token.as_str()))
            .map(|(idx, _)| idx)
            .find(|&idx| {
                let raw = tokenize(&tokens[..=idx], &hints);
                match raw.positionals.split_last() {
                    Some((last, path)) if *last == tokens[idx] => self.has_sub_command_path(path),
                    _ => false,
                }
            })
    }

    fn has_sub_command_path(&self, path: &[String]) -> bool {
        let mut current = self;
        for name in path {
            match current.find_sub_command(name) {
                Some(sub) => current = sub,
                None => return false,
            }
        }
        true
    }

    /// Options visible anywhere in the subtree.
    fn tree_options(&self) -> Vec<OptionSchema> {
        let mut options = self.all_options();
        for sub in self.sub_commands.iter() {
            options.extend(sub.tree_options());
        }
        options
    }

    fn ensure_unfrozen(&self) -> Result<()> {
        if self.runtime_args.is_some() {
            return Err(DefinitionError::SchemaFrozen {
                command: self.name.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn with_help_flag(&self) -> Command {
        let options = self.all_options();
        if options.iter().any(|o| o.name == HELP_FLAG) {
            return self.clone();
        }
        let mut help = flag(HELP_FLAG).with_description("Show help");
        if !options.iter().any(|o| o.short == Some('h')) {
            help = help.with_short('h');
        }
        if options.iter().any(|o| o.long.as_deref() == Some(HELP_FLAG)) {
            help = help.without_long();
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.options).push(help);
        next
    }

    /// Transient child snapshot carrying this command's options and
    /// arguments as inherited ones.
    pub(crate) fn child_of(&self, sub_command: &Command) -> Command {
        let mut child = sub_command.clone();
        child.parent_options = Arc::new(self.all_options());
        child.parent_arguments = Arc::new(self.all_arguments());
        let mut path = self.path.as_ref().clone();
        path.push(self.name.clone());
        child.path = Arc::new(path);
        child.completion_words = self.completion_words.clone();
        child.with_help_flag()
    }

    pub(crate) fn with_binding(&self, tokens: Arc<Vec<String>>, parsed: ParsedArgs) -> Command {
        let mut next = self.clone();
        next.runtime_args = Some(tokens);
        next.parsed = Some(Arc::new(parsed));
        next
    }

    pub(crate) fn runtime_tokens(&self) -> Arc<Vec<String>> {
        self.runtime_args.clone().unwrap_or_default()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("version", &self.version)
            .field("options", &self.options)
            .field("arguments", &self.arguments)
            .field(
                "sub_commands",
                &self.sub_commands.iter().map(Command::name).collect::<Vec<_>>(),
            )
            .field("has_handler", &self.handler.is_some())
            .field("pre_processors", &self.pre_processors.len())
            .field("parsed", &self.parsed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{multi_string_arg, numeric_option, string_arg, string_option};

    #[test]
    fn test_builder_calls_leave_receiver_untouched() {
        let base = Command::new("app");
        let with_flag = base.with_option(flag("force")).unwrap();
        let with_desc = with_flag.with_description("desc");
        assert!(base.options().is_empty());
        assert_eq!(with_flag.description(), None);
        assert_eq!(with_desc.description(), Some("desc"));
        assert_eq!(with_desc.options().len(), 1);
    }

    #[test]
    fn test_option_after_runtime_args_is_rejected() {
        let bound = Command::new("app").try_with_runtime_args(Vec::<String>::new()).unwrap();
        let err = bound.with_option(flag("late")).unwrap_err();
        assert_eq!(err, DefinitionError::SchemaFrozen { command: "app".into() });
        assert!(bound.with_argument(string_arg("late")).is_err());
    }

    #[test]
    fn test_duplicate_option_name_is_rejected() {
        let cmd = Command::new("app").with_option(flag("force")).unwrap();
        let err = cmd
            .with_option(string_option("force").with_long("other"))
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateOption { .. }));
    }

    #[test]
    fn test_duplicate_short_alias_is_rejected() {
        let cmd = Command::new("app")
            .with_option(flag("force").with_short('f'))
            .unwrap();
        let err = cmd
            .with_option(string_option("file").with_short('f'))
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateAlias {
                command: "app".into(),
                name: "file".into(),
                alias: "-f".into(),
            }
        );
    }

    #[test]
    fn test_inherited_option_name_and_aliases_are_reserved() {
        let root = Command::new("root")
            .with_option(string_option("user").with_short('u'))
            .unwrap();
        let child = root.child_of(&Command::new("sub"));

        assert!(matches!(
            child.with_option(flag("user").with_long("as-user")).unwrap_err(),
            DefinitionError::DuplicateOption { name, .. } if name == "user"
        ));
        assert_eq!(
            child.with_option(flag("update").with_short('u')).unwrap_err(),
            DefinitionError::DuplicateAlias {
                command: "sub".into(),
                name: "update".into(),
                alias: "-u".into(),
            }
        );
        assert_eq!(
            child
                .with_option(string_option("login").with_long("user"))
                .unwrap_err(),
            DefinitionError::DuplicateAlias {
                command: "sub".into(),
                name: "login".into(),
                alias: "--user".into(),
            }
        );
        assert!(child.with_option(flag("update")).is_ok());
    }

    #[test]
    fn test_sub_command_after_runtime_args_is_rejected() {
        let bound = Command::new("app").try_with_runtime_args(Vec::<String>::new()).unwrap();
        assert_eq!(
            bound.with_sub_command(Command::new("late")).unwrap_err(),
            DefinitionError::SchemaFrozen { command: "app".into() }
        );
    }

    #[test]
    fn test_argument_after_multiple_is_rejected() {
        let cmd = Command::new("cp")
            .with_argument(multi_string_arg("files"))
            .unwrap();
        let err = cmd.with_argument(string_arg("dest")).unwrap_err();
        assert!(matches!(err, DefinitionError::ArgumentAfterMultiple { .. }));
    }

    #[test]
    fn test_arguments_and_sub_commands_are_exclusive() {
        let with_arg = Command::new("a").with_argument(string_arg("x")).unwrap();
        assert!(matches!(
            with_arg.with_sub_command(Command::new("sub")).unwrap_err(),
            DefinitionError::SubCommandsWithArguments { .. }
        ));

        let with_sub = Command::new("a").with_sub_command(Command::new("sub")).unwrap();
        assert!(matches!(
            with_sub.with_argument(string_arg("x")).unwrap_err(),
            DefinitionError::ArgumentsWithSubCommands { .. }
        ));
    }

    #[test]
    fn test_duplicate_sub_command_is_rejected() {
        let cmd = Command::new("a").with_sub_command(Command::new("sub")).unwrap();
        assert!(matches!(
            cmd.with_sub_command(Command::new("sub")).unwrap_err(),
            DefinitionError::DuplicateSubCommand { .. }
        ));
    }

    #[test]
    fn test_help_flag_is_injected_on_binding() {
        let bound = Command::new("app").try_with_runtime_args(["-h"]).unwrap();
        assert!(bound.flag("help"));
        assert!(bound.options().iter().any(|o| o.name == HELP_FLAG));
    }

    #[test]
    fn test_help_flag_yields_short_alias_to_user_option() {
        let cmd = Command::new("app")
            .with_option(string_option("host").with_short('h'))
            .unwrap();
        let bound = cmd.try_with_runtime_args(["-h", "example.org"]).unwrap();
        assert_eq!(bound.string("host"), Some("example.org"));
        assert!(!bound.flag("help"));
        let help = bound.find_option(HELP_FLAG).unwrap();
        assert_eq!(help.short, None);
    }

    #[test]
    fn test_accessors_on_bound_values() {
        let cmd = Command::new("app")
            .with_option(numeric_option("jobs").with_default(2.0))
            .unwrap()
            .with_argument(multi_string_arg("files"))
            .unwrap();
        let bound = cmd.try_with_runtime_args(["a", "b"]).unwrap();
        assert_eq!(bound.number("jobs"), Some(2.0));
        assert_eq!(bound.strings("files"), vec!["a", "b"]);
        assert_eq!(bound.positionals(), ["a".to_string(), "b".to_string()]);
        assert_eq!(bound.string("missing"), None);
    }

    #[test]
    fn test_child_inherits_options_and_path() {
        let root = Command::new("root").with_option(flag("force")).unwrap();
        let child = root.child_of(&Command::new("sub"));
        assert_eq!(child.path(), ["root".to_string()]);
        assert_eq!(child.full_name(), "root sub");
        assert!(child.find_option("force").is_some());
        assert!(child.options().iter().all(|o| o.name != "force"));
    }
}
