use crate::command::Outcome;
use crate::config::{MAX_VAR_KEY_LEN, MAX_VAR_VALUE_LEN, STANDARD_SEARCH_PATH};
use crate::env::Environment;
use crate::external;
use anyhow::{Context, Result, anyhow};
use argh::FromArgs;
use regex::Regex;
use std::env;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Every name the dispatcher answers to, in the order they are offered for completion.
pub const BUILTIN_NAMES: [&str; 15] = [
    "cd", "chdir", "exit", "export", "setenv", "getenv", "builtin", "command", "echo", "logout",
    ":", ".", "source", "alias", "unalias",
];

/// Built-in commands known to the shell at compile time.
///
/// Builtins are executed directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized {
    /// Names the command is invoked by, e.g. `["cd", "chdir"]`.
    const NAMES: &'static [&'static str];

    /// Builds the command from the arguments following its name.
    ///
    /// `None` means the arguments do not fit and the caller reports an arity error.
    fn parse(args: &[String]) -> Option<Self>;

    /// Executes the command, writing regular output to `stdout`.
    ///
    /// An `Err` is reported to the user and becomes `Outcome::Failure(1)`.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Outcome>;
}

/// Object-safe entry of the dispatch table.
trait BuiltinFactory {
    fn try_dispatch(
        &self,
        name: &str,
        args: &[String],
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Option<Outcome>;
}

struct Factory<T> {
    _phantom: PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T: BuiltinCommand> BuiltinFactory for Factory<T> {
    fn try_dispatch(
        &self,
        name: &str,
        args: &[String],
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Option<Outcome> {
        if !T::NAMES.contains(&name) {
            return None;
        }
        let Some(cmd) = T::parse(args) else {
            return Some(Outcome::ArityError);
        };
        Some(match cmd.execute(stdout, env) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("{:#}", e);
                Outcome::Failure(1)
            }
        })
    }
}

/// The table of built-in commands.
pub struct Builtins {
    table: Vec<Box<dyn BuiltinFactory>>,
}

impl Default for Builtins {
    fn default() -> Self {
        Self {
            table: vec![
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Export>::default()),
                Box::new(Factory::<GetEnv>::default()),
                Box::new(Factory::<RunCommand>::default()),
                Box::new(Factory::<Echo>::default()),
                Box::new(Factory::<Colon>::default()),
                Box::new(Factory::<Stub>::default()),
            ],
        }
    }
}

impl Builtins {
    /// Offers `argv` to the built-in table; matching on `argv[0]` is exact.
    ///
    /// Returns `Outcome::RunExternal` when no built-in claims the name.
    pub fn dispatch(
        &self,
        argv: &[String],
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Outcome {
        let Some((name, args)) = argv.split_first() else {
            return Outcome::Success;
        };

        if name == "builtin" {
            let Some(inner) = args.first() else {
                return Outcome::ArityError;
            };
            return match self.dispatch(args, stdout, env) {
                Outcome::RunExternal => {
                    eprintln!("builtin: {}: not a shell builtin", inner);
                    Outcome::Failure(1)
                }
                outcome => outcome,
            };
        }

        self.table
            .iter()
            .find_map(|factory| factory.try_dispatch(name, args, stdout, env))
            .unwrap_or(Outcome::RunExternal)
    }
}

/// Leave the interpreter.
pub struct Exit;

impl BuiltinCommand for Exit {
    const NAMES: &'static [&'static str] = &["exit", "logout"];

    fn parse(args: &[String]) -> Option<Self> {
        args.is_empty().then_some(Exit)
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<Outcome> {
        Ok(Outcome::Terminate)
    }
}

/// Change the current working directory.
/// If no target is provided, changes to the home directory.
pub struct Cd {
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    const NAMES: &'static [&'static str] = &["cd", "chdir"];

    fn parse(args: &[String]) -> Option<Self> {
        match args {
            [] => Some(Cd { target: None }),
            [target] => Some(Cd {
                target: Some(target.clone()),
            }),
            _ => None,
        }
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Outcome> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => env.home_dir.clone(),
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: {}", new_dir.display()))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(Outcome::Success)
    }
}

static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A([^=]+)=(.+)\z").expect("assignment pattern is valid"));

/// Splits `KEY=VALUE`, enforcing the size limits on both halves.
fn parse_assignment(arg: &str) -> Option<(String, String)> {
    let caps = ASSIGNMENT.captures(arg)?;
    let (key, value) = (&caps[1], &caps[2]);
    (key.len() <= MAX_VAR_KEY_LEN && value.len() <= MAX_VAR_VALUE_LEN)
        .then(|| (key.to_string(), value.to_string()))
}

/// Set an environment variable for the interpreter and every command it starts.
pub struct Export {
    pub key: String,
    pub value: String,
}

impl BuiltinCommand for Export {
    const NAMES: &'static [&'static str] = &["export", "setenv"];

    fn parse(args: &[String]) -> Option<Self> {
        let [assignment] = args else {
            return None;
        };
        let (key, value) = parse_assignment(assignment)?;
        Some(Export { key, value })
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Outcome> {
        log::debug!("export {}={}", self.key, self.value);
        env.set_var(self.key, self.value);
        Ok(Outcome::Success)
    }
}

/// Print the value of an environment variable.
pub struct GetEnv {
    pub key: String,
}

impl BuiltinCommand for GetEnv {
    const NAMES: &'static [&'static str] = &["getenv"];

    fn parse(args: &[String]) -> Option<Self> {
        let [key] = args else {
            return None;
        };
        Some(GetEnv { key: key.clone() })
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Outcome> {
        let value = env
            .get_var(&self.key)
            .ok_or_else(|| anyhow!("getenv: {}: no such variable", self.key))?;
        writeln!(stdout, "{}", value)?;
        Ok(Outcome::Success)
    }
}

#[derive(FromArgs)]
/// Run a program, bypassing shell built-ins.
pub struct RunCommand {
    #[argh(switch, short = 'p')]
    /// search a standard PATH that is guaranteed to find the standard utilities.
    pub standard_path: bool,

    #[argh(positional, greedy)]
    /// the program to run followed by its arguments.
    pub argv: Vec<String>,
}

impl BuiltinCommand for RunCommand {
    const NAMES: &'static [&'static str] = &["command"];

    fn parse(args: &[String]) -> Option<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match <RunCommand as FromArgs>::from_args(&["command"], &args) {
            Ok(cmd) if !cmd.argv.is_empty() => Some(cmd),
            Ok(_) => None,
            Err(early_exit) => {
                log::debug!("command: {}", early_exit.output.trim_end());
                None
            }
        }
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Outcome> {
        let status = if self.standard_path {
            let saved = env.get_var("PATH");
            env.set_var("PATH", STANDARD_SEARCH_PATH);
            let status = external::run(&self.argv, env);
            match saved {
                Some(path) => env.set_var("PATH", path),
                None => {
                    env.remove_var("PATH");
                }
            }
            status
        } else {
            external::run(&self.argv, env)
        };
        match status {
            Ok(code) => Ok(Outcome::from_code(code)),
            Err(e) => {
                external::report(e);
                Ok(Outcome::ProcessError)
            }
        }
    }
}

/// write the arguments to standard output, separated by spaces.
/// a leading `-e` suppresses the trailing newline.
pub struct Echo {
    pub no_newline: bool,
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    const NAMES: &'static [&'static str] = &["echo"];

    fn parse(args: &[String]) -> Option<Self> {
        let (no_newline, args) = match args.split_first() {
            Some((flag, rest)) if flag == "-e" => (true, rest),
            _ => (false, args),
        };
        Some(Echo {
            no_newline,
            args: args.to_vec(),
        })
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<Outcome> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        stdout.flush()?;
        Ok(Outcome::Success)
    }
}

/// Do nothing, successfully.
pub struct Colon;

impl BuiltinCommand for Colon {
    const NAMES: &'static [&'static str] = &[":"];

    fn parse(_args: &[String]) -> Option<Self> {
        Some(Colon)
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<Outcome> {
        Ok(Outcome::Success)
    }
}

/// Scripting and alias built-ins: reserved names that accept anything and do nothing.
pub struct Stub;

impl BuiltinCommand for Stub {
    const NAMES: &'static [&'static str] = &[".", "source", "alias", "unalias"];

    fn parse(_args: &[String]) -> Option<Self> {
        Some(Stub)
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<Outcome> {
        log::debug!("scripting built-in ignored");
        Ok(Outcome::Success)
    }
}
