use crate::builtin::Builtins;
use crate::command::{Outcome, Status};
use crate::completion::ShellHelper;
use crate::config::{HISTORY_SIZE, Settings};
use crate::env::Environment;
use crate::external;
use crate::index::PathIndex;
use crate::lexer::tokenize;
use crate::parser::split_chain;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::cell::RefCell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

/// Whether the interpreter keeps reading input after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Where this session keeps its command history.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HistoryFile {
    /// Turned off on the command line.
    Disabled,
    /// Wanted, but the home directory is `/`.
    NoHome,
    At(PathBuf),
}

fn history_file(enabled: bool, settings: &Settings) -> HistoryFile {
    if !enabled {
        return HistoryFile::Disabled;
    }
    match settings.history_path() {
        Some(path) => HistoryFile::At(path),
        None => HistoryFile::NoHome,
    }
}

/// A single interactive session: environment, name index and prompt settings.
pub struct Interpreter {
    env: Environment,
    index: Rc<RefCell<PathIndex>>,
    settings: Settings,
    builtins: Builtins,
}

impl Interpreter {
    pub fn new(settings: Settings) -> Self {
        let env = Environment::from_settings(&settings);
        let index = PathIndex::new(&env.search_path(), &env.current_dir);
        Self {
            env,
            index: Rc::new(RefCell::new(index)),
            settings,
            builtins: Builtins::default(),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Runs every sub-command of `line` whose chaining condition holds.
    ///
    /// A skipped sub-command leaves the last status untouched, so in
    /// `false && a || b` the `||` still sees the status of `false`. When a
    /// process cannot be created, the following `&&` and `||` sub-commands are
    /// skipped up to the next `;`.
    pub fn evaluate(&mut self, line: &str, stdout: &mut dyn Write) -> Flow {
        let mut last_status = Status::default();

        for sub in split_chain(line) {
            if sub.is_blank() {
                continue;
            }
            if !sub.operator.permits(last_status) {
                log::debug!("skipped {:?} after {:?}", sub.text, last_status);
                continue;
            }
            let argv = tokenize(&sub.text);
            if argv.is_empty() {
                continue;
            }
            log::debug!("argv: {:?}", argv);

            let outcome = self.builtins.dispatch(&argv, stdout, &mut self.env);
            match outcome {
                Outcome::Terminate => return Flow::Exit,
                Outcome::ArityError => eprintln!("{}: wrong number of arguments!", argv[0]),
                _ => {}
            }
            last_status = match outcome.status() {
                Some(status) => status,
                None => {
                    if let Err(e) = stdout.flush() {
                        log::warn!("cannot flush output: {}", e);
                    }
                    self.run_external(&argv)
                }
            };
            log::debug!("{}: {:?}", argv[0], last_status);

            self.index.borrow_mut().refresh_files(&self.env.current_dir);
        }

        Flow::Continue
    }

    fn run_external(&self, argv: &[String]) -> Status {
        match external::run(argv, &self.env) {
            Ok(code) => Status::Exited(code),
            Err(e) => {
                external::report(e);
                Status::CreationFailed
            }
        }
    }

    /// Reads and evaluates lines until `exit`, `logout` or end of input.
    ///
    /// With `history` set, history is loaded from and saved to the file in the
    /// home directory.
    pub fn repl(&mut self, history: bool) -> rustyline::Result<()> {
        let config = Config::builder()
            .max_history_size(HISTORY_SIZE)?
            .build();
        let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::with_config(config)?;
        rl.set_helper(Some(ShellHelper::new(Rc::clone(&self.index))));

        let history_path = match history_file(history, &self.settings) {
            HistoryFile::At(path) => Some(path),
            HistoryFile::NoHome => {
                log::warn!("home directory is /, history disabled");
                None
            }
            HistoryFile::Disabled => None,
        };
        if let Some(path) = &history_path {
            if let Err(e) = rl.load_history(path) {
                log::debug!("no history loaded from {}: {}", path.display(), e);
            }
        }

        let stdout = io::stdout();
        loop {
            let prompt = self.settings.prompt(&self.env.current_dir);
            match rl.readline(&prompt) {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    if self.evaluate(&line, &mut stdout.lock()) == Flow::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        if let Some(path) = &history_path {
            if let Err(e) = rl.save_history(path) {
                log::warn!("cannot save history to {}: {}", path.display(), e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::lock_current_dir;
    use std::env as stdenv;
    use std::fs;

    fn interpreter() -> Interpreter {
        let mut interp = Interpreter::new(Settings::from_env());
        interp.env.current_dir = PathBuf::from("/");
        interp
    }

    fn eval(interp: &mut Interpreter, line: &str) -> (Flow, String) {
        let mut out = Vec::new();
        let flow = interp.evaluate(line, &mut out);
        (flow, String::from_utf8(out).unwrap())
    }

    fn output(line: &str) -> String {
        eval(&mut interpreter(), line).1
    }

    #[test]
    fn test_and_then_skips_after_failure() {
        assert_eq!(output("false && echo hi"), "");
        assert_eq!(output("true && echo a && echo b"), "a\nb\n");
        assert_eq!(output("false && echo a && echo b"), "");
    }

    #[test]
    fn test_or_else_skips_after_success() {
        assert_eq!(output("true || echo hi"), "");
        assert_eq!(output("false || echo hi"), "hi\n");
    }

    #[test]
    fn test_sequence_always_runs() {
        assert_eq!(output("false ; echo hi"), "hi\n");
        assert_eq!(output("echo a;echo b"), "a\nb\n");
    }

    #[test]
    fn test_skipped_command_keeps_last_status() {
        assert_eq!(output("false && echo a || echo b"), "b\n");
        assert_eq!(output("true || echo a && echo b"), "b\n");
    }

    #[test]
    fn test_quoted_separator_is_not_split() {
        assert_eq!(output(r#"echo "a;b""#), "a;b\n");
        assert_eq!(output("echo 'x && y'"), "x && y\n");
    }

    #[test]
    fn test_exit_stops_the_line() {
        let mut interp = interpreter();
        assert_eq!(eval(&mut interp, "exit"), (Flow::Exit, String::new()));
        assert_eq!(
            eval(&mut interp, "echo a ; logout ; echo b"),
            (Flow::Exit, "a\n".to_string())
        );
        assert_eq!(eval(&mut interp, "false && exit").0, Flow::Continue);
    }

    #[test]
    fn test_arity_error_counts_as_failure() {
        let mut interp = interpreter();
        assert_eq!(
            eval(&mut interp, "exit 1 || echo recovered"),
            (Flow::Continue, "recovered\n".to_string())
        );
        assert_eq!(output("export BROKEN && echo no"), "");
    }

    #[test]
    fn test_blank_segments_are_skipped() {
        assert_eq!(output(" ; ; echo x"), "x\n");
        assert_eq!(output("echo x;"), "x\n");
        assert_eq!(output(""), "");
    }

    #[test]
    fn test_unknown_command_fails() {
        assert_eq!(output("seqsh-no-such-command-xyz || echo fallback"), "fallback\n");
        assert_eq!(output("seqsh-no-such-command-xyz && echo no"), "");
    }

    #[test]
    fn test_export_visible_to_later_commands() {
        let mut interp = interpreter();
        assert_eq!(
            eval(&mut interp, "export SEQSH_GREETING=hello && getenv SEQSH_GREETING").1,
            "hello\n"
        );
        assert_eq!(
            eval(&mut interp, r#"sh -c 'test "$SEQSH_GREETING" = hello' && echo child"#).1,
            "child\n"
        );
        assert_eq!(interp.env().get_var("SEQSH_GREETING").as_deref(), Some("hello"));
    }

    #[test]
    fn test_cd_then_echo_refreshes_files() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(temp.path()).expect("canonicalize failed");
        fs::File::create(canonical_temp.join("marker.txt")).unwrap();
        let orig = stdenv::current_dir().unwrap();

        let mut interp = interpreter();
        let line = format!("cd {} ; echo ok", canonical_temp.display());
        let out = eval(&mut interp, &line).1;
        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert_eq!(out, "ok\n");
        assert_eq!(interp.env().current_dir, canonical_temp);
        assert_eq!(interp.index.borrow().files, vec!["marker.txt"]);
    }

    #[test]
    fn test_failed_cd_short_circuits() {
        let _lock = lock_current_dir();
        let mut interp = interpreter();
        let (_, out) = eval(&mut interp, "cd /seqsh/no/such/dir && echo moved");
        assert_eq!(out, "");
        assert_eq!(interp.env().current_dir, PathBuf::from("/"));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_spawn_failure_skips_conditionals_until_sequence() {
        let huge = "x".repeat(300_000);
        assert_eq!(output(&format!("true {} || echo after_or", huge)), "");
        assert_eq!(output(&format!("true {} && echo after_and", huge)), "");
        assert_eq!(
            output(&format!("true {} || echo a && echo b ; echo resumed", huge)),
            "resumed\n"
        );
        assert_eq!(output(&format!("command true {} || echo after_command", huge)), "");
    }

    #[test]
    fn test_history_file_decision() {
        let with_home = Settings::from_lookup(|k| (k == "HOME").then(|| "/home/ada".to_string()));
        let root_home = Settings::from_lookup(|_| None);

        assert_eq!(
            history_file(true, &with_home),
            HistoryFile::At(PathBuf::from("/home/ada").join(crate::config::HISTORY_FILE))
        );
        assert_eq!(history_file(true, &root_home), HistoryFile::NoHome);
        assert_eq!(history_file(false, &with_home), HistoryFile::Disabled);
        assert_eq!(history_file(false, &root_home), HistoryFile::Disabled);
    }

    #[test]
    fn test_command_list_includes_builtins() {
        let interp = interpreter();
        let index = interp.index.borrow();
        assert!(index.commands.ends_with(&crate::BUILTIN_NAMES.map(String::from)));
    }
}
