use crate::command::ExitCode;
use crate::env::Environment;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;

/// Status reported when a command cannot be found or is not runnable.
pub const RESOLUTION_FAILURE_STATUS: ExitCode = 1;

/// The operating system could not start or reap a child process.
///
/// A missing executable is not an `ExecError`; it is reported and turned into
/// [`RESOLUTION_FAILURE_STATUS`].
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{name}: cannot create process")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("{name}: cannot wait for process")]
    Wait {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Runs `argv` as a child process and blocks until it terminates.
///
/// `argv[0]` is resolved against the environment's `PATH`; the child gets the
/// interpreter's variables and current directory. An empty `argv` runs nothing.
pub fn run(argv: &[String], env: &Environment) -> Result<ExitCode, ExecError> {
    let Some((name, args)) = argv.split_first() else {
        return Ok(0);
    };

    let search_path = env.search_path();
    let Some(program) =
        find_command_path(OsStr::new(&search_path), &env.current_dir, Path::new(name))
    else {
        return Ok(resolution_failure(name));
    };

    let mut command = Command::new(&*program);
    command
        .args(args)
        .env_clear()
        .envs(&env.vars)
        .current_dir(&env.current_dir);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.arg0(name);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied) => {
            log::debug!("{}: {}", program.display(), e);
            return Ok(resolution_failure(name));
        }
        Err(source) => {
            return Err(ExecError::Spawn {
                name: name.clone(),
                source,
            });
        }
    };

    let exit_status = child.wait().map_err(|source| ExecError::Wait {
        name: name.clone(),
        source,
    })?;
    match exit_status.code() {
        Some(code) => Ok(code),
        None => Ok(terminated_by_signal(name, exit_status)),
    }
}

/// Prints an [`ExecError`] with its OS cause to stderr.
pub(crate) fn report(error: ExecError) {
    let error = anyhow::Error::from(error);
    eprintln!("{:#}", error);
    log::warn!("{:?}", error);
}

fn resolution_failure(name: &str) -> ExitCode {
    eprintln!("{}: command not found", name);
    RESOLUTION_FAILURE_STATUS
}

// No 128+N convention here: a signalled child is simply a failed command.
#[cfg(unix)]
fn terminated_by_signal(name: &str, exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = exit_status.signal() {
        log::warn!("{}: terminated by signal {}", name, signal);
    }
    1
}

#[cfg(not(unix))]
fn terminated_by_signal(_name: &str, _exit_status: ExitStatus) -> ExitCode {
    1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`) or `./`-prefixed: resolved
///   against `current_dir` and returned if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup or joined to `current_dir`.
pub fn find_command_path<'a>(
    search_paths: &OsStr,
    current_dir: &Path,
    path: &'a Path,
) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        // Empty path -> not found
        (None, _) => None,
        // Single component -> search in PATH
        (Some(x), None) => {
            find_in_path(search_paths, current_dir, x.as_os_str()).map(Cow::Owned)
        }
        // Multiple components or ./ -> relative to the current dir
        _ => find_by_path(&current_dir.join(path))
            .map(Path::to_path_buf)
            .map(Cow::Owned),
    }
}

fn find_in_path(search_paths: &OsStr, current_dir: &Path, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        // an empty PATH entry means the current directory
        let dir = if dir.as_os_str().is_empty() {
            current_dir.to_path_buf()
        } else {
            current_dir.join(dir)
        };
        let path = dir.join(cmd);
        // a non-executable file does not hide a later match
        if let Some(path) = find_by_path(&path).filter(|p| is_executable(p)) {
            return Some(path.to_owned());
        }
    }
    None
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.is_file() { Some(path) } else { None }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}
