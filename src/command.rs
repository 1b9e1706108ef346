/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Status recorded for a sub-command that was rejected for its argument count.
pub const ARITY_ERROR_STATUS: ExitCode = 2;

/// Result of offering an argument vector to the built-in dispatcher.
///
/// Control outcomes (`RunExternal`, `Terminate`, `ArityError`) are separate
/// variants so they can never be confused with an exit code produced by a real
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a built-in; the caller has to hand the command to the process executor.
    RunExternal,
    /// The interpreter should stop reading input.
    Terminate,
    /// The built-in ran and succeeded.
    Success,
    /// The built-in ran and failed with the given code.
    Failure(ExitCode),
    /// The built-in was called with the wrong number or shape of arguments.
    ArityError,
    /// The built-in tried to start a process and the operating system refused.
    ProcessError,
}

/// What the chain evaluator remembers about the last sub-command that ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The command completed with an exit code.
    Exited(ExitCode),
    /// No process could be created or reaped, so there is no exit code.
    CreationFailed,
}

impl Default for Status {
    fn default() -> Self {
        Status::Exited(0)
    }
}

impl Outcome {
    /// Builds an outcome from a child process exit code.
    pub fn from_code(code: ExitCode) -> Self {
        if code == 0 {
            Outcome::Success
        } else {
            Outcome::Failure(code)
        }
    }

    /// Exit status seen by the chain evaluator, if this outcome carries one.
    ///
    /// `RunExternal` and `Terminate` have no status of their own.
    pub fn status(self) -> Option<Status> {
        match self {
            Outcome::Success => Some(Status::Exited(0)),
            Outcome::Failure(code) => Some(Status::Exited(code)),
            Outcome::ArityError => Some(Status::Exited(ARITY_ERROR_STATUS)),
            Outcome::ProcessError => Some(Status::CreationFailed),
            Outcome::RunExternal | Outcome::Terminate => None,
        }
    }
}
