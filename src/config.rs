//! Compile-time defaults and the settings read from the process environment at startup.

use regex::{Captures, Regex};
use std::env as stdenv;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Prompt used when `PS1` is not set. See [`render_prompt`] for the slots.
pub const DEFAULT_PROMPT: &str = r"\u@\h \w $ ";

/// Search path used when `PATH` is not set.
pub const DEFAULT_SEARCH_PATH: &str = "/usr/bin:/bin";

/// Search path installed by `command -p` while the command runs.
pub const STANDARD_SEARCH_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

pub const DEFAULT_USER: &str = "user";
pub const DEFAULT_HOST: &str = "localhost";

/// Maximum number of entries kept in the interactive history.
pub const HISTORY_SIZE: usize = 1000;

/// History file name, relative to the home directory.
pub const HISTORY_FILE: &str = ".seqsh_history";

/// Upper bound on the number of search-path entries collected for completion.
pub const MAX_INDEXED_COMMANDS: usize = 32768;

/// Longest accepted variable name for `export`/`setenv`, in bytes.
pub const MAX_VAR_KEY_LEN: usize = 63;

/// Longest accepted variable value for `export`/`setenv`, in bytes.
pub const MAX_VAR_VALUE_LEN: usize = 1023;

/// Values the interpreter needs from its surroundings before the first prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub prompt_format: String,
    pub user: String,
    pub host: String,
    pub home: PathBuf,
    pub search_path: String,
}

impl Settings {
    /// Reads `PS1`, `USER`, `HOSTNAME`, `HOME` and `PATH` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| stdenv::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup, falling back to the
    /// defaults for anything missing or empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            prompt_format: get("PS1", DEFAULT_PROMPT),
            user: get("USER", DEFAULT_USER),
            host: get("HOSTNAME", DEFAULT_HOST),
            home: PathBuf::from(get("HOME", "/")),
            search_path: get("PATH", DEFAULT_SEARCH_PATH),
        }
    }

    /// History lives in the home directory; a home of `/` means there is no usable one.
    pub fn history_path(&self) -> Option<PathBuf> {
        if self.home == Path::new("/") {
            None
        } else {
            Some(self.home.join(HISTORY_FILE))
        }
    }

    pub fn prompt(&self, current_dir: &Path) -> String {
        render_prompt(&self.prompt_format, &self.user, &self.host, current_dir)
    }
}

static PROMPT_SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([uhw])").expect("prompt slot pattern is valid"));

/// Substitutes `\u` (user name), `\h` (host name) and `\w` (current directory).
///
/// Any other text, including unknown backslash sequences, is copied unchanged.
pub fn render_prompt(format: &str, user: &str, host: &str, current_dir: &Path) -> String {
    PROMPT_SLOT
        .replace_all(format, |caps: &Captures| match &caps[1] {
            "u" => user.to_string(),
            "h" => host.to_string(),
            _ => current_dir.display().to_string(),
        })
        .into_owned()
}
