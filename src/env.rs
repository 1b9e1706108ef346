use crate::config::{DEFAULT_SEARCH_PATH, Settings};
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, user-level view of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: environment variables passed to every spawned command and changed by
///   `export`/`setenv`.
/// - `current_dir`: the tracked working directory, updated by `cd`/`chdir`.
/// - `home_dir`: the target of a bare `cd`.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// Directory a bare `cd` changes to.
    pub home_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// This copies variables from `std::env::vars()` and initializes `current_dir`
    /// from `std::env::current_dir()`. The home directory comes from `HOME`, or `/`.
    pub fn new() -> Self {
        let vars: HashMap<String, String> = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let home_dir = vars
            .get("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/"));
        Self {
            vars,
            current_dir,
            home_dir,
        }
    }

    /// Like [`Environment::new`], but with the home directory and search path
    /// resolved by the startup [`Settings`].
    pub fn from_settings(settings: &Settings) -> Self {
        let mut env = Self::new();
        env.home_dir = settings.home.clone();
        env.set_var("PATH", settings.search_path.as_str());
        env
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Remove a variable, returning its previous value.
    pub fn remove_var(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// The colon-delimited executable search path.
    pub fn search_path(&self) -> String {
        self.get_var("PATH")
            .unwrap_or_else(|| DEFAULT_SEARCH_PATH.to_string())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
