//! Command and file name lists backing completion and hints.

use crate::builtin::BUILTIN_NAMES;
use crate::config::MAX_INDEXED_COMMANDS;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::Path;

/// Names offered by the completion provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathIndex {
    /// Entries of every search-path directory, followed by the built-in names.
    pub commands: Vec<String>,
    /// Entries of the current directory.
    pub files: Vec<String>,
}

impl PathIndex {
    pub fn new(path_var: &str, dir: &Path) -> Self {
        Self {
            commands: rebuild_command_list(path_var),
            files: rebuild_directory_listing(dir),
        }
    }

    pub fn refresh_files(&mut self, dir: &Path) {
        self.files = rebuild_directory_listing(dir);
    }
}

fn read_entry_names(dir: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("cannot read directory {}", dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("cannot read entry of {}", dir.display()))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Names of all entries of `dir`. An unreadable directory gives an empty list.
pub fn rebuild_directory_listing(dir: &Path) -> Vec<String> {
    read_entry_names(dir).unwrap_or_else(|e| {
        log::warn!("{:#}", e);
        Vec::new()
    })
}

/// Entries of every directory in the colon-delimited `path_var`, followed by
/// the built-in names.
///
/// Unreadable directories are skipped. At most [`MAX_INDEXED_COMMANDS`]
/// search-path entries are kept.
pub fn rebuild_command_list(path_var: &str) -> Vec<String> {
    collect_commands(path_var, MAX_INDEXED_COMMANDS)
}

fn collect_commands(path_var: &str, cap: usize) -> Vec<String> {
    let mut commands = Vec::new();
    'dirs: for dir in env::split_paths(path_var) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let names = match read_entry_names(&dir) {
            Ok(names) => names,
            Err(e) => {
                log::debug!("skipping search path entry: {:#}", e);
                continue;
            }
        };
        for name in names {
            if commands.len() == cap {
                log::warn!("command list truncated at {} entries", cap);
                break 'dirs;
            }
            commands.push(name);
        }
    }
    commands.extend(BUILTIN_NAMES.iter().map(|name| name.to_string()));
    commands
}
