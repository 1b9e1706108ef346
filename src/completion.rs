//! Inline hints and tab completion for the line editor.
//!
//! The word under the cursor is matched by prefix against the lists kept in
//! [`PathIndex`]. The first word of a sub-command is looked up among commands,
//! then files; any later word only among files.

use crate::index::PathIndex;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Where a suggestion came from; decides how the hint is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    Command,
    File,
}

impl HintKind {
    /// ANSI foreground color.
    pub fn color(self) -> u8 {
        match self {
            HintKind::Command => 32,
            HintKind::File => 35,
        }
    }

    pub fn bold(self) -> bool {
        false
    }
}

/// Text to show after the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    /// Remainder of the suggested name; never empty.
    pub suffix: String,
    pub kind: HintKind,
}

fn is_word_break(c: char) -> bool {
    c.is_whitespace() || matches!(c, ';' | '&' | '|')
}

/// Splits the buffer into the text before the last word and the last word itself.
fn split_last_word(buffer: &str) -> (&str, &str) {
    let start = buffer
        .char_indices()
        .rev()
        .find(|&(_, c)| is_word_break(c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    buffer.split_at(start)
}

/// Whether a word following `before` names the command of a sub-command.
fn is_first_word(before: &str) -> bool {
    let before = before.trim_end();
    before.is_empty() || before.ends_with(';') || before.ends_with("&&") || before.ends_with("||")
}

/// Names starting with `word`, in list order: commands first when `first_word` is set.
fn candidates<'a>(
    first_word: bool,
    word: &'a str,
    index: &'a PathIndex,
) -> impl Iterator<Item = (&'a str, HintKind)> + 'a {
    let commands: &[String] = if first_word { &index.commands } else { &[] };
    commands
        .iter()
        .map(|name| (name.as_str(), HintKind::Command))
        .chain(index.files.iter().map(|name| (name.as_str(), HintKind::File)))
        .filter(move |(name, _)| name.starts_with(word))
}

/// The first suggestion for the last word of `buffer`, reduced to the missing suffix.
pub fn hint(buffer: &str, index: &PathIndex) -> Option<Hint> {
    let (before, word) = split_last_word(buffer);
    if word.is_empty() {
        return None;
    }
    let (name, kind) = candidates(is_first_word(before), word, index).next()?;
    let suffix = &name[word.len()..];
    if suffix.is_empty() {
        return None;
    }
    Some(Hint {
        suffix: suffix.to_string(),
        kind,
    })
}

/// Every completion of the last word of `buffer`, each as the full new buffer.
pub fn complete(buffer: &str, index: &PathIndex) -> Vec<String> {
    completion_pairs(buffer, index)
        .into_iter()
        .map(|pair| pair.replacement)
        .collect()
}

fn completion_pairs(buffer: &str, index: &PathIndex) -> Vec<Pair> {
    let (before, word) = split_last_word(buffer);
    if word.is_empty() {
        return Vec::new();
    }
    candidates(is_first_word(before), word, index)
        .map(|(name, _)| Pair {
            display: name.to_string(),
            replacement: format!("{}{}", buffer, &name[word.len()..]),
        })
        .collect()
}

/// `rustyline` helper that serves hints and completions from a shared [`PathIndex`].
pub struct ShellHelper {
    index: Rc<RefCell<PathIndex>>,
    // kind of the hint handed out last, read back when the hint is highlighted
    last_hint: Cell<Option<HintKind>>,
}

impl ShellHelper {
    pub fn new(index: Rc<RefCell<PathIndex>>) -> Self {
        Self {
            index,
            last_hint: Cell::new(None),
        }
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // candidates replace everything up to the cursor
        Ok((0, completion_pairs(&line[..pos], &self.index.borrow())))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let found = if pos < line.len() {
            None
        } else {
            hint(line, &self.index.borrow())
        };
        self.last_hint.set(found.as_ref().map(|h| h.kind));
        found.map(|h| h.suffix)
    }
}

impl Highlighter for ShellHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        match self.last_hint.get() {
            Some(kind) => Cow::Owned(format!(
                "\x1b[{};{}m{}\x1b[0m",
                u8::from(kind.bold()),
                kind.color(),
                hint
            )),
            None => Cow::Borrowed(hint),
        }
    }
}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(commands: &[&str], files: &[&str]) -> PathIndex {
        PathIndex {
            commands: commands.iter().map(|s| s.to_string()).collect(),
            files: files.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn command_hint(suffix: &str) -> Option<Hint> {
        Some(Hint {
            suffix: suffix.to_string(),
            kind: HintKind::Command,
        })
    }

    fn file_hint(suffix: &str) -> Option<Hint> {
        Some(Hint {
            suffix: suffix.to_string(),
            kind: HintKind::File,
        })
    }

    #[test]
    fn test_split_last_word() {
        assert_eq!(split_last_word("ls -l"), ("ls ", "-l"));
        assert_eq!(split_last_word("a&&b"), ("a&&", "b"));
        assert_eq!(split_last_word("a;b"), ("a;", "b"));
        assert_eq!(split_last_word("x|y"), ("x|", "y"));
        assert_eq!(split_last_word("word"), ("", "word"));
        assert_eq!(split_last_word("ls "), ("ls ", ""));
    }

    #[test]
    fn test_first_word_position() {
        assert!(is_first_word(""));
        assert!(is_first_word("   "));
        assert!(is_first_word("cd /tmp ; "));
        assert!(is_first_word("true &&"));
        assert!(is_first_word("false || "));
        assert!(!is_first_word("ls "));
        assert!(!is_first_word("a | "));
    }

    #[test]
    fn test_command_hint() {
        let idx = index(&["ls"], &[]);
        assert_eq!(hint("l", &idx), command_hint("s"));
    }

    #[test]
    fn test_first_match_in_list_order_wins() {
        let idx = index(&["grep", "git", "gzip"], &[]);
        assert_eq!(hint("g", &idx), command_hint("rep"));
        assert_eq!(hint("gi", &idx), command_hint("t"));
    }

    #[test]
    fn test_command_position_falls_back_to_files() {
        let idx = index(&["ls"], &["run.sh"]);
        assert_eq!(hint("ru", &idx), file_hint("n.sh"));
    }

    #[test]
    fn test_arguments_only_match_files() {
        let idx = index(&["notes-tool"], &["notes.txt"]);
        assert_eq!(hint("cat no", &idx), file_hint("tes.txt"));
        assert_eq!(hint("no", &idx), command_hint("tes-tool"));
    }

    #[test]
    fn test_command_after_chain_operator() {
        let idx = index(&["echo"], &["ec.txt"]);
        assert_eq!(hint("true && ec", &idx), command_hint("ho"));
        assert_eq!(hint("true;ec", &idx), command_hint("ho"));
        assert_eq!(hint("echo ec", &idx), file_hint(".txt"));
    }

    #[test]
    fn test_no_hint_cases() {
        let idx = index(&["ls"], &["file"]);
        assert_eq!(hint("", &idx), None);
        assert_eq!(hint("ls ", &idx), None);
        // exact match leaves nothing to suggest
        assert_eq!(hint("ls", &idx), None);
        assert_eq!(hint("zz", &idx), None);
        // case-sensitive
        assert_eq!(hint("L", &idx), None);
    }

    #[test]
    fn test_complete_lists_commands_then_files() {
        let idx = index(&["cat", "cargo"], &["ca.txt", "dog"]);
        assert_eq!(
            complete("ca", &idx),
            vec!["cat", "cargo", "ca.txt"]
        );
        assert_eq!(complete("echo && ca", &idx).len(), 3);
        assert_eq!(complete("less ca", &idx), vec!["less ca.txt"]);
        assert!(complete("less ", &idx).is_empty());
    }

    #[test]
    fn test_highlight_hint_uses_kind_color() {
        let helper = ShellHelper::new(Rc::new(RefCell::new(PathIndex::default())));
        assert_eq!(helper.highlight_hint("s"), "s");

        helper.last_hint.set(Some(HintKind::Command));
        assert_eq!(helper.highlight_hint("s"), "\x1b[0;32ms\x1b[0m");

        helper.last_hint.set(Some(HintKind::File));
        assert_eq!(helper.highlight_hint("s"), "\x1b[0;35ms\x1b[0m");
    }

    #[test]
    fn test_helper_sees_index_updates() {
        let shared = Rc::new(RefCell::new(index(&[], &[])));
        let helper = ShellHelper::new(Rc::clone(&shared));
        assert!(completion_pairs("ne", &helper.index.borrow()).is_empty());

        shared.borrow_mut().files.push("new.txt".to_string());
        let pairs = completion_pairs("ne", &helper.index.borrow());
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].display, "new.txt");
        assert_eq!(pairs[0].replacement, "new.txt");
    }
}
