//! Splitting of a single command into its argument vector.
//!
//! Quoting is tracked by a small state machine, [`QuoteState`], which assigns a
//! [`Role`] to every character. [`Scanner`] drives that machine over a string and
//! is shared with the chain parser so operators inside quotes are left alone.

use std::iter::Peekable;
use std::str::CharIndices;

/// Quoting context of the character being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteState {
    #[default]
    Unquoted,
    InSingleQuote,
    InDoubleQuote,
}

/// Lexical meaning of one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Unquoted, unescaped character; may carry syntax such as `;` for the chain parser.
    Bare,
    /// Character taken literally because it is quoted or escaped.
    Literal,
    /// Unquoted whitespace separating arguments.
    Blank,
    /// Opening or closing quote. Not part of any argument.
    Quote,
    /// Backslash escaping the next character. Not part of any argument.
    Escape,
}

impl QuoteState {
    /// Transition table: the role of `ch` and the state after it.
    ///
    /// `next` is the following character, needed to decide whether a backslash
    /// escapes something.
    pub fn classify(self, ch: char, next: Option<char>) -> (QuoteState, Role) {
        use QuoteState::*;
        match (self, ch) {
            (Unquoted, ' ' | '\t') => (Unquoted, Role::Blank),
            (Unquoted, '\'') => (InSingleQuote, Role::Quote),
            (Unquoted, '"') => (InDoubleQuote, Role::Quote),
            (Unquoted, '\\')
                if matches!(next, Some(' ' | '\t' | '"' | '\'' | '\\' | ';' | '&' | '|')) =>
            {
                (Unquoted, Role::Escape)
            }
            (Unquoted, _) => (Unquoted, Role::Bare),

            (InSingleQuote, '\'') => (Unquoted, Role::Quote),
            (InSingleQuote, _) => (InSingleQuote, Role::Literal),

            (InDoubleQuote, '"') => (Unquoted, Role::Quote),
            (InDoubleQuote, '\\') if matches!(next, Some('"' | '\\')) => {
                (InDoubleQuote, Role::Escape)
            }
            (InDoubleQuote, _) => (InDoubleQuote, Role::Literal),
        }
    }
}

/// One classified character together with its byte offset in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanned {
    pub pos: usize,
    pub ch: char,
    pub role: Role,
}

/// Iterator assigning a [`Role`] to every character of a string.
pub struct Scanner<'a> {
    chars: Peekable<CharIndices<'a>>,
    state: QuoteState,
    escaped: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            state: QuoteState::Unquoted,
            escaped: false,
        }
    }

    /// Role of the next character without consuming it, as long as it is not escaped.
    pub fn peek_bare(&mut self) -> Option<char> {
        if self.escaped || self.state != QuoteState::Unquoted {
            return None;
        }
        match self.chars.peek() {
            Some(&(_, ch)) if !matches!(ch, ' ' | '\t' | '\'' | '"' | '\\') => Some(ch),
            _ => None,
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Scanned;

    fn next(&mut self) -> Option<Scanned> {
        let (pos, ch) = self.chars.next()?;
        if self.escaped {
            self.escaped = false;
            return Some(Scanned {
                pos,
                ch,
                role: Role::Literal,
            });
        }
        let next = self.chars.peek().map(|&(_, c)| c);
        let (state, role) = self.state.classify(ch, next);
        self.state = state;
        self.escaped = role == Role::Escape;
        Some(Scanned { pos, ch, role })
    }
}

struct Tokenizer {
    words: Vec<String>,
    buffer: String,
    // A quote or escape starts a word even if nothing literal follows, so `""` is an argument.
    in_word: bool,
}

impl Tokenizer {
    fn new() -> Self {
        Self {
            words: Vec::new(),
            buffer: String::new(),
            in_word: false,
        }
    }

    fn feed(&mut self, item: Scanned) {
        match item.role {
            Role::Bare | Role::Literal => {
                self.buffer.push(item.ch);
                self.in_word = true;
            }
            Role::Quote | Role::Escape => self.in_word = true,
            Role::Blank => self.finish_word(),
        }
    }

    fn finish_word(&mut self) {
        if self.in_word {
            self.words.push(std::mem::take(&mut self.buffer));
            self.in_word = false;
        }
    }

    fn into_words(mut self) -> Vec<String> {
        // An unterminated quote simply ends with the input.
        self.finish_word();
        self.words
    }
}

/// Splits one command into its argument vector.
///
/// Unquoted blanks separate arguments, single quotes preserve everything
/// literally, double quotes preserve everything except `\"` and `\\`, and a
/// backslash outside quotes escapes a following blank, quote, backslash or
/// chaining character (`;`, `&`, `|`).
/// No variable, glob or tilde expansion is performed. Blank input yields an
/// empty vector.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokenizer = Tokenizer::new();
    for item in Scanner::new(input) {
        tokenizer.feed(item);
    }
    tokenizer.into_words()
}
