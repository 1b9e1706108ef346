//! Splitting of an input line into sub-commands joined by `;`, `&&` and `||`.

use crate::command::Status;
use crate::lexer::{Role, Scanner};

/// Sequencing operator found at the boundary in front of a sub-command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// The first sub-command of a line.
    None,
    /// `;` runs the next sub-command unconditionally.
    Sequence,
    /// `&&` runs the next sub-command only after a zero status.
    AndThen,
    /// `||` runs the next sub-command only after a non-zero status.
    OrElse,
}

impl Operator {
    /// Whether a sub-command behind this operator runs, given the last executed status.
    ///
    /// After a process creation failure neither `&&` nor `||` runs; only the
    /// next `;` resumes the line.
    pub fn permits(self, last_status: Status) -> bool {
        match (self, last_status) {
            (Operator::None | Operator::Sequence, _) => true,
            (_, Status::CreationFailed) => false,
            (Operator::AndThen, Status::Exited(code)) => code == 0,
            (Operator::OrElse, Status::Exited(code)) => code != 0,
        }
    }
}

/// One command segment of an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCommand {
    /// Operator that preceded this segment.
    pub operator: Operator,
    /// Raw text of the segment with leading blanks removed; not yet tokenized.
    pub text: String,
}

impl SubCommand {
    fn new(operator: Operator, text: &str) -> Self {
        Self {
            operator,
            text: text.trim_start().to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Splits `line` at every `;`, `&&` and `||` that is neither quoted nor escaped.
///
/// The result always has at least one element; segments may be blank, e.g. after
/// a trailing `;`. A single `&` or `|` is ordinary text.
pub fn split_chain(line: &str) -> Vec<SubCommand> {
    let mut commands = Vec::new();
    let mut scanner = Scanner::new(line);
    let mut start = 0;
    let mut operator = Operator::None;

    while let Some(item) = scanner.next() {
        if item.role != Role::Bare {
            continue;
        }
        let boundary = match item.ch {
            ';' => Some(Operator::Sequence),
            '&' if scanner.peek_bare() == Some('&') => Some(Operator::AndThen),
            '|' if scanner.peek_bare() == Some('|') => Some(Operator::OrElse),
            _ => None,
        };
        let Some(next_operator) = boundary else {
            continue;
        };

        let mut end = item.pos + 1;
        if next_operator != Operator::Sequence {
            // second half of `&&` / `||`
            scanner.next();
            end += 1;
        }
        commands.push(SubCommand::new(operator, &line[start..item.pos]));
        start = end;
        operator = next_operator;
    }

    commands.push(SubCommand::new(operator, &line[start..]));
    commands
}
