use std::io::BufRead;

use miette::miette;

use crate::lines::LossyLines;
use crate::revision::Revision;

/// One line read from a blame stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    /// `revision` last touched line `line_number`.
    Line {
        revision: Revision,
        line_number: u64,
    },
    /// The line couldn't be parsed; nothing is known about it.
    Corrupt,
}

/// Parse a line like `1f3a9c2d  12) contents`.
///
/// There may be more text between the revision and the line number (like a file name, when
/// the file was renamed), so the line number is the last word before the first `)`.
pub fn parse_blame_line(line: &str) -> Option<(Revision, u64)> {
    let (revision, rest) = line.split_once(' ')?;
    if revision.is_empty() {
        return None;
    }
    let (number, _contents) = rest.split_once(')')?;
    let number = number.split_whitespace().last()?.parse().ok()?;
    Some((Revision::from_blame(revision), number))
}

/// Reads a blame stream line by line, checking that line numbers are consecutive.
///
/// Some files contain characters which break up blame output lines (like a literal `^M`). When
/// a line can't be parsed we warn, skip it, and trust the line number of the next line which
/// can be parsed.
pub struct BlameReader<R> {
    lines: LossyLines<R>,
    line_number: u64,
    recovering: bool,
}

impl<R: BufRead> BlameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: LossyLines::new(reader),
            line_number: 0,
            recovering: false,
        }
    }

    /// The line number of the last line read, or 0 at the start.
    ///
    /// A corrupt line counts as the line after the one before it.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Read the next line, or `None` at the end of the stream.
    pub fn next_attribution(&mut self) -> miette::Result<Option<Attribution>> {
        let line = match self.lines.next() {
            Some(line) => line?,
            None => return Ok(None),
        };

        let Some((revision, line_number)) = parse_blame_line(&line) else {
            tracing::warn!("Broken blame output: {line:?}, trying to recover at next line");
            self.recovering = true;
            self.line_number += 1;
            return Ok(Some(Attribution::Corrupt));
        };

        if self.recovering {
            tracing::warn!("Recovering with line {line_number}: {line:?}");
            self.recovering = false;
        } else if line_number != self.line_number + 1 {
            return Err(miette!(
                "Blame line numbers are not consecutive: expected line {}, but found line {line_number}: {line:?}\n\
                This should never happen",
                self.line_number + 1
            ));
        }
        self.line_number = line_number;

        Ok(Some(Attribution::Line {
            revision,
            line_number,
        }))
    }
}
