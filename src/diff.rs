use std::io::BufRead;

use camino::Utf8PathBuf;
use miette::miette;

use crate::hunk::Hunk;
use crate::hunk::HunkHeader;
use crate::lines::LossyLines;
use crate::revision::Revision;
use crate::revision::RevisionId;

/// The post-image of the file whose hunks are currently being read.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// A file that existed in the parent and still exists in the child.
    Path(Utf8PathBuf),
    /// The file was created or deleted; there's nothing to blame.
    Undiggable(Utf8PathBuf),
}

#[derive(Debug, Default)]
struct DiffState {
    target: Option<Target>,
    /// Whether the last `---` line named `/dev/null`.
    created: bool,
    /// Lines of the current hunk body left to read, in the parent and the child.
    remaining_origin: u64,
    remaining_target: u64,
}

impl DiffState {
    /// Consume a line of a hunk body, if we're in one.
    fn consume_body(&mut self, line: &str) -> bool {
        if self.remaining_origin == 0 && self.remaining_target == 0 {
            return false;
        }
        match line.as_bytes().first().copied() {
            // Some tools strip the trailing space from empty context lines.
            Some(b' ') | None => {
                self.remaining_origin = self.remaining_origin.saturating_sub(1);
                self.remaining_target = self.remaining_target.saturating_sub(1);
            }
            Some(b'-') => {
                self.remaining_origin = self.remaining_origin.saturating_sub(1);
            }
            Some(b'+') => {
                self.remaining_target = self.remaining_target.saturating_sub(1);
            }
            // `\ No newline at end of file`
            Some(b'\\') => {}
            Some(_) => {
                tracing::debug!(line, "Hunk body ended early");
                self.remaining_origin = 0;
                self.remaining_target = 0;
                return false;
            }
        }
        true
    }
}

/// Parse the hunks of a unified diff between `parent` and `child`.
///
/// Hunks are returned in the order they appear. Hunks for files that `child` creates or
/// deletes are skipped, since their lines can't be blamed in `parent`.
pub fn parse_hunks(
    parent: &RevisionId,
    child: &Revision,
    diff: impl BufRead,
) -> miette::Result<Vec<Hunk>> {
    let mut hunks = Vec::new();
    let mut state = DiffState::default();

    for line in LossyLines::new(diff) {
        let line = line?;

        if state.consume_body(&line) {
            continue;
        }

        if line.starts_with("diff ") {
            state.target = None;
            state.created = false;
        } else if let Some(path) = line.strip_prefix("--- ") {
            state.created = path == "/dev/null";
        } else if let Some(path) = line.strip_prefix("+++ ") {
            state.target = Some(if path == "/dev/null" {
                // Cannot dig a file deletion.
                Target::Undiggable(Utf8PathBuf::from(path))
            } else if state.created {
                Target::Undiggable(parse_path(path))
            } else {
                Target::Path(parse_path(path))
            });
        } else if line.starts_with("@@ ") {
            let header = HunkHeader::parse(&line)?;
            state.remaining_origin = header.origin.count;
            state.remaining_target = header.target.count;

            match &state.target {
                Some(Target::Path(path)) => {
                    hunks.push(Hunk::new(
                        parent.clone(),
                        child.clone(),
                        path.clone(),
                        header,
                        line,
                    ));
                }
                Some(Target::Undiggable(path)) => {
                    tracing::debug!(%path, %line, "Skipping hunk for created or deleted file");
                }
                None => {
                    return Err(miette!(
                        "Found a hunk before any file path in `git diff {parent} {child}`: {line}"
                    ));
                }
            }
        }
    }

    Ok(hunks)
}

/// Parse a path from a `+++ b/path` line.
fn parse_path(path: &str) -> Utf8PathBuf {
    let path = path.trim_end();
    let path = match path
        .strip_prefix('"')
        .and_then(|path| path.strip_suffix('"'))
    {
        Some(quoted) => unquote(quoted),
        None => path.to_owned(),
    };
    match path.strip_prefix("b/") {
        Some(path) => Utf8PathBuf::from(path),
        None => Utf8PathBuf::from(path),
    }
}

/// Undo Git's C-style quoting of unusual paths.
fn unquote(quoted: &str) -> String {
    let mut bytes = Vec::with_capacity(quoted.len());
    let mut chars = quoted.bytes().peekable();
    while let Some(byte) = chars.next() {
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        match chars.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'r') => bytes.push(b'\r'),
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b'f') => bytes.push(0x0c),
            Some(b'v') => bytes.push(0x0b),
            Some(digit @ b'0'..=b'7') => {
                let mut value = u32::from(digit - b'0');
                for _ in 0..2 {
                    match chars.peek() {
                        Some(next @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(next - b'0');
                            chars.next();
                        }
                        _ => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
