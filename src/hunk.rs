use std::fmt::Display;
use std::sync::OnceLock;

use camino::Utf8PathBuf;
use miette::miette;
use miette::Context;
use miette::IntoDiagnostic;
use regex::Regex;

use crate::ordered_set::OrderedSet;
use crate::revision::Revision;
use crate::revision::RevisionId;

/// A `start,count` range of lines from a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineRange {
    /// 1-based first line. Zero for an empty range at the start of a file.
    pub start: u64,
    pub count: u64,
}

impl LineRange {
    /// Parse a range like `12,3`. A range without a count (`12`) covers a single line.
    pub fn parse(field: &str) -> miette::Result<Self> {
        let (start, count) = match field.split_once(',') {
            Some((start, count)) => (start, Some(count)),
            None => (field, None),
        };
        let start = start
            .parse()
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to parse line number `{start}` in range `{field}`"))?;
        let count = match count {
            Some(count) => count.parse().into_diagnostic().wrap_err_with(|| {
                format!("Failed to parse line count `{count}` in range `{field}`")
            })?,
            None => 1,
        };
        Ok(Self { start, count })
    }
}

impl Display for LineRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.start, self.count)
    }
}

/// The fields of a `@@ -a,b +c,d @@ hint` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkHeader {
    pub origin: LineRange,
    pub target: LineRange,
    /// Trailing text, usually the enclosing function.
    pub context_hint: Option<String>,
}

impl HunkHeader {
    pub fn parse(line: &str) -> miette::Result<Self> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let captures = RE
            .get_or_init(|| {
                Regex::new(r"^@@ -(?P<origin>\S+) \+(?P<target>\S+) @@(?P<hint>.*)$")
                    .expect("Regex parses")
            })
            .captures(line)
            .ok_or_else(|| miette!("Could not parse hunk header: {line}"))?;

        let hint = captures["hint"].trim();
        Ok(Self {
            origin: LineRange::parse(&captures["origin"])
                .wrap_err_with(|| format!("Bad origin range in hunk header: {line}"))?,
            target: LineRange::parse(&captures["target"])
                .wrap_err_with(|| format!("Bad target range in hunk header: {line}"))?,
            context_hint: (!hint.is_empty()).then(|| hint.to_owned()),
        })
    }
}

/// A contiguous block of changes between a parent revision and a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub parent: RevisionId,
    pub child: Revision,
    /// Path relative to the repository root.
    pub path: Utf8PathBuf,
    /// Lines in `parent` this hunk replaces.
    pub origin: LineRange,
    /// Lines in `child` this hunk introduces.
    pub target: LineRange,
    pub context_hint: Option<String>,
    /// The `@@` line this hunk was parsed from.
    pub raw_line: String,
    /// Revisions which last touched the origin lines, filled in by
    /// [`crate::correlate::correlate`].
    pub dependencies: OrderedSet<Revision>,
}

impl Hunk {
    pub fn new(
        parent: RevisionId,
        child: Revision,
        path: Utf8PathBuf,
        header: HunkHeader,
        raw_line: String,
    ) -> Self {
        Self {
            parent,
            child,
            path,
            origin: header.origin,
            target: header.target,
            context_hint: header.context_hint,
            raw_line,
            dependencies: OrderedSet::new(),
        }
    }
}

impl Display for Hunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}..{} {} -{} +{}",
            self.parent, self.child, self.path, self.origin, self.target
        )?;
        if let Some(hint) = &self.context_hint {
            write!(f, " {hint}")?;
        }
        Ok(())
    }
}
