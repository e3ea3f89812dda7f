use std::io::BufRead;

use camino::Utf8Path;

use crate::revision::Revision;
use crate::revision::RevisionId;

/// The version control operations needed to dig for dependencies.
///
/// Streams are lent to a callback so the implementation can clean up the underlying process
/// however the callback exits.
pub trait Repository {
    /// Parents of a commit, in order.
    fn parents(&self, revision: &RevisionId) -> miette::Result<Vec<RevisionId>>;

    /// Read a unified diff from `origin` to `target` with one line of context.
    fn diff<T>(
        &self,
        origin: &RevisionId,
        target: &Revision,
        read: impl FnOnce(&mut dyn BufRead) -> miette::Result<T>,
    ) -> miette::Result<T>;

    /// Read line attributions for `path` at `revision`.
    ///
    /// The callback may stop reading early. Failures caused by that, or by `path` not existing
    /// at `revision`, are not errors.
    fn blame<T>(
        &self,
        revision: &RevisionId,
        path: &Utf8Path,
        read: impl FnOnce(&mut dyn BufRead) -> miette::Result<T>,
    ) -> miette::Result<T>;

    /// A one-line description of a commit, for display.
    fn summary(&self, revision: &RevisionId) -> miette::Result<String>;
}
