use std::collections::BTreeMap;
use std::io::BufRead;

use camino::Utf8PathBuf;
use miette::Context;

use crate::blame::Attribution;
use crate::blame::BlameReader;
use crate::hunk::Hunk;
use crate::repository::Repository;
use crate::revision::RevisionId;

/// Fill in the dependencies of each hunk.
///
/// One blame stream is read for each distinct `(parent, path)`.
pub fn correlate(repository: &impl Repository, hunks: &mut [Hunk]) -> miette::Result<()> {
    let mut groups = BTreeMap::<(RevisionId, Utf8PathBuf), Vec<&mut Hunk>>::new();
    for hunk in hunks.iter_mut() {
        groups
            .entry((hunk.parent.clone(), hunk.path.clone()))
            .or_default()
            .push(hunk);
    }

    for ((parent, path), mut group) in groups {
        // The blame stream is only read forwards.
        group.sort_by_key(|hunk| hunk.origin.start);
        tracing::debug!(%parent, %path, hunks = group.len(), "Blaming");
        repository
            .blame(&parent, &path, |blame| attribute_hunks(blame, group))
            .wrap_err_with(|| format!("Failed to blame `{path}` at {parent}"))?;
    }

    Ok(())
}

/// Read a single blame stream, adding the revisions covering each hunk's origin lines to its
/// dependencies.
///
/// Hunks must be sorted by the start of their origin range.
pub fn attribute_hunks<'a>(
    blame: impl BufRead,
    hunks: impl IntoIterator<Item = &'a mut Hunk>,
) -> miette::Result<()> {
    let mut reader = BlameReader::new(blame);

    for hunk in hunks {
        let preceding = hunk
            .origin
            .start
            .saturating_sub(reader.line_number() + 1);
        for _ in 0..preceding {
            if reader.next_attribution()?.is_none() {
                return Ok(());
            }
        }

        for _ in 0..hunk.origin.count {
            match reader.next_attribution()? {
                Some(Attribution::Line { revision, .. }) => {
                    hunk.dependencies.insert(revision);
                }
                Some(Attribution::Corrupt) => {}
                None => return Ok(()),
            }
        }

        if hunk.dependencies.is_empty() {
            tracing::trace!(%hunk, "No lines to attribute");
        } else {
            tracing::trace!(
                %hunk,
                raw = %hunk.raw_line,
                dependencies = hunk.dependencies.len(),
                "Attributed hunk"
            );
        }
    }

    Ok(())
}
