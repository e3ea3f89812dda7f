use std::collections::HashSet;

use itertools::Itertools;

use crate::correlate::correlate;
use crate::diff::parse_hunks;
use crate::hunk::Hunk;
use crate::report::Dependency;
use crate::report::Report;
use crate::repository::Repository;
use crate::revision::Revision;
use crate::revision::RevisionId;

/// Report the commits `base` depends on, then the commits those depend on, and so on, up to
/// `max_depth` levels deep.
///
/// Each commit is only dug into once. Later occurrences are reported as already followed.
pub fn dig(
    repository: &impl Repository,
    report: &mut impl Report,
    base: &Revision,
    max_depth: usize,
) -> miette::Result<()> {
    Digger {
        repository,
        report,
        max_depth,
        seen: HashSet::new(),
    }
    .dig(base, 0)
}

struct Digger<'a, R, P> {
    repository: &'a R,
    report: &'a mut P,
    max_depth: usize,
    /// Keyed by commit id, so a boundary `^abc` and a concrete `abc` are the same commit.
    seen: HashSet<RevisionId>,
}

impl<'a, R: Repository, P: Report> Digger<'a, R, P> {
    fn dig(&mut self, revision: &Revision, depth: usize) -> miette::Result<()> {
        if depth >= self.max_depth {
            return Ok(());
        }

        let mut hunks = self.hunks(revision)?;
        correlate(self.repository, &mut hunks)?;
        let dependencies = hunks
            .iter()
            .flat_map(|hunk| hunk.dependencies.iter())
            .unique()
            .cloned()
            .collect::<Vec<_>>();
        tracing::debug!(
            %revision,
            depth,
            hunks = hunks.len(),
            dependencies = dependencies.len(),
            "Found dependencies"
        );
        drop(hunks);

        for dependency in dependencies {
            match dependency {
                Revision::Boundary(id) => {
                    let already_followed = !self.seen.insert(id.clone());
                    self.emit(id, depth, true, already_followed)?;
                }
                Revision::Concrete(id) => {
                    let already_followed = self.seen.contains(&id);
                    self.emit(id.clone(), depth, false, already_followed)?;
                    if !already_followed {
                        self.seen.insert(id.clone());
                        self.dig(&Revision::Concrete(id), depth + 1)?;
                    }
                }
                // Blame never attributes lines to the working tree.
                Revision::WorkingState => {}
            }
        }

        Ok(())
    }

    /// Diff `revision` against its parents.
    fn hunks(&self, revision: &Revision) -> miette::Result<Vec<Hunk>> {
        match revision {
            Revision::WorkingState => {
                let head = RevisionId::head();
                self.repository
                    .diff(&head, revision, |diff| parse_hunks(&head, revision, diff))
            }
            Revision::Concrete(id) => {
                let mut hunks = Vec::new();
                for parent in self.repository.parents(id)? {
                    hunks.extend(self.repository.diff(&parent, revision, |diff| {
                        parse_hunks(&parent, revision, diff)
                    })?);
                }
                Ok(hunks)
            }
            Revision::Boundary(_) => Ok(Vec::new()),
        }
    }

    fn emit(
        &mut self,
        revision: RevisionId,
        depth: usize,
        boundary: bool,
        already_followed: bool,
    ) -> miette::Result<()> {
        let summary = self.repository.summary(&revision)?;
        self.report.dependency(Dependency {
            revision,
            summary,
            depth,
            boundary,
            already_followed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::io::BufRead;

    use camino::Utf8Path;
    use indoc::formatdoc;
    use pretty_assertions::assert_eq;

    /// An in-memory repository which records the queries made of it.
    #[derive(Default)]
    struct FakeRepository {
        parents: BTreeMap<String, Vec<String>>,
        /// Diffs, keyed by `origin..target`.
        diffs: BTreeMap<String, String>,
        /// Blames, keyed by `revision:path`.
        blames: BTreeMap<String, String>,
        queries: RefCell<Vec<String>>,
    }

    impl FakeRepository {
        /// Add a commit `child` with one parent, changing lines of `f` from `start` onwards which
        /// were last touched by `blame`, in order.
        fn commit(&mut self, child: &str, parent: &str, start: u64, blame: &[&str]) {
            self.parents
                .insert(child.to_owned(), vec![parent.to_owned()]);
            self.add_diff(parent, child, start, blame);
        }

        fn add_diff(&mut self, origin: &str, target: &str, start: u64, blame: &[&str]) {
            let count = blame.len();
            self.diffs.insert(
                format!("{origin}..{target}"),
                formatdoc!(
                    "
                    diff --git a/f b/f
                    --- a/f
                    +++ b/f
                    @@ -{start},{count} +{start} @@
                    "
                ),
            );
            let mut text = String::new();
            for n in 1..start {
                text.push_str(&format!("00000000 {n}) filler\n"));
            }
            for (i, revision) in blame.iter().enumerate() {
                text.push_str(&format!("{revision} {}) line\n", start + i as u64));
            }
            self.blames.insert(format!("{origin}:f"), text);
        }

        fn queries(&self) -> Vec<String> {
            self.queries.borrow().clone()
        }
    }

    impl Repository for FakeRepository {
        fn parents(&self, revision: &RevisionId) -> miette::Result<Vec<RevisionId>> {
            self.queries.borrow_mut().push(format!("parents {revision}"));
            Ok(self
                .parents
                .get(revision.as_str())
                .into_iter()
                .flatten()
                .map(|parent| RevisionId::from(parent.as_str()))
                .collect())
        }

        fn diff<T>(
            &self,
            origin: &RevisionId,
            target: &Revision,
            read: impl FnOnce(&mut dyn BufRead) -> miette::Result<T>,
        ) -> miette::Result<T> {
            self.queries
                .borrow_mut()
                .push(format!("diff {origin} {target}"));
            let text = self
                .diffs
                .get(&format!("{origin}..{target}"))
                .map(String::as_str)
                .unwrap_or("");
            read(&mut text.as_bytes())
        }

        fn blame<T>(
            &self,
            revision: &RevisionId,
            path: &Utf8Path,
            read: impl FnOnce(&mut dyn BufRead) -> miette::Result<T>,
        ) -> miette::Result<T> {
            self.queries
                .borrow_mut()
                .push(format!("blame {revision} {path}"));
            let text = self
                .blames
                .get(&format!("{revision}:{path}"))
                .map(String::as_str)
                .unwrap_or("");
            read(&mut text.as_bytes())
        }

        fn summary(&self, revision: &RevisionId) -> miette::Result<String> {
            Ok(format!("{revision} Subject"))
        }
    }

    fn run(repository: &FakeRepository, base: &str, max_depth: usize) -> Vec<String> {
        let mut found = Vec::<Dependency>::new();
        dig(
            repository,
            &mut found,
            &base.parse::<Revision>().unwrap(),
            max_depth,
        )
        .unwrap();
        found
            .iter()
            .map(|dependency| {
                format!(
                    "{}{}{}{}",
                    "    ".repeat(dependency.depth),
                    dependency.revision,
                    if dependency.boundary { " boundary" } else { "" },
                    if dependency.already_followed {
                        " (already followed)"
                    } else {
                        ""
                    }
                )
            })
            .collect()
    }

    #[test]
    fn test_dig_single_dependency() {
        let mut repository = FakeRepository::default();
        repository.commit("C", "P", 10, &["B", "B", "B"]);
        repository.commit("B", "A", 10, &["A", "A", "A"]);

        assert_eq!(run(&repository, "C", 1), vec!["B"]);
        assert_eq!(
            repository.queries(),
            vec!["parents C", "diff P C", "blame P f"]
        );
    }

    #[test]
    fn test_dig_depth_zero() {
        let mut repository = FakeRepository::default();
        repository.commit("C", "P", 10, &["B"]);

        assert_eq!(run(&repository, "C", 0), Vec::<String>::new());
        assert_eq!(repository.queries(), Vec::<String>::new());
    }

    #[test]
    fn test_dig_recurses_in_order() {
        let mut repository = FakeRepository::default();
        repository.commit("D", "P", 3, &["C", "B", "C"]);
        repository.commit("C", "Q", 1, &["A"]);
        repository.commit("B", "R", 5, &["A", "Z"]);

        assert_eq!(
            run(&repository, "D", 3),
            vec![
                "C",
                "    A",
                "B",
                "    A (already followed)",
                "    Z",
            ]
        );
    }

    #[test]
    fn test_dig_already_followed_is_not_expanded() {
        let mut repository = FakeRepository::default();
        repository.commit("D", "P", 1, &["C", "B"]);
        repository.commit("C", "Q", 1, &["B"]);
        repository.commit("B", "R", 1, &["A"]);

        assert_eq!(
            run(&repository, "D", 5),
            vec!["C", "    B", "        A", "B (already followed)"]
        );

        let queries = repository.queries();
        assert_eq!(
            queries
                .iter()
                .filter(|query| query.as_str() == "parents B")
                .count(),
            1
        );
    }

    #[test]
    fn test_dig_boundary_is_not_expanded() {
        let mut repository = FakeRepository::default();
        repository.commit("C", "P", 1, &["^B", "A"]);
        repository.commit("B", "Q", 1, &["X"]);
        repository.commit("A", "R", 1, &["^B"]);

        assert_eq!(
            run(&repository, "C", 5),
            vec!["B boundary", "A", "    B boundary (already followed)"]
        );
        assert!(!repository
            .queries()
            .iter()
            .any(|query| query.contains(" B")));
    }

    #[test]
    fn test_dig_boundary_and_concrete_are_the_same_commit() {
        let mut repository = FakeRepository::default();
        repository.commit("C", "P", 1, &["^B", "B"]);
        repository.commit("B", "Q", 1, &["A"]);

        assert_eq!(
            run(&repository, "C", 5),
            vec!["B boundary", "B (already followed)"]
        );
        assert!(!repository.queries().contains(&"parents B".to_owned()));
    }

    #[test]
    fn test_dig_cycle_terminates() {
        let mut repository = FakeRepository::default();
        repository.commit("A", "P", 1, &["B"]);
        repository.commit("B", "Q", 1, &["A"]);

        assert_eq!(
            run(&repository, "A", 10),
            vec!["B", "    A", "        B (already followed)"]
        );
    }

    #[test]
    fn test_dig_working_state() {
        let mut repository = FakeRepository::default();
        repository.add_diff("HEAD", "WORKING", 2, &["B"]);

        assert_eq!(run(&repository, "WORKING", 1), vec!["B"]);
        assert_eq!(
            repository.queries(),
            vec!["diff HEAD WORKING", "blame HEAD f"]
        );
    }

    #[test]
    fn test_dig_merge_commit() {
        let mut repository = FakeRepository::default();
        repository
            .parents
            .insert("M".to_owned(), vec!["P1".to_owned(), "P2".to_owned()]);
        repository.add_diff("P1", "M", 1, &["A"]);
        repository.add_diff("P2", "M", 1, &["B", "A"]);

        assert_eq!(run(&repository, "M", 1), vec!["A", "B"]);
        assert_eq!(
            repository.queries(),
            vec![
                "parents M",
                "diff P1 M",
                "diff P2 M",
                "blame P1 f",
                "blame P2 f"
            ]
        );
    }
}
