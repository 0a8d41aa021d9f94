//! Line ↔ candidate mapping.
//!
//! A [`CandidateTable`] is built from the caller's slice right before the
//! selector runs.  It renders one line per candidate (in input order) and
//! resolves the lines the selector prints back to the candidates they came
//! from.  Resolution hands out references into the caller's slice, so the
//! values that come back are the very values that went in.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Separates the index from the display text in [`DuplicatePolicy::IndexPrefix`] lines.
pub const INDEX_DELIMITER: char = '\t';

/// What to do about candidates whose display strings collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Lines are the display strings verbatim.  Choosing a line shared by
    /// several candidates fails with [`Error::AmbiguousDisplay`].
    #[default]
    Reject,
    /// Every line is prefixed with the candidate index, which the selector is
    /// told to hide.  Duplicates are then harmless.
    IndexPrefix,
}

impl DuplicatePolicy {
    /// Extra selector flags this policy needs.
    pub fn selector_args(self) -> Vec<String> {
        match self {
            Self::Reject => Vec::new(),
            Self::IndexPrefix => vec![
                format!("--delimiter={INDEX_DELIMITER}"),
                "--with-nth=2..".to_string(),
            ],
        }
    }
}

/// Candidates plus the lines they render to.
#[derive(Debug)]
pub struct CandidateTable<'a, T> {
    candidates: &'a [T],
    lines: Vec<String>,
    /// Line → every candidate index that renders to it.
    by_line: HashMap<String, Vec<usize>>,
    policy: DuplicatePolicy,
}

impl<'a, T> CandidateTable<'a, T> {
    /// Render every candidate with `display`.
    ///
    /// Fails with [`Error::InvalidDisplay`] on the first display string that
    /// contains a newline, since it would show up as two lines.
    pub fn build<F>(candidates: &'a [T], display: F, policy: DuplicatePolicy) -> Result<Self>
    where
        F: Fn(&T) -> String,
    {
        let mut lines = Vec::with_capacity(candidates.len());
        let mut by_line: HashMap<String, Vec<usize>> = HashMap::with_capacity(candidates.len());

        for (index, candidate) in candidates.iter().enumerate() {
            let text = display(candidate);
            if text.contains('\n') {
                return Err(Error::InvalidDisplay { index });
            }
            let line = match policy {
                DuplicatePolicy::Reject => text,
                DuplicatePolicy::IndexPrefix => format!("{index}{INDEX_DELIMITER}{text}"),
            };
            by_line.entry(line.clone()).or_default().push(index);
            lines.push(line);
        }

        Ok(Self {
            candidates,
            lines,
            by_line,
            policy,
        })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Rendered lines, in candidate order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `true` when at least two candidates render to the same line.
    pub fn has_duplicates(&self) -> bool {
        self.by_line.len() != self.lines.len()
    }

    /// Newline-terminated lines, ready to be piped into the selector.
    pub fn input(&self) -> Vec<u8> {
        let size = self.lines.iter().map(|l| l.len() + 1).sum();
        let mut buf = Vec::with_capacity(size);
        for line in &self.lines {
            buf.extend_from_slice(line.as_bytes());
            buf.push(b'\n');
        }
        buf
    }

    /// Map one selector output line back to its candidate.
    pub fn resolve(&self, line: &str) -> Result<&'a T> {
        if self.policy == DuplicatePolicy::IndexPrefix {
            let candidate = line
                .split_once(INDEX_DELIMITER)
                .and_then(|(index, _)| index.parse::<usize>().ok())
                .and_then(|index| self.candidates.get(index));
            return candidate.ok_or_else(|| Error::UnknownLine { line: line.into() });
        }

        match self.by_line.get(line).map(Vec::as_slice) {
            Some([index]) => Ok(&self.candidates[*index]),
            Some(indices) if !indices.is_empty() => Err(Error::AmbiguousDisplay {
                line: line.into(),
                indices: indices.to_vec(),
            }),
            _ => Err(Error::UnknownLine { line: line.into() }),
        }
    }

    /// Map every line, keeping order and repeats.
    pub fn resolve_all<'l, I>(&self, lines: I) -> Result<Vec<&'a T>>
    where
        I: IntoIterator<Item = &'l str>,
    {
        lines.into_iter().map(|line| self.resolve(line)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, PartialEq)]
    struct Host {
        name: &'static str,
        port: u16,
    }

    fn hosts() -> Vec<Host> {
        vec![
            Host { name: "alpha", port: 22 },
            Host { name: "beta", port: 2222 },
            Host { name: "alpha", port: 8022 },
        ]
    }

    #[test]
    fn renders_lines_in_input_order() {
        let items = hosts();
        let table =
            CandidateTable::build(&items, |h| format!("{}:{}", h.name, h.port), DuplicatePolicy::Reject)
                .unwrap();
        assert_eq!(table.lines(), ["alpha:22", "beta:2222", "alpha:8022"]);
        assert_eq!(table.input(), b"alpha:22\nbeta:2222\nalpha:8022\n");
        assert!(!table.has_duplicates());
    }

    #[test]
    fn selected_duplicate_is_ambiguous() {
        let items = hosts();
        let table = CandidateTable::build(&items, |h| h.name.to_string(), DuplicatePolicy::Reject)
            .unwrap();
        assert!(table.has_duplicates());

        // The unique line still resolves.
        assert_eq!(table.resolve("beta").unwrap().port, 2222);

        match table.resolve("alpha") {
            Err(Error::AmbiguousDisplay { line, indices }) => {
                assert_eq!(line, "alpha");
                assert_eq!(indices, vec![0, 2]);
            }
            other => panic!("expected AmbiguousDisplay, got {other:?}"),
        }
    }

    #[test]
    fn index_prefix_disambiguates() {
        let items = hosts();
        let table =
            CandidateTable::build(&items, |h| h.name.to_string(), DuplicatePolicy::IndexPrefix)
                .unwrap();
        assert_eq!(table.lines(), ["0\talpha", "1\tbeta", "2\talpha"]);
        assert!(std::ptr::eq(table.resolve("2\talpha").unwrap(), &items[2]));
        assert!(matches!(
            table.resolve("7\talpha"),
            Err(Error::UnknownLine { .. })
        ));
        assert!(matches!(table.resolve("alpha"), Err(Error::UnknownLine { .. })));
    }

    #[test]
    fn newline_in_display_is_rejected() {
        let items = ["ok", "two\nlines"];
        let err = CandidateTable::build(&items, |s| s.to_string(), DuplicatePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDisplay { index: 1 }));
    }

    #[test]
    fn unknown_line_is_reported() {
        let items = ["a", "b"];
        let table =
            CandidateTable::build(&items, |s| s.to_string(), DuplicatePolicy::Reject).unwrap();
        assert!(matches!(table.resolve("c"), Err(Error::UnknownLine { .. })));
    }

    #[test]
    fn resolve_all_keeps_order_and_repeats() {
        let items = ["x", "y", "z"];
        let table =
            CandidateTable::build(&items, |s| s.to_string(), DuplicatePolicy::Reject).unwrap();
        let picked = table.resolve_all(["z", "x", "z"]).unwrap();
        assert_eq!(picked, vec![&"z", &"x", &"z"]);
    }

    #[test]
    fn index_prefix_adds_selector_flags() {
        assert!(DuplicatePolicy::Reject.selector_args().is_empty());
        assert_eq!(
            DuplicatePolicy::IndexPrefix.selector_args(),
            ["--delimiter=\t", "--with-nth=2.."]
        );
    }

    proptest! {
        #[test]
        fn every_line_maps_back_to_its_candidate(
            labels in prop::collection::hash_set("[a-z0-9 ]{1,12}", 1..40)
        ) {
            let items: Vec<String> = labels.into_iter().collect();
            let table = CandidateTable::build(&items, |s| s.clone(), DuplicatePolicy::Reject).unwrap();
            for (item, line) in items.iter().zip(table.lines()) {
                prop_assert!(std::ptr::eq(table.resolve(line).unwrap(), item));
            }
        }

        #[test]
        fn index_prefix_round_trips_with_duplicates(
            labels in prop::collection::vec("[ab]{1,2}", 1..30)
        ) {
            let table = CandidateTable::build(&labels, |s| s.clone(), DuplicatePolicy::IndexPrefix).unwrap();
            for (item, line) in labels.iter().zip(table.lines()) {
                prop_assert!(std::ptr::eq(table.resolve(line).unwrap(), item));
            }
        }
    }
}
