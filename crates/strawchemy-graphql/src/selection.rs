//! Field-selection paths.
//!
//! Flattens the requested output tree into slash-delimited paths: leaves are
//! `/root/child/leaf`, and every field with a sub-selection contributes the
//! prefix `/root/child/` to its children. Fetch resolvers use
//! [`SelectionPaths::is_selected`] to decide which relations to pre-load.

use std::collections::BTreeSet;

use async_graphql::SelectionField;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPaths {
    paths: BTreeSet<String>,
}

impl SelectionPaths {
    /// Paths below (and including) the given root field.
    pub fn from_field(field: SelectionField<'_>) -> Self {
        let mut paths = BTreeSet::new();
        let prefix = format!("/{}/", field.name());
        expand(field, &prefix, &mut paths);
        Self { paths }
    }

    /// Builds paths from already flattened strings.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether anything below `prefix` (which ends with `/`) was selected.
    pub fn is_selected(&self, prefix: &str) -> bool {
        self.paths
            .range(prefix.to_string()..)
            .next()
            .is_some_and(|p| p.starts_with(prefix))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn expand(field: SelectionField<'_>, prefix: &str, out: &mut BTreeSet<String>) {
    for child in field.selection_set() {
        let mut grandchildren = child.selection_set().peekable();
        if grandchildren.peek().is_none() {
            out.insert(format!("{prefix}{}", child.name()));
        } else {
            let nested = format!("{prefix}{}/", child.name());
            expand(child, &nested, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_selected_matches_prefixes() {
        let paths = SelectionPaths::from_paths([
            "/fetchAllDatasets/name",
            "/fetchAllDatasets/datafiles/name",
            "/fetchAllDatasets/datafiles/produced_by/name",
        ]);

        assert!(paths.is_selected("/fetchAllDatasets/datafiles/"));
        assert!(paths.is_selected("/fetchAllDatasets/datafiles/produced_by/"));
        assert!(!paths.is_selected("/fetchAllDatasets/crs/"));
        assert!(!paths.is_selected("/fetchAllDatasets/data/"));
    }

    #[test]
    fn test_empty_paths() {
        let paths = SelectionPaths::default();
        assert!(paths.is_empty());
        assert!(!paths.is_selected("/anything/"));
    }
}
