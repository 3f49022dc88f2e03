//! Filter and sort criteria for listing notes.

use std::cmp::Ordering;

use super::models::{parse_tags, NoteRecord};

/// Ordering applied to a note listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    /// Store order, which is insertion order since ids are time-ordered.
    #[default]
    Natural,
    /// `created_at` descending.
    Newest,
    /// `downloads` descending.
    MostDownloads,
}

impl SortMode {
    /// Parse the wire form of a sort mode. Unknown values fall back to `Natural`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "newest" => SortMode::Newest,
            "most_downloads" => SortMode::MostDownloads,
            _ => SortMode::Natural,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
    /// Case-insensitive substring of the subject code
    pub subject: Option<String>,
    /// Exact semester
    pub semester: Option<String>,
    /// Matches notes carrying at least one of these tags; empty means any
    pub tags: Vec<String>,
    pub sort: SortMode,
}

impl NoteQuery {
    /// Build criteria from raw request values, ignoring blank parameters.
    pub fn from_params(
        subject: Option<&str>,
        semester: Option<&str>,
        tags: Option<&str>,
        sort: Option<&str>,
    ) -> Self {
        let non_blank = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };

        Self {
            subject: non_blank(subject),
            semester: non_blank(semester),
            tags: tags.map(parse_tags).unwrap_or_default(),
            sort: sort.map(SortMode::parse).unwrap_or_default(),
        }
    }

    pub fn matches(&self, note: &NoteRecord) -> bool {
        if let Some(ref subject) = self.subject {
            let needle = subject.to_lowercase();
            let hit = note
                .subject_code
                .as_deref()
                .is_some_and(|code| code.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(ref semester) = self.semester {
            if note.semester.as_deref() != Some(semester.as_str()) {
                return false;
            }
        }

        if !self.tags.is_empty() && !note.has_any_tag(&self.tags) {
            return false;
        }

        true
    }

    /// Filter then order `notes`, which must arrive in store order.
    pub fn apply(&self, notes: Vec<NoteRecord>) -> Vec<NoteRecord> {
        let mut matched: Vec<NoteRecord> =
            notes.into_iter().filter(|n| self.matches(n)).collect();

        match self.sort {
            SortMode::Natural => {}
            SortMode::Newest => matched.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| tie_break(a, b))
            }),
            SortMode::MostDownloads => matched.sort_by(|a, b| {
                b.downloads
                    .cmp(&a.downloads)
                    .then_with(|| tie_break(a, b))
            }),
        }

        matched
    }
}

fn tie_break(a: &NoteRecord, b: &NoteRecord) -> Ordering {
    a.id.cmp(&b.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn note(id: &str, subject: &str, semester: &str, tags: &[&str]) -> NoteRecord {
        NoteRecord {
            id: id.to_string(),
            storage_name: format!("{id}.pdf"),
            original_filename: format!("{id}.pdf"),
            content_type: "application/pdf".to_string(),
            byte_size: 10,
            downloads: 0,
            created_at: Utc::now(),
            title: None,
            subject_code: Some(subject.to_string()),
            subject_title: None,
            semester: Some(semester.to_string()),
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            uploader_id: None,
        }
    }

    #[test]
    fn test_sort_mode_parse() {
        assert_eq!(SortMode::parse("newest"), SortMode::Newest);
        assert_eq!(SortMode::parse("most_downloads"), SortMode::MostDownloads);
        assert_eq!(SortMode::parse("oldest"), SortMode::Natural);
        assert_eq!(SortMode::parse("mostdownloads"), SortMode::Natural);
        assert_eq!(SortMode::parse(""), SortMode::Natural);
    }

    #[test]
    fn test_subject_match_is_case_insensitive_substring() {
        let query = NoteQuery::from_params(Some("cs1"), None, None, None);
        assert!(query.matches(&note("a", "CS101", "3", &[])));
        assert!(!query.matches(&note("b", "MA201", "3", &[])));
    }

    #[test]
    fn test_subject_is_matched_literally() {
        let query = NoteQuery::from_params(Some("CS.*"), None, None, None);
        assert!(!query.matches(&note("a", "CS101", "3", &[])));
    }

    #[test]
    fn test_semester_is_exact() {
        let query = NoteQuery::from_params(None, Some("3"), None, None);
        assert!(query.matches(&note("a", "CS101", "3", &[])));
        assert!(!query.matches(&note("b", "CS101", "13", &[])));
    }

    #[test]
    fn test_tags_match_any() {
        let query = NoteQuery::from_params(None, None, Some("math, physics"), None);
        assert!(query.matches(&note("a", "X", "1", &["exam", "math"])));
        assert!(query.matches(&note("b", "X", "1", &["physics"])));
        assert!(!query.matches(&note("c", "X", "1", &["chemistry"])));
        assert!(!query.matches(&note("d", "X", "1", &[])));
    }

    #[test]
    fn test_blank_params_apply_no_filter() {
        let query = NoteQuery::from_params(Some(" "), Some(""), Some(","), None);
        assert!(query.matches(&note("a", "X", "1", &[])));
    }

    #[test]
    fn test_newest_orders_by_created_at_then_id() {
        let now = Utc::now();
        let mut old = note("c", "X", "1", &[]);
        old.created_at = now - Duration::hours(1);
        let mut tied_b = note("b", "X", "1", &[]);
        tied_b.created_at = now;
        let mut tied_a = note("a", "X", "1", &[]);
        tied_a.created_at = now;

        let query = NoteQuery {
            sort: SortMode::Newest,
            ..Default::default()
        };
        let ids: Vec<String> = query
            .apply(vec![old, tied_b, tied_a])
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_most_downloads_orders_descending() {
        let mut low = note("a", "X", "1", &[]);
        low.downloads = 1;
        let mut high = note("b", "X", "1", &[]);
        high.downloads = 9;

        let query = NoteQuery {
            sort: SortMode::MostDownloads,
            ..Default::default()
        };
        let sorted = query.apply(vec![low, high]);
        assert_eq!(sorted[0].id, "b");
        assert_eq!(sorted[1].id, "a");
    }

    #[test]
    fn test_natural_keeps_input_order() {
        let query = NoteQuery::default();
        let ids: Vec<String> = query
            .apply(vec![note("z", "X", "1", &[]), note("a", "X", "1", &[])])
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["z", "a"]);
    }
}
