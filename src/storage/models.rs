use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A note's metadata record stored in redb.
///
/// The bytes live in the blob store under `storage_name`; the record never
/// embeds them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    // System fields
    pub id: String,
    pub storage_name: String,
    pub original_filename: String,
    pub content_type: String,
    pub byte_size: u64,
    pub downloads: u64,
    pub created_at: DateTime<Utc>,

    // Descriptive fields (all optional)
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject_code: Option<String>,
    #[serde(default)]
    pub subject_title: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub uploader_id: Option<String>,
}

impl NoteRecord {
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// A registered user stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Split a comma-delimited tag string into a de-duplicated, trimmed list.
///
/// Empty segments are dropped, so `""` and `" , "` both yield no tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_trims_and_splits() {
        assert_eq!(parse_tags("exam, important"), vec!["exam", "important"]);
    }

    #[test]
    fn test_parse_tags_empty() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ,").is_empty());
    }

    #[test]
    fn test_parse_tags_keeps_first_occurrence() {
        assert_eq!(parse_tags("math,exam,math"), vec!["math", "exam"]);
    }
}
