use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A discussion thread inside a forum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Thread {
    pub id: i32,
    /// Optional human-readable identifier, unique when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub title: String,
    #[sqlx(rename = "author_nick")]
    pub author: String,
    /// Canonical slug of the owning forum
    #[sqlx(rename = "forum_slug")]
    pub forum: String,
    pub message: String,
    /// Vote tally, maintained by the database
    pub votes: i32,
    pub created: DateTime<Utc>,
}

/// Body of `POST /forum/{slug}/create`
#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    pub author: String,
    pub message: String,
    /// Defaults to the insertion time
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl CreateThreadRequest {
    /// Empty slugs are stored as NULL so they never collide
    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateThreadRequest {
    pub title: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub nickname: String,
    pub voice: i32,
}

/// A thread as addressed in a URL: either its slug or its numeric id.
///
/// A numeric segment may still be a slug; lookups match on both and prefer
/// the slug match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRef {
    raw: String,
    id: Option<i32>,
}

impl ThreadRef {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let id = raw.parse::<i32>().ok();
        Self { raw, id }
    }

    pub fn slug(&self) -> &str {
        &self.raw
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }
}

impl std::fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_ref_parse() {
        let numeric = ThreadRef::parse("42");
        assert_eq!(numeric.id(), Some(42));
        assert_eq!(numeric.slug(), "42");

        let slug = ThreadRef::parse("rust-2024");
        assert_eq!(slug.id(), None);
        assert_eq!(slug.slug(), "rust-2024");
        assert_eq!(slug.to_string(), "rust-2024");
    }

    #[test]
    fn test_empty_slug_is_absent() {
        let req: CreateThreadRequest = serde_json::from_str(
            r#"{"slug":"","title":"t","author":"a","message":"m"}"#,
        )
        .unwrap();
        assert_eq!(req.slug(), None);
        assert!(req.created.is_none());
    }

    #[test]
    fn test_created_parses_rfc3339() {
        let req: CreateThreadRequest = serde_json::from_str(
            r#"{"title":"t","author":"a","message":"m","created":"2017-01-01T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(
            req.created.unwrap().to_rfc3339(),
            "2017-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_missing_slug_is_not_serialized() {
        let thread = Thread {
            id: 1,
            slug: None,
            title: "t".into(),
            author: "a".into(),
            forum: "f".into(),
            message: "m".into(),
            votes: 0,
            created: Utc::now(),
        };
        let value = serde_json::to_value(&thread).unwrap();
        assert!(value.get("slug").is_none());
        assert_eq!(value["author"], "a");
        assert_eq!(value["forum"], "f");
    }
}
