use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{empty_as_default, empty_as_none, Forum, Thread, User};

/// A post in a thread
///
/// Rows are selected with column aliases matching these field names
/// (see `db::posts::POST_COLUMNS`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    /// Parent post id, 0 for a root post
    pub parent: i64,
    pub author: String,
    pub message: String,
    #[serde(rename = "isEdited")]
    pub is_edited: bool,
    /// Forum slug, denormalized from the thread
    pub forum: String,
    /// Thread id
    pub thread: i32,
    pub created: DateTime<Utc>,
}

/// One element of the `POST /thread/{slug_or_id}/create` body
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    /// 0 or absent for a root post
    #[serde(default)]
    pub parent: i64,
    pub author: String,
    pub message: String,
}

impl CreatePostRequest {
    pub fn parent_id(&self) -> Option<i64> {
        (self.parent != 0).then_some(self.parent)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub message: Option<String>,
}

/// Ordering mode for `GET /thread/{slug_or_id}/posts`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSort {
    /// By creation time, then id
    #[default]
    Flat,
    /// Depth-first by materialized path; limit counts posts
    Tree,
    /// Depth-first by path; limit counts root posts
    ParentTree,
}

impl FromStr for PostSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(PostSort::Flat),
            "tree" => Ok(PostSort::Tree),
            "parent_tree" => Ok(PostSort::ParentTree),
            other => Err(format!(
                "unknown sort `{}`, expected `flat`, `tree` or `parent_tree`",
                other
            )),
        }
    }
}

/// Query of `GET /thread/{slug_or_id}/posts`; empty values count as absent
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadPostsQuery {
    #[serde(default, deserialize_with = "empty_as_default")]
    pub limit: u32,
    /// Post id cursor
    #[serde(default, deserialize_with = "empty_as_none")]
    pub since: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_default")]
    pub desc: bool,
    #[serde(default, deserialize_with = "empty_as_default")]
    pub sort: PostSort,
}

/// Which related entities to include with a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Related {
    pub user: bool,
    pub thread: bool,
    pub forum: bool,
}

impl Related {
    /// Parse a comma-separated list such as `user,forum`. Unknown names are ignored.
    pub fn parse(list: &str) -> Self {
        let mut related = Related::default();
        for kind in list.split(',').map(str::trim) {
            match kind {
                "user" => related.user = true,
                "thread" => related.thread = true,
                "forum" => related.forum = true,
                _ => {}
            }
        }
        related
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PostDetailsQuery {
    #[serde(default)]
    pub related: Option<String>,
}

impl PostDetailsQuery {
    pub fn related(&self) -> Related {
        self.related.as_deref().map(Related::parse).unwrap_or_default()
    }
}

/// Post plus whichever related entities were requested
#[derive(Debug, Serialize)]
pub struct PostDetails {
    pub post: Post,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<Thread>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forum: Option<Forum>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_parse() {
        assert_eq!(Related::parse(""), Related::default());
        assert_eq!(
            Related::parse("user,forum"),
            Related { user: true, thread: false, forum: true }
        );
        assert_eq!(
            Related::parse("thread, bogus ,user"),
            Related { user: true, thread: true, forum: false }
        );
    }

    #[test]
    fn test_sort_from_query_value() {
        let sort: PostSort = serde_json::from_str(r#""parent_tree""#).unwrap();
        assert_eq!(sort, PostSort::ParentTree);
        assert!(serde_json::from_str::<PostSort>(r#""sideways""#).is_err());
        assert_eq!(PostSort::default(), PostSort::Flat);
    }

    #[test]
    fn test_posts_query_empty_values() {
        let uri = axum::http::Uri::from_static("/posts?sort=&limit=&since=&desc=");
        let query = axum::extract::Query::<ThreadPostsQuery>::try_from_uri(&uri)
            .unwrap()
            .0;
        assert_eq!(query.sort, PostSort::Flat);
        assert_eq!(query.limit, 0);
        assert_eq!(query.since, None);
        assert!(!query.desc);

        let uri = axum::http::Uri::from_static("/posts?sort=tree&since=12");
        let query = axum::extract::Query::<ThreadPostsQuery>::try_from_uri(&uri)
            .unwrap()
            .0;
        assert_eq!(query.sort, PostSort::Tree);
        assert_eq!(query.since, Some(12));

        let uri = axum::http::Uri::from_static("/posts?sort=sideways");
        assert!(axum::extract::Query::<ThreadPostsQuery>::try_from_uri(&uri).is_err());
    }

    #[test]
    fn test_parent_zero_means_root() {
        let posts: Vec<CreatePostRequest> = serde_json::from_str(
            r#"[{"author":"a","message":"root"},{"author":"b","message":"reply","parent":7}]"#,
        )
        .unwrap();
        assert_eq!(posts[0].parent_id(), None);
        assert_eq!(posts[1].parent_id(), Some(7));
    }

    #[test]
    fn test_details_omits_unrequested() {
        let details = PostDetails {
            post: Post {
                id: 1,
                parent: 0,
                author: "a".into(),
                message: "m".into(),
                is_edited: false,
                forum: "f".into(),
                thread: 1,
                created: Utc::now(),
            },
            author: None,
            thread: None,
            forum: None,
        };
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["post"]["isEdited"], false);
        assert!(value.get("author").is_none());
        assert!(value.get("thread").is_none());
        assert!(value.get("forum").is_none());
    }
}
