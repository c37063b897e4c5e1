use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A forum with its trigger-maintained counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Forum {
    pub slug: String,
    pub title: String,
    /// Owner nickname
    #[sqlx(rename = "author_nick")]
    pub user: String,
    pub posts: i64,
    pub threads: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateForumRequest {
    pub slug: String,
    pub title: String,
    pub user: String,
}
