use crate::error::Result;
use crate::models::Status;

impl super::Database {
    /// Row counts of the main entities
    pub async fn status(&self) -> Result<Status> {
        let (user, forum, thread, post) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM forums),
                (SELECT COUNT(*) FROM threads),
                (SELECT COUNT(*) FROM posts)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Status {
            user,
            forum,
            thread,
            post,
        })
    }

    /// Remove all data
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("TRUNCATE forum_users, votes, posts, threads, forums, users CASCADE")
            .execute(&self.pool)
            .await?;

        tracing::info!("cleared all forum data");
        Ok(())
    }
}
