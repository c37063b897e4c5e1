use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use super::{Bound, Created, Page};
use crate::error::{AppError, Result};
use crate::models::{CreateForumRequest, Forum, Thread, User};

impl super::Database {
    /// Create a forum owned by an existing user, stored under the owner's
    /// canonical nickname. A slug clash yields the forum already holding it.
    pub async fn create_forum(&self, req: &CreateForumRequest) -> Result<Created<Forum>> {
        let inserted = sqlx::query_as::<_, Forum>(
            r#"
            INSERT INTO forums (slug, title, author_nick)
            SELECT $1, $2, u.nickname FROM users u WHERE u.nickname = $3::citext
            RETURNING slug, title, author_nick, posts, threads
            "#,
        )
        .bind(&req.slug)
        .bind(&req.title)
        .bind(&req.user)
        .fetch_optional(&self.pool)
        .await;

        match inserted {
            Ok(Some(forum)) => Ok(Created::New(forum)),
            Ok(None) => Err(AppError::NotFound(format!(
                "Can't find user by nickname: {}",
                req.user
            ))),
            Err(e) if super::is_unique_violation(&e) => {
                let existing = self
                    .find_forum(&req.slug)
                    .await?
                    .ok_or(AppError::Database(e))?;
                Ok(Created::Existing(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_forum(&self, slug: &str) -> Result<Option<Forum>> {
        let forum = sqlx::query_as::<_, Forum>(
            "SELECT slug, title, author_nick, posts, threads FROM forums WHERE slug = $1::citext",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(forum)
    }

    /// Get a forum by slug
    pub async fn get_forum(&self, slug: &str) -> Result<Forum> {
        self.find_forum(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Can't find forum by slug: {}", slug)))
    }

    pub async fn forum_exists(&self, slug: &str) -> Result<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM forums WHERE slug = $1::citext)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// Threads of a forum ordered by creation time; the cursor is inclusive
    pub async fn get_forum_threads(
        &self,
        slug: &str,
        page: &Page<DateTime<Utc>>,
    ) -> Result<Vec<Thread>> {
        let mut qb = forum_threads_query(slug, page);
        let threads = qb.build_query_as::<Thread>().fetch_all(&self.pool).await?;

        if threads.is_empty() && !self.forum_exists(slug).await? {
            return Err(AppError::NotFound(format!("Can't find forum by slug: {}", slug)));
        }

        Ok(threads)
    }

    /// Users who posted or opened threads in a forum, by nickname; the cursor is exclusive
    pub async fn get_forum_users(&self, slug: &str, page: &Page<String>) -> Result<Vec<User>> {
        let mut qb = forum_users_query(slug, page);
        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;

        if users.is_empty() && !self.forum_exists(slug).await? {
            return Err(AppError::NotFound(format!("Can't find forum by slug: {}", slug)));
        }

        Ok(users)
    }
}

fn forum_threads_query(slug: &str, page: &Page<DateTime<Utc>>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT id, slug, title, author_nick, forum_slug, message, votes, created \
         FROM threads WHERE forum_slug = ",
    );
    qb.push_bind(slug.to_string()).push("::citext");
    page.push_since(&mut qb, "created", Bound::Inclusive);
    page.push_order(&mut qb, &["created"]);
    page.push_limit(&mut qb);
    qb
}

fn forum_users_query(slug: &str, page: &Page<String>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT u.nickname, u.fullname, u.email, u.about \
         FROM forum_users fu JOIN users u ON u.nickname = fu.nickname \
         WHERE fu.forum_slug = ",
    );
    qb.push_bind(slug.to_string()).push("::citext");
    page.push_cursor(&mut qb, "u.nickname", Bound::Exclusive, |qb, since| {
        qb.push_bind(since).push("::citext");
    });
    page.push_order(&mut qb, &["u.nickname"]);
    page.push_limit(&mut qb);
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_threads_query_inclusive_cursor() {
        let page = Page {
            since: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            desc: true,
            limit: 4,
        };
        let qb = forum_threads_query("rust", &page);

        assert_eq!(
            qb.sql(),
            "SELECT id, slug, title, author_nick, forum_slug, message, votes, created \
             FROM threads WHERE forum_slug = $1::citext AND created <= $2 \
             ORDER BY created DESC LIMIT $3"
        );
    }

    #[test]
    fn test_users_query_exclusive_cursor() {
        let page = Page { since: Some("mike".to_string()), desc: false, limit: 0 };
        let qb = forum_users_query("rust", &page);

        assert_eq!(
            qb.sql(),
            "SELECT u.nickname, u.fullname, u.email, u.about \
             FROM forum_users fu JOIN users u ON u.nickname = fu.nickname \
             WHERE fu.forum_slug = $1::citext AND u.nickname > $2::citext \
             ORDER BY u.nickname ASC"
        );
    }
}
