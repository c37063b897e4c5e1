use sqlx::{PgExecutor, Postgres, QueryBuilder};

use super::Created;
use crate::error::{AppError, Result};
use crate::models::{
    non_empty, CreateThreadRequest, Thread, ThreadRef, UpdateThreadRequest, VoteRequest,
};

const THREAD_COLUMNS: &str = "id, slug, title, author_nick, forum_slug, message, votes, created";

/// Match a thread by slug ($1) or id ($2), preferring the slug match
const BY_REF: &str =
    "WHERE slug = $1::citext OR id = $2 ORDER BY (slug = $1::citext) IS TRUE DESC LIMIT 1";

pub(super) fn not_found(thread: &ThreadRef) -> AppError {
    AppError::NotFound(format!("Can't find thread by slug or id: {}", thread))
}

/// Append a scalar subquery yielding the referenced thread's id (NULL if absent)
pub(super) fn push_thread_scope(qb: &mut QueryBuilder<'static, Postgres>, thread: &ThreadRef) {
    qb.push("(SELECT id FROM threads WHERE slug = ")
        .push_bind(thread.slug().to_string())
        .push("::citext OR id = ")
        .push_bind(thread.id())
        .push(" ORDER BY (slug = ")
        .push_bind(thread.slug().to_string())
        .push("::citext) IS TRUE DESC LIMIT 1)");
}

/// Resolve a thread reference to `(id, forum_slug)`
pub(super) async fn resolve_thread<'e, E>(
    executor: E,
    thread: &ThreadRef,
) -> Result<Option<(i32, String)>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, (i32, String)>(&format!(
        "SELECT id, forum_slug FROM threads {}",
        BY_REF
    ))
    .bind(thread.slug())
    .bind(thread.id())
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

impl super::Database {
    /// Create a thread in `forum` under the canonical author nickname and
    /// forum slug. A slug clash yields the thread already holding it.
    pub async fn create_thread(
        &self,
        forum: &str,
        req: &CreateThreadRequest,
    ) -> Result<Created<Thread>> {
        let inserted = sqlx::query_as::<_, Thread>(&format!(
            r#"
            INSERT INTO threads (slug, title, author_nick, forum_slug, message, created)
            SELECT $1, $2, u.nickname, f.slug, $5, COALESCE($6, NOW())
            FROM users u, forums f
            WHERE u.nickname = $3::citext AND f.slug = $4::citext
            RETURNING {}
            "#,
            THREAD_COLUMNS
        ))
        .bind(req.slug())
        .bind(&req.title)
        .bind(&req.author)
        .bind(forum)
        .bind(&req.message)
        .bind(req.created)
        .fetch_optional(&self.pool)
        .await;

        match inserted {
            Ok(Some(thread)) => Ok(Created::New(thread)),
            Ok(None) => {
                let (author_exists,): (bool,) = sqlx::query_as(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE nickname = $1::citext)",
                )
                .bind(&req.author)
                .fetch_one(&self.pool)
                .await?;

                if !author_exists {
                    return Err(AppError::NotFound(format!(
                        "Can't find thread author by nickname: {}",
                        req.author
                    )));
                }
                Err(AppError::NotFound(format!(
                    "Can't find thread forum by slug: {}",
                    forum
                )))
            }
            Err(e) if super::is_unique_violation(&e) => {
                let slug = req.slug().unwrap_or_default();
                let existing = self
                    .find_thread(&ThreadRef::parse(slug))
                    .await?
                    .ok_or(AppError::Database(e))?;
                Ok(Created::Existing(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_thread(&self, thread: &ThreadRef) -> Result<Option<Thread>> {
        let row = sqlx::query_as::<_, Thread>(&format!(
            "SELECT {} FROM threads {}",
            THREAD_COLUMNS, BY_REF
        ))
        .bind(thread.slug())
        .bind(thread.id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Get a thread by slug or id
    pub async fn get_thread(&self, thread: &ThreadRef) -> Result<Thread> {
        self.find_thread(thread)
            .await?
            .ok_or_else(|| not_found(thread))
    }

    pub async fn thread_exists(&self, thread: &ThreadRef) -> Result<bool> {
        Ok(resolve_thread(&self.pool, thread).await?.is_some())
    }

    /// Update title and/or message; empty or missing fields are kept
    pub async fn update_thread(
        &self,
        thread: &ThreadRef,
        req: &UpdateThreadRequest,
    ) -> Result<Thread> {
        sqlx::query_as::<_, Thread>(&format!(
            r#"
            UPDATE threads SET
                title = COALESCE($3, title),
                message = COALESCE($4, message)
            WHERE id = (SELECT id FROM threads {})
            RETURNING {}
            "#,
            BY_REF, THREAD_COLUMNS
        ))
        .bind(thread.slug())
        .bind(thread.id())
        .bind(non_empty(&req.title))
        .bind(non_empty(&req.message))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(thread))
    }

    /// Record or replace a user's vote and return the thread with its new tally
    pub async fn vote(&self, thread: &ThreadRef, vote: &VoteRequest) -> Result<Thread> {
        if vote.voice != 1 && vote.voice != -1 {
            return Err(AppError::BadRequest("voice must be 1 or -1".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let (thread_id, _) = resolve_thread(&mut *tx, thread)
            .await?
            .ok_or_else(|| not_found(thread))?;

        sqlx::query(
            r#"
            INSERT INTO votes (nickname, thread_id, voice)
            VALUES ($1, $2, $3)
            ON CONFLICT (nickname, thread_id) DO UPDATE SET voice = EXCLUDED.voice
            "#,
        )
        .bind(&vote.nickname)
        .bind(thread_id)
        .bind(vote.voice)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if super::violated_constraint(&e) == Some("votes_nickname_fkey") {
                return AppError::NotFound(format!(
                    "Can't find user by nickname: {}",
                    vote.nickname
                ));
            }
            AppError::Database(e)
        })?;

        let updated = sqlx::query_as::<_, Thread>(&format!(
            "SELECT {} FROM threads WHERE id = $1",
            THREAD_COLUMNS
        ))
        .bind(thread_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_scope_binds_slug_and_id() {
        let mut qb = QueryBuilder::new("SELECT id FROM posts WHERE thread_id = ");
        push_thread_scope(&mut qb, &ThreadRef::parse("42"));

        assert_eq!(
            qb.sql(),
            "SELECT id FROM posts WHERE thread_id = (SELECT id FROM threads \
             WHERE slug = $1::citext OR id = $2 ORDER BY (slug = $3::citext) IS TRUE DESC LIMIT 1)"
        );
    }

    #[test]
    fn test_not_found_names_reference() {
        let err = not_found(&ThreadRef::parse("missing-thread"));
        assert_eq!(
            err.to_string(),
            "Not found: Can't find thread by slug or id: missing-thread"
        );
    }
}
