use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder};

use super::threads::{not_found as thread_not_found, push_thread_scope, resolve_thread};
use super::{Bound, Page, PARENT_MISMATCH};
use crate::error::{AppError, Result};
use crate::models::{
    non_empty, CreatePostRequest, Forum, Post, PostDetails, PostSort, Related, Thread, ThreadRef,
    UpdatePostRequest, User,
};

/// Post columns aliased to the field names of [`Post`]; the table must be aliased `p`
pub(crate) const POST_COLUMNS: &str = "p.id, COALESCE(p.parent_id, 0) AS parent, \
     p.author_nick AS author, p.message, p.is_edited, p.forum_slug AS forum, \
     p.thread_id AS thread, p.created";

impl super::Database {
    /// Insert a batch of posts into one thread atomically.
    ///
    /// The returned posts are in input order. Nothing is committed if any
    /// author is unknown or any parent belongs to a different thread.
    pub async fn create_posts(
        &self,
        thread: &ThreadRef,
        posts: &[CreatePostRequest],
    ) -> Result<Vec<Post>> {
        let mut tx = self.pool.begin().await?;

        let (thread_id, forum) = resolve_thread(&mut *tx, thread)
            .await?
            .ok_or_else(|| thread_not_found(thread))?;

        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let mut authors: Vec<String> = posts.iter().map(|p| p.author.clone()).collect();
        authors.sort();
        authors.dedup();

        // Requested spelling -> stored nickname, NULL when unknown
        let matches: Vec<(String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT a.nick, u.nickname
            FROM UNNEST($1::text[]) AS a(nick)
            LEFT JOIN users u ON u.nickname = a.nick::citext
            "#,
        )
        .bind(&authors)
        .fetch_all(&mut *tx)
        .await?;
        let canonical: HashMap<String, Option<String>> = matches.into_iter().collect();

        let resolved = posts
            .iter()
            .map(|post| {
                canonical
                    .get(&post.author)
                    .cloned()
                    .flatten()
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "Can't find post author by nickname: {}",
                            post.author
                        ))
                    })
            })
            .collect::<Result<Vec<String>>>()?;

        let mut qb = insert_posts_query(thread_id, &forum, posts, &resolved);
        let rows: Vec<(i64, String, DateTime<Utc>)> = qb
            .build_query_as()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| {
                if super::has_sqlstate(&e, PARENT_MISMATCH) {
                    return AppError::Conflict(
                        "Parent post was created in another thread".to_string(),
                    );
                }
                AppError::Database(e)
            })?;

        tx.commit().await?;

        tracing::debug!(thread_id, count = rows.len(), "created posts");

        // RETURNING yields rows in VALUES order
        Ok(posts
            .iter()
            .zip(rows)
            .map(|(req, (id, author, created))| Post {
                id,
                parent: req.parent,
                author,
                message: req.message.clone(),
                is_edited: false,
                forum: forum.clone(),
                thread: thread_id,
                created,
            })
            .collect())
    }

    /// List a thread's posts in the requested order.
    ///
    /// `since` is a post id. For `parent_tree` the limit counts root posts
    /// and every root is returned with its whole subtree; a bounded page
    /// resumes after the `since` post's root, an unbounded one right after
    /// the `since` post itself.
    pub async fn get_thread_posts(
        &self,
        thread: &ThreadRef,
        sort: PostSort,
        page: &Page<i64>,
    ) -> Result<Vec<Post>> {
        let mut qb = thread_posts_query(thread, sort, page);
        let posts = qb.build_query_as::<Post>().fetch_all(&self.pool).await?;

        if posts.is_empty() && !self.thread_exists(thread).await? {
            return Err(thread_not_found(thread));
        }

        Ok(posts)
    }

    pub async fn find_post(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts p WHERE p.id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Get a post by id
    pub async fn get_post(&self, id: i64) -> Result<Post> {
        self.find_post(id)
            .await?
            .ok_or_else(|| post_not_found(id))
    }

    /// Get a post together with the requested related entities, joining only those
    pub async fn get_post_details(&self, id: i64, related: Related) -> Result<PostDetails> {
        let mut qb = post_details_query(id, related);
        let row = qb
            .build_query_as::<PostDetailsRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| post_not_found(id))?;

        Ok(row.into_details())
    }

    /// Replace a post's message. An absent, empty or unchanged message leaves
    /// the post (and its edited flag) as it is.
    pub async fn update_post(&self, id: i64, req: &UpdatePostRequest) -> Result<Post> {
        let Some(message) = non_empty(&req.message) else {
            return self.get_post(id).await;
        };

        let updated = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts AS p SET message = $2, is_edited = TRUE
            WHERE p.id = $1 AND p.message <> $2
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(id)
        .bind(message)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(post) => Ok(post),
            None => self.get_post(id).await,
        }
    }
}

fn post_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Can't find post by id: {}", id))
}

/// `authors` holds the stored nickname for each post, in input order
fn insert_posts_query(
    thread_id: i32,
    forum: &str,
    posts: &[CreatePostRequest],
    authors: &[String],
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "INSERT INTO posts (author_nick, parent_id, message, forum_slug, thread_id) ",
    );
    qb.push_values(posts.iter().zip(authors), |mut row, (post, author)| {
        row.push_bind(author.clone())
            .push_bind(post.parent_id())
            .push_bind(post.message.clone())
            .push_bind(forum.to_string())
            .push_bind(thread_id);
    });
    qb.push(" RETURNING id, author_nick, created");
    qb
}

fn thread_posts_query(
    thread: &ThreadRef,
    sort: PostSort,
    page: &Page<i64>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM ", POST_COLUMNS));

    match sort {
        PostSort::Flat => {
            qb.push("posts p WHERE p.thread_id = ");
            push_thread_scope(&mut qb, thread);
            page.push_since(&mut qb, "p.id", Bound::Exclusive);
            page.push_order(&mut qb, &["p.created", "p.id"]);
            page.push_limit(&mut qb);
        }
        PostSort::Tree => {
            qb.push("posts p WHERE p.thread_id = ");
            push_thread_scope(&mut qb, thread);
            page.push_cursor(&mut qb, "p.path", Bound::Exclusive, |qb, since| {
                qb.push("(SELECT path FROM posts WHERE id = ")
                    .push_bind(since)
                    .push(")");
            });
            page.push_order(&mut qb, &["p.path"]);
            page.push_limit(&mut qb);
        }
        PostSort::ParentTree => {
            // Bounded pages rank roots and keep the first `limit` of them
            if page.is_bounded() {
                qb.push("(SELECT p.*, dense_rank() OVER (ORDER BY p.path[1] ")
                    .push(page.direction())
                    .push(") AS root_rank FROM posts p WHERE p.thread_id = ");
            } else {
                qb.push("posts p WHERE p.thread_id = ");
            }
            push_thread_scope(&mut qb, thread);
            if page.is_bounded() {
                // Page by whole root subtrees
                page.push_cursor(&mut qb, "p.path[1]", Bound::Exclusive, |qb, since| {
                    qb.push("(SELECT path[1] FROM posts WHERE id = ")
                        .push_bind(since)
                        .push(")");
                });
            } else {
                page.push_cursor(&mut qb, "p.path", Bound::Exclusive, |qb, since| {
                    qb.push("(SELECT path FROM posts WHERE id = ")
                        .push_bind(since)
                        .push(")");
                });
            }
            if page.is_bounded() {
                qb.push(") p WHERE p.root_rank <= ")
                    .push_bind(i64::from(page.limit));
            }
            if page.desc {
                qb.push(" ORDER BY p.path[1] DESC, p.path ASC");
            } else {
                qb.push(" ORDER BY p.path ASC");
            }
        }
    }

    qb
}

fn post_details_query(id: i64, related: Related) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {}", POST_COLUMNS));

    if related.user {
        qb.push(
            ", u.nickname AS u_nickname, u.fullname AS u_fullname, \
             u.email AS u_email, u.about AS u_about",
        );
    }
    if related.thread {
        qb.push(
            ", t.id AS t_id, t.slug AS t_slug, t.title AS t_title, \
             t.author_nick AS t_author, t.forum_slug AS t_forum, t.message AS t_message, \
             t.votes AS t_votes, t.created AS t_created",
        );
    }
    if related.forum {
        qb.push(
            ", f.slug AS f_slug, f.title AS f_title, f.author_nick AS f_user, \
             f.posts AS f_posts, f.threads AS f_threads",
        );
    }

    qb.push(" FROM posts p");
    if related.user {
        qb.push(" JOIN users u ON u.nickname = p.author_nick");
    }
    if related.thread {
        qb.push(" JOIN threads t ON t.id = p.thread_id");
    }
    if related.forum {
        qb.push(" JOIN forums f ON f.slug = p.forum_slug");
    }

    qb.push(" WHERE p.id = ").push_bind(id);
    qb
}

/// Flattened post-detail row; columns of entities that were not joined are absent
#[derive(Debug, FromRow)]
struct PostDetailsRow {
    #[sqlx(flatten)]
    post: Post,
    #[sqlx(default)]
    u_nickname: Option<String>,
    #[sqlx(default)]
    u_fullname: Option<String>,
    #[sqlx(default)]
    u_email: Option<String>,
    #[sqlx(default)]
    u_about: Option<String>,
    #[sqlx(default)]
    t_id: Option<i32>,
    #[sqlx(default)]
    t_slug: Option<String>,
    #[sqlx(default)]
    t_title: Option<String>,
    #[sqlx(default)]
    t_author: Option<String>,
    #[sqlx(default)]
    t_forum: Option<String>,
    #[sqlx(default)]
    t_message: Option<String>,
    #[sqlx(default)]
    t_votes: Option<i32>,
    #[sqlx(default)]
    t_created: Option<DateTime<Utc>>,
    #[sqlx(default)]
    f_slug: Option<String>,
    #[sqlx(default)]
    f_title: Option<String>,
    #[sqlx(default)]
    f_user: Option<String>,
    #[sqlx(default)]
    f_posts: Option<i64>,
    #[sqlx(default)]
    f_threads: Option<i64>,
}

impl PostDetailsRow {
    fn into_details(self) -> PostDetails {
        let author = match (self.u_nickname, self.u_fullname, self.u_email, self.u_about) {
            (Some(nickname), Some(fullname), Some(email), Some(about)) => Some(User {
                nickname,
                fullname,
                email,
                about,
            }),
            _ => None,
        };

        let thread = match (
            self.t_id,
            self.t_title,
            self.t_author,
            self.t_forum,
            self.t_message,
            self.t_votes,
            self.t_created,
        ) {
            (
                Some(id),
                Some(title),
                Some(author),
                Some(forum),
                Some(message),
                Some(votes),
                Some(created),
            ) => Some(Thread {
                id,
                slug: self.t_slug,
                title,
                author,
                forum,
                message,
                votes,
                created,
            }),
            _ => None,
        };

        let forum = match (self.f_slug, self.f_title, self.f_user, self.f_posts, self.f_threads) {
            (Some(slug), Some(title), Some(user), Some(posts), Some(threads)) => Some(Forum {
                slug,
                title,
                user,
                posts,
                threads,
            }),
            _ => None,
        };

        PostDetails {
            post: self.post,
            author,
            thread,
            forum,
        }
    }
}
