use super::Created;
use crate::error::{AppError, Result};
use crate::models::{non_empty, UpdateUserRequest, User};

impl super::Database {
    /// Insert a user. On a nickname or email clash, returns every existing
    /// user holding either key instead.
    pub async fn create_user(&self, user: &User) -> Result<Created<User, Vec<User>>> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (nickname, fullname, email, about)
            VALUES ($1, $2, $3, $4)
            RETURNING nickname, fullname, email, about
            "#,
        )
        .bind(&user.nickname)
        .bind(&user.fullname)
        .bind(&user.email)
        .bind(&user.about)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(user) => Ok(Created::New(user)),
            Err(e) if super::is_unique_violation(&e) => {
                let existing = self
                    .get_users_by_nickname_or_email(&user.nickname, &user.email)
                    .await?;
                if existing.is_empty() {
                    // The clashing row vanished between insert and read-back
                    return Err(AppError::Database(e));
                }
                Ok(Created::Existing(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a user by nickname
    pub async fn get_user(&self, nickname: &str) -> Result<User> {
        sqlx::query_as::<_, User>(
            "SELECT nickname, fullname, email, about FROM users WHERE nickname = $1::citext",
        )
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Can't find user by nickname: {}", nickname)))
    }

    /// Users whose nickname or email matches (at most two rows)
    pub async fn get_users_by_nickname_or_email(
        &self,
        nickname: &str,
        email: &str,
    ) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT nickname, fullname, email, about
            FROM users
            WHERE nickname = $1::citext OR email = $2::citext
            ORDER BY nickname
            "#,
        )
        .bind(nickname)
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Update a profile; empty or missing fields keep their current value
    pub async fn update_user(&self, nickname: &str, req: &UpdateUserRequest) -> Result<User> {
        let email = non_empty(&req.email);

        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                fullname = COALESCE($2, fullname),
                email = COALESCE($3, email),
                about = COALESCE($4, about)
            WHERE nickname = $1::citext
            RETURNING nickname, fullname, email, about
            "#,
        )
        .bind(nickname)
        .bind(non_empty(&req.fullname))
        .bind(email)
        .bind(non_empty(&req.about))
        .fetch_optional(&self.pool)
        .await;

        match updated {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AppError::NotFound(format!(
                "Can't find user by nickname: {}",
                nickname
            ))),
            Err(e) if super::violated_constraint(&e) == Some("users_email_key") => {
                let owner: Option<(String,)> =
                    sqlx::query_as("SELECT nickname FROM users WHERE email = $1::citext")
                        .bind(email)
                        .fetch_optional(&self.pool)
                        .await?;
                let owner = owner.map(|(nick,)| nick).unwrap_or_default();
                Err(AppError::Conflict(format!(
                    "This email is already registered by user: {}",
                    owner
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}
