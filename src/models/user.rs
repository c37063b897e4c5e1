use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered forum member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique handle, also the key every authored entity refers to
    pub nickname: String,
    pub fullname: String,
    /// Unique across all users
    pub email: String,
    pub about: String,
}

/// Body of `POST /user/{nickname}/create`; the nickname comes from the path
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub fullname: String,
    pub email: String,
    #[serde(default)]
    pub about: String,
}

impl CreateUserRequest {
    pub fn into_user(self, nickname: String) -> User {
        User {
            nickname,
            fullname: self.fullname,
            email: self.email,
            about: self.about,
        }
    }
}

/// Partial profile update. Missing or empty fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub about: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults_about() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"fullname":"Jack Sparrow","email":"captain@blackpearl.sea"}"#,
        )
        .unwrap();
        let user = req.into_user("j.sparrow".to_string());

        assert_eq!(user.nickname, "j.sparrow");
        assert_eq!(user.about, "");
    }

    #[test]
    fn test_update_request_allows_empty_body() {
        let req: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.fullname.is_none());
        assert!(req.email.is_none());
        assert!(req.about.is_none());
    }
}
