mod forum;
mod post;
mod service;
mod thread;
mod user;

pub use forum::*;
pub use post::*;
pub use service::*;
pub use thread::*;
pub use user::*;

use std::{fmt::Display, str::FromStr};

use serde::{de, Deserialize, Deserializer};

/// Cursor-paged listing parameters shared by the listing endpoints.
///
/// `limit = 0` (the default) means unbounded. Empty values (`?since=`)
/// count as absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "C: FromStr, C::Err: Display"))]
pub struct ListQuery<C> {
    #[serde(default, deserialize_with = "empty_as_default")]
    pub limit: u32,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub since: Option<C>,
    #[serde(default, deserialize_with = "empty_as_default")]
    pub desc: bool,
}

impl<C> Default for ListQuery<C> {
    fn default() -> Self {
        Self {
            limit: 0,
            since: None,
            desc: false,
        }
    }
}

/// Parse a query value, treating an empty one as missing
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Parse a query value, falling back to the default when it is empty
pub(crate) fn empty_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: Display,
{
    Ok(empty_as_none(deserializer)?.unwrap_or_default())
}

/// Treat empty strings in optional update fields as "keep the current value".
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    fn parse<T: serde::de::DeserializeOwned>(uri: &'static str) -> T {
        let uri = Uri::from_static(uri);
        Query::<T>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_empty_values_are_unset() {
        let query: ListQuery<String> = parse("/users?since=&limit=&desc=");
        assert_eq!(query.since, None);
        assert_eq!(query.limit, 0);
        assert!(!query.desc);
    }

    #[test]
    fn test_values_are_parsed() {
        let query: ListQuery<String> = parse("/users?since=bob&limit=5&desc=true");
        assert_eq!(query.since.as_deref(), Some("bob"));
        assert_eq!(query.limit, 5);
        assert!(query.desc);

        let query: ListQuery<chrono::DateTime<chrono::Utc>> =
            parse("/threads?since=2024-01-02T00:00:00Z");
        assert_eq!(query.since.unwrap().to_rfc3339(), "2024-01-02T00:00:00+00:00");
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let uri = Uri::from_static("/users?limit=-1");
        assert!(Query::<ListQuery<String>>::try_from_uri(&uri).is_err());

        let uri = Uri::from_static("/threads?since=yesterday");
        assert!(Query::<ListQuery<chrono::DateTime<chrono::Utc>>>::try_from_uri(&uri).is_err());
    }
}
