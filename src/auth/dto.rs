use serde::Deserialize;

use crate::error::ApiError;

/// Request body for registration and login. Fields are optional at the
/// serde level so presence checks surface as 400s rather than body
/// rejections.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsRequest {
    pub fn into_credentials(self) -> Result<(String, String), ApiError> {
        match (non_empty(self.username), non_empty(self.password)) {
            (Some(username), Some(password)) => Ok((username, password)),
            _ => Err(ApiError::MissingField("Username and password are required")),
        }
    }
}

/// Request body for `PUT /update`; at least one field must be supplied.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Absent and empty-string fields are treated the same way.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_count_as_missing() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("alice".into())), Some("alice".into()));
    }

    #[test]
    fn credentials_require_both_fields() {
        let body = CredentialsRequest {
            username: Some("alice".into()),
            password: None,
        };
        let err = body.into_credentials().unwrap_err();
        assert!(matches!(err, ApiError::MissingField(_)));

        let body = CredentialsRequest {
            username: Some("alice".into()),
            password: Some("pw1".into()),
        };
        assert_eq!(
            body.into_credentials().unwrap(),
            ("alice".into(), "pw1".into())
        );
    }
}
