use crate::services::Grant;
use secrecy::Secret;
use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

#[derive(Deserialize, Validate)]
pub struct PasswordLoginRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl From<PasswordLoginRequest> for Grant {
    fn from(req: PasswordLoginRequest) -> Self {
        Grant::Password {
            username: req.username,
            password: Secret::new(req.password),
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct ApiKeyLoginRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    #[validate(length(min = 1, message = "api_key is required"))]
    pub api_key: String,
    #[validate(length(min = 1, message = "api_secret is required"))]
    pub api_secret: String,
}

impl From<ApiKeyLoginRequest> for Grant {
    fn from(req: ApiKeyLoginRequest) -> Self {
        Grant::ApiKey {
            api_key: req.api_key,
            api_secret: Secret::new(req.api_secret),
        }
    }
}

/// A `client_id` repeated in the body must match the path segment.
pub fn check_client_id(path: &str, body: Option<&str>) -> Result<(), AppError> {
    match body {
        Some(id) if !id.is_empty() && id != path => Err(AppError::BadRequest(format!(
            "client_id {} does not match the path",
            id
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;

    #[test]
    fn empty_credentials_fail_validation() {
        let req: PasswordLoginRequest =
            serde_json::from_value(json!({"username": "", "password": ""})).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn api_key_request_becomes_grant() {
        let req: ApiKeyLoginRequest = serde_json::from_value(json!({
            "client_id": "acme",
            "api_key": "k",
            "api_secret": "s",
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let grant = Grant::from(req);
        assert_eq!(grant.grant_type(), "api_key");
        match grant {
            Grant::ApiKey { api_key, api_secret } => {
                assert_eq!(api_key, "k");
                assert_eq!(api_secret.expose_secret(), "s");
            }
            Grant::Password { .. } => panic!("expected an api-key grant"),
        }
    }

    #[test]
    fn password_request_wraps_the_password() {
        let req: PasswordLoginRequest =
            serde_json::from_value(json!({"username": "ada", "password": "p"})).unwrap();
        assert!(req.validate().is_ok());

        match Grant::from(req) {
            Grant::Password { username, password } => {
                assert_eq!(username, "ada");
                assert_eq!(password.expose_secret(), "p");
            }
            Grant::ApiKey { .. } => panic!("expected a password grant"),
        }
    }

    #[test]
    fn body_client_id_must_match_path() {
        assert!(check_client_id("acme", None).is_ok());
        assert!(check_client_id("acme", Some("acme")).is_ok());
        assert!(check_client_id("acme", Some("")).is_ok());
        assert!(check_client_id("acme", Some("other")).is_err());
    }
}
