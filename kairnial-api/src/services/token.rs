//! Inbound bearer token verification.
//!
//! Tokens are minted by the Kairnial auth server and signed with RS256. The
//! audience of a token is the client id it was issued for, so the verifier
//! checks it against the `client_id` taken from the request path.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a request carries no usable principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("missing")]
    Missing,
    #[error("no-audience")]
    NoAudience,
    #[error("malformed")]
    Malformed,
    #[error("token-expired")]
    Expired,
    #[error("bad-claims")]
    BadClaims,
    #[error("bad-signature")]
    BadSignature,
}

impl VerifyError {
    pub fn reason(&self) -> &'static str {
        match self {
            VerifyError::Missing => "missing",
            VerifyError::NoAudience => "no-audience",
            VerifyError::Malformed => "malformed",
            VerifyError::Expired => "token-expired",
            VerifyError::BadClaims => "bad-claims",
            VerifyError::BadSignature => "bad-signature",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// The lightweight user a verified token stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub uuid: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// RS256 verifier; the key is read-only after startup.
pub struct TokenVerifier {
    key: DecodingKey,
    issuer: Option<String>,
}

impl TokenVerifier {
    pub fn from_rsa_pem(pem: &str, issuer: Option<&str>) -> Result<Self, anyhow::Error> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to parse auth public key: {}", e))?;

        tracing::info!(issuer_check = issuer.is_some(), "Token verifier initialized with RS256 key");

        Ok(Self {
            key,
            issuer: issuer.map(str::to_string),
        })
    }

    /// Verify an `Authentication` header value against the path client id.
    ///
    /// Returns the raw token together with the principal so the caller can
    /// own the token for the rest of the request.
    pub fn verify_header(
        &self,
        header: Option<&str>,
        client_id: Option<&str>,
    ) -> Result<(String, Principal), VerifyError> {
        let token = bearer_token(header)?;
        let principal = self.verify(token, client_id)?;
        Ok((token.to_string(), principal))
    }

    pub fn verify(&self, token: &str, client_id: Option<&str>) -> Result<Principal, VerifyError> {
        let audience = client_id
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(VerifyError::NoAudience)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "aud", "sub"]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let data = decode::<Claims>(token, &self.key, &validation).map_err(|e| {
            let err = classify(e.kind());
            tracing::debug!(reason = err.reason(), "Bearer token rejected");
            err
        })?;

        let claims = data.claims;
        let (first_name, last_name) = split_name(claims.name.as_deref().unwrap_or_default());

        Ok(Principal {
            uuid: claims.sub,
            first_name,
            last_name,
            email: claims.email.unwrap_or_default(),
        })
    }
}

fn classify(kind: &ErrorKind) -> VerifyError {
    match kind {
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_) => VerifyError::BadClaims,
        ErrorKind::InvalidSignature => VerifyError::BadSignature,
        _ => VerifyError::Malformed,
    }
}

/// Extract the token from a `Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, VerifyError> {
    let value = header.map(str::trim).filter(|v| !v.is_empty()).ok_or(VerifyError::Missing)?;

    let (scheme, token) = value.split_once(' ').ok_or(VerifyError::Missing)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(VerifyError::Missing);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(VerifyError::Missing);
    }
    Ok(token)
}

/// Split a display name once on the first whitespace run.
///
/// `"Anne Marie Dupont"` gives `("Anne", "Marie Dupont")`, `"Cher"` gives
/// `("Cher", "")`.
pub fn split_name(full: &str) -> (String, String) {
    let full = full.trim();
    match full.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim_start().to_string()),
        None => (full.to_string(), String::new()),
    }
}
