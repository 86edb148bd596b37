//! Request admission
//!
//! HTTP Basic authentication with credentials from the environment. Fails
//! closed: with no credentials configured, every request is rejected. CORS
//! preflights carry no credentials and are exempt.

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use base64::Engine;
use tracing::debug;

use crate::config::{AppState, BasicAuth};
use crate::error::{Error, Result};

pub async fn mw_require_basic_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let Some(expected) = &state.config.auth else {
        debug!("MIDDLEWARE: auth credentials unconfigured, failing closed");
        return Err(Error::AuthFailNotConfigured);
    };

    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(Error::AuthFailNoHeader)?;

    if !credentials_match(header_value, expected) {
        return Err(Error::AuthFailBadCredentials);
    }

    Ok(next.run(req).await)
}

/// Check an `Authorization` header value against the configured credentials.
fn credentials_match(header: &str, expected: &BasicAuth) -> bool {
    let Some(encoded) = header.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    match decoded.split_once(':') {
        Some((user, pass)) => user == expected.user && pass == expected.pass,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> BasicAuth {
        BasicAuth {
            user: "admin".to_string(),
            pass: "secret".to_string(),
        }
    }

    fn encode(raw: &str) -> String {
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }

    #[test]
    fn test_matching_credentials_accepted() {
        assert!(credentials_match(&encode("admin:secret"), &creds()));
    }

    #[test]
    fn test_wrong_password_rejected() {
        assert!(!credentials_match(&encode("admin:nope"), &creds()));
    }

    #[test]
    fn test_password_may_contain_colons() {
        let expected = BasicAuth {
            user: "admin".to_string(),
            pass: "se:cr:et".to_string(),
        };
        assert!(credentials_match(&encode("admin:se:cr:et"), &expected));
    }

    #[test]
    fn test_non_basic_scheme_rejected() {
        assert!(!credentials_match("Bearer abc", &creds()));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(!credentials_match("Basic !!!not-base64!!!", &creds()));
    }

    #[test]
    fn test_missing_separator_rejected() {
        assert!(!credentials_match(&encode("adminsecret"), &creds()));
    }
}
