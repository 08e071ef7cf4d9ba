//! Execute-body resolution — the one place the two inbound shapes are told
//! apart.
//!
//! Journey Builder POSTs execute bodies as `application/jwt` (an HS256 token
//! whose claims are the activity arguments); the configuration UI and test
//! tooling POST plain JSON. Both resolve here, once, into the
//! `inArguments` list — nothing downstream re-inspects the raw body.
//!
//! Fails closed: any token that doesn't verify against the shared secret is
//! an authentication failure, never "no arguments".

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use smsbridge_core::{BridgeError, Result};

/// Claim set Journey Builder signs into the execute token. The same shape
/// arrives as the top-level object on the plain-JSON path.
#[derive(Debug, Deserialize)]
pub struct ExecutePayload {
    #[serde(rename = "inArguments", default)]
    pub in_arguments: Vec<Value>,
}

/// The execute body, classified once at the boundary.
#[derive(Debug)]
pub enum RawExecutePayload {
    SignedToken(String),
    PlainJson(Value),
}

/// Decide which shape the body is. `application/jwt` is authoritative;
/// otherwise a body that isn't JSON but has dot-separated segments is
/// treated as a token (Journey Builder omits the content type on some
/// retry paths).
pub fn classify_body(content_type: Option<&str>, body: &[u8]) -> RawExecutePayload {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();

    let declared_jwt = content_type
        .map(|ct| ct.starts_with("application/jwt"))
        .unwrap_or(false);
    let looks_like_jwt =
        !trimmed.starts_with('{') && !trimmed.starts_with('[') && trimmed.contains('.');

    if declared_jwt || looks_like_jwt {
        RawExecutePayload::SignedToken(trimmed.to_string())
    } else {
        match serde_json::from_str(trimmed) {
            Ok(value) => RawExecutePayload::PlainJson(value),
            // Not JSON and not token-shaped — let the token path produce
            // the failure so garbage never passes as an empty argument list.
            Err(_) => RawExecutePayload::SignedToken(trimmed.to_string()),
        }
    }
}

/// Resolve a classified body into the raw inArguments entries.
///
/// Token path errors are [`BridgeError::AuthFailed`] (HTTP 401); plain-JSON
/// shape problems are [`BridgeError::Validation`].
pub fn resolve_arguments(payload: RawExecutePayload, secret: &str) -> Result<Vec<Value>> {
    match payload {
        RawExecutePayload::SignedToken(token) => {
            let decoded = verify_token(&token, secret)?;
            debug!(args = decoded.in_arguments.len(), "signed token verified");
            Ok(decoded.in_arguments)
        }
        RawExecutePayload::PlainJson(value) => {
            let payload: ExecutePayload = serde_json::from_value(value)
                .map_err(|e| BridgeError::Validation(format!("bad execute body: {e}")))?;
            Ok(payload.in_arguments)
        }
    }
}

/// HS256 verification against the shared secret. Journey Builder tokens
/// carry no `exp`, so expiry is enforced only when the claim is present.
fn verify_token(token: &str, secret: &str) -> Result<ExecutePayload> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<ExecutePayload>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| BridgeError::AuthFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn sign(claims: &Value) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_arguments() {
        let token = sign(&json!({
            "inArguments": [{"telefono": "600111222", "texto": "Hola"}]
        }));
        let args = resolve_arguments(RawExecutePayload::SignedToken(token), SECRET).unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args[0]["telefono"], "600111222");
    }

    #[test]
    fn wrong_secret_is_auth_failure() {
        let token = sign(&json!({"inArguments": []}));
        let err = resolve_arguments(RawExecutePayload::SignedToken(token), "other-secret")
            .unwrap_err();
        assert!(matches!(err, BridgeError::AuthFailed(_)));
    }

    #[test]
    fn garbage_token_is_auth_failure() {
        let err = resolve_arguments(
            RawExecutePayload::SignedToken("not.a.token".to_string()),
            SECRET,
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::AuthFailed(_)));
    }

    #[test]
    fn expired_token_is_auth_failure() {
        let token = sign(&json!({
            "inArguments": [],
            "exp": 1_000_000_000u64
        }));
        let err = resolve_arguments(RawExecutePayload::SignedToken(token), SECRET).unwrap_err();
        assert!(matches!(err, BridgeError::AuthFailed(_)));
    }

    #[test]
    fn token_without_exp_verifies() {
        // Journey Builder signs only the argument list.
        let token = sign(&json!({"inArguments": [{"texto": "x"}]}));
        assert!(resolve_arguments(RawExecutePayload::SignedToken(token), SECRET).is_ok());
    }

    #[test]
    fn plain_json_resolves_without_secret_check() {
        let body = json!({"inArguments": [{"phone": "600111222", "message": "Hola"}]});
        let args = resolve_arguments(RawExecutePayload::PlainJson(body), SECRET).unwrap();
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn classify_by_content_type() {
        let body = b"eyJh.eyJi.sig";
        assert!(matches!(
            classify_body(Some("application/jwt"), body),
            RawExecutePayload::SignedToken(_)
        ));
    }

    #[test]
    fn classify_json_object_without_content_type() {
        let body = br#"{"inArguments": []}"#;
        assert!(matches!(
            classify_body(None, body),
            RawExecutePayload::PlainJson(_)
        ));
    }

    #[test]
    fn classify_dotted_body_as_token() {
        let body = b"aaaa.bbbb.cccc";
        assert!(matches!(
            classify_body(Some("application/json"), body),
            RawExecutePayload::SignedToken(_)
        ));
    }
}
