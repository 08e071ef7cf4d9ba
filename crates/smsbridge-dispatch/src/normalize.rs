//! Synonym-key normalization — POST /execute bodies arrive with several
//! generations of field names.
//!
//! Journey Builder configs written against different activity revisions send
//! `telefono`/`phone`/`numero`, `texto`/`message`, and so on. Each canonical
//! field gets an explicit ordered synonym list; the first key present in the
//! raw object wins. Pure function, no I/O.

use chrono::NaiveDateTime;
use serde_json::Value;

use smsbridge_core::{BridgeError, Result, SmsRequest};

/// Synonym lists, in precedence order. The Spanish names came first and
/// existing journeys still send them, so they stay in front.
const PHONE_KEYS: &[&str] = &["telefono", "phone", "numero"];
const TEXT_KEYS: &[&str] = &["texto", "message"];
const SCHEDULE_KEYS: &[&str] = &["fechaEnvio", "scheduledDate"];
const CAMPAIGN_KEYS: &[&str] = &["campanya", "campanyaReferencia"];

/// Schedule strings accepted from the UI: ISO date-time (with or without
/// seconds) or the gateway's own `dd/MM/yyyy HH:mm`.
const SCHEDULE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%d/%m/%Y %H:%M"];

/// Map one raw inArguments entry to a canonical [`SmsRequest`].
///
/// Missing phone/text surface as [`BridgeError::Validation`] here rather
/// than defaulting — absence is terminal, not retryable. A missing campaign
/// synonym is fine: `campaign_ref` stays `None` and the dispatcher applies
/// the configured default.
pub fn normalize_arguments(raw: &Value, max_text_len: usize) -> Result<SmsRequest> {
    let obj = raw
        .as_object()
        .ok_or_else(|| BridgeError::Validation("inArguments entry is not an object".into()))?;

    let phone = first_present(obj, PHONE_KEYS)
        .ok_or_else(|| BridgeError::Validation("telefono is required".into()))?;
    let text = first_present(obj, TEXT_KEYS)
        .ok_or_else(|| BridgeError::Validation("texto is required".into()))?;

    if text.chars().count() > max_text_len {
        return Err(BridgeError::Validation(format!(
            "texto exceeds {} characters",
            max_text_len
        )));
    }

    let scheduled_at = match first_present(obj, SCHEDULE_KEYS) {
        Some(raw_date) => Some(parse_schedule(&raw_date)?),
        None => None,
    };

    Ok(SmsRequest {
        phone,
        text,
        campaign_ref: first_present(obj, CAMPAIGN_KEYS),
        scheduled_at,
    })
}

/// First non-empty string value among `keys`, in list order.
fn first_present(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}

fn parse_schedule(raw: &str) -> Result<NaiveDateTime> {
    for fmt in SCHEDULE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt);
        }
    }
    // RFC 3339 with an offset — keep the wall-clock reading, the gateway
    // has no timezone field.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    Err(BridgeError::Validation(format!(
        "unparseable fechaEnvio: {raw}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spanish_and_english_synonyms_normalize_identically() {
        let a = normalize_arguments(&json!({"telefono": "X", "texto": "Y"}), 160).unwrap();
        let b = normalize_arguments(&json!({"phone": "X", "message": "Y"}), 160).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.phone, "X");
        assert_eq!(a.text, "Y");
        assert_eq!(a.campaign_ref, None);
        assert_eq!(a.scheduled_at, None);
    }

    #[test]
    fn first_synonym_wins() {
        let req = normalize_arguments(
            &json!({"telefono": "600111222", "phone": "other", "texto": "hola"}),
            160,
        )
        .unwrap();
        assert_eq!(req.phone, "600111222");
    }

    #[test]
    fn missing_text_is_validation_error() {
        let err = normalize_arguments(&json!({"telefono": "600111222"}), 160).unwrap_err();
        assert!(matches!(err, BridgeError::Validation(_)));
    }

    #[test]
    fn blank_phone_counts_as_absent() {
        let err =
            normalize_arguments(&json!({"telefono": "  ", "texto": "hola"}), 160).unwrap_err();
        assert!(matches!(err, BridgeError::Validation(_)));
    }

    #[test]
    fn non_object_entry_is_validation_error() {
        assert!(normalize_arguments(&json!(null), 160).is_err());
        assert!(normalize_arguments(&json!(["telefono"]), 160).is_err());
    }

    #[test]
    fn schedule_iso_without_seconds() {
        let req = normalize_arguments(
            &json!({"telefono": "600111222", "texto": "hola", "fechaEnvio": "2026-02-19T09:02"}),
            160,
        )
        .unwrap();
        let at = req.scheduled_at.unwrap();
        assert_eq!(at.format("%d/%m/%Y %H:%M").to_string(), "19/02/2026 09:02");
    }

    #[test]
    fn schedule_gateway_format() {
        let req = normalize_arguments(
            &json!({"telefono": "600111222", "texto": "hola", "scheduledDate": "19/02/2026 09:02"}),
            160,
        )
        .unwrap();
        assert!(req.is_scheduled());
    }

    #[test]
    fn schedule_garbage_is_validation_error() {
        let err = normalize_arguments(
            &json!({"telefono": "600111222", "texto": "hola", "fechaEnvio": "mañana"}),
            160,
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::Validation(_)));
    }

    #[test]
    fn campaign_synonyms() {
        let req = normalize_arguments(
            &json!({"telefono": "600111222", "texto": "hola", "campanyaReferencia": "SOIB"}),
            160,
        )
        .unwrap();
        assert_eq!(req.campaign_ref.as_deref(), Some("SOIB"));
    }

    #[test]
    fn over_length_text_rejected() {
        let long = "a".repeat(161);
        let err =
            normalize_arguments(&json!({"telefono": "600111222", "texto": long}), 160).unwrap_err();
        assert!(matches!(err, BridgeError::Validation(_)));
    }
}
