//! Pipe-delimited line encoding for the gateway's file format.
//!
//! Scheduled records: `dd/MM/yyyy|HH:mm|phone|text`. Instant records:
//! `phone|text`. The field order is the gateway's parser contract — never
//! reorder. The delimiter is NOT escaped: a literal `|` inside the text
//! passes through and the gateway reads a short/shifted record. Known
//! limitation, kept bug-for-bug.

use smsbridge_core::SmsRequest;

const DATE_FMT: &str = "%d/%m/%Y";
const TIME_FMT: &str = "%H:%M";

/// Encode one request as a single line, no trailing newline.
pub fn encode_line(req: &SmsRequest) -> String {
    match req.scheduled_at {
        Some(at) => format!(
            "{}|{}|{}|{}",
            at.format(DATE_FMT),
            at.format(TIME_FMT),
            req.phone,
            req.text
        ),
        None => format!("{}|{}", req.phone, req.text),
    }
}

/// Encode a batch in input order, lines joined by `\n`, no trailing
/// separator. Positional order is meaningful to the gateway.
pub fn encode_batch(requests: &[SmsRequest]) -> String {
    requests
        .iter()
        .map(encode_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn instant_line_is_two_fields() {
        let req = SmsRequest::new("600111222", "Hola");
        assert_eq!(encode_line(&req), "600111222|Hola");
    }

    #[test]
    fn scheduled_line_is_four_fields() {
        let req = SmsRequest::new("600111222", "Hola").scheduled(at(2026, 2, 19, 9, 2));
        assert_eq!(encode_line(&req), "19/02/2026|09:02|600111222|Hola");
    }

    #[test]
    fn encoding_is_deterministic() {
        let req = SmsRequest::new("600111222", "Hola").scheduled(at(2026, 2, 19, 9, 2));
        assert_eq!(encode_line(&req), encode_line(&req));
    }

    #[test]
    fn batch_preserves_input_order() {
        let a = SmsRequest::new("600000001", "A");
        let b = SmsRequest::new("600000002", "B");
        assert_eq!(encode_batch(&[a, b]), "600000001|A\n600000002|B");
    }

    #[test]
    fn batch_has_no_trailing_newline() {
        let reqs = vec![
            SmsRequest::new("600000001", "uno"),
            SmsRequest::new("600000002", "dos"),
            SmsRequest::new("600000003", "tres"),
        ];
        let encoded = encode_batch(&reqs);
        assert_eq!(encoded.lines().count(), 3);
        assert!(!encoded.ends_with('\n'));
    }

    #[test]
    fn single_element_batch_is_one_line() {
        let encoded = encode_batch(&[SmsRequest::new("600111222", "Hola")]);
        assert_eq!(encoded, "600111222|Hola");
    }

    // Boundary case: a literal pipe in the text is passed through unescaped.
    // Garbage in, garbage out — the gateway format has no escaping.
    #[test]
    fn pipe_in_text_passes_through() {
        let req = SmsRequest::new("600111222", "a|b");
        assert_eq!(encode_line(&req), "600111222|a|b");
    }
}
