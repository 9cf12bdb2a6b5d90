use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

/// Parses a marketplace timestamp into UTC.
///
/// Accepts RFC 3339 (`Z` or numeric offset), offsets without a colon,
/// naive date-times (read as UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Reads a decimal from a JSON number or numeric string.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Reads a label that the marketplace sends either as a string or a number.
pub fn parse_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 10, 15, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-10T15:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-10T15:30:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-10T17:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-10T10:30:00-0500"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-10T15:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-10"),
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal(&json!(250)), Some(dec!(250)));
        assert_eq!(parse_decimal(&json!(199.5)), Some(dec!(199.5)));
        assert_eq!(parse_decimal(&json!("310.25")), Some(dec!(310.25)));
        assert_eq!(parse_decimal(&json!("abc")), None);
        assert_eq!(parse_decimal(&json!(null)), None);
        assert_eq!(parse_decimal(&json!(true)), None);
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label(&json!("10.5")), Some("10.5".to_string()));
        assert_eq!(parse_label(&json!(11)), Some("11".to_string()));
        assert_eq!(parse_label(&json!("")), None);
        assert_eq!(parse_label(&json!({})), None);
    }
}
