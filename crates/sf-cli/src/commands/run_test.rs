use super::*;
use chrono::TimeZone;

#[test]
fn test_parse_bare_date_is_midnight_utc() {
    assert_eq!(
        parse_logical_date("2018-11-01").unwrap(),
        Utc.with_ymd_and_hms(2018, 11, 1, 0, 0, 0).unwrap()
    );
}

#[test]
fn test_parse_rfc3339_converts_to_utc() {
    assert_eq!(
        parse_logical_date("2018-11-01T09:00:00+02:00").unwrap(),
        Utc.with_ymd_and_hms(2018, 11, 1, 7, 0, 0).unwrap()
    );
}

#[test]
fn test_parse_rejects_garbage() {
    let err = parse_logical_date("yesterday").unwrap_err();
    assert!(err.to_string().contains("expected RFC 3339 or YYYY-MM-DD"));
    assert!(parse_logical_date("2018-13-01").is_err());
}
