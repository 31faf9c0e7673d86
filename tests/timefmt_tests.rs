use chrono::{Datelike, FixedOffset, Timelike};
use slf::Error;
use slf::timefmt::{self, LogTime};

#[test]
fn test_utc_round_trip() {
    let text = "2000-01-02T12:34:56.7890000Z";
    let time = timefmt::parse_iso8601(text).unwrap();
    let LogTime::Utc(utc) = time else {
        panic!("expected UTC kind, got {time:?}");
    };
    assert_eq!(utc.year(), 2000);
    assert_eq!(utc.month(), 1);
    assert_eq!(utc.day(), 2);
    assert_eq!(utc.hour(), 12);
    assert_eq!(utc.minute(), 34);
    assert_eq!(utc.second(), 56);
    assert_eq!(utc.timestamp_subsec_millis(), 789);
    assert_eq!(time.to_iso8601(), text);
}

#[test]
fn test_positive_offset_round_trip() {
    let text = "2021-06-01T08:15:30.0000000+02:00";
    let time = timefmt::parse_iso8601(text).unwrap();
    assert!(matches!(time, LogTime::Offset(_)));
    assert_eq!(time.to_iso8601(), text);
}

#[test]
fn test_negative_offset_round_trip() {
    let text = "2021-06-01T08:15:30.1234567-05:30";
    let time = timefmt::parse_iso8601(text).unwrap();
    assert!(matches!(time, LogTime::Offset(_)));
    assert_eq!(time.to_iso8601(), text);
}

#[test]
fn test_unspecified_round_trip() {
    let text = "1999-12-31T23:59:59.9999999";
    let time = timefmt::parse_iso8601(text).unwrap();
    assert!(matches!(time, LogTime::Unspecified(_)));
    assert_eq!(time.to_iso8601(), text);
}

#[test]
fn test_fraction_is_always_seven_digits() {
    let time = timefmt::parse_iso8601("2021-06-01T08:15:30Z").unwrap();
    assert_eq!(time.to_iso8601(), "2021-06-01T08:15:30.0000000Z");
}

#[test]
fn test_parse_empty_is_invalid_arg() {
    assert!(matches!(
        timefmt::parse_iso8601(""),
        Err(Error::InvalidArg(_))
    ));
}

#[test]
fn test_parse_garbage_is_format() {
    assert!(matches!(
        timefmt::parse_iso8601("not a time"),
        Err(Error::Format { .. })
    ));
    assert!(matches!(
        timefmt::parse_iso8601("2021-13-40T99:99:99Z"),
        Err(Error::Format { .. })
    ));
}

#[test]
fn test_offset_time_converts_to_utc() {
    let time = timefmt::parse_iso8601("2021-06-01T10:00:00.0000000+02:00").unwrap();
    let utc = time.to_utc(None);
    assert_eq!(utc.hour(), 8);
}

#[test]
fn test_unspecified_time_interpreted_in_explicit_offset() {
    let time = timefmt::parse_iso8601("2021-06-01T10:00:00.0000000").unwrap();
    let tz = FixedOffset::east_opt(3600).unwrap();
    assert_eq!(time.to_utc(Some(tz)).hour(), 9);
}

#[test]
fn test_unix_seconds_round_trip() {
    let time = timefmt::parse_iso8601("1970-01-01T00:01:40.0000000Z").unwrap();
    let LogTime::Utc(utc) = time else {
        panic!("expected UTC kind");
    };
    assert_eq!(timefmt::unix_seconds(&utc), 100);
    assert_eq!(timefmt::from_unix_seconds(100).unwrap(), utc);
}

#[test]
fn test_pre_epoch_seconds_are_negative() {
    let time = timefmt::parse_iso8601("1969-12-31T23:59:59.0000000Z").unwrap();
    let LogTime::Utc(utc) = time else {
        panic!("expected UTC kind");
    };
    assert_eq!(timefmt::unix_seconds(&utc), -1);
}

#[test]
fn test_offset_parse_keeps_wall_clock_for_zoneless_input() {
    let zoned = timefmt::parse_iso8601_offset("2021-06-01T10:00:00.0000000").unwrap();
    assert_eq!(zoned.naive_local().hour(), 10);
}

#[test]
fn test_offset_parse_of_zulu_is_zero_offset() {
    let zoned = timefmt::parse_iso8601_offset("2021-06-01T10:00:00.0000000Z").unwrap();
    assert_eq!(zoned.offset().local_minus_utc(), 0);
}

#[test]
fn test_file_stamp() {
    let time = timefmt::parse_iso8601("2021-06-01T08:15:30.1230000Z").unwrap();
    let LogTime::Utc(utc) = time else {
        panic!("expected UTC kind");
    };
    assert_eq!(timefmt::file_stamp(&utc), "20210601-081530123");
}
