//! Calendar helpers: eligibility cutoffs and lenient date extraction.

use chrono::{Datelike, Duration, NaiveDate};

/// Friday of the week before `date` (weeks start on Monday).
///
/// A Monday exam maps to the Friday three days earlier; a Friday or weekend
/// exam maps to the Friday a full week back.
pub fn friday_of_previous_week(date: NaiveDate) -> NaiveDate {
    let back = i64::from(date.weekday().num_days_from_monday()) + 3;
    date - Duration::days(back)
}

/// Friday of the week containing `date`; weekend dates roll forward to the
/// following Friday.
pub fn friday_of_this_week(date: NaiveDate) -> NaiveDate {
    let forward = (11 - i64::from(date.weekday().num_days_from_monday())) % 7;
    date + Duration::days(forward)
}

/// Find the first `YYYY-MM-DD` substring in `text` that is a real date.
pub fn find_iso_date(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    (0..=bytes.len() - 10).find_map(|start| {
        let window = &bytes[start..start + 10];
        let shape_ok = window.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
        if !shape_ok {
            return None;
        }
        std::str::from_utf8(window)
            .ok()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    })
}
