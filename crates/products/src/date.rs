//! Expiration date parsing and display.
//!
//! Storage and form inputs use ISO `yyyy-mm-dd`; lists display `dd/mm/yyyy`.

use chrono::NaiveDate;

pub const ISO_FORMAT: &str = "%Y-%m-%d";
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// Parse a strict `yyyy-mm-dd` calendar date.
///
/// The value is a plain calendar date with no time or zone attached, so it can never shift
/// by a day the way parsing it as a UTC timestamp would.
pub fn parse_iso(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // chrono accepts non-padded fields; the storage format is always zero-padded.
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, ISO_FORMAT).ok()
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

pub fn format_display(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// A date is expired when it is strictly before `today`; expiring today is still fine.
pub fn is_expired(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}
