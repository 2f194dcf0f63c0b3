//! Age-at-event derivation
//!
//! The patient's birth date is not carried as a FHIR `birthDate`; it is
//! encoded in a national-ID-style identifier on the referenced subject:
//! `YYMMDD` followed by a century/sex digit. Codes `1` and `2` place the birth
//! year in the 1900s, every other code in the 2000s.
//!
//! Nothing in here fails. Any missing or malformed input yields `None`.

use crate::core::navigate::{navigate, str_at};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;

/// Path to the identifiers of the inlined subject
const SUBJECT_IDENTIFIERS: &str = "subject.resource.identifier";

/// Minimum number of digits of a usable identifier
const MIN_DIGITS: usize = 7;

/// Age in whole years on `event_date` for the subject of `resource`
///
/// `system_marker` selects the identifier: the first entry whose `system`
/// contains it is used. An empty marker accepts the first identifier with a
/// value.
pub fn age_at_event(
    resource: &Value,
    event_date: Option<NaiveDate>,
    system_marker: &str,
) -> Option<i32> {
    let event_date = event_date?;
    let code = national_id(resource, system_marker)?;
    let birth = birth_date_from_code(code)?;
    Some(age_on(birth, event_date))
}

/// Value of the national-ID identifier of the subject
pub fn national_id<'a>(resource: &'a Value, system_marker: &str) -> Option<&'a str> {
    navigate(resource, SUBJECT_IDENTIFIERS)?
        .as_array()?
        .iter()
        .filter(|identifier| {
            system_marker.is_empty()
                || str_at(identifier, "system").is_some_and(|s| s.contains(system_marker))
        })
        .find_map(|identifier| str_at(identifier, "value"))
}

/// Decodes the birth date from a national-ID-style code
///
/// Non-digit characters (dashes, spaces, masking stars) are ignored. Returns
/// `None` with fewer than seven digits or an impossible calendar date.
///
/// ```
/// use fhir_ingest::core::age::birth_date_from_code;
/// use chrono::NaiveDate;
///
/// assert_eq!(birth_date_from_code("900101-1"), NaiveDate::from_ymd_opt(1990, 1, 1));
/// assert_eq!(birth_date_from_code("050630-4******"), NaiveDate::from_ymd_opt(2005, 6, 30));
/// assert_eq!(birth_date_from_code("90010"), None);
/// ```
pub fn birth_date_from_code(code: &str) -> Option<NaiveDate> {
    let digits: Vec<u32> = code.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < MIN_DIGITS {
        return None;
    }

    let pair = |i: usize| digits[i] * 10 + digits[i + 1];
    let century = match digits[6] {
        1 | 2 => 1900,
        _ => 2000,
    };
    let year = century + pair(0) as i32;

    NaiveDate::from_ymd_opt(year, pair(2), pair(4))
}

/// Whole years between `birth` and `event`
///
/// One year is subtracted when the event's (month, day) falls before the
/// birthday. An event before the birth date gives a negative age.
pub fn age_on(birth: NaiveDate, event: NaiveDate) -> i32 {
    let mut age = event.year() - birth.year();
    if (event.month(), event.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}
