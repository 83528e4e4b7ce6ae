//! French calendar names plus the date forms recognized in schedule cells.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use std::sync::OnceLock;

use super::types::CellValue;

const WEEKDAYS: [&str; 7] = [
    "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
];

const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Serial of 9999-12-31, the last date Excel can store
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Plain-text formats accepted for date-like strings
const TEXT_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];
const TEXT_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub fn french_weekday(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize]
}

pub fn french_month(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}

/// `lundi 17 novembre 2025`
pub fn format_long(date: NaiveDate) -> String {
    format!(
        "{} {} {} {}",
        french_weekday(date),
        date.day(),
        french_month(date),
        date.year()
    )
}

/// `lundi, 17 novembre 2025`, the form used inside grid cells
pub fn format_cell_date(date: NaiveDate) -> String {
    format!(
        "{}, {} {} {}",
        french_weekday(date),
        date.day(),
        french_month(date),
        date.year()
    )
}

pub fn is_monday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Mon
}

fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let unaccented = |s: &str| s.replace(['é', 'è'], "e").replace('û', "u");
    MONTHS
        .iter()
        .position(|m| *m == name || unaccented(m) == unaccented(&name))
        .map(|i| i as u32 + 1)
}

fn long_form_regex() -> Option<&'static Regex> {
    static LONG_FORM: OnceLock<Option<Regex>> = OnceLock::new();
    LONG_FORM
        .get_or_init(|| {
            Regex::new(
                r"(?i)^(?:(?:lundi|mardi|mercredi|jeudi|vendredi|samedi|dimanche),?\s+)?(\d{1,2})(?:er)?\s+(\p{L}+)\s+(\d{4})$",
            )
            .ok()
        })
        .as_ref()
}

/// Recognize a date written as text. Never evaluates formulas.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for format in TEXT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    for format in TEXT_DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }

    let caps = long_form_regex()?.captures(text)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month = month_from_name(caps.get(2)?.as_str())?;
    let year: i32 = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Convert an Excel serial (days since 1899-12-30) to a typed value.
/// Serials below one day are times of day.
pub fn from_excel_serial(value: f64) -> Option<CellValue> {
    if !value.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&value) {
        return None;
    }

    let days = value.floor() as i64;
    let mut seconds = (value.fract() * 86400.0).round() as u32;
    let mut carry = 0;
    if seconds >= 86400 {
        seconds -= 86400;
        carry = 1;
    }
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)?;

    if days == 0 && carry == 0 {
        return Some(CellValue::Time(time));
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::days(days + carry))?;
    if seconds == 0 {
        Some(CellValue::Date(date))
    } else {
        Some(CellValue::DateTime(date.and_time(time)))
    }
}
