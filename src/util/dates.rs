//! Date formatting for dashboard tables and forms, localized to Spanish.
//!
//! Every helper accepts anything date-like (RFC 3339 text, `YYYY-MM-DD`,
//! `YYYY-MM-DD HH:MM[:SS]`, or a `time` value) and returns an empty string
//! for missing or unparseable input instead of failing. Text without an
//! offset is read as UTC; values with an offset are formatted in that offset.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const MINUTES_IN_DAY: f64 = 1440.0;
const MINUTES_IN_MONTH: f64 = 43200.0;

/// A nullable date-like value.
#[derive(Debug, Clone, Copy)]
pub enum DateInput<'a> {
    Empty,
    Text(&'a str),
    DateTime(OffsetDateTime),
    Date(Date),
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for DateInput<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value.as_str())
    }
}

impl From<OffsetDateTime> for DateInput<'_> {
    fn from(value: OffsetDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<Date> for DateInput<'_> {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

impl<'a, T: Into<DateInput<'a>>> From<Option<T>> for DateInput<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

impl DateInput<'_> {
    fn resolve(self) -> Option<OffsetDateTime> {
        match self {
            Self::Empty => None,
            Self::Text(text) => parse_text(text),
            Self::DateTime(value) => Some(value),
            Self::Date(date) => Some(date.midnight().assume_utc()),
        }
    }
}

fn parse_text(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(value);
    }

    let primitive_formats = [
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    ];
    for format in primitive_formats {
        if let Ok(value) = PrimitiveDateTime::parse(text, format) {
            return Some(value.assume_utc());
        }
    }

    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc())
}

/// `dd/MM/yyyy`
pub fn format_date<'a>(value: impl Into<DateInput<'a>>) -> String {
    value
        .into()
        .resolve()
        .and_then(|dt| dt.format(format_description!("[day]/[month]/[year]")).ok())
        .unwrap_or_default()
}

/// `dd/MM/yyyy HH:mm`
pub fn format_date_time<'a>(value: impl Into<DateInput<'a>>) -> String {
    value
        .into()
        .resolve()
        .and_then(|dt| {
            dt.format(format_description!("[day]/[month]/[year] [hour]:[minute]"))
                .ok()
        })
        .unwrap_or_default()
}

/// `yyyy-MM-dd`, the value format of `<input type="date">`.
pub fn format_date_for_input<'a>(value: impl Into<DateInput<'a>>) -> String {
    value
        .into()
        .resolve()
        .and_then(|dt| dt.format(format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_default()
}

/// `15 de marzo de 2024`
pub fn format_date_long<'a>(value: impl Into<DateInput<'a>>) -> String {
    let Some(dt) = value.into().resolve() else {
        return String::new();
    };
    let month = MONTHS_ES[usize::from(u8::from(dt.month())) - 1];
    format!("{} de {} de {}", dt.day(), month, dt.year())
}

/// Relative phrase against the current time, e.g. `hace 3 días`.
pub fn format_relative<'a>(value: impl Into<DateInput<'a>>) -> String {
    format_relative_to(value, OffsetDateTime::now_utc())
}

/// Relative phrase against `now`: `hace …` for the past, `en …` for the future.
///
/// Both instants are compared in UTC; values that cannot be represented in
/// UTC (past year 9999 once the offset is removed) yield `""`.
pub fn format_relative_to<'a>(value: impl Into<DateInput<'a>>, now: OffsetDateTime) -> String {
    let Some(dt) = value
        .into()
        .resolve()
        .and_then(|dt| dt.checked_to_offset(UtcOffset::UTC))
    else {
        return String::new();
    };
    let Some(now) = now.checked_to_offset(UtcOffset::UTC) else {
        return String::new();
    };
    let (earlier, later, future) = if dt > now {
        (now, dt, true)
    } else {
        (dt, now, false)
    };
    let distance = describe_distance(earlier, later);
    if future {
        format!("en {distance}")
    } else {
        format!("hace {distance}")
    }
}

fn describe_distance(earlier: OffsetDateTime, later: OffsetDateTime) -> String {
    let seconds = (later - earlier).whole_seconds() as f64;
    let minutes = (seconds / 60.0).round();

    if minutes < 2.0 {
        return if minutes == 0.0 {
            "menos de un minuto".to_string()
        } else {
            "1 minuto".to_string()
        };
    }
    if minutes < 45.0 {
        return format!("{} minutos", minutes as i64);
    }
    if minutes < 90.0 {
        return "alrededor de 1 hora".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        let hours = (minutes / 60.0).round() as i64;
        return plural(hours, "alrededor de 1 hora", "alrededor de {} horas");
    }
    if minutes < 2520.0 {
        return "1 día".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        let days = (minutes / MINUTES_IN_DAY).round() as i64;
        return plural(days, "1 día", "{} días");
    }
    if minutes < 2.0 * MINUTES_IN_MONTH {
        let months = (minutes / MINUTES_IN_MONTH).round();
        return plural(months as i64, "alrededor de 1 mes", "alrededor de {} meses");
    }

    let months = calendar_months_between(earlier, later);
    if months < 12 {
        let nearest = ((minutes / MINUTES_IN_MONTH).round() as i64).max(1);
        return plural(nearest, "1 mes", "{} meses");
    }

    let years = months / 12;
    match months % 12 {
        0..=2 => plural(years, "alrededor de 1 año", "alrededor de {} años"),
        3..=8 => plural(years, "más de 1 año", "más de {} años"),
        _ => plural(years + 1, "casi 1 año", "casi {} años"),
    }
}

fn plural(count: i64, one: &str, other: &str) -> String {
    if count == 1 {
        one.to_string()
    } else {
        other.replace("{}", &count.to_string())
    }
}

/// Whole calendar months from `earlier` to `later`. Both must share an offset.
fn calendar_months_between(earlier: OffsetDateTime, later: OffsetDateTime) -> i64 {
    let mut months = i64::from(later.year() - earlier.year()) * 12
        + i64::from(u8::from(later.month()))
        - i64::from(u8::from(earlier.month()));
    let later_in_month = (later.day(), later.time());
    let earlier_in_month = (earlier.day(), earlier.time());
    if months > 0 && later_in_month < earlier_in_month {
        months -= 1;
    }
    months
}
