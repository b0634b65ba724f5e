//! Default value converters.
//!
//! Every type comes in up to two flavours: the safe one (`integer`) turns bad
//! input into `Value::Null`, the strict one (`integer!`) returns an error.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use sha2::{Digest, Sha256};

use crate::normalize::normalize_column;
use crate::{ConvertError, Value};

pub type ConvertResult = Result<Value, ConvertError>;

const TRUTHY: &[&str] = &["t", "T", "1", "y", "Y", "true", "TRUE"];
const FALSY: &[&str] = &["f", "F", "0", "n", "N", "false", "FALSE"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%d %b %Y", "%d %B %Y", "%b %d %Y", "%B %d %Y",
    "%b %d, %Y", "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATETIME_TZ_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%z"];

fn invalid(target: &'static str, value: &Value) -> ConvertError {
    ConvertError::Invalid {
        target,
        value: value.to_string(),
    }
}

pub fn strict_integer(value: Value) -> ConvertResult {
    match &value {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        Value::Null => Err(ConvertError::Null { target: "integer" }),
        other => other
            .text()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(Value::Integer)
            .ok_or_else(|| invalid("integer", other)),
    }
}

pub fn integer(value: Value) -> ConvertResult {
    Ok(strict_integer(value).unwrap_or(Value::Null))
}

/// Leading integer prefix, zero when there is none (`"12abc"` is 12).
pub fn integer_or_zero(value: Value) -> ConvertResult {
    if let Value::Integer(_) = value {
        return Ok(value);
    }
    let text = value.text().unwrap_or_default();
    let prefix = numeric_prefix(text.trim_start(), false);
    Ok(Value::Integer(prefix.parse().unwrap_or(0)))
}

pub fn strict_decimal(value: Value) -> ConvertResult {
    match &value {
        Value::Decimal(n) => Ok(Value::Decimal(*n)),
        Value::Integer(n) => Ok(Value::Decimal(*n as f64)),
        Value::Null => Err(ConvertError::Null { target: "decimal" }),
        other => other
            .text()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .map(Value::Decimal)
            .ok_or_else(|| invalid("decimal", other)),
    }
}

pub fn decimal(value: Value) -> ConvertResult {
    Ok(strict_decimal(value).unwrap_or(Value::Null))
}

/// Leading decimal prefix, zero when there is none (`"1.5kg"` is 1.5).
pub fn decimal_or_zero(value: Value) -> ConvertResult {
    if let Value::Decimal(_) = value {
        return Ok(value);
    }
    let text = value.text().unwrap_or_default();
    let prefix = numeric_prefix(text.trim_start(), true);
    Ok(Value::Decimal(prefix.parse().unwrap_or(0.0)))
}

fn numeric_prefix(s: &str, fraction: bool) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if fraction && !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    &s[..end]
}

pub fn strict_date(value: Value) -> ConvertResult {
    match &value {
        Value::Date(d) => Ok(Value::Date(*d)),
        Value::DateTime(dt) => Ok(Value::Date(dt.date_naive())),
        Value::Null => Err(ConvertError::Null { target: "date" }),
        other => other
            .text()
            .and_then(|s| parse_date(s.trim()))
            .map(Value::Date)
            .ok_or_else(|| invalid("date", other)),
    }
}

pub fn date(value: Value) -> ConvertResult {
    Ok(strict_date(value).unwrap_or(Value::Null))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
}

/// Datetimes without an offset are taken as UTC.
pub fn strict_datetime(value: Value) -> ConvertResult {
    match &value {
        Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
        Value::Date(d) => Ok(Value::DateTime(midnight_utc(*d))),
        Value::Null => Err(ConvertError::Null { target: "datetime" }),
        other => other
            .text()
            .and_then(|s| {
                let s = s.trim();
                parse_datetime(s).or_else(|| {
                    DATE_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                        .map(midnight_utc)
                })
            })
            .map(Value::DateTime)
            .ok_or_else(|| invalid("datetime", other)),
    }
}

pub fn datetime(value: Value) -> ConvertResult {
    Ok(strict_datetime(value).unwrap_or(Value::Null))
}

fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Some(dt) = DATETIME_TZ_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

fn midnight_utc(date: NaiveDate) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
        .fixed_offset()
}

pub fn boolean(value: Value) -> ConvertResult {
    if let Value::Boolean(b) = value {
        return Ok(Value::Boolean(b));
    }
    Ok(match value.text() {
        Some(s) if TRUTHY.contains(&&*s) => Value::Boolean(true),
        Some(s) if FALSY.contains(&&*s) => Value::Boolean(false),
        _ => Value::Null,
    })
}

pub fn strict_boolean(value: Value) -> ConvertResult {
    match boolean(value.clone())? {
        Value::Null => Err(invalid("boolean", &value)),
        converted => Ok(converted),
    }
}

fn map_text(value: Value, f: impl FnOnce(&str) -> String) -> Value {
    match value.text() {
        Some(s) => Value::String(f(&s)),
        None => Value::Null,
    }
}

fn require_text(value: &Value, target: &'static str) -> Result<(), ConvertError> {
    match value {
        Value::Null => Err(ConvertError::Null { target }),
        _ => Ok(()),
    }
}

pub fn upcase(value: Value) -> ConvertResult {
    Ok(map_text(value, str::to_uppercase))
}

pub fn strict_upcase(value: Value) -> ConvertResult {
    require_text(&value, "upcased string")?;
    upcase(value)
}

pub fn downcase(value: Value) -> ConvertResult {
    Ok(map_text(value, str::to_lowercase))
}

pub fn strict_downcase(value: Value) -> ConvertResult {
    require_text(&value, "downcased string")?;
    downcase(value)
}

pub fn strip(value: Value) -> ConvertResult {
    Ok(map_text(value, |s| s.trim().to_string()))
}

pub fn strict_strip(value: Value) -> ConvertResult {
    require_text(&value, "stripped string")?;
    strip(value)
}

pub fn symbol(value: Value) -> ConvertResult {
    Ok(match value.text() {
        Some(s) => Value::Symbol(s.into_owned()),
        None => Value::Null,
    })
}

pub fn strict_symbol(value: Value) -> ConvertResult {
    require_text(&value, "symbol")?;
    symbol(value)
}

/// Deterministic one-way hash (hex-encoded SHA-256).
pub fn sha256(value: Value) -> ConvertResult {
    Ok(map_text(value, |s| hex::encode(Sha256::digest(s.as_bytes()))))
}

/// Random 32 hex digit placeholder, different on every call.
pub fn random_hex(value: Value) -> ConvertResult {
    Ok(map_text(value, |_| uuid::Uuid::new_v4().simple().to_string()))
}

pub fn nil(_value: Value) -> ConvertResult {
    Ok(Value::Null)
}

pub fn blank(_value: Value) -> ConvertResult {
    Ok(Value::String(String::new()))
}

/// The default header normalizer as a value converter.
pub fn header_column(value: Value) -> ConvertResult {
    let text = value.text().map(|s| s.into_owned());
    normalize_column(text.as_deref(), None)
        .map(Value::Symbol)
        .map_err(|e| ConvertError::Other(e.into()))
}
