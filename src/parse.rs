//! Parse-or-default helpers for per-candidate fields.
//!
//! Upstream metadata is frequently missing or malformed. Each helper here
//! returns `None` instead of an error so callers can award zero points for
//! the affected component and keep going.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse an ISO-8601 / RFC 3339 timestamp (`Z` or explicit offset) into UTC.
pub fn published_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an ISO-8601 duration such as `PT4M13S` or `PT1H2M` into seconds.
///
/// Supports the day and time designators (`D`, `W`, `H`, `M`, `S`). Year and
/// month designators have no fixed length and are rejected. A value with no
/// time part (`P0D`, `P1D`) is what the API reports for live and upcoming
/// streams, so it is treated as unknown.
pub fn iso8601_duration(raw: &str) -> Option<u64> {
    let rest = raw.trim().strip_prefix('P')?;
    let (date_part, time_part) = rest.split_once('T')?;

    let mut total: u64 = 0;
    let mut seen_any = false;

    for (value, unit) in designators(date_part)? {
        match unit {
            'D' => total = total.checked_add(value.checked_mul(86_400)?)?,
            'W' => total = total.checked_add(value.checked_mul(7 * 86_400)?)?,
            _ => return None,
        }
        seen_any = true;
    }

    for (value, unit) in designators(time_part)? {
        let secs = match unit {
            'H' => value.checked_mul(3_600)?,
            'M' => value.checked_mul(60)?,
            'S' => value,
            _ => return None,
        };
        total = total.checked_add(secs)?;
        seen_any = true;
    }

    seen_any.then_some(total)
}

// ============ Lenient serde fields ============
//
// Each helper accepts any JSON value and maps values of the wrong type to
// the field's "unknown" state, so a single bad field never fails a batch.

/// Strings pass through, numbers are rendered, anything else is empty.
pub fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Only strings are kept.
pub fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Seconds as an integer, a float (truncated), a numeric string, or an
/// ISO-8601 duration string.
pub fn lenient_duration<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_f64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| iso8601_duration(s).and_then(|secs| i64::try_from(secs).ok()))
        }
        _ => None,
    })
}

/// Non-negative count; negatives, non-numbers and null become 0, values
/// past `u32::MAX` saturate.
pub fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(count_from(&Value::deserialize(d)?).unwrap_or(0))
}

/// Like [`lenient_count`], but unknown values stay `None`.
pub fn lenient_opt_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(count_from(&Value::deserialize(d)?))
}

fn count_from(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_f64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    if n < 0 {
        return None;
    }
    Some(u32::try_from(n).unwrap_or(u32::MAX))
}

fn truncate_f64(f: f64) -> Option<i64> {
    (f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64).then(|| f.trunc() as i64)
}

/// Split `"1H2M3S"` into `[(1,'H'), (2,'M'), (3,'S')]`. Fractional values
/// are truncated to whole units.
fn designators(part: &str) -> Option<Vec<(u64, char)>> {
    let mut out = Vec::new();
    let mut digits = String::new();
    let mut fraction = false;

    for c in part.chars() {
        if c.is_ascii_digit() {
            if !fraction {
                digits.push(c);
            }
        } else if c == '.' || c == ',' {
            fraction = true;
        } else {
            if digits.is_empty() {
                return None;
            }
            out.push((digits.parse().ok()?, c));
            digits.clear();
            fraction = false;
        }
    }

    if !digits.is_empty() {
        return None;
    }
    Some(out)
}
