// Relative time expression resolution
use chrono::{DateTime, Duration, Months, Utc};

use crate::domain::layout::TimeWindow;

/// Resolve a time expression against an explicit clock value.
///
/// Accepted forms: the literal `"now"`, a relative offset `"now-<N><unit>"`
/// with units `s|m|h|d|M|y`, or an absolute RFC 3339 timestamp. Anything
/// malformed resolves to `now` unchanged rather than failing.
pub fn resolve_expr_at(expr: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    if expr == "now" {
        return now;
    }
    if let Some(offset) = expr.strip_prefix("now-") {
        return match subtract_offset(offset, now) {
            Some(resolved) => resolved,
            None => {
                tracing::warn!("malformed relative time expression {:?}", expr);
                now
            }
        };
    }
    match DateTime::parse_from_rfc3339(expr) {
        Ok(t) => t.with_timezone(&Utc),
        Err(_) => {
            tracing::warn!("unparseable time expression {:?}", expr);
            now
        }
    }
}

/// Resolve both edges of a window against a single `now` so `from` and
/// `to` agree on the reference instant. Callers pass the wall clock at
/// fetch time; relative windows are deliberately re-resolved on every
/// fetch so that a trailing window keeps trailing.
pub fn resolve_window_at(window: &TimeWindow, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        resolve_expr_at(&window.from, now),
        resolve_expr_at(&window.to, now),
    )
}

fn subtract_offset(offset: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if offset.len() < 2 {
        return None;
    }
    let (digits, unit) = offset.split_at(offset.len() - 1);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: i64 = digits.parse().ok()?;

    match unit {
        "s" => now.checked_sub_signed(Duration::seconds(amount)),
        "m" => now.checked_sub_signed(Duration::minutes(amount)),
        "h" => now.checked_sub_signed(Duration::hours(amount)),
        "d" => now.checked_sub_signed(Duration::days(amount)),
        "M" => now.checked_sub_months(Months::new(u32::try_from(amount).ok()?)),
        "y" => now.checked_sub_months(Months::new(u32::try_from(amount).ok()?.checked_mul(12)?)),
        _ => None,
    }
}
