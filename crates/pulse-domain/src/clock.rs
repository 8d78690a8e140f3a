//! Canonical clock - the single source of persistent timestamps
//!
//! Every timestamp written to the store is a UTC instant formatted with
//! exactly 3 fractional-second digits and a literal `Z` suffix, 24
//! characters total (`2026-02-14T20:00:00.000Z`). Keeping one format for
//! every write means lexicographic ordering of stored timestamps equals
//! chronological ordering, which the freshness comparisons rely on.

use chrono::{DateTime, Days, FixedOffset, SecondsFormat, Utc};

/// Length of a canonical timestamp string.
pub const CANONICAL_LEN: usize = 24;

/// Format an instant in the canonical form.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use pulse_domain::clock::format_canonical;
///
/// let instant = Utc.with_ymd_and_hms(2026, 2, 14, 20, 0, 0).unwrap();
/// assert_eq!(format_canonical(instant), "2026-02-14T20:00:00.000Z");
/// ```
pub fn format_canonical(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current instant in the canonical form.
///
/// All persistent timestamp writes route through this function (or
/// through [`format_canonical`] on an instant obtained from a [`Clock`]);
/// no component formats timestamps independently.
pub fn now_canonical() -> String {
    format_canonical(Utc::now())
}

/// Parse a canonical timestamp back into an instant.
pub fn parse_canonical(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid canonical timestamp '{}': {}", s, e))
}

/// Check that a string is in the canonical form (24 chars, millis, `Z`).
pub fn is_canonical(s: &str) -> bool {
    s.len() == CANONICAL_LEN && s.ends_with('Z') && parse_canonical(s).is_ok()
}

/// Local midnight of (today + `days`) in a fixed-offset timezone, as a
/// canonical UTC timestamp.
///
/// "Snooze N days" means local midnight of the Nth calendar day from
/// today in the organization's timezone, not `now + N*24h`. Negative
/// `days` walks backwards, which the recently-actioned lookback uses.
pub fn local_midnight_offset_days(
    now: DateTime<Utc>,
    offset_minutes: i32,
    days: i64,
) -> Result<String, String> {
    let offset = offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| format!("UTC offset out of range: {} minutes", offset_minutes))?;

    let today = now.with_timezone(&offset).date_naive();
    let date = if days >= 0 {
        today.checked_add_days(Days::new(days as u64))
    } else {
        today.checked_sub_days(Days::new(days.unsigned_abs()))
    }
    .ok_or_else(|| format!("Date out of range: {} days from {}", days, today))?;

    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("Invalid midnight for {}", date))?;
    let local = midnight
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| format!("Ambiguous local midnight for {}", date))?;

    Ok(format_canonical(local.with_timezone(&Utc)))
}

/// Trait for obtaining the current instant.
///
/// Production code uses [`SystemClock`]; tests pin time with [`FixedClock`].
pub trait Clock {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current instant in the canonical form.
    fn now_canonical(&self) -> String {
        format_canonical(self.now())
    }
}

/// Wall-clock implementation of [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pin the clock to a canonical timestamp string.
    pub fn at(canonical: &str) -> Result<Self, String> {
        parse_canonical(canonical).map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_canonical_format_is_24_chars() {
        let s = now_canonical();
        assert_eq!(s.len(), CANONICAL_LEN);
        assert!(s.ends_with('Z'));
        // Exactly 3 fractional digits
        let dot = s.find('.').unwrap();
        assert_eq!(s.len() - dot, 5); // ".123Z"
    }

    #[test]
    fn test_canonical_roundtrip() {
        let instant = Utc.with_ymd_and_hms(2026, 2, 8, 11, 0, 0).unwrap();
        let s = format_canonical(instant);
        assert_eq!(s, "2026-02-08T11:00:00.000Z");
        assert_eq!(parse_canonical(&s).unwrap(), instant);
    }

    #[test]
    fn test_is_canonical_rejects_other_precisions() {
        assert!(is_canonical("2026-02-08T11:00:00.000Z"));
        assert!(!is_canonical("2026-02-08T11:00:00Z"));
        assert!(!is_canonical("2026-02-08T11:00:00.000000Z"));
        assert!(!is_canonical("2026-02-08T11:00:00.000+00:00"));
        assert!(!is_canonical("not a timestamp"));
    }

    #[test]
    fn test_local_midnight_seven_days_utc_plus_4() {
        // 15:00 local on 2026-02-08 in a UTC+4 organization; snoozing 7 days
        // lands on local midnight of 2026-02-15, which is 20:00 UTC the day before.
        let now = Utc.with_ymd_and_hms(2026, 2, 8, 11, 0, 0).unwrap();
        let until = local_midnight_offset_days(now, 240, 7).unwrap();
        assert_eq!(until, "2026-02-14T20:00:00.000Z");
    }

    #[test]
    fn test_local_midnight_negative_days() {
        let now = Utc.with_ymd_and_hms(2026, 2, 8, 11, 0, 0).unwrap();
        let cutoff = local_midnight_offset_days(now, 0, -7).unwrap();
        assert_eq!(cutoff, "2026-02-01T00:00:00.000Z");
    }

    #[test]
    fn test_local_midnight_rejects_bad_offset() {
        let now = Utc.with_ymd_and_hms(2026, 2, 8, 11, 0, 0).unwrap();
        // FixedOffset only accepts offsets strictly inside a day
        assert!(local_midnight_offset_days(now, 24 * 60, 1).is_err());
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::at("2026-02-08T11:00:00.000Z").unwrap();
        assert_eq!(clock.now_canonical(), "2026-02-08T11:00:00.000Z");
    }
}
