//! Parsing of countdown/premiere times and Discord timestamp markup.

use crate::errors::{Error, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static RELATIVE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?$").ok()
});

/// Discord timestamp styles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// "in 2 hours"
    Relative,
    /// "16 October 2026 20:00"
    LongDateTime,
    /// "20:00"
    ShortTime,
}

impl TimestampStyle {
    const fn flag(self) -> char {
        match self {
            Self::Relative => 'R',
            Self::LongDateTime => 'F',
            Self::ShortTime => 't',
        }
    }
}

/// `<t:{unix}:{style}>`, rendered by clients in the reader's time zone.
#[must_use]
pub fn discord_timestamp(at: DateTime<Utc>, style: TimestampStyle) -> String {
    format!("<t:{}:{}>", at.timestamp(), style.flag())
}

/// Parses a point in time relative to `now`, in the given time zone.
///
/// Accepted forms:
/// * `HH:MM` - today, or tomorrow when that time has passed
/// * `YYYY-MM-DD HH:MM`
/// * `1d2h30m` - any non-empty combination of days, hours and minutes from now
pub fn parse_time<Tz>(input: &str, now: DateTime<Utc>, zone: &Tz) -> Result<DateTime<Utc>>
where
    Tz: TimeZone,
{
    let trimmed = input.trim();
    let invalid = || Error::InvalidTime {
        input: input.to_string(),
    };

    if let Some(offset) = parse_relative(trimmed) {
        return now.checked_add_signed(offset).ok_or_else(invalid);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M") {
        return localize(&naive, zone).ok_or_else(invalid);
    }

    if let Ok(time) = NaiveTime::parse_from_str(trimmed, "%H:%M") {
        let today: NaiveDate = now.with_timezone(zone).date_naive();
        let candidate = localize(&today.and_time(time), zone).ok_or_else(invalid)?;
        if candidate > now {
            return Ok(candidate);
        }
        let tomorrow = today.succ_opt().ok_or_else(invalid)?;
        return localize(&tomorrow.and_time(time), zone).ok_or_else(invalid);
    }

    Err(invalid())
}

fn parse_relative(input: &str) -> Option<Duration> {
    let captures = RELATIVE.as_ref()?.captures(input)?;
    if captures.iter().skip(1).all(|group| group.is_none()) {
        return None;
    }

    let unit = |idx: usize| -> Option<i64> {
        captures
            .get(idx)
            .map_or(Some(0), |m| m.as_str().parse().ok())
    };
    let total = Duration::try_days(unit(1)?)?
        .checked_add(&Duration::try_hours(unit(2)?)?)?
        .checked_add(&Duration::try_minutes(unit(3)?)?)?;

    (total > Duration::zero()).then_some(total)
}

fn localize<Tz>(naive: &NaiveDateTime, zone: &Tz) -> Option<DateTime<Utc>>
where
    Tz: TimeZone,
{
    zone.from_local_datetime(naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::FixedOffset;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_relative() {
        assert_eq!(parse_time("1d2h30m", now(), &Utc).unwrap(), now() + Duration::minutes(1590));
        assert_eq!(parse_time("45m", now(), &Utc).unwrap(), now() + Duration::minutes(45));
        assert_eq!(parse_time(" 3h ", now(), &Utc).unwrap(), now() + Duration::hours(3));
    }

    #[test]
    fn test_clock_time_rolls_over_to_tomorrow() {
        assert_eq!(
            parse_time("20:15", now(), &Utc).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 16, 20, 15, 0).unwrap()
        );
        assert_eq!(
            parse_time("07:00", now(), &Utc).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 17, 7, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_clock_time_in_other_zone() {
        let berlin_summer = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            parse_time("21:00", now(), &berlin_summer).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 16, 19, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_full_date() {
        assert_eq!(
            parse_time("2026-12-24 18:30", now(), &Utc).unwrap(),
            Utc.with_ymd_and_hms(2026, 12, 24, 18, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_malformed_inputs() {
        for input in ["", "morgen", "25:00", "0m", "1x", "2026-13-01 10:00", "d"] {
            assert!(
                matches!(parse_time(input, now(), &Utc), Err(Error::InvalidTime { .. })),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_relative_beyond_calendar_range() {
        for input in ["100000000d", "99999999999m"] {
            assert!(
                matches!(parse_time(input, now(), &Utc), Err(Error::InvalidTime { .. })),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_discord_timestamp() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(discord_timestamp(at, TimestampStyle::Relative), "<t:1700000000:R>");
        assert_eq!(discord_timestamp(at, TimestampStyle::LongDateTime), "<t:1700000000:F>");
    }
}
