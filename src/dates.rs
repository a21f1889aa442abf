//! Time-zone resolution and daily-note date computation.
//!
//! A caller resolves a time zone once at configuration load, binds a
//! [`DailyNoteFormatter`] to it, then asks the formatter for calendar
//! dates relative to a reference instant ("today", "tomorrow", arbitrary
//! day offsets). Resolution never fails: an invalid zone identifier is
//! absorbed into the result and the host fallback zone is used instead.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Locale recorded alongside resolved zones. The rendered date format is
/// fixed and locale-independent; the locale is carried for diagnostics.
pub const DEFAULT_LOCALE: &str = "en-CA";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// The requested zone identifier is unknown to the tz database or
    /// failed the formatting probe. Absorbed by [`resolve_time_zone`].
    #[error("unknown or unsupported time zone `{0}`")]
    InvalidTimeZone(String),
    /// Calendar fields could not be extracted or shifted. Fatal to the
    /// calling operation; a guessed date would corrupt note content.
    #[error("unable to determine calendar date components")]
    UndeterminableDateComponents,
}

/// Outcome of deciding which time zone governs date computations.
///
/// `effective_time_zone` is a parsed [`Tz`], so it is always usable by
/// construction. `is_fallback` is true only when a requested identifier
/// was rejected; an absent request is the normal case, not a degraded one.
#[derive(Debug, Clone)]
pub struct TimeZoneResolution {
    pub effective_time_zone: Tz,
    pub requested_time_zone: Option<String>,
    pub fallback_time_zone: Tz,
    pub is_fallback: bool,
    pub locale: String,
    pub error: Option<DateError>,
}

/// The host's default zone: `TZ` when it names a loadable zone, else UTC.
pub fn system_time_zone() -> Tz {
    std::env::var("TZ")
        .ok()
        .and_then(|name| name.parse().ok())
        .unwrap_or(chrono_tz::UTC)
}

/// Decide the effective time zone for an optional requested identifier.
///
/// Never fails. A rejected identifier selects the fallback zone and the
/// underlying error is attached to the result for diagnostics.
pub fn resolve_time_zone(requested: Option<&str>, locale: &str) -> TimeZoneResolution {
    let fallback = system_time_zone();
    let Some(requested) = requested else {
        return TimeZoneResolution {
            effective_time_zone: fallback,
            requested_time_zone: None,
            fallback_time_zone: fallback,
            is_fallback: false,
            locale: locale.to_string(),
            error: None,
        };
    };
    match try_time_zone(requested, locale) {
        Ok(zone) => TimeZoneResolution {
            effective_time_zone: zone,
            requested_time_zone: Some(requested.to_string()),
            fallback_time_zone: fallback,
            is_fallback: false,
            locale: locale.to_string(),
            error: None,
        },
        Err(err) => TimeZoneResolution {
            effective_time_zone: fallback,
            requested_time_zone: Some(requested.to_string()),
            fallback_time_zone: fallback,
            is_fallback: true,
            locale: locale.to_string(),
            error: Some(err),
        },
    }
}

/// Validity is operational: the identifier must parse against the bundled
/// tz database and a probe format of the current instant must succeed.
fn try_time_zone(name: &str, locale: &str) -> Result<Tz, DateError> {
    let zone: Tz = name
        .parse()
        .map_err(|_| DateError::InvalidTimeZone(name.to_string()))?;
    DailyNoteFormatter::new(zone, locale).format(Utc::now(), 0)?;
    Ok(zone)
}

/// Renders the calendar date of an instant, as seen in one fixed time
/// zone, shifted by whole days. Stateless across calls.
#[derive(Debug, Clone)]
pub struct DailyNoteFormatter {
    time_zone: Tz,
    locale: String,
}

impl DailyNoteFormatter {
    pub fn new(time_zone: Tz, locale: impl Into<String>) -> Self {
        Self {
            time_zone,
            locale: locale.into(),
        }
    }

    /// Bind a formatter to the zone a resolution settled on.
    pub fn for_resolution(resolution: &TimeZoneResolution) -> Self {
        Self::new(resolution.effective_time_zone, resolution.locale.clone())
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// `YYYY-MM-DD` for `reference` in the bound zone, `offset_days` later.
    ///
    /// The offset is applied to the extracted calendar date, never to the
    /// instant, so DST transitions in the bound zone cannot shift the
    /// result a second time. Overflow past month or year boundaries is
    /// normalized by the calendar arithmetic.
    pub fn format(
        &self,
        reference: DateTime<Utc>,
        offset_days: i64,
    ) -> Result<String, DateError> {
        let local = reference.with_timezone(&self.time_zone);
        let anchored = NaiveDate::from_ymd_opt(local.year(), local.month(), local.day())
            .ok_or(DateError::UndeterminableDateComponents)?;
        let offset =
            Duration::try_days(offset_days).ok_or(DateError::UndeterminableDateComponents)?;
        let shifted = anchored
            .checked_add_signed(offset)
            .ok_or(DateError::UndeterminableDateComponents)?;
        Ok(shifted.format("%Y-%m-%d").to_string())
    }

    /// Today's date plus `offset_days`, relative to the current instant.
    pub fn relative(&self, offset_days: i64) -> Result<String, DateError> {
        self.format(Utc::now(), offset_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc_formatter() -> DailyNoteFormatter {
        DailyNoteFormatter::new(chrono_tz::UTC, DEFAULT_LOCALE)
    }

    fn instant(s: &str) -> DateTime<Utc> {
        s.parse().expect("test instant")
    }

    #[test]
    fn invalid_zone_falls_back() {
        let resolution = resolve_time_zone(Some("Invalid/Zone"), DEFAULT_LOCALE);
        assert!(resolution.is_fallback);
        assert_eq!(resolution.effective_time_zone, resolution.fallback_time_zone);
        assert_eq!(resolution.requested_time_zone.as_deref(), Some("Invalid/Zone"));
        assert_eq!(
            resolution.error,
            Some(DateError::InvalidTimeZone("Invalid/Zone".to_string()))
        );
    }

    #[test]
    fn valid_zone_is_used_as_requested() {
        let resolution = resolve_time_zone(Some("America/New_York"), DEFAULT_LOCALE);
        assert!(!resolution.is_fallback);
        assert_eq!(resolution.effective_time_zone, chrono_tz::America::New_York);
        assert!(resolution.error.is_none());
    }

    #[test]
    fn absent_zone_uses_fallback_without_degrading() {
        let resolution = resolve_time_zone(None, DEFAULT_LOCALE);
        assert!(!resolution.is_fallback);
        assert!(resolution.requested_time_zone.is_none());
        assert_eq!(resolution.effective_time_zone, resolution.fallback_time_zone);
        assert!(resolution.error.is_none());
    }

    #[test]
    fn resolution_records_locale() {
        let resolution = resolve_time_zone(None, "es-ES");
        assert_eq!(resolution.locale, "es-ES");
    }

    #[test]
    fn offsets_cross_the_year_boundary() {
        let formatter = utc_formatter();
        let base = instant("2024-01-01T12:00:00Z");
        assert_eq!(formatter.format(base, 0).unwrap(), "2024-01-01");
        assert_eq!(formatter.format(base, 1).unwrap(), "2024-01-02");
        assert_eq!(formatter.format(base, -1).unwrap(), "2023-12-31");
    }

    #[test]
    fn offsets_cross_the_month_boundary() {
        let formatter = utc_formatter();
        let base = instant("2024-01-31T00:00:00Z");
        assert_eq!(formatter.format(base, 1).unwrap(), "2024-02-01");
    }

    #[test]
    fn leap_day_is_produced_and_passed() {
        let formatter = utc_formatter();
        let base = instant("2024-02-28T00:00:00Z");
        assert_eq!(formatter.format(base, 1).unwrap(), "2024-02-29");
        assert_eq!(formatter.format(base, 2).unwrap(), "2024-03-01");
    }

    #[test]
    fn large_offsets_are_normalized() {
        let formatter = utc_formatter();
        let base = instant("2024-01-01T00:00:00Z");
        assert_eq!(formatter.format(base, 366).unwrap(), "2025-01-01");
        assert_eq!(formatter.format(base, -365).unwrap(), "2023-01-01");
    }

    #[test]
    fn zone_ahead_of_utc_shifts_the_extracted_date() {
        let formatter = DailyNoteFormatter::new(chrono_tz::Asia::Tokyo, DEFAULT_LOCALE);
        // 20:00 UTC is already the next day in Tokyo (UTC+9).
        let base = instant("2024-01-01T20:00:00Z");
        assert_eq!(formatter.format(base, 0).unwrap(), "2024-01-02");
        assert_eq!(formatter.format(base, 1).unwrap(), "2024-01-03");
    }

    #[test]
    fn repeated_calls_are_identical() {
        let formatter = utc_formatter();
        let base = instant("2024-06-15T23:59:59Z");
        let first = formatter.format(base, 7).unwrap();
        let second = formatter.format(base, 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_offset_matches_direct_formatting() {
        let formatter = DailyNoteFormatter::new(chrono_tz::America::New_York, DEFAULT_LOCALE);
        let base = instant("2024-03-10T06:30:00Z");
        let direct = base
            .with_timezone(&chrono_tz::America::New_York)
            .format("%Y-%m-%d")
            .to_string();
        assert_eq!(formatter.format(base, 0).unwrap(), direct);
    }

    #[test]
    fn dst_spring_forward_does_not_double_shift() {
        // 2024-03-10 02:30 does not exist in New York; the offset is
        // applied to the extracted date, so the result stays exact.
        let formatter = DailyNoteFormatter::new(chrono_tz::America::New_York, DEFAULT_LOCALE);
        let base = chrono_tz::America::New_York
            .with_ymd_and_hms(2024, 3, 9, 23, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(formatter.format(base, 0).unwrap(), "2024-03-09");
        assert_eq!(formatter.format(base, 1).unwrap(), "2024-03-10");
        assert_eq!(formatter.format(base, 2).unwrap(), "2024-03-11");
    }

    #[test]
    fn extreme_offset_fails_instead_of_guessing() {
        let formatter = utc_formatter();
        let base = instant("2024-01-01T00:00:00Z");
        let result = formatter.format(base, i64::MAX);
        assert_eq!(result, Err(DateError::UndeterminableDateComponents));
    }
}
