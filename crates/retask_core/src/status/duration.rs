use crate::error::AppError;
use crate::model::TimeComponents;

pub const SECOND_MS: i64 = 1_000;
pub const MINUTE_MS: i64 = 60 * SECOND_MS;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
/// Fixed approximation, not calendar aware.
pub const MONTH_MS: i64 = 30 * DAY_MS;
/// Fixed approximation, not calendar aware.
pub const YEAR_MS: i64 = 365 * DAY_MS;

/// Split a non-negative duration into years, months, days, hours, minutes and seconds.
///
/// Each unit consumes the remainder left by the larger one. Sub-second
/// remainders are dropped.
pub fn decompose(duration_ms: i64) -> Result<TimeComponents, AppError> {
    if duration_ms < 0 {
        return Err(AppError::invalid_input("duration must be non-negative"));
    }
    Ok(decompose_unsigned(duration_ms.unsigned_abs()))
}

pub(crate) fn decompose_unsigned(duration_ms: u64) -> TimeComponents {
    let mut remaining = duration_ms;
    let mut take = |unit_ms: i64| {
        let unit_ms = unit_ms as u64;
        let value = remaining / unit_ms;
        remaining %= unit_ms;
        value
    };

    TimeComponents {
        years: take(YEAR_MS),
        months: take(MONTH_MS),
        days: take(DAY_MS),
        hours: take(HOUR_MS),
        minutes: take(MINUTE_MS),
        seconds: take(SECOND_MS),
    }
}

/// Parse a user supplied interval such as `"5d"`, `"1d12h"` or `"2mo"`.
///
/// Units: `y`, `mo`, `d`, `h`, `m`, `s`, using the same fixed sizes as [`decompose`].
pub fn parse_interval(raw: &str) -> Result<i64, AppError> {
    let trimmed = raw.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("interval is required"));
    }

    let mut total: i64 = 0;
    let mut rest = trimmed.as_str();

    while !rest.is_empty() {
        let digits_end = rest
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(AppError::invalid_input(format!(
                "invalid interval '{}': expected a number",
                raw.trim()
            )));
        }
        let value: i64 = rest[..digits_end]
            .parse()
            .map_err(|_| AppError::invalid_input(format!("interval '{}' is too large", raw.trim())))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|ch: char| ch.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit_ms = match rest[..unit_end].trim() {
            "y" => YEAR_MS,
            "mo" => MONTH_MS,
            "d" => DAY_MS,
            "h" => HOUR_MS,
            "m" => MINUTE_MS,
            "s" => SECOND_MS,
            "" => {
                return Err(AppError::invalid_input(format!(
                    "invalid interval '{}': missing unit",
                    raw.trim()
                )));
            }
            other => {
                return Err(AppError::invalid_input(format!(
                    "invalid interval unit '{other}'"
                )));
            }
        };
        rest = &rest[unit_end..];

        total = value
            .checked_mul(unit_ms)
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| AppError::invalid_input(format!("interval '{}' is too large", raw.trim())))?;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::{
        DAY_MS, HOUR_MS, MINUTE_MS, MONTH_MS, SECOND_MS, YEAR_MS, decompose, parse_interval,
    };
    use crate::model::TimeComponents;

    fn rebuild(components: &TimeComponents) -> i64 {
        components.years as i64 * YEAR_MS
            + components.months as i64 * MONTH_MS
            + components.days as i64 * DAY_MS
            + components.hours as i64 * HOUR_MS
            + components.minutes as i64 * MINUTE_MS
            + components.seconds as i64 * SECOND_MS
    }

    #[test]
    fn decompose_zero_is_due_now() {
        let components = decompose(0).unwrap();
        assert!(components.is_due_now());
    }

    #[test]
    fn decompose_rejects_negative_duration() {
        let err = decompose(-1).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn decompose_splits_every_unit() {
        let duration = YEAR_MS + 2 * MONTH_MS + 3 * DAY_MS + 4 * HOUR_MS + 5 * MINUTE_MS + 6 * SECOND_MS;
        let components = decompose(duration).unwrap();

        assert_eq!(
            components,
            TimeComponents {
                years: 1,
                months: 2,
                days: 3,
                hours: 4,
                minutes: 5,
                seconds: 6,
            }
        );
    }

    #[test]
    fn decompose_uses_fixed_month_and_year_sizes() {
        let components = decompose(364 * DAY_MS).unwrap();
        assert_eq!(components.years, 0);
        assert_eq!(components.months, 12);
        assert_eq!(components.days, 4);

        let components = decompose(365 * DAY_MS).unwrap();
        assert_eq!(components.years, 1);
        assert_eq!(components.months, 0);
    }

    #[test]
    fn decompose_drops_sub_second_remainder() {
        let components = decompose(20 * SECOND_MS + 999).unwrap();
        assert_eq!(components.seconds, 20);
        assert_eq!(rebuild(&components), 20 * SECOND_MS);
    }

    #[test]
    fn decompose_rebuilds_whole_seconds_within_unit_bounds() {
        let samples = [
            0,
            SECOND_MS,
            59 * SECOND_MS,
            MINUTE_MS,
            HOUR_MS - SECOND_MS,
            DAY_MS + 7 * MINUTE_MS,
            MONTH_MS - 1_000,
            YEAR_MS - SECOND_MS,
            3 * YEAR_MS + 11 * MONTH_MS + 29 * DAY_MS + 23 * HOUR_MS + 59 * MINUTE_MS + 59 * SECOND_MS,
            1_234_567_890_000,
        ];

        for duration in samples {
            let components = decompose(duration).unwrap();
            assert_eq!(rebuild(&components), duration, "duration {duration}");
            assert!(components.months < 13, "duration {duration}");
            assert!(components.days < 30, "duration {duration}");
            assert!(components.hours < 24, "duration {duration}");
            assert!(components.minutes < 60, "duration {duration}");
            assert!(components.seconds < 60, "duration {duration}");
        }
    }

    #[test]
    fn decompose_handles_largest_duration() {
        let components = decompose(i64::MAX).unwrap();
        assert!(components.years > 0);
    }

    #[test]
    fn parse_interval_reads_single_units() {
        assert_eq!(parse_interval("45s").unwrap(), 45 * SECOND_MS);
        assert_eq!(parse_interval("30m").unwrap(), 30 * MINUTE_MS);
        assert_eq!(parse_interval("12h").unwrap(), 12 * HOUR_MS);
        assert_eq!(parse_interval("5d").unwrap(), 5 * DAY_MS);
        assert_eq!(parse_interval("2mo").unwrap(), 2 * MONTH_MS);
        assert_eq!(parse_interval("1y").unwrap(), YEAR_MS);
    }

    #[test]
    fn parse_interval_combines_units() {
        assert_eq!(parse_interval(" 1D12h ").unwrap(), DAY_MS + 12 * HOUR_MS);
        assert_eq!(parse_interval("1y6mo").unwrap(), YEAR_MS + 6 * MONTH_MS);
    }

    #[test]
    fn parse_interval_rejects_bad_input() {
        assert_eq!(parse_interval("").unwrap_err().code(), "invalid_input");
        assert_eq!(parse_interval("12").unwrap_err().code(), "invalid_input");
        assert_eq!(parse_interval("d").unwrap_err().code(), "invalid_input");
        assert_eq!(parse_interval("3w").unwrap_err().code(), "invalid_input");
        assert_eq!(
            parse_interval("99999999999999999999y").unwrap_err().code(),
            "invalid_input"
        );
    }
}
