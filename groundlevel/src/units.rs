//! Unit conversion and display formatting for elevations.

use std::fmt;

const METERS_TO_FEET: f64 = 3.28084;

const MS_PER_SECOND: i64 = 1000;

/// Display unit for elevations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    Meters,
    #[default]
    Feet,
}

impl Unit {
    /// Converts a value in meters to this unit.
    pub fn convert(&self, meters: f64) -> f64 {
        match self {
            Unit::Meters => meters,
            Unit::Feet => meters_to_feet(meters),
        }
    }

    /// Short unit label ("m" or "ft").
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Meters => "m",
            Unit::Feet => "ft",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Meters => write!(f, "meters"),
            Unit::Feet => write!(f, "feet"),
        }
    }
}

/// Converts meters to feet.
pub fn meters_to_feet(meters: f64) -> f64 {
    meters * METERS_TO_FEET
}

/// Converts feet to meters.
pub fn feet_to_meters(feet: f64) -> f64 {
    feet / METERS_TO_FEET
}

/// Rounds `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let multiplier = 10f64.powi(decimals);
    (value * multiplier).round() / multiplier
}

/// Formats a number with a fixed number of decimals and comma thousands separators.
///
/// `format_with_separators(8848.86, 0)` gives `"8,849"`.
pub fn format_with_separators(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Formats an elevation in the given unit, e.g. `"5,249 ft"`.
pub fn format_elevation(meters: f64, unit: Unit) -> String {
    format!(
        "{} {}",
        format_with_separators(unit.convert(meters), 0),
        unit.label()
    )
}

/// Formats an accuracy figure in meters.
pub fn format_accuracy(accuracy: f64) -> String {
    if accuracy < 1.0 {
        "< 1m".to_string()
    } else if accuracy < 10.0 {
        format!("±{:.1}m", accuracy)
    } else {
        format!("±{}m", accuracy.round() as i64)
    }
}

/// Formats how long ago `timestamp_ms` was, relative to `now_ms`.
pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let seconds = (now_ms - timestamp_ms).max(0) / MS_PER_SECOND;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    fn plural(n: i64, unit: &str) -> String {
        format!("{} {}{} ago", n, unit, if n > 1 { "s" } else { "" })
    }

    if seconds < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else {
        plural(days, "day")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert!((meters_to_feet(1000.0) - 3280.84).abs() < 1e-9);
        assert!((feet_to_meters(3280.84) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(40.123456, 4), 40.1235);
        assert_eq!(round_to(-105.00004, 4), -105.0);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_separators() {
        assert_eq!(format_with_separators(8848.86, 0), "8,849");
        assert_eq!(format_with_separators(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_with_separators(999.0, 0), "999");
        assert_eq!(format_with_separators(-1430.0, 0), "-1,430");
    }

    #[test]
    fn test_format_elevation() {
        assert_eq!(format_elevation(1600.0, Unit::Meters), "1,600 m");
        assert_eq!(format_elevation(1600.0, Unit::Feet), "5,249 ft");
    }

    #[test]
    fn test_format_accuracy() {
        assert_eq!(format_accuracy(0.4), "< 1m");
        assert_eq!(format_accuracy(8.0), "±8.0m");
        assert_eq!(format_accuracy(10.4), "±10m");
    }

    #[test]
    fn test_relative_time() {
        let now = 10_000_000_000;
        assert_eq!(format_relative_time(now - 30_000, now), "just now");
        assert_eq!(format_relative_time(now - 60_000, now), "1 minute ago");
        assert_eq!(format_relative_time(now - 5 * 60_000, now), "5 minutes ago");
        assert_eq!(format_relative_time(now - 3 * 3_600_000, now), "3 hours ago");
        assert_eq!(format_relative_time(now - 86_400_000, now), "1 day ago");
    }

    #[test]
    fn test_unit_default_is_feet() {
        assert_eq!(Unit::default(), Unit::Feet);
    }
}
