use super::ValueIssue;
use std::fmt;

/// Split `"<digits> [unit]"` into its number and (possibly empty) unit.
pub(crate) fn split_quantity(text: &str) -> Result<(u64, &str), ValueIssue> {
    let text = text.trim();
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    if end == 0 {
        return Err(ValueIssue::new(format!(
            "\"{}\" does not start with a non-negative number",
            text
        )));
    }
    let number = text[..end]
        .parse::<u64>()
        .map_err(|_| ValueIssue::new(format!("\"{}\" is too large", &text[..end])))?;
    Ok((number, text[end..].trim()))
}

fn unit_matches(text: &str, abbreviation: &str, long_name: &str) -> bool {
    text.eq_ignore_ascii_case(abbreviation)
        || text.eq_ignore_ascii_case(long_name)
        || text
            .strip_suffix(['s', 'S'])
            .is_some_and(|singular| singular.eq_ignore_ascii_case(long_name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeUnit {
    Bytes,
    Kilobytes,
    Kibibytes,
    Megabytes,
    Mebibytes,
    Gigabytes,
    Gibibytes,
    Terabytes,
    Tebibytes,
}

impl SizeUnit {
    const ALL: [SizeUnit; 9] = [
        SizeUnit::Bytes,
        SizeUnit::Kilobytes,
        SizeUnit::Kibibytes,
        SizeUnit::Megabytes,
        SizeUnit::Mebibytes,
        SizeUnit::Gigabytes,
        SizeUnit::Gibibytes,
        SizeUnit::Terabytes,
        SizeUnit::Tebibytes,
    ];

    /// Encoding preference: exact binary units first, then decimal.
    const BEST_FIT_ORDER: [SizeUnit; 8] = [
        SizeUnit::Tebibytes,
        SizeUnit::Gibibytes,
        SizeUnit::Mebibytes,
        SizeUnit::Kibibytes,
        SizeUnit::Terabytes,
        SizeUnit::Gigabytes,
        SizeUnit::Megabytes,
        SizeUnit::Kilobytes,
    ];

    pub fn bytes(&self) -> i64 {
        match self {
            SizeUnit::Bytes => 1,
            SizeUnit::Kilobytes => 1_000,
            SizeUnit::Kibibytes => 1 << 10,
            SizeUnit::Megabytes => 1_000_000,
            SizeUnit::Mebibytes => 1 << 20,
            SizeUnit::Gigabytes => 1_000_000_000,
            SizeUnit::Gibibytes => 1 << 30,
            SizeUnit::Terabytes => 1_000_000_000_000,
            SizeUnit::Tebibytes => 1 << 40,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            SizeUnit::Bytes => "b",
            SizeUnit::Kilobytes => "kb",
            SizeUnit::Kibibytes => "kib",
            SizeUnit::Megabytes => "mb",
            SizeUnit::Mebibytes => "mib",
            SizeUnit::Gigabytes => "gb",
            SizeUnit::Gibibytes => "gib",
            SizeUnit::Terabytes => "tb",
            SizeUnit::Tebibytes => "tib",
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            SizeUnit::Bytes => "byte",
            SizeUnit::Kilobytes => "kilobyte",
            SizeUnit::Kibibytes => "kibibyte",
            SizeUnit::Megabytes => "megabyte",
            SizeUnit::Mebibytes => "mebibyte",
            SizeUnit::Gigabytes => "gigabyte",
            SizeUnit::Gibibytes => "gibibyte",
            SizeUnit::Terabytes => "terabyte",
            SizeUnit::Tebibytes => "tebibyte",
        }
    }

    pub fn parse(text: &str) -> Option<SizeUnit> {
        Self::ALL
            .into_iter()
            .find(|u| unit_matches(text.trim(), u.abbreviation(), u.long_name()))
    }

    /// Parse `"<number> [unit]"` into bytes, `default_unit` applying when the
    /// unit is omitted.
    pub fn parse_value(text: &str, default_unit: SizeUnit) -> Result<i64, ValueIssue> {
        let (number, unit_text) = split_quantity(text)?;
        let unit = if unit_text.is_empty() {
            default_unit
        } else {
            Self::parse(unit_text)
                .ok_or_else(|| ValueIssue::new(format!("\"{}\" is not a size unit", unit_text)))?
        };
        i64::try_from(number)
            .ok()
            .and_then(|n| n.checked_mul(unit.bytes()))
            .ok_or_else(|| ValueIssue::new(format!("\"{}\" is too large", text.trim())))
    }

    /// Largest unit expressing `bytes` exactly.
    pub fn best_fit(bytes: i64) -> SizeUnit {
        if bytes == 0 {
            return SizeUnit::Bytes;
        }
        Self::BEST_FIT_ORDER
            .into_iter()
            .find(|u| bytes % u.bytes() == 0)
            .unwrap_or(SizeUnit::Bytes)
    }

    /// `"<n> <unit>"` in the best-fit unit.
    pub fn format(bytes: i64) -> String {
        let unit = Self::best_fit(bytes);
        format!("{} {}", bytes / unit.bytes(), unit.abbreviation())
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DurationUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl DurationUnit {
    const ALL: [DurationUnit; 6] = [
        DurationUnit::Milliseconds,
        DurationUnit::Seconds,
        DurationUnit::Minutes,
        DurationUnit::Hours,
        DurationUnit::Days,
        DurationUnit::Weeks,
    ];

    pub fn millis(&self) -> i64 {
        match self {
            DurationUnit::Milliseconds => 1,
            DurationUnit::Seconds => 1_000,
            DurationUnit::Minutes => 60_000,
            DurationUnit::Hours => 3_600_000,
            DurationUnit::Days => 86_400_000,
            DurationUnit::Weeks => 604_800_000,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            DurationUnit::Milliseconds => "ms",
            DurationUnit::Seconds => "s",
            DurationUnit::Minutes => "m",
            DurationUnit::Hours => "h",
            DurationUnit::Days => "d",
            DurationUnit::Weeks => "w",
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            DurationUnit::Milliseconds => "millisecond",
            DurationUnit::Seconds => "second",
            DurationUnit::Minutes => "minute",
            DurationUnit::Hours => "hour",
            DurationUnit::Days => "day",
            DurationUnit::Weeks => "week",
        }
    }

    pub fn parse(text: &str) -> Option<DurationUnit> {
        Self::ALL
            .into_iter()
            .find(|u| unit_matches(text.trim(), u.abbreviation(), u.long_name()))
    }

    /// Parse `"<number> [unit]"` into its count and unit.
    pub fn parse_quantity(
        text: &str,
        default_unit: DurationUnit,
    ) -> Result<(i64, DurationUnit), ValueIssue> {
        let (number, unit_text) = split_quantity(text)?;
        let unit = if unit_text.is_empty() {
            default_unit
        } else {
            Self::parse(unit_text).ok_or_else(|| {
                ValueIssue::new(format!("\"{}\" is not a duration unit", unit_text))
            })?
        };
        let number = i64::try_from(number)
            .map_err(|_| ValueIssue::new(format!("\"{}\" is too large", text.trim())))?;
        Ok((number, unit))
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_units_parse_by_abbreviation_and_name() {
        assert_eq!(SizeUnit::parse("KiB"), Some(SizeUnit::Kibibytes));
        assert_eq!(SizeUnit::parse("megabytes"), Some(SizeUnit::Megabytes));
        assert_eq!(SizeUnit::parse("byte"), Some(SizeUnit::Bytes));
        assert_eq!(SizeUnit::parse("parsecs"), None);
    }

    #[test]
    fn test_size_parse_value() {
        assert_eq!(SizeUnit::parse_value("1024", SizeUnit::Bytes), Ok(1024));
        assert_eq!(SizeUnit::parse_value(" 2 kb ", SizeUnit::Bytes), Ok(2000));
        assert_eq!(SizeUnit::parse_value("3mib", SizeUnit::Bytes), Ok(3 << 20));
        assert!(SizeUnit::parse_value("kb", SizeUnit::Bytes).is_err());
        assert!(SizeUnit::parse_value("-1", SizeUnit::Bytes).is_err());
        assert!(SizeUnit::parse_value("99999999 tib", SizeUnit::Bytes).is_err());
    }

    #[test]
    fn test_best_fit_prefers_binary_units() {
        assert_eq!(SizeUnit::format(1024), "1 kib");
        assert_eq!(SizeUnit::format(1 << 30), "1 gib");
        assert_eq!(SizeUnit::format(1_000_000), "1 mb");
        assert_eq!(SizeUnit::format(1500), "1500 b");
        assert_eq!(SizeUnit::format(0), "0 b");
    }

    #[test]
    fn test_duration_parse_quantity() {
        assert_eq!(
            DurationUnit::parse_quantity("5", DurationUnit::Seconds),
            Ok((5, DurationUnit::Seconds))
        );
        assert_eq!(
            DurationUnit::parse_quantity("250 ms", DurationUnit::Seconds),
            Ok((250, DurationUnit::Milliseconds))
        );
        assert_eq!(
            DurationUnit::parse_quantity("2 hours", DurationUnit::Seconds),
            Ok((2, DurationUnit::Hours))
        );
        assert!(DurationUnit::parse_quantity("2 fortnights", DurationUnit::Seconds).is_err());
    }
}
