use super::integer::Bounds;
use super::units::DurationUnit;
use super::{ValueIssue, ValueSyntax};
use crate::context::AdminContext;
use crate::errors::{ConfigError, Result};
use std::cmp::Ordering;

/// Time spans held as a count of a base unit. Input may use any unit from
/// the base unit up to the optional maximum unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationSyntax {
    base_unit: DurationUnit,
    maximum_unit: Option<DurationUnit>,
    bounds: Bounds,
}

impl Default for DurationSyntax {
    fn default() -> Self {
        Self {
            base_unit: DurationUnit::Seconds,
            maximum_unit: None,
            bounds: Bounds::default(),
        }
    }
}

impl DurationSyntax {
    pub fn builder() -> DurationSyntaxBuilder {
        DurationSyntaxBuilder {
            syntax: Self::default(),
        }
    }

    pub fn base_unit(&self) -> DurationUnit {
        self.base_unit
    }

    pub fn maximum_unit(&self) -> Option<DurationUnit> {
        self.maximum_unit
    }

    /// Lower limit in base units.
    pub fn lower_limit(&self) -> i64 {
        self.bounds.lower
    }

    pub fn upper_limit(&self) -> Option<i64> {
        self.bounds.upper
    }

    pub fn allow_unlimited(&self) -> bool {
        self.bounds.allow_unlimited
    }

    fn render(&self, value: i64) -> String {
        format!("{} {}", value, self.base_unit.abbreviation())
    }
}

#[derive(Debug)]
pub struct DurationSyntaxBuilder {
    syntax: DurationSyntax,
}

impl DurationSyntaxBuilder {
    /// # Errors
    /// Schema error when the base unit exceeds the maximum unit.
    pub fn base_unit(mut self, unit: DurationUnit) -> Result<Self> {
        if let Some(max) = self.syntax.maximum_unit {
            if unit > max {
                return Err(ConfigError::schema(format!(
                    "base unit {} exceeds maximum unit {}",
                    unit, max
                )));
            }
        }
        self.syntax.base_unit = unit;
        Ok(self)
    }

    /// # Errors
    /// Schema error when the maximum unit is finer than the base unit.
    pub fn maximum_unit(mut self, unit: DurationUnit) -> Result<Self> {
        if unit < self.syntax.base_unit {
            return Err(ConfigError::schema(format!(
                "maximum unit {} is finer than base unit {}",
                unit, self.syntax.base_unit
            )));
        }
        self.syntax.maximum_unit = Some(unit);
        Ok(self)
    }

    /// Lower limit in base units.
    ///
    /// # Errors
    /// Schema error for a negative limit or one above the upper limit.
    pub fn lower_limit(mut self, value: i64) -> Result<Self> {
        self.syntax.bounds.set_lower(value)?;
        Ok(self)
    }

    /// # Errors
    /// Schema error for a limit below the lower limit.
    pub fn upper_limit(mut self, value: i64) -> Result<Self> {
        self.syntax.bounds.set_upper(value)?;
        Ok(self)
    }

    pub fn allow_unlimited(mut self, allow: bool) -> Self {
        self.syntax.bounds.allow_unlimited = allow;
        self
    }

    pub fn build(self) -> DurationSyntax {
        self.syntax
    }
}

impl ValueSyntax for DurationSyntax {
    type Value = i64;

    fn decode(&self, text: &str, cx: &AdminContext) -> std::result::Result<i64, ValueIssue> {
        if self.bounds.is_unlimited_text(text) {
            return Ok(-1);
        }
        let (count, unit) = DurationUnit::parse_quantity(text, self.base_unit)?;
        if let Some(max) = self.maximum_unit {
            if unit > max {
                return Err(ValueIssue::new(format!(
                    "unit {} exceeds the maximum unit {}",
                    unit, max
                )));
            }
        }
        let millis = count
            .checked_mul(unit.millis())
            .ok_or_else(|| ValueIssue::new(format!("\"{}\" is too large", text.trim())))?;
        if millis % self.base_unit.millis() != 0 {
            return Err(ValueIssue::new(format!(
                "\"{}\" is finer than the base unit {}",
                text.trim(),
                self.base_unit
            )));
        }
        let value = millis / self.base_unit.millis();
        self.validate(&value, cx)?;
        Ok(value)
    }

    fn validate(&self, value: &i64, _cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        self.bounds.validate(*value, |v| self.render(v))
    }

    fn encode(&self, value: &i64, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.validate(value, cx)?;
        if self.bounds.allow_unlimited && *value < 0 {
            return Ok("unlimited".to_string());
        }
        Ok(self.render(*value))
    }

    fn compare(&self, a: &i64, b: &i64) -> Ordering {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_round_trip() {
        let cx = AdminContext::client();
        let syntax = DurationSyntax::builder().allow_unlimited(true).build();
        let encoded = syntax.encode(&-1, &cx).unwrap();
        assert_eq!(encoded, "unlimited");
        assert_eq!(syntax.decode(&encoded, &cx), Ok(-1));
    }

    #[test]
    fn test_values_convert_into_base_unit() {
        let cx = AdminContext::client();
        let syntax = DurationSyntax::builder()
            .base_unit(DurationUnit::Seconds)
            .unwrap()
            .build();
        assert_eq!(syntax.decode("2 m", &cx), Ok(120));
        assert_eq!(syntax.decode("2000 ms", &cx), Ok(2));
        assert_eq!(syntax.decode("30", &cx), Ok(30));
        assert!(syntax.decode("1500 ms", &cx).is_err());
        assert_eq!(syntax.encode(&120, &cx).unwrap(), "120 s");
    }

    #[test]
    fn test_maximum_unit_and_bounds() {
        let cx = AdminContext::client();
        let syntax = DurationSyntax::builder()
            .base_unit(DurationUnit::Milliseconds)
            .unwrap()
            .maximum_unit(DurationUnit::Minutes)
            .unwrap()
            .lower_limit(100)
            .unwrap()
            .upper_limit(3_600_000)
            .unwrap()
            .build();
        assert!(syntax.decode("1 h", &cx).is_err());
        assert_eq!(syntax.decode("1 m", &cx), Ok(60_000));
        assert!(syntax.decode("50 ms", &cx).is_err());
        assert!(DurationSyntax::builder()
            .base_unit(DurationUnit::Minutes)
            .unwrap()
            .maximum_unit(DurationUnit::Seconds)
            .is_err());
    }
}
