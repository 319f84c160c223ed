use super::{ValueIssue, ValueSyntax};
use crate::context::AdminContext;
use crate::errors::{ConfigError, Result};
use std::cmp::Ordering;

/// Bounds shared by the integer-valued kinds. A negative value stands for
/// "unlimited" when that is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bounds {
    pub(crate) lower: i64,
    pub(crate) upper: Option<i64>,
    pub(crate) allow_unlimited: bool,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            lower: 0,
            upper: None,
            allow_unlimited: false,
        }
    }
}

impl Bounds {
    pub(crate) fn set_lower(&mut self, lower: i64) -> Result<()> {
        if lower < 0 {
            return Err(ConfigError::schema(format!(
                "invalid lower limit {}: must not be negative",
                lower
            )));
        }
        if let Some(upper) = self.upper {
            if lower > upper {
                return Err(ConfigError::schema(format!(
                    "lower limit {} is greater than upper limit {}",
                    lower, upper
                )));
            }
        }
        self.lower = lower;
        Ok(())
    }

    pub(crate) fn set_upper(&mut self, upper: i64) -> Result<()> {
        if upper < self.lower {
            return Err(ConfigError::schema(format!(
                "upper limit {} is less than lower limit {}",
                upper, self.lower
            )));
        }
        self.upper = Some(upper);
        Ok(())
    }

    pub(crate) fn validate(&self, value: i64, render: impl Fn(i64) -> String) -> std::result::Result<(), ValueIssue> {
        if !self.allow_unlimited && value < self.lower {
            return Err(ValueIssue::new(format!(
                "{} is below the lower limit {}",
                render(value),
                render(self.lower)
            )));
        }
        // with unlimited allowed only non-negative values are range checked
        if value >= 0 && value < self.lower {
            return Err(ValueIssue::new(format!(
                "{} is below the lower limit {}",
                render(value),
                render(self.lower)
            )));
        }
        if let Some(upper) = self.upper {
            if value > upper {
                return Err(ValueIssue::new(format!(
                    "{} is above the upper limit {}",
                    render(value),
                    render(upper)
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn is_unlimited_text(&self, text: &str) -> bool {
        self.allow_unlimited && text.trim().eq_ignore_ascii_case("unlimited")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntegerSyntax {
    bounds: Bounds,
}

impl IntegerSyntax {
    pub fn builder() -> IntegerSyntaxBuilder {
        IntegerSyntaxBuilder::default()
    }

    pub fn lower_limit(&self) -> i64 {
        self.bounds.lower
    }

    pub fn upper_limit(&self) -> Option<i64> {
        self.bounds.upper
    }

    pub fn allow_unlimited(&self) -> bool {
        self.bounds.allow_unlimited
    }
}

#[derive(Debug, Default)]
pub struct IntegerSyntaxBuilder {
    bounds: Bounds,
}

impl IntegerSyntaxBuilder {
    /// # Errors
    /// Schema error for a negative limit or one above the upper limit.
    pub fn lower_limit(mut self, lower: i64) -> Result<Self> {
        self.bounds.set_lower(lower)?;
        Ok(self)
    }

    /// # Errors
    /// Schema error for a limit below the lower limit.
    pub fn upper_limit(mut self, upper: i64) -> Result<Self> {
        self.bounds.set_upper(upper)?;
        Ok(self)
    }

    pub fn allow_unlimited(mut self, allow: bool) -> Self {
        self.bounds.allow_unlimited = allow;
        self
    }

    pub fn build(self) -> IntegerSyntax {
        IntegerSyntax {
            bounds: self.bounds,
        }
    }
}

impl ValueSyntax for IntegerSyntax {
    type Value = i64;

    fn decode(&self, text: &str, cx: &AdminContext) -> std::result::Result<i64, ValueIssue> {
        if self.bounds.is_unlimited_text(text) {
            return Ok(-1);
        }
        let value = text
            .trim()
            .parse::<i64>()
            .map_err(|_| ValueIssue::new(format!("\"{}\" is not an integer", text.trim())))?;
        self.validate(&value, cx)?;
        Ok(value)
    }

    fn validate(&self, value: &i64, _cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        self.bounds.validate(*value, |v| v.to_string())
    }

    fn encode(&self, value: &i64, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.validate(value, cx)?;
        if self.bounds.allow_unlimited && *value < 0 {
            return Ok("unlimited".to_string());
        }
        Ok(value.to_string())
    }

    fn compare(&self, a: &i64, b: &i64) -> Ordering {
        a.cmp(b)
    }
}
