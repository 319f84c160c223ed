use super::integer::Bounds;
use super::units::SizeUnit;
use super::{ValueIssue, ValueSyntax};
use crate::context::AdminContext;
use crate::errors::Result;
use std::cmp::Ordering;

/// Byte quantities written with an optional unit (`512`, `10 mb`, `2 gib`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SizeSyntax {
    bounds: Bounds,
}

impl SizeSyntax {
    pub fn builder() -> SizeSyntaxBuilder {
        SizeSyntaxBuilder::default()
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
pub struct SizeSyntaxBuilder {
    bounds: Bounds,
}

impl SizeSyntaxBuilder {
    /// Lower limit in bytes.
    ///
    /// # Errors
    /// Schema error for a negative limit or one above the upper limit.
    pub fn lower_limit(mut self, bytes: i64) -> Result<Self> {
        self.bounds.set_lower(bytes)?;
        Ok(self)
    }

    /// # Errors
    /// Schema error for a limit below the lower limit.
    pub fn upper_limit(mut self, bytes: i64) -> Result<Self> {
        self.bounds.set_upper(bytes)?;
        Ok(self)
    }

    pub fn allow_unlimited(mut self, allow: bool) -> Self {
        self.bounds.allow_unlimited = allow;
        self
    }

    pub fn build(self) -> SizeSyntax {
        SizeSyntax {
            bounds: self.bounds,
        }
    }
}

impl ValueSyntax for SizeSyntax {
    type Value = i64;

    fn decode(&self, text: &str, cx: &AdminContext) -> std::result::Result<i64, ValueIssue> {
        if self.bounds.is_unlimited_text(text) {
            return Ok(-1);
        }
        let value = SizeUnit::parse_value(text, SizeUnit::Bytes)?;
        self.validate(&value, cx)?;
        Ok(value)
    }

    fn validate(&self, value: &i64, _cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        self.bounds.validate(*value, SizeUnit::format)
    }

    fn encode(&self, value: &i64, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.validate(value, cx)?;
        if self.bounds.allow_unlimited && *value < 0 {
            return Ok("unlimited".to_string());
        }
        Ok(SizeUnit::format(*value))
    }

    fn compare(&self, a: &i64, b: &i64) -> Ordering {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_number_is_bytes() {
        let cx = AdminContext::client();
        let syntax = SizeSyntax::default();
        let value = syntax.decode("1024", &cx).unwrap();
        assert_eq!(value, 1024);
        let encoded = syntax.encode(&value, &cx).unwrap();
        assert_eq!(encoded, "1 kib");
        assert_eq!(syntax.decode(&encoded, &cx), Ok(1024));
    }

    #[test]
    fn test_bounds_are_checked_after_unit_conversion() {
        let cx = AdminContext::client();
        let syntax = SizeSyntax::builder()
            .lower_limit(1024)
            .unwrap()
            .upper_limit(1 << 30)
            .unwrap()
            .allow_unlimited(true)
            .build();
        assert!(syntax.decode("1 kb", &cx).is_err());
        assert_eq!(syntax.decode("1 kib", &cx), Ok(1024));
        assert!(syntax.decode("2 gib", &cx).is_err());
        assert_eq!(syntax.decode("unlimited", &cx), Ok(-1));
        assert_eq!(syntax.encode(&-1, &cx).unwrap(), "unlimited");

        let issue = syntax.decode("512", &cx).unwrap_err();
        assert!(issue.reason().contains("1 kib"));
    }
}
