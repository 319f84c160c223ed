use super::{ValueIssue, ValueSyntax};
use crate::context::AdminContext;
use crate::errors::{ConfigError, Result};
use regex::Regex;
use std::cmp::Ordering;

/// Free text, optionally constrained to a whole-value pattern.
#[derive(Debug, Clone, Default)]
pub struct StringSyntax {
    pattern: Option<(Regex, String)>,
    case_insensitive: bool,
}

impl PartialEq for StringSyntax {
    fn eq(&self, other: &Self) -> bool {
        self.case_insensitive == other.case_insensitive
            && self.pattern() == other.pattern()
    }
}

impl StringSyntax {
    pub fn builder() -> StringSyntaxBuilder {
        StringSyntaxBuilder::default()
    }

    /// Pattern source and its usage text.
    pub fn pattern(&self) -> Option<(&str, &str)> {
        self.pattern.as_ref().map(|(regex, usage)| {
            let source = regex.as_str();
            let inner = source
                .strip_prefix("^(?:")
                .and_then(|s| s.strip_suffix(")$"))
                .unwrap_or(source);
            (inner, usage.as_str())
        })
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

#[derive(Debug, Default)]
pub struct StringSyntaxBuilder {
    pattern: Option<(Regex, String)>,
    case_insensitive: bool,
}

impl StringSyntaxBuilder {
    /// The whole value must match `pattern`; `usage` names the expected
    /// form in usage strings.
    ///
    /// # Errors
    /// Schema error when the pattern does not compile.
    pub fn pattern(mut self, pattern: &str, usage: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            ConfigError::schema(format!("invalid string pattern \"{}\": {}", pattern, e))
        })?;
        self.pattern = Some((regex, usage.to_string()));
        Ok(self)
    }

    pub fn case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn build(self) -> StringSyntax {
        StringSyntax {
            pattern: self.pattern,
            case_insensitive: self.case_insensitive,
        }
    }
}

impl ValueSyntax for StringSyntax {
    type Value = String;

    fn decode(&self, text: &str, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        let value = text.to_string();
        self.validate(&value, cx)?;
        Ok(value)
    }

    fn validate(&self, value: &String, _cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        if let Some((regex, usage)) = &self.pattern {
            if !regex.is_match(value) {
                return Err(ValueIssue::new(format!(
                    "\"{}\" does not match the expected form {}",
                    value, usage
                )));
            }
        }
        Ok(())
    }

    fn encode(&self, value: &String, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.validate(value, cx)?;
        Ok(value.clone())
    }

    fn normalize(&self, value: &String, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.validate(value, cx)?;
        let trimmed = value.trim();
        if self.case_insensitive {
            Ok(trimmed.to_lowercase())
        } else {
            Ok(trimmed.to_string())
        }
    }

    fn compare(&self, a: &String, b: &String) -> Ordering {
        if self.case_insensitive {
            a.to_lowercase().cmp(&b.to_lowercase())
        } else {
            a.cmp(b)
        }
    }
}
