use super::{ValueIssue, ValueSyntax};
use crate::context::AdminContext;
use crate::errors::{ConfigError, Result};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A Rust enum usable as the value set of an enumeration property.
pub trait ConfigEnum: Sized + Copy + 'static {
    fn variants() -> &'static [Self];

    fn as_str(&self) -> &'static str;

    /// Case-insensitive, trimmed lookup.
    fn from_value(value: &str) -> Option<Self> {
        let wanted = value.trim();
        Self::variants()
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSyntax {
    values: Vec<String>,
    index: HashMap<String, usize>,
}

fn key(text: &str) -> String {
    text.trim().to_lowercase()
}

impl EnumSyntax {
    pub fn builder() -> EnumSyntaxBuilder {
        EnumSyntaxBuilder::default()
    }

    /// Value set taken from the variants of `E`.
    ///
    /// # Errors
    /// Schema error when `E` has no variants or two that differ only in case.
    pub fn for_enum<E: ConfigEnum>() -> Result<Self> {
        Self::builder()
            .values(E::variants().iter().map(|v| v.as_str()))?
            .build()
    }

    /// Values in declaration order, normalized.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    fn lookup(&self, text: &str) -> std::result::Result<usize, ValueIssue> {
        self.index.get(&key(text)).copied().ok_or_else(|| {
            ValueIssue::new(format!(
                "\"{}\" is not one of {}",
                text.trim(),
                self.values.join(", ")
            ))
        })
    }
}

#[derive(Debug, Default)]
pub struct EnumSyntaxBuilder {
    values: Vec<String>,
}

impl EnumSyntaxBuilder {
    /// # Errors
    /// Schema error for a blank value.
    pub fn value(mut self, value: &str) -> Result<Self> {
        let value = key(value);
        if value.is_empty() {
            return Err(ConfigError::schema("enumeration values must not be blank"));
        }
        self.values.push(value);
        Ok(self)
    }

    /// # Errors
    /// Schema error for a blank value.
    pub fn values<'a, I: IntoIterator<Item = &'a str>>(self, values: I) -> Result<Self> {
        values.into_iter().try_fold(self, |b, v| b.value(v))
    }

    /// # Errors
    /// Schema error for an empty or duplicated value set.
    pub fn build(self) -> Result<EnumSyntax> {
        if self.values.is_empty() {
            return Err(ConfigError::schema("an enumeration needs at least one value"));
        }
        let mut index = HashMap::with_capacity(self.values.len());
        for (i, value) in self.values.iter().enumerate() {
            if index.insert(value.clone(), i).is_some() {
                return Err(ConfigError::schema(format!(
                    "enumeration value \"{}\" is declared twice",
                    value
                )));
            }
        }
        Ok(EnumSyntax {
            values: self.values,
            index,
        })
    }
}

impl ValueSyntax for EnumSyntax {
    type Value = String;

    fn decode(&self, text: &str, _cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        let i = self.lookup(text)?;
        Ok(self.values[i].clone())
    }

    fn validate(&self, value: &String, _cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        self.lookup(value).map(|_| ())
    }

    fn encode(&self, value: &String, _cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        let i = self.lookup(value)?;
        Ok(self.values[i].clone())
    }

    fn normalize(&self, value: &String, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.encode(value, cx)
    }

    /// Declaration order; unknown values sort last.
    fn compare(&self, a: &String, b: &String) -> Ordering {
        let position = |v: &String| self.index.get(&key(v)).copied().unwrap_or(usize::MAX);
        position(a).cmp(&position(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum SecurityMode {
        None,
        Ssl,
        StartTls,
    }

    impl ConfigEnum for SecurityMode {
        fn variants() -> &'static [Self] {
            &[SecurityMode::None, SecurityMode::Ssl, SecurityMode::StartTls]
        }

        fn as_str(&self) -> &'static str {
            match self {
                SecurityMode::None => "none",
                SecurityMode::Ssl => "ssl",
                SecurityMode::StartTls => "start-tls",
            }
        }
    }

    #[test]
    fn test_lookup_is_trimmed_and_case_insensitive() {
        let cx = AdminContext::client();
        let syntax = EnumSyntax::builder()
            .values(["active", "inactive"])
            .unwrap()
            .build()
            .unwrap();
        for text in ["ACTIVE", " active ", "Active"] {
            assert_eq!(syntax.decode(text, &cx).unwrap(), "active");
        }
        assert!(syntax.decode("dormant", &cx).is_err());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let cx = AdminContext::client();
        let syntax = EnumSyntax::for_enum::<SecurityMode>().unwrap();
        let once = syntax.normalize(&" Start-TLS".to_string(), &cx).unwrap();
        let twice = syntax.normalize(&once, &cx).unwrap();
        assert_eq!(once, "start-tls");
        assert_eq!(once, twice);
        assert_eq!(SecurityMode::from_value(" SSL "), Some(SecurityMode::Ssl));
    }

    #[test]
    fn test_compare_follows_declaration_order() {
        let syntax = EnumSyntax::for_enum::<SecurityMode>().unwrap();
        assert_eq!(
            syntax.compare(&"start-tls".to_string(), &"none".to_string()),
            Ordering::Greater
        );
    }

    #[test]
    fn test_builder_rejects_empty_and_duplicate_sets() {
        assert!(EnumSyntax::builder().build().is_err());
        assert!(EnumSyntax::builder()
            .values(["a", "A"])
            .unwrap()
            .build()
            .is_err());
        assert!(EnumSyntax::builder().value("  ").is_err());
    }
}
