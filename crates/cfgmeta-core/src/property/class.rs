use super::{ValueIssue, ValueSyntax};
use crate::context::AdminContext;
use crate::errors::{ConfigError, Result};
use std::cmp::Ordering;

fn is_identifier(segment: &str, allow_leading_digit: bool) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        Some(c) if allow_leading_digit && (c.is_ascii_digit() || c == '_') => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Structural check of a fully qualified class name: dot-separated
/// identifiers, optionally followed by `$Nested` parts.
pub fn is_valid_class_name(name: &str) -> bool {
    let mut parts = name.split('$');
    let Some(qualified) = parts.next() else {
        return false;
    };
    qualified.split('.').all(|segment| is_identifier(segment, false))
        && parts.all(|nested| is_identifier(nested, true))
}

/// Names of implementation classes that must implement every declared
/// interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassSyntax {
    interfaces: Vec<String>,
}

impl ClassSyntax {
    pub fn builder() -> ClassSyntaxBuilder {
        ClassSyntaxBuilder::default()
    }

    pub fn instance_of(&self) -> &[String] {
        &self.interfaces
    }

    fn check_name(&self, value: &str) -> std::result::Result<(), ValueIssue> {
        if is_valid_class_name(value) {
            Ok(())
        } else {
            Err(ValueIssue::new(format!("\"{}\" is not a valid class name", value)))
        }
    }

    fn check_loadable(&self, value: &str, cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        if !cx.is_class_validation_enabled() || self.interfaces.is_empty() {
            return Ok(());
        }
        let loader = cx.class_loader().ok_or_else(|| {
            ValueIssue::new(format!(
                "class {} cannot be checked: no class loader is configured",
                value
            ))
        })?;
        for interface in &self.interfaces {
            match loader.is_assignable(value, interface) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(ValueIssue::new(format!(
                        "class {} does not implement {}",
                        value, interface
                    )))
                }
                Err(e) => return Err(ValueIssue::new(e.to_string())),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ClassSyntaxBuilder {
    interfaces: Vec<String>,
}

impl ClassSyntaxBuilder {
    /// Require values to implement `interface`.
    ///
    /// # Errors
    /// Schema error when `interface` is not a structurally valid class name.
    pub fn instance_of(mut self, interface: &str) -> Result<Self> {
        if !is_valid_class_name(interface) {
            return Err(ConfigError::schema(format!(
                "\"{}\" is not a valid interface name",
                interface
            )));
        }
        if !self.interfaces.iter().any(|i| i == interface) {
            self.interfaces.push(interface.to_string());
        }
        Ok(self)
    }

    pub fn build(self) -> ClassSyntax {
        ClassSyntax {
            interfaces: self.interfaces,
        }
    }
}

impl ValueSyntax for ClassSyntax {
    type Value = String;

    fn decode(&self, text: &str, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        let value = text.trim().to_string();
        self.validate(&value, cx)?;
        Ok(value)
    }

    fn validate(&self, value: &String, cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        self.check_name(value)?;
        self.check_loadable(value, cx)
    }

    fn encode(&self, value: &String, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.validate(value, cx)?;
        Ok(value.clone())
    }

    fn compare(&self, a: &String, b: &String) -> Ordering {
        a.cmp(b)
    }
}
