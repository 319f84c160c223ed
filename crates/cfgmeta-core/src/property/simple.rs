use super::{ValueIssue, ValueSyntax};
use crate::context::AdminContext;
use std::cmp::Ordering;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BooleanSyntax;

impl ValueSyntax for BooleanSyntax {
    type Value = bool;

    fn decode(&self, text: &str, _cx: &AdminContext) -> std::result::Result<bool, ValueIssue> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            other => Err(ValueIssue::new(format!("\"{}\" is not a boolean", other))),
        }
    }

    fn validate(&self, _value: &bool, _cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        Ok(())
    }

    fn encode(&self, value: &bool, _cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        Ok(value.to_string())
    }

    fn compare(&self, a: &bool, b: &bool) -> Ordering {
        a.cmp(b)
    }
}

/// IPv4 or IPv6 literals. Host names are refused since nothing here resolves
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IpAddressSyntax;

impl ValueSyntax for IpAddressSyntax {
    type Value = IpAddr;

    fn decode(&self, text: &str, _cx: &AdminContext) -> std::result::Result<IpAddr, ValueIssue> {
        let text = text.trim();
        let literal = text
            .strip_prefix('[')
            .and_then(|t| t.strip_suffix(']'))
            .unwrap_or(text);
        literal
            .parse::<IpAddr>()
            .map_err(|_| ValueIssue::new(format!("\"{}\" is not an IP address", text)))
    }

    fn validate(&self, _value: &IpAddr, _cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        Ok(())
    }

    fn encode(&self, value: &IpAddr, _cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        Ok(value.to_string())
    }

    fn compare(&self, a: &IpAddr, b: &IpAddr) -> Ordering {
        a.cmp(b)
    }
}

fn is_oid(text: &str) -> bool {
    !text.is_empty()
        && text
            .split('.')
            .all(|arc| !arc.is_empty() && arc.chars().all(|c| c.is_ascii_digit()))
}

fn is_descriptor(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ';')
}

/// Directory attribute type names or OIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributeTypeSyntax;

impl AttributeTypeSyntax {
    /// Registry name for `value`, or `value` itself without a registry.
    fn canonical(value: &str, cx: &AdminContext) -> String {
        cx.attribute_types()
            .and_then(|registry| registry.canonical_name(value))
            .unwrap_or_else(|| value.to_string())
    }
}

impl ValueSyntax for AttributeTypeSyntax {
    type Value = String;

    /// Yields the canonical name when a registry is configured.
    fn decode(&self, text: &str, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        let text = text.trim();
        self.validate(&text.to_string(), cx)?;
        Ok(Self::canonical(text, cx))
    }

    fn validate(&self, value: &String, cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        if !is_oid(value) && !is_descriptor(value) {
            return Err(ValueIssue::new(format!(
                "\"{}\" is not an attribute type name or OID",
                value
            )));
        }
        if let Some(registry) = cx.attribute_types() {
            if registry.canonical_name(value).is_none() {
                return Err(ValueIssue::new(format!(
                    "attribute type \"{}\" is not defined in the schema",
                    value
                )));
            }
        }
        Ok(())
    }

    /// Aliases and OIDs encode as the canonical name, matching `decode`.
    fn encode(&self, value: &String, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.validate(value, cx)?;
        Ok(Self::canonical(value, cx))
    }

    fn normalize(&self, value: &String, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.validate(value, cx)?;
        Ok(Self::canonical(value, cx).to_ascii_lowercase())
    }

    fn compare(&self, a: &String, b: &String) -> Ordering {
        a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase())
    }
}
