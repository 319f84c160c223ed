use super::{ValueIssue, ValueSyntax};
use crate::context::AdminContext;
use crate::dn::Dn;
use std::cmp::Ordering;

/// Distinguished names, optionally restricted to the immediate children of a
/// base DN.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DnSyntax {
    base_dn: Option<Dn>,
}

impl DnSyntax {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dn(base_dn: Dn) -> Self {
        Self {
            base_dn: Some(base_dn),
        }
    }

    pub fn base_dn(&self) -> Option<&Dn> {
        self.base_dn.as_ref()
    }
}

impl ValueSyntax for DnSyntax {
    type Value = Dn;

    fn decode(&self, text: &str, cx: &AdminContext) -> std::result::Result<Dn, ValueIssue> {
        let dn = Dn::parse(text).map_err(|e| ValueIssue::new(e.to_string()))?;
        self.validate(&dn, cx)?;
        Ok(dn)
    }

    fn validate(&self, value: &Dn, _cx: &AdminContext) -> std::result::Result<(), ValueIssue> {
        let Some(base) = &self.base_dn else {
            return Ok(());
        };
        match value.parent() {
            Some(parent) if &parent == base => Ok(()),
            _ => Err(ValueIssue::new(format!(
                "\"{}\" is not an immediate child of \"{}\"",
                value, base
            ))),
        }
    }

    fn encode(&self, value: &Dn, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.validate(value, cx)?;
        Ok(value.to_string())
    }

    fn normalize(&self, value: &Dn, cx: &AdminContext) -> std::result::Result<String, ValueIssue> {
        self.validate(value, cx)?;
        Ok(value.normalized())
    }

    fn compare(&self, a: &Dn, b: &Dn) -> Ordering {
        a.normalized().cmp(&b.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_dn_requires_immediate_child() {
        let cx = AdminContext::client();
        let syntax = DnSyntax::with_base_dn(Dn::parse("cn=Schema Providers,cn=config").unwrap());
        assert!(syntax
            .decode("cn=Core Schema,cn=schema providers,CN=config", &cx)
            .is_ok());
        assert!(syntax.decode("cn=config", &cx).is_err());
        assert!(syntax
            .decode("cn=x,cn=Core Schema,cn=Schema Providers,cn=config", &cx)
            .is_err());
    }

    #[test]
    fn test_normalize_and_compare() {
        let cx = AdminContext::client();
        let syntax = DnSyntax::new();
        let a = syntax.decode("CN=Directory  Manager, cn=Root DNs,cn=config", &cx).unwrap();
        let b = syntax.decode("cn=directory manager,cn=root dns,cn=config", &cx).unwrap();
        assert_eq!(syntax.normalize(&a, &cx), syntax.normalize(&b, &cx));
        assert_eq!(syntax.compare(&a, &b), Ordering::Equal);
        assert!(syntax.decode("cn", &cx).is_err());
    }
}
