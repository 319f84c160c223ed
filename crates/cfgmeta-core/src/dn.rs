//! Distinguished names.
//!
//! Only the structure the metamodel needs: parsing with RFC 4514 escapes,
//! parent/child navigation and a normalized form for equality.

use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnParseError {
    #[error("attribute-value assertion \"{0}\" has no '='")]
    MissingEquals(String),
    #[error("attribute-value assertion \"{0}\" has an empty attribute type")]
    EmptyAttribute(String),
    #[error("attribute type \"{0}\" contains illegal characters")]
    IllegalAttribute(String),
    #[error("empty RDN at position {0}")]
    EmptyRdn(usize),
    #[error("dangling escape at end of \"{0}\"")]
    DanglingEscape(String),
    #[error("invalid hex escape in \"{0}\"")]
    InvalidHexEscape(String),
}

/// One `attr=value` pair of an RDN.
#[derive(Debug, Clone)]
pub struct Ava {
    attribute: String,
    value: String,
}

impl Ava {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn normalized(&self) -> String {
        format!(
            "{}={}",
            self.attribute.to_lowercase(),
            escape_value(&normalize_value(&self.value))
        )
    }
}

/// A relative distinguished name; usually a single AVA.
#[derive(Debug, Clone)]
pub struct Rdn {
    avas: Vec<Ava>,
}

impl Rdn {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            avas: vec![Ava::new(attribute, value)],
        }
    }

    pub fn avas(&self) -> &[Ava] {
        &self.avas
    }

    /// Value of the first AVA.
    pub fn value(&self) -> &str {
        self.avas.first().map(Ava::value).unwrap_or_default()
    }

    /// Value of the AVA for `attribute`, compared case-insensitively.
    pub fn attribute_value(&self, attribute: &str) -> Option<&str> {
        self.avas
            .iter()
            .find(|a| a.attribute.eq_ignore_ascii_case(attribute))
            .map(Ava::value)
    }

    /// Normalized (unescaped) value of the first AVA.
    pub fn normalized_value(&self) -> String {
        self.avas
            .first()
            .map(|a| normalize_value(&a.value))
            .unwrap_or_default()
    }

    pub fn normalized(&self) -> String {
        let mut parts: Vec<String> = self.avas.iter().map(Ava::normalized).collect();
        parts.sort();
        parts.join("+")
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ava) in self.avas.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{}={}", ava.attribute, escape_value(&ava.value))?;
        }
        Ok(())
    }
}

impl PartialEq for Rdn {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Rdn {}

/// A distinguished name. RDNs are held most-specific first, as written.
#[derive(Debug, Clone, Default)]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    /// The empty (root) DN.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, DnParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::root());
        }
        let mut rdns = Vec::new();
        for (position, rdn_text) in split_unescaped(text, &[',', ';'])?.into_iter().enumerate() {
            if rdn_text.trim().is_empty() {
                return Err(DnParseError::EmptyRdn(position));
            }
            let mut avas = Vec::new();
            for ava_text in split_unescaped(&rdn_text, &['+'])? {
                avas.push(parse_ava(&ava_text)?);
            }
            rdns.push(Rdn { avas });
        }
        Ok(Self { rdns })
    }

    pub fn is_root(&self) -> bool {
        self.rdns.is_empty()
    }

    pub fn size(&self) -> usize {
        self.rdns.len()
    }

    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// Most specific RDN, `None` for the root DN.
    pub fn rdn(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    /// Immediate parent, `None` for the root DN.
    pub fn parent(&self) -> Option<Dn> {
        if self.rdns.is_empty() {
            return None;
        }
        Some(Dn {
            rdns: self.rdns[1..].to_vec(),
        })
    }

    /// New DN one level below this one.
    pub fn child(&self, rdn: Rdn) -> Dn {
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(rdn);
        rdns.extend(self.rdns.iter().cloned());
        Dn { rdns }
    }

    /// New DN formed by placing `local` (a relative sequence) below this one.
    pub fn child_dn(&self, local: &Dn) -> Dn {
        let mut rdns = local.rdns.clone();
        rdns.extend(self.rdns.iter().cloned());
        Dn { rdns }
    }

    pub fn is_descendant_of(&self, ancestor: &Dn) -> bool {
        self.rdns.len() >= ancestor.rdns.len()
            && self.rdns[self.rdns.len() - ancestor.rdns.len()..]
                .iter()
                .zip(ancestor.rdns.iter())
                .all(|(a, b)| a == b)
    }

    pub fn normalized(&self) -> String {
        self.rdns
            .iter()
            .map(Rdn::normalized)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", rdn)?;
        }
        Ok(())
    }
}

impl PartialEq for Dn {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

impl Eq for Dn {}

impl Hash for Dn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl std::str::FromStr for Dn {
    type Err = DnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dn::parse(s)
    }
}

fn parse_ava(text: &str) -> Result<Ava, DnParseError> {
    let (attribute, raw_value) = match find_unescaped(text, '=') {
        Some(i) => (&text[..i], &text[i + 1..]),
        None => return Err(DnParseError::MissingEquals(text.to_string())),
    };
    let attribute = attribute.trim();
    if attribute.is_empty() {
        return Err(DnParseError::EmptyAttribute(text.to_string()));
    }
    if !attribute
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == ';')
    {
        return Err(DnParseError::IllegalAttribute(attribute.to_string()));
    }
    Ok(Ava::new(attribute, unescape_value(raw_value.trim())?))
}

fn find_unescaped(text: &str, target: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == target {
            return Some(i);
        }
    }
    None
}

fn split_unescaped(text: &str, separators: &[char]) -> Result<Vec<String>, DnParseError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if separators.contains(&c) {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if escaped {
        return Err(DnParseError::DanglingEscape(text.to_string()));
    }
    parts.push(current);
    Ok(parts)
}

fn unescape_value(text: &str) -> Result<String, DnParseError> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let Some(next) = chars.next() else {
            return Err(DnParseError::DanglingEscape(text.to_string()));
        };
        if next.is_ascii_hexdigit() {
            let low = chars
                .next()
                .filter(char::is_ascii_hexdigit)
                .ok_or_else(|| DnParseError::InvalidHexEscape(text.to_string()))?;
            let pair: String = [next, low].iter().collect();
            let byte = u8::from_str_radix(&pair, 16)
                .map_err(|_| DnParseError::InvalidHexEscape(text.to_string()))?;
            bytes.push(byte);
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(next.encode_utf8(&mut buf).as_bytes());
        }
    }
    String::from_utf8(bytes).map_err(|_| DnParseError::InvalidHexEscape(text.to_string()))
}

fn normalize_value(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        let needs_escape = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
            || (i == 0 && (c == ' ' || c == '#'))
            || (i == last && c == ' ');
        if needs_escape {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_navigate() {
        let dn = Dn::parse("cn=LDAP Connection Handler,cn=Connection Handlers,cn=config").unwrap();
        assert_eq!(dn.size(), 3);
        assert_eq!(dn.rdn().unwrap().value(), "LDAP Connection Handler");

        let parent = dn.parent().unwrap();
        assert_eq!(parent, Dn::parse("CN=connection handlers, cn=CONFIG").unwrap());
        assert!(dn.is_descendant_of(&Dn::parse("cn=config").unwrap()));
        assert_eq!(Dn::root().parent(), None);
    }

    #[test]
    fn test_escaped_separators_stay_in_value() {
        let dn = Dn::parse(r"cn=a\,b,cn=config").unwrap();
        assert_eq!(dn.size(), 2);
        assert_eq!(dn.rdn().unwrap().value(), "a,b");
        assert_eq!(dn.to_string(), r"cn=a\,b,cn=config");

        let hex = Dn::parse(r"cn=caf\C3\A9").unwrap();
        assert_eq!(hex.rdn().unwrap().value(), "café");
    }

    #[test]
    fn test_multi_valued_rdn_normalizes_order() {
        let a = Dn::parse("cn=x+uid=y,o=org").unwrap();
        let b = Dn::parse("UID=Y+CN=X,o=org").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.rdn().unwrap().attribute_value("uid"), Some("y"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Dn::parse("config"), Err(DnParseError::MissingEquals(_))));
        assert!(matches!(Dn::parse("=x"), Err(DnParseError::EmptyAttribute(_))));
        assert!(matches!(Dn::parse("cn=a,,cn=b"), Err(DnParseError::EmptyRdn(1))));
        assert!(matches!(Dn::parse(r"cn=a\"), Err(DnParseError::DanglingEscape(_))));
        assert!(matches!(Dn::parse("c n=a"), Err(DnParseError::IllegalAttribute(_))));
    }

    #[test]
    fn test_child_dn_prepends_local_sequence() {
        let base = Dn::parse("cn=config").unwrap();
        let local = Dn::parse("cn=Key Manager Providers").unwrap();
        let dn = base.child_dn(&local).child(Rdn::new("cn", "JKS"));
        assert_eq!(dn.to_string(), "cn=JKS,cn=Key Manager Providers,cn=config");
    }
}
