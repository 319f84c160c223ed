//! Reason messages
//!
//! Constraint handlers and help generators report their findings as
//! `Message` values: a stable code that tooling can match on, plus the
//! rendered text shown to an administrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A coded, rendered reason
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    code: String,
    text: String,
}

impl Message {
    /// Create a message from a code and its rendered text
    pub fn new(code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            text: text.into(),
        }
    }

    /// Stable code, e.g. `ERR_SERVER_REFINT_DANGLING_REFERENCE`
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Rendered text
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_accessors() {
        let msg = Message::new("ERR_X", "something went wrong");
        assert_eq!(msg.code(), "ERR_X");
        assert_eq!(msg.text(), "something went wrong");
        assert_eq!(msg.to_string(), "something went wrong");
    }

    #[test]
    fn test_serialization() {
        let msg = Message::new("ERR_X", "text");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }
}
