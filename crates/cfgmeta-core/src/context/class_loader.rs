use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassLoadError {
    #[error("class {class_name} could not be found")]
    NotFound { class_name: String },
    #[error("class {class_name} could not be loaded: {message}")]
    Failed { class_name: String, message: String },
}

/// Answers whether an implementation class may be used where an interface is
/// expected. Supplied by the host (a plugin registry, a component factory).
pub trait ClassLoader: Send + Sync {
    /// # Errors
    /// Fails when the class cannot be located or loaded at all.
    fn is_assignable(&self, class_name: &str, interface: &str) -> Result<bool, ClassLoadError>;
}

/// Fixed table of classes and the interfaces each implements.
#[derive(Debug, Clone, Default)]
pub struct StaticClassRegistry {
    classes: HashMap<String, BTreeSet<String>>,
}

impl StaticClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<I, S>(mut self, class_name: &str, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes
            .entry(class_name.to_string())
            .or_default()
            .extend(interfaces.into_iter().map(Into::into));
        self
    }
}

impl ClassLoader for StaticClassRegistry {
    fn is_assignable(&self, class_name: &str, interface: &str) -> Result<bool, ClassLoadError> {
        let interfaces = self
            .classes
            .get(class_name)
            .ok_or_else(|| ClassLoadError::NotFound {
                class_name: class_name.to_string(),
            })?;
        Ok(class_name == interface || interfaces.contains(interface))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_registry_assignability() {
        let registry = StaticClassRegistry::new().register(
            "org.example.JmxAlertHandler",
            ["org.example.AlertHandler"],
        );
        assert_eq!(
            registry.is_assignable("org.example.JmxAlertHandler", "org.example.AlertHandler"),
            Ok(true)
        );
        assert_eq!(
            registry.is_assignable("org.example.JmxAlertHandler", "org.example.Backend"),
            Ok(false)
        );
        assert!(matches!(
            registry.is_assignable("org.example.Missing", "org.example.AlertHandler"),
            Err(ClassLoadError::NotFound { .. })
        ));
    }
}
