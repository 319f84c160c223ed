//! Engine configuration loaded from TOML.
//!
//! ```toml
//! [logging]
//! profile = "production"
//!
//! [admin]
//! class_validation = true
//! locale = "en"
//!
//! [ldap]
//! root_dn = "cn=config"
//! naming_attribute = "cn"
//!
//! [ldap.relation_rdns]
//! connection-handler = "cn=Connection Handlers"
//! ```

use crate::errors::{ConfigError, Result};
use crate::logging_facility::Profile;
use crate::path::LdapProfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
    pub ldap: LdapConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub class_validation: bool,
    pub locale: String,
    pub message_catalog: Option<PathBuf>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            class_validation: false,
            locale: "en".to_string(),
            message_catalog: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LdapConfig {
    pub root_dn: String,
    pub naming_attribute: String,
    pub relation_rdns: BTreeMap<String, String>,
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            root_dn: "cn=config".to_string(),
            naming_attribute: "cn".to_string(),
            relation_rdns: BTreeMap::new(),
        }
    }
}

impl LdapConfig {
    /// # Errors
    /// Fails when the root DN or an RDN override does not parse.
    pub fn to_profile(&self) -> Result<LdapProfile> {
        LdapProfile::from_parts(&self.root_dn, &self.naming_attribute, &self.relation_rdns)
    }
}

impl EngineConfig {
    /// # Errors
    /// Fails on malformed TOML or unknown value types.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// # Errors
    /// Fails when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidConfiguration {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AdminContext;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.ldap.root_dn, "cn=config");
        assert_eq!(config.admin.locale, "en");
    }

    #[test]
    fn test_full_document() {
        let config = EngineConfig::from_toml_str(
            r#"
[logging]
profile = "production"

[admin]
class_validation = true
locale = "fr"

[ldap]
root_dn = "cn=admin data"

[ldap.relation_rdns]
connection-handler = "cn=Connection Handlers"
"#,
        )
        .unwrap();

        assert_eq!(config.logging.profile, Profile::Production);
        let cx = AdminContext::from_config(&config).unwrap();
        assert!(cx.is_class_validation_enabled());
        assert_eq!(cx.locale(), "fr");
        assert_eq!(cx.ldap_profile().root_dn().to_string(), "cn=admin data");
    }

    #[test]
    fn test_invalid_root_dn_is_reported() {
        let config = EngineConfig::from_toml_str("[ldap]\nroot_dn = \"config\"").unwrap();
        let err = AdminContext::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration { .. }));
    }
}
