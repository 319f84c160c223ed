#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use cfgmeta_core::context::StaticClassRegistry;
use cfgmeta_core::definition::DecodingReason;
use cfgmeta_core::errors::ConfigError;
use cfgmeta_core::property::PropertyUsageBuilder;
use cfgmeta_core::{AdminContext, ExError, ExErrorKind, PropertyValue};
use common::{builder, tree};
use std::sync::Arc;

#[test]
fn test_properties_are_inherited_down_the_tree() {
    let tree = tree();

    let names: Vec<&str> = tree
        .all_property_definitions("ldap-connection-handler")
        .unwrap()
        .into_iter()
        .map(|pd| pd.name())
        .collect();

    assert!(names.contains(&"enabled"));
    assert!(names.contains(&"listen-port"));
    assert!(names.contains(&"key-manager-provider"));
    assert!(tree.get("ldap-connection-handler").unwrap().properties().is_empty());
    assert!(matches!(
        tree.property_definition("key-manager-provider", "listen-port"),
        Err(ConfigError::PropertyNotFound { .. })
    ));
}

#[test]
fn test_constraints_collect_from_lineage() {
    let tree = tree();

    let ldap: Vec<&str> = tree
        .all_constraints("ldap-connection-handler")
        .unwrap()
        .into_iter()
        .map(|c| c.name())
        .collect();
    let jmx = tree.all_constraints("jmx-connection-handler").unwrap();

    assert_eq!(ldap.len(), 2);
    assert!(ldap.contains(&"port-when-enabled"));
    assert_eq!(jmx.len(), 1);
}

#[test]
fn test_resolution_from_tags() {
    let tree = tree();

    let resolved = tree.resolve_from_tags("connection-handler", &["ldap"]).unwrap();
    assert_eq!(resolved.name(), "ldap-connection-handler");

    let err = tree.resolve_from_tags("connection-handler", &["snmp"]).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::DefinitionDecoding {
            reason: DecodingReason::WrongTypeInformation,
            ..
        }
    ));

    let err = tree
        .resolve_from_tags::<&str>("connection-handler", &[])
        .unwrap_err();
    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::NoTypeInformation);
}

#[test]
fn test_path_parsing_checks_types() {
    let tree = tree();

    let path = tree
        .parse_path("/relation=connection-handler+type=ldap-connection-handler+name=LDAP")
        .unwrap();
    assert_eq!(path.definition_name(), "ldap-connection-handler");
    assert_eq!(path.name(), Some("LDAP"));
    assert_eq!(
        path.to_dn(AdminContext::client().ldap_profile()).to_string(),
        "cn=LDAP,cn=connection-handlers,cn=config"
    );

    assert!(matches!(
        tree.parse_path("/relation=connection-handler+type=backend+name=x"),
        Err(ConfigError::InvalidPath { .. })
    ));
    assert!(tree.parse_path("/relation=no-such-relation").is_err());
}

#[test]
fn test_usage_strings() {
    let tree = tree();
    let mut detailed = PropertyUsageBuilder::detailed();
    let mut brief = PropertyUsageBuilder::brief();

    let port = tree.property_definition("connection-handler", "listen-port").unwrap();
    assert_eq!(detailed.usage(port).unwrap(), "1 <= INTEGER <= 65535");
    assert_eq!(brief.usage(port).unwrap(), "INTEGER");

    let limit = tree.property_definition("global-configuration", "size-limit").unwrap();
    assert_eq!(detailed.usage(limit).unwrap(), "INTEGER | unlimited");

    let class = tree.property_definition("connection-handler", "java-class").unwrap();
    assert_eq!(detailed.usage(class).unwrap(), "CLASS <= org.example.ConnectionHandler");
}

#[test]
fn test_class_validation_follows_context() {
    let tree = tree();
    let pd = tree.property_definition("connection-handler", "java-class").unwrap();
    let registry = StaticClassRegistry::new()
        .register("org.example.LdapHandler", ["org.example.ConnectionHandler"])
        .register("org.example.Backend", Vec::<String>::new());
    let server = AdminContext::server(Arc::new(registry));
    let client = AdminContext::client();

    assert_eq!(
        pd.decode_value("org.example.LdapHandler", &server).unwrap(),
        PropertyValue::Class("org.example.LdapHandler".to_string())
    );
    assert!(pd.decode_value("org.example.Backend", &server).is_err());
    assert!(pd.decode_value("org.example.Backend", &client).is_ok());
    assert!(pd.decode_value("not a class", &client).unwrap_err().is_value_error());
}

#[test]
fn test_constraint_on_unknown_property_fails_build() {
    let mut b = builder();
    b.register_constraint(
        "backend",
        cfgmeta_core::GenericConstraint::constraint(
            "backend",
            "needs-writability",
            cfgmeta_core::Condition::is_present("writability-mode"),
        ),
    )
    .unwrap();

    assert!(b.build().is_err());
}
