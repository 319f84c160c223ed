//! Shared fixtures: a small directory server configuration model.
//!
//! root
//!   connection-handler (abstract)      enabled, listen-port, java-class, key-manager-provider
//!     ldap-connection-handler          tag "ldap"
//!     jmx-connection-handler           tag "jmx"
//!   key-manager-provider               enabled
//!     file-key-manager-provider        key-store-file, tag "file"
//!   global-configuration (singleton)   size-limit
//!   backend                            entry-limit, base-dn
//!     index                            index-entry-limit (inherits backend entry-limit)

#![allow(dead_code)]

use cfgmeta_core::conditions::Condition;
use cfgmeta_core::definition::{DefinitionTree, DefinitionTreeBuilder};
use cfgmeta_core::management::{CandidateObject, MemoryContext};
use cfgmeta_core::path::ManagedObjectPath;
use cfgmeta_core::property::{
    AggregationSyntax, BooleanSyntax, ClassSyntax, IntegerSyntax, PropertyDefinition, PropertyOption,
    StringSyntax,
};
use cfgmeta_core::relation::RelationDefinition;
use cfgmeta_core::{DefaultBehavior, GenericConstraint};

pub fn enabled(owner: &str) -> PropertyDefinition {
    PropertyDefinition::builder(owner, "enabled")
        .option(PropertyOption::Mandatory)
        .syntax(BooleanSyntax)
        .build()
        .unwrap()
}

pub fn builder() -> DefinitionTreeBuilder {
    let mut b = DefinitionTreeBuilder::new("root");
    b.define_abstract("connection-handler", "root").unwrap();
    b.define("ldap-connection-handler", "connection-handler").unwrap();
    b.define("jmx-connection-handler", "connection-handler").unwrap();
    b.define("key-manager-provider", "root").unwrap();
    b.define("file-key-manager-provider", "key-manager-provider").unwrap();
    b.define("global-configuration", "root").unwrap();
    b.define("backend", "root").unwrap();
    b.define("index", "root").unwrap();
    b.tag("ldap-connection-handler", "ldap").unwrap();
    b.tag("jmx-connection-handler", "jmx").unwrap();
    b.tag("file-key-manager-provider", "file").unwrap();

    b.register_property(enabled("connection-handler")).unwrap();
    b.register_property(enabled("key-manager-provider")).unwrap();
    b.register_property(
        PropertyDefinition::builder("file-key-manager-provider", "key-store-file")
            .syntax(StringSyntax::builder().build())
            .build()
            .unwrap(),
    )
    .unwrap();
    b.register_property(
        PropertyDefinition::builder("connection-handler", "listen-port")
            .syntax(
                IntegerSyntax::builder()
                    .lower_limit(1)
                    .unwrap()
                    .upper_limit(65535)
                    .unwrap()
                    .build(),
            )
            .build()
            .unwrap(),
    )
    .unwrap();
    b.register_property(
        PropertyDefinition::builder("connection-handler", "java-class")
            .syntax(
                ClassSyntax::builder()
                    .instance_of("org.example.ConnectionHandler")
                    .unwrap()
                    .build(),
            )
            .build()
            .unwrap(),
    )
    .unwrap();
    b.register_property(
        PropertyDefinition::builder("connection-handler", "key-manager-provider")
            .syntax(
                AggregationSyntax::builder("key-manager-provider", "key-manager-provider")
                    .target_needs_enabling(Condition::contains("enabled", "true"))
                    .target_is_enabled(Condition::contains("enabled", "true"))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap(),
    )
    .unwrap();
    b.register_property(
        PropertyDefinition::builder("global-configuration", "size-limit")
            .syntax(IntegerSyntax::builder().allow_unlimited(true).build())
            .default_behavior(DefaultBehavior::defined(["1000"]))
            .build()
            .unwrap(),
    )
    .unwrap();
    b.register_property(
        PropertyDefinition::builder("backend", "entry-limit")
            .syntax(IntegerSyntax::default())
            .default_behavior(DefaultBehavior::absolute_inherited(
                "/relation=global-configuration",
                "size-limit",
            ))
            .build()
            .unwrap(),
    )
    .unwrap();
    b.register_property(
        PropertyDefinition::builder("index", "index-entry-limit")
            .syntax(IntegerSyntax::default())
            .default_behavior(DefaultBehavior::relative_inherited(1, "backend", "entry-limit"))
            .build()
            .unwrap(),
    )
    .unwrap();

    b.register_relation(
        RelationDefinition::instantiable("root", "connection-handler", "connection-handler")
            .plural_name("connection-handlers")
            .build()
            .unwrap(),
    )
    .unwrap();
    b.register_relation(
        RelationDefinition::instantiable("root", "key-manager-provider", "key-manager-provider")
            .plural_name("key-manager-providers")
            .build()
            .unwrap(),
    )
    .unwrap();
    b.register_relation(
        RelationDefinition::singleton("root", "global-configuration", "global-configuration")
            .build()
            .unwrap(),
    )
    .unwrap();
    b.register_relation(
        RelationDefinition::instantiable("root", "backend", "backend")
            .plural_name("backends")
            .build()
            .unwrap(),
    )
    .unwrap();
    b.register_relation(
        RelationDefinition::instantiable("backend", "index", "index")
            .plural_name("indexes")
            .build()
            .unwrap(),
    )
    .unwrap();

    b.register_constraint(
        "ldap-connection-handler",
        GenericConstraint::constraint(
            "ldap-connection-handler",
            "port-when-enabled",
            Condition::or([
                Condition::not(Condition::contains("enabled", "true")),
                Condition::is_present("listen-port"),
            ]),
        ),
    )
    .unwrap();
    b
}

pub fn tree() -> DefinitionTree {
    builder().build().unwrap()
}

pub fn handler_path(tree: &DefinitionTree, definition: &str, name: &str) -> ManagedObjectPath {
    let relation = tree.relation_definition("root", "connection-handler").unwrap();
    tree.root_path()
        .child_of_type(relation, definition, Some(name))
        .unwrap()
}

pub fn provider_path(tree: &DefinitionTree, name: &str) -> ManagedObjectPath {
    let relation = tree.relation_definition("root", "key-manager-provider").unwrap();
    tree.root_path().child_instantiable(relation, name).unwrap()
}

pub fn provider(tree: &DefinitionTree, name: &str, enabled: bool) -> CandidateObject {
    CandidateObject::new(provider_path(tree, name)).with_values("enabled", [enabled.to_string()])
}

/// Provider stored under the `file-key-manager-provider` sub-type.
pub fn file_provider(tree: &DefinitionTree, name: &str, enabled: bool) -> CandidateObject {
    let relation = tree.relation_definition("root", "key-manager-provider").unwrap();
    let path = tree
        .root_path()
        .child_of_type(relation, "file-key-manager-provider", Some(name))
        .unwrap();
    CandidateObject::new(path)
        .with_values("enabled", [enabled.to_string()])
        .with_values("key-store-file", ["config/keystore"])
}

pub fn ldap_handler(tree: &DefinitionTree, name: &str, enabled: bool, provider: Option<&str>) -> CandidateObject {
    let mut handler = CandidateObject::new(handler_path(tree, "ldap-connection-handler", name))
        .with_values("enabled", [enabled.to_string()])
        .with_values("listen-port", ["389"]);
    if let Some(provider) = provider {
        handler.set_values("key-manager-provider", [provider]);
    }
    handler
}

/// Two providers, one enabled, plus one LDAP handler using the enabled one.
pub fn populated_context(tree: &DefinitionTree) -> MemoryContext {
    MemoryContext::new()
        .with_object(provider(tree, "JKS", true))
        .with_object(provider(tree, "PKCS12", false))
        .with_object(ldap_handler(tree, "LDAPS", true, Some("JKS")))
}
