#![allow(clippy::unwrap_used, clippy::expect_used)]

use cfgmeta_core::property::{
    DurationSyntax, DurationUnit, IntegerSyntax, PropertyDefinition, PropertyOption, SizeSyntax,
};
use cfgmeta_core::{AdminContext, PropertyValue};
use proptest::prelude::*;

fn size_limit() -> PropertyDefinition {
    PropertyDefinition::builder("backend", "db-cache-size")
        .syntax(SizeSyntax::builder().allow_unlimited(true).build())
        .build()
        .unwrap()
}

fn port() -> PropertyDefinition {
    PropertyDefinition::builder("connection-handler", "listen-port")
        .option(PropertyOption::Mandatory)
        .syntax(
            IntegerSyntax::builder()
                .lower_limit(1)
                .unwrap()
                .upper_limit(65535)
                .unwrap()
                .build(),
        )
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_sizes_survive_encoding(bytes in 0i64..(1i64 << 50)) {
        let cx = AdminContext::client();
        let pd = size_limit();
        let text = pd.encode_value(&PropertyValue::Size(bytes), &cx).unwrap();
        prop_assert_eq!(pd.decode_value(&text, &cx).unwrap(), PropertyValue::Size(bytes));
    }

    #[test]
    fn prop_ports_inside_bounds_decode(port_number in 1i64..=65535) {
        let cx = AdminContext::client();
        let pd = port();
        prop_assert_eq!(
            pd.decode_value(&port_number.to_string(), &cx).unwrap(),
            PropertyValue::Integer(port_number)
        );
    }

    #[test]
    fn prop_ports_outside_bounds_are_value_errors(port_number in 65536i64..1_000_000) {
        let cx = AdminContext::client();
        let err = port().decode_value(&port_number.to_string(), &cx).unwrap_err();
        prop_assert!(err.is_value_error());
    }
}

#[test]
fn test_duration_in_coarser_unit_converts_to_base() {
    let cx = AdminContext::client();
    let pd = PropertyDefinition::builder("connection-handler", "idle-time-limit")
        .syntax(
            DurationSyntax::builder()
                .base_unit(DurationUnit::Seconds)
                .unwrap()
                .allow_unlimited(true)
                .build(),
        )
        .build()
        .unwrap();

    assert_eq!(pd.decode_value("2 h", &cx).unwrap(), PropertyValue::Duration(7200));
    assert_eq!(pd.decode_value("unlimited", &cx).unwrap(), PropertyValue::Duration(-1));
    assert!(pd.decode_value("500 ms", &cx).is_err());
    assert_eq!(
        pd.encode_value(&PropertyValue::Duration(-1), &cx).unwrap(),
        "unlimited"
    );
}

#[test]
fn test_size_accepts_unit_variants() {
    let cx = AdminContext::client();
    let pd = size_limit();

    assert_eq!(pd.decode_value("10 MB", &cx).unwrap(), PropertyValue::Size(10_000_000));
    assert_eq!(pd.decode_value("1 kib", &cx).unwrap(), PropertyValue::Size(1024));
    assert!(pd.decode_value("ten", &cx).unwrap_err().is_value_error());
}
