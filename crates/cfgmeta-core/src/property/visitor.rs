use super::{
    AggregationSyntax, AttributeTypeSyntax, BooleanSyntax, ClassSyntax, DnSyntax, DurationSyntax,
    EnumSyntax, IntegerSyntax, IpAddressSyntax, PropertyDefinition, SizeSyntax, StringSyntax,
};
use crate::dn::Dn;
use crate::errors::{ConfigError, Result};
use std::net::IpAddr;

fn unknown<R, V: ?Sized>(pd: &PropertyDefinition) -> Result<R> {
    Err(ConfigError::UnknownVariant {
        visitor: std::any::type_name::<V>().to_string(),
        kind: format!("{} property \"{}\"", pd.syntax().kind_name(), pd.name()),
    })
}

/// Dispatch over property kinds. Unhandled kinds fall through to
/// `visit_unknown`.
pub trait PropertyDefinitionVisitor<R, P> {
    fn visit_unknown(&mut self, pd: &PropertyDefinition, _param: P) -> Result<R> {
        unknown::<R, Self>(pd)
    }

    fn visit_boolean(&mut self, pd: &PropertyDefinition, _syntax: &BooleanSyntax, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_integer(&mut self, pd: &PropertyDefinition, _syntax: &IntegerSyntax, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_size(&mut self, pd: &PropertyDefinition, _syntax: &SizeSyntax, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_duration(&mut self, pd: &PropertyDefinition, _syntax: &DurationSyntax, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_string(&mut self, pd: &PropertyDefinition, _syntax: &StringSyntax, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_class(&mut self, pd: &PropertyDefinition, _syntax: &ClassSyntax, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_enum(&mut self, pd: &PropertyDefinition, _syntax: &EnumSyntax, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_dn(&mut self, pd: &PropertyDefinition, _syntax: &DnSyntax, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_aggregation(
        &mut self,
        pd: &PropertyDefinition,
        _syntax: &AggregationSyntax,
        param: P,
    ) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_ip_address(&mut self, pd: &PropertyDefinition, _syntax: &IpAddressSyntax, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_attribute_type(
        &mut self,
        pd: &PropertyDefinition,
        _syntax: &AttributeTypeSyntax,
        param: P,
    ) -> Result<R> {
        self.visit_unknown(pd, param)
    }
}

/// Dispatch over typed values.
pub trait PropertyValueVisitor<R, P> {
    fn visit_unknown(&mut self, pd: &PropertyDefinition, _param: P) -> Result<R> {
        unknown::<R, Self>(pd)
    }

    fn visit_boolean(&mut self, pd: &PropertyDefinition, _syntax: &BooleanSyntax, _value: bool, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_integer(&mut self, pd: &PropertyDefinition, _syntax: &IntegerSyntax, _value: i64, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_size(&mut self, pd: &PropertyDefinition, _syntax: &SizeSyntax, _value: i64, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_duration(
        &mut self,
        pd: &PropertyDefinition,
        _syntax: &DurationSyntax,
        _value: i64,
        param: P,
    ) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_string(&mut self, pd: &PropertyDefinition, _syntax: &StringSyntax, _value: &str, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_class(&mut self, pd: &PropertyDefinition, _syntax: &ClassSyntax, _value: &str, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_enum(&mut self, pd: &PropertyDefinition, _syntax: &EnumSyntax, _value: &str, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_dn(&mut self, pd: &PropertyDefinition, _syntax: &DnSyntax, _value: &Dn, param: P) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_aggregation(
        &mut self,
        pd: &PropertyDefinition,
        _syntax: &AggregationSyntax,
        _value: &str,
        param: P,
    ) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_ip_address(
        &mut self,
        pd: &PropertyDefinition,
        _syntax: &IpAddressSyntax,
        _value: &IpAddr,
        param: P,
    ) -> Result<R> {
        self.visit_unknown(pd, param)
    }

    fn visit_attribute_type(
        &mut self,
        pd: &PropertyDefinition,
        _syntax: &AttributeTypeSyntax,
        _value: &str,
        param: P,
    ) -> Result<R> {
        self.visit_unknown(pd, param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AdminContext;
    use crate::property::PropertyValue;

    struct BooleansOnly;

    impl PropertyDefinitionVisitor<&'static str, ()> for BooleansOnly {
        fn visit_boolean(&mut self, _pd: &PropertyDefinition, _s: &BooleanSyntax, _p: ()) -> Result<&'static str> {
            Ok("boolean")
        }
    }

    struct Doubler;

    impl PropertyValueVisitor<i64, i64> for Doubler {
        fn visit_integer(&mut self, _pd: &PropertyDefinition, _s: &IntegerSyntax, value: i64, factor: i64) -> Result<i64> {
            Ok(value * factor)
        }
    }

    #[test]
    fn test_unhandled_kind_reaches_unknown_arm() {
        let flag = PropertyDefinition::builder("d", "enabled")
            .syntax(BooleanSyntax)
            .build()
            .unwrap();
        let port = PropertyDefinition::builder("d", "port")
            .syntax(IntegerSyntax::default())
            .build()
            .unwrap();
        assert_eq!(flag.accept(&mut BooleansOnly, ()).unwrap(), "boolean");
        let err = port.accept(&mut BooleansOnly, ()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownVariant { .. }));
        assert!(err.to_string().contains("integer property \"port\""));
    }

    #[test]
    fn test_value_visitor_receives_typed_value() {
        let cx = AdminContext::client();
        let port = PropertyDefinition::builder("d", "port")
            .syntax(IntegerSyntax::default())
            .build()
            .unwrap();
        let value = port.decode_value("21", &cx).unwrap();
        assert_eq!(port.accept_value(&value, &mut Doubler, 2).unwrap(), 42);
        assert!(port
            .accept_value(&PropertyValue::Boolean(true), &mut Doubler, 2)
            .is_err());
    }
}
