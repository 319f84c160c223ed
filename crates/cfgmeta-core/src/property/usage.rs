//! Value grammars rendered for help output, e.g.
//! `1 kib <= SIZE <= 1 gib | unlimited`.

use super::units::SizeUnit;
use super::{
    AggregationSyntax, AttributeTypeSyntax, BooleanSyntax, ClassSyntax, DnSyntax, DurationSyntax,
    EnumSyntax, IntegerSyntax, IpAddressSyntax, PropertyDefinition, PropertyDefinitionVisitor,
    SizeSyntax, StringSyntax,
};
use crate::errors::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyUsageBuilder {
    detailed: bool,
}

impl PropertyUsageBuilder {
    /// Includes bounds and interface constraints.
    pub fn detailed() -> Self {
        Self { detailed: true }
    }

    pub fn brief() -> Self {
        Self { detailed: false }
    }

    /// # Errors
    /// Never fails for the built-in kinds.
    pub fn usage(&mut self, pd: &PropertyDefinition) -> Result<String> {
        pd.accept(self, ())
    }

    fn bounded(
        &self,
        keyword: &str,
        lower: i64,
        upper: Option<i64>,
        allow_unlimited: bool,
        render: impl Fn(i64) -> String,
    ) -> String {
        let mut usage = String::new();
        if self.detailed && lower > 0 {
            usage.push_str(&render(lower));
            usage.push_str(" <= ");
        }
        usage.push_str(keyword);
        if self.detailed {
            if let Some(upper) = upper {
                usage.push_str(" <= ");
                usage.push_str(&render(upper));
            }
        }
        if allow_unlimited {
            usage.push_str(" | unlimited");
        }
        usage
    }
}

impl PropertyDefinitionVisitor<String, ()> for PropertyUsageBuilder {
    fn visit_boolean(&mut self, _pd: &PropertyDefinition, _syntax: &BooleanSyntax, _: ()) -> Result<String> {
        Ok("false | true".to_string())
    }

    fn visit_integer(&mut self, _pd: &PropertyDefinition, syntax: &IntegerSyntax, _: ()) -> Result<String> {
        Ok(self.bounded(
            "INTEGER",
            syntax.lower_limit(),
            syntax.upper_limit(),
            syntax.allow_unlimited(),
            |v| v.to_string(),
        ))
    }

    fn visit_size(&mut self, _pd: &PropertyDefinition, syntax: &SizeSyntax, _: ()) -> Result<String> {
        Ok(self.bounded(
            "SIZE",
            syntax.lower_limit(),
            syntax.upper_limit(),
            syntax.allow_unlimited(),
            SizeUnit::format,
        ))
    }

    fn visit_duration(&mut self, _pd: &PropertyDefinition, syntax: &DurationSyntax, _: ()) -> Result<String> {
        let base = syntax.base_unit().abbreviation();
        Ok(self.bounded(
            "DURATION",
            syntax.lower_limit(),
            syntax.upper_limit(),
            syntax.allow_unlimited(),
            |v| format!("{} {}", v, base),
        ))
    }

    fn visit_string(&mut self, _pd: &PropertyDefinition, syntax: &StringSyntax, _: ()) -> Result<String> {
        Ok(syntax
            .pattern()
            .map(|(_, usage)| usage.to_string())
            .unwrap_or_else(|| "STRING".to_string()))
    }

    fn visit_class(&mut self, _pd: &PropertyDefinition, syntax: &ClassSyntax, _: ()) -> Result<String> {
        if self.detailed && !syntax.instance_of().is_empty() {
            return Ok(format!("CLASS <= {}", syntax.instance_of().join(" | ")));
        }
        Ok("CLASS".to_string())
    }

    fn visit_enum(&mut self, _pd: &PropertyDefinition, syntax: &EnumSyntax, _: ()) -> Result<String> {
        let mut values: Vec<&str> = syntax.values().iter().map(String::as_str).collect();
        values.sort_unstable();
        Ok(values.join(" | "))
    }

    fn visit_dn(&mut self, _pd: &PropertyDefinition, syntax: &DnSyntax, _: ()) -> Result<String> {
        match syntax.base_dn() {
            Some(base) if self.detailed => Ok(format!("DN <= {}", base)),
            _ => Ok("DN".to_string()),
        }
    }

    fn visit_aggregation(&mut self, _pd: &PropertyDefinition, _syntax: &AggregationSyntax, _: ()) -> Result<String> {
        Ok("NAME".to_string())
    }

    fn visit_ip_address(&mut self, _pd: &PropertyDefinition, _syntax: &IpAddressSyntax, _: ()) -> Result<String> {
        Ok("IP_ADDRESS".to_string())
    }

    fn visit_attribute_type(
        &mut self,
        _pd: &PropertyDefinition,
        _syntax: &AttributeTypeSyntax,
        _: (),
    ) -> Result<String> {
        Ok("OID".to_string())
    }
}
