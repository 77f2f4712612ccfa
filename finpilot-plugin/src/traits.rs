//! Calculator plugin traits

use crate::EvalContext;
use finpilot_core::Value;
use serde::Serialize;

/// Metadata about a calculator input
#[derive(Debug, Clone, Serialize)]
pub struct ArgMeta {
    pub name: &'static str,
    pub typ: &'static str,
    pub description: &'static str,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

impl ArgMeta {
    pub const fn required(name: &'static str, typ: &'static str, description: &'static str) -> Self {
        Self { name, typ, description, optional: false, default: None }
    }

    pub const fn optional(
        name: &'static str,
        typ: &'static str,
        description: &'static str,
        default: &'static str,
    ) -> Self {
        Self { name, typ, description, optional: true, default: Some(default) }
    }
}

/// Metadata for a calculator plugin
#[derive(Debug, Clone, Serialize)]
pub struct CalculatorMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub args: &'static [ArgMeta],
    /// Field names of the result object
    pub returns: &'static [&'static str],
    pub examples: &'static [&'static str],
    pub category: &'static str,
    pub related: &'static [&'static str],
}

impl CalculatorMeta {
    /// Number of inputs that must be supplied
    pub fn required_args(&self) -> usize {
        self.args.iter().filter(|a| !a.optional).count()
    }
}

/// A pure calculator: same inputs, same result, no side effects
pub trait CalculatorPlugin: Send + Sync {
    fn meta(&self) -> CalculatorMeta;
    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value;
}
