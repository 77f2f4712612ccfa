//! FinPilot - Financial calculation engine
//!
//! Wraps the calculator registry: run a calculator by name with positional
//! or named inputs, get back the result value plus a markdown rendering.

mod render;

pub use render::{NumberFormat, Renderer};
pub use finpilot_core::{FinpilotError, Number, Value};

use finpilot_plugin::{CalculatorRegistry, EvalContext};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of one calculator run
#[derive(Debug, Clone, Serialize)]
pub struct Calculation {
    pub calculator: String,
    pub value: Value,
    pub markdown: String,
}

impl Calculation {
    pub fn is_error(&self) -> bool {
        self.value.is_error()
    }

    pub fn error(&self) -> Option<&FinpilotError> {
        self.value.as_error()
    }

    /// Result field, or an Error value
    pub fn get(&self, field: &str) -> Value {
        self.value.get(field)
    }
}

/// Main FinPilot engine
pub struct FinPilot {
    registry: Arc<CalculatorRegistry>,
    default_precision: u32,
}

impl FinPilot {
    pub fn new(registry: CalculatorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            default_precision: 50,
        }
    }

    pub fn with_calculators() -> Self {
        Self::new(finpilot_calc::standard_registry())
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.default_precision = precision;
        self
    }

    pub fn precision(&self) -> u32 {
        self.default_precision
    }

    pub fn registry(&self) -> Arc<CalculatorRegistry> {
        Arc::clone(&self.registry)
    }

    fn context(&self) -> EvalContext {
        EvalContext::new().with_precision(self.default_precision)
    }

    /// Run a calculator with positional inputs
    pub fn calculate(&self, calculator: &str, args: &[Value]) -> Calculation {
        tracing::debug!(calculator, args = args.len(), "calculate");
        let value = self.registry.call(calculator, args, &self.context());
        self.finish(calculator, value)
    }

    /// Run a calculator with inputs keyed by field name
    pub fn calculate_named(&self, calculator: &str, inputs: &HashMap<String, Value>) -> Calculation {
        tracing::debug!(calculator, inputs = inputs.len(), "calculate_named");
        let value = self.registry.call_named(calculator, inputs, &self.context());
        self.finish(calculator, value)
    }

    fn finish(&self, calculator: &str, value: Value) -> Calculation {
        if let Value::Error(ref e) = value {
            tracing::warn!(calculator, code = %e.code, "{}", e.message);
        }

        let field_order: &[&str] = match self.registry.get(calculator) {
            Some(c) => c.meta().returns,
            None => &[],
        };
        let markdown = Renderer::new().render(calculator, &value, field_order);

        Calculation {
            calculator: calculator.to_lowercase(),
            value,
            markdown,
        }
    }

    pub fn help(&self, name: Option<&str>) -> Value {
        self.registry.help(name)
    }

    pub fn list_calculators(&self, category: Option<&str>) -> Value {
        self.registry.list_calculators(category)
    }
}

impl Default for FinPilot {
    fn default() -> Self {
        Self::with_calculators()
    }
}

/// Build named calculator inputs: `inputs! { principal: 1000000i64, annual_rate: "8.5" }`
#[macro_export]
macro_rules! inputs {
    {} => { std::collections::HashMap::new() };
    { $($key:ident : $value:expr),* $(,)? } => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert(stringify!($key).to_string(), $crate::Value::from($value));
        )*
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use finpilot_core::codes;

    fn engine() -> FinPilot {
        FinPilot::with_calculators()
    }

    fn close(v: &Value, expected: &str, tol: &str) -> bool {
        let n = v.as_number().unwrap();
        n.sub(&Number::from_str(expected).unwrap()).abs() < Number::from_str(tol).unwrap()
    }

    #[test]
    fn test_home_loan_emi() {
        let calc = engine().calculate("emi", &[Value::from(1000000i64), Value::from("8.5"), Value::from(20i64)]);
        assert!(!calc.is_error());
        assert!(close(&calc.get("emi"), "8678.23", "0.01"));
        assert!(calc.markdown.contains("| emi | 8678.23 |"));
    }

    #[test]
    fn test_named_inputs_macro() {
        let inputs = inputs! { initial_value: 100000i64, final_value: 200000i64, years: 5i64 };
        let calc = engine().calculate_named("cagr", &inputs);
        assert!(close(&calc.get("cagr"), "14.87", "0.01"));
    }

    #[test]
    fn test_irr_scenario() {
        let calc = engine().calculate("irr", &[Value::from("-100000, 25000, 30000, 35000, 40000")]);
        assert!(close(&calc.get("irr"), "10.48", "0.01"));
        let iterations = calc.get("iterations").as_number().unwrap().to_i64().unwrap();
        assert!(iterations <= 100);
    }

    #[test]
    fn test_irr_non_convergence() {
        let calc = engine().calculate("irr", &[Value::from("1000, 2000, 3000")]);
        assert_eq!(calc.error().unwrap().code, codes::NO_CONVERGENCE);
        assert!(calc.markdown.contains("Please check your cash flows"));
    }

    #[test]
    fn test_tax_zero_income_both_regimes() {
        for regime in ["old", "new"] {
            let calc = engine().calculate("tax", &[Value::from(0i64), Value::from(0i64), Value::from(regime)]);
            assert!(calc.get("total_tax").as_number().unwrap().is_zero());
        }
    }

    #[test]
    fn test_amortization_markdown_has_schedule() {
        let calc = engine().calculate("amortization", &[Value::from(100000i64), Value::from(12i64), Value::from(1i64)]);
        assert!(calc.markdown.contains("### schedule"));
        assert!(calc.markdown.contains("| period |"));
    }

    #[test]
    fn test_huge_exponent_is_an_input_error() {
        let calc = engine().calculate("tax", &[Value::from("1e9223372036854775800")]);
        assert_eq!(calc.error().unwrap().code, codes::INVALID_INPUT);
        assert!(calc.markdown.contains("`INVALID_INPUT`"));
    }

    #[test]
    fn test_unknown_calculator() {
        let calc = engine().calculate("sipp", &[]);
        let err = calc.error().unwrap();
        assert_eq!(err.code, codes::UNDEFINED_CALC);
        assert!(err.suggestion.as_deref().unwrap().contains("sip"));
    }

    #[test]
    fn test_precision_is_configurable() {
        let fp = FinPilot::with_calculators().with_precision(30);
        assert_eq!(fp.precision(), 30);
        let calc = fp.calculate("lumpsum", &[Value::from(100000i64), Value::from(12i64), Value::from("2.5")]);
        assert!(close(&calc.get("maturity_amount"), "132753.22", "0.01"));
    }

    #[test]
    fn test_help_and_listing() {
        let fp = engine();
        assert_eq!(fp.help(Some("ppf")).get("name").as_text(), Some("ppf"));
        let savings = fp.list_calculators(Some("savings"));
        assert_eq!(savings.as_list().unwrap().len(), 4);
    }
}
