//! FinPilot Calculators
//!
//! Loans, savings growth, returns, income tax and planning goals. Every
//! calculator is pure: inputs are parsed and validated into typed structs,
//! the formula runs on `Number`, and the result comes back as an object.

pub mod helpers;
pub mod cashflow;
pub mod loans;
pub mod compounding;
pub mod growth;
pub mod irr;
pub mod tax;
pub mod goals;
pub mod portfolio;
pub mod debt;

use finpilot_plugin::CalculatorRegistry;

/// Load all calculators into registry
pub fn load_calculators(registry: CalculatorRegistry) -> CalculatorRegistry {
    registry
        // Loans (3 calculators)
        .with_calculator(loans::Emi)
        .with_calculator(loans::Amortization)
        .with_calculator(debt::DebtSummaryCalc)

        // Savings (4 calculators)
        .with_calculator(compounding::Sip)
        .with_calculator(compounding::Lumpsum)
        .with_calculator(compounding::FixedDeposit)
        .with_calculator(compounding::Ppf)

        // Returns (3 calculators)
        .with_calculator(growth::Cagr)
        .with_calculator(irr::Irr)
        .with_calculator(irr::Npv)

        .with_calculator(tax::Tax)

        // Planning (2 calculators)
        .with_calculator(goals::Retirement)
        .with_calculator(goals::EmergencyFund)

        .with_calculator(portfolio::Allocation)
}

/// Create registry with every calculator
pub fn standard_registry() -> CalculatorRegistry {
    load_calculators(CalculatorRegistry::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use finpilot_plugin::EvalContext;
    use finpilot_core::{codes, Value};
    use std::collections::HashMap;

    #[test]
    fn test_all_calculators_registered() {
        let registry = standard_registry();
        assert_eq!(registry.len(), 14);
        for name in [
            "emi", "amortization", "debt_summary", "sip", "lumpsum", "fixed_deposit", "ppf",
            "cagr", "irr", "npv", "tax", "retirement", "emergency_fund", "allocation",
        ] {
            assert!(registry.get(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_metadata_is_consistent() {
        let registry = standard_registry();
        for meta in registry.metas() {
            assert!(!meta.examples.is_empty(), "{} has no examples", meta.name);
            assert!(!meta.returns.is_empty(), "{} has no result fields", meta.name);
            for related in meta.related {
                assert!(registry.get(related).is_some(), "{} relates to unknown {}", meta.name, related);
            }
            // optional inputs come last so trailing nulls can be dropped
            let first_optional = meta.args.iter().position(|a| a.optional).unwrap_or(meta.args.len());
            assert!(meta.args[first_optional..].iter().all(|a| a.optional), "{}", meta.name);
        }
    }

    #[test]
    fn test_empty_form_reports_missing_input() {
        let registry = standard_registry();
        let ctx = EvalContext::new();
        for meta in registry.metas() {
            let result = registry.call(meta.name, &[], &ctx);
            assert_eq!(result.as_error().map(|e| e.code.as_str()), Some(codes::MISSING_INPUT), "{}", meta.name);
        }
    }

    #[test]
    fn test_named_form_inputs() {
        let registry = standard_registry();
        let mut inputs = HashMap::new();
        inputs.insert("income".to_string(), Value::from("1200000"));
        inputs.insert("deductions".to_string(), Value::from("150000"));
        inputs.insert("regime".to_string(), Value::from("new"));
        let result = registry.call_named("tax", &inputs, &EvalContext::new());
        assert_eq!(result.get("total_tax").as_number().unwrap().to_i64(), Some(70_200));
    }
}
