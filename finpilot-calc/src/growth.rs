//! Compound annual growth rate

use finpilot_plugin::prelude::*;
use crate::helpers::*;

#[derive(Debug, Clone)]
pub struct GrowthInput {
    pub initial_value: Number,
    pub final_value: Number,
    pub years: Number,
}

impl GrowthInput {
    pub fn from_args(args: &[Value]) -> Result<Self, FinpilotError> {
        let initial_value = require_number(args, 0, "cagr", "initial_value")?;
        let final_value = require_number(args, 1, "cagr", "final_value")?;
        let years = require_number(args, 2, "cagr", "years")?;

        require_non_negative(&initial_value, "cagr", "initial_value")?;
        require_positive(&years, "cagr", "years")?;
        if final_value.is_zero() {
            return Err(FinpilotError::invalid_input("cagr", "final_value", "must be greater than 0, got 0"));
        }

        Ok(Self { initial_value, final_value, years })
    }
}

#[derive(Debug, Clone)]
pub struct GrowthResult {
    /// Annualised rate, percent
    pub cagr: Number,
    /// Growth over the whole period, percent
    pub absolute_return: Number,
    pub gain: Number,
}

impl From<GrowthResult> for Value {
    fn from(r: GrowthResult) -> Self {
        Value::object([
            ("cagr", Value::Number(r.cagr)),
            ("absolute_return", Value::Number(r.absolute_return)),
            ("gain", Value::Number(r.gain)),
        ])
    }
}

/// CAGR% = ((V1 / V0)^(1/t) − 1) × 100
pub fn calculate_cagr(input: &GrowthInput, precision: u32) -> Result<GrowthResult, FinpilotError> {
    if input.initial_value.is_zero() {
        return Err(FinpilotError::domain_error("growth from an initial value of 0 is undefined")
            .in_calculator("cagr")
            .for_argument("initial_value")
            .with_suggestion("Enter an initial value greater than 0"));
    }

    let ratio = input.final_value.checked_div(&input.initial_value)?;
    if ratio.is_zero() {
        return Err(FinpilotError::domain_error("a final value of 0 has no compound growth rate")
            .in_calculator("cagr")
            .for_argument("final_value"));
    }
    if ratio.is_negative() {
        return Err(FinpilotError::domain_error(format!(
            "final value {} is negative; no real growth rate leads there",
            input.final_value
        ))
        .in_calculator("cagr")
        .for_argument("final_value"));
    }

    let hundred = Number::from_i64(100);
    let inverse_years = Number::one().checked_div(&input.years)?;
    let annual = ratio.pow_real(&inverse_years, precision)?;

    Ok(GrowthResult {
        cagr: annual.sub(&Number::one()).mul(&hundred),
        absolute_return: ratio.sub(&Number::one()).mul(&hundred),
        gain: input.final_value.sub(&input.initial_value),
    })
}

pub struct Cagr;

static CAGR_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("initial_value", "Number", "Value at the start"),
    ArgMeta::required("final_value", "Number", "Value at the end"),
    ArgMeta::required("years", "Number", "Length of the period in years"),
];

static CAGR_EXAMPLES: [&str; 2] = [
    "cagr(100000, 200000, 5) → cagr 14.87",
    "cagr(200000, 100000, 5) → cagr -12.94",
];

static CAGR_RELATED: [&str; 2] = ["lumpsum", "irr"];

impl CalculatorPlugin for Cagr {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "cagr",
            description: "Compound annual growth rate between two values",
            usage: "cagr(initial_value, final_value, years)",
            args: &CAGR_ARGS,
            returns: &["cagr", "absolute_return", "gain"],
            examples: &CAGR_EXAMPLES,
            category: "returns",
            related: &CAGR_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        respond(GrowthInput::from_args(args).and_then(|input| calculate_cagr(&input, ctx.precision)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compounding::{calculate_lumpsum, ContributionPlan};

    fn n(s: &str) -> Number {
        Number::from_str(s).unwrap()
    }

    fn input(v0: &str, v1: &str, t: &str) -> GrowthInput {
        GrowthInput { initial_value: n(v0), final_value: n(v1), years: n(t) }
    }

    #[test]
    fn test_cagr_doubling_in_five_years() {
        let r = calculate_cagr(&input("100000", "200000", "5"), 50).unwrap();
        assert!(r.cagr.sub(&n("14.87")).abs() < n("0.01"), "cagr = {}", r.cagr);
        assert_eq!(r.absolute_return.to_i64(), Some(100));
        assert_eq!(r.gain.to_i64(), Some(100000));
    }

    #[test]
    fn test_cagr_round_trip_through_lumpsum() {
        for (v0, v1, t) in [("100000", "200000", "5"), ("5000", "7300", "3.5"), ("250000", "260000", "1")] {
            let r = calculate_cagr(&input(v0, v1, t), 50).unwrap();
            let plan = ContributionPlan { amount: n(v0), annual_rate: r.cagr, years: n(t) };
            let back = calculate_lumpsum(&plan, 50).unwrap().maturity_amount;
            assert!(back.sub(&n(v1)).abs() < n("0.000001"), "{} -> {}", v1, back);
        }
    }

    #[test]
    fn test_cagr_total_loss_rejected() {
        let err = calculate_cagr(&input("100000", "0", "3"), 50).unwrap_err();
        assert_eq!(err.code, codes::DOMAIN_ERROR);

        let ctx = EvalContext::new();
        let result = Cagr.call(&[Value::from("100000"), Value::from("0"), Value::from("3")], &ctx);
        let err = result.as_error().unwrap();
        assert_eq!(err.code, codes::INVALID_INPUT);
        assert!(err.message.contains("final_value"));
    }

    #[test]
    fn test_cagr_decline() {
        let r = calculate_cagr(&input("200000", "100000", "5"), 50).unwrap();
        assert!(r.cagr.is_negative());
        assert!(r.cagr.sub(&n("-12.94")).abs() < n("0.01"), "cagr = {}", r.cagr);
    }

    #[test]
    fn test_cagr_domain_errors() {
        let zero_base = calculate_cagr(&input("0", "1000", "5"), 50).unwrap_err();
        assert_eq!(zero_base.code, codes::DOMAIN_ERROR);

        let negative_ratio = calculate_cagr(&input("1000", "-500", "2"), 50).unwrap_err();
        assert_eq!(negative_ratio.code, codes::DOMAIN_ERROR);

        // whole-year periods still reject a negative ratio
        let negative_ratio = calculate_cagr(&input("1000", "-500", "1"), 50).unwrap_err();
        assert_eq!(negative_ratio.code, codes::DOMAIN_ERROR);
    }

    #[test]
    fn test_cagr_input_errors() {
        let ctx = EvalContext::new();
        let zero_years = Cagr.call(&[Value::from(1000i64), Value::from(2000i64), Value::from(0i64)], &ctx);
        assert_eq!(zero_years.as_error().unwrap().code, codes::INVALID_INPUT);

        let negative_base = Cagr.call(&[Value::from(-1000i64), Value::from(2000i64), Value::from(2i64)], &ctx);
        assert_eq!(negative_base.as_error().unwrap().code, codes::INVALID_INPUT);
    }
}
