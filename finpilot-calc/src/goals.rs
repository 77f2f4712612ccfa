//! Savings goals: retirement, emergency_fund

use finpilot_plugin::prelude::*;
use crate::compounding::annuity_due_factor;
use crate::helpers::*;

/// Corpus as a multiple of annual expenses at retirement
const CORPUS_MULTIPLE: i64 = 25;

/// Return assumed for the SIP that builds the corpus, percent
const SIP_RETURN_PERCENT: i64 = 12;

const DEFAULT_INFLATION_PERCENT: i64 = 6;

#[derive(Debug, Clone)]
pub struct RetirementInput {
    pub current_age: Number,
    pub retirement_age: Number,
    pub monthly_expenses: Number,
    /// Annual inflation, percent
    pub inflation: Number,
}

impl RetirementInput {
    pub fn from_args(args: &[Value]) -> Result<Self, FinpilotError> {
        let current_age = require_number(args, 0, "retirement", "current_age")?;
        let retirement_age = require_number(args, 1, "retirement", "retirement_age")?;
        let monthly_expenses = require_number(args, 2, "retirement", "monthly_expenses")?;
        let inflation = optional_number(args, 3, "retirement", "inflation")?
            .unwrap_or_else(|| Number::from_i64(DEFAULT_INFLATION_PERCENT));

        require_non_negative(&current_age, "retirement", "current_age")?;
        require_positive(&monthly_expenses, "retirement", "monthly_expenses")?;
        require_non_negative(&inflation, "retirement", "inflation")?;
        if retirement_age <= current_age {
            return Err(FinpilotError::invalid_input(
                "retirement",
                "retirement_age",
                format!("must be greater than current age {}, got {}", current_age, retirement_age),
            ));
        }

        Ok(Self { current_age, retirement_age, monthly_expenses, inflation })
    }

    pub fn years_to_retirement(&self) -> Number {
        self.retirement_age.sub(&self.current_age)
    }
}

#[derive(Debug, Clone)]
pub struct RetirementPlan {
    pub years_to_retirement: Number,
    /// Today's monthly expenses in retirement-year money
    pub future_monthly_expenses: Number,
    pub corpus_needed: Number,
    pub monthly_sip: Number,
}

impl From<RetirementPlan> for Value {
    fn from(p: RetirementPlan) -> Self {
        Value::object([
            ("years_to_retirement", Value::Number(p.years_to_retirement)),
            ("future_monthly_expenses", Value::Number(p.future_monthly_expenses)),
            ("corpus_needed", Value::Number(p.corpus_needed)),
            ("monthly_sip", Value::Number(p.monthly_sip)),
        ])
    }
}

/// Inflate expenses to the retirement year, size the corpus at 25× annual
/// expenses, then invert the SIP formula at 12% for the monthly saving.
pub fn plan_retirement(input: &RetirementInput, precision: u32) -> Result<RetirementPlan, FinpilotError> {
    let years = input.years_to_retirement();
    let months = require_count(&years.mul(&Number::from_i64(12)), "retirement", "retirement_age")
        .map_err(|_| {
            FinpilotError::invalid_input(
                "retirement",
                "retirement_age",
                format!("years to retirement must cover whole months, got {}", years),
            )
        })?;

    let inflation_factor = compound_factor(&percent(&input.inflation), &years, precision)?;
    let future_monthly_expenses = input.monthly_expenses.mul(&inflation_factor);
    let corpus_needed = future_monthly_expenses
        .mul(&Number::from_i64(12))
        .mul(&Number::from_i64(CORPUS_MULTIPLE));

    let i = monthly_rate(&Number::from_i64(SIP_RETURN_PERCENT));
    let monthly_sip = corpus_needed.checked_div(&annuity_due_factor(&i, months, precision)?)?;

    Ok(RetirementPlan {
        years_to_retirement: years,
        future_monthly_expenses,
        corpus_needed,
        monthly_sip,
    })
}

// ============ Retirement ============

pub struct Retirement;

static RETIREMENT_ARGS: [ArgMeta; 4] = [
    ArgMeta::required("current_age", "Number", "Age today"),
    ArgMeta::required("retirement_age", "Number", "Planned retirement age"),
    ArgMeta::required("monthly_expenses", "Number", "Current monthly expenses"),
    ArgMeta::optional("inflation", "Number", "Expected annual inflation, percent", "6"),
];

static RETIREMENT_EXAMPLES: [&str; 2] = [
    "retirement(30, 60, 50000) → corpus_needed 86152367.59, monthly_sip 24406.37",
    "retirement(35, 60, 40000, 0) → corpus_needed 12000000",
];

static RETIREMENT_RELATED: [&str; 2] = ["sip", "emergency_fund"];

impl CalculatorPlugin for Retirement {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "retirement",
            description: "Retirement corpus and the monthly SIP that builds it",
            usage: "retirement(current_age, retirement_age, monthly_expenses, [inflation])",
            args: &RETIREMENT_ARGS,
            returns: &["years_to_retirement", "future_monthly_expenses", "corpus_needed", "monthly_sip"],
            examples: &RETIREMENT_EXAMPLES,
            category: "planning",
            related: &RETIREMENT_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        respond(RetirementInput::from_args(args).and_then(|input| plan_retirement(&input, ctx.precision)))
    }
}

// ============ Emergency Fund ============

const DEFAULT_MONTHS_OF_COVER: u32 = 6;
const DEFAULT_MONTHS_TO_BUILD: u32 = 12;

#[derive(Debug, Clone)]
pub struct EmergencyFundInput {
    pub monthly_expenses: Number,
    pub current_fund: Number,
    pub months_of_cover: u32,
    pub months_to_build: u32,
}

impl EmergencyFundInput {
    pub fn from_args(args: &[Value]) -> Result<Self, FinpilotError> {
        let calc = "emergency_fund";
        let monthly_expenses = require_number(args, 0, calc, "monthly_expenses")?;
        let current_fund = optional_number(args, 1, calc, "current_fund")?.unwrap_or_else(Number::zero);
        let months_of_cover = match optional_number(args, 2, calc, "months_of_cover")? {
            Some(m) => require_count(&m, calc, "months_of_cover")?,
            None => DEFAULT_MONTHS_OF_COVER,
        };
        let months_to_build = match optional_number(args, 3, calc, "months_to_build")? {
            Some(m) => require_count(&m, calc, "months_to_build")?,
            None => DEFAULT_MONTHS_TO_BUILD,
        };

        require_positive(&monthly_expenses, calc, "monthly_expenses")?;
        require_non_negative(&current_fund, calc, "current_fund")?;

        Ok(Self { monthly_expenses, current_fund, months_of_cover, months_to_build })
    }
}

#[derive(Debug, Clone)]
pub struct EmergencyFundPlan {
    pub target: Number,
    pub shortfall: Number,
    pub monthly_saving: Number,
    /// Months of expenses the current fund already covers
    pub months_covered: Number,
    pub adequate: bool,
}

impl From<EmergencyFundPlan> for Value {
    fn from(p: EmergencyFundPlan) -> Self {
        Value::object([
            ("target", Value::Number(p.target)),
            ("shortfall", Value::Number(p.shortfall)),
            ("monthly_saving", Value::Number(p.monthly_saving)),
            ("months_covered", Value::Number(p.months_covered)),
            ("adequate", Value::Bool(p.adequate)),
        ])
    }
}

pub fn plan_emergency_fund(input: &EmergencyFundInput) -> Result<EmergencyFundPlan, FinpilotError> {
    let target = input.monthly_expenses.mul(&Number::from_i64(input.months_of_cover as i64));
    let gap = target.sub(&input.current_fund);
    let shortfall = if gap.is_positive() { gap } else { Number::zero() };
    let monthly_saving = shortfall.checked_div(&Number::from_i64(input.months_to_build as i64))?;
    let months_covered = input.current_fund.checked_div(&input.monthly_expenses)?;

    Ok(EmergencyFundPlan {
        adequate: shortfall.is_zero(),
        target,
        shortfall,
        monthly_saving,
        months_covered,
    })
}

pub struct EmergencyFund;

static EMERGENCY_FUND_ARGS: [ArgMeta; 4] = [
    ArgMeta::required("monthly_expenses", "Number", "Essential monthly expenses"),
    ArgMeta::optional("current_fund", "Number", "Savings already set aside", "0"),
    ArgMeta::optional("months_of_cover", "Number", "Months of expenses to hold", "6"),
    ArgMeta::optional("months_to_build", "Number", "Months to close the gap", "12"),
];

static EMERGENCY_FUND_EXAMPLES: [&str; 1] = ["emergency_fund(50000, 120000) → target 300000, monthly_saving 15000"];

static EMERGENCY_FUND_RELATED: [&str; 2] = ["retirement", "debt_summary"];

impl CalculatorPlugin for EmergencyFund {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "emergency_fund",
            description: "Emergency fund target and the monthly saving to reach it",
            usage: "emergency_fund(monthly_expenses, [current_fund], [months_of_cover], [months_to_build])",
            args: &EMERGENCY_FUND_ARGS,
            returns: &["target", "shortfall", "monthly_saving", "months_covered", "adequate"],
            examples: &EMERGENCY_FUND_EXAMPLES,
            category: "planning",
            related: &EMERGENCY_FUND_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        respond(EmergencyFundInput::from_args(args).and_then(|input| plan_emergency_fund(&input)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Number {
        Number::from_str(s).unwrap()
    }

    fn close(a: &Number, b: &str, tol: &str) -> bool {
        a.sub(&n(b)).abs() < n(tol)
    }

    fn retirement(args: &[&str]) -> Value {
        let args: Vec<Value> = args.iter().map(|s| Value::from(*s)).collect();
        Retirement.call(&args, &EvalContext::new())
    }

    #[test]
    fn test_retirement_default_inflation() {
        let r = retirement(&["30", "60", "50000"]);
        assert_eq!(r.get("years_to_retirement").as_number().unwrap().to_i64(), Some(30));
        assert!(close(r.get("future_monthly_expenses").as_number().unwrap(), "287174.56", "0.01"));
        assert!(close(r.get("corpus_needed").as_number().unwrap(), "86152367.59", "0.01"));
        assert!(close(r.get("monthly_sip").as_number().unwrap(), "24406.37", "0.01"));
    }

    #[test]
    fn test_retirement_zero_inflation() {
        let r = retirement(&["35", "60", "40000", "0"]);
        assert_eq!(r.get("corpus_needed").as_number().unwrap().to_i64(), Some(12_000_000));
        assert!(close(r.get("monthly_sip").as_number().unwrap(), "6323.66", "0.01"));
    }

    #[test]
    fn test_retirement_sip_rebuilds_corpus() {
        let input = RetirementInput::from_args(&[Value::from(40i64), Value::from(55i64), Value::from(30000i64)]).unwrap();
        let plan = plan_retirement(&input, 50).unwrap();
        let i = monthly_rate(&Number::from_i64(12));
        let rebuilt = plan.monthly_sip.mul(&annuity_due_factor(&i, 180, 50).unwrap());
        assert!(rebuilt.sub(&plan.corpus_needed).abs() < n("0.0001"));
    }

    #[test]
    fn test_retirement_rejects_past_retirement_age() {
        for args in [["60", "60", "50000"], ["61", "60", "50000"]] {
            let r = retirement(&args);
            assert_eq!(r.as_error().unwrap().code, codes::INVALID_INPUT);
        }
        let negative_inflation = retirement(&["30", "60", "50000", "-2"]);
        assert_eq!(negative_inflation.as_error().unwrap().code, codes::INVALID_INPUT);

        let missing = retirement(&["30", "", "50000"]);
        assert_eq!(missing.as_error().unwrap().code, codes::MISSING_INPUT);
    }

    #[test]
    fn test_emergency_fund_shortfall() {
        let r = EmergencyFund.call(&[Value::from(50000i64), Value::from(120000i64)], &EvalContext::new());
        assert_eq!(r.get("target").as_number().unwrap().to_i64(), Some(300_000));
        assert_eq!(r.get("shortfall").as_number().unwrap().to_i64(), Some(180_000));
        assert_eq!(r.get("monthly_saving").as_number().unwrap().to_i64(), Some(15_000));
        assert!(close(r.get("months_covered").as_number().unwrap(), "2.4", "0.0000001"));
        assert_eq!(r.get("adequate").as_bool(), Some(false));
    }

    #[test]
    fn test_emergency_fund_already_adequate() {
        let input = EmergencyFundInput {
            monthly_expenses: n("40000"),
            current_fund: n("500000"),
            months_of_cover: 6,
            months_to_build: 12,
        };
        let plan = plan_emergency_fund(&input).unwrap();
        assert!(plan.adequate);
        assert!(plan.shortfall.is_zero());
        assert!(plan.monthly_saving.is_zero());
    }

    #[test]
    fn test_emergency_fund_validation() {
        let ctx = EvalContext::new();
        let zero_expenses = EmergencyFund.call(&[Value::from(0i64)], &ctx);
        assert_eq!(zero_expenses.as_error().unwrap().code, codes::INVALID_INPUT);

        let zero_months = EmergencyFund.call(&[Value::from(1000i64), Value::Null, Value::from(0i64)], &ctx);
        assert_eq!(zero_months.as_error().unwrap().code, codes::INVALID_INPUT);
    }
}
