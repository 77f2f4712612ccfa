//! Compound growth of savings: sip, lumpsum, fixed_deposit, ppf

use finpilot_plugin::prelude::*;
use crate::helpers::*;

/// An amount (one-off or recurring), an annual rate in percent and a duration in years
#[derive(Debug, Clone)]
pub struct ContributionPlan {
    pub amount: Number,
    pub annual_rate: Number,
    pub years: Number,
}

impl ContributionPlan {
    /// Read (amount, annual_rate, years); all three must be positive
    pub fn from_args(args: &[Value], calc: &str, amount_name: &str) -> Result<Self, FinpilotError> {
        let amount = require_number(args, 0, calc, amount_name)?;
        let annual_rate = require_number(args, 1, calc, "annual_rate")?;
        let years = require_number(args, 2, calc, "years")?;

        require_positive(&amount, calc, amount_name)?;
        require_positive(&annual_rate, calc, "annual_rate")?;
        require_positive(&years, calc, "years")?;

        Ok(Self { amount, annual_rate, years })
    }
}

/// Final value, total paid in, and what was earned on top
#[derive(Debug, Clone)]
pub struct MaturityResult {
    pub maturity_amount: Number,
    pub invested: Number,
    pub earned: Number,
}

impl MaturityResult {
    fn new(maturity_amount: Number, invested: Number) -> Self {
        let earned = maturity_amount.sub(&invested);
        Self { maturity_amount, invested, earned }
    }

    /// `earned_as` names the growth field: "gains" for market products,
    /// "interest" for deposits
    pub fn into_value(self, earned_as: &str) -> Value {
        Value::object([
            ("maturity_amount", Value::Number(self.maturity_amount)),
            ("invested", Value::Number(self.invested)),
            (earned_as, Value::Number(self.earned)),
        ])
    }
}

/// ((1+i)^m − 1) / i × (1+i): future value of 1 paid at the start of each of m periods
pub(crate) fn annuity_due_factor(i: &Number, months: u32, precision: u32) -> Result<Number, FinpilotError> {
    let growth = compound_factor(i, &Number::from_i64(months as i64), precision)?;
    Ok(growth
        .sub(&Number::one())
        .checked_div(i)?
        .mul(&Number::one().add(i)))
}

fn whole_months(years: &Number, calc: &str) -> Result<u32, FinpilotError> {
    require_count(&years.mul(&Number::from_i64(12)), calc, "years").map_err(|_| {
        FinpilotError::invalid_input(calc, "years", format!("must cover a whole number of months, got {}", years))
    })
}

/// Monthly SIP, paid at the start of each month
pub fn calculate_sip(plan: &ContributionPlan, precision: u32) -> Result<MaturityResult, FinpilotError> {
    let i = monthly_rate(&plan.annual_rate);
    let months = whole_months(&plan.years, "sip")?;

    let maturity = plan.amount.mul(&annuity_due_factor(&i, months, precision)?);
    let invested = plan.amount.mul(&Number::from_i64(months as i64));
    Ok(MaturityResult::new(maturity, invested))
}

/// FV = amount × (1 + r)^years, fractional years allowed
pub fn calculate_lumpsum(plan: &ContributionPlan, precision: u32) -> Result<MaturityResult, FinpilotError> {
    let factor = compound_factor(&percent(&plan.annual_rate), &plan.years, precision)?;
    Ok(MaturityResult::new(plan.amount.mul(&factor), plan.amount.clone()))
}

/// Compounding periods per year a bank deposit may use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compounding {
    Yearly = 1,
    HalfYearly = 2,
    #[default]
    Quarterly = 4,
    Monthly = 12,
}

impl Compounding {
    pub fn from_number(n: &Number) -> Option<Self> {
        match n.to_i64()? {
            1 => Some(Self::Yearly),
            2 => Some(Self::HalfYearly),
            4 => Some(Self::Quarterly),
            12 => Some(Self::Monthly),
            _ => None,
        }
    }

    pub fn periods(self) -> i64 {
        self as i64
    }
}

/// FV = P × (1 + r/k)^(k × years)
pub fn calculate_fixed_deposit(
    plan: &ContributionPlan,
    compounding: Compounding,
    precision: u32,
) -> Result<MaturityResult, FinpilotError> {
    let k = Number::from_i64(compounding.periods());
    let periodic = percent(&plan.annual_rate).checked_div(&k)?;
    let factor = compound_factor(&periodic, &k.mul(&plan.years), precision)?;
    Ok(MaturityResult::new(plan.amount.mul(&factor), plan.amount.clone()))
}

/// PPF rate, percent
pub fn ppf_rate() -> Number {
    Number::from_ratio(71, 10)
}

pub const PPF_DEFAULT_YEARS: u32 = 15;

/// Longest PPF term accepted, in years
pub const PPF_MAX_YEARS: u32 = 50;

/// Yearly contribution credited at the start of each year, 7.1% a year
pub fn calculate_ppf(contribution: &Number, years: u32) -> MaturityResult {
    let growth = Number::one().add(&percent(&ppf_rate()));
    let balance = (0..years).fold(Number::zero(), |balance, _| balance.add(contribution).mul(&growth));
    let invested = contribution.mul(&Number::from_i64(years as i64));
    MaturityResult::new(balance, invested)
}

// ============ SIP ============

pub struct Sip;

static SIP_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("monthly_investment", "Number", "Amount invested every month"),
    ArgMeta::required("annual_rate", "Number", "Expected annual return, percent"),
    ArgMeta::required("years", "Number", "Investment period in years"),
];

static SIP_EXAMPLES: [&str; 1] = ["sip(5000, 12, 10) → maturity_amount 1161695.38"];

static SIP_RELATED: [&str; 2] = ["lumpsum", "retirement"];

impl CalculatorPlugin for Sip {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "sip",
            description: "Future value of a monthly systematic investment plan",
            usage: "sip(monthly_investment, annual_rate, years)",
            args: &SIP_ARGS,
            returns: &["maturity_amount", "invested", "gains"],
            examples: &SIP_EXAMPLES,
            category: "savings",
            related: &SIP_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let result = ContributionPlan::from_args(args, "sip", "monthly_investment")
            .and_then(|plan| calculate_sip(&plan, ctx.precision));
        match result {
            Ok(r) => r.into_value("gains"),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ Lumpsum ============

pub struct Lumpsum;

static LUMPSUM_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("amount", "Number", "One-time investment"),
    ArgMeta::required("annual_rate", "Number", "Expected annual return, percent"),
    ArgMeta::required("years", "Number", "Investment period in years"),
];

static LUMPSUM_EXAMPLES: [&str; 1] = ["lumpsum(100000, 12, 10) → maturity_amount 310584.82"];

static LUMPSUM_RELATED: [&str; 3] = ["sip", "fixed_deposit", "cagr"];

impl CalculatorPlugin for Lumpsum {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "lumpsum",
            description: "Future value of a one-time investment, compounded yearly",
            usage: "lumpsum(amount, annual_rate, years)",
            args: &LUMPSUM_ARGS,
            returns: &["maturity_amount", "invested", "gains"],
            examples: &LUMPSUM_EXAMPLES,
            category: "savings",
            related: &LUMPSUM_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let result = ContributionPlan::from_args(args, "lumpsum", "amount")
            .and_then(|plan| calculate_lumpsum(&plan, ctx.precision));
        match result {
            Ok(r) => r.into_value("gains"),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ Fixed Deposit ============

pub struct FixedDeposit;

static FD_ARGS: [ArgMeta; 4] = [
    ArgMeta::required("principal", "Number", "Deposit amount"),
    ArgMeta::required("annual_rate", "Number", "Annual interest rate, percent"),
    ArgMeta::required("years", "Number", "Deposit tenure in years"),
    ArgMeta::optional("compounding", "Number", "Compounding periods per year: 1, 2, 4 or 12", "4"),
];

static FD_EXAMPLES: [&str; 2] = [
    "fixed_deposit(100000, 7, 5) → maturity_amount 141477.82",
    "fixed_deposit(100000, 7, 5, 12) → maturity_amount 141762.53",
];

static FD_RELATED: [&str; 2] = ["lumpsum", "ppf"];

impl CalculatorPlugin for FixedDeposit {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "fixed_deposit",
            description: "Maturity value of a bank fixed deposit",
            usage: "fixed_deposit(principal, annual_rate, years, [compounding])",
            args: &FD_ARGS,
            returns: &["maturity_amount", "invested", "interest", "compounding"],
            examples: &FD_EXAMPLES,
            category: "savings",
            related: &FD_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let plan = match ContributionPlan::from_args(args, "fixed_deposit", "principal") {
            Ok(p) => p,
            Err(e) => return Value::Error(e),
        };
        let compounding = match optional_number(args, 3, "fixed_deposit", "compounding") {
            Ok(None) => Compounding::default(),
            Ok(Some(k)) => match Compounding::from_number(&k) {
                Some(c) => c,
                None => {
                    return Value::Error(FinpilotError::invalid_input(
                        "fixed_deposit",
                        "compounding",
                        format!("must be 1, 2, 4 or 12, got {}", k),
                    ))
                }
            },
            Err(e) => return Value::Error(e),
        };

        match calculate_fixed_deposit(&plan, compounding, ctx.precision) {
            Ok(r) => {
                let mut value = r.into_value("interest");
                if let Value::Object(ref mut fields) = value {
                    fields.insert("compounding".to_string(), Value::from(compounding.periods()));
                }
                value
            }
            Err(e) => Value::Error(e),
        }
    }
}

// ============ PPF ============

pub struct Ppf;

static PPF_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("yearly_investment", "Number", "Amount deposited every year"),
    ArgMeta::optional("years", "Number", "Whole years of contributions, at most 50", "15"),
];

static PPF_EXAMPLES: [&str; 1] = ["ppf(150000) → maturity_amount 4068209.22"];

static PPF_RELATED: [&str; 2] = ["fixed_deposit", "sip"];

fn ppf_from_args(args: &[Value]) -> Result<MaturityResult, FinpilotError> {
    let contribution = require_number(args, 0, "ppf", "yearly_investment")?;
    require_positive(&contribution, "ppf", "yearly_investment")?;
    let years = match optional_number(args, 1, "ppf", "years")? {
        Some(y) => require_count_at_most(&y, PPF_MAX_YEARS, "ppf", "years")?,
        None => PPF_DEFAULT_YEARS,
    };
    Ok(calculate_ppf(&contribution, years))
}

impl CalculatorPlugin for Ppf {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "ppf",
            description: "Public Provident Fund maturity at the fixed 7.1% rate",
            usage: "ppf(yearly_investment, [years])",
            args: &PPF_ARGS,
            returns: &["maturity_amount", "invested", "interest", "rate"],
            examples: &PPF_EXAMPLES,
            category: "savings",
            related: &PPF_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match ppf_from_args(args) {
            Ok(r) => {
                let mut value = r.into_value("interest");
                if let Value::Object(ref mut fields) = value {
                    fields.insert("rate".to_string(), Value::Number(ppf_rate()));
                }
                value
            }
            Err(e) => Value::Error(e),
        }
    }
}
