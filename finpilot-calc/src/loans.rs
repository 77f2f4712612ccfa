//! Loan amortization: emi, amortization

use finpilot_plugin::prelude::*;
use crate::helpers::*;

/// Longest loan tenure accepted, in years
pub const MAX_LOAN_YEARS: i64 = 50;

/// Validated loan inputs
#[derive(Debug, Clone)]
pub struct LoanTerms {
    pub principal: Number,
    /// Nominal annual rate, percent
    pub annual_rate: Number,
    pub months: u32,
}

impl LoanTerms {
    /// Build from (principal, annual_rate, years); tenure becomes years × 12 months
    pub fn from_args(args: &[Value], calc: &str) -> Result<Self, FinpilotError> {
        let principal = require_number(args, 0, calc, "principal")?;
        let annual_rate = require_number(args, 1, calc, "annual_rate")?;
        let years = require_number(args, 2, calc, "years")?;

        require_positive(&principal, calc, "principal")?;
        require_non_negative(&annual_rate, calc, "annual_rate")?;
        require_positive(&years, calc, "years")?;
        if years > Number::from_i64(MAX_LOAN_YEARS) {
            return Err(FinpilotError::invalid_input(
                calc,
                "years",
                format!("must be at most {} years, got {}", MAX_LOAN_YEARS, years),
            ));
        }

        let months = years.mul(&Number::from_i64(12));
        let months = require_count(&months, calc, "years").map_err(|_| {
            FinpilotError::invalid_input(calc, "years", format!("must cover a whole number of months, got {}", years))
        })?;

        Ok(Self { principal, annual_rate, months })
    }

    /// i = r / 12 / 100
    pub fn monthly_rate(&self) -> Number {
        monthly_rate(&self.annual_rate)
    }
}

#[derive(Debug, Clone)]
pub struct EmiResult {
    pub emi: Number,
    pub total_payment: Number,
    pub total_interest: Number,
    pub months: u32,
}

impl From<EmiResult> for Value {
    fn from(r: EmiResult) -> Self {
        Value::object([
            ("emi", Value::Number(r.emi)),
            ("total_payment", Value::Number(r.total_payment)),
            ("total_interest", Value::Number(r.total_interest)),
            ("months", Value::from(r.months as i64)),
        ])
    }
}

/// EMI = P·i·(1+i)^n / ((1+i)^n − 1)
pub fn calculate_emi(terms: &LoanTerms, precision: u32) -> Result<EmiResult, FinpilotError> {
    let i = terms.monthly_rate();
    if i.is_zero() {
        return Err(FinpilotError::domain_error("EMI is undefined at a 0% interest rate")
            .in_calculator("emi")
            .for_argument("annual_rate")
            .with_suggestion("Enter an interest rate greater than 0"));
    }

    let n = Number::from_i64(terms.months as i64);
    let factor = compound_factor(&i, &n, precision)?;
    let emi = terms
        .principal
        .mul(&i)
        .mul(&factor)
        .checked_div(&factor.sub(&Number::one()))?;

    let total_payment = emi.mul(&n);
    let total_interest = total_payment.sub(&terms.principal);

    Ok(EmiResult { emi, total_payment, total_interest, months: terms.months })
}

/// One month of an amortization schedule
#[derive(Debug, Clone)]
pub struct ScheduleRow {
    pub period: u32,
    pub payment: Number,
    pub principal: Number,
    pub interest: Number,
    pub balance: Number,
}

impl From<ScheduleRow> for Value {
    fn from(row: ScheduleRow) -> Self {
        Value::object([
            ("period", Value::from(row.period as i64)),
            ("payment", Value::Number(row.payment)),
            ("principal", Value::Number(row.principal)),
            ("interest", Value::Number(row.interest)),
            ("balance", Value::Number(row.balance)),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct AmortizationSchedule {
    pub summary: EmiResult,
    pub rows: Vec<ScheduleRow>,
    /// Principal repaid over the rows shown
    pub principal_paid: Number,
    /// Interest paid over the rows shown
    pub interest_paid: Number,
}

impl From<AmortizationSchedule> for Value {
    fn from(s: AmortizationSchedule) -> Self {
        let months_shown = s.rows.len() as i64;
        Value::object([
            ("emi", Value::Number(s.summary.emi)),
            ("total_payment", Value::Number(s.summary.total_payment)),
            ("total_interest", Value::Number(s.summary.total_interest)),
            ("months", Value::from(s.summary.months as i64)),
            ("months_shown", Value::from(months_shown)),
            ("principal_paid", Value::Number(s.principal_paid)),
            ("interest_paid", Value::Number(s.interest_paid)),
            ("schedule", Value::from(s.rows)),
        ])
    }
}

/// Month-by-month split of each EMI into interest and principal, for the
/// first `horizon` months (capped at the tenure). Stops early once the
/// balance is paid off.
pub fn amortization_schedule(
    terms: &LoanTerms,
    horizon: u32,
    precision: u32,
) -> Result<AmortizationSchedule, FinpilotError> {
    let summary = calculate_emi(terms, precision)?;
    let i = terms.monthly_rate();

    let mut balance = terms.principal.clone();
    let mut rows = Vec::new();
    let mut principal_paid = Number::zero();
    let mut interest_paid = Number::zero();

    for period in 1..=horizon.min(terms.months) {
        let interest = balance.mul(&i);
        let principal = summary.emi.sub(&interest);
        balance = balance.sub(&principal);
        if balance.is_negative() {
            balance = Number::zero();
        }

        principal_paid = principal_paid.add(&principal);
        interest_paid = interest_paid.add(&interest);
        rows.push(ScheduleRow {
            period,
            payment: summary.emi.clone(),
            principal,
            interest,
            balance: balance.clone(),
        });

        if balance.is_zero() {
            break;
        }
    }

    Ok(AmortizationSchedule { summary, rows, principal_paid, interest_paid })
}

// ============ EMI ============

pub struct Emi;

static EMI_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("principal", "Number", "Loan amount"),
    ArgMeta::required("annual_rate", "Number", "Nominal annual interest rate, percent"),
    ArgMeta::required("years", "Number", "Loan tenure in years, at most 50"),
];

static EMI_EXAMPLES: [&str; 2] = [
    "emi(1000000, 8.5, 20) → emi 8678.23",
    "emi(500000, 10, 5) → emi 10623.52",
];

static EMI_RELATED: [&str; 2] = ["amortization", "debt_summary"];

impl CalculatorPlugin for Emi {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "emi",
            description: "Equated monthly instalment for a loan",
            usage: "emi(principal, annual_rate, years)",
            args: &EMI_ARGS,
            returns: &["emi", "total_payment", "total_interest", "months"],
            examples: &EMI_EXAMPLES,
            category: "loans",
            related: &EMI_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        respond(LoanTerms::from_args(args, "emi").and_then(|terms| calculate_emi(&terms, ctx.precision)))
    }
}

// ============ Amortization ============

pub struct Amortization;

static AMORTIZATION_ARGS: [ArgMeta; 4] = [
    ArgMeta::required("principal", "Number", "Loan amount"),
    ArgMeta::required("annual_rate", "Number", "Nominal annual interest rate, percent"),
    ArgMeta::required("years", "Number", "Loan tenure in years, at most 50"),
    ArgMeta::optional("months_to_show", "Number", "Schedule rows to produce", "12"),
];

static AMORTIZATION_EXAMPLES: [&str; 2] = [
    "amortization(1000000, 8.5, 20) → first 12 months",
    "amortization(100000, 12, 1, 12) → full 12 month schedule",
];

static AMORTIZATION_RELATED: [&str; 1] = ["emi"];

const DEFAULT_MONTHS_TO_SHOW: u32 = 12;

impl CalculatorPlugin for Amortization {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "amortization",
            description: "Month-by-month loan schedule: interest, principal and balance",
            usage: "amortization(principal, annual_rate, years, [months_to_show])",
            args: &AMORTIZATION_ARGS,
            returns: &[
                "emi", "total_payment", "total_interest", "months", "months_shown",
                "principal_paid", "interest_paid", "schedule",
            ],
            examples: &AMORTIZATION_EXAMPLES,
            category: "loans",
            related: &AMORTIZATION_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let result = LoanTerms::from_args(args, "amortization").and_then(|terms| {
            let horizon = match optional_number(args, 3, "amortization", "months_to_show")? {
                Some(n) => require_count(&n, "amortization", "months_to_show")?,
                None => DEFAULT_MONTHS_TO_SHOW,
            };
            amortization_schedule(&terms, horizon, ctx.precision)
        });
        respond(result)
    }
}
