//! Debt summary across several loans

use finpilot_plugin::prelude::*;
use crate::helpers::*;

/// EMI burden above which a debt-to-income ratio needs watching, percent
const HEALTHY_DTI_LIMIT: i64 = 40;

#[derive(Debug, Clone)]
pub struct Debt {
    pub name: String,
    pub principal: Number,
    pub remaining: Number,
    /// Annual rate, percent
    pub rate: Number,
    pub emi: Number,
}

impl Debt {
    /// Read one {name, principal, remaining, rate, emi} object
    pub fn from_value(value: &Value, position: usize) -> Result<Self, FinpilotError> {
        let calc = "debt_summary";
        let Some(fields) = value.as_object() else {
            return Err(FinpilotError::arg_type(calc, "debts", "Object", value.type_name())
                .with_note(format!("debt {}", position + 1)));
        };

        let name = match fields.get("name") {
            Some(Value::Text(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => format!("Debt {}", position + 1),
        };
        let field = |key: &str| -> Result<Number, FinpilotError> {
            let args = [fields.get(key).cloned().unwrap_or(Value::Null)];
            require_number(&args, 0, calc, key).map_err(|e| e.with_note(format!("in {}", name)))
        };

        let principal = field("principal")?;
        let remaining = field("remaining")?;
        let rate = field("rate")?;
        let emi = field("emi")?;

        let invalid = |arg: &str, details: String| {
            FinpilotError::invalid_input(calc, arg, details).with_note(format!("in {}", name))
        };
        if !principal.is_positive() {
            return Err(invalid("principal", format!("must be greater than 0, got {}", principal)));
        }
        if remaining.is_negative() || remaining > principal {
            return Err(invalid("remaining", format!("must be between 0 and the principal, got {}", remaining)));
        }
        if rate.is_negative() {
            return Err(invalid("rate", format!("must not be negative, got {}", rate)));
        }
        if emi.is_negative() {
            return Err(invalid("emi", format!("must not be negative, got {}", emi)));
        }

        Ok(Self { name, principal, remaining, rate, emi })
    }

    /// (1 − remaining / principal) × 100
    pub fn paid_percent(&self) -> Result<Number, FinpilotError> {
        let share = self.remaining.checked_div(&self.principal)?;
        Ok(Number::one().sub(&share).mul(&Number::from_i64(100)))
    }
}

#[derive(Debug, Clone)]
pub struct DebtSummary {
    pub total_debt: Number,
    pub total_emi: Number,
    pub debt_to_income: Number,
    /// "healthy" below 40% of income, otherwise "monitor"
    pub status: &'static str,
    /// Highest-rate debt, the first to prepay
    pub priority: String,
    pub debts: Vec<(Debt, Number)>,
}

impl From<DebtSummary> for Value {
    fn from(s: DebtSummary) -> Self {
        let debts: Vec<Value> = s
            .debts
            .into_iter()
            .map(|(d, paid)| {
                Value::object([
                    ("name", Value::Text(d.name)),
                    ("remaining", Value::Number(d.remaining)),
                    ("rate", Value::Number(d.rate)),
                    ("emi", Value::Number(d.emi)),
                    ("paid_percent", Value::Number(paid)),
                ])
            })
            .collect();

        Value::object([
            ("total_debt", Value::Number(s.total_debt)),
            ("total_emi", Value::Number(s.total_emi)),
            ("debt_to_income", Value::Number(s.debt_to_income)),
            ("status", Value::from(s.status)),
            ("priority", Value::Text(s.priority)),
            ("debts", Value::List(debts)),
        ])
    }
}

pub fn summarize_debts(debts: Vec<Debt>, monthly_income: &Number) -> Result<DebtSummary, FinpilotError> {
    let total_debt = debts.iter().fold(Number::zero(), |t, d| t.add(&d.remaining));
    let total_emi = debts.iter().fold(Number::zero(), |t, d| t.add(&d.emi));
    let debt_to_income = total_emi.checked_div(monthly_income)?.mul(&Number::from_i64(100));

    // first listed wins a tie
    let priority = debts
        .iter()
        .fold(None::<&Debt>, |best, d| match best {
            Some(b) if b.rate >= d.rate => Some(b),
            _ => Some(d),
        })
        .map(|d| d.name.clone())
        .unwrap_or_default();

    let status = if debt_to_income < Number::from_i64(HEALTHY_DTI_LIMIT) {
        "healthy"
    } else {
        "monitor"
    };

    let debts = debts
        .into_iter()
        .map(|d| {
            let paid = d.paid_percent()?;
            Ok((d, paid))
        })
        .collect::<Result<Vec<_>, FinpilotError>>()?;

    Ok(DebtSummary { total_debt, total_emi, debt_to_income, status, priority, debts })
}

pub struct DebtSummaryCalc;

static DEBT_SUMMARY_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("debts", "List", "Debts as {name, principal, remaining, rate, emi} objects"),
    ArgMeta::required("monthly_income", "Number", "Take-home monthly income"),
];

static DEBT_SUMMARY_EXAMPLES: [&str; 1] = [
    "debt_summary([{name: \"Home Loan\", principal: 2500000, remaining: 2000000, rate: 8.5, emi: 21696}], 100000) → debt_to_income 21.696",
];

static DEBT_SUMMARY_RELATED: [&str; 2] = ["emi", "emergency_fund"];

impl CalculatorPlugin for DebtSummaryCalc {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "debt_summary",
            description: "Total debt, EMI burden and prepayment priority across loans",
            usage: "debt_summary(debts, monthly_income)",
            args: &DEBT_SUMMARY_ARGS,
            returns: &["total_debt", "total_emi", "debt_to_income", "status", "priority", "debts"],
            examples: &DEBT_SUMMARY_EXAMPLES,
            category: "loans",
            related: &DEBT_SUMMARY_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        let result = debts_arg(args).and_then(|debts| {
            let income = require_number(args, 1, "debt_summary", "monthly_income")?;
            require_positive(&income, "debt_summary", "monthly_income")?;
            summarize_debts(debts, &income)
        });
        respond(result)
    }
}

fn debts_arg(args: &[Value]) -> Result<Vec<Debt>, FinpilotError> {
    match args.first() {
        Some(Value::List(items)) if !items.is_empty() => items
            .iter()
            .enumerate()
            .map(|(i, item)| Debt::from_value(item, i))
            .collect(),
        Some(Value::List(_)) => Err(FinpilotError::invalid_input("debt_summary", "debts", "needs at least one debt")),
        None | Some(Value::Null) => Err(FinpilotError::missing_input("debt_summary", "debts")),
        Some(Value::Error(e)) => Err(e.clone()),
        Some(other) => Err(FinpilotError::arg_type("debt_summary", "debts", "List", other.type_name())),
    }
}
