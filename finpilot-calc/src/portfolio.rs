//! Asset allocation simulator

use finpilot_plugin::prelude::*;
use crate::helpers::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    Equity,
    Debt,
    RealEstate,
    Gold,
    Cash,
}

impl AssetClass {
    pub const ALL: [AssetClass; 5] = [
        AssetClass::Equity,
        AssetClass::Debt,
        AssetClass::RealEstate,
        AssetClass::Gold,
        AssetClass::Cash,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Debt => "debt",
            Self::RealEstate => "real_estate",
            Self::Gold => "gold",
            Self::Cash => "cash",
        }
    }

    /// Long-run annual return assumption, percent
    pub fn expected_return(self) -> Number {
        match self {
            Self::Equity => Number::from_ratio(145, 10),
            Self::Debt => Number::from_ratio(72, 10),
            Self::RealEstate => Number::from_ratio(98, 10),
            Self::Gold => Number::from_ratio(65, 10),
            Self::Cash => Number::from_i64(4),
        }
    }

    /// Annual volatility assumption, percent
    pub fn volatility(self) -> Number {
        match self {
            Self::Equity => Number::from_ratio(185, 10),
            Self::Debt => Number::from_ratio(42, 10),
            Self::RealEstate => Number::from_i64(12),
            Self::Gold => Number::from_ratio(158, 10),
            Self::Cash => Number::one(),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One amount per asset class
#[derive(Debug, Clone)]
pub struct AssetMix {
    amounts: [Number; 5],
}

impl AssetMix {
    pub fn new(amounts: [Number; 5]) -> Self {
        Self { amounts }
    }

    /// From an object keyed by asset class, or a list in
    /// equity, debt, real_estate, gold, cash order. Every class is required
    /// and non-negative.
    pub fn from_value(value: &Value, calc: &str, arg: &str) -> Result<Self, FinpilotError> {
        let entries: Vec<Value> = match value {
            Value::Object(fields) => {
                if let Some(unknown) = fields.keys().find(|k| AssetClass::ALL.iter().all(|c| c.key() != k.as_str())) {
                    return Err(FinpilotError::invalid_input(calc, arg, format!("unknown asset class '{}'", unknown))
                        .with_suggestion("Asset classes: equity, debt, real_estate, gold, cash"));
                }
                AssetClass::ALL
                    .iter()
                    .map(|c| fields.get(c.key()).cloned().unwrap_or(Value::Null))
                    .collect()
            }
            Value::List(items) if items.len() == AssetClass::ALL.len() => items.clone(),
            Value::List(items) => {
                return Err(FinpilotError::invalid_input(
                    calc,
                    arg,
                    format!("needs 5 entries (equity, debt, real_estate, gold, cash), got {}", items.len()),
                ))
            }
            Value::Null => return Err(FinpilotError::missing_input(calc, arg)),
            Value::Error(e) => return Err(e.clone()),
            other => return Err(FinpilotError::arg_type(calc, arg, "Object or List", other.type_name())),
        };

        let mut amounts: [Number; 5] = std::array::from_fn(|_| Number::zero());
        for (class, entry) in AssetClass::ALL.iter().zip(entries.iter()) {
            if entry.is_null() {
                return Err(FinpilotError::missing_input(calc, arg)
                    .with_note(format!("no amount for {}", class.key())));
            }
            let amount = match entry.to_number() {
                Value::Number(n) => n,
                _ => {
                    return Err(FinpilotError::invalid_input(
                        calc,
                        arg,
                        format!("{} must be a number", class.key()),
                    ))
                }
            };
            if amount.is_negative() {
                return Err(FinpilotError::invalid_input(
                    calc,
                    arg,
                    format!("{} must not be negative, got {}", class.key(), amount),
                ));
            }
            amounts[class.index()] = amount;
        }

        Ok(Self { amounts })
    }

    pub fn get(&self, class: AssetClass) -> &Number {
        &self.amounts[class.index()]
    }

    pub fn total(&self) -> Number {
        self.amounts.iter().fold(Number::zero(), |t, a| t.add(a))
    }
}

/// Drift level, per class or for the whole portfolio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftStatus {
    Low,
    Medium,
    High,
}

impl DriftStatus {
    pub fn of(drift: &Number) -> Self {
        if drift > &Number::from_i64(5) {
            Self::High
        } else if drift > &Number::from_i64(2) {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Overall health from the largest drift: critical above 10 points,
/// moderate above 5, otherwise good
pub fn portfolio_status(max_drift: &Number) -> &'static str {
    if max_drift > &Number::from_i64(10) {
        "critical"
    } else if max_drift > &Number::from_i64(5) {
        "moderate"
    } else {
        "good"
    }
}

/// Cost of trading back to target, as a fraction of the amount moved
fn rebalancing_cost_rate() -> Number {
    Number::from_ratio(5, 1000)
}

const DEFAULT_HORIZON_YEARS: i64 = 5;

#[derive(Debug, Clone)]
pub struct AllocationInput {
    /// Target weights, percent
    pub target: AssetMix,
    /// Current holdings, money
    pub current: AssetMix,
    pub horizon_years: Number,
}

impl AllocationInput {
    pub fn from_args(args: &[Value]) -> Result<Self, FinpilotError> {
        let calc = "allocation";
        let target = AssetMix::from_value(args.first().unwrap_or(&Value::Null), calc, "target")?;
        let current = AssetMix::from_value(args.get(1).unwrap_or(&Value::Null), calc, "current")?;
        let horizon_years = optional_number(args, 2, calc, "horizon_years")?
            .unwrap_or_else(|| Number::from_i64(DEFAULT_HORIZON_YEARS));

        let weight_total = target.total();
        if weight_total != Number::from_i64(100) {
            return Err(FinpilotError::invalid_input(
                calc,
                "target",
                format!("weights must add up to 100, got {}", weight_total),
            ));
        }
        require_positive(&current.total(), calc, "current")?;
        require_positive(&horizon_years, calc, "horizon_years")?;

        Ok(Self { target, current, horizon_years })
    }
}

#[derive(Debug, Clone)]
pub struct ClassDrift {
    pub class: AssetClass,
    pub target_percent: Number,
    pub current_percent: Number,
    pub drift: Number,
    pub status: DriftStatus,
}

impl From<ClassDrift> for Value {
    fn from(d: ClassDrift) -> Self {
        Value::object([
            ("asset", Value::from(d.class.key())),
            ("target", Value::Number(d.target_percent)),
            ("current", Value::Number(d.current_percent)),
            ("drift", Value::Number(d.drift)),
            ("status", Value::from(d.status.name())),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct AllocationReport {
    /// Percent per year
    pub expected_return: Number,
    /// Percent
    pub risk: Number,
    pub projected_value: Number,
    pub rebalancing_cost: Number,
    pub max_drift: Number,
    pub status: &'static str,
    pub needs_rebalancing: bool,
    pub drifts: Vec<ClassDrift>,
}

impl From<AllocationReport> for Value {
    fn from(r: AllocationReport) -> Self {
        Value::object([
            ("expected_return", Value::Number(r.expected_return)),
            ("risk", Value::Number(r.risk)),
            ("projected_value", Value::Number(r.projected_value)),
            ("rebalancing_cost", Value::Number(r.rebalancing_cost)),
            ("max_drift", Value::Number(r.max_drift)),
            ("status", Value::from(r.status)),
            ("needs_rebalancing", Value::Bool(r.needs_rebalancing)),
            ("allocation", Value::from(r.drifts)),
        ])
    }
}

pub fn simulate_allocation(input: &AllocationInput, precision: u32) -> Result<AllocationReport, FinpilotError> {
    let total = input.current.total();
    let hundred = Number::from_i64(100);

    let mut expected_return = Number::zero();
    let mut variance = Number::zero();
    let mut traded = Number::zero();
    let mut drifts = Vec::with_capacity(AssetClass::ALL.len());

    for class in AssetClass::ALL {
        let weight = percent(input.target.get(class));
        expected_return = expected_return.add(&weight.mul(&class.expected_return()));

        let weighted_vol = weight.mul(&class.volatility());
        variance = variance.add(&weighted_vol.mul(&weighted_vol));

        let current = input.current.get(class);
        traded = traded.add(&current.sub(&weight.mul(&total)).abs());

        let current_percent = current.checked_div(&total)?.mul(&hundred);
        let target_percent = input.target.get(class).clone();
        let drift = current_percent.sub(&target_percent).abs();
        drifts.push(ClassDrift {
            class,
            status: DriftStatus::of(&drift),
            target_percent,
            current_percent,
            drift,
        });
    }

    let risk = variance.sqrt(precision)?;
    let projected_value = total.mul(&compound_factor(&percent(&expected_return), &input.horizon_years, precision)?);
    let max_drift = drifts.iter().map(|d| d.drift.clone()).max().unwrap_or_else(Number::zero);

    Ok(AllocationReport {
        expected_return,
        risk,
        projected_value,
        rebalancing_cost: traded.mul(&rebalancing_cost_rate()),
        status: portfolio_status(&max_drift),
        needs_rebalancing: max_drift > Number::from_i64(5),
        max_drift,
        drifts,
    })
}

pub struct Allocation;

static ALLOCATION_ARGS: [ArgMeta; 3] = [
    ArgMeta::required(
        "target",
        "Object",
        "Target weights in percent: {equity, debt, real_estate, gold, cash}, adding up to 100",
    ),
    ArgMeta::required("current", "Object", "Current holdings per asset class"),
    ArgMeta::optional("horizon_years", "Number", "Projection horizon in years", "5"),
];

static ALLOCATION_EXAMPLES: [&str; 1] = [
    "allocation([60, 20, 10, 5, 5], [700000, 150000, 100000, 30000, 20000]) → expected_return 11.645, status moderate",
];

static ALLOCATION_RELATED: [&str; 2] = ["lumpsum", "cagr"];

impl CalculatorPlugin for Allocation {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "allocation",
            description: "Expected return, risk and drift of a target asset allocation",
            usage: "allocation(target, current, [horizon_years])",
            args: &ALLOCATION_ARGS,
            returns: &[
                "expected_return", "risk", "projected_value", "rebalancing_cost",
                "max_drift", "status", "needs_rebalancing", "allocation",
            ],
            examples: &ALLOCATION_EXAMPLES,
            category: "portfolio",
            related: &ALLOCATION_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        respond(AllocationInput::from_args(args).and_then(|input| simulate_allocation(&input, ctx.precision)))
    }
}
