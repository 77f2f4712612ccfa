//! Progressive income tax under the old and new regimes, with 4% cess

use finpilot_plugin::prelude::*;
use crate::helpers::*;

/// A band of taxable income charged at one rate
#[derive(Debug, Clone, Copy)]
pub struct Slab {
    pub lower: i64,
    /// None for the top band
    pub upper: Option<i64>,
    pub rate_percent: i64,
}

const fn slab(lower: i64, upper: i64, rate_percent: i64) -> Slab {
    Slab { lower, upper: Some(upper), rate_percent }
}

const fn top(lower: i64, rate_percent: i64) -> Slab {
    Slab { lower, upper: None, rate_percent }
}

static OLD_REGIME_SLABS: [Slab; 3] = [
    slab(250_000, 500_000, 5),
    slab(500_000, 1_000_000, 20),
    top(1_000_000, 30),
];

static NEW_REGIME_SLABS: [Slab; 5] = [
    slab(300_000, 600_000, 5),
    slab(600_000, 900_000, 10),
    slab(900_000, 1_200_000, 15),
    slab(1_200_000, 1_500_000, 20),
    top(1_500_000, 30),
];

/// Health and education cess on top of slab tax, percent
const CESS_PERCENT: i64 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaxRegime {
    #[default]
    Old,
    New,
}

impl TaxRegime {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "old" => Some(Self::Old),
            "new" => Some(Self::New),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Old => "old",
            Self::New => "new",
        }
    }

    pub fn slabs(self) -> &'static [Slab] {
        match self {
            Self::Old => &OLD_REGIME_SLABS,
            Self::New => &NEW_REGIME_SLABS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaxInput {
    pub income: Number,
    pub deductions: Number,
    pub regime: TaxRegime,
}

impl TaxInput {
    pub fn from_args(args: &[Value]) -> Result<Self, FinpilotError> {
        let income = require_number(args, 0, "tax", "income")?;
        let deductions = optional_number(args, 1, "tax", "deductions")?.unwrap_or_else(Number::zero);
        let regime = match optional_choice(args, 2, "tax", "regime")? {
            None => TaxRegime::default(),
            Some(s) => TaxRegime::parse(&s).ok_or_else(|| {
                FinpilotError::invalid_input("tax", "regime", format!("must be 'old' or 'new', got '{}'", s))
            })?,
        };

        require_non_negative(&income, "tax", "income")?;
        require_non_negative(&deductions, "tax", "deductions")?;

        Ok(Self { income, deductions, regime })
    }

    /// max(0, income − deductions)
    pub fn taxable_income(&self) -> Number {
        let taxable = self.income.sub(&self.deductions);
        if taxable.is_negative() {
            Number::zero()
        } else {
            taxable
        }
    }
}

/// Tax charged within one slab
#[derive(Debug, Clone)]
pub struct SlabCharge {
    pub slab: Slab,
    pub amount: Number,
    pub tax: Number,
}

impl From<SlabCharge> for Value {
    fn from(c: SlabCharge) -> Self {
        let band = match c.slab.upper {
            Some(upper) => format!("{} - {}", c.slab.lower, upper),
            None => format!("above {}", c.slab.lower),
        };
        Value::object([
            ("slab", Value::from(band)),
            ("rate", Value::from(c.slab.rate_percent)),
            ("amount", Value::Number(c.amount)),
            ("tax", Value::Number(c.tax)),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct TaxResult {
    pub regime: TaxRegime,
    pub taxable_income: Number,
    pub slab_tax: Number,
    pub cess: Number,
    pub total_tax: Number,
    pub net_income: Number,
    /// Total tax as a percent of gross income
    pub effective_rate: Number,
    /// Slabs that actually carry income
    pub breakdown: Vec<SlabCharge>,
}

impl From<TaxResult> for Value {
    fn from(r: TaxResult) -> Self {
        Value::object([
            ("regime", Value::from(r.regime.name())),
            ("taxable_income", Value::Number(r.taxable_income)),
            ("slab_tax", Value::Number(r.slab_tax)),
            ("cess", Value::Number(r.cess)),
            ("total_tax", Value::Number(r.total_tax)),
            ("net_income", Value::Number(r.net_income)),
            ("effective_rate", Value::Number(r.effective_rate)),
            ("breakdown", Value::from(r.breakdown)),
        ])
    }
}

/// Charge each slab on the part of taxable income inside it
pub fn slab_charges(taxable: &Number, slabs: &[Slab]) -> Vec<SlabCharge> {
    slabs
        .iter()
        .filter_map(|s| {
            let lower = Number::from_i64(s.lower);
            if taxable <= &lower {
                return None;
            }
            let ceiling = match s.upper {
                Some(upper) => std::cmp::min(taxable.clone(), Number::from_i64(upper)),
                None => taxable.clone(),
            };
            let amount = ceiling.sub(&lower);
            let tax = amount.mul(&Number::from_ratio(s.rate_percent, 100));
            Some(SlabCharge { slab: *s, amount, tax })
        })
        .collect()
}

pub fn calculate_tax(input: &TaxInput) -> Result<TaxResult, FinpilotError> {
    let taxable_income = input.taxable_income();
    let breakdown = slab_charges(&taxable_income, input.regime.slabs());

    let slab_tax = breakdown.iter().fold(Number::zero(), |total, c| total.add(&c.tax));
    let cess = slab_tax.mul(&Number::from_ratio(CESS_PERCENT, 100));
    let total_tax = slab_tax.add(&cess);
    let net_income = input.income.sub(&total_tax);
    let effective_rate = if input.income.is_zero() {
        Number::zero()
    } else {
        total_tax.checked_div(&input.income)?.mul(&Number::from_i64(100))
    };

    Ok(TaxResult {
        regime: input.regime,
        taxable_income,
        slab_tax,
        cess,
        total_tax,
        net_income,
        effective_rate,
        breakdown,
    })
}

pub struct Tax;

static TAX_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("income", "Number", "Gross annual income"),
    ArgMeta::optional("deductions", "Number", "Total deductions claimed", "0"),
    ArgMeta::optional("regime", "Text", "Tax regime: old or new", "old"),
];

static TAX_EXAMPLES: [&str; 2] = [
    "tax(1200000, 150000, \"new\") → total_tax 70200",
    "tax(1200000, 150000, \"old\") → total_tax 132600",
];

static TAX_RELATED: [&str; 1] = ["retirement"];

impl CalculatorPlugin for Tax {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "tax",
            description: "Income tax with slab rates and 4% cess",
            usage: "tax(income, [deductions], [regime])",
            args: &TAX_ARGS,
            returns: &[
                "regime", "taxable_income", "slab_tax", "cess", "total_tax",
                "net_income", "effective_rate", "breakdown",
            ],
            examples: &TAX_EXAMPLES,
            category: "tax",
            related: &TAX_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        respond(TaxInput::from_args(args).and_then(|input| calculate_tax(&input)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Number {
        Number::from_str(s).unwrap()
    }

    fn tax(income: &str, deductions: &str, regime: TaxRegime) -> TaxResult {
        calculate_tax(&TaxInput { income: n(income), deductions: n(deductions), regime }).unwrap()
    }

    #[test]
    fn test_new_regime_scenario() {
        let r = tax("1200000", "150000", TaxRegime::New);
        assert_eq!(r.taxable_income.to_i64(), Some(1_050_000));
        assert_eq!(r.slab_tax.to_i64(), Some(67_500));
        assert_eq!(r.cess.to_i64(), Some(2_700));
        assert_eq!(r.total_tax.to_i64(), Some(70_200));
        assert_eq!(r.net_income.to_i64(), Some(1_129_800));
        assert_eq!(r.breakdown.len(), 3);
    }

    #[test]
    fn test_old_regime_scenario() {
        let r = tax("1200000", "150000", TaxRegime::Old);
        assert_eq!(r.slab_tax.to_i64(), Some(127_500));
        assert_eq!(r.total_tax.to_i64(), Some(132_600));
    }

    #[test]
    fn test_zero_income_zero_tax() {
        for regime in [TaxRegime::Old, TaxRegime::New] {
            let r = tax("0", "0", regime);
            assert!(r.total_tax.is_zero());
            assert!(r.effective_rate.is_zero());
            assert!(r.breakdown.is_empty());
        }
    }

    #[test]
    fn test_deductions_above_income() {
        let r = tax("400000", "600000", TaxRegime::Old);
        assert!(r.taxable_income.is_zero());
        assert!(r.total_tax.is_zero());
        assert_eq!(r.net_income.to_i64(), Some(400_000));
    }

    #[test]
    fn test_slab_boundaries() {
        assert!(tax("250000", "0", TaxRegime::Old).total_tax.is_zero());
        assert_eq!(tax("500000", "0", TaxRegime::Old).total_tax.to_i64(), Some(13_000));
        assert!(tax("300000", "0", TaxRegime::New).total_tax.is_zero());

        // top band is uncapped
        let r = tax("2500000", "0", TaxRegime::New);
        assert_eq!(r.slab_tax.to_i64(), Some(15_000 + 30_000 + 45_000 + 60_000 + 300_000));
    }

    #[test]
    fn test_tax_grows_with_income() {
        let mut previous = Number::zero();
        for income in ["0", "300000", "550000", "900000", "1300000", "2000000"] {
            let t = tax(income, "0", TaxRegime::New).total_tax;
            assert!(t >= previous);
            previous = t;
        }
    }

    #[test]
    fn test_call_defaults_and_validation() {
        let ctx = EvalContext::new();
        let result = Tax.call(&[Value::from(1200000i64)], &ctx);
        assert_eq!(result.get("regime").as_text(), Some("old"));

        let result = Tax.call(&[Value::from("1200000"), Value::from("150000"), Value::from(" NEW ")], &ctx);
        assert_eq!(result.get("total_tax").as_number().unwrap().to_i64(), Some(70_200));

        let bad_regime = Tax.call(&[Value::from(1i64), Value::Null, Value::from("flat")], &ctx);
        assert_eq!(bad_regime.as_error().unwrap().code, codes::INVALID_INPUT);

        let negative = Tax.call(&[Value::from(-1i64)], &ctx);
        assert_eq!(negative.as_error().unwrap().code, codes::INVALID_INPUT);
    }

    #[test]
    fn test_out_of_range_income_is_rejected() {
        let ctx = EvalContext::new();
        for income in ["1e9223372036854775800", "1e101"] {
            let result = Tax.call(&[Value::from(income)], &ctx);
            assert_eq!(result.as_error().unwrap().code, codes::INVALID_INPUT, "{}", income);
        }
    }
}
