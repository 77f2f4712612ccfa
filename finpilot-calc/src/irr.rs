//! Discounted cash flow: irr, npv

use finpilot_plugin::prelude::*;
use crate::cashflow::CashFlowSeries;
use crate::helpers::*;

/// Starting rate for the Newton-Raphson search (10%)
fn irr_guess() -> Number {
    Number::from_ratio(1, 10)
}

/// Residual and step tolerance
fn irr_tolerance() -> Number {
    Number::from_ratio(1, 10_000)
}

pub const IRR_MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone)]
pub struct IrrResult {
    /// Periodic rate, percent
    pub irr: Number,
    pub iterations: usize,
    /// NPV at the reported rate
    pub npv: Number,
}

impl From<IrrResult> for Value {
    fn from(r: IrrResult) -> Self {
        Value::object([
            ("irr", Value::Number(r.irr)),
            ("iterations", Value::from(r.iterations as i64)),
            ("npv_at_irr", Value::Number(r.npv)),
        ])
    }
}

/// Rate that zeroes NPV, by Newton-Raphson from 10%.
///
/// A series without both an outflow and an inflow has no such rate and is
/// rejected up front. Iterates at or below -100% make the discount factor
/// meaningless and end the search.
pub fn calculate_irr(series: &CashFlowSeries) -> Result<IrrResult, FinpilotError> {
    if !series.has_sign_change() {
        return Err(FinpilotError::no_convergence(
            "IRR is undefined: cash flows need at least one outflow and one inflow",
        )
        .in_calculator("irr"));
    }

    let floor = Number::from_i64(-1);
    let in_range = |rate: &Number| {
        if rate <= &floor {
            Err(FinpilotError::no_convergence(format!(
                "IRR search left the valid range (rate {}%)",
                rate.mul(&Number::from_i64(100))
            )))
        } else {
            Ok(())
        }
    };

    let root = newton_raphson(
        irr_guess(),
        |rate| {
            in_range(rate)?;
            series.npv(rate)
        },
        |rate| {
            in_range(rate)?;
            series.npv_derivative(rate)
        },
        IRR_MAX_ITERATIONS,
        &irr_tolerance(),
    )
    .map_err(|e| e.in_calculator("irr"))?;

    in_range(&root.value).map_err(|e| e.in_calculator("irr"))?;
    let npv = series.npv(&root.value)?;
    tracing::debug!(iterations = root.iterations, "irr converged");

    Ok(IrrResult {
        irr: root.value.mul(&Number::from_i64(100)),
        iterations: root.iterations,
        npv,
    })
}

#[derive(Debug, Clone)]
pub struct NpvResult {
    pub npv: Number,
    /// Present value of the inflows
    pub inflows: Number,
    /// Present value of the outflows, as a positive amount
    pub outflows: Number,
}

impl From<NpvResult> for Value {
    fn from(r: NpvResult) -> Self {
        Value::object([
            ("npv", Value::Number(r.npv)),
            ("present_value_inflows", Value::Number(r.inflows)),
            ("present_value_outflows", Value::Number(r.outflows)),
        ])
    }
}

/// NPV at `rate_percent`; the first flow is at t = 0 and is not discounted
pub fn calculate_npv(rate_percent: &Number, series: &CashFlowSeries) -> Result<NpvResult, FinpilotError> {
    if rate_percent <= &Number::from_i64(-100) {
        return Err(FinpilotError::invalid_input(
            "npv",
            "rate",
            format!("must be greater than -100, got {}", rate_percent),
        ));
    }

    let discounted = series.discounted(&percent(rate_percent))?;
    let (inflows, outflows) = discounted.iter().fold((Number::zero(), Number::zero()), |(inn, out), v| {
        if v.is_negative() {
            (inn, out.sub(v))
        } else {
            (inn.add(v), out)
        }
    });

    Ok(NpvResult { npv: inflows.sub(&outflows), inflows, outflows })
}

fn cash_flows_arg(args: &[Value], index: usize, calc: &str) -> Result<CashFlowSeries, FinpilotError> {
    match args.get(index) {
        Some(v) => CashFlowSeries::from_value(v, calc, "cash_flows"),
        None => Err(FinpilotError::missing_input(calc, "cash_flows")),
    }
}

// ============ IRR ============

pub struct Irr;

static IRR_ARGS: [ArgMeta; 1] = [ArgMeta::required(
    "cash_flows",
    "List",
    "Per-period cash flows starting at t = 0, as a list or comma-separated text",
)];

static IRR_EXAMPLES: [&str; 2] = [
    "irr(\"-100000, 25000, 30000, 35000, 40000\") → irr 10.48",
    "irr([-1000, 1100]) → irr 10",
];

static IRR_RELATED: [&str; 2] = ["npv", "cagr"];

impl CalculatorPlugin for Irr {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "irr",
            description: "Internal rate of return of a cash flow series",
            usage: "irr(cash_flows)",
            args: &IRR_ARGS,
            returns: &["irr", "iterations", "npv_at_irr"],
            examples: &IRR_EXAMPLES,
            category: "returns",
            related: &IRR_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        respond(cash_flows_arg(args, 0, "irr").and_then(|series| calculate_irr(&series)))
    }
}

// ============ NPV ============

pub struct Npv;

static NPV_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("rate", "Number", "Discount rate per period, percent"),
    ArgMeta::required(
        "cash_flows",
        "List",
        "Per-period cash flows starting at t = 0, as a list or comma-separated text",
    ),
];

static NPV_EXAMPLES: [&str; 1] = ["npv(8, \"-100000, 25000, 30000, 35000, 40000\") → npv 6053.64"];

static NPV_RELATED: [&str; 1] = ["irr"];

impl CalculatorPlugin for Npv {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            name: "npv",
            description: "Net present value of a cash flow series",
            usage: "npv(rate, cash_flows)",
            args: &NPV_ARGS,
            returns: &["npv", "present_value_inflows", "present_value_outflows"],
            examples: &NPV_EXAMPLES,
            category: "returns",
            related: &NPV_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        let result = require_number(args, 0, "npv", "rate").and_then(|rate| {
            let series = cash_flows_arg(args, 1, "npv")?;
            calculate_npv(&rate, &series)
        });
        respond(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Number {
        Number::from_str(s).unwrap()
    }

    fn series(text: &str) -> CashFlowSeries {
        CashFlowSeries::parse(text, "irr", "cash_flows").unwrap()
    }

    #[test]
    fn test_irr_project() {
        let s = series("-100000, 25000, 30000, 35000, 40000");
        let r = calculate_irr(&s).unwrap();
        assert!(r.irr.sub(&n("10.48")).abs() < n("0.01"), "irr = {}", r.irr);
        assert!(r.iterations <= IRR_MAX_ITERATIONS);
        assert!(r.irr.is_positive());
    }

    #[test]
    fn test_irr_zeroes_npv() {
        for text in [
            "-100000, 25000, 30000, 35000, 40000",
            "-1000, 1100",
            "-5000, 1000, 1000, 1000, 1000, 1000, 1000",
            "-20000, 5000, -2000, 12000, 15000",
            "1000, -1100",
        ] {
            let s = series(text);
            let r = calculate_irr(&s).unwrap();
            let rate = r.irr.mul(&n("0.01"));
            assert!(s.npv(&rate).unwrap().abs() < n("0.0001"), "{}: npv at {}%", text, r.irr);
            assert!(r.npv.abs() < n("0.0001"));
        }
    }

    #[test]
    fn test_irr_simple_ten_percent() {
        let r = calculate_irr(&series("-1000, 1100")).unwrap();
        assert!(r.irr.sub(&n("10")).abs() < n("0.0001"));
        assert_eq!(r.iterations, 1);
    }

    #[test]
    fn test_irr_without_sign_change() {
        for text in ["100, 200, 300", "-100, -200, -300", "0, 0"] {
            let err = calculate_irr(&series(text)).unwrap_err();
            assert_eq!(err.code, codes::NO_CONVERGENCE);
            assert_eq!(err.suggestion.as_deref(), Some("Please check your cash flows"));
        }
    }

    #[test]
    fn test_irr_no_real_root() {
        // 100 - 300/(1+r) + 250/(1+r)^2 has a negative discriminant
        let err = calculate_irr(&series("100, -300, 250")).unwrap_err();
        assert_eq!(err.code, codes::NO_CONVERGENCE);
        assert_eq!(err.suggestion.as_deref(), Some("Please check your cash flows"));
    }

    #[test]
    fn test_irr_iteration_cap() {
        // the root sits near 1e40; each Newton step only doubles 1 + r
        let err = calculate_irr(&series("-1, 1e40")).unwrap_err();
        assert_eq!(err.code, codes::NO_CONVERGENCE);
        assert!(err.message.contains(&IRR_MAX_ITERATIONS.to_string()), "{}", err.message);
    }

    #[test]
    fn test_irr_call_accepts_text_and_list() {
        let ctx = EvalContext::new();
        let text = Irr.call(&[Value::from("-1000, 1100")], &ctx);
        let list = Irr.call(&[Value::List(vec![Value::from(-1000i64), Value::from(1100i64)])], &ctx);
        assert_eq!(text.get("irr").as_number(), list.get("irr").as_number());

        let short = Irr.call(&[Value::from("-1000")], &ctx);
        assert_eq!(short.as_error().unwrap().code, codes::INVALID_INPUT);
        assert_eq!(Irr.call(&[], &ctx).as_error().unwrap().code, codes::MISSING_INPUT);
    }

    #[test]
    fn test_npv() {
        let s = series("-100000, 25000, 30000, 35000, 40000");
        let r = calculate_npv(&n("8"), &s).unwrap();
        assert!(r.npv.sub(&n("6053.64")).abs() < n("0.01"), "npv = {}", r.npv);
        assert_eq!(r.outflows.to_i64(), Some(100000));
        assert_eq!(r.npv, r.inflows.sub(&r.outflows));
    }

    #[test]
    fn test_npv_at_zero_rate_is_plain_sum() {
        let r = calculate_npv(&Number::zero(), &series("-100, 40, 40, 40")).unwrap();
        assert_eq!(r.npv.to_i64(), Some(20));
    }

    #[test]
    fn test_npv_rejects_total_discount() {
        let err = calculate_npv(&n("-100"), &series("-100, 200")).unwrap_err();
        assert_eq!(err.code, codes::INVALID_INPUT);
    }
}
