//! Argument extraction, validation and shared numerics
//!
//! This is the parse-and-validate boundary: raw form values (numbers or
//! strings) become typed `Number`s here, and nothing unchecked reaches a
//! formula.

use finpilot_core::{FinpilotError, Number, Value};

/// The argument at `index`, or None if absent, null or a blank string
fn present(args: &[Value], index: usize) -> Option<&Value> {
    match args.get(index) {
        None | Some(Value::Null) => None,
        Some(Value::Text(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    }
}

fn coerce_number(value: &Value, calc: &str, arg: &str) -> Result<Number, FinpilotError> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        Value::Text(s) => Number::from_str(s).map_err(|_| {
            FinpilotError::invalid_input(calc, arg, format!("must be a number, got '{}'", s.trim()))
        }),
        Value::Error(e) => Err(e.clone()),
        other => Err(FinpilotError::arg_type(calc, arg, "Number", other.type_name())),
    }
}

/// Required numeric input
pub fn require_number(args: &[Value], index: usize, calc: &str, arg: &str) -> Result<Number, FinpilotError> {
    match present(args, index) {
        Some(v) => coerce_number(v, calc, arg),
        None => Err(FinpilotError::missing_input(calc, arg)),
    }
}

/// Optional numeric input: None when blank, an error when unparseable
pub fn optional_number(args: &[Value], index: usize, calc: &str, arg: &str) -> Result<Option<Number>, FinpilotError> {
    present(args, index)
        .map(|v| coerce_number(v, calc, arg))
        .transpose()
}

/// Optional text input, trimmed and lowercased
pub fn optional_choice(args: &[Value], index: usize, calc: &str, arg: &str) -> Result<Option<String>, FinpilotError> {
    match present(args, index) {
        None => Ok(None),
        Some(Value::Text(s)) => Ok(Some(s.trim().to_lowercase())),
        Some(Value::Error(e)) => Err(e.clone()),
        Some(other) => Err(FinpilotError::arg_type(calc, arg, "Text", other.type_name())),
    }
}

pub fn require_positive(n: &Number, calc: &str, arg: &str) -> Result<(), FinpilotError> {
    if n.is_positive() {
        Ok(())
    } else {
        Err(FinpilotError::invalid_input(calc, arg, format!("must be greater than 0, got {}", n)))
    }
}

pub fn require_non_negative(n: &Number, calc: &str, arg: &str) -> Result<(), FinpilotError> {
    if n.is_negative() {
        Err(FinpilotError::invalid_input(calc, arg, format!("must not be negative, got {}", n)))
    } else {
        Ok(())
    }
}

/// Whole, positive count (years, months, periods)
pub fn require_count(n: &Number, calc: &str, arg: &str) -> Result<u32, FinpilotError> {
    require_positive(n, calc, arg)?;
    n.to_i64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| FinpilotError::invalid_input(calc, arg, format!("must be a whole number, got {}", n)))
}

/// Whole, positive count no larger than `max`
pub fn require_count_at_most(n: &Number, max: u32, calc: &str, arg: &str) -> Result<u32, FinpilotError> {
    if n > &Number::from_i64(max as i64) {
        return Err(FinpilotError::invalid_input(calc, arg, format!("must be at most {}, got {}", max, n)));
    }
    require_count(n, calc, arg)
}

/// Percentage to fraction: 8.5 -> 0.085
pub fn percent(n: &Number) -> Number {
    n.mul(&Number::from_ratio(1, 100))
}

/// Nominal annual percentage to monthly fraction: r/12/100
pub fn monthly_rate(annual_percent: &Number) -> Number {
    annual_percent.mul(&Number::from_ratio(1, 1200))
}

/// (1 + rate)^nper; whole nper is exact, fractional nper goes through ln/exp
pub fn compound_factor(rate: &Number, nper: &Number, precision: u32) -> Result<Number, FinpilotError> {
    Ok(Number::one().add(rate).pow_real(nper, precision)?)
}

/// Turn a calculator outcome into the Value handed back to callers
pub fn respond<T: Into<Value>>(result: Result<T, FinpilotError>) -> Value {
    match result {
        Ok(v) => v.into(),
        Err(e) => Value::Error(e),
    }
}

/// Converged root of a Newton-Raphson search
#[derive(Debug, Clone)]
pub struct Root {
    pub value: Number,
    pub iterations: usize,
}

/// Newton-Raphson iteration.
///
/// Stops when |f(x)| < tol, or when the step is smaller than tol; a
/// step-size stop takes one more refinement step so the returned root
/// satisfies the residual test too. Errors from `f`/`df` propagate, a zero
/// derivative or an exhausted iteration cap is `NO_CONVERGENCE`.
pub fn newton_raphson<F, D>(
    guess: Number,
    f: F,
    df: D,
    max_iter: usize,
    tol: &Number,
) -> Result<Root, FinpilotError>
where
    F: Fn(&Number) -> Result<Number, FinpilotError>,
    D: Fn(&Number) -> Result<Number, FinpilotError>,
{
    let mut x = guess;

    for iteration in 1..=max_iter {
        let fx = f(&x)?;
        if &fx.abs() < tol {
            return Ok(Root { value: x, iterations: iteration });
        }

        let dfx = df(&x)?;
        if dfx.is_zero() {
            return Err(FinpilotError::no_convergence(format!(
                "derivative vanished at iteration {}",
                iteration
            )));
        }

        let step = fx.checked_div(&dfx)?;
        let next = x.sub(&step);

        if &step.abs() < tol {
            let refined = match (f(&next), df(&next)) {
                (Ok(fy), Ok(dfy)) if !dfy.is_zero() => next.sub(&fy.checked_div(&dfy)?),
                _ => next,
            };
            return Ok(Root { value: refined, iterations: iteration });
        }

        x = next;
    }

    Err(FinpilotError::no_convergence(format!(
        "did not converge within {} iterations",
        max_iter
    )))
}
