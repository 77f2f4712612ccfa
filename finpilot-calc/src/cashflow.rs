//! Cash flow series: parsing and discounting

use finpilot_core::{FinpilotError, Number, Value};

/// Ordered per-period cash flows, index 0 at t = 0.
/// Negative entries are outflows (investments), positive are inflows.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowSeries {
    flows: Vec<Number>,
}

impl CashFlowSeries {
    /// Needs at least two flows to describe a return
    pub fn new(flows: Vec<Number>, calc: &str, arg: &str) -> Result<Self, FinpilotError> {
        if flows.len() < 2 {
            return Err(FinpilotError::invalid_input(
                calc,
                arg,
                format!("needs at least 2 cash flows, got {}", flows.len()),
            )
            .with_suggestion("Enter comma-separated values, e.g. -100000, 25000, 30000"));
        }
        Ok(Self { flows })
    }

    /// Parse "-100000, 25000, 30000": split on commas, trim, every entry a number
    pub fn parse(text: &str, calc: &str, arg: &str) -> Result<Self, FinpilotError> {
        let flows = text
            .split(',')
            .enumerate()
            .map(|(i, part)| {
                let part = part.trim();
                Number::from_str(part).map_err(|_| {
                    FinpilotError::invalid_input(
                        calc,
                        arg,
                        format!("entry {} is not a number: '{}'", i + 1, part),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(flows, calc, arg)
    }

    /// Accepts the comma-separated text form or a list of numbers
    pub fn from_value(value: &Value, calc: &str, arg: &str) -> Result<Self, FinpilotError> {
        match value {
            Value::Text(s) if s.trim().is_empty() => Err(FinpilotError::missing_input(calc, arg)),
            Value::Text(s) => Self::parse(s, calc, arg),
            Value::List(items) => {
                let flows = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match item.to_number() {
                        Value::Number(n) => Ok(n),
                        _ => Err(FinpilotError::invalid_input(
                            calc,
                            arg,
                            format!("entry {} is not a number", i + 1),
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Self::new(flows, calc, arg)
            }
            Value::Null => Err(FinpilotError::missing_input(calc, arg)),
            Value::Error(e) => Err(e.clone()),
            other => Err(FinpilotError::arg_type(calc, arg, "List or Text", other.type_name())),
        }
    }

    pub fn flows(&self) -> &[Number] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// True when the series has both an outflow and an inflow
    pub fn has_sign_change(&self) -> bool {
        self.flows.iter().any(Number::is_negative) && self.flows.iter().any(Number::is_positive)
    }

    /// Each flow discounted to t = 0: CF_i / (1 + r)^i
    pub fn discounted(&self, rate: &Number) -> Result<Vec<Number>, FinpilotError> {
        let base = Number::one().add(rate);
        let mut discount = Number::one();
        let mut values = Vec::with_capacity(self.flows.len());
        for (i, cf) in self.flows.iter().enumerate() {
            if i > 0 {
                discount = discount.mul(&base);
            }
            values.push(cf.checked_div(&discount)?);
        }
        Ok(values)
    }

    /// NPV(r) = sum CF_i / (1 + r)^i
    pub fn npv(&self, rate: &Number) -> Result<Number, FinpilotError> {
        Ok(self
            .discounted(rate)?
            .iter()
            .fold(Number::zero(), |total, v| total.add(v)))
    }

    /// dNPV/dr = sum -i * CF_i / (1 + r)^(i+1)
    pub fn npv_derivative(&self, rate: &Number) -> Result<Number, FinpilotError> {
        let base = Number::one().add(rate);
        let mut total = Number::zero();
        let mut discount = base.clone();
        for (i, cf) in self.flows.iter().enumerate().skip(1) {
            discount = discount.mul(&base);
            let term = cf.mul(&Number::from_i64(i as i64)).checked_div(&discount)?;
            total = total.sub(&term);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finpilot_core::codes;

    #[test]
    fn test_parse_trims_entries() {
        let series = CashFlowSeries::parse(" -100000 ,25000,  30000 ", "irr", "cash_flows").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.flows()[0].to_i64(), Some(-100000));
        assert_eq!(series.flows()[2].to_i64(), Some(30000));
    }

    #[test]
    fn test_parse_rejects_short_series() {
        let err = CashFlowSeries::parse("-100000", "irr", "cash_flows").unwrap_err();
        assert_eq!(err.code, codes::INVALID_INPUT);
    }

    #[test]
    fn test_parse_rejects_bad_entry() {
        let err = CashFlowSeries::parse("-100000, abc, 3000", "irr", "cash_flows").unwrap_err();
        assert!(err.message.contains("entry 2"));

        // an empty entry between commas is not a zero
        assert!(CashFlowSeries::parse("-100000,,3000", "irr", "cash_flows").is_err());
    }

    #[test]
    fn test_from_list() {
        let list = Value::List(vec![Value::from(-1000i64), Value::from("1100")]);
        let series = CashFlowSeries::from_value(&list, "irr", "cash_flows").unwrap();
        assert_eq!(series.len(), 2);
        assert!(series.has_sign_change());
    }

    #[test]
    fn test_sign_change() {
        let all_positive = CashFlowSeries::parse("100, 200, 300", "irr", "cash_flows").unwrap();
        assert!(!all_positive.has_sign_change());
    }

    #[test]
    fn test_npv_at_ten_percent() {
        // -1000 + 1100/1.1 = 0
        let series = CashFlowSeries::parse("-1000, 1100", "npv", "cash_flows").unwrap();
        let npv = series.npv(&Number::from_str("0.1").unwrap()).unwrap();
        assert!(npv.abs() < Number::from_str("0.0000001").unwrap());
    }

    #[test]
    fn test_npv_derivative() {
        // d/dr [-1000 + 1100/(1+r)] = -1100/(1+r)^2 -> -1100 at r = 0
        let series = CashFlowSeries::parse("-1000, 1100", "npv", "cash_flows").unwrap();
        let d = series.npv_derivative(&Number::zero()).unwrap();
        assert_eq!(d.to_i64(), Some(-1100));
    }
}
