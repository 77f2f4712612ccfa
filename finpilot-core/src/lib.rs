//! FinPilot Core - Fundamental types
//!
//! - `Number`: arbitrary precision decimal numbers
//! - `Value`: runtime values (numbers, text, objects, errors)
//! - `FinpilotError`: structured errors with machine-readable codes

mod number;
mod value;
mod error;

pub use number::{Number, NumberError};
pub use value::Value;
pub use error::{FinpilotError, ErrorContext, Severity, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Number, Value, FinpilotError, Severity};
    pub use crate::error::codes;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &Number, b: &str, tol: &str) -> bool {
        let b = Number::from_str(b).unwrap();
        a.sub(&b).abs() < Number::from_str(tol).unwrap()
    }

    mod number_tests {
        use super::*;

        #[test]
        fn test_from_i64() {
            let n = Number::from_i64(42);
            assert_eq!(n.to_i64(), Some(42));
        }

        #[test]
        fn test_from_str_integer() {
            let n = Number::from_str("1000000").unwrap();
            assert_eq!(n.to_i64(), Some(1_000_000));
        }

        #[test]
        fn test_from_str_decimal() {
            let n = Number::from_str("8.5").unwrap();
            assert!(!n.is_integer());
        }

        #[test]
        fn test_from_str_trims_whitespace() {
            let n = Number::from_str("  -25000 ").unwrap();
            assert_eq!(n.to_i64(), Some(-25000));
        }

        #[test]
        fn test_from_str_scientific() {
            assert_eq!(Number::from_str("1.5e2").unwrap().to_i64(), Some(150));
            assert_eq!(Number::from_str("15e5").unwrap().to_i64(), Some(1_500_000));
        }

        #[test]
        fn test_from_str_rejects_garbage() {
            assert!(Number::from_str("").is_err());
            assert!(Number::from_str("   ").is_err());
            assert!(Number::from_str("abc").is_err());
            assert!(Number::from_str("12abc").is_err());
        }

        #[test]
        fn test_arithmetic() {
            let a = Number::from_i64(50);
            let b = Number::from_i64(8);
            assert_eq!(a.add(&b).to_i64(), Some(58));
            assert_eq!(a.sub(&b).to_i64(), Some(42));
            assert_eq!(a.mul(&b).to_i64(), Some(400));
            assert_eq!(a.neg().to_i64(), Some(-50));
        }

        #[test]
        fn test_checked_div() {
            let a = Number::from_i64(84);
            assert_eq!(a.checked_div(&Number::from_i64(2)).unwrap().to_i64(), Some(42));
            assert!(a.checked_div(&Number::zero()).is_err());
        }

        #[test]
        fn test_pow() {
            let n = Number::from_i64(2);
            assert_eq!(n.pow(10).unwrap().to_i64(), Some(1024));
            assert_eq!(n.pow(0).unwrap().to_i64(), Some(1));
            assert!(close(&n.pow(-2).unwrap(), "0.25", "0.0000001"));
            assert!(Number::zero().pow(-1).is_err());
        }

        #[test]
        fn test_pow_compound_factor() {
            // (1 + 0.085/12)^240, the 20 year home loan factor
            let i = Number::from_str("0.085").unwrap().checked_div(&Number::from_i64(12)).unwrap();
            let factor = Number::one().add(&i).pow(240).unwrap();
            assert!(close(&factor, "5.4412", "0.001"), "got {}", factor);
        }

        #[test]
        fn test_pow_real_fractional() {
            // 2^(1/5), the 5 year doubling growth factor
            let two = Number::from_i64(2);
            let fifth = Number::from_ratio(1, 5);
            let result = two.pow_real(&fifth, 50).unwrap();
            assert!(close(&result, "1.148698", "0.000001"), "got {}", result);
        }

        #[test]
        fn test_pow_real_negative_base_is_domain_error() {
            let base = Number::from_i64(-2);
            let half = Number::from_ratio(1, 2);
            assert!(matches!(base.pow_real(&half, 50), Err(NumberError::DomainError(_))));
            // Whole exponents are fine on a negative base
            assert_eq!(base.pow_real(&Number::from_i64(3), 50).unwrap().to_i64(), Some(-8));
        }

        #[test]
        fn test_pow_real_zero_base() {
            let half = Number::from_ratio(1, 2);
            assert!(Number::zero().pow_real(&half, 50).unwrap().is_zero());
        }

        #[test]
        fn test_pow_real_out_of_range() {
            let base = Number::from_str("1.12").unwrap();
            let years = Number::from_str("1e100").unwrap();
            assert!(matches!(base.pow_real(&years, 50), Err(NumberError::DomainError(_))));
        }

        #[test]
        fn test_from_str_rejects_extreme_magnitudes() {
            for literal in ["1e9223372036854775800", "1e101", "-2.5e-101", "1e99999999999999999999"] {
                assert!(matches!(Number::from_str(literal), Err(NumberError::ParseError(_))), "{}", literal);
            }
            let long = format!("1{}", "0".repeat(101));
            assert!(Number::from_str(&long).is_err());

            assert_eq!(Number::from_str("1e100").unwrap().as_decimal(0).len(), 101);
            assert!(Number::from_str("1e-100").unwrap().is_positive());
            assert_eq!(Number::from_str("0e500000").ok(), None);
            assert!(Number::from_str("0").unwrap().is_zero());
        }

        #[test]
        fn test_sqrt() {
            assert_eq!(Number::from_i64(16).sqrt(50).unwrap().to_i64(), Some(4));
            assert!(Number::from_i64(-4).sqrt(50).is_err());
        }

        #[test]
        fn test_ln_exp_identity() {
            let x = Number::from_i64(100);
            let back = x.ln(50).unwrap().exp(50);
            assert!(close(&back, "100", "0.000001"));
            assert!(Number::zero().ln(50).is_err());
        }

        #[test]
        fn test_round_to() {
            let n = Number::from_str("8678.2259").unwrap();
            assert_eq!(n.round_to(2), Number::from_str("8678.23").unwrap());
            let n = Number::from_str("-2.345").unwrap();
            assert_eq!(n.round_to(2), Number::from_str("-2.35").unwrap());
            assert_eq!(Number::from_str("0.5").unwrap().round_to(0).to_i64(), Some(1));
        }

        #[test]
        fn test_as_decimal() {
            let n = Number::from_str("14.8698355").unwrap();
            assert_eq!(n.as_decimal(2), "14.87");
            assert_eq!(Number::from_i64(70200).as_decimal(2), "70200.00");
            assert_eq!(Number::from_str("-0.004").unwrap().as_decimal(2), "0.00");
            assert_eq!(Number::from_str("-0.005").unwrap().as_decimal(2), "-0.01");
            assert_eq!(Number::from_str("0.07").unwrap().as_decimal(3), "0.070");
            assert_eq!(Number::from_str("1.5e5").unwrap().as_decimal(0), "150000");
        }

        #[test]
        fn test_display_trims_zeros() {
            assert_eq!(Number::from_i64(240).to_string(), "240");
            assert_eq!(Number::from_str("8.50").unwrap().to_string(), "8.5");
            assert_eq!(Number::from_ratio(1, 3).to_string(), "0.3333333333");
        }

        #[test]
        fn test_predicates() {
            assert!(Number::zero().is_zero());
            assert!(Number::from_i64(-5).is_negative());
            assert!(!Number::zero().is_negative());
            assert!(Number::from_i64(5).is_positive());
            assert!(!Number::zero().is_positive());
            assert!(Number::from_i64(240).is_integer());
        }

        #[test]
        fn test_ordering() {
            let a = Number::from_str("7.1").unwrap();
            let b = Number::from_str("7.10").unwrap();
            assert_eq!(a, b);
            assert!(Number::from_i64(3) < Number::from_i64(4));
        }
    }

    mod value_tests {
        use super::*;

        #[test]
        fn test_from_i64() {
            let v: Value = 42i64.into();
            assert_eq!(v.as_number().unwrap().to_i64(), Some(42));
        }

        #[test]
        fn test_object_builder_and_get() {
            let v = Value::object([("emi", Value::from(8678i64))]);
            assert_eq!(v.get("emi").as_number().unwrap().to_i64(), Some(8678));
            assert!(v.get("missing").is_error());
            assert!(Value::Null.get("emi").is_error());
        }

        #[test]
        fn test_to_number_from_text() {
            assert!(matches!(Value::Text("25000".into()).to_number(), Value::Number(_)));
            assert!(Value::Text("twenty".into()).to_number().is_error());
        }

        #[test]
        fn test_type_name() {
            assert_eq!(Value::Number(Number::zero()).type_name(), "Number");
            assert_eq!(Value::Text(String::new()).type_name(), "Text");
            assert_eq!(Value::Null.type_name(), "Null");
        }

        #[test]
        fn test_serde_round_trip() {
            let v = Value::object([("rate", Value::Number(Number::from_str("10.5").unwrap()))]);
            let json = serde_json::to_string(&v).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert!(close(back.get("rate").as_number().unwrap(), "10.5", "0.0001"));
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_missing_input_context() {
            let err = FinpilotError::missing_input("sip", "monthly_amount");
            assert_eq!(err.code, codes::MISSING_INPUT);
            let ctx = err.context.unwrap();
            assert_eq!(ctx.calculator.as_deref(), Some("sip"));
            assert_eq!(ctx.argument.as_deref(), Some("monthly_amount"));
        }

        #[test]
        fn test_input_error_classification() {
            assert!(FinpilotError::invalid_input("emi", "principal", "must be positive").is_input_error());
            assert!(!FinpilotError::domain_error("zero rate").is_input_error());
            assert!(!FinpilotError::no_convergence("irr").is_input_error());
        }

        #[test]
        fn test_from_number_error() {
            let err: FinpilotError = NumberError::DivisionByZero.into();
            assert_eq!(err.code, codes::DIV_ZERO);
            let err: FinpilotError = NumberError::DomainError("x".into()).into();
            assert_eq!(err.code, codes::DOMAIN_ERROR);
        }

        #[test]
        fn test_error_display() {
            let err = FinpilotError::no_convergence("IRR did not converge");
            let display = format!("{}", err);
            assert!(display.contains("NO_CONVERGENCE"));
            assert!(display.contains("check your cash flows"));
        }
    }
}
