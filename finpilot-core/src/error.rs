//! Structured calculator errors
//!
//! Errors are values: a calculator never panics on bad input, it hands back
//! a `FinpilotError` carrying a machine-readable code and, where it helps,
//! a suggestion the UI can show next to the form.

use crate::NumberError;
use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const MISSING_INPUT: &str = "MISSING_INPUT";
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
    pub const ARG_COUNT: &str = "ARG_COUNT";
    pub const ARG_TYPE: &str = "ARG_TYPE";
    pub const DIV_ZERO: &str = "DIV_ZERO";
    pub const DOMAIN_ERROR: &str = "DOMAIN_ERROR";
    pub const NO_CONVERGENCE: &str = "NO_CONVERGENCE";
    pub const UNDEFINED_CALC: &str = "UNDEFINED_CALC";
    pub const UNDEFINED_FIELD: &str = "UNDEFINED_FIELD";
    pub const TYPE_ERROR: &str = "TYPE_ERROR";
}

/// Severity level of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Result produced but worth flagging
    Warning,
    /// This calculation failed; the user can correct inputs and retry
    Error,
    /// The engine itself is broken
    Fatal,
}

/// Where an error occurred
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculator: Option<String>,

    /// Offending input field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

/// Structured error returned by every calculator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinpilotError {
    pub code: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,

    pub severity: Severity,
}

impl FinpilotError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            context: None,
            severity: Severity::Error,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn in_calculator(mut self, calculator: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.calculator = Some(calculator.into());
        self
    }

    pub fn for_argument(mut self, argument: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.argument = Some(argument.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.notes.push(note.into());
        self
    }

    /// True for errors the user fixes by editing form fields
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.code.as_str(),
            codes::MISSING_INPUT
                | codes::INVALID_INPUT
                | codes::PARSE_ERROR
                | codes::ARG_COUNT
                | codes::ARG_TYPE
        )
    }

    // ========== Common Error Constructors ==========

    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, format!("Parse error: {}", details.into()))
            .with_suggestion("Enter plain numbers such as 250000 or 8.5")
    }

    pub fn missing_input(calc: &str, arg: &str) -> Self {
        Self::new(codes::MISSING_INPUT, format!("{}(): '{}' is required", calc, arg))
            .with_suggestion(format!("Please fill all {} calculator fields", calc))
            .in_calculator(calc)
            .for_argument(arg)
    }

    pub fn invalid_input(calc: &str, arg: &str, details: impl Into<String>) -> Self {
        Self::new(
            codes::INVALID_INPUT,
            format!("{}(): '{}' {}", calc, arg, details.into()),
        )
        .in_calculator(calc)
        .for_argument(arg)
    }

    pub fn arg_count(calc: &str, expected: usize, got: usize) -> Self {
        Self::new(
            codes::ARG_COUNT,
            format!("{}() expects {} arguments, got {}", calc, expected, got),
        )
        .with_suggestion(format!("Use help('{}') for usage", calc))
        .in_calculator(calc)
    }

    pub fn arg_type(calc: &str, arg: &str, expected: &str, got: &str) -> Self {
        Self::new(
            codes::ARG_TYPE,
            format!("{}() argument '{}': expected {}, got {}", calc, arg, expected, got),
        )
        .in_calculator(calc)
        .for_argument(arg)
    }

    pub fn div_zero() -> Self {
        Self::new(codes::DIV_ZERO, "Division by zero")
    }

    pub fn domain_error(details: impl Into<String>) -> Self {
        Self::new(codes::DOMAIN_ERROR, format!("Domain error: {}", details.into()))
    }

    pub fn no_convergence(details: impl Into<String>) -> Self {
        Self::new(codes::NO_CONVERGENCE, details.into())
            .with_suggestion("Please check your cash flows")
    }

    pub fn undefined_calculator(name: &str) -> Self {
        Self::new(codes::UNDEFINED_CALC, format!("Unknown calculator: {}", name))
            .with_suggestion("Use list_calculators() to see what is available")
    }

    pub fn undefined_field(name: &str) -> Self {
        Self::new(codes::UNDEFINED_FIELD, format!("Undefined field: {}", name))
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        Self::new(codes::TYPE_ERROR, format!("Expected {}, got {}", expected, got))
    }
}

impl std::fmt::Display for FinpilotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for FinpilotError {}

impl From<NumberError> for FinpilotError {
    fn from(err: NumberError) -> Self {
        match err {
            NumberError::ParseError(s) => Self::parse_error(s),
            NumberError::DivisionByZero => Self::div_zero(),
            NumberError::DomainError(s) => Self::domain_error(s),
        }
    }
}
