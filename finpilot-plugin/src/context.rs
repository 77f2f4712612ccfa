//! Evaluation context

/// Settings shared by every calculator call
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Working precision (decimal digits) for ln, exp and fractional powers
    pub precision: u32,
}

impl EvalContext {
    pub fn new() -> Self {
        Self { precision: 50 }
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}
