//! FinPilot Plugin System
//!
//! Calculators are plugins: each one describes its inputs with static
//! metadata and implements a pure `call`. The registry dispatches by name.

mod traits;
mod registry;
mod context;

pub use traits::{CalculatorPlugin, CalculatorMeta, ArgMeta};
pub use registry::CalculatorRegistry;
pub use context::EvalContext;

/// Re-export core types for calculator authors
pub mod prelude {
    pub use crate::{CalculatorPlugin, CalculatorMeta, ArgMeta, CalculatorRegistry, EvalContext};
    pub use finpilot_core::prelude::*;
}
