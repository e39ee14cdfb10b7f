//! Dimensional analysis over parameter formulas.
//!
//! This pass walks the same syntax tree as the evaluator but propagates unit
//! labels instead of numbers. It never affects numeric results and may be run
//! before evaluation, after it, or not at all. Supplied input values can also
//! be checked against the plausible range of their declared unit.

pub use self::checker::{validate_inputs, UnitChecker};
pub use self::error::{UnitError, ValidationError, ValidationErrorType};
pub use self::registry::{check_input, lookup, UnitCategory, UnitInfo};
pub use self::units::{infer_unit, same_unit};

mod checker;
mod error;
mod registry;
mod units;
