pub mod autofix;
pub mod normalize;
pub mod validate;

pub use autofix::{auto_fix, FixOutcome};
pub use normalize::normalize;
pub use validate::{OrderValidator, ValidationOutcome};
