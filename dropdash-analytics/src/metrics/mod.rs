pub mod completeness;
pub mod drops;
pub mod funnel;
pub mod gender;
pub mod messaging;
pub mod numeric;
pub mod penetration;
pub mod period;
pub mod plans;
pub mod retention;

pub use period::{DateWindow, Period};
pub use plans::PlanDetector;
