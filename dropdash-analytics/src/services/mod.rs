pub mod datasets;
pub mod reports;
