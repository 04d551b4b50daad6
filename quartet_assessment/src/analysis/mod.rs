pub mod aggregation;
pub mod figures;
pub mod performance;
pub mod ranking;
