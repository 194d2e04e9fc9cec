// Domain layer - Count tables and the pure dashboard pipeline
pub mod aggregate;
pub mod artifact;
pub mod chart;
pub mod dashboard;
pub mod filter;
pub mod performance;
pub mod target_list;
pub mod violation;
