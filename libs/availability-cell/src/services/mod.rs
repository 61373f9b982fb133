pub mod availability;
pub mod candidates;
