pub mod availability;
pub mod geo;
