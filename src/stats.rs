pub mod correlation;
pub mod timeseries;
