pub mod convert;
pub mod meants;
pub mod runner;

pub use runner::{SystemRunner, ToolRunner};
