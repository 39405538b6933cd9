pub mod process;

pub use process::{process_day, RunContext, RunOutcome};
