pub mod outcome;
pub mod processor;
pub mod types;

pub use outcome::generate_outcome;
pub use processor::GameProcessor;
pub use types::*;
