pub mod ids;
pub mod validation;

pub use ids::*;
pub use validation::*;
