pub mod check;
pub mod finding;
pub mod scan;
pub mod schedule;

pub use check::*;
pub use finding::*;
pub use scan::*;
pub use schedule::*;
