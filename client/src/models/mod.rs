pub mod court;
pub mod filters;
pub mod geo;
pub mod macros;

pub use court::*;
pub use filters::*;
pub use geo::*;
