pub mod beacon;
pub mod member;

pub use beacon::*;
pub use member::*;
