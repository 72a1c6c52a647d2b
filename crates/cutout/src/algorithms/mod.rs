pub mod preprocessing;
pub mod extraction;

pub use preprocessing::*;
pub use extraction::*;
