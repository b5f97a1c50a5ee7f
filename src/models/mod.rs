pub mod address;
pub mod check;
pub mod country;

pub use address::*;
pub use check::*;
