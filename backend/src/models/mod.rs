pub mod kind;
pub mod macros;
pub mod measures;
pub mod records;

pub use kind::*;
pub use measures::Measures;
pub use records::*;
