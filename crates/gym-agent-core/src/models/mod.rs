pub mod equipment;
pub mod workout;

pub use equipment::*;
pub use workout::*;
