pub mod common;
pub mod dashboard;
pub mod reservation;

pub use common::*;
pub use dashboard::*;
pub use reservation::*;
