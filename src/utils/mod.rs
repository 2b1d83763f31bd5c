pub mod currency;
pub mod datetime;

pub use currency::format_currency;
pub use datetime::*;
