#![forbid(unsafe_code)]

pub mod model;
pub mod quiz;
pub mod time;
pub mod unlock;

pub use time::Clock;
