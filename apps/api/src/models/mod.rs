pub mod candidate;
pub mod setting;
