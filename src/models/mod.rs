pub mod common;
pub mod schedule;
pub mod view_state;
