//! CLI command implementations.

pub mod add;
pub mod common;
pub mod define;
pub mod model;
pub mod new;
pub mod remove;
pub mod set;
pub mod show;
pub mod step;
pub mod version;
