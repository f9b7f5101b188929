//! CLI command implementations

pub mod recommend;
pub mod results;
pub mod shapes;
