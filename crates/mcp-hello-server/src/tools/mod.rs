//! Tool implementations.

pub mod add_numbers;
pub mod echo;
pub mod get_time;
pub mod hello;
pub mod registry;

pub use registry::ToolRegistry;
