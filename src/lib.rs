pub mod core;

// Re-export commonly used types
pub use crate::core::components::custom::CustomDescriptor;
pub use crate::core::controller::Controller;
pub use crate::core::graph::CircuitGraph;
pub use crate::core::level::{LevelTests, TestVector};
pub use crate::core::signal::Signal;
pub use crate::core::types::{ComponentId, ConnectResult, Kind};
