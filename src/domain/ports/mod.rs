//! Port traits abstracting the engine's external collaborators.

pub mod command_runner;
pub mod mock;

pub use command_runner::CommandRunner;
pub use mock::{MockBehavior, MockRunner};
