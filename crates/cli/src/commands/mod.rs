//! Command handlers for the TextFusion CLI.

pub mod ask;
pub mod interactive;
pub mod serve;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use interactive::InteractiveCommand;
pub use serve::ServeCommand;

#[cfg(test)]
pub(crate) mod fakes;
