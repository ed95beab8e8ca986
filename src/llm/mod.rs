// Completion service client layer

pub mod provider;
pub mod openai;

#[cfg(test)]
pub mod mock;

pub use provider::*;
