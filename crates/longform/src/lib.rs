mod draft;
mod error;
mod events;
mod orchestrator;
mod retry;
mod runtime;

pub use draft::*;
pub use error::*;
pub use events::*;
pub use orchestrator::*;
pub use retry::*;
pub use runtime::*;

#[cfg(test)]
pub(crate) mod testing;
