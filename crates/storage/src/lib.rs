mod blob;
mod error;
pub mod fs;
pub mod global;
mod naming;
mod runtime;
mod writer;

pub use blob::*;
pub use error::*;
pub use naming::*;
pub use runtime::*;
pub use writer::*;
