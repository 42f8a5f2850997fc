mod blocks;
mod chunk;
mod plan;
mod playlist;
mod sanitize;
mod silence;

pub use blocks::*;
pub use chunk::*;
pub use plan::*;
pub use playlist::*;
pub use sanitize::*;
pub use silence::*;
