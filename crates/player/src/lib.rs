mod activity;
mod error;
mod events;
mod export;
mod media;
mod player;
mod runtime;
mod time;
mod tracks;

pub use activity::*;
pub use error::*;
pub use events::*;
pub use export::*;
pub use media::*;
pub use player::*;
pub use runtime::*;
pub use time::*;

#[cfg(test)]
pub(crate) mod testing;
