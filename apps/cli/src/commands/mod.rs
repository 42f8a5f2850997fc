pub mod draft;
pub mod generate;
pub mod play;
pub mod playlist;
