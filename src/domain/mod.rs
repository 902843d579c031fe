pub mod animation;
pub mod body;
pub mod collision;
pub mod error;
pub mod grid;
pub mod timer;
