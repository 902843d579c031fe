pub mod controller;
pub mod event;
pub mod hostile;
pub mod input;
pub mod level;
pub mod player;
pub mod present;
pub mod step;
pub mod world;
