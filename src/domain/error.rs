/// Configuration errors.
///
/// Everything here is an authoring mistake (bad level data, a broken
/// animation table, a sprite the renderer has never heard of). None of it
/// is recoverable at runtime: errors bubble to `main` and end the program.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("level has {len} cells, expected {width}x{height} = {}", .width * .height)]
    LevelSize { len: usize, width: usize, height: usize },

    #[error("unknown animation: {0}")]
    UnknownAnimation(String),

    #[error("animation set is missing state `{0}`")]
    IncompleteAnimationSet(&'static str),

    #[error("unknown sprite: {0}")]
    UnknownSprite(String),

    #[error("bad level character {ch:?} at row {row}, column {col}")]
    BadLevelChar { ch: char, row: usize, col: usize },

    #[error("level row {row} is {len} wide, expected {width}")]
    RowWidth { row: usize, len: usize, width: usize },

    #[error("bad spawn line {0:?}, expected `@ x,y`")]
    BadSpawn(String),

    #[error("cannot read level {path}: {message}")]
    LevelRead { path: String, message: String },
}
