/// Level loading.
///
/// ## Sources
///   1. `builtin`: the embedded layout below
///   2. `<levels_dir>/<name>.txt`: a text level
///
/// ## Text format (`.txt`):
///   ```
///   # Level Name
///   @ 5,16
///   <map rows>
///   ```
///   Line 1: `# Level Name` (optional)
///   Optional: `@ x,y` player spawn in world units
///   Lines: map rows, all the same width
///
/// ## Tile legend:
///   ' ' or '.' = Empty
///   '#'        = Solid (tile id 5)
///   '1'..'9'   = Solid with that tile id

use std::path::Path;

use log::info;

use crate::config::GameConfig;
use crate::domain::error::ConfigError;

pub const BUILTIN: &str = "builtin";

/// Tile id used for `#`.
const SOLID: u8 = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct LevelDef {
    pub name: String,
    /// Row-major tile ids, `width * height` long.
    pub cells: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub spawn: Option<(f32, f32)>,
}

impl LevelDef {
    /// Spawn point; defaults to x=5, twelve rows above the bottom.
    pub fn spawn_point(&self) -> (f32, f32) {
        self.spawn.unwrap_or((5.0, self.height as f32 - 12.0))
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the level named in `[general] level`.
pub fn load(config: &GameConfig) -> Result<LevelDef, ConfigError> {
    let name = config.general.level.as_str();
    let def = if name == BUILTIN {
        builtin()?
    } else {
        load_file(&config.levels_dir.join(format!("{name}.txt")))?
    };
    info!("level \"{}\" loaded ({}x{})", def.name, def.width, def.height);
    Ok(def)
}

pub fn load_file(path: &Path) -> Result<LevelDef, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LevelRead {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let mut def = parse_level(&content)?;
    if def.name.is_empty() {
        def.name = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
    }
    Ok(def)
}

/// Parse a single level from text content.
pub fn parse_level(content: &str) -> Result<LevelDef, ConfigError> {
    let mut name = String::new();
    let mut spawn = None;
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        if line.starts_with('#') && name.is_empty() && rows.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else if let Some(rest) = line.strip_prefix("@ ") {
            spawn = Some(parse_spawn(rest).ok_or_else(|| ConfigError::BadSpawn(line.to_string()))?);
        } else {
            rows.push(line);
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    from_rows(name, &rows, spawn)
}

/// The embedded level.
pub fn builtin() -> Result<LevelDef, ConfigError> {
    from_rows("Builtin".to_string(), BUILTIN_ROWS, None)
}

// ══════════════════════════════════════════════════════════════
// Internal
// ══════════════════════════════════════════════════════════════

fn from_rows(name: String, rows: &[&str], spawn: Option<(f32, f32)>) -> Result<LevelDef, ConfigError> {
    let height = rows.len();
    let width = rows.first().map_or(0, |r| r.chars().count());
    let mut cells = Vec::with_capacity(width * height);

    for (row, line) in rows.iter().enumerate() {
        let len = line.chars().count();
        if len != width {
            return Err(ConfigError::RowWidth { row, len, width });
        }
        for (col, ch) in line.chars().enumerate() {
            cells.push(tile_id(ch).ok_or(ConfigError::BadLevelChar { ch, row, col })?);
        }
    }

    if cells.len() != width * height || width == 0 {
        return Err(ConfigError::LevelSize { len: cells.len(), width, height });
    }

    Ok(LevelDef { name, cells, width, height, spawn })
}

fn tile_id(ch: char) -> Option<u8> {
    match ch {
        ' ' | '.' => Some(0),
        '#' => Some(SOLID),
        '1'..='9' => ch.to_digit(10).map(|d| d as u8),
        _ => None,
    }
}

fn parse_spawn(text: &str) -> Option<(f32, f32)> {
    let (x, y) = text.trim().split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Distinguish `# Level Name` from `#####` (level data).
/// A name line contains at least one letter after the `#`.
fn is_name_line(line: &str) -> bool {
    line[1..].chars().any(|c| c.is_alphabetic())
}

// ══════════════════════════════════════════════════════════════
// Embedded level
// ══════════════════════════════════════════════════════════════

const BUILTIN_ROWS: &[&str] = &[
    "               ",
    "   ##          ",
    " # #    ####   ",
    " # #       #   ",
    " # # ##    #   ",
    " #   #     #   ",
    " #####  ####   ",
    "           ##  ",
    "   ####     ## ",
    "    ##       ##",
    "     ###       ",
    "               ",
    " #    ####     ",
    "###      ##    ",
    " #        ##   ",
    "               ",
    "               ",
    "               ",
    "               ",
    "### ##### #####",
    "### ##### #####",
    "### ##### #####",
    "### ##### #####",
    "###   ##   ####",
    "###         ###",
    "#####       ###",
    "#####      ####",
    "###############",
];

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_15_by_28() {
        let def = builtin().unwrap();
        assert_eq!((def.width, def.height), (15, 28));
        assert_eq!(def.cells.len(), 15 * 28);
        assert_eq!(def.spawn_point(), (5.0, 16.0));
        // Bottom row solid, top row empty.
        assert!(def.cells[27 * 15..].iter().all(|&c| c == 5));
        assert!(def.cells[..15].iter().all(|&c| c == 0));
        // Row 1 has the two-tile ledge at x=3,4.
        assert_eq!(&def.cells[15 + 2..15 + 6], &[0, 5, 5, 0]);
    }

    #[test]
    fn parses_name_spawn_and_tiles() {
        let text = "# Test Yard\n@ 1.5,2\n....\n.#3.\n####\n";
        let def = parse_level(text).unwrap();
        assert_eq!(def.name, "Test Yard");
        assert_eq!(def.spawn, Some((1.5, 2.0)));
        assert_eq!((def.width, def.height), (4, 3));
        assert_eq!(def.cells, vec![0, 0, 0, 0, 0, 5, 3, 0, 5, 5, 5, 5]);
    }

    #[test]
    fn hash_data_row_is_not_a_name() {
        let def = parse_level("####\n#  #\n####").unwrap();
        assert_eq!(def.height, 3);
        assert!(def.name.is_empty());
    }

    #[test]
    fn trailing_blank_lines_are_dropped() {
        let def = parse_level("# A\n  \n##\n\n\n").unwrap();
        assert_eq!(def.height, 2);
    }

    #[test]
    fn unknown_char_is_rejected() {
        assert_eq!(
            parse_level("...\n.X.\n###").unwrap_err(),
            ConfigError::BadLevelChar { ch: 'X', row: 1, col: 1 }
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert_eq!(
            parse_level("....\n..\n####").unwrap_err(),
            ConfigError::RowWidth { row: 1, len: 2, width: 4 }
        );
    }

    #[test]
    fn ragged_rows_with_matching_total_are_rejected() {
        // 3 + 4 + 2 cells add up to 3x3, but the rows don't line up.
        assert_eq!(
            parse_level("###\n####\n##\n").unwrap_err(),
            ConfigError::RowWidth { row: 1, len: 4, width: 3 }
        );
    }

    #[test]
    fn malformed_spawn_is_rejected() {
        assert_eq!(
            parse_level("# Yard\n@ abc\n###\n###").unwrap_err(),
            ConfigError::BadSpawn("@ abc".to_string())
        );
        assert!(matches!(parse_level("@ 1,\n##").unwrap_err(), ConfigError::BadSpawn(_)));
    }

    #[test]
    fn empty_level_is_rejected() {
        assert!(matches!(parse_level("# Nothing\n").unwrap_err(), ConfigError::LevelSize { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_file(Path::new("/nonexistent/ledgerunner/none.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::LevelRead { .. }));
    }
}
