/// Tile grid: static collision geometry plus a per-cell exposed-face mask.
///
/// ## Collision mask
///
/// Each solid cell records which of its four faces border open space:
///
/// ```text
///   bit 0 (1)  LEFT   : left neighbour is empty
///   bit 1 (2)  RIGHT  : right neighbour is empty
///   bit 2 (4)  TOP    : cell above is empty
///   bit 3 (8)  BOTTOM : cell below is empty
/// ```
///
/// Empty cells and cells buried inside a solid mass have mask 0.
/// Cells on the map edge never set the bit pointing off-grid: the border
/// is treated as solid, so nothing "opens" onto the void.
///
/// The mask is derived data. Every mutation of `cells` goes through a
/// constructor that rebuilds it in one pass.

use super::error::ConfigError;

/// 4-bit exposed-face set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SideMask(u8);

impl SideMask {
    pub const NONE: SideMask = SideMask(0);
    pub const LEFT: SideMask = SideMask(1);
    pub const RIGHT: SideMask = SideMask(2);
    pub const TOP: SideMask = SideMask(4);
    pub const BOTTOM: SideMask = SideMask(8);

    #[cfg(test)]
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn contains(self, other: SideMask) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for SideMask {
    type Output = SideMask;
    fn bitor(self, rhs: SideMask) -> SideMask {
        SideMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SideMask {
    fn bitor_assign(&mut self, rhs: SideMask) {
        self.0 |= rhs.0;
    }
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
    mask: Vec<SideMask>,
}

impl TileGrid {
    /// Build a grid from row-major cell data.
    /// A length that doesn't match `width * height` is a fatal config error.
    pub fn new(cells: Vec<u8>, width: usize, height: usize) -> Result<Self, ConfigError> {
        if cells.len() != width * height {
            return Err(ConfigError::LevelSize { len: cells.len(), width, height });
        }
        let mut grid = TileGrid {
            width,
            height,
            cells,
            mask: Vec::new(),
        };
        grid.rebuild();
        Ok(grid)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Row-major index of (x, y), or None if off-grid.
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    #[inline]
    pub fn coords(&self, index: usize) -> (i32, i32) {
        ((index % self.width) as i32, (index / self.width) as i32)
    }

    /// Tile id at (x, y); 0 for empty or off-grid.
    #[inline]
    pub fn tile(&self, x: i32, y: i32) -> u8 {
        self.index(x, y).map_or(0, |i| self.cells[i])
    }

    /// Solid cell? Off-grid is not blocked.
    #[inline]
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.tile(x, y) != 0
    }

    /// Empty in-bounds cell? Off-grid counts as solid border, never open.
    #[inline]
    pub fn is_open(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| self.cells[i] == 0)
    }

    #[inline]
    pub fn side_mask(&self, index: usize) -> SideMask {
        self.mask.get(index).copied().unwrap_or(SideMask::NONE)
    }

    /// Recompute the whole collision mask. O(width * height).
    pub fn rebuild(&mut self) {
        let mut mask = Vec::with_capacity(self.cells.len());
        for i in 0..self.cells.len() {
            let mut flag = SideMask::NONE;
            if self.cells[i] != 0 {
                let (x, y) = self.coords(i);
                let last_x = self.width as i32 - 1;
                let last_y = self.height as i32 - 1;
                if x != 0 && self.tile(x - 1, y) == 0 { flag |= SideMask::LEFT; }
                if x != last_x && self.tile(x + 1, y) == 0 { flag |= SideMask::RIGHT; }
                if y != 0 && self.tile(x, y - 1) == 0 { flag |= SideMask::TOP; }
                if y != last_y && self.tile(x, y + 1) == 0 { flag |= SideMask::BOTTOM; }
            }
            mask.push(flag);
        }
        self.mask = mask;
    }

    /// Level wrap: every row repeated once horizontally, width doubled.
    pub fn doubled(&self) -> TileGrid {
        let mut cells = Vec::with_capacity(self.cells.len() * 2);
        for row in self.cells.chunks(self.width.max(1)) {
            cells.extend_from_slice(row);
            cells.extend_from_slice(row);
        }
        let mut grid = TileGrid {
            width: self.width * 2,
            height: self.height,
            cells,
            mask: Vec::new(),
        };
        grid.rebuild();
        grid
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(rows: &[&str]) -> TileGrid {
        let h = rows.len();
        let w = rows[0].len();
        let cells = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| if c == '#' { 5 } else { 0 }))
            .collect();
        TileGrid::new(cells, w, h).unwrap()
    }

    #[test]
    fn wrong_length_is_config_error() {
        let err = TileGrid::new(vec![0; 5], 2, 3).unwrap_err();
        assert_eq!(err, ConfigError::LevelSize { len: 5, width: 2, height: 3 });
    }

    #[test]
    fn surrounded_cell_has_no_exposed_face() {
        let g = grid_from(&[
            "#####",
            "#####",
            "#####",
        ]);
        let centre = g.index(2, 1).unwrap();
        assert!(g.side_mask(centre).is_empty());
    }

    #[test]
    fn empty_cell_mask_is_zero() {
        let g = grid_from(&[
            "   ",
            " # ",
            "   ",
        ]);
        assert!(g.side_mask(g.index(0, 0).unwrap()).is_empty());
    }

    #[test]
    fn isolated_block_exposes_all_faces() {
        let g = grid_from(&[
            "   ",
            " # ",
            "   ",
        ]);
        let m = g.side_mask(g.index(1, 1).unwrap());
        assert_eq!(m.bits(), 15);
    }

    #[test]
    fn edge_cells_never_point_off_grid() {
        let g = grid_from(&[
            "#  #",
            "    ",
            "#  #",
        ]);
        let tl = g.side_mask(g.index(0, 0).unwrap());
        assert!(!tl.contains(SideMask::LEFT));
        assert!(!tl.contains(SideMask::TOP));
        assert!(tl.contains(SideMask::RIGHT));
        assert!(tl.contains(SideMask::BOTTOM));

        let br = g.side_mask(g.index(3, 2).unwrap());
        assert!(!br.contains(SideMask::RIGHT));
        assert!(!br.contains(SideMask::BOTTOM));
        assert!(br.contains(SideMask::LEFT));
        assert!(br.contains(SideMask::TOP));
    }

    #[test]
    fn floor_row_only_exposes_top() {
        let g = grid_from(&[
            "    ",
            "####",
        ]);
        for x in 0..4 {
            assert_eq!(g.side_mask(g.index(x, 1).unwrap()), SideMask::TOP);
        }
    }

    #[test]
    fn open_and_blocked_queries() {
        let g = grid_from(&[
            "# ",
        ]);
        assert!(g.is_blocked(0, 0));
        assert!(!g.is_blocked(1, 0));
        assert!(g.is_open(1, 0));
        assert!(!g.is_blocked(-1, 0));
        assert!(!g.is_open(-1, 0));
        assert!(!g.is_open(0, 5));
    }

    #[test]
    fn doubled_grid_matches_independent_build() {
        let g = grid_from(&[
            "#  ##",
            "   # ",
            "#####",
        ]);
        let wrapped = g.doubled();
        let expected = grid_from(&[
            "#  ###  ##",
            "   #    # ",
            "##########",
        ]);
        assert_eq!(wrapped.width(), 10);
        assert_eq!(wrapped.height(), 3);
        assert_eq!(wrapped.cells(), expected.cells());
        for i in 0..expected.cells().len() {
            assert_eq!(wrapped.side_mask(i), expected.side_mask(i), "cell {i}");
        }
    }

    #[test]
    fn coords_roundtrip_index() {
        let g = grid_from(&["   ", "   "]);
        let i = g.index(2, 1).unwrap();
        assert_eq!(i, 5);
        assert_eq!(g.coords(i), (2, 1));
        assert_eq!(g.index(3, 0), None);
    }
}
