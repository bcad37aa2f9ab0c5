use serde::{Deserialize, Serialize};

use crate::{Tile, TileKind};

/// A `width × height` tile grid stored row-major (`index = y * width + x`).
///
/// Every cell holds exactly one tile. Coordinates are signed so callers can
/// look one step past an edge without wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Builds a grid cell by cell, calling `f(x, y)` in row-major order.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> TileKind) -> Self {
        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(f(x, y), x, y));
            }
        }
        Self {
            width,
            height,
            tiles,
        }
    }

    /// Rebuilds a grid from a flat tile list.
    ///
    /// Returns `None` if the list does not hold exactly `width * height`
    /// tiles.
    pub fn from_tiles(width: u32, height: u32, tiles: Vec<Tile>) -> Option<Self> {
        (tiles.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            tiles,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The flattened tiles, row-major.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[inline]
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = (u32::try_from(x).ok()?, u32::try_from(y).ok()?);
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// The tile at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: i32, y: i32) -> Option<&Tile> {
        self.index_of(x, y).and_then(|i| self.tiles.get(i))
    }

    pub fn kind_at(&self, x: i32, y: i32) -> Option<TileKind> {
        self.get(x, y).map(|t| t.kind)
    }

    pub fn is_border(&self, x: u32, y: u32) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    /// The grid as rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.width.max(1) as usize)
    }

    /// Replaces the tile at `(x, y)` if it is still bare floor.
    ///
    /// Returns whether the cell was written. Out-of-bounds and occupied
    /// cells are skipped.
    pub(crate) fn place(&mut self, x: u32, y: u32, kind: TileKind) -> bool {
        let Some(index) = self.index_of(x as i32, y as i32) else {
            return false;
        };
        match self.tiles.get_mut(index) {
            Some(tile) if tile.kind == TileKind::Floor => {
                *tile = Tile::new(kind, x, y);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> Grid {
        Grid::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                TileKind::Floor
            } else {
                TileKind::Wall
            }
        })
    }

    #[test]
    fn test_index_is_row_major() {
        let grid = checker(4, 3);
        assert_eq!(grid.index_of(1, 2), Some(9));
        assert_eq!(grid.get(1, 2).unwrap().id, "wall-1-2");
    }

    #[test]
    fn test_get_out_of_bounds_is_none() {
        let grid = checker(4, 3);
        assert!(grid.get(-1, 0).is_none());
        assert!(grid.get(4, 0).is_none());
        assert!(grid.get(0, 3).is_none());
    }

    #[test]
    fn test_rows_rebuild_two_dimensions() {
        let grid = checker(4, 3);
        let rows: Vec<_> = grid.rows().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == 4));
        assert_eq!(rows[2][1], grid.tiles()[9]);
    }

    #[test]
    fn test_place_only_overwrites_floor() {
        let mut grid = checker(4, 3);
        assert!(grid.place(0, 0, TileKind::Plant));
        assert!(!grid.place(1, 0, TileKind::Plant), "wall stays");
        assert!(!grid.place(9, 9, TileKind::Plant), "out of bounds");
        assert_eq!(grid.kind_at(0, 0), Some(TileKind::Plant));
    }

    #[test]
    fn test_from_tiles_checks_length() {
        let grid = checker(2, 2);
        let tiles = grid.tiles().to_vec();
        assert!(Grid::from_tiles(2, 2, tiles.clone()).is_some());
        assert!(Grid::from_tiles(3, 2, tiles).is_none());
    }

    #[test]
    fn test_empty_grid_has_no_rows() {
        let grid = Grid::from_fn(0, 5, |_, _| TileKind::Floor);
        assert_eq!(grid.rows().count(), 0);
        assert!(grid.get(0, 0).is_none());
    }
}
