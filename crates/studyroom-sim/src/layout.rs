//! Procedural room layout.
//!
//! A layout is built by an ordered pipeline over an all-floor grid. Every
//! stage writes through [`Grid::place`], which only touches cells that are
//! still floor, so later stages can never clobber earlier ones.
//!
//! ```text
//! walls → service fixtures → corner decor │ tables + seats → scatter decor
//! └──────────── skeleton ─────────────────┘ └───────── random ───────────┘
//! ```

use rand::Rng;

use crate::{Grid, TileKind};

pub const DEFAULT_WIDTH: u32 = 20;
pub const DEFAULT_HEIGHT: u32 = 15;

/// Upper bound of the table count; at least one is always attempted.
pub const MAX_TABLES: u32 = 4;
/// Upper bound of the sofa/rug count.
pub const MAX_SCATTER_DECOR: u32 = 2;

/// Row of the counter run.
const COUNTER_ROW: u32 = 2;

/// The deterministic part of a layout: border walls, the service counter
/// with its coffee machine and cash register, and the corner decor.
///
/// Identical dimensions always give an identical skeleton.
pub fn skeleton(width: u32, height: u32) -> Grid {
    let mut grid = Grid::from_fn(width, height, |x, y| {
        if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
            TileKind::Wall
        } else {
            TileKind::Floor
        }
    });
    place_service_fixtures(&mut grid);
    place_corner_decor(&mut grid);
    grid
}

/// Generates a layout with thread-local randomness for the decor.
pub fn generate(width: u32, height: u32) -> Grid {
    generate_with(width, height, &mut rand::rng())
}

/// Generates a layout drawing the decor from `rng`.
///
/// Never fails: on a crowded or tiny grid the random stages simply place
/// fewer items.
pub fn generate_with<R: Rng>(width: u32, height: u32, rng: &mut R) -> Grid {
    let mut grid = skeleton(width, height);
    place_tables(&mut grid, rng);
    scatter_decor(&mut grid, rng);
    tracing::trace!(width, height, "generated layout");
    grid
}

fn place_service_fixtures(grid: &mut Grid) {
    let width = grid.width();
    for x in 3..=width.saturating_sub(4) {
        grid.place(x, COUNTER_ROW, TileKind::Counter);
    }
    grid.place(2, 1, TileKind::CoffeeMachine);
    if let Some(x) = width.checked_sub(3) {
        grid.place(x, 1, TileKind::CashRegister);
    }
}

fn place_corner_decor(grid: &mut Grid) {
    let Some(y) = grid.height().checked_sub(2) else {
        return;
    };
    grid.place(1, y, TileKind::Plant);
    grid.place(2, y, TileKind::TvStand);
    if let Some(x) = grid.width().checked_sub(2) {
        grid.place(x, y, TileKind::Plant);
    }
}

fn place_tables<R: Rng>(grid: &mut Grid, rng: &mut R) {
    let count = rng.random_range(1..=MAX_TABLES);
    for _ in 0..count {
        let Some((x, y)) = interior_point(grid, rng) else {
            return;
        };
        if !grid.place(x, y, TileKind::Table) {
            continue;
        }
        for seat_x in [x - 1, x + 1] {
            let seat = TileKind::SEATS[rng.random_range(0..TileKind::SEATS.len())];
            grid.place(seat_x, y, seat);
        }
    }
}

fn scatter_decor<R: Rng>(grid: &mut Grid, rng: &mut R) {
    let count = rng.random_range(0..=MAX_SCATTER_DECOR);
    for _ in 0..count {
        let Some((x, y)) = interior_point(grid, rng) else {
            return;
        };
        let kind = TileKind::SCATTER_DECOR[rng.random_range(0..TileKind::SCATTER_DECOR.len())];
        grid.place(x, y, kind);
    }
}

/// A uniformly random non-border cell, `None` when there is no interior.
fn interior_point<R: Rng>(grid: &Grid, rng: &mut R) -> Option<(u32, u32)> {
    if grid.width() < 3 || grid.height() < 3 {
        return None;
    }
    Some((
        rng.random_range(1..grid.width() - 1),
        rng.random_range(1..grid.height() - 1),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn count(grid: &Grid, kind: TileKind) -> usize {
        grid.tiles().iter().filter(|t| t.kind == kind).count()
    }

    #[test]
    fn test_skeleton_fixture_positions() {
        let grid = skeleton(DEFAULT_WIDTH, DEFAULT_HEIGHT);

        assert_eq!(grid.kind_at(2, 1), Some(TileKind::CoffeeMachine));
        assert_eq!(grid.kind_at(17, 1), Some(TileKind::CashRegister));
        assert_eq!(grid.kind_at(3, 2), Some(TileKind::Counter));
        assert_eq!(grid.kind_at(16, 2), Some(TileKind::Counter));
        assert_eq!(grid.kind_at(2, 2), Some(TileKind::Floor));
        assert_eq!(grid.kind_at(17, 2), Some(TileKind::Floor));
        assert_eq!(count(&grid, TileKind::Counter), 14);

        assert_eq!(grid.kind_at(1, 13), Some(TileKind::Plant));
        assert_eq!(grid.kind_at(2, 13), Some(TileKind::TvStand));
        assert_eq!(grid.kind_at(18, 13), Some(TileKind::Plant));
    }

    #[test]
    fn test_skeleton_is_deterministic() {
        assert_eq!(skeleton(12, 9), skeleton(12, 9));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_with(20, 15, &mut StdRng::seed_from_u64(7));
        let b = generate_with(20, 15, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_generation_keeps_the_skeleton() {
        let base = skeleton(20, 15);
        for seed in 0..50 {
            let grid = generate_with(20, 15, &mut StdRng::seed_from_u64(seed));
            for (fixed, generated) in base.tiles().iter().zip(grid.tiles()) {
                if fixed.kind != TileKind::Floor {
                    assert_eq!(fixed, generated, "seed {seed}");
                }
            }
        }
    }

    #[test]
    fn test_table_count_is_bounded() {
        for seed in 0..50 {
            let grid = generate_with(20, 15, &mut StdRng::seed_from_u64(seed));
            let tables = count(&grid, TileKind::Table);
            assert!(tables <= MAX_TABLES as usize, "seed {seed}: {tables} tables");
            let decor = count(&grid, TileKind::Sofa) + count(&grid, TileKind::Rug);
            assert!(decor <= MAX_SCATTER_DECOR as usize);
        }
    }

    #[test]
    fn test_seats_only_flank_tables() {
        for seed in 0..50 {
            let grid = generate_with(20, 15, &mut StdRng::seed_from_u64(seed));
            for (i, tile) in grid.tiles().iter().enumerate() {
                if !tile.kind.is_seat() {
                    continue;
                }
                let (x, y) = ((i % 20) as i32, (i / 20) as i32);
                let flanked = [x - 1, x + 1]
                    .into_iter()
                    .any(|nx| grid.kind_at(nx, y) == Some(TileKind::Table));
                assert!(flanked, "seed {seed}: lone seat at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_tiny_grids_do_not_panic() {
        for (w, h) in [(0, 0), (1, 1), (2, 7), (3, 3), (5, 5)] {
            let grid = generate_with(w, h, &mut StdRng::seed_from_u64(1));
            assert_eq!(grid.tiles().len(), (w * h) as usize);
        }
    }
}
