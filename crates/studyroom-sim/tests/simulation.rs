//! Layout and movement properties over many generated rooms.

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use studyroom_sim::layout::{generate_with, skeleton};
use studyroom_sim::{
    Action, Command, Direction, Interaction, MoveOutcome, Role, Simulation, TileKind,
};

#[test]
fn test_every_border_cell_is_wall() {
    for (w, h) in [(5, 5), (7, 11), (20, 15), (31, 8)] {
        for seed in 0..20 {
            let grid = generate_with(w, h, &mut StdRng::seed_from_u64(seed));
            for y in 0..h {
                for x in 0..w {
                    let kind = grid.kind_at(x as i32, y as i32).expect("in bounds");
                    if grid.is_border(x, y) {
                        assert_eq!(kind, TileKind::Wall, "({x}, {y}) in {w}x{h}");
                    } else {
                        assert_ne!(kind, TileKind::Wall, "({x}, {y}) in {w}x{h}");
                    }
                }
            }
        }
    }
}

#[test]
fn test_tile_ids_name_kind_and_position() {
    let grid = generate_with(20, 15, &mut StdRng::seed_from_u64(11));
    for (row_index, row) in grid.rows().enumerate() {
        for (x, tile) in row.iter().enumerate() {
            assert_eq!(tile.id, format!("{}-{x}-{row_index}", tile.kind));
            assert_eq!(tile.color, tile.kind.color());
        }
    }
}

#[test]
fn test_walkability_matches_tile_kind() {
    let mut rng = StdRng::seed_from_u64(5);
    let sim = Simulation::with_rng(20, 15, &mut rng);
    for y in -1..16 {
        for x in -1..21 {
            let expected = sim
                .grid()
                .kind_at(x, y)
                .is_some_and(|k| matches!(k, TileKind::Floor | TileKind::Chair | TileKind::Stool));
            assert_eq!(sim.is_walkable(x, y), expected, "({x}, {y})");
        }
    }
}

#[test]
fn test_unit_moves_follow_walkability() {
    let mut rng = StdRng::seed_from_u64(21);
    let mut sim = Simulation::with_rng(20, 15, &mut rng);
    let spawn = sim.random_spawn(&mut rng).unwrap();
    sim.add_player("p", "#123456", spawn).unwrap();

    for step in 0..500 {
        let direction = Direction::ALL[rng.random_range(0..4)];
        let (dx, dy) = direction.delta();
        let before = sim.player("p").unwrap().clone();
        let target_ok = sim.is_walkable(before.x + dx, before.y + dy);

        let outcome = sim.apply_move("p", dx, dy, direction);
        let after = sim.player("p").unwrap();

        assert_eq!(after.direction, direction);
        if target_ok {
            assert_eq!(outcome, MoveOutcome::Moved);
            assert_eq!(after.position(), (before.x + dx, before.y + dy));
            assert_eq!(after.action, Action::Walk);
        } else {
            assert_eq!(outcome, MoveOutcome::Blocked);
            assert_eq!(after.position(), before.position());
            assert_eq!(after.action, before.action);
        }
        assert!(sim.is_walkable(after.x, after.y), "invariant broken at step {step}");
    }
}

#[test]
fn test_two_player_scenario() {
    let mut sim = Simulation::from_grid(skeleton(20, 15));
    sim.add_player("a", "#0000FF", (17, 5)).unwrap();
    sim.add_player("b", "#FF0000", (10, 10)).unwrap();

    sim.apply("a", &Command::step(Direction::Right));
    let a = sim.player("a").unwrap();
    assert_eq!(a.position(), (18, 5));
    assert_eq!(a.action, Action::Walk);
    assert_eq!(a.direction, Direction::Right);

    // x = 19 is the east wall.
    sim.apply("a", &Command::Move { dx: 1, dy: 0, direction: Direction::Up });
    let a = sim.player("a").unwrap();
    assert_eq!(a.position(), (18, 5));
    assert_eq!(a.direction, Direction::Up);
    assert_eq!(a.action, Action::Walk);

    assert_eq!(sim.player("b").unwrap().position(), (10, 10));
}

#[test]
fn test_generated_rooms_serve_every_role() {
    for seed in 0..20 {
        let sim = Simulation::with_rng(20, 15, &mut StdRng::seed_from_u64(seed));

        assert!(sim.interaction(2, 1, Role::Barista).is_used());
        assert!(sim.interaction(17, 1, Role::Cashier).is_used());
        assert_eq!(
            sim.interaction(2, 1, Role::Cashier),
            Interaction::Refused {
                kind: TileKind::CoffeeMachine,
                owner: Role::Barista,
            }
        );

        // A table can land on a fixture and be skipped.
        let Some(table) = sim
            .grid()
            .tiles()
            .iter()
            .position(|t| t.kind == TileKind::Table)
        else {
            continue;
        };
        let (x, y) = ((table % 20) as i32, (table / 20) as i32);
        assert!(sim.interaction(x, y, Role::Waiter).is_used());
        assert!(!sim.interaction(x, y, Role::Barista).is_used());
    }
}
