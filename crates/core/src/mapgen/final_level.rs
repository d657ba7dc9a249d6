//! The hand-built boss floor. Every run ends on the same arena: a chain of
//! chambers descending to the room where the quest letter is dropped, with
//! Parnak and his retinue between the player and the way back.

use crate::content::MonsterKind;
use crate::types::Pos;

use super::layout::LevelGrid;
use super::{GeneratedLevel, MonsterSpawn};

const WIDTH: i32 = 100;
const HEIGHT: i32 = 160;

pub(super) fn build() -> GeneratedLevel {
    let mut grid = LevelGrid::new(WIDTH, HEIGHT);

    grid.dig(10, 7, 54, 7); // the top gallery
    grid.dig(2, 7, 60, 25); // the boss chamber
    grid.dig(10, 25, 52, 49); // the middle hall
    grid.dig(19, 49, 21, 51); // the connecting corridor
    grid.dig(16, 51, 46, 61); // the entry hall

    // Pillar rows in the middle hall.
    for x in (14..=48).step_by(2) {
        for y in [29, 31] {
            stamp_pillar(&mut grid, x, y);
        }
    }
    // Pillar clusters flanking the boss chamber.
    for x in [24, 26] {
        for y in [13, 15] {
            stamp_pillar(&mut grid, x, y);
        }
    }
    for x in 24..=26 {
        for y in [21, 23] {
            stamp_pillar(&mut grid, x, y);
        }
    }
    for x in 36..=38 {
        for y in [13, 15] {
            stamp_pillar(&mut grid, x, y);
        }
    }
    for x in [36, 38] {
        for y in [21, 23] {
            stamp_pillar(&mut grid, x, y);
        }
    }

    let entry = Pos { y: 56, x: 36 };
    let monster_spawns = vec![
        MonsterSpawn { kind: MonsterKind::InfernalGuard, pos: Pos { y: 46, x: 14 } },
        MonsterSpawn { kind: MonsterKind::InfernalGuard, pos: Pos { y: 46, x: 48 } },
        MonsterSpawn { kind: MonsterKind::SkeletonWarrior, pos: Pos { y: 24, x: 12 } },
        MonsterSpawn { kind: MonsterKind::SkeletonWarrior, pos: Pos { y: 24, x: 46 } },
        MonsterSpawn { kind: MonsterKind::Parnak, pos: Pos { y: 18, x: 18 } },
    ];

    GeneratedLevel {
        width: WIDTH,
        height: HEIGHT,
        walls: grid.into_walls(),
        entry,
        // There is no way further down; the stairs are parked on the sealed
        // corner tile.
        stairs: Pos { y: 0, x: 0 },
        quest_pos: Some(Pos { y: entry.y + 2, x: entry.x + 2 }),
        monster_spawns,
        item_spawns: Vec::new(),
    }
}

/// A 2x2 wall block whose anchor matches the dig coordinate convention.
fn stamp_pillar(grid: &mut LevelGrid, x: i32, y: i32) {
    grid.fill(x, y - 1, x + 1, y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_entry_and_the_boss_tile_are_open() {
        let level = build();
        assert!(!level.is_wall(level.entry));
        assert!(!level.is_wall(Pos { y: 18, x: 18 }));
    }

    #[test]
    fn the_quest_letter_waits_near_the_entry() {
        let level = build();
        let quest = level.quest_pos.expect("the final floor repositions the letter");
        assert!(!level.is_wall(quest));
        assert_eq!(level.entry.manhattan(quest), 4);
    }

    #[test]
    fn pillars_do_not_seal_the_middle_hall() {
        let level = build();
        // A walkable lane survives above and below the pillar rows.
        assert!(!level.is_wall(Pos { y: 27, x: 30 }));
        assert!(!level.is_wall(Pos { y: 33, x: 30 }));
        assert!(level.is_wall(Pos { y: 29, x: 14 }));
    }
}
