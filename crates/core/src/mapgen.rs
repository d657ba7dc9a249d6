//! Procedural level generation split into coherent submodules. The output is
//! a plain data description; the engine turns it into a live `Map` and actor
//! roster.

mod final_level;
mod layout;
mod seed;
mod spawns;

use crate::content::{ItemKind, MonsterKind};
use crate::types::Pos;

/// Levels at and past this depth use the hand-built boss floor.
pub const BOSS_LEVEL: i32 = 10;

pub const LEVEL_WIDTH: i32 = 100;
pub const LEVEL_HEIGHT: i32 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonsterSpawn {
    pub kind: MonsterKind,
    pub pos: Pos,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemSpawn {
    pub kind: ItemKind,
    pub pos: Pos,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedLevel {
    pub width: i32,
    pub height: i32,
    /// Row-major wall mask, `true` = wall.
    pub walls: Vec<bool>,
    pub entry: Pos,
    pub stairs: Pos,
    /// Where the quest letter should be moved, when this level repositions
    /// it at all.
    pub quest_pos: Option<Pos>,
    pub monster_spawns: Vec<MonsterSpawn>,
    pub item_spawns: Vec<ItemSpawn>,
}

impl GeneratedLevel {
    pub fn is_wall(&self, pos: Pos) -> bool {
        if pos.y < 0 || pos.x < 0 || pos.y >= self.height || pos.x >= self.width {
            return true;
        }
        self.walls[(pos.y * self.width + pos.x) as usize]
    }
}

/// Builds the level for `level` deterministically from the run seed. Depths
/// below the boss threshold are procedural; the boss floor is fixed.
pub fn generate_level(run_seed: u64, level: i32) -> GeneratedLevel {
    if level >= BOSS_LEVEL {
        return final_level::build();
    }
    let level_seed = seed::derive_level_seed(run_seed, level);
    let layout = layout::build_level_layout(level_seed, LEVEL_WIDTH, LEVEL_HEIGHT);
    let (monster_spawns, item_spawns) = spawns::populate(level_seed, level, &layout);
    GeneratedLevel {
        width: LEVEL_WIDTH,
        height: LEVEL_HEIGHT,
        walls: layout.walls,
        entry: layout.entry,
        stairs: layout.stairs,
        quest_pos: None,
        monster_spawns,
        item_spawns,
    }
}

/// The seed every fresh level's wall layout can be regrown from.
pub fn derive_level_seed(run_seed: u64, level: i32) -> u64 {
    seed::derive_level_seed(run_seed, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    fn reachable_from(level: &GeneratedLevel, start: Pos) -> BTreeSet<Pos> {
        let mut seen = BTreeSet::new();
        let mut frontier = vec![start];
        seen.insert(start);
        while let Some(pos) = frontier.pop() {
            for next in pos.neighbors() {
                if !level.is_wall(next) && seen.insert(next) {
                    frontier.push(next);
                }
            }
        }
        seen
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate_level(4242, 3);
        let b = generate_level(4242, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn different_levels_differ() {
        let a = generate_level(4242, 1);
        let b = generate_level(4242, 2);
        assert_ne!(a.walls, b.walls);
    }

    #[test]
    fn entry_and_stairs_are_open_and_distinct() {
        for level in 1..BOSS_LEVEL {
            let generated = generate_level(7, level);
            assert!(!generated.is_wall(generated.entry));
            assert!(!generated.is_wall(generated.stairs));
            assert_ne!(generated.entry, generated.stairs);
        }
    }

    #[test]
    fn spawns_land_on_open_tiles_away_from_the_entry() {
        let generated = generate_level(99, 4);
        for spawn in &generated.monster_spawns {
            assert!(!generated.is_wall(spawn.pos));
            assert_ne!(spawn.pos, generated.entry);
        }
        for spawn in &generated.item_spawns {
            assert!(!generated.is_wall(spawn.pos));
        }
    }

    #[test]
    fn boss_floor_roster_is_fixed() {
        let generated = generate_level(1, BOSS_LEVEL);
        let again = generate_level(987_654, BOSS_LEVEL);
        assert_eq!(generated, again, "the final floor ignores the run seed");
        assert_eq!(generated.monster_spawns.len(), 5);
        assert!(
            generated
                .monster_spawns
                .iter()
                .any(|s| s.kind == crate::content::MonsterKind::Parnak)
        );
    }

    proptest! {
        #[test]
        fn every_walkable_tile_is_reachable_from_the_entry(
            run_seed in any::<u64>(),
            level in 1..BOSS_LEVEL,
        ) {
            let generated = generate_level(run_seed, level);
            let reachable = reachable_from(&generated, generated.entry);
            for y in 0..generated.height {
                for x in 0..generated.width {
                    let pos = Pos { y, x };
                    if !generated.is_wall(pos) {
                        prop_assert!(
                            reachable.contains(&pos),
                            "unreachable open tile at {:?}", pos
                        );
                    }
                }
            }
            prop_assert!(reachable.contains(&generated.stairs));
        }
    }
}
