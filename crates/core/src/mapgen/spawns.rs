//! Deterministic monster and item placement for procedural levels.

use std::collections::BTreeSet;

use crate::content::{ItemKind, MonsterKind};

use super::layout::LevelLayout;
use super::seed::random_i32;
use super::{ItemSpawn, MonsterSpawn};

const MAX_ROOM_MONSTERS: i32 = 3;
const MAX_ROOM_ITEMS: i32 = 2;

/// Streams below this are reserved for the layout pass.
const SPAWN_STREAM_BASE: u64 = 1_000;
const STREAMS_PER_ROOM: u64 = 64;

pub(super) fn populate(
    level_seed: u64,
    level: i32,
    layout: &LevelLayout,
) -> (Vec<MonsterSpawn>, Vec<ItemSpawn>) {
    let mut monsters = Vec::new();
    let mut items = Vec::new();
    let mut taken = BTreeSet::new();
    taken.insert(layout.entry);

    // The first room is the player's; it stays empty.
    for (room_index, room) in layout.rooms.iter().enumerate().skip(1) {
        let mut stream = SPAWN_STREAM_BASE + room_index as u64 * STREAMS_PER_ROOM;
        let mut next = || {
            stream += 1;
            stream
        };

        let monster_count = random_i32(level_seed, next(), 0, MAX_ROOM_MONSTERS);
        for _ in 0..monster_count {
            let pos = room.random_tile(level_seed, next());
            if !taken.insert(pos) {
                continue;
            }
            let kind = pick_monster(random_i32(level_seed, next(), 0, 99), level);
            monsters.push(MonsterSpawn { kind, pos });
        }

        let item_count = random_i32(level_seed, next(), 0, MAX_ROOM_ITEMS);
        for _ in 0..item_count {
            let pos = room.random_tile(level_seed, next());
            if !taken.insert(pos) {
                continue;
            }
            let kind = pick_item(random_i32(level_seed, next(), 0, 99));
            items.push(ItemSpawn { kind, pos });
        }
    }

    (monsters, items)
}

/// Weighted pick that shifts toward tougher monsters as the depth grows.
fn pick_monster(roll: i32, level: i32) -> MonsterKind {
    let troll_weight = (level * 5).min(30);
    let skeleton_weight = if level >= 6 { 10 } else { 0 };
    let mut threshold = troll_weight;
    if roll < threshold {
        return MonsterKind::Troll;
    }
    threshold += skeleton_weight;
    if roll < threshold {
        return MonsterKind::SkeletonWarrior;
    }
    threshold += 30;
    if roll < threshold {
        return MonsterKind::Orc;
    }
    threshold += 25;
    if roll < threshold {
        return MonsterKind::Goblin;
    }
    MonsterKind::GiantRat
}

fn pick_item(roll: i32) -> ItemKind {
    if roll < 70 {
        ItemKind::HealthPotion
    } else if roll < 80 {
        ItemKind::LightningScroll
    } else if roll < 90 {
        ItemKind::FireballScroll
    } else {
        ItemKind::ConfusionScroll
    }
}
