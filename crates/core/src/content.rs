//! Actor factories: every monster and item the dungeon can spawn, in one
//! place so generation tables and tests agree on stats.

use crate::actor::Actor;
use crate::ai::Ai;
use crate::combat::{Attacker, Destructible};
use crate::inventory::{Pickable, UseEffect};
use crate::types::{Pos, Rgb};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonsterKind {
    GiantRat,
    Goblin,
    Orc,
    Troll,
    InfernalGuard,
    SkeletonWarrior,
    Parnak,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    HealthPotion,
    LightningScroll,
    FireballScroll,
    ConfusionScroll,
}

struct MonsterStats {
    glyph: char,
    color: Rgb,
    name: &'static str,
    corpse_name: &'static str,
    hp: i32,
    defense: i32,
    power: i32,
    xp: i32,
}

fn monster_stats(kind: MonsterKind) -> MonsterStats {
    match kind {
        MonsterKind::GiantRat => MonsterStats {
            glyph: 'r',
            color: Rgb::GREY,
            name: "giant rat",
            corpse_name: "dead giant rat",
            hp: 4,
            defense: 0,
            power: 2,
            xp: 10,
        },
        MonsterKind::Goblin => MonsterStats {
            glyph: 'g',
            color: Rgb::DESATURATED_GREEN,
            name: "goblin",
            corpse_name: "dead goblin",
            hp: 8,
            defense: 0,
            power: 2,
            xp: 20,
        },
        MonsterKind::Orc => MonsterStats {
            glyph: 'o',
            color: Rgb::DESATURATED_GREEN,
            name: "orc",
            corpse_name: "dead orc",
            hp: 10,
            defense: 0,
            power: 3,
            xp: 35,
        },
        MonsterKind::Troll => MonsterStats {
            glyph: 'T',
            color: Rgb::DARKER_GREEN,
            name: "troll",
            corpse_name: "troll carcass",
            hp: 16,
            defense: 1,
            power: 4,
            xp: 100,
        },
        MonsterKind::InfernalGuard => MonsterStats {
            glyph: 'G',
            color: Rgb::DARK_RED,
            name: "infernal guard",
            corpse_name: "smoldering guard husk",
            hp: 150,
            defense: 10,
            power: 20,
            xp: 400,
        },
        MonsterKind::SkeletonWarrior => MonsterStats {
            glyph: 's',
            color: Rgb::WHITE,
            name: "skeleton warrior",
            corpse_name: "pile of bones",
            hp: 15,
            defense: 5,
            power: 10,
            xp: 100,
        },
        MonsterKind::Parnak => MonsterStats {
            glyph: 'P',
            color: Rgb::VIOLET,
            name: "Parnak",
            corpse_name: "remains of Parnak",
            hp: 500,
            defense: 5,
            power: 25,
            xp: 5000,
        },
    }
}

pub fn build_monster(kind: MonsterKind, pos: Pos) -> Actor {
    let stats = monster_stats(kind);
    let mut actor = Actor::new(pos, stats.glyph, stats.color, stats.name);
    actor.destructible =
        Some(Destructible::monster(stats.hp, stats.defense, stats.corpse_name, stats.xp));
    actor.attacker = Some(Attacker::new(stats.power));
    actor.ai = Some(Ai::Monster);
    actor
}

pub fn build_item(kind: ItemKind, pos: Pos) -> Actor {
    let (glyph, color, name, effect) = match kind {
        ItemKind::HealthPotion => {
            ('!', Rgb::VIOLET, "health potion", UseEffect::Heal { amount: 12 })
        }
        ItemKind::LightningScroll => (
            '#',
            Rgb::LIGHT_YELLOW,
            "scroll of lightning bolt",
            UseEffect::LightningBolt { range: 5.0, damage: 20 },
        ),
        ItemKind::FireballScroll => (
            '#',
            Rgb::LIGHT_YELLOW,
            "scroll of fireball",
            UseEffect::Fireball { range: 0.0, radius: 3.0, damage: 12 },
        ),
        ItemKind::ConfusionScroll => (
            '#',
            Rgb::LIGHT_YELLOW,
            "scroll of confusion",
            UseEffect::Confuse { turns: 10, range: 8.0 },
        ),
    };
    let mut actor = Actor::new(pos, glyph, color, name);
    actor.blocks = false;
    actor.pickable = Some(Pickable { effect });
    actor
}

/// The quest letter the player is sent into the dungeon to recover. It has no
/// effect when used; carrying it to the bottom is the point.
pub fn build_quest_letter(pos: Pos) -> Actor {
    let mut actor = Actor::new(pos, '?', Rgb::YELLOW, "ancient letter");
    actor.blocks = false;
    actor.fov_only = false;
    actor
}
