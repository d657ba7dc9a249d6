//! The entity aggregate: position, appearance, and optional capability slots.
//! An actor is anything placed in the world; behavior comes entirely from
//! which capabilities are attached.

use crate::ai::Ai;
use crate::combat::{Attacker, Destructible};
use crate::inventory::{Container, Pickable};
use crate::types::{Pos, Rgb};

#[derive(Clone, Debug)]
pub struct Actor {
    pub pos: Pos,
    pub glyph: char,
    pub color: Rgb,
    pub name: String,
    /// Obstructs movement while set. Cleared on death so corpses can be
    /// walked over.
    pub blocks: bool,
    /// Rendered only while inside the current field of view. Actors with
    /// this cleared (stairs, the quest letter) are remembered once explored.
    pub fov_only: bool,
    pub destructible: Option<Destructible>,
    pub attacker: Option<Attacker>,
    pub ai: Option<Ai>,
    pub container: Option<Container>,
    pub pickable: Option<Pickable>,
}

impl Actor {
    pub fn new(pos: Pos, glyph: char, color: Rgb, name: impl Into<String>) -> Self {
        Self {
            pos,
            glyph,
            color,
            name: name.into(),
            blocks: true,
            fov_only: true,
            destructible: None,
            attacker: None,
            ai: None,
            container: None,
            pickable: None,
        }
    }

    pub fn distance_to(&self, target: Pos) -> f32 {
        self.pos.distance_to(target)
    }

    /// An actor with no destructible is immortal and never counts as dead.
    pub fn is_dead(&self) -> bool {
        self.destructible.as_ref().is_some_and(Destructible::is_dead)
    }
}
