//! Carrying and consuming items. An item is an ordinary actor with a
//! `Pickable`; while carried it lives inside its owner's `Container` and is
//! absent from the world registry.

use crate::actor::Actor;
use crate::ai::Ai;
use crate::engine::Engine;
use crate::frontend::Frontend;
use crate::types::{ActorId, Pos, Rgb};

/// A bag of owned actors. `capacity` of zero means unbounded.
#[derive(Clone, Debug, Default)]
pub struct Container {
    pub capacity: usize,
    pub inventory: Vec<Actor>,
}

impl Container {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, inventory: Vec::new() }
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.inventory.len() >= self.capacity
    }

    /// Takes ownership of `actor`, or hands it back when the bag is full.
    pub fn add(&mut self, actor: Actor) -> Result<(), Actor> {
        if self.is_full() {
            return Err(actor);
        }
        self.inventory.push(actor);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Pickable {
    pub effect: UseEffect,
}

/// What happens when an item is consumed. Ranges of `0.0` mean unbounded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UseEffect {
    Heal { amount: i32 },
    LightningBolt { range: f32, damage: i32 },
    Fireball { range: f32, radius: f32, damage: i32 },
    Confuse { turns: i32, range: f32 },
}

impl Engine {
    /// Moves the first pickable at the player's feet into the player's
    /// inventory. A full bag or an empty tile still reports; the turn is
    /// spent either way.
    pub fn pick_up_item(&mut self) {
        let player_pos = self.actors[self.player].pos;
        let found = self
            .order
            .iter()
            .copied()
            .find(|&id| {
                self.actors
                    .get(id)
                    .is_some_and(|a| a.pickable.is_some() && a.pos == player_pos)
            });

        let Some(item_id) = found else {
            self.message(
                Rgb::LIGHT_GREY,
                "There's nothing here that you can pick up.".to_string(),
            );
            return;
        };
        let full = self.actors[self.player].container.as_ref().is_none_or(Container::is_full);
        if full {
            let name = self.actors[item_id].name.clone();
            self.message(Rgb::RED, format!("Your inventory is full, cannot pick up {name}."));
            return;
        }

        let item = self.remove_actor(item_id);
        let name = item.name.clone();
        if let Some(container) = self.actors[self.player].container.as_mut() {
            // The capacity check above makes this infallible.
            let _ = container.add(item);
        }
        self.message(Rgb::LIGHT_GREY, format!("You pick up the {name}."));
    }

    /// Puts inventory slot `slot` back on the ground at the owner's feet.
    pub fn drop_item(&mut self, owner: ActorId, slot: usize) -> bool {
        let owner_pos = self.actors[owner].pos;
        let Some(container) = self.actors[owner].container.as_mut() else {
            return false;
        };
        if slot >= container.inventory.len() {
            return false;
        }
        let mut item = container.inventory.remove(slot);
        item.pos = owner_pos;
        let name = item.name.clone();
        let id = self.insert_actor(item);
        self.send_to_back(id);
        let owner_name = self.actors[owner].name.clone();
        self.message(Rgb::LIGHT_GREY, format!("{owner_name} drops a {name}."));
        true
    }

    /// The targeting range an item needs before it can be consumed, or `None`
    /// for items that apply immediately.
    pub fn item_targeting(&self, owner: ActorId, slot: usize) -> Option<f32> {
        let effect = self.item_effect(owner, slot)?;
        match effect {
            UseEffect::Fireball { range, .. } | UseEffect::Confuse { range, .. } => Some(range),
            UseEffect::Heal { .. } | UseEffect::LightningBolt { .. } => None,
        }
    }

    /// Consumes inventory slot `slot`, asking `frontend` for a tile when the
    /// effect needs one. Returns whether the item was spent.
    pub fn use_item(&mut self, owner: ActorId, slot: usize, frontend: &mut dyn Frontend) -> bool {
        let Some(effect) = self.item_effect(owner, slot) else {
            return false;
        };
        let consumed = match effect {
            UseEffect::Heal { amount } => self.apply_heal(owner, amount),
            UseEffect::LightningBolt { range, damage } => {
                self.apply_lightning(owner, range, damage)
            }
            UseEffect::Fireball { range, radius, damage } => {
                match self.pick_a_tile(frontend, range) {
                    Some(tile) => self.apply_fireball(tile, radius, damage),
                    None => false,
                }
            }
            UseEffect::Confuse { turns, range } => match self.pick_a_tile(frontend, range) {
                Some(tile) => self.apply_confusion(tile, turns),
                None => false,
            },
        };
        if consumed {
            self.consume_item(owner, slot);
        }
        consumed
    }

    /// Like `use_item` but with the target tile already chosen. Targets
    /// beyond the item's range are rejected without spending the item.
    pub fn use_item_at(&mut self, owner: ActorId, slot: usize, target: Pos) -> bool {
        let Some(effect) = self.item_effect(owner, slot) else {
            return false;
        };
        let origin = self.actors[owner].pos;
        let consumed = match effect {
            UseEffect::Heal { amount } => self.apply_heal(owner, amount),
            UseEffect::LightningBolt { range, damage } => {
                self.apply_lightning(owner, range, damage)
            }
            UseEffect::Fireball { range, radius, damage } => {
                if Self::in_range(origin, target, range) {
                    self.apply_fireball(target, radius, damage)
                } else {
                    false
                }
            }
            UseEffect::Confuse { turns, range } => {
                if Self::in_range(origin, target, range) {
                    self.apply_confusion(target, turns)
                } else {
                    false
                }
            }
        };
        if consumed {
            self.consume_item(owner, slot);
        }
        consumed
    }

    fn in_range(origin: Pos, target: Pos, range: f32) -> bool {
        range == 0.0 || origin.distance_to(target) <= range
    }

    fn item_effect(&self, owner: ActorId, slot: usize) -> Option<UseEffect> {
        let container = self.actors.get(owner)?.container.as_ref()?;
        let item = container.inventory.get(slot)?;
        Some(item.pickable.as_ref()?.effect)
    }

    fn consume_item(&mut self, owner: ActorId, slot: usize) {
        if let Some(container) = self.actors[owner].container.as_mut() {
            if slot < container.inventory.len() {
                container.inventory.remove(slot);
            }
        }
    }

    /// Fails (and does not consume) when the drinker is already at full
    /// health.
    fn apply_heal(&mut self, owner: ActorId, amount: i32) -> bool {
        let Some(destructible) = self.actors[owner].destructible.as_mut() else {
            return false;
        };
        destructible.heal(amount) > 0
    }

    fn apply_lightning(&mut self, owner: ActorId, range: f32, damage: i32) -> bool {
        let origin = self.actors[owner].pos;
        let Some(target_id) = self.get_closest_monster(origin, range) else {
            self.message(Rgb::LIGHT_GREY, "No enemy is close enough to strike.".to_string());
            return false;
        };
        let name = self.actors[target_id].name.clone();
        self.message(
            Rgb::LIGHT_BLUE,
            format!(
                "A lighting bolt strikes the {name} with a loud thunder! \
                 The damage is {damage} hit points."
            ),
        );
        self.take_damage(target_id, damage);
        true
    }

    fn apply_fireball(&mut self, center: Pos, radius: f32, damage: i32) -> bool {
        self.message(
            Rgb::ORANGE,
            format!("The fireball explodes, burning everything within {radius} tiles!"),
        );
        let burned: Vec<ActorId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| {
                self.actors.get(id).is_some_and(|a| {
                    a.destructible.as_ref().is_some_and(|d| !d.is_dead())
                        && a.distance_to(center) <= radius
                })
            })
            .collect();
        for id in burned {
            let name = self.actors[id].name.clone();
            self.message(Rgb::ORANGE, format!("The {name} gets burned for {damage} hit points."));
            self.take_damage(id, damage);
        }
        true
    }

    /// Fails when no live actor with a behavior stands on the tile.
    fn apply_confusion(&mut self, target: Pos, turns: i32) -> bool {
        let Some(target_id) = self.get_actor(target) else {
            return false;
        };
        let actor = &mut self.actors[target_id];
        let Some(previous) = actor.ai.take() else {
            return false;
        };
        actor.ai = Some(Ai::Confused { turns, previous: Box::new(previous) });
        let name = actor.name.clone();
        self.message(
            Rgb::LIGHT_GREEN,
            format!("The eyes of the {name} look vacant, as he starts to stumble around!"),
        );
        true
    }
}
