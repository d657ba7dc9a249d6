//! Melee resolution between an Attacker and a Destructible.
//! Damage application is owned exclusively by the destructible path; the
//! attacker never mutates hit points directly.

use crate::engine::Engine;
use crate::types::{ActorId, GameStatus, Rgb};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attacker {
    pub power: i32,
}

impl Attacker {
    pub fn new(power: i32) -> Self {
        Self { power }
    }
}

/// What happens when hit points reach zero. The variant set is closed and
/// known at spawn time, so a tagged enum replaces a dispatch hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathBehavior {
    /// Game over for the whole session.
    Player,
    /// Routine death; reports an experience value to the killer's side.
    Monster { xp: i32 },
}

#[derive(Clone, Debug)]
pub struct Destructible {
    pub hp: i32,
    pub max_hp: i32,
    pub defense: i32,
    pub corpse_name: String,
    pub behavior: DeathBehavior,
}

impl Destructible {
    pub fn player(max_hp: i32, defense: i32, corpse_name: impl Into<String>) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            defense,
            corpse_name: corpse_name.into(),
            behavior: DeathBehavior::Player,
        }
    }

    pub fn monster(max_hp: i32, defense: i32, corpse_name: impl Into<String>, xp: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            defense,
            corpse_name: corpse_name.into(),
            behavior: DeathBehavior::Monster { xp },
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Restores up to `amount` hit points, clamped at the maximum.
    /// Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let restored = amount.min(self.max_hp - self.hp);
        self.hp += restored;
        restored
    }
}

impl Engine {
    /// One melee swing. Targets without a destructible, or already dead,
    /// degrade to a "no effect" notice rather than a fault. Zero-effective
    /// damage still routes through `take_damage` (with 0) so the damage path
    /// stays single.
    pub fn attack(&mut self, attacker_id: ActorId, target_id: ActorId) {
        let Some(power) =
            self.actors.get(attacker_id).and_then(|a| a.attacker.as_ref()).map(|a| a.power)
        else {
            return;
        };
        let attacker_name = self.actors[attacker_id].name.clone();
        let attacker_is_player = attacker_id == self.player;

        let Some(target) = self.actors.get(target_id) else {
            return;
        };
        let target_name = target.name.clone();

        match target.destructible.as_ref() {
            None => {
                self.message(
                    Rgb::LIGHT_GREY,
                    format!("{attacker_name} attacks {target_name} in vain."),
                );
            }
            Some(destructible) if destructible.is_dead() => {
                self.message(
                    Rgb::LIGHT_GREY,
                    format!("{attacker_name} attacks {target_name} but it has no effect!"),
                );
            }
            Some(destructible) => {
                let raw = power - destructible.defense;
                if raw > 0 {
                    let color =
                        if attacker_is_player { Rgb::ORANGE } else { Rgb::LIGHT_GREY };
                    self.message(
                        color,
                        format!("{attacker_name} attacks {target_name} for {raw} hit points."),
                    );
                } else {
                    self.message(
                        Rgb::LIGHT_GREY,
                        format!("{attacker_name} attacks {target_name} but it has no effect!"),
                    );
                }
                self.take_damage(target_id, raw.max(0));
            }
        }
    }

    /// Subtracts `amount` from the target's hit points, floored at zero.
    /// Returns the damage actually dealt. The death transition fires at most
    /// once: a target that is already dead is a no-op.
    pub fn take_damage(&mut self, target_id: ActorId, amount: i32) -> i32 {
        let Some(target) = self.actors.get_mut(target_id) else {
            return 0;
        };
        let Some(destructible) = target.destructible.as_mut() else {
            return 0;
        };
        if destructible.is_dead() {
            return 0;
        }
        let dealt = amount.clamp(0, destructible.hp);
        destructible.hp -= dealt;
        if destructible.hp == 0 {
            self.die(target_id);
        }
        dealt
    }

    /// Death transition: swap to the corpse representation, stop obstructing
    /// movement, and run the variant-specific behavior.
    fn die(&mut self, target_id: ActorId) {
        let Some(actor) = self.actors.get_mut(target_id) else {
            return;
        };
        let Some(destructible) = actor.destructible.as_ref() else {
            return;
        };
        let behavior = destructible.behavior;
        let former_name = std::mem::replace(&mut actor.name, destructible.corpse_name.clone());
        actor.glyph = '%';
        actor.color = Rgb::DARK_RED;
        actor.blocks = false;

        match behavior {
            DeathBehavior::Monster { xp } => {
                self.message(
                    Rgb::LIGHT_GREY,
                    format!("{former_name} is dead. You gain {xp} experience points."),
                );
                self.player_xp += xp;
                // Corpses render underneath whatever walks over them.
                self.send_to_back(target_id);
            }
            DeathBehavior::Player => {
                self.message(Rgb::RED, "You died...".to_string());
                self.status = GameStatus::Defeat;
            }
        }
    }
}
