//! Per-actor turn behavior. The player variant interprets a captured input
//! command; monsters chase and bite; confusion temporarily shadows whatever
//! behavior the actor had before.

use std::collections::{BTreeMap, BTreeSet};

use rand_chacha::rand_core::Rng;

use crate::engine::Engine;
use crate::frontend::Frontend;
use crate::types::{ActorId, Command, GameStatus, Pos, Rgb};

#[derive(Clone, Debug)]
pub enum Ai {
    Player,
    Monster,
    /// Shadows `previous` for `turns` turns, then restores it.
    Confused { turns: i32, previous: Box<Ai> },
}

impl Engine {
    /// Runs one turn for `id`. Dead actors and actors without a behavior
    /// never act.
    pub fn update_actor(
        &mut self,
        id: ActorId,
        command: Option<Command>,
        frontend: &mut dyn Frontend,
    ) {
        let Some(actor) = self.actors.get(id) else {
            return;
        };
        if actor.is_dead() {
            return;
        }
        match actor.ai {
            None => {}
            Some(Ai::Player) => self.update_player(command, frontend),
            Some(Ai::Monster) => self.update_monster(id),
            Some(Ai::Confused { .. }) => self.update_confused(id),
        }
    }

    fn update_player(&mut self, command: Option<Command>, frontend: &mut dyn Frontend) {
        let Some(command) = command else {
            return;
        };
        match command {
            Command::Move(dir) => {
                self.status = GameStatus::NewTurn;
                let (dy, dx) = dir.delta();
                if self.move_or_attack(self.player, dy, dx) {
                    let origin = self.actors[self.player].pos;
                    self.map.compute_fov(origin, self.fov_radius);
                }
            }
            Command::Wait => {
                self.status = GameStatus::NewTurn;
            }
            Command::PickUp => {
                self.status = GameStatus::NewTurn;
                self.pick_up_item();
            }
            Command::UseItem(slot) => {
                if self.use_item(self.player, slot, frontend) {
                    self.status = GameStatus::NewTurn;
                }
            }
            Command::UseItemAt { slot, target } => {
                if self.use_item_at(self.player, slot, target) {
                    self.status = GameStatus::NewTurn;
                }
            }
            Command::DropItem(slot) => {
                if self.drop_item(self.player, slot) {
                    self.status = GameStatus::NewTurn;
                }
            }
            Command::Descend => {
                let player_pos = self.actors[self.player].pos;
                if self.actors[self.stairs].pos == player_pos {
                    self.next_level();
                } else {
                    self.message(Rgb::LIGHT_GREY, "There are no stairs here.".to_string());
                }
            }
        }
    }

    /// Monsters outside the player's field of view stay inert. Inside it they
    /// bite when adjacent and otherwise take one step along a shortest path.
    fn update_monster(&mut self, id: ActorId) {
        let pos = self.actors[id].pos;
        if !self.map.is_in_fov(pos) {
            return;
        }
        let player_pos = self.actors[self.player].pos;
        if pos.manhattan(player_pos) == 1 {
            self.attack(id, self.player);
            return;
        }
        if let Some(step) = self.shortest_path_step(pos, player_pos) {
            self.actors[id].pos = step;
        }
    }

    /// A confused actor staggers one random cardinal step, bumping into
    /// whatever stands there. The shadowed behavior returns when the timer
    /// runs out.
    fn update_confused(&mut self, id: ActorId) {
        let roll = (self.rng.next_u32() % 4) as usize;
        let pos = self.actors[id].pos;
        let target = pos.neighbors()[roll];
        self.move_or_attack(id, target.y - pos.y, target.x - pos.x);

        let mut expired = false;
        if let Some(Ai::Confused { turns, .. }) = self.actors[id].ai.as_mut() {
            *turns -= 1;
            expired = *turns <= 0;
        }
        if expired {
            if let Some(Ai::Confused { previous, .. }) = self.actors[id].ai.take() {
                self.actors[id].ai = Some(*previous);
            }
            let name = self.actors[id].name.clone();
            self.message(Rgb::RED, format!("The {name} is no longer confused!"));
        }
    }

    /// Attempts to move `id` one step. Bumping into a live destructible
    /// attacks it instead and does not move. Returns whether the actor moved.
    pub fn move_or_attack(&mut self, id: ActorId, dy: i32, dx: i32) -> bool {
        let pos = self.actors[id].pos;
        let target = Pos { y: pos.y + dy, x: pos.x + dx };
        if self.map.is_wall(target) {
            return false;
        }

        let mut blocker = None;
        let mut flavor = Vec::new();
        for (other_id, other) in &self.actors {
            if other_id == id || other.pos != target {
                continue;
            }
            if other.destructible.as_ref().is_some_and(|d| !d.is_dead()) {
                blocker = Some(other_id);
                break;
            }
            // Corpses and loot underfoot get a mention, but only for the
            // player and only where the player can see them.
            if id == self.player && self.map.is_in_fov(target) {
                flavor.push(other.name.clone());
            }
        }

        if let Some(target_id) = blocker {
            self.attack(id, target_id);
            return false;
        }
        for name in flavor {
            self.message(Rgb::LIGHT_GREY, format!("There's a {name} here."));
        }
        self.actors[id].pos = target;
        true
    }

    /// First step of a shortest walkable path from `from` to `goal`, or
    /// `None` when no path exists. The goal tile is treated as enterable even
    /// when a blocking actor stands on it, so chasers can path right up to
    /// their quarry.
    pub(crate) fn shortest_path_step(&self, from: Pos, goal: Pos) -> Option<Pos> {
        #[derive(PartialEq, Eq, PartialOrd, Ord)]
        struct OpenNode {
            f: u32,
            h: u32,
            pos: Pos,
        }

        if from == goal {
            return None;
        }

        let mut open = BTreeSet::new();
        let mut g_score: BTreeMap<Pos, u32> = BTreeMap::new();
        let mut came_from: BTreeMap<Pos, Pos> = BTreeMap::new();

        g_score.insert(from, 0);
        open.insert(OpenNode { f: from.manhattan(goal), h: from.manhattan(goal), pos: from });

        while let Some(node) = open.pop_first() {
            if node.pos == goal {
                let mut cur = goal;
                while came_from[&cur] != from {
                    cur = came_from[&cur];
                }
                return Some(cur);
            }
            let g_here = g_score[&node.pos];
            for next in node.pos.neighbors() {
                if next != goal && !self.can_walk(next) {
                    continue;
                }
                let tentative = g_here + 1;
                if g_score.get(&next).is_none_or(|&g| tentative < g) {
                    if let Some(&old_g) = g_score.get(&next) {
                        let h = next.manhattan(goal);
                        open.remove(&OpenNode { f: old_g + h, h, pos: next });
                    }
                    g_score.insert(next, tentative);
                    came_from.insert(next, node.pos);
                    let h = next.manhattan(goal);
                    open.insert(OpenNode { f: tentative + h, h, pos: next });
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::NullFrontend;
    use crate::types::Dir;

    #[test]
    fn wait_command_yields_the_turn() {
        let mut engine = Engine::new_game(11);
        let mut frontend = NullFrontend;
        engine.update_actor(engine.player, Some(Command::Wait), &mut frontend);
        assert_eq!(engine.status, GameStatus::NewTurn);
    }

    #[test]
    fn descend_away_from_stairs_only_complains() {
        let mut engine = Engine::new_game(11);
        // Park the stairs somewhere the player is not.
        let player_pos = engine.actors[engine.player].pos;
        engine.actors[engine.stairs].pos = Pos { y: player_pos.y + 5, x: player_pos.x + 5 };
        let level_before = engine.level();

        let mut frontend = NullFrontend;
        engine.update_actor(engine.player, Some(Command::Descend), &mut frontend);
        assert_eq!(engine.level(), level_before);
        assert!(engine.log().last().unwrap().text.contains("no stairs"));
    }

    #[test]
    fn monster_outside_fov_stays_put() {
        let mut engine = Engine::new_game(11);
        // A far corner is outside any reasonable sight radius.
        let far = Pos { y: 98, x: 98 };
        let rat = engine.spawn_test_monster(far, 10, 0, 3, 35);
        let mut frontend = NullFrontend;
        engine.update_actor(engine.player, Some(Command::Wait), &mut frontend);
        for _ in 0..5 {
            engine.update_actor(rat, None, &mut frontend);
        }
        assert_eq!(engine.actors[rat].pos, far);
    }

    #[test]
    fn adjacent_monster_attacks_instead_of_moving() {
        let mut engine = Engine::new_game(11);
        let player_pos = engine.actors[engine.player].pos;
        let beside = Pos { y: player_pos.y, x: player_pos.x + 1 };
        let rat = engine.spawn_test_monster(beside, 10, 0, 50, 35);
        engine.map.compute_fov(player_pos, 10);

        let hp_before = engine.actors[engine.player].destructible.as_ref().unwrap().hp;
        let mut frontend = NullFrontend;
        engine.update_actor(rat, None, &mut frontend);
        assert_eq!(engine.actors[rat].pos, beside);
        let hp_after = engine.actors[engine.player].destructible.as_ref().unwrap().hp;
        assert!(hp_after < hp_before);
    }

    #[test]
    fn bumping_into_a_wall_does_not_move_or_spend_sight() {
        let mut engine = Engine::new_game(11);
        let player = engine.player;
        // Walk the player into the map border, which is always wall.
        engine.actors[player].pos = Pos { y: 1, x: 1 };
        let moved = engine.move_or_attack(player, -1, 0);
        assert!(!moved);
        assert_eq!(engine.actors[player].pos, Pos { y: 1, x: 1 });
    }

    #[test]
    fn confusion_restores_previous_behavior_when_it_expires() {
        let mut engine = Engine::new_game(11);
        let player_pos = engine.actors[engine.player].pos;
        let near = Pos { y: player_pos.y + 2, x: player_pos.x };
        let rat = engine.spawn_test_monster(near, 10, 0, 3, 35);
        engine.actors[rat].ai =
            Some(Ai::Confused { turns: 1, previous: Box::new(Ai::Monster) });

        let mut frontend = NullFrontend;
        engine.update_actor(rat, None, &mut frontend);
        assert!(matches!(engine.actors[rat].ai, Some(Ai::Monster)));
        assert!(engine.log().last().unwrap().text.contains("no longer confused"));
    }

    #[test]
    fn path_step_is_an_adjacent_tile_closer_to_the_goal() {
        let mut engine = Engine::new_game(11);
        // Live monsters count as obstacles and can plug a narrow corridor;
        // clear the roster so this checks the carved layout itself.
        let monster_ids: Vec<_> = engine
            .actors
            .iter()
            .filter(|(id, a)| a.ai.is_some() && *id != engine.player)
            .map(|(id, _)| id)
            .collect();
        for id in monster_ids {
            engine.remove_actor(id);
        }

        let from = engine.actors[engine.player].pos;
        let goal = engine.actors[engine.stairs].pos;
        let step = engine.shortest_path_step(from, goal).expect("levels are connected");
        assert_eq!(from.manhattan(step), 1);
    }

    #[test]
    fn defeat_ignores_all_further_commands() {
        let mut engine = Engine::new_game(11);
        engine.take_damage(engine.player, 9_999);
        let mut frontend = NullFrontend;
        engine.update(Some(Command::Move(Dir::East)), &mut frontend);
        assert_eq!(engine.status, GameStatus::Defeat);
    }
}
