//! The world context: actor registry, current map, turn state machine, and
//! the message log. Everything that mutates the world goes through a method
//! on `Engine`; capability modules add their verbs in their own files.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use slotmap::SlotMap;
use xxhash_rust::xxh3::Xxh3;

use crate::actor::Actor;
use crate::ai::Ai;
use crate::combat::{Attacker, Destructible};
use crate::content;
use crate::frontend::{Frontend, RenderSurface, TargetEvent};
use crate::inventory::Container;
use crate::map::{FOV_RADIUS, Map};
use crate::mapgen;
use crate::types::{ActorId, Command, GameStatus, Message, Pos, Rgb};

const DARK_WALL: Rgb = Rgb { r: 0, g: 0, b: 100 };
const DARK_GROUND: Rgb = Rgb { r: 50, g: 50, b: 150 };
const LIGHT_WALL: Rgb = Rgb { r: 130, g: 110, b: 50 };
const LIGHT_GROUND: Rgb = Rgb { r: 200, g: 180, b: 50 };

pub struct Engine {
    pub(crate) actors: SlotMap<ActorId, Actor>,
    /// Update and draw order. Corpses and dropped items are moved to the
    /// front so live actors render on top of them.
    pub(crate) order: Vec<ActorId>,
    pub(crate) map: Map,
    pub(crate) level: i32,
    pub(crate) status: GameStatus,
    pub(crate) player: ActorId,
    pub(crate) stairs: ActorId,
    pub(crate) quest_letter: ActorId,
    pub(crate) log: Vec<Message>,
    pub(crate) player_xp: i32,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) run_seed: u64,
    pub(crate) fov_radius: i32,
}

impl Engine {
    pub fn new_game(run_seed: u64) -> Self {
        let mut actors: SlotMap<ActorId, Actor> = SlotMap::with_key();
        let mut order = Vec::new();

        let mut player = Actor::new(Pos { y: 0, x: 0 }, '@', Rgb::WHITE, "player");
        player.destructible = Some(Destructible::player(30, 2, "your cadaver"));
        player.attacker = Some(Attacker::new(5));
        player.ai = Some(Ai::Player);
        player.container = Some(Container::new(26));
        let player = {
            let id = actors.insert(player);
            order.push(id);
            id
        };

        let mut quest_letter = content::build_quest_letter(Pos { y: 0, x: 0 });
        quest_letter.fov_only = false;
        let quest_letter = {
            let id = actors.insert(quest_letter);
            order.push(id);
            id
        };

        let mut stairs = Actor::new(Pos { y: 0, x: 0 }, '>', Rgb::WHITE, "stairs");
        stairs.blocks = false;
        stairs.fov_only = false;
        let stairs = {
            let id = actors.insert(stairs);
            order.push(id);
            id
        };

        let mut engine = Self {
            actors,
            order,
            map: Map::from_walls(1, 1, 0, &[true]),
            level: 1,
            status: GameStatus::Startup,
            player,
            stairs,
            quest_letter,
            log: Vec::new(),
            player_xp: 0,
            rng: ChaCha8Rng::seed_from_u64(run_seed),
            run_seed,
            fov_radius: FOV_RADIUS,
        };
        engine.install_level();
        engine.message(
            Rgb::DARKER_YELLOW,
            "Welcome, stranger! Prepare to perish in these gloomy catacombs.".to_string(),
        );
        engine
    }

    /// Rebuilds the world for `self.level`: every actor except the player,
    /// the stairs, and the quest letter is discarded, then the generated
    /// roster is spawned fresh.
    pub(crate) fn install_level(&mut self) {
        let generated = mapgen::generate_level(self.run_seed, self.level);
        let level_seed = mapgen::derive_level_seed(self.run_seed, self.level);
        self.map =
            Map::from_walls(generated.width, generated.height, level_seed, &generated.walls);

        let keep = [self.player, self.stairs, self.quest_letter];
        self.order.retain(|id| keep.contains(id));
        self.actors.retain(|id, _| keep.contains(&id));

        self.actors[self.player].pos = generated.entry;
        self.actors[self.stairs].pos = generated.stairs;
        if let Some(quest_pos) = generated.quest_pos {
            self.actors[self.quest_letter].pos = quest_pos;
        }
        for spawn in &generated.monster_spawns {
            self.insert_actor(content::build_monster(spawn.kind, spawn.pos));
        }
        for spawn in &generated.item_spawns {
            self.insert_actor(content::build_item(spawn.kind, spawn.pos));
        }
        self.status = GameStatus::Startup;
    }

    /// Descends one level, with the traditional breather on the way down.
    pub fn next_level(&mut self) {
        self.level += 1;
        if let Some(destructible) = self.actors[self.player].destructible.as_mut() {
            let half = destructible.max_hp / 2;
            destructible.heal(half);
        }
        self.message(
            Rgb::VIOLET,
            "You take a moment to rest, and recover your strength.".to_string(),
        );
        self.message(
            Rgb::RED,
            "After a rare moment of peace, you descend deeper into the heart of the dungeon..."
                .to_string(),
        );
        self.install_level();
    }

    /// Advances the world one tick: the player acts on `command`, and when
    /// that consumed a turn every other live actor gets one too.
    pub fn update(&mut self, command: Option<Command>, frontend: &mut dyn Frontend) {
        if self.status == GameStatus::Defeat {
            return;
        }
        if self.status == GameStatus::Startup {
            let origin = self.actors[self.player].pos;
            self.map.compute_fov(origin, self.fov_radius);
        }
        self.status = GameStatus::Idle;
        self.update_actor(self.player, command, frontend);
        if self.status == GameStatus::NewTurn {
            let snapshot = self.order.clone();
            for id in snapshot {
                if id != self.player {
                    self.update_actor(id, None, frontend);
                }
            }
            // A monster may have killed the player during the pass; only a
            // turn that resolved cleanly settles back to waiting for input.
            if self.status == GameStatus::NewTurn {
                self.status = GameStatus::Idle;
            }
        }
    }

    /// Draws the whole scene: tiles first, then remembered fixtures, then
    /// everything currently in sight, with the player on top.
    pub fn render(&self, surface: &mut dyn RenderSurface) {
        surface.clear();
        surface.set_center(self.actors[self.player].pos);

        for y in 0..self.map.height() {
            for x in 0..self.map.width() {
                let pos = Pos { y, x };
                if self.map.is_in_fov(pos) {
                    let (glyph, color) = if self.map.is_wall(pos) {
                        ('#', LIGHT_WALL)
                    } else {
                        ('.', LIGHT_GROUND)
                    };
                    surface.draw_glyph(pos, glyph, color);
                } else if self.map.is_explored(pos) {
                    let (glyph, color) =
                        if self.map.is_wall(pos) { ('#', DARK_WALL) } else { ('.', DARK_GROUND) };
                    surface.draw_glyph(pos, glyph, color);
                }
            }
        }

        let shown = |actor: &Actor| {
            self.map.is_in_fov(actor.pos)
                || (!actor.fov_only && self.map.is_explored(actor.pos))
        };
        // Ground items first, so a creature standing on loot covers it.
        for &id in &self.order {
            if id == self.player {
                continue;
            }
            let actor = &self.actors[id];
            if actor.pickable.is_some() && shown(actor) {
                surface.draw_glyph(actor.pos, actor.glyph, actor.color);
            }
        }
        for &id in &self.order {
            if id == self.player {
                continue;
            }
            let actor = &self.actors[id];
            if actor.pickable.is_none() && shown(actor) {
                surface.draw_glyph(actor.pos, actor.glyph, actor.color);
            }
        }
        let player = &self.actors[self.player];
        surface.draw_glyph(player.pos, player.glyph, player.color);
    }

    /// Blocking targeting loop: keeps redrawing with the candidate tiles
    /// highlighted until the frontend confirms a valid tile or cancels.
    pub fn pick_a_tile(&mut self, frontend: &mut dyn Frontend, max_range: f32) -> Option<Pos> {
        let origin = self.actors[self.player].pos;
        let mut hover: Option<Pos> = None;
        loop {
            self.render(frontend);
            for y in 0..self.map.height() {
                for x in 0..self.map.width() {
                    let pos = Pos { y, x };
                    if self.map.is_in_fov(pos)
                        && (max_range == 0.0 || origin.distance_to(pos) <= max_range)
                    {
                        frontend.highlight(pos, false);
                    }
                }
            }
            if let Some(pos) = hover {
                frontend.highlight(pos, true);
            }
            frontend.flush();

            match frontend.poll_event() {
                TargetEvent::Hover(pos) => hover = Some(pos),
                TargetEvent::Confirm(pos) => {
                    if self.map.is_in_fov(pos)
                        && (max_range == 0.0 || origin.distance_to(pos) <= max_range)
                    {
                        return Some(pos);
                    }
                }
                TargetEvent::Cancel | TargetEvent::WindowClosed => return None,
            }
        }
    }

    pub(crate) fn insert_actor(&mut self, actor: Actor) -> ActorId {
        let id = self.actors.insert(actor);
        self.order.push(id);
        id
    }

    pub(crate) fn remove_actor(&mut self, id: ActorId) -> Actor {
        self.order.retain(|&other| other != id);
        self.actors.remove(id).unwrap_or_else(|| {
            unreachable!("remove_actor is only called with live registry handles")
        })
    }

    /// Moves `id` to the front of the draw order so everything else renders
    /// on top of it.
    pub(crate) fn send_to_back(&mut self, id: ActorId) {
        self.order.retain(|&other| other != id);
        self.order.insert(0, id);
    }

    /// A tile is enterable when it is open floor with no blocking actor.
    pub fn can_walk(&self, pos: Pos) -> bool {
        if self.map.is_wall(pos) {
            return false;
        }
        !self.actors.values().any(|actor| actor.blocks && actor.pos == pos)
    }

    /// The live destructible standing on `pos`, if any.
    pub fn get_actor(&self, pos: Pos) -> Option<ActorId> {
        self.order.iter().copied().find(|&id| {
            let actor = &self.actors[id];
            actor.pos == pos && actor.destructible.as_ref().is_some_and(|d| !d.is_dead())
        })
    }

    /// Nearest live monster to `origin` within `range` tiles; `0.0` means
    /// unbounded. Ties go to the earliest match in registry order.
    pub fn get_closest_monster(&self, origin: Pos, range: f32) -> Option<ActorId> {
        let mut best: Option<(ActorId, f32)> = None;
        for &id in &self.order {
            let actor = &self.actors[id];
            if id == self.player || actor.ai.is_none() {
                continue;
            }
            if actor.destructible.as_ref().is_none_or(Destructible::is_dead) {
                continue;
            }
            let distance = actor.distance_to(origin);
            if range > 0.0 && distance > range {
                continue;
            }
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((id, distance));
            }
        }
        best.map(|(id, _)| id)
    }

    pub(crate) fn message(&mut self, color: Rgb, text: String) {
        self.log.push(Message { color, text });
    }

    pub fn log(&self) -> &[Message] {
        &self.log
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn player_id(&self) -> ActorId {
        self.player
    }

    pub fn player_position(&self) -> Pos {
        self.actors[self.player].pos
    }

    pub fn player_xp(&self) -> i32 {
        self.player_xp
    }

    /// Current and maximum player hit points.
    pub fn player_hp(&self) -> (i32, i32) {
        self.actors[self.player]
            .destructible
            .as_ref()
            .map(|d| (d.hp, d.max_hp))
            .unwrap_or((0, 0))
    }

    pub fn inventory_names(&self) -> Vec<String> {
        self.actors[self.player]
            .container
            .as_ref()
            .map(|c| c.inventory.iter().map(|item| item.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Whether `pos` is inside the current field of view; lets frontends
    /// build targeting overlays without owning the map.
    pub fn tile_in_fov(&self, pos: Pos) -> bool {
        self.map.is_in_fov(pos)
    }

    /// (width, height) of the current level's map.
    pub fn map_size(&self) -> (i32, i32) {
        (self.map.width(), self.map.height())
    }

    pub fn player_is_on_stairs(&self) -> bool {
        self.actors[self.player].pos == self.actors[self.stairs].pos
    }

    /// Order-sensitive digest of the whole world state. Two engines with the
    /// same fingerprint are observably identical.
    pub fn world_fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(&self.run_seed.to_le_bytes());
        hasher.update(&self.level.to_le_bytes());
        hasher.update(&self.player_xp.to_le_bytes());
        for &id in &self.order {
            let actor = &self.actors[id];
            hasher.update(&actor.pos.y.to_le_bytes());
            hasher.update(&actor.pos.x.to_le_bytes());
            hasher.update(&(actor.glyph as u32).to_le_bytes());
            hasher.update(&(actor.name.len() as u32).to_le_bytes());
            hasher.update(actor.name.as_bytes());
            hasher.update(&[u8::from(actor.blocks), u8::from(actor.fov_only)]);
            if let Some(destructible) = &actor.destructible {
                hasher.update(&destructible.hp.to_le_bytes());
                hasher.update(&destructible.max_hp.to_le_bytes());
            }
            if let Some(container) = &actor.container {
                hasher.update(&(container.inventory.len() as u32).to_le_bytes());
                for item in &container.inventory {
                    hasher.update(&(item.name.len() as u32).to_le_bytes());
                    hasher.update(item.name.as_bytes());
                }
            }
        }
        hasher.digest()
    }
}

#[cfg(test)]
impl Engine {
    pub(crate) fn spawn_test_monster(
        &mut self,
        pos: Pos,
        hp: i32,
        defense: i32,
        power: i32,
        xp: i32,
    ) -> ActorId {
        let mut actor = Actor::new(pos, 'm', Rgb::GREEN, "test beast");
        actor.destructible = Some(Destructible::monster(hp, defense, "dead test beast", xp));
        actor.attacker = Some(Attacker::new(power));
        actor.ai = Some(Ai::Monster);
        self.insert_actor(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::NullFrontend;
    use crate::mapgen::BOSS_LEVEL;
    use crate::types::Dir;

    #[test]
    fn new_game_starts_on_level_one_at_the_entry() {
        let engine = Engine::new_game(5);
        assert_eq!(engine.level(), 1);
        assert_eq!(engine.status(), GameStatus::Startup);
        assert!(!engine.map.is_wall(engine.player_position()));
    }

    #[test]
    fn first_update_computes_fov_around_the_player() {
        let mut engine = Engine::new_game(5);
        let mut frontend = NullFrontend;
        engine.update(None, &mut frontend);
        assert!(engine.map.is_in_fov(engine.player_position()));
        assert_eq!(engine.status(), GameStatus::Idle);
    }

    #[test]
    fn same_seed_builds_the_same_world() {
        let a = Engine::new_game(1234);
        let b = Engine::new_game(1234);
        assert_eq!(a.world_fingerprint(), b.world_fingerprint());
    }

    #[test]
    fn different_seeds_build_different_worlds() {
        let a = Engine::new_game(1234);
        let b = Engine::new_game(1235);
        assert_ne!(a.world_fingerprint(), b.world_fingerprint());
    }

    #[test]
    fn descending_rebuilds_the_roster_without_carryover() {
        let mut engine = Engine::new_game(5);
        let hostile_before: Vec<ActorId> = engine
            .actors
            .iter()
            .filter(|(id, a)| a.ai.is_some() && *id != engine.player)
            .map(|(id, _)| id)
            .collect();

        engine.next_level();
        assert_eq!(engine.level(), 2);
        for id in hostile_before {
            assert!(engine.actors.get(id).is_none(), "old monsters must not survive");
        }
        assert!(engine.actors.get(engine.player).is_some());
        assert!(engine.actors.get(engine.stairs).is_some());
        assert!(engine.actors.get(engine.quest_letter).is_some());
    }

    #[test]
    fn descending_heals_half_of_max_hp() {
        let mut engine = Engine::new_game(5);
        engine.actors[engine.player].destructible.as_mut().unwrap().hp = 1;
        engine.next_level();
        let (hp, max_hp) = engine.player_hp();
        assert_eq!(hp, 1 + max_hp / 2);
    }

    #[test]
    fn the_boss_level_spawns_the_fixed_roster() {
        let mut engine = Engine::new_game(5);
        engine.level = BOSS_LEVEL - 1;
        engine.next_level();
        assert_eq!(engine.level(), BOSS_LEVEL);
        assert!(engine.actors.values().any(|a| a.name == "Parnak"));
        assert_eq!(engine.player_position(), Pos { y: 56, x: 36 });
        // The letter waits two tiles diagonally from the entry.
        assert_eq!(engine.actors[engine.quest_letter].pos, Pos { y: 58, x: 38 });
    }

    #[test]
    fn send_to_back_moves_the_actor_first_in_draw_order() {
        let mut engine = Engine::new_game(5);
        let rat = engine.spawn_test_monster(Pos { y: 2, x: 2 }, 5, 0, 1, 5);
        engine.send_to_back(rat);
        assert_eq!(engine.order.first(), Some(&rat));
    }

    #[test]
    fn can_walk_rejects_walls_and_blocking_actors() {
        let mut engine = Engine::new_game(5);
        assert!(!engine.can_walk(Pos { y: 0, x: 0 }), "the border is wall");
        let open = engine.player_position();
        assert!(!engine.can_walk(open), "the player blocks their own tile");
        let rat_pos = Pos { y: open.y + 1, x: open.x };
        let rat = engine.spawn_test_monster(rat_pos, 5, 0, 1, 5);
        assert!(!engine.can_walk(rat_pos));
        engine.take_damage(rat, 100);
        assert!(engine.can_walk(rat_pos), "corpses stop blocking");
    }

    #[test]
    fn closest_monster_with_zero_range_is_unbounded() {
        let mut engine = Engine::new_game(5);
        let monster_ids: Vec<ActorId> = engine
            .actors
            .iter()
            .filter(|(id, a)| a.ai.is_some() && *id != engine.player)
            .map(|(id, _)| id)
            .collect();
        for id in monster_ids {
            engine.remove_actor(id);
        }
        // The corner opposite the player is always far outside a 5-tile reach.
        let origin = engine.player_position();
        let far_pos = Pos {
            y: if origin.y < 50 { 98 } else { 1 },
            x: if origin.x < 50 { 98 } else { 1 },
        };
        let far = engine.spawn_test_monster(far_pos, 5, 0, 1, 5);

        assert_eq!(engine.get_closest_monster(origin, 0.0), Some(far));
        assert_eq!(engine.get_closest_monster(origin, 5.0), None);
    }

    #[test]
    fn a_resolved_turn_settles_back_to_idle() {
        let mut engine = Engine::new_game(5);
        let mut frontend = NullFrontend;
        engine.update(None, &mut frontend);
        engine.update(Some(Command::Wait), &mut frontend);
        assert_eq!(engine.status(), GameStatus::Idle);
    }

    #[test]
    fn a_lethal_monster_pass_ends_in_defeat_not_idle() {
        let mut engine = Engine::new_game(5);
        let mut frontend = NullFrontend;
        engine.update(None, &mut frontend);
        let pos = engine.player_position();
        engine.spawn_test_monster(Pos { y: pos.y, x: pos.x + 1 }, 50, 0, 10_000, 5);

        engine.update(Some(Command::Wait), &mut frontend);
        assert_eq!(engine.status(), GameStatus::Defeat);
    }

    struct Recorder {
        glyphs: Vec<(Pos, char)>,
    }

    impl RenderSurface for Recorder {
        fn clear(&mut self) {
            self.glyphs.clear();
        }
        fn set_center(&mut self, _center: Pos) {}
        fn draw_glyph(&mut self, pos: Pos, glyph: char, _color: Rgb) {
            self.glyphs.push((pos, glyph));
        }
        fn highlight(&mut self, _pos: Pos, _strong: bool) {}
        fn flush(&mut self) {}
    }

    #[test]
    fn creatures_draw_on_top_of_items_sharing_their_tile() {
        let mut engine = Engine::new_game(5);
        let mut frontend = NullFrontend;
        engine.update(None, &mut frontend);
        let pos = engine.player_position();
        let shared = Pos { y: pos.y, x: pos.x + 1 };
        engine.spawn_test_monster(shared, 10, 0, 3, 35);
        engine.insert_actor(content::build_item(content::ItemKind::HealthPotion, shared));

        let mut recorder = Recorder { glyphs: Vec::new() };
        engine.render(&mut recorder);
        let top = recorder.glyphs.iter().rev().find(|(p, _)| *p == shared).map(|&(_, g)| g);
        assert_eq!(top, Some('m'), "the creature covers the potion underneath it");
    }

    #[test]
    fn killing_everything_then_moving_keeps_the_update_loop_stable() {
        let mut engine = Engine::new_game(5);
        let rat = engine.spawn_test_monster(Pos { y: 2, x: 2 }, 5, 0, 1, 5);
        engine.take_damage(rat, 100);
        let mut frontend = NullFrontend;
        engine.update(Some(Command::Move(Dir::East)), &mut frontend);
        engine.update(Some(Command::Move(Dir::West)), &mut frontend);
        assert_ne!(engine.status(), GameStatus::Defeat);
    }
}
