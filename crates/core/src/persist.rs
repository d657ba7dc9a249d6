//! Binary save files. One file holds one run: a checksummed little-endian
//! record of the world. Wall layouts are not stored; they regrow from the run
//! seed and level on load. A save is consumed by loading it, so there is no
//! way to retry a bad outcome from the same file.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use slotmap::SlotMap;
use xxhash_rust::xxh3::xxh3_64;

use crate::actor::Actor;
use crate::ai::Ai;
use crate::combat::{Attacker, DeathBehavior, Destructible};
use crate::engine::Engine;
use crate::inventory::{Container, Pickable, UseEffect};
use crate::map::{FOV_RADIUS, Map};
use crate::mapgen;
use crate::types::{ActorId, GameStatus, Pos, Rgb};

const MAGIC: &[u8; 4] = b"GLMC";
const FORMAT_VERSION: u32 = 1;

/// Describes why a save file could not be loaded.
#[derive(Debug)]
pub enum SaveError {
    /// No save file exists at the requested path.
    Missing,
    /// Underlying I/O failure.
    Io(io::Error),
    /// The file ended in the middle of a record.
    UnexpectedEof,
    /// A field holds a value the format does not allow.
    InvalidData(String),
    /// The stored checksum does not match the file body.
    ChecksumMismatch,
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no save file found"),
            Self::Io(e) => write!(f, "save file I/O error: {e}"),
            Self::UnexpectedEof => write!(f, "save file ended unexpectedly"),
            Self::InvalidData(message) => write!(f, "invalid save data: {message}"),
            Self::ChecksumMismatch => write!(f, "save file checksum mismatch"),
        }
    }
}

// ---------------------------------------------------------------------------
// Scalar codec
// ---------------------------------------------------------------------------

struct ScalarWriter {
    buf: Vec<u8>,
}

impl ScalarWriter {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    fn write_u32(&mut self, value: u32) {
        self.buf.extend(value.to_le_bytes());
    }

    fn write_i32(&mut self, value: i32) {
        self.buf.extend(value.to_le_bytes());
    }

    fn write_u64(&mut self, value: u64) {
        self.buf.extend(value.to_le_bytes());
    }

    fn write_f32(&mut self, value: f32) {
        self.buf.extend(value.to_le_bytes());
    }

    fn write_str(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.buf.extend(value.as_bytes());
    }
}

struct ScalarReader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> ScalarReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SaveError> {
        let end = self.cursor.checked_add(len).ok_or(SaveError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(SaveError::UnexpectedEof);
        }
        let slice = &self.data[self.cursor..end];
        self.cursor = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, SaveError> {
        Ok(self.take(1)?[0])
    }

    fn read_bool(&mut self) -> Result<bool, SaveError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SaveError::InvalidData(format!("bool byte {other}"))),
        }
    }

    fn read_u32(&mut self) -> Result<u32, SaveError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&mut self) -> Result<i32, SaveError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, SaveError> {
        let bytes = self.take(8)?;
        let mut array = [0_u8; 8];
        array.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(array))
    }

    fn read_f32(&mut self) -> Result<f32, SaveError> {
        let bytes = self.take(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_string(&mut self) -> Result<String, SaveError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| SaveError::InvalidData("non-utf8 string".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Record encoding
// ---------------------------------------------------------------------------

fn write_ai(writer: &mut ScalarWriter, ai: &Ai) {
    match ai {
        Ai::Player => writer.write_u8(0),
        Ai::Monster => writer.write_u8(1),
        Ai::Confused { turns, previous } => {
            writer.write_u8(2);
            writer.write_i32(*turns);
            write_ai(writer, previous);
        }
    }
}

fn read_ai(reader: &mut ScalarReader<'_>) -> Result<Ai, SaveError> {
    match reader.read_u8()? {
        0 => Ok(Ai::Player),
        1 => Ok(Ai::Monster),
        2 => {
            let turns = reader.read_i32()?;
            let previous = Box::new(read_ai(reader)?);
            Ok(Ai::Confused { turns, previous })
        }
        other => Err(SaveError::InvalidData(format!("ai tag {other}"))),
    }
}

fn write_effect(writer: &mut ScalarWriter, effect: UseEffect) {
    match effect {
        UseEffect::Heal { amount } => {
            writer.write_u8(0);
            writer.write_i32(amount);
        }
        UseEffect::LightningBolt { range, damage } => {
            writer.write_u8(1);
            writer.write_f32(range);
            writer.write_i32(damage);
        }
        UseEffect::Fireball { range, radius, damage } => {
            writer.write_u8(2);
            writer.write_f32(range);
            writer.write_f32(radius);
            writer.write_i32(damage);
        }
        UseEffect::Confuse { turns, range } => {
            writer.write_u8(3);
            writer.write_i32(turns);
            writer.write_f32(range);
        }
    }
}

fn read_effect(reader: &mut ScalarReader<'_>) -> Result<UseEffect, SaveError> {
    match reader.read_u8()? {
        0 => Ok(UseEffect::Heal { amount: reader.read_i32()? }),
        1 => {
            let range = reader.read_f32()?;
            let damage = reader.read_i32()?;
            Ok(UseEffect::LightningBolt { range, damage })
        }
        2 => {
            let range = reader.read_f32()?;
            let radius = reader.read_f32()?;
            let damage = reader.read_i32()?;
            Ok(UseEffect::Fireball { range, radius, damage })
        }
        3 => {
            let turns = reader.read_i32()?;
            let range = reader.read_f32()?;
            Ok(UseEffect::Confuse { turns, range })
        }
        other => Err(SaveError::InvalidData(format!("effect tag {other}"))),
    }
}

fn write_actor(writer: &mut ScalarWriter, actor: &Actor) {
    writer.write_i32(actor.pos.x);
    writer.write_i32(actor.pos.y);
    writer.write_u32(actor.glyph as u32);
    writer.write_u8(actor.color.r);
    writer.write_u8(actor.color.g);
    writer.write_u8(actor.color.b);
    writer.write_str(&actor.name);
    writer.write_bool(actor.blocks);
    writer.write_bool(actor.fov_only);

    writer.write_bool(actor.destructible.is_some());
    if let Some(destructible) = &actor.destructible {
        writer.write_i32(destructible.hp);
        writer.write_i32(destructible.max_hp);
        writer.write_i32(destructible.defense);
        writer.write_str(&destructible.corpse_name);
        match destructible.behavior {
            DeathBehavior::Player => writer.write_u8(0),
            DeathBehavior::Monster { xp } => {
                writer.write_u8(1);
                writer.write_i32(xp);
            }
        }
    }

    writer.write_bool(actor.attacker.is_some());
    if let Some(attacker) = &actor.attacker {
        writer.write_i32(attacker.power);
    }

    writer.write_bool(actor.ai.is_some());
    if let Some(ai) = &actor.ai {
        write_ai(writer, ai);
    }

    writer.write_bool(actor.container.is_some());
    if let Some(container) = &actor.container {
        writer.write_u32(container.capacity as u32);
        writer.write_u32(container.inventory.len() as u32);
        for item in &container.inventory {
            write_actor(writer, item);
        }
    }

    writer.write_bool(actor.pickable.is_some());
    if let Some(pickable) = &actor.pickable {
        write_effect(writer, pickable.effect);
    }
}

fn read_actor(reader: &mut ScalarReader<'_>) -> Result<Actor, SaveError> {
    let x = reader.read_i32()?;
    let y = reader.read_i32()?;
    let glyph = char::from_u32(reader.read_u32()?)
        .ok_or_else(|| SaveError::InvalidData("glyph out of range".to_string()))?;
    let color = Rgb { r: reader.read_u8()?, g: reader.read_u8()?, b: reader.read_u8()? };
    let name = reader.read_string()?;

    let mut actor = Actor::new(Pos { y, x }, glyph, color, name);
    actor.blocks = reader.read_bool()?;
    actor.fov_only = reader.read_bool()?;

    if reader.read_bool()? {
        let hp = reader.read_i32()?;
        let max_hp = reader.read_i32()?;
        let defense = reader.read_i32()?;
        let corpse_name = reader.read_string()?;
        let behavior = match reader.read_u8()? {
            0 => DeathBehavior::Player,
            1 => DeathBehavior::Monster { xp: reader.read_i32()? },
            other => return Err(SaveError::InvalidData(format!("death tag {other}"))),
        };
        actor.destructible = Some(Destructible { hp, max_hp, defense, corpse_name, behavior });
    }

    if reader.read_bool()? {
        actor.attacker = Some(Attacker::new(reader.read_i32()?));
    }

    if reader.read_bool()? {
        actor.ai = Some(read_ai(reader)?);
    }

    if reader.read_bool()? {
        let capacity = reader.read_u32()? as usize;
        let count = reader.read_u32()? as usize;
        let mut container = Container::new(capacity);
        for _ in 0..count {
            container.inventory.push(read_actor(reader)?);
        }
        actor.container = Some(container);
    }

    if reader.read_bool()? {
        actor.pickable = Some(Pickable { effect: read_effect(reader)? });
    }

    Ok(actor)
}

// ---------------------------------------------------------------------------
// World encoding
// ---------------------------------------------------------------------------

pub fn serialize_world(engine: &Engine) -> Vec<u8> {
    let mut writer = ScalarWriter::new();
    writer.write_u64(engine.run_seed);
    writer.write_i32(engine.level);
    writer.write_i32(engine.player_xp);

    writer.write_u32(engine.order.len() as u32);
    for &id in &engine.order {
        write_actor(&mut writer, &engine.actors[id]);
    }
    let index_of = |target: ActorId| {
        engine.order.iter().position(|&id| id == target).unwrap_or_default() as u32
    };
    writer.write_u32(index_of(engine.player));
    writer.write_u32(index_of(engine.stairs));
    writer.write_u32(index_of(engine.quest_letter));

    writer.write_i32(engine.map.width());
    writer.write_i32(engine.map.height());
    writer.write_u64(engine.map.seed());
    for explored in engine.map.explored_mask() {
        writer.write_bool(explored);
    }

    let body = writer.buf;
    let mut file = Vec::with_capacity(body.len() + 16);
    file.extend(MAGIC);
    file.extend(FORMAT_VERSION.to_le_bytes());
    file.extend(xxh3_64(&body).to_le_bytes());
    file.extend(body);
    file
}

pub fn deserialize_world(data: &[u8]) -> Result<Engine, SaveError> {
    if data.len() < 16 {
        return Err(SaveError::UnexpectedEof);
    }
    if &data[0..4] != MAGIC {
        return Err(SaveError::InvalidData("bad magic".to_string()));
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(SaveError::InvalidData(format!("unsupported version {version}")));
    }
    let mut checksum_bytes = [0_u8; 8];
    checksum_bytes.copy_from_slice(&data[8..16]);
    let stored_checksum = u64::from_le_bytes(checksum_bytes);
    let body = &data[16..];
    if xxh3_64(body) != stored_checksum {
        return Err(SaveError::ChecksumMismatch);
    }

    let mut reader = ScalarReader::new(body);
    let run_seed = reader.read_u64()?;
    let level = reader.read_i32()?;
    let player_xp = reader.read_i32()?;

    let actor_count = reader.read_u32()? as usize;
    let mut actors: SlotMap<ActorId, Actor> = SlotMap::with_key();
    let mut order = Vec::with_capacity(actor_count);
    for _ in 0..actor_count {
        let actor = read_actor(&mut reader)?;
        order.push(actors.insert(actor));
    }

    let mut handle = |label: &str| -> Result<ActorId, SaveError> {
        let index = reader.read_u32()? as usize;
        order
            .get(index)
            .copied()
            .ok_or_else(|| SaveError::InvalidData(format!("{label} index {index} out of range")))
    };
    let player = handle("player")?;
    let stairs = handle("stairs")?;
    let quest_letter = handle("quest letter")?;

    let width = reader.read_i32()?;
    let height = reader.read_i32()?;
    let map_seed = reader.read_u64()?;
    if width <= 0 || height <= 0 {
        return Err(SaveError::InvalidData("non-positive map size".to_string()));
    }

    // Walls are regrown, not stored. The regrown dimensions also bound the
    // stored size before the explored mask is allocated, so a corrupt header
    // cannot demand an arbitrarily large read.
    let generated = mapgen::generate_level(run_seed, level);
    if generated.width != width || generated.height != height {
        return Err(SaveError::InvalidData("map size does not match its seed".to_string()));
    }
    let cells = (width as usize) * (height as usize);
    let mut explored = Vec::with_capacity(cells);
    for _ in 0..cells {
        explored.push(reader.read_bool()?);
    }
    let mut map = Map::from_walls(width, height, map_seed, &generated.walls);
    map.restore_explored(&explored);

    Ok(Engine {
        actors,
        order,
        map,
        level,
        status: GameStatus::Startup,
        player,
        stairs,
        quest_letter,
        log: Vec::new(),
        player_xp,
        rng: ChaCha8Rng::seed_from_u64(run_seed),
        run_seed,
        fov_radius: FOV_RADIUS,
    })
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Writes the save atomically: the bytes land in a sibling temp file first
/// and only a successful rename replaces the real one.
pub fn save_to_path(engine: &Engine, path: &Path) -> Result<(), SaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(SaveError::Io)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, serialize_world(engine)).map_err(SaveError::Io)?;
    fs::rename(&tmp_path, path).map_err(SaveError::Io)?;
    Ok(())
}

/// Loads and consumes the save: on success the file is deleted, so a run can
/// only be resumed once.
pub fn load_from_path(path: &Path) -> Result<Engine, SaveError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(SaveError::Missing),
        Err(e) => return Err(SaveError::Io(e)),
    };
    let engine = deserialize_world(&data)?;
    fs::remove_file(path).map_err(SaveError::Io)?;
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{self, ItemKind};
    use crate::frontend::NullFrontend;
    use crate::types::{Command, Dir};

    fn worked_engine() -> Engine {
        let mut engine = Engine::new_game(777);
        let mut frontend = NullFrontend;
        engine.update(None, &mut frontend);
        engine.update(Some(Command::Move(Dir::East)), &mut frontend);

        // A hurt monster, a carried potion, and a corpse make the state
        // non-trivial.
        let pos = engine.player_position();
        let rat = engine.spawn_test_monster(Pos { y: pos.y + 3, x: pos.x }, 10, 0, 2, 15);
        engine.take_damage(rat, 4);
        let dead = engine.spawn_test_monster(Pos { y: pos.y + 4, x: pos.x }, 5, 0, 2, 15);
        engine.take_damage(dead, 100);
        let potion = content::build_item(ItemKind::HealthPotion, pos);
        engine.insert_actor(potion);
        engine.pick_up_item();
        engine
    }

    #[test]
    fn round_trip_preserves_the_world_fingerprint() {
        let engine = worked_engine();
        let bytes = serialize_world(&engine);
        let restored = deserialize_world(&bytes).expect("round trip");
        assert_eq!(engine.world_fingerprint(), restored.world_fingerprint());
        assert_eq!(restored.status(), GameStatus::Startup);
        assert_eq!(restored.inventory_names(), engine.inventory_names());
    }

    #[test]
    fn explored_tiles_survive_the_round_trip() {
        let engine = worked_engine();
        let restored = deserialize_world(&serialize_world(&engine)).expect("round trip");
        assert_eq!(restored.map.explored_mask(), engine.map.explored_mask());
    }

    #[test]
    fn loading_consumes_the_save_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.sav");
        let engine = worked_engine();
        save_to_path(&engine, &path).expect("save");

        let restored = load_from_path(&path).expect("load");
        assert_eq!(restored.world_fingerprint(), engine.world_fingerprint());
        assert!(matches!(load_from_path(&path), Err(SaveError::Missing)));
    }

    #[test]
    fn missing_file_reports_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(load_from_path(&dir.path().join("none.sav")), Err(SaveError::Missing)));
    }

    #[test]
    fn a_flipped_byte_fails_the_checksum() {
        let engine = worked_engine();
        let mut bytes = serialize_world(&engine);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(deserialize_world(&bytes), Err(SaveError::ChecksumMismatch)));
    }

    #[test]
    fn a_truncated_file_never_panics() {
        let engine = worked_engine();
        let bytes = serialize_world(&engine);
        for len in [0, 3, 15, 20, bytes.len() / 2] {
            assert!(deserialize_world(&bytes[..len]).is_err());
        }
    }

    #[test]
    fn an_absurd_map_size_is_rejected_before_the_mask_is_read() {
        let engine = Engine::new_game(777);
        let mut bytes = serialize_world(&engine);
        // The map record sits at the tail of the body: width, height, seed,
        // then one byte per tile.
        let mask_len = (engine.map.width() * engine.map.height()) as usize;
        let width_offset = bytes.len() - mask_len - 8 - 4 - 4;
        bytes[width_offset..width_offset + 4].copy_from_slice(&50_000_i32.to_le_bytes());
        let checksum = xxh3_64(&bytes[16..]);
        bytes[8..16].copy_from_slice(&checksum.to_le_bytes());

        assert!(matches!(deserialize_world(&bytes), Err(SaveError::InvalidData(_))));
    }

    #[test]
    fn a_foreign_file_is_rejected_by_magic() {
        let bytes = b"definitely not a save file, but long enough to parse".to_vec();
        assert!(matches!(deserialize_world(&bytes), Err(SaveError::InvalidData(_))));
    }

    #[test]
    fn confused_ai_round_trips_through_the_nested_encoding() {
        let mut engine = Engine::new_game(777);
        let pos = engine.player_position();
        let rat = engine.spawn_test_monster(Pos { y: pos.y + 2, x: pos.x }, 10, 0, 2, 15);
        engine.actors[rat].ai =
            Some(Ai::Confused { turns: 4, previous: Box::new(Ai::Monster) });

        let restored = deserialize_world(&serialize_world(&engine)).expect("round trip");
        let restored_rat = restored
            .actors
            .values()
            .find(|a| a.name == "test beast")
            .expect("the monster survives");
        assert!(matches!(
            restored_rat.ai,
            Some(Ai::Confused { turns: 4, ref previous }) if matches!(**previous, Ai::Monster)
        ));
    }
}
