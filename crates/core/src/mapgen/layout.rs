//! Wall carving for procedural levels: recursive binary partition with one
//! room per leaf and an L-corridor joining the two halves of every split, so
//! the walkable area is connected by construction.

use crate::types::Pos;

use super::seed::{mix_seed_stream, random_i32};

/// A region stops splitting once either half would fall below this side.
const MIN_REGION_SIDE: i32 = 10;
const MIN_ROOM_SIDE: i32 = 4;
const MAX_ROOM_SIDE: i32 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct RoomRect {
    pub(super) x: i32,
    pub(super) y: i32,
    pub(super) width: i32,
    pub(super) height: i32,
}

impl RoomRect {
    pub(super) fn center(self) -> Pos {
        Pos { y: self.y + self.height / 2, x: self.x + self.width / 2 }
    }

    /// A deterministic pseudo-random tile inside the room.
    pub(super) fn random_tile(self, seed: u64, stream: u64) -> Pos {
        Pos {
            y: random_i32(seed, stream.wrapping_mul(2), self.y, self.y + self.height - 1),
            x: random_i32(seed, stream.wrapping_mul(2) + 1, self.x, self.x + self.width - 1),
        }
    }
}

#[derive(Clone, Debug)]
pub(super) struct LevelLayout {
    pub(super) walls: Vec<bool>,
    pub(super) rooms: Vec<RoomRect>,
    pub(super) entry: Pos,
    pub(super) stairs: Pos,
}

pub(super) struct LevelGrid {
    width: i32,
    height: i32,
    walls: Vec<bool>,
}

impl LevelGrid {
    pub(super) fn new(width: i32, height: i32) -> Self {
        Self { width, height, walls: vec![true; (width * height) as usize] }
    }

    /// Clears the inclusive rectangle between the two corners, in either
    /// corner order. Clamped one tile inside the border so the outer wall
    /// ring always survives.
    pub(super) fn dig(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (y1, y2) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        for y in y1.max(1)..=y2.min(self.height - 2) {
            for x in x1.max(1)..=x2.min(self.width - 2) {
                self.walls[(y * self.width + x) as usize] = false;
            }
        }
    }

    pub(super) fn fill(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        for y in y1.max(0)..=y2.min(self.height - 1) {
            for x in x1.max(0)..=x2.min(self.width - 1) {
                self.walls[(y * self.width + x) as usize] = true;
            }
        }
    }

    pub(super) fn into_walls(self) -> Vec<bool> {
        self.walls
    }
}

#[derive(Clone, Copy)]
struct Region {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

pub(super) fn build_level_layout(level_seed: u64, width: i32, height: i32) -> LevelLayout {
    let mut grid = LevelGrid::new(width, height);
    let mut rooms = Vec::new();
    let mut stream = 0_u64;
    let full = Region { x: 1, y: 1, width: width - 2, height: height - 2 };
    subdivide(&mut grid, level_seed, &mut stream, full, &mut rooms);

    let entry = rooms.first().map(|room| room.center()).unwrap_or(Pos { y: 1, x: 1 });
    let mut stairs = entry;
    let mut best_distance = 0;
    for room in &rooms {
        let center = room.center();
        let distance = entry.manhattan(center);
        if distance > best_distance
            || (distance == best_distance && (center.y, center.x) > (stairs.y, stairs.x))
        {
            stairs = center;
            best_distance = distance;
        }
    }

    LevelLayout { walls: grid.into_walls(), rooms, entry, stairs }
}

fn next(stream: &mut u64) -> u64 {
    *stream += 1;
    *stream
}

/// Carves the region and returns a representative room center inside it,
/// already connected to every other room of the region.
fn subdivide(
    grid: &mut LevelGrid,
    seed: u64,
    stream: &mut u64,
    region: Region,
    rooms: &mut Vec<RoomRect>,
) -> Pos {
    let can_split_wide = region.width >= 2 * MIN_REGION_SIDE;
    let can_split_tall = region.height >= 2 * MIN_REGION_SIDE;
    if !can_split_wide && !can_split_tall {
        return carve_room(grid, seed, stream, region, rooms);
    }

    let split_vertical = if can_split_wide && can_split_tall {
        if region.width != region.height {
            region.width > region.height
        } else {
            mix_seed_stream(seed, next(stream)) & 1 == 0
        }
    } else {
        can_split_wide
    };

    let (first, second) = if split_vertical {
        let cut = random_i32(seed, next(stream), MIN_REGION_SIDE, region.width - MIN_REGION_SIDE);
        (
            Region { width: cut, ..region },
            Region { x: region.x + cut, width: region.width - cut, ..region },
        )
    } else {
        let cut = random_i32(seed, next(stream), MIN_REGION_SIDE, region.height - MIN_REGION_SIDE);
        (
            Region { height: cut, ..region },
            Region { y: region.y + cut, height: region.height - cut, ..region },
        )
    };

    let a = subdivide(grid, seed, stream, first, rooms);
    let b = subdivide(grid, seed, stream, second, rooms);
    connect(grid, seed, stream, a, b);
    a
}

fn carve_room(
    grid: &mut LevelGrid,
    seed: u64,
    stream: &mut u64,
    region: Region,
    rooms: &mut Vec<RoomRect>,
) -> Pos {
    let room_width =
        random_i32(seed, next(stream), MIN_ROOM_SIDE, (region.width - 2).min(MAX_ROOM_SIDE));
    let room_height =
        random_i32(seed, next(stream), MIN_ROOM_SIDE, (region.height - 2).min(MAX_ROOM_SIDE));
    let x = random_i32(seed, next(stream), region.x + 1, region.x + region.width - 1 - room_width);
    let y =
        random_i32(seed, next(stream), region.y + 1, region.y + region.height - 1 - room_height);

    let room = RoomRect { x, y, width: room_width, height: room_height };
    grid.dig(x, y, x + room_width - 1, y + room_height - 1);
    rooms.push(room);
    room.center()
}

/// L-corridor between two already-open tiles; the elbow direction is a coin
/// flip.
fn connect(grid: &mut LevelGrid, seed: u64, stream: &mut u64, a: Pos, b: Pos) {
    if mix_seed_stream(seed, next(stream)) & 1 == 0 {
        grid.dig(a.x, a.y, b.x, a.y);
        grid.dig(b.x, a.y, b.x, b.y);
    } else {
        grid.dig(a.x, a.y, a.x, b.y);
        grid.dig(a.x, b.y, b.x, b.y);
    }
}
