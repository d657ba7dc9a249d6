//! The tile grid for one dungeon level: wall layout, exploration memory, and
//! the current field of view. Layout itself is produced by `mapgen`; this
//! module only stores and queries it.

use crate::fov::FovMap;
use crate::types::Pos;

/// Sight radius used for every field-of-view recompute.
pub const FOV_RADIUS: i32 = 10;

#[derive(Clone, Copy, Debug, Default)]
pub struct Tile {
    /// Latches on the first time the tile enters the field of view and never
    /// clears for the lifetime of the level.
    pub explored: bool,
}

pub struct Map {
    width: i32,
    height: i32,
    /// Seed the wall layout was generated from; saved games regrow the walls
    /// from this instead of storing them.
    seed: u64,
    tiles: Vec<Tile>,
    fov: FovMap,
}

impl Map {
    /// Builds a map from a row-major wall mask (`true` = wall).
    pub fn from_walls(width: i32, height: i32, seed: u64, walls: &[bool]) -> Self {
        let mut fov = FovMap::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let open = !walls[(y * width + x) as usize];
                fov.set_properties(Pos { y, x }, open, open);
            }
        }
        Self { width, height, seed, tiles: vec![Tile::default(); walls.len()], fov }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        self.fov.in_bounds(pos)
    }

    /// Out-of-bounds counts as wall.
    pub fn is_wall(&self, pos: Pos) -> bool {
        !self.fov.is_walkable(pos)
    }

    pub fn is_in_fov(&self, pos: Pos) -> bool {
        self.fov.is_visible(pos)
    }

    pub fn is_explored(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.tiles[(pos.y * self.width + pos.x) as usize].explored
    }

    /// Recomputes visibility from `origin` and latches every visible tile
    /// into the explored set.
    pub fn compute_fov(&mut self, origin: Pos, radius: i32) {
        self.fov.compute(origin, radius);
        for idx in self.fov.visible_indices().collect::<Vec<_>>() {
            self.tiles[idx].explored = true;
        }
    }

    pub(crate) fn explored_mask(&self) -> Vec<bool> {
        self.tiles.iter().map(|t| t.explored).collect()
    }

    pub(crate) fn restore_explored(&mut self, mask: &[bool]) {
        for (tile, &explored) in self.tiles.iter_mut().zip(mask) {
            tile.explored = explored;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed_room(width: i32, height: i32) -> Map {
        let mut walls = vec![true; (width * height) as usize];
        for y in 1..(height - 1) {
            for x in 1..(width - 1) {
                walls[(y * width + x) as usize] = false;
            }
        }
        Map::from_walls(width, height, 99, &walls)
    }

    #[test]
    fn out_of_bounds_is_wall() {
        let map = boxed_room(10, 10);
        assert!(map.is_wall(Pos { y: -1, x: 0 }));
        assert!(map.is_wall(Pos { y: 0, x: 10 }));
        assert!(!map.is_wall(Pos { y: 5, x: 5 }));
    }

    #[test]
    fn exploration_latches_and_survives_leaving_fov() {
        let mut map = boxed_room(30, 30);
        let here = Pos { y: 5, x: 5 };
        map.compute_fov(here, FOV_RADIUS);
        assert!(map.is_explored(here));

        // Recompute from the far corner; the old spot drops out of view but
        // stays explored.
        map.compute_fov(Pos { y: 25, x: 25 }, FOV_RADIUS);
        assert!(!map.is_in_fov(here));
        assert!(map.is_explored(here));
    }

    #[test]
    fn explored_mask_round_trips() {
        let mut map = boxed_room(20, 20);
        map.compute_fov(Pos { y: 5, x: 5 }, FOV_RADIUS);
        let mask = map.explored_mask();
        assert!(mask.iter().any(|&e| e));

        let mut fresh = boxed_room(20, 20);
        fresh.restore_explored(&mask);
        assert_eq!(fresh.explored_mask(), mask);
    }
}
