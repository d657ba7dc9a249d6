//! Walkability/visibility oracle: per-tile movement and sight flags plus a
//! recursive-shadowcasting recompute. It knows nothing about actors,
//! exploration memory, or rendering.

use crate::types::Pos;

pub struct FovMap {
    width: i32,
    height: i32,
    walkable: Vec<bool>,
    transparent: Vec<bool>,
    visible: Vec<bool>,
}

impl FovMap {
    /// Every tile starts fully blocking; generation opens tiles up.
    pub fn new(width: i32, height: i32) -> Self {
        let cells = (width as usize) * (height as usize);
        Self {
            width,
            height,
            walkable: vec![false; cells],
            transparent: vec![false; cells],
            visible: vec![false; cells],
        }
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Pos) -> usize {
        (pos.y as usize) * (self.width as usize) + (pos.x as usize)
    }

    pub fn set_properties(&mut self, pos: Pos, transparent: bool, walkable: bool) {
        if !self.in_bounds(pos) {
            return;
        }
        let idx = self.index(pos);
        self.transparent[idx] = transparent;
        self.walkable[idx] = walkable;
    }

    pub fn is_walkable(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.walkable[self.index(pos)]
    }

    pub fn is_transparent(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.transparent[self.index(pos)]
    }

    pub fn is_visible(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.visible[self.index(pos)]
    }

    fn set_visible(&mut self, pos: Pos, value: bool) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.visible[idx] = value;
        }
    }

    /// Indices of every currently visible tile, row-major.
    pub(crate) fn visible_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.visible.iter().enumerate().filter(|(_, v)| **v).map(|(i, _)| i)
    }

    /// Recomputes the visible set from `origin` out to `range`. The previous
    /// visible set is discarded entirely.
    pub fn compute(&mut self, origin: Pos, range: i32) {
        self.visible.fill(false);
        self.set_visible(origin, true);
        for octant in 0..8 {
            self.scan_octant(origin, range, 1, Slope::new(1, 1), Slope::new(0, 1), octant);
        }
        self.prune_indirect_cells(origin, range);
    }

    fn scan_octant(
        &mut self,
        origin: Pos,
        range: i32,
        dist: i32,
        start: Slope,
        end: Slope,
        octant: u8,
    ) {
        if dist > range {
            return;
        }
        let range_u = range.unsigned_abs();
        let mut blocked = false;
        let mut cur_start = start;
        for y in (0..=dist).rev() {
            let top = Slope::new(2 * y + 1, 2 * dist - 1);
            let bot = Slope::new(2 * y - 1, 2 * dist + 1);
            if cur_start.greater_or_equal(&bot) && top.greater_than(&end) {
                let p = transform_octant(origin, dist, y, octant);
                if origin.manhattan(p) <= range_u {
                    self.set_visible(p, true);
                }
                let opaque = !self.is_transparent(p);
                if opaque {
                    if !blocked {
                        self.scan_octant(origin, range, dist + 1, cur_start, top, octant);
                        blocked = true;
                    }
                    cur_start = bot;
                } else if blocked {
                    blocked = false;
                }
            }
        }
        if !blocked {
            self.scan_octant(origin, range, dist + 1, cur_start, end, octant);
        }
    }

    /// The octant scan can leave "corner handles" visible around wall edges.
    /// Drop any cell that lacks a direct line of sight back to the origin.
    fn prune_indirect_cells(&mut self, origin: Pos, range: i32) {
        let min_y = (origin.y - range).max(0);
        let max_y = (origin.y + range + 1).min(self.height);
        let min_x = (origin.x - range).max(0);
        let max_x = (origin.x + range + 1).min(self.width);

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = Pos { y, x };
                if p == origin || !self.is_visible(p) {
                    continue;
                }
                if !self.has_direct_line_of_sight(origin, p) {
                    self.set_visible(p, false);
                }
            }
        }
    }

    fn has_direct_line_of_sight(&self, origin: Pos, target: Pos) -> bool {
        let dx = target.x - origin.x;
        let dy = target.y - origin.y;
        let sx = dx.signum();
        let sy = dy.signum();
        let total_dist_x = dx.abs();
        let total_dist_y = dy.abs();

        let mut x = origin.x;
        let mut y = origin.y;
        let mut current_step_x = 0;
        let mut current_step_y = 0;

        while current_step_x < total_dist_x || current_step_y < total_dist_y {
            let lhs = (1 + 2 * current_step_x) * total_dist_y;
            let rhs = (1 + 2 * current_step_y) * total_dist_x;

            if lhs == rhs {
                x += sx;
                y += sy;
                current_step_x += 1;
                current_step_y += 1;
            } else if lhs < rhs {
                x += sx;
                current_step_x += 1;
            } else {
                y += sy;
                current_step_y += 1;
            }

            if x == target.x && y == target.y {
                break;
            }
            if !self.is_transparent(Pos { y, x }) {
                return false;
            }
        }
        true
    }
}

fn transform_octant(origin: Pos, x: i32, y: i32, octant: u8) -> Pos {
    match octant {
        0 => Pos { y: origin.y - y, x: origin.x + x },
        1 => Pos { y: origin.y - x, x: origin.x + y },
        2 => Pos { y: origin.y - x, x: origin.x - y },
        3 => Pos { y: origin.y - y, x: origin.x - x },
        4 => Pos { y: origin.y + y, x: origin.x - x },
        5 => Pos { y: origin.y + x, x: origin.x - y },
        6 => Pos { y: origin.y + x, x: origin.x + y },
        7 => Pos { y: origin.y + y, x: origin.x + x },
        _ => origin,
    }
}

#[derive(Clone, Copy)]
struct Slope {
    y: i32,
    x: i32,
}

impl Slope {
    fn new(y: i32, x: i32) -> Self {
        Self { y, x }
    }

    fn greater_or_equal(&self, other: &Slope) -> bool {
        self.y * other.x >= other.y * self.x
    }

    fn greater_than(&self, other: &Slope) -> bool {
        self.y * other.x > other.y * self.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_room(width: i32, height: i32) -> FovMap {
        let mut fov = FovMap::new(width, height);
        for y in 1..(height - 1) {
            for x in 1..(width - 1) {
                fov.set_properties(Pos { y, x }, true, true);
            }
        }
        fov
    }

    #[test]
    fn open_room_visibility_respects_range() {
        let mut fov = open_room(20, 20);
        let origin = Pos { y: 10, x: 10 };
        fov.compute(origin, 3);
        assert!(fov.is_visible(origin));
        assert!(fov.is_visible(Pos { y: 10, x: 13 }));
        assert!(!fov.is_visible(Pos { y: 1, x: 1 }));
    }

    #[test]
    fn recompute_is_deterministic_for_same_state() {
        let mut fov = open_room(20, 20);
        fov.set_properties(Pos { y: 10, x: 12 }, false, false);
        fov.set_properties(Pos { y: 11, x: 12 }, false, false);
        let origin = Pos { y: 10, x: 10 };

        fov.compute(origin, 8);
        let first: Vec<usize> = fov.visible_indices().collect();
        fov.compute(origin, 8);
        let second: Vec<usize> = fov.visible_indices().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn wall_occludes_tiles_directly_behind_it() {
        let mut fov = open_room(20, 20);
        fov.set_properties(Pos { y: 10, x: 12 }, false, false);
        fov.compute(Pos { y: 10, x: 10 }, 8);

        assert!(fov.is_visible(Pos { y: 10, x: 12 }), "the wall face itself is visible");
        assert!(!fov.is_visible(Pos { y: 10, x: 13 }), "the tile behind the wall is occluded");
    }

    #[test]
    fn closed_room_does_not_leak_light_through_corners() {
        let mut fov = FovMap::new(20, 20);
        for y in 5..=9 {
            for x in 5..=9 {
                let interior = y > 5 && y < 9 && x > 5 && x < 9;
                fov.set_properties(Pos { y, x }, interior, interior);
            }
        }

        fov.compute(Pos { y: 7, x: 7 }, 15);
        for y in 0..20 {
            for x in 0..20 {
                let p = Pos { y, x };
                let outside = y < 5 || y > 9 || x < 5 || x > 9;
                if outside {
                    assert!(!fov.is_visible(p), "light leaked to {p:?}");
                }
            }
        }
    }
}
