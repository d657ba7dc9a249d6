use slotmap::new_key_type;

new_key_type! {
    pub struct ActorId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub fn distance_to(self, other: Pos) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn manhattan(self, other: Pos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn neighbors(self) -> [Pos; 4] {
        [
            Pos { y: self.y - 1, x: self.x },
            Pos { y: self.y, x: self.x + 1 },
            Pos { y: self.y + 1, x: self.x },
            Pos { y: self.y, x: self.x - 1 },
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };
    pub const LIGHT_GREY: Rgb = Rgb { r: 159, g: 159, b: 159 };
    pub const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    pub const DARK_RED: Rgb = Rgb { r: 127, g: 0, b: 0 };
    pub const ORANGE: Rgb = Rgb { r: 255, g: 127, b: 0 };
    pub const YELLOW: Rgb = Rgb { r: 255, g: 255, b: 0 };
    pub const LIGHT_YELLOW: Rgb = Rgb { r: 255, g: 255, b: 63 };
    pub const DARKER_YELLOW: Rgb = Rgb { r: 127, g: 127, b: 0 };
    pub const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };
    pub const LIGHT_GREEN: Rgb = Rgb { r: 63, g: 255, b: 63 };
    pub const DESATURATED_GREEN: Rgb = Rgb { r: 63, g: 127, b: 63 };
    pub const DARKER_GREEN: Rgb = Rgb { r: 0, g: 127, b: 0 };
    pub const LIGHT_BLUE: Rgb = Rgb { r: 63, g: 63, b: 255 };
    pub const VIOLET: Rgb = Rgb { r: 127, g: 0, b: 255 };
    pub const GREY: Rgb = Rgb { r: 127, g: 127, b: 127 };
}

/// Turn/level state machine phase. `NewTurn` means the player just resolved
/// an action and every other live actor owes one update before `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Startup,
    Idle,
    NewTurn,
    Defeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir {
    North,
    South,
    East,
    West,
}

impl Dir {
    /// (dy, dx) in grid space, y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::North => (-1, 0),
            Dir::South => (1, 0),
            Dir::East => (0, 1),
            Dir::West => (0, -1),
        }
    }
}

/// One captured player input, interpreted by the player AI during `update`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Move(Dir),
    Wait,
    PickUp,
    UseItem(usize),
    UseItemAt { slot: usize, target: Pos },
    DropItem(usize),
    Descend,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub color: Rgb,
    pub text: String,
}
