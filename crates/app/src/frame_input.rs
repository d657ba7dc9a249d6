//! Keyboard and mouse capture for one rendered frame. The result is a plain
//! struct so the app state machine can be driven without a window in tests.

use game_core::types::{Dir, Pos};
use macroquad::prelude::{
    KeyCode, MouseButton, get_char_pressed, is_key_pressed, is_mouse_button_pressed,
    mouse_position,
};

use crate::ui_render::GlyphSurface;

#[derive(Default)]
pub struct FrameInput {
    pub direction: Option<Dir>,
    pub wait: bool,
    pub pick_up: bool,
    pub descend: bool,
    pub open_inventory: bool,
    pub open_drop: bool,
    /// Inventory slot chosen with a letter key, `a` = 0.
    pub slot: Option<usize>,
    pub cursor_tile: Option<Pos>,
    pub confirm: bool,
    pub cancel: bool,
    pub escape: bool,
}

pub fn capture_frame_input(surface: &GlyphSurface) -> FrameInput {
    let mut input = FrameInput::default();

    input.direction = if is_key_pressed(KeyCode::Up) || is_key_pressed(KeyCode::K) {
        Some(Dir::North)
    } else if is_key_pressed(KeyCode::Down) || is_key_pressed(KeyCode::J) {
        Some(Dir::South)
    } else if is_key_pressed(KeyCode::Left) || is_key_pressed(KeyCode::H) {
        Some(Dir::West)
    } else if is_key_pressed(KeyCode::Right) || is_key_pressed(KeyCode::L) {
        Some(Dir::East)
    } else {
        None
    };

    input.wait = is_key_pressed(KeyCode::Period);
    input.pick_up = is_key_pressed(KeyCode::G);
    input.descend = is_key_pressed(KeyCode::Enter);
    input.open_inventory = is_key_pressed(KeyCode::I);
    input.open_drop = is_key_pressed(KeyCode::D);
    input.escape = is_key_pressed(KeyCode::Escape);
    input.cancel = input.escape || is_mouse_button_pressed(MouseButton::Right);

    // Letter keys double as slot selectors; drain the char queue so held
    // modifiers do not replay.
    while let Some(ch) = get_char_pressed() {
        if ch.is_ascii_lowercase() {
            input.slot = Some((ch as u8 - b'a') as usize);
        }
    }

    let (mouse_x, mouse_y) = mouse_position();
    input.cursor_tile = Some(surface.tile_at(mouse_x, mouse_y));
    input.confirm = is_mouse_button_pressed(MouseButton::Left);

    input
}
