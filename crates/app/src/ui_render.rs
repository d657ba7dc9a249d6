//! Macroquad drawing: a glyph grid surface for the engine plus the HUD
//! overlays (log panel, health bar, inventory screen, targeting cursor).

use game_core::engine::Engine;
use game_core::frontend::{Frontend, RenderSurface, TargetEvent};
use game_core::types::{Pos, Rgb};
use macroquad::prelude::{
    BLACK, Color, DARKGRAY, GRAY, RED, WHITE, clear_background, draw_rectangle,
    draw_rectangle_lines, draw_text, screen_height, screen_width,
};

use crate::app_loop::AppMode;

pub const TILE_SIZE: f32 = 16.0;
const LOG_LINES: usize = 5;
const LOG_PANEL_HEIGHT: f32 = 110.0;

pub struct GlyphSurface {
    center: Pos,
}

impl GlyphSurface {
    pub fn new() -> Self {
        Self { center: Pos { y: 0, x: 0 } }
    }

    /// Top-left screen coordinate of tile (0, 0) for the current center.
    fn origin(&self) -> (f32, f32) {
        let map_height = screen_height() - LOG_PANEL_HEIGHT;
        (
            screen_width() / 2.0 - (self.center.x as f32 + 0.5) * TILE_SIZE,
            map_height / 2.0 - (self.center.y as f32 + 0.5) * TILE_SIZE,
        )
    }

    fn tile_rect(&self, pos: Pos) -> (f32, f32) {
        let (ox, oy) = self.origin();
        (ox + pos.x as f32 * TILE_SIZE, oy + pos.y as f32 * TILE_SIZE)
    }

    /// The map tile under a screen coordinate.
    pub fn tile_at(&self, screen_x: f32, screen_y: f32) -> Pos {
        let (ox, oy) = self.origin();
        Pos {
            y: ((screen_y - oy) / TILE_SIZE).floor() as i32,
            x: ((screen_x - ox) / TILE_SIZE).floor() as i32,
        }
    }
}

impl Default for GlyphSurface {
    fn default() -> Self {
        Self::new()
    }
}

fn to_mq(color: Rgb) -> Color {
    Color::from_rgba(color.r, color.g, color.b, 255)
}

impl RenderSurface for GlyphSurface {
    fn clear(&mut self) {
        clear_background(BLACK);
    }

    fn set_center(&mut self, center: Pos) {
        self.center = center;
    }

    fn draw_glyph(&mut self, pos: Pos, glyph: char, color: Rgb) {
        let (x, y) = self.tile_rect(pos);
        if x < -TILE_SIZE
            || y < -TILE_SIZE
            || x > screen_width()
            || y > screen_height() - LOG_PANEL_HEIGHT
        {
            return;
        }
        let mut buf = [0_u8; 4];
        draw_text(glyph.encode_utf8(&mut buf), x + 2.0, y + TILE_SIZE - 3.0, TILE_SIZE, to_mq(color));
    }

    fn highlight(&mut self, pos: Pos, strong: bool) {
        let (x, y) = self.tile_rect(pos);
        let overlay = if strong {
            Color::new(1.0, 1.0, 1.0, 0.45)
        } else {
            Color::new(0.3, 0.5, 1.0, 0.18)
        };
        draw_rectangle(x, y, TILE_SIZE, TILE_SIZE, overlay);
    }

    fn flush(&mut self) {}
}

// The windowed app never enters the engine's blocking targeting loop; it
// routes targeting through its own mode and pre-picked tiles instead.
impl Frontend for GlyphSurface {
    fn poll_event(&mut self) -> TargetEvent {
        TargetEvent::Cancel
    }
}

/// Everything drawn on top of the map: status line, health bar, message log,
/// and the mode-specific overlays.
pub fn draw_overlays(engine: &Engine, mode: &AppMode, surface: &mut GlyphSurface) {
    match mode {
        AppMode::Targeting { range, hover, .. } => {
            draw_targeting_overlay(engine, surface, *range, *hover);
        }
        AppMode::Inventory { dropping } => draw_inventory(engine, *dropping),
        AppMode::Dead => {
            draw_text(
                "YOU DIED - press Escape to quit",
                screen_width() / 2.0 - 150.0,
                screen_height() / 2.0,
                24.0,
                RED,
            );
        }
        AppMode::Playing => {}
    }
    draw_hud(engine);
}

fn draw_targeting_overlay(
    engine: &Engine,
    surface: &mut GlyphSurface,
    range: f32,
    hover: Option<Pos>,
) {
    let (width, height) = engine.map_size();
    let origin = engine.player_position();
    for y in 0..height {
        for x in 0..width {
            let pos = Pos { y, x };
            if engine.tile_in_fov(pos) && (range == 0.0 || origin.distance_to(pos) <= range) {
                surface.highlight(pos, false);
            }
        }
    }
    if let Some(pos) = hover {
        surface.highlight(pos, true);
    }
}

fn draw_hud(engine: &Engine) {
    let panel_top = screen_height() - LOG_PANEL_HEIGHT;
    draw_rectangle(0.0, panel_top, screen_width(), LOG_PANEL_HEIGHT, Color::new(0.0, 0.0, 0.0, 0.85));

    let (hp, max_hp) = engine.player_hp();
    let bar_width = 180.0;
    let filled = if max_hp > 0 { bar_width * hp as f32 / max_hp as f32 } else { 0.0 };
    draw_rectangle(10.0, panel_top + 8.0, bar_width, 14.0, DARKGRAY);
    draw_rectangle(10.0, panel_top + 8.0, filled, 14.0, RED);
    draw_text(&format!("HP {hp}/{max_hp}"), 14.0, panel_top + 20.0, 14.0, WHITE);
    draw_text(
        &format!("depth {}  xp {}", engine.level(), engine.player_xp()),
        10.0,
        panel_top + 38.0,
        14.0,
        GRAY,
    );

    let log = engine.log();
    let start = log.len().saturating_sub(LOG_LINES);
    for (row, message) in log[start..].iter().enumerate() {
        draw_text(
            &message.text,
            210.0,
            panel_top + 16.0 + row as f32 * 18.0,
            16.0,
            to_mq(message.color),
        );
    }
}

fn draw_inventory(engine: &Engine, dropping: bool) {
    let names = engine.inventory_names();
    let width = 320.0;
    let height = 40.0 + 20.0 * names.len().max(1) as f32;
    let x = (screen_width() - width) / 2.0;
    let y = 60.0;
    draw_rectangle(x, y, width, height, Color::new(0.05, 0.05, 0.1, 0.95));
    draw_rectangle_lines(x, y, width, height, 2.0, GRAY);

    let title = if dropping { "DROP which item?" } else { "INVENTORY (a-z to use)" };
    draw_text(title, x + 10.0, y + 20.0, 18.0, WHITE);
    if names.is_empty() {
        draw_text("(empty)", x + 10.0, y + 44.0, 16.0, DARKGRAY);
    }
    for (index, name) in names.iter().enumerate() {
        let letter = (b'a' + index as u8) as char;
        draw_text(
            &format!("({letter}) {name}"),
            x + 10.0,
            y + 44.0 + index as f32 * 20.0,
            16.0,
            WHITE,
        );
    }
}
