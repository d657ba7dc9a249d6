//! The seam between the simulation and whatever draws it. The core only ever
//! talks to these traits; the windowed app and the tests each bring their own
//! implementation.

use crate::types::{Pos, Rgb};

pub trait RenderSurface {
    fn clear(&mut self);
    /// The tile the viewport should follow, usually the player.
    fn set_center(&mut self, center: Pos);
    fn draw_glyph(&mut self, pos: Pos, glyph: char, color: Rgb);
    /// Targeting overlay; `strong` marks the hovered tile itself.
    fn highlight(&mut self, pos: Pos, strong: bool);
    fn flush(&mut self);
}

/// One interaction step inside a blocking targeting prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetEvent {
    Hover(Pos),
    Confirm(Pos),
    Cancel,
    WindowClosed,
}

pub trait Frontend: RenderSurface {
    fn poll_event(&mut self) -> TargetEvent;
}

/// Draws nothing and cancels every targeting prompt. Lets headless callers
/// run the engine without a window.
pub struct NullFrontend;

impl RenderSurface for NullFrontend {
    fn clear(&mut self) {}
    fn set_center(&mut self, _center: Pos) {}
    fn draw_glyph(&mut self, _pos: Pos, _glyph: char, _color: Rgb) {}
    fn highlight(&mut self, _pos: Pos, _strong: bool) {}
    fn flush(&mut self) {}
}

impl Frontend for NullFrontend {
    fn poll_event(&mut self) -> TargetEvent {
        TargetEvent::Cancel
    }
}

#[cfg(test)]
pub(crate) struct ScriptedFrontend {
    events: Vec<TargetEvent>,
}

#[cfg(test)]
impl ScriptedFrontend {
    pub(crate) fn new(mut events: Vec<TargetEvent>) -> Self {
        events.reverse();
        Self { events }
    }
}

#[cfg(test)]
impl RenderSurface for ScriptedFrontend {
    fn clear(&mut self) {}
    fn set_center(&mut self, _center: Pos) {}
    fn draw_glyph(&mut self, _pos: Pos, _glyph: char, _color: Rgb) {}
    fn highlight(&mut self, _pos: Pos, _strong: bool) {}
    fn flush(&mut self) {}
}

#[cfg(test)]
impl Frontend for ScriptedFrontend {
    fn poll_event(&mut self) -> TargetEvent {
        self.events.pop().unwrap_or(TargetEvent::Cancel)
    }
}
