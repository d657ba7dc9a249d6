pub mod actor;
pub mod ai;
pub mod combat;
pub mod content;
pub mod engine;
pub mod fov;
pub mod frontend;
pub mod inventory;
pub mod map;
pub mod mapgen;
pub mod persist;
pub mod types;

pub use actor::Actor;
pub use ai::Ai;
pub use combat::{Attacker, DeathBehavior, Destructible};
pub use engine::Engine;
pub use frontend::{Frontend, NullFrontend, RenderSurface, TargetEvent};
pub use inventory::{Container, Pickable, UseEffect};
pub use map::{FOV_RADIUS, Map};
pub use persist::{SaveError, load_from_path, save_to_path};
pub use types::*;
