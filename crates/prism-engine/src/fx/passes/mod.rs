//! Concrete passes, one module per pipeline slot.

pub mod antialias;
pub mod bloom;
pub mod dot_screen;
pub mod futuristic;
pub mod gamma;
pub mod glitch;
pub mod rgb_shift;
pub mod scene;
pub mod tint;

pub use antialias::AntiAliasPass;
pub use bloom::BloomPass;
pub use dot_screen::dot_screen_pass;
pub use futuristic::{futuristic_pass, FuturisticParams};
pub use gamma::gamma_pass;
pub use glitch::{GlitchPass, GlitchPhase};
pub use rgb_shift::rgb_shift_pass;
pub use scene::ScenePass;
pub use tint::tint_pass;
