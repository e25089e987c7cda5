pub mod clipboard;
pub mod color;
pub mod config;
pub mod display;
pub mod pick;
pub mod policy;

pub use color::Color;
pub use config::Config;
pub use pick::{PickError, pick};
