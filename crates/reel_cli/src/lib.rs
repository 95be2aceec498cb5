//! Command-line front end of the reel wizard.
//!
//! The binary in `main.rs` parses arguments; everything it drives lives here
//! so that settings merging, effect dispatch and rendering can be tested.

pub mod effects;
pub mod render;
pub mod session;
pub mod settings;
