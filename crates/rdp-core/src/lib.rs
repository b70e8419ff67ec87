//! rdp-core: shared key translation for the RDP session controller.
//!
//! The canonical representation is the Windows Virtual Key code, because the
//! remote desktop collaborator delivers keyboard input as VK codes. Symbolic
//! names and literal characters are resolved to VK codes at the injection
//! boundary.

pub mod keymap;

pub use keymap::{resolve, KeySpec, KeymapError};
