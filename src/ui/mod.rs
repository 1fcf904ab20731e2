//! User Interface Module
//!
//! Rendering of the snippet list, the highlighted editor pane and the overlays.

pub mod colors;
pub mod components;
pub mod snippets;
