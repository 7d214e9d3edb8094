//! UI rendering module for watch mode
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod help_overlay;
pub mod watch;
pub mod widgets;

pub use help_overlay::render as render_help_overlay;
pub use watch::render as render_watch;
