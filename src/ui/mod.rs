pub mod components;
pub mod data;
pub mod nav;
pub mod navigate;
pub mod palette;
pub mod popover;
pub mod shortcuts;
pub mod tui;
