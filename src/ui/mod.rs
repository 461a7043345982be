//! Terminal UI rendering using ratatui.
//!
//! Each view lives in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`overview`]: One row per room with latest values, limits and sparklines
//! - [`trends`]: Line charts of the selected room's recent readings
//! - [`alerts`]: The alert history, newest first
//! - [`common`]: Header, tabs, notification banner, status bar and help overlay
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │ Notification (only while active)     │
//! ├──────────────────────────────────────┤
//! │ View Content                         │
//! │ (overview/trends/alerts::render)     │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    common::render_help drawn on top
//! ```

pub mod alerts;
pub mod common;
pub mod overview;
pub mod theme;
pub mod trends;

pub use theme::Theme;
