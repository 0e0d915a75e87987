//! Dealboard TUI library exports.

pub mod api_client;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod gateway;
pub mod keys;
pub mod logging;
pub mod nav;
pub mod notifications;
pub mod persistence;
pub mod state;
pub mod theme;
pub mod traits;
pub mod views;
pub mod widgets;
