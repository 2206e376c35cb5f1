//! Client core for the EventFlex event-staffing marketplace: session handling, the
//! backend gateway, markup rendering, background reconcilers and action handlers.

pub mod actions;
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod pages;
pub mod poll;
pub mod render;
pub mod session;
pub mod storage;
pub mod surface;
pub mod toast;
