//! RoboMod Dashboard Library
//!
//! Client side of the RoboMod moderator dashboard, a Telegram Mini App for
//! managing a group's moderation bot.
//!
//! This crate provides the core functionality for:
//! - Reading the Mini App bridge context and verifying `initData`
//! - Calling the dashboard backend with per-endpoint throttling
//! - Loading panel settings with bounded exponential-backoff retries
//! - Applying settings changes and scheduling messages

pub mod api;
pub mod commands;
pub mod config;
pub mod panels;
pub mod webapp;
