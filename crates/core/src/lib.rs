//! Data-aggregation core for the craftstats dashboard API.
//!
//! Merges three heterogeneous sources into one read-only view of a running
//! Minecraft server:
//!
//! - a live RCON connection ([`rcon`], [`status`], with a server-list-ping
//!   fallback in [`ping`]),
//! - on-disk save data owned by the game process ([`save`], [`nbt`]),
//! - an optional server-distribution jar used to build the advancement
//!   catalog ([`catalog`], [`lang`]).
//!
//! Derived views (reconciled advancements, profiles, leaderboards, world
//! overview/progression/events) live in their own modules and are pure over
//! the readers above. Everything is designed to degrade rather than fail:
//! per-player or per-file problems collapse to safe defaults, and only
//! "cannot enumerate players at all" surfaces as [`error::CoreError::DataUnavailable`].

pub mod advancements;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod events;
pub mod lang;
pub mod leaderboard;
pub mod nbt;
pub mod ping;
pub mod profile;
pub mod progression;
pub mod rcon;
pub mod save;
pub mod status;
pub mod structures;
pub mod world;

pub use error::{CoreError, CoreResult};
