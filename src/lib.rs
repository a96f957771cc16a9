#![forbid(unsafe_code)]

//! Local-first tracker for working through playlists of video content.
//!
//! The crate keeps the whole collection in a single JSON file, derives
//! progress statistics on demand and resolves titles/thumbnails/durations
//! for YouTube and Vimeo URLs through their public endpoints. The
//! `playtrack` binary wires everything into a small CLI.

pub mod config;
pub mod fetch;
pub mod ids;
pub mod notes;
pub mod player;
pub mod sort;
pub mod stats;
pub mod store;
