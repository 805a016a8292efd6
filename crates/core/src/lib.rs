#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

//! Core library for scorevault.
//!
//! Keeps viewer-friendly exports (PDF, MusicXML) of MuseScore files in sync
//! with a note vault, and decides how links to MuseScore files are embedded.

pub mod config;
pub mod embed;
pub mod export;
pub mod formats;
pub mod paths;
pub mod service;
pub mod settings;
pub mod vault;
pub mod watcher;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
