//! minimax-speech-rs: Interactive front-end for MiniMax Speech-02-HD.
//!
//! This crate collects synthesis parameters in a localized form, sends them
//! to the `minimax/speech-02-hd` model on Replicate, and lets the user play
//! or save the resulting MP3 while keeping a single temporary file around.

pub mod backend;
pub mod cli;
pub mod config;
pub mod engine;
pub mod i18n;
pub mod params;
pub mod playback;
