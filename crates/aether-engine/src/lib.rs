//! # Aether Engine
//!
//! Headless driver for the Aether day/night and weather simulation.
//!
//! This crate ties the simulation to the outside world:
//! - Configuration loaded from `aether.toml`
//! - Weather presets and seasons loaded from RON assets
//! - Frame timing for the run loop
//! - A renderer that logs sky commands

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod app;
pub mod assets;
pub mod config;
pub mod renderer;
pub mod timing;
