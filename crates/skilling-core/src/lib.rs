//! Tick clock, catalogs, formulas and gathering engines for the skilling
//! server.
//!
//! Every gathering activity is the same probability process: once per tick
//! each due session makes one roll against a family-specific success
//! probability. This crate owns that process and nothing else; skills,
//! inventories and persistence are reached through the traits in
//! [`services`].
//!
//! # Modules
//!
//! - [`clock`] -- Fixed-delay tick clock and the [`TickCallback`] trait.
//! - [`config`] -- Loading `skilling-config.yaml` into typed structs.
//! - [`catalog`] -- Versioned YAML tool and target tables.
//! - [`formula`] -- [`ActivityFormula`] and the four family formulas.
//! - [`registry`] -- Per-engine session storage.
//! - [`engine`] -- [`GatheringEngine`] and its tick pass.
//! - [`system`] -- [`SkillingSystem`], routing across families.
//! - [`services`] -- Collaborator contracts.
//! - [`rng`] -- Seeded roll sources.
//! - [`nodes`] -- Target availability hooks.
//!
//! [`TickCallback`]: clock::TickCallback
//! [`ActivityFormula`]: formula::ActivityFormula
//! [`GatheringEngine`]: engine::GatheringEngine
//! [`SkillingSystem`]: system::SkillingSystem

pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod formula;
pub mod nodes;
pub mod registry;
pub mod rng;
pub mod services;
pub mod system;
