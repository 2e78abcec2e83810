//! Player state backing the gathering engines.
//!
//! # Modules
//!
//! - [`skills`] -- Skill levels, XP curve and boosts.
//! - [`inventory`] -- Capacity-bounded item storage.
//! - [`persistence`] -- Dirty tracking for periodic saves.
//! - [`store`] -- [`PlayerStore`], the in-memory collaborator.
//! - [`error`] -- [`PlayerError`].
//!
//! [`PlayerStore`]: store::PlayerStore
//! [`PlayerError`]: error::PlayerError

pub mod error;
pub mod inventory;
pub mod persistence;
pub mod skills;
pub mod store;

pub use error::PlayerError;
pub use store::{PlayerDefaults, PlayerRecord, PlayerStore};
