//! Cryptolygon Economy -- the idle-game modules behind the proxy.
//!
//! Players start a run owning polygon tier 0, accrue lines lazily from
//! elapsed time, spend lines on polygon levels and upgrades, and ascend to
//! convert a run's production into circles that buy permanent perks.
//!
//! # Modules
//!
//! Each gameplay concern is a [`cryptolygon_core::module::Module`] that
//! keeps all of its state in the proxy's storage registry:
//!
//! - [`production::ProductionModule`] -- `start`, polygon level-ups.
//! - [`augmentation::AugmentationModule`] -- Upgrade purchases.
//! - [`prestige::PrestigeModule`] -- Perks and ascension.
//! - [`catalog::CatalogModule`] -- Tier lists, token address, player views.
//! - [`genesis::GenesisModule`] -- One-time configuration, run as a cut
//!   initializer.
//!
//! # Batches
//!
//! Every purchase takes a [`batch::Batch`] and either applies in full or
//! fails without effect. Validation and pricing are pure functions
//! (`plan_level_up`, `plan_upgrades`, `plan_perks`) evaluated against
//! pre-call levels; the balance is checked once for the summed cost.
//!
//! [`deploy::deploy_game`] wires everything together and
//! [`client::GameClient`] offers a typed front end.

pub mod accrual;
pub mod augmentation;
pub mod batch;
pub mod catalog;
pub mod client;
pub mod config;
pub mod deploy;
pub mod events;
pub mod genesis;
pub mod math;
pub mod player;
pub mod prestige;
pub mod production;

pub use batch::Batch;
pub use client::GameClient;
pub use config::GameConfig;
pub use deploy::{Deployment, deploy_game};
