//! Composable fishing regulations for the Fathom engine.
//!
//! A [`Regulation`] answers four questions about a vessel: may it fish
//! on a given tile, how much of a species it may still sell, may it be
//! at sea at all, and what bookkeeping follows a catch or a sale. Every
//! rule is a value of the closed [`Regulation`] enum, so chains of
//! decorators and composites stay plain data that can be copied per
//! vessel.
//!
//! Rules with scheduled behavior (quota resets, regime checks) register
//! tasks against the model when started and cancel them when turned
//! off. Starting the same rule twice is a configuration error, never a
//! silent double registration.
//!
//! # Modules
//!
//! - [`composite`] -- [`Conjunction`], [`TagAssembly`], [`Bundle`].
//! - [`decorators`] -- pause, tag, season, toggle and port-dwell wrappers.
//! - [`error`] -- [`RegulationError`].
//! - [`factory`] -- YAML-loadable [`RegulationFactory`] recipes.
//! - [`protected`] -- marine protected areas with patrol enforcement.
//! - [`quota`] -- the quota rules backing the sale caps.
//! - [`regime`] -- [`RegimeSwitch`], hysteretic policy switching.
//! - [`regulation`] -- the [`Regulation`] enum and its dispatch.

pub mod composite;
pub mod decorators;
pub mod error;
pub mod factory;
pub mod protected;
pub mod quota;
pub mod regime;
pub mod regulation;

pub use composite::{Bundle, Conjunction, TagAssembly, TAG_ALL};
pub use decorators::{ArbitraryPause, OnOff, PortWait, Tagged, Temporal};
pub use error::RegulationError;
pub use factory::{FactoryConfigError, RegulationFactory, TagFactories};
pub use protected::{EnforcementRegistry, EnforcementTerms, FinedProtectedAreas};
pub use quota::{MonoQuota, MultiQuota, SpeciesQuota};
pub use regime::{Regime, RegimeSwitch};
pub use regulation::Regulation;
