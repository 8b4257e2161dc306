//! # Workflows Module
//!
//! User-facing procedures built on a [`crate::engine::simulation::Simulation`].
//!
//! - **Reweighting** ([`reweight`]) - Boltzmann reweighting of the frames under a
//!   pairwise perturbation evaluated within a distance cutoff.
//! - **Secondary-Structure Map** ([`ss_map`]) - Residue × frame class matrix
//!   produced by an external classifier.
//!
//! Both workflows traverse the configured frame range exactly once and report
//! progress through a [`crate::engine::progress::ProgressReporter`].

pub mod reweight;
pub mod ss_map;
