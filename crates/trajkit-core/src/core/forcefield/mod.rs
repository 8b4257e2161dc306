//! Pair potentials used to perturb an ensemble.
//!
//! [`potentials`] holds the plain functional forms; [`perturbation`] wraps them
//! into [`perturbation::Perturbation`] and defines the
//! [`perturbation::PairPerturbation`] seam that the reweighting workflow
//! evaluates on every pair distance within the cutoff.

pub mod perturbation;
pub(crate) mod potentials;
