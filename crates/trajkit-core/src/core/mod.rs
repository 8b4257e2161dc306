//! # Core Module
//!
//! Stateless building blocks of the toolkit.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, topologies, frames and unit cells
//! - **File I/O** ([`io`]) - Forward-only XYZ and PDB trajectory readers
//! - **Frame Iteration** ([`trajectory`]) - The range-aware, restartable trajectory cursor
//! - **Pair Potentials** ([`forcefield`]) - Functional forms used as perturbations
//! - **Pair Search** ([`neighbors`]) - Cell lists with periodic boundary handling
//! - **Secondary Structure** ([`secondary`]) - DSSP classes and the classifier seam

pub mod forcefield;
pub mod io;
pub mod models;
pub mod neighbors;
pub mod secondary;
pub mod trajectory;
pub(crate) mod utils;
