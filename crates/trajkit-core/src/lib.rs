//! # trajkit
//!
//! Restartable, range-aware iteration over molecular-dynamics trajectories, and
//! the ensemble post-processing built on it.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Frame`, `UnitCell`,
//!   `Topology`), sequential trajectory readers, the [`core::trajectory::Trajectory`]
//!   cursor, pair potentials, and the cell-list pair search.
//!
//! - **[`engine`]: The Logic Core.** Stateful orchestration: the `Simulation`
//!   pairing a topology with its trajectory, workflow configuration, progress
//!   reporting and the workflow error type.
//!
//! - **[`workflows`]: The Public API.** Complete procedures (ensemble
//!   reweighting, secondary-structure maps) that traverse a simulation once and
//!   return tabular results.
//!
//! ```ignore
//! use trajkit::core::io::format::AnyTrajectory;
//! use trajkit::core::trajectory::{RangeConfig, Trajectory};
//!
//! let mut trajectory = Trajectory::<AnyTrajectory>::open("run.xyz", RangeConfig::new().first(2).step(2))?;
//! let mut frames = trajectory.frames();
//! while let Some(frame) = frames.advance()? {
//!     println!("{} atoms", frame.n_atoms());
//! }
//! ```

pub mod core;
pub mod engine;
pub mod workflows;
