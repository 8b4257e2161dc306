//! # Core Models Module
//!
//! Data structures describing what a trajectory contains.
//!
//! - [`atom`] - Per-atom metadata (names, residue membership, element, mass)
//! - [`topology`] - The static atom list of a system and atom selections
//! - [`frame`] - The coordinates and box of one timestep
//! - [`unit_cell`] - Periodic boxes and the minimum-image convention
//!
//! A [`topology::Topology`] never changes along a trajectory; a
//! [`frame::Frame`] is overwritten on every read.

pub mod atom;
pub mod frame;
pub mod topology;
pub mod unit_cell;
