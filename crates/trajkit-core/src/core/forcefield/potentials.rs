//! Pair energies as functions of the interatomic distance alone.
//!
//! Overlapping pairs would send the repulsive terms to infinity, so every
//! energy is clamped to `±ENERGY_CAP`.

/// Electrostatic conversion factor in kcal·Å/(mol·e²).
pub const COULOMB_CONSTANT: f64 = 332.0637;
/// Largest magnitude a single pair energy may take.
pub const ENERGY_CAP: f64 = 1e10;

const MIN_DISTANCE: f64 = 1e-6;
// Below this reduced distance the exp-6 form turns over and becomes attractive.
const BUCKINGHAM_MIN_RHO: f64 = 0.1;

#[inline]
fn capped(energy: f64) -> f64 {
    energy.clamp(-ENERGY_CAP, ENERGY_CAP)
}

/// `ε·[(r₀/r)¹² − 2(r₀/r)⁶]`, minimum `−ε` at `r = r₀`.
#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return ENERGY_CAP;
    }
    let rho6 = (r_min / dist).powi(6);
    capped(well_depth * rho6 * (rho6 - 2.0))
}

/// Buckingham exp-6 in its `(r₀, ε, γ)` form, minimum `−ε` at `r = r₀`.
#[inline]
pub fn buckingham_exp_6(dist: f64, r_min: f64, well_depth: f64, gamma: f64) -> f64 {
    let rho = dist / r_min;
    if dist < MIN_DISTANCE || rho < BUCKINGHAM_MIN_RHO {
        return ENERGY_CAP;
    }
    let repulsion = 6.0 / (gamma - 6.0) * (gamma * (1.0 - rho)).exp();
    let dispersion = gamma / (gamma - 6.0) * rho.powi(-6);
    capped(well_depth * (repulsion - dispersion))
}

#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    let prefactor = COULOMB_CONSTANT * q1 * q2 / dielectric;
    if prefactor == 0.0 {
        return 0.0;
    }
    if dist < MIN_DISTANCE {
        return ENERGY_CAP.copysign(prefactor);
    }
    capped(prefactor / dist)
}

/// Gaussian bump `height · exp(-(r - center)² / 2·width²)`.
#[inline]
pub fn gaussian(dist: f64, height: f64, center: f64, width: f64) -> f64 {
    if width <= 1e-9 {
        return 0.0;
    }
    let z = (dist - center) / width;
    height * (-0.5 * z * z).exp()
}
