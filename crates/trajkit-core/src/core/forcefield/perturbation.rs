use super::potentials;
use serde::Deserialize;
use thiserror::Error;

/// A pairwise energy term evaluated on an interatomic distance (Å).
pub trait PairPerturbation {
    fn energy(&self, dist: f64) -> f64;
}

impl<F> PairPerturbation for F
where
    F: Fn(f64) -> f64,
{
    #[inline]
    fn energy(&self, dist: f64) -> f64 {
        self(dist)
    }
}

/// Built-in perturbations, deserializable from a `kind`-tagged table:
///
/// ```toml
/// [perturbation]
/// kind = "lennard-jones"
/// r-min = 3.5
/// well-depth = 0.2
/// ```
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(
    tag = "kind",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case"
)]
pub enum Perturbation {
    LennardJones {
        r_min: f64,
        well_depth: f64,
    },
    Buckingham {
        r_min: f64,
        well_depth: f64,
        gamma: f64,
    },
    Coulomb {
        q1: f64,
        q2: f64,
        #[serde(default = "default_dielectric")]
        dielectric: f64,
    },
    Gaussian {
        height: f64,
        center: f64,
        width: f64,
    },
}

fn default_dielectric() -> f64 {
    1.0
}

#[derive(Debug, Error, PartialEq, Clone)]
#[error("Invalid {kind} parameter '{parameter}': {reason}")]
pub struct InvalidParameter {
    pub kind: &'static str,
    pub parameter: &'static str,
    pub reason: &'static str,
}

impl Perturbation {
    pub fn kind(&self) -> &'static str {
        match self {
            Perturbation::LennardJones { .. } => "lennard-jones",
            Perturbation::Buckingham { .. } => "buckingham",
            Perturbation::Coulomb { .. } => "coulomb",
            Perturbation::Gaussian { .. } => "gaussian",
        }
    }

    /// Checks the parameters that would make the potential meaningless.
    ///
    /// # Errors
    ///
    /// Returns the first offending parameter.
    pub fn validate(&self) -> Result<(), InvalidParameter> {
        let invalid = |parameter, reason| InvalidParameter {
            kind: self.kind(),
            parameter,
            reason,
        };
        match *self {
            Perturbation::LennardJones { r_min, .. } if r_min <= 0.0 => {
                Err(invalid("r-min", "must be positive"))
            }
            Perturbation::Buckingham { r_min, .. } if r_min <= 0.0 => {
                Err(invalid("r-min", "must be positive"))
            }
            Perturbation::Buckingham { gamma, .. } if gamma <= 6.0 => {
                Err(invalid("gamma", "must be greater than 6"))
            }
            Perturbation::Coulomb { dielectric, .. } if dielectric <= 0.0 => {
                Err(invalid("dielectric", "must be positive"))
            }
            Perturbation::Gaussian { width, .. } if width <= 0.0 => {
                Err(invalid("width", "must be positive"))
            }
            _ => Ok(()),
        }
    }
}

impl PairPerturbation for Perturbation {
    #[inline]
    fn energy(&self, dist: f64) -> f64 {
        match *self {
            Perturbation::LennardJones { r_min, well_depth } => {
                potentials::lennard_jones_12_6(dist, r_min, well_depth)
            }
            Perturbation::Buckingham {
                r_min,
                well_depth,
                gamma,
            } => potentials::buckingham_exp_6(dist, r_min, well_depth, gamma),
            Perturbation::Coulomb { q1, q2, dielectric } => {
                potentials::coulomb(dist, q1, q2, dielectric)
            }
            Perturbation::Gaussian {
                height,
                center,
                width,
            } => potentials::gaussian(dist, height, center, width),
        }
    }
}
