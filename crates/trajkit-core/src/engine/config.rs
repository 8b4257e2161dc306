use crate::core::forcefield::perturbation::InvalidParameter;
use crate::core::models::topology::AtomSelection;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Parameter '{name}' must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error(transparent)]
    Perturbation(#[from] InvalidParameter),
}

pub const DEFAULT_CUTOFF: f64 = 12.0;
pub const DEFAULT_BOLTZMANN_CONSTANT: f64 = 1.0;
pub const DEFAULT_TEMPERATURE: f64 = 1.0;

/// Settings of the reweighting workflow.
///
/// Energies are summed over pairs between `group_1` and `group_2` closer than
/// `cutoff` (Å), or over unordered pairs inside `group_1` when `group_2` is
/// `None`. `boltzmann_constant` and `temperature` must use the energy unit of
/// the perturbation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReweightConfig {
    pub group_1: AtomSelection,
    pub group_2: Option<AtomSelection>,
    pub cutoff: f64,
    pub boltzmann_constant: f64,
    pub temperature: f64,
}

impl ReweightConfig {
    /// The thermal energy `k·T`.
    pub fn kt(&self) -> f64 {
        self.boltzmann_constant * self.temperature
    }
}

#[derive(Default)]
pub struct ReweightConfigBuilder {
    group_1: Option<AtomSelection>,
    group_2: Option<AtomSelection>,
    cutoff: Option<f64>,
    boltzmann_constant: Option<f64>,
    temperature: Option<f64>,
}

impl ReweightConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_1(mut self, selection: AtomSelection) -> Self {
        self.group_1 = Some(selection);
        self
    }
    pub fn group_2(mut self, selection: AtomSelection) -> Self {
        self.group_2 = Some(selection);
        self
    }
    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn boltzmann_constant(mut self, k: f64) -> Self {
        self.boltzmann_constant = Some(k);
        self
    }
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn build(self) -> Result<ReweightConfig, ConfigError> {
        let config = ReweightConfig {
            group_1: self
                .group_1
                .ok_or(ConfigError::MissingParameter("group_1"))?,
            group_2: self.group_2,
            cutoff: self.cutoff.unwrap_or(DEFAULT_CUTOFF),
            boltzmann_constant: self
                .boltzmann_constant
                .unwrap_or(DEFAULT_BOLTZMANN_CONSTANT),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        };
        for (name, value) in [
            ("cutoff", config.cutoff),
            ("boltzmann_constant", config.boltzmann_constant),
            ("temperature", config.temperature),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        Ok(config)
    }
}
