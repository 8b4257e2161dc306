use crate::cli::{RangeArgs, ReweightArgs};
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use trajkit::core::forcefield::perturbation::Perturbation;
use trajkit::core::models::topology::AtomSelection;
use trajkit::core::trajectory::RangeConfig;
use trajkit::engine::config::{self as core_config, ConfigError};

#[derive(Deserialize, Debug, Clone)]
#[serde(
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    tag = "type",
    deny_unknown_fields
)]
enum PartialAtomSelection {
    All,
    Indices { indices: Vec<usize> },
    ResidueName { name: String },
    AtomName { name: String },
    Chain { chain_id: char },
}

impl From<PartialAtomSelection> for AtomSelection {
    fn from(p: PartialAtomSelection) -> Self {
        match p {
            PartialAtomSelection::All => AtomSelection::All,
            PartialAtomSelection::Indices { indices } => AtomSelection::Indices(indices),
            PartialAtomSelection::ResidueName { name } => AtomSelection::ResidueName(name),
            PartialAtomSelection::AtomName { name } => AtomSelection::AtomName(name),
            PartialAtomSelection::Chain { chain_id } => AtomSelection::Chain(chain_id),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialGroupsConfig {
    #[serde(rename = "group-1")]
    group_1: Option<PartialAtomSelection>,
    #[serde(rename = "group-2")]
    group_2: Option<PartialAtomSelection>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialReweightParams {
    cutoff: Option<f64>,
    #[serde(rename = "boltzmann-constant")]
    boltzmann_constant: Option<f64>,
    temperature: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
#[serde(deny_unknown_fields)]
struct PartialRangeConfig {
    first: Option<usize>,
    last: Option<usize>,
    step: Option<usize>,
}

/// The reweighting configuration as read from TOML, before CLI overrides.
///
/// ```toml
/// [perturbation]
/// kind = "lennard-jones"
/// r-min = 3.8
/// well-depth = 0.2
///
/// [groups]
/// group-1 = { type = "residue-name", name = "LIG" }
/// group-2 = { type = "chain", chain-id = "A" }
///
/// [reweight]
/// cutoff = 10.0
/// boltzmann-constant = 0.0019872
/// temperature = 300.0
///
/// [range]
/// first = 1
/// step = 10
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialReweightConfig {
    perturbation: Option<Perturbation>,
    groups: Option<PartialGroupsConfig>,
    reweight: Option<PartialReweightParams>,
    range: Option<PartialRangeConfig>,
}

/// Fully merged settings of one `reweight` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReweightSettings {
    pub range: RangeConfig,
    pub perturbation: Perturbation,
    pub reweight: core_config::ReweightConfig,
}

impl PartialReweightConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Merges CLI arguments over file values over library defaults.
    pub fn merge_with_cli(mut self, args: &ReweightArgs) -> Result<ReweightSettings> {
        self.apply_set_values(&args.set_values)?;

        let perturbation = self.perturbation.ok_or_else(|| {
            CliError::Config("`perturbation` section is required.".to_string())
        })?;
        perturbation
            .validate()
            .map_err(|e| CliError::Config(ConfigError::from(e).to_string()))?;

        let groups = self.groups.take().unwrap_or_default();
        let params = self.reweight.take().unwrap_or_default();

        let group_1 = groups.group_1.ok_or_else(|| {
            CliError::Config("`groups.group-1` is required.".to_string())
        })?;
        let mut builder = core_config::ReweightConfigBuilder::new().group_1(group_1.into());
        if let Some(group_2) = groups.group_2 {
            builder = builder.group_2(group_2.into());
        }
        if let Some(cutoff) = args.cutoff.or(params.cutoff) {
            builder = builder.cutoff(cutoff);
        }
        if let Some(k) = params.boltzmann_constant {
            builder = builder.boltzmann_constant(k);
        }
        if let Some(temperature) = args.temperature.or(params.temperature) {
            builder = builder.temperature(temperature);
        }
        let reweight = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

        Ok(ReweightSettings {
            range: merge_range(&args.range, self.range.unwrap_or_default()),
            perturbation,
            reweight,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "reweight.cutoff" => {
                    self.reweight.get_or_insert_with(Default::default).cutoff =
                        Some(parse_value(key, value_str)?);
                }
                "reweight.boltzmann-constant" => {
                    self.reweight
                        .get_or_insert_with(Default::default)
                        .boltzmann_constant = Some(parse_value(key, value_str)?);
                }
                "reweight.temperature" => {
                    self.reweight.get_or_insert_with(Default::default).temperature =
                        Some(parse_value(key, value_str)?);
                }
                "range.first" => {
                    self.range.get_or_insert_with(Default::default).first =
                        Some(parse_value(key, value_str)?);
                }
                "range.last" => {
                    self.range.get_or_insert_with(Default::default).last =
                        Some(parse_value(key, value_str)?);
                }
                "range.step" => {
                    self.range.get_or_insert_with(Default::default).step =
                        Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

/// CLI range flags win over the `[range]` table; unset fields keep the
/// defaults of [`RangeConfig`].
pub fn range_from_args(args: &RangeArgs) -> RangeConfig {
    merge_range(args, PartialRangeConfig::default())
}

fn merge_range(args: &RangeArgs, file: PartialRangeConfig) -> RangeConfig {
    let mut config = RangeConfig::new();
    if let Some(first) = args.first.or(file.first) {
        config = config.first(first);
    }
    if let Some(last) = args.last.or(file.last) {
        config = config.last(last);
    }
    if let Some(step) = args.step.or(file.step) {
        config = config.step(step);
    }
    config
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}
