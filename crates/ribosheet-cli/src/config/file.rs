use crate::error::{CliError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Loading configuration from file: {:?}", path);
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialSheetSection {
    pub height: Option<usize>,
    pub width: Option<usize>,
    pub l_count: Option<usize>,
    pub base_spacing: Option<f64>,
    pub sugar_spacing: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialMoleculesSection {
    pub d_sugar: Option<PathBuf>,
    pub l_sugar: Option<PathBuf>,
    pub guanine: Option<PathBuf>,
    pub cytosine: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialSimulationSection {
    pub steps: Option<u64>,
    pub report_interval: Option<u64>,
    pub runs: Option<usize>,
    pub processes: Option<usize>,
    pub devices: Option<usize>,
    pub seed: Option<u64>,
    pub solvate: Option<bool>,
    pub restraint_constant: Option<f64>,
    pub temperature: Option<f64>,
    pub friction: Option<f64>,
    pub timestep: Option<f64>,
    pub minimization_steps: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialOutputSection {
    pub dir: Option<PathBuf>,
    pub verbose: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialInputSection {
    pub dir: Option<PathBuf>,
    pub runs: Option<usize>,
    pub l_count: Option<usize>,
    pub steps: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialAnalysisSection {
    pub chunk_size: Option<usize>,
    pub frame_interval_ns: Option<f64>,
    pub kde_points: Option<usize>,
    pub heights: Option<bool>,
    pub hydrogen_bonds: Option<bool>,
    pub nematic_order: Option<bool>,
    pub sasa: Option<bool>,
    pub hbond_distance: Option<f64>,
    pub hbond_angle: Option<f64>,
    pub probe_radius: Option<f64>,
    pub sphere_points: Option<usize>,
}
