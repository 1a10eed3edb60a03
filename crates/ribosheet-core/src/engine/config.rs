use crate::core::io::naming::RunFiles;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, format!("expected a finite positive number, got {value}")))
    }
}

/// Geometry of the base wall and the sugar layer above it.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetConfig {
    /// Sugar grid rows.
    pub height: usize,
    /// Sugar grid columns.
    pub width: usize,
    /// Number of L-sugars placed in the layer; the remaining sites hold D-sugars.
    pub l_count: usize,
    pub base_spacing: f64,
    pub sugar_spacing: f64,
}

impl SheetConfig {
    pub const DEFAULT_BASE_SPACING: f64 = 3.3;
    pub const DEFAULT_SUGAR_SPACING: f64 = 8.0;

    pub fn sugar_sites(&self) -> usize {
        self.height * self.width
    }

    pub fn d_count(&self) -> usize {
        self.sugar_sites().saturating_sub(self.l_count)
    }
}

/// SDF files of the four molecule templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoleculeSources {
    pub d_sugar: PathBuf,
    pub l_sugar: PathBuf,
    pub guanine: PathBuf,
    pub cytosine: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegratorConfig {
    pub temperature_kelvin: f64,
    pub friction_per_ps: f64,
    pub timestep_ps: f64,
    pub minimization_steps: usize,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            temperature_kelvin: 300.0,
            friction_per_ps: 1.0,
            timestep_ps: 0.004,
            minimization_steps: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub sheet: SheetConfig,
    pub molecules: MoleculeSources,
    pub integrator: IntegratorConfig,
    /// Harmonic restraint constant on the base wall, kJ/mol/Å².
    pub restraint_constant: f64,
    pub solvate: bool,
    pub steps: u64,
    pub report_interval: u64,
    pub output_dir: PathBuf,
    pub jobs: usize,
    pub processes: usize,
    pub devices: usize,
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub const DEFAULT_RESTRAINT_CONSTANT: f64 = 100.0;

    /// Device assigned to a job, round-robin over the available devices.
    pub fn device_for(&self, job: usize) -> usize {
        job % self.devices.max(1)
    }

    /// Output file names of one job.
    pub fn run_files(&self, job: usize) -> RunFiles {
        RunFiles::new(job, self.sheet.l_count, self.steps)
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    height: Option<usize>,
    width: Option<usize>,
    l_count: Option<usize>,
    base_spacing: Option<f64>,
    sugar_spacing: Option<f64>,
    d_sugar: Option<PathBuf>,
    l_sugar: Option<PathBuf>,
    guanine: Option<PathBuf>,
    cytosine: Option<PathBuf>,
    integrator: Option<IntegratorConfig>,
    restraint_constant: Option<f64>,
    solvate: Option<bool>,
    steps: Option<u64>,
    report_interval: Option<u64>,
    output_dir: Option<PathBuf>,
    jobs: Option<usize>,
    processes: Option<usize>,
    devices: Option<usize>,
    seed: Option<u64>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(mut self, height: usize) -> Self {
        self.height = Some(height);
        self
    }
    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }
    pub fn l_count(mut self, count: usize) -> Self {
        self.l_count = Some(count);
        self
    }
    pub fn base_spacing(mut self, spacing: f64) -> Self {
        self.base_spacing = Some(spacing);
        self
    }
    pub fn sugar_spacing(mut self, spacing: f64) -> Self {
        self.sugar_spacing = Some(spacing);
        self
    }
    pub fn d_sugar(mut self, path: PathBuf) -> Self {
        self.d_sugar = Some(path);
        self
    }
    pub fn l_sugar(mut self, path: PathBuf) -> Self {
        self.l_sugar = Some(path);
        self
    }
    pub fn guanine(mut self, path: PathBuf) -> Self {
        self.guanine = Some(path);
        self
    }
    pub fn cytosine(mut self, path: PathBuf) -> Self {
        self.cytosine = Some(path);
        self
    }
    pub fn integrator(mut self, integrator: IntegratorConfig) -> Self {
        self.integrator = Some(integrator);
        self
    }
    pub fn restraint_constant(mut self, k: f64) -> Self {
        self.restraint_constant = Some(k);
        self
    }
    pub fn solvate(mut self, solvate: bool) -> Self {
        self.solvate = Some(solvate);
        self
    }
    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn report_interval(mut self, interval: u64) -> Self {
        self.report_interval = Some(interval);
        self
    }
    pub fn output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }
    pub fn processes(mut self, processes: usize) -> Self {
        self.processes = Some(processes);
        self
    }
    pub fn devices(mut self, devices: usize) -> Self {
        self.devices = Some(devices);
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let sheet = SheetConfig {
            height: self.height.ok_or(ConfigError::MissingParameter("height"))?,
            width: self.width.ok_or(ConfigError::MissingParameter("width"))?,
            l_count: self.l_count.ok_or(ConfigError::MissingParameter("l_count"))?,
            base_spacing: require_positive(
                "base_spacing",
                self.base_spacing
                    .unwrap_or(SheetConfig::DEFAULT_BASE_SPACING),
            )?,
            sugar_spacing: require_positive(
                "sugar_spacing",
                self.sugar_spacing
                    .unwrap_or(SheetConfig::DEFAULT_SUGAR_SPACING),
            )?,
        };
        if sheet.height == 0 || sheet.width == 0 {
            return Err(invalid("height/width", "the sugar grid needs at least one site"));
        }
        if sheet.l_count > sheet.sugar_sites() {
            return Err(invalid(
                "l_count",
                format!(
                    "{} exceeds the {} sites of a {}x{} sheet",
                    sheet.l_count,
                    sheet.sugar_sites(),
                    sheet.height,
                    sheet.width
                ),
            ));
        }

        let molecules = MoleculeSources {
            d_sugar: self.d_sugar.ok_or(ConfigError::MissingParameter("d_sugar"))?,
            l_sugar: self.l_sugar.ok_or(ConfigError::MissingParameter("l_sugar"))?,
            guanine: self.guanine.ok_or(ConfigError::MissingParameter("guanine"))?,
            cytosine: self
                .cytosine
                .ok_or(ConfigError::MissingParameter("cytosine"))?,
        };

        let integrator = self.integrator.unwrap_or_default();
        require_positive("temperature", integrator.temperature_kelvin)?;
        require_positive("timestep", integrator.timestep_ps)?;
        if !(integrator.friction_per_ps.is_finite() && integrator.friction_per_ps >= 0.0) {
            return Err(invalid("friction", "expected a finite non-negative rate"));
        }

        let restraint_constant = self
            .restraint_constant
            .unwrap_or(SimulationConfig::DEFAULT_RESTRAINT_CONSTANT);
        if !(restraint_constant.is_finite() && restraint_constant >= 0.0) {
            return Err(invalid(
                "restraint_constant",
                format!("expected a finite non-negative constant, got {restraint_constant}"),
            ));
        }

        let report_interval = self
            .report_interval
            .ok_or(ConfigError::MissingParameter("report_interval"))?;
        if report_interval == 0 {
            return Err(invalid("report_interval", "must be at least one step"));
        }
        let processes = self
            .processes
            .ok_or(ConfigError::MissingParameter("processes"))?;
        let devices = self.devices.ok_or(ConfigError::MissingParameter("devices"))?;
        if processes == 0 {
            return Err(invalid("processes", "must be at least one"));
        }
        if devices == 0 {
            return Err(invalid("devices", "must be at least one"));
        }

        Ok(SimulationConfig {
            sheet,
            molecules,
            integrator,
            restraint_constant,
            solvate: self.solvate.unwrap_or(true),
            steps: self.steps.ok_or(ConfigError::MissingParameter("steps"))?,
            report_interval,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            jobs: self.jobs.ok_or(ConfigError::MissingParameter("jobs"))?,
            processes,
            devices,
            seed: self.seed,
        })
    }
}

/// Which per-frame observables an analysis computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservableSelection {
    pub heights: bool,
    pub hydrogen_bonds: bool,
    pub nematic_order: bool,
    pub sasa: bool,
}

impl Default for ObservableSelection {
    fn default() -> Self {
        Self {
            heights: true,
            hydrogen_bonds: true,
            nematic_order: true,
            sasa: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HydrogenBondCriteria {
    /// Maximum hydrogen to acceptor distance, Å.
    pub distance_cutoff: f64,
    /// Minimum donor-hydrogen-acceptor angle, degrees.
    pub angle_cutoff_degrees: f64,
}

impl Default for HydrogenBondCriteria {
    fn default() -> Self {
        Self {
            distance_cutoff: 2.5,
            angle_cutoff_degrees: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SasaParameters {
    pub probe_radius: f64,
    pub sphere_points: usize,
}

impl Default for SasaParameters {
    fn default() -> Self {
        Self {
            probe_radius: 1.4,
            sphere_points: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub runs: usize,
    pub l_count: usize,
    pub steps: u64,
    /// Frames loaded from a trajectory at a time.
    pub chunk_size: usize,
    /// Simulated time between two frames, ns.
    pub frame_interval_ns: f64,
    pub kde_points: usize,
    pub observables: ObservableSelection,
    pub hydrogen_bonds: HydrogenBondCriteria,
    pub sasa: SasaParameters,
}

impl AnalysisConfig {
    /// Input file names of one run.
    pub fn run_files(&self, run: usize) -> RunFiles {
        RunFiles::new(run, self.l_count, self.steps)
    }
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    runs: Option<usize>,
    l_count: Option<usize>,
    steps: Option<u64>,
    chunk_size: Option<usize>,
    frame_interval_ns: Option<f64>,
    kde_points: Option<usize>,
    observables: Option<ObservableSelection>,
    hydrogen_bonds: Option<HydrogenBondCriteria>,
    sasa: Option<SasaParameters>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_dir(mut self, dir: PathBuf) -> Self {
        self.input_dir = Some(dir);
        self
    }
    pub fn output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }
    pub fn runs(mut self, runs: usize) -> Self {
        self.runs = Some(runs);
        self
    }
    pub fn l_count(mut self, count: usize) -> Self {
        self.l_count = Some(count);
        self
    }
    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn chunk_size(mut self, frames: usize) -> Self {
        self.chunk_size = Some(frames);
        self
    }
    pub fn frame_interval_ns(mut self, interval: f64) -> Self {
        self.frame_interval_ns = Some(interval);
        self
    }
    pub fn kde_points(mut self, points: usize) -> Self {
        self.kde_points = Some(points);
        self
    }
    pub fn observables(mut self, selection: ObservableSelection) -> Self {
        self.observables = Some(selection);
        self
    }
    pub fn hydrogen_bonds(mut self, criteria: HydrogenBondCriteria) -> Self {
        self.hydrogen_bonds = Some(criteria);
        self
    }
    pub fn sasa(mut self, parameters: SasaParameters) -> Self {
        self.sasa = Some(parameters);
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let chunk_size = self.chunk_size.unwrap_or(100);
        if chunk_size == 0 {
            return Err(invalid("chunk_size", "must be at least one frame"));
        }
        let kde_points = self.kde_points.unwrap_or(200);
        if kde_points < 2 {
            return Err(invalid("kde_points", "need at least two evaluation points"));
        }
        let hydrogen_bonds = self.hydrogen_bonds.unwrap_or_default();
        require_positive("distance_cutoff", hydrogen_bonds.distance_cutoff)?;
        if !(0.0..=180.0).contains(&hydrogen_bonds.angle_cutoff_degrees) {
            return Err(invalid("angle_cutoff", "must lie between 0 and 180 degrees"));
        }
        let sasa = self.sasa.unwrap_or_default();
        if !(sasa.probe_radius.is_finite() && sasa.probe_radius >= 0.0) {
            return Err(invalid("probe_radius", "expected a finite non-negative radius"));
        }
        if sasa.sphere_points == 0 {
            return Err(invalid("sphere_points", "must be at least one"));
        }

        Ok(AnalysisConfig {
            input_dir: self
                .input_dir
                .ok_or(ConfigError::MissingParameter("input_dir"))?,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            runs: self.runs.ok_or(ConfigError::MissingParameter("runs"))?,
            l_count: self.l_count.ok_or(ConfigError::MissingParameter("l_count"))?,
            steps: self.steps.ok_or(ConfigError::MissingParameter("steps"))?,
            chunk_size,
            frame_interval_ns: require_positive(
                "frame_interval_ns",
                self.frame_interval_ns.unwrap_or(0.004),
            )?,
            kde_points,
            observables: self.observables.unwrap_or_default(),
            hydrogen_bonds,
            sasa,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_simulation_builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::new()
            .height(3)
            .width(4)
            .l_count(5)
            .d_sugar("d.sdf".into())
            .l_sugar("l.sdf".into())
            .guanine("g.sdf".into())
            .cytosine("c.sdf".into())
            .steps(1000)
            .report_interval(100)
            .output_dir("out".into())
            .jobs(2)
            .processes(1)
            .devices(1)
    }

    #[test]
    fn simulation_builder_applies_defaults() {
        let config = complete_simulation_builder().build().unwrap();
        assert_eq!(config.sheet.base_spacing, 3.3);
        assert_eq!(config.sheet.sugar_spacing, 8.0);
        assert_eq!(config.sheet.d_count(), 7);
        assert_eq!(config.restraint_constant, 100.0);
        assert_eq!(config.integrator, IntegratorConfig::default());
        assert!(config.solvate);
        assert_eq!(config.device_for(5), 0);
    }

    #[test]
    fn simulation_builder_requires_worker_and_device_counts() {
        let mut builder = complete_simulation_builder();
        builder.processes = None;
        assert_eq!(builder.build(), Err(ConfigError::MissingParameter("processes")));

        let mut builder = complete_simulation_builder();
        builder.devices = None;
        assert_eq!(builder.build(), Err(ConfigError::MissingParameter("devices")));
    }

    #[test]
    fn simulation_builder_reports_missing_parameters() {
        let result = SimulationConfigBuilder::new().height(1).width(1).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("l_count")));
        let result = complete_simulation_builder()
            .output_dir("x".into())
            .build()
            .map(|c| c.jobs);
        assert_eq!(result, Ok(2));
    }

    #[test]
    fn simulation_builder_rejects_target_beyond_site_count() {
        let result = complete_simulation_builder().l_count(13).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "l_count", .. })
        ));
        assert!(complete_simulation_builder().l_count(12).build().is_ok());
    }

    #[test]
    fn simulation_builder_rejects_bad_numbers() {
        assert!(complete_simulation_builder().restraint_constant(-1.0).build().is_err());
        assert!(complete_simulation_builder().report_interval(0).build().is_err());
        assert!(complete_simulation_builder().sugar_spacing(f64::NAN).build().is_err());
        assert!(complete_simulation_builder().devices(0).build().is_err());
    }

    #[test]
    fn devices_are_assigned_round_robin() {
        let config = complete_simulation_builder().devices(3).build().unwrap();
        let devices: Vec<_> = (0..5).map(|job| config.device_for(job)).collect();
        assert_eq!(devices, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn analysis_builder_requires_paths_and_counts() {
        let result = AnalysisConfigBuilder::new().build();
        assert_eq!(result, Err(ConfigError::MissingParameter("input_dir")));

        let config = AnalysisConfigBuilder::new()
            .input_dir("in".into())
            .output_dir("out".into())
            .runs(4)
            .l_count(18)
            .steps(25_000)
            .build()
            .unwrap();
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.hydrogen_bonds, HydrogenBondCriteria::default());
        assert!(config.observables.sasa);
    }

    #[test]
    fn analysis_builder_rejects_zero_chunk() {
        let result = AnalysisConfigBuilder::new().chunk_size(0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "chunk_size", .. })
        ));
    }
}
