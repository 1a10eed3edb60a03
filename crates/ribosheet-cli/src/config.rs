mod file;

use crate::cli::{AnalyzeArgs, SimulateArgs};
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use file::{
    PartialAnalysisSection, PartialInputSection, PartialMoleculesSection, PartialOutputSection,
    PartialSheetSection, PartialSimulationSection, load_toml,
};
use ribosheet::engine::config::{
    self as core_config, AnalysisConfigBuilder, HydrogenBondCriteria, IntegratorConfig,
    ObservableSelection, SasaParameters, SimulationConfigBuilder,
};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

fn apply<B, T>(builder: B, value: Option<T>, set: impl FnOnce(B, T) -> B) -> B {
    match value {
        Some(value) => set(builder, value),
        None => builder,
    }
}

fn parsed<T: FromStr>(key: &str, value: &str, expected: &'static str) -> Result<Option<T>> {
    parser::parse_value(key, value, expected)
        .map(Some)
        .map_err(|e| CliError::Config(e.to_string()))
}

fn required_verbose(output: Option<&PartialOutputSection>) -> Result<bool> {
    output.and_then(|o| o.verbose).ok_or_else(|| {
        CliError::Config(core_config::ConfigError::MissingParameter("verbose").to_string())
    })
}

fn unsupported(key: &str) -> CliError {
    CliError::Config(format!("Unsupported configuration key for --set: '{}'", key))
}

fn split(assignment: &str) -> Result<(&str, &str)> {
    parser::parse_assignment(assignment).map_err(|e: ParseError| CliError::Config(e.to_string()))
}

/// A simulation config file as written, before CLI overrides and validation.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialSimulationConfig {
    sheet: Option<PartialSheetSection>,
    molecules: Option<PartialMoleculesSection>,
    simulation: Option<PartialSimulationSection>,
    output: Option<PartialOutputSection>,
}

impl PartialSimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        load_toml(path)
    }

    pub fn verbose(&self) -> Result<bool> {
        required_verbose(self.output.as_ref())
    }

    pub fn merge_with_cli(mut self, args: &SimulateArgs) -> Result<core_config::SimulationConfig> {
        self.apply_set_values(&args.set_values)?;

        let sheet = self.sheet.take().unwrap_or_default();
        let molecules = self.molecules.take().unwrap_or_default();
        let simulation = self.simulation.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();

        let defaults = IntegratorConfig::default();
        let integrator = IntegratorConfig {
            temperature_kelvin: simulation.temperature.unwrap_or(defaults.temperature_kelvin),
            friction_per_ps: simulation.friction.unwrap_or(defaults.friction_per_ps),
            timestep_ps: simulation.timestep.unwrap_or(defaults.timestep_ps),
            minimization_steps: simulation
                .minimization_steps
                .unwrap_or(defaults.minimization_steps),
        };

        let mut builder = SimulationConfigBuilder::new()
            .integrator(integrator)
            .solvate(!args.no_solvent && simulation.solvate.unwrap_or(true))
            .seed(args.seed.or(simulation.seed));
        builder = apply(builder, sheet.height, SimulationConfigBuilder::height);
        builder = apply(builder, sheet.width, SimulationConfigBuilder::width);
        builder = apply(builder, sheet.l_count, SimulationConfigBuilder::l_count);
        builder = apply(builder, sheet.base_spacing, SimulationConfigBuilder::base_spacing);
        builder = apply(builder, sheet.sugar_spacing, SimulationConfigBuilder::sugar_spacing);
        builder = apply(builder, molecules.d_sugar, SimulationConfigBuilder::d_sugar);
        builder = apply(builder, molecules.l_sugar, SimulationConfigBuilder::l_sugar);
        builder = apply(builder, molecules.guanine, SimulationConfigBuilder::guanine);
        builder = apply(builder, molecules.cytosine, SimulationConfigBuilder::cytosine);
        builder = apply(builder, simulation.steps, SimulationConfigBuilder::steps);
        builder = apply(
            builder,
            simulation.report_interval,
            SimulationConfigBuilder::report_interval,
        );
        builder = apply(
            builder,
            simulation.restraint_constant,
            SimulationConfigBuilder::restraint_constant,
        );
        builder = apply(
            builder,
            args.runs.or(simulation.runs),
            SimulationConfigBuilder::jobs,
        );
        builder = apply(
            builder,
            args.processes.or(simulation.processes),
            SimulationConfigBuilder::processes,
        );
        builder = apply(builder, simulation.devices, SimulationConfigBuilder::devices);
        builder = apply(
            builder,
            args.output_dir.clone().or(output.dir),
            SimulationConfigBuilder::output_dir,
        );

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for assignment in set_values {
            let (key, value) = split(assignment)?;
            let sheet = || PartialSheetSection::default();
            let simulation = || PartialSimulationSection::default();
            match key {
                "sheet.height" => {
                    self.sheet.get_or_insert_with(sheet).height = parsed(key, value, "integer")?
                }
                "sheet.width" => {
                    self.sheet.get_or_insert_with(sheet).width = parsed(key, value, "integer")?
                }
                "sheet.l-count" => {
                    self.sheet.get_or_insert_with(sheet).l_count = parsed(key, value, "integer")?
                }
                "sheet.base-spacing" => {
                    self.sheet.get_or_insert_with(sheet).base_spacing =
                        parsed(key, value, "float")?
                }
                "sheet.sugar-spacing" => {
                    self.sheet.get_or_insert_with(sheet).sugar_spacing =
                        parsed(key, value, "float")?
                }
                "molecules.d-sugar" | "molecules.l-sugar" | "molecules.guanine"
                | "molecules.cytosine" => {
                    let molecules = self.molecules.get_or_insert_with(Default::default);
                    let path = Some(value.into());
                    match key {
                        "molecules.d-sugar" => molecules.d_sugar = path,
                        "molecules.l-sugar" => molecules.l_sugar = path,
                        "molecules.guanine" => molecules.guanine = path,
                        _ => molecules.cytosine = path,
                    }
                }
                "simulation.steps" => {
                    self.simulation.get_or_insert_with(simulation).steps =
                        parsed(key, value, "integer")?
                }
                "simulation.report-interval" => {
                    self.simulation.get_or_insert_with(simulation).report_interval =
                        parsed(key, value, "integer")?
                }
                "simulation.runs" => {
                    self.simulation.get_or_insert_with(simulation).runs =
                        parsed(key, value, "integer")?
                }
                "simulation.processes" => {
                    self.simulation.get_or_insert_with(simulation).processes =
                        parsed(key, value, "integer")?
                }
                "simulation.devices" => {
                    self.simulation.get_or_insert_with(simulation).devices =
                        parsed(key, value, "integer")?
                }
                "simulation.seed" => {
                    self.simulation.get_or_insert_with(simulation).seed =
                        parsed(key, value, "integer")?
                }
                "simulation.solvate" => {
                    self.simulation.get_or_insert_with(simulation).solvate =
                        parsed(key, value, "boolean")?
                }
                "simulation.restraint-constant" => {
                    self.simulation.get_or_insert_with(simulation).restraint_constant =
                        parsed(key, value, "float")?
                }
                "simulation.temperature" => {
                    self.simulation.get_or_insert_with(simulation).temperature =
                        parsed(key, value, "float")?
                }
                "simulation.friction" => {
                    self.simulation.get_or_insert_with(simulation).friction =
                        parsed(key, value, "float")?
                }
                "simulation.timestep" => {
                    self.simulation.get_or_insert_with(simulation).timestep =
                        parsed(key, value, "float")?
                }
                "simulation.minimization-steps" => {
                    self.simulation.get_or_insert_with(simulation).minimization_steps =
                        parsed(key, value, "integer")?
                }
                "output.dir" => {
                    self.output.get_or_insert_with(Default::default).dir = Some(value.into())
                }
                "output.verbose" => {
                    self.output.get_or_insert_with(Default::default).verbose =
                        parsed(key, value, "boolean")?
                }
                _ => return Err(unsupported(key)),
            }
        }
        Ok(())
    }
}

/// An analysis config file as written, before CLI overrides and validation.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAnalysisConfig {
    input: Option<PartialInputSection>,
    analysis: Option<PartialAnalysisSection>,
    output: Option<PartialOutputSection>,
}

impl PartialAnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        load_toml(path)
    }

    pub fn verbose(&self) -> Result<bool> {
        required_verbose(self.output.as_ref())
    }

    pub fn merge_with_cli(mut self, args: &AnalyzeArgs) -> Result<core_config::AnalysisConfig> {
        self.apply_set_values(&args.set_values)?;

        let input = self.input.take().unwrap_or_default();
        let analysis = self.analysis.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();

        let selection_defaults = ObservableSelection::default();
        let observables = ObservableSelection {
            heights: analysis.heights.unwrap_or(selection_defaults.heights),
            hydrogen_bonds: analysis
                .hydrogen_bonds
                .unwrap_or(selection_defaults.hydrogen_bonds),
            nematic_order: analysis
                .nematic_order
                .unwrap_or(selection_defaults.nematic_order),
            sasa: analysis.sasa.unwrap_or(selection_defaults.sasa),
        };
        let criteria_defaults = HydrogenBondCriteria::default();
        let hydrogen_bonds = HydrogenBondCriteria {
            distance_cutoff: analysis
                .hbond_distance
                .unwrap_or(criteria_defaults.distance_cutoff),
            angle_cutoff_degrees: analysis
                .hbond_angle
                .unwrap_or(criteria_defaults.angle_cutoff_degrees),
        };
        let sasa_defaults = SasaParameters::default();
        let sasa = SasaParameters {
            probe_radius: analysis.probe_radius.unwrap_or(sasa_defaults.probe_radius),
            sphere_points: analysis.sphere_points.unwrap_or(sasa_defaults.sphere_points),
        };

        let mut builder = AnalysisConfigBuilder::new()
            .observables(observables)
            .hydrogen_bonds(hydrogen_bonds)
            .sasa(sasa);
        builder = apply(
            builder,
            args.input_dir.clone().or(input.dir),
            AnalysisConfigBuilder::input_dir,
        );
        builder = apply(
            builder,
            args.output_dir.clone().or(output.dir),
            AnalysisConfigBuilder::output_dir,
        );
        builder = apply(builder, args.runs.or(input.runs), AnalysisConfigBuilder::runs);
        builder = apply(builder, input.l_count, AnalysisConfigBuilder::l_count);
        builder = apply(builder, input.steps, AnalysisConfigBuilder::steps);
        builder = apply(builder, analysis.chunk_size, AnalysisConfigBuilder::chunk_size);
        builder = apply(
            builder,
            analysis.frame_interval_ns,
            AnalysisConfigBuilder::frame_interval_ns,
        );
        builder = apply(builder, analysis.kde_points, AnalysisConfigBuilder::kde_points);

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for assignment in set_values {
            let (key, value) = split(assignment)?;
            let input = || PartialInputSection::default();
            let analysis = || PartialAnalysisSection::default();
            match key {
                "input.dir" => self.input.get_or_insert_with(input).dir = Some(value.into()),
                "input.runs" => {
                    self.input.get_or_insert_with(input).runs = parsed(key, value, "integer")?
                }
                "input.l-count" => {
                    self.input.get_or_insert_with(input).l_count = parsed(key, value, "integer")?
                }
                "input.steps" => {
                    self.input.get_or_insert_with(input).steps = parsed(key, value, "integer")?
                }
                "analysis.chunk-size" => {
                    self.analysis.get_or_insert_with(analysis).chunk_size =
                        parsed(key, value, "integer")?
                }
                "analysis.frame-interval-ns" => {
                    self.analysis.get_or_insert_with(analysis).frame_interval_ns =
                        parsed(key, value, "float")?
                }
                "analysis.kde-points" => {
                    self.analysis.get_or_insert_with(analysis).kde_points =
                        parsed(key, value, "integer")?
                }
                "analysis.heights" => {
                    self.analysis.get_or_insert_with(analysis).heights =
                        parsed(key, value, "boolean")?
                }
                "analysis.hydrogen-bonds" => {
                    self.analysis.get_or_insert_with(analysis).hydrogen_bonds =
                        parsed(key, value, "boolean")?
                }
                "analysis.nematic-order" => {
                    self.analysis.get_or_insert_with(analysis).nematic_order =
                        parsed(key, value, "boolean")?
                }
                "analysis.sasa" => {
                    self.analysis.get_or_insert_with(analysis).sasa =
                        parsed(key, value, "boolean")?
                }
                "analysis.hbond-distance" => {
                    self.analysis.get_or_insert_with(analysis).hbond_distance =
                        parsed(key, value, "float")?
                }
                "analysis.hbond-angle" => {
                    self.analysis.get_or_insert_with(analysis).hbond_angle =
                        parsed(key, value, "float")?
                }
                "analysis.probe-radius" => {
                    self.analysis.get_or_insert_with(analysis).probe_radius =
                        parsed(key, value, "float")?
                }
                "analysis.sphere-points" => {
                    self.analysis.get_or_insert_with(analysis).sphere_points =
                        parsed(key, value, "integer")?
                }
                "output.dir" => {
                    self.output.get_or_insert_with(Default::default).dir = Some(value.into())
                }
                "output.verbose" => {
                    self.output.get_or_insert_with(Default::default).verbose =
                        parsed(key, value, "boolean")?
                }
                _ => return Err(unsupported(key)),
            }
        }
        Ok(())
    }
}
