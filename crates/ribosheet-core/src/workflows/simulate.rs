use super::error::WorkflowError;
use crate::core::io::dcd::DcdWriter;
use crate::core::io::naming::RunFiles;
use crate::core::io::pdb::{PdbFile, PdbStructure};
use crate::core::io::traits::StructureFile;
use crate::core::models::frame::PeriodicBox;
use crate::core::models::ids::TemplateId;
use crate::core::models::system::{AssembledSystem, IndexRange, Segment};
use crate::core::models::template::{MoleculeTemplate, TemplateLibrary};
use crate::core::models::topology::Topology;
use crate::engine::assembly::{PlacementSite, build_random_sheet, build_regular_sheet};
use crate::engine::config::{MoleculeSources, SimulationConfig};
use crate::engine::error::SimulationError;
use crate::engine::presets::{
    self, CYTOSINE_RESIDUE, D_SUGAR_RESIDUE, GUANINE_RESIDUE, L_SUGAR_RESIDUE,
};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::restraints::{RestraintSet, build_position_restraints};
use crate::engine::simulation::{
    EngineFactory, EngineInput, EngineState, SimulationEngine, StateReport, TrajectoryObserver,
    run_with_reporting,
};
use crate::engine::solvation::{SolventParameters, solvate};
use crate::engine::utils::sampling::{job_seed, seeded_rng};
use nalgebra::Point3;
use rand::{Rng, RngCore};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, instrument};

/// The four molecule templates of a monolayer, loaded once and shared by every job.
#[derive(Debug, Clone)]
pub struct MonolayerTemplates {
    library: TemplateLibrary,
    d_sugar: TemplateId,
    l_sugar: TemplateId,
    guanine: TemplateId,
    cytosine: TemplateId,
}

impl MonolayerTemplates {
    /// Reads one SDF per molecule and names its residue after the molecule's role.
    pub fn load(sources: &MoleculeSources) -> Result<Self, WorkflowError> {
        let load = |path: &Path, residue: &'static str| {
            MoleculeTemplate::from_sdf(path, residue).map_err(|source| WorkflowError::TemplateLoad {
                residue,
                path: path.to_path_buf(),
                source,
            })
        };
        Ok(Self::from_templates(
            load(&sources.d_sugar, D_SUGAR_RESIDUE)?,
            load(&sources.l_sugar, L_SUGAR_RESIDUE)?,
            load(&sources.guanine, GUANINE_RESIDUE)?,
            load(&sources.cytosine, CYTOSINE_RESIDUE)?,
        ))
    }

    pub fn from_templates(
        d_sugar: MoleculeTemplate,
        l_sugar: MoleculeTemplate,
        guanine: MoleculeTemplate,
        cytosine: MoleculeTemplate,
    ) -> Self {
        let mut library = TemplateLibrary::new();
        Self {
            d_sugar: library.insert(d_sugar),
            l_sugar: library.insert(l_sugar),
            guanine: library.insert(guanine),
            cytosine: library.insert(cytosine),
            library,
        }
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    fn pair(&self, first: TemplateId, second: TemplateId) -> Result<[&MoleculeTemplate; 2], WorkflowError> {
        let get = |id| self.library.get(id).ok_or(WorkflowError::MissingTemplate(id));
        Ok([get(first)?, get(second)?])
    }
}

/// A fully built, restrained and boxed system ready for a backend.
#[derive(Debug, Clone)]
pub struct PreparedSystem {
    pub topology: Topology,
    pub positions: Vec<Point3<f64>>,
    pub manifest: Vec<IndexRange>,
    pub restraints: RestraintSet,
    pub periodic_box: PeriodicBox,
    pub sites: Vec<PlacementSite>,
}

/// Assembles base wall, sugar layer and optional solvent, then restrains the base wall.
#[instrument(level = "debug", skip_all, fields(height = config.sheet.height, width = config.sheet.width))]
pub fn build_system(
    config: &SimulationConfig,
    templates: &MonolayerTemplates,
    rng: &mut impl Rng,
) -> Result<PreparedSystem, WorkflowError> {
    let sheet = &config.sheet;
    let mut system = AssembledSystem::new();

    let bases = templates.pair(templates.guanine, templates.cytosine)?;
    let base_poses = vec![
        presets::guanine_conformer(bases[0]),
        presets::cytosine_conformer(bases[1]),
    ];
    let (rows, columns) = presets::base_wall_shape(sheet);
    let wall = build_regular_sheet(
        &mut system,
        rows,
        columns,
        &bases,
        &base_poses,
        sheet.base_spacing,
    )?;
    system.record_segment(Segment::BaseSheet, wall)?;

    let sugars = templates.pair(templates.d_sugar, templates.l_sugar)?;
    let sugar_poses: Vec<_> = sugars.iter().map(|t| presets::sugar_conformer(t)).collect();
    let (layer, sites) = build_random_sheet(
        &mut system,
        sheet.height,
        sheet.width,
        &sugars,
        &sugar_poses,
        sheet.l_count,
        sheet.sugar_spacing,
        rng,
    )?;
    system.record_segment(Segment::SugarLayer, layer)?;

    let restrained: Vec<_> = system
        .segments(Segment::BaseSheet)
        .map(IndexRange::indices)
        .collect();
    let restraints =
        build_position_restraints(&restrained, system.positions(), config.restraint_constant)?;

    if config.solvate {
        let water = solvate(
            &mut system,
            &presets::solvent_region(sheet),
            &SolventParameters::default(),
        )?;
        system.record_segment(Segment::Solvent, water)?;
    }

    let (topology, positions, manifest) = system.into_parts();
    info!(
        atoms = topology.atom_count(),
        residues = topology.residue_count(),
        restrained = restraints.len(),
        "System assembled."
    );
    Ok(PreparedSystem {
        topology,
        positions,
        manifest,
        restraints,
        periodic_box: presets::simulation_box(sheet),
        sites,
    })
}

const STATE_HEADER: [&str; 4] = [
    "step",
    "potential_energy_kj_mol",
    "temperature_k",
    "speed_ns_per_day",
];

#[derive(Serialize)]
struct StateRow {
    step: u64,
    potential_energy_kj_mol: f64,
    temperature_k: f64,
    speed_ns_per_day: f64,
}

impl From<&StateReport> for StateRow {
    fn from(report: &StateReport) -> Self {
        Self {
            step: report.step,
            potential_energy_kj_mol: report.potential_energy,
            temperature_k: report.temperature,
            speed_ns_per_day: report.speed_ns_per_day,
        }
    }
}

/// Writes every reported frame to the trajectory and a state line to the CSV report.
struct JobOutputs {
    trajectory: DcdWriter<BufWriter<File>>,
    state: csv::Writer<File>,
}

impl JobOutputs {
    fn create(dir: &Path, files: &RunFiles, atom_count: usize, config: &SimulationConfig) -> Result<Self, SimulationError> {
        let trajectory = DcdWriter::create(
            files.trajectory_dcd(dir),
            atom_count,
            u32::try_from(config.report_interval).unwrap_or(u32::MAX),
            config.integrator.timestep_ps as f32,
        )?;
        // Rows serialize without headers; the header line is always present.
        let mut state = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(files.state_csv(dir))?;
        state.write_record(STATE_HEADER)?;
        Ok(Self { trajectory, state })
    }

    fn finish(self) -> Result<(), SimulationError> {
        self.trajectory.finish()?;
        let mut state = self.state;
        state.flush()?;
        Ok(())
    }
}

impl TrajectoryObserver for JobOutputs {
    fn observe(
        &mut self,
        report: &StateReport,
        positions: &[Point3<f64>],
        periodic_box: &PeriodicBox,
    ) -> Result<(), SimulationError> {
        self.trajectory.write_frame(positions, Some(periodic_box))?;
        self.state.serialize(StateRow::from(report))?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JobSummary {
    pub job: usize,
    pub device: usize,
    pub atoms: usize,
    pub minimized_energy: f64,
    pub reports: u64,
    pub final_state: EngineState,
    pub files: RunFiles,
}

/// Builds, minimizes and runs one job, writing its topology, trajectory and state report.
#[instrument(skip_all, name = "simulation_job", fields(job = job))]
pub fn run_job<F: EngineFactory>(
    job: usize,
    config: &SimulationConfig,
    templates: &MonolayerTemplates,
    factory: &F,
    reporter: &ProgressReporter,
) -> Result<JobSummary, WorkflowError> {
    // === Phase 1: Assembly ===
    reporter.report(Progress::PhaseStart { name: "Assembly" });
    let mut rng = seeded_rng(config.seed.map(|seed| job_seed(seed, job)));
    let prepared = build_system(config, templates, &mut rng)?;
    reporter.report(Progress::PhaseFinish);

    fs::create_dir_all(&config.output_dir)?;
    let files = config.run_files(job);
    let structure = PdbStructure {
        topology: prepared.topology,
        positions: prepared.positions,
        periodic_box: Some(prepared.periodic_box),
    };
    PdbFile::write_to_path(&structure, files.topology_pdb(&config.output_dir))
        .map_err(SimulationError::from)?;

    // === Phase 2: Minimization ===
    reporter.report(Progress::PhaseStart {
        name: "Minimization",
    });
    let device = config.device_for(job);
    let atoms = structure.topology.atom_count();
    let mut engine = factory.create(EngineInput {
        job,
        device,
        topology: structure.topology,
        positions: structure.positions,
        restraints: prepared.restraints,
        periodic_box: prepared.periodic_box,
        integrator: config.integrator.clone(),
        seed: rng.next_u64(),
    })?;
    let minimized_energy = engine.minimize(config.integrator.minimization_steps)?;
    info!(energy = minimized_energy, "Energy minimized.");
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Production ===
    reporter.report(Progress::PhaseStart { name: "Production" });
    let mut outputs = JobOutputs::create(&config.output_dir, &files, atoms, config)?;
    let reports = run_with_reporting(
        &mut engine,
        config.steps,
        config.report_interval,
        &mut outputs,
        reporter,
    )?;
    outputs.finish()?;
    reporter.report(Progress::PhaseFinish);

    let final_state = engine.state();
    info!(
        reports,
        steps = final_state.step,
        temperature = final_state.temperature,
        "Job finished."
    );
    Ok(JobSummary {
        job,
        device,
        atoms,
        minimized_energy,
        reports,
        final_state,
        files,
    })
}
