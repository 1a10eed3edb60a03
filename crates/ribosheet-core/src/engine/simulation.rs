use super::config::IntegratorConfig;
use super::error::SimulationError;
use super::progress::{Progress, ProgressReporter};
use super::restraints::RestraintSet;
use crate::core::models::frame::PeriodicBox;
use crate::core::models::topology::Topology;
use nalgebra::Point3;
use std::time::Instant;
use tracing::{debug, trace};

/// Everything a physics backend receives for one job.
#[derive(Debug, Clone)]
pub struct EngineInput {
    pub job: usize,
    pub device: usize,
    pub topology: Topology,
    pub positions: Vec<Point3<f64>>,
    pub restraints: RestraintSet,
    pub periodic_box: PeriodicBox,
    pub integrator: IntegratorConfig,
    pub seed: u64,
}

/// Instantaneous thermodynamic state of an engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineState {
    pub step: u64,
    pub time_ps: f64,
    /// kJ/mol
    pub potential_energy: f64,
    /// kJ/mol
    pub kinetic_energy: f64,
    /// K
    pub temperature: f64,
}

/// One line of the per-job state report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateReport {
    pub step: u64,
    pub potential_energy: f64,
    pub temperature: f64,
    pub speed_ns_per_day: f64,
}

/// A physics backend. Force fields, integrators and devices live behind this seam.
pub trait SimulationEngine {
    /// Minimizes the potential energy and returns the final value in kJ/mol.
    fn minimize(&mut self, max_iterations: usize) -> Result<f64, SimulationError>;

    fn step(&mut self, steps: u64) -> Result<(), SimulationError>;

    fn positions(&self) -> &[Point3<f64>];

    fn periodic_box(&self) -> &PeriodicBox;

    fn state(&self) -> EngineState;
}

/// Creates one engine per job; shared by every worker of a run.
pub trait EngineFactory: Send + Sync {
    type Engine: SimulationEngine;

    fn create(&self, input: EngineInput) -> Result<Self::Engine, SimulationError>;
}

/// Receives every reported frame while the engine steps.
pub trait TrajectoryObserver {
    fn observe(
        &mut self,
        report: &StateReport,
        positions: &[Point3<f64>],
        periodic_box: &PeriodicBox,
    ) -> Result<(), SimulationError>;
}

/// Advances `engine` by `steps`, handing a report to `observer` every `report_interval` steps.
///
/// Returns the number of reports delivered.
pub fn run_with_reporting(
    engine: &mut impl SimulationEngine,
    steps: u64,
    report_interval: u64,
    observer: &mut impl TrajectoryObserver,
    reporter: &ProgressReporter,
) -> Result<u64, SimulationError> {
    if report_interval == 0 {
        return Err(SimulationError::InvalidInput(
            "report interval must be at least one step".into(),
        ));
    }
    let reports = steps / report_interval;
    reporter.report(Progress::TaskStart {
        total_steps: reports,
    });

    let mut last_wall = Instant::now();
    let mut last_time_ps = engine.state().time_ps;
    for _ in 0..reports {
        engine.step(report_interval)?;
        let state = engine.state();
        let elapsed_days = last_wall.elapsed().as_secs_f64() / 86_400.0;
        let simulated_ns = (state.time_ps - last_time_ps) / 1000.0;
        let report = StateReport {
            step: state.step,
            potential_energy: state.potential_energy,
            temperature: state.temperature,
            speed_ns_per_day: if elapsed_days > 0.0 {
                simulated_ns / elapsed_days
            } else {
                0.0
            },
        };
        trace!(step = report.step, energy = report.potential_energy, "State reported.");
        observer.observe(&report, engine.positions(), engine.periodic_box())?;
        reporter.report(Progress::TaskIncrement);
        last_wall = Instant::now();
        last_time_ps = state.time_ps;
    }

    let remainder = steps % report_interval;
    if remainder > 0 {
        engine.step(remainder)?;
    }
    reporter.report(Progress::TaskFinish);
    debug!(steps, reports, "Stepping finished.");
    Ok(reports)
}
