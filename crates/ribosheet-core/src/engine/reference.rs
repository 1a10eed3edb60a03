//! A minimal physics backend: harmonic position restraints plus a Langevin thermostat.
//!
//! There is no force field. Unrestrained atoms undergo thermostatted free diffusion, which is
//! enough to exercise the full pipeline end to end.

use super::config::IntegratorConfig;
use super::error::SimulationError;
use super::restraints::RestraintSet;
use super::simulation::{EngineFactory, EngineInput, EngineState, SimulationEngine};
use crate::core::models::frame::PeriodicBox;
use nalgebra::{Point3, Vector3};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand_distr::StandardNormal;
use tracing::{debug, instrument};

/// kJ/mol/K
const BOLTZMANN: f64 = 0.008_314_462_618;
/// (kJ/mol/Å)/amu expressed in Å/ps².
const FORCE_TO_ACCELERATION: f64 = 100.0;
const MINIMIZATION_FORCE_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, Default)]
pub struct RestraintLangevinFactory;

impl EngineFactory for RestraintLangevinFactory {
    type Engine = RestraintLangevinEngine;

    fn create(&self, input: EngineInput) -> Result<Self::Engine, SimulationError> {
        RestraintLangevinEngine::new(input)
    }
}

pub struct RestraintLangevinEngine {
    positions: Vec<Point3<f64>>,
    velocities: Vec<Vector3<f64>>,
    forces: Vec<Vector3<f64>>,
    masses: Vec<f64>,
    restraints: RestraintSet,
    periodic_box: PeriodicBox,
    integrator: IntegratorConfig,
    rng: StdRng,
    step: u64,
}

impl RestraintLangevinEngine {
    #[instrument(level = "debug", skip_all, fields(job = input.job, device = input.device))]
    pub fn new(input: EngineInput) -> Result<Self, SimulationError> {
        let n = input.positions.len();
        if input.topology.atom_count() != n {
            return Err(SimulationError::InvalidInput(format!(
                "topology has {} atoms but {} positions were given",
                input.topology.atom_count(),
                n
            )));
        }
        if let Some((i, _)) = input.restraints.anchors().iter().find(|(i, _)| *i >= n) {
            return Err(SimulationError::InvalidInput(format!(
                "restraint on atom {i} outside the {n}-atom system"
            )));
        }
        if !input.periodic_box.is_valid() {
            return Err(SimulationError::InvalidInput(format!(
                "invalid periodic box {:?}",
                input.periodic_box
            )));
        }

        let masses: Vec<f64> = input
            .topology
            .atoms()
            .iter()
            .map(|a| a.element.mass())
            .collect();
        let mut engine = Self {
            positions: input.positions,
            velocities: vec![Vector3::zeros(); n],
            forces: vec![Vector3::zeros(); n],
            masses,
            restraints: input.restraints,
            periodic_box: input.periodic_box,
            integrator: input.integrator,
            rng: StdRng::seed_from_u64(input.seed),
            step: 0,
        };
        engine.randomize_velocities();
        engine.update_forces();
        debug!(atoms = n, "Reference engine initialized.");
        Ok(engine)
    }

    fn thermal_speed(&self, mass: f64) -> f64 {
        (BOLTZMANN * self.integrator.temperature_kelvin * FORCE_TO_ACCELERATION / mass).sqrt()
    }

    fn randomize_velocities(&mut self) {
        for i in 0..self.velocities.len() {
            let sigma = self.thermal_speed(self.masses[i]);
            self.velocities[i] = Vector3::new(
                self.rng.sample::<f64, _>(StandardNormal),
                self.rng.sample::<f64, _>(StandardNormal),
                self.rng.sample::<f64, _>(StandardNormal),
            ) * sigma;
        }
    }

    fn update_forces(&mut self) {
        self.forces.iter_mut().for_each(|f| *f = Vector3::zeros());
        self.restraints.apply_forces(&self.positions, &mut self.forces);
    }

    fn kinetic_energy(&self) -> f64 {
        self.velocities
            .iter()
            .zip(&self.masses)
            .map(|(v, m)| 0.5 * m * v.norm_squared())
            .sum::<f64>()
            / FORCE_TO_ACCELERATION
    }

    fn kick(&mut self, dt: f64) {
        for ((v, f), m) in self.velocities.iter_mut().zip(&self.forces).zip(&self.masses) {
            *v += f * (dt * FORCE_TO_ACCELERATION / m);
        }
    }

    fn drift(&mut self, dt: f64) {
        for (x, v) in self.positions.iter_mut().zip(&self.velocities) {
            *x += v * dt;
        }
    }

    fn thermostat(&mut self, dt: f64) {
        let a = (-self.integrator.friction_per_ps * dt).exp();
        let b = (1.0 - a * a).sqrt();
        for i in 0..self.velocities.len() {
            let sigma = self.thermal_speed(self.masses[i]);
            let noise = Vector3::new(
                self.rng.sample::<f64, _>(StandardNormal),
                self.rng.sample::<f64, _>(StandardNormal),
                self.rng.sample::<f64, _>(StandardNormal),
            );
            self.velocities[i] = self.velocities[i] * a + noise * (b * sigma);
        }
    }
}

impl SimulationEngine for RestraintLangevinEngine {
    fn minimize(&mut self, max_iterations: usize) -> Result<f64, SimulationError> {
        let mut energy = self.restraints.energy(&self.positions);
        let mut step_size = 0.01;
        for _ in 0..max_iterations {
            self.update_forces();
            let max_force = self
                .forces
                .iter()
                .map(|f| f.norm())
                .fold(0.0, f64::max);
            if max_force < MINIMIZATION_FORCE_TOLERANCE {
                break;
            }
            let previous = self.positions.clone();
            for (x, f) in self.positions.iter_mut().zip(&self.forces) {
                *x += f * (step_size / max_force);
            }
            let trial = self.restraints.energy(&self.positions);
            if trial < energy {
                energy = trial;
                step_size *= 1.2;
            } else {
                self.positions = previous;
                step_size *= 0.5;
            }
        }
        self.update_forces();
        Ok(energy)
    }

    // BAOAB splitting of the Langevin equation.
    fn step(&mut self, steps: u64) -> Result<(), SimulationError> {
        let dt = self.integrator.timestep_ps;
        for _ in 0..steps {
            self.kick(0.5 * dt);
            self.drift(0.5 * dt);
            self.thermostat(dt);
            self.drift(0.5 * dt);
            self.update_forces();
            self.kick(0.5 * dt);
            self.step += 1;
        }
        if self
            .positions
            .iter()
            .any(|p| !p.iter().all(|c| c.is_finite()))
        {
            return Err(SimulationError::Engine {
                step: self.step,
                reason: "positions became non-finite".into(),
            });
        }
        Ok(())
    }

    fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    fn periodic_box(&self) -> &PeriodicBox {
        &self.periodic_box
    }

    fn state(&self) -> EngineState {
        let kinetic_energy = self.kinetic_energy();
        let dof = 3 * self.positions.len();
        EngineState {
            step: self.step,
            time_ps: self.step as f64 * self.integrator.timestep_ps,
            potential_energy: self.restraints.energy(&self.positions),
            kinetic_energy,
            temperature: if dof > 0 {
                2.0 * kinetic_energy / (dof as f64 * BOLTZMANN)
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Element;
    use crate::core::models::topology::Topology;
    use crate::engine::restraints::build_position_restraints;

    fn input(atoms: usize, restrained: usize, seed: u64) -> EngineInput {
        let mut topology = Topology::new();
        for _ in 0..atoms {
            topology.add_residue("HOH", [("O", Element::O)]);
        }
        let positions: Vec<_> = (0..atoms)
            .map(|i| Point3::new(i as f64 * 3.0, 0.0, 0.0))
            .collect();
        let restraints = build_position_restraints(&[0..restrained], &positions, 100.0).unwrap();
        EngineInput {
            job: 0,
            device: 0,
            topology,
            positions,
            restraints,
            periodic_box: PeriodicBox::new(50.0, 50.0, 50.0),
            integrator: IntegratorConfig::default(),
            seed,
        }
    }

    #[test]
    fn same_seed_gives_identical_trajectories() {
        let mut a = RestraintLangevinEngine::new(input(4, 2, 3)).unwrap();
        let mut b = RestraintLangevinEngine::new(input(4, 2, 3)).unwrap();
        a.step(50).unwrap();
        b.step(50).unwrap();
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.state().step, 50);
    }

    #[test]
    fn restrained_atoms_stay_near_their_anchors() {
        let mut engine = RestraintLangevinEngine::new(input(3, 3, 9)).unwrap();
        engine.step(500).unwrap();
        for (i, p) in engine.positions().iter().enumerate() {
            let anchor = Point3::new(i as f64 * 3.0, 0.0, 0.0);
            assert!((p - anchor).norm() < 1.5, "atom {i} drifted to {p:?}");
        }
    }

    #[test]
    fn thermostat_holds_temperature_near_target() {
        let mut engine = RestraintLangevinEngine::new(input(200, 0, 17)).unwrap();
        engine.step(200).unwrap();
        let temperature = engine.state().temperature;
        assert!((temperature - 300.0).abs() < 60.0, "temperature {temperature}");
    }

    #[test]
    fn initial_velocities_follow_maxwell_boltzmann() {
        let engine = RestraintLangevinEngine::new(input(2000, 0, 23)).unwrap();
        let sigma = engine.thermal_speed(Element::O.mass());
        let components: Vec<f64> = engine
            .velocities
            .iter()
            .flat_map(|v| [v.x, v.y, v.z])
            .map(|c| c / sigma)
            .collect();
        let n = components.len() as f64;
        let mean = components.iter().sum::<f64>() / n;
        let var = components.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }

    #[test]
    fn minimize_relaxes_displaced_restraints() {
        let mut config = input(2, 2, 1);
        config.positions[1].y += 0.5;
        let restraints =
            build_position_restraints(&[0..2], &input(2, 2, 1).positions, 100.0).unwrap();
        config.restraints = restraints;
        let mut engine = RestraintLangevinEngine::new(config).unwrap();
        let before = engine.state().potential_energy;
        let after = engine.minimize(200).unwrap();
        assert!(before > 20.0);
        assert!(after < 1e-3);
    }

    #[test]
    fn mismatched_input_is_rejected() {
        let mut config = input(2, 0, 1);
        config.positions.pop();
        assert!(matches!(
            RestraintLangevinEngine::new(config),
            Err(SimulationError::InvalidInput(_))
        ));
    }
}
