use super::aggregate::{EnantiomerPair, RunObservables};
use super::contacts::{ContactSeries, classify_frame};
use super::error::AnalysisError;
use super::hbonds::{BakerHubbard, HydrogenBondDetector};
use super::heights::HeightExtractor;
use super::order::NematicOrder;
use super::sasa::SasaExtractor;
use super::trajectory::RunTrajectory;
use crate::core::models::frame::Frame;
use crate::core::models::residue::Enantiomer;
use crate::core::models::topology::Topology;
use crate::engine::config::AnalysisConfig;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info, instrument};

/// The selected per-frame extractors of one topology.
pub struct RunAnalyzer {
    heights: EnantiomerPair<Option<HeightExtractor>>,
    order: EnantiomerPair<Option<NematicOrder>>,
    sasa: EnantiomerPair<Option<SasaExtractor>>,
    hydrogen_bonds: Option<BakerHubbard>,
}

impl RunAnalyzer {
    pub fn new(topology: &Topology, config: &AnalysisConfig) -> Self {
        let selected = &config.observables;
        Self {
            heights: EnantiomerPair::from_fn(|e| {
                selected
                    .heights
                    .then(|| HeightExtractor::new(topology, e))
                    .flatten()
            }),
            order: EnantiomerPair::from_fn(|e| {
                selected
                    .nematic_order
                    .then(|| NematicOrder::new(topology, e))
                    .flatten()
            }),
            sasa: EnantiomerPair::from_fn(|e| {
                selected
                    .sasa
                    .then(|| SasaExtractor::new(topology, e, &config.sasa))
                    .flatten()
            }),
            hydrogen_bonds: selected
                .hydrogen_bonds
                .then(|| BakerHubbard::new(topology, &config.hydrogen_bonds)),
        }
    }

    /// Fresh accumulators for the observables this analyzer will fill.
    pub fn observables(&self, run: usize, topology: &Topology) -> RunObservables {
        let mut observables = RunObservables::new(run, topology);
        for e in Enantiomer::ALL {
            *observables.heights.get_mut(e) = self.heights.get(e).as_ref().map(|_| Vec::new());
            *observables.nematic_order.get_mut(e) = self.order.get(e).as_ref().map(|_| Vec::new());
            *observables.sasa.get_mut(e) = self.sasa.get(e).as_ref().map(|_| Vec::new());
        }
        observables.contacts = self.hydrogen_bonds.as_ref().map(|_| ContactSeries::default());
        observables
    }

    pub fn process(&self, topology: &Topology, frame: &Frame, observables: &mut RunObservables) {
        for e in Enantiomer::ALL {
            if let (Some(extractor), Some(samples)) =
                (self.heights.get(e), observables.heights.get_mut(e))
            {
                samples.extend(extractor.extract(frame));
            }
            if let (Some(extractor), Some(series)) =
                (self.order.get(e), observables.nematic_order.get_mut(e))
            {
                series.push(extractor.extract(frame));
            }
            if let (Some(extractor), Some(samples)) = (self.sasa.get(e), observables.sasa.get_mut(e)) {
                samples.extend(extractor.extract(frame));
            }
        }

        if let (Some(detector), Some(series)) = (&self.hydrogen_bonds, observables.contacts.as_mut()) {
            let bonds = detector.detect(frame);
            series.push(classify_frame(topology, &bonds, &mut observables.tally));
        }

        observables.frames += 1;
    }
}

/// Streams every frame of one run through the selected extractors.
#[instrument(skip_all, name = "analyze_run", fields(run = run))]
pub fn analyze_run(
    config: &AnalysisConfig,
    run: usize,
    reporter: &ProgressReporter,
) -> Result<RunObservables, AnalysisError> {
    let files = config.run_files(run);
    let mut trajectory = RunTrajectory::open(&config.input_dir, files)?;
    let topology = trajectory.topology().clone();
    let analyzer = RunAnalyzer::new(&topology, config);
    let mut observables = analyzer.observables(run, &topology);

    reporter.report(Progress::TaskStart {
        total_steps: trajectory.declared_frames() as u64,
    });
    while let Some(chunk) = trajectory.next_chunk(config.chunk_size)? {
        for frame in &chunk {
            analyzer.process(&topology, frame, &mut observables);
        }
        debug!(frames = observables.frames, "Processed trajectory chunk.");
        reporter.advance(chunk.len() as u64);
    }
    reporter.report(Progress::TaskFinish);

    info!(
        frames = observables.frames,
        d_sugars = observables.residue_counts.d,
        l_sugars = observables.residue_counts.l,
        "Run analyzed."
    );
    Ok(observables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Element;
    use crate::core::models::topology::BondOrder;
    use crate::engine::config::{AnalysisConfigBuilder, ObservableSelection};
    use nalgebra::Point3;

    fn topology() -> Topology {
        let mut topology = Topology::new();
        topology.add_residue("GUA", [("N1", Element::N), ("H1", Element::H)]);
        topology.add_residue("DRI", [("O1", Element::O), ("C1", Element::C)]);
        topology.add_bond(0, 1, BondOrder::Single).unwrap();
        topology
    }

    fn frame() -> Frame {
        Frame::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.9, 0.0, 0.0),
                Point3::new(4.3, 0.0, 0.0),
            ],
            None,
        )
    }

    fn config(observables: ObservableSelection) -> AnalysisConfig {
        AnalysisConfigBuilder::new()
            .input_dir("in".into())
            .output_dir("out".into())
            .runs(1)
            .l_count(0)
            .steps(10)
            .observables(observables)
            .build()
            .unwrap()
    }

    #[test]
    fn every_selected_observable_is_accumulated() {
        let topology = topology();
        let analyzer = RunAnalyzer::new(&topology, &config(ObservableSelection::default()));
        let mut observables = analyzer.observables(0, &topology);
        analyzer.process(&topology, &frame(), &mut observables);
        analyzer.process(&topology, &frame(), &mut observables);

        assert_eq!(observables.frames, 2);
        assert_eq!(observables.heights.d.as_ref().map(Vec::len), Some(2));
        assert_eq!(observables.sasa.d.as_ref().map(Vec::len), Some(2));
        assert_eq!(observables.nematic_order.d.as_ref().map(Vec::len), Some(2));
        assert!(observables.heights.l.is_none());
        let contacts = observables.contacts.as_ref().unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(observables.tally.total(), 2);
    }

    #[test]
    fn deselected_observables_stay_empty() {
        let topology = topology();
        let selection = ObservableSelection {
            heights: false,
            hydrogen_bonds: false,
            nematic_order: true,
            sasa: false,
        };
        let analyzer = RunAnalyzer::new(&topology, &config(selection));
        let mut observables = analyzer.observables(0, &topology);
        analyzer.process(&topology, &frame(), &mut observables);
        assert!(observables.heights.d.is_none());
        assert!(observables.contacts.is_none());
        let order = observables.nematic_order.d.as_ref().unwrap();
        assert_eq!(order.len(), 1);
        assert!((order[0].unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn frames_without_a_director_stay_aligned() {
        let mut topology = Topology::new();
        topology.add_residue("LRI", [("O1", Element::O)]);
        let selection = ObservableSelection {
            heights: false,
            hydrogen_bonds: false,
            nematic_order: true,
            sasa: false,
        };
        let analyzer = RunAnalyzer::new(&topology, &config(selection));
        let mut observables = analyzer.observables(0, &topology);
        let frame = Frame::new(vec![Point3::new(0.0, 0.0, 0.0)], None);
        for _ in 0..3 {
            analyzer.process(&topology, &frame, &mut observables);
        }
        assert_eq!(observables.frames, 3);
        assert_eq!(observables.nematic_order.l, Some(vec![None, None, None]));
    }
}
