use super::error::WorkflowError;
use crate::analysis::aggregate::{AnalysisSummary, RunObservables};
use crate::analysis::error::AnalysisError;
use crate::analysis::report::write_reports;
use crate::analysis::run::analyze_run;
use crate::engine::config::AnalysisConfig;
use crate::engine::progress::{Progress, ProgressReporter};
use std::path::PathBuf;
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub summary: AnalysisSummary,
    pub reports: Vec<PathBuf>,
}

/// Analyzes every run, reduces them and writes the report tables.
///
/// Runs are independent and processed in parallel when the `parallel` feature is enabled;
/// results keep run order either way.
#[instrument(skip_all, name = "analysis_workflow", fields(runs = config.runs))]
pub fn run(config: &AnalysisConfig, reporter: &ProgressReporter) -> Result<AnalysisOutcome, WorkflowError> {
    // === Phase 1: Per-run extraction ===
    reporter.report(Progress::PhaseStart { name: "Extraction" });
    reporter.report(Progress::TaskStart {
        total_steps: config.runs as u64,
    });

    let runs: Vec<usize> = (0..config.runs).collect();
    let silent = ProgressReporter::new();

    #[cfg(not(feature = "parallel"))]
    let iterator = runs.iter();

    #[cfg(feature = "parallel")]
    let iterator = runs.par_iter();

    let results: Vec<Result<RunObservables, AnalysisError>> = iterator
        .map(|&run| {
            let result = analyze_run(config, run, &silent);
            if let Err(e) = &result {
                warn!(run, error = %e, "Run analysis failed.");
            }
            reporter.report(Progress::TaskIncrement);
            result
        })
        .collect();
    reporter.report(Progress::TaskFinish);
    let observables = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Reduction and reports ===
    reporter.report(Progress::PhaseStart { name: "Reporting" });
    let summary = AnalysisSummary::new(observables, config.frame_interval_ns)?;
    let reports = write_reports(&summary, &config.output_dir, config.kde_points)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        frames = summary.total_frames(),
        dropped_contacts = summary.dropped_contacts(),
        "Analysis complete."
    );
    Ok(AnalysisOutcome { summary, reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate::Observable;
    use crate::analysis::report::SUMMARY;
    use crate::core::models::atom::Element;
    use crate::core::models::template::{MoleculeTemplate, TemplateAtom};
    use crate::core::models::topology::{Bond, BondOrder};
    use crate::engine::config::{AnalysisConfigBuilder, SimulationConfigBuilder};
    use crate::engine::presets::{CYTOSINE_RESIDUE, D_SUGAR_RESIDUE, GUANINE_RESIDUE, L_SUGAR_RESIDUE};
    use crate::engine::reference::RestraintLangevinFactory;
    use crate::workflows::simulate::{MonolayerTemplates, run_job};
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn template(residue: &str, heavy: Element) -> MoleculeTemplate {
        MoleculeTemplate::new(
            residue,
            vec![
                TemplateAtom {
                    name: format!("{}1", heavy.symbol()),
                    element: heavy,
                },
                TemplateAtom {
                    name: "C1".to_string(),
                    element: Element::C,
                },
                TemplateAtom {
                    name: "H1".to_string(),
                    element: Element::H,
                },
            ],
            vec![
                Bond::new(0, 1, BondOrder::Single),
                Bond::new(0, 2, BondOrder::Single),
            ],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.4, 0.0, 0.0),
                Point3::new(-0.5, 0.8, 0.0),
            ],
        )
        .unwrap()
    }

    fn simulate(dir: &std::path::Path, jobs: usize) {
        let config = SimulationConfigBuilder::new()
            .height(2)
            .width(2)
            .l_count(1)
            .d_sugar("d.sdf".into())
            .l_sugar("l.sdf".into())
            .guanine("g.sdf".into())
            .cytosine("c.sdf".into())
            .steps(30)
            .report_interval(10)
            .solvate(false)
            .output_dir(dir.to_path_buf())
            .jobs(jobs)
            .processes(1)
            .devices(1)
            .seed(Some(9))
            .build()
            .unwrap();
        let templates = MonolayerTemplates::from_templates(
            template(D_SUGAR_RESIDUE, Element::O),
            template(L_SUGAR_RESIDUE, Element::O),
            template(GUANINE_RESIDUE, Element::N),
            template(CYTOSINE_RESIDUE, Element::N),
        );
        for job in 0..jobs {
            run_job(job, &config, &templates, &RestraintLangevinFactory, &ProgressReporter::new()).unwrap();
        }
    }

    fn analysis_config(input: &std::path::Path, output: &std::path::Path, runs: usize) -> AnalysisConfig {
        AnalysisConfigBuilder::new()
            .input_dir(input.to_path_buf())
            .output_dir(output.to_path_buf())
            .runs(runs)
            .l_count(1)
            .steps(30)
            .chunk_size(2)
            .kde_points(20)
            .build()
            .unwrap()
    }

    #[test]
    fn simulated_runs_are_analyzed_end_to_end() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        simulate(input.path(), 2);

        let outcome = run(&analysis_config(input.path(), output.path(), 2), &ProgressReporter::new()).unwrap();
        assert_eq!(outcome.summary.runs().len(), 2);
        assert_eq!(outcome.summary.runs()[1].run, 1);
        assert_eq!(outcome.summary.total_frames(), 6);
        assert_eq!(outcome.reports.len(), 8);
        assert!(output.path().join(SUMMARY).is_file());

        let heights = outcome.summary.pooled_heights(crate::core::models::residue::Enantiomer::D).unwrap();
        // Three D sugars, three frames, two runs.
        assert_eq!(heights.len(), 18);
        assert!(
            outcome
                .summary
                .statistics()
                .iter()
                .any(|row| row.observable == Observable::Height)
        );
    }

    #[test]
    fn missing_run_fails_the_analysis() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        simulate(input.path(), 1);
        let result = run(&analysis_config(input.path(), output.path(), 2), &ProgressReporter::new());
        assert!(matches!(result, Err(WorkflowError::Analysis(AnalysisError::Topology { .. }))));
    }
}
