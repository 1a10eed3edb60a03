use crate::cli::SimulateArgs;
use crate::config::PartialSimulationConfig;
use crate::error::{CliError, Result};
use crate::scheduler::{self, JobReport};
use crate::utils::progress::job_bar;
use ribosheet::engine::progress::ProgressReporter;
use ribosheet::engine::reference::RestraintLangevinFactory;
use ribosheet::workflows::simulate::{self, JobSummary, MonolayerTemplates};
use std::sync::Arc;
use tracing::info;

pub async fn run(args: SimulateArgs, partial: PartialSimulationConfig, quiet: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = partial.merge_with_cli(&args)?;

    info!("Loading molecule templates...");
    let templates = MonolayerTemplates::load(&config.molecules)?;
    std::fs::create_dir_all(&config.output_dir)?;

    println!(
        "Starting {} simulation job(s), {} at a time, on {} device(s)...",
        config.jobs, config.processes, config.devices
    );

    let total = config.jobs;
    let processes = config.processes;
    let output_dir = config.output_dir.clone();
    let config = Arc::new(config);
    let templates = Arc::new(templates);
    let progress = job_bar(total, quiet);
    let reports = scheduler::run_pool(total, processes, &progress, move |job| {
        simulate::run_job(
            job,
            &config,
            &templates,
            &RestraintLangevinFactory,
            &ProgressReporter::new(),
        )
    })
    .await;

    for line in render_reports(&reports) {
        println!("{}", line);
    }
    println!("Outputs written to: {}", output_dir.display());

    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        return Err(CliError::JobsFailed { failed, total });
    }
    Ok(())
}

fn render_reports(reports: &[JobReport<JobSummary>]) -> Vec<String> {
    reports
        .iter()
        .map(|report| match &report.result {
            Ok(summary) => format!(
                "  ✓ Job {} (device {}): {} atoms, minimized {:.2} kJ/mol, {} frames, final T {:.1} K",
                summary.job,
                summary.device,
                summary.atoms,
                summary.minimized_energy,
                summary.reports,
                summary.final_state.temperature
            ),
            Err(e) => format!("  ✗ Job {} failed: {}", report.job, e),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::JobError;
    use ribosheet::core::io::naming::RunFiles;
    use ribosheet::engine::simulation::EngineState;

    #[test]
    fn reports_render_successes_and_failures() {
        let summary = JobSummary {
            job: 0,
            device: 1,
            atoms: 120,
            minimized_energy: -12.345,
            reports: 10,
            final_state: EngineState {
                step: 1000,
                time_ps: 4.0,
                potential_energy: -10.0,
                kinetic_energy: 8.0,
                temperature: 299.96,
            },
            files: RunFiles::new(0, 2, 1000),
        };
        let reports = vec![
            JobReport {
                job: 0,
                result: Ok(summary),
            },
            JobReport {
                job: 1,
                result: Err(JobError::Panicked("boom".to_string())),
            },
        ];
        let lines = render_reports(&reports);
        assert!(lines[0].contains("Job 0 (device 1): 120 atoms"));
        assert!(lines[0].contains("-12.35 kJ/mol"));
        assert!(lines[0].contains("300.0 K"));
        assert_eq!(lines[1], "  ✗ Job 1 failed: worker panicked: boom");
    }
}
