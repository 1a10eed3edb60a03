use crate::cli::AnalyzeArgs;
use crate::config::PartialAnalysisConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use ribosheet::analysis::aggregate::AnalysisSummary;
use ribosheet::engine::progress::ProgressReporter;
use ribosheet::workflows;
use tracing::info;

pub async fn run(args: AnalyzeArgs, partial: PartialAnalysisConfig, quiet: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = partial.merge_with_cli(&args)?;

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Analyzing {} run(s) from {}...",
        config.runs,
        config.input_dir.display()
    );
    info!("Invoking the core analysis workflow...");

    let outcome =
        tokio::task::block_in_place(|| workflows::analyze::run(&config, &reporter))?;

    for line in render_summary(&outcome.summary) {
        println!("{}", line);
    }
    println!("Reports written:");
    for path in &outcome.reports {
        println!("  {}", path.display());
    }
    Ok(())
}

fn render_summary(summary: &AnalysisSummary) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Analyzed {} run(s), {} frame(s) in total.",
            summary.runs().len(),
            summary.total_frames()
        ),
        format!(
            "{:<16} {:>7} {:>10} {:>12} {:>12} {:>12} {:>12}",
            "observable", "species", "samples", "mean", "std", "min", "max"
        ),
    ];
    for row in summary.statistics() {
        let stats = row.statistics;
        lines.push(format!(
            "{:<16} {:>7} {:>10} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            row.observable.to_string(),
            row.species.map_or_else(|| "DL".to_string(), |e| e.to_string()),
            stats.count,
            stats.mean,
            stats.std,
            stats.min,
            stats.max
        ));
    }
    let dropped = summary.dropped_contacts();
    if dropped > 0 {
        lines.push(format!(
            "{} hydrogen bond(s) involved untracked residues and were not classified.",
            dropped
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use ribosheet::analysis::aggregate::RunObservables;
    use ribosheet::core::models::atom::Element;
    use ribosheet::core::models::topology::Topology;

    #[test]
    fn summary_lists_one_line_per_statistic() {
        let mut topology = Topology::new();
        topology.add_residue("DRI", [("O1", Element::O)]);
        topology.add_residue("GUA", [("N1", Element::N)]);

        let mut run = RunObservables::new(0, &topology);
        run.frames = 2;
        run.heights.d = Some(vec![4.0, 6.0]);
        let summary = AnalysisSummary::new(vec![run], 0.004).unwrap();

        let lines = render_summary(&summary);
        assert_eq!(lines[0], "Analyzed 1 run(s), 2 frame(s) in total.");
        let height = lines
            .iter()
            .find(|line| line.starts_with("height"))
            .expect("height row");
        assert!(height.contains("5.0000"));
        assert!(height.contains("1.0000"));
        assert!(!lines.iter().any(|line| line.contains("untracked")));
    }
}
