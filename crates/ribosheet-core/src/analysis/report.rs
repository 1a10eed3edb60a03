//! Plot-ready CSV tables written from an [`AnalysisSummary`].

use super::aggregate::AnalysisSummary;
use super::contacts::{ContactCategory, ContactMatrix};
use super::error::AnalysisError;
use super::stats::{autocorrelation, gaussian_kde, kde_grid};
use crate::core::models::residue::Enantiomer;
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const HEIGHTS_KDE: &str = "heights_kde.csv";
pub const HBOND_TIMESERIES: &str = "hbond_timeseries.csv";
pub const HBOND_TALLY: &str = "hbond_tally.csv";
pub const CONTACT_MATRIX_D: &str = "contact_matrix_d.csv";
pub const CONTACT_MATRIX_L: &str = "contact_matrix_l.csv";
pub const NEMATIC_ORDER: &str = "nematic_order.csv";
pub const SASA_KDE: &str = "sasa_kde.csv";
pub const SUMMARY: &str = "summary.csv";

#[derive(Serialize)]
struct TallyRow<'a> {
    donor_residue: &'a str,
    acceptor_residue: &'a str,
    donor_role: usize,
    acceptor_role: usize,
    count: u64,
}

#[derive(Serialize)]
struct SummaryLine {
    observable: String,
    species: String,
    count: usize,
    mean: f64,
    std: f64,
    min: f64,
    max: f64,
}

/// A writer for serialized rows whose header is written even when no row follows.
fn table_writer(path: &Path, header: &[&str]) -> Result<Writer<std::fs::File>, AnalysisError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(header)?;
    Ok(writer)
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

fn value_at(series: &Option<Vec<f64>>, index: usize) -> Option<f64> {
    series.as_ref().and_then(|s| s.get(index).copied())
}

fn longest(series: &[&Option<Vec<f64>>]) -> usize {
    series
        .iter()
        .filter_map(|s| s.as_ref().map(Vec::len))
        .max()
        .unwrap_or(0)
}

/// Writes every report table into `dir` and returns the written paths.
#[instrument(skip_all, name = "write_reports", fields(dir = %dir.display()))]
pub fn write_reports(
    summary: &AnalysisSummary,
    dir: &Path,
    kde_points: usize,
) -> Result<Vec<PathBuf>, AnalysisError> {
    std::fs::create_dir_all(dir)?;

    let heights = summary_pair(|e| summary.pooled_heights(e));
    let sasa = summary_pair(|e| summary.pooled_sasa(e));

    let written = vec![
        write_kde(&dir.join(HEIGHTS_KDE), "height_angstrom", &heights, kde_points)?,
        write_hbond_timeseries(summary, &dir.join(HBOND_TIMESERIES))?,
        write_tally(summary, &dir.join(HBOND_TALLY))?,
        write_matrix(&summary.contact_matrix(Enantiomer::D), &dir.join(CONTACT_MATRIX_D))?,
        write_matrix(&summary.contact_matrix(Enantiomer::L), &dir.join(CONTACT_MATRIX_L))?,
        write_nematic_order(summary, &dir.join(NEMATIC_ORDER))?,
        write_kde(&dir.join(SASA_KDE), "sasa_angstrom2", &sasa, kde_points)?,
        write_summary(summary, &dir.join(SUMMARY))?,
    ];

    info!(files = written.len(), "Reports written.");
    Ok(written)
}

fn summary_pair<T>(f: impl Fn(Enantiomer) -> T) -> [T; 2] {
    [f(Enantiomer::D), f(Enantiomer::L)]
}

fn write_kde(
    path: &Path,
    axis_label: &str,
    samples: &[Option<Vec<f64>>; 2],
    points: usize,
) -> Result<PathBuf, AnalysisError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record([axis_label, "d_density", "l_density"])?;

    let present: Vec<&[f64]> = samples.iter().filter_map(|s| s.as_deref()).collect();
    let grid = kde_grid(&present, points);
    let densities: Vec<Option<Vec<f64>>> = samples
        .iter()
        .map(|s| s.as_deref().and_then(|s| gaussian_kde(s, &grid)))
        .collect();

    for (i, x) in grid.iter().enumerate() {
        writer.write_record([
            format!("{x:.6}"),
            cell(value_at(&densities[0], i)),
            cell(value_at(&densities[1], i)),
        ])?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

fn write_hbond_timeseries(summary: &AnalysisSummary, path: &Path) -> Result<PathBuf, AnalysisError> {
    let mut columns: Vec<(String, Option<Vec<f64>>)> = ContactCategory::ALL
        .iter()
        .map(|c| (c.label().to_string(), summary.contact_timeseries(*c)))
        .collect();
    for e in Enantiomer::ALL {
        columns.push((format!("{e}B"), summary.sugar_base_timeseries(e)));
    }

    let mut writer = Writer::from_path(path)?;
    let mut header = vec!["frame".to_string(), "time_ns".to_string()];
    header.extend(columns.iter().map(|(label, _)| label.clone()));
    writer.write_record(&header)?;

    let rows = longest(&columns.iter().map(|(_, s)| s).collect::<Vec<_>>());
    for frame in 0..rows {
        let mut record = vec![
            frame.to_string(),
            format!("{:.6}", frame as f64 * summary.frame_interval_ns()),
        ];
        record.extend(columns.iter().map(|(_, s)| cell(value_at(s, frame))));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

fn write_tally(summary: &AnalysisSummary, path: &Path) -> Result<PathBuf, AnalysisError> {
    let mut writer = table_writer(
        path,
        &[
            "donor_residue",
            "acceptor_residue",
            "donor_role",
            "acceptor_role",
            "count",
        ],
    )?;
    for (key, roles, count) in summary.tally().iter() {
        writer.serialize(TallyRow {
            donor_residue: key.donor.label(),
            acceptor_residue: key.acceptor.label(),
            donor_role: roles.donor.0,
            acceptor_role: roles.acceptor.0,
            count,
        })?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

fn write_matrix(matrix: &ContactMatrix, path: &Path) -> Result<PathBuf, AnalysisError> {
    let mut writer = Writer::from_path(path)?;
    let mut header = vec!["donor\\acceptor".to_string()];
    header.extend(matrix.column_labels.iter().cloned());
    writer.write_record(&header)?;
    for (label, counts) in matrix.row_labels.iter().zip(&matrix.counts) {
        let mut record = vec![label.clone()];
        record.extend(counts.iter().map(u64::to_string));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

fn write_nematic_order(summary: &AnalysisSummary, path: &Path) -> Result<PathBuf, AnalysisError> {
    let order = summary_pair(|e| summary.nematic_timeseries(e));
    // Autocorrelation needs an unbroken series.
    let acf: Vec<Option<Vec<f64>>> = order
        .iter()
        .map(|s| {
            let complete: Option<Vec<f64>> = s.as_ref()?.iter().copied().collect();
            complete.as_deref().and_then(autocorrelation)
        })
        .collect();
    let frames = order
        .iter()
        .filter_map(|s| s.as_ref().map(Vec::len))
        .max()
        .unwrap_or(0);
    let order_at = |series: &Option<Vec<Option<f64>>>, frame: usize| {
        series.as_ref().and_then(|s| s.get(frame).copied().flatten())
    };

    let mut writer = Writer::from_path(path)?;
    writer.write_record([
        "frame",
        "time_ns",
        "d_order",
        "l_order",
        "d_autocorrelation",
        "l_autocorrelation",
    ])?;
    for frame in 0..frames {
        writer.write_record([
            frame.to_string(),
            format!("{:.6}", frame as f64 * summary.frame_interval_ns()),
            cell(order_at(&order[0], frame)),
            cell(order_at(&order[1], frame)),
            cell(value_at(&acf[0], frame)),
            cell(value_at(&acf[1], frame)),
        ])?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

fn write_summary(summary: &AnalysisSummary, path: &Path) -> Result<PathBuf, AnalysisError> {
    let mut writer = table_writer(
        path,
        &["observable", "species", "count", "mean", "std", "min", "max"],
    )?;
    for row in summary.statistics() {
        let stats = row.statistics;
        writer.serialize(SummaryLine {
            observable: row.observable.to_string(),
            species: row.species.map_or_else(|| "DL".to_string(), |e| e.to_string()),
            count: stats.count,
            mean: stats.mean,
            std: stats.std,
            min: stats.min,
            max: stats.max,
        })?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate::RunObservables;
    use crate::analysis::contacts::{ContactSeries, classify_frame};
    use crate::analysis::hbonds::HydrogenBond;
    use crate::core::models::atom::Element;
    use crate::core::models::topology::Topology;
    use tempfile::tempdir;

    fn summary() -> AnalysisSummary {
        let mut topology = Topology::new();
        topology.add_residue("GUA", [("N1", Element::N), ("H1", Element::H)]);
        topology.add_residue("DRI", [("O1", Element::O)]);

        let mut run = RunObservables::new(0, &topology);
        let mut series = ContactSeries::default();
        let bond = HydrogenBond {
            donor: 0,
            hydrogen: 1,
            acceptor: 2,
        };
        for _ in 0..3 {
            series.push(classify_frame(&topology, &[bond], &mut run.tally));
        }
        run.contacts = Some(series);
        run.frames = 3;
        run.heights.d = Some(vec![4.0, 4.5, 5.0]);
        run.nematic_order.d = Some(vec![Some(0.2), Some(0.4), Some(0.3)]);
        AnalysisSummary::new(vec![run], 0.004).unwrap()
    }

    fn read(path: &Path) -> Vec<Vec<String>> {
        csv::Reader::from_path(path)
            .unwrap()
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn every_report_is_written() {
        let dir = tempdir().unwrap();
        let written = write_reports(&summary(), dir.path(), 50).unwrap();
        assert_eq!(written.len(), 8);
        for name in [
            HEIGHTS_KDE,
            HBOND_TIMESERIES,
            HBOND_TALLY,
            CONTACT_MATRIX_D,
            CONTACT_MATRIX_L,
            NEMATIC_ORDER,
            SASA_KDE,
            SUMMARY,
        ] {
            assert!(dir.path().join(name).is_file(), "{name} missing");
        }
    }

    #[test]
    fn timeseries_carries_time_axis_and_normalized_counts() {
        let dir = tempdir().unwrap();
        write_reports(&summary(), dir.path(), 50).unwrap();
        let rows = read(&dir.path().join(HBOND_TIMESERIES));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][0], "2");
        assert_eq!(rows[2][1], "0.008000");
        // One D sugar, one guanine contact per frame.
        assert_eq!(rows[0][2], "1.000000");
        // No L sugar: L columns are empty rather than zero.
        assert_eq!(rows[0][4], "");
    }

    #[test]
    fn absent_species_leave_empty_density_columns() {
        let dir = tempdir().unwrap();
        write_reports(&summary(), dir.path(), 50).unwrap();
        let rows = read(&dir.path().join(HEIGHTS_KDE));
        assert_eq!(rows.len(), 50);
        assert!(rows.iter().all(|r| !r[1].is_empty() && r[2].is_empty()));
        assert!(read(&dir.path().join(SASA_KDE)).is_empty());
    }

    #[test]
    fn tally_and_matrix_agree() {
        let dir = tempdir().unwrap();
        write_reports(&summary(), dir.path(), 50).unwrap();
        let tally = read(&dir.path().join(HBOND_TALLY));
        assert_eq!(tally, vec![vec!["G", "DRI", "0", "0", "3"]]);
        let matrix = read(&dir.path().join(CONTACT_MATRIX_D));
        assert_eq!(matrix, vec![vec!["G-0", "3"]]);
    }

    #[test]
    fn undefined_order_frames_leave_empty_cells() {
        let mut topology = Topology::new();
        topology.add_residue("DRI", [("O1", Element::O), ("C1", Element::C)]);
        let mut run = RunObservables::new(0, &topology);
        run.frames = 3;
        run.nematic_order.d = Some(vec![Some(0.2), None, Some(0.3)]);
        let summary = AnalysisSummary::new(vec![run], 0.004).unwrap();

        let dir = tempdir().unwrap();
        write_reports(&summary, dir.path(), 10).unwrap();
        let rows = read(&dir.path().join(NEMATIC_ORDER));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][2], "0.200000");
        assert_eq!(rows[1][2], "");
        assert_eq!(rows[2][2], "0.300000");
        // A broken series has no autocorrelation.
        assert!(rows.iter().all(|r| r[4].is_empty()));
    }
}
