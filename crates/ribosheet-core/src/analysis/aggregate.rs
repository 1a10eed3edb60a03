use super::contacts::{ContactCategory, ContactMatrix, ContactSeries, HydrogenBondTally};
use super::error::AnalysisError;
use super::stats::{SummaryStatistics, aligned_mean, aligned_mean_with_gaps};
use crate::core::models::residue::{Enantiomer, ResidueKind};
use crate::core::models::topology::Topology;
use std::fmt;

/// One value per sugar enantiomer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnantiomerPair<T> {
    pub d: T,
    pub l: T,
}

impl<T> EnantiomerPair<T> {
    pub fn from_fn(mut f: impl FnMut(Enantiomer) -> T) -> Self {
        Self {
            d: f(Enantiomer::D),
            l: f(Enantiomer::L),
        }
    }

    pub fn get(&self, enantiomer: Enantiomer) -> &T {
        match enantiomer {
            Enantiomer::D => &self.d,
            Enantiomer::L => &self.l,
        }
    }

    pub fn get_mut(&mut self, enantiomer: Enantiomer) -> &mut T {
        match enantiomer {
            Enantiomer::D => &mut self.d,
            Enantiomer::L => &mut self.l,
        }
    }
}

/// Everything extracted from one run, in frame order.
///
/// Series of a species that is absent from the run (or whose observable was not selected)
/// are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunObservables {
    pub run: usize,
    pub frames: usize,
    pub residue_counts: EnantiomerPair<usize>,
    /// Per residue per frame, flattened.
    pub heights: EnantiomerPair<Option<Vec<f64>>>,
    /// One entry per frame; `None` where no residue had a defined director.
    pub nematic_order: EnantiomerPair<Option<Vec<Option<f64>>>>,
    /// Per residue per frame, flattened.
    pub sasa: EnantiomerPair<Option<Vec<f64>>>,
    pub contacts: Option<ContactSeries>,
    pub tally: HydrogenBondTally,
}

impl RunObservables {
    pub fn new(run: usize, topology: &Topology) -> Self {
        Self {
            run,
            frames: 0,
            residue_counts: EnantiomerPair::from_fn(|e| topology.count_kind(ResidueKind::Sugar(e))),
            heights: EnantiomerPair::default(),
            nematic_order: EnantiomerPair::default(),
            sasa: EnantiomerPair::default(),
            contacts: None,
            tally: HydrogenBondTally::new(),
        }
    }

    /// Number of molecules a category series is divided by: the species count, or every sugar
    /// for cross D-L contacts. `None` when that count is zero.
    pub fn normalizer(&self, category: ContactCategory) -> Option<f64> {
        let count = match category.species() {
            Some(enantiomer) => *self.residue_counts.get(enantiomer),
            None => self.residue_counts.d + self.residue_counts.l,
        };
        (count > 0).then_some(count as f64)
    }

    fn normalized(&self, category: ContactCategory) -> Option<Vec<f64>> {
        let series = self.contacts.as_ref()?;
        let divisor = self.normalizer(category)?;
        Some(series.category(category).into_iter().map(|c| c / divisor).collect())
    }

    fn normalized_sugar_base(&self, enantiomer: Enantiomer) -> Option<Vec<f64>> {
        let series = self.contacts.as_ref()?;
        let count = *self.residue_counts.get(enantiomer);
        (count > 0).then(|| {
            series
                .sugar_base(enantiomer)
                .into_iter()
                .map(|c| c / count as f64)
                .collect()
        })
    }
}

/// Which observable a summary row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observable {
    Height,
    Sasa,
    NematicOrder,
    Contacts(ContactCategory),
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observable::Height => f.write_str("height"),
            Observable::Sasa => f.write_str("sasa"),
            Observable::NematicOrder => f.write_str("nematic_order"),
            Observable::Contacts(category) => write!(f, "hbonds_{}", category.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub observable: Observable,
    /// `None` for observables spanning both species (cross D-L contacts).
    pub species: Option<Enantiomer>,
    pub statistics: SummaryStatistics,
}

/// Reductions over all analyzed runs. Runs keep their input order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSummary {
    runs: Vec<RunObservables>,
    frame_interval_ns: f64,
}

impl AnalysisSummary {
    pub fn new(runs: Vec<RunObservables>, frame_interval_ns: f64) -> Result<Self, AnalysisError> {
        if runs.is_empty() {
            return Err(AnalysisError::NoRuns);
        }
        Ok(Self {
            runs,
            frame_interval_ns,
        })
    }

    pub fn runs(&self) -> &[RunObservables] {
        &self.runs
    }

    pub fn frame_interval_ns(&self) -> f64 {
        self.frame_interval_ns
    }

    pub fn total_frames(&self) -> usize {
        self.runs.iter().map(|r| r.frames).sum()
    }

    fn pooled(
        &self,
        select: impl Fn(&RunObservables) -> &Option<Vec<f64>>,
    ) -> Option<Vec<f64>> {
        let present: Vec<&Vec<f64>> = self.runs.iter().filter_map(|r| select(r).as_ref()).collect();
        (!present.is_empty()).then(|| present.into_iter().flatten().copied().collect())
    }

    fn aligned(&self, per_run: impl Fn(&RunObservables) -> Option<Vec<f64>>) -> Option<Vec<f64>> {
        let series: Vec<Vec<f64>> = self.runs.iter().filter_map(per_run).collect();
        (!series.is_empty()).then(|| aligned_mean(&series))
    }

    pub fn pooled_heights(&self, enantiomer: Enantiomer) -> Option<Vec<f64>> {
        self.pooled(|r| r.heights.get(enantiomer))
    }

    pub fn pooled_sasa(&self, enantiomer: Enantiomer) -> Option<Vec<f64>> {
        self.pooled(|r| r.sasa.get(enantiomer))
    }

    /// Defined order parameters of every run; frames without a value are skipped.
    pub fn pooled_nematic_order(&self, enantiomer: Enantiomer) -> Option<Vec<f64>> {
        let present: Vec<&Vec<Option<f64>>> = self
            .runs
            .iter()
            .filter_map(|r| r.nematic_order.get(enantiomer).as_ref())
            .collect();
        (!present.is_empty()).then(|| present.into_iter().flatten().flatten().copied().collect())
    }

    /// Run-aligned mean order parameter per frame.
    pub fn nematic_timeseries(&self, enantiomer: Enantiomer) -> Option<Vec<Option<f64>>> {
        let series: Vec<Vec<Option<f64>>> = self
            .runs
            .iter()
            .filter_map(|r| r.nematic_order.get(enantiomer).clone())
            .collect();
        (!series.is_empty()).then(|| aligned_mean_with_gaps(&series))
    }

    /// Run-aligned mean contacts per sugar molecule, per frame.
    pub fn contact_timeseries(&self, category: ContactCategory) -> Option<Vec<f64>> {
        self.aligned(|r| r.normalized(category))
    }

    /// Run-aligned mean sugar-base contacts (guanine plus cytosine) per sugar molecule.
    pub fn sugar_base_timeseries(&self, enantiomer: Enantiomer) -> Option<Vec<f64>> {
        self.aligned(|r| r.normalized_sugar_base(enantiomer))
    }

    pub fn tally(&self) -> HydrogenBondTally {
        self.runs.iter().fold(HydrogenBondTally::new(), |mut acc, r| {
            acc.merge(&r.tally);
            acc
        })
    }

    pub fn contact_matrix(&self, enantiomer: Enantiomer) -> ContactMatrix {
        ContactMatrix::from_tally(&self.tally(), enantiomer)
    }

    pub fn dropped_contacts(&self) -> usize {
        self.runs
            .iter()
            .filter_map(|r| r.contacts.as_ref())
            .map(ContactSeries::dropped)
            .sum()
    }

    /// Summary statistics of every pooled distribution and normalized contact series.
    pub fn statistics(&self) -> Vec<SummaryRow> {
        let mut rows = Vec::new();
        let mut push = |observable, species, samples: Option<Vec<f64>>| {
            if let Some(statistics) = samples.as_deref().and_then(SummaryStatistics::from_samples) {
                rows.push(SummaryRow {
                    observable,
                    species,
                    statistics,
                });
            }
        };

        for enantiomer in Enantiomer::ALL {
            push(Observable::Height, Some(enantiomer), self.pooled_heights(enantiomer));
            push(Observable::Sasa, Some(enantiomer), self.pooled_sasa(enantiomer));
            push(
                Observable::NematicOrder,
                Some(enantiomer),
                self.pooled_nematic_order(enantiomer),
            );
        }
        for category in ContactCategory::ALL {
            let pooled: Option<Vec<f64>> = {
                let series: Vec<Vec<f64>> = self.runs.iter().filter_map(|r| r.normalized(category)).collect();
                (!series.is_empty()).then(|| series.concat())
            };
            push(Observable::Contacts(category), category.species(), pooled);
        }
        rows
    }
}
