//! Tailoring Driver
//!
//! Entry point for whole runs: reads the criteria, groups them by tail and
//! runs one orchestrator per group. Each group gets a fresh orchestrator,
//! so tags and caches never leak between groups.
//!
//! # Usage
//! ```rust,ignore
//! let driver = TailoringDriver::new(&program, &program, &config);
//! let criteria = driver.read_criteria("app.sc")?;
//! for result in driver.tailor(&criteria)? {
//!     driver.write_report(&result)?;
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::super::domain::TailoringResult;
use super::orchestrator::TailoringOrchestrator;
use super::report;
use crate::config::TailorConfig;
use crate::errors::Result;
use crate::features::criteria::{CriteriaReader, SequenceCriterion};
use crate::features::fact_model::CriterionSets;
use crate::shared::ports::{PointsToProvider, ProgramGraph};

pub struct TailoringDriver<'a> {
    program: &'a dyn ProgramGraph,
    pts: &'a dyn PointsToProvider,
    config: &'a TailorConfig,
}

impl<'a> TailoringDriver<'a> {
    pub fn new(
        program: &'a dyn ProgramGraph,
        pts: &'a dyn PointsToProvider,
        config: &'a TailorConfig,
    ) -> Self {
        Self {
            program,
            pts,
            config,
        }
    }

    pub fn read_criteria(&self, path: impl AsRef<Path>) -> Result<Vec<SequenceCriterion>> {
        Ok(CriteriaReader::new(self.program).read_file(path)?)
    }

    /// One result per distinct tail, in order of first appearance
    pub fn tailor(&self, criteria: &[SequenceCriterion]) -> Result<Vec<TailoringResult>> {
        let started = Instant::now();
        let groups = CriterionSets::group_by_tail(criteria.iter().map(SequenceCriterion::sequence));
        let mut results = Vec::with_capacity(groups.len());
        for (tail, group) in groups {
            let mut orchestrator =
                TailoringOrchestrator::new(self.program, self.pts, self.config, tail, &group)?;
            orchestrator.run()?;
            let result = orchestrator.into_result()?;
            if result.is_empty() {
                tracing::warn!(
                    tail = %tail,
                    "tailored program is empty; the criteria are infeasible if the ICFG is sound"
                );
            }
            results.push(result);
        }
        tracing::info!(
            groups = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tailoring finished"
        );
        Ok(results)
    }

    pub fn write_report(&self, result: &TailoringResult) -> Result<PathBuf> {
        report::write_report(self.program, result, &self.config.out_dir, self.config.extend_sc)
    }

    /// Read, tailor and dump reports; returns the written report paths
    pub fn run(&self, criteria_path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let criteria = self.read_criteria(criteria_path)?;
        let results = self.tailor(&criteria)?;
        results.iter().map(|r| self.write_report(r)).collect()
    }
}
