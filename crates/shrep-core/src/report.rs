//! Per-stage compiler reports

use std::collections::BTreeMap;

use crate::stage::Stage;

/// Text shown for one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageReport {
    /// The compiler ran; `text` is its captured standard output. The exit code
    /// is informational only.
    Compiled { text: String, exit_code: Option<i32> },
    /// The compiler could not be run; `text` describes why.
    LaunchFailed { text: String },
}

impl StageReport {
    pub fn text(&self) -> &str {
        match self {
            StageReport::Compiled { text, .. } | StageReport::LaunchFailed { text } => text,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StageReport::LaunchFailed { .. })
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StageReport::Compiled { exit_code, .. } => *exit_code,
            StageReport::LaunchFailed { .. } => None,
        }
    }
}

/// Stage → report mapping, at most one entry per stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReports {
    entries: BTreeMap<Stage, StageReport>,
}

impl StageReports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the report of `stage`, returning the one it replaces
    pub fn insert(&mut self, stage: Stage, report: StageReport) -> Option<StageReport> {
        self.entries.insert(stage, report)
    }

    pub fn get(&self, stage: Stage) -> Option<&StageReport> {
        self.entries.get(&stage)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Stage, StageReport)> for StageReports {
    fn from_iter<I: IntoIterator<Item = (Stage, StageReport)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Reports of the last compile-and-report cycle
#[derive(Debug, Clone, Default)]
pub struct ReportAggregator {
    current: StageReports,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every report
    pub fn clear(&mut self) {
        self.current = StageReports::new();
    }

    /// Install `reports` in place of the previous ones; nothing is merged
    pub fn replace_all(&mut self, reports: StageReports) {
        self.current = reports;
    }

    /// Reports in fixed stage order, absent stages skipped
    pub fn render_in_order(&self) -> impl Iterator<Item = (Stage, &StageReport)> + '_ {
        Stage::ALL
            .into_iter()
            .filter_map(|stage| self.current.get(stage).map(|report| (stage, report)))
    }

    pub fn get(&self, stage: Stage) -> Option<&StageReport> {
        self.current.get(stage)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}
