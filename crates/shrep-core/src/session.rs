//! Session state behind the UI host operations
//!
//! A `Session` owns everything derived from the selected shader: the pass
//! list, the keyword vocabulary, the selection of the active pass and the
//! reports of the last compile-and-report cycle.

use std::path::PathBuf;

use shrep_scan::KeywordVocabulary;
use thiserror::Error;

use crate::asset::{AssetError, ShaderAsset};
use crate::invoker::{CompilerInvoker, CompilerTarget};
use crate::oracle::{DefineOracle, VariantOracle, VariantSettings, write_variant};
use crate::pass::{PassInfo, build_passes};
use crate::report::{ReportAggregator, StageReport, StageReports};
use crate::selection::{SelectionError, SelectionState};
use crate::stage::Stage;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no shader selected")]
    NoShader,

    #[error("no pass selected")]
    NoPass,

    #[error("pass {index} is out of range ({count} passes)")]
    PassOutOfRange { index: usize, count: usize },

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("failed to materialize variant: {0:#}")]
    Materialize(anyhow::Error),

    #[error("failed to write variant file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// State of one shader inspection session
pub struct Session<O: VariantOracle = DefineOracle> {
    oracle: O,
    invoker: CompilerInvoker,
    settings: VariantSettings,
    shader: Option<ShaderAsset>,
    passes: Vec<PassInfo>,
    vocabulary: KeywordVocabulary,
    selection: SelectionState,
    reports: ReportAggregator,
}

impl Session<DefineOracle> {
    pub fn new(target: CompilerTarget, settings: VariantSettings) -> Self {
        Self::with_oracle(DefineOracle, target, settings)
    }
}

impl<O: VariantOracle> Session<O> {
    pub fn with_oracle(oracle: O, target: CompilerTarget, settings: VariantSettings) -> Self {
        Self {
            oracle,
            invoker: CompilerInvoker::new(target),
            settings,
            shader: None,
            passes: Vec::new(),
            vocabulary: KeywordVocabulary::new(),
            selection: SelectionState::new(),
            reports: ReportAggregator::new(),
        }
    }

    /// Switch to `shader`, or to nothing with `None`.
    ///
    /// Selecting the shader that is already selected does nothing and returns
    /// false. Otherwise passes and vocabulary are rebuilt, reports are
    /// dropped and the first pass becomes active.
    pub fn select_shader(&mut self, shader: Option<ShaderAsset>) -> bool {
        match (&self.shader, &shader) {
            (Some(current), Some(new)) if current.same_asset(new) => return false,
            (None, None) => return false,
            _ => {}
        }

        self.reports.clear();
        self.selection.clear();
        self.shader = shader;
        self.rebuild_passes();

        if !self.passes.is_empty() {
            self.selection.select_pass(0, &self.passes, true);
        }
        true
    }

    /// Re-read the current shader and rebuild everything derived from it.
    ///
    /// The active pass index is kept (clamped to the new pass count) and its
    /// selection starts over.
    pub fn refresh(&mut self) -> Result<(), SessionError> {
        let shader = self.shader.as_ref().ok_or(SessionError::NoShader)?;
        let reloaded = shader.reload()?;
        log::info!("Refreshing shader '{}'", reloaded.name());

        self.shader = Some(reloaded);
        self.rebuild_passes();

        match self.selection.active_pass() {
            _ if self.passes.is_empty() => self.selection.clear(),
            Some(index) => {
                let index = index.min(self.passes.len() - 1);
                self.selection.select_pass(index, &self.passes, true);
            }
            None => self.selection.select_pass(0, &self.passes, true),
        }
        Ok(())
    }

    pub fn select_pass(&mut self, index: usize) -> Result<(), SessionError> {
        if self.shader.is_none() {
            return Err(SessionError::NoShader);
        }
        if index >= self.passes.len() {
            return Err(SessionError::PassOutOfRange {
                index,
                count: self.passes.len(),
            });
        }
        self.selection.select_pass(index, &self.passes, false);
        Ok(())
    }

    pub fn select_keyword_option(&mut self, group: usize, option: usize) -> Result<(), SessionError> {
        let index = self.active_index()?;
        self.selection.select_option(group, option, &self.passes[index])?;
        Ok(())
    }

    /// Run one compile-and-report cycle for the active pass and selection.
    ///
    /// The variant is materialized once, written to a temp file and compiled
    /// for every stage the pass supports. A stage whose compiler cannot be
    /// started reports the failure in its slot. When materialization fails
    /// the previous reports stay in place.
    pub fn compile_and_report(&mut self) -> Result<(), SessionError> {
        let index = self.active_index()?;
        let pass = &self.passes[index];
        self.selection.ensure_consistent(pass);
        let keywords = self.selection.current_keywords(pass);

        let stages: Vec<Stage> = Stage::ALL
            .into_iter()
            .filter(|&stage| self.oracle.stage_support(pass, stage))
            .collect();

        log::info!(
            "Compiling pass '{}' for {:?} with keywords {:?}",
            pass.name(),
            stages,
            keywords
        );

        let Some(&first) = stages.first() else {
            log::warn!("Pass '{}' has no supported stage", pass.name());
            self.reports.replace_all(StageReports::new());
            return Ok(());
        };

        let path = materialize(&self.oracle, pass, &keywords, first, &self.settings)?;

        let mut reports = StageReports::new();
        for stage in stages {
            let report = match self.invoker.run_stage(&path, stage) {
                Ok(output) => StageReport::Compiled {
                    text: output.text,
                    exit_code: output.exit_code,
                },
                Err(e) => {
                    let hint = self.invoker.target().launch_hint();
                    log::error!("{} stage: {}. {}", stage, e, hint);
                    StageReport::LaunchFailed {
                        text: format!("{e}\n{hint}\n"),
                    }
                }
            };
            reports.insert(stage, report);
        }

        self.reports.replace_all(reports);
        Ok(())
    }

    pub fn clear_reports(&mut self) {
        self.reports.clear();
    }

    pub fn shader(&self) -> Option<&ShaderAsset> {
        self.shader.as_ref()
    }

    pub fn passes(&self) -> &[PassInfo] {
        &self.passes
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(PassInfo::name).collect()
    }

    pub fn active_pass(&self) -> Option<&PassInfo> {
        self.selection.active_pass().and_then(|i| self.passes.get(i))
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Keywords the next cycle would compile with
    pub fn current_keywords(&self) -> Vec<String> {
        self.active_pass()
            .map(|pass| self.selection.current_keywords(pass))
            .unwrap_or_default()
    }

    pub fn vocabulary(&self) -> &KeywordVocabulary {
        &self.vocabulary
    }

    pub fn reports(&self) -> &ReportAggregator {
        &self.reports
    }

    pub fn compiler(&self) -> &CompilerTarget {
        self.invoker.target()
    }

    pub fn set_compiler(&mut self, target: CompilerTarget) {
        log::info!("Compiler set to {}", target);
        self.invoker.set_target(target);
    }

    pub fn settings(&self) -> &VariantSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: VariantSettings) {
        self.settings = settings;
    }

    fn active_index(&self) -> Result<usize, SessionError> {
        if self.shader.is_none() {
            return Err(SessionError::NoShader);
        }
        self.selection
            .active_pass()
            .filter(|&i| i < self.passes.len())
            .ok_or(SessionError::NoPass)
    }

    fn rebuild_passes(&mut self) {
        self.vocabulary.clear();
        self.passes = match &self.shader {
            Some(shader) => build_passes(shader, &mut self.vocabulary),
            None => Vec::new(),
        };
        log::debug!(
            "{} passes, {} distinct keywords",
            self.passes.len(),
            self.vocabulary.len()
        );
    }
}

fn materialize<O: VariantOracle>(
    oracle: &O,
    pass: &PassInfo,
    keywords: &[String],
    stage: Stage,
    settings: &VariantSettings,
) -> Result<PathBuf, SessionError> {
    let bytes = oracle
        .materialize_variant(pass, keywords, stage, settings.platform, settings.build_target)
        .map_err(SessionError::Materialize)?;
    write_variant(&bytes, settings).map_err(SessionError::TempFile)
}
