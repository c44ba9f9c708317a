//! Per-pass keyword indexing

use shrep_scan::{KeywordGroup, KeywordVocabulary, build_hint, index_source};

use crate::asset::{PassSource, ShaderAsset};
use crate::stage::Stage;

/// Label shown for the empty option of a group
pub const NO_KEYWORD_LABEL: &str = "No keyword applied";

/// One compilable pass with its keyword groups
///
/// `keyword_hints` is aligned 1:1 with `keyword_groups`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassInfo {
    subshader_index: usize,
    pass_index: usize,
    name: String,
    source: String,
    stages: Vec<Stage>,
    keyword_groups: Vec<KeywordGroup>,
    keyword_hints: Vec<String>,
}

impl PassInfo {
    /// Index the pass source, registering its keywords in `vocabulary`
    pub fn build(
        subshader_index: usize,
        pass_index: usize,
        pass: &PassSource,
        vocabulary: &mut KeywordVocabulary,
    ) -> Self {
        let keyword_groups = index_source(&pass.source, vocabulary);
        let keyword_hints = keyword_groups.iter().map(build_hint).collect();

        log::debug!(
            "Pass {}:{} '{}' declares {} keyword groups",
            subshader_index,
            pass_index,
            pass.name,
            keyword_groups.len()
        );

        Self {
            subshader_index,
            pass_index,
            name: pass.name.clone(),
            source: pass.source.clone(),
            stages: pass.stages.clone(),
            keyword_groups,
            keyword_hints,
        }
    }

    pub fn subshader_index(&self) -> usize {
        self.subshader_index
    }

    pub fn pass_index(&self) -> usize {
        self.pass_index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw pass source, comments included
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Stages declared by the pass
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn declares_stage(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn keyword_groups(&self) -> &[KeywordGroup] {
        &self.keyword_groups
    }

    pub fn keyword_hints(&self) -> &[String] {
        &self.keyword_hints
    }

    pub fn group_count(&self) -> usize {
        self.keyword_groups.len()
    }

    /// Display labels for a group's options, with the empty option named
    pub fn option_labels(&self, group: usize) -> Option<Vec<&str>> {
        self.keyword_groups.get(group).map(|g| {
            g.options()
                .iter()
                .map(|o| if o.is_empty() { NO_KEYWORD_LABEL } else { o.as_str() })
                .collect()
        })
    }
}

/// Index every pass of every subshader, in order
pub fn build_passes(asset: &ShaderAsset, vocabulary: &mut KeywordVocabulary) -> Vec<PassInfo> {
    asset
        .subshaders()
        .iter()
        .enumerate()
        .flat_map(|(sub, subshader)| {
            subshader
                .passes
                .iter()
                .enumerate()
                .map(move |(index, pass)| (sub, index, pass))
        })
        .map(|(sub, index, pass)| PassInfo::build(sub, index, pass, vocabulary))
        .collect()
}
