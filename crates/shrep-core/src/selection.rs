//! Keyword option selection for the active pass

use thiserror::Error;

use crate::pass::PassInfo;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("keyword group {group} is out of range (pass has {count} groups)")]
    GroupOutOfRange { group: usize, count: usize },

    #[error("option {option} is out of range for keyword group {group} ({count} options)")]
    OptionOutOfRange { group: usize, option: usize, count: usize },
}

/// Active pass plus one chosen option index per keyword group
///
/// The index vector always matches the active pass's group count; any
/// divergence resets it to all zeros.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    active: Option<usize>,
    indices: Vec<usize>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_pass(&self) -> Option<usize> {
        self.active
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Forget the active pass
    pub fn clear(&mut self) {
        self.active = None;
        self.indices.clear();
    }

    /// Make `index` the active pass.
    ///
    /// The selection is re-initialised to zeros when the pass changes, when
    /// `force` is set, or when the vector length no longer matches. An index
    /// past the end leaves no pass active.
    pub fn select_pass(&mut self, index: usize, passes: &[PassInfo], force: bool) {
        let Some(pass) = passes.get(index) else {
            log::warn!("Pass {} does not exist ({} passes)", index, passes.len());
            self.clear();
            return;
        };

        let changed = self.active != Some(index);
        self.active = Some(index);

        if force || changed || self.indices.len() != pass.group_count() {
            self.reset(pass.group_count());
        }
    }

    /// Reset to zeros if the vector length diverged from `pass`.
    ///
    /// Returns true when a reset happened.
    pub fn ensure_consistent(&mut self, pass: &PassInfo) -> bool {
        if self.indices.len() == pass.group_count() {
            return false;
        }
        log::debug!(
            "Selection length {} does not match {} groups, resetting",
            self.indices.len(),
            pass.group_count()
        );
        self.reset(pass.group_count());
        true
    }

    /// Choose `option` within keyword group `group` of `pass`
    pub fn select_option(&mut self, group: usize, option: usize, pass: &PassInfo) -> Result<(), SelectionError> {
        self.ensure_consistent(pass);

        let count = pass.group_count();
        let keyword_group = pass
            .keyword_groups()
            .get(group)
            .ok_or(SelectionError::GroupOutOfRange { group, count })?;

        if option >= keyword_group.len() {
            return Err(SelectionError::OptionOutOfRange {
                group,
                option,
                count: keyword_group.len(),
            });
        }

        self.indices[group] = option;
        Ok(())
    }

    /// Keywords of the current selection, empty options omitted
    pub fn current_keywords(&self, pass: &PassInfo) -> Vec<String> {
        pass.keyword_groups()
            .iter()
            .zip(&self.indices)
            .filter_map(|(group, &index)| group.option(index))
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_owned)
            .collect()
    }

    fn reset(&mut self, group_count: usize) {
        self.indices.clear();
        self.indices.resize(group_count, 0);
    }
}
