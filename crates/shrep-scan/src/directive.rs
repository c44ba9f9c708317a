//! Keyword groups from `multi_compile` / `shader_feature` directives

use std::collections::HashSet;

use crate::scanner::{self, LINE_COMMENT};

/// Token standing for "no keyword from this axis"
pub const EMPTY_KEYWORD_TOKEN: &str = "_";

/// Character budget of a group hint
pub const HINT_BUDGET: usize = 18;

const HINT_ELLIPSIS: &str = "...";

/// Directive families that declare keyword axes
///
/// Suffixed spellings (`multi_compile_local`, `shader_feature_fragment`, ...)
/// belong to the family of their base keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveFamily {
    MultiCompile,
    ShaderFeature,
}

impl DirectiveFamily {
    /// Base keyword of the family
    pub fn keyword(self) -> &'static str {
        match self {
            DirectiveFamily::MultiCompile => "multi_compile",
            DirectiveFamily::ShaderFeature => "shader_feature",
        }
    }

    /// Classify a directive word such as `multi_compile_local`
    pub fn from_keyword(word: &str) -> Option<Self> {
        [DirectiveFamily::MultiCompile, DirectiveFamily::ShaderFeature]
            .into_iter()
            .find(|family| {
                word.strip_prefix(family.keyword())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('_'))
            })
    }
}

/// Ordered keyword options declared by one directive
///
/// The empty string stands for "no keyword defined by this axis". A group
/// always holds at least one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordGroup {
    family: DirectiveFamily,
    options: Vec<String>,
}

impl KeywordGroup {
    /// Build a group from explicit options; `None` when `options` is empty.
    pub fn new(family: DirectiveFamily, options: Vec<String>) -> Option<Self> {
        if options.is_empty() {
            None
        } else {
            Some(Self { family, options })
        }
    }

    pub fn family(&self) -> DirectiveFamily {
        self.family
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Distinct keywords seen across every group, in first-seen order
///
/// Display plumbing only; nothing in variant selection reads it.
#[derive(Debug, Clone, Default)]
pub struct KeywordVocabulary {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl KeywordVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a keyword; returns false if it was already known or empty.
    pub fn insert(&mut self, keyword: &str) -> bool {
        if keyword.is_empty() || self.seen.contains(keyword) {
            return false;
        }
        self.seen.insert(keyword.to_owned());
        self.ordered.push(keyword.to_owned());
        true
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.seen.contains(keyword)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn clear(&mut self) {
        self.ordered.clear();
        self.seen.clear();
    }
}

/// Parse one directive line into a keyword group.
///
/// Returns `None` for lines that are not `multi_compile`/`shader_feature`
/// directives and for directives that declare no tokens. A `shader_feature`
/// with a single real keyword gains an implicit empty option in front, so the
/// feature can be switched off; with two or more keywords no option is added.
pub fn parse_directive_line(
    line: &str,
    vocabulary: &mut KeywordVocabulary,
) -> Option<KeywordGroup> {
    let code = line.find(LINE_COMMENT).map_or(line, |i| &line[..i]);

    let mut words = code.split_whitespace();
    let family = words.by_ref().find_map(DirectiveFamily::from_keyword)?;
    let tokens: Vec<&str> = words.collect();

    if tokens.is_empty() {
        log::trace!("Directive without keywords skipped: {:?}", line);
        return None;
    }

    let mut options = Vec::with_capacity(tokens.len() + 1);
    for token in &tokens {
        if *token == EMPTY_KEYWORD_TOKEN {
            options.push(String::new());
        } else {
            vocabulary.insert(token);
            options.push((*token).to_string());
        }
    }

    if family == DirectiveFamily::ShaderFeature
        && tokens.len() == 1
        && tokens[0] != EMPTY_KEYWORD_TOKEN
    {
        options.insert(0, String::new());
    }

    KeywordGroup::new(family, options)
}

/// Short display preview of a group, at most [`HINT_BUDGET`] characters.
pub fn build_hint(group: &KeywordGroup) -> String {
    let mut hint = String::with_capacity(HINT_BUDGET * 3);

    for option in group.options().iter().filter(|o| !o.is_empty()) {
        if !hint.is_empty() {
            hint.push(',');
        }
        hint.push_str(option);
        if hint.chars().count() >= HINT_BUDGET {
            break;
        }
    }

    if hint.chars().count() > HINT_BUDGET {
        let keep = HINT_BUDGET - HINT_ELLIPSIS.len();
        let cut = hint.char_indices().nth(keep).map_or(hint.len(), |(i, _)| i);
        hint.truncate(cut);
        hint.push_str(HINT_ELLIPSIS);
    }

    hint
}

/// Strip comments, find live directives and parse each into a group.
pub fn index_source(source: &str, vocabulary: &mut KeywordVocabulary) -> Vec<KeywordGroup> {
    let stripped = scanner::strip_block_comments(source);

    scanner::live_directives(&stripped)
        .into_iter()
        .filter_map(|occurrence| parse_directive_line(occurrence.line, vocabulary))
        .collect()
}

/// Number of distinct variants spanned by the groups (saturating)
pub fn variant_count(groups: &[KeywordGroup]) -> u128 {
    groups
        .iter()
        .fold(1u128, |count, group| count.saturating_mul(group.len() as u128))
}
