//! shrep-scan - Directive scanning and keyword indexing
//!
//! This crate provides:
//! - Comment-aware lookup of live `#pragma` directives
//! - Parsing of `multi_compile` / `shader_feature` lines into keyword groups
//! - The keyword vocabulary and display hints

pub mod directive;
pub mod scanner;

pub use directive::{
    DirectiveFamily, KeywordGroup, KeywordVocabulary, build_hint, index_source,
    parse_directive_line, variant_count,
};
pub use scanner::{
    CommentSpan, DirectiveOccurrence, comment_spans, find_live_directive, live_directives,
    strip_block_comments,
};
