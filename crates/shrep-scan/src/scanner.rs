//! Comment-aware directive scanning
//!
//! Locates `#pragma` lines that are live, i.e. not hidden inside a `//` line
//! comment or a `/* */` block comment. No shading-language grammar is
//! involved: block comments are resolved left to right with a cursor, and
//! line comments are re-checked per candidate.

/// Opens a block comment
pub const BLOCK_OPEN: &str = "/*";
/// Closes a block comment
pub const BLOCK_CLOSE: &str = "*/";
/// Starts a line comment
pub const LINE_COMMENT: &str = "//";
/// Introduces a preprocessor directive
pub const DIRECTIVE_MARKER: &str = "#pragma";

/// Half-open byte range `[start, end)` of a live block comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSpan {
    pub start: usize,
    pub end: usize,
}

impl CommentSpan {
    /// Number of bytes covered by the comment, markers included
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the given byte offset falls inside the comment
    pub fn contains(&self, offset: usize) -> bool {
        (self.start..self.end).contains(&offset)
    }
}

/// A live directive inside comment-stripped text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectiveOccurrence<'a> {
    /// Byte offset of the directive marker
    pub offset: usize,
    /// The rest of the source line, starting at the marker
    pub line: &'a str,
}

/// Returns true if a line comment opens between the start of `pos`'s line and
/// `pos` itself.
///
/// `floor` excludes bytes that belong to an already resolved block comment:
/// a `/` that closes `*/` right before a candidate is not a line comment.
fn hidden_by_line_comment(text: &str, pos: usize, floor: usize) -> bool {
    let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1).max(floor);
    // Include the candidate's first byte so that `//*` counts as hidden.
    let end = (pos + 1).min(text.len());
    text[line_start..end].contains(LINE_COMMENT)
}

/// Byte offset of the `\n` ending the line that contains `from`, or the text
/// length when the line is the last one.
fn line_end(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |i| from + i)
}

/// Resolve every live block comment in `text`, left to right.
///
/// A `/*` preceded on its line by `//` is discarded and the search resumes two
/// bytes after it. Once inside a live comment the close marker search is
/// unconditional; a comment with no close marker runs to the end of the text.
pub fn comment_spans(text: &str) -> Vec<CommentSpan> {
    let mut spans = Vec::new();
    let mut floor = 0;
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(BLOCK_OPEN) {
        let start = cursor + found;

        if hidden_by_line_comment(text, start, floor) {
            cursor = start + BLOCK_OPEN.len();
            continue;
        }

        let body = start + BLOCK_OPEN.len();
        let end = text[body..]
            .find(BLOCK_CLOSE)
            .map_or(text.len(), |i| body + i + BLOCK_CLOSE.len());

        spans.push(CommentSpan { start, end });
        floor = end;
        cursor = end;
    }

    spans
}

/// Remove every live block comment from `text`, keeping all other bytes in
/// order.
pub fn strip_block_comments(text: &str) -> String {
    let spans = comment_spans(text);
    if spans.is_empty() {
        return text.to_owned();
    }

    let removed: usize = spans.iter().map(CommentSpan::len).sum();
    let mut stripped = String::with_capacity(text.len() - removed);
    let mut kept_from = 0;

    for span in &spans {
        stripped.push_str(&text[kept_from..span.start]);
        kept_from = span.end;
    }
    stripped.push_str(&text[kept_from..]);

    stripped
}

/// Find the next live directive marker at or after `start`.
///
/// Expects block comments to be stripped already. A marker preceded on its
/// line by `//` is skipped and the search resumes at the end of that line.
pub fn find_live_directive(text: &str, start: usize) -> Option<usize> {
    let mut cursor = start;

    loop {
        let pos = cursor + text.get(cursor..)?.find(DIRECTIVE_MARKER)?;

        if !hidden_by_line_comment(text, pos, 0) {
            return Some(pos);
        }

        cursor = line_end(text, pos);
    }
}

/// Collect every live directive line of already-stripped text, in order.
pub fn live_directives(stripped: &str) -> Vec<DirectiveOccurrence<'_>> {
    let mut occurrences = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = find_live_directive(stripped, cursor) {
        let end = line_end(stripped, offset);
        occurrences.push(DirectiveOccurrence {
            offset,
            line: stripped[offset..end].trim_end_matches('\r'),
        });
        cursor = end + 1;
    }

    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        let stripped = strip_block_comments(text);
        live_directives(&stripped)
            .into_iter()
            .map(|occ| occ.line.to_string())
            .collect()
    }

    #[test]
    fn strips_single_block_comment() {
        assert_eq!(strip_block_comments("a /* b */ c"), "a  c");
    }

    #[test]
    fn strips_multiline_block_comment() {
        let text = "x\n/* one\ntwo\n*/y\n";
        assert_eq!(strip_block_comments(text), "x\ny\n");
    }

    #[test]
    fn leading_comment_is_removed() {
        assert_eq!(strip_block_comments("/* head */body"), "body");
    }

    #[test]
    fn trailing_single_byte_is_kept() {
        assert_eq!(strip_block_comments("/**/x"), "x");
        assert_eq!(strip_block_comments("a/**/b"), "ab");
    }

    #[test]
    fn text_without_comments_is_unchanged() {
        let text = "#pragma multi_compile A B\nvoid main() {}\n";
        assert_eq!(strip_block_comments(text), text);
    }

    #[test]
    fn unterminated_block_runs_to_end() {
        assert_eq!(strip_block_comments("keep /* lost\nforever"), "keep ");
        assert_eq!(
            comment_spans("ab/*cd"),
            vec![CommentSpan { start: 2, end: 6 }]
        );
    }

    #[test]
    fn open_marker_needs_its_own_close() {
        // "/*/" does not close itself
        assert_eq!(strip_block_comments("a/*/b*/c"), "ac");
    }

    #[test]
    fn block_open_after_line_comment_is_ignored() {
        let text = "// not /* a block\nkeep */ this\n";
        assert_eq!(strip_block_comments(text), text);
    }

    #[test]
    fn slash_star_after_double_slash_is_line_comment() {
        let text = "code //* still a line comment\nnext\n";
        assert!(comment_spans(text).is_empty());
    }

    #[test]
    fn many_false_candidates_on_one_line() {
        let text = "// /* /* /* /*\n/* real */x";
        assert_eq!(
            comment_spans(text),
            vec![CommentSpan { start: 15, end: 25 }]
        );
        assert_eq!(strip_block_comments(text), "// /* /* /* /*\nx");
    }

    #[test]
    fn line_marker_inside_resolved_block_does_not_hide() {
        let text = "/* // */ /* gone */ kept";
        assert_eq!(strip_block_comments(text), "  kept");
    }

    #[test]
    fn close_marker_followed_by_open_marker() {
        assert_eq!(strip_block_comments("a/* x *//* y */b"), "ab");
    }

    #[test]
    fn stripping_is_idempotent() {
        let samples = [
            "a /* b */ c /* d\n e */ f",
            "/* lead */\n#pragma multi_compile A\n/* tail",
            "x /* one */ y /* two */ z",
            "plain text\nwith lines\n",
        ];
        for sample in samples {
            let once = strip_block_comments(sample);
            assert_eq!(strip_block_comments(&once), once, "sample: {sample:?}");
        }
    }

    #[test]
    fn span_helpers() {
        let span = CommentSpan { start: 3, end: 8 };
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
        assert!(span.contains(3));
        assert!(!span.contains(8));
    }

    #[test]
    fn finds_first_directive() {
        let text = "void f();\n#pragma multi_compile A\n";
        assert_eq!(find_live_directive(text, 0), Some(10));
        assert_eq!(find_live_directive(text, 11), None);
    }

    #[test]
    fn directive_after_line_comment_is_hidden() {
        let text = "/* a */ /* b */\nx; // #pragma multi_compile HIDDEN\n";
        let stripped = strip_block_comments(text);
        assert_eq!(find_live_directive(&stripped, 0), None);
    }

    #[test]
    fn hidden_directive_skips_rest_of_line() {
        let text = "// #pragma a #pragma b\n#pragma c\n";
        assert_eq!(find_live_directive(text, 0), Some(23));
    }

    #[test]
    fn start_offset_out_of_range() {
        assert_eq!(find_live_directive("#pragma x", 100), None);
    }

    #[test]
    fn collects_live_lines_in_order() {
        let text = "// #pragma multi_compile X\n#pragma multi_compile Y Z\n";
        assert_eq!(lines(text), vec!["#pragma multi_compile Y Z"]);
    }

    #[test]
    fn directive_in_block_comment_is_dropped() {
        let text = "/*\n#pragma multi_compile GONE\n*/\n#pragma shader_feature KEPT\n";
        assert_eq!(lines(text), vec!["#pragma shader_feature KEPT"]);
    }

    #[test]
    fn last_line_without_newline() {
        let text = "#pragma multi_compile A\r\n#pragma multi_compile B";
        assert_eq!(
            lines(text),
            vec!["#pragma multi_compile A", "#pragma multi_compile B"]
        );
    }

    #[test]
    fn occurrence_offsets_point_at_marker() {
        let stripped = "  #pragma a\n#pragma b\n";
        let found = live_directives(stripped);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].offset, 2);
        assert_eq!(found[1].offset, 12);
        assert_eq!(found[1].line, "#pragma b");
    }
}
