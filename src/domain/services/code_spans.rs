use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{CodeSpan, Segment};

/// Opening fence, optional language tag terminated by a newline, then the
/// shortest run of text up to the next closing fence.
const FENCE_PATTERN: &str =
    r"(?s)```(?:([A-Za-z0-9_+#.\-]+)[ \t]*\r?\n|\r?\n)?(.*?)(?:\r?\n)?```";

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(FENCE_PATTERN).expect("fence pattern is valid"))
}

/// Locate fenced code blocks in `text`, in order of appearance.
///
/// Blocks never overlap. An opening fence without a matching closing fence is
/// left alone and produces no span.
pub fn extract_code_spans(text: &str) -> Vec<CodeSpan> {
    fence_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let language = caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            let code = caps
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Some(CodeSpan {
                language,
                code,
                range: whole.start()..whole.end(),
            })
        })
        .collect()
}

/// Split `text` into alternating plain and code segments covering the whole
/// input. Empty plain runs between adjacent blocks are dropped.
pub fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for span in extract_code_spans(text) {
        if span.range.start > last {
            segments.push(Segment::Plain(&text[last..span.range.start]));
        }
        last = span.range.end;
        segments.push(Segment::Code(span));
    }

    if last < text.len() {
        segments.push(Segment::Plain(&text[last..]));
    }

    segments
}
