use std::ops::Range;

/// A fenced code block found in assistant text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSpan {
    /// Language tag from the opening fence, empty when absent.
    pub language: String,
    /// Raw code between the fences, without the newline after the opening
    /// fence or the one before the closing fence.
    pub code: String,
    /// Byte range of the whole fenced block (fences included) in the source.
    pub range: Range<usize>,
}

impl CodeSpan {
    pub fn language(&self) -> Option<&str> {
        if self.language.is_empty() {
            None
        } else {
            Some(&self.language)
        }
    }
}

/// A piece of turn content, either plain text or a code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Code(CodeSpan),
}
