//! Source coordinates for expression sites.

/// A character range inside an expression's source text.
///
/// Expression sites remember where they came from so that a compiled
/// replacement can be generated lazily from the same text later.
///
/// # Examples
///
/// ```
/// use core_types::SourceRange;
///
/// let range = SourceRange::new(4, 9);
/// assert_eq!(range.slice("foo.bar.baz()"), Some("bar.baz()"));
/// assert_eq!(range.end(), 13);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    /// Index of the first character
    pub start: usize,
    /// Number of characters in the range
    pub offset: usize,
}

impl SourceRange {
    /// Create a range starting at `start` spanning `offset` characters
    pub fn new(start: usize, offset: usize) -> Self {
        Self { start, offset }
    }

    /// Range covering the whole of `source`
    pub fn whole(source: &str) -> Self {
        Self::new(0, source.chars().count())
    }

    /// One past the last character
    pub fn end(&self) -> usize {
        self.start + self.offset
    }

    /// Extract the covered text, or `None` when the range is out of bounds
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        let mut indices = source
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(source.len()));
        let begin = indices.nth(self.start)?;
        let end = if self.offset == 0 {
            begin
        } else {
            indices.nth(self.offset - 1)?
        };
        source.get(begin..end)
    }
}
