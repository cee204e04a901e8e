//! Callout Annotation
//!
//! Splits message text on `[<digits>]` citation markers. The result is a
//! sequence of plain segments, each followed by the label of the marker that
//! ended it:
//!
//! ```text
//! "a[1]b[2]c"  =>  Text("a") Callout("1") Text("b") Callout("2") Text("c")
//! ```
//!
//! A marker at either end yields an empty text segment on that side. Surfaces
//! decide how a callout looks; the terminal draws it as superscript digits.

use std::iter::FusedIterator;
use std::sync::LazyLock;

use regex::{Matches, Regex};

static CALLOUT: LazyLock<Regex> = LazyLock::new(|| {
    // ASCII digits only; `\d` would also accept other Unicode digits
    Regex::new(r"\[[0-9]+\]").expect("callout pattern is valid")
});

/// One display segment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'t> {
    /// Plain text (may be empty)
    Text(&'t str),
    /// Citation label, brackets stripped
    Callout(&'t str),
}

impl<'t> Segment<'t> {
    /// The segment's text content
    #[must_use]
    pub fn as_str(&self) -> &'t str {
        match self {
            Segment::Text(s) | Segment::Callout(s) => s,
        }
    }
}

/// Annotated view over a message's text
///
/// Holds only the borrowed text; every call to [`IntoIterator::into_iter`]
/// rescans from the start, so the sequence can be walked any number of times.
#[derive(Clone, Copy, Debug)]
pub struct Annotated<'t> {
    text: &'t str,
}

/// Annotate a message body
#[must_use]
pub fn annotate(text: &str) -> Annotated<'_> {
    Annotated { text }
}

impl<'t> Annotated<'t> {
    /// Iterate segments
    #[must_use]
    pub fn segments(&self) -> Segments<'t> {
        Segments {
            text: self.text,
            matches: CALLOUT.find_iter(self.text),
            cursor: 0,
            pending: None,
            finished: false,
        }
    }

    /// Whether the text has at least one callout
    #[must_use]
    pub fn has_callouts(&self) -> bool {
        CALLOUT.is_match(self.text)
    }
}

impl<'t> IntoIterator for Annotated<'t> {
    type Item = Segment<'t>;
    type IntoIter = Segments<'t>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments()
    }
}

impl<'t> IntoIterator for &Annotated<'t> {
    type Item = Segment<'t>;
    type IntoIter = Segments<'t>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments()
    }
}

/// Lazy segment iterator
#[derive(Debug)]
pub struct Segments<'t> {
    text: &'t str,
    matches: Matches<'static, 't>,
    cursor: usize,
    pending: Option<&'t str>,
    finished: bool,
}

impl<'t> Iterator for Segments<'t> {
    type Item = Segment<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(label) = self.pending.take() {
            return Some(Segment::Callout(label));
        }
        if self.finished {
            return None;
        }

        match self.matches.next() {
            Some(m) => {
                let plain = &self.text[self.cursor..m.start()];
                // The match is `[` digits `]`, all single-byte
                self.pending = Some(&self.text[m.start() + 1..m.end() - 1]);
                self.cursor = m.end();
                Some(Segment::Text(plain))
            }
            None => {
                self.finished = true;
                Some(Segment::Text(&self.text[self.cursor..]))
            }
        }
    }
}

impl FusedIterator for Segments<'_> {}
