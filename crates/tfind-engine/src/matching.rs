//! Case-insensitive substring matching.
//!
//! Scanning is left to right and non-overlapping: after a match at `p` of
//! length `L` the next attempt starts at `p + L`. Spans are byte ranges into
//! the original text and always fall on char boundaries.
//!
//! Lists of strings are matched string by string. A match never spans two
//! strings, so joining them can't create matches that aren't there.

/// Byte range of one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// An occurrence located inside a list of strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentMatch {
    /// Index of the string holding the occurrence.
    pub segment: usize,
    pub span: Span,
}

/// A search term prepared for repeated matching.
///
/// Folding the term once keeps per-item work down to scanning the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermMatcher {
    key: String,
    folded: Vec<char>,
    ascii: Option<Vec<u8>>,
}

impl TermMatcher {
    /// Prepares `term`. Returns `None` for an empty term, which matches nothing.
    pub fn new(term: &str) -> Option<Self> {
        if term.is_empty() {
            return None;
        }
        let folded: Vec<char> = term.chars().flat_map(char::to_lowercase).collect();
        let ascii = term.is_ascii().then(|| term.as_bytes().to_ascii_lowercase());
        Some(Self {
            key: folded.iter().collect(),
            folded,
            ascii,
        })
    }

    /// Case-folded term. Two terms with the same key match identically.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Iterates over all occurrences in `text`.
    pub fn spans<'t>(&'t self, text: &'t str) -> Matches<'t> {
        let inner = match &self.ascii {
            Some(needle) if text.is_ascii() => MatchesInner::Ascii {
                haystack: text.as_bytes(),
                needle,
            },
            _ => MatchesInner::Folded {
                units: fold_units(text),
                needle: &self.folded,
            },
        };
        Matches { inner, pos: 0 }
    }

    pub fn count(&self, text: &str) -> usize {
        self.spans(text).count()
    }

    /// The `n`th (1-based) occurrence in `text`.
    pub fn nth(&self, text: &str, n: usize) -> Option<Span> {
        let index = n.checked_sub(1)?;
        self.spans(text).nth(index)
    }

    /// Sum of per-string counts.
    pub fn count_segments<S: AsRef<str>>(&self, segments: &[S]) -> usize {
        segments.iter().map(|s| self.count(s.as_ref())).sum()
    }

    /// The `n`th (1-based) occurrence across `segments`, in segment order.
    pub fn locate_segments<S: AsRef<str>>(&self, segments: &[S], n: usize) -> Option<SegmentMatch> {
        let mut remaining = n.checked_sub(1)?;
        for (segment, text) in segments.iter().enumerate() {
            for span in self.spans(text.as_ref()) {
                if remaining == 0 {
                    return Some(SegmentMatch { segment, span });
                }
                remaining -= 1;
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy)]
struct FoldedUnit {
    ch: char,
    start: usize,
    end: usize,
}

fn fold_units(text: &str) -> Vec<FoldedUnit> {
    let mut units = Vec::with_capacity(text.len());
    for (start, ch) in text.char_indices() {
        let end = start + ch.len_utf8();
        for lower in ch.to_lowercase() {
            units.push(FoldedUnit {
                ch: lower,
                start,
                end,
            });
        }
    }
    units
}

enum MatchesInner<'t> {
    Ascii {
        haystack: &'t [u8],
        needle: &'t [u8],
    },
    Folded {
        units: Vec<FoldedUnit>,
        needle: &'t [char],
    },
}

/// Iterator over the occurrences of a term, see [`TermMatcher::spans`].
pub struct Matches<'t> {
    inner: MatchesInner<'t>,
    pos: usize,
}

impl Iterator for Matches<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        match &self.inner {
            MatchesInner::Ascii { haystack, needle } => {
                let len = needle.len();
                while self.pos + len <= haystack.len() {
                    let at = self.pos;
                    if haystack[at..at + len].eq_ignore_ascii_case(needle) {
                        self.pos = at + len;
                        return Some(Span {
                            start: at,
                            end: at + len,
                        });
                    }
                    self.pos += 1;
                }
                None
            }
            MatchesInner::Folded { units, needle } => {
                let len = needle.len();
                while self.pos + len <= units.len() {
                    let at = self.pos;
                    let window = &units[at..at + len];
                    if window.iter().zip(needle.iter()).all(|(u, c)| u.ch == *c) {
                        self.pos = at + len;
                        return Some(Span {
                            start: window[0].start,
                            end: window[len - 1].end,
                        });
                    }
                    self.pos += 1;
                }
                None
            }
        }
    }
}

/// Counts occurrences of `term` in `text`.
pub fn count_matches(text: &str, term: &str) -> usize {
    TermMatcher::new(term).map_or(0, |m| m.count(text))
}

/// Span of the `n`th (1-based) occurrence of `term` in `text`.
pub fn find_nth_occurrence(text: &str, term: &str, n: usize) -> Option<Span> {
    TermMatcher::new(term)?.nth(text, n)
}

/// Counts occurrences across a list of strings without joining them.
pub fn count_in_segments<S: AsRef<str>>(segments: &[S], term: &str) -> usize {
    TermMatcher::new(term).map_or(0, |m| m.count_segments(segments))
}

/// Locates the `n`th (1-based) occurrence across a list of strings.
pub fn locate_in_segments<S: AsRef<str>>(
    segments: &[S],
    term: &str,
    n: usize,
) -> Option<SegmentMatch> {
    TermMatcher::new(term)?.locate_segments(segments, n)
}
