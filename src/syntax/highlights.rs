//! Highlight ranges and decoration sets
//!
//! Turns raw captures into the sorted, renderable decoration set that the
//! host editor paints. Decoration tokens are cached per class name.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::languages::LanguageId;
use super::parser::lock;
use super::query::Capture;

/// Default prefix prepended to capture names to form class names
pub const DEFAULT_CLASS_PREFIX: &str = "ts-";

/// Renderable style token for one class name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Decoration {
    /// Class name, e.g. `ts-keyword`
    pub class: Arc<str>,
}

/// A decorated half-open byte range `[from, to)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightRange {
    pub from: usize,
    pub to: usize,
    pub decoration: Arc<Decoration>,
}

impl HighlightRange {
    pub fn class(&self) -> &str {
        &self.decoration.class
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.from && offset < self.to
    }
}

/// Complete highlight state for a document revision.
///
/// Ranges are sorted by `from`, then `to`. Ranges with the same bounds keep
/// extraction order, so the later one paints last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecorationSet {
    ranges: Vec<HighlightRange>,
    /// Document revision this corresponds to
    pub revision: u64,
    /// Language the ranges were computed with
    pub language: Option<LanguageId>,
}

impl DecorationSet {
    /// An empty set (plain, unstyled text)
    pub fn empty(revision: u64) -> Self {
        Self {
            ranges: Vec::new(),
            revision,
            language: None,
        }
    }

    pub fn ranges(&self) -> &[HighlightRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Ranges covering `offset`, in paint order
    pub fn decorations_at(&self, offset: usize) -> impl Iterator<Item = &HighlightRange> {
        // Ranges are sorted by `from`; nothing after the first `from > offset` can cover it
        let end = self.ranges.partition_point(|r| r.from <= offset);
        self.ranges[..end].iter().filter(move |r| r.contains(offset))
    }

    /// Ranges intersecting `[from, to)`, e.g. the visible viewport
    pub fn in_range(&self, from: usize, to: usize) -> impl Iterator<Item = &HighlightRange> {
        let end = self.ranges.partition_point(|r| r.from < to);
        self.ranges[..end].iter().filter(move |r| r.to > from)
    }

    /// Number of ranges per class name
    pub fn class_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for range in &self.ranges {
            *counts.entry(range.class()).or_insert(0) += 1;
        }
        counts
    }
}

/// Maps captures to decoration sets, reusing one `Decoration` per class name
pub struct RangeCompiler {
    prefix: String,
    cache: Mutex<HashMap<Arc<str>, Arc<Decoration>>>,
}

impl Default for RangeCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_CLASS_PREFIX)
    }
}

impl RangeCompiler {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn class_prefix(&self) -> &str {
        &self.prefix
    }

    /// Class name for a capture name
    pub fn class_name(&self, capture: &str) -> String {
        format!("{}{}", self.prefix, capture)
    }

    /// Number of distinct decoration tokens allocated so far
    pub fn cached_decorations(&self) -> usize {
        lock(&self.cache).len()
    }

    fn decoration_for(
        &self,
        cache: &mut HashMap<Arc<str>, Arc<Decoration>>,
        capture: &Arc<str>,
    ) -> Arc<Decoration> {
        if let Some(decoration) = cache.get(capture) {
            return Arc::clone(decoration);
        }
        let decoration = Arc::new(Decoration {
            class: Arc::from(self.class_name(capture)),
        });
        cache.insert(Arc::clone(capture), Arc::clone(&decoration));
        decoration
    }

    /// Build the decoration set for one document revision
    pub fn compile(
        &self,
        captures: Vec<Capture>,
        language: LanguageId,
        revision: u64,
    ) -> DecorationSet {
        let mut ranges: Vec<HighlightRange> = {
            let mut cache = lock(&self.cache);
            captures
                .iter()
                .map(|capture| {
                    debug_assert!(capture.start < capture.end, "zero-width capture");
                    HighlightRange {
                        from: capture.start,
                        to: capture.end,
                        decoration: self.decoration_for(&mut cache, &capture.name),
                    }
                })
                .collect()
        };

        // Stable: equal bounds keep extraction order
        ranges.sort_by_key(|r| (r.from, r.to));
        dedup_keep_last(&mut ranges);

        DecorationSet {
            ranges,
            revision,
            language: Some(language),
        }
    }
}

/// Remove ranges that repeat a later range's bounds and class.
///
/// Keeping the later copy leaves the paint order of distinct classes intact.
fn dedup_keep_last(ranges: &mut Vec<HighlightRange>) {
    let mut keep = vec![true; ranges.len()];
    let mut group_start = 0;
    while group_start < ranges.len() {
        let bounds = (ranges[group_start].from, ranges[group_start].to);
        let mut group_end = group_start + 1;
        while group_end < ranges.len() && (ranges[group_end].from, ranges[group_end].to) == bounds {
            group_end += 1;
        }
        for i in group_start..group_end {
            keep[i] = !ranges[i + 1..group_end]
                .iter()
                .any(|later| later.decoration == ranges[i].decoration);
        }
        group_start = group_end;
    }

    let mut flags = keep.into_iter();
    ranges.retain(|_| flags.next().unwrap_or(true));
}
