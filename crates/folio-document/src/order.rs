// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Order inference — guess a page sequence from file names.
//
// Cover files are hoisted to the front. The rest are ordered by a number
// pulled out of the name, if one of the candidate patterns finds a usable
// sequence. An ambiguous result is a normal outcome, not an error; the caller
// decides the fallback.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Stems (or stem prefixes) that mark a cover page, compared case-insensitively.
pub const COVER_NAMES: &[&str] = &["cover", "front", "frontcover", "title", "capa"];

/// Share of non-cover names a pattern must number before it is considered.
pub const MIN_COVERAGE: f32 = 0.7;

/// Largest gap between neighbouring sorted numbers that still counts as a run.
pub const MAX_GAP: u64 = 2;

/// Confidence multiplier when only the range check passed.
const SPARSE_PENALTY: f32 = 0.75;

/// Where in the name the number is looked for. Tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberPattern {
    /// Digits at the very start of the stem.
    Leading,
    /// The first run of digits anywhere.
    Any,
    /// Digits at the very end of the stem.
    Trailing,
    /// The last run of digits, with anything non-numeric after it.
    Loose,
}

static PATTERNS: LazyLock<Vec<(NumberPattern, Regex)>> = LazyLock::new(|| {
    [
        (NumberPattern::Leading, r"^(\d+)"),
        (NumberPattern::Any, r"(\d+)"),
        (NumberPattern::Trailing, r"(\d+)$"),
        (NumberPattern::Loose, r"(\d+)\D*$"),
    ]
    .into_iter()
    .map(|(kind, src)| (kind, Regex::new(src).expect("ordering pattern is valid")))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMethod {
    None,
    Numeric,
}

/// Outcome of `infer`. Indices refer to the input slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingAnalysis {
    pub has_valid_order: bool,
    pub method: OrderingMethod,
    pub pattern: Option<NumberPattern>,
    /// Cover files, in input order.
    pub cover_items: Vec<usize>,
    /// Suggested sequence: covers first, then numbered pages. When no order
    /// was found this is the covers followed by the input order.
    pub order: Vec<usize>,
    /// 0 when no order was found, otherwise in (0, 1].
    pub confidence: f32,
}

impl OrderingAnalysis {
    /// The caller has to pick an order itself.
    pub fn is_ambiguous(&self) -> bool {
        !self.has_valid_order
    }

    /// Rearrange `items` according to `order`.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        self.order
            .iter()
            .filter_map(|&idx| slots.get_mut(idx).and_then(Option::take))
            .collect()
    }
}

/// File name without directories or extension.
fn stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Whether `name` designates a cover page.
pub fn is_cover(name: &str) -> bool {
    let stem = stem(name).to_lowercase();
    COVER_NAMES.iter().any(|cover| stem.starts_with(cover))
}

fn extract(regex: &Regex, name: &str) -> Option<u64> {
    regex
        .captures(stem(name))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// How a sorted number sequence holds up.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SequenceFit {
    /// Every gap is at most `MAX_GAP`.
    Consecutive,
    /// Gaps are wider but the whole range is within twice the count.
    Compact,
    Invalid,
}

fn sequence_fit(sorted: &[u64]) -> SequenceFit {
    if sorted.is_empty() {
        return SequenceFit::Invalid;
    }
    // Repeated numbers say nothing about order.
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return SequenceFit::Invalid;
    }
    if sorted.windows(2).all(|w| w[1] - w[0] <= MAX_GAP) {
        return SequenceFit::Consecutive;
    }
    let range = sorted[sorted.len() - 1] - sorted[0];
    if range <= 2 * sorted.len() as u64 {
        SequenceFit::Compact
    } else {
        SequenceFit::Invalid
    }
}

/// Analyse `names` and propose an order.
#[instrument(skip(names), fields(count = names.len()))]
pub fn infer<S: AsRef<str>>(names: &[S]) -> OrderingAnalysis {
    let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    let cover_items: Vec<usize> = (0..names.len()).filter(|&i| is_cover(names[i])).collect();
    let rest: Vec<usize> = (0..names.len())
        .filter(|i| !cover_items.contains(i))
        .collect();

    let ambiguous = |cover_items: Vec<usize>| {
        let mut order = cover_items.clone();
        order.extend(&rest);
        OrderingAnalysis {
            has_valid_order: false,
            method: OrderingMethod::None,
            pattern: None,
            cover_items,
            order,
            confidence: 0.0,
        }
    };

    if rest.is_empty() {
        return ambiguous(cover_items);
    }

    for (kind, regex) in PATTERNS.iter() {
        let numbered: Vec<(usize, u64)> = rest
            .iter()
            .filter_map(|&i| extract(regex, names[i]).map(|n| (i, n)))
            .collect();
        let coverage = numbered.len() as f32 / rest.len() as f32;
        if coverage < MIN_COVERAGE {
            debug!(pattern = ?kind, coverage, "pattern below coverage threshold");
            continue;
        }

        let mut sorted: Vec<u64> = numbered.iter().map(|&(_, n)| n).collect();
        sorted.sort_unstable();
        let multiplier = match sequence_fit(&sorted) {
            SequenceFit::Consecutive => 1.0,
            SequenceFit::Compact => SPARSE_PENALTY,
            SequenceFit::Invalid => {
                debug!(pattern = ?kind, "numbers do not form a sequence");
                continue;
            }
        };

        let mut paged = numbered.clone();
        paged.sort_by(|a, b| match a.1.cmp(&b.1) {
            Ordering::Equal => names[a.0].cmp(names[b.0]),
            other => other,
        });
        let mut unnumbered: Vec<usize> = rest
            .iter()
            .copied()
            .filter(|i| !numbered.iter().any(|(j, _)| j == i))
            .collect();
        unnumbered.sort_by(|a, b| names[*a].cmp(names[*b]));

        let mut order = cover_items.clone();
        order.extend(paged.iter().map(|&(i, _)| i));
        order.extend(unnumbered);

        let confidence = coverage * multiplier;
        debug!(pattern = ?kind, coverage, confidence, "order inferred");
        return OrderingAnalysis {
            has_valid_order: true,
            method: OrderingMethod::Numeric,
            pattern: Some(*kind),
            cover_items,
            order,
            confidence,
        };
    }

    ambiguous(cover_items)
}

/// Plain name order, covers not treated specially. The usual fallback when
/// `infer` comes back ambiguous.
pub fn lexicographic_order<S: AsRef<str>>(names: &[S]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..names.len()).collect();
    order.sort_by(|a, b| names[*a].as_ref().cmp(names[*b].as_ref()));
    order
}
