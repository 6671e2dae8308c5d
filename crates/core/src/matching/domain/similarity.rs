//! Ratcliff/Obershelp sequence similarity.
//!
//! Finds the longest common contiguous block, then recurses on the pieces to
//! its left and right. The ratio `2 * M / (|a| + |b|)` counts every character
//! in those blocks, so it rewards long shared substrings and is sensitive to
//! reordering.

use std::collections::HashMap;

/// Sequences at least this long are eligible for the autojunk heuristic.
const AUTOJUNK_MIN_LEN: usize = 200;

/// A common block: `a[a..a + size] == b[b..b + size]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

/// Character-level matcher comparing `a` against `b`.
///
/// `b` is indexed up front, so reuse one matcher per `b` when comparing
/// repeatedly.
pub struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    pub fn new(a: &'a [char], b: &'a [char]) -> Self {
        Self::build(a, b, false)
    }

    /// Enables the "popular element" heuristic: when `b` has 200 or more
    /// characters, characters occurring more than `len / 100 + 1` times are
    /// never used to seed a match.
    pub fn with_autojunk(a: &'a [char], b: &'a [char]) -> Self {
        Self::build(a, b, true)
    }

    fn build(a: &'a [char], b: &'a [char], autojunk: bool) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        if autojunk && b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Among equally long blocks the one starting earliest in `a` wins, then
    /// the one starting earliest in `b`. Returns a zero-size block at
    /// `(alo, blo)` when nothing matches.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // j2len[j] = length of the match ending at a[i - 1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next_j2len: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let previous = j
                        .checked_sub(1)
                        .and_then(|p| j2len.get(&p))
                        .copied()
                        .unwrap_or(0);
                    let k = previous + 1;
                    next_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Characters dropped by autojunk can still extend a seeded match
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        Block {
            a: best_i,
            b: best_j,
            size: best_size,
        }
    }

    /// Non-overlapping common blocks in increasing order, with adjacent
    /// blocks merged.
    pub fn matching_blocks(&self) -> Vec<Block> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }
            if alo < block.a && blo < block.b {
                pending.push((alo, block.a, blo, block.b));
            }
            if block.a + block.size < ahi && block.b + block.size < bhi {
                pending.push((block.a + block.size, ahi, block.b + block.size, bhi));
            }
            blocks.push(block);
        }

        blocks.sort_by_key(|blk| (blk.a, blk.b));

        let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
        for block in blocks {
            match merged.last_mut() {
                Some(last) if last.a + last.size == block.a && last.b + last.size == block.b => {
                    last.size += block.size;
                }
                _ => merged.push(block),
            }
        }
        merged
    }

    /// Similarity in `[0, 1]`; two empty sequences are identical.
    pub fn ratio(&self) -> f64 {
        let matches: usize = self.matching_blocks().iter().map(|blk| blk.size).sum();
        calculate_ratio(matches, self.a.len() + self.b.len())
    }

    /// Upper bound on [`ratio`](Self::ratio) from shared character counts.
    pub fn quick_ratio(&self) -> f64 {
        quick_ratio(self.a, self.b)
    }

    /// Upper bound on [`quick_ratio`](Self::quick_ratio) from lengths alone.
    pub fn real_quick_ratio(&self) -> f64 {
        real_quick_ratio(self.a, self.b)
    }
}

/// Multiset-intersection bound, computed without indexing `b` for matching.
pub fn quick_ratio(a: &[char], b: &[char]) -> f64 {
    let mut available: HashMap<char, usize> = HashMap::new();
    for &c in b {
        *available.entry(c).or_default() += 1;
    }

    let mut matches = 0;
    for c in a {
        if let Some(count) = available.get_mut(c).filter(|n| **n > 0) {
            *count -= 1;
            matches += 1;
        }
    }
    calculate_ratio(matches, a.len() + b.len())
}

pub fn real_quick_ratio(a: &[char], b: &[char]) -> f64 {
    calculate_ratio(a.len().min(b.len()), a.len() + b.len())
}

fn calculate_ratio(matches: usize, length: usize) -> f64 {
    if length == 0 {
        return 1.0;
    }
    2.0 * matches as f64 / length as f64
}
