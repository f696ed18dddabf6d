//! Chunk plans for streaming tests.
//!
//! Deterministic plans (fixed sizes, markup-aware boundaries) plus seeded fuzz
//! plans, so every failure reproduces from its label.

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoundaryPolicy {
    /// Chunks split only on `char` boundaries; usable with `&str` writes.
    Utf8Aligned,
    /// Any byte offset; multi-byte characters may be split.
    ByteStream,
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryPolicy::Utf8Aligned => f.write_str("utf8"),
            BoundaryPolicy::ByteStream => f.write_str("bytes"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChunkPlan {
    Fixed {
        size: usize,
        policy: BoundaryPolicy,
    },
    Boundaries {
        indices: Vec<usize>,
        policy: BoundaryPolicy,
    },
}

impl fmt::Display for ChunkPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkPlan::Fixed { size, policy } => write!(f, "fixed size={size} policy={policy}"),
            ChunkPlan::Boundaries { indices, policy } => write!(
                f,
                "boundaries count={} policy={policy} indices={indices:?}",
                indices.len()
            ),
        }
    }
}

impl ChunkPlan {
    pub fn fixed(size: usize) -> Self {
        Self::Fixed {
            size,
            policy: BoundaryPolicy::Utf8Aligned,
        }
    }

    pub fn fixed_unaligned(size: usize) -> Self {
        Self::Fixed {
            size,
            policy: BoundaryPolicy::ByteStream,
        }
    }

    pub fn boundaries(indices: impl Into<Vec<usize>>) -> Self {
        Self::Boundaries {
            indices: indices.into(),
            policy: BoundaryPolicy::Utf8Aligned,
        }
    }

    pub fn boundaries_unaligned(indices: impl Into<Vec<usize>>) -> Self {
        Self::Boundaries {
            indices: indices.into(),
            policy: BoundaryPolicy::ByteStream,
        }
    }

    pub fn policy(&self) -> BoundaryPolicy {
        match self {
            ChunkPlan::Fixed { policy, .. } | ChunkPlan::Boundaries { policy, .. } => *policy,
        }
    }

    /// Split offsets for `input`, strictly increasing and inside `(0, len)`.
    ///
    /// Aligned fixed-size plans round each cut up to the next `char`
    /// boundary instead of failing on multi-byte input.
    pub fn split_points(&self, input: &str) -> Vec<usize> {
        let len = input.len();
        let mut points = match self {
            ChunkPlan::Fixed { size, policy } => {
                assert!(*size > 0, "chunk size must be > 0");
                let mut out = Vec::new();
                let mut offset = *size;
                while offset < len {
                    if *policy == BoundaryPolicy::Utf8Aligned {
                        while !input.is_char_boundary(offset) {
                            offset += 1;
                        }
                    }
                    out.push(offset);
                    offset += size;
                }
                out
            }
            ChunkPlan::Boundaries { indices, policy } => {
                filter_boundaries_by_policy(input, indices, *policy)
            }
        };
        points.sort_unstable();
        points.dedup();
        points.retain(|&idx| idx > 0 && idx < len);
        points
    }

    pub fn byte_chunks<'a>(&self, input: &'a str) -> Vec<&'a [u8]> {
        let bytes = input.as_bytes();
        let mut out = Vec::new();
        let mut last = 0;
        for idx in self.split_points(input) {
            out.push(&bytes[last..idx]);
            last = idx;
        }
        if last < bytes.len() {
            out.push(&bytes[last..]);
        }
        out
    }

    /// Panics for byte-stream plans; use [`ChunkPlan::byte_chunks`] there.
    pub fn str_chunks<'a>(&self, input: &'a str) -> Vec<&'a str> {
        assert_eq!(
            self.policy(),
            BoundaryPolicy::Utf8Aligned,
            "str chunks need a UTF-8 aligned plan: {self}"
        );
        let mut out = Vec::new();
        let mut last = 0;
        for idx in self.split_points(input) {
            out.push(&input[last..idx]);
            last = idx;
        }
        if last < input.len() {
            out.push(&input[last..]);
        }
        out
    }
}

#[derive(Clone, Debug)]
pub struct ChunkPlanCase {
    pub label: String,
    pub plan: ChunkPlan,
}

/// Deterministic plus `fuzz_runs` seeded plans for `input`.
///
/// Deterministic plans cover fixed sizes and splits around `<`, `</`, `>`,
/// `&`, `;` and quotes.
pub fn build_chunk_plans(
    input: &str,
    fuzz_runs: usize,
    fuzz_seed: u64,
    policy: BoundaryPolicy,
) -> Vec<ChunkPlanCase> {
    let mut plans = Vec::new();

    for size in [1usize, 2, 3, 4, 8, 16, 32, 64] {
        let plan = match policy {
            BoundaryPolicy::Utf8Aligned => ChunkPlan::fixed(size),
            BoundaryPolicy::ByteStream => ChunkPlan::fixed_unaligned(size),
        };
        plans.push(ChunkPlanCase {
            label: format!("fixed size={size}"),
            plan,
        });
    }

    let token_boundaries = token_boundary_indices(input, policy);
    if !token_boundaries.is_empty() {
        plans.push(ChunkPlanCase {
            label: format!("token-boundaries count={}", token_boundaries.len()),
            plan: boundaries_plan(token_boundaries.clone(), policy),
        });
    }

    if fuzz_runs > 0 {
        let mut candidates = boundaries_by_policy(input, policy);
        candidates.extend(token_boundaries);
        candidates.sort_unstable();
        candidates.dedup();
        for i in 0..fuzz_runs {
            let seed = fuzz_seed.wrapping_add(i as u64);
            let mut rng = Lcg::new(seed);
            let plan = if candidates.is_empty() {
                boundaries_plan(Vec::new(), policy)
            } else {
                let max = candidates.len().clamp(1, 32);
                let mut picks = candidates.clone();
                rng.shuffle(&mut picks);
                picks.truncate(1 + rng.gen_range(max));
                picks.sort_unstable();
                boundaries_plan(picks, policy)
            };
            plans.push(ChunkPlanCase {
                label: format!("fuzz boundaries seed=0x{seed:016x}"),
                plan,
            });
        }
    }

    plans
}

pub fn build_chunk_plans_utf8(input: &str, fuzz_runs: usize, fuzz_seed: u64) -> Vec<ChunkPlanCase> {
    build_chunk_plans(input, fuzz_runs, fuzz_seed, BoundaryPolicy::Utf8Aligned)
}

/// Every interior `char` boundary of `input`.
pub fn utf8_internal_boundaries(input: &str) -> Vec<usize> {
    boundaries_by_policy(input, BoundaryPolicy::Utf8Aligned)
}

fn boundaries_plan(indices: Vec<usize>, policy: BoundaryPolicy) -> ChunkPlan {
    match policy {
        BoundaryPolicy::Utf8Aligned => ChunkPlan::boundaries(indices),
        BoundaryPolicy::ByteStream => ChunkPlan::boundaries_unaligned(indices),
    }
}

fn token_boundary_indices(input: &str, policy: BoundaryPolicy) -> Vec<usize> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    for (i, &b) in bytes.iter().enumerate() {
        if matches!(b, b'<' | b'>' | b'"' | b'\'' | b'&' | b';' | b'/') {
            out.push(i);
            out.push(i + 1);
        }
    }
    out.sort_unstable();
    out.dedup();
    filter_boundaries_by_policy(input, &out, policy)
}

fn boundaries_by_policy(input: &str, policy: BoundaryPolicy) -> Vec<usize> {
    let candidates: Vec<usize> = (1..input.len()).collect();
    filter_boundaries_by_policy(input, &candidates, policy)
}

fn filter_boundaries_by_policy(
    input: &str,
    indices: &[usize],
    policy: BoundaryPolicy,
) -> Vec<usize> {
    indices
        .iter()
        .copied()
        .filter(|&idx| idx > 0 && idx < input.len())
        .filter(|&idx| policy == BoundaryPolicy::ByteStream || input.is_char_boundary(idx))
        .collect()
}

/// Small deterministic PRNG; reproducible across platforms.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    pub fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() >> 32) as usize % upper
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.gen_range(i + 1);
            items.swap(i, j);
        }
    }
}
