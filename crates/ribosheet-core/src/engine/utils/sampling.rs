use rand::prelude::*;

/// RNG seeded from `seed`, or from OS entropy when no seed is configured.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Derives an independent per-job seed from a base seed (SplitMix64 finalizer).
pub fn job_seed(base: u64, job: usize) -> u64 {
    let mut z = base.wrapping_add((job as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
