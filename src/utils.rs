//! Hashing helpers for the unique table.

/// [Szudzik pairing function][szudzik-pairing] with wrapping arithmetic.
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// Exact (and injective) while both inputs fit in 32 bits.
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing2(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// Nested pairing of three values; deterministic, not injective.
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// SplitMix64 finalizer.
///
/// Pairings of small ids cluster in the low bits, which are the bits the
/// bucket mask keeps.
pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Structural hash of a table entry.
pub trait MyHash {
    fn hash(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_pairing2_is_injective_on_small_grid() {
        let codes: HashSet<u64> = (0..64).flat_map(|a| (0..64).map(move |b| pairing2(a, b))).collect();
        assert_eq!(codes.len(), 64 * 64);
        assert_eq!(pairing2(3, 5), 28);
        assert_eq!(pairing2(5, 3), 33);
    }

    #[test]
    fn test_pairing_wraps_instead_of_overflowing() {
        let big = u64::MAX - 1;
        assert_eq!(pairing2(big, big), pairing2(big, big));
        assert_ne!(pairing3(1, 2, 3), pairing3(3, 2, 1));
    }

    #[test]
    fn test_mix64_spreads_low_bits() {
        let buckets: HashSet<u64> = (0..64u64).map(|i| mix64(i) & 0xff).collect();
        assert!(buckets.len() > 40);
    }
}
