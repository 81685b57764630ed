//! Constant-time comparisons for values an attacker gets to choose.
//!
//! Anchor ids and heights arrive from peers. Comparing them with `==` lets a
//! prober time how many leading bytes of a forged value were right, so the
//! EC checks go through these helpers instead. Both operands are widened to
//! fixed 8-byte little-endian arrays and compared with `subtle`, which never
//! exits early.

use subtle::ConstantTimeEq;

/// Constant-time equality of two `u64` values.
pub fn ct_eq_u64(a: u64, b: u64) -> bool {
    a.to_le_bytes().ct_eq(&b.to_le_bytes()).into()
}
