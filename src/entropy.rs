//! Random numbers for referral codes and test transfers

use std::time::{SystemTime, UNIX_EPOCH};

/// Fill `buf` from the OS RNG, or from the clock and pid if it is unavailable
pub fn fill_random(buf: &mut [u8]) {
    if getrandom::getrandom(buf).is_ok() {
        return;
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let pid = std::process::id() as u128;
    let mut state = nanos ^ pid.rotate_left(17);

    for chunk in buf.chunks_mut(16) {
        // xorshift over the seed so consecutive chunks differ
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let bytes = state.to_le_bytes();
        chunk.copy_from_slice(&bytes[..chunk.len()]);
    }
}

pub fn random_u64() -> u64 {
    let mut bytes = [0u8; 8];
    fill_random(&mut bytes);
    u64::from_le_bytes(bytes)
}

pub fn random_u128() -> u128 {
    let mut bytes = [0u8; 16];
    fill_random(&mut bytes);
    u128::from_le_bytes(bytes)
}

/// Uniform-ish index in `0..len`. `len` must be non-zero.
pub fn random_index(len: usize) -> usize {
    (random_u64() % len as u64) as usize
}

/// Value in the inclusive range `[min, max]`; bounds may come in either order
pub fn random_in_range(min: u128, max: u128) -> u128 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    match (high - low).checked_add(1) {
        Some(span) => low + random_u128() % span,
        None => random_u128(),
    }
}
