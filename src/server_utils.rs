pub const DEFAULT_PORT: u16 = 8080;

pub fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_PORT)
}

/// Requested index if given, otherwise the next map in rotation.
pub fn resolve_map_index(requested: Option<usize>, rounds_started: usize, map_count: usize) -> usize {
    if map_count == 0 {
        return 0;
    }
    requested.unwrap_or(rounds_started) % map_count
}

/// Explicit seeds are used as-is; otherwise the clock is mixed with the
/// round counter so back-to-back rounds differ.
pub fn resolve_seed(requested: Option<u64>, now_ms: u64, rounds_started: usize) -> u64 {
    requested.unwrap_or_else(|| {
        now_ms ^ (rounds_started as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    })
}
