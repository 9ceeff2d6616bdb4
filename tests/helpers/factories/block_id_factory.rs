use ulid::Ulid;

/// Block ids carrying a known creation time.
pub struct BlockIdFactory;

impl BlockIdFactory {
    /// ULID for the given unix time in milliseconds.
    pub fn at_ms(ms: u64) -> String {
        Ulid::from_parts(ms, rand::random::<u128>()).to_string()
    }

    /// ULID for the given unix time in nanoseconds.
    pub fn at_nanos(nanos: i64) -> String {
        Self::at_ms((nanos / 1_000_000) as u64)
    }
}
