use thiserror::Error;

/// Errors returned by [`RbTreeMap`](crate::RbTreeMap) operations.
///
/// Every operation that can fail does all of its fallible work before the
/// first structural edit, so an `Err` always leaves the map as it was.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("key already exists")]
    KeyAlreadyExists,

    #[error("key not found")]
    KeyNotFound,

    #[error("out of memory: node storage could not grow")]
    OutOfMemory,

    #[error("corrupt serialized data: {0}")]
    CorruptSerializedData(#[from] Corruption),

    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] Violation),
}

pub type Result<T> = core::result::Result<T, Error>;

/// Why a serialized blob was rejected by [`RbTreeMap::load`](crate::RbTreeMap::load).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    #[error("blob is {len} bytes, shorter than the {header} byte header")]
    TruncatedHeader { len: usize, header: usize },

    #[error("capacity {capacity} exceeds the addressable slot count")]
    CapacityTooLarge { capacity: u64 },

    #[error("blob is {actual} bytes, layout requires {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("count {count} exceeds capacity {capacity}")]
    CountExceedsCapacity { count: u64, capacity: u64 },

    #[error("{field} index {index} is out of bounds for capacity {capacity}")]
    IndexOutOfBounds {
        field: &'static str,
        index: u64,
        capacity: usize,
    },

    #[error("slot {slot} has invalid color byte {byte:#04x}")]
    InvalidColor { slot: usize, byte: u8 },

    #[error("freelist holds {free} slots but {expected} are free")]
    FreeListMismatch { free: usize, expected: usize },

    #[error("root does not match the live node count")]
    RootMismatch,
}

/// The first broken invariant found by [`RbTreeMap::validate`](crate::RbTreeMap::validate).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    #[error("root slot {slot} is red")]
    RedRoot { slot: usize },

    #[error("red slot {slot} has a red child")]
    RedRed { slot: usize },

    #[error("black-height differs below slot {slot}")]
    BlackHeight { slot: usize },

    #[error("keys out of order at slot {slot}")]
    Order { slot: usize },

    #[error("slot {slot} does not point back to its parent")]
    ParentLink { slot: usize },

    #[error("slot {slot} is reachable twice or is on the freelist")]
    SharedSlot { slot: usize },

    #[error("{reachable} reachable nodes but count is {count}")]
    Count { reachable: usize, count: usize },

    #[error("{live} live and {free} free slots do not add up to capacity {capacity}")]
    Capacity { live: usize, free: usize, capacity: usize },
}
