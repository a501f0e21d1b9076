//! Wire format of the debug buffer shared with the shader, and the pure
//! size/offset math derived from it.
//!
//! Everything is little-endian 32-bit words:
//!   [16-word header][unit 0][unit 1]...
//! where each unit is one count word followed by `capacity` entries of
//! three words each: type tag, raw value bits, mark id.

/// Fixed header at the start of the buffer, in words. Reserved; only read
/// back for diagnostic dumps.
pub const HEADER_WORDS: usize = 16;

/// Per-unit header: just the call count.
pub const UNIT_HEADER_WORDS: usize = 1;

/// One stored entry: type tag + raw value bits + mark id.
pub const ENTRY_WORDS: usize = 3;

/// Stored entries per unit when the caller does not pick a capacity.
pub const DEFAULT_CAPACITY: u32 = 20;

/// Type tags written by the shader into the first entry word.
pub const TYPE_U32: u32 = 1;
pub const TYPE_I32: u32 = 2;
pub const TYPE_F32: u32 = 3;

/// Mark id meaning "no mark attached to this value".
pub const MARK_UNSET: u32 = 999_999;

pub const WORD_BYTES: usize = std::mem::size_of::<u32>();

/// Size/offset calculator for one buffer configuration. Pure data; cheap to
/// copy around. Buffer sizes are fixed for the lifetime of a configuration,
/// so changing either field means reallocating the buffers it sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    /// Number of execution units (one per `dbg_init(uid)` caller).
    pub unit_count: u32,
    /// Max stored entries per unit; calls past this are counted, not stored.
    pub capacity: u32,
}

impl BufferLayout {
    pub fn new(unit_count: u32, capacity: u32) -> Self {
        assert!(capacity >= 1, "per-unit capacity must be at least 1");
        Self {
            unit_count,
            capacity,
        }
    }

    /// Layout with [`DEFAULT_CAPACITY`] stored entries per unit.
    pub fn with_default_capacity(unit_count: u32) -> Self {
        Self::new(unit_count, DEFAULT_CAPACITY)
    }

    /// Words occupied by one unit: count word + capacity entries.
    pub fn unit_words(&self) -> usize {
        UNIT_HEADER_WORDS + self.capacity as usize * ENTRY_WORDS
    }

    pub fn unit_bytes(&self) -> usize {
        self.unit_words() * WORD_BYTES
    }

    pub fn header_bytes(&self) -> usize {
        HEADER_WORDS * WORD_BYTES
    }

    pub fn total_words(&self) -> usize {
        HEADER_WORDS + self.unit_count as usize * self.unit_words()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_words() * WORD_BYTES
    }

    /// Word offset of a unit's count word.
    pub fn unit_offset(&self, uid: u32) -> usize {
        debug_assert!(uid < self.unit_count, "uid {uid} out of range");
        HEADER_WORDS + uid as usize * self.unit_words()
    }

    /// Word offset of the `entry`-th stored entry of a unit.
    pub fn entry_offset(&self, uid: u32, entry: u32) -> usize {
        debug_assert!(entry < self.capacity, "entry {entry} out of range");
        self.unit_offset(uid) + UNIT_HEADER_WORDS + entry as usize * ENTRY_WORDS
    }
}
