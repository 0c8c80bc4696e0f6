//! Primary-key generation.
//!
//! Entities take their id from an injected [`IdGenerator`], so storage does
//! not decide the id format.

use rand::Rng;

/// Produces primary keys for new entities.
pub trait IdGenerator: Send + Sync {
    /// Generate a fresh id.
    fn generate(&self) -> String;
}

/// Random v4 UUIDs in hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// The URL-safe nanoid alphabet.
pub const NANOID_ALPHABET: &[u8; 64] =
    b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

/// Compact URL-safe ids (nanoid format).
#[derive(Debug, Clone, Copy)]
pub struct NanoIdGenerator {
    size: usize,
}

impl NanoIdGenerator {
    /// Standard 21-character ids.
    #[must_use]
    pub const fn new() -> Self {
        Self { size: 21 }
    }

    /// Ids of `size` characters.
    #[must_use]
    pub const fn with_size(size: usize) -> Self {
        Self { size }
    }
}

impl Default for NanoIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for NanoIdGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.size)
            .map(|_| char::from(NANOID_ALPHABET[rng.gen_range(0..NANOID_ALPHABET.len())]))
            .collect()
    }
}
