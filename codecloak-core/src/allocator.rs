//! Sequential short-name allocation for the two identifier name spaces

use crate::alphabet;
use crate::keywords::ReservedWords;

/// Counter index whose uppercase encoding is `R`. That letter belongs to the
/// generated resource class in Android builds, so the class-name sequence
/// steps over it.
pub const EXCLUDED_CLASS_INDEX: i64 = 17;

/// Allocates short synthetic identifiers from two independent counters, one
/// for package segments (lowercase) and one for class names (uppercase).
///
/// Both counters start at -1 and advance before every encoding, so the
/// first allocation consumes index 0. Consumed indices are never reused,
/// including the ones discarded by the reserved-word filter, which keeps
/// the produced sequence reproducible from any persisted counter position.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    reserved: ReservedWords,
    package_index: i64,
    class_index: i64,
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new(ReservedWords::default())
    }
}

impl NameAllocator {
    pub fn new(reserved: ReservedWords) -> Self {
        Self {
            reserved,
            package_index: -1,
            class_index: -1,
        }
    }

    /// Next package segment: lowercase, never a reserved word. Reserved
    /// candidates are discarded and their index stays consumed.
    pub fn next_package_name(&mut self) -> String {
        loop {
            self.package_index += 1;
            let candidate = alphabet::encode_lower(self.package_index);
            if !self.reserved.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Next class name: uppercase, with the single fixed skip over the
    /// excluded index.
    pub fn next_class_name(&mut self) -> String {
        self.class_index += 1;
        if self.class_index == EXCLUDED_CLASS_INDEX {
            self.class_index += 1;
        }
        alphabet::encode_upper(self.class_index)
    }

    /// Highest package index consumed so far (-1 when untouched).
    pub fn package_index(&self) -> i64 {
        self.package_index
    }

    /// Highest class index consumed so far (-1 when untouched).
    pub fn class_index(&self) -> i64 {
        self.class_index
    }

    /// Record that a package index was consumed by an earlier session, so
    /// future allocations resume past it.
    pub fn mark_package_used(&mut self, index: i64) {
        if index > self.package_index {
            self.package_index = index;
        }
    }

    /// Record that a class index was consumed by an earlier session.
    pub fn mark_class_used(&mut self, index: i64) {
        if index > self.class_index {
            self.class_index = index;
        }
    }
}
