//! CodeCloak: package and class-path obfuscation for Gradle-style source trees
//!
//! The library renames packages to short synthetic identifiers, physically
//! relocates `.java`/`.kt` files to match, and keeps a durable text mapping
//! so repeated sessions stay stable: the same raw name maps to the same
//! obfuscated name forever, and already-relocated files are left alone.

pub mod alphabet;
pub mod allocator;
pub mod engine;
pub mod errors;
pub mod keywords;
pub mod mapping;
pub mod workspace;

// Re-exports
pub use allocator::{NameAllocator, EXCLUDED_CLASS_INDEX};
pub use engine::{ObfuscationEngine, SessionReport};
pub use errors::{CodeCloakError, Result};
pub use keywords::ReservedWords;
pub use mapping::MappingStore;
pub use workspace::{Module, PackageLocation, Workspace};

use std::path::PathBuf;

/// Session configuration for the obfuscation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// File suffixes treated as relocatable source files.
    pub source_suffixes: Vec<String>,
    /// Explicit manifest path, overriding per-module manifest discovery.
    pub manifest_path: Option<PathBuf>,
    /// Compute and report the session without touching any file.
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_suffixes: workspace::DEFAULT_SOURCE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            manifest_path: None,
            dry_run: false,
        }
    }
}
