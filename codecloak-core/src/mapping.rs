//! Mapping tables and the durable mapping artifact
//!
//! `MappingStore` owns the two name spaces of a session: the directory
//! table (raw package path -> obfuscated package path) and the class table
//! (raw class path -> obfuscated class path), together with the allocator
//! that feeds them. The store also reads and writes the mapping artifact,
//! a fixed-format text file consumers diff between runs and use to
//! reverse-map obfuscated stack traces.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::alphabet;
use crate::allocator::NameAllocator;
use crate::errors::{CodeCloakError, Result};
use crate::keywords::ReservedWords;

/// Section header preceding the package table in the artifact.
pub const DIR_MAPPING_HEADER: &str = "dir mapping:";
/// Section header preceding the class table in the artifact.
pub const CLASS_MAPPING_HEADER: &str = "class mapping:";

/// Session-scoped mapping state: both tables, their reverse indexes, and
/// the identifier allocator. One instance per session, single writer.
#[derive(Debug, Clone)]
pub struct MappingStore {
    dir_mapping: IndexMap<String, String>,
    class_mapping: IndexMap<String, String>,
    // Obfuscated class path -> raw class path. Mirror of class_mapping so
    // the already-obfuscated test is a lookup instead of a value scan.
    obfuscated_classes: HashMap<String, String>,
    // The same mirror for dir_mapping. Backs the output-directory check and
    // the rejection of seeds that would point two packages at one value.
    obfuscated_dirs: HashMap<String, String>,
    allocator: NameAllocator,
}

impl Default for MappingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingStore {
    pub fn new() -> Self {
        Self::with_reserved(ReservedWords::default())
    }

    pub fn with_reserved(reserved: ReservedWords) -> Self {
        Self {
            dir_mapping: IndexMap::new(),
            class_mapping: IndexMap::new(),
            obfuscated_classes: HashMap::new(),
            obfuscated_dirs: HashMap::new(),
            allocator: NameAllocator::new(reserved),
        }
    }

    /// Get-or-create the obfuscated package for a raw package path. A hit
    /// returns the stored value unchanged; a miss allocates the next free
    /// identifier and pins it for the lifetime of the mapping.
    pub fn obfuscate_package(&mut self, raw_package: &str) -> String {
        if let Some(existing) = self.dir_mapping.get(raw_package) {
            return existing.clone();
        }
        let generated = self.allocator.next_package_name();
        self.insert_dir_pair(raw_package, &generated);
        generated
    }

    /// Compute the obfuscated class path for a raw class path.
    ///
    /// A previously recorded class wins outright. Otherwise the path is
    /// split at the final `.`, the package prefix is obfuscated (allocating
    /// if needed), and the original simple class name is re-appended; class
    /// names themselves are not renamed. The composed result is not
    /// recorded here; recording happens once the file has actually moved.
    pub fn obfuscate_path(&mut self, raw_class_path: &str) -> Result<String> {
        if let Some(existing) = self.class_mapping.get(raw_class_path) {
            return Ok(existing.clone());
        }
        let (raw_package, class_name) = split_class_path(raw_class_path)?;
        let obfuscated_package = self.obfuscate_package(raw_package);
        Ok(format!("{obfuscated_package}.{class_name}"))
    }

    /// Whether some raw class path was already recorded as having been
    /// moved to exactly this location. This is a membership test against
    /// recorded *values*, not keys: a path that was computed but never
    /// recorded is not considered obfuscated.
    pub fn is_already_obfuscated(&self, class_path: &str) -> bool {
        self.obfuscated_classes.contains_key(class_path)
    }

    /// Whether this package path is itself the obfuscated side of some
    /// directory mapping. Keeps re-discovered output directories from being
    /// mapped a second time.
    pub fn is_obfuscated_package(&self, package: &str) -> bool {
        self.obfuscated_dirs.contains_key(package)
    }

    /// Record a completed raw -> obfuscated class relocation. First write
    /// wins; re-recording an existing raw path is a no-op, keeping the
    /// table append-only.
    pub fn record_class(&mut self, raw_class_path: &str, obfuscated: &str) {
        if self.class_mapping.contains_key(raw_class_path) {
            return;
        }
        self.class_mapping
            .insert(raw_class_path.to_string(), obfuscated.to_string());
        self.obfuscated_classes
            .insert(obfuscated.to_string(), raw_class_path.to_string());
    }

    /// Pre-seed a user-chosen package rename before any allocation runs.
    /// Re-seeding an existing key with a different value is rejected, since
    /// assigned mappings must never change. A replacement already claimed by
    /// a different package is rejected too: two packages sharing one
    /// destination would have the engine merge their directories and
    /// overwrite same-named files.
    pub fn seed_package_rename(&mut self, raw_package: &str, replacement: &str) -> Result<()> {
        match self.dir_mapping.get(raw_package) {
            Some(existing) if existing == replacement => Ok(()),
            Some(existing) => Err(CodeCloakError::Configuration(format!(
                "package {raw_package} is already mapped to {existing}, refusing to remap to {replacement}"
            ))),
            None => {
                if let Some(claimed_by) = self.obfuscated_dirs.get(replacement) {
                    return Err(CodeCloakError::Configuration(format!(
                        "replacement {replacement} is already taken by package {claimed_by}"
                    )));
                }
                self.note_package_value(replacement);
                self.insert_dir_pair(raw_package, replacement);
                Ok(())
            }
        }
    }

    /// Drop a package whose owning module could not be resolved. The only
    /// sanctioned removal from the directory table.
    pub fn remove_package(&mut self, raw_package: &str) {
        if let Some(value) = self.dir_mapping.shift_remove(raw_package) {
            self.obfuscated_dirs.remove(&value);
        }
    }

    /// Snapshot of the raw package keys, in insertion order. The engine
    /// iterates this copy so the table itself stays free to mutate.
    pub fn package_keys(&self) -> Vec<String> {
        self.dir_mapping.keys().cloned().collect()
    }

    pub fn dir_mapping(&self) -> &IndexMap<String, String> {
        &self.dir_mapping
    }

    pub fn class_mapping(&self) -> &IndexMap<String, String> {
        &self.class_mapping
    }

    /// Highest consumed package counter index (-1 when untouched).
    pub fn package_index(&self) -> i64 {
        self.allocator.package_index()
    }

    /// Highest consumed class counter index (-1 when untouched).
    pub fn class_index(&self) -> i64 {
        self.allocator.class_index()
    }

    /// Serialize both tables in the artifact format: each section is its
    /// header line followed by one tab-indented `raw -> obfuscated` line
    /// per entry in insertion order, with a blank line between sections.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "{DIR_MAPPING_HEADER}")?;
        for (raw, obfuscated) in &self.dir_mapping {
            writeln!(writer, "\t{raw} -> {obfuscated}")?;
        }
        writeln!(writer)?;
        writeln!(writer, "{CLASS_MAPPING_HEADER}")?;
        for (raw, obfuscated) in &self.class_mapping {
            writeln!(writer, "\t{raw} -> {obfuscated}")?;
        }
        Ok(())
    }

    /// Write the artifact to disk, truncating any previous content.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Load a prior session's artifact, or start fresh when none exists.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, ReservedWords::default())
    }

    pub fn load_with(path: &Path, reserved: ReservedWords) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::with_reserved(reserved));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse_with(&text, reserved))
    }

    /// Parse artifact text back into a store. Unknown or malformed lines
    /// are skipped, and both counters are restored to the highest index
    /// decodable from the loaded obfuscated values, so a resumed session
    /// keeps allocating past everything already assigned.
    pub fn parse(text: &str) -> Self {
        Self::parse_with(text, ReservedWords::default())
    }

    pub fn parse_with(text: &str, reserved: ReservedWords) -> Self {
        enum Section {
            None,
            Dir,
            Class,
        }

        let mut store = Self::with_reserved(reserved);
        let mut section = Section::None;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == DIR_MAPPING_HEADER {
                section = Section::Dir;
                continue;
            }
            if line == CLASS_MAPPING_HEADER {
                section = Section::Class;
                continue;
            }
            let Some((raw, obfuscated)) = line.split_once(" -> ") else {
                continue;
            };
            let (raw, obfuscated) = (raw.trim(), obfuscated.trim());
            if raw.is_empty() || obfuscated.is_empty() {
                continue;
            }
            match section {
                Section::Dir => {
                    store.note_package_value(obfuscated);
                    store.insert_dir_pair(raw, obfuscated);
                }
                Section::Class => {
                    if let Some(simple) = obfuscated.rsplit('.').next() {
                        if let Some(index) = alphabet::decode_upper(simple) {
                            store.allocator.mark_class_used(index);
                        }
                    }
                    store.record_class(raw, obfuscated);
                }
                Section::None => {}
            }
        }
        store
    }

    // Both directory maps move together.
    fn insert_dir_pair(&mut self, raw_package: &str, obfuscated: &str) {
        self.dir_mapping
            .insert(raw_package.to_string(), obfuscated.to_string());
        self.obfuscated_dirs
            .insert(obfuscated.to_string(), raw_package.to_string());
    }

    // Every decodable lowercase segment of an obfuscated package value is a
    // consumed counter position; the generator must never land on it again.
    // Segments past the counter range (None from decode) are unreachable by
    // the generator and need no mark.
    fn note_package_value(&mut self, value: &str) {
        for segment in value.split('.') {
            if let Some(index) = alphabet::decode_lower(segment) {
                self.allocator.mark_package_used(index);
            }
        }
    }
}

fn split_class_path(raw_class_path: &str) -> Result<(&str, &str)> {
    match raw_class_path.rsplit_once('.') {
        Some((package, class_name)) if !package.is_empty() && !class_name.is_empty() => {
            Ok((package, class_name))
        }
        _ => Err(CodeCloakError::InvalidClassPath(format!(
            "expected <package>.<ClassName>, got {raw_class_path:?}"
        ))),
    }
}
