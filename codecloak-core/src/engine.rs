//! Obfuscation session orchestration
//!
//! One `run` walks every mapped package, relocates its direct source files
//! to their obfuscated package directories, and records each completed move
//! in the store. Packages no module can account for are dropped from the
//! mapping; everything else about a failed run stays recorded so a later
//! session can resume.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::{CodeCloakError, Result};
use crate::mapping::MappingStore;
use crate::workspace::{self, Workspace};
use crate::EngineConfig;

/// Drives a whole obfuscation session over one workspace.
pub struct ObfuscationEngine {
    workspace: Workspace,
    config: EngineConfig,
}

/// Outcome of one engine session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Raw class path -> obfuscated class path for every class processed in
    /// this run, in processing order. Distinct from the store's persistent
    /// class table, which also carries prior sessions.
    pub moved: IndexMap<String, String>,
    /// Packages dropped from the mapping because no module contains them.
    pub unresolved_packages: Vec<String>,
    /// Files that received the wildcard import ahead of their move.
    pub imports_inserted: usize,
    /// Whether the session only simulated its moves.
    pub dry_run: bool,
}

impl ObfuscationEngine {
    pub fn new(workspace: Workspace, config: EngineConfig) -> Self {
        Self { workspace, config }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Process every package currently mapped in the store.
    ///
    /// Per package: resolve the owning module and source root, list the
    /// package directory's direct source files sorted by name, and per file
    /// skip anything a prior session already produced, apply the
    /// wildcard-import hook when the package is the manifest root package,
    /// then move the file under its obfuscated package directory and record
    /// the pair. A package that resolves to no module is logged, skipped,
    /// and removed from the mapping once the pass is over. A missing or
    /// empty package directory is skipped and stays mapped.
    ///
    /// In dry-run mode the store still allocates and records, and the import
    /// count reflects the edits a real run would make, but no file is
    /// touched.
    pub fn run(&self, store: &mut MappingStore) -> Result<SessionReport> {
        let manifest_package = self.resolve_manifest_package()?;
        if let Some(pkg) = manifest_package.as_deref() {
            debug!("manifest root package: {pkg}");
        }

        let mut moved = IndexMap::new();
        let mut unresolved_packages = Vec::new();
        let mut imports_inserted = 0usize;

        for raw_package in store.package_keys() {
            let Some(location) = self.workspace.locate(&raw_package) else {
                warn!("no module contains package {raw_package}, dropping it from the mapping");
                unresolved_packages.push(raw_package);
                continue;
            };
            let files =
                workspace::list_source_files(&location.package_dir, &self.config.source_suffixes);
            if files.is_empty() {
                continue;
            }
            debug!(
                "package {raw_package}: {} source files in module {}",
                files.len(),
                location.module
            );
            for file in files {
                let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let raw_class_path = format!("{raw_package}.{stem}");
                if store.is_already_obfuscated(&raw_class_path) {
                    debug!("{raw_class_path} is already an obfuscated location, skipping");
                    continue;
                }
                if let Some(manifest_package) = manifest_package.as_deref() {
                    if raw_package == manifest_package {
                        let inserted = if self.config.dry_run {
                            workspace::wildcard_import_missing(&file, manifest_package)?
                        } else {
                            workspace::insert_wildcard_import(&file, manifest_package)?
                        };
                        if inserted {
                            imports_inserted += 1;
                        }
                    }
                }
                let obfuscated_path = store.obfuscate_path(&raw_class_path)?;
                let destination = destination_for(&location.source_root, &obfuscated_path, &file);
                if self.config.dry_run {
                    info!(
                        "dry-run: would move {} -> {}",
                        file.display(),
                        destination.display()
                    );
                } else {
                    workspace::relocate_file(&file, &destination)?;
                    debug!("moved {} -> {}", file.display(), destination.display());
                }
                store.record_class(&raw_class_path, &obfuscated_path);
                moved.insert(raw_class_path, obfuscated_path);
            }
        }

        for raw_package in &unresolved_packages {
            store.remove_package(raw_package);
        }

        info!(
            "session complete: {} classes processed, {} packages unresolved{}",
            moved.len(),
            unresolved_packages.len(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );
        Ok(SessionReport {
            moved,
            unresolved_packages,
            imports_inserted,
            dry_run: self.config.dry_run,
        })
    }

    fn resolve_manifest_package(&self) -> Result<Option<String>> {
        match &self.config.manifest_path {
            Some(path) if path.is_file() => workspace::read_manifest_package(path),
            Some(path) => Err(CodeCloakError::Configuration(format!(
                "manifest {} not found",
                path.display()
            ))),
            None => self.workspace.manifest_package(),
        }
    }
}

// Same source root as the origin, dots become directory separators, original
// suffix kept.
fn destination_for(source_root: &Path, obfuscated_class_path: &str, original: &Path) -> PathBuf {
    let mut destination = workspace::package_dir(source_root, obfuscated_class_path);
    if let Some(ext) = original.extension().and_then(|e| e.to_str()) {
        destination.set_extension(ext);
    }
    destination
}
