//! Gradle-style workspace model
//!
//! Discovers modules (directories carrying a build file), resolves a raw
//! package path to the module and source root that own it, reads the
//! manifest root package, and performs the physical file edits the engine
//! drives: wildcard-import insertion and file relocation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{CodeCloakError, Result};

/// Build files that mark a directory as a module.
pub const DEFAULT_BUILD_FILES: &[&str] = &["build.gradle", "build.gradle.kts"];
/// Source roots checked inside each module, in lookup order.
pub const DEFAULT_SOURCE_ROOTS: &[&str] = &["src/main/java", "src/main/kotlin"];
/// File suffixes treated as relocatable source files.
pub const DEFAULT_SOURCE_SUFFIXES: &[&str] = &[".java", ".kt"];
/// Manifest location relative to a module root.
pub const MANIFEST_RELATIVE_PATH: &str = "src/main/AndroidManifest.xml";

/// Matches a Java/Kotlin package declaration line.
static PACKAGE_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*package\s+[A-Za-z_][A-Za-z0-9_.]*").unwrap());

/// One buildable module: its Gradle-style name, root directory, and the
/// source roots that actually exist on disk.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    root: PathBuf,
    source_roots: Vec<PathBuf>,
}

impl Module {
    fn from_dir(workspace_root: &Path, dir: &Path) -> Self {
        let source_roots = DEFAULT_SOURCE_ROOTS
            .iter()
            .map(|rel| dir.join(rel))
            .filter(|p| p.is_dir())
            .collect();
        Self {
            name: module_name(workspace_root, dir),
            root: dir.to_path_buf(),
            source_roots,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_RELATIVE_PATH)
    }
}

/// Where a raw package lives: the owning module, the source root under it,
/// and the package directory itself.
#[derive(Debug, Clone)]
pub struct PackageLocation {
    pub module: String,
    pub source_root: PathBuf,
    pub package_dir: PathBuf,
}

/// The project tree under obfuscation, resolved once per session.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    modules: Vec<Module>,
}

impl Workspace {
    /// Walk `root` and register every directory containing a recognized
    /// build file as a module, the root itself included when it qualifies.
    /// Hidden directories and Gradle `build` output directories are not
    /// descended into. Module order is stable: parents before children,
    /// siblings by name.
    pub fn discover(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(CodeCloakError::Configuration(format!(
                "project root {} is not a directory",
                root.display()
            )));
        }
        let mut modules = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e.file_name()));
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if has_build_file(entry.path()) {
                let module = Module::from_dir(root, entry.path());
                debug!("discovered module {} at {}", module.name(), entry.path().display());
                modules.push(module);
            }
        }
        Ok(Self {
            root: root.to_path_buf(),
            modules,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Resolve the first module × source root whose directory for this
    /// package path exists on disk.
    pub fn locate(&self, raw_package: &str) -> Option<PackageLocation> {
        for module in &self.modules {
            for source_root in &module.source_roots {
                let dir = package_dir(source_root, raw_package);
                if dir.is_dir() {
                    return Some(PackageLocation {
                        module: module.name.clone(),
                        source_root: source_root.clone(),
                        package_dir: dir,
                    });
                }
            }
        }
        None
    }

    /// Collect every package whose directory directly contains at least one
    /// source file, across all modules and source roots, sorted and
    /// deduplicated. Files sitting directly in a source root belong to the
    /// default package and are not collected.
    pub fn collect_packages(&self, suffixes: &[String]) -> Vec<String> {
        let mut packages = BTreeSet::new();
        for module in &self.modules {
            for source_root in &module.source_roots {
                for entry in WalkDir::new(source_root)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter()
                    .flatten()
                {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let Some(name) = entry.file_name().to_str() else {
                        continue;
                    };
                    if !is_source_file_name(name, suffixes) {
                        continue;
                    }
                    let Some(parent) = entry.path().parent() else {
                        continue;
                    };
                    let Ok(rel) = parent.strip_prefix(source_root) else {
                        continue;
                    };
                    if rel.as_os_str().is_empty() {
                        continue;
                    }
                    let package = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join(".");
                    packages.insert(package);
                }
            }
        }
        packages.into_iter().collect()
    }

    /// Root `package` attribute of the first module manifest found in
    /// module order, or `None` when no module carries a manifest.
    pub fn manifest_package(&self) -> Result<Option<String>> {
        for module in &self.modules {
            let manifest = module.manifest_path();
            if manifest.is_file() {
                return read_manifest_package(&manifest);
            }
        }
        Ok(None)
    }
}

// Only the root element's package attribute matters; everything else in
// the manifest is ignored.
#[derive(Debug, Deserialize)]
struct ManifestRoot {
    #[serde(rename = "@package")]
    package: Option<String>,
}

/// Read the root `package` attribute from a manifest file. Absent attribute
/// is `Ok(None)`; malformed XML is an error.
pub fn read_manifest_package(path: &Path) -> Result<Option<String>> {
    let text = fs::read_to_string(path)?;
    let root: ManifestRoot = quick_xml::de::from_str(&text)
        .map_err(|e| CodeCloakError::Manifest(format!("{}: {e}", path.display())))?;
    Ok(root.package)
}

/// Insert `import <package>.*` (with a trailing `;` for Java files) right
/// after the package declaration, or at the top of the file when there is
/// none. Returns whether an edit happened; a file already carrying the
/// import is left untouched.
pub fn insert_wildcard_import(path: &Path, package: &str) -> Result<bool> {
    let text = fs::read_to_string(path)?;
    let import_line = wildcard_import_line(path, package);
    if has_import_line(&text, &import_line) {
        return Ok(false);
    }
    let updated = match PACKAGE_DECLARATION.find(&text) {
        Some(m) => {
            let insert_at = text[m.end()..]
                .find('\n')
                .map(|i| m.end() + i + 1)
                .unwrap_or(text.len());
            let mut updated = String::with_capacity(text.len() + import_line.len() + 2);
            updated.push_str(&text[..insert_at]);
            if !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str(&import_line);
            updated.push('\n');
            updated.push_str(&text[insert_at..]);
            updated
        }
        None => format!("{import_line}\n{text}"),
    };
    fs::write(path, updated)?;
    Ok(true)
}

/// Report whether the file still lacks the wildcard import for `package`,
/// without touching it. Read-only counterpart of [`insert_wildcard_import`]
/// for dry runs.
pub fn wildcard_import_missing(path: &Path, package: &str) -> Result<bool> {
    let text = fs::read_to_string(path)?;
    Ok(!has_import_line(&text, &wildcard_import_line(path, package)))
}

fn has_import_line(text: &str, import_line: &str) -> bool {
    text.lines().any(|line| line.trim() == import_line)
}

fn wildcard_import_line(path: &Path, package: &str) -> String {
    if path.extension().and_then(|e| e.to_str()) == Some("java") {
        format!("import {package}.*;")
    } else {
        format!("import {package}.*")
    }
}

/// Immediate child files of `dir` with a matching suffix, sorted by name.
/// A missing or unreadable directory behaves like an empty one.
pub fn list_source_files(dir: &Path, suffixes: &[String]) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && is_source_file_name(name, suffixes) {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// Copy the file's bytes to `destination` (creating parent directories)
/// and remove the original. Copy-then-delete instead of rename so the move
/// works across mount points.
pub fn relocate_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = fs::read(source)?;
    fs::write(destination, bytes)?;
    fs::remove_file(source)?;
    Ok(())
}

/// Directory for a dot-separated package path under a source root.
pub fn package_dir(source_root: &Path, package: &str) -> PathBuf {
    let mut dir = source_root.to_path_buf();
    for segment in package.split('.') {
        dir.push(segment);
    }
    dir
}

fn module_name(workspace_root: &Path, dir: &Path) -> String {
    let rel = dir.strip_prefix(workspace_root).unwrap_or(dir);
    if rel.as_os_str().is_empty() {
        return ":".to_string();
    }
    let mut name = String::new();
    for component in rel.components() {
        name.push(':');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    name
}

fn has_build_file(dir: &Path) -> bool {
    DEFAULT_BUILD_FILES
        .iter()
        .any(|f| dir.join(f).is_file())
}

fn is_skipped_dir(name: &std::ffi::OsStr) -> bool {
    match name.to_str() {
        Some(name) => name.starts_with('.') || name == "build",
        None => false,
    }
}

fn is_source_file_name(name: &str, suffixes: &[String]) -> bool {
    !name.starts_with('.') && suffixes.iter().any(|s| name.ends_with(s.as_str()))
}
