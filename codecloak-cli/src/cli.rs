use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use codecloak_core::{
    EngineConfig, MappingStore, ObfuscationEngine, ReservedWords, Workspace,
};

use crate::config::{self, ObfuscateSettings};

#[derive(Parser)]
#[command(name = "codecloak")]
#[command(about = "Package and class-path obfuscation for Gradle-style projects")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Obfuscate mapped packages and relocate their source files
    Obfuscate {
        /// Project root containing the Gradle modules
        #[arg(short, long)]
        project: PathBuf,
        /// Mapping artifact path (default: <project>/codecloak-mapping.txt)
        #[arg(short, long)]
        mapping: Option<PathBuf>,
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Restrict the session to these packages (repeatable);
        /// without it every package directory with sources is processed
        #[arg(long = "package")]
        packages: Vec<String>,
        /// Explicit AndroidManifest.xml path
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Report what the session would do without touching any file
        #[arg(long)]
        dry_run: bool,
    },
    /// Summarize an existing mapping artifact
    Inspect {
        #[arg(short, long)]
        mapping: PathBuf,
    },
}

pub fn obfuscate_command(
    project: PathBuf,
    mapping: Option<PathBuf>,
    config_path: Option<PathBuf>,
    packages: Vec<String>,
    manifest: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let settings =
        config::load_settings(project, mapping, config_path, packages, manifest, dry_run)?;
    info!(
        "obfuscating project {} (mapping: {})",
        settings.project.display(),
        settings.mapping_file.display()
    );

    let mut store = MappingStore::load_with(&settings.mapping_file, reserved_words(&settings))?;
    for (raw, replacement) in &settings.package_renames {
        store.seed_package_rename(raw, replacement)?;
    }

    let workspace = Workspace::discover(&settings.project)?;
    let engine_config = EngineConfig {
        source_suffixes: settings.source_suffixes.clone(),
        manifest_path: settings.manifest.clone(),
        dry_run: settings.dry_run,
    };

    let working_set = if settings.packages.is_empty() {
        workspace.collect_packages(&engine_config.source_suffixes)
    } else {
        settings.packages.clone()
    };
    for package in working_set {
        if store.is_obfuscated_package(&package) {
            warn!("package {package} is an obfuscated output directory, skipping");
            continue;
        }
        store.obfuscate_package(&package);
    }

    let engine = ObfuscationEngine::new(workspace, engine_config);
    let run_result = engine.run(&mut store);

    // The artifact is written even when the run failed partway, so completed
    // moves stay recorded and a later session can resume.
    if !settings.dry_run {
        store.save(&settings.mapping_file)?;
    }
    let report = run_result?;

    println!("🔒 Obfuscation Session");
    println!("======================");
    if report.dry_run {
        println!("DRY RUN - no files were touched");
    }
    println!("Packages mapped: {}", store.dir_mapping().len());
    println!("Classes processed this run: {}", report.moved.len());
    for (raw, obfuscated) in &report.moved {
        println!("  {raw} -> {obfuscated}");
    }
    if report.imports_inserted > 0 {
        println!("Wildcard imports inserted: {}", report.imports_inserted);
    }
    if !report.unresolved_packages.is_empty() {
        println!(
            "Unresolved packages dropped: {}",
            report.unresolved_packages.join(", ")
        );
    }
    if !report.dry_run {
        println!("Mapping written to {}", settings.mapping_file.display());
    }
    Ok(())
}

pub fn inspect_command(mapping: PathBuf) -> Result<()> {
    if !mapping.is_file() {
        bail!("mapping file {} not found", mapping.display());
    }
    let store = MappingStore::load(&mapping)?;

    println!("📋 Mapping Artifact");
    println!("===================");
    println!("File: {}", mapping.display());
    println!("Package entries: {}", store.dir_mapping().len());
    println!("Class entries: {}", store.class_mapping().len());
    println!("Next package index: {}", store.package_index() + 1);
    println!("Next class index: {}", store.class_index() + 1);
    if !store.dir_mapping().is_empty() {
        println!();
        println!("dir mapping:");
        for (raw, obfuscated) in store.dir_mapping() {
            println!("  {raw} -> {obfuscated}");
        }
    }
    if !store.class_mapping().is_empty() {
        println!();
        println!("class mapping:");
        for (raw, obfuscated) in store.class_mapping() {
            println!("  {raw} -> {obfuscated}");
        }
    }
    Ok(())
}

fn reserved_words(settings: &ObfuscateSettings) -> ReservedWords {
    if settings.reserved_words.is_empty() {
        ReservedWords::new()
    } else {
        ReservedWords::with_extra(settings.reserved_words.clone())
    }
}
