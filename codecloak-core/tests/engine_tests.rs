//! End-to-end engine tests over real temporary project trees

use codecloak_core::{
    EngineConfig, MappingStore, ObfuscationEngine, ReservedWords, Result, Workspace,
};
use std::fs;
use std::path::Path;

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn engine_for(root: &Path, config: EngineConfig) -> ObfuscationEngine {
    ObfuscationEngine::new(Workspace::discover(root).unwrap(), config)
}

// Discovery-style seeding the way the CLI does it: every package directory
// with direct sources is mapped, unless it is itself an output directory.
fn seed_discovered(store: &mut MappingStore, workspace: &Workspace, config: &EngineConfig) {
    for package in workspace.collect_packages(&config.source_suffixes) {
        if !store.is_obfuscated_package(&package) {
            store.obfuscate_package(&package);
        }
    }
}

#[test]
fn whole_tree_session_relocates_every_seeded_package() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("app/build.gradle"), "");
    write(
        &root.join("app/src/main/java/com/app/Main.java"),
        "package com.app;\npublic class Main {}\n",
    );
    write(
        &root.join("app/src/main/java/com/app/util/Text.kt"),
        "package com.app.util\nclass Text\n",
    );
    write(
        &root.join("app/src/main/kotlin/com/app/net/Client.kt"),
        "package com.app.net\nclass Client\n",
    );

    let workspace = Workspace::discover(root)?;
    let config = EngineConfig::default();
    let mut store = MappingStore::with_reserved(ReservedWords::none());
    seed_discovered(&mut store, &workspace, &config);
    let report = ObfuscationEngine::new(workspace, config).run(&mut store)?;

    // Discovery is sorted, so com.app -> a, com.app.net -> b, com.app.util -> c.
    assert_eq!(report.moved.len(), 3);
    assert!(root.join("app/src/main/java/a/Main.java").is_file());
    assert!(root.join("app/src/main/kotlin/b/Client.kt").is_file());
    assert!(root.join("app/src/main/java/c/Text.kt").is_file());
    assert!(!root.join("app/src/main/java/com/app/Main.java").exists());
    assert_eq!(
        store.class_mapping().get("com.app.net.Client"),
        Some(&"b.Client".to_string())
    );
    Ok(())
}

#[test]
fn second_session_over_the_same_tree_is_a_no_op() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let mapping_path = dir.path().join("mapping.txt");
    write(&root.join("app/build.gradle"), "");
    write(
        &root.join("app/src/main/java/com/app/Main.kt"),
        "package com.app\nclass Main\n",
    );

    let config = EngineConfig::default();

    let workspace = Workspace::discover(root)?;
    let mut store = MappingStore::with_reserved(ReservedWords::none());
    seed_discovered(&mut store, &workspace, &config);
    let first = ObfuscationEngine::new(workspace, config.clone()).run(&mut store)?;
    assert_eq!(first.moved.len(), 1);
    store.save(&mapping_path)?;

    // Fresh session: reload the artifact, re-discover the tree. Discovery now
    // sees the output directory "a", which must be neither re-seeded nor
    // re-moved.
    let workspace = Workspace::discover(root)?;
    let mut store = MappingStore::load_with(&mapping_path, ReservedWords::none())?;
    seed_discovered(&mut store, &workspace, &config);
    let second = ObfuscationEngine::new(workspace, config).run(&mut store)?;

    assert!(second.moved.is_empty());
    assert!(root.join("app/src/main/java/a/Main.kt").is_file());
    assert_eq!(store.dir_mapping().len(), 1);
    assert_eq!(store.class_mapping().len(), 1);
    Ok(())
}

#[test]
fn new_package_in_a_later_session_continues_the_sequence() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let mapping_path = dir.path().join("mapping.txt");
    write(&root.join("app/build.gradle"), "");
    write(
        &root.join("app/src/main/java/com/app/Main.kt"),
        "package com.app\nclass Main\n",
    );
    write(
        &root.join("app/src/main/java/com/app/util/Text.kt"),
        "package com.app.util\nclass Text\n",
    );

    let config = EngineConfig::default();
    let workspace = Workspace::discover(root)?;
    let mut store = MappingStore::with_reserved(ReservedWords::none());
    seed_discovered(&mut store, &workspace, &config);
    ObfuscationEngine::new(workspace, config.clone()).run(&mut store)?;
    store.save(&mapping_path)?;

    // A package added after the first session must pick up where the
    // restored counter left off, not reuse "a" or "b".
    write(
        &root.join("app/src/main/java/com/app/fresh/New.kt"),
        "package com.app.fresh\nclass New\n",
    );
    let workspace = Workspace::discover(root)?;
    let mut store = MappingStore::load_with(&mapping_path, ReservedWords::none())?;
    seed_discovered(&mut store, &workspace, &config);
    let report = ObfuscationEngine::new(workspace, config).run(&mut store)?;

    assert_eq!(
        report.moved.get("com.app.fresh.New"),
        Some(&"c.New".to_string())
    );
    assert!(root.join("app/src/main/java/c/New.kt").is_file());
    Ok(())
}

#[test]
fn manifest_root_package_files_gain_the_wildcard_import() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("app/build.gradle"), "");
    write(
        &root.join("app/src/main/AndroidManifest.xml"),
        "<manifest package=\"com.app\"><application /></manifest>",
    );
    write(
        &root.join("app/src/main/java/com/app/Main.kt"),
        "package com.app\n\nclass Main\n",
    );
    write(
        &root.join("app/src/main/java/com/app/util/Text.kt"),
        "package com.app.util\n\nclass Text\n",
    );

    let workspace = Workspace::discover(root)?;
    let config = EngineConfig::default();
    let mut store = MappingStore::with_reserved(ReservedWords::none());
    seed_discovered(&mut store, &workspace, &config);
    let report = ObfuscationEngine::new(workspace, config).run(&mut store)?;

    assert_eq!(report.imports_inserted, 1);
    let moved_main = fs::read_to_string(root.join("app/src/main/java/a/Main.kt")).unwrap();
    assert!(moved_main.contains("import com.app.*"));
    let moved_util = fs::read_to_string(root.join("app/src/main/java/b/Text.kt")).unwrap();
    assert!(!moved_util.contains("import com.app.*"));
    Ok(())
}

#[test]
fn non_source_files_and_subdirectories_stay_behind() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("app/build.gradle"), "");
    write(
        &root.join("app/src/main/java/com/app/Main.kt"),
        "package com.app\nclass Main\n",
    );
    write(&root.join("app/src/main/java/com/app/README.md"), "notes\n");
    write(
        &root.join("app/src/main/java/com/app/inner/Kept.kt"),
        "package com.app.inner\nclass Kept\n",
    );

    let workspace = Workspace::discover(root)?;
    let mut store = MappingStore::with_reserved(ReservedWords::none());
    // Only the parent package is mapped; the nested one is out of scope.
    store.obfuscate_package("com.app");
    ObfuscationEngine::new(workspace, EngineConfig::default()).run(&mut store)?;

    assert!(root.join("app/src/main/java/a/Main.kt").is_file());
    assert!(root.join("app/src/main/java/com/app/README.md").is_file());
    assert!(root.join("app/src/main/java/com/app/inner/Kept.kt").is_file());
    Ok(())
}

#[test]
fn seeded_rename_directs_the_move() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("app/build.gradle"), "");
    write(
        &root.join("app/src/main/java/com/app/Main.kt"),
        "package com.app\nclass Main\n",
    );
    write(
        &root.join("app/src/main/java/com/other/Other.kt"),
        "package com.other\nclass Other\n",
    );

    let workspace = Workspace::discover(root)?;
    let config = EngineConfig::default();
    let mut store = MappingStore::with_reserved(ReservedWords::none());
    store.seed_package_rename("com.app", "b")?;
    seed_discovered(&mut store, &workspace, &config);
    let report = ObfuscationEngine::new(workspace, config).run(&mut store)?;

    assert_eq!(report.moved.get("com.app.Main"), Some(&"b.Main".to_string()));
    assert!(root.join("app/src/main/java/b/Main.kt").is_file());
    // The seed consumed position 1, so the generated name skips to "c".
    assert_eq!(
        report.moved.get("com.other.Other"),
        Some(&"c.Other".to_string())
    );
    Ok(())
}

#[test]
fn unresolved_packages_are_dropped_but_empty_ones_kept() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("app/build.gradle"), "");
    write(
        &root.join("app/src/main/java/com/app/Main.kt"),
        "package com.app\nclass Main\n",
    );
    fs::create_dir_all(root.join("app/src/main/java/com/empty")).unwrap();

    let workspace = Workspace::discover(root)?;
    let mut store = MappingStore::with_reserved(ReservedWords::none());
    store.obfuscate_package("com.app");
    store.obfuscate_package("com.empty");
    store.obfuscate_package("net.vanished");
    let report = ObfuscationEngine::new(workspace, EngineConfig::default()).run(&mut store)?;

    assert_eq!(report.unresolved_packages, vec!["net.vanished".to_string()]);
    // The empty-but-present directory keeps its mapping for later sessions.
    assert_eq!(
        store.package_keys(),
        vec!["com.app".to_string(), "com.empty".to_string()]
    );
    Ok(())
}

#[test]
fn dry_run_leaves_the_tree_alone_but_predicts_the_session() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("app/build.gradle"), "");
    write(
        &root.join("app/src/main/AndroidManifest.xml"),
        "<manifest package=\"com.app\" />",
    );
    let source = root.join("app/src/main/java/com/app/Main.kt");
    write(&source, "package com.app\nclass Main\n");

    let workspace = Workspace::discover(root)?;
    let config = EngineConfig {
        dry_run: true,
        ..EngineConfig::default()
    };
    let mut store = MappingStore::with_reserved(ReservedWords::none());
    seed_discovered(&mut store, &workspace, &config);
    let report = ObfuscationEngine::new(workspace, config).run(&mut store)?;

    assert!(report.dry_run);
    assert_eq!(report.moved.get("com.app.Main"), Some(&"a.Main".to_string()));
    // The root-package file lacks the wildcard import, so a real session
    // would insert one; the dry run reports it without editing.
    assert_eq!(report.imports_inserted, 1);
    // No move, no import edit.
    assert_eq!(
        fs::read_to_string(&source).unwrap(),
        "package com.app\nclass Main\n"
    );
    assert!(!root.join("app/src/main/java/a").exists());
    Ok(())
}
