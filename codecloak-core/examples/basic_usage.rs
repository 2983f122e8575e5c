//! Basic usage example for the CodeCloak mapping library

use codecloak_core::{MappingStore, ReservedWords};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A fresh session carrying the standard Java/Kotlin keyword set
    let mut store = MappingStore::with_reserved(ReservedWords::new());

    println!("=== Package Mapping ===");
    let packages = [
        "com.example.app",
        "com.example.app.network",
        "com.example.app.ui",
    ];
    for package in packages {
        let obfuscated = store.obfuscate_package(package);
        println!("{package} -> {obfuscated}");
    }

    // Asking again returns the pinned value, no new allocation
    println!("\nRepeat lookup: {}", store.obfuscate_package("com.example.app"));

    println!("\n=== Class Paths ===");
    let class_paths = [
        "com.example.app.MainActivity",
        "com.example.app.network.ApiClient",
    ];
    for class_path in class_paths {
        let obfuscated = store.obfuscate_path(class_path)?;
        // The engine records a pair once the file has actually moved; the
        // example records it directly.
        store.record_class(class_path, &obfuscated);
        println!("{class_path} -> {obfuscated}");
    }

    println!("\n=== Mapping Artifact ===");
    let mut buffer = Vec::new();
    store.write_to(&mut buffer)?;
    print!("{}", String::from_utf8(buffer)?);

    Ok(())
}
