use std::fs;
use std::sync::Arc;
use std::thread;

use entimap::{Engine, EntityRegistry, MarshalConfig, MarshalError};
use tempfile::TempDir;

const TAG: &str = "@Entity() class Tag { @Id() id: number; label: string; }";
const TAG_V2: &str = r#"
    @Entity()
    @Table("TAGS")
    class Tag {
        @Id()
        id: number;

        @Column({ type: "varchar", length: 40 })
        label: string;

        @Column({ type: "boolean" })
        pinned: boolean;
    }
"#;

#[test]
fn test_load_dir_skips_broken_sources() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Tag.ts"), TAG).unwrap();
    fs::write(
        dir.path().join("Note.ts"),
        "class Note { @Id() id: number; body: string; }",
    )
    .unwrap();
    fs::write(dir.path().join("Broken.ts"), "class Broken { body: string; }").unwrap();
    fs::write(dir.path().join("README.md"), "not an entity").unwrap();

    let registry = EntityRegistry::new();
    let report = registry.load_dir(dir.path()).unwrap();

    assert_eq!(report.loaded, vec!["Note".to_string(), "Tag".to_string()]);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].0.ends_with("Broken.ts"));
    assert!(matches!(report.failures[0].1, MarshalError::Parse { .. }));
    assert!(!report.is_clean());
    assert_eq!(registry.len().unwrap(), 2);
}

#[test]
fn test_custom_file_extension() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Tag.entity"), TAG).unwrap();
    fs::write(dir.path().join("Ignored.ts"), TAG).unwrap();

    let registry = EntityRegistry::with_config(&MarshalConfig::new().entity_file_extension("entity"));
    let report = registry.load_dir(dir.path()).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.loaded, vec!["Tag".to_string()]);
}

#[test]
fn test_missing_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    let registry = EntityRegistry::new();
    assert!(matches!(
        registry.load_dir(dir.path().join("absent")),
        Err(MarshalError::Io(_))
    ));
}

#[test]
fn test_reregistration_replaces_mapping() {
    let engine = Engine::new();
    engine.register_source("Tag.ts", TAG).unwrap();
    let before = engine.mapping_xml("Tag").unwrap();
    assert!(before.contains(r#"table="TAG""#));

    engine.register_source("Tag.ts", TAG_V2).unwrap();
    let after = engine.mapping_xml("Tag").unwrap();
    assert!(after.contains(r#"table="TAGS""#));
    assert!(after.contains(r#"<property name="pinned" column="PINNED" type="boolean"/>"#));
    assert_eq!(engine.registry().len().unwrap(), 1);
}

#[test]
fn test_registering_same_source_twice_is_stable() {
    let engine = Engine::new();
    let once = engine.register_source("Tag.ts", TAG_V2).unwrap();
    let first = engine.mapping_xml("Tag").unwrap();

    let twice = engine.register_source("Tag.ts", TAG_V2).unwrap();
    assert_eq!(*twice, *once);
    assert_eq!(engine.mapping_xml("Tag").unwrap(), first);
}

#[test]
fn test_concurrent_registration_and_lookup() {
    let registry = Arc::new(EntityRegistry::new());
    let mut handles = vec![];

    for i in 0..8 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            let source = format!(
                "@Entity() class Item{} {{ @Id() id: number; name: string; }}",
                i
            );
            registry
                .parse_and_register(&format!("Item{}.ts", i), &source)
                .unwrap();

            for _ in 0..20 {
                let descriptor = registry.mapping(&format!("Item{}", i)).unwrap();
                assert_eq!(descriptor.table_name, format!("ITEM{}", i));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let names = registry.names().unwrap();
    assert_eq!(names.len(), 8);
    assert_eq!(names[0], "Item0");
}

#[test]
fn test_remove_entity() {
    let registry = EntityRegistry::new();
    registry.parse_and_register("Tag.ts", TAG).unwrap();

    assert!(registry.remove("Tag").unwrap().is_some());
    assert!(!registry.contains("Tag").unwrap());
    assert!(matches!(
        registry.mapping("Tag"),
        Err(MarshalError::EntityNotFound(_))
    ));
}
