use std::collections::{BTreeMap, BTreeSet};

use camino::{Utf8Path, Utf8PathBuf};
use rmx_texture::{hash_file, CollisionPolicy};
use rmx_usda::{Error, ModBuilder, RootLayer, WriteOutcome};

const DDPF_FOURCC: u32 = 0x4;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A 4x4 DXT5 texture: 128 header bytes followed by a 16 byte mip 0 and a
/// trailing mip chain.
fn dds(mip0: u8, tail: u8) -> Vec<u8> {
    let mut bytes = vec![0u8; 128];
    bytes[0..4].copy_from_slice(b"DDS ");
    bytes[4..8].copy_from_slice(&124u32.to_le_bytes());
    bytes[12..16].copy_from_slice(&4u32.to_le_bytes());
    bytes[16..20].copy_from_slice(&4u32.to_le_bytes());
    bytes[80..84].copy_from_slice(&DDPF_FOURCC.to_le_bytes());
    bytes[84..88].copy_from_slice(b"DXT5");
    bytes.extend(std::iter::repeat(mip0).take(16));
    bytes.extend(std::iter::repeat(tail).take(8));
    bytes
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Fixture {
    fn new(files: &[(&str, Vec<u8>)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap().to_path_buf();
        for (name, bytes) in files {
            let path = root.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, bytes).unwrap();
        }
        Self { _dir: dir, root }
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.root.join(name)).unwrap()
    }
}

/// Assignment lines (`<type> inputs:<name> = <value>`) per material block.
fn inputs_by_material(text: &str) -> BTreeMap<String, BTreeSet<String>> {
    let mut materials: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut current = None;
    for line in text.lines().map(str::trim) {
        if let Some(name) = line.strip_prefix("over \"mat_") {
            let name = name.trim_end_matches('"').to_string();
            materials.entry(name.clone()).or_default();
            current = Some(name);
        } else if line.contains(" inputs:") {
            let assignment = line.trim_end_matches(" (").to_string();
            if let Some(name) = &current {
                materials.entry(name.clone()).or_default().insert(assignment);
            }
        }
    }
    materials
}

fn input_names(assignments: &BTreeSet<String>) -> BTreeSet<String> {
    assignments
        .iter()
        .filter_map(|line| {
            let rest = line.split(" inputs:").nth(1)?;
            Some(rest.split(' ').next()?.to_string())
        })
        .collect()
}

#[test]
fn test_named_groups_without_hashing() {
    init_tracing();
    let fixture = Fixture::new(&[
        ("wood.dds", dds(1, 0)),
        ("wood_normal.dds", dds(2, 0)),
        ("wood_rough.dds", dds(3, 0)),
    ]);

    let result = ModBuilder::new(fixture.root.clone())
        .with_output_name("generated")
        .build()
        .unwrap();

    assert_eq!(result.created, vec![fixture.root.join("generated.usda")]);
    assert_eq!(result.materials, 1);
    assert_eq!(result.textures, 3);
    assert!(result.collisions.is_empty());

    let materials = inputs_by_material(&fixture.read("generated.usda"));
    assert_eq!(materials.len(), 1);
    let wood = &materials["wood"];
    assert!(wood.contains("asset inputs:diffuse_texture = @./wood.dds@"));
    assert!(wood.contains("asset inputs:normalmap_texture = @./wood_normal.dds@"));
    assert!(wood.contains("asset inputs:reflectionroughness_texture = @./wood_rough.dds@"));
    assert!(wood.contains("int inputs:encoding = 0"));
    assert_eq!(
        input_names(wood),
        ["diffuse_texture", "encoding", "normalmap_texture", "reflectionroughness_texture"]
            .into_iter()
            .map(String::from)
            .collect()
    );
}

#[test]
fn test_hash_collision_keeps_first_seen_group() {
    init_tracing();
    let fixture = Fixture::new(&[
        ("oak.dds", dds(7, 1)),
        ("oak_normal.dds", dds(2, 0)),
        // Same mip 0 as oak.dds, different mip chain.
        ("wood.dds", dds(7, 9)),
        ("wood_rough.dds", dds(3, 0)),
    ]);
    let key = hash_file(&fixture.root.join("oak.dds")).unwrap();
    assert_eq!(key, hash_file(&fixture.root.join("wood.dds")).unwrap());

    let result = ModBuilder::new(fixture.root.clone())
        .with_output_name("generated")
        .with_hashing(true)
        .with_hash_filter(true)
        .build()
        .unwrap();

    assert_eq!(result.materials, 1);
    assert_eq!(result.collisions.len(), 1);
    assert_eq!(result.collisions[0].kept, "oak");
    assert_eq!(result.collisions[0].dropped, "wood");

    let materials = inputs_by_material(&fixture.read("generated.usda"));
    assert_eq!(materials.len(), 1);
    let block = &materials[key.as_str()];
    assert!(block.contains("asset inputs:diffuse_texture = @./oak.dds@"));
    assert!(block.contains("asset inputs:normalmap_texture = @./oak_normal.dds@"));
    assert!(!input_names(block).contains("reflectionroughness_texture"));
}

#[test]
fn test_collision_policy_error_aborts_before_writing() {
    init_tracing();
    let fixture = Fixture::new(&[("oak.dds", dds(7, 0)), ("wood.dds", dds(7, 0))]);

    let err = ModBuilder::new(fixture.root.clone())
        .with_hashing(true)
        .with_collision_policy(CollisionPolicy::Error)
        .build()
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Texture(rmx_texture::Error::IdentityCollision { .. })
    ));
    assert!(!fixture.root.join("mod.usda").exists());
}

#[test]
fn test_every_role_is_bound() {
    init_tracing();
    let fixture = Fixture::new(&[
        ("props/lamp.dds", dds(1, 0)),
        ("props/lamp_emissive.dds", dds(2, 0)),
        ("props/lamp_metallic.dds", dds(3, 0)),
        ("props/lamp_normal.dds", dds(4, 0)),
        ("props/lamp_rough.dds", dds(5, 0)),
    ]);

    ModBuilder::new(fixture.root.clone())
        .with_output_name("generated")
        .with_recursive(true)
        .build()
        .unwrap();

    let materials = inputs_by_material(&fixture.read("generated.usda"));
    let lamp = &materials["lamp"];
    assert!(lamp.contains("asset inputs:emissive_mask_texture = @./props/lamp_emissive.dds@"));
    assert!(lamp.contains("bool inputs:enable_emission = 1"));
    assert!(lamp.contains("float inputs:emissive_intensity = 5"));
    assert!(lamp.contains("asset inputs:metallic_texture = @./props/lamp_metallic.dds@"));
    assert_eq!(input_names(lamp).len(), 8);
}

#[test]
fn test_shards_partition_combined_document() {
    init_tracing();
    let files = [
        ("lamp.dds", dds(1, 0)),
        ("lamp_emissive.dds", dds(2, 0)),
        ("stone.dds", dds(3, 0)),
        ("stone_normal.dds", dds(4, 0)),
        ("stone_rough.dds", dds(5, 0)),
        ("wood_rough.dds", dds(6, 0)),
    ];
    let single = Fixture::new(&files);
    let sharded = Fixture::new(&files);

    ModBuilder::new(single.root.clone())
        .with_output_name("generated")
        .build()
        .unwrap();
    let result = ModBuilder::new(sharded.root.clone())
        .with_output_name("generated")
        .with_sharded(true)
        .build()
        .unwrap();

    let shard_names: Vec<_> = result
        .documents
        .iter()
        .map(|document| document.path.file_name().unwrap().to_string())
        .collect();
    assert_eq!(
        shard_names,
        vec![
            "generated.usda",
            "generated_normal.usda",
            "generated_emissive.usda",
            "generated_rough.usda",
        ]
    );
    assert!(!sharded.root.join("generated_metallic.usda").exists());

    let combined = inputs_by_material(&single.read("generated.usda"));
    let mut union: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for name in &shard_names {
        for (material, inputs) in inputs_by_material(&sharded.read(name)) {
            union.entry(material).or_default().extend(inputs);
        }
    }
    assert_eq!(union, combined);
}

#[test]
fn test_stitching_is_idempotent() {
    init_tracing();
    let fixture = Fixture::new(&[
        ("wood.dds", dds(1, 0)),
        ("wood_normal.dds", dds(2, 0)),
        ("wood_rough.dds", dds(3, 0)),
    ]);
    let root = fixture.root.join("mod.usda");
    std::fs::write(
        &root,
        "#usda 1.0\n(\n    subLayers = [\n        @./captures/capture.usda@\n    ]\n)\n",
    )
    .unwrap();

    let build = || {
        ModBuilder::new(fixture.root.clone())
            .with_output_name("textures")
            .with_sharded(true)
            .with_sublayers(true)
            .build()
            .unwrap()
    };

    let first = build();
    let stitch = first.stitch.as_ref().unwrap();
    assert_eq!(stitch.appended, vec!["./textures_normal.usda", "./textures_rough.usda"]);
    assert_eq!(stitch.write, Some(WriteOutcome::Modified));
    assert!(first.modified.contains(&root));
    let stitched = fixture.read("mod.usda");

    let second = build();
    assert!(second.stitch.as_ref().unwrap().appended.is_empty());
    assert_eq!(second.stitch.as_ref().unwrap().write, None);
    assert!(!second.modified.contains(&root));
    assert_eq!(fixture.read("mod.usda"), stitched);

    let layer = RootLayer::parse(stitched).unwrap();
    assert_eq!(
        layer.sublayers(),
        vec![
            "./captures/capture.usda",
            "./textures_normal.usda",
            "./textures_rough.usda",
        ]
    );
}

#[test]
fn test_default_output_keeps_root_sublayers() {
    init_tracing();
    let fixture = Fixture::new(&[
        ("wood.dds", dds(1, 0)),
        ("wood_normal.dds", dds(2, 0)),
    ]);
    let root = fixture.root.join("mod.usda");
    std::fs::write(
        &root,
        "#usda 1.0\n(\n    subLayers = [\n        @./captures/capture.usda@ # base capture\n    ]\n)\n\nover \"RootNode\"\n{\n}\n",
    )
    .unwrap();

    let build = || {
        ModBuilder::new(fixture.root.clone())
            .with_sharded(true)
            .with_sublayers(true)
            .build()
            .unwrap()
    };

    let first = build();
    assert_eq!(
        first.created,
        vec![
            fixture.root.join("mod_base.usda"),
            fixture.root.join("mod_normal.usda"),
        ]
    );
    assert_eq!(first.modified, vec![root.clone()]);
    assert_eq!(
        first.stitch.as_ref().unwrap().appended,
        vec!["./mod_base.usda", "./mod_normal.usda"]
    );
    assert!(fixture.read("mod_base.usda").contains("inputs:diffuse_texture = @./wood.dds@"));

    let stitched = fixture.read("mod.usda");
    assert!(stitched.ends_with("over \"RootNode\"\n{\n}\n"));
    assert!(stitched.contains("@./captures/capture.usda@, # base capture\n"));
    assert_eq!(
        RootLayer::parse(stitched.clone()).unwrap().sublayers(),
        vec!["./captures/capture.usda", "./mod_base.usda", "./mod_normal.usda"]
    );

    let second = build();
    assert!(second.stitch.as_ref().unwrap().appended.is_empty());
    assert!(!second.modified.contains(&root));
    assert_eq!(fixture.read("mod.usda"), stitched);
}

#[test]
fn test_stitching_requires_root_layer() {
    init_tracing();
    let fixture = Fixture::new(&[("wood.dds", dds(1, 0)), ("wood_normal.dds", dds(2, 0))]);

    let err = ModBuilder::new(fixture.root.clone())
        .with_output_name("textures")
        .with_sharded(true)
        .with_sublayers(true)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::RootDocumentMissing(path) if path.ends_with("mod.usda")));
}
