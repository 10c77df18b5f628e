//! Content identity keys.
//!
//! A texture's identity is the xxHash3 (64-bit) digest of its mip-0 payload,
//! so a renamed copy or one with different lower mips or trailing metadata
//! resolves to the same key. With hashing disabled the key is simply the
//! texture's stem.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use xxhash_rust::xxh3::Xxh3;

use crate::dds::DdsHeader;
use crate::error::{Error, Result};
use crate::texture::TextureFile;

const HASH_CHUNK_LEN: usize = 64 * 1024;

/// Canonical key naming a material block (`mat_<key>`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Number of hex digits in a hashed key.
    pub const HASH_LEN: usize = 16;

    pub fn from_hash(hash: u64) -> Self {
        Self(format!("{:016X}", hash))
    }

    /// A name-based key, used verbatim.
    pub fn from_name(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key has the shape of a hashed key: 16 uppercase hex digits.
    pub fn is_hash_like(&self) -> bool {
        self.0.len() == Self::HASH_LEN
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }

    /// Prim name of the material override for this key.
    pub fn material_name(&self) -> String {
        format!("mat_{}", self.0)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash the mip-0 payload of a DDS stream positioned at its start.
///
/// Only header fields and the mip-0 bytes are read; anything after the
/// payload is never touched.
pub fn hash_mip0<R: Read>(reader: &mut R) -> Result<IdentityKey> {
    let header = DdsHeader::from_reader(reader)?;
    hash_payload(&header, reader)
}

/// Hash the mip-0 payload described by `header` from a stream positioned
/// just past that header.
pub fn hash_payload<R: Read>(header: &DdsHeader, reader: &mut R) -> Result<IdentityKey> {
    let expected = header.mip0_len()?;

    let mut hasher = Xxh3::new();
    let mut payload = reader.by_ref().take(expected);
    let mut buffer = vec![0u8; HASH_CHUNK_LEN];
    let mut hashed = 0u64;

    loop {
        let n = match payload.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buffer[..n]);
        hashed += n as u64;
    }

    if hashed < expected {
        return Err(Error::TruncatedPayload {
            expected,
            actual: hashed,
        });
    }

    Ok(IdentityKey::from_hash(hasher.digest()))
}

/// Hash the mip-0 payload of a DDS file on disk.
pub fn hash_file(path: &Utf8Path) -> Result<IdentityKey> {
    let file = File::open(path.as_std_path())?;
    hash_mip0(&mut BufReader::new(file))
}

/// Resolves identity keys for textures under a working directory.
///
/// When a reference directory is set, hashed keys are computed from the file
/// at the same relative path under the reference directory, so a working copy
/// (e.g. upscaled textures) keeps the identity of its canonical original.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    root: Utf8PathBuf,
    hashing: bool,
    reference_dir: Option<Utf8PathBuf>,
}

impl IdentityResolver {
    /// Create a name-based resolver for textures under `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            hashing: false,
            reference_dir: None,
        }
    }

    pub fn with_hashing(mut self, hashing: bool) -> Self {
        self.hashing = hashing;
        self
    }

    pub fn with_reference_dir(mut self, reference_dir: Option<Utf8PathBuf>) -> Self {
        self.reference_dir = reference_dir;
        self
    }

    pub fn hashing(&self) -> bool {
        self.hashing
    }

    /// The file whose bytes determine the identity of `texture`.
    pub fn source_path(&self, texture: &TextureFile) -> Utf8PathBuf {
        match &self.reference_dir {
            Some(reference_dir) => reference_dir.join(&texture.relative_path),
            None => self.root.join(&texture.relative_path),
        }
    }

    pub fn resolve(&self, texture: &TextureFile) -> Result<IdentityKey> {
        if !self.hashing {
            return Ok(IdentityKey::from_name(texture.stem.clone()));
        }

        let source = self.source_path(texture);
        let key = hash_file(&source).map_err(|source_err| Error::Resolve {
            path: source.clone(),
            source: Box::new(source_err),
        })?;

        tracing::debug!("Resolved {} -> {}", source, key);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dds::tests::header_bytes;
    use crate::dds::{DDPF_FOURCC, DDPF_RGB};
    use crate::role::RoleTable;
    use proptest::prelude::*;
    use std::io::Cursor;
    use xxhash_rust::xxh3::xxh3_64;

    fn rgba_texture(width: u32, height: u32, mip0: &[u8], tail: &[u8]) -> Vec<u8> {
        let mut bytes = header_bytes(width, height, DDPF_RGB, &[0; 4], 32);
        bytes.extend_from_slice(mip0);
        bytes.extend_from_slice(tail);
        bytes
    }

    fn texture(relative: &str) -> TextureFile {
        TextureFile::classify(Utf8Path::new(relative), &RoleTable::remix()).unwrap()
    }

    #[test]
    fn test_payload_hash_reuses_header_reader() {
        let mip0: Vec<u8> = (0..64u8).collect();
        let mut cursor = Cursor::new(rgba_texture(4, 4, &mip0, &[0xEE; 4]));

        let header = DdsHeader::from_reader(&mut cursor).unwrap();
        let key = hash_payload(&header, &mut cursor).unwrap();
        assert_eq!(key, IdentityKey::from_hash(xxh3_64(&mip0)));
        assert_eq!(cursor.position(), 128 + 64);
    }

    #[test]
    fn test_key_matches_one_shot_xxh3() {
        let mip0: Vec<u8> = (0..64u8).collect();
        let bytes = rgba_texture(4, 4, &mip0, &[]);

        let key = hash_mip0(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(key, IdentityKey::from_hash(xxh3_64(&mip0)));
        assert!(key.is_hash_like());
    }

    #[test]
    fn test_key_ignores_bytes_after_mip0() {
        let mip0 = [7u8; 64];
        let a = rgba_texture(4, 4, &mip0, &[1, 2, 3]);
        let b = rgba_texture(4, 4, &mip0, &[9; 40]);

        assert_eq!(
            hash_mip0(&mut Cursor::new(a)).unwrap(),
            hash_mip0(&mut Cursor::new(b)).unwrap()
        );
    }

    #[test]
    fn test_key_ignores_unrelated_header_fields() {
        let mip0 = [3u8; 32];
        let mut a = header_bytes(8, 8, DDPF_FOURCC, b"DXT1", 0);
        let mut b = a.clone();
        // mip map count and reserved fields
        b[28..32].copy_from_slice(&9u32.to_le_bytes());
        b[40..44].copy_from_slice(b"NVTT");
        a.extend_from_slice(&mip0);
        b.extend_from_slice(&mip0);

        assert_eq!(
            hash_mip0(&mut Cursor::new(a)).unwrap(),
            hash_mip0(&mut Cursor::new(b)).unwrap()
        );
    }

    #[test]
    fn test_different_payloads_differ() {
        let a = rgba_texture(4, 4, &[0; 64], &[]);
        let b = rgba_texture(4, 4, &[1; 64], &[]);

        assert_ne!(
            hash_mip0(&mut Cursor::new(a)).unwrap(),
            hash_mip0(&mut Cursor::new(b)).unwrap()
        );
    }

    #[test]
    fn test_truncated_payload_is_error() {
        let bytes = rgba_texture(4, 4, &[0; 60], &[]);
        let err = hash_mip0(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedPayload {
                expected: 64,
                actual: 60
            }
        ));
    }

    #[test]
    fn test_truncated_header_is_error() {
        let err = hash_mip0(&mut Cursor::new(vec![0u8; 20])).unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { .. }));
    }

    #[test]
    fn test_hash_like() {
        assert!(IdentityKey::from_name("0123456789ABCDEF").is_hash_like());
        assert!(IdentityKey::from_name("0000000000000000").is_hash_like());
        assert!(!IdentityKey::from_name("0123456789abcdef").is_hash_like());
        assert!(!IdentityKey::from_name("0123456789ABCDE").is_hash_like());
        assert!(!IdentityKey::from_name("WOODWOODWOODWOOD").is_hash_like());
        assert!(!IdentityKey::from_name("wood").is_hash_like());
    }

    #[test]
    fn test_from_hash_pads_to_sixteen_digits() {
        assert_eq!(IdentityKey::from_hash(0xAB).as_str(), "00000000000000AB");
        assert_eq!(IdentityKey::from_hash(0xAB).material_name(), "mat_00000000000000AB");
    }

    #[test]
    fn test_resolver_without_hashing_uses_stem() {
        let resolver = IdentityResolver::new("/does/not/exist");
        let key = resolver.resolve(&texture("props/Wood_normal.dds")).unwrap();
        assert_eq!(key.as_str(), "Wood");
    }

    #[test]
    fn test_resolver_hashes_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let mip0 = [5u8; 64];
        std::fs::write(root.join("wood.dds"), rgba_texture(4, 4, &mip0, &[])).unwrap();

        let resolver = IdentityResolver::new(root).with_hashing(true);
        let key = resolver.resolve(&texture("wood.dds")).unwrap();
        assert_eq!(key, IdentityKey::from_hash(xxh3_64(&mip0)));
    }

    #[test]
    fn test_resolver_reads_reference_dir() {
        let work = tempfile::tempdir().unwrap();
        let reference = tempfile::tempdir().unwrap();
        let work_root = Utf8Path::from_path(work.path()).unwrap();
        let reference_root = Utf8Path::from_path(reference.path()).unwrap();

        std::fs::create_dir_all(work_root.join("props")).unwrap();
        std::fs::create_dir_all(reference_root.join("props")).unwrap();
        std::fs::write(
            work_root.join("props/wood.dds"),
            rgba_texture(4, 4, &[1; 64], &[]),
        )
        .unwrap();
        std::fs::write(
            reference_root.join("props/wood.dds"),
            rgba_texture(4, 4, &[2; 64], &[]),
        )
        .unwrap();

        let resolver = IdentityResolver::new(work_root)
            .with_hashing(true)
            .with_reference_dir(Some(reference_root.to_path_buf()));
        let key = resolver.resolve(&texture("props/wood.dds")).unwrap();

        assert_eq!(key, IdentityKey::from_hash(xxh3_64(&[2; 64])));
        assert_eq!(
            resolver.source_path(&texture("props/wood.dds")),
            reference_root.join("props/wood.dds")
        );
    }

    #[test]
    fn test_resolver_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::write(root.join("wood.dds"), [0u8; 10]).unwrap();

        let resolver = IdentityResolver::new(root).with_hashing(true);
        let err = resolver.resolve(&texture("wood.dds")).unwrap_err();
        match err {
            Error::Resolve { path, source } => {
                assert_eq!(path, root.join("wood.dds"));
                assert!(matches!(*source, Error::TruncatedHeader { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    proptest! {
        #[test]
        fn prop_key_depends_only_on_mip0(
            mip0 in proptest::collection::vec(any::<u8>(), 64),
            tail_a in proptest::collection::vec(any::<u8>(), 0..128),
            tail_b in proptest::collection::vec(any::<u8>(), 0..128),
        ) {
            let a = rgba_texture(4, 4, &mip0, &tail_a);
            let b = rgba_texture(4, 4, &mip0, &tail_b);
            let key_a = hash_mip0(&mut Cursor::new(a)).unwrap();
            let key_b = hash_mip0(&mut Cursor::new(b)).unwrap();
            prop_assert_eq!(&key_a, &key_b);
            prop_assert_eq!(key_a, IdentityKey::from_hash(xxh3_64(&mip0)));
        }
    }
}
