//! Artifact store: where documents, reference signatures and stage outputs live.
//!
//! Path derivation here is deterministic. The only side effects are the
//! upload intake writing a document and `upload_target_path` creating the
//! document root on first use.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::errors::ArtifactError;

/// Extension the reference signatures are stored with.
const SIGNATURE_EXT: &str = "png";
/// Suffix the cleaner appends to a document's stem.
const CLEANED_SUFFIX: &str = "_fake.png";

/// Rewrite `\` separators to `/` so paths from any platform compare equal.
pub fn normalize_separators(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().replace('\\', "/"))
}

/// File stem of a selection, independent of the separator style it arrived with.
pub fn selection_stem(selection: &Path) -> String {
    normalize_separators(selection)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// One entry of the reference-signature listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    document_root: PathBuf,
    signature_root: PathBuf,
    clean_output: PathBuf,
}

impl ArtifactStore {
    pub fn new(document_root: PathBuf, signature_root: PathBuf, clean_output: PathBuf) -> Self {
        Self {
            document_root: normalize_separators(&document_root),
            signature_root: normalize_separators(&signature_root),
            clean_output: normalize_separators(&clean_output),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.document_root.clone(),
            config.signature_root.clone(),
            config.clean_output.clone(),
        )
    }

    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    pub fn signature_root(&self) -> &Path {
        &self.signature_root
    }

    pub fn clean_output(&self) -> &Path {
        &self.clean_output
    }

    /// Reference signature for a selection: `<signature_root>/<stem>.png`.
    pub fn reference_signature_path(&self, selection: &Path) -> PathBuf {
        let name = format!("{}.{}", selection_stem(selection), SIGNATURE_EXT);
        normalize_separators(&self.signature_root.join(name))
    }

    /// Cleaned image the cleaner produces for a document: `<clean_output>/<stem>_fake.png`.
    pub fn cleaned_output_path(&self, selection: &Path) -> PathBuf {
        let name = format!("{}{}", selection_stem(selection), CLEANED_SUFFIX);
        normalize_separators(&self.clean_output.join(name))
    }

    /// Target path for an uploaded file, creating the document root if absent.
    ///
    /// Only the final component of `filename` is used, so an upload can never
    /// be written outside the document root.
    pub fn upload_target_path(&self, filename: &str) -> Result<PathBuf, ArtifactError> {
        let base = upload_base_name(filename)?;

        std::fs::create_dir_all(&self.document_root).map_err(|source| ArtifactError::Io {
            path: self.document_root.clone(),
            source,
        })?;

        Ok(normalize_separators(&self.document_root.join(base)))
    }

    /// Upload intake: write `bytes` verbatim under the document root.
    pub fn store_upload(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        if !is_supported_image(filename) {
            return Err(ArtifactError::UnsupportedType {
                name: filename.to_string(),
            });
        }

        let target = self.upload_target_path(filename)?;
        std::fs::write(&target, bytes).map_err(|source| ArtifactError::Io {
            path: target.clone(),
            source,
        })?;

        tracing::info!(path = %target.display(), bytes = bytes.len(), "stored uploaded document");
        Ok(target)
    }

    /// Files directly under the signature root, sorted by name.
    pub fn list_signatures(&self) -> Result<Vec<SignatureEntry>, ArtifactError> {
        if !self.signature_root.exists() {
            return Ok(Vec::new());
        }

        let read_dir =
            std::fs::read_dir(&self.signature_root).map_err(|source| ArtifactError::Io {
                path: self.signature_root.clone(),
                source,
            })?;

        let mut entries: Vec<SignatureEntry> = read_dir
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| SignatureEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: normalize_separators(&entry.path()),
            })
            .collect();

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Resolve a signature name chosen from the listing to its path.
    pub fn resolve_signature(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        self.list_signatures()?
            .into_iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.path)
            .ok_or_else(|| ArtifactError::InvalidFileName {
                name: name.to_string(),
            })
    }
}

fn upload_base_name(filename: &str) -> Result<String, ArtifactError> {
    let normalized = normalize_separators(Path::new(filename));
    match normalized.file_name() {
        Some(name) if !name.is_empty() => Ok(name.to_string_lossy().into_owned()),
        _ => Err(ArtifactError::InvalidFileName {
            name: filename.to_string(),
        }),
    }
}

fn is_supported_image(filename: &str) -> bool {
    let mime = mime_guess::from_path(filename).first_or_octet_stream();
    mime.type_() == mime_guess::mime::IMAGE && matches!(mime.subtype().as_str(), "png" | "jpeg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> ArtifactStore {
        ArtifactStore::new(
            dir.join("media/documents"),
            dir.join("media/UserSignaturesSquare"),
            dir.join("results/gan/images"),
        )
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(
            normalize_separators(Path::new("results\\yolov5\\exp\\crops")),
            PathBuf::from("results/yolov5/exp/crops")
        );
    }

    #[test]
    fn test_selection_stem_handles_both_separators() {
        assert_eq!(selection_stem(Path::new("media/documents/doc1.png")), "doc1");
        assert_eq!(selection_stem(Path::new("media\\documents\\doc1.png")), "doc1");
    }

    #[test]
    fn test_reference_signature_path_is_deterministic() {
        let store = ArtifactStore::new(
            PathBuf::from("media/documents"),
            PathBuf::from("media/UserSignaturesSquare"),
            PathBuf::from("out"),
        );
        let first = store.reference_signature_path(Path::new("somewhere/alice.png"));
        let second = store.reference_signature_path(Path::new("somewhere/alice.png"));
        assert_eq!(first, second);
        assert_eq!(first, PathBuf::from("media/UserSignaturesSquare/alice.png"));
    }

    #[test]
    fn test_reference_signature_path_forces_png() {
        let store = ArtifactStore::new(
            PathBuf::from("docs"),
            PathBuf::from("refs"),
            PathBuf::from("out"),
        );
        assert_eq!(
            store.reference_signature_path(Path::new("bob.jpeg")),
            PathBuf::from("refs/bob.png")
        );
    }

    #[test]
    fn test_cleaned_output_path_is_deterministic() {
        let store = ArtifactStore::new(
            PathBuf::from("docs"),
            PathBuf::from("refs"),
            PathBuf::from("results\\gan\\images"),
        );
        let first = store.cleaned_output_path(Path::new("docs/doc1.png"));
        assert_eq!(first, store.cleaned_output_path(Path::new("docs/doc1.png")));
        assert_eq!(first, PathBuf::from("results/gan/images/doc1_fake.png"));
    }

    #[test]
    fn test_upload_target_path_creates_root() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(!store.document_root().exists());

        let target = store.upload_target_path("doc1.png").unwrap();
        assert!(store.document_root().exists());
        assert_eq!(target, store.document_root().join("doc1.png"));
    }

    #[test]
    fn test_upload_target_path_strips_directories() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let target = store.upload_target_path("../../etc/doc1.png").unwrap();
        assert_eq!(target, store.document_root().join("doc1.png"));

        let target = store.upload_target_path("C:\\scans\\doc2.jpg").unwrap();
        assert_eq!(target, store.document_root().join("doc2.jpg"));
    }

    #[test]
    fn test_upload_target_path_rejects_empty_name() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(matches!(
            store.upload_target_path(".."),
            Err(ArtifactError::InvalidFileName { .. })
        ));
    }

    #[test]
    fn test_store_upload_writes_bytes_verbatim() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let bytes = [0x89, b'P', b'N', b'G', 0, 1, 2, 3];

        let path = store.store_upload("doc1.png", &bytes).unwrap();
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn test_store_upload_accepts_jpeg_variants() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.store_upload("scan.jpg", b"x").is_ok());
        assert!(store.store_upload("scan.JPEG", b"x").is_ok());
    }

    #[test]
    fn test_store_upload_rejects_non_images() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let result = store.store_upload("notes.txt", b"hello");
        assert!(matches!(result, Err(ArtifactError::UnsupportedType { .. })));
        assert!(!store.document_root().join("notes.txt").exists());
    }

    #[test]
    fn test_list_signatures_sorted_files_only() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        fs::create_dir_all(store.signature_root().join("nested")).unwrap();
        fs::write(store.signature_root().join("carol.png"), b"c").unwrap();
        fs::write(store.signature_root().join("alice.png"), b"a").unwrap();

        let names: Vec<String> = store
            .list_signatures()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["alice.png", "carol.png"]);
    }

    #[test]
    fn test_list_signatures_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.list_signatures().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_signature() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        fs::create_dir_all(store.signature_root()).unwrap();
        fs::write(store.signature_root().join("alice.png"), b"a").unwrap();

        assert_eq!(
            store.resolve_signature("alice.png").unwrap(),
            store.signature_root().join("alice.png")
        );
        assert!(store.resolve_signature("mallory.png").is_err());
    }
}
