//! Persistent flat vector index.
//!
//! Two artifacts live in the storage directory:
//!
//! - `index.bin`: magic `DQIX`, `u32` format version, `u32` dimension,
//!   `u64` count, the 32-byte SHA-256 of the chunk list, then
//!   `count * dimension` little-endian `f32` values.
//! - `chunks.json`: a manifest plus the chunk texts in index order.
//!
//! The checksum is computed over the JSON encoding of the chunk list alone,
//! so the index and chunk files can be verified as a pair on load.

use crate::config::StorageConfig;
use crate::embeddings::Embedder;
use crate::types::{BuildReport, Chunk, IndexStats};
use crate::vector_index::VectorIndex;
use chrono::{DateTime, Utc};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub const INDEX_MAGIC: &[u8; 4] = b"DQIX";
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 4 + 4 + 4 + 8 + 32;

/// Message carried by `IndexUnavailable` when nothing has been uploaded.
pub const NO_INDEX_MESSAGE: &str = "Please upload a PDF first.";

/// Metadata stored alongside the chunk texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub build_id: String,
    pub built_at: DateTime<Utc>,
    pub dimension: usize,
    pub count: usize,
    pub chunks_sha256: String,

    /// Embedder that produced the vectors; empty for files that predate it
    #[serde(default)]
    pub embedding_provider: String,
    #[serde(default)]
    pub embedding_model: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChunkFile {
    manifest: IndexManifest,
    chunks: Vec<String>,
}

/// The manifest half of the chunk file; chunk texts are skipped.
#[derive(Debug, Deserialize)]
struct ManifestOnly {
    manifest: IndexManifest,
}

/// An in-memory index: unit vectors plus their chunk texts.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    manifest: IndexManifest,
    vectors: Vec<f32>,
    chunks: Vec<String>,
}

impl FlatIndex {
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    fn vector(&self, position: usize) -> &[f32] {
        let dim = self.manifest.dimension;
        &self.vectors[position * dim..(position + 1) * dim]
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.manifest.dimension
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<(usize, f32)>> {
        if query.len() != self.dimension() {
            return Err(AppError::Embedding(format!(
                "Query has dimension {}, index has {}",
                query.len(),
                self.dimension()
            )));
        }

        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .map(|position| {
                let score = self
                    .vector(position)
                    .iter()
                    .zip(query)
                    .map(|(a, b)| a * b)
                    .sum();
                (position, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k.min(self.len()));

        Ok(scored)
    }

    fn chunk_text(&self, position: usize) -> Option<&str> {
        self.chunks.get(position).map(String::as_str)
    }
}

fn chunks_digest(chunks: &[String]) -> AppResult<[u8; 32]> {
    let encoded = serde_json::to_vec(chunks)?;
    let digest = Sha256::digest(&encoded);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Ok(out)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Run blocking file or parsing work off the async runtime.
pub(crate) async fn run_blocking<T, F>(task: &str, f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Other(format!("{} task failed: {}", task, e)))?
}

/// Write through a temporary sibling and rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)
        .and_then(|_| fs::rename(&tmp, path))
        .map_err(|e| AppError::Persistence(format!("Failed to write {:?}: {}", path, e)))
}

/// Reads fixed-size fields from the index header.
struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, n: usize) -> AppResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| AppError::Corruption("Index file is truncated".to_string()))?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u32(&mut self) -> AppResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> AppResult<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}

fn encode_index(dimension: usize, digest: &[u8; 32], vectors: &[f32]) -> Vec<u8> {
    let count = if dimension == 0 { 0 } else { vectors.len() / dimension };
    let mut bytes = Vec::with_capacity(HEADER_LEN + vectors.len() * 4);
    bytes.extend_from_slice(INDEX_MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(dimension as u32).to_le_bytes());
    bytes.extend_from_slice(&(count as u64).to_le_bytes());
    bytes.extend_from_slice(digest);
    for value in vectors {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

struct DecodedIndex {
    dimension: usize,
    count: usize,
    digest: [u8; 32],
    vectors: Vec<f32>,
}

fn decode_index(bytes: &[u8]) -> AppResult<DecodedIndex> {
    let mut reader = ByteReader { bytes, offset: 0 };

    if reader.take(4)? != INDEX_MAGIC {
        return Err(AppError::Corruption("Bad index magic".to_string()));
    }

    let version = reader.u32()?;
    if version != FORMAT_VERSION {
        return Err(AppError::Corruption(format!(
            "Unsupported index format version {}",
            version
        )));
    }

    let dimension = reader.u32()? as usize;
    let count = usize::try_from(reader.u64()?)
        .map_err(|_| AppError::Corruption("Index count out of range".to_string()))?;
    let mut digest = [0u8; 32];
    digest.copy_from_slice(reader.take(32)?);

    if dimension == 0 {
        return Err(AppError::Corruption("Index dimension is zero".to_string()));
    }

    let payload_len = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| AppError::Corruption("Index size overflows".to_string()))?;
    let payload = reader.take(payload_len)?;
    if reader.offset != bytes.len() {
        return Err(AppError::Corruption(
            "Index file has trailing bytes".to_string(),
        ));
    }

    let vectors: Vec<f32> = payload
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    if vectors.iter().any(|v| !v.is_finite()) {
        return Err(AppError::Corruption(
            "Index contains non-finite values".to_string(),
        ));
    }

    Ok(DecodedIndex {
        dimension,
        count,
        digest,
        vectors,
    })
}

/// Builds, persists and reloads the flat index.
#[derive(Debug, Clone)]
pub struct VectorIndexStore {
    storage: StorageConfig,
    embedder: Embedder,
}

impl VectorIndexStore {
    /// `storage` must already be resolved against the workspace.
    pub fn new(storage: StorageConfig, embedder: Embedder) -> Self {
        Self { storage, embedder }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Embed every chunk and replace the persisted index.
    pub async fn build(&self, chunks: &[Chunk]) -> AppResult<(BuildReport, FlatIndex)> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_texts(&texts).await?;
        let dimension = self.embedder.dimensions();

        let vectors: Vec<f32> = embeddings.into_iter().flatten().collect();
        let digest = chunks_digest(&texts)?;

        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            build_id: uuid::Uuid::new_v4().to_string(),
            built_at: Utc::now(),
            dimension,
            count: texts.len(),
            chunks_sha256: to_hex(&digest),
            embedding_provider: self.embedder.provider_name().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
        };

        let chunk_file = ChunkFile {
            manifest: manifest.clone(),
            chunks: texts,
        };
        let index_bytes = encode_index(dimension, &digest, &vectors);
        let storage = self.storage.clone();

        // Chunk file first: a reader racing this write sees a checksum mismatch.
        let chunk_file = run_blocking("Index write", move || {
            fs::create_dir_all(&storage.dir).map_err(|e| {
                AppError::Persistence(format!(
                    "Failed to create index directory {:?}: {}",
                    storage.dir, e
                ))
            })?;
            write_atomic(
                &storage.chunks_path(),
                &serde_json::to_vec_pretty(&chunk_file)?,
            )?;
            write_atomic(&storage.index_path(), &index_bytes)?;
            Ok(chunk_file)
        })
        .await?;

        tracing::info!(
            "Built index {} with {} chunks (dimension {})",
            manifest.build_id,
            manifest.count,
            dimension
        );

        let report = BuildReport {
            build_id: manifest.build_id.clone(),
            chunks: manifest.count,
            dimension,
            built_at: manifest.built_at,
        };

        Ok((
            report,
            FlatIndex {
                manifest,
                vectors,
                chunks: chunk_file.chunks,
            },
        ))
    }

    fn ensure_present(&self) -> AppResult<()> {
        if self.storage.index_path().exists() && self.storage.chunks_path().exists() {
            Ok(())
        } else {
            Err(AppError::IndexUnavailable(NO_INDEX_MESSAGE.to_string()))
        }
    }

    fn read_chunk_file<T: serde::de::DeserializeOwned>(&self) -> AppResult<T> {
        let path = self.storage.chunks_path();
        let bytes = fs::read(&path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Corruption(format!("Malformed chunk file {:?}: {}", path, e)))
    }

    /// Manifest of the persisted index, without loading vectors or texts.
    pub fn manifest(&self) -> AppResult<IndexManifest> {
        self.ensure_present()?;
        Ok(self.read_chunk_file::<ManifestOnly>()?.manifest)
    }

    /// An index built by another embedder cannot be searched with this one.
    fn check_embedder(&self, manifest: &IndexManifest) -> AppResult<()> {
        let provider = self.embedder.provider_name();
        let model = self.embedder.model_name();
        if manifest.embedding_provider == provider && manifest.embedding_model == model {
            return Ok(());
        }

        Err(AppError::IndexUnavailable(format!(
            "The index was built with embedder '{}/{}' but '{}/{}' is configured. Please upload the PDF again.",
            manifest.embedding_provider, manifest.embedding_model, provider, model
        )))
    }

    /// Load and verify the persisted index pair.
    pub fn load(&self) -> AppResult<FlatIndex> {
        self.ensure_present()?;

        let decoded = decode_index(&fs::read(self.storage.index_path())?)?;
        let chunk_file: ChunkFile = self.read_chunk_file()?;
        let manifest = chunk_file.manifest;

        let digest = chunks_digest(&chunk_file.chunks)?;
        if digest != decoded.digest || to_hex(&digest) != manifest.chunks_sha256 {
            return Err(AppError::Corruption(
                "Chunk file does not match the index checksum".to_string(),
            ));
        }

        if decoded.count != chunk_file.chunks.len()
            || manifest.count != decoded.count
            || manifest.dimension != decoded.dimension
        {
            return Err(AppError::Corruption(format!(
                "Index holds {} vectors of dimension {}, chunk file holds {} chunks (manifest: {} x {})",
                decoded.count,
                decoded.dimension,
                chunk_file.chunks.len(),
                manifest.count,
                manifest.dimension
            )));
        }

        self.check_embedder(&manifest)?;

        tracing::debug!(
            "Loaded index {} ({} chunks)",
            manifest.build_id,
            manifest.count
        );

        Ok(FlatIndex {
            manifest,
            vectors: decoded.vectors,
            chunks: chunk_file.chunks,
        })
    }

    /// Remove both artifacts. Returns whether anything was removed.
    pub fn clear(&self) -> AppResult<bool> {
        let mut removed = false;
        for path in [self.storage.index_path(), self.storage.chunks_path()] {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    AppError::Persistence(format!("Failed to remove {:?}: {}", path, e))
                })?;
                removed = true;
            }
        }

        if removed {
            tracing::info!("Cleared index at {:?}", self.storage.dir);
        }
        Ok(removed)
    }

    /// Describe the persisted index without loading its vectors.
    pub fn stats(&self) -> AppResult<IndexStats> {
        let manifest = self.manifest()?;

        Ok(IndexStats {
            build_id: manifest.build_id,
            chunks: manifest.count,
            dimension: manifest.dimension,
            built_at: manifest.built_at,
            index_bytes: fs::metadata(self.storage.index_path())?.len(),
            chunks_bytes: fs::metadata(self.storage.chunks_path())?.len(),
        })
    }
}
