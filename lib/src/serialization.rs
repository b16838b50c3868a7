//! Serialization of fitted parameters and persisted artifacts.
//!
//! Parameter structs are plain data (`Vec<f64>`, scalars, enums) and get
//! [`SerializableParams`] for free through serde + bincode. Artifacts written to
//! disk are wrapped in an [`ArtifactEnvelope`] that records what kind of object
//! was stored and the format version, so loading a model file as a transformer
//! fails with a clear error instead of garbage parameters.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current on-disk format version of artifact envelopes.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// A trait for parameter representations that can be serialized to and from bytes.
///
/// Implementors should contain only plain numerical data (e.g., `Vec<f64>`, scalars).
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: StdError + Send + Sync + 'static;

    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: Serialize + DeserializeOwned,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

/// Errors raised while writing or reading persisted artifacts.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {kind}: {source}")]
    Encode {
        kind: ArtifactKind,
        #[source]
        source: bincode::Error,
    },
    #[error("failed to decode '{}': {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
    #[error("'{}' holds a {found} artifact, expected a {expected}", .path.display())]
    WrongKind {
        path: PathBuf,
        expected: ArtifactKind,
        found: ArtifactKind,
    },
    #[error("'{}' has format version {found}, this build reads version {supported}", .path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },
}

/// What a persisted artifact contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// A single fitted preprocessing step or pipeline.
    Transformer,
    /// A fitted named-column feature transformer.
    FeatureTransformer,
    /// A fitted regression model selected by the model selector.
    Model,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Transformer => "transformer",
            ArtifactKind::FeatureTransformer => "feature transformer",
            ArtifactKind::Model => "model",
        };
        f.write_str(name)
    }
}

/// Header plus payload bytes, as written to disk.
#[derive(Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    pub kind: ArtifactKind,
    pub version: u32,
    pub payload: Vec<u8>,
}

/// Serializes `value` inside an envelope and writes it to `path`.
///
/// Missing parent directories are created.
pub fn write_artifact<T, P>(path: P, kind: ArtifactKind, value: &T) -> Result<(), PersistenceError>
where
    T: SerializableParams<Error = bincode::Error>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let payload = value
        .to_bytes()
        .map_err(|source| PersistenceError::Encode { kind, source })?;
    let envelope = ArtifactEnvelope {
        kind,
        version: ARTIFACT_FORMAT_VERSION,
        payload,
    };
    let bytes =
        bincode::serialize(&envelope).map_err(|source| PersistenceError::Encode { kind, source })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, bytes).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an artifact written by [`write_artifact`], checking kind and version.
pub fn read_artifact<T, P>(path: P, expected: ArtifactKind) -> Result<T, PersistenceError>
where
    T: SerializableParams<Error = bincode::Error>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope: ArtifactEnvelope =
        bincode::deserialize(&bytes).map_err(|source| PersistenceError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    if envelope.version != ARTIFACT_FORMAT_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: envelope.version,
            supported: ARTIFACT_FORMAT_VERSION,
        });
    }
    if envelope.kind != expected {
        return Err(PersistenceError::WrongKind {
            path: path.to_path_buf(),
            expected,
            found: envelope.kind,
        });
    }

    T::from_bytes(&envelope.payload).map_err(|source| PersistenceError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
