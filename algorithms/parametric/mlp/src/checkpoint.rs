//! Checkpoint persistence for [`Mlp`] weights.
//!
//! # File Format
//!
//! 1. **Magic bytes**: `DGT1` (4 bytes)
//! 2. **Version**: `u32` little-endian (4 bytes), currently 1
//! 3. **Flags**: `u32` little-endian (4 bytes), reserved
//! 4. **Payload**: bincode-encoded [`Mlp`] (training config plus both layers)

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use bincode::Options;
use digits_helpers::Float;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::Mlp;

/// Magic bytes identifying a checkpoint file.
pub const CHECKPOINT_MAGIC: [u8; 4] = *b"DGT1";

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Upper bound on the decoded payload, in bytes.
const MAX_PAYLOAD_BYTES: u64 = 512 * 1024 * 1024;

/// Errors raised while saving or loading a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint not found: {0}")]
    NotFound(String),

    #[error("invalid checkpoint magic: {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("unsupported checkpoint version: {found}")]
    UnsupportedVersion { found: u32 },

    #[error("failed to decode checkpoint: {0}")]
    Decode(String),

    #[error("failed to encode checkpoint: {0}")]
    Encode(String),

    #[error("checkpoint I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CheckpointError {
    /// True when the error means "there is no usable model at this path"
    /// (missing, corrupt or from another format version), as opposed to an
    /// environment failure such as a permission error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::InvalidMagic(_)
                | Self::UnsupportedVersion { .. }
                | Self::Decode(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    magic: [u8; 4],
    version: u32,
    flags: u32,
}

impl Header {
    fn current() -> Self {
        Self {
            magic: CHECKPOINT_MAGIC,
            version: CHECKPOINT_VERSION,
            flags: 0,
        }
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        let mut word = [0u8; 4];
        reader.read_exact(&mut word)?;
        let version = u32::from_le_bytes(word);
        reader.read_exact(&mut word)?;
        let flags = u32::from_le_bytes(word);
        Ok(Self { magic, version, flags })
    }

    fn validate(&self) -> Result<(), CheckpointError> {
        if self.magic != CHECKPOINT_MAGIC {
            return Err(CheckpointError::InvalidMagic(self.magic));
        }
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion { found: self.version });
        }
        Ok(())
    }
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_PAYLOAD_BYTES)
}

/// Writes a checkpoint to any writer.
pub fn save_writer<F, W>(model: &Mlp<F>, writer: &mut W) -> Result<(), CheckpointError>
where
    F: Float + Serialize + DeserializeOwned,
    W: Write,
{
    Header::current().write_to(writer)?;
    codec()
        .serialize_into(&mut *writer, model)
        .map_err(|e| CheckpointError::Encode(e.to_string()))?;
    writer.flush()?;
    Ok(())
}

/// Reads a checkpoint from any reader.
pub fn load_reader<F, R>(reader: &mut R) -> Result<Mlp<F>, CheckpointError>
where
    F: Float + Serialize + DeserializeOwned,
    R: Read,
{
    let header = Header::read_from(reader).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => CheckpointError::Decode("truncated header".into()),
        _ => CheckpointError::Io(e),
    })?;
    header.validate()?;

    let model: Mlp<F> = codec()
        .deserialize_from(reader)
        .map_err(|e| CheckpointError::Decode(e.to_string()))?;
    if !model.is_consistent() {
        return Err(CheckpointError::Decode("inconsistent layer shapes".into()));
    }
    Ok(model)
}

/// Saves `model` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns `CheckpointError::Io` if the file cannot be written and
/// `CheckpointError::Encode` if serialization fails.
pub fn save_checkpoint<F>(model: &Mlp<F>, path: impl AsRef<Path>) -> Result<(), CheckpointError>
where
    F: Float + Serialize + DeserializeOwned,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    save_writer(model, &mut writer)
}

/// Loads a model previously written by [`save_checkpoint`].
///
/// # Errors
///
/// - `NotFound` if `path` does not exist
/// - `InvalidMagic`/`UnsupportedVersion` for a foreign or outdated file
/// - `Decode` for a truncated or corrupt payload
/// - `Io` for any other filesystem failure
pub fn load_checkpoint<F>(path: impl AsRef<Path>) -> Result<Mlp<F>, CheckpointError>
where
    F: Float + Serialize + DeserializeOwned,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CheckpointError::NotFound(path.display().to_string()),
        _ => CheckpointError::Io(e),
    })?;
    load_reader(&mut BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dense, TrainingConfig};
    use ndarray::{Array1, Array2};

    fn tiny_model() -> Mlp<f32> {
        Mlp::new(6, 3, TrainingConfig::default().with_hidden_units(4)).unwrap()
    }

    #[test]
    fn test_save_then_load_restores_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.bin");
        let model = tiny_model();

        save_checkpoint(&model, &path).unwrap();
        let loaded: Mlp<f32> = load_checkpoint(&path).unwrap();

        assert_eq!(loaded, model);
        assert_eq!(loaded.config().hidden_units, 4);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_checkpoint::<f32>(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, CheckpointError::NotFound(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_garbage_file_has_invalid_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"this is not a model file").unwrap();

        let err = load_checkpoint::<f32>(&path).unwrap_err();
        assert!(matches!(err, CheckpointError::InvalidMagic(m) if &m == b"this"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_future_version_is_rejected() {
        let mut bytes = Vec::new();
        save_writer(&tiny_model(), &mut bytes).unwrap();
        bytes[4..8].copy_from_slice(&7u32.to_le_bytes());

        let err = load_reader::<f32, _>(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, CheckpointError::UnsupportedVersion { found: 7 }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_truncated_payload_fails_to_decode() {
        let mut bytes = Vec::new();
        save_writer(&tiny_model(), &mut bytes).unwrap();
        bytes.truncate(bytes.len() / 2);

        let err = load_reader::<f32, _>(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, CheckpointError::Decode(_)));
    }

    #[test]
    fn test_truncated_header_fails_to_decode() {
        let err = load_reader::<f32, _>(&mut &b"DGT"[..]).unwrap_err();
        assert!(matches!(err, CheckpointError::Decode(_)));
    }

    #[test]
    fn test_io_errors_are_not_recoverable() {
        let err = CheckpointError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(!err.is_recoverable());
        assert!(!CheckpointError::Encode("boom".into()).is_recoverable());
    }

    #[test]
    fn test_mismatched_bias_fails_to_decode() {
        // Same field order as `Mlp`, so the payload decodes into one.
        #[derive(Serialize)]
        struct RawModel {
            config: TrainingConfig,
            hidden: Dense<f32>,
            output: Dense<f32>,
        }

        let raw = RawModel {
            config: TrainingConfig::default().with_hidden_units(4),
            hidden: Dense {
                weights: Array2::zeros((6, 4)),
                bias: Array1::zeros(5),
            },
            output: Dense {
                weights: Array2::zeros((4, 3)),
                bias: Array1::zeros(3),
            },
        };
        let mut bytes = Vec::new();
        Header::current().write_to(&mut bytes).unwrap();
        codec().serialize_into(&mut bytes, &raw).unwrap();

        let err = load_reader::<f32, _>(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, CheckpointError::Decode(ref m) if m.contains("inconsistent")));
        assert!(err.is_recoverable());
    }
}
