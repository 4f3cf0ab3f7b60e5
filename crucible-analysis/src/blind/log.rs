//! Append-only, hash-chained blind-analysis log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crucible_core::constants::BLIND_LOG_GENESIS_HASH;
use crucible_core::errors::BlindError;

/// A protocol step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BlindEvent {
    /// Falsification conditions fixed for these predictions.
    Frozen { predictions: Vec<String> },
    /// A verdict-affecting parameter fixed.
    ParameterFrozen { name: String, value: f64 },
    /// A verdict-affecting setting fixed in its canonical text form.
    SettingFrozen { name: String, value: String },
    /// The data was revealed.
    Unblinded { reason: String },
}

impl BlindEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Frozen { .. } => "frozen",
            Self::ParameterFrozen { .. } => "parameter_frozen",
            Self::SettingFrozen { .. } => "setting_frozen",
            Self::Unblinded { .. } => "unblinded",
        }
    }
}

/// One immutable log entry. `hash` covers every other field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlindLogEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: BlindEvent,
    /// Digest of the frozen state after this entry.
    pub state_digest: u64,
    pub prev_hash: u64,
    pub hash: u64,
}

impl BlindLogEntry {
    pub fn new(
        sequence: u64,
        timestamp: DateTime<Utc>,
        event: BlindEvent,
        state_digest: u64,
        prev_hash: u64,
    ) -> Self {
        let mut entry = Self {
            sequence,
            timestamp,
            event,
            state_digest,
            prev_hash,
            hash: 0,
        };
        entry.hash = entry.compute_hash();
        entry
    }

    /// Recompute the chain hash from the entry contents.
    pub fn compute_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(&self.sequence.to_le_bytes());
        hasher.update(&self.timestamp.timestamp().to_le_bytes());
        hasher.update(&self.timestamp.timestamp_subsec_nanos().to_le_bytes());
        hasher.update(self.event.kind().as_bytes());
        match &self.event {
            BlindEvent::Frozen { predictions } => {
                for id in predictions {
                    update_str(&mut hasher, id);
                }
            }
            BlindEvent::ParameterFrozen { name, value } => {
                update_str(&mut hasher, name);
                hasher.update(&value.to_bits().to_le_bytes());
            }
            BlindEvent::SettingFrozen { name, value } => {
                update_str(&mut hasher, name);
                update_str(&mut hasher, value);
            }
            BlindEvent::Unblinded { reason } => update_str(&mut hasher, reason),
        }
        hasher.update(&self.state_digest.to_le_bytes());
        hasher.update(&self.prev_hash.to_le_bytes());
        hasher.digest()
    }
}

/// Length-prefixed so adjacent strings cannot alias.
pub(crate) fn update_str(hasher: &mut Xxh3, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// Check sequence numbers, back-links and hashes of a full log.
pub fn verify_chain(entries: &[BlindLogEntry]) -> Result<(), BlindError> {
    let mut expected_prev = BLIND_LOG_GENESIS_HASH;
    for (index, entry) in entries.iter().enumerate() {
        if entry.sequence != index as u64 {
            return Err(BlindError::Log(format!(
                "sequence gap: expected {index}, found {}",
                entry.sequence
            )));
        }
        if entry.prev_hash != expected_prev {
            return Err(BlindError::Log(format!(
                "broken link at sequence {}",
                entry.sequence
            )));
        }
        if entry.compute_hash() != entry.hash {
            return Err(BlindError::Log(format!(
                "hash mismatch at sequence {}",
                entry.sequence
            )));
        }
        expected_prev = entry.hash;
    }
    Ok(())
}

/// Destination for blind-log entries. Implementations only ever append.
pub trait BlindLogSink: Send + Sync {
    fn append(&self, entry: &BlindLogEntry) -> Result<(), BlindError>;

    /// Every entry written so far, oldest first.
    fn entries(&self) -> Result<Vec<BlindLogEntry>, BlindError>;
}

/// Process-local sink.
#[derive(Debug, Default)]
pub struct InMemoryBlindLog {
    entries: Mutex<Vec<BlindLogEntry>>,
}

impl InMemoryBlindLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlindLogSink for InMemoryBlindLog {
    fn append(&self, entry: &BlindLogEntry) -> Result<(), BlindError> {
        self.entries
            .lock()
            .map_err(|_| BlindError::Poisoned)?
            .push(entry.clone());
        Ok(())
    }

    fn entries(&self) -> Result<Vec<BlindLogEntry>, BlindError> {
        Ok(self.entries.lock().map_err(|_| BlindError::Poisoned)?.clone())
    }
}

/// JSON-lines file, one entry per line, opened in append mode for every write.
#[derive(Debug)]
pub struct JsonlBlindLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlBlindLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlindLogSink for JsonlBlindLog {
    fn append(&self, entry: &BlindLogEntry) -> Result<(), BlindError> {
        let line = serde_json::to_string(entry).map_err(|e| BlindError::Log(e.to_string()))?;
        let _guard = self.write_lock.lock().map_err(|_| BlindError::Poisoned)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| BlindError::Log(format!("{}: {e}", self.path.display())))?;
        writeln!(file, "{line}").map_err(|e| BlindError::Log(e.to_string()))?;
        file.sync_data().map_err(|e| BlindError::Log(e.to_string()))?;
        Ok(())
    }

    fn entries(&self) -> Result<Vec<BlindLogEntry>, BlindError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| BlindError::Log(format!("{}: {e}", self.path.display())))?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .map_err(|e| BlindError::Log(format!("line {}: {e}", i + 1)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: u64) -> Vec<BlindLogEntry> {
        let mut prev = BLIND_LOG_GENESIS_HASH;
        (0..n)
            .map(|seq| {
                let entry = BlindLogEntry::new(
                    seq,
                    Utc::now(),
                    BlindEvent::ParameterFrozen {
                        name: format!("p{seq}"),
                        value: seq as f64,
                    },
                    seq,
                    prev,
                );
                prev = entry.hash;
                entry
            })
            .collect()
    }

    #[test]
    fn test_valid_chain_verifies() {
        assert!(verify_chain(&chain(4)).is_ok());
        assert!(verify_chain(&[]).is_ok());
    }

    #[test]
    fn test_tampered_entry_detected() {
        let mut entries = chain(3);
        entries[1].event = BlindEvent::ParameterFrozen {
            name: "p1".to_string(),
            value: 99.0,
        };
        assert!(matches!(verify_chain(&entries), Err(BlindError::Log(_))));
    }

    #[test]
    fn test_removed_entry_detected() {
        let mut entries = chain(3);
        entries.remove(1);
        assert!(verify_chain(&entries).is_err());
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = BlindLogEntry::new(
            0,
            Utc::now(),
            BlindEvent::Unblinded {
                reason: "release".to_string(),
            },
            7,
            BLIND_LOG_GENESIS_HASH,
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"], "unblinded");
        assert_eq!(json["reason"], "release");
        let back: BlindLogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
        assert_eq!(back.compute_hash(), entry.hash);
    }
}
