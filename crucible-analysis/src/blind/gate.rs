//! The blind analysis gate.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{info, warn};
use xxhash_rust::xxh3::Xxh3;

use crucible_core::constants::BLIND_LOG_GENESIS_HASH;
use crucible_core::errors::BlindError;
use crucible_core::types::{FalsificationCondition, PredictionId};

use super::log::{
    update_str, verify_chain, BlindEvent, BlindLogEntry, BlindLogSink, InMemoryBlindLog,
};

/// Parameter name reported when frozen thresholds are touched after unblinding.
const FROZEN_THRESHOLDS: &str = "frozen_thresholds";

#[derive(Debug)]
struct BlindState {
    unblinded: bool,
    thresholds: Option<BTreeMap<PredictionId, FalsificationCondition>>,
    parameters: BTreeMap<String, f64>,
    settings: BTreeMap<String, String>,
    next_sequence: u64,
    last_hash: u64,
}

/// Holds the blind-analysis state of one run.
///
/// Thresholds and parameters may be set only while blinded; the transition
/// to unblinded happens exactly once. Every transition is appended to the
/// log before it takes effect, so a failed write leaves the state untouched.
pub struct BlindAnalysisGate {
    state: Mutex<BlindState>,
    log: Arc<dyn BlindLogSink>,
}

impl std::fmt::Debug for BlindAnalysisGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlindAnalysisGate")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for BlindAnalysisGate {
    fn default() -> Self {
        Self::new()
    }
}

impl BlindAnalysisGate {
    /// Gate with an in-memory log.
    pub fn new() -> Self {
        Self::from_parts(Arc::new(InMemoryBlindLog::new()), 0, BLIND_LOG_GENESIS_HASH)
    }

    /// Gate writing to `log`. Existing entries are verified and the chain
    /// continues after the last one.
    pub fn with_log(log: Arc<dyn BlindLogSink>) -> Result<Self, BlindError> {
        let existing = log.entries()?;
        verify_chain(&existing)?;
        let (next_sequence, last_hash) = existing
            .last()
            .map_or((0, BLIND_LOG_GENESIS_HASH), |e| (e.sequence + 1, e.hash));
        Ok(Self::from_parts(log, next_sequence, last_hash))
    }

    fn from_parts(log: Arc<dyn BlindLogSink>, next_sequence: u64, last_hash: u64) -> Self {
        Self {
            state: Mutex::new(BlindState {
                unblinded: false,
                thresholds: None,
                parameters: BTreeMap::new(),
                settings: BTreeMap::new(),
                next_sequence,
                last_hash,
            }),
            log,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BlindState>, BlindError> {
        self.state.lock().map_err(|_| BlindError::Poisoned)
    }

    /// Read-only view; a poisoned lock still holds consistent state because
    /// every mutation is applied after its log write succeeds.
    fn read(&self) -> MutexGuard<'_, BlindState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write an entry for `event`, with `digest` describing the state the
    /// event produces, then advance the chain.
    fn append(
        &self,
        state: &mut BlindState,
        digest: u64,
        event: BlindEvent,
    ) -> Result<BlindLogEntry, BlindError> {
        let entry = BlindLogEntry::new(
            state.next_sequence,
            Utc::now(),
            event,
            digest,
            state.last_hash,
        );
        self.log.append(&entry)?;
        state.next_sequence += 1;
        state.last_hash = entry.hash;
        Ok(entry)
    }

    /// Fix the falsification condition of every prediction. One-shot.
    pub fn freeze(
        &self,
        thresholds: BTreeMap<PredictionId, FalsificationCondition>,
    ) -> Result<(), BlindError> {
        let mut state = self.lock()?;
        if state.unblinded {
            warn!("attempt to freeze thresholds after unblinding");
            return Err(BlindError::BlindViolation {
                parameter: FROZEN_THRESHOLDS.to_string(),
            });
        }
        if state.thresholds.is_some() {
            return Err(BlindError::AlreadyFrozen);
        }

        let predictions: Vec<String> = thresholds.keys().map(|id| id.to_string()).collect();
        let digest = state_digest(Some(&thresholds), &state.parameters, &state.settings);
        let entry = self.append(&mut state, digest, BlindEvent::Frozen { predictions })?;
        let count = thresholds.len();
        state.thresholds = Some(thresholds);

        info!(
            predictions = count,
            sequence = entry.sequence,
            "falsification thresholds frozen"
        );
        Ok(())
    }

    /// Register a verdict-affecting parameter. May be overwritten while
    /// blinded; fixed afterwards.
    pub fn freeze_parameter(&self, name: &str, value: f64) -> Result<(), BlindError> {
        let mut state = self.lock()?;
        if state.unblinded {
            warn!(parameter = name, "attempt to change parameter after unblinding");
            return Err(BlindError::BlindViolation {
                parameter: name.to_string(),
            });
        }
        if !value.is_finite() {
            return Err(BlindError::InvalidParameter {
                parameter: name.to_string(),
                message: format!("must be finite, got {value}"),
            });
        }

        let mut parameters = state.parameters.clone();
        parameters.insert(name.to_string(), value);
        let digest = state_digest(state.thresholds.as_ref(), &parameters, &state.settings);
        let event = BlindEvent::ParameterFrozen {
            name: name.to_string(),
            value,
        };
        let entry = self.append(&mut state, digest, event)?;
        state.parameters = parameters;

        info!(parameter = name, value, sequence = entry.sequence, "parameter frozen");
        Ok(())
    }

    /// Register a verdict-affecting setting that has no numeric form, such as
    /// a step rule or a serialized prior. Same lifecycle as `freeze_parameter`.
    pub fn freeze_setting(&self, name: &str, value: &str) -> Result<(), BlindError> {
        let mut state = self.lock()?;
        if state.unblinded {
            warn!(setting = name, "attempt to change setting after unblinding");
            return Err(BlindError::BlindViolation {
                parameter: name.to_string(),
            });
        }

        let mut settings = state.settings.clone();
        settings.insert(name.to_string(), value.to_string());
        let digest = state_digest(state.thresholds.as_ref(), &state.parameters, &settings);
        let event = BlindEvent::SettingFrozen {
            name: name.to_string(),
            value: value.to_string(),
        };
        let entry = self.append(&mut state, digest, event)?;
        state.settings = settings;

        info!(setting = name, value, sequence = entry.sequence, "setting frozen");
        Ok(())
    }

    /// Reveal the data. Succeeds exactly once, and only after `freeze`.
    pub fn unblind(&self, reason: &str) -> Result<BlindLogEntry, BlindError> {
        let mut state = self.lock()?;
        if state.unblinded {
            return Err(BlindError::AlreadyUnblinded);
        }
        if state.thresholds.is_none() {
            return Err(BlindError::NotFrozen);
        }

        let digest = state_digest(state.thresholds.as_ref(), &state.parameters, &state.settings);
        let event = BlindEvent::Unblinded {
            reason: reason.to_string(),
        };
        let entry = self.append(&mut state, digest, event)?;
        state.unblinded = true;

        info!(
            sequence = entry.sequence,
            timestamp = %entry.timestamp,
            hash = entry.hash,
            reason,
            "analysis unblinded"
        );
        Ok(entry)
    }

    /// Fails with `BlindViolation` naming `parameter` once unblinded.
    pub fn assert_not_unblinded(&self, parameter: &str) -> Result<(), BlindError> {
        if self.lock()?.unblinded {
            return Err(BlindError::BlindViolation {
                parameter: parameter.to_string(),
            });
        }
        Ok(())
    }

    pub fn is_unblinded(&self) -> bool {
        self.read().unblinded
    }

    pub fn is_frozen(&self) -> bool {
        self.read().thresholds.is_some()
    }

    /// The frozen conditions, or `NotFrozen`.
    pub fn frozen_thresholds(
        &self,
    ) -> Result<BTreeMap<PredictionId, FalsificationCondition>, BlindError> {
        self.read().thresholds.clone().ok_or(BlindError::NotFrozen)
    }

    pub fn condition(&self, prediction_id: &PredictionId) -> Option<FalsificationCondition> {
        self.read()
            .thresholds
            .as_ref()
            .and_then(|t| t.get(prediction_id).cloned())
    }

    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.read().parameters.get(name).copied()
    }

    pub fn parameters(&self) -> BTreeMap<String, f64> {
        self.read().parameters.clone()
    }

    pub fn setting(&self, name: &str) -> Option<String> {
        self.read().settings.get(name).cloned()
    }

    pub fn settings(&self) -> BTreeMap<String, String> {
        self.read().settings.clone()
    }

    pub fn log_entries(&self) -> Result<Vec<BlindLogEntry>, BlindError> {
        self.log.entries()
    }
}

/// Digest of frozen thresholds, parameters and settings.
fn state_digest(
    thresholds: Option<&BTreeMap<PredictionId, FalsificationCondition>>,
    parameters: &BTreeMap<String, f64>,
    settings: &BTreeMap<String, String>,
) -> u64 {
    let mut hasher = Xxh3::new();
    for (id, condition) in thresholds.into_iter().flatten() {
        update_str(&mut hasher, id.as_str());
        update_str(&mut hasher, condition.direction.name());
        hasher.update(&condition.confirmation_band.0.to_bits().to_le_bytes());
        hasher.update(&condition.confirmation_band.1.to_bits().to_le_bytes());
        hasher.update(&condition.null_reference.to_bits().to_le_bytes());
    }
    for (name, value) in parameters {
        update_str(&mut hasher, name);
        hasher.update(&value.to_bits().to_le_bytes());
    }
    for (name, value) in settings {
        update_str(&mut hasher, name);
        update_str(&mut hasher, value);
    }
    hasher.digest()
}
