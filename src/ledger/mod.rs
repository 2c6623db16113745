// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Hash-chained audit ledger for security-sensitive operations.
//!
//! Every vault access, RugID issuance, and investigation transition is
//! appended here before the triggering operation is acknowledged
//! (no_log_no_action). Each entry's hash incorporates the previous
//! entry's hash, so modifying any stored entry invalidates the rest of
//! the chain:
//!
//! ```text
//! Entry 1: hash_1 = H(genesis || fields_1)
//! Entry 2: hash_2 = H(hash_1  || fields_2)
//! Entry 3: hash_3 = H(hash_2  || fields_3)
//! ```
//!
//! Entries are never edited or removed. Corrective actions are new
//! entries with `action = correction` referencing the original sequence
//! number.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use crate::error::{CoreError, CoreResult};
use crate::storage::DataStore;

/// Hash value assigned to the first entry's `prev_hash` link.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Closed set of auditable actions.
///
/// Kept as an enum rather than free-form strings so that transitions
/// stay checkable and the serialized names stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AuditAction {
    // Vault actions
    #[serde(rename = "vault.submit")]
    VaultSubmit,
    #[serde(rename = "vault.status_change")]
    VaultStatusChange,
    #[serde(rename = "vault.switch_armed")]
    VaultSwitchArmed,
    #[serde(rename = "vault.switch_renewed")]
    VaultSwitchRenewed,
    #[serde(rename = "vault.switch_triggered")]
    VaultSwitchTriggered,
    #[serde(rename = "vault.disclosure")]
    VaultDisclosure,

    // Pseudonym actions
    #[serde(rename = "rugid.issued")]
    RugidIssued,

    // Investigation actions
    #[serde(rename = "report.received")]
    ReportReceived,
    #[serde(rename = "investigation.created")]
    InvestigationCreated,
    #[serde(rename = "investigation.assigned")]
    InvestigationAssigned,
    #[serde(rename = "investigation.started")]
    InvestigationStarted,
    #[serde(rename = "investigation.verified_by_agent")]
    InvestigationVerifiedByAgent,
    #[serde(rename = "investigation.final_verification")]
    InvestigationFinalVerification,
    #[serde(rename = "investigation.approved")]
    InvestigationApproved,
    #[serde(rename = "investigation.rejected")]
    InvestigationRejected,
    #[serde(rename = "investigation.package_sent")]
    InvestigationPackageSent,

    // Operational actions
    #[serde(rename = "operation.timeout")]
    OperationTimeout,
    #[serde(rename = "correction")]
    Correction,
}

impl AuditAction {
    /// Stable wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VaultSubmit => "vault.submit",
            Self::VaultStatusChange => "vault.status_change",
            Self::VaultSwitchArmed => "vault.switch_armed",
            Self::VaultSwitchRenewed => "vault.switch_renewed",
            Self::VaultSwitchTriggered => "vault.switch_triggered",
            Self::VaultDisclosure => "vault.disclosure",
            Self::RugidIssued => "rugid.issued",
            Self::ReportReceived => "report.received",
            Self::InvestigationCreated => "investigation.created",
            Self::InvestigationAssigned => "investigation.assigned",
            Self::InvestigationStarted => "investigation.started",
            Self::InvestigationVerifiedByAgent => "investigation.verified_by_agent",
            Self::InvestigationFinalVerification => "investigation.final_verification",
            Self::InvestigationApproved => "investigation.approved",
            Self::InvestigationRejected => "investigation.rejected",
            Self::InvestigationPackageSent => "investigation.package_sent",
            Self::OperationTimeout => "operation.timeout",
            Self::Correction => "correction",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEntry {
    /// Monotonically increasing sequence number, starting at 1.
    pub seq: u64,
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
    /// Actor who triggered the action.
    pub actor: String,
    /// What happened.
    pub action: AuditAction,
    /// Entity the action targeted (record id, investigation id, ...).
    pub target_id: String,
    /// SHA-256 digest of the action payload. Never the payload itself.
    pub payload_digest: String,
    /// Hex hash of the previous entry (genesis hash for seq 1).
    pub prev_hash: String,
    /// Hex hash of this entry.
    pub this_hash: String,
}

/// Hex-encode a SHA-256 digest of arbitrary bytes.
///
/// Used for payload digests throughout the core so that the ledger never
/// stores sensitive material directly.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Compute an entry hash over the chained fields.
///
/// The timestamp enters the hash as decimal unix microseconds so the
/// value survives JSON round-trips byte-for-byte.
fn entry_hash(
    prev_hash: &str,
    actor: &str,
    action: AuditAction,
    target_id: &str,
    payload_digest: &str,
    timestamp: &DateTime<Utc>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(actor.as_bytes());
    hasher.update(action.as_str().as_bytes());
    hasher.update(target_id.as_bytes());
    hasher.update(payload_digest.as_bytes());
    hasher.update(timestamp.timestamp_micros().to_string().as_bytes());

    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// In-memory tail of the chain, guarded by the append mutex.
#[derive(Debug, Clone)]
struct ChainTail {
    seq: u64,
    last_hash: String,
}

/// Append-only, hash-chained audit ledger.
///
/// The append path is the single globally ordered point of the system:
/// sequence numbers are assigned under the tail mutex and every entry is
/// flushed and fsynced before `append` returns.
pub struct AuditLedger {
    store: DataStore,
    tail: Mutex<ChainTail>,
}

impl AuditLedger {
    /// Open the ledger, resuming from the stored tail if the chain file
    /// already has entries.
    pub fn open(store: DataStore) -> CoreResult<Self> {
        let lines = store.read_lines(store.paths().ledger_chain_file())?;

        let tail = match lines.last() {
            None => ChainTail {
                seq: 0,
                last_hash: GENESIS_HASH.to_string(),
            },
            Some(line) => {
                let entry: AuditEntry = serde_json::from_str(line).map_err(|e| {
                    CoreError::AuditWriteFailed(format!("corrupt ledger tail: {e}"))
                })?;
                ChainTail {
                    seq: entry.seq,
                    last_hash: entry.this_hash,
                }
            }
        };

        Ok(Self {
            store,
            tail: Mutex::new(tail),
        })
    }

    /// Append an entry and make it durable before returning.
    ///
    /// On any failure the caller MUST abort the actioning operation:
    /// nothing is allowed to happen un-logged.
    pub fn append(
        &self,
        actor: &str,
        action: AuditAction,
        target_id: &str,
        payload_digest: &str,
    ) -> CoreResult<AuditEntry> {
        let mut tail = self
            .tail
            .lock()
            .map_err(|_| CoreError::AuditWriteFailed("ledger tail lock poisoned".to_string()))?;

        let timestamp = Utc::now();
        let seq = tail.seq + 1;
        let prev_hash = tail.last_hash.clone();
        let this_hash = entry_hash(
            &prev_hash,
            actor,
            action,
            target_id,
            payload_digest,
            &timestamp,
        );

        let entry = AuditEntry {
            seq,
            timestamp,
            actor: actor.to_string(),
            action,
            target_id: target_id.to_string(),
            payload_digest: payload_digest.to_string(),
            prev_hash,
            this_hash: this_hash.clone(),
        };

        let line = serde_json::to_string(&entry)
            .map_err(|e| CoreError::AuditWriteFailed(format!("serialize entry: {e}")))?;

        self.store
            .append_line_durable(self.store.paths().ledger_chain_file(), &line)
            .map_err(|e| CoreError::AuditWriteFailed(e.to_string()))?;

        // The tail only advances once the entry is durable.
        tail.seq = seq;
        tail.last_hash = this_hash;

        Ok(entry)
    }

    /// Append a correction entry referencing a prior entry.
    ///
    /// Used when a committed audit entry describes an action whose
    /// follow-up persistence failed; the original entry is never touched.
    pub fn append_correction(&self, actor: &str, original_seq: u64, note: &str) -> CoreResult<AuditEntry> {
        self.append(
            actor,
            AuditAction::Correction,
            &original_seq.to_string(),
            &sha256_hex(note.as_bytes()),
        )
    }

    /// Sequence number of the most recent entry (0 if empty).
    pub fn last_seq(&self) -> u64 {
        self.tail.lock().map(|t| t.seq).unwrap_or(0)
    }

    /// Recompute and verify the chain over `[from_seq, to_seq]`.
    ///
    /// Fails closed: any missing entry, sequence gap, broken prev link,
    /// or hash mismatch returns `false`.
    pub fn verify_chain(&self, from_seq: u64, to_seq: u64) -> bool {
        if from_seq == 0 || to_seq < from_seq {
            return false;
        }

        let lines = match self.store.read_lines(self.store.paths().ledger_chain_file()) {
            Ok(lines) => lines,
            Err(_) => return false,
        };

        let mut entries = Vec::with_capacity(lines.len());
        for line in &lines {
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(_) => return false,
            }
        }

        // Expected prev link for the first verified entry.
        let mut expected_prev = if from_seq == 1 {
            GENESIS_HASH.to_string()
        } else {
            match entries.iter().find(|e| e.seq == from_seq - 1) {
                Some(prev) => prev.this_hash.clone(),
                None => return false,
            }
        };

        for seq in from_seq..=to_seq {
            let entry = match entries.iter().find(|e| e.seq == seq) {
                Some(e) => e,
                None => return false,
            };

            if entry.prev_hash != expected_prev {
                return false;
            }

            let recomputed = entry_hash(
                &entry.prev_hash,
                &entry.actor,
                entry.action,
                &entry.target_id,
                &entry.payload_digest,
                &entry.timestamp,
            );
            if recomputed != entry.this_hash {
                return false;
            }

            expected_prev = entry.this_hash.clone();
        }

        true
    }

    /// Read all entries (for admin/auditor views).
    pub fn read_entries(&self) -> CoreResult<Vec<AuditEntry>> {
        let lines = self.store.read_lines(self.store.paths().ledger_chain_file())?;
        let mut entries = Vec::with_capacity(lines.len());
        for line in lines {
            let entry: AuditEntry = serde_json::from_str(&line)
                .map_err(|e| CoreError::AuditWriteFailed(format!("corrupt ledger entry: {e}")))?;
            entries.push(entry);
        }
        Ok(entries)
    }
}
