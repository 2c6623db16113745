// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! The identity vault.
//!
//! Holds encrypted PII records and enforces the disclosure policy: the
//! only path to plaintext is [`IdentityVault::request_disclosure`],
//! which is gated on an active investigation or an elapsed dead-man's
//! switch and always journaled. Every mutation follows
//! lock -> validate -> audit-append -> persist; a failed audit append
//! aborts the operation (no_log_no_action), a failed persist appends a
//! correction entry referencing the already-durable audit entry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Actor;
use crate::error::{CoreError, CoreResult};
use crate::investigation::model::Investigation;
use crate::ledger::{sha256_hex, AuditAction, AuditLedger};
use crate::locks::{hold, EntityLocks};
use crate::storage::{DataStore, StorageError};

use super::envelope::{self, SealedEnvelope};
use super::keys::VaultKeys;
use super::record::{DisclosedIdentity, IdentityRecord, VaultStatus};

/// Actor id recorded for sweeper-initiated transitions.
pub const SWEEPER_ACTOR: &str = "system.sweeper";

/// Outcome of identity verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerificationDecision {
    Verified,
    Rejected,
}

/// The encrypted identity vault.
pub struct IdentityVault {
    store: DataStore,
    ledger: Arc<AuditLedger>,
    keys: VaultKeys,
    locks: EntityLocks,
}

impl IdentityVault {
    pub fn new(store: DataStore, ledger: Arc<AuditLedger>, keys: VaultKeys) -> Self {
        Self {
            store,
            ledger,
            keys,
            locks: EntityLocks::new(),
        }
    }

    /// The lock guarding a vault record. Exposed so that cross-entity
    /// operations can acquire it in the fixed global order (vault record
    /// before investigation).
    pub fn record_lock(&self, record_id: &str) -> std::sync::Arc<std::sync::Mutex<()>> {
        self.locks.entity(record_id)
    }

    /// Load a record by id.
    pub fn get(&self, record_id: &str) -> CoreResult<IdentityRecord> {
        let path = self.store.paths().identity_record(record_id);
        if !self.store.exists(&path) {
            return Err(CoreError::NotFound(format!("identity record {record_id}")));
        }
        Ok(self.store.read_json(path)?)
    }

    /// Submit a new identity payload.
    ///
    /// The payload is sealed into the layered envelope before anything
    /// touches disk; the audit entry carries a digest of the sealed
    /// envelope, never the payload.
    pub fn submit(&self, payload: &serde_json::Value, actor: &Actor) -> CoreResult<IdentityRecord> {
        let valid = payload.as_object().is_some_and(|map| !map.is_empty());
        if !valid {
            return Err(CoreError::Validation(
                "identity payload must be a non-empty object".to_string(),
            ));
        }

        let plaintext = serde_json::to_vec(payload)
            .map_err(|e| CoreError::Validation(format!("unserializable payload: {e}")))?;
        let sealed = envelope::seal(&self.keys, &plaintext);

        let now = Utc::now();
        let record = IdentityRecord {
            record_id: uuid::Uuid::new_v4().to_string(),
            rug_id: None,
            envelope: sealed,
            status: VaultStatus::PendingVerification,
            switch_deadline: None,
            created_at: now,
            last_renewed_at: None,
            updated_at: now,
        };

        let digest = envelope_digest(&record.envelope)?;
        self.commit(&record, &actor.actor_id, AuditAction::VaultSubmit, &digest)?;

        tracing::info!(record_id = %record.record_id, "identity submitted to vault");
        Ok(record)
    }

    /// Decide identity verification. Allowed only from `pending_verification`.
    pub fn set_verification_status(
        &self,
        record_id: &str,
        decision: VerificationDecision,
        actor: &Actor,
    ) -> CoreResult<IdentityRecord> {
        let lock = self.locks.entity(record_id);
        let _guard = hold(&lock);

        let mut record = self.get(record_id)?;
        if record.status != VaultStatus::PendingVerification {
            return Err(CoreError::InvalidTransition(format!(
                "cannot decide verification from status {}",
                record.status
            )));
        }

        record.status = match decision {
            VerificationDecision::Verified => VaultStatus::Verified,
            VerificationDecision::Rejected => VaultStatus::Rejected,
        };
        record.updated_at = Utc::now();

        let digest = sha256_hex(record.status.to_string().as_bytes());
        self.commit(&record, &actor.actor_id, AuditAction::VaultStatusChange, &digest)?;
        Ok(record)
    }

    /// Arm the dead-man's switch with an absolute deadline.
    pub fn arm_dead_man_switch(
        &self,
        record_id: &str,
        deadline: DateTime<Utc>,
        actor: &Actor,
    ) -> CoreResult<IdentityRecord> {
        let lock = self.locks.entity(record_id);
        let _guard = hold(&lock);

        let mut record = self.get(record_id)?;
        if deadline <= Utc::now() {
            return Err(CoreError::Validation(
                "switch deadline must be in the future".to_string(),
            ));
        }
        if matches!(record.status, VaultStatus::Released | VaultStatus::Rejected) {
            return Err(CoreError::InvalidTransition(format!(
                "cannot arm switch on a {} record",
                record.status
            )));
        }

        record.switch_deadline = Some(deadline);
        record.updated_at = Utc::now();

        let digest = sha256_hex(deadline.to_rfc3339().as_bytes());
        self.commit(&record, &actor.actor_id, AuditAction::VaultSwitchArmed, &digest)?;
        Ok(record)
    }

    /// Extend the dead-man's switch deadline.
    ///
    /// Fails with `SwitchAlreadyTriggered` once the previous deadline has
    /// passed; the sweeper and renewal serialize on the record lock, so a
    /// renewal that wins the race prevents the unmask transition.
    pub fn renew_dead_man_switch(
        &self,
        record_id: &str,
        new_deadline: DateTime<Utc>,
        actor: &Actor,
    ) -> CoreResult<IdentityRecord> {
        let lock = self.locks.entity(record_id);
        let _guard = hold(&lock);

        let mut record = self.get(record_id)?;
        let current = record.switch_deadline.ok_or_else(|| {
            CoreError::Validation("switch is not armed".to_string())
        })?;

        let now = Utc::now();
        if current <= now || record.status == VaultStatus::PendingUnmask {
            return Err(CoreError::SwitchAlreadyTriggered);
        }
        if new_deadline <= now {
            return Err(CoreError::Validation(
                "new switch deadline must be in the future".to_string(),
            ));
        }

        record.switch_deadline = Some(new_deadline);
        record.last_renewed_at = Some(now);
        record.updated_at = now;

        let digest = sha256_hex(new_deadline.to_rfc3339().as_bytes());
        self.commit(&record, &actor.actor_id, AuditAction::VaultSwitchRenewed, &digest)?;
        Ok(record)
    }

    /// Bind an issued RugID to a verified record.
    ///
    /// Called by the pseudonym generator after the uniqueness index entry
    /// is in place; appends the `rugid.issued` entry.
    pub(crate) fn bind_rug_id(
        &self,
        record_id: &str,
        rug_id: &str,
        actor: &Actor,
    ) -> CoreResult<IdentityRecord> {
        let lock = self.locks.entity(record_id);
        let _guard = hold(&lock);

        let mut record = self.get(record_id)?;
        if record.status != VaultStatus::Verified {
            return Err(CoreError::VaultAccessDenied(format!(
                "RugID issuance requires a verified record, status is {}",
                record.status
            )));
        }
        if record.rug_id.is_some() {
            return Err(CoreError::Validation(format!(
                "record {record_id} already has a RugID"
            )));
        }

        record.rug_id = Some(rug_id.to_string());
        record.updated_at = Utc::now();

        // The issued id is public; it may appear in the ledger directly.
        let digest = sha256_hex(rug_id.as_bytes());
        self.commit(&record, &actor.actor_id, AuditAction::RugidIssued, &digest)?;
        Ok(record)
    }

    /// Open the vault for one request.
    ///
    /// Permitted only if the record is `verified` (or `pending_unmask`)
    /// AND either an investigation referencing its RugID has reached the
    /// disclosure threshold, or the dead-man's-switch deadline has
    /// elapsed. The decrypted payload exists only for the duration of
    /// the call; the ledger records requester and justification digest,
    /// never the payload.
    pub fn request_disclosure(
        &self,
        record_id: &str,
        actor: &Actor,
        justification: &str,
    ) -> CoreResult<DisclosedIdentity> {
        if justification.trim().is_empty() {
            return Err(CoreError::Validation(
                "disclosure justification must not be empty".to_string(),
            ));
        }

        let lock = self.locks.entity(record_id);
        let _guard = hold(&lock);

        let record = self.get(record_id)?;
        self.check_disclosure_permitted(&record)?;

        let plaintext = envelope::open(&self.keys, &record.envelope)?;
        let payload: serde_json::Value = serde_json::from_slice(&plaintext)
            .map_err(|e| CoreError::Validation(format!("stored payload is corrupt: {e}")))?;

        // Nothing is disclosed unless the disclosure itself is durable.
        let digest = sha256_hex(justification.as_bytes());
        self.ledger
            .append(&actor.actor_id, AuditAction::VaultDisclosure, record_id, &digest)?;

        // A dead-man release consumes the record.
        if record.status == VaultStatus::PendingUnmask {
            let mut released = record.clone();
            released.status = VaultStatus::Released;
            released.updated_at = Utc::now();
            let digest = sha256_hex(released.status.to_string().as_bytes());
            self.commit(&released, &actor.actor_id, AuditAction::VaultStatusChange, &digest)?;
        }

        tracing::info!(record_id, actor = %actor.actor_id, "vault opened for disclosure");
        Ok(DisclosedIdentity {
            record_id: record.record_id,
            rug_id: record.rug_id,
            payload,
        })
    }

    /// Whether `request_disclosure` would currently be permitted.
    ///
    /// Used by the investigation engine as an approval guard: a package
    /// cannot be approved if disclosure would be denied.
    pub fn disclosure_satisfiable(&self, record_id: &str) -> CoreResult<()> {
        let record = self.get(record_id)?;
        self.check_disclosure_permitted(&record)
    }

    /// Mark a record released after its identity left the vault in a
    /// sent package.
    pub(crate) fn mark_released(&self, record_id: &str, actor: &Actor) -> CoreResult<()> {
        let lock = self.locks.entity(record_id);
        let _guard = hold(&lock);

        let mut record = self.get(record_id)?;
        if record.status == VaultStatus::Released {
            return Ok(());
        }
        record.status = VaultStatus::Released;
        record.updated_at = Utc::now();

        let digest = sha256_hex(record.status.to_string().as_bytes());
        self.commit(&record, &actor.actor_id, AuditAction::VaultStatusChange, &digest)?;
        Ok(())
    }

    /// One sweep pass: transition every armed record whose deadline has
    /// elapsed to `pending_unmask`. Returns how many records triggered.
    pub fn sweep_expired_switches(&self) -> CoreResult<usize> {
        let ids = self
            .store
            .list_files(self.store.paths().vault_dir(), "json")?;

        let now = Utc::now();
        let mut triggered = 0;

        for record_id in ids {
            // Renewal and sweep serialize on the same per-record lock.
            let lock = self.locks.entity(&record_id);
            let _guard = hold(&lock);

            let record = match self.get(&record_id) {
                Ok(r) => r,
                Err(CoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };

            let expired = record.status == VaultStatus::Verified
                && record.switch_deadline.is_some_and(|d| d <= now);
            if !expired {
                continue;
            }

            let mut updated = record;
            updated.status = VaultStatus::PendingUnmask;
            updated.updated_at = now;

            let digest = sha256_hex(
                updated
                    .switch_deadline
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default()
                    .as_bytes(),
            );
            self.commit(&updated, SWEEPER_ACTOR, AuditAction::VaultSwitchTriggered, &digest)?;
            triggered += 1;

            tracing::info!(record_id = %updated.record_id, "dead-man's switch triggered");
        }

        Ok(triggered)
    }

    // ========== Internal ==========

    /// Disclosure policy gate. Fails closed with `VaultAccessDenied`.
    fn check_disclosure_permitted(&self, record: &IdentityRecord) -> CoreResult<()> {
        match record.status {
            VaultStatus::Verified | VaultStatus::PendingUnmask => {}
            other => {
                return Err(CoreError::VaultAccessDenied(format!(
                    "record status {other} does not permit disclosure"
                )))
            }
        }

        let switch_elapsed = record.status == VaultStatus::PendingUnmask
            || record.switch_deadline.is_some_and(|d| d <= Utc::now());
        if switch_elapsed {
            return Ok(());
        }

        if let Some(rug_id) = &record.rug_id {
            if self.any_investigation_at_threshold(rug_id)? {
                return Ok(());
            }
        }

        Err(CoreError::VaultAccessDenied(
            "no qualifying investigation and switch has not elapsed".to_string(),
        ))
    }

    /// Whether any investigation linked to the RugID has reached
    /// `pending_final_verification` or beyond.
    fn any_investigation_at_threshold(&self, rug_id: &str) -> CoreResult<bool> {
        let ids = self
            .store
            .list_files(self.store.paths().investigations_dir(), "json")?;

        for id in ids {
            let investigation: Investigation =
                match self.store.read_json(self.store.paths().investigation(&id)) {
                    Ok(inv) => inv,
                    Err(StorageError::NotFound(_)) => continue,
                    Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                        continue
                    }
                    Err(e) => return Err(e.into()),
                };
            if investigation.rug_id.as_deref() == Some(rug_id)
                && investigation.status.meets_disclosure_threshold()
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Audit-then-persist commit for a record mutation.
    fn commit(
        &self,
        record: &IdentityRecord,
        actor: &str,
        action: AuditAction,
        payload_digest: &str,
    ) -> CoreResult<()> {
        let entry = self
            .ledger
            .append(actor, action, &record.record_id, payload_digest)?;

        let path = self.store.paths().identity_record(&record.record_id);
        if let Err(e) = self.store.write_json(&path, record) {
            // The action was journaled but the record did not persist;
            // journal the divergence and surface the storage error.
            let _ = self
                .ledger
                .append_correction(actor, entry.seq, "record persist failed after audit append");
            return Err(e.into());
        }
        Ok(())
    }
}

/// Digest of the sealed envelope for audit purposes.
fn envelope_digest(envelope: &SealedEnvelope) -> CoreResult<String> {
    let bytes = serde_json::to_vec(envelope)
        .map_err(|e| CoreError::Validation(format!("unserializable envelope: {e}")))?;
    Ok(sha256_hex(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::storage::StoragePaths;
    use chrono::Duration;
    use tempfile::TempDir;

    fn setup() -> (TempDir, IdentityVault, DataStore) {
        let temp = TempDir::new().unwrap();
        let paths = StoragePaths::new(temp.path());
        let mut store = DataStore::new(paths);
        store.initialize().unwrap();
        let ledger = Arc::new(AuditLedger::open(store.clone()).unwrap());
        let vault = IdentityVault::new(store.clone(), ledger, VaultKeys::ephemeral());
        (temp, vault, store)
    }

    fn owner() -> Actor {
        Actor::new("owner-1", Role::Owner)
    }

    fn admin() -> Actor {
        Actor::new("admin-1", Role::Admin)
    }

    fn payload() -> serde_json::Value {
        serde_json::json!({
            "legal_name": "Jane Doe",
            "document_ref": "passport-xy-123",
            "country": "DE"
        })
    }

    #[test]
    fn submit_stores_pending_record_without_plaintext() {
        let (temp, vault, _store) = setup();
        let record = vault.submit(&payload(), &owner()).unwrap();

        assert_eq!(record.status, VaultStatus::PendingVerification);

        let on_disk =
            std::fs::read_to_string(temp.path().join(format!("vault/{}.json", record.record_id)))
                .unwrap();
        assert!(!on_disk.contains("Jane Doe"));
        assert!(!on_disk.contains("passport-xy-123"));
    }

    #[test]
    fn submit_rejects_empty_payload() {
        let (_temp, vault, _store) = setup();
        let result = vault.submit(&serde_json::json!({}), &owner());
        assert!(matches!(result, Err(CoreError::Validation(_))));

        let result = vault.submit(&serde_json::json!("just a string"), &owner());
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn verification_decision_only_from_pending() {
        let (_temp, vault, _store) = setup();
        let record = vault.submit(&payload(), &owner()).unwrap();

        let verified = vault
            .set_verification_status(&record.record_id, VerificationDecision::Verified, &admin())
            .unwrap();
        assert_eq!(verified.status, VaultStatus::Verified);

        // Deciding again is a transition violation.
        let again = vault.set_verification_status(
            &record.record_id,
            VerificationDecision::Rejected,
            &admin(),
        );
        assert!(matches!(again, Err(CoreError::InvalidTransition(_))));
    }

    #[test]
    fn disclosure_denied_without_grounds() {
        let (_temp, vault, _store) = setup();
        let record = vault.submit(&payload(), &owner()).unwrap();
        vault
            .set_verification_status(&record.record_id, VerificationDecision::Verified, &admin())
            .unwrap();

        let result = vault.request_disclosure(&record.record_id, &admin(), "curiosity");
        assert!(matches!(result, Err(CoreError::VaultAccessDenied(_))));
    }

    #[test]
    fn disclosure_denied_for_unverified_record() {
        let (_temp, vault, _store) = setup();
        let record = vault.submit(&payload(), &owner()).unwrap();

        let result = vault.request_disclosure(&record.record_id, &admin(), "investigation");
        assert!(matches!(result, Err(CoreError::VaultAccessDenied(_))));
    }

    #[test]
    fn elapsed_switch_permits_disclosure_roundtrip() {
        let (_temp, vault, _store) = setup();
        let record = vault.submit(&payload(), &owner()).unwrap();
        vault
            .set_verification_status(&record.record_id, VerificationDecision::Verified, &admin())
            .unwrap();
        vault
            .arm_dead_man_switch(
                &record.record_id,
                Utc::now() + Duration::milliseconds(5),
                &owner(),
            )
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));

        let disclosed = vault
            .request_disclosure(&record.record_id, &admin(), "unattended switch elapsed")
            .unwrap();
        assert_eq!(disclosed.payload, payload());
    }

    #[test]
    fn sweep_transitions_expired_records() {
        let (_temp, vault, _store) = setup();
        let record = vault.submit(&payload(), &owner()).unwrap();
        vault
            .set_verification_status(&record.record_id, VerificationDecision::Verified, &admin())
            .unwrap();
        vault
            .arm_dead_man_switch(
                &record.record_id,
                Utc::now() + Duration::milliseconds(5),
                &owner(),
            )
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));

        let triggered = vault.sweep_expired_switches().unwrap();
        assert_eq!(triggered, 1);

        let swept = vault.get(&record.record_id).unwrap();
        assert_eq!(swept.status, VaultStatus::PendingUnmask);

        // Second sweep is a no-op.
        assert_eq!(vault.sweep_expired_switches().unwrap(), 0);
    }

    #[test]
    fn renewal_before_deadline_prevents_trigger() {
        let (_temp, vault, _store) = setup();
        let record = vault.submit(&payload(), &owner()).unwrap();
        vault
            .set_verification_status(&record.record_id, VerificationDecision::Verified, &admin())
            .unwrap();
        vault
            .arm_dead_man_switch(&record.record_id, Utc::now() + Duration::hours(1), &owner())
            .unwrap();

        vault
            .renew_dead_man_switch(&record.record_id, Utc::now() + Duration::hours(2), &owner())
            .unwrap();

        assert_eq!(vault.sweep_expired_switches().unwrap(), 0);
        let current = vault.get(&record.record_id).unwrap();
        assert_eq!(current.status, VaultStatus::Verified);
    }

    #[test]
    fn renewal_after_deadline_fails() {
        let (_temp, vault, _store) = setup();
        let record = vault.submit(&payload(), &owner()).unwrap();
        vault
            .set_verification_status(&record.record_id, VerificationDecision::Verified, &admin())
            .unwrap();
        vault
            .arm_dead_man_switch(
                &record.record_id,
                Utc::now() + Duration::milliseconds(5),
                &owner(),
            )
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));

        let result = vault.renew_dead_man_switch(
            &record.record_id,
            Utc::now() + Duration::hours(1),
            &owner(),
        );
        assert!(matches!(result, Err(CoreError::SwitchAlreadyTriggered)));
    }

    #[test]
    fn pending_unmask_disclosure_releases_record() {
        let (_temp, vault, _store) = setup();
        let record = vault.submit(&payload(), &owner()).unwrap();
        vault
            .set_verification_status(&record.record_id, VerificationDecision::Verified, &admin())
            .unwrap();
        vault
            .arm_dead_man_switch(
                &record.record_id,
                Utc::now() + Duration::milliseconds(5),
                &owner(),
            )
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        vault.sweep_expired_switches().unwrap();

        vault
            .request_disclosure(&record.record_id, &admin(), "dead-man release")
            .unwrap();

        let released = vault.get(&record.record_id).unwrap();
        assert_eq!(released.status, VaultStatus::Released);
    }

    #[test]
    fn empty_justification_is_rejected() {
        let (_temp, vault, _store) = setup();
        let record = vault.submit(&payload(), &owner()).unwrap();
        let result = vault.request_disclosure(&record.record_id, &admin(), "  ");
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn every_mutation_leaves_an_audit_trail() {
        let (_temp, vault, store) = setup();
        let ledger = Arc::new(AuditLedger::open(store).unwrap());

        let record = vault.submit(&payload(), &owner()).unwrap();
        vault
            .set_verification_status(&record.record_id, VerificationDecision::Verified, &admin())
            .unwrap();
        vault
            .arm_dead_man_switch(&record.record_id, Utc::now() + Duration::hours(1), &owner())
            .unwrap();

        let entries = ledger.read_entries().unwrap();
        let actions: Vec<_> = entries.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::VaultSubmit,
                AuditAction::VaultStatusChange,
                AuditAction::VaultSwitchArmed,
            ]
        );
        assert!(ledger.verify_chain(1, entries.len() as u64));
    }
}
