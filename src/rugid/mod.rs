// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! # RugID pseudonym generation
//!
//! A RugID is the public face of a vaulted identity:
//! `RID-` followed by twelve characters alternating letter pairs and
//! digit pairs (`RID-XX00XX00XX00`). Issuance derives the id from a
//! SHA-256 digest of the record id, a deployment salt, and a retry
//! nonce, so ids are stable for audit purposes yet carry no information
//! about the underlying identity. Reversing a RugID to its record takes
//! the same audited disclosure path as any other vault open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Actor;
use crate::error::{CoreError, CoreResult};
use crate::ledger::sha256_hex;
use crate::locks::{hold, EntityLocks};
use crate::storage::{DataStore, StorageError};
use crate::vault::{IdentityRecord, IdentityVault};

use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Maximum derivation attempts before issuance gives up.
const MAX_ATTEMPTS: u32 = 8;

/// Characters in the id body after the `RID-` prefix.
const BODY_LEN: usize = 12;

const PREFIX: &str = "RID-";

/// A validated RugID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct RugId(String);

impl RugId {
    /// Parse and validate the `RID-XX00XX00XX00` shape.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let body = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| CoreError::Validation(format!("RugID must start with {PREFIX}")))?;
        if body.len() != BODY_LEN {
            return Err(CoreError::Validation(format!(
                "RugID body must be {BODY_LEN} characters"
            )));
        }
        for (i, c) in body.chars().enumerate() {
            let ok = if is_letter_position(i) {
                c.is_ascii_uppercase()
            } else {
                c.is_ascii_digit()
            };
            if !ok {
                return Err(CoreError::Validation(format!(
                    "RugID has an invalid character at position {i}"
                )));
            }
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RugId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RugId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).map_err(|e| e.to_string())
    }
}

impl From<RugId> for String {
    fn from(id: RugId) -> Self {
        id.0
    }
}

/// Positions 0,1 / 4,5 / 8,9 of the body are letters; the rest digits.
fn is_letter_position(i: usize) -> bool {
    matches!(i % 4, 0 | 1)
}

/// Uniqueness index entry persisted under `rugids/{rug_id}.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RugIdEntry {
    /// The issued id.
    pub rug_id: String,
    /// Vault record the id is bound to.
    pub record_id: String,
    /// Issuance time.
    pub issued_at: DateTime<Utc>,
}

/// Issues RugIDs for verified vault records.
pub struct PseudonymGenerator {
    store: DataStore,
    vault: Arc<IdentityVault>,
    project_salt: String,
    locks: EntityLocks,
}

impl PseudonymGenerator {
    pub fn new(store: DataStore, vault: Arc<IdentityVault>, project_salt: String) -> Self {
        Self {
            store,
            vault,
            project_salt,
            locks: EntityLocks::new(),
        }
    }

    /// Derive the candidate id for a record and nonce.
    fn derive(&self, record_id: &str, nonce: u32) -> RugId {
        let mut hasher = Sha256::new();
        hasher.update(record_id.as_bytes());
        hasher.update(self.project_salt.as_bytes());
        hasher.update(nonce.to_be_bytes());
        let digest = hasher.finalize();

        let mut body = String::with_capacity(BODY_LEN);
        for (i, byte) in digest[..BODY_LEN].iter().enumerate() {
            let c = if is_letter_position(i) {
                (b'A' + byte % 26) as char
            } else {
                (b'0' + byte % 10) as char
            };
            body.push(c);
        }
        RugId(format!("{PREFIX}{body}"))
    }

    /// Issue a RugID for a verified, unbound record.
    ///
    /// Writes the uniqueness index entry first, then binds the id to the
    /// record (which journals `rugid.issued`). A failed bind removes the
    /// index entry again so the id stays available.
    pub fn issue(&self, record_id: &str, actor: &Actor) -> CoreResult<RugId> {
        // Issuance is serialized globally; collisions on the index are
        // decided by a single writer.
        let issuance = self.locks.entity("rugid.issuance");
        let _guard = hold(&issuance);

        let rug_id = self.find_free_id(record_id)?;

        let entry = RugIdEntry {
            rug_id: rug_id.as_str().to_string(),
            record_id: record_id.to_string(),
            issued_at: Utc::now(),
        };
        let path = self.store.paths().rugid_entry(rug_id.as_str());
        self.store.write_json(&path, &entry)?;

        if let Err(e) = self.vault.bind_rug_id(record_id, rug_id.as_str(), actor) {
            let _ = self.store.delete(&path);
            return Err(e);
        }

        tracing::info!(record_id, rug_id = %rug_id, "RugID issued");
        Ok(rug_id)
    }

    /// Walk the nonce space until an unclaimed id is found.
    fn find_free_id(&self, record_id: &str) -> CoreResult<RugId> {
        for nonce in 0..MAX_ATTEMPTS {
            let candidate = self.derive(record_id, nonce);
            let path = self.store.paths().rugid_entry(candidate.as_str());
            if !self.store.exists(&path) {
                return Ok(candidate);
            }
            tracing::warn!(
                record_id,
                nonce,
                candidate = %candidate,
                "RugID collision, retrying with next nonce"
            );
        }
        Err(CoreError::IdGenerationExhausted {
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Look up the index entry for an issued id.
    pub fn lookup(&self, rug_id: &str) -> CoreResult<RugIdEntry> {
        let path = self.store.paths().rugid_entry(rug_id);
        match self.store.read_json(&path) {
            Ok(entry) => Ok(entry),
            Err(StorageError::NotFound(_)) => {
                Err(CoreError::NotFound(format!("RugID {rug_id}")))
            }
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CoreError::NotFound(format!("RugID {rug_id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve an issued id to its vault record.
    pub fn resolve_record(&self, rug_id: &str) -> CoreResult<IdentityRecord> {
        let entry = self.lookup(rug_id)?;
        self.vault.get(&entry.record_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::ledger::AuditLedger;
    use crate::storage::StoragePaths;
    use crate::vault::{VaultKeys, VaultStatus, VerificationDecision};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<IdentityVault>, PseudonymGenerator) {
        let temp = TempDir::new().unwrap();
        let paths = StoragePaths::new(temp.path());
        let mut store = DataStore::new(paths);
        store.initialize().unwrap();
        let ledger = Arc::new(AuditLedger::open(store.clone()).unwrap());
        let vault = Arc::new(IdentityVault::new(
            store.clone(),
            ledger,
            VaultKeys::ephemeral(),
        ));
        let generator =
            PseudonymGenerator::new(store, Arc::clone(&vault), "test-salt".to_string());
        (temp, vault, generator)
    }

    fn verified_record(vault: &IdentityVault) -> String {
        let record = vault
            .submit(
                &serde_json::json!({"legal_name": "Jane Doe"}),
                &Actor::new("owner-1", Role::Owner),
            )
            .unwrap();
        vault
            .set_verification_status(
                &record.record_id,
                VerificationDecision::Verified,
                &Actor::new("admin-1", Role::Admin),
            )
            .unwrap();
        record.record_id
    }

    #[test]
    fn format_is_rid_letters_digits() {
        let (_temp, vault, generator) = setup();
        let record_id = verified_record(&vault);

        let rug_id = generator
            .issue(&record_id, &Actor::new("admin-1", Role::Admin))
            .unwrap();

        assert!(RugId::parse(rug_id.as_str()).is_ok());
        let body = rug_id.as_str().strip_prefix("RID-").unwrap();
        assert_eq!(body.len(), 12);
        for (i, c) in body.chars().enumerate() {
            if is_letter_position(i) {
                assert!(c.is_ascii_uppercase(), "position {i} in {body}");
            } else {
                assert!(c.is_ascii_digit(), "position {i} in {body}");
            }
        }
    }

    #[test]
    fn derivation_is_deterministic_per_nonce() {
        let (_temp, _vault, generator) = setup();
        assert_eq!(generator.derive("rec-1", 0), generator.derive("rec-1", 0));
        assert_ne!(generator.derive("rec-1", 0), generator.derive("rec-1", 1));
        assert_ne!(generator.derive("rec-1", 0), generator.derive("rec-2", 0));
    }

    #[test]
    fn issue_binds_record_and_writes_index() {
        let (_temp, vault, generator) = setup();
        let record_id = verified_record(&vault);

        let rug_id = generator
            .issue(&record_id, &Actor::new("admin-1", Role::Admin))
            .unwrap();

        let entry = generator.lookup(rug_id.as_str()).unwrap();
        assert_eq!(entry.record_id, record_id);

        let record = vault.get(&record_id).unwrap();
        assert_eq!(record.rug_id.as_deref(), Some(rug_id.as_str()));
    }

    #[test]
    fn unverified_record_cannot_get_an_id() {
        let (_temp, vault, generator) = setup();
        let record = vault
            .submit(
                &serde_json::json!({"legal_name": "Jane Doe"}),
                &Actor::new("owner-1", Role::Owner),
            )
            .unwrap();

        let result = generator.issue(&record.record_id, &Actor::new("admin-1", Role::Admin));
        assert!(matches!(result, Err(CoreError::VaultAccessDenied(_))));

        // The index entry must not survive the failed bind.
        let derived = generator.derive(&record.record_id, 0);
        assert!(generator.lookup(derived.as_str()).is_err());
    }

    /// Claim a derived candidate on behalf of another record.
    fn occupy(generator: &PseudonymGenerator, candidate: &RugId) {
        let entry = RugIdEntry {
            rug_id: candidate.as_str().to_string(),
            record_id: "someone-else".to_string(),
            issued_at: Utc::now(),
        };
        generator
            .store
            .write_json(generator.store.paths().rugid_entry(candidate.as_str()), &entry)
            .unwrap();
    }

    #[test]
    fn collision_falls_through_to_the_next_nonce() {
        let (_temp, vault, generator) = setup();
        let record_id = verified_record(&vault);

        let taken = generator.derive(&record_id, 0);
        occupy(&generator, &taken);

        let issued = generator
            .issue(&record_id, &Actor::new("admin-1", Role::Admin))
            .unwrap();
        assert_ne!(issued, taken);
        assert_eq!(issued, generator.derive(&record_id, 1));

        // The occupied entry still belongs to its original owner.
        let entry = generator.lookup(taken.as_str()).unwrap();
        assert_eq!(entry.record_id, "someone-else");
    }

    #[test]
    fn exhausted_nonce_space_is_fatal() {
        let (_temp, vault, generator) = setup();
        let record_id = verified_record(&vault);

        for nonce in 0..MAX_ATTEMPTS {
            occupy(&generator, &generator.derive(&record_id, nonce));
        }

        let result = generator.issue(&record_id, &Actor::new("admin-1", Role::Admin));
        assert!(matches!(
            result,
            Err(CoreError::IdGenerationExhausted { attempts: MAX_ATTEMPTS })
        ));

        // No binding happened.
        let record = vault.get(&record_id).unwrap();
        assert!(record.rug_id.is_none());
    }

    #[test]
    fn second_issue_for_same_record_fails() {
        let (_temp, vault, generator) = setup();
        let record_id = verified_record(&vault);
        generator
            .issue(&record_id, &Actor::new("admin-1", Role::Admin))
            .unwrap();

        let again = generator.issue(&record_id, &Actor::new("admin-1", Role::Admin));
        assert!(matches!(again, Err(CoreError::Validation(_))));
    }

    #[test]
    fn resolve_returns_the_bound_record() {
        let (_temp, vault, generator) = setup();
        let record_id = verified_record(&vault);
        let rug_id = generator
            .issue(&record_id, &Actor::new("admin-1", Role::Admin))
            .unwrap();

        let record = generator.resolve_record(rug_id.as_str()).unwrap();
        assert_eq!(record.record_id, record_id);
        assert_eq!(record.status, VaultStatus::Verified);
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert!(RugId::parse("RID-AB12CD34EF56").is_ok());
        assert!(RugId::parse("AB12CD34EF56").is_err());
        assert!(RugId::parse("RID-ab12cd34ef56").is_err());
        assert!(RugId::parse("RID-1234567890AB").is_err());
        assert!(RugId::parse("RID-AB12CD34EF5").is_err());
        assert!(RugId::parse("RID-AB12CD34EF567").is_err());
    }

    #[test]
    fn unknown_id_lookup_is_not_found() {
        let (_temp, _vault, generator) = setup();
        assert!(matches!(
            generator.lookup("RID-AB12CD34EF56"),
            Err(CoreError::NotFound(_))
        ));
    }
}
