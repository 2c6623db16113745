// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Investigation state machine.
//!
//! Drives a case from report intake to evidence package release:
//!
//! ```text
//! reported -> assigned -> in_progress -> pending_verification
//!   -> pending_final_verification -> approved -> package_sent
//!                                 -> rejected
//! ```
//!
//! Guards enforced here, not at the API edge:
//! - the two-person rule: the agent who verified cannot also advance to
//!   final verification
//! - approval and rejection are admin-only
//! - approval requires that vault disclosure would actually be granted
//! - a case with a package send in flight cannot be rejected
//!
//! Invalid transitions are refused with no audit entry; valid ones are
//! journaled before the case file persists.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;

use crate::auth::{Actor, Role};
use crate::error::{CoreError, CoreResult};
use crate::ledger::{sha256_hex, AuditAction, AuditLedger};
use crate::locks::{hold, EntityLocks};
use crate::rugid::RugIdEntry;
use crate::storage::{DataStore, StorageError};
use crate::vault::IdentityVault;

use super::model::{Investigation, InvestigationStatus, Report};
use super::transport::PackageTransport;

/// Default deadline for one package delivery attempt.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Caller-supplied inputs for a transition.
#[derive(Debug, Default, Clone)]
pub struct TransitionParams {
    /// Agent to assign (required for `assigned`).
    pub assignee: Option<String>,
    /// Verification notes (required for `pending_verification`).
    pub notes: Option<String>,
}

/// The investigation engine.
pub struct InvestigationEngine {
    store: DataStore,
    ledger: Arc<AuditLedger>,
    vault: Arc<IdentityVault>,
    transport: PackageTransport,
    send_timeout: Duration,
    locks: EntityLocks,
    /// Investigations with a package send in flight. Guards against a
    /// concurrent rejection while the identity is already outside the
    /// vault boundary.
    sends_in_flight: Mutex<HashSet<String>>,
}

impl InvestigationEngine {
    pub fn new(
        store: DataStore,
        ledger: Arc<AuditLedger>,
        vault: Arc<IdentityVault>,
        transport: PackageTransport,
    ) -> Self {
        Self {
            store,
            ledger,
            vault,
            transport,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            locks: EntityLocks::new(),
            sends_in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    // ========== Reports ==========

    /// Accept a raw fraud report.
    pub fn create_report(
        &self,
        project_name: &str,
        rug_id: Option<String>,
        description: &str,
        evidence_links: Vec<String>,
        reporter_contact: &str,
        actor: &Actor,
    ) -> CoreResult<Report> {
        if project_name.trim().is_empty() || description.trim().is_empty() {
            return Err(CoreError::Validation(
                "report needs a project name and a description".to_string(),
            ));
        }

        let report = Report {
            report_id: uuid::Uuid::new_v4().to_string(),
            project_name: project_name.to_string(),
            rug_id,
            description: description.to_string(),
            evidence_links,
            reporter_contact: reporter_contact.to_string(),
            linked_investigation: None,
            created_at: Utc::now(),
        };

        let digest = sha256_hex(report.description.as_bytes());
        let entry = self
            .ledger
            .append(&actor.actor_id, AuditAction::ReportReceived, &report.report_id, &digest)?;

        let path = self.store.paths().report(&report.report_id);
        if let Err(e) = self.store.write_json(&path, &report) {
            let _ = self.ledger.append_correction(
                &actor.actor_id,
                entry.seq,
                "report persist failed after audit append",
            );
            return Err(e.into());
        }

        tracing::info!(report_id = %report.report_id, "fraud report received");
        Ok(report)
    }

    pub fn get_report(&self, report_id: &str) -> CoreResult<Report> {
        let path = self.store.paths().report(report_id);
        if !self.store.exists(&path) {
            return Err(CoreError::NotFound(format!("report {report_id}")));
        }
        Ok(self.store.read_json(path)?)
    }

    // ========== Case lifecycle ==========

    /// Open an investigation from a report.
    ///
    /// Agent or admin only. A report backs at most one investigation.
    /// A `linked_rug_id` ties the case to an issued RugID when the
    /// report named none; it must resolve against the RugID index.
    pub fn create_investigation(
        &self,
        report_ref: &str,
        linked_rug_id: Option<&str>,
        actor: &Actor,
    ) -> CoreResult<Investigation> {
        if !actor.has_role(Role::Agent) {
            return Err(CoreError::Forbidden(
                "only agents or admins open investigations".to_string(),
            ));
        }

        let report_lock = self.locks.entity(report_ref);
        let _guard = hold(&report_lock);

        let mut report = self.get_report(report_ref)?;
        if let Some(existing) = &report.linked_investigation {
            return Err(CoreError::InvalidTransition(format!(
                "report {report_ref} already backs investigation {existing}"
            )));
        }

        let rug_id = match linked_rug_id {
            Some(id) => {
                if !self.store.exists(self.store.paths().rugid_entry(id)) {
                    return Err(CoreError::NotFound(format!("RugID {id}")));
                }
                Some(id.to_string())
            }
            None => report.rug_id.clone(),
        };

        let now = Utc::now();
        let investigation = Investigation {
            investigation_id: uuid::Uuid::new_v4().to_string(),
            rug_id,
            report_ref: report_ref.to_string(),
            status: InvestigationStatus::Reported,
            evidence: report.evidence_links.clone(),
            assigned_agents: Vec::new(),
            verification_notes: None,
            verified_by: None,
            finalized_by: None,
            created_at: now,
            updated_at: now,
        };

        let digest = sha256_hex(report_ref.as_bytes());
        self.commit(&investigation, &actor.actor_id, AuditAction::InvestigationCreated, &digest)?;

        report.linked_investigation = Some(investigation.investigation_id.clone());
        self.store
            .write_json(self.store.paths().report(report_ref), &report)?;

        tracing::info!(
            investigation_id = %investigation.investigation_id,
            report_ref,
            "investigation opened"
        );
        Ok(investigation)
    }

    pub fn get(&self, investigation_id: &str) -> CoreResult<Investigation> {
        let path = self.store.paths().investigation(investigation_id);
        if !self.store.exists(&path) {
            return Err(CoreError::NotFound(format!(
                "investigation {investigation_id}"
            )));
        }
        Ok(self.store.read_json(path)?)
    }

    /// List all investigations referencing a RugID.
    pub fn list_for_rug_id(&self, rug_id: &str) -> CoreResult<Vec<Investigation>> {
        let ids = self
            .store
            .list_files(self.store.paths().investigations_dir(), "json")?;
        let mut out = Vec::new();
        for id in ids {
            let investigation: Investigation =
                match self.store.read_json(self.store.paths().investigation(&id)) {
                    Ok(inv) => inv,
                    Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                        continue
                    }
                    Err(e) => return Err(e.into()),
                };
            if investigation.rug_id.as_deref() == Some(rug_id) {
                out.push(investigation);
            }
        }
        Ok(out)
    }

    /// Apply one state machine transition.
    ///
    /// Refused transitions leave the case file and the ledger untouched.
    pub fn transition(
        &self,
        investigation_id: &str,
        target: InvestigationStatus,
        params: &TransitionParams,
        actor: &Actor,
    ) -> CoreResult<Investigation> {
        let lock = self.locks.entity(investigation_id);
        let _guard = hold(&lock);

        let mut investigation = self.get(investigation_id)?;

        if investigation.status.is_terminal() {
            return Err(CoreError::InvalidTransition(format!(
                "investigation is {}, which is terminal",
                investigation.status
            )));
        }

        // Idempotent no-op: re-entering in_progress is harmless.
        if investigation.status == InvestigationStatus::InProgress
            && target == InvestigationStatus::InProgress
        {
            return Ok(investigation);
        }

        let action = match target {
            InvestigationStatus::Assigned => {
                self.guard_assign(&investigation, params, actor)?;
                let assignee = params.assignee.clone().ok_or_else(|| {
                    CoreError::Validation("assignment requires an assignee".to_string())
                })?;
                investigation.assigned_agents.push(assignee);
                AuditAction::InvestigationAssigned
            }
            InvestigationStatus::InProgress => {
                self.guard_start(&investigation, actor)?;
                AuditAction::InvestigationStarted
            }
            InvestigationStatus::PendingVerification => {
                self.guard_verify(&investigation, params, actor)?;
                investigation.verification_notes = params.notes.clone();
                investigation.verified_by = Some(actor.actor_id.clone());
                AuditAction::InvestigationVerifiedByAgent
            }
            InvestigationStatus::PendingFinalVerification => {
                self.guard_finalize(&investigation, actor)?;
                investigation.finalized_by = Some(actor.actor_id.clone());
                AuditAction::InvestigationFinalVerification
            }
            InvestigationStatus::Approved => {
                self.guard_approve(&investigation, actor)?;
                AuditAction::InvestigationApproved
            }
            InvestigationStatus::Rejected => {
                self.guard_reject(&investigation, actor)?;
                AuditAction::InvestigationRejected
            }
            InvestigationStatus::Reported | InvestigationStatus::PackageSent => {
                return Err(CoreError::InvalidTransition(format!(
                    "{target} is not a valid transition target"
                )));
            }
        };

        investigation.status = target;
        investigation.updated_at = Utc::now();

        let digest = sha256_hex(target.to_string().as_bytes());
        self.commit(&investigation, &actor.actor_id, action, &digest)?;
        Ok(investigation)
    }

    /// Assemble, disclose, and deliver the evidence package for an
    /// approved case, then commit the terminal `package_sent` state.
    ///
    /// No lock is held across the delivery. The case is re-validated
    /// after the send; a timeout or delivery failure journals
    /// `operation.timeout` (or surfaces the delivery error) and leaves
    /// the case `approved` for a retry.
    pub async fn send_package(
        &self,
        investigation_id: &str,
        destination: &str,
        actor: &Actor,
    ) -> CoreResult<String> {
        if !actor.is_admin() {
            return Err(CoreError::Forbidden(
                "only admins release evidence packages".to_string(),
            ));
        }

        // Phase 1: validate under the lock and claim the in-flight slot.
        let (investigation, record_id) = {
            let lock = self.locks.entity(investigation_id);
            let _guard = hold(&lock);

            let investigation = self.get(investigation_id)?;
            if investigation.status != InvestigationStatus::Approved {
                return Err(CoreError::InvalidTransition(format!(
                    "package can only be sent from approved, case is {}",
                    investigation.status
                )));
            }
            let rug_id = investigation.rug_id.clone().ok_or_else(|| {
                CoreError::Validation("approved case has no linked RugID".to_string())
            })?;

            let index: RugIdEntry = self
                .store
                .read_json(self.store.paths().rugid_entry(&rug_id))
                .map_err(|_| CoreError::NotFound(format!("RugID {rug_id}")))?;

            let mut in_flight = self
                .sends_in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !in_flight.insert(investigation_id.to_string()) {
                return Err(CoreError::InvalidTransition(
                    "package send already in flight".to_string(),
                ));
            }

            (investigation, index.record_id)
        };

        let result = self
            .disclose_and_deliver(&investigation, &record_id, destination, actor)
            .await;

        // The in-flight claim is released on every exit path.
        let digest = match result {
            Ok(digest) => digest,
            Err(e) => {
                self.release_in_flight(investigation_id);
                return Err(e);
            }
        };

        // Phase 2: re-validate and commit the terminal state.
        let commit_result = {
            let lock = self.locks.entity(investigation_id);
            let _guard = hold(&lock);

            let mut current = self.get(investigation_id)?;
            if current.status != InvestigationStatus::Approved {
                Err(CoreError::InvalidTransition(format!(
                    "case left approved during the send, now {}",
                    current.status
                )))
            } else {
                current.status = InvestigationStatus::PackageSent;
                current.updated_at = Utc::now();
                // The entry binds where the package went, not just its
                // content.
                let release_digest = Self::release_digest(destination, &digest);
                self.commit(
                    &current,
                    &actor.actor_id,
                    AuditAction::InvestigationPackageSent,
                    &release_digest,
                )
            }
        };
        self.release_in_flight(investigation_id);
        commit_result?;

        // The identity has left the vault boundary for good.
        self.vault.mark_released(&record_id, actor)?;

        tracing::info!(investigation_id, destination, "evidence package sent");
        Ok(digest)
    }

    // ========== Internal ==========

    /// Digest journaled with `investigation.package_sent`: covers the
    /// delivery destination and the package content digest.
    fn release_digest(destination: &str, package_digest: &str) -> String {
        sha256_hex(format!("{destination}|{package_digest}").as_bytes())
    }

    /// Open the vault, assemble the package, and deliver it under the
    /// send deadline. Returns the package digest.
    async fn disclose_and_deliver(
        &self,
        investigation: &Investigation,
        record_id: &str,
        destination: &str,
        actor: &Actor,
    ) -> CoreResult<String> {
        let justification = format!(
            "evidence package for investigation {}",
            investigation.investigation_id
        );
        let disclosed = self
            .vault
            .request_disclosure(record_id, actor, &justification)?;

        let package = serde_json::json!({
            "investigation_id": investigation.investigation_id,
            "rug_id": investigation.rug_id,
            "report_ref": investigation.report_ref,
            "evidence": investigation.evidence,
            "verification_notes": investigation.verification_notes,
            "verified_by": investigation.verified_by,
            "finalized_by": investigation.finalized_by,
            "identity": disclosed.payload,
            "generated_at": Utc::now(),
        });
        let digest = sha256_hex(
            serde_json::to_string(&package)
                .map_err(|e| CoreError::Validation(format!("unserializable package: {e}")))?
                .as_bytes(),
        );

        match tokio::time::timeout(self.send_timeout, self.transport.deliver(destination, &package))
            .await
        {
            Ok(Ok(())) => Ok(digest),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                // Journal the expired attempt; the case stays approved.
                self.ledger.append(
                    &actor.actor_id,
                    AuditAction::OperationTimeout,
                    &investigation.investigation_id,
                    &digest,
                )?;
                Err(CoreError::Timeout(format!(
                    "package delivery exceeded {}s",
                    self.send_timeout.as_secs()
                )))
            }
        }
    }

    fn release_in_flight(&self, investigation_id: &str) {
        self.sends_in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(investigation_id);
    }

    fn send_in_flight(&self, investigation_id: &str) -> bool {
        self.sends_in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(investigation_id)
    }

    fn guard_assign(
        &self,
        investigation: &Investigation,
        params: &TransitionParams,
        actor: &Actor,
    ) -> CoreResult<()> {
        if !actor.has_role(Role::Agent) {
            return Err(CoreError::Forbidden(
                "only agents or admins assign cases".to_string(),
            ));
        }
        if investigation.status != InvestigationStatus::Reported {
            return Err(CoreError::InvalidTransition(format!(
                "cannot assign from {}",
                investigation.status
            )));
        }
        if params.assignee.as_deref().is_none_or(|a| a.trim().is_empty()) {
            return Err(CoreError::Validation(
                "assignment requires an assignee".to_string(),
            ));
        }
        Ok(())
    }

    fn guard_start(&self, investigation: &Investigation, actor: &Actor) -> CoreResult<()> {
        if investigation.status != InvestigationStatus::Assigned {
            return Err(CoreError::InvalidTransition(format!(
                "cannot start from {}",
                investigation.status
            )));
        }
        if !actor.is_admin() && !investigation.is_assigned(&actor.actor_id) {
            return Err(CoreError::Forbidden(
                "only an assigned agent starts the investigation".to_string(),
            ));
        }
        Ok(())
    }

    fn guard_verify(
        &self,
        investigation: &Investigation,
        params: &TransitionParams,
        actor: &Actor,
    ) -> CoreResult<()> {
        if investigation.status != InvestigationStatus::InProgress {
            return Err(CoreError::InvalidTransition(format!(
                "cannot submit verification from {}",
                investigation.status
            )));
        }
        if !investigation.is_assigned(&actor.actor_id) {
            return Err(CoreError::Forbidden(
                "verification must come from an assigned agent".to_string(),
            ));
        }
        if params.notes.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(CoreError::Validation(
                "verification requires non-empty notes".to_string(),
            ));
        }
        Ok(())
    }

    fn guard_finalize(&self, investigation: &Investigation, actor: &Actor) -> CoreResult<()> {
        if investigation.status != InvestigationStatus::PendingVerification {
            return Err(CoreError::InvalidTransition(format!(
                "cannot finalize from {}",
                investigation.status
            )));
        }
        if !actor.has_role(Role::Agent) {
            return Err(CoreError::Forbidden(
                "only agents or admins confirm verification".to_string(),
            ));
        }
        // Two-person rule.
        if investigation.verified_by.as_deref() == Some(actor.actor_id.as_str()) {
            return Err(CoreError::SelfApprovalNotAllowed);
        }
        Ok(())
    }

    fn guard_approve(&self, investigation: &Investigation, actor: &Actor) -> CoreResult<()> {
        if investigation.status != InvestigationStatus::PendingFinalVerification {
            return Err(CoreError::InvalidTransition(format!(
                "cannot approve from {}",
                investigation.status
            )));
        }
        if !actor.is_admin() {
            return Err(CoreError::Forbidden(
                "only admins approve investigations".to_string(),
            ));
        }
        let rug_id = investigation.rug_id.as_deref().ok_or_else(|| {
            CoreError::Validation("approval requires a linked RugID".to_string())
        })?;
        let index: RugIdEntry = self
            .store
            .read_json(self.store.paths().rugid_entry(rug_id))
            .map_err(|_| CoreError::NotFound(format!("RugID {rug_id}")))?;
        // An approval whose disclosure would be denied is meaningless.
        self.vault.disclosure_satisfiable(&index.record_id)?;
        Ok(())
    }

    fn guard_reject(&self, investigation: &Investigation, actor: &Actor) -> CoreResult<()> {
        if !actor.is_admin() {
            return Err(CoreError::Forbidden(
                "only admins reject investigations".to_string(),
            ));
        }
        if self.send_in_flight(&investigation.investigation_id) {
            return Err(CoreError::InvalidTransition(
                "cannot reject while a package send is in flight".to_string(),
            ));
        }
        Ok(())
    }

    /// Audit-then-persist commit for a case mutation.
    fn commit(
        &self,
        investigation: &Investigation,
        actor: &str,
        action: AuditAction,
        payload_digest: &str,
    ) -> CoreResult<()> {
        let entry = self.ledger.append(
            actor,
            action,
            &investigation.investigation_id,
            payload_digest,
        )?;

        let path = self
            .store
            .paths()
            .investigation(&investigation.investigation_id);
        if let Err(e) = self.store.write_json(&path, investigation) {
            let _ = self.ledger.append_correction(
                actor,
                entry.seq,
                "case persist failed after audit append",
            );
            return Err(e.into());
        }
        Ok(())
    }
}
