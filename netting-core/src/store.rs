//! Settlement record store
//!
//! Append-only audit trail: a record is written in `Proposed` status
//! before any subledger mutation and transitions exactly once to
//! `Settled` or `Failed`. Terminal records reject further mutation;
//! corrections are new settlements, never edits.

use crate::{
    types::{NettingSettlement, PaymentRef, ReceiptRef, SettlementStatus},
    Error, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// Storage contract for settlement records
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Persist the Proposed intent marker
    async fn insert(&self, settlement: NettingSettlement) -> Result<()>;

    /// Transition Proposed → Settled, recording both posting references
    async fn mark_settled(
        &self,
        id: Uuid,
        receipt: ReceiptRef,
        payment: PaymentRef,
        settled_at: DateTime<Utc>,
    ) -> Result<NettingSettlement>;

    /// Transition Proposed → Failed with a recorded reason
    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<NettingSettlement>;

    /// Load a settlement by ID
    async fn get(&self, id: Uuid) -> Result<NettingSettlement>;

    /// All settlements for an agreement, oldest first
    async fn list_for_agreement(&self, agreement_id: Uuid) -> Result<Vec<NettingSettlement>>;
}

/// In-memory settlement store
#[derive(Debug, Default)]
pub struct InMemorySettlementStore {
    settlements: DashMap<Uuid, NettingSettlement>,
}

impl InMemorySettlementStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a transition to a record that must still be Proposed
    fn transition<F>(&self, id: Uuid, apply: F) -> Result<NettingSettlement>
    where
        F: FnOnce(&mut NettingSettlement),
    {
        let mut entry = self
            .settlements
            .get_mut(&id)
            .ok_or(Error::SettlementNotFound(id))?;

        if entry.status.is_terminal() {
            return Err(Error::Storage(format!(
                "settlement {} is already terminal ({:?})",
                id, entry.status
            )));
        }

        apply(&mut entry);
        Ok(entry.clone())
    }
}

#[async_trait]
impl SettlementStore for InMemorySettlementStore {
    async fn insert(&self, settlement: NettingSettlement) -> Result<()> {
        if self.settlements.contains_key(&settlement.id) {
            return Err(Error::Storage(format!(
                "settlement {} already exists",
                settlement.id
            )));
        }
        self.settlements.insert(settlement.id, settlement);
        Ok(())
    }

    async fn mark_settled(
        &self,
        id: Uuid,
        receipt: ReceiptRef,
        payment: PaymentRef,
        settled_at: DateTime<Utc>,
    ) -> Result<NettingSettlement> {
        self.transition(id, |record| {
            record.status = SettlementStatus::Settled;
            record.ar_receipt_ref = Some(receipt);
            record.ap_payment_ref = Some(payment);
            record.settled_at = Some(settled_at);
        })
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<NettingSettlement> {
        self.transition(id, |record| {
            record.status = SettlementStatus::Failed;
            record.failure_reason = Some(reason.to_string());
        })
    }

    async fn get(&self, id: Uuid) -> Result<NettingSettlement> {
        self.settlements
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(Error::SettlementNotFound(id))
    }

    async fn list_for_agreement(&self, agreement_id: Uuid) -> Result<Vec<NettingSettlement>> {
        let mut records: Vec<NettingSettlement> = self
            .settlements
            .iter()
            .filter(|entry| entry.agreement_id == agreement_id)
            .map(|entry| entry.clone())
            .collect();
        records.sort_by_key(|s| s.created_at);
        Ok(records)
    }
}
