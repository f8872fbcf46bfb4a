//! Netting agreement repository
//!
//! Agreements are created by an administrative action, read by the
//! proposal and settlement paths, and never deleted — only
//! status-transitioned.

use crate::{
    types::{AgreementStatus, NettingAgreement},
    Error, Result,
};
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

/// Storage contract for netting agreements
#[async_trait]
pub trait AgreementRepository: Send + Sync {
    /// Store a newly created agreement
    async fn insert(&self, agreement: NettingAgreement) -> Result<()>;

    /// Load an agreement by ID
    async fn get(&self, id: Uuid) -> Result<NettingAgreement>;

    /// All agreements, oldest first
    async fn list(&self) -> Result<Vec<NettingAgreement>>;

    /// Transition an agreement's lifecycle status
    async fn set_status(&self, id: Uuid, status: AgreementStatus) -> Result<()>;
}

/// In-memory agreement repository
#[derive(Debug, Default)]
pub struct InMemoryAgreementRepository {
    agreements: DashMap<Uuid, NettingAgreement>,
}

impl InMemoryAgreementRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgreementRepository for InMemoryAgreementRepository {
    async fn insert(&self, agreement: NettingAgreement) -> Result<()> {
        if self.agreements.contains_key(&agreement.id) {
            return Err(Error::Storage(format!(
                "agreement {} already exists",
                agreement.id
            )));
        }
        self.agreements.insert(agreement.id, agreement);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<NettingAgreement> {
        self.agreements
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(Error::AgreementNotFound(id))
    }

    async fn list(&self) -> Result<Vec<NettingAgreement>> {
        let mut agreements: Vec<NettingAgreement> =
            self.agreements.iter().map(|entry| entry.clone()).collect();
        agreements.sort_by_key(|a| a.created_at);
        Ok(agreements)
    }

    async fn set_status(&self, id: Uuid, status: AgreementStatus) -> Result<()> {
        let mut entry = self
            .agreements
            .get_mut(&id)
            .ok_or(Error::AgreementNotFound(id))?;
        entry.status = status;
        Ok(())
    }
}
