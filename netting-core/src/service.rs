//! Netting service facade
//!
//! Composition root for the engine: wires the agreement repository, the
//! AR/AP subledger adapters, the proposal calculator, and the
//! settlement executor behind one external contract.

use crate::{
    agreements::AgreementRepository,
    executor::SettlementExecutor,
    proposal::ProposalCalculator,
    store::SettlementStore,
    subledger::{ApSubledger, ArSubledger},
    types::{
        AgreementStatus, Currency, NettingAgreement, NettingProposal, NettingSettlement, PartyId,
        SettlementRequest,
    },
    Error, Result,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Fields of an agreement under creation
#[derive(Debug, Clone)]
pub struct NewAgreement {
    /// Counterparty on the AR side
    pub customer_party: PartyId,
    /// Counterparty on the AP side
    pub supplier_party: PartyId,
    /// Currency all netting for this agreement is confined to
    pub netting_currency: Currency,
}

/// The netting engine's external contract
pub struct NettingService {
    agreements: Arc<dyn AgreementRepository>,
    ar: Arc<dyn ArSubledger>,
    ap: Arc<dyn ApSubledger>,
    store: Arc<dyn SettlementStore>,
    executor: SettlementExecutor,
}

impl NettingService {
    /// Compose the service from its collaborators
    pub fn new(
        agreements: Arc<dyn AgreementRepository>,
        ar: Arc<dyn ArSubledger>,
        ap: Arc<dyn ApSubledger>,
        store: Arc<dyn SettlementStore>,
    ) -> Self {
        let executor = SettlementExecutor::new(
            agreements.clone(),
            ar.clone(),
            ap.clone(),
            store.clone(),
        );
        Self {
            agreements,
            ar,
            ap,
            store,
            executor,
        }
    }

    /// Create an Active agreement
    ///
    /// The netting currency is fixed here and never mutated afterwards.
    pub async fn create_agreement(&self, new: NewAgreement) -> Result<NettingAgreement> {
        if new.customer_party.as_str().is_empty() || new.supplier_party.as_str().is_empty() {
            return Err(Error::Validation(
                "customer and supplier party ids must be non-empty".to_string(),
            ));
        }

        let agreement = NettingAgreement {
            id: Uuid::new_v4(),
            customer_party: new.customer_party,
            supplier_party: new.supplier_party,
            netting_currency: new.netting_currency,
            status: AgreementStatus::Active,
            created_at: Utc::now(),
        };

        self.agreements.insert(agreement.clone()).await?;

        info!(
            agreement_id = %agreement.id,
            customer = %agreement.customer_party,
            supplier = %agreement.supplier_party,
            currency = %agreement.netting_currency,
            "Created netting agreement"
        );

        Ok(agreement)
    }

    /// All agreements, oldest first
    pub async fn list_agreements(&self) -> Result<Vec<NettingAgreement>> {
        self.agreements.list().await
    }

    /// Compute a fresh proposal for an agreement
    ///
    /// Never cached: every call reads live subledger state. The adapter
    /// contract scopes the reads to the agreement's counterparties and
    /// netting currency, so the pure calculator receives pre-filtered
    /// lines; balances in other currencies never participate.
    pub async fn propose(&self, agreement_id: Uuid) -> Result<NettingProposal> {
        let agreement = self.agreements.get(agreement_id).await?;

        let ar_lines = self
            .ar
            .find_open_invoices(&agreement.customer_party, agreement.netting_currency)
            .await?;
        let ap_lines = self
            .ap
            .find_open_invoices(&agreement.supplier_party, agreement.netting_currency)
            .await?;

        ProposalCalculator::compute(&agreement, ar_lines, ap_lines)
    }

    /// Execute a settlement against an agreement
    pub async fn settle(&self, request: SettlementRequest) -> Result<NettingSettlement> {
        self.executor.execute(request).await
    }

    /// Load one settlement record
    pub async fn get_settlement(&self, id: Uuid) -> Result<NettingSettlement> {
        self.store.get(id).await
    }

    /// Audit trail of settlement attempts for an agreement
    pub async fn list_settlements(&self, agreement_id: Uuid) -> Result<Vec<NettingSettlement>> {
        self.store.list_for_agreement(agreement_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreements::InMemoryAgreementRepository;
    use crate::store::InMemorySettlementStore;
    use crate::subledger::{InMemoryApLedger, InMemoryArLedger};
    use crate::types::ResidualDirection;
    use rust_decimal_macros::dec;

    struct Fixture {
        service: NettingService,
        ar: Arc<InMemoryArLedger>,
        ap: Arc<InMemoryApLedger>,
    }

    fn fixture() -> Fixture {
        let ar = Arc::new(InMemoryArLedger::new());
        let ap = Arc::new(InMemoryApLedger::new());
        let service = NettingService::new(
            Arc::new(InMemoryAgreementRepository::new()),
            ar.clone(),
            ap.clone(),
            Arc::new(InMemorySettlementStore::new()),
        );
        Fixture { service, ar, ap }
    }

    fn new_agreement() -> NewAgreement {
        NewAgreement {
            customer_party: PartyId::new("ACME-US"),
            supplier_party: PartyId::new("ACME-DE"),
            netting_currency: Currency::USD,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_agreements() {
        let fx = fixture();

        let created = fx.service.create_agreement(new_agreement()).await.unwrap();
        assert_eq!(created.status, AgreementStatus::Active);

        let listed = fx.service.list_agreements().await.unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn test_empty_party_rejected() {
        let fx = fixture();
        let result = fx
            .service
            .create_agreement(NewAgreement {
                customer_party: PartyId::new(""),
                ..new_agreement()
            })
            .await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_foreign_currency_lines_are_excluded_not_converted() {
        let fx = fixture();
        let agreement = fx.service.create_agreement(new_agreement()).await.unwrap();

        fx.ar
            .add_invoice(&agreement.customer_party, "INV-USD", dec!(100.00), Currency::USD);
        fx.ar
            .add_invoice(&agreement.customer_party, "INV-EUR", dec!(500.00), Currency::EUR);
        fx.ap
            .add_invoice(&agreement.supplier_party, "BILL-USD", dec!(80.00), Currency::USD);

        let proposal = fx.service.propose(agreement.id).await.unwrap();

        // The EUR invoice contributes nothing
        assert_eq!(proposal.total_ar, dec!(100.00));
        assert_eq!(proposal.total_ap, dec!(80.00));
        assert_eq!(proposal.netted_amount, dec!(80.00));
        assert_eq!(proposal.ar_lines.len(), 1);
        assert_eq!(proposal.ar_lines[0].source_invoice_id, "INV-USD");
    }

    #[tokio::test]
    async fn test_proposal_is_computed_fresh_each_call() {
        let fx = fixture();
        let agreement = fx.service.create_agreement(new_agreement()).await.unwrap();

        fx.ar
            .add_invoice(&agreement.customer_party, "INV-1", dec!(100.00), Currency::USD);
        fx.ap
            .add_invoice(&agreement.supplier_party, "BILL-1", dec!(60.00), Currency::USD);

        let before = fx.service.propose(agreement.id).await.unwrap();
        assert_eq!(before.netted_amount, dec!(60.00));

        // New invoice arrives; the next call sees it
        fx.ap
            .add_invoice(&agreement.supplier_party, "BILL-2", dec!(70.00), Currency::USD);

        let after = fx.service.propose(agreement.id).await.unwrap();
        assert_eq!(after.netted_amount, dec!(100.00));
        assert_eq!(after.residual_direction, ResidualDirection::PaySupplier);
    }

    #[tokio::test]
    async fn test_settlement_audit_trail() {
        let fx = fixture();
        let agreement = fx.service.create_agreement(new_agreement()).await.unwrap();

        fx.ar
            .add_invoice(&agreement.customer_party, "INV-1", dec!(100.00), Currency::USD);
        fx.ap
            .add_invoice(&agreement.supplier_party, "BILL-1", dec!(100.00), Currency::USD);

        let settled = fx
            .service
            .settle(SettlementRequest {
                agreement_id: agreement.id,
                netted_amount: dec!(100.00),
            })
            .await
            .unwrap();

        assert_eq!(fx.service.get_settlement(settled.id).await.unwrap(), settled);
        assert_eq!(
            fx.service.list_settlements(agreement.id).await.unwrap(),
            vec![settled]
        );
    }
}
