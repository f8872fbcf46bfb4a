//! Settlement execution
//!
//! Drives the four-step settlement protocol:
//!
//! 1. **Revalidate** — reload the agreement and recompute a fresh
//!    proposal from live subledger state; the requested amount must not
//!    exceed the recomputed ceiling (it may be less — partial netting).
//! 2. **Persist intent** — write the settlement record in `Proposed`
//!    status before touching either subledger.
//! 3. **Post** — AR receipt first, AP payment second. The subledgers do
//!    not share a transaction, so atomicity is by compensation: if the
//!    AP payment fails, the AR receipt is reversed before the record is
//!    marked `Failed`. Both-or-neither is the only resting state.
//! 4. **Finalize** — store both posting references, mark `Settled`.
//!
//! Per-agreement serialization: execution holds an exclusive guard for
//! the agreement across all four steps. A competing attempt fails fast
//! with `ConcurrentSettlementConflict` instead of blocking, because it
//! would otherwise observe the same open balances and double-offset
//! them. Different agreements settle fully in parallel.
//!
//! State machine:
//!
//! ```text
//! Proposed --(both postings commit)--> Settled
//! Proposed --(posting fails, rolled back)--> Failed
//! ```

use crate::{
    agreements::AgreementRepository,
    proposal::ProposalCalculator,
    store::SettlementStore,
    subledger::{ApSubledger, ArSubledger},
    types::{
        LedgerRole, NettingAgreement, NettingSettlement, PaymentRef, ReceiptRef, SettlementRequest,
    },
    Error, Result,
};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Orchestrates atomic multi-subledger settlement
pub struct SettlementExecutor {
    agreements: Arc<dyn AgreementRepository>,
    ar: Arc<dyn ArSubledger>,
    ap: Arc<dyn ApSubledger>,
    store: Arc<dyn SettlementStore>,

    /// One guard per agreement; guards are never removed because
    /// agreements are never deleted
    guards: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl SettlementExecutor {
    /// Create a new executor over the given collaborators
    pub fn new(
        agreements: Arc<dyn AgreementRepository>,
        ar: Arc<dyn ArSubledger>,
        ap: Arc<dyn ApSubledger>,
        store: Arc<dyn SettlementStore>,
    ) -> Self {
        Self {
            agreements,
            ar,
            ap,
            store,
            guards: DashMap::new(),
        }
    }

    /// Execute a settlement request end to end
    ///
    /// On success exactly one AR receipt, one AP payment, and one
    /// `Settled` record exist; on failure none of the postings remain
    /// and the record (if written) is `Failed`.
    pub async fn execute(&self, request: SettlementRequest) -> Result<NettingSettlement> {
        let guard = self.guards.entry(request.agreement_id).or_default().clone();
        let _serialized = guard
            .try_lock()
            .map_err(|_| Error::ConcurrentSettlementConflict(request.agreement_id))?;

        // Step 1: revalidate against live subledger state
        let agreement = self.agreements.get(request.agreement_id).await?;
        let ceiling = self.recompute_ceiling(&agreement).await?;

        if request.netted_amount <= Decimal::ZERO {
            return Err(Error::Validation(format!(
                "settlement amount must be positive, got {}",
                request.netted_amount
            )));
        }

        if request.netted_amount > ceiling {
            return Err(Error::StaleProposal {
                requested: request.netted_amount,
                ceiling,
            });
        }

        // Step 2: durable intent marker, written before any posting
        let settlement = NettingSettlement::proposed(&agreement, request.netted_amount);
        self.store.insert(settlement.clone()).await?;

        info!(
            settlement_id = %settlement.id,
            agreement_id = %agreement.id,
            amount = %settlement.netted_amount,
            currency = %settlement.currency,
            "Executing settlement"
        );

        // Steps 3-4: post both sides, then finalize
        match self.post_both_sides(&agreement, &settlement).await {
            Ok((receipt, payment)) => {
                let settled = self
                    .store
                    .mark_settled(settlement.id, receipt, payment, Utc::now())
                    .await?;
                info!(
                    settlement_id = %settled.id,
                    agreement_id = %agreement.id,
                    "Settlement committed"
                );
                Ok(settled)
            }
            Err(err) => {
                warn!(
                    settlement_id = %settlement.id,
                    agreement_id = %agreement.id,
                    error = %err,
                    "Settlement failed, postings rolled back"
                );
                if let Err(store_err) = self.store.mark_failed(settlement.id, &err.to_string()).await
                {
                    warn!(
                        settlement_id = %settlement.id,
                        error = %store_err,
                        "Could not record settlement failure"
                    );
                }
                Err(err)
            }
        }
    }

    /// Recompute the netting ceiling from fresh subledger reads
    async fn recompute_ceiling(&self, agreement: &NettingAgreement) -> Result<Decimal> {
        let ar_lines = self
            .ar
            .find_open_invoices(&agreement.customer_party, agreement.netting_currency)
            .await?;
        let ap_lines = self
            .ap
            .find_open_invoices(&agreement.supplier_party, agreement.netting_currency)
            .await?;

        let proposal = ProposalCalculator::compute(agreement, ar_lines, ap_lines)?;
        Ok(proposal.netted_amount)
    }

    /// Post the AR receipt and AP payment as a compensating saga
    ///
    /// The AR side posts first because it carries the reversal
    /// operation: if the AP payment fails, the receipt comes back out
    /// before this returns.
    async fn post_both_sides(
        &self,
        agreement: &NettingAgreement,
        settlement: &NettingSettlement,
    ) -> Result<(ReceiptRef, PaymentRef)> {
        let reference = settlement.id.to_string();

        let receipt = self
            .ar
            .post_receipt(
                &agreement.customer_party,
                settlement.netted_amount,
                settlement.currency,
                &reference,
            )
            .await
            .map_err(|e| Error::SubledgerPosting {
                side: LedgerRole::Receivable,
                reason: e.to_string(),
            })?;

        match self
            .ap
            .post_payment(
                &agreement.supplier_party,
                settlement.netted_amount,
                settlement.currency,
                &reference,
            )
            .await
        {
            Ok(payment) => Ok((receipt, payment)),
            Err(ap_err) => {
                match self
                    .ar
                    .reverse_receipt(&agreement.customer_party, &receipt)
                    .await
                {
                    Ok(()) => Err(Error::SubledgerPosting {
                        side: LedgerRole::Payable,
                        reason: ap_err.to_string(),
                    }),
                    Err(reversal_err) => Err(Error::CompensationFailed {
                        receipt: receipt.to_string(),
                        reason: format!(
                            "AP posting failed ({}), then AR reversal failed ({})",
                            ap_err, reversal_err
                        ),
                    }),
                }
            }
        }
    }
}
