//! Netting proposal computation
//!
//! Pure bilateral offset arithmetic: no I/O, no hidden state, identical
//! inputs always produce an identical proposal. Callers are responsible
//! for filtering lines to the agreement's counterparties and netting
//! currency; the currency and role checks here are defensive invariant
//! checks, not a normal path.
//!
//! # Example
//!
//! ```text
//! Open AR (customer owes us):   $12,000
//! Open AP (we owe supplier):     $9,500
//!
//! Netted amount:   $9,500 = min($12,000, $9,500)
//! Residual:        $2,500 still owed by the customer
//! ```

use crate::{
    types::{LedgerRole, NettingAgreement, NettingProposal, OpenLedgerLine, ResidualDirection},
    Error, Result,
};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Pure proposal calculator
#[derive(Debug, Clone, Copy)]
pub struct ProposalCalculator;

impl ProposalCalculator {
    /// Compute a netting proposal from open AR and AP lines
    ///
    /// The agreement must be Active. Totals use exact decimal sums;
    /// `netted_amount = min(total_ar, total_ap)`; equal totals produce
    /// `ResidualDirection::None`.
    pub fn compute(
        agreement: &NettingAgreement,
        ar_lines: Vec<OpenLedgerLine>,
        ap_lines: Vec<OpenLedgerLine>,
    ) -> Result<NettingProposal> {
        if !agreement.status.is_active() {
            return Err(Error::AgreementNotActive {
                id: agreement.id,
                status: agreement.status,
            });
        }

        let total_ar = Self::sum_side(&ar_lines, LedgerRole::Receivable, agreement)?;
        let total_ap = Self::sum_side(&ap_lines, LedgerRole::Payable, agreement)?;

        let netted_amount = total_ar.min(total_ap);

        let residual_direction = match total_ar.cmp(&total_ap) {
            Ordering::Greater => ResidualDirection::ReceiveFromCustomer,
            Ordering::Less => ResidualDirection::PaySupplier,
            Ordering::Equal => ResidualDirection::None,
        };

        Ok(NettingProposal {
            agreement_id: agreement.id,
            total_ar,
            total_ap,
            netted_amount,
            residual_direction,
            ar_lines,
            ap_lines,
        })
    }

    /// Sum one side, enforcing currency, role, and non-negativity
    fn sum_side(
        lines: &[OpenLedgerLine],
        role: LedgerRole,
        agreement: &NettingAgreement,
    ) -> Result<Decimal> {
        let mut total = Decimal::ZERO;

        for line in lines {
            if line.currency != agreement.netting_currency {
                return Err(Error::CurrencyMismatch {
                    expected: agreement.netting_currency,
                    found: line.currency,
                    invoice: line.source_invoice_id.clone(),
                });
            }

            if line.role != role {
                return Err(Error::Validation(format!(
                    "invoice {} carries role {} but was passed on the {} side",
                    line.source_invoice_id, line.role, role
                )));
            }

            if line.amount < Decimal::ZERO {
                return Err(Error::InvalidLineAmount {
                    invoice: line.source_invoice_id.clone(),
                    amount: line.amount,
                });
            }

            total += line.amount;
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgreementStatus, Currency, PartyId};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn agreement(status: AgreementStatus) -> NettingAgreement {
        NettingAgreement {
            id: Uuid::new_v4(),
            customer_party: PartyId::new("ACME-US"),
            supplier_party: PartyId::new("ACME-DE"),
            netting_currency: Currency::USD,
            status,
            created_at: Utc::now(),
        }
    }

    fn line(invoice: &str, amount: Decimal, currency: Currency, role: LedgerRole) -> OpenLedgerLine {
        OpenLedgerLine {
            source_invoice_id: invoice.to_string(),
            amount,
            currency,
            role,
        }
    }

    fn ar(invoice: &str, amount: Decimal) -> OpenLedgerLine {
        line(invoice, amount, Currency::USD, LedgerRole::Receivable)
    }

    fn ap(invoice: &str, amount: Decimal) -> OpenLedgerLine {
        line(invoice, amount, Currency::USD, LedgerRole::Payable)
    }

    #[test]
    fn test_ar_exceeds_ap() {
        // AR $12,000 vs AP $9,500 → net $9,500, customer owes $2,500
        let agreement = agreement(AgreementStatus::Active);
        let proposal = ProposalCalculator::compute(
            &agreement,
            vec![ar("INV-1", dec!(7000.00)), ar("INV-2", dec!(5000.00))],
            vec![ap("BILL-1", dec!(9500.00))],
        )
        .unwrap();

        assert_eq!(proposal.total_ar, dec!(12000.00));
        assert_eq!(proposal.total_ap, dec!(9500.00));
        assert_eq!(proposal.netted_amount, dec!(9500.00));
        assert_eq!(
            proposal.residual_direction,
            ResidualDirection::ReceiveFromCustomer
        );
        assert_eq!(proposal.residual_amount(), dec!(2500.00));
    }

    #[test]
    fn test_equal_totals_yield_no_residual() {
        let agreement = agreement(AgreementStatus::Active);
        let proposal = ProposalCalculator::compute(
            &agreement,
            vec![ar("INV-1", dec!(5000.00))],
            vec![ap("BILL-1", dec!(5000.00))],
        )
        .unwrap();

        assert_eq!(proposal.netted_amount, dec!(5000.00));
        assert_eq!(proposal.residual_direction, ResidualDirection::None);
        assert_eq!(proposal.residual_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_empty_side_nets_zero() {
        let agreement = agreement(AgreementStatus::Active);
        let proposal =
            ProposalCalculator::compute(&agreement, vec![ar("INV-1", dec!(100.00))], vec![])
                .unwrap();

        assert_eq!(proposal.netted_amount, Decimal::ZERO);
        assert_eq!(
            proposal.residual_direction,
            ResidualDirection::ReceiveFromCustomer
        );
    }

    #[test]
    fn test_suspended_agreement_rejected() {
        let agreement = agreement(AgreementStatus::Suspended);
        let result = ProposalCalculator::compute(&agreement, vec![], vec![]);

        assert!(matches!(result, Err(Error::AgreementNotActive { .. })));
    }

    #[test]
    fn test_foreign_currency_line_is_an_invariant_violation() {
        let agreement = agreement(AgreementStatus::Active);
        let eur_line = line("INV-EU", dec!(100.00), Currency::EUR, LedgerRole::Receivable);
        let result = ProposalCalculator::compute(&agreement, vec![eur_line], vec![]);

        assert!(matches!(
            result,
            Err(Error::CurrencyMismatch {
                expected: Currency::USD,
                found: Currency::EUR,
                ..
            })
        ));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let agreement = agreement(AgreementStatus::Active);
        let result =
            ProposalCalculator::compute(&agreement, vec![ar("INV-1", dec!(-1.00))], vec![]);

        assert!(matches!(result, Err(Error::InvalidLineAmount { .. })));
    }

    #[test]
    fn test_wrong_role_on_side_rejected() {
        let agreement = agreement(AgreementStatus::Active);
        let result =
            ProposalCalculator::compute(&agreement, vec![ap("BILL-1", dec!(1.00))], vec![]);

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_deterministic() {
        let agreement = agreement(AgreementStatus::Active);
        let ar_lines = vec![ar("INV-1", dec!(123.45)), ar("INV-2", dec!(0.55))];
        let ap_lines = vec![ap("BILL-1", dec!(99.99))];

        let first =
            ProposalCalculator::compute(&agreement, ar_lines.clone(), ap_lines.clone()).unwrap();
        let second = ProposalCalculator::compute(&agreement, ar_lines, ap_lines).unwrap();

        assert_eq!(first, second);
    }
}
