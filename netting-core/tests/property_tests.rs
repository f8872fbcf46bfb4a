//! Property-based tests for proposal invariants
//!
//! These tests use proptest to verify:
//! - netted_amount == min(total_ar, total_ap), never negative
//! - Residual direction is consistent with the totals
//! - The calculator is pure: identical inputs → identical proposals
//! - Totals are exact decimal sums of the contributing lines

use chrono::Utc;
use netting_core::{
    types::{
        AgreementStatus, Currency, LedgerRole, NettingAgreement, OpenLedgerLine, PartyId,
        ResidualDirection,
    },
    ProposalCalculator,
};
use proptest::collection::vec;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Strategy for non-negative amounts (whole cents)
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0u64..1_000_000_00u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// Strategy for open USD lines on one side
fn lines_strategy(role: LedgerRole) -> impl Strategy<Value = Vec<OpenLedgerLine>> {
    vec(
        (amount_strategy(), "[A-Z]{3}-[0-9]{5}"),
        0..20,
    )
    .prop_map(move |entries| {
        entries
            .into_iter()
            .map(|(amount, invoice)| OpenLedgerLine {
                source_invoice_id: invoice,
                amount,
                currency: Currency::USD,
                role,
            })
            .collect()
    })
}

fn usd_agreement() -> NettingAgreement {
    NettingAgreement {
        id: Uuid::new_v4(),
        customer_party: PartyId::new("ACME-US"),
        supplier_party: PartyId::new("ACME-DE"),
        netting_currency: Currency::USD,
        status: AgreementStatus::Active,
        created_at: Utc::now(),
    }
}

proptest! {
    #[test]
    fn netted_amount_is_min_of_totals(
        ar_lines in lines_strategy(LedgerRole::Receivable),
        ap_lines in lines_strategy(LedgerRole::Payable),
    ) {
        let agreement = usd_agreement();
        let proposal =
            ProposalCalculator::compute(&agreement, ar_lines, ap_lines).unwrap();

        prop_assert_eq!(
            proposal.netted_amount,
            proposal.total_ar.min(proposal.total_ap)
        );
        prop_assert!(proposal.netted_amount >= Decimal::ZERO);
        prop_assert!(proposal.netted_amount <= proposal.total_ar);
        prop_assert!(proposal.netted_amount <= proposal.total_ap);
    }

    #[test]
    fn residual_direction_matches_totals(
        ar_lines in lines_strategy(LedgerRole::Receivable),
        ap_lines in lines_strategy(LedgerRole::Payable),
    ) {
        let agreement = usd_agreement();
        let proposal =
            ProposalCalculator::compute(&agreement, ar_lines, ap_lines).unwrap();

        let expected = if proposal.total_ar > proposal.total_ap {
            ResidualDirection::ReceiveFromCustomer
        } else if proposal.total_ar < proposal.total_ap {
            ResidualDirection::PaySupplier
        } else {
            ResidualDirection::None
        };

        prop_assert_eq!(proposal.residual_direction, expected);
        prop_assert_eq!(
            proposal.residual_amount(),
            (proposal.total_ar - proposal.total_ap).abs()
        );
    }

    #[test]
    fn calculator_is_pure(
        ar_lines in lines_strategy(LedgerRole::Receivable),
        ap_lines in lines_strategy(LedgerRole::Payable),
    ) {
        let agreement = usd_agreement();

        let first = ProposalCalculator::compute(
            &agreement,
            ar_lines.clone(),
            ap_lines.clone(),
        )
        .unwrap();
        let second =
            ProposalCalculator::compute(&agreement, ar_lines, ap_lines).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn totals_are_exact_sums(
        ar_lines in lines_strategy(LedgerRole::Receivable),
        ap_lines in lines_strategy(LedgerRole::Payable),
    ) {
        let agreement = usd_agreement();
        let expected_ar: Decimal = ar_lines.iter().map(|l| l.amount).sum();
        let expected_ap: Decimal = ap_lines.iter().map(|l| l.amount).sum();

        let proposal =
            ProposalCalculator::compute(&agreement, ar_lines, ap_lines).unwrap();

        prop_assert_eq!(proposal.total_ar, expected_ar);
        prop_assert_eq!(proposal.total_ap, expected_ap);
    }
}
