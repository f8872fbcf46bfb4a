//! Core types for the netting engine
//!
//! All types are designed for:
//! - Exact arithmetic (Decimal for money)
//! - Deterministic proposal computation
//! - Append-only settlement audit trail

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Trading-partner identifier (internal entity code, vendor number, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyId(String);

impl PartyId {
    /// Create new party ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO 4217 currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Currency {
    /// US Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound
    GBP,
    /// UAE Dirham
    AED,
    /// Indian Rupee
    INR,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::AED => "AED",
            Currency::INR => "INR",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "AED" => Some(Currency::AED),
            "INR" => Some(Currency::INR),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Agreement lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgreementStatus {
    /// Proposals and settlements allowed
    Active,
    /// Temporarily disabled by an administrator
    Suspended,
    /// Permanently closed; kept for audit
    Terminated,
}

impl AgreementStatus {
    /// Whether the agreement accepts proposals and settlements
    pub fn is_active(&self) -> bool {
        matches!(self, AgreementStatus::Active)
    }
}

impl fmt::Display for AgreementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgreementStatus::Active => "Active",
            AgreementStatus::Suspended => "Suspended",
            AgreementStatus::Terminated => "Terminated",
        };
        write!(f, "{}", s)
    }
}

/// Bilateral netting agreement between a customer-role entity and a
/// supplier-role entity
///
/// The netting currency is fixed at creation; all netting arithmetic for
/// this agreement is confined to it. Agreements are never deleted, only
/// status-transitioned. The same entity may appear on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NettingAgreement {
    /// Agreement ID
    pub id: Uuid,

    /// Counterparty owing us money (AR side)
    pub customer_party: PartyId,

    /// Counterparty we owe money to (AP side)
    pub supplier_party: PartyId,

    /// Currency all netting arithmetic is confined to
    pub netting_currency: Currency,

    /// Lifecycle status
    pub status: AgreementStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Which subledger a line was projected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerRole {
    /// Accounts Receivable
    Receivable,
    /// Accounts Payable
    Payable,
}

impl fmt::Display for LedgerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LedgerRole::Receivable => "AR",
            LedgerRole::Payable => "AP",
        };
        write!(f, "{}", s)
    }
}

/// Read-only projection of an open AR or AP balance line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenLedgerLine {
    /// Invoice the open balance belongs to
    pub source_invoice_id: String,

    /// Open amount, non-negative, in the line's currency
    pub amount: Decimal,

    /// Currency of the line
    pub currency: Currency,

    /// Originating subledger
    pub role: LedgerRole,
}

/// Which party still owes money after netting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidualDirection {
    /// Customer still owes us the residual (AR > AP)
    ReceiveFromCustomer,
    /// We still owe the supplier the residual (AP > AR)
    PaySupplier,
    /// Totals are equal; nothing remains after netting
    None,
}

/// Computed netting proposal
///
/// Never persisted: every call recomputes against live subledger state.
/// Identical inputs always produce an identical proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NettingProposal {
    /// Agreement this proposal was computed for
    pub agreement_id: Uuid,

    /// Sum of open AR lines in the netting currency
    pub total_ar: Decimal,

    /// Sum of open AP lines in the netting currency
    pub total_ap: Decimal,

    /// Offsettable amount: min(total_ar, total_ap)
    pub netted_amount: Decimal,

    /// Who owes the remainder after offsetting
    pub residual_direction: ResidualDirection,

    /// AR lines contributing to the totals (audit/display)
    pub ar_lines: Vec<OpenLedgerLine>,

    /// AP lines contributing to the totals (audit/display)
    pub ap_lines: Vec<OpenLedgerLine>,
}

impl NettingProposal {
    /// Amount still owed in the residual direction after netting
    pub fn residual_amount(&self) -> Decimal {
        (self.total_ar - self.total_ap).abs()
    }
}

/// Reference to a posted AR receipt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptRef(String);

impl ReceiptRef {
    /// Create new receipt reference
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a posted AP payment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentRef(String);

impl PaymentRef {
    /// Create new payment reference
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settlement status
///
/// `Proposed` transitions exactly once, to `Settled` or `Failed`; both
/// are terminal. Retries create a new settlement, never mutate a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    /// Durable intent marker written before any subledger mutation
    Proposed,
    /// Both postings committed
    Settled,
    /// Posting failed; nothing committed
    Failed,
}

impl SettlementStatus {
    /// Whether the settlement can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SettlementStatus::Proposed)
    }
}

/// Immutable settlement record
///
/// `ar_receipt_ref` and `ap_payment_ref` are both set iff the settlement
/// is `Settled` — a half-posted record is never a resting state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NettingSettlement {
    /// Settlement ID
    pub id: Uuid,

    /// Agreement settled against
    pub agreement_id: Uuid,

    /// Amount offset on both sides
    pub netted_amount: Decimal,

    /// Currency of the offset (the agreement's netting currency)
    pub currency: Currency,

    /// Current status
    pub status: SettlementStatus,

    /// AR receipt posted against the customer's open balance
    pub ar_receipt_ref: Option<ReceiptRef>,

    /// AP payment posted against the supplier's open balance
    pub ap_payment_ref: Option<PaymentRef>,

    /// Reason recorded when the settlement failed
    pub failure_reason: Option<String>,

    /// When the Proposed marker was written
    pub created_at: DateTime<Utc>,

    /// When both postings committed
    pub settled_at: Option<DateTime<Utc>>,
}

impl NettingSettlement {
    /// Create the durable intent marker for an execution attempt
    pub fn proposed(agreement: &NettingAgreement, netted_amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            agreement_id: agreement.id,
            netted_amount,
            currency: agreement.netting_currency,
            status: SettlementStatus::Proposed,
            ar_receipt_ref: None,
            ap_payment_ref: None,
            failure_reason: None,
            created_at: Utc::now(),
            settled_at: None,
        }
    }
}

/// Client request to execute a settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRequest {
    /// Agreement to settle against
    pub agreement_id: Uuid,

    /// Amount to offset; must not exceed the freshly recomputed ceiling
    pub netted_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_round_trip() {
        for code in ["USD", "EUR", "GBP", "AED", "INR"] {
            let currency = Currency::parse(code).unwrap();
            assert_eq!(currency.code(), code);
        }
        assert!(Currency::parse("XXX").is_none());
    }

    #[test]
    fn test_residual_amount() {
        let proposal = NettingProposal {
            agreement_id: Uuid::new_v4(),
            total_ar: Decimal::new(1200000, 2),
            total_ap: Decimal::new(950000, 2),
            netted_amount: Decimal::new(950000, 2),
            residual_direction: ResidualDirection::ReceiveFromCustomer,
            ar_lines: vec![],
            ap_lines: vec![],
        };

        assert_eq!(proposal.residual_amount(), Decimal::new(250000, 2));
    }

    #[test]
    fn test_settlement_status_terminality() {
        assert!(!SettlementStatus::Proposed.is_terminal());
        assert!(SettlementStatus::Settled.is_terminal());
        assert!(SettlementStatus::Failed.is_terminal());
    }
}
