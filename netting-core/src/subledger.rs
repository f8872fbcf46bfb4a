//! Subledger adapter contracts and in-memory reference adapters
//!
//! The AR and AP subledgers are owned by external collaborators. The
//! engine consumes them through the two traits below and never mutates
//! them outside the executor's single posting unit of work. The adapters
//! are assumed to give strongly-consistent reads of "open" status at
//! call time; they are not assumed to share transactions with each
//! other, which is why [`crate::executor::SettlementExecutor`] drives a
//! compensating saga.
//!
//! The in-memory implementations back the reference deployment and the
//! test suite. Receipts and payments apply against open invoices
//! oldest-first, and reference numbers come from a per-ledger atomic
//! sequence.

use crate::{
    types::{Currency, LedgerRole, OpenLedgerLine, PartyId, PaymentRef, ReceiptRef},
    Error, Result,
};
use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read/post interface over the Accounts Receivable subledger
#[async_trait]
pub trait ArSubledger: Send + Sync {
    /// Open invoice balances for a customer in one currency
    async fn find_open_invoices(
        &self,
        customer: &PartyId,
        currency: Currency,
    ) -> Result<Vec<OpenLedgerLine>>;

    /// Post a receipt against the customer's open balance
    async fn post_receipt(
        &self,
        customer: &PartyId,
        amount: Decimal,
        currency: Currency,
        reference: &str,
    ) -> Result<ReceiptRef>;

    /// Reverse a previously posted receipt (compensating action)
    async fn reverse_receipt(&self, customer: &PartyId, receipt: &ReceiptRef) -> Result<()>;
}

/// Read/post interface over the Accounts Payable subledger
#[async_trait]
pub trait ApSubledger: Send + Sync {
    /// Open invoice balances owed to a supplier in one currency
    async fn find_open_invoices(
        &self,
        supplier: &PartyId,
        currency: Currency,
    ) -> Result<Vec<OpenLedgerLine>>;

    /// Post a payment against the supplier's open balance
    async fn post_payment(
        &self,
        supplier: &PartyId,
        amount: Decimal,
        currency: Currency,
        reference: &str,
    ) -> Result<PaymentRef>;
}

/// One open invoice inside an in-memory ledger
#[derive(Debug, Clone)]
struct OpenInvoice {
    invoice_id: String,
    currency: Currency,
    open_amount: Decimal,
}

/// Applications of a posted receipt, kept so the receipt can be reversed
#[derive(Debug, Clone)]
struct AppliedReceipt {
    customer: PartyId,
    /// (invoice_id, amount taken from that invoice)
    applications: Vec<(String, Decimal)>,
}

/// In-memory Accounts Receivable ledger
#[derive(Debug, Default)]
pub struct InMemoryArLedger {
    invoices: DashMap<PartyId, Vec<OpenInvoice>>,
    receipts: DashMap<String, AppliedReceipt>,
    sequence: AtomicU64,
}

impl InMemoryArLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an open invoice for a customer (seeding)
    pub fn add_invoice(
        &self,
        customer: &PartyId,
        invoice_id: impl Into<String>,
        amount: Decimal,
        currency: Currency,
    ) {
        self.invoices
            .entry(customer.clone())
            .or_default()
            .push(OpenInvoice {
                invoice_id: invoice_id.into(),
                currency,
                open_amount: amount,
            });
    }

    /// Total open balance for a customer in one currency
    pub fn open_total(&self, customer: &PartyId, currency: Currency) -> Decimal {
        self.invoices
            .get(customer)
            .map(|invoices| {
                invoices
                    .iter()
                    .filter(|inv| inv.currency == currency)
                    .map(|inv| inv.open_amount)
                    .sum()
            })
            .unwrap_or(Decimal::ZERO)
    }
}

#[async_trait]
impl ArSubledger for InMemoryArLedger {
    async fn find_open_invoices(
        &self,
        customer: &PartyId,
        currency: Currency,
    ) -> Result<Vec<OpenLedgerLine>> {
        Ok(project_open_lines(
            &self.invoices,
            customer,
            currency,
            LedgerRole::Receivable,
        ))
    }

    async fn post_receipt(
        &self,
        customer: &PartyId,
        amount: Decimal,
        currency: Currency,
        reference: &str,
    ) -> Result<ReceiptRef> {
        let applications = apply_against_open(&self.invoices, customer, amount, currency)
            .map_err(|e| Error::Other(format!("AR receipt rejected ({}): {}", reference, e)))?;

        let number = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let receipt = ReceiptRef::new(format!("AR-RCPT-{:06}", number));

        self.receipts.insert(
            receipt.as_str().to_string(),
            AppliedReceipt {
                customer: customer.clone(),
                applications,
            },
        );

        Ok(receipt)
    }

    async fn reverse_receipt(&self, customer: &PartyId, receipt: &ReceiptRef) -> Result<()> {
        let (_, applied) = self
            .receipts
            .remove(receipt.as_str())
            .ok_or_else(|| Error::Other(format!("unknown receipt: {}", receipt)))?;

        if &applied.customer != customer {
            return Err(Error::Other(format!(
                "receipt {} does not belong to customer {}",
                receipt, customer
            )));
        }

        let mut invoices = self.invoices.entry(customer.clone()).or_default();
        for (invoice_id, amount) in applied.applications {
            match invoices.iter_mut().find(|inv| inv.invoice_id == invoice_id) {
                Some(invoice) => invoice.open_amount += amount,
                // Invoice rows are never dropped, only drawn down to zero,
                // so this arm is unreachable in practice.
                None => {
                    return Err(Error::Other(format!(
                        "invoice {} vanished during reversal of {}",
                        invoice_id, receipt
                    )))
                }
            }
        }

        Ok(())
    }
}

/// In-memory Accounts Payable ledger
#[derive(Debug, Default)]
pub struct InMemoryApLedger {
    invoices: DashMap<PartyId, Vec<OpenInvoice>>,
    sequence: AtomicU64,
}

impl InMemoryApLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an open supplier invoice (seeding)
    pub fn add_invoice(
        &self,
        supplier: &PartyId,
        invoice_id: impl Into<String>,
        amount: Decimal,
        currency: Currency,
    ) {
        self.invoices
            .entry(supplier.clone())
            .or_default()
            .push(OpenInvoice {
                invoice_id: invoice_id.into(),
                currency,
                open_amount: amount,
            });
    }

    /// Total open balance owed to a supplier in one currency
    pub fn open_total(&self, supplier: &PartyId, currency: Currency) -> Decimal {
        self.invoices
            .get(supplier)
            .map(|invoices| {
                invoices
                    .iter()
                    .filter(|inv| inv.currency == currency)
                    .map(|inv| inv.open_amount)
                    .sum()
            })
            .unwrap_or(Decimal::ZERO)
    }
}

#[async_trait]
impl ApSubledger for InMemoryApLedger {
    async fn find_open_invoices(
        &self,
        supplier: &PartyId,
        currency: Currency,
    ) -> Result<Vec<OpenLedgerLine>> {
        Ok(project_open_lines(
            &self.invoices,
            supplier,
            currency,
            LedgerRole::Payable,
        ))
    }

    async fn post_payment(
        &self,
        supplier: &PartyId,
        amount: Decimal,
        currency: Currency,
        reference: &str,
    ) -> Result<PaymentRef> {
        apply_against_open(&self.invoices, supplier, amount, currency)
            .map_err(|e| Error::Other(format!("AP payment rejected ({}): {}", reference, e)))?;

        let number = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PaymentRef::new(format!("AP-PMT-{:06}", number)))
    }
}

/// Project a party's open invoices in one currency, oldest first
fn project_open_lines(
    invoices: &DashMap<PartyId, Vec<OpenInvoice>>,
    party: &PartyId,
    currency: Currency,
    role: LedgerRole,
) -> Vec<OpenLedgerLine> {
    invoices
        .get(party)
        .map(|entries| {
            entries
                .iter()
                .filter(|inv| inv.currency == currency && inv.open_amount > Decimal::ZERO)
                .map(|inv| OpenLedgerLine {
                    source_invoice_id: inv.invoice_id.clone(),
                    amount: inv.open_amount,
                    currency: inv.currency,
                    role,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Draw an amount down against a party's open invoices, oldest first
///
/// Returns the per-invoice applications, or an error if the open balance
/// in that currency cannot absorb the full amount. Partial application is
/// never left behind on failure.
fn apply_against_open(
    invoices: &DashMap<PartyId, Vec<OpenInvoice>>,
    party: &PartyId,
    amount: Decimal,
    currency: Currency,
) -> std::result::Result<Vec<(String, Decimal)>, String> {
    if amount <= Decimal::ZERO {
        return Err(format!("non-positive amount: {}", amount));
    }

    let mut entry = invoices
        .get_mut(party)
        .ok_or_else(|| format!("no open invoices for {}", party))?;

    let open_total: Decimal = entry
        .iter()
        .filter(|inv| inv.currency == currency)
        .map(|inv| inv.open_amount)
        .sum();

    if amount > open_total {
        return Err(format!(
            "amount {} exceeds open balance {} {}",
            amount, open_total, currency
        ));
    }

    let mut remaining = amount;
    let mut applications = Vec::new();

    for invoice in entry
        .iter_mut()
        .filter(|inv| inv.currency == currency && inv.open_amount > Decimal::ZERO)
    {
        if remaining == Decimal::ZERO {
            break;
        }

        let take = invoice.open_amount.min(remaining);
        invoice.open_amount -= take;
        remaining -= take;
        applications.push((invoice.invoice_id.clone(), take));
    }

    debug_assert_eq!(remaining, Decimal::ZERO);
    Ok(applications)
}
