//! Intercompany Netting & Settlement Engine
//!
//! Given a bilateral agreement between a customer-role entity and a
//! supplier-role entity, the engine aggregates open AR and AP balances,
//! proposes a net offset amount, and — on confirmation — atomically
//! posts the offsetting entries into both subledgers while recording an
//! immutable settlement record.
//!
//! # Invariants
//!
//! - Exact arithmetic: all amounts are `Decimal`, never floats
//! - Single currency: only lines in the agreement's netting currency
//!   participate; other currencies are excluded, never converted
//! - Both-or-neither: an AR receipt and AP payment always post together
//!   or not at all
//! - Serialized per agreement: two settlement attempts against one
//!   agreement never both succeed against the same open balances
//! - Append-only audit: settlement records transition `Proposed` →
//!   `Settled`/`Failed` exactly once and are immutable afterwards
//!
//! # Example
//!
//! ```no_run
//! use netting_core::{
//!     InMemoryAgreementRepository, InMemoryApLedger, InMemoryArLedger,
//!     InMemorySettlementStore, NettingService, NewAgreement,
//!     types::{Currency, PartyId, SettlementRequest},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> netting_core::Result<()> {
//!     let service = NettingService::new(
//!         Arc::new(InMemoryAgreementRepository::new()),
//!         Arc::new(InMemoryArLedger::new()),
//!         Arc::new(InMemoryApLedger::new()),
//!         Arc::new(InMemorySettlementStore::new()),
//!     );
//!
//!     let agreement = service
//!         .create_agreement(NewAgreement {
//!             customer_party: PartyId::new("ACME-US"),
//!             supplier_party: PartyId::new("ACME-DE"),
//!             netting_currency: Currency::USD,
//!         })
//!         .await?;
//!
//!     let proposal = service.propose(agreement.id).await?;
//!     let settlement = service
//!         .settle(SettlementRequest {
//!             agreement_id: agreement.id,
//!             netted_amount: proposal.netted_amount,
//!         })
//!         .await?;
//!     println!("settled {} {}", settlement.netted_amount, settlement.currency);
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod agreements;
pub mod config;
pub mod error;
pub mod executor;
pub mod proposal;
pub mod service;
pub mod store;
pub mod subledger;
pub mod types;

// Re-exports
pub use agreements::{AgreementRepository, InMemoryAgreementRepository};
pub use config::Config;
pub use error::{Error, Result};
pub use executor::SettlementExecutor;
pub use proposal::ProposalCalculator;
pub use service::{NettingService, NewAgreement};
pub use store::{InMemorySettlementStore, SettlementStore};
pub use subledger::{ApSubledger, ArSubledger, InMemoryApLedger, InMemoryArLedger};
pub use types::{
    AgreementStatus, Currency, LedgerRole, NettingAgreement, NettingProposal, NettingSettlement,
    OpenLedgerLine, PartyId, PaymentRef, ReceiptRef, ResidualDirection, SettlementRequest,
    SettlementStatus,
};
