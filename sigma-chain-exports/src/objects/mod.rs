// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

//! Every table of the chain state. Table ids are part of the state
//! fingerprint and must not be reused.

mod account;
mod bobserver;
mod fund;
mod global;
mod history;
mod recovery;
mod savings;

pub use account::*;
pub use bobserver::*;
pub use fund::*;
pub use global::*;
pub use history::*;
pub use recovery::*;
pub use savings::*;

use sigma_chainbase::{Database, StoreError};

/// Registers every chain table in `db`
pub fn register_tables(db: &mut Database) -> Result<(), StoreError> {
    db.add_table::<DynamicGlobalPropertyObject>()?;
    db.add_table::<AccountObject>()?;
    db.add_table::<OwnerAuthorityHistoryObject>()?;
    db.add_table::<AccountRecoveryRequestObject>()?;
    db.add_table::<ChangeRecoveryAccountRequestObject>()?;
    db.add_table::<DeclineVotingRightsRequestObject>()?;
    db.add_table::<BobserverObject>()?;
    db.add_table::<SavingsWithdrawObject>()?;
    db.add_table::<FundObject>()?;
    db.add_table::<FundWithdrawObject>()?;
    db.add_table::<TransactionObject>()?;
    db.add_table::<BlockSummaryObject>()?;
    db.add_table::<OperationObject>()?;
    Ok(())
}
