// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use sigma_chain_exports::objects::DynamicGlobalPropertyObject;
use sigma_chain_exports::ChainError;
use sigma_chainbase::Database;

/// The single live global state record.
///
/// Zero or several records mean the store is corrupted, which is a
/// `ConsistencyFault`.
pub(crate) fn get_global_state(db: &Database) -> Result<&DynamicGlobalPropertyObject, ChainError> {
    let mut records = db.iter::<DynamicGlobalPropertyObject>()?;
    match (records.next(), records.next()) {
        (Some(global), None) => Ok(global),
        _ => Err(ChainError::ConsistencyFault(format!(
            "expected exactly one global state record, found {}",
            db.count::<DynamicGlobalPropertyObject>()?
        ))),
    }
}

/// Applies `mutator` to the global state record in the current session
pub(crate) fn update_global_state<F>(db: &mut Database, mutator: F) -> Result<(), ChainError>
where
    F: FnOnce(&mut DynamicGlobalPropertyObject),
{
    let id = get_global_state(db)?.id;
    db.modify(id, mutator)?;
    Ok(())
}
