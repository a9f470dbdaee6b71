use std::collections::HashMap;

use actioncodes_core::error::ProtocolError;

use crate::tx::{MessageAddressTableLookup, Pubkey};

/// An address lookup table's on-chain contents, as far as this crate cares:
/// the table address and its ordered entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressLookupTableAccount {
    pub key: Pubkey,
    pub addresses: Vec<Pubkey>,
}

/// The addresses a single table lookup loads, split by writability.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadedAddresses {
    pub writable: Vec<Pubkey>,
    pub readonly: Vec<Pubkey>,
}

/// Injected capability that resolves lookup-table references to concrete
/// addresses. Fetching table contents is the host's problem (usually RPC);
/// the adapter only consumes the result.
pub trait AddressLookupResolver: Send + Sync {
    fn resolve(
        &self,
        lookup: &MessageAddressTableLookup,
    ) -> Result<LoadedAddresses, ProtocolError>;
}

/// Resolver over a fixed set of tables the host fetched ahead of time.
pub struct StaticLookupResolver {
    tables: HashMap<Pubkey, Vec<Pubkey>>,
}

impl StaticLookupResolver {
    pub fn new(tables: impl IntoIterator<Item = AddressLookupTableAccount>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|table| (table.key, table.addresses))
                .collect(),
        }
    }
}

impl AddressLookupResolver for StaticLookupResolver {
    fn resolve(
        &self,
        lookup: &MessageAddressTableLookup,
    ) -> Result<LoadedAddresses, ProtocolError> {
        let addresses = self.tables.get(&lookup.account_key).ok_or_else(|| {
            ProtocolError::InvalidTransactionFormat(format!(
                "unknown address lookup table {}",
                lookup.account_key
            ))
        })?;

        let load = |indexes: &[u8]| -> Result<Vec<Pubkey>, ProtocolError> {
            indexes
                .iter()
                .map(|&index| {
                    addresses.get(usize::from(index)).copied().ok_or_else(|| {
                        ProtocolError::InvalidTransactionFormat(format!(
                            "lookup index {index} out of range for table {}",
                            lookup.account_key
                        ))
                    })
                })
                .collect()
        };

        Ok(LoadedAddresses {
            writable: load(&lookup.writable_indexes)?,
            readonly: load(&lookup.readonly_indexes)?,
        })
    }
}
