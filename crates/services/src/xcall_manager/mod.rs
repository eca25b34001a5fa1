// Path: crates/services/src/xcall_manager/mod.rs
//! The protocol registry.
//!
//! Holds the set of connections an application trusts and lets a remote
//! governance address replace it through the router. Applications call
//! [`XCallManagerService::verify_protocols`] on the `protocols` of every
//! inbound message before acting on it.

use crate::SetAdminParams;
use parity_scale_codec::{Decode, Encode};
use std::collections::BTreeSet;
use xcall_api::services::CallServiceReceiver;
use xcall_api::state::{StateAccess, StateAccessExt};
use xcall_api::transaction::context::TxContext;
use xcall_macros::service_interface;
use xcall_types::app::{AccountId, Event, NetworkAddress, ProtocolSet, RemovalState};
use xcall_types::error::{RegistryError, TransactionError};
use xcall_types::keys::{whitelist_key, REGISTRY_PROTOCOL_SET_KEY, REGISTRY_WHITELIST_PREFIX};
use xcall_types::wire::GovernanceCommand;

/// The registry's service id.
pub const XCALL_MANAGER_SERVICE_ID: &str = "xcall_manager";

// --- Service Method Parameter Structs (The Service's Public ABI) ---

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct SetProtocolsParams {
    pub sources: Vec<String>,
    pub destinations: Vec<String>,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ProposeRemovalParams {
    pub protocol: String,
}

/// An encoded governance command, for `whitelist_action@v1` and `remove_action@v1`.
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ActionParams {
    pub action: Vec<u8>,
}

/// True iff `candidate` names exactly the protocols in `expected`, each once.
fn matches_exactly<'a>(candidate: &[String], expected: impl Iterator<Item = &'a String>) -> bool {
    let unique: BTreeSet<&str> = candidate.iter().map(String::as_str).collect();
    if unique.len() != candidate.len() {
        return false;
    }
    let expected: Vec<&str> = expected.map(String::as_str).collect();
    expected.len() == candidate.len() && expected.iter().all(|p| unique.contains(p))
}

/// Checks `candidate` against the trusted set.
///
/// While a removal is proposed, the set without the proposed protocol is also
/// accepted, so messages relayed after the protocol went dark still verify.
pub fn verify(set: &ProtocolSet, candidate: &[String]) -> bool {
    if matches_exactly(candidate, set.sources.iter()) {
        return true;
    }
    match &set.removal {
        RemovalState::Proposed(removed) => {
            matches_exactly(candidate, set.sources.iter().filter(|p| *p != removed))
        }
        RemovalState::None => false,
    }
}

#[derive(Default, Debug)]
pub struct XCallManagerService;

impl XCallManagerService {
    fn load(&self, state: &dyn StateAccess) -> Result<ProtocolSet, TransactionError> {
        state
            .get_decoded(REGISTRY_PROTOCOL_SET_KEY)?
            .ok_or_else(|| RegistryError::NotInitialized.into())
    }

    fn store(&self, state: &mut dyn StateAccess, set: &ProtocolSet) -> Result<(), TransactionError> {
        state.insert_encoded(REGISTRY_PROTOCOL_SET_KEY, set)?;
        Ok(())
    }

    fn ensure_admin(
        &self,
        state: &dyn StateAccess,
        ctx: &TxContext<'_>,
    ) -> Result<ProtocolSet, TransactionError> {
        let set = self.load(state)?;
        if set.admin != ctx.signer_account_id {
            return Err(RegistryError::OnlyAdmin.into());
        }
        Ok(set)
    }

    pub fn initialize(
        &self,
        state: &mut dyn StateAccess,
        admin: AccountId,
        xcall: AccountId,
        governance: NetworkAddress,
        sources: Vec<String>,
        destinations: Vec<String>,
    ) -> Result<(), TransactionError> {
        if state.get(REGISTRY_PROTOCOL_SET_KEY)?.is_some() {
            log::warn!("[XCallManager] already initialized; ignoring");
            return Ok(());
        }
        if sources.len() != destinations.len() {
            return Err(RegistryError::LengthMismatch {
                sources: sources.len(),
                destinations: destinations.len(),
            }
            .into());
        }
        self.store(
            state,
            &ProtocolSet {
                admin,
                xcall,
                governance,
                sources,
                destinations,
                removal: RemovalState::None,
            },
        )
    }

    /// The trusted `(sources, destinations)`.
    pub fn get_protocols(
        &self,
        state: &dyn StateAccess,
    ) -> Result<(Vec<String>, Vec<String>), TransactionError> {
        let set = self.load(state)?;
        Ok((set.sources, set.destinations))
    }

    pub fn protocol_set(&self, state: &dyn StateAccess) -> Result<ProtocolSet, TransactionError> {
        self.load(state)
    }

    pub fn verify_protocols(
        &self,
        state: &dyn StateAccess,
        candidate: &[String],
    ) -> Result<bool, TransactionError> {
        Ok(verify(&self.load(state)?, candidate))
    }

    pub fn is_whitelisted(&self, state: &dyn StateAccess, action: &[u8]) -> Result<bool, TransactionError> {
        Ok(state.get(&whitelist_key(action))?.is_some())
    }

    /// Every whitelisted action, ordered by hash.
    pub fn whitelisted_actions(&self, state: &dyn StateAccess) -> Result<Vec<Vec<u8>>, TransactionError> {
        state
            .prefix_scan(REGISTRY_WHITELIST_PREFIX)?
            .map(|entry| {
                entry
                    .map(|(_, action)| action.to_vec())
                    .map_err(TransactionError::from)
            })
            .collect()
    }

    fn apply_protocols(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        mut set: ProtocolSet,
        sources: Vec<String>,
        destinations: Vec<String>,
    ) -> Result<(), TransactionError> {
        if sources.len() != destinations.len() {
            return Err(RegistryError::LengthMismatch {
                sources: sources.len(),
                destinations: destinations.len(),
            }
            .into());
        }
        set.sources = sources.clone();
        set.destinations = destinations.clone();
        set.removal = RemovalState::None;
        self.store(state, &set)?;
        tracing::info!(target: "xcall", ?sources, ?destinations, "trusted protocols replaced");
        ctx.emit(Event::ProtocolsConfigured {
            sources,
            destinations,
        });
        Ok(())
    }
}

#[service_interface(
    id = "xcall_manager",
    abi_version = 1,
    state_schema = "v1",
    capabilities = "CALL_RECEIVER"
)]
impl XCallManagerService {
    #[method]
    pub fn set_admin(
        &self,
        state: &mut dyn StateAccess,
        params: SetAdminParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let mut set = self.ensure_admin(state, ctx)?;
        set.admin = params.admin;
        self.store(state, &set)
    }

    #[method]
    pub fn set_protocols(
        &self,
        state: &mut dyn StateAccess,
        params: SetProtocolsParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let set = self.ensure_admin(state, ctx)?;
        self.apply_protocols(state, ctx, set, params.sources, params.destinations)
    }

    /// First step of removing a protocol. `sources` is left untouched.
    #[method]
    pub fn propose_removal(
        &self,
        state: &mut dyn StateAccess,
        params: ProposeRemovalParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let mut set = self.ensure_admin(state, ctx)?;
        set.removal = RemovalState::Proposed(params.protocol.clone());
        self.store(state, &set)?;
        ctx.emit(Event::RemovalProposed {
            protocol: params.protocol,
        });
        Ok(())
    }

    #[method]
    pub fn whitelist_action(
        &self,
        state: &mut dyn StateAccess,
        params: ActionParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.ensure_admin(state, ctx)?;
        state.insert(&whitelist_key(&params.action), &params.action)?;
        Ok(())
    }

    #[method]
    pub fn remove_action(
        &self,
        state: &mut dyn StateAccess,
        params: ActionParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.ensure_admin(state, ctx)?;
        state.delete(&whitelist_key(&params.action))?;
        Ok(())
    }
}

impl CallServiceReceiver for XCallManagerService {
    /// Applies a governance command.
    ///
    /// The message must be delivered by the configured router, come from the
    /// governance address, carry a payload the admin whitelisted and arrive
    /// over the trusted protocols. The whitelist entry is spent on success.
    fn handle_call_message(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        from: &NetworkAddress,
        data: &[u8],
        protocols: &[String],
    ) -> Result<(), TransactionError> {
        let set = self.load(state)?;
        if ctx.entry_service.as_deref() != Some(set.xcall.as_str()) {
            return Err(RegistryError::OnlyXcall(set.xcall.to_string()).into());
        }
        if from != &set.governance {
            return Err(RegistryError::InvalidSender(from.to_string()).into());
        }
        let key = whitelist_key(data);
        if state.get(&key)?.is_none() {
            return Err(RegistryError::ActionNotWhitelisted.into());
        }
        if !verify(&set, protocols) {
            return Err(RegistryError::ProtocolMismatch.into());
        }
        state.delete(&key)?;
        match GovernanceCommand::from_bytes(data)? {
            GovernanceCommand::ConfigureProtocols {
                sources,
                destinations,
            } => self.apply_protocols(state, ctx, set, sources, destinations),
        }
    }

    fn query_call_message_keys(
        &self,
        _state: &dyn StateAccess,
        _from: &NetworkAddress,
        data: &[u8],
    ) -> Result<Vec<Vec<u8>>, TransactionError> {
        Ok(vec![REGISTRY_PROTOCOL_SET_KEY.to_vec(), whitelist_key(data)])
    }
}
