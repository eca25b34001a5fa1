// Path: crates/services/src/balanced_dollar/mod.rs
//! The bridged stablecoin.
//!
//! The mint/burn counterpart of the asset vault. `cross_transfer` burns the
//! sender's tokens and sends a rollback-enabled `CrossTransfer` to the hub
//! token. The hub answers with `CrossTransfer` calls that mint here. If an
//! outbound transfer fails on the hub, the router hands the
//! `CrossTransferRevert` rollback back and the burned amount is minted again.

use crate::bank::BankService;
use crate::xcall::XCallService;
use crate::xcall_manager::XCallManagerService;
use crate::{require, SetAdminParams};
use parity_scale_codec::{Decode, Encode};
use xcall_api::services::access::ServiceDirectory;
use xcall_api::services::CallServiceReceiver;
use xcall_api::state::{StateAccess, StateAccessExt};
use xcall_api::transaction::context::TxContext;
use xcall_macros::service_interface;
use xcall_types::app::{AccountId, BalancedDollarConfig, Event, NetworkAddress};
use xcall_types::error::{BalancedDollarError, TransactionError};
use xcall_types::keys::{balance_key, BALANCED_DOLLAR_CONFIG_KEY, REGISTRY_PROTOCOL_SET_KEY};
use xcall_types::wire::{AnyMessage, Envelope, TransferMessage};

/// The stablecoin's service id, which is also its account.
pub const BALANCED_DOLLAR_SERVICE_ID: &str = "balanced_dollar";

// --- Service Method Parameter Structs (The Service's Public ABI) ---

/// Parameters for `cross_transfer@v1`. The signer is the sender and pays the
/// cross-chain fees.
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct CrossTransferParams {
    /// The recipient on the hub, as `"networkId/address"`.
    pub to: String,
    pub value: u128,
    pub data: Vec<u8>,
}

/// Resolves a transfer recipient to a local account. Hub senders address
/// recipients as `"networkId/address"`; a bare account is taken as is.
fn recipient(to: &str) -> AccountId {
    match to.parse::<NetworkAddress>() {
        Ok(address) => address.account_id(),
        Err(_) => AccountId::new(to),
    }
}

#[derive(Default, Debug)]
pub struct BalancedDollarService;

impl BalancedDollarService {
    pub fn account(&self) -> AccountId {
        AccountId::new(BALANCED_DOLLAR_SERVICE_ID)
    }

    fn load_config(&self, state: &dyn StateAccess) -> Result<BalancedDollarConfig, TransactionError> {
        state
            .get_decoded(BALANCED_DOLLAR_CONFIG_KEY)?
            .ok_or_else(|| BalancedDollarError::NotInitialized.into())
    }

    fn registry<'s>(
        services: &'s ServiceDirectory,
        config: &BalancedDollarConfig,
    ) -> Result<&'s XCallManagerService, TransactionError> {
        services
            .downcast_by_id::<XCallManagerService>(config.registry.as_str())
            .ok_or_else(|| {
                TransactionError::Unsupported(format!(
                    "protocol registry '{}' is not registered",
                    config.registry
                ))
            })
    }

    pub fn initialize(
        &self,
        state: &mut dyn StateAccess,
        admin: AccountId,
        xcall: NetworkAddress,
        hub_token: NetworkAddress,
        registry: AccountId,
        denom: String,
    ) -> Result<(), TransactionError> {
        if state.get(BALANCED_DOLLAR_CONFIG_KEY)?.is_some() {
            log::warn!("[BalancedDollar] already initialized; ignoring");
            return Ok(());
        }
        state.insert_encoded(
            BALANCED_DOLLAR_CONFIG_KEY,
            &BalancedDollarConfig {
                admin,
                xcall,
                hub_token,
                registry,
                denom,
            },
        )?;
        Ok(())
    }

    pub fn config(&self, state: &dyn StateAccess) -> Result<BalancedDollarConfig, TransactionError> {
        self.load_config(state)
    }

    fn mint_to(
        &self,
        state: &mut dyn StateAccess,
        services: &ServiceDirectory,
        config: &BalancedDollarConfig,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransactionError> {
        if amount == 0 {
            return Err(BalancedDollarError::ZeroAmount.into());
        }
        require::<BankService>(services, "bank")?.mint(state, &config.denom, to, amount)
    }
}

#[service_interface(
    id = "balanced_dollar",
    abi_version = 1,
    state_schema = "v1",
    capabilities = "CALL_RECEIVER"
)]
impl BalancedDollarService {
    #[method]
    pub fn set_admin(
        &self,
        state: &mut dyn StateAccess,
        params: SetAdminParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let mut config = self.load_config(state)?;
        if config.admin != ctx.signer_account_id {
            return Err(BalancedDollarError::OnlyAdmin.into());
        }
        config.admin = params.admin;
        state.insert_encoded(BALANCED_DOLLAR_CONFIG_KEY, &config)?;
        Ok(())
    }

    #[method]
    pub fn cross_transfer(
        &self,
        state: &mut dyn StateAccess,
        params: CrossTransferParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        if params.value == 0 {
            return Err(BalancedDollarError::ZeroAmount.into());
        }
        let config = self.load_config(state)?;
        let services = ctx.services;
        let bank = require::<BankService>(services, "bank")?;
        let xcall = require::<XCallService>(services, "xcall")?;
        let registry = Self::registry(services, &config)?;

        let sender = ctx.signer_account_id.clone();
        bank.burn(state, &config.denom, &sender, params.value)?;

        let (sources, destinations) = registry.get_protocols(state)?;
        let transfer = TransferMessage::CrossTransfer {
            from: NetworkAddress::new(ctx.network_id.as_str(), sender.as_str()).to_string(),
            to: params.to.clone(),
            value: params.value,
            data: params.data,
        };
        let revert = TransferMessage::CrossTransferRevert {
            account: sender.to_string(),
            amount: params.value,
        };
        let envelope = Envelope::new(
            AnyMessage::CallMessageWithRollback {
                data: transfer.to_bytes(),
                rollback: revert.to_bytes(),
            },
            sources,
            destinations,
        );
        let sn = xcall.send_call(state, ctx, &self.account(), envelope, &config.hub_token)?;
        tracing::info!(target: "xcall", value = %params.value, from = %sender, to = %params.to, sn = %sn, "cross transfer burned");
        ctx.emit(Event::CrossTransferSent {
            from: sender,
            to: params.to,
            value: params.value,
            sn,
        });
        Ok(())
    }
}

impl CallServiceReceiver for BalancedDollarService {
    fn handle_call_message(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        from: &NetworkAddress,
        data: &[u8],
        protocols: &[String],
    ) -> Result<(), TransactionError> {
        let config = self.load_config(state)?;
        let services = ctx.services;
        if !Self::registry(services, &config)?.verify_protocols(state, protocols)? {
            return Err(BalancedDollarError::ProtocolMismatch.into());
        }
        match TransferMessage::from_bytes(data)? {
            TransferMessage::CrossTransfer { from: sender, to, value, .. } => {
                if from != &config.hub_token {
                    return Err(BalancedDollarError::InvalidSender(from.to_string()).into());
                }
                let to = recipient(&to);
                self.mint_to(state, services, &config, &to, value)?;
                ctx.emit(Event::CrossTransferReceived {
                    from: sender,
                    to,
                    value,
                });
                Ok(())
            }
            TransferMessage::CrossTransferRevert { account, amount } => {
                if from != &config.xcall {
                    return Err(BalancedDollarError::InvalidSender(from.to_string()).into());
                }
                let account = AccountId::new(account);
                self.mint_to(state, services, &config, &account, amount)?;
                tracing::info!(target: "xcall", %amount, to = %account, "cross transfer reverted");
                ctx.emit(Event::CrossTransferReverted { account, amount });
                Ok(())
            }
        }
    }

    fn query_call_message_keys(
        &self,
        state: &dyn StateAccess,
        _from: &NetworkAddress,
        data: &[u8],
    ) -> Result<Vec<Vec<u8>>, TransactionError> {
        let config = self.load_config(state)?;
        let mut keys = vec![
            BALANCED_DOLLAR_CONFIG_KEY.to_vec(),
            REGISTRY_PROTOCOL_SET_KEY.to_vec(),
        ];
        let account = match TransferMessage::from_bytes(data)? {
            TransferMessage::CrossTransfer { to, .. } => recipient(&to),
            TransferMessage::CrossTransferRevert { account, .. } => AccountId::new(account),
        };
        keys.push(balance_key(&config.denom, account.as_str()));
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xcall_manager::XCALL_MANAGER_SERVICE_ID;
    use std::sync::Arc;
    use xcall_state::memory::MemoryState;

    const HUB_TOKEN: &str = "0x1.icon/cx-bnusd";

    fn setup() -> (MemoryState, ServiceDirectory) {
        let dir = ServiceDirectory::new(vec![
            Arc::new(BankService),
            Arc::new(XCallManagerService),
            Arc::new(BalancedDollarService),
        ]);
        let mut state = MemoryState::new();
        XCallManagerService
            .initialize(
                &mut state,
                AccountId::new("admin"),
                AccountId::new("xcall"),
                NetworkAddress::new("0x1.icon", "cx-governance"),
                vec!["centralized".into()],
                vec!["cx-centralized".into()],
            )
            .unwrap();
        BalancedDollarService
            .initialize(
                &mut state,
                AccountId::new("admin"),
                NetworkAddress::new("0x2.sol", "xcall"),
                HUB_TOKEN.parse().unwrap(),
                AccountId::new(XCALL_MANAGER_SERVICE_ID),
                "bnusd".into(),
            )
            .unwrap();
        (state, dir)
    }

    fn transfer(to: &str, value: u128) -> Vec<u8> {
        TransferMessage::CrossTransfer {
            from: "0x1.icon/hx-alice".into(),
            to: to.into(),
            value,
            data: Vec::new(),
        }
        .to_bytes()
    }

    fn bnusd(state: &MemoryState, account: &str) -> u128 {
        BankService
            .balance_of(state, "bnusd", &AccountId::new(account))
            .unwrap()
    }

    #[test]
    fn hub_transfers_mint_to_the_named_account() {
        let (mut state, dir) = setup();
        let mut ctx = TxContext::new(1, 0, "0x2.sol", AccountId::new("relayer"), &dir);
        let protocols = vec!["centralized".to_string()];
        let hub: NetworkAddress = HUB_TOKEN.parse().unwrap();

        BalancedDollarService
            .handle_call_message(&mut state, &mut ctx, &hub, &transfer("0x2.sol/bob", 70), &protocols)
            .unwrap();
        BalancedDollarService
            .handle_call_message(&mut state, &mut ctx, &hub, &transfer("carol", 5), &protocols)
            .unwrap();
        assert_eq!(bnusd(&state, "bob"), 70);
        assert_eq!(bnusd(&state, "carol"), 5);
        assert_eq!(
            ctx.events.first(),
            Some(&Event::CrossTransferReceived {
                from: "0x1.icon/hx-alice".into(),
                to: AccountId::new("bob"),
                value: 70,
            })
        );
    }

    #[test]
    fn transfers_from_anyone_but_the_hub_token_are_refused() {
        let (mut state, dir) = setup();
        let mut ctx = TxContext::new(1, 0, "0x2.sol", AccountId::new("relayer"), &dir);
        let imposter = NetworkAddress::new("0x1.icon", "hx-mallory");
        let err = BalancedDollarService
            .handle_call_message(
                &mut state,
                &mut ctx,
                &imposter,
                &transfer("mallory", 1),
                &["centralized".to_string()],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionError::BalancedDollar(BalancedDollarError::InvalidSender(_))
        ));
        assert_eq!(bnusd(&state, "mallory"), 0);
    }

    #[test]
    fn untrusted_protocols_are_refused() {
        let (mut state, dir) = setup();
        let mut ctx = TxContext::new(1, 0, "0x2.sol", AccountId::new("relayer"), &dir);
        let err = BalancedDollarService
            .handle_call_message(
                &mut state,
                &mut ctx,
                &HUB_TOKEN.parse().unwrap(),
                &transfer("bob", 1),
                &["wormhole".to_string()],
            )
            .unwrap_err();
        assert_eq!(
            err,
            TransactionError::BalancedDollar(BalancedDollarError::ProtocolMismatch)
        );
    }

    #[test]
    fn reverts_only_come_from_the_local_router() {
        let (mut state, dir) = setup();
        let mut ctx = TxContext::new(1, 0, "0x2.sol", AccountId::new("relayer"), &dir);
        let revert = TransferMessage::CrossTransferRevert {
            account: "alice".into(),
            amount: 30,
        }
        .to_bytes();
        let protocols = vec!["centralized".to_string()];

        let hub: NetworkAddress = HUB_TOKEN.parse().unwrap();
        assert!(BalancedDollarService
            .handle_call_message(&mut state, &mut ctx, &hub, &revert, &protocols)
            .is_err());

        let router = NetworkAddress::new("0x2.sol", "xcall");
        BalancedDollarService
            .handle_call_message(&mut state, &mut ctx, &router, &revert, &protocols)
            .unwrap();
        assert_eq!(bnusd(&state, "alice"), 30);
    }

    #[test]
    fn message_keys_name_the_credited_balance() {
        let (state, _) = setup();
        let keys = BalancedDollarService
            .query_call_message_keys(&state, &HUB_TOKEN.parse().unwrap(), &transfer("0x2.sol/bob", 1))
            .unwrap();
        assert!(keys.contains(&balance_key("bnusd", "bob")));
    }
}
