// Path: crates/services/src/asset_manager/mod.rs
//! The rate-limited asset vault.
//!
//! Deposits lock tokens in the vault's account and send a rollback-enabled
//! `Deposit` call to the paired remote vault. The remote side answers with
//! `WithdrawTo`/`WithdrawNativeTo` calls that release tokens here, subject to
//! a per-token rate limit. If a deposit fails remotely, the router hands the
//! `DepositRevert` rollback back to the vault, which refunds the depositor.

pub mod rate_limit;

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
use xcall_types::app::{AccountId, Event, NetworkAddress, TokenState, VaultConfig};
use xcall_types::error::{CodecError, TransactionError, VaultError};
use xcall_types::keys::{
    balance_key, token_state_key, REGISTRY_PROTOCOL_SET_KEY, VAULT_CONFIG_KEY,
};
use xcall_types::wire::{AnyMessage, Envelope, VaultMessage};
use xcall_types::NATIVE_DENOM;

/// The vault's service id, which is also the account holding locked tokens.
pub const ASSET_MANAGER_SERVICE_ID: &str = "asset_manager";

// --- Service Method Parameter Structs (The Service's Public ABI) ---

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ConfigureRateLimitParams {
    pub token: String,
    /// Seconds for the limit to recover fully.
    pub period: u64,
    /// Basis points of the vault balance withdrawable per period.
    pub percentage: u128,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ResetLimitParams {
    pub token: String,
}

/// Parameters for `deposit@v1`. The signer is the depositor and pays the
/// cross-chain fees.
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct DepositParams {
    pub token: String,
    pub amount: u128,
    /// The recipient on the remote network.
    pub to: String,
    pub data: Vec<u8>,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct DepositNativeParams {
    pub amount: u128,
    pub to: String,
    pub data: Vec<u8>,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ForceRollbackParams {
    pub request_id: u128,
    pub from_nid: String,
    pub conn_sn: u128,
    pub connection: String,
}

#[derive(Default, Debug)]
pub struct AssetManagerService;

impl AssetManagerService {
    /// The account holding every locked token.
    pub fn account(&self) -> AccountId {
        AccountId::new(ASSET_MANAGER_SERVICE_ID)
    }

    fn load_config(&self, state: &dyn StateAccess) -> Result<VaultConfig, TransactionError> {
        state
            .get_decoded(VAULT_CONFIG_KEY)?
            .ok_or_else(|| VaultError::NotInitialized.into())
    }

    fn ensure_admin(
        &self,
        state: &dyn StateAccess,
        ctx: &TxContext<'_>,
    ) -> Result<VaultConfig, TransactionError> {
        let config = self.load_config(state)?;
        if config.admin != ctx.signer_account_id {
            return Err(VaultError::OnlyAdmin.into());
        }
        Ok(config)
    }

    fn registry<'s>(
        services: &'s ServiceDirectory,
        config: &VaultConfig,
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
        remote_vault: NetworkAddress,
        registry: AccountId,
    ) -> Result<(), TransactionError> {
        if state.get(VAULT_CONFIG_KEY)?.is_some() {
            log::warn!("[AssetManager] already initialized; ignoring");
            return Ok(());
        }
        state.insert_encoded(
            VAULT_CONFIG_KEY,
            &VaultConfig {
                admin,
                xcall,
                remote_vault,
                registry,
            },
        )?;
        Ok(())
    }

    pub fn config(&self, state: &dyn StateAccess) -> Result<VaultConfig, TransactionError> {
        self.load_config(state)
    }

    pub fn token_state(
        &self,
        state: &dyn StateAccess,
        token: &str,
    ) -> Result<Option<TokenState>, TransactionError> {
        Ok(state.get_decoded(&token_state_key(token))?)
    }

    /// What may be withdrawn of `token` at `now`. Tokens without a rate limit
    /// can be withdrawn up to the whole vault balance.
    pub fn get_withdraw_limit(
        &self,
        state: &dyn StateAccess,
        services: &ServiceDirectory,
        token: &str,
        now: u64,
    ) -> Result<u128, TransactionError> {
        let bank = require::<BankService>(services, "bank")?;
        let balance = bank.balance_of(state, token, &self.account())?;
        Ok(match self.token_state(state, token)? {
            Some(limit) => rate_limit::current_limit(&limit, balance, now),
            None => balance,
        })
    }

    /// Configures a rate limit at genesis, before any transaction runs.
    pub fn write_rate_limit(
        &self,
        state: &mut dyn StateAccess,
        bank: &BankService,
        token: &str,
        period: u64,
        percentage: u128,
        now: u64,
    ) -> Result<TokenState, TransactionError> {
        let balance = bank.balance_of(state, token, &self.account())?;
        let limit = rate_limit::configure(period, percentage, balance, now)?;
        state.insert_encoded(&token_state_key(token), &limit)?;
        Ok(limit)
    }

    fn lock_and_send(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        token: String,
        amount: u128,
        to: String,
        data: Vec<u8>,
    ) -> Result<(), TransactionError> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount.into());
        }
        let config = self.load_config(state)?;
        let services = ctx.services;
        let bank = require::<BankService>(services, "bank")?;
        let xcall = require::<XCallService>(services, "xcall")?;
        let registry = Self::registry(services, &config)?;

        let depositor = ctx.signer_account_id.clone();
        bank.transfer_from(state, &token, &depositor, &self.account(), amount)?;

        let (sources, destinations) = registry.get_protocols(state)?;
        let deposit = VaultMessage::Deposit {
            token: token.clone(),
            from: NetworkAddress::new(ctx.network_id.as_str(), depositor.as_str()).to_string(),
            to: to.clone(),
            amount,
            data,
        };
        let revert = VaultMessage::DepositRevert {
            token: token.clone(),
            account: depositor.to_string(),
            amount,
        };
        let envelope = Envelope::new(
            AnyMessage::CallMessageWithRollback {
                data: deposit.to_bytes(),
                rollback: revert.to_bytes(),
            },
            sources,
            destinations,
        );
        let sn = xcall.send_call(state, ctx, &self.account(), envelope, &config.remote_vault)?;
        tracing::info!(target: "xcall", %token, %amount, from = %depositor, %to, sn = %sn, "deposit locked");
        ctx.emit(Event::Deposited {
            token,
            from: depositor,
            to,
            amount,
            sn,
        });
        Ok(())
    }

    fn release(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        token: &str,
        to: &str,
        amount: u128,
    ) -> Result<(), TransactionError> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount.into());
        }
        let services = ctx.services;
        let bank = require::<BankService>(services, "bank")?;
        let vault = self.account();
        if let Some(mut limit) = self.token_state(state, token)? {
            let balance = bank.balance_of(state, token, &vault)?;
            rate_limit::withdraw(&mut limit, balance, amount, ctx.block_timestamp)?;
            state.insert_encoded(&token_state_key(token), &limit)?;
        }
        let to = AccountId::new(to);
        bank.transfer_from(state, token, &vault, &to, amount)?;
        ctx.emit(Event::Withdrawn {
            token: token.to_string(),
            to,
            amount,
        });
        Ok(())
    }
}

#[service_interface(
    id = "asset_manager",
    abi_version = 1,
    state_schema = "v1",
    capabilities = "CALL_RECEIVER"
)]
impl AssetManagerService {
    #[method]
    pub fn set_admin(
        &self,
        state: &mut dyn StateAccess,
        params: SetAdminParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let mut config = self.ensure_admin(state, ctx)?;
        config.admin = params.admin;
        state.insert_encoded(VAULT_CONFIG_KEY, &config)?;
        Ok(())
    }

    #[method]
    pub fn configure_rate_limit(
        &self,
        state: &mut dyn StateAccess,
        params: ConfigureRateLimitParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.ensure_admin(state, ctx)?;
        let services = ctx.services;
        let bank = require::<BankService>(services, "bank")?;
        self.write_rate_limit(
            state,
            bank,
            &params.token,
            params.period,
            params.percentage,
            ctx.block_timestamp,
        )?;
        ctx.emit(Event::RateLimitConfigured {
            token: params.token,
            period: params.period,
            percentage: params.percentage,
        });
        Ok(())
    }

    /// Restores `token`'s limit to the full ceiling immediately.
    #[method]
    pub fn reset_limit(
        &self,
        state: &mut dyn StateAccess,
        params: ResetLimitParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.ensure_admin(state, ctx)?;
        let services = ctx.services;
        let bank = require::<BankService>(services, "bank")?;
        let Some(limit) = self.token_state(state, &params.token)? else {
            return Ok(());
        };
        self.write_rate_limit(
            state,
            bank,
            &params.token,
            limit.period,
            limit.percentage,
            ctx.block_timestamp,
        )?;
        Ok(())
    }

    #[method]
    pub fn deposit(
        &self,
        state: &mut dyn StateAccess,
        params: DepositParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.lock_and_send(state, ctx, params.token, params.amount, params.to, params.data)
    }

    #[method]
    pub fn deposit_native(
        &self,
        state: &mut dyn StateAccess,
        params: DepositNativeParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.lock_and_send(
            state,
            ctx,
            NATIVE_DENOM.to_string(),
            params.amount,
            params.to,
            params.data,
        )
    }

    /// Abandons a stuck inbound withdrawal and tells the remote vault it failed.
    #[method]
    pub fn force_rollback(
        &self,
        state: &mut dyn StateAccess,
        params: ForceRollbackParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.ensure_admin(state, ctx)?;
        let services = ctx.services;
        let xcall = require::<XCallService>(services, "xcall")?;
        xcall.handle_forced_rollback(
            state,
            ctx,
            &self.account(),
            params.request_id,
            &params.from_nid,
            params.conn_sn,
            &params.connection,
        )
    }
}

impl CallServiceReceiver for AssetManagerService {
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
            return Err(VaultError::ProtocolMismatch.into());
        }
        match VaultMessage::from_bytes(data)? {
            VaultMessage::WithdrawTo { token, to, amount } => {
                if from != &config.remote_vault {
                    return Err(VaultError::InvalidSender(from.to_string()).into());
                }
                self.release(state, ctx, &token, &to, amount)
            }
            VaultMessage::WithdrawNativeTo { token, to, amount } => {
                if from != &config.remote_vault {
                    return Err(VaultError::InvalidSender(from.to_string()).into());
                }
                if token != NATIVE_DENOM {
                    return Err(VaultError::NotNativeToken(token).into());
                }
                self.release(state, ctx, &token, &to, amount)
            }
            VaultMessage::DepositRevert {
                token,
                account,
                amount,
            } => {
                if from != &config.xcall {
                    return Err(VaultError::InvalidSender(from.to_string()).into());
                }
                let bank = require::<BankService>(services, "bank")?;
                let account = AccountId::new(account);
                bank.transfer_from(state, &token, &self.account(), &account, amount)?;
                tracing::info!(target: "xcall", %token, %amount, to = %account, "deposit refunded");
                ctx.emit(Event::DepositReverted {
                    token,
                    account,
                    amount,
                });
                Ok(())
            }
            VaultMessage::Deposit { .. } => {
                Err(CodecError::UnknownMethod("Deposit".to_string()).into())
            }
        }
    }

    fn query_call_message_keys(
        &self,
        _state: &dyn StateAccess,
        _from: &NetworkAddress,
        data: &[u8],
    ) -> Result<Vec<Vec<u8>>, TransactionError> {
        let vault = ASSET_MANAGER_SERVICE_ID;
        let mut keys = vec![VAULT_CONFIG_KEY.to_vec(), REGISTRY_PROTOCOL_SET_KEY.to_vec()];
        match VaultMessage::from_bytes(data)? {
            VaultMessage::WithdrawTo { token, to, .. }
            | VaultMessage::WithdrawNativeTo { token, to, .. } => {
                keys.push(token_state_key(&token));
                keys.push(balance_key(&token, vault));
                keys.push(balance_key(&token, &to));
            }
            VaultMessage::DepositRevert { token, account, .. } => {
                keys.push(balance_key(&token, vault));
                keys.push(balance_key(&token, &account));
            }
            VaultMessage::Deposit { .. } => {}
        }
        Ok(keys)
    }
}
