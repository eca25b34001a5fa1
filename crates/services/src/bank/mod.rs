// Path: crates/services/src/bank/mod.rs
//! The token ledger.
//!
//! Balances are keyed by `(denom, account)` and stored as SCALE `u128`. Every
//! account, including service accounts, lives in the same namespace.

use parity_scale_codec::{Decode, Encode};
use xcall_api::state::{StateAccess, StateAccessExt};
use xcall_api::transaction::context::TxContext;
use xcall_macros::service_interface;
use xcall_types::app::AccountId;
use xcall_types::error::{BankError, TransactionError};
use xcall_types::keys::balance_key;

/// Parameters for `transfer@v1`. The signer is the source.
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct TransferParams {
    pub to: AccountId,
    pub denom: String,
    pub amount: u128,
}

#[derive(Default, Debug)]
pub struct BankService;

impl BankService {
    pub fn balance_of(
        &self,
        state: &dyn StateAccess,
        denom: &str,
        account: &AccountId,
    ) -> Result<u128, TransactionError> {
        Ok(state
            .get_decoded::<u128>(&balance_key(denom, account.as_str()))?
            .unwrap_or(0))
    }

    fn set_balance(
        state: &mut dyn StateAccess,
        denom: &str,
        account: &AccountId,
        amount: u128,
    ) -> Result<(), TransactionError> {
        let key = balance_key(denom, account.as_str());
        if amount == 0 {
            state.delete(&key)?;
        } else {
            state.insert_encoded(&key, &amount)?;
        }
        Ok(())
    }

    /// Moves `amount` of `denom` from `from` to `to`. A zero amount is a no-op.
    pub fn transfer_from(
        &self,
        state: &mut dyn StateAccess,
        denom: &str,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransactionError> {
        if amount == 0 {
            return Ok(());
        }
        let from_balance = self.balance_of(state, denom, from)?;
        let remaining =
            from_balance
                .checked_sub(amount)
                .ok_or_else(|| BankError::InsufficientFunds {
                    account: from.to_string(),
                    denom: denom.to_string(),
                    balance: from_balance,
                    needed: amount,
                })?;
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(state, denom, to)?
            .checked_add(amount)
            .ok_or(BankError::BalanceOverflow)?;
        Self::set_balance(state, denom, from, remaining)?;
        Self::set_balance(state, denom, to, to_balance)?;
        log::debug!("[Bank] {} {} moved {} -> {}", amount, denom, from, to);
        Ok(())
    }

    /// Credits `amount` out of thin air. Genesis and token issuers call this.
    pub fn mint(
        &self,
        state: &mut dyn StateAccess,
        denom: &str,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransactionError> {
        let balance = self
            .balance_of(state, denom, to)?
            .checked_add(amount)
            .ok_or(BankError::BalanceOverflow)?;
        Self::set_balance(state, denom, to, balance)
    }

    /// Destroys `amount` of `from`'s balance.
    pub fn burn(
        &self,
        state: &mut dyn StateAccess,
        denom: &str,
        from: &AccountId,
        amount: u128,
    ) -> Result<(), TransactionError> {
        let balance = self.balance_of(state, denom, from)?;
        let remaining = balance
            .checked_sub(amount)
            .ok_or_else(|| BankError::InsufficientFunds {
                account: from.to_string(),
                denom: denom.to_string(),
                balance,
                needed: amount,
            })?;
        Self::set_balance(state, denom, from, remaining)
    }
}

#[service_interface(id = "bank", abi_version = 1, state_schema = "v1")]
impl BankService {
    #[method]
    pub fn transfer(
        &self,
        state: &mut dyn StateAccess,
        params: TransferParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let from = ctx.signer_account_id.clone();
        self.transfer_from(state, &params.denom, &from, &params.to, params.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcall_state::memory::MemoryState;
    use xcall_types::NATIVE_DENOM;

    #[test]
    fn transfer_moves_funds_and_rejects_overdraft() {
        let bank = BankService;
        let mut state = MemoryState::new();
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");
        bank.mint(&mut state, NATIVE_DENOM, &alice, 100).unwrap();

        bank.transfer_from(&mut state, NATIVE_DENOM, &alice, &bob, 60)
            .unwrap();
        assert_eq!(bank.balance_of(&state, NATIVE_DENOM, &alice).unwrap(), 40);
        assert_eq!(bank.balance_of(&state, NATIVE_DENOM, &bob).unwrap(), 60);

        let err = bank
            .transfer_from(&mut state, NATIVE_DENOM, &alice, &bob, 41)
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Bank(BankError::InsufficientFunds { balance: 40, .. })
        ));
    }

    #[test]
    fn drained_balances_leave_no_key_behind() {
        let bank = BankService;
        let mut state = MemoryState::new();
        let alice = AccountId::new("alice");
        bank.mint(&mut state, "usdc", &alice, 5).unwrap();
        bank.transfer_from(&mut state, "usdc", &alice, &AccountId::new("bob"), 5)
            .unwrap();
        assert!(state
            .get(&balance_key("usdc", "alice"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn burn_cannot_exceed_the_balance() {
        let bank = BankService;
        let mut state = MemoryState::new();
        let alice = AccountId::new("alice");
        bank.mint(&mut state, "bnusd", &alice, 10).unwrap();
        assert!(bank.burn(&mut state, "bnusd", &alice, 11).is_err());
        bank.burn(&mut state, "bnusd", &alice, 10).unwrap();
        assert!(state.get(&balance_key("bnusd", "alice")).unwrap().is_none());
    }

    #[test]
    fn denominations_are_independent() {
        let bank = BankService;
        let mut state = MemoryState::new();
        let alice = AccountId::new("alice");
        bank.mint(&mut state, "usdc", &alice, 5).unwrap();
        assert_eq!(bank.balance_of(&state, NATIVE_DENOM, &alice).unwrap(), 0);
        assert!(bank
            .transfer_from(&mut state, NATIVE_DENOM, &alice, &AccountId::new("bob"), 1)
            .is_err());
    }
}
