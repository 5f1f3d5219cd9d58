//! The meta-currency service.
//!
//! The proxy treats circles as an opaque mintable balance: it only needs
//! `mint`, `burn` and `balance_of`, and only the designated minter (the
//! proxy itself) may call the first two. [`CircleToken`] is the in-memory
//! ledger used by the reference deployment.

use crate::id::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("{caller} may not mint or burn")]
    Unauthorized { caller: Address },
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u128, available: u128 },
    #[error("insufficient allowance: need {required}, have {available}")]
    InsufficientAllowance { required: u128, available: u128 },
    #[error("supply overflow")]
    Overflow,
}

/// Balance service for circles. Object-safe so the proxy can hold any
/// implementation; `boxed_clone` lets the proxy checkpoint it per call.
pub trait MetaCurrency: std::fmt::Debug + Send {
    fn address(&self) -> Address;

    fn balance_of(&self, owner: Address) -> u128;

    fn total_supply(&self) -> u128;

    /// Create `amount` new circles for `to`. Minter only.
    fn mint(&mut self, caller: Address, to: Address, amount: u128) -> Result<(), TokenError>;

    /// Destroy `amount` circles held by `from`. Minter only.
    fn burn(&mut self, caller: Address, from: Address, amount: u128) -> Result<(), TokenError>;

    fn transfer(&mut self, caller: Address, to: Address, amount: u128) -> Result<(), TokenError>;

    fn approve(&mut self, owner: Address, spender: Address, amount: u128);

    fn allowance(&self, owner: Address, spender: Address) -> u128;

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), TokenError>;

    fn boxed_clone(&self) -> Box<dyn MetaCurrency>;
}

/// In-memory circle ledger with a single privileged minter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircleToken {
    address: Address,
    minter: Address,
    balances: BTreeMap<Address, u128>,
    allowances: BTreeMap<(Address, Address), u128>,
    total_supply: u128,
}

impl CircleToken {
    pub fn new(address: Address, minter: Address) -> Self {
        Self {
            address,
            minter,
            ..Self::default()
        }
    }

    pub fn minter(&self) -> Address {
        self.minter
    }

    fn require_minter(&self, caller: Address) -> Result<(), TokenError> {
        if caller != self.minter {
            return Err(TokenError::Unauthorized { caller });
        }
        Ok(())
    }

    fn debit(&mut self, from: Address, amount: u128) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        self.balances.insert(from, available - amount);
        Ok(())
    }

    fn credit(&mut self, to: Address, amount: u128) -> Result<(), TokenError> {
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert(to, balance);
        Ok(())
    }
}

impl MetaCurrency for CircleToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, owner: Address) -> u128 {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }

    fn mint(&mut self, caller: Address, to: Address, amount: u128) -> Result<(), TokenError> {
        self.require_minter(caller)?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.credit(to, amount)?;
        self.total_supply = supply;
        Ok(())
    }

    fn burn(&mut self, caller: Address, from: Address, amount: u128) -> Result<(), TokenError> {
        self.require_minter(caller)?;
        self.debit(from, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    fn transfer(&mut self, caller: Address, to: Address, amount: u128) -> Result<(), TokenError> {
        self.debit(caller, amount)?;
        self.credit(to, amount)
    }

    fn approve(&mut self, owner: Address, spender: Address, amount: u128) {
        self.allowances.insert((owner, spender), amount);
    }

    fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                required: amount,
                available: allowed,
            });
        }
        self.debit(from, amount)?;
        self.credit(to, amount)?;
        self.allowances.insert((from, spender), allowed - amount);
        Ok(())
    }

    fn boxed_clone(&self) -> Box<dyn MetaCurrency> {
        Box::new(self.clone())
    }
}
