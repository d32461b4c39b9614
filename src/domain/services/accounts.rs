//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The account ledger: a dense slot array mapping account ids to account records. Accounts are
// created on first use, keep their original name forever, and accumulate share and cash
// positions with saturating arithmetic.
//
// | Name           | Description                                            |
// |----------------|--------------------------------------------------------|
// | Account        | Name, balances, position high-water marks, owned orders.|
// | AccountLedger  | Slot-indexed store with first-name-wins creation.      |
// | LedgerError    | Rejection for out-of-range account ids.                |
//--------------------------------------------------------------------------------------------------

use thiserror::Error;
use tracing::warn;

use crate::domain::models::types::{AccountId, OrderId, Price, Qty, Side};

/// Balances clamp to this magnitude instead of wrapping.
pub const POSITION_LIMIT: i64 = i32::MAX as i64;

/// Errors raised by ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The supplied account id is at or above the configured cap.
    #[error("TOO_HIGH_ACCOUNT")]
    TooHighAccount,
}

/// One trading account.
#[derive(Debug)]
pub struct Account {
    /// Display name. Fixed at creation; later ids reusing the slot keep it.
    pub name: String,
    /// Slot index in the ledger.
    pub id: AccountId,
    /// Current share position, clamped to ±(2³¹−1).
    pub shares: i32,
    /// Current cash position in cents, clamped to ±(2³¹−1).
    pub cents: i32,
    /// Lowest share position seen since creation.
    pub posmin: i32,
    /// Highest share position seen since creation.
    pub posmax: i32,
    /// Every order this account has ever placed, in admission order.
    pub orders: Vec<OrderId>,
}

impl Account {
    fn new(name: &str, id: AccountId) -> Self {
        Self {
            name: name.to_string(),
            id,
            shares: 0,
            cents: 0,
            posmin: 0,
            posmax: 0,
            orders: Vec::new(),
        }
    }
}

/// Dense, slot-indexed account store. The id supplied by the caller is the
/// storage slot; slots are materialized lazily up to the configured cap.
#[derive(Debug)]
pub struct AccountLedger {
    slots: Vec<Option<Account>>,
    cap: AccountId,
}

impl AccountLedger {
    /// Creates an empty ledger that accepts ids below `cap`.
    pub fn new(cap: AccountId) -> Self {
        Self {
            slots: Vec::new(),
            cap,
        }
    }

    /// Returns the account in the given slot, creating it with `name` if the
    /// slot is empty. An occupied slot keeps its original name: the first
    /// name wins.
    pub fn lookup_or_create(
        &mut self,
        name: &str,
        id: AccountId,
    ) -> Result<&mut Account, LedgerError> {
        if id >= self.cap {
            return Err(LedgerError::TooHighAccount);
        }
        let idx = id as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        let slot = &mut self.slots[idx];
        if slot.is_none() {
            *slot = Some(Account::new(name, id));
        }
        Ok(slot.as_mut().expect("slot populated above"))
    }

    /// Looks an account up without creating it.
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.slots.get(id as usize).and_then(|s| s.as_ref())
    }

    /// The display name stored in a slot, if any.
    pub fn name_of(&self, id: AccountId) -> Option<&str> {
        self.get(id).map(|a| a.name.as_str())
    }

    /// Appends an order id to an account's owned list.
    pub fn attach_order(&mut self, id: AccountId, order: OrderId) {
        match self.slots.get_mut(id as usize).and_then(|s| s.as_mut()) {
            Some(account) => account.orders.push(order),
            None => warn!(account = id, "attach_order on unknown account slot"),
        }
    }

    /// Applies one side of a trade to an account: shares move by the traded
    /// quantity, cash by the traded notional, both clamped at ±(2³¹−1).
    /// Position high-water marks follow the share balance.
    pub fn apply_trade(&mut self, id: AccountId, qty: Qty, price: Price, side: Side) {
        let Some(account) = self.slots.get_mut(id as usize).and_then(|s| s.as_mut()) else {
            warn!(account = id, "apply_trade on unknown account slot");
            return;
        };

        let qty = i64::from(qty);
        let notional = price.saturating_mul(qty);
        let (share_delta, cash_delta) = match side {
            Side::Buy => (qty, -notional),
            Side::Sell => (-qty, notional),
        };

        account.shares = clamp_position(i64::from(account.shares) + share_delta);
        account.cents = clamp_position(i64::from(account.cents).saturating_add(cash_delta));
        if account.shares < account.posmin {
            account.posmin = account.shares;
        }
        if account.shares > account.posmax {
            account.posmax = account.shares;
        }
    }

    /// Every created account, in slot order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    /// Number of created accounts.
    pub fn created(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

fn clamp_position(value: i64) -> i32 {
    value.clamp(-POSITION_LIMIT, POSITION_LIMIT) as i32
}
