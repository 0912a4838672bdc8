//! Core domain types for equity and option trade records.

use rust_decimal::Decimal;
use std::fmt;

/// Stable handle for a trade inside one ledger. Assigned at insertion, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeId(pub u64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stock position. Sell fields are filled in exactly once, by a close.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityTrade {
    pub ticker: String,
    pub buy_date: String,
    /// `None` only when a loaded row carried a non-numeric buy price.
    pub buy_price: Option<Decimal>,
    pub num_shares: u32,
    /// buy_price × num_shares, fixed at creation.
    pub notional: Decimal,
    pub sell_date: Option<String>,
    pub sell_price: Option<Decimal>,
    pub profit_loss: Option<Decimal>,
}

impl EquityTrade {
    pub fn is_closed(&self) -> bool {
        self.profit_loss.is_some()
    }

    pub fn outcome(&self) -> Option<PnlOutcome> {
        self.profit_loss.map(PnlOutcome::from)
    }
}

/// Option position. P/L is (close − open) × contracts × 100 − fee.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionTrade {
    pub underlier: String,
    pub date: String,
    pub expiry: String,
    pub option_type: String, // e.g. "Call" / "Put"
    pub open_price: Option<Decimal>,
    pub strike_price: Decimal,
    pub underlier_price: Decimal,
    pub premium: Decimal,
    pub fee: Decimal,
    pub quantity: u32, // contracts
    pub close_price: Option<Decimal>,
    pub close_premium: Option<Decimal>,
    pub profit_loss: Option<Decimal>,
}

impl OptionTrade {
    pub fn is_closed(&self) -> bool {
        self.profit_loss.is_some()
    }

    pub fn outcome(&self) -> Option<PnlOutcome> {
        self.profit_loss.map(PnlOutcome::from)
    }
}

/// Anything that can carry a realized P/L once closed.
pub trait Realized {
    fn realized_pl(&self) -> Option<Decimal>;
}

impl Realized for EquityTrade {
    fn realized_pl(&self) -> Option<Decimal> {
        self.profit_loss
    }
}

impl Realized for OptionTrade {
    fn realized_pl(&self) -> Option<Decimal> {
        self.profit_loss
    }
}

/// Sign of a realized P/L; drives gain/loss colouring in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnlOutcome {
    Gain,
    Loss,
    Flat,
}

impl From<Decimal> for PnlOutcome {
    fn from(pl: Decimal) -> Self {
        if pl.is_zero() {
            PnlOutcome::Flat
        } else if pl.is_sign_negative() {
            PnlOutcome::Loss
        } else {
            PnlOutcome::Gain
        }
    }
}

/// Aggregate view over one ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSummary {
    pub open: usize,
    pub closed: usize,
    pub realized_pl: Decimal,
    pub winners: usize,
    pub losers: usize,
}
