//! In-memory trade ledgers. One ordered, id-keyed collection per trade kind.
//!
//! Add validates raw UI text and appends; close is a one-way transition that
//! fills the exit fields and fixes the realized P/L. Nothing here touches disk,
//! persistence lives in `store`.

use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{LedgerError, Result};
use crate::types::{EquityTrade, LedgerSummary, OptionTrade, Realized, TradeId};
use crate::utils::{
    checked, free_text, parse_positive_decimal, parse_positive_int, require_text, round_money,
    sanitize_symbol,
};

/// Shares per listed option contract.
pub const CONTRACT_MULTIPLIER: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger<T> {
    trades: Vec<(TradeId, T)>,
    next_id: u64,
    path: PathBuf,
}

pub type EquityLedger = Ledger<EquityTrade>;
pub type OptionLedger = Ledger<OptionTrade>;

impl<T> Ledger<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            trades: Vec::new(),
            next_id: 1,
            path: path.into(),
        }
    }

    /// Build a ledger from records in display order; ids follow that order.
    pub fn from_trades(path: impl Into<PathBuf>, trades: Vec<T>) -> Self {
        let mut me = Self::new(path);
        for t in trades {
            me.push(t);
        }
        me
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TradeId, &T)> {
        self.trades.iter().map(|(id, t)| (*id, t))
    }

    pub fn get(&self, id: TradeId) -> Result<&T> {
        self.trades
            .iter()
            .find(|(tid, _)| *tid == id)
            .map(|(_, t)| t)
            .ok_or(LedgerError::NotFound(id))
    }

    /// Id of the row shown at `index` (0-based display position).
    pub fn id_at(&self, index: usize) -> Option<TradeId> {
        self.trades.get(index).map(|(id, _)| *id)
    }

    fn get_mut(&mut self, id: TradeId) -> Result<&mut T> {
        self.trades
            .iter_mut()
            .find(|(tid, _)| *tid == id)
            .map(|(_, t)| t)
            .ok_or(LedgerError::NotFound(id))
    }

    fn push(&mut self, trade: T) -> (TradeId, &T) {
        let id = TradeId(self.next_id);
        self.next_id += 1;
        self.trades.push((id, trade));
        let (_, t) = &self.trades[self.trades.len() - 1];
        (id, t)
    }
}

impl<T: Realized> Ledger<T> {
    pub fn summary(&self) -> LedgerSummary {
        self.trades
            .iter()
            .fold(LedgerSummary::default(), |mut acc, (_, t)| {
                match t.realized_pl() {
                    Some(pl) => {
                        acc.closed += 1;
                        acc.realized_pl = acc.realized_pl.saturating_add(pl);
                        if pl > Decimal::ZERO {
                            acc.winners += 1;
                        } else if pl < Decimal::ZERO {
                            acc.losers += 1;
                        }
                    }
                    None => acc.open += 1,
                }
                acc
            })
    }
}

// ---------------- Equity ----------------

impl Ledger<EquityTrade> {
    /// Validate UI text and append an open stock position.
    pub fn add_trade(
        &mut self,
        ticker: &str,
        buy_date: &str,
        buy_price_text: &str,
        num_shares_text: &str,
    ) -> Result<(TradeId, &EquityTrade)> {
        let ticker = sanitize_symbol(ticker);
        if ticker.is_empty() {
            return Err(LedgerError::validation("ticker", "value is required"));
        }
        let buy_date = free_text("buy date", buy_date)?;
        let buy_price = parse_positive_decimal("buy price", buy_price_text)?;
        let num_shares = parse_positive_int("shares", num_shares_text)?;
        let notional = checked("buy price", buy_price.checked_mul(Decimal::from(num_shares)))?;
        let notional = round_money(notional);

        info!(
            "Equity add: {} {} x {} @ {} (notional {})",
            ticker, buy_date, num_shares, buy_price, notional
        );
        Ok(self.push(EquityTrade {
            ticker,
            buy_date,
            buy_price: Some(buy_price),
            num_shares,
            notional,
            sell_date: None,
            sell_price: None,
            profit_loss: None,
        }))
    }

    /// Close an open position. Re-closing goes through [`Self::amend_close`].
    pub fn close_position(
        &mut self,
        id: TradeId,
        sell_date: &str,
        sell_price_text: &str,
    ) -> Result<&EquityTrade> {
        let sell_date = require_text("sell date", sell_date)?;
        let sell_price = parse_positive_decimal("sell price", sell_price_text)?;
        let trade = self.get_mut(id)?;
        if trade.is_closed() {
            return Err(LedgerError::invalid_state(
                id,
                "is already closed (use amend to change the exit)",
            ));
        }
        settle_equity(id, trade, sell_date, sell_price)?;
        info!(
            "Equity close {}: {} sold @ {} -> P/L {:?}",
            id, trade.ticker, sell_price, trade.profit_loss
        );
        Ok(trade)
    }

    /// Replace the exit of an already closed position and recompute P/L.
    pub fn amend_close(
        &mut self,
        id: TradeId,
        sell_date: &str,
        sell_price_text: &str,
    ) -> Result<&EquityTrade> {
        let sell_date = require_text("sell date", sell_date)?;
        let sell_price = parse_positive_decimal("sell price", sell_price_text)?;
        let trade = self.get_mut(id)?;
        if !trade.is_closed() {
            return Err(LedgerError::invalid_state(id, "is still open"));
        }
        debug!(
            "Equity amend {}: previous exit {:?} @ {:?}",
            id, trade.sell_date, trade.sell_price
        );
        settle_equity(id, trade, sell_date, sell_price)?;
        info!("Equity amend {}: P/L now {:?}", id, trade.profit_loss);
        Ok(trade)
    }
}

fn settle_equity(
    id: TradeId,
    trade: &mut EquityTrade,
    sell_date: String,
    sell_price: Decimal,
) -> Result<()> {
    let buy_price = trade
        .buy_price
        .ok_or_else(|| LedgerError::invalid_state(id, "has no valid buy price"))?;
    let pl = sell_price
        .checked_sub(buy_price)
        .and_then(|diff| diff.checked_mul(Decimal::from(trade.num_shares)));
    let pl = checked("sell price", pl)?;
    trade.sell_date = Some(sell_date);
    trade.sell_price = Some(sell_price);
    trade.profit_loss = Some(round_money(pl));
    Ok(())
}

// ---------------- Options ----------------

/// Raw open-time fields for an option trade, as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct OptionInput<'a> {
    pub underlier: &'a str,
    pub date: &'a str,
    pub expiry: &'a str,
    pub option_type: &'a str,
    pub open_price: &'a str,
    pub strike_price: &'a str,
    pub underlier_price: &'a str,
    pub premium: &'a str,
    pub fee: &'a str,
    pub quantity: &'a str,
}

impl Ledger<OptionTrade> {
    pub fn add_trade(&mut self, input: &OptionInput<'_>) -> Result<(TradeId, &OptionTrade)> {
        let underlier = sanitize_symbol(input.underlier);
        if underlier.is_empty() {
            return Err(LedgerError::validation("underlier", "value is required"));
        }
        let trade = OptionTrade {
            underlier,
            date: free_text("date", input.date)?,
            expiry: free_text("expiry", input.expiry)?,
            option_type: free_text("type", input.option_type)?,
            open_price: Some(parse_positive_decimal("open price", input.open_price)?),
            strike_price: parse_positive_decimal("strike price", input.strike_price)?,
            underlier_price: parse_positive_decimal("underlier price", input.underlier_price)?,
            premium: parse_positive_decimal("premium", input.premium)?,
            fee: parse_positive_decimal("fee", input.fee)?,
            quantity: parse_positive_int("quantity", input.quantity)?,
            close_price: None,
            close_premium: None,
            profit_loss: None,
        };
        info!(
            "Option add: {}x {} {} {} @ {}",
            trade.quantity, trade.underlier, trade.expiry, trade.option_type, input.open_price
        );
        Ok(self.push(trade))
    }

    pub fn close_position(
        &mut self,
        id: TradeId,
        close_price_text: &str,
        close_premium_text: &str,
    ) -> Result<&OptionTrade> {
        let close_price = parse_positive_decimal("close price", close_price_text)?;
        let close_premium = parse_positive_decimal("close premium", close_premium_text)?;
        let trade = self.get_mut(id)?;
        if trade.is_closed() {
            return Err(LedgerError::invalid_state(
                id,
                "is already closed (use amend to change the exit)",
            ));
        }
        settle_option(id, trade, close_price, close_premium)?;
        info!(
            "Option close {}: {} @ {} -> P/L {:?}",
            id, trade.underlier, close_price, trade.profit_loss
        );
        Ok(trade)
    }

    pub fn amend_close(
        &mut self,
        id: TradeId,
        close_price_text: &str,
        close_premium_text: &str,
    ) -> Result<&OptionTrade> {
        let close_price = parse_positive_decimal("close price", close_price_text)?;
        let close_premium = parse_positive_decimal("close premium", close_premium_text)?;
        let trade = self.get_mut(id)?;
        if !trade.is_closed() {
            return Err(LedgerError::invalid_state(id, "is still open"));
        }
        settle_option(id, trade, close_price, close_premium)?;
        info!("Option amend {}: P/L now {:?}", id, trade.profit_loss);
        Ok(trade)
    }
}

fn settle_option(
    id: TradeId,
    trade: &mut OptionTrade,
    close_price: Decimal,
    close_premium: Decimal,
) -> Result<()> {
    let open_price = trade
        .open_price
        .ok_or_else(|| LedgerError::invalid_state(id, "has no valid open price"))?;
    let contracts = Decimal::from(trade.quantity) * Decimal::from(CONTRACT_MULTIPLIER);
    let pl = close_price
        .checked_sub(open_price)
        .and_then(|diff| diff.checked_mul(contracts))
        .and_then(|gross| gross.checked_sub(trade.fee));
    let pl = checked("close price", pl)?;
    trade.close_price = Some(close_price);
    trade.close_premium = Some(close_premium);
    trade.profit_loss = Some(round_money(pl));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PnlOutcome;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn option_input<'a>(open: &'a str, qty: &'a str, fee: &'a str) -> OptionInput<'a> {
        OptionInput {
            underlier: "spy",
            date: "2024-01-02",
            expiry: "2024-03-15",
            option_type: "Call",
            open_price: open,
            strike_price: "480",
            underlier_price: "475.20",
            premium: "600",
            fee,
            quantity: qty,
        }
    }

    // ---------- Equity ----------

    #[test]
    fn equity_add_then_close_scenario() {
        let mut l = EquityLedger::new("unused.json");
        let (id, t) = l.add_trade("aapl", "2024-01-01", "150.00", "10").unwrap();
        assert_eq!(t.ticker, "AAPL");
        assert_eq!(t.notional, d("1500.00"));
        assert!(!t.is_closed());
        assert_eq!(t.sell_date, None);

        let t = l.close_position(id, "2024-02-01", "160.00").unwrap();
        assert_eq!(t.profit_loss, Some(d("100.00")));
        assert_eq!(t.sell_price, Some(d("160.00")));
        assert_eq!(t.sell_date.as_deref(), Some("2024-02-01"));
        assert_eq!(t.outcome(), Some(PnlOutcome::Gain));
    }

    #[test]
    fn notional_is_rounded_to_cents() {
        let mut l = EquityLedger::new("unused.json");
        let (_, t) = l.add_trade("X", "d", "0.3333", "3").unwrap();
        assert_eq!(t.notional, d("1.00"));
        let (_, t) = l.add_trade("X", "d", "10.125", "1").unwrap();
        assert_eq!(t.notional, d("10.13"));
    }

    #[test]
    fn equity_loss_is_negative() {
        let mut l = EquityLedger::new("unused.json");
        let (id, _) = l.add_trade("MSFT", "2024-01-01", "400.10", "3").unwrap();
        let t = l.close_position(id, "2024-01-09", "390.05").unwrap();
        assert_eq!(t.profit_loss, Some(d("-30.15")));
        assert_eq!(t.outcome(), Some(PnlOutcome::Loss));
    }

    #[test]
    fn non_numeric_buy_price_leaves_ledger_unchanged() {
        let mut l = EquityLedger::new("unused.json");
        let err = l.add_trade("AAPL", "2024-01-01", "abc", "10").unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "buy price", .. }));
        assert!(l.is_empty());

        assert!(l.add_trade("AAPL", "2024-01-01", "150", "ten").is_err());
        assert!(l.add_trade("   ", "2024-01-01", "150", "10").is_err());
        assert!(l.is_empty());
    }

    #[test]
    fn close_rejects_non_positive_or_missing_input() {
        let mut l = EquityLedger::new("unused.json");
        let (id, _) = l.add_trade("AAPL", "2024-01-01", "150", "10").unwrap();
        for bad in ["0", "-5", "0.00", "abc", ""] {
            let err = l.close_position(id, "2024-02-01", bad).unwrap_err();
            assert!(matches!(err, LedgerError::Validation { .. }), "{bad}");
        }
        let err = l.close_position(id, "  ", "160").unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "sell date", .. }));
        assert!(!l.get(id).unwrap().is_closed());
    }

    #[test]
    fn reclose_is_rejected_but_amend_works() {
        let mut l = EquityLedger::new("unused.json");
        let (id, _) = l.add_trade("AAPL", "2024-01-01", "150", "10").unwrap();
        l.close_position(id, "2024-02-01", "160").unwrap();

        let err = l.close_position(id, "2024-03-01", "170").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
        assert_eq!(l.get(id).unwrap().profit_loss, Some(d("100.00")));

        let t = l.amend_close(id, "2024-03-01", "170").unwrap();
        assert_eq!(t.profit_loss, Some(d("200.00")));
        assert_eq!(t.sell_date.as_deref(), Some("2024-03-01"));
    }

    #[test]
    fn amend_requires_closed_position() {
        let mut l = EquityLedger::new("unused.json");
        let (id, _) = l.add_trade("AAPL", "2024-01-01", "150", "10").unwrap();
        assert!(matches!(
            l.amend_close(id, "2024-03-01", "170"),
            Err(LedgerError::InvalidState { .. })
        ));
    }

    #[test]
    fn close_without_buy_price_is_invalid_state() {
        let broken = EquityTrade {
            ticker: "OLD".into(),
            buy_date: "?".into(),
            buy_price: None,
            num_shares: 5,
            notional: Decimal::ZERO,
            sell_date: None,
            sell_price: None,
            profit_loss: None,
        };
        let mut l = EquityLedger::from_trades("unused.json", vec![broken]);
        let id = l.id_at(0).unwrap();
        let err = l.close_position(id, "2024-02-01", "10").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
        assert!(!l.get(id).unwrap().is_closed());
        assert_eq!(l.get(id).unwrap().sell_price, None);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut l = EquityLedger::new("unused.json");
        assert!(matches!(
            l.close_position(TradeId(42), "2024-02-01", "1"),
            Err(LedgerError::NotFound(TradeId(42)))
        ));
    }

    #[test]
    fn ids_are_stable_and_follow_insertion_order() {
        let mut l = EquityLedger::new("unused.json");
        let (a, _) = l.add_trade("A", "d", "1", "1").unwrap();
        let _ = l.add_trade("B", "d", "x", "1");
        let (b, _) = l.add_trade("B", "d", "2", "1").unwrap();
        assert_eq!(a, TradeId(1));
        assert_eq!(b, TradeId(2));
        assert_eq!(l.id_at(1), Some(b));
        assert_eq!(l.id_at(2), None);
        let tickers: Vec<_> = l.iter().map(|(_, t)| t.ticker.as_str()).collect();
        assert_eq!(tickers, ["A", "B"]);
    }

    #[test]
    fn oversized_values_are_rejected_not_fatal() {
        let max = "79228162514264337593543950335";
        let mut l = EquityLedger::new("unused.json");
        let err = l.add_trade("X", "d", max, "2").unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "buy price", .. }));
        assert!(l.is_empty());

        let (id, _) = l.add_trade("X", "d", "0.5", "4000000000").unwrap();
        let err = l.close_position(id, "e", max).unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "sell price", .. }));
        assert!(!l.get(id).unwrap().is_closed());

        let mut o = OptionLedger::new("unused.json");
        let (oid, _) = o.add_trade(&option_input("1", "3", "1.50")).unwrap();
        let err = o.close_position(oid, max, "10").unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "close price", .. }));
        assert!(!o.get(oid).unwrap().is_closed());
    }

    #[test]
    fn bare_placeholder_is_refused_in_text_fields() {
        let mut l = EquityLedger::new("unused.json");
        assert!(matches!(
            l.add_trade("AAPL", "-", "150", "10"),
            Err(LedgerError::Validation { field: "buy date", .. })
        ));
        let (id, _) = l.add_trade("AAPL", "2024-01-01", "150", "10").unwrap();
        assert!(matches!(
            l.close_position(id, "-", "160"),
            Err(LedgerError::Validation { field: "sell date", .. })
        ));
        l.close_position(id, "2024-02-01", "160").unwrap();
        assert!(l.amend_close(id, " - ", "170").is_err());
        assert_eq!(l.get(id).unwrap().sell_date.as_deref(), Some("2024-02-01"));

        let mut o = OptionLedger::new("unused.json");
        let mut input = option_input("2", "3", "1.5");
        input.expiry = "-";
        assert!(matches!(
            o.add_trade(&input),
            Err(LedgerError::Validation { field: "expiry", .. })
        ));
        assert!(o.is_empty());
    }

    // ---------- Options ----------

    #[test]
    fn option_close_scenario() {
        let mut l = OptionLedger::new("unused.json");
        let (id, t) = l.add_trade(&option_input("2.00", "3", "1.50")).unwrap();
        assert_eq!(t.underlier, "SPY");
        assert!(t.close_price.is_none());

        let t = l.close_position(id, "5.00", "1500").unwrap();
        assert_eq!(t.profit_loss, Some(d("898.50")));
        assert_eq!(t.close_premium, Some(d("1500")));
    }

    #[test]
    fn option_losing_trade_includes_fee() {
        let mut l = OptionLedger::new("unused.json");
        let (id, _) = l.add_trade(&option_input("3.10", "2", "1.30")).unwrap();
        let t = l.close_position(id, "2.05", "410").unwrap();
        // (2.05 - 3.10) * 200 - 1.30
        assert_eq!(t.profit_loss, Some(d("-211.30")));
    }

    #[test]
    fn option_add_validates_every_numeric_field() {
        let mut l = OptionLedger::new("unused.json");
        assert!(l.add_trade(&option_input("abc", "3", "1.5")).is_err());
        assert!(l.add_trade(&option_input("2", "0", "1.5")).is_err());
        assert!(l.add_trade(&option_input("2", "3", "0")).is_err());
        let mut bad_strike = option_input("2", "3", "1.5");
        bad_strike.strike_price = "-480";
        assert!(l.add_trade(&bad_strike).is_err());
        let mut no_underlier = option_input("2", "3", "1.5");
        no_underlier.underlier = "";
        assert!(l.add_trade(&no_underlier).is_err());
        assert!(l.is_empty());
    }

    #[test]
    fn option_close_requires_both_values() {
        let mut l = OptionLedger::new("unused.json");
        let (id, _) = l.add_trade(&option_input("2.00", "3", "1.50")).unwrap();
        assert!(matches!(
            l.close_position(id, "5.00", ""),
            Err(LedgerError::Validation { field: "close premium", .. })
        ));
        assert!(matches!(
            l.close_position(id, "0", "10"),
            Err(LedgerError::Validation { field: "close price", .. })
        ));
        assert!(!l.get(id).unwrap().is_closed());
    }

    #[test]
    fn option_reclose_rejected_amend_recomputes() {
        let mut l = OptionLedger::new("unused.json");
        let (id, _) = l.add_trade(&option_input("2.00", "3", "1.50")).unwrap();
        l.close_position(id, "5.00", "1500").unwrap();
        assert!(matches!(
            l.close_position(id, "6.00", "1800"),
            Err(LedgerError::InvalidState { .. })
        ));
        let t = l.amend_close(id, "2.00", "600").unwrap();
        assert_eq!(t.profit_loss, Some(d("-1.50")));
    }

    // ---------- Summary ----------

    #[test]
    fn summary_counts_and_totals() {
        let mut l = EquityLedger::new("unused.json");
        let (a, _) = l.add_trade("A", "d", "10", "10").unwrap();
        let (b, _) = l.add_trade("B", "d", "10", "10").unwrap();
        let (c, _) = l.add_trade("C", "d", "10", "10").unwrap();
        l.add_trade("D", "d", "10", "10").unwrap();
        l.close_position(a, "e", "12").unwrap();
        l.close_position(b, "e", "9").unwrap();
        l.close_position(c, "e", "10").unwrap();

        let s = l.summary();
        assert_eq!(s.open, 1);
        assert_eq!(s.closed, 3);
        assert_eq!(s.winners, 1);
        assert_eq!(s.losers, 1);
        assert_eq!(s.realized_pl, d("10.00"));
    }
}
