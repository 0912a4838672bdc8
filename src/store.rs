//! Persisted ledger files. Layout: a JSON array of rows, each row the ordered
//! string cells of one trade (no header). Unset values are written as "-".

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::types::{EquityTrade, OptionTrade};
use crate::utils::{fmt_money, fmt_opt_money, fmt_opt_price, fmt_price, parse_opt_cell, SENTINEL};

/// Conversion between a record and its on-disk row.
pub trait Row: Sized {
    const HEADER: &'static [&'static str];

    fn to_row(&self) -> Vec<String>;

    /// `None` when the row cannot describe a trade at all.
    fn from_row(cells: &[String]) -> Option<Self>;
}

impl Row for EquityTrade {
    const HEADER: &'static [&'static str] = &[
        "Ticker",
        "Buy Date",
        "Buy Price",
        "Shares",
        "Notional",
        "Sell Date",
        "Sell Price",
        "P/L",
    ];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.ticker.clone(),
            self.buy_date.clone(),
            fmt_opt_price(self.buy_price),
            self.num_shares.to_string(),
            fmt_money(self.notional),
            self.sell_date.clone().unwrap_or_else(|| SENTINEL.to_string()),
            fmt_opt_price(self.sell_price),
            fmt_opt_money(self.profit_loss),
        ]
    }

    fn from_row(cells: &[String]) -> Option<Self> {
        let [ticker, buy_date, buy_price, shares, notional, sell_date, sell_price, pl] = cells
        else {
            return None;
        };
        let num_shares: u32 = shares.trim().parse().ok()?;
        let notional = parse_opt_cell(notional).unwrap_or(Decimal::ZERO);
        let sell_date = opt_text(sell_date);
        let sell_price = parse_opt_cell(sell_price);
        let profit_loss = parse_opt_cell(pl);
        // Closed means all three exit cells are present; anything else reads as open.
        let closed = sell_date.is_some() && sell_price.is_some() && profit_loss.is_some();
        Some(EquityTrade {
            ticker: ticker.trim().to_string(),
            buy_date: buy_date.clone(),
            buy_price: parse_opt_cell(buy_price),
            num_shares,
            notional,
            sell_date: sell_date.filter(|_| closed),
            sell_price: sell_price.filter(|_| closed),
            profit_loss: profit_loss.filter(|_| closed),
        })
    }
}

impl Row for OptionTrade {
    const HEADER: &'static [&'static str] = &[
        "Ticker",
        "Open Date",
        "Expiry",
        "Type",
        "Open",
        "Strike",
        "Underlier",
        "Premium",
        "Fee",
        "Qnt",
        "Close",
        "Close Premium",
        "P/L",
    ];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.underlier.clone(),
            self.date.clone(),
            self.expiry.clone(),
            self.option_type.clone(),
            fmt_opt_price(self.open_price),
            fmt_price(self.strike_price),
            fmt_price(self.underlier_price),
            fmt_price(self.premium),
            fmt_price(self.fee),
            self.quantity.to_string(),
            fmt_opt_price(self.close_price),
            fmt_opt_price(self.close_premium),
            fmt_opt_money(self.profit_loss),
        ]
    }

    fn from_row(cells: &[String]) -> Option<Self> {
        let [
            underlier,
            date,
            expiry,
            option_type,
            open,
            strike,
            under_px,
            premium,
            fee,
            qty,
            close,
            close_prem,
            pl,
        ] = cells
        else {
            return None;
        };
        let close_price = parse_opt_cell(close);
        let close_premium = parse_opt_cell(close_prem);
        let profit_loss = parse_opt_cell(pl);
        let closed = close_price.is_some() && close_premium.is_some() && profit_loss.is_some();
        Some(OptionTrade {
            underlier: underlier.trim().to_string(),
            date: date.clone(),
            expiry: expiry.clone(),
            option_type: option_type.clone(),
            open_price: parse_opt_cell(open),
            strike_price: Decimal::from_str(strike.trim()).ok()?,
            underlier_price: Decimal::from_str(under_px.trim()).ok()?,
            premium: Decimal::from_str(premium.trim()).ok()?,
            fee: Decimal::from_str(fee.trim()).ok()?,
            quantity: qty.trim().parse().ok()?,
            close_price: close_price.filter(|_| closed),
            close_premium: close_premium.filter(|_| closed),
            profit_loss: profit_loss.filter(|_| closed),
        })
    }
}

fn opt_text(cell: &str) -> Option<String> {
    let t = cell.trim();
    if t.is_empty() || t == SENTINEL {
        None
    } else {
        Some(t.to_string())
    }
}

/// Read the raw rows. `Ok(None)` when the file does not exist yet.
pub fn read_rows(path: &Path) -> Result<Option<Vec<Vec<String>>>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path).map_err(|e| LedgerError::persistence(path, e))?;
    let rows: Vec<Vec<String>> =
        serde_json::from_str(&s).map_err(|e| LedgerError::persistence(path, e))?;
    Ok(Some(rows))
}

/// Replace `path` with `rows` via a sibling temp file and a rename.
pub fn write_rows(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LedgerError::persistence(path, e))?;
    }
    let s = serde_json::to_string(rows).map_err(|e| LedgerError::persistence(path, e))?;
    let tmp = tmp_path(path);
    let write = || -> std::io::Result<()> {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(s.as_bytes())?;
        f.sync_all()?;
        fs::rename(&tmp, path)
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&tmp);
        return Err(LedgerError::persistence(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl<T: Row> Ledger<T> {
    /// Restore a ledger from `path`. Never fails: a missing file starts empty,
    /// a corrupt one is reported and also starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let rows = match read_rows(&path) {
            Ok(Some(rows)) => rows,
            Ok(None) => {
                info!("No ledger file at {}, starting empty", path.display());
                return Self::new(path);
            }
            Err(e) => {
                warn!("{}; starting with an empty ledger", e);
                return Self::new(path);
            }
        };

        let total = rows.len();
        let trades: Vec<T> = rows
            .iter()
            .enumerate()
            .filter_map(|(i, cells)| {
                let t = T::from_row(cells);
                if t.is_none() {
                    warn!("Skipping unreadable row {} in {}: {:?}", i, path.display(), cells);
                }
                t
            })
            .collect();
        info!("Loaded {}/{} trades from {}", trades.len(), total, path.display());
        Self::from_trades(path, trades)
    }

    /// Flush every trade, in display order, to the ledger's file.
    pub fn save(&self) -> Result<()> {
        let rows: Vec<Vec<String>> = self.iter().map(|(_, t)| t.to_row()).collect();
        write_rows(self.path(), &rows)?;
        debug!("Saved {} trades to {}", rows.len(), self.path().display());
        Ok(())
    }
}
