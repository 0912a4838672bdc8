//! Text front-end over the two ledgers. Owns them for the life of the process,
//! turns parsed commands into ledger calls and renders what comes back.

use std::fmt::Write as _;
use tracing::{error, info, warn};

use crate::error::LedgerError;
use crate::ledger::{EquityLedger, OptionInput, OptionLedger};
use crate::parser::{parse_command, Command};
use crate::store::Row;
use crate::types::{EquityTrade, LedgerSummary, OptionTrade, PnlOutcome, TradeId};
use crate::utils::fmt_money;

pub const HELP: &str = "\
buy TICKER DATE PRICE SHARES
sell ID DATE PRICE            amend ID DATE PRICE
open UNDERLIER DATE EXPIRY TYPE OPEN STRIKE UNDERLIER_PX PREMIUM FEE QTY
close ID PRICE PREMIUM        reclose ID PRICE PREMIUM
stocks | options | summary | save | help | quit
DATE may be 'today'.";

pub enum Step {
    Continue(String),
    Quit,
}

pub struct Console {
    pub equities: EquityLedger,
    pub options: OptionLedger,
}

impl Console {
    pub fn new(equities: EquityLedger, options: OptionLedger) -> Self {
        Self { equities, options }
    }

    /// Handle one input line. Errors are rendered, never propagated.
    pub fn handle_line(&mut self, line: &str) -> Step {
        if line.trim().is_empty() {
            return Step::Continue(String::new());
        }
        let Some(cmd) = parse_command(line) else {
            warn!("Unrecognized command: {}", line.trim());
            return Step::Continue("unrecognized command, try 'help'".to_string());
        };
        match self.execute(cmd) {
            Ok(Some(out)) => Step::Continue(out),
            Ok(None) => Step::Quit,
            Err(e) => {
                match &e {
                    LedgerError::Persistence { .. } => error!("{}", e),
                    _ => warn!("{}", e),
                }
                Step::Continue(format!("error: {e}"))
            }
        }
    }

    fn execute(&mut self, cmd: Command) -> Result<Option<String>, LedgerError> {
        let out = match cmd {
            Command::Buy {
                ticker,
                date,
                price,
                shares,
            } => {
                let (id, t) = self.equities.add_trade(&ticker, &date, &price, &shares)?;
                equity_line(id, t)
            }
            Command::Sell { id, date, price } => {
                let t = self.equities.close_position(id, &date, &price)?;
                equity_line(id, t)
            }
            Command::Amend { id, date, price } => {
                let t = self.equities.amend_close(id, &date, &price)?;
                equity_line(id, t)
            }
            Command::Open(f) => {
                let input = OptionInput {
                    underlier: &f.underlier,
                    date: &f.date,
                    expiry: &f.expiry,
                    option_type: &f.option_type,
                    open_price: &f.open_price,
                    strike_price: &f.strike_price,
                    underlier_price: &f.underlier_price,
                    premium: &f.premium,
                    fee: &f.fee,
                    quantity: &f.quantity,
                };
                let (id, t) = self.options.add_trade(&input)?;
                option_line(id, t)
            }
            Command::Close { id, price, premium } => {
                let t = self.options.close_position(id, &price, &premium)?;
                option_line(id, t)
            }
            Command::Reclose { id, price, premium } => {
                let t = self.options.amend_close(id, &price, &premium)?;
                option_line(id, t)
            }
            Command::Stocks => render_table(
                EquityTrade::HEADER,
                self.equities
                    .iter()
                    .map(|(id, t)| (id, t.to_row(), t.outcome())),
            ),
            Command::Options => render_table(
                OptionTrade::HEADER,
                self.options
                    .iter()
                    .map(|(id, t)| (id, t.to_row(), t.outcome())),
            ),
            Command::Summary => format!(
                "stocks:  {}\noptions: {}",
                summary_line(&self.equities.summary()),
                summary_line(&self.options.summary())
            ),
            Command::Save => {
                self.save_all()?;
                format!(
                    "saved {} stock and {} option trades",
                    self.equities.len(),
                    self.options.len()
                )
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(None),
        };
        Ok(Some(out))
    }

    /// Flush both ledgers. Tries both even if the first one fails.
    pub fn save_all(&self) -> Result<(), LedgerError> {
        let eq = self.equities.save();
        let opt = self.options.save();
        if eq.is_ok() && opt.is_ok() {
            info!(
                "Ledgers saved ({} stock, {} option trades)",
                self.equities.len(),
                self.options.len()
            );
        }
        eq.and(opt)
    }
}

fn marker(outcome: Option<PnlOutcome>) -> &'static str {
    match outcome {
        Some(PnlOutcome::Gain) => "+",
        Some(PnlOutcome::Loss) => "-",
        Some(PnlOutcome::Flat) => "=",
        None => " ",
    }
}

fn equity_line(id: TradeId, t: &EquityTrade) -> String {
    format!("{} {} {}", marker(t.outcome()), id, t.to_row().join(" | "))
}

fn option_line(id: TradeId, t: &OptionTrade) -> String {
    format!("{} {} {}", marker(t.outcome()), id, t.to_row().join(" | "))
}

fn summary_line(s: &LedgerSummary) -> String {
    format!(
        "{} open, {} closed ({} up / {} down), realized P/L {}",
        s.open,
        s.closed,
        s.winners,
        s.losers,
        fmt_money(s.realized_pl)
    )
}

/// Fixed-width table; the first column is the gain/loss marker, then the id.
fn render_table(
    header: &[&str],
    rows: impl Iterator<Item = (TradeId, Vec<String>, Option<PnlOutcome>)>,
) -> String {
    let rows: Vec<_> = rows.collect();
    if rows.is_empty() {
        return "(no trades)".to_string();
    }
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for (_, cells, _) in &rows {
        for (w, c) in widths.iter_mut().zip(cells) {
            *w = (*w).max(c.len());
        }
    }
    let id_width = rows
        .iter()
        .map(|(id, _, _)| id.to_string().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = write!(out, "  {:id_width$}", "");
    for (h, w) in header.iter().zip(widths.iter().copied()) {
        let _ = write!(out, " | {h:w$}");
    }
    for (id, cells, outcome) in &rows {
        let _ = write!(out, "\n{} {:id_width$}", marker(*outcome), id.to_string());
        for (c, w) in cells.iter().zip(widths.iter().copied()) {
            let _ = write!(out, " | {c:w$}");
        }
    }
    out
}
