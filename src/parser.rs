//! Parse console commands. Numeric fields stay raw text: the ledger validates them.
//!
//! Supported:
//!   buy TICKER DATE PRICE SHARES        sell ID DATE PRICE       amend ID DATE PRICE
//!   open UNDERLIER DATE EXPIRY TYPE OPEN STRIKE UNDERLIER_PX PREMIUM FEE QTY
//!   close ID PRICE PREMIUM              reclose ID PRICE PREMIUM
//!   stocks | options | summary | save | help | quit

use chrono::Local;
use regex::Regex;

use crate::types::TradeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionFields {
    pub underlier: String,
    pub date: String,
    pub expiry: String,
    pub option_type: String,
    pub open_price: String,
    pub strike_price: String,
    pub underlier_price: String,
    pub premium: String,
    pub fee: String,
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Buy {
        ticker: String,
        date: String,
        price: String,
        shares: String,
    },
    Sell {
        id: TradeId,
        date: String,
        price: String,
    },
    Amend {
        id: TradeId,
        date: String,
        price: String,
    },
    Open(OptionFields),
    Close {
        id: TradeId,
        price: String,
        premium: String,
    },
    Reclose {
        id: TradeId,
        price: String,
        premium: String,
    },
    Stocks,
    Options,
    Summary,
    Save,
    Help,
    Quit,
}

pub fn parse_command(text: &str) -> Option<Command> {
    // Normalize whitespace
    let t = text.trim();

    // Equity: "buy AAPL 2024-01-01 150.00 10"
    let re_buy = Regex::new(r"(?i)^buy\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)$").unwrap();
    // Equity exit: "sell 3 2024-02-01 160.00" / "amend #3 today 161"
    let re_sell = Regex::new(r"(?i)^(sell|amend)\s+#?(\d+)\s+(\S+)\s+(\S+)$").unwrap();
    // Option open, ten fields
    let re_open = Regex::new(
        r"(?i)^open\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)$",
    )
    .unwrap();
    // Option exit: "close 2 5.00 1500"
    let re_close = Regex::new(r"(?i)^(close|reclose)\s+#?(\d+)\s+(\S+)\s+(\S+)$").unwrap();

    if let Some(c) = re_buy.captures(t) {
        return Some(Command::Buy {
            ticker: c[1].to_string(),
            date: resolve_date(&c[2]),
            price: c[3].to_string(),
            shares: c[4].to_string(),
        });
    }

    if let Some(c) = re_sell.captures(t) {
        let id = TradeId(c[2].parse().ok()?);
        let date = resolve_date(&c[3]);
        let price = c[4].to_string();
        return Some(match &c[1].to_ascii_lowercase()[..] {
            "sell" => Command::Sell { id, date, price },
            _ => Command::Amend { id, date, price },
        });
    }

    if let Some(c) = re_open.captures(t) {
        return Some(Command::Open(OptionFields {
            underlier: c[1].to_string(),
            date: resolve_date(&c[2]),
            expiry: c[3].to_string(),
            option_type: c[4].to_string(),
            open_price: c[5].to_string(),
            strike_price: c[6].to_string(),
            underlier_price: c[7].to_string(),
            premium: c[8].to_string(),
            fee: c[9].to_string(),
            quantity: c[10].to_string(),
        }));
    }

    if let Some(c) = re_close.captures(t) {
        let id = TradeId(c[2].parse().ok()?);
        let price = c[3].to_string();
        let premium = c[4].to_string();
        return Some(match &c[1].to_ascii_lowercase()[..] {
            "close" => Command::Close { id, price, premium },
            _ => Command::Reclose { id, price, premium },
        });
    }

    match &t.to_ascii_lowercase()[..] {
        "stocks" | "ls" => Some(Command::Stocks),
        "options" | "opts" => Some(Command::Options),
        "summary" => Some(Command::Summary),
        "save" => Some(Command::Save),
        "help" | "?" => Some(Command::Help),
        "quit" | "exit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

/// "today" becomes the local calendar date; anything else is kept verbatim.
fn resolve_date(s: &str) -> String {
    if s.eq_ignore_ascii_case("today") {
        Local::now().date_naive().format("%Y-%m-%d").to_string()
    } else {
        s.to_string()
    }
}
