//! Field-level pattern extractors for natural-language strategy input
//!
//! Each extractor is a pure function from text to a typed value with a
//! fixed fallback. Extractors are evaluated independently and never
//! fail: unmatched input yields the documented default so that the
//! composer always produces a complete strategy.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::StrategyType;

pub const DEFAULT_PAIR: &str = "INJ/USDT";
pub const DEFAULT_INVESTMENT: f64 = 1000.0;
pub const DEFAULT_LOWER_BOUND: f64 = 15.0;
pub const DEFAULT_UPPER_BOUND: f64 = 25.0;
pub const DEFAULT_GRID_COUNT: u32 = 10;
pub const DEFAULT_DURATION_DAYS: u32 = 30;

static PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9]+)/([A-Za-z0-9]+)").unwrap());

/// Investment amount patterns, tried in order; the first match wins.
///
/// The order is load-bearing: currency-suffixed amounts outrank dollar
/// signs, which outrank the contextual verb forms. Do not reorder.
static INVESTMENT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(\d+(?:\.\d+)?)\s*(?:usdt|usd)",
        r"\$\s*(\d+(?:\.\d+)?)",
        r"(?i)invest\s*(\d+(?:\.\d+)?)",
        r"(?i)with\s*(\d+(?:\.\d+)?)\s*(?:usdt|usd)",
        r"(?i)capital\s*(\d+(?:\.\d+)?)",
        r"(?i)amount\s*(\d+(?:\.\d+)?)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static BUY_TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)buy\s*when\s*(?:price\s*)?(?:drops?|falls?)\s*(\d+(?:\.\d+)?)%").unwrap()
});

static SELL_TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)sell\s*(?:when\s*(?:price\s*)?(?:rises?|increases?)\s*|at\s*)\+?(\d+(?:\.\d+)?)%")
        .unwrap()
});

static LOWER_BOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)from\s*\$?\s*(\d+(?:\.\d+)?)").unwrap());

static UPPER_BOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)to\s*\$?\s*(\d+(?:\.\d+)?)").unwrap());

static GRID_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*grids").unwrap());

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*days").unwrap());

/// Optional percentage-based buy/sell triggers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PercentTriggers {
    /// Buy when price drops by this percent
    pub buy: Option<f64>,
    /// Sell when price rises by this percent
    pub sell: Option<f64>,
}

/// Strategy type via case-insensitive substring match against a fixed
/// priority list; first match wins
pub fn extract_strategy_type(text: &str) -> StrategyType {
    let lower = text.to_lowercase();

    if lower.contains("grid") {
        StrategyType::Grid
    } else if lower.contains("dca")
        || lower.contains("dollar-cost")
        || lower.contains("dollar cost")
    {
        StrategyType::Dca
    } else if lower.contains("ma cross") || lower.contains("moving average") {
        StrategyType::MaCross
    } else if lower.contains("rsi") {
        StrategyType::Rsi
    } else if lower.contains("momentum") {
        StrategyType::Momentum
    } else {
        StrategyType::Grid
    }
}

/// Trading pair: first `BASE/QUOTE` shape in the text, upper-cased,
/// falling back to a short allow-list of known pairs
pub fn extract_pair(text: &str) -> String {
    if let Some(m) = PAIR_RE.find(text) {
        return m.as_str().to_uppercase();
    }

    let lower = text.to_lowercase();
    for known in ["inj/usdt", "btc/usdt", "eth/usdt"] {
        if lower.contains(known) {
            return known.to_uppercase();
        }
    }

    DEFAULT_PAIR.to_string()
}

/// Investment amount from the ordered pattern list
pub fn extract_investment(text: &str) -> f64 {
    for re in INVESTMENT_RES.iter() {
        if let Some(caps) = re.captures(text) {
            if let Some(amount) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
                return amount;
            }
        }
    }
    DEFAULT_INVESTMENT
}

/// Independent optional buy-drop and sell-rise percentages
pub fn extract_triggers(text: &str) -> PercentTriggers {
    let capture_pct = |re: &Regex| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    };

    PercentTriggers {
        buy: capture_pct(&BUY_TRIGGER_RE),
        sell: capture_pct(&SELL_TRIGGER_RE),
    }
}

pub fn extract_lower_bound(text: &str) -> f64 {
    extract_number(text, &LOWER_BOUND_RE, DEFAULT_LOWER_BOUND)
}

pub fn extract_upper_bound(text: &str) -> f64 {
    extract_number(text, &UPPER_BOUND_RE, DEFAULT_UPPER_BOUND)
}

pub fn extract_grid_count(text: &str) -> u32 {
    GRID_COUNT_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(DEFAULT_GRID_COUNT)
        .max(1)
}

pub fn extract_duration_days(text: &str) -> u32 {
    DURATION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(DEFAULT_DURATION_DAYS)
        .max(1)
}

/// Single-regex numeric extraction with a fixed fallback
fn extract_number(text: &str, re: &Regex, default: f64) -> f64 {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(default)
}
