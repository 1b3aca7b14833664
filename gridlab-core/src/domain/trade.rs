//! TradeRecord — one ledger event in the run's trade log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::position::PositionSide;

/// What a trade record did to the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeKind {
    /// Opened a long.
    Buy,
    /// Closed a long on a reversal signal.
    Sell,
    /// Opened a short.
    Short,
    /// Closed a short on a reversal signal.
    Cover,
    /// Forced close of whatever was open after the last bar.
    Close,
}

impl TradeKind {
    pub fn is_entry(&self) -> bool {
        matches!(self, TradeKind::Buy | TradeKind::Short)
    }

    pub fn is_exit(&self) -> bool {
        !self.is_entry()
    }

    /// Position side the ledger holds right after this record.
    pub fn side_after(&self) -> PositionSide {
        match self {
            TradeKind::Buy => PositionSide::Long,
            TradeKind::Short => PositionSide::Short,
            TradeKind::Sell | TradeKind::Cover | TradeKind::Close => PositionSide::Flat,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Buy => "BUY",
            TradeKind::Sell => "SELL",
            TradeKind::Short => "SHORT",
            TradeKind::Cover => "COVER",
            TradeKind::Close => "CLOSE",
        }
    }
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry or exit in chronological order.
///
/// `balance` is the realized balance after this record. Entries carry the
/// balance unchanged; only exits move it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(rename = "type")]
    pub kind: TradeKind,
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub size: f64,
    pub balance: f64,
}

impl TradeRecord {
    pub fn is_entry(&self) -> bool {
        self.kind.is_entry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn side_after_each_kind() {
        assert_eq!(TradeKind::Buy.side_after(), PositionSide::Long);
        assert_eq!(TradeKind::Short.side_after(), PositionSide::Short);
        assert_eq!(TradeKind::Sell.side_after(), PositionSide::Flat);
        assert_eq!(TradeKind::Cover.side_after(), PositionSide::Flat);
        assert_eq!(TradeKind::Close.side_after(), PositionSide::Flat);
    }

    #[test]
    fn kind_serializes_uppercase_under_type_key() {
        let record = TradeRecord {
            kind: TradeKind::Cover,
            bar_index: 3,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
            price: 101.5,
            size: 2.0,
            balance: 1003.0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "COVER");
        assert_eq!(json["balance"], 1003.0);
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(TradeKind::Close.to_string(), "CLOSE");
    }
}
