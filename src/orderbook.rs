// Orderbook snapshot and resting-wall detection
// Provides the corroborating-evidence side of level validation

use crate::model::LevelKind;
use serde::{Deserialize, Serialize};

/// Orderbook entry representing a single price level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookLevel {
    /// Price at this level
    pub price: f64,
    /// Quantity resting at this price
    pub quantity: f64,
}

impl OrderBookLevel {
    pub fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }
}

/// Orderbook snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    /// Symbol/market identifier
    pub symbol: String,
    /// Bid orders (buy side) - sorted by price descending
    pub bids: Vec<OrderBookLevel>,
    /// Ask orders (sell side) - sorted by price ascending
    pub asks: Vec<OrderBookLevel>,
    /// Timestamp of the snapshot
    pub timestamp: i64,
}

impl OrderBook {
    pub fn new(
        symbol: String,
        bids: Vec<OrderBookLevel>,
        asks: Vec<OrderBookLevel>,
        timestamp: i64,
    ) -> Self {
        Self {
            symbol,
            bids,
            asks,
            timestamp,
        }
    }

    /// Create from tuple vectors (price, quantity)
    pub fn from_tuples(
        symbol: String,
        bids: Vec<(f64, f64)>,
        asks: Vec<(f64, f64)>,
        timestamp: i64,
    ) -> Self {
        Self {
            symbol,
            bids: bids
                .into_iter()
                .map(|(p, q)| OrderBookLevel::new(p, q))
                .collect(),
            asks: asks
                .into_iter()
                .map(|(p, q)| OrderBookLevel::new(p, q))
                .collect(),
            timestamp,
        }
    }

    /// Get best bid price
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    /// Get best ask price
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    /// Entries on the side that corroborates the given level kind.
    /// Bids back support levels, asks back resistance levels.
    pub fn side_for(&self, kind: LevelKind) -> &[OrderBookLevel] {
        match kind {
            LevelKind::Support => &self.bids,
            LevelKind::Resistance => &self.asks,
        }
    }

    /// Total resting quantity on one side
    pub fn side_quantity(&self, kind: LevelKind) -> f64 {
        self.side_for(kind)
            .iter()
            .filter(|l| l.quantity > 0.0)
            .map(|l| l.quantity)
            .sum()
    }
}

/// A resting order concentration matched against a price level
#[derive(Debug, Clone, Serialize)]
pub struct OrderWall {
    /// Price of the wall
    pub price: f64,
    /// Quantity resting at the wall
    pub quantity: f64,
    /// Wall size as a percentage of its side's total quantity
    pub side_percent: f64,
}

/// Find the largest resting wall near a price, on the side that
/// corroborates the given level kind.
///
/// A wall qualifies only if its price sits within `max_distance_percent`
/// of `level_price` and its quantity is at least `min_wall_percent` of
/// the side's total resting quantity. Returns the largest qualifying
/// wall, or `None` when the book offers no corroboration.
pub fn find_wall_near(
    orderbook: &OrderBook,
    level_price: f64,
    kind: LevelKind,
    max_distance_percent: f64,
    min_wall_percent: f64,
) -> Option<OrderWall> {
    if level_price <= 0.0 {
        return None;
    }

    let side_total = orderbook.side_quantity(kind);
    if side_total <= 0.0 {
        return None;
    }

    orderbook
        .side_for(kind)
        .iter()
        .filter(|entry| entry.quantity > 0.0)
        .filter(|entry| {
            (entry.price - level_price).abs() / level_price * 100.0 <= max_distance_percent
        })
        .map(|entry| OrderWall {
            price: entry.price,
            quantity: entry.quantity,
            side_percent: entry.quantity / side_total * 100.0,
        })
        .filter(|wall| wall.side_percent >= min_wall_percent)
        .max_by(|a, b| {
            a.quantity
                .partial_cmp(&b.quantity)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_orderbook() -> OrderBook {
        OrderBook::from_tuples(
            "TEST".to_string(),
            vec![
                (100.0, 10.0), // Best bid
                (99.5, 60.0),  // Wall
                (99.0, 10.0),
                (98.0, 10.0),
                (97.0, 10.0),
            ],
            vec![
                (101.0, 5.0), // Best ask
                (102.0, 10.0),
                (103.0, 70.0), // Wall
                (104.0, 10.0),
                (105.0, 5.0),
            ],
            0,
        )
    }

    #[test]
    fn test_side_quantity() {
        let ob = create_test_orderbook();
        assert_eq!(ob.side_quantity(LevelKind::Support), 100.0);
        assert_eq!(ob.side_quantity(LevelKind::Resistance), 100.0);
    }

    #[test]
    fn test_find_wall_near_support() {
        let ob = create_test_orderbook();

        let wall = find_wall_near(&ob, 99.4, LevelKind::Support, 0.5, 20.0)
            .expect("bid wall should be found");
        assert_eq!(wall.price, 99.5);
        assert_eq!(wall.quantity, 60.0);
        assert_eq!(wall.side_percent, 60.0);
    }

    #[test]
    fn test_find_wall_near_resistance() {
        let ob = create_test_orderbook();

        let wall = find_wall_near(&ob, 103.1, LevelKind::Resistance, 0.5, 20.0)
            .expect("ask wall should be found");
        assert_eq!(wall.price, 103.0);
        assert_eq!(wall.quantity, 70.0);
    }

    #[test]
    fn test_wall_too_far_is_ignored() {
        let ob = create_test_orderbook();
        // Wall at 99.5 is ~2.5% away from 97.0, beyond the 0.5% tolerance
        let wall = find_wall_near(&ob, 97.0, LevelKind::Support, 0.5, 20.0);
        assert!(wall.is_none() || wall.unwrap().price != 99.5);
    }

    #[test]
    fn test_wall_below_min_percent_is_ignored() {
        let ob = create_test_orderbook();
        // Best bid holds only 10% of the side
        assert!(find_wall_near(&ob, 100.0, LevelKind::Support, 0.1, 20.0).is_none());
    }

    #[test]
    fn test_empty_book() {
        let ob = OrderBook::new("TEST".to_string(), Vec::new(), Vec::new(), 0);
        assert!(find_wall_near(&ob, 100.0, LevelKind::Support, 1.0, 1.0).is_none());
    }
}
