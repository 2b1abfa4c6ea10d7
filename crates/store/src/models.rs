//! Row types mapping domain entities onto their table layouts.
//!
//! Enums travel as lowercase text columns; conversions back into domain
//! types fail loudly on values the schema should have rejected.

use anyhow::{bail, Result};
use bazaar_core::types::{
    AuctionResult, Bid, Item, ItemStatus, MarketData, PricePoint, PriceSource, Rarity,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRecord {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub rarity: String,
    pub base_price: Decimal,
    pub current_bid: Decimal,
    pub buyout_price: Option<Decimal>,
    pub seller_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl ItemRecord {
    pub fn into_domain(self) -> Result<Item> {
        Ok(Item {
            id: self.id,
            name: self.name,
            category: self.category,
            rarity: rarity_from_str(&self.rarity)?,
            base_price: self.base_price,
            current_bid: self.current_bid,
            buyout_price: self.buyout_price,
            seller_id: self.seller_id,
            status: status_from_str(&self.status)?,
            created_at: self.created_at,
            end_time: self.end_time,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BidRecord {
    pub id: Uuid,
    pub item_id: Uuid,
    pub bidder_id: Uuid,
    pub amount: Decimal,
    pub placed_at: DateTime<Utc>,
    pub is_winning: bool,
}

impl From<BidRecord> for Bid {
    fn from(record: BidRecord) -> Self {
        Self {
            id: record.id,
            item_id: record.item_id,
            bidder_id: record.bidder_id,
            amount: record.amount,
            placed_at: record.placed_at,
            is_winning: record.is_winning,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MarketDataRecord {
    pub category: String,
    pub average_price: Decimal,
    pub median_price: Decimal,
    pub price_std_dev: Decimal,
    pub supply_velocity: f64,
    pub demand_velocity: f64,
    pub price_elasticity: f64,
    pub saturation: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<MarketDataRecord> for MarketData {
    fn from(record: MarketDataRecord) -> Self {
        Self {
            category: record.category,
            average_price: record.average_price,
            median_price: record.median_price,
            price_std_dev: record.price_std_dev,
            supply_velocity: record.supply_velocity,
            demand_velocity: record.demand_velocity,
            price_elasticity: record.price_elasticity,
            saturation: record.saturation,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PricePointRecord {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub volume: i64,
    pub source: String,
}

impl PricePointRecord {
    pub fn into_domain(self) -> Result<PricePoint> {
        Ok(PricePoint {
            timestamp: self.timestamp,
            price: self.price,
            volume: self.volume,
            source: source_from_str(&self.source)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuctionResultRecord {
    pub item_id: Uuid,
    pub final_price: Decimal,
    pub winner: Option<Uuid>,
    pub bid_count: i32,
    pub price_efficiency: f64,
    pub market_impact: f64,
    pub closed_at: DateTime<Utc>,
}

impl From<AuctionResultRecord> for AuctionResult {
    fn from(record: AuctionResultRecord) -> Self {
        Self {
            item_id: record.item_id,
            final_price: record.final_price,
            winner: record.winner,
            bid_count: record.bid_count,
            price_efficiency: record.price_efficiency,
            market_impact: record.market_impact,
            closed_at: record.closed_at,
        }
    }
}

pub fn rarity_to_str(rarity: Rarity) -> &'static str {
    match rarity {
        Rarity::Common => "common",
        Rarity::Uncommon => "uncommon",
        Rarity::Rare => "rare",
        Rarity::Epic => "epic",
        Rarity::Legendary => "legendary",
    }
}

pub fn rarity_from_str(value: &str) -> Result<Rarity> {
    Ok(match value {
        "common" => Rarity::Common,
        "uncommon" => Rarity::Uncommon,
        "rare" => Rarity::Rare,
        "epic" => Rarity::Epic,
        "legendary" => Rarity::Legendary,
        other => bail!("unknown rarity {other:?} in store"),
    })
}

pub fn status_to_str(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Active => "active",
        ItemStatus::Sold => "sold",
        ItemStatus::Cancelled => "cancelled",
    }
}

pub fn status_from_str(value: &str) -> Result<ItemStatus> {
    Ok(match value {
        "active" => ItemStatus::Active,
        "sold" => ItemStatus::Sold,
        "cancelled" => ItemStatus::Cancelled,
        other => bail!("unknown item status {other:?} in store"),
    })
}

pub fn source_to_str(source: PriceSource) -> &'static str {
    match source {
        PriceSource::Bid => "bid",
        PriceSource::Market => "market",
        PriceSource::Algorithm => "algorithm",
    }
}

pub fn source_from_str(value: &str) -> Result<PriceSource> {
    Ok(match value {
        "bid" => PriceSource::Bid,
        "market" => PriceSource::Market,
        "algorithm" => PriceSource::Algorithm,
        other => bail!("unknown price source {other:?} in store"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_text_round_trips() {
        for rarity in [
            Rarity::Common,
            Rarity::Uncommon,
            Rarity::Rare,
            Rarity::Epic,
            Rarity::Legendary,
        ] {
            assert_eq!(rarity_from_str(rarity_to_str(rarity)).unwrap(), rarity);
        }
        for status in [ItemStatus::Active, ItemStatus::Sold, ItemStatus::Cancelled] {
            assert_eq!(status_from_str(status_to_str(status)).unwrap(), status);
        }
        for source in [PriceSource::Bid, PriceSource::Market, PriceSource::Algorithm] {
            assert_eq!(source_from_str(source_to_str(source)).unwrap(), source);
        }
    }

    #[test]
    fn unknown_text_is_rejected() {
        assert!(rarity_from_str("mythic").is_err());
        assert!(status_from_str("archived").is_err());
        assert!(source_from_str("oracle").is_err());
    }
}
