use crate::model::{Commodity, Content, Economy, Galaxy, Planet, Station};
use crate::rng::SeededRandom;
use chrono::{NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// A location goods can be bought and sold at. Planets and stations price
/// identically through this view; only the specialty rule differs (planets
/// have one specialty, stations a list).
pub trait TradeLocation {
    fn trade_name(&self) -> &str;
    fn is_specialty(&self, commodity: Commodity) -> bool;
    fn economy(&self) -> &Economy;
}

impl TradeLocation for Planet {
    fn trade_name(&self) -> &str {
        &self.name
    }

    fn is_specialty(&self, commodity: Commodity) -> bool {
        self.specialty == commodity
    }

    fn economy(&self) -> &Economy {
        &self.economy
    }
}

impl TradeLocation for Station {
    fn trade_name(&self) -> &str {
        &self.name
    }

    fn is_specialty(&self, commodity: Commodity) -> bool {
        self.specialties.contains(&commodity)
    }

    fn economy(&self) -> &Economy {
        &self.economy
    }
}

impl Content {
    pub fn trade_location(&self) -> Option<&dyn TradeLocation> {
        match self {
            Content::Planet(p) => Some(p),
            Content::Station(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyPrice {
    pub buy_price: u32,
    pub sell_price: u32,
}

/// Deterministic date-keyed price: the same (date, location, commodity) gives
/// the same quote in every process, which is what keeps concurrent clients in
/// agreement without a server round-trip. Deliberately independent of the
/// stored supply/price fields. Returns `None` when the location does not
/// trade the commodity.
pub fn daily_price(location: &dyn TradeLocation, commodity: Commodity, date: NaiveDate) -> Option<DailyPrice> {
    location.economy().get(&commodity)?;

    // ISO date in the seed; locale-formatted dates would fork the price
    // stream between differently-configured clients.
    let seed = format!("{}-{}-{}", date.format("%Y-%m-%d"), location.trade_name(), commodity);
    let mut rng = SeededRandom::new(&seed);

    let mut base = commodity.base_price() as f64;
    if location.is_specialty(commodity) {
        base *= 0.7;
    } else {
        base *= rng.float(0.8, 1.5);
    }

    let buy_price = (base * rng.float(1.1, 1.3)).round() as u32;
    let sell_price = (base * rng.float(0.7, 0.9)).round() as u32;

    Some(DailyPrice { buy_price, sell_price })
}

/// `daily_price` keyed to the current UTC calendar day.
pub fn daily_price_today(location: &dyn TradeLocation, commodity: Commodity) -> Option<DailyPrice> {
    daily_price(location, commodity, Utc::now().date_naive())
}

/// Today's quotes for every commodity the location trades.
pub fn location_prices(location: &dyn TradeLocation, date: NaiveDate) -> BTreeMap<Commodity, DailyPrice> {
    location
        .economy()
        .keys()
        .filter_map(|commodity| daily_price(location, *commodity, date).map(|price| (*commodity, price)))
        .collect()
}

/// One drift tick of the static economy: every stored price moves up to 5%
/// either way, then is pulled back inside its clamp band. This is the slow
/// mutable counterpart of `daily_price` and tracks actual depletion instead
/// of fairness.
pub fn update_economy(galaxy: &mut Galaxy, rng: &mut impl Rng) {
    let mut entries = 0usize;

    for sector in galaxy.sectors.values_mut() {
        for content in sector.contents.iter_mut() {
            let Some(economy) = content.economy_mut() else { continue };

            for (commodity, record) in economy.iter_mut() {
                let base = commodity.base_price() as f64;

                let drifted_buy = (record.buy_price as f64 * rng.gen_range(0.95..1.05)).round();
                record.buy_price = drifted_buy.clamp(base * 0.3, base * 2.0) as u32;

                let drifted_sell = (record.sell_price as f64 * rng.gen_range(0.95..1.05)).round();
                record.sell_price = drifted_sell.clamp(base * 0.3, base * 1.5) as u32;

                entries += 1;
            }
        }
    }

    debug!(entries, "economy drift tick");
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeError {
    #[error("{commodity} is not traded here")]
    NotTraded { commodity: Commodity },
    #[error("only {available} units of {commodity} available")]
    InsufficientSupply { commodity: Commodity, available: u32 },
}

/// Deduct purchased units from the location's stored supply. Credit and cargo
/// checks belong to the caller; the core only guards the supply invariant.
pub fn record_purchase(economy: &mut Economy, commodity: Commodity, quantity: u32) -> Result<(), TradeError> {
    let record = economy.get_mut(&commodity).ok_or(TradeError::NotTraded { commodity })?;
    if record.supply < quantity {
        return Err(TradeError::InsufficientSupply {
            commodity,
            available: record.supply,
        });
    }
    record.supply -= quantity;
    Ok(())
}

/// Add sold units to the location's stored supply.
pub fn record_sale(economy: &mut Economy, commodity: Commodity, quantity: u32) -> Result<(), TradeError> {
    let record = economy.get_mut(&commodity).ok_or(TradeError::NotTraded { commodity })?;
    record.supply = record.supply.saturating_add(quantity);
    Ok(())
}

/// Per-commodity market screen data: today's quote joined with persistent
/// supply and the player's holdings.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommodityListing {
    pub commodity: Commodity,
    pub buy_price: u32,
    pub sell_price: u32,
    pub supply: u32,
    pub player_has: u32,
    pub spread: i64,
}

pub fn trading_info(location: &dyn TradeLocation, player_cargo: &BTreeMap<Commodity, u32>, date: NaiveDate) -> Vec<CommodityListing> {
    location
        .economy()
        .iter()
        .filter_map(|(commodity, record)| {
            let prices = daily_price(location, *commodity, date)?;
            Some(CommodityListing {
                commodity: *commodity,
                buy_price: prices.buy_price,
                sell_price: prices.sell_price,
                supply: record.supply,
                player_has: player_cargo.get(commodity).copied().unwrap_or(0),
                spread: prices.buy_price as i64 - prices.sell_price as i64,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PlanetType, PriceRecord, Sector, SectorId};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    fn producer_record() -> PriceRecord {
        PriceRecord {
            buy_price: 35,
            sell_price: 25,
            supply: 1000,
        }
    }

    fn consumer_record(base: u32) -> PriceRecord {
        PriceRecord {
            buy_price: base * 3,
            sell_price: (base as f64 * 1.4).round() as u32,
            supply: 0,
        }
    }

    fn ore_planet() -> Planet {
        let mut economy = Economy::new();
        economy.insert(Commodity::Ore, producer_record());
        economy.insert(Commodity::Organics, consumer_record(30));
        economy.insert(Commodity::Equipment, consumer_record(100));
        Planet {
            name: "Kepler Station 77".to_string(),
            description: None,
            planet_type: PlanetType::Rocky,
            specialty: Commodity::Ore,
            economy,
            population: 50_000,
            tech_level: 4,
            owner: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_price_is_idempotent() {
        let planet = ore_planet();
        let first = daily_price(&planet, Commodity::Ore, date(2024, 1, 1)).unwrap();

        for _ in 0..1000 {
            let again = daily_price(&planet, Commodity::Ore, date(2024, 1, 1)).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn daily_price_changes_with_the_date() {
        let planet = ore_planet();
        // non-specialty commodity so the daily variance roll is in play
        let monday = daily_price(&planet, Commodity::Organics, date(2024, 1, 1)).unwrap();
        let tuesday = daily_price(&planet, Commodity::Organics, date(2024, 1, 2)).unwrap();
        assert_ne!(monday, tuesday);
    }

    #[test]
    fn daily_price_changes_with_the_location_name() {
        let planet = ore_planet();
        let mut other = ore_planet();
        other.name = "Kepler Station 78".to_string();

        let here = daily_price(&planet, Commodity::Organics, date(2024, 1, 1)).unwrap();
        let there = daily_price(&other, Commodity::Organics, date(2024, 1, 1)).unwrap();
        assert_ne!(here, there);
    }

    #[test]
    fn specialty_stays_below_base_price() {
        let planet = ore_planet();
        let base = Commodity::Ore.base_price();

        // 0.7 discount times at most 1.3 buy spread keeps the quote under base
        for day in 1..=28 {
            let price = daily_price(&planet, Commodity::Ore, date(2024, 2, day)).unwrap();
            assert!(price.buy_price < base, "day {day}: {} >= {base}", price.buy_price);
            assert!(price.sell_price < price.buy_price);
        }
    }

    #[test]
    fn untraded_commodity_has_no_price() {
        let planet = ore_planet();
        assert_eq!(daily_price(&planet, Commodity::Contraband, date(2024, 1, 1)), None);
    }

    #[test]
    fn station_specialty_uses_specialties_list() {
        let mut economy = Economy::new();
        economy.insert(Commodity::Ore, producer_record());
        let station = Station {
            name: "Mining Haven 12".to_string(),
            class: crate::model::StationClass::Mining,
            description: None,
            specialties: vec![Commodity::Ore],
            services: vec![crate::model::Service::Trade],
            repair_cost: 6,
            refuel_cost: 2,
            trading_bonus: 1.2,
            hidden: false,
            defended: false,
            tech_level: 2,
            economy,
        };

        let base = Commodity::Ore.base_price();
        let price = daily_price(&station, Commodity::Ore, date(2024, 1, 1)).unwrap();
        assert!(price.buy_price < base);
    }

    #[test]
    fn drift_stays_inside_clamp_bands() {
        let planet = ore_planet();
        let mut galaxy = Galaxy {
            size: 1,
            seed: "drift".to_string(),
            sectors: [(
                SectorId(1),
                Sector {
                    id: SectorId(1),
                    x: 10.0,
                    y: 10.0,
                    warps: vec![],
                    contents: vec![Content::Planet(planet)],
                },
            )]
            .into_iter()
            .collect(),
            created: Utc::now(),
        };

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            update_economy(&mut galaxy, &mut rng);
        }

        let economy = galaxy.sector(SectorId(1)).unwrap().planet().unwrap().economy.clone();
        for (commodity, record) in economy {
            let base = commodity.base_price() as f64;
            assert!(record.buy_price as f64 >= base * 0.3, "{commodity} buy {}", record.buy_price);
            assert!(record.buy_price as f64 <= base * 2.0, "{commodity} buy {}", record.buy_price);
            assert!(record.sell_price as f64 >= base * 0.3, "{commodity} sell {}", record.sell_price);
            assert!(record.sell_price as f64 <= base * 1.5, "{commodity} sell {}", record.sell_price);
        }
    }

    #[test]
    fn drift_leaves_supply_untouched() {
        let planet = ore_planet();
        let before = planet.economy.get(&Commodity::Ore).unwrap().supply;
        let mut galaxy = Galaxy {
            size: 1,
            seed: "drift-supply".to_string(),
            sectors: [(
                SectorId(1),
                Sector {
                    id: SectorId(1),
                    x: 0.0,
                    y: 0.0,
                    warps: vec![],
                    contents: vec![Content::Planet(planet)],
                },
            )]
            .into_iter()
            .collect(),
            created: Utc::now(),
        };

        update_economy(&mut galaxy, &mut StdRng::seed_from_u64(1));
        let after = galaxy.sector(SectorId(1)).unwrap().planet().unwrap().economy.get(&Commodity::Ore).unwrap().supply;
        assert_eq!(before, after);
    }

    #[test]
    fn purchases_deplete_and_sales_replenish_supply() {
        let mut planet = ore_planet();

        record_purchase(&mut planet.economy, Commodity::Ore, 400).unwrap();
        assert_eq!(planet.economy.get(&Commodity::Ore).unwrap().supply, 600);

        record_sale(&mut planet.economy, Commodity::Ore, 50).unwrap();
        assert_eq!(planet.economy.get(&Commodity::Ore).unwrap().supply, 650);

        let err = record_purchase(&mut planet.economy, Commodity::Ore, 10_000).unwrap_err();
        assert_eq!(
            err,
            TradeError::InsufficientSupply {
                commodity: Commodity::Ore,
                available: 650
            }
        );

        let err = record_purchase(&mut planet.economy, Commodity::Contraband, 1).unwrap_err();
        assert_eq!(err, TradeError::NotTraded { commodity: Commodity::Contraband });
    }

    #[test]
    fn trading_info_joins_quotes_supply_and_cargo() {
        let planet = ore_planet();
        let cargo: BTreeMap<Commodity, u32> = [(Commodity::Ore, 12)].into_iter().collect();

        let info = trading_info(&planet, &cargo, date(2024, 3, 15));
        assert_eq!(info.len(), 3);

        let ore = info.iter().find(|listing| listing.commodity == Commodity::Ore).unwrap();
        assert_eq!(ore.supply, 1000);
        assert_eq!(ore.player_has, 12);

        let expected = daily_price(&planet, Commodity::Ore, date(2024, 3, 15)).unwrap();
        assert_eq!(ore.buy_price, expected.buy_price);
        assert_eq!(ore.sell_price, expected.sell_price);
    }
}
