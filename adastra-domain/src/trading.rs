use crate::economy::{daily_price, TradeLocation};
use crate::model::{Commodity, Planet, SectorId, Ship};
use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use strum::IntoEnumIterator;

/// Which price book a trade scan reads. `Static` quotes the stored per-location
/// records (which trade execution mutates); `Daily` quotes the deterministic
/// date-keyed function. Every scanner quotes through [`quote`], so the two
/// books cannot drift apart between features; callers pick one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Static,
    Daily(NaiveDate),
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub buy_price: u32,
    pub sell_price: u32,
}

pub fn quote(location: &dyn TradeLocation, commodity: Commodity, source: PriceSource) -> Option<Quote> {
    match source {
        PriceSource::Static => location.economy().get(&commodity).map(|record| Quote {
            buy_price: record.buy_price,
            sell_price: record.sell_price,
        }),
        PriceSource::Daily(date) => daily_price(location, commodity, date).map(|price| Quote {
            buy_price: price.buy_price,
            sell_price: price.sell_price,
        }),
    }
}

/// A reachable planet as seen from the scan origin. The navigation layer
/// produces these from BFS jump counts; the scan itself stays graph-free.
#[derive(Debug, Clone, Copy)]
pub struct TradeStop<'a> {
    pub sector_id: SectorId,
    pub jumps: u32,
    pub planet: &'a Planet,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TradeRoute {
    pub commodity: Commodity,
    pub from_sector: SectorId,
    pub from_planet: String,
    pub to_sector: SectorId,
    pub to_planet: String,
    pub buy_price: u32,
    pub sell_price: u32,
    pub profit_per_unit: u32,
    pub total_jumps: u32,
}

const MAX_ROUTES: usize = 10;

/// Every profitable directed pair among the given stops, best first, top 10.
/// The one profit rule used everywhere: buy at the source's buy price, sell
/// at the destination's sell price.
pub fn scan_trade_routes(stops: &[TradeStop], source: PriceSource) -> Vec<TradeRoute> {
    let mut routes = Vec::new();

    for (a, b) in stops.iter().tuple_combinations() {
        for commodity in Commodity::iter() {
            if let Some(route) = directed_route(a, b, commodity, source) {
                routes.push(route);
            }
            if let Some(route) = directed_route(b, a, commodity, source) {
                routes.push(route);
            }
        }
    }

    routes
        .into_iter()
        .sorted_by_key(|route| (Reverse(route.profit_per_unit), route.from_sector, route.to_sector, route.commodity))
        .take(MAX_ROUTES)
        .collect_vec()
}

fn directed_route(from: &TradeStop, to: &TradeStop, commodity: Commodity, source: PriceSource) -> Option<TradeRoute> {
    let buy = quote(from.planet, commodity, source)?;
    let sell = quote(to.planet, commodity, source)?;

    let profit = sell.sell_price as i64 - buy.buy_price as i64;
    if profit <= 0 {
        return None;
    }

    Some(TradeRoute {
        commodity,
        from_sector: from.sector_id,
        from_planet: from.planet.name.clone(),
        to_sector: to.sector_id,
        to_planet: to.planet.name.clone(),
        buy_price: buy.buy_price,
        sell_price: sell.sell_price,
        profit_per_unit: profit as u32,
        total_jumps: from.jumps + to.jumps,
    })
}

/// Best place among the stops to unload cargo the ship already holds.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaleOpportunity {
    pub sector_id: SectorId,
    pub planet: String,
    pub commodity: Commodity,
    pub quantity: u32,
    pub sell_price: u32,
    pub total_revenue: u64,
    pub jumps: u32,
}

pub fn best_sale(stops: &[TradeStop], ship: &Ship, source: PriceSource) -> Option<SaleOpportunity> {
    let mut best: Option<SaleOpportunity> = None;

    for (commodity, quantity) in ship.cargo.iter().filter(|(_, quantity)| **quantity > 0) {
        for stop in stops {
            let Some(prices) = quote(stop.planet, *commodity, source) else { continue };
            let total_revenue = prices.sell_price as u64 * *quantity as u64;

            if best.as_ref().map(|b| total_revenue > b.total_revenue).unwrap_or(true) {
                best = Some(SaleOpportunity {
                    sector_id: stop.sector_id,
                    planet: stop.planet.name.clone(),
                    commodity: *commodity,
                    quantity: *quantity,
                    sell_price: prices.sell_price,
                    total_revenue,
                    jumps: stop.jumps,
                });
            }
        }
    }

    best
}

/// A full buy-here-sell-there plan for one cargo load.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundTrip {
    pub commodity: Commodity,
    pub buy_sector: SectorId,
    pub buy_planet: String,
    pub sell_sector: SectorId,
    pub sell_planet: String,
    pub quantity: u32,
    pub buy_price: u32,
    pub sell_price: u32,
    pub investment: u64,
    pub revenue: u64,
    pub profit: i64,
    pub total_jumps: u32,
    pub profit_per_jump: i64,
}

/// Pick the pairing that maximizes profit per jump for a load bounded by hold
/// space and the source's persistent supply. Supply is always read from the
/// static book even under daily quoting; daily prices ignore depletion but
/// depletion still caps how much can be bought.
pub fn best_round_trip(stops: &[TradeStop], ship: &Ship, source: PriceSource) -> Option<RoundTrip> {
    let mut best: Option<(f64, RoundTrip)> = None;

    for buy_stop in stops {
        for (commodity, record) in buy_stop.planet.economy.iter() {
            let Some(buy) = quote(buy_stop.planet, *commodity, source) else { continue };

            let quantity = ship.cargo_space().min(record.supply);
            if quantity == 0 {
                continue;
            }

            for sell_stop in stops {
                if sell_stop.sector_id == buy_stop.sector_id {
                    continue;
                }
                let Some(sell) = quote(sell_stop.planet, *commodity, source) else { continue };

                let profit = (sell.sell_price as i64 - buy.buy_price as i64) * quantity as i64;
                if profit <= 0 {
                    continue;
                }

                let total_jumps = buy_stop.jumps + sell_stop.jumps;
                let ratio = profit as f64 / total_jumps.max(1) as f64;

                if best.as_ref().map(|(best_ratio, _)| ratio > *best_ratio).unwrap_or(true) {
                    best = Some((
                        ratio,
                        RoundTrip {
                            commodity: *commodity,
                            buy_sector: buy_stop.sector_id,
                            buy_planet: buy_stop.planet.name.clone(),
                            sell_sector: sell_stop.sector_id,
                            sell_planet: sell_stop.planet.name.clone(),
                            quantity,
                            buy_price: buy.buy_price,
                            sell_price: sell.sell_price,
                            investment: buy.buy_price as u64 * quantity as u64,
                            revenue: sell.sell_price as u64 * quantity as u64,
                            profit,
                            total_jumps,
                            profit_per_jump: profit / total_jumps.max(1) as i64,
                        },
                    ));
                }
            }
        }
    }

    best.map(|(_, trip)| trip)
}
