use crate::analysis::ContentSummary;
use adastra_domain::{
    best_round_trip, best_sale, scan_trade_routes, Commodity, Content, ContentFilter, ContentKind, Galaxy, MapCoordinate, PriceSource, RoundTrip,
    SaleOpportunity, Sector, SectorId, Ship, StationClass, TradeRoute, TradeStop,
};
use itertools::Itertools;
use pathfinding::prelude::bfs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// One jump burns fuel proportional to distance, never less than one unit.
pub fn calculate_fuel_cost(distance: f64) -> u32 {
    (distance / 5.0).floor().max(1.0) as u32
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub path: Vec<SectorId>,
    pub jumps: u32,
    pub total_distance: f64,
    pub fuel_needed: u32,
    /// Each jump costs one turn.
    pub turns: u32,
    pub can_afford: bool,
}

#[derive(Debug, Clone)]
pub struct NearestResult<'a> {
    pub sector: &'a Sector,
    pub content: &'a Content,
    /// Straight-line distance, for display; ranking uses `jumps`.
    pub distance: f64,
    pub jumps: u32,
    pub route: Vec<SectorId>,
}

#[derive(Debug, Clone, Copy)]
pub struct SectorInRange<'a> {
    pub sector: &'a Sector,
    pub jumps: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NearbyContact {
    pub sector_id: SectorId,
    pub name: String,
    pub jumps: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SectorAnalysis {
    pub id: SectorId,
    pub connections: usize,
    pub contents: Vec<ContentSummary>,
    pub nearby_planets: usize,
    pub nearby_stations: usize,
    pub nearby_total: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSummary {
    pub current_sector: SectorId,
    pub nearest_planet: Option<NearbyContact>,
    pub nearest_station: Option<NearbyContact>,
    pub nearest_military: Option<NearbyContact>,
    pub nearest_black_market: Option<NearbyContact>,
    pub reachable: usize,
}

/// Read-only pathfinding and lookout over a galaxy graph. Nothing here
/// mutates the galaxy; the borrow makes that structural.
pub struct NavigationComputer<'a> {
    galaxy: &'a Galaxy,
}

impl<'a> NavigationComputer<'a> {
    pub fn new(galaxy: &'a Galaxy) -> Self {
        NavigationComputer { galaxy }
    }

    /// Shortest path by jump count, endpoints inclusive. `None` when the
    /// sectors are disconnected or unknown; generation guarantees a connected
    /// graph, but hand-edited galaxies reach this code too.
    pub fn find_path(&self, start: SectorId, end: SectorId) -> Option<Vec<SectorId>> {
        self.galaxy.sector(start)?;
        self.galaxy.sector(end)?;

        bfs(
            &start,
            |id| self.galaxy.sector(*id).map(|sector| sector.warps.clone()).unwrap_or_default(),
            |id| *id == end,
        )
    }

    /// `find_path` plus jump, distance, and fuel accounting for the travel UI.
    pub fn calculate_route(&self, start: SectorId, end: SectorId, ship: Option<&Ship>) -> Option<Route> {
        let path = self.find_path(start, end)?;
        let jumps = path.len() as u32 - 1;

        let mut total_distance = 0.0;
        let mut fuel_needed = 0;
        for (from, to) in path.iter().tuple_windows() {
            let from = self.galaxy.sector(*from)?;
            let to = self.galaxy.sector(*to)?;
            let distance = from.distance_to(to);
            total_distance += distance;
            fuel_needed += calculate_fuel_cost(distance);
        }

        Some(Route {
            path,
            jumps,
            total_distance,
            fuel_needed,
            turns: jumps,
            can_afford: ship.map(|s| s.fuel >= fuel_needed).unwrap_or(true),
        })
    }

    /// All sectors holding matching content, ranked by actual path length
    /// (not straight-line distance). Unreachable candidates are dropped.
    pub fn find_all_nearest(&self, from: SectorId, filter: &ContentFilter) -> Vec<NearestResult<'a>> {
        let Some(origin) = self.galaxy.sector(from) else { return vec![] };

        let mut results = self
            .galaxy
            .sectors
            .values()
            .filter_map(|sector| {
                let content = sector.contents.iter().find(|c| filter.matches(c))?;
                let route = self.find_path(from, sector.id)?;
                Some(NearestResult {
                    sector,
                    content,
                    distance: origin.distance_to(sector),
                    jumps: route.len() as u32 - 1,
                    route,
                })
            })
            .collect_vec();

        results.sort_by_key(|result| (result.jumps, result.sector.id));
        results
    }

    pub fn find_nearest(&self, from: SectorId, filter: &ContentFilter) -> Option<NearestResult<'a>> {
        self.find_all_nearest(from, filter).into_iter().next()
    }

    /// Layer-by-layer BFS enumeration of everything within `max_jumps`,
    /// tagged with jump distance. The origin itself is excluded.
    pub fn sectors_in_range(&self, from: SectorId, max_jumps: u32) -> Vec<SectorInRange<'a>> {
        if self.galaxy.sector(from).is_none() {
            return vec![];
        }

        let mut results = Vec::new();
        let mut visited: BTreeSet<SectorId> = BTreeSet::from([from]);
        let mut queue: VecDeque<(SectorId, u32)> = VecDeque::from([(from, 0)]);

        while let Some((id, jumps)) = queue.pop_front() {
            if jumps > 0 {
                if let Some(sector) = self.galaxy.sector(id) {
                    results.push(SectorInRange { sector, jumps });
                }
            }

            if jumps < max_jumps {
                if let Some(sector) = self.galaxy.sector(id) {
                    for warp in &sector.warps {
                        if visited.insert(*warp) {
                            queue.push_back((*warp, jumps + 1));
                        }
                    }
                }
            }
        }

        results
    }

    pub fn planets_in_range(&self, from: SectorId, max_jumps: u32) -> Vec<NearestResult<'a>> {
        self.find_all_nearest(from, &ContentFilter::OfKind(ContentKind::Planet))
            .into_iter()
            .filter(|result| result.jumps <= max_jumps)
            .collect_vec()
    }

    pub fn stations_in_range(&self, from: SectorId, max_jumps: u32) -> Vec<NearestResult<'a>> {
        self.find_all_nearest(from, &ContentFilter::OfKind(ContentKind::Station))
            .into_iter()
            .filter(|result| result.jumps <= max_jumps)
            .collect_vec()
    }

    fn trade_stops(&self, from: SectorId, max_jumps: u32) -> Vec<TradeStop<'a>> {
        self.planets_in_range(from, max_jumps)
            .into_iter()
            .filter_map(|result| {
                result.content.as_planet().map(|planet| TradeStop {
                    sector_id: result.sector.id,
                    jumps: result.jumps,
                    planet,
                })
            })
            .collect_vec()
    }

    /// Profitable routes among planets within range, through the canonical
    /// scan in the domain crate.
    pub fn find_trade_routes(&self, from: SectorId, max_jumps: u32, source: PriceSource) -> Vec<TradeRoute> {
        scan_trade_routes(&self.trade_stops(from, max_jumps), source)
    }

    /// Best place to unload what the ship already carries.
    pub fn find_best_sale(&self, from: SectorId, ship: &Ship, max_jumps: u32, source: PriceSource) -> Option<SaleOpportunity> {
        best_sale(&self.trade_stops(from, max_jumps), ship, source)
    }

    /// Best buy-here-sell-there plan for an empty-enough hold.
    pub fn find_best_round_trip(&self, from: SectorId, ship: &Ship, max_jumps: u32, source: PriceSource) -> Option<RoundTrip> {
        best_round_trip(&self.trade_stops(from, max_jumps), ship, source)
    }

    /// Connectivity and neighborhood report for one sector, with tallies over
    /// a three-jump radius.
    pub fn analyze_sector(&self, id: SectorId) -> Option<SectorAnalysis> {
        let sector = self.galaxy.sector(id)?;

        Some(SectorAnalysis {
            id,
            connections: sector.warps.len(),
            contents: sector.contents.iter().map(ContentSummary::from).collect_vec(),
            nearby_planets: self.planets_in_range(id, 3).len(),
            nearby_stations: self.stations_in_range(id, 3).len(),
            nearby_total: self.sectors_in_range(id, 3).len(),
        })
    }

    /// Status readout for the current position: nearest points of interest
    /// and how much is reachable on the ship's remaining fuel.
    pub fn navigation_summary(&self, current: SectorId, ship: Option<&Ship>) -> NavigationSummary {
        let contact = |result: NearestResult| NearbyContact {
            sector_id: result.sector.id,
            name: result.content.name().to_string(),
            jumps: result.jumps,
        };

        let fuel_range = ship.map(|s| s.fuel).unwrap_or(10);

        NavigationSummary {
            current_sector: current,
            nearest_planet: self.find_nearest(current, &ContentFilter::OfKind(ContentKind::Planet)).map(contact),
            nearest_station: self.find_nearest(current, &ContentFilter::OfKind(ContentKind::Station)).map(contact),
            nearest_military: self.find_nearest(current, &ContentFilter::StationOfClass(StationClass::Military)).map(contact),
            nearest_black_market: self.find_nearest(current, &ContentFilter::StationOfClass(StationClass::BlackMarket)).map(contact),
            reachable: self.sectors_in_range(current, fuel_range).len(),
        }
    }

    /// Everywhere a commodity can be bought or sold, nearest first.
    pub fn find_commodity(&self, from: SectorId, commodity: Commodity) -> Vec<NearestResult<'a>> {
        self.find_all_nearest(from, &ContentFilter::TradesCommodity(commodity))
    }
}
