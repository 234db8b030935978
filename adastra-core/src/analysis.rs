use adastra_domain::{Content, ContentFilter, ContentKind, Galaxy, PlanetType, SectorId, StationClass};
use itertools::Itertools;
use petgraph::prelude::UnGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GalaxyStats {
    pub total_sectors: usize,
    pub planets: usize,
    pub stations: usize,
    pub debris: usize,
    pub anomalies: usize,
    pub empty_sectors: usize,
    pub planet_types: BTreeMap<PlanetType, usize>,
    pub station_classes: BTreeMap<StationClass, usize>,
    pub min_connections: usize,
    pub max_connections: usize,
    pub average_connections: f64,
    pub connected_components: usize,
}

/// Tallies over the whole galaxy, the data behind the intel screen.
pub fn galaxy_stats(galaxy: &Galaxy) -> GalaxyStats {
    let mut planets = 0;
    let mut stations = 0;
    let mut debris = 0;
    let mut anomalies = 0;
    let mut empty_sectors = 0;
    let mut planet_types: BTreeMap<PlanetType, usize> = BTreeMap::new();
    let mut station_classes: BTreeMap<StationClass, usize> = BTreeMap::new();

    for sector in galaxy.sectors.values() {
        if sector.is_empty() {
            empty_sectors += 1;
        }

        for content in &sector.contents {
            match content.kind() {
                ContentKind::Planet => planets += 1,
                ContentKind::Station => stations += 1,
                ContentKind::Debris => debris += 1,
                ContentKind::Anomaly => anomalies += 1,
            }
            if let Some(planet) = content.as_planet() {
                *planet_types.entry(planet.planet_type).or_default() += 1;
            }
            if let Some(station) = content.as_station() {
                *station_classes.entry(station.class).or_default() += 1;
            }
        }
    }

    let degrees = galaxy.sectors.values().map(|sector| sector.warps.len()).collect_vec();
    let total_sectors = galaxy.sectors.len();

    GalaxyStats {
        total_sectors,
        planets,
        stations,
        debris,
        anomalies,
        empty_sectors,
        planet_types,
        station_classes,
        min_connections: degrees.iter().min().copied().unwrap_or(0),
        max_connections: degrees.iter().max().copied().unwrap_or(0),
        average_connections: if total_sectors == 0 {
            0.0
        } else {
            degrees.iter().sum::<usize>() as f64 / total_sectors as f64
        },
        connected_components: connected_component_count(galaxy),
    }
}

/// Number of warp-connected components. Generation guarantees 1; anything
/// else means the graph was edited by hand.
pub fn connected_component_count(galaxy: &Galaxy) -> usize {
    let mut graph: UnGraph<SectorId, ()> = UnGraph::new_undirected();

    let mut nodes = HashMap::new();
    for id in galaxy.sectors.keys() {
        nodes.insert(*id, graph.add_node(*id));
    }

    for sector in galaxy.sectors.values() {
        for warp in &sector.warps {
            if sector.id < *warp {
                if let Some(target) = nodes.get(warp) {
                    graph.add_edge(nodes[&sector.id], *target, ());
                }
            }
        }
    }

    petgraph::algo::connected_components(&graph)
}

pub fn is_fully_connected(galaxy: &Galaxy) -> bool {
    connected_component_count(galaxy) <= 1
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub kind: ContentKind,
    pub name: String,
    pub station_class: Option<StationClass>,
}

impl From<&Content> for ContentSummary {
    fn from(content: &Content) -> Self {
        ContentSummary {
            kind: content.kind(),
            name: content.name().to_string(),
            station_class: content.as_station().map(|station| station.class),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectorScan {
    pub id: SectorId,
    pub x: f64,
    pub y: f64,
    pub warp_connections: Vec<SectorId>,
    pub contents: Vec<ContentSummary>,
    pub is_empty: bool,
}

/// Detailed readout of one sector.
pub fn scan_sector(galaxy: &Galaxy, id: SectorId) -> Option<SectorScan> {
    let sector = galaxy.sector(id)?;

    Some(SectorScan {
        id: sector.id,
        x: sector.x,
        y: sector.y,
        warp_connections: sector.warps.clone(),
        contents: sector.contents.iter().map(ContentSummary::from).collect_vec(),
        is_empty: sector.is_empty(),
    })
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentHit {
    pub sector_id: SectorId,
    pub x: f64,
    pub y: f64,
    pub warps: usize,
    pub summary: ContentSummary,
}

/// Every content item matching the filter, in sector order.
pub fn find_sectors_by_type(galaxy: &Galaxy, filter: &ContentFilter) -> Vec<ContentHit> {
    galaxy
        .sectors
        .values()
        .flat_map(|sector| {
            sector.contents.iter().filter(|content| filter.matches(content)).map(|content| ContentHit {
                sector_id: sector.id,
                x: sector.x,
                y: sector.y,
                warps: sector.warps.len(),
                summary: ContentSummary::from(content),
            })
        })
        .collect_vec()
}
