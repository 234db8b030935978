use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct SectorId(pub u32);

impl std::fmt::Display for SectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Display, EnumIter)]
pub enum Commodity {
    Ore,
    Organics,
    Equipment,
    Luxury,
    Contraband,
}

impl Commodity {
    pub fn base_price(&self) -> u32 {
        match self {
            Commodity::Ore => 50,
            Commodity::Organics => 30,
            Commodity::Equipment => 100,
            Commodity::Luxury => 250,
            Commodity::Contraband => 500,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Display, EnumIter)]
pub enum PlanetType {
    Desert,
    Forest,
    Industrial,
    Ocean,
    Rocky,
    Urban,
    // only placed by lore injection, never rolled
    Terran,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Display, EnumIter)]
pub enum StationClass {
    Mining,
    Agricultural,
    Industrial,
    Commercial,
    #[serde(rename = "Black Market")]
    #[strum(serialize = "Black Market")]
    BlackMarket,
    Military,
    // lore-only classes
    Diplomatic,
    Shipyard,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Service {
    Repair,
    Refuel,
    Trade,
    Bank,
    Upgrade,
}

/// Stored per commodity per trading location. `supply > 0` marks a producer
/// (cheap to buy), `supply == 0` a consumer (nothing for sale, pays well).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub buy_price: u32,
    pub sell_price: u32,
    pub supply: u32,
}

pub type Economy = BTreeMap<Commodity, PriceRecord>;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Planet {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub planet_type: PlanetType,
    pub specialty: Commodity,
    pub economy: Economy,
    pub population: u32,
    pub tech_level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub name: String,
    pub class: StationClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub specialties: Vec<Commodity>,
    pub services: Vec<Service>,
    pub repair_cost: u32,
    pub refuel_cost: u32,
    pub trading_bonus: f64,
    pub hidden: bool,
    pub defended: bool,
    pub tech_level: u32,
    pub economy: Economy,
}

impl Station {
    pub fn has_service(&self, service: Service) -> bool {
        self.services.contains(&service)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Debris {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything that can occupy a sector. The variants carry only their own
/// fields; callers match instead of sniffing type strings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Planet(Planet),
    Station(Station),
    Debris(Debris),
    Anomaly(Anomaly),
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Display)]
pub enum ContentKind {
    Planet,
    Station,
    Debris,
    Anomaly,
}

impl Content {
    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Planet(_) => ContentKind::Planet,
            Content::Station(_) => ContentKind::Station,
            Content::Debris(_) => ContentKind::Debris,
            Content::Anomaly(_) => ContentKind::Anomaly,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Content::Planet(p) => &p.name,
            Content::Station(s) => &s.name,
            Content::Debris(d) => &d.name,
            Content::Anomaly(a) => &a.name,
        }
    }

    pub fn as_planet(&self) -> Option<&Planet> {
        match self {
            Content::Planet(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_planet_mut(&mut self) -> Option<&mut Planet> {
        match self {
            Content::Planet(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_station(&self) -> Option<&Station> {
        match self {
            Content::Station(s) => Some(s),
            _ => None,
        }
    }

    pub fn economy(&self) -> Option<&Economy> {
        match self {
            Content::Planet(p) => Some(&p.economy),
            Content::Station(s) => Some(&s.economy),
            _ => None,
        }
    }

    pub fn economy_mut(&mut self) -> Option<&mut Economy> {
        match self {
            Content::Planet(p) => Some(&mut p.economy),
            Content::Station(s) => Some(&mut s.economy),
            _ => None,
        }
    }
}

/// Query used by nearest-content searches and sector sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFilter {
    Any,
    OfKind(ContentKind),
    StationOfClass(StationClass),
    TradesCommodity(Commodity),
}

impl ContentFilter {
    pub fn matches(&self, content: &Content) -> bool {
        match self {
            ContentFilter::Any => true,
            ContentFilter::OfKind(kind) => content.kind() == *kind,
            ContentFilter::StationOfClass(class) => content.as_station().map(|s| s.class == *class).unwrap_or(false),
            ContentFilter::TradesCommodity(commodity) => content.economy().map(|eco| eco.contains_key(commodity)).unwrap_or(false),
        }
    }
}

/// Anything with a position on the 100x100 galaxy map.
pub trait MapCoordinate {
    fn x(&self) -> f64;
    fn y(&self) -> f64;

    fn distance_to(&self, other: &impl MapCoordinate) -> f64 {
        euclidean_distance(self.x(), self.y(), other.x(), other.y())
    }
}

pub fn euclidean_distance(from_x: f64, from_y: f64, to_x: f64, to_y: f64) -> f64 {
    let dx = to_x - from_x;
    let dy = to_y - from_y;
    (dx * dx + dy * dy).sqrt()
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub id: SectorId,
    pub x: f64,
    pub y: f64,
    pub warps: Vec<SectorId>,
    pub contents: Vec<Content>,
}

impl MapCoordinate for Sector {
    fn x(&self) -> f64 {
        self.x
    }

    fn y(&self) -> f64 {
        self.y
    }
}

impl Sector {
    pub fn has_content(&self, filter: &ContentFilter) -> bool {
        self.contents.iter().any(|c| filter.matches(c))
    }

    pub fn planet(&self) -> Option<&Planet> {
        self.contents.iter().find_map(|c| c.as_planet())
    }

    pub fn station(&self) -> Option<&Station> {
        self.contents.iter().find_map(|c| c.as_station())
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// The full galaxy record. Plain data: deserializing a stored galaxy yields a
/// fully usable value with no hydration step. Sectors are keyed in id order so
/// sweeps (stats, economy drift) visit them deterministically.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Galaxy {
    pub size: u32,
    pub seed: String,
    pub sectors: BTreeMap<SectorId, Sector>,
    pub created: DateTime<Utc>,
}

impl Galaxy {
    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.sectors.get(&id)
    }

    pub fn sector_mut(&mut self, id: SectorId) -> Option<&mut Sector> {
        self.sectors.get_mut(&id)
    }

    /// Insert the undirected warp lane `a <-> b`, skipping duplicates.
    pub fn add_warp(&mut self, a: SectorId, b: SectorId) {
        if a == b {
            return;
        }
        if let Some(sector) = self.sectors.get_mut(&a) {
            if !sector.warps.contains(&b) {
                sector.warps.push(b);
            }
        }
        if let Some(sector) = self.sectors.get_mut(&b) {
            if !sector.warps.contains(&a) {
                sector.warps.push(a);
            }
        }
    }

    pub fn sectors_with(&self, filter: &ContentFilter) -> impl Iterator<Item = &Sector> {
        let filter = *filter;
        self.sectors.values().filter(move |s| s.has_content(&filter))
    }

    pub fn planet_sectors(&self) -> Vec<&Sector> {
        self.sectors_with(&ContentFilter::OfKind(ContentKind::Planet)).collect()
    }

    pub fn station_sectors(&self) -> Vec<&Sector> {
        self.sectors_with(&ContentFilter::OfKind(ContentKind::Station)).collect()
    }
}

/// The slice of ship state navigation and trade scanning care about. Fuel and
/// cargo live with the caller; the core only reads them.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ship {
    pub fuel: u32,
    pub fuel_capacity: u32,
    pub cargo_capacity: u32,
    pub cargo: BTreeMap<Commodity, u32>,
}

impl Ship {
    pub fn cargo_used(&self) -> u32 {
        self.cargo.values().sum()
    }

    pub fn cargo_space(&self) -> u32 {
        self.cargo_capacity.saturating_sub(self.cargo_used())
    }

    pub fn cargo_amount(&self, commodity: Commodity) -> u32 {
        self.cargo.get(&commodity).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn sample_planet() -> Planet {
        let mut economy = Economy::new();
        economy.insert(
            Commodity::Ore,
            PriceRecord {
                buy_price: 35,
                sell_price: 25,
                supply: 1200,
            },
        );
        economy.insert(
            Commodity::Equipment,
            PriceRecord {
                buy_price: 300,
                sell_price: 140,
                supply: 0,
            },
        );
        Planet {
            name: "Proxima 443".to_string(),
            description: None,
            planet_type: PlanetType::Rocky,
            specialty: Commodity::Ore,
            economy,
            population: 420_000,
            tech_level: 6,
            owner: None,
        }
    }

    #[test]
    fn content_tag_matches_stored_shape() -> Result<()> {
        let content = Content::Planet(sample_planet());
        let json = serde_json::to_value(&content)?;

        assert_eq!(json["type"], "planet");
        assert_eq!(json["planetType"], "Rocky");
        assert_eq!(json["economy"]["Ore"]["buyPrice"], 35);
        Ok(())
    }

    #[test]
    fn content_roundtrips_through_json() -> Result<()> {
        let original = Content::Planet(sample_planet());
        let json = serde_json::to_string(&original)?;
        let restored: Content = serde_json::from_str(&json)?;
        assert_eq!(original, restored);
        Ok(())
    }

    #[test]
    fn black_market_class_uses_spaced_name() -> Result<()> {
        let json = serde_json::to_string(&StationClass::BlackMarket)?;
        assert_eq!(json, "\"Black Market\"");
        assert_eq!(StationClass::BlackMarket.to_string(), "Black Market");
        Ok(())
    }

    #[test]
    fn add_warp_is_symmetric_and_deduplicated() {
        let mut galaxy = Galaxy {
            size: 2,
            seed: "test".to_string(),
            sectors: [
                (
                    SectorId(1),
                    Sector {
                        id: SectorId(1),
                        x: 0.0,
                        y: 0.0,
                        warps: vec![],
                        contents: vec![],
                    },
                ),
                (
                    SectorId(2),
                    Sector {
                        id: SectorId(2),
                        x: 3.0,
                        y: 4.0,
                        warps: vec![],
                        contents: vec![],
                    },
                ),
            ]
            .into_iter()
            .collect(),
            created: chrono::Utc::now(),
        };

        galaxy.add_warp(SectorId(1), SectorId(2));
        galaxy.add_warp(SectorId(2), SectorId(1));
        galaxy.add_warp(SectorId(1), SectorId(1));

        assert_eq!(galaxy.sector(SectorId(1)).unwrap().warps, vec![SectorId(2)]);
        assert_eq!(galaxy.sector(SectorId(2)).unwrap().warps, vec![SectorId(1)]);
    }

    #[test]
    fn distance_between_sectors() {
        let a = Sector {
            id: SectorId(1),
            x: 0.0,
            y: 0.0,
            warps: vec![],
            contents: vec![],
        };
        let b = Sector {
            id: SectorId(2),
            x: 3.0,
            y: 4.0,
            warps: vec![],
            contents: vec![],
        };
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn filter_distinguishes_station_classes() {
        let station = Content::Station(Station {
            name: "Military Nexus 7".to_string(),
            class: StationClass::Military,
            description: None,
            specialties: vec![Commodity::Equipment],
            services: vec![Service::Repair, Service::Refuel, Service::Upgrade],
            repair_cost: 3,
            refuel_cost: 1,
            trading_bonus: 0.8,
            hidden: false,
            defended: true,
            tech_level: 5,
            economy: Economy::new(),
        });

        assert!(ContentFilter::OfKind(ContentKind::Station).matches(&station));
        assert!(ContentFilter::StationOfClass(StationClass::Military).matches(&station));
        assert!(!ContentFilter::StationOfClass(StationClass::Mining).matches(&station));
        assert!(!ContentFilter::TradesCommodity(Commodity::Ore).matches(&station));
    }

    #[test]
    fn ship_cargo_accounting() {
        let ship = Ship {
            fuel: 30,
            fuel_capacity: 50,
            cargo_capacity: 100,
            cargo: [(Commodity::Ore, 40), (Commodity::Organics, 10)].into_iter().collect(),
        };
        assert_eq!(ship.cargo_used(), 50);
        assert_eq!(ship.cargo_space(), 50);
        assert_eq!(ship.cargo_amount(Commodity::Ore), 40);
        assert_eq!(ship.cargo_amount(Commodity::Contraband), 0);
    }
}
