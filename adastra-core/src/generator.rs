use adastra_domain::{
    euclidean_distance, Anomaly, Commodity, Content, Debris, Economy, Galaxy, Planet, PlanetType, PriceRecord, Sector, SectorId, SeededRandom, Service, Station,
    StationClass,
};
use chrono::Utc;
use itertools::Itertools;
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, BTreeSet};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationError {
    #[error("galaxy size must be at least 1, got {0}")]
    InvalidSize(u32),
}

/// Tunables for procedural generation. Passed in explicitly so tests can pin
/// them; the defaults match the shipped game balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorConfig {
    pub planet_chance: f64,
    pub station_chance: f64,
    pub debris_chance: f64,
    /// Shortcut edges added after the spanning pass, as a fraction of size.
    pub extra_edge_ratio: f64,
    /// Shortcut candidates farther apart than this are discarded.
    pub shortcut_max_distance: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            planet_chance: 0.25,
            station_chance: 0.15,
            debris_chance: 0.2,
            extra_edge_ratio: 0.5,
            shortcut_max_distance: 30.0,
        }
    }
}

const PLANET_ARCHETYPES: [(PlanetType, Commodity); 6] = [
    (PlanetType::Desert, Commodity::Ore),
    (PlanetType::Forest, Commodity::Organics),
    (PlanetType::Industrial, Commodity::Equipment),
    (PlanetType::Ocean, Commodity::Organics),
    (PlanetType::Rocky, Commodity::Ore),
    (PlanetType::Urban, Commodity::Equipment),
];

const PLANET_NAMES: [&str; 12] = [
    "Alpha Prime",
    "Beta Station",
    "Gamma Outpost",
    "Delta World",
    "Epsilon Colony",
    "Zeta Haven",
    "Theta Base",
    "Nova Terra",
    "Proxima",
    "Kepler Station",
    "Titan Outpost",
    "Europa Base",
];

const STATION_NAMES: [&str; 12] = [
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Omega", "Nova", "Nexus", "Haven", "Outpost", "Station",
];

struct StationArchetype {
    class: StationClass,
    specialties: &'static [Commodity],
    services: &'static [Service],
    description: &'static str,
    repair_cost: u32,
    refuel_cost: u32,
    trading_bonus: f64,
    hidden: bool,
    defended: bool,
    tech_level: u32,
}

const STATION_ARCHETYPES: [StationArchetype; 6] = [
    StationArchetype {
        class: StationClass::Mining,
        specialties: &[Commodity::Ore],
        services: &[Service::Repair, Service::Refuel, Service::Trade],
        description: "A rough-and-tumble mining outpost dealing primarily in raw materials",
        repair_cost: 6,
        refuel_cost: 2,
        trading_bonus: 1.2,
        hidden: false,
        defended: false,
        tech_level: 2,
    },
    StationArchetype {
        class: StationClass::Agricultural,
        specialties: &[Commodity::Organics],
        services: &[Service::Repair, Service::Refuel, Service::Trade],
        description: "An agricultural station with hydroponic farms and bio-domes",
        repair_cost: 5,
        refuel_cost: 2,
        trading_bonus: 1.2,
        hidden: false,
        defended: false,
        tech_level: 2,
    },
    StationArchetype {
        class: StationClass::Industrial,
        specialties: &[Commodity::Equipment],
        services: &[Service::Repair, Service::Refuel, Service::Trade, Service::Upgrade],
        description: "A high-tech industrial complex specializing in equipment and ship parts",
        repair_cost: 4,
        refuel_cost: 2,
        trading_bonus: 1.2,
        hidden: false,
        defended: false,
        tech_level: 4,
    },
    StationArchetype {
        class: StationClass::Commercial,
        specialties: &[Commodity::Ore, Commodity::Organics, Commodity::Equipment],
        services: &[Service::Repair, Service::Refuel, Service::Trade, Service::Bank],
        description: "A bustling commercial hub with general trading facilities",
        repair_cost: 5,
        refuel_cost: 2,
        trading_bonus: 1.0,
        hidden: false,
        defended: false,
        tech_level: 3,
    },
    StationArchetype {
        class: StationClass::BlackMarket,
        specialties: &[Commodity::Contraband],
        services: &[Service::Refuel, Service::Trade],
        description: "A secretive outpost dealing in illegal goods - no questions asked",
        repair_cost: 8,
        refuel_cost: 3,
        trading_bonus: 1.5,
        hidden: true,
        defended: false,
        tech_level: 2,
    },
    StationArchetype {
        class: StationClass::Military,
        specialties: &[Commodity::Equipment],
        services: &[Service::Repair, Service::Refuel, Service::Upgrade],
        description: "A fortified military outpost with advanced repair facilities",
        repair_cost: 3,
        refuel_cost: 1,
        trading_bonus: 0.8,
        hidden: false,
        defended: true,
        tech_level: 5,
    },
];

/// Builds galaxies from a seed string. The entire sector layout, contents,
/// lore placement, and connectivity derive from that one seed; generating
/// twice with the same seed and size yields identical galaxies.
#[derive(Debug, Clone, Default)]
pub struct GalaxyGenerator {
    config: GeneratorConfig,
}

impl GalaxyGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        GalaxyGenerator { config }
    }

    /// The only nondeterministic entry point is an omitted seed, which draws a
    /// fresh UUID; the chosen seed is recorded on the result so regeneration
    /// is reproducible.
    pub fn generate(&self, size: u32, seed: Option<&str>) -> Result<Galaxy, GenerationError> {
        if size == 0 {
            return Err(GenerationError::InvalidSize(size));
        }

        let seed = seed.map(str::to_string).unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        info!(size, seed = %seed, "generating galaxy");

        let mut rng = SeededRandom::new(&seed);

        let mut sectors: BTreeMap<SectorId, Sector> = (1..=size).map(|id| (SectorId(id), self.create_sector(SectorId(id), &mut rng))).collect();

        self.inject_lore(&mut sectors, size, &mut rng);

        let mut galaxy = Galaxy {
            size,
            seed,
            sectors,
            created: Utc::now(),
        };

        self.connect_sectors(&mut galaxy, &mut rng);

        info!(size = galaxy.size, "galaxy generated");
        Ok(galaxy)
    }

    // Roll order is part of the determinism contract: x, y, planet, station,
    // debris. Every chance roll consumes the stream whether or not it lands.
    fn create_sector(&self, id: SectorId, rng: &mut SeededRandom) -> Sector {
        let x = rng.float(0.0, 100.0);
        let y = rng.float(0.0, 100.0);

        let mut contents = Vec::new();

        if rng.chance(self.config.planet_chance) {
            contents.push(Content::Planet(self.generate_planet(rng)));
        }

        if rng.chance(self.config.station_chance) {
            contents.push(Content::Station(self.generate_station(rng)));
        }

        if rng.chance(self.config.debris_chance) && contents.is_empty() {
            contents.push(Content::Debris(Debris {
                name: "Asteroid Field".to_string(),
                description: Some("Scattered asteroids that could be mined for resources".to_string()),
            }));
        }

        Sector {
            id,
            x,
            y,
            warps: vec![],
            contents,
        }
    }

    fn generate_planet(&self, rng: &mut SeededRandom) -> Planet {
        let (planet_type, specialty) = *rng.choice(&PLANET_ARCHETYPES);
        let name = format!("{} {}", rng.choice(&PLANET_NAMES), rng.int(1, 999));
        let population = rng.int(1000, 1_000_000) as u32;
        let tech_level = rng.int(1, 10) as u32;

        // Strict producer/consumer split: the specialty is abundant and cheap,
        // everything else has no stock and pays a premium. Contraband never
        // appears on ordinary planets.
        let mut economy = Economy::new();
        for commodity in Commodity::iter() {
            if commodity == Commodity::Contraband {
                continue;
            }

            let base = commodity.base_price() as f64;
            let record = if commodity == specialty {
                PriceRecord {
                    buy_price: (base * 0.7).round() as u32,
                    sell_price: (base * 0.5).round() as u32,
                    supply: rng.int(500, 2000) as u32,
                }
            } else {
                PriceRecord {
                    buy_price: (base * 3.0).round() as u32,
                    sell_price: (base * 1.4).round() as u32,
                    supply: 0,
                }
            };
            economy.insert(commodity, record);
        }

        Planet {
            name,
            description: None,
            planet_type,
            specialty,
            economy,
            population,
            tech_level,
            owner: None,
        }
    }

    fn generate_station(&self, rng: &mut SeededRandom) -> Station {
        let archetype = rng.choice(&STATION_ARCHETYPES);
        let name = format!("{} {} {}", archetype.class, rng.choice(&STATION_NAMES), rng.int(1, 99));

        let mut economy = Economy::new();
        if archetype.services.contains(&Service::Trade) {
            let mut commodities = archetype.specialties.to_vec();
            for staple in [Commodity::Ore, Commodity::Organics, Commodity::Equipment] {
                if !commodities.contains(&staple) {
                    commodities.push(staple);
                }
            }
            if archetype.class == StationClass::BlackMarket && !commodities.contains(&Commodity::Contraband) {
                commodities.push(Commodity::Contraband);
            }

            for commodity in commodities {
                let is_specialty = archetype.specialties.contains(&commodity);

                let mut price = commodity.base_price() as f64;
                if is_specialty {
                    price *= 0.85;
                }
                price *= 2.0 - archetype.trading_bonus;
                price *= 0.9 + rng.float(0.0, 1.0) * 0.2;
                let price = price.round();

                let mut supply = (rng.float(0.0, 1.0) * 80.0).floor() as u32 + 20;
                if is_specialty {
                    supply *= 2;
                }

                economy.insert(
                    commodity,
                    PriceRecord {
                        buy_price: price as u32,
                        sell_price: (price * if is_specialty { 0.9 } else { 0.8 }).round() as u32,
                        supply,
                    },
                );
            }
        }

        Station {
            name,
            class: archetype.class,
            description: Some(archetype.description.to_string()),
            specialties: archetype.specialties.to_vec(),
            services: archetype.services.to_vec(),
            repair_cost: archetype.repair_cost,
            refuel_cost: archetype.refuel_cost,
            trading_bonus: archetype.trading_bonus,
            hidden: archetype.hidden,
            defended: archetype.defended,
            tech_level: archetype.tech_level,
            economy,
        }
    }

    // Named landmarks overwrite specific sectors, drawing from the same
    // seeded stream so placement reproduces with the seed. Runs after sector
    // creation and before connectivity. Placements whose sector does not
    // exist (small galaxies) are skipped without consuming the stream.
    fn inject_lore(&self, sectors: &mut BTreeMap<SectorId, Sector>, size: u32, rng: &mut SeededRandom) {
        debug!("injecting lore");

        self.place_planet(
            sectors,
            SectorId(1),
            rng,
            "Earth (Sol)",
            Some(PlanetType::Terran),
            Some(Commodity::Equipment),
            "The cradle of humanity. Home of the Federation.",
        );

        self.place_station(sectors, SectorId(5), rng, "Babylon 5", StationClass::Diplomatic, "A diplomatic hub. The last best hope for peace.");

        if size >= 10 {
            let desert_id = SectorId(rng.int(10, size as i64) as u32);
            self.place_planet(
                sectors,
                desert_id,
                rng,
                "Tatooine",
                Some(PlanetType::Desert),
                Some(Commodity::Ore),
                "A harsh desert world with twin suns. Hazardous.",
            );

            let caprica_id = SectorId(rng.int(10, size as i64) as u32);
            if caprica_id != desert_id {
                self.place_planet(
                    sectors,
                    caprica_id,
                    rng,
                    "Caprica",
                    Some(PlanetType::Urban),
                    Some(Commodity::Equipment),
                    "A high-tech colony world. Beware of cylons.",
                );
            }
        }

        self.place_station(sectors, SectorId(2), rng, "Stardock", StationClass::Shipyard, "Major fleet manufacturing facility.");

        let borg_floor = ((size as f64 * 0.8).floor() as i64).max(1);
        let borg_id = SectorId(rng.int(borg_floor, size as i64) as u32);
        if let Some(sector) = sectors.get_mut(&borg_id) {
            sector.contents.push(Content::Debris(Debris {
                name: "Borg Debris Field".to_string(),
                description: Some("Remnants of a cubic vessel. Resistance was futile.".to_string()),
            }));
        }

        self.place_planet(
            sectors,
            SectorId(42),
            rng,
            "Magrathea",
            Some(PlanetType::Industrial),
            Some(Commodity::Luxury),
            "Ancient planet-building facility. Currently closed for recession.",
        );

        if size >= 5 {
            let gate_id = SectorId(rng.int(5, size as i64) as u32);
            if let Some(sector) = sectors.get_mut(&gate_id) {
                sector.contents.push(Content::Anomaly(Anomaly {
                    name: "Chappa'ai (Stargate)".to_string(),
                    description: Some("An ancient ring device of unknown origin.".to_string()),
                }));
            }
        }
    }

    fn place_planet(
        &self,
        sectors: &mut BTreeMap<SectorId, Sector>,
        id: SectorId,
        rng: &mut SeededRandom,
        name: &str,
        planet_type: Option<PlanetType>,
        specialty: Option<Commodity>,
        description: &str,
    ) {
        let Some(sector) = sectors.get_mut(&id) else { return };

        let mut planet = self.generate_planet(rng);
        planet.name = name.to_string();
        planet.description = Some(description.to_string());
        if let Some(planet_type) = planet_type {
            planet.planet_type = planet_type;
        }
        if let Some(specialty) = specialty {
            planet.specialty = specialty;
        }

        sector.contents = vec![Content::Planet(planet)];
    }

    fn place_station(&self, sectors: &mut BTreeMap<SectorId, Sector>, id: SectorId, rng: &mut SeededRandom, name: &str, class: StationClass, description: &str) {
        let Some(sector) = sectors.get_mut(&id) else { return };

        let mut station = self.generate_station(rng);
        station.name = name.to_string();
        station.class = class;
        station.description = Some(description.to_string());

        sector.contents = vec![Content::Station(station)];
    }

    // Spanning pass first so every sector lands in one component, then a
    // handful of short random edges for shortcut variety. The nearest-pair
    // scan is O(V^2) per step; fine at current sizes (hundreds of sectors),
    // would want a spatial index well beyond that.
    fn connect_sectors(&self, galaxy: &mut Galaxy, rng: &mut SeededRandom) {
        let ids = galaxy.sectors.keys().copied().collect_vec();
        if ids.len() < 2 {
            return;
        }

        let coords: BTreeMap<SectorId, (f64, f64)> = galaxy.sectors.values().map(|s| (s.id, (s.x, s.y))).collect();
        let dist = |a: SectorId, b: SectorId| {
            let (ax, ay) = coords[&a];
            let (bx, by) = coords[&b];
            euclidean_distance(ax, ay, bx, by)
        };

        let mut visited = vec![ids[0]];
        let mut unvisited: BTreeSet<SectorId> = ids[1..].iter().copied().collect();

        while !unvisited.is_empty() {
            let (from, to) = visited
                .iter()
                .cartesian_product(unvisited.iter())
                .min_by_key(|(v, u)| OrderedFloat(dist(**v, **u)))
                .map(|(v, u)| (*v, *u))
                .expect("unvisited is non-empty");

            galaxy.add_warp(from, to);
            visited.push(to);
            unvisited.remove(&to);
        }

        let extra_edges = (ids.len() as f64 * self.config.extra_edge_ratio).floor() as usize;
        for _ in 0..extra_edges {
            let a = *rng.choice(&ids);
            let b = *rng.choice(&ids);

            if a == b || galaxy.sector(a).map(|s| s.warps.contains(&b)).unwrap_or(true) {
                continue;
            }
            if dist(a, b) < self.config.shortcut_max_distance {
                galaxy.add_warp(a, b);
            }
        }
    }
}

/// Builds the planet a colonization claim creates. The caller supplies the
/// seed tag (typically keyed on sector and claim time) and keeps all
/// credit/turn bookkeeping; the core just produces the planet record.
pub fn colony_planet(seed: &str, pilot_name: &str, owner: &str) -> Planet {
    let mut rng = SeededRandom::new(seed);
    let (planet_type, specialty) = *rng.choice(&PLANET_ARCHETYPES);

    let mut economy = Economy::new();
    for commodity in Commodity::iter() {
        if commodity == Commodity::Contraband {
            continue;
        }

        let mut price = commodity.base_price() as f64;
        if commodity == specialty {
            price *= 0.7;
        }

        economy.insert(
            commodity,
            PriceRecord {
                buy_price: (price * 1.2).round() as u32,
                sell_price: (price * 0.8).round() as u32,
                supply: 100,
            },
        );
    }

    Planet {
        name: format!("{pilot_name}'s {planet_type} Colony"),
        description: None,
        planet_type,
        specialty,
        economy,
        population: 1000,
        tech_level: 1,
        owner: Some(owner.to_string()),
    }
}
