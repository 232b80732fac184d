use std::path::Path;

use sh_core::component::{Atmosphere, Identity, Market, Planet, PlanetKind, Resources};
use sh_core::{World, WorldMeta};

pub fn run(output: Option<&Path>) -> Result<(), String> {
    let world = build_demo_world()?;
    let json = world.snapshot().to_json().map_err(|e| e.to_string())?;
    super::write_output(&json, output)
}

/// A handful of planets covering the main profiles, with one trading hub.
pub fn build_demo_world() -> Result<World, String> {
    let mut meta = WorldMeta::new("Kepler Reach");
    meta.description = "Four worlds and a free port on the edge of charted space.".to_string();
    let mut world = World::new(meta);

    let planets = [
        ("Ceres Deep", PlanetKind::Rocky, Atmosphere::None, 0, 1.0),
        ("Thalassa", PlanetKind::Ocean, Atmosphere::Breathable, 120_000, 1.1),
        ("Verdance", PlanetKind::Temperate, Atmosphere::Thin, 450_000, 0.9),
        ("Korrin", PlanetKind::GasGiant, Atmosphere::Toxic, 0, 1.3),
    ];

    for (label, kind, atmosphere, population, multiplier) in planets {
        let id = world.create(label);
        let planet = Planet::new(kind, atmosphere)
            .with_population(population)
            .with_environment_multiplier(multiplier);
        world.add_component(id, planet).map_err(|e| e.to_string())?;
        world
            .add_component(
                id,
                Resources::new(5_000.0)
                    .with("water", 400.0)
                    .with("organics", 250.0)
                    .with("fuel", 150.0),
            )
            .map_err(|e| e.to_string())?;
        if population > 0 {
            world
                .add_component(id, Market::new())
                .map_err(|e| e.to_string())?;
        }
    }

    let port = world.create("Port Sternhafen");
    world
        .add_component(
            port,
            Identity {
                name: "Port Sternhafen".to_string(),
                faction: Some("Free Traders".to_string()),
                ..Default::default()
            },
        )
        .map_err(|e| e.to_string())?;
    world
        .add_component(port, Resources::new(20_000.0))
        .map_err(|e| e.to_string())?;
    world
        .add_component(port, Market::new().with_price("crystals", 55.0))
        .map_err(|e| e.to_string())?;

    Ok(world)
}
