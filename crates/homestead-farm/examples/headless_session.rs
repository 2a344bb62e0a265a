//! A scripted farm session with no renderer.
//!
//! Plants a field, builds a barn, lets time pass, saves, "closes" the game
//! for an hour and resumes from the save. Run with
//! `RUST_LOG=debug cargo run -p homestead-farm --example headless_session`
//! to see every action logged.

use std::sync::Arc;
use std::time::Duration;

use homestead_core::catalog::{BuildingDef, CatalogBuilder, CropDef};
use homestead_core::sim::Timestamp;
use homestead_farm::codec;
use homestead_farm::config::FarmConfig;
use homestead_farm::migration::MigrationRegistry;
use homestead_farm::Farm;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let mut builder = CatalogBuilder::new();
    let coin = builder.register_resource("coin");
    let wheat = builder.register_resource("wheat");
    // The stock farm configuration also produces corn.
    builder.register_resource("corn");
    builder.set_currency(coin);
    let wheat_crop = builder.register_crop(CropDef {
        name: "wheat".into(),
        growth_time_minutes: 2,
        seed_cost: 5,
        harvest_yield: 15,
        resource: wheat,
    });
    let barn = builder.register_building(BuildingDef {
        name: "barn".into(),
        width: 2,
        height: 2,
        cost: 100,
        production_boosts: [(wheat, 10)].into(),
    });
    let catalog = Arc::new(builder.build()?);

    let mut config = FarmConfig {
        width: 8,
        height: 8,
        ..FarmConfig::default()
    };
    config.starting_inventory.insert(coin, 200);

    let start = Timestamp::now();
    let mut farm = Farm::new(Arc::clone(&catalog), config.clone(), start)?;

    for x in 0..4 {
        farm.plant(x, 0, wheat_crop)?;
    }
    farm.start_placement(barn)?;
    farm.confirm_placement(5, 5)?;

    farm.tick(Duration::from_secs(150));
    for x in 0..4 {
        farm.harvest(x, 0)?;
    }
    farm.collect_resources();
    info!(
        coin = farm.inventory().amount(coin),
        wheat = farm.inventory().amount(wheat),
        "first session done"
    );

    let bytes = codec::encode(&farm.save())?;
    let resume = farm.now().saturating_add(Duration::from_secs(3_600));
    let mut farm = Farm::restore_or_new(
        catalog,
        config,
        Some(&bytes),
        resume,
        &MigrationRegistry::new(),
    )?;
    let collected = farm.collect_resources();
    info!(?collected, wheat = farm.inventory().amount(wheat), "resumed after an hour");
    Ok(())
}
