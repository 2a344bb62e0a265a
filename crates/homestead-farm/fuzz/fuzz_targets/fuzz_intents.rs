#![no_main]
use std::sync::Arc;
use std::time::Duration;

use arbitrary::Arbitrary;
use homestead_core::id::{BuildingTypeId, CropTypeId};
use homestead_core::test_utils::*;
use homestead_farm::Farm;
use homestead_farm::codec;
use homestead_farm::config::FarmConfig;
use homestead_farm::intent::Intent;
use libfuzzer_sys::fuzz_target;

/// A structured farm action for fuzzing.
#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Plant { x: i8, y: i8, crop: u8 },
    Harvest { x: i8, y: i8 },
    Place { building: u8, x: i8, y: i8 },
    Move { from_x: i8, from_y: i8, to_x: i8, to_y: i8 },
    Collect,
    Tick { secs: u16 },
}

fn to_intents(op: &FuzzOp) -> Vec<Intent> {
    match *op {
        FuzzOp::Plant { x, y, crop } => vec![Intent::Plant {
            x: x.into(),
            y: y.into(),
            crop: CropTypeId(u32::from(crop % 3)),
        }],
        FuzzOp::Harvest { x, y } => vec![Intent::Harvest {
            x: x.into(),
            y: y.into(),
        }],
        FuzzOp::Place { building, x, y } => vec![
            Intent::StartPlacement {
                building_type: BuildingTypeId(u32::from(building % 4)),
            },
            Intent::ConfirmPlacement {
                x: x.into(),
                y: y.into(),
            },
            Intent::CancelPlacement,
        ],
        FuzzOp::Move {
            from_x,
            from_y,
            to_x,
            to_y,
        } => vec![Intent::MoveBuilding {
            from_x: from_x.into(),
            from_y: from_y.into(),
            to_x: to_x.into(),
            to_y: to_y.into(),
        }],
        FuzzOp::Collect => vec![Intent::CollectResources],
        FuzzOp::Tick { secs } => vec![Intent::Tick {
            delta: Duration::from_secs(secs.into()),
        }],
    }
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let catalog = Arc::new(standard_catalog());
    let Ok(mut farm) = Farm::new(Arc::clone(&catalog), FarmConfig::default(), ts_secs(0)) else {
        return;
    };

    // Limit operations to prevent timeouts.
    for op in ops.iter().take(200) {
        for intent in to_intents(op) {
            let _ = farm.apply(intent);
        }
    }

    // Whatever happened, the farm must survive a save round trip.
    let Ok(bytes) = codec::encode(&farm.save()) else {
        return;
    };
    let snapshot = codec::decode(&bytes).expect("own save decodes");
    let restored = Farm::load(catalog, FarmConfig::default(), snapshot, farm.now())
        .expect("own save loads");
    assert_eq!(restored.state_hash(), farm.state_hash());
});
