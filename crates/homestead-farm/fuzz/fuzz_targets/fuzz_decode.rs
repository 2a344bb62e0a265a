#![no_main]
use std::sync::Arc;

use homestead_core::test_utils::*;
use homestead_farm::Farm;
use homestead_farm::codec;
use homestead_farm::config::FarmConfig;
use homestead_farm::migration::MigrationRegistry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary save bytes must never panic: decoding may fail, and
    // restoring always falls back to a fresh farm.
    let _ = codec::decode(data);
    let farm = Farm::restore_or_new(
        Arc::new(standard_catalog()),
        FarmConfig::default(),
        Some(data),
        ts_secs(3_600),
        &MigrationRegistry::new(),
    );
    assert!(farm.is_ok());
});
