use scalewatch_core::StoreError;
use scalewatch_core::mocks::MemStore;
use scalewatch_core::persist::{self, PersistedConfig};
use scalewatch_traits::ConfigStore;

#[test]
fn f32_cells_round_trip_through_the_store() {
    let mut store = MemStore::new(32);
    for (offset, value) in [(0usize, 0.0f32), (4, -12.5), (8, 5005.0), (12, 0.001)] {
        store.write_f32(offset, value).unwrap();
    }
    store.commit().unwrap();

    assert_eq!(store.read_f32(0).unwrap(), 0.0);
    assert_eq!(store.read_f32(4).unwrap(), -12.5);
    assert_eq!(store.read_f32(8).unwrap(), 5005.0);
    assert_eq!(store.read_f32(12).unwrap(), 0.001);
}

#[test]
fn record_survives_a_save_load_cycle() {
    let mut store = MemStore::default();
    let cfg = PersistedConfig {
        calibration_factor: 4987.25,
        limit_g: 350.0,
        actuator_delay_ms: 1500,
    };
    persist::save(&mut store, &cfg).unwrap();
    assert_eq!(store.commits, 1);

    let loaded = persist::load(&mut store).unwrap();
    assert_eq!(loaded, cfg);
}

#[test]
fn blank_store_reads_as_bad_magic() {
    // A fresh EEPROM image is all 0xFF.
    let mut store = MemStore::default();
    assert!(matches!(persist::load(&mut store), Err(StoreError::BadMagic)));
}

#[test]
fn flipped_payload_byte_fails_the_checksum() {
    let mut store = MemStore::default();
    let cfg = PersistedConfig {
        calibration_factor: 5005.0,
        limit_g: 10.0,
        actuator_delay_ms: 0,
    };
    persist::save(&mut store, &cfg).unwrap();

    store.corrupt(6);
    assert!(matches!(persist::load(&mut store), Err(StoreError::Corrupt)));
}

#[test]
fn short_store_reports_out_of_bounds_io() {
    let mut store = MemStore::new(4);
    let cfg = PersistedConfig {
        calibration_factor: 5005.0,
        limit_g: 0.0,
        actuator_delay_ms: 0,
    };
    assert!(persist::save(&mut store, &cfg).is_err());
}
