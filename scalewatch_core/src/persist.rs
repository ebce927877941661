//! Versioned record persistence over the byte-addressed `ConfigStore`.
//!
//! Layout (little-endian, offset 0):
//!
//! | bytes | field              |
//! |-------|--------------------|
//! | 0     | magic (0x57)       |
//! | 1     | version (1)        |
//! | 2..6  | calibration_factor |
//! | 6..10 | limit_g            |
//! | 10..14| actuator_delay_ms  |
//! | 14..16| CRC-16/CCITT over bytes 0..14 |
//!
//! The tare offset is intentionally not persisted; tare is re-done per
//! power cycle against whatever is on the platform.

use scalewatch_traits::ConfigStore;

use crate::error::StoreError;

pub const MAGIC: u8 = 0x57;
pub const VERSION: u8 = 1;
pub const RECORD_OFFSET: usize = 0;
pub const RECORD_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistedConfig {
    pub calibration_factor: f32,
    pub limit_g: f32,
    pub actuator_delay_ms: u32,
}

impl PersistedConfig {
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0] = MAGIC;
        buf[1] = VERSION;
        buf[2..6].copy_from_slice(&self.calibration_factor.to_le_bytes());
        buf[6..10].copy_from_slice(&self.limit_g.to_le_bytes());
        buf[10..14].copy_from_slice(&self.actuator_delay_ms.to_le_bytes());
        let crc = crc16_ccitt(&buf[..RECORD_LEN - 2]);
        buf[14..16].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, StoreError> {
        if buf.len() < RECORD_LEN {
            return Err(StoreError::OutOfBounds);
        }
        if buf[0] != MAGIC {
            return Err(StoreError::BadMagic);
        }
        if buf[1] != VERSION {
            return Err(StoreError::UnsupportedVersion(buf[1]));
        }
        let stored = u16::from_le_bytes([buf[14], buf[15]]);
        if crc16_ccitt(&buf[..RECORD_LEN - 2]) != stored {
            return Err(StoreError::Corrupt);
        }
        Ok(Self {
            calibration_factor: f32::from_le_bytes([buf[2], buf[3], buf[4], buf[5]]),
            limit_g: f32::from_le_bytes([buf[6], buf[7], buf[8], buf[9]]),
            actuator_delay_ms: u32::from_le_bytes([buf[10], buf[11], buf[12], buf[13]]),
        })
    }
}

/// Read and validate the record at [`RECORD_OFFSET`].
pub fn load<ST: ConfigStore + ?Sized>(store: &mut ST) -> Result<PersistedConfig, StoreError> {
    let mut buf = [0u8; RECORD_LEN];
    store
        .read(RECORD_OFFSET, &mut buf)
        .map_err(|e| StoreError::Io(e.to_string()))?;
    PersistedConfig::decode(&buf)
}

/// Write the record and issue the durability barrier.
pub fn save<ST: ConfigStore + ?Sized>(
    store: &mut ST,
    cfg: &PersistedConfig,
) -> Result<(), StoreError> {
    store
        .write(RECORD_OFFSET, &cfg.encode())
        .map_err(|e| StoreError::Io(e.to_string()))?;
    store.commit().map_err(|e| StoreError::Io(e.to_string()))
}

/// CRC-16/CCITT-FALSE (poly 0x1021, init 0xFFFF).
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &b in data {
        crc ^= u16::from(b) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_matches_known_vector() {
        // CRC-16/CCITT-FALSE("123456789") = 0x29B1
        assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let cfg = PersistedConfig {
            calibration_factor: 5005.0,
            limit_g: 10.0,
            actuator_delay_ms: 0,
        };
        let mut buf = cfg.encode();
        buf[0] = 0x00;
        assert_eq!(PersistedConfig::decode(&buf), Err(StoreError::BadMagic));
    }

    #[test]
    fn decode_rejects_future_version() {
        let cfg = PersistedConfig {
            calibration_factor: 1.0,
            limit_g: 0.0,
            actuator_delay_ms: 100,
        };
        let mut buf = cfg.encode();
        buf[1] = 9;
        assert_eq!(
            PersistedConfig::decode(&buf),
            Err(StoreError::UnsupportedVersion(9))
        );
    }

    #[test]
    fn decode_detects_payload_corruption() {
        let cfg = PersistedConfig {
            calibration_factor: 5005.0,
            limit_g: 250.0,
            actuator_delay_ms: 200,
        };
        let mut buf = cfg.encode();
        buf[7] ^= 0x40;
        assert_eq!(PersistedConfig::decode(&buf), Err(StoreError::Corrupt));
    }
}
