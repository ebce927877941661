//! File-backed configuration store.
//!
//! Stands in for the controller's EEPROM: a small fixed-size image,
//! mutated in memory and flushed atomically on [`ConfigStore::commit`]
//! via a temp-file rename.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use scalewatch_traits::{ConfigStore, DynError};
use tracing::debug;

use crate::error::{HwError, Result};

/// Size of the persistent image in bytes.
pub const IMAGE_LEN: usize = 64;

pub struct FileStore {
    path: PathBuf,
    image: Vec<u8>,
}

impl FileStore {
    /// Open an existing image or start a blank one (all `0xFF`, like
    /// erased EEPROM). An image of the wrong size is refused rather
    /// than silently truncated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let image = match fs::read(&path) {
            Ok(bytes) if bytes.len() == IMAGE_LEN => bytes,
            Ok(bytes) => {
                return Err(HwError::BadImageLength {
                    expected: IMAGE_LEN,
                    actual: bytes.len(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no store image, starting blank");
                vec![0xFF; IMAGE_LEN]
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, image })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileStore {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> std::result::Result<(), DynError> {
        let end = offset + buf.len();
        let src = self
            .image
            .get(offset..end)
            .ok_or_else(|| Box::new(std::io::Error::other("store read out of bounds")) as DynError)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> std::result::Result<(), DynError> {
        let end = offset + data.len();
        let dst = self
            .image
            .get_mut(offset..end)
            .ok_or_else(|| Box::new(std::io::Error::other("store write out of bounds")) as DynError)?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> std::result::Result<(), DynError> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut f = File::create(&tmp)?;
            f.write_all(&self.image)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "store image committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_image_is_erased_eeprom() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("img.bin")).unwrap();
        let mut buf = [0u8; 4];
        store.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 4]);
    }

    #[test]
    fn commit_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.bin");

        let mut store = FileStore::open(&path).unwrap();
        store.write(8, &[1, 2, 3, 4]).unwrap();
        store.commit().unwrap();
        drop(store);

        let mut store = FileStore::open(&path).unwrap();
        let mut buf = [0u8; 4];
        store.read(8, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn uncommitted_writes_are_lost_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.bin");

        let mut store = FileStore::open(&path).unwrap();
        store.write(0, &[0x42]).unwrap();
        drop(store);

        let mut store = FileStore::open(&path).unwrap();
        let mut buf = [0u8; 1];
        store.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF]);
    }

    #[test]
    fn out_of_bounds_access_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("img.bin")).unwrap();
        let mut buf = [0u8; 8];
        assert!(store.read(IMAGE_LEN - 4, &mut buf).is_err());
        assert!(store.write(IMAGE_LEN - 1, &[0, 0]).is_err());
    }

    #[test]
    fn wrong_size_image_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.bin");
        fs::write(&path, [0u8; 10]).unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(HwError::BadImageLength { actual: 10, .. })
        ));
    }

    #[test]
    fn out_of_bounds_access_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("img.bin")).unwrap();
        assert!(store.write(IMAGE_LEN - 2, &[0; 4]).is_err());
        let mut buf = [0u8; 4];
        assert!(store.read(IMAGE_LEN - 2, &mut buf).is_err());
    }
}
