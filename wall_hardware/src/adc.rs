//! Sysfs IIO ADC reader for the button ladder.
//!
//! The kernel exposes the latest conversion as a decimal integer at a fixed
//! path (e.g. `/sys/bus/iio/devices/iio:device0/in_voltage0_raw`). The file
//! handle is kept open across polls and rewound before each read; any
//! failure drops the handle so the next poll reopens from scratch.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use crate::error::HwError;
use wall_traits::AdcSource;

pub struct SysfsAdc {
    path: PathBuf,
    file: Option<File>,
    buf: String,
}

impl SysfsAdc {
    /// The handle is opened lazily on the first read, so construction never
    /// fails even when the overlay is not up yet.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            buf: String::with_capacity(16),
        }
    }

    fn read_raw(&mut self) -> Result<i32, HwError> {
        if self.file.is_none() {
            self.file = Some(File::open(&self.path)?);
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| HwError::Io(std::io::Error::other("adc handle unavailable")))?;
        file.seek(SeekFrom::Start(0))?;
        self.buf.clear();
        file.read_to_string(&mut self.buf)?;
        self.buf
            .trim()
            .parse::<i32>()
            .map_err(|e| HwError::Parse(format!("'{}': {}", self.buf.trim(), e)))
    }
}

impl AdcSource for SysfsAdc {
    fn read(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        match self.read_raw() {
            Ok(v) => Ok(v),
            Err(e) => {
                // Reopen on the next poll; the device node can come and go
                // with the overlay.
                self.file = None;
                Err(Box::new(e))
            }
        }
    }
}
