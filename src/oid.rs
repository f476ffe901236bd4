//! Process-wide unique, time-ordered 12-byte identifiers.
//!
//! Layout: 4-byte Unix timestamp (seconds), 3-byte machine fingerprint
//! (leading bytes of the MD5 of the host name), 2-byte process id, 3-byte
//! rolling counter. The text form is exactly 24 lowercase hex characters and
//! sorts the same way the components do.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

use crate::core::error::{Error, Result};

const COUNTER_MASK: u32 = 0x00ff_ffff;

static MACHINE: Lazy<u32> = Lazy::new(machine_hash);
static PID: Lazy<u16> = Lazy::new(|| std::process::id() as u16);
static COUNTER: Lazy<AtomicU32> = Lazy::new(|| AtomicU32::new(rand::random::<u32>()));

/// First three bytes of the MD5 of the host name.
fn machine_hash() -> u32 {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string());
    let digest = md5::compute(host.as_bytes());
    ((digest[0] as u32) << 16) | ((digest[1] as u32) << 8) | digest[2] as u32
}

/// A 12-byte identifier, unique across (timestamp, machine, pid, counter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId {
    timestamp: u32,
    machine: u32,
    pid: u16,
    counter: u32,
}

impl ObjectId {
    pub fn from_parts(timestamp: u32, machine: u32, pid: u16, counter: u32) -> Self {
        ObjectId {
            timestamp,
            machine: machine & COUNTER_MASK,
            pid,
            counter: counter & COUNTER_MASK,
        }
    }

    /// Generate a fresh identifier. Concurrent calls within one process never
    /// collide: the counter is advanced atomically and wraps at 2^24.
    pub fn generate() -> Self {
        let timestamp = Utc::now().timestamp() as u32;
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed).wrapping_add(1) & COUNTER_MASK;
        ObjectId {
            timestamp,
            machine: *MACHINE,
            pid: *PID,
            counter,
        }
    }

    /// Generate a fresh identifier in its 24-character hex form.
    pub fn new_id() -> String {
        Self::generate().to_string()
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        ObjectId {
            timestamp: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            machine: ((bytes[4] as u32) << 16) | ((bytes[5] as u32) << 8) | bytes[6] as u32,
            pid: u16::from_be_bytes([bytes[7], bytes[8]]),
            counter: ((bytes[9] as u32) << 16) | ((bytes[10] as u32) << 8) | bytes[11] as u32,
        }
    }

    pub fn to_bytes(self) -> [u8; 12] {
        let ts = self.timestamp.to_be_bytes();
        let pid = self.pid.to_be_bytes();
        [
            ts[0],
            ts[1],
            ts[2],
            ts[3],
            (self.machine >> 16) as u8,
            (self.machine >> 8) as u8,
            self.machine as u8,
            pid[0],
            pid[1],
            (self.counter >> 16) as u8,
            (self.counter >> 8) as u8,
            self.counter as u8,
        ]
    }

    /// Parse a slice that must be exactly 12 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 12] = bytes
            .try_into()
            .map_err(|_| Error::InvalidIdLength(bytes.len()))?;
        Ok(Self::from_bytes(arr))
    }

    /// Non-failing parse variant.
    pub fn try_parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn machine(&self) -> u32 {
        self.machine
    }

    pub fn pid(&self) -> u16 {
        self.pid
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Creation time derived from the timestamp component.
    pub fn creation_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.timestamp as i64, 0).unwrap_or_default()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.to_bytes() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 24 || !s.is_ascii() {
            return Err(Error::InvalidId(s.to_string()));
        }
        let mut bytes = [0u8; 12];
        for (i, chunk) in s.as_bytes().chunks_exact(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|_| Error::InvalidId(s.to_string()))?;
            bytes[i] =
                u8::from_str_radix(pair, 16).map_err(|_| Error::InvalidId(s.to_string()))?;
        }
        Ok(Self::from_bytes(bytes))
    }
}
