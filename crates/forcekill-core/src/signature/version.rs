use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::host::HostVersion;

/// Pointer width of the host the signature applies to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
pub enum PointerWidth {
    #[strum(serialize = "32")]
    #[serde(rename = "32")]
    Bits32,
    #[strum(serialize = "64")]
    #[serde(rename = "64")]
    Bits64,
}

impl PointerWidth {
    /// Width of the build currently running
    pub const fn native() -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::Bits64
        } else {
            Self::Bits32
        }
    }

    pub fn bits(&self) -> u32 {
        match self {
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    /// Truncate an address to what this width can represent
    pub fn truncate(&self, address: u64) -> u64 {
        match self {
            Self::Bits32 => address & 0xFFFF_FFFF,
            Self::Bits64 => address,
        }
    }
}

/// Key selecting the signature variant for one OS build family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OsVersionKey {
    pub major: u32,
    pub minor: u32,
    pub width: PointerWidth,
}

impl OsVersionKey {
    pub const fn new(major: u32, minor: u32, width: PointerWidth) -> Self {
        Self {
            major,
            minor,
            width,
        }
    }

    /// Build the key from what the host reports
    pub fn detect<H: HostVersion + ?Sized>(host: &H) -> Self {
        let (major, minor) = host.os_version();
        Self::new(major, minor, host.pointer_width())
    }
}

impl fmt::Display for OsVersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({}-bit)", self.major, self.minor, self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_pointer_width_parse() {
        assert_eq!(PointerWidth::from_str("32").unwrap(), PointerWidth::Bits32);
        assert_eq!(PointerWidth::from_str("64").unwrap(), PointerWidth::Bits64);
        assert!(PointerWidth::from_str("16").is_err());
    }

    #[test]
    fn test_pointer_width_truncate() {
        assert_eq!(PointerWidth::Bits32.truncate(0x1_0000_1000), 0x1000);
        assert_eq!(PointerWidth::Bits64.truncate(0x1_0000_1000), 0x1_0000_1000);
    }

    #[test]
    fn test_native_width_matches_target() {
        let expected = std::mem::size_of::<usize>() as u32 * 8;
        assert_eq!(PointerWidth::native().bits(), expected);
    }

    #[test]
    fn test_key_display() {
        let key = OsVersionKey::new(10, 0, PointerWidth::Bits64);
        assert_eq!(key.to_string(), "10.0 (64-bit)");
    }

    #[test]
    fn test_key_serde_uses_numeric_width() {
        let key = OsVersionKey::new(6, 1, PointerWidth::Bits32);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"major":6,"minor":1,"width":"32"}"#);
    }
}
