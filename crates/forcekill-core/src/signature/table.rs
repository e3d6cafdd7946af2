use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::pattern::{format_pattern, parse_pattern};
use super::version::{OsVersionKey, PointerWidth};
use crate::error::{Error, Result};

/// Opcode preceding the reference to the terminate routine, per OS build family.
///
/// `None` marks a build that was examined and has no usable signature. The
/// lookup reports it as unsupported instead of falling through to a neighbour.
const BUILTIN_OPCODES: &[(u32, u32, PointerWidth, Option<u8>)] = &[
    (6, 0, PointerWidth::Bits32, None),
    (6, 0, PointerWidth::Bits64, None),
    (6, 1, PointerWidth::Bits32, Some(0xE8)),
    (6, 1, PointerWidth::Bits64, Some(0xE8)),
    (6, 2, PointerWidth::Bits32, Some(0xE8)),
    (6, 2, PointerWidth::Bits64, Some(0xE9)),
    (6, 3, PointerWidth::Bits32, Some(0xE8)),
    (6, 3, PointerWidth::Bits64, Some(0xE9)),
    (10, 0, PointerWidth::Bits32, Some(0xE8)),
    (10, 0, PointerWidth::Bits64, Some(0xE9)),
];

/// Version tag written into saved signature files
pub const BUILTIN_TABLE_VERSION: &str = "builtin";

/// Non-empty byte sequence located by the memory scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidPattern("Signature pattern is empty".to_string()));
        }
        Ok(Self { bytes })
    }

    pub fn opcode(byte: u8) -> Self {
        Self { bytes: vec![byte] }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_pattern(&self.bytes))
    }
}

impl TryFrom<String> for Signature {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(parse_pattern(&value)?)
    }
}

impl From<Signature> for String {
    fn from(value: Signature) -> Self {
        value.to_string()
    }
}

/// One row of a signature file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    #[serde(flatten)]
    pub key: OsVersionKey,
    /// `null` marks the key as explicitly unsupported
    pub pattern: Option<Signature>,
}

/// On-disk form of a signature table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureSet {
    pub version: String,
    pub entries: Vec<SignatureEntry>,
}

/// Finite mapping from OS build family to signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTable {
    entries: BTreeMap<OsVersionKey, Option<Signature>>,
}

impl SignatureTable {
    pub fn builtin() -> Self {
        let entries = BUILTIN_OPCODES
            .iter()
            .map(|&(major, minor, width, opcode)| {
                (
                    OsVersionKey::new(major, minor, width),
                    opcode.map(Signature::opcode),
                )
            })
            .collect();
        Self { entries }
    }

    pub fn from_set(set: SignatureSet) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for entry in set.entries {
            if entries.insert(entry.key, entry.pattern).is_some() {
                return Err(Error::InvalidConfig(format!(
                    "Duplicate signature entry for {}",
                    entry.key
                )));
            }
        }
        debug!(
            "Loaded signature table '{}' with {} entries",
            set.version,
            entries.len()
        );
        Ok(Self { entries })
    }

    pub fn to_set(&self, version: &str) -> SignatureSet {
        SignatureSet {
            version: version.to_string(),
            entries: self
                .entries
                .iter()
                .map(|(key, pattern)| SignatureEntry {
                    key: *key,
                    pattern: pattern.clone(),
                })
                .collect(),
        }
    }

    pub fn lookup(&self, key: &OsVersionKey) -> Option<&Signature> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    /// Like `lookup`, but reports why a key has no signature
    pub fn require(&self, key: &OsVersionKey) -> Result<&Signature> {
        self.lookup(key).ok_or_else(|| Error::UnsupportedVersion {
            key: *key,
            known_gap: self.is_known_gap(key),
        })
    }

    /// Key is listed but deliberately carries no signature
    pub fn is_known_gap(&self, key: &OsVersionKey) -> bool {
        matches!(self.entries.get(key), Some(None))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsVersionKey, Option<&Signature>)> {
        self.entries.iter().map(|(key, sig)| (key, sig.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<SignatureTable> {
    let content = fs::read_to_string(&path)?;
    let set: SignatureSet = serde_json::from_str(&content)?;
    SignatureTable::from_set(set)
}

pub fn save_signatures<P: AsRef<Path>>(path: P, table: &SignatureTable) -> Result<()> {
    let content = serde_json::to_string_pretty(&table.to_set(BUILTIN_TABLE_VERSION))?;
    fs::write(path, content)?;
    Ok(())
}
