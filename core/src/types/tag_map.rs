use std::collections::BTreeMap;
use std::fmt;

/// Decoded value of a single TIFF directory entry
///
/// Values are kept in the widest type of their family; textual entries keep
/// their raw bytes (including embedded NULs) so that vendor blocks can be
/// decoded later without loss.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub enum TagValue {
    Ascii(Vec<u8>),
    Bytes(Vec<u8>),
    Unsigned(Vec<u64>),
    Signed(Vec<i64>),
    Rational(Vec<(u32, u32)>),
    SignedRational(Vec<(i32, i32)>),
    Float(Vec<f64>),
}

impl TagValue {
    /// Returns the value as text for ASCII and byte entries
    ///
    /// Decodes as UTF-8, falling back to Latin-1 for vendor blocks that write
    /// `µ` as the single byte 0xB5.
    pub fn as_text(&self) -> Option<String> {
        match self {
            TagValue::Ascii(bytes) | TagValue::Bytes(bytes) => Some(decode_text(bytes)),
            _ => None,
        }
    }

    /// Returns the first unsigned integer of the entry
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            TagValue::Unsigned(values) => values.first().copied(),
            _ => None,
        }
    }

    /// Number of values held by this entry
    pub fn count(&self) -> usize {
        match self {
            TagValue::Ascii(v) | TagValue::Bytes(v) => v.len(),
            TagValue::Unsigned(v) => v.len(),
            TagValue::Signed(v) => v.len(),
            TagValue::Rational(v) => v.len(),
            TagValue::SignedRational(v) => v.len(),
            TagValue::Float(v) => v.len(),
        }
    }

    /// Short name of the value family
    pub fn type_name(&self) -> &'static str {
        match self {
            TagValue::Ascii(_) => "ascii",
            TagValue::Bytes(_) => "bytes",
            TagValue::Unsigned(_) => "unsigned",
            TagValue::Signed(_) => "signed",
            TagValue::Rational(_) => "rational",
            TagValue::SignedRational(_) => "srational",
            TagValue::Float(_) => "float",
        }
    }
}

/// Decodes vendor text: UTF-8 when valid, Latin-1 otherwise
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    const SHOWN: usize = 8;
    let shown: Vec<String> = values.iter().take(SHOWN).map(|v| v.to_string()).collect();
    write!(f, "{}", shown.join(", "))?;
    if values.len() > SHOWN {
        write!(f, ", ... ({} values)", values.len())?;
    }
    Ok(())
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Ascii(bytes) => {
                let text = decode_text(bytes).replace('\0', "");
                let first_line = text.trim().lines().next().unwrap_or("");
                if text.trim().lines().count() > 1 {
                    write!(f, "{} ... ({} bytes)", first_line, bytes.len())
                } else {
                    write!(f, "{}", first_line)
                }
            }
            TagValue::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            TagValue::Unsigned(v) => write_list(f, v),
            TagValue::Signed(v) => write_list(f, v),
            TagValue::Float(v) => write_list(f, v),
            TagValue::Rational(v) => {
                let parts: Vec<String> = v.iter().map(|(n, d)| format!("{}/{}", n, d)).collect();
                write_list(f, &parts)
            }
            TagValue::SignedRational(v) => {
                let parts: Vec<String> = v.iter().map(|(n, d)| format!("{}/{}", n, d)).collect();
                write_list(f, &parts)
            }
        }
    }
}

/// All tags of the first TIFF page, keyed by numeric tag id
///
/// Built once per file and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTagMap {
    entries: BTreeMap<u16, TagValue>,
}

impl RawTagMap {
    /// Creates an empty tag map
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `tag`
    pub fn get(&self, tag: u16) -> Option<&TagValue> {
        self.entries.get(&tag)
    }

    /// Whether `tag` is present
    pub fn contains(&self, tag: u16) -> bool {
        self.entries.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in ascending tag order
    pub fn iter(&self) -> impl Iterator<Item = (u16, &TagValue)> {
        self.entries.iter().map(|(tag, value)| (*tag, value))
    }
}

impl FromIterator<(u16, TagValue)> for RawTagMap {
    fn from_iter<I: IntoIterator<Item = (u16, TagValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
