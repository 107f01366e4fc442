//! Length-prefixed string codec used at the storage boundary.
//!
//! A wire value is a run of 16-bit text units. Every element is preceded by a
//! single marker unit holding the element's length in bytes, so the decoder
//! consumes `marker / 2` units after each marker:
//!
//! ```text
//! [0x0002] 'a' [0x0006] 'a' 'b' 'c'   ->   ["a", "abc"]
//! ```
//!
//! Elements are concatenated without separators and the format carries no
//! other structure. Nested sequences (records inside a record array, array
//! fields inside a record) are encoded by treating an encoded sequence as the
//! raw content of an outer element.
//!
//! An absent wire value stands for an empty sequence.

mod error;
mod record;

pub use error::{CodecError, Result};
pub use record::{decode_record, decode_record_array, encode_record, encode_record_array};

/// Largest element, in units, whose byte length still fits in one marker.
pub const MAX_ELEMENT_UNITS: usize = (u16::MAX / 2) as usize;

/// An encoded sequence as exchanged with a storage port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WireString(Vec<u16>);

impl WireString {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_units(units: Vec<u16>) -> Self {
        Self(units)
    }

    pub fn units(&self) -> &[u16] {
        &self.0
    }

    pub fn into_units(self) -> Vec<u16> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Little-endian byte form used by the bundled stores.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|unit| unit.to_le_bytes()).collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 2 != 0 {
            return Err(CodecError::OddByteLength(bytes.len()));
        }
        let units = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self(units))
    }
}

/// Incremental encoder for one sequence.
#[derive(Debug, Default)]
pub struct SequenceWriter {
    units: Vec<u16>,
}

impl SequenceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, element: &str) -> Result<&mut Self> {
        let units: Vec<u16> = element.encode_utf16().collect();
        self.push_units(&units)
    }

    /// Appends already-encoded content, e.g. a nested sequence.
    pub fn push_units(&mut self, element: &[u16]) -> Result<&mut Self> {
        if element.len() > MAX_ELEMENT_UNITS {
            return Err(CodecError::ElementTooLong {
                units: element.len(),
                max: MAX_ELEMENT_UNITS,
            });
        }
        // bounded by MAX_ELEMENT_UNITS above
        self.units.push((element.len() * 2) as u16);
        self.units.extend_from_slice(element);
        Ok(self)
    }

    pub fn push_sequence<I, S>(&mut self, elements: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nested = encode_sequence(elements)?;
        self.push_units(nested.units())
    }

    pub fn finish(self) -> WireString {
        WireString(self.units)
    }
}

/// Encodes each element behind its length marker.
pub fn encode_sequence<I, S>(elements: I) -> Result<WireString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut writer = SequenceWriter::new();
    for element in elements {
        writer.push_str(element.as_ref())?;
    }
    Ok(writer.finish())
}

pub fn decode_sequence(wire: Option<&WireString>) -> Result<Vec<String>> {
    match wire {
        Some(wire) => decode_units(wire.units()),
        None => Ok(Vec::new()),
    }
}

/// Decodes an outer sequence whose elements are themselves encoded sequences.
pub fn decode_array_of_sequences(wire: Option<&WireString>) -> Result<Vec<Vec<String>>> {
    let Some(wire) = wire else {
        return Ok(Vec::new());
    };
    split_units(wire.units())?
        .into_iter()
        .map(decode_units)
        .collect()
}

pub(crate) fn decode_units(units: &[u16]) -> Result<Vec<String>> {
    split_units(units)?
        .into_iter()
        .map(|element| Ok(String::from_utf16(element)?))
        .collect()
}

/// Walks the markers once and returns the raw content of every element.
pub(crate) fn split_units(units: &[u16]) -> Result<Vec<&[u16]>> {
    let mut elements = Vec::new();
    let mut pos = 0;

    while pos < units.len() {
        let marker = units[pos];
        if marker % 2 != 0 {
            return Err(CodecError::OddMarker {
                offset: pos,
                marker,
            });
        }
        let needed = usize::from(marker / 2);
        let start = pos + 1;
        let remaining = units.len() - start;
        if needed > remaining {
            return Err(CodecError::Truncated {
                offset: pos,
                needed,
                remaining,
            });
        }
        elements.push(&units[start..start + needed]);
        pos = start + needed;
    }

    Ok(elements)
}
