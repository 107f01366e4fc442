use super::error::{CodecError, Result};
use super::{SequenceWriter, WireString, decode_units, split_units};
use crate::handlers::{ActionNameMap, HandlerRecord, RegistrationMethod};

/// id, owner, class name, registration method.
const SCALAR_ELEMENTS: usize = 4;

/// Decodes one serialized handler.
///
/// Returns `None` when fewer than the four scalar elements are present or the
/// id is empty. Trailing array elements are read when present and left empty
/// otherwise, so summaries holding only the scalars decode as well.
pub fn decode_record(wire: Option<&WireString>) -> Result<Option<HandlerRecord>> {
    match wire {
        Some(wire) => decode_record_units(wire.units()),
        None => Ok(None),
    }
}

/// Decodes an array of serialized handlers, skipping entries without an id.
pub fn decode_record_array(wire: Option<&WireString>) -> Result<Vec<HandlerRecord>> {
    let Some(wire) = wire else {
        return Ok(Vec::new());
    };
    let mut records = Vec::new();
    for element in split_units(wire.units())? {
        if let Some(record) = decode_record_units(element)? {
            records.push(record);
        }
    }
    Ok(records)
}

pub fn encode_record(record: &HandlerRecord) -> Result<WireString> {
    let mut writer = SequenceWriter::new();
    writer
        .push_str(&record.id)?
        .push_str(&format!("{:x}", record.owner_storage_id))?
        .push_str(&record.class_name)?
        .push_str(&format!("{:x}", u32::from(record.registration_method)))?
        .push_sequence(&record.types)?
        .push_sequence(&record.suffixes)?
        .push_sequence(&record.actions)?;

    let mut maps = SequenceWriter::new();
    for map in &record.action_names {
        maps.push_sequence(std::iter::once(&map.locale).chain(&map.names))?;
    }
    writer
        .push_units(maps.finish().units())?
        .push_sequence(&record.accesses)?;

    Ok(writer.finish())
}

pub fn encode_record_array<'a, I>(records: I) -> Result<WireString>
where
    I: IntoIterator<Item = &'a HandlerRecord>,
{
    let mut writer = SequenceWriter::new();
    for record in records {
        writer.push_units(encode_record(record)?.units())?;
    }
    Ok(writer.finish())
}

fn decode_record_units(units: &[u16]) -> Result<Option<HandlerRecord>> {
    let parts = split_units(units)?;
    if parts.len() < SCALAR_ELEMENTS {
        return Ok(None);
    }

    let id = String::from_utf16(parts[0])?;
    if id.is_empty() {
        return Ok(None);
    }
    let owner_storage_id = parse_hex("owner_storage_id", &String::from_utf16(parts[1])?)?;
    let class_name = String::from_utf16(parts[2])?;
    let registration_method =
        RegistrationMethod::from(parse_hex("registration_method", &String::from_utf16(parts[3])?)?);

    let trailing = &parts[SCALAR_ELEMENTS..];
    let record = HandlerRecord {
        id,
        owner_storage_id,
        class_name,
        registration_method,
        types: nested(trailing, 0)?,
        suffixes: nested(trailing, 1)?,
        actions: nested(trailing, 2)?,
        action_names: action_maps(trailing, 3)?,
        accesses: nested(trailing, 4)?,
    };
    Ok(Some(record))
}

fn nested(parts: &[&[u16]], at: usize) -> Result<Vec<String>> {
    match parts.get(at) {
        Some(units) => decode_units(units),
        None => Ok(Vec::new()),
    }
}

fn action_maps(parts: &[&[u16]], at: usize) -> Result<Vec<ActionNameMap>> {
    let Some(units) = parts.get(at) else {
        return Ok(Vec::new());
    };
    let mut maps = Vec::new();
    for entry in split_units(units)? {
        let mut strings = decode_units(entry)?.into_iter();
        let locale = strings.next().ok_or(CodecError::EmptyActionMap)?;
        maps.push(ActionNameMap {
            locale,
            names: strings.collect(),
        });
    }
    Ok(maps)
}

fn parse_hex(field: &'static str, value: &str) -> Result<u32> {
    let invalid = || CodecError::InvalidHex {
        field,
        value: value.to_string(),
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u32::from_str_radix(value, 16).map_err(|_| invalid())
}
