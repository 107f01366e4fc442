use std::sync::Arc;

use tracing::warn;

use super::Result;
use crate::codec::{WireString, encode_record, encode_record_array, encode_sequence};
use crate::handlers::{Field, HandlerIndex, HandlerRecord, SearchMode};

/// Answers storage-port queries from an index over a store's contents.
pub(crate) struct Snapshot<'a> {
    index: &'a HandlerIndex,
}

impl<'a> Snapshot<'a> {
    pub fn new(index: &'a HandlerIndex) -> Self {
        Self { index }
    }

    pub fn by_field(&self, caller_id: &str, field: Field, value: &str) -> Result<Option<WireString>> {
        let records = self.index.search(field, value, caller_id)?;
        record_array(&records)
    }

    pub fn by_owner(&self, owner_storage_id: u32) -> Result<Option<WireString>> {
        record_array(&self.index.records_for_owner(owner_storage_id))
    }

    pub fn exact(&self, caller_id: &str, id: &str, mode: SearchMode) -> Result<Option<WireString>> {
        if id.is_empty() {
            return Ok(None);
        }
        let found = match mode {
            SearchMode::Exact => self.index.get(id).cloned(),
            SearchMode::Prefix => self.index.find_by_prefix(id, caller_id),
        };
        single(found)
    }

    pub fn by_url(&self, caller_id: &str, url: &str, action: &str) -> Result<Option<WireString>> {
        single(self.index.resolve_url(caller_id, url, action))
    }

    pub fn field_values(&self, caller_id: &str, field: Field) -> Result<Option<WireString>> {
        let values = self.index.values_for(field, caller_id);
        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(encode_sequence(&values)?))
    }

    pub fn all(&self) -> Result<Option<WireString>> {
        let records: Vec<Arc<HandlerRecord>> = self.index.iter().cloned().collect();
        record_array(&records)
    }
}

/// Builds an index over stored records, dropping any that conflict.
pub(crate) fn index_records<I>(records: I) -> HandlerIndex
where
    I: IntoIterator<Item = HandlerRecord>,
{
    let mut index = HandlerIndex::new();
    for record in records {
        if let Err(err) = index.insert(record) {
            warn!(id = %err.id, conflicts = ?err.conflicting_ids(), "Ignoring conflicting stored handler");
        }
    }
    index
}

fn record_array(records: &[Arc<HandlerRecord>]) -> Result<Option<WireString>> {
    if records.is_empty() {
        return Ok(None);
    }
    Ok(Some(encode_record_array(records.iter().map(Arc::as_ref))?))
}

fn single(record: Option<Arc<HandlerRecord>>) -> Result<Option<WireString>> {
    record.map(|r| encode_record(&r)).transpose().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_record, decode_record_array, decode_sequence};

    fn index() -> HandlerIndex {
        let mut html = HandlerRecord::builder()
            .id("html")
            .owner_storage_id(1)
            .class_name("Html")
            .types(vec!["text/html".into()])
            .suffixes(vec![".html".into()])
            .build();
        html.accesses = vec!["com.acme".into()];
        let text = HandlerRecord::builder()
            .id("text")
            .owner_storage_id(2)
            .class_name("Text")
            .types(vec!["text/plain".into(), "text/html".into()])
            .build();
        index_records([html, text])
    }

    #[test]
    fn test_by_field_encodes_record_array() {
        let index = index();
        let snapshot = Snapshot::new(&index);

        let wire = snapshot.by_field("com.acme", Field::Types, "text/html").unwrap();
        let records = decode_record_array(wire.as_ref()).unwrap();
        assert_eq!(records.len(), 2);

        let wire = snapshot.by_field("org", Field::Types, "text/html").unwrap();
        let records = decode_record_array(wire.as_ref()).unwrap();
        assert_eq!(records[0].id, "text");

        assert!(snapshot.by_field("org", Field::Types, "image/gif").unwrap().is_none());
        assert!(snapshot.by_field("org", Field::Locales, "en").is_err());
    }

    #[test]
    fn test_exact_and_prefix() {
        let index = index();
        let snapshot = Snapshot::new(&index);

        let wire = snapshot.exact("", "text", SearchMode::Exact).unwrap();
        assert_eq!(decode_record(wire.as_ref()).unwrap().unwrap().class_name, "Text");
        let wire = snapshot.exact("", "text.more", SearchMode::Prefix).unwrap();
        assert_eq!(decode_record(wire.as_ref()).unwrap().unwrap().id, "text");
        assert!(snapshot.exact("", "", SearchMode::Exact).unwrap().is_none());
    }

    #[test]
    fn test_field_values_and_owner() {
        let index = index();
        let snapshot = Snapshot::new(&index);

        let wire = snapshot.field_values("", Field::Types).unwrap();
        assert_eq!(decode_sequence(wire.as_ref()).unwrap(), vec!["text/plain", "text/html"]);

        let wire = snapshot.by_owner(1).unwrap();
        assert_eq!(decode_record_array(wire.as_ref()).unwrap()[0].id, "html");
        assert!(snapshot.by_owner(9).unwrap().is_none());
    }

    #[test]
    fn test_index_records_drops_conflicts() {
        let a = HandlerRecord::builder().id("a").owner_storage_id(1).class_name("A").build();
        let ab = HandlerRecord::builder().id("ab").owner_storage_id(1).class_name("B").build();
        let index = index_records([a, ab]);
        assert_eq!(index.len(), 1);
        assert!(index.get("a").is_some());
    }
}
