use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use super::field::{Field, FieldNotSupported};
use super::resolve::url_path;
use super::types::{HandlerRecord, ids_overlap};

/// Registration rejected because the id overlaps registered ids.
///
/// Carries the conflicting records so an installer can decide which
/// registration takes precedence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("handler id '{id}' conflicts with {} registered handler(s)", conflicts.len())]
pub struct ConflictError {
    pub id: String,
    pub conflicts: Vec<HandlerRecord>,
}

impl ConflictError {
    pub fn conflicting_ids(&self) -> Vec<&str> {
        self.conflicts.iter().map(|r| r.id.as_str()).collect()
    }
}

/// Registration sequence number; orders every query result.
pub type Seq = u64;

/// Value -> registrations holding that value.
type Postings = HashMap<String, BTreeSet<Seq>>;

/// The authoritative set of registered handlers plus per-field lookups.
///
/// No registered id is equal to, or a prefix of, another registered id.
#[derive(Debug, Default, Clone)]
pub struct HandlerIndex {
    next_seq: Seq,
    records: BTreeMap<Seq, Arc<HandlerRecord>>,
    by_id: HashMap<String, Seq>,
    by_type: Postings,
    by_suffix: Postings,
    by_action: Postings,
}

impl HandlerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<HandlerRecord>> {
        self.records.values()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<HandlerRecord>> {
        self.by_id.get(id).and_then(|seq| self.records.get(seq))
    }

    pub fn insert(&mut self, record: HandlerRecord) -> Result<Arc<HandlerRecord>, ConflictError> {
        self.check_disjoint(&record)?;

        let seq = self.next_seq;
        self.next_seq += 1;

        let record = Arc::new(record);
        self.place(seq, Arc::clone(&record));
        Ok(record)
    }

    /// Puts a record taken out with [`HandlerIndex::remove_entry`] back at its
    /// original registration position.
    pub fn reinsert(&mut self, seq: Seq, record: Arc<HandlerRecord>) -> Result<(), ConflictError> {
        self.check_disjoint(&record)?;
        self.place(seq, record);
        self.next_seq = self.next_seq.max(seq + 1);
        Ok(())
    }

    fn check_disjoint(&self, record: &HandlerRecord) -> Result<(), ConflictError> {
        let conflicts = self.find_conflicting(&record.id);
        if conflicts.is_empty() {
            return Ok(());
        }
        Err(ConflictError {
            id: record.id.clone(),
            conflicts: conflicts.iter().map(|r| HandlerRecord::clone(r)).collect(),
        })
    }

    fn place(&mut self, seq: Seq, record: Arc<HandlerRecord>) {
        for (postings, values) in [
            (&mut self.by_type, &record.types),
            (&mut self.by_suffix, &record.suffixes),
            (&mut self.by_action, &record.actions),
        ] {
            for value in values {
                postings.entry(value.clone()).or_default().insert(seq);
            }
        }

        self.by_id.insert(record.id.clone(), seq);
        self.records.insert(seq, record);
    }

    /// Every record whose id equals `test_id`, is a prefix of it, or has it as
    /// a prefix.
    ///
    /// Always a full scan: this is a query over the id space, which the value
    /// indices do not cover.
    pub fn find_conflicting(&self, test_id: &str) -> Vec<Arc<HandlerRecord>> {
        self.records
            .values()
            .filter(|record| ids_overlap(&record.id, test_id))
            .cloned()
            .collect()
    }

    pub fn remove(&mut self, id: &str) -> Option<Arc<HandlerRecord>> {
        self.remove_entry(id).map(|(_, record)| record)
    }

    /// Removes `id`, returning it with its registration sequence number.
    pub fn remove_entry(&mut self, id: &str) -> Option<(Seq, Arc<HandlerRecord>)> {
        let seq = self.by_id.remove(id)?;
        let record = self.records.remove(&seq)?;

        for (postings, values) in [
            (&mut self.by_type, &record.types),
            (&mut self.by_suffix, &record.suffixes),
            (&mut self.by_action, &record.actions),
        ] {
            for value in values {
                if let Some(seqs) = postings.get_mut(value) {
                    seqs.remove(&seq);
                    if seqs.is_empty() {
                        postings.remove(value);
                    }
                }
            }
        }

        Some((seq, record))
    }

    /// Removes `id` only if it still holds exactly `expected`.
    pub fn remove_if_same(&mut self, expected: &HandlerRecord) -> bool {
        match self.get(&expected.id) {
            Some(current) if current.as_ref() == expected => {
                self.remove(&expected.id);
                true
            }
            _ => false,
        }
    }

    /// Records holding `value` in `field`, filtered by visibility.
    ///
    /// `Field::Id` is an exact, unfiltered lookup.
    pub fn search(
        &self,
        field: Field,
        value: &str,
        caller_id: &str,
    ) -> Result<Vec<Arc<HandlerRecord>>, FieldNotSupported> {
        let postings = match field {
            Field::Id => return Ok(self.get(value).cloned().into_iter().collect()),
            Field::Types => &self.by_type,
            Field::Suffixes => &self.by_suffix,
            Field::Actions => &self.by_action,
            field => {
                return Err(FieldNotSupported {
                    field,
                    operation: "search",
                });
            }
        };

        Ok(postings
            .get(value)
            .into_iter()
            .flatten()
            .filter_map(|seq| self.records.get(seq))
            .filter(|record| record.is_visible_to(caller_id))
            .cloned()
            .collect())
    }

    /// Distinct values of `field` over records visible to `caller_id`, in
    /// first-seen order.
    pub fn values_for(&self, field: Field, caller_id: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for record in self.iter().filter(|r| r.is_visible_to(caller_id)) {
            for value in record.field_values(field) {
                if seen.insert(value) {
                    values.push(value.to_string());
                }
            }
        }
        values
    }

    pub fn records_for_owner(&self, owner_storage_id: u32) -> Vec<Arc<HandlerRecord>> {
        self.iter()
            .filter(|record| record.owner_storage_id == owner_storage_id)
            .cloned()
            .collect()
    }

    /// Prefix-mode lookup.
    ///
    /// Candidates are the visible records that overlap `id` under the conflict
    /// rule; the longest id wins and ties go to the earliest registration.
    pub fn find_by_prefix(&self, id: &str, caller_id: &str) -> Option<Arc<HandlerRecord>> {
        let mut best: Option<&Arc<HandlerRecord>> = None;
        for record in self
            .iter()
            .filter(|r| ids_overlap(&r.id, id) && r.is_visible_to(caller_id))
        {
            if best.is_none_or(|b| record.id.len() > b.id.len()) {
                best = Some(record);
            }
        }
        best.cloned()
    }

    /// First visible record, in registration order, with a suffix ending the
    /// URL's path and, when `action` is non-empty, listing that action.
    pub fn resolve_url(
        &self,
        caller_id: &str,
        url: &str,
        action: &str,
    ) -> Option<Arc<HandlerRecord>> {
        let path = url_path(url).to_lowercase();
        self.iter()
            .filter(|record| record.is_visible_to(caller_id))
            .filter(|record| action.is_empty() || record.actions.iter().any(|a| a == action))
            .find(|record| {
                record
                    .suffixes
                    .iter()
                    .any(|suffix| path.ends_with(&suffix.to_lowercase()))
            })
            .cloned()
    }
}
