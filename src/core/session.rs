//! Edit session: working rows plus the last saved snapshot

use super::record::{next_id, Field, Record};

/// Current rows and the pristine baseline they are compared against
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    current: Vec<Record>,
    baseline: Vec<Record>,
}

impl EditSession {
    /// Start a session whose baseline equals the seed
    pub fn new(seed: Vec<Record>) -> Self {
        Self {
            baseline: seed.clone(),
            current: seed,
        }
    }

    /// Rows in display and export order
    pub fn records(&self) -> &[Record] {
        &self.current
    }

    /// Last saved or loaded rows
    pub fn baseline(&self) -> &[Record] {
        &self.baseline
    }

    #[cfg(test)]
    pub fn record(&self, id: u64) -> Option<&Record> {
        self.current.iter().find(|r| r.id == id)
    }

    /// Replace one field of the row with `id`. Unknown ids are ignored.
    pub fn set_field(&mut self, id: u64, field: Field, value: impl Into<String>) {
        match self.current.iter_mut().find(|r| r.id == id) {
            Some(record) => *record.get_mut(field) = value.into(),
            None => tracing::debug!("Ignoring edit of {} on missing row {}", field, id),
        }
    }

    /// Append a placeholder row and return its id
    pub fn add_row(&mut self) -> u64 {
        let id = next_id(&self.current);
        self.current.push(Record::placeholder(id));
        id
    }

    /// Remove the row with `id`, if present
    pub fn delete_row(&mut self, id: u64) {
        self.current.retain(|r| r.id != id);
    }

    /// Make the current rows the new baseline
    pub fn save(&mut self) {
        self.baseline = self.current.clone();
    }

    /// Discard edits since the last save or load
    pub fn reset(&mut self) {
        self.current = self.baseline.clone();
    }

    /// Whether the rows differ from the baseline, order included
    pub fn is_dirty(&self) -> bool {
        self.current != self.baseline
    }

    /// Install freshly imported or loaded rows as both current and baseline
    pub fn replace_all(&mut self, records: Vec<Record>) {
        self.baseline = records.clone();
        self.current = records;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EditSession {
        EditSession::new(Record::sample_set())
    }

    #[test]
    fn test_new_session_is_clean() {
        assert!(!sample().is_dirty());
        assert!(!EditSession::default().is_dirty());
    }

    #[test]
    fn test_set_field() {
        let mut session = sample();
        session.set_field(2, Field::Value, "Jane Doe");
        assert_eq!(session.record(2).unwrap().value, "Jane Doe");
        assert_eq!(session.record(1).unwrap(), &Record::sample_set()[0]);
        assert!(session.is_dirty());
        // Baseline is untouched
        assert_eq!(session.baseline()[1].value, "John Doe");
    }

    #[test]
    fn test_set_field_unknown_id_is_noop() {
        let mut session = sample();
        let before = session.records().to_vec();
        session.set_field(42, Field::Tag, "ghost");
        assert_eq!(session.records(), before.as_slice());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_set_field_same_value_stays_clean() {
        let mut session = sample();
        session.set_field(1, Field::Tag, "title");
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_add_row_ids() {
        let mut session = sample();
        assert_eq!(session.add_row(), 6);
        assert_eq!(session.add_row(), 7);
        assert_eq!(session.records().last().unwrap(), &Record::placeholder(7));
        assert!(session.is_dirty());

        let mut empty = EditSession::default();
        assert_eq!(empty.add_row(), 1);
    }

    #[test]
    fn test_add_row_after_delete_reuses_no_live_id() {
        let mut session = sample();
        session.delete_row(3);
        let id = session.add_row();
        assert_eq!(id, 6);
        let ids: Vec<u64> = session.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 4, 5, 6]);
    }

    #[test]
    fn test_delete_row() {
        let mut session = sample();
        session.delete_row(99);
        assert!(!session.is_dirty());
        session.delete_row(1);
        assert_eq!(session.records().len(), 4);
        assert!(session.record(1).is_none());
        assert!(session.is_dirty());
    }

    #[test]
    fn test_save_and_reset() {
        let mut session = sample();
        session.set_field(1, Field::Value, "Edited");
        session.save();
        assert!(!session.is_dirty());

        session.delete_row(1);
        session.add_row();
        assert!(session.is_dirty());
        session.reset();
        assert!(!session.is_dirty());
        assert_eq!(session.record(1).unwrap().value, "Edited");
    }

    #[test]
    fn test_reorder_is_dirty() {
        let mut session = sample();
        let mut reordered = session.records().to_vec();
        reordered.swap(0, 1);
        session.delete_row(1);
        session.delete_row(2);
        session.current.insert(0, reordered[1].clone());
        session.current.insert(0, reordered[0].clone());
        assert_eq!(session.records().len(), 5);
        assert!(session.is_dirty());
    }

    #[test]
    fn test_replace_all() {
        let mut session = sample();
        session.add_row();
        session.replace_all(vec![Record::new(1, "author", "John Doe", "")]);
        assert!(!session.is_dirty());
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.baseline().len(), 1);
    }
}
