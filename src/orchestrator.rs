//! Coordinates user actions, the edit session, and the remote store
//!
//! Local edits apply immediately. Remote calls are split in two: a
//! `request_*` method hands out a [`RemoteRequest`] and marks the editor as
//! loading, and [`Orchestrator::complete`] applies the finished call. Only one
//! remote call may be in flight; completions that do not match it are dropped.

use crate::core::codec::{self, ParseError};
use crate::core::record::{Field, Record};
use crate::core::session::EditSession;
use crate::core::validation;
use crate::remote::{
    RemoteCompletion, RemoteError, RemoteOp, RemoteOutcome, RemoteRequest, RemoteStore,
};

/// Severity of a user-facing message, least severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    /// The most severe notice in `notices`, the latest one on ties
    pub fn most_severe(notices: &[Notice]) -> Option<&Notice> {
        notices.iter().max_by_key(|n| n.level)
    }
}

/// Editor state shared by every front end
#[derive(Debug)]
pub struct Orchestrator {
    session: EditSession,
    /// Name used for export and remote save
    filename: String,
    /// Last known remote document names
    files: Vec<String>,
    /// Request awaiting completion
    in_flight: Option<u64>,
    next_request_id: u64,
    notices: Vec<Notice>,
}

impl Orchestrator {
    pub fn new(seed: Vec<Record>, filename: impl Into<String>) -> Self {
        Self {
            session: EditSession::new(seed),
            filename: filename.into(),
            files: Vec::new(),
            in_flight: None,
            next_request_id: 1,
            notices: Vec::new(),
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    /// Remote document names from the last successful listing
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Whether a remote call is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.session.is_dirty()
    }

    /// XML rendering of the current rows
    pub fn preview(&self) -> String {
        codec::encode(self.session.records())
    }

    // Local edits

    pub fn set_field(&mut self, id: u64, field: Field, value: impl Into<String>) {
        self.session.set_field(id, field, value);
    }

    pub fn add_row(&mut self) -> u64 {
        self.session.add_row()
    }

    pub fn delete_row(&mut self, id: u64) {
        self.session.delete_row(id);
    }

    /// Accept the current rows as the new baseline
    pub fn save_changes(&mut self) {
        self.session.save();
        self.report(NoticeLevel::Info, "Changes saved successfully!".to_string());
    }

    /// Return to the last saved or loaded rows
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Replace the session with a document supplied by the user.
    ///
    /// On a parse failure nothing changes, the filename included.
    pub fn import(&mut self, name: &str, text: &str) -> Result<usize, ParseError> {
        match codec::decode(text) {
            Ok(records) => {
                let count = records.len();
                self.session.replace_all(records);
                self.filename = name.to_string();
                tracing::info!("Imported {} records from {}", count, name);
                Ok(count)
            }
            Err(e) => {
                self.report(NoticeLevel::Error, format!("Error parsing XML file: {}", e));
                Err(e)
            }
        }
    }

    /// Filename and document text for export. Session state is unchanged.
    pub fn export(&mut self) -> (String, String) {
        self.warn_on_issues();
        (self.filename.clone(), self.preview())
    }

    // Remote calls

    pub fn request_list(&mut self) -> Option<RemoteRequest> {
        self.begin(RemoteOp::List)
    }

    /// Save the current rows under the active filename
    pub fn request_save(&mut self) -> Option<RemoteRequest> {
        if self.refuse_if_busy("save") {
            return None;
        }
        self.warn_on_issues();
        let content = self.preview();
        tracing::info!(
            "Saving to server: {} ({} bytes)",
            self.filename,
            content.len()
        );
        self.begin(RemoteOp::Save {
            filename: self.filename.clone(),
            content,
        })
    }

    pub fn request_load(&mut self, filename: &str) -> Option<RemoteRequest> {
        self.begin(RemoteOp::Load {
            filename: filename.to_string(),
        })
    }

    pub fn request_delete(&mut self, filename: &str) -> Option<RemoteRequest> {
        self.begin(RemoteOp::Delete {
            filename: filename.to_string(),
        })
    }

    fn refuse_if_busy(&mut self, op_name: &str) -> bool {
        let Some(id) = self.in_flight else {
            return false;
        };
        tracing::debug!("Refusing remote {} while request {} is pending", op_name, id);
        self.report(
            NoticeLevel::Warning,
            "Another server operation is still in progress".to_string(),
        );
        true
    }

    fn begin(&mut self, op: RemoteOp) -> Option<RemoteRequest> {
        if self.refuse_if_busy(op.name()) {
            return None;
        }
        let id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight = Some(id);
        Some(RemoteRequest { id, op })
    }

    /// Apply a finished remote call. Returns a follow-up request, if any.
    pub fn complete(&mut self, completion: RemoteCompletion) -> Option<RemoteRequest> {
        if self.in_flight != Some(completion.id) {
            tracing::warn!("Discarding stale completion for request {}", completion.id);
            return None;
        }
        self.in_flight = None;

        match completion.outcome {
            RemoteOutcome::Listed(Ok(files)) => {
                tracing::debug!("Store lists {} files", files.len());
                self.files = files;
                None
            }
            RemoteOutcome::Listed(Err(e)) => {
                self.report(NoticeLevel::Error, format!("Error fetching saved files: {}", e));
                None
            }
            RemoteOutcome::Saved { filename, result } => match result {
                Ok(()) => {
                    tracing::info!("Saved {} to server", filename);
                    self.report(
                        NoticeLevel::Info,
                        "File saved to server successfully!".to_string(),
                    );
                    self.begin(RemoteOp::List)
                }
                Err(e) => {
                    self.report(NoticeLevel::Error, format!("Error saving to server: {}", e));
                    None
                }
            },
            RemoteOutcome::Loaded { filename, result } => {
                let decoded = result
                    .map_err(|e| e.to_string())
                    .and_then(|text| codec::decode(&text).map_err(|e| e.to_string()));
                match decoded {
                    Ok(records) => {
                        self.session.replace_all(records);
                        self.filename = filename;
                        self.report(NoticeLevel::Info, "File loaded successfully!".to_string());
                    }
                    Err(reason) => {
                        self.report(NoticeLevel::Error, format!("Error loading file: {}", reason));
                    }
                }
                None
            }
            RemoteOutcome::Deleted { filename, result } => match result {
                Ok(()) => {
                    tracing::info!("Deleted {} from server", filename);
                    self.report(NoticeLevel::Info, "File deleted successfully!".to_string());
                    self.begin(RemoteOp::List)
                }
                Err(e) => {
                    self.report(NoticeLevel::Error, format!("Error deleting file: {}", e));
                    None
                }
            },
        }
    }

    /// Give up on the in-flight request without a completion
    pub fn abort(&mut self, error: RemoteError) {
        let Some(id) = self.in_flight.take() else {
            return;
        };
        tracing::warn!("Abandoning request {}", id);
        self.report(NoticeLevel::Error, format!("Server operation failed: {}", error));
    }

    /// Execute `request` and any follow-ups synchronously against `store`
    pub fn run(&mut self, store: &dyn RemoteStore, request: Option<RemoteRequest>) {
        let mut next = request;
        while let Some(request) = next {
            next = self.complete(request.execute(store));
        }
    }

    // Notices

    #[cfg(test)]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain pending notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn report(&mut self, level: NoticeLevel, message: String) {
        match level {
            NoticeLevel::Info => tracing::info!("{}", message),
            NoticeLevel::Warning => tracing::warn!("{}", message),
            NoticeLevel::Error => tracing::error!("{}", message),
        }
        self.notices.push(Notice { level, message });
    }

    fn warn_on_issues(&mut self) {
        for issue in validation::validate(self.session.records()) {
            self.report(NoticeLevel::Warning, issue.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;

    fn editor() -> Orchestrator {
        Orchestrator::new(Record::sample_set(), "metadata.xml")
    }

    fn last_level(orch: &Orchestrator) -> Option<NoticeLevel> {
        orch.notices().last().map(|n| n.level)
    }

    #[test]
    fn test_preview_renders_current_rows() {
        let orch = editor();
        assert!(orch
            .preview()
            .contains(r#"<title lang="en">Sample Document</title>"#));
    }

    #[test]
    fn test_import_replaces_rows_and_filename() {
        let mut orch = editor();
        orch.add_row();
        let count = orch
            .import(
                "authors.xml",
                r#"<?xml version="1.0"?><metadata><author>John Doe</author></metadata>"#,
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(orch.filename(), "authors.xml");
        assert_eq!(
            orch.session().records(),
            &[Record::new(1, "author", "John Doe", "")]
        );
        assert!(!orch.is_dirty());
    }

    #[test]
    fn test_import_failure_leaves_state_unchanged() {
        let mut orch = editor();
        orch.set_field(1, Field::Value, "Edited");
        let before = orch.session().records().to_vec();

        assert!(orch.import("broken.xml", "not xml").is_err());
        assert_eq!(orch.session().records(), before.as_slice());
        assert!(orch.is_dirty());
        assert_eq!(orch.filename(), "metadata.xml");
        assert_eq!(last_level(&orch), Some(NoticeLevel::Error));
    }

    #[test]
    fn test_export_warns_but_still_renders() {
        let mut orch = editor();
        orch.set_field(2, Field::Tag, "bad tag");
        let (name, xml) = orch.export();
        assert_eq!(name, "metadata.xml");
        assert!(xml.contains("<bad tag>John Doe</bad tag>"));
        assert_eq!(last_level(&orch), Some(NoticeLevel::Warning));
        assert!(orch.is_dirty());
    }

    #[test]
    fn test_save_refreshes_file_list() {
        let store = MemoryStore::new();
        let mut orch = editor();
        orch.set_filename("books.xml");

        let request = orch.request_save();
        assert!(orch.is_loading());
        orch.run(&store, request);

        assert!(!orch.is_loading());
        assert_eq!(orch.files(), &["books.xml".to_string()]);
        assert_eq!(store.load("books.xml").unwrap(), orch.preview());
    }

    #[test]
    fn test_load_replaces_session() {
        let store = MemoryStore::with_files([(
            "authors.xml",
            r#"<metadata><author role="lead">Jane</author></metadata>"#,
        )]);
        let mut orch = editor();
        orch.add_row();

        let request = orch.request_load("authors.xml");
        orch.run(&store, request);

        assert!(!orch.is_loading());
        assert!(!orch.is_dirty());
        assert_eq!(orch.filename(), "authors.xml");
        assert_eq!(
            orch.session().baseline(),
            &[Record::new(1, "author", "Jane", r#"role="lead""#)]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let store = MemoryStore::new();
        let mut orch = editor();
        orch.set_field(1, Field::Value, "Edited");
        let current = orch.session().records().to_vec();
        let baseline = orch.session().baseline().to_vec();

        let request = orch.request_load("missing.xml").unwrap();
        let completion = request.execute(&store);
        assert!(matches!(completion.outcome.error(), Some(RemoteError::NotFound(_))));
        assert!(orch.complete(completion).is_none());

        assert!(!orch.is_loading());
        assert_eq!(orch.session().records(), current.as_slice());
        assert_eq!(orch.session().baseline(), baseline.as_slice());
        assert_eq!(orch.filename(), "metadata.xml");
        assert_eq!(last_level(&orch), Some(NoticeLevel::Error));
    }

    #[test]
    fn test_load_unparseable_document() {
        let store = MemoryStore::with_files([("bad.xml", "<metadata><a></metadata>")]);
        let mut orch = editor();
        let request = orch.request_load("bad.xml");
        orch.run(&store, request);

        assert!(!orch.is_loading());
        assert_eq!(orch.session().records(), Record::sample_set().as_slice());
        assert_eq!(orch.filename(), "metadata.xml");
        assert_eq!(last_level(&orch), Some(NoticeLevel::Error));
    }

    #[test]
    fn test_delete_refreshes_file_list() {
        let store = MemoryStore::with_files([("a.xml", "<m/>"), ("b.xml", "<m/>")]);
        let mut orch = editor();
        let request = orch.request_delete("a.xml");
        orch.run(&store, request);
        assert_eq!(orch.files(), &["b.xml".to_string()]);

        let request = orch.request_delete("a.xml");
        orch.run(&store, request);
        assert_eq!(last_level(&orch), Some(NoticeLevel::Error));
        assert!(!orch.is_loading());
    }

    #[test]
    fn test_overlapping_requests_are_refused() {
        let mut orch = editor();
        let first = orch.request_list();
        assert!(first.is_some());
        assert!(orch.request_load("a.xml").is_none());
        assert!(orch.request_delete("a.xml").is_none());
        assert_eq!(last_level(&orch), Some(NoticeLevel::Warning));
        assert!(orch.is_loading());
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let store = MemoryStore::with_files([("a.xml", "<m><x>1</x></m>")]);
        let mut orch = editor();
        let request = orch.request_load("a.xml").unwrap();

        let stale = RemoteRequest {
            id: request.id + 100,
            op: request.op.clone(),
        };
        assert!(orch.complete(stale.execute(&store)).is_none());
        assert!(orch.is_loading());
        assert_eq!(orch.session().records().len(), 5);

        orch.complete(request.execute(&store));
        assert!(!orch.is_loading());
        assert_eq!(orch.session().records().len(), 1);
    }

    #[test]
    fn test_failed_list_keeps_previous_files() {
        let store = MemoryStore::with_files([("a.xml", "<m/>")]);
        let mut orch = editor();
        let request = orch.request_list();
        orch.run(&store, request);
        assert_eq!(orch.files().len(), 1);

        let request = orch.request_list().unwrap();
        orch.complete(request.fail(RemoteError::Connection("offline".to_string())));
        assert_eq!(orch.files().len(), 1);
        assert!(!orch.is_loading());
    }

    #[test]
    fn test_save_changes_and_reset() {
        let mut orch = editor();
        orch.delete_row(1);
        orch.save_changes();
        assert!(!orch.is_dirty());
        orch.add_row();
        orch.reset();
        assert!(!orch.is_dirty());
        assert_eq!(orch.session().records().len(), 4);
        assert_eq!(orch.take_notices().len(), 1);
        assert!(orch.notices().is_empty());
    }

    #[test]
    fn test_abort_releases_loading_flag() {
        let mut orch = editor();
        orch.abort(RemoteError::Connection("idle".to_string()));
        assert!(orch.notices().is_empty());

        let request = orch.request_load("a.xml").unwrap();
        orch.abort(RemoteError::Connection("remote worker stopped".to_string()));
        assert!(!orch.is_loading());
        assert_eq!(last_level(&orch), Some(NoticeLevel::Error));

        // A completion arriving after the abort is stale
        let store = MemoryStore::with_files([("a.xml", "<m><x>1</x></m>")]);
        assert!(orch.complete(request.execute(&store)).is_none());
        assert_eq!(orch.session().records().len(), 5);
        assert!(orch.request_list().is_some());
    }

    #[test]
    fn test_most_severe_notice() {
        let notice = |level, message: &str| Notice {
            level,
            message: message.to_string(),
        };
        assert!(Notice::most_severe(&[]).is_none());

        let notices = vec![
            notice(NoticeLevel::Warning, "row 1 tag: tag name is empty"),
            notice(NoticeLevel::Warning, "row 2 tag: tag name is empty"),
            notice(NoticeLevel::Info, "File saved to server successfully!"),
        ];
        assert_eq!(
            Notice::most_severe(&notices).map(|n| n.message.as_str()),
            Some("row 2 tag: tag name is empty")
        );

        let mut orch = editor();
        orch.set_field(1, Field::Tag, "");
        orch.set_field(2, Field::Tag, "1st");
        let store = MemoryStore::new();
        let request = orch.request_save();
        orch.run(&store, request);
        let notices = orch.take_notices();
        assert_eq!(notices.len(), 3);
        assert_eq!(
            Notice::most_severe(&notices).map(|n| n.level),
            Some(NoticeLevel::Warning)
        );
    }
}
