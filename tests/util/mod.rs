use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;

use folio_palette::model::types::{Category, RawResults, ResultItem};
use folio_palette::search::dispatch::{LookupRequest, LookupResponse};
use folio_palette::search::provider::LookupError;
use folio_palette::search::worker::{BackendEvent, LookupBackend};
use serde_json::json;
use tempfile::TempDir;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }
}

struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Backend whose responses are released by hand, in any order.
#[allow(dead_code)]
#[derive(Default)]
pub struct ManualBackend {
    pub sent: RefCell<Vec<LookupRequest>>,
    inbox: RefCell<VecDeque<BackendEvent>>,
}

#[allow(dead_code)]
impl ManualBackend {
    pub fn last_seq(&self) -> u64 {
        self.sent.borrow().last().map(|r| r.seq).unwrap_or(0)
    }

    pub fn sent_terms(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .map(|r| r.key.term.clone())
            .collect()
    }

    pub fn respond(&self, seq: u64, results: RawResults) {
        self.push(BackendEvent::Response(LookupResponse {
            seq,
            outcome: Ok(results),
        }));
    }

    pub fn fail(&self, seq: u64) {
        self.push(BackendEvent::Response(LookupResponse {
            seq,
            outcome: Err(LookupError::Query("backend exploded".into())),
        }));
    }

    pub fn data_changed(&self) {
        self.push(BackendEvent::DataChanged);
    }

    fn push(&self, event: BackendEvent) {
        self.inbox.borrow_mut().push_back(event);
    }
}

impl LookupBackend for ManualBackend {
    fn submit(&self, request: LookupRequest) {
        self.sent.borrow_mut().push(request);
    }

    fn try_next(&self) -> Option<BackendEvent> {
        self.inbox.borrow_mut().pop_front()
    }
}

#[allow(dead_code)]
pub fn item(id: &str, title: &str, category: Category) -> ResultItem {
    ResultItem {
        id: id.into(),
        title: title.into(),
        subtitle: String::new(),
        href: format!("/{category}/{id}"),
        icon: None,
        category,
        external: false,
    }
}

/// Entities for `user_1` plus one shared market article.
#[allow(dead_code)]
pub fn sample_import() -> serde_json::Value {
    json!([
        {
            "owner": "user_1",
            "portfolios": [
                {"id": "p1", "title": "Apple Growth", "subtitle": "3 holdings", "href": "/portfolio/p1"}
            ],
            "assets": [
                {"id": "a1", "title": "AAPL", "subtitle": "Apple Inc.", "href": "/asset/a1"},
                {"id": "a2", "title": "MSFT", "subtitle": "Microsoft", "href": "/asset/a2"}
            ],
            "documents": [
                {"id": "d1", "title": "2024 tax report", "href": "/document/d1"}
            ]
        },
        {
            "owner": "user_2",
            "assets": [
                {"id": "a9", "title": "Apple bonds", "href": "/asset/a9"}
            ]
        },
        {
            "articles": [
                {"id": "n1", "title": "Apple beats estimates", "href": "https://news.example/apple", "external": true}
            ]
        }
    ])
}

#[allow(dead_code)]
pub struct TempFixtureDir {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TempFixtureDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    /// Write the sample import file and return its path.
    pub fn write_sample_import(&self) -> PathBuf {
        let path = self.dir.path().join("entities.json");
        std::fs::write(&path, sample_import().to_string()).expect("write import");
        path
    }
}
