//! Editor state store: the three independently edited buffers.
//!
//! The store owns the HTML and CSS text plus the parameter set, and is
//! the only mutable state in the pipeline. Mutations publish a
//! [`StateChange`] to registered subscribers so downstream stages
//! (compiler, remote renderer, persistence) can re-derive their outputs
//! without the store knowing anything about them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use crate::diagnostics::{DiagnosticSource, Diagnostics};

/// User-authored template text. Replaced wholesale on every keystroke,
/// never validated or parsed at entry.
#[derive(Debug, Clone, Default)]
pub struct TemplateSource {
    pub html: String,
    pub css: String,
}

/// The parameter set keeps two representations that must stay
/// consistent: the text shown in the editor and the parsed object fed
/// downstream. The text is authoritative while being edited; the object
/// only advances when the text parses.
#[derive(Debug, Clone)]
pub struct ParamSet {
    text: String,
    object: Map<String, Value>,
}

impl ParamSet {
    /// Build from a parsed object, deriving the pretty-printed text.
    pub fn from_object(object: Map<String, Value>) -> Self {
        let text = serde_json::to_string_pretty(&Value::Object(object.clone()))
            .unwrap_or_else(|_| "{}".to_string());
        Self { text, object }
    }

    /// The raw editor text. May be invalid JSON mid-edit.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The last successfully parsed object.
    pub fn object(&self) -> &Map<String, Value> {
        &self.object
    }

    /// Replace the text, advancing the object only when it parses.
    fn set_text(&mut self, text: String) -> std::result::Result<(), serde_json::Error> {
        match serde_json::from_str::<Map<String, Value>>(&text) {
            Ok(object) => {
                self.text = text;
                self.object = object;
                Ok(())
            }
            Err(err) => {
                // Keep the keystrokes, keep the last good object.
                self.text = text;
                Err(err)
            }
        }
    }
}

impl Default for ParamSet {
    fn default() -> Self {
        Self::from_object(Map::new())
    }
}

/// Which buffer changed. `Params` is only published when the parsed
/// object advanced; invalid JSON edits change the text silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Html,
    Css,
    Params,
}

/// Immutable view of the state at one instant, handed to the derived
/// stages. They never see (or mutate) the store itself.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub html: String,
    pub css: String,
    pub params: Map<String, Value>,
}

impl StateSnapshot {
    /// Content fingerprint of the settled (html, css, params) triple.
    ///
    /// Debounce flushes compare this against the fingerprint of the last
    /// dispatched state to suppress redundant remote renders and
    /// persistence writes. Fields are length-prefixed so shuffled
    /// content cannot alias.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};

        let params = serde_json::to_string(&self.params).unwrap_or_default();
        let mut hasher = Sha256::new();
        for part in [self.html.as_str(), self.css.as_str(), params.as_str()] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

type Subscriber = Arc<dyn Fn(StateChange) + Send + Sync>;

struct StoreInner {
    source: TemplateSource,
    params: ParamSet,
    subscribers: HashMap<usize, Subscriber>,
    next_subscriber_id: usize,
}

/// Shared handle to the editor state. Cloning is cheap; all clones see
/// the same state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<StoreInner>>,
    diagnostics: Diagnostics,
}

impl Store {
    pub fn new(html: String, css: String, params: Map<String, Value>, diagnostics: Diagnostics) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                source: TemplateSource { html, css },
                params: ParamSet::from_object(params),
                subscribers: HashMap::new(),
                next_subscriber_id: 0,
            })),
            diagnostics,
        }
    }

    /// Replace the HTML buffer.
    pub fn set_html(&self, html: impl Into<String>) {
        {
            let mut inner = self.lock();
            inner.source.html = html.into();
        }
        self.publish(StateChange::Html);
    }

    /// Replace the CSS buffer.
    pub fn set_css(&self, css: impl Into<String>) {
        {
            let mut inner = self.lock();
            inner.source.css = css.into();
        }
        self.publish(StateChange::Css);
    }

    /// Replace the params buffer with raw editor text.
    ///
    /// Returns true when the text parsed and the object advanced; false
    /// when the previous object was retained (a diagnostic is recorded
    /// and no change is published, so nothing downstream recomputes).
    pub fn set_params_text(&self, text: impl Into<String>) -> bool {
        let parse_result = {
            let mut inner = self.lock();
            inner.params.set_text(text.into())
        };
        match parse_result {
            Ok(()) => {
                self.publish(StateChange::Params);
                true
            }
            Err(err) => {
                self.diagnostics
                    .record(DiagnosticSource::ParamParse, format!("Error parsing JSON: {}", err));
                false
            }
        }
    }

    /// Snapshot of (html, css, parsed params) for the derived stages.
    pub fn snapshot(&self) -> StateSnapshot {
        let inner = self.lock();
        StateSnapshot {
            html: inner.source.html.clone(),
            css: inner.source.css.clone(),
            params: inner.params.object().clone(),
        }
    }

    /// The raw params text as currently shown in the editor.
    pub fn params_text(&self) -> String {
        self.lock().params.text().to_string()
    }

    /// Register a subscriber; returns an id usable with [`Store::unsubscribe`].
    pub fn subscribe<F>(&self, subscriber: F) -> usize
    where
        F: Fn(StateChange) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        inner.subscribers.insert(id, Arc::new(subscriber));
        id
    }

    /// Remove a previously registered subscriber, if present.
    pub fn unsubscribe(&self, id: usize) {
        self.lock().subscribers.remove(&id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        // A poisoned lock only means a mutation panicked mid-write; the
        // buffers themselves are still usable text.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // Subscribers run outside the state lock so they may freely read the
    // store back.
    fn publish(&self, change: StateChange) {
        let subscribers: Vec<Subscriber> = {
            let inner = self.lock();
            inner.subscribers.values().cloned().collect()
        };
        for subscriber in subscribers {
            subscriber(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> Store {
        Store::new(String::new(), String::new(), Map::new(), Diagnostics::new())
    }

    #[test]
    fn valid_params_text_advances_object_and_text() {
        let store = store();
        let text = r#"{"title": "Test", "count": 3}"#;
        assert!(store.set_params_text(text));

        assert_eq!(store.params_text(), text);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.params.get("title").and_then(|v| v.as_str()), Some("Test"));
        assert_eq!(snapshot.params.get("count").and_then(|v| v.as_i64()), Some(3));
    }

    #[test]
    fn invalid_params_text_keeps_previous_object() {
        let diags = Diagnostics::new();
        let store = Store::new(String::new(), String::new(), Map::new(), diags.clone());
        assert!(store.set_params_text(r#"{"title": "Good"}"#));

        assert!(!store.set_params_text(r#"{"title": "Good", "#));

        // Keystrokes survive, last good object is still live.
        assert_eq!(store.params_text(), r#"{"title": "Good", "#);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.params.get("title").and_then(|v| v.as_str()), Some("Good"));
        assert_eq!(diags.count_from(DiagnosticSource::ParamParse), 1);
    }

    #[test]
    fn subscribers_see_html_and_css_changes() {
        let store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        store.subscribe(move |change| seen_clone.lock().unwrap().push(change));

        store.set_html("<h1>hi</h1>");
        store.set_css("h1 { color: red }");

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![StateChange::Html, StateChange::Css]);
    }

    #[test]
    fn params_change_published_only_on_successful_parse() {
        let store = store();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        store.subscribe(move |change| {
            if change == StateChange::Params {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        store.set_params_text("not json");
        assert_eq!(count.load(Ordering::SeqCst), 0);

        store.set_params_text(r#"{"a": 1}"#);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = store();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let id = store.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.set_html("a");
        store.unsubscribe(id);
        store.set_html("b");

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fingerprint_tracks_content_not_field_boundaries() {
        let a = StateSnapshot {
            html: "ab".to_string(),
            css: "c".to_string(),
            params: Map::new(),
        };
        let b = StateSnapshot {
            html: "a".to_string(),
            css: "bc".to_string(),
            params: Map::new(),
        };
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }

    #[test]
    fn subscribers_can_read_the_store_back() {
        let store = store();
        let observed = Arc::new(Mutex::new(String::new()));
        let observed_clone = observed.clone();
        let inner_store = store.clone();
        store.subscribe(move |_| {
            *observed_clone.lock().unwrap() = inner_store.snapshot().html;
        });

        store.set_html("<p>live</p>");
        assert_eq!(*observed.lock().unwrap(), "<p>live</p>");
    }
}
