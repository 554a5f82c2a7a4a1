//! The preview synchronization pipeline.
//!
//! Wires the state store to its three derived effects: the debounced
//! template compile feeding the local preview, the debounced remote
//! render feeding the image preview, and the debounced persistence
//! mirror. Each effect owns its debouncer and its output; the store
//! knows none of them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::blocking::Client;
use url::Url;

use crate::compiler::TemplateCompiler;
use crate::debounce::Debouncer;
use crate::defaults;
use crate::diagnostics::{DiagnosticSource, Diagnostics};
use crate::error::{Error, Result};
use crate::preview::{self, RemotePreview, RemoteRenderer, TextSnapshot};
use crate::publish::Publisher;
use crate::storage::{PersistedState, Storage};
use crate::store::{StateChange, StateSnapshot, Store};
use crate::EditorConfig;

pub struct EditorPipeline {
    store: Store,
    diagnostics: Diagnostics,
    compiled: Arc<Mutex<String>>,
    renderer: Arc<RemoteRenderer>,
    publisher: Publisher,
    image_host: Url,
    subscription: usize,
    compile_debouncer: Debouncer,
    render_debouncer: Debouncer,
    persist_debouncer: Debouncer,
}

impl EditorPipeline {
    /// Build the pipeline: load persisted state (or the built-in example
    /// content), compile the initial local preview, and schedule the
    /// initial remote render and persistence write.
    pub fn new(config: EditorConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        if config.timeout_ms == 0 {
            return Err(Error::ConfigError("timeout_ms must be non-zero".to_string()));
        }
        let render_endpoint = endpoint(&config.service_url, "preview")?;
        let publish_endpoint = endpoint(&config.service_url, "register")?;
        let image_host = Url::parse(&config.image_host)
            .map_err(|e| Error::ConfigError(format!("Invalid image host '{}': {}", config.image_host, e)))?;

        let diagnostics = Diagnostics::new();

        // Persisted state wins over example content; an unreadable file
        // falls back rather than failing startup.
        let initial = match storage.load() {
            Ok(Some(state)) => state,
            Ok(None) => default_state(),
            Err(err) => {
                diagnostics.record(DiagnosticSource::Storage, err.to_string());
                default_state()
            }
        };

        let store = Store::new(initial.html, initial.css, initial.params, diagnostics.clone());

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))?;

        let compiler = Arc::new(TemplateCompiler::new(diagnostics.clone()));
        let renderer = Arc::new(RemoteRenderer::new(
            client.clone(),
            render_endpoint,
            diagnostics.clone(),
        ));
        let publisher = Publisher::new(client, publish_endpoint);

        // Local preview is available immediately; only re-compiles are
        // debounced.
        let snapshot = store.snapshot();
        let compiled = Arc::new(Mutex::new(
            compiler.compile(&snapshot.html, &snapshot.params),
        ));

        let compile_debouncer = {
            let store = store.clone();
            let compiler = compiler.clone();
            let compiled = compiled.clone();
            Debouncer::new(config.compile_debounce, move || {
                let snapshot = store.snapshot();
                let output = compiler.compile(&snapshot.html, &snapshot.params);
                if let Ok(mut slot) = compiled.lock() {
                    *slot = output;
                }
            })
        };

        let render_debouncer = {
            let store = store.clone();
            let renderer = renderer.clone();
            Debouncer::new(config.sync_debounce, move || {
                renderer.render_now(&store.snapshot());
            })
        };

        let persist_debouncer = {
            let store = store.clone();
            let storage = storage.clone();
            let diagnostics = diagnostics.clone();
            let last_written: Mutex<Option<String>> = Mutex::new(None);
            Debouncer::new(config.sync_debounce, move || {
                let snapshot = store.snapshot();
                let fingerprint = snapshot.fingerprint();
                {
                    let last = last_written.lock().unwrap_or_else(|e| e.into_inner());
                    if last.as_deref() == Some(fingerprint.as_str()) {
                        return;
                    }
                }
                let state = PersistedState {
                    html: snapshot.html,
                    css: snapshot.css,
                    params: snapshot.params,
                };
                match storage.store(&state) {
                    Ok(()) => {
                        let mut last = last_written.lock().unwrap_or_else(|e| e.into_inner());
                        *last = Some(fingerprint);
                    }
                    // Failed writes retry on the next flush.
                    Err(err) => diagnostics.record(DiagnosticSource::Storage, err.to_string()),
                }
            })
        };

        let subscription = {
            let compile = compile_debouncer.handle();
            let render = render_debouncer.handle();
            let persist = persist_debouncer.handle();
            store.subscribe(move |change| {
                match change {
                    // CSS never reaches the compiler; the local document
                    // picks it up at assembly time.
                    StateChange::Css => {}
                    StateChange::Html | StateChange::Params => compile.poke(),
                }
                render.poke();
                persist.poke();
            })
        };

        // Kick off the first remote render and the first mirror write.
        render_debouncer.poke();
        persist_debouncer.poke();

        Ok(Self {
            store,
            diagnostics,
            compiled,
            renderer,
            publisher,
            image_host,
            subscription,
            compile_debouncer,
            render_debouncer,
            persist_debouncer,
        })
    }

    // --- Buffer updates ---

    pub fn set_html(&self, html: impl Into<String>) {
        self.store.set_html(html);
    }

    pub fn set_css(&self, css: impl Into<String>) {
        self.store.set_css(css);
    }

    /// Returns true when the text parsed and the parameter object
    /// advanced; false when the previous object was retained.
    pub fn set_params_text(&self, text: impl Into<String>) -> bool {
        self.store.set_params_text(text)
    }

    // --- Derived state ---

    /// The last compiled markup (template applied to params).
    pub fn compiled_html(&self) -> String {
        self.compiled
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// The compiled markup assembled into a standalone document with the
    /// current CSS, ready for an embedded browser frame.
    pub fn preview_document(&self) -> String {
        let snapshot = self.store.snapshot();
        preview::preview_document(&self.compiled_html(), &snapshot.css)
    }

    /// Textual snapshot of the local preview.
    pub fn text_snapshot(&self) -> TextSnapshot {
        preview::text_snapshot(&self.preview_document())
    }

    /// Current remote preview image state.
    pub fn remote_preview(&self) -> RemotePreview {
        self.renderer.preview()
    }

    /// The shareable image URL displayed beside the remote preview.
    pub fn share_url(&self) -> String {
        let snapshot = self.store.snapshot();
        preview::share_url(
            &self.image_host,
            defaults::PLACEHOLDER_TEMPLATE_ID,
            &snapshot.params,
        )
    }

    /// Snapshot of (html, css, parsed params).
    pub fn snapshot(&self) -> StateSnapshot {
        self.store.snapshot()
    }

    /// The raw params text as currently shown in the editor.
    pub fn params_text(&self) -> String {
        self.store.params_text()
    }

    /// Handle to the recoverable-error log.
    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.clone()
    }

    /// Observe remote preview updates.
    pub fn subscribe_preview<F>(&self, observer: F) -> usize
    where
        F: Fn(&RemotePreview) + Send + Sync + 'static,
    {
        self.renderer.subscribe(observer)
    }

    pub fn unsubscribe_preview(&self, id: usize) {
        self.renderer.unsubscribe(id);
    }

    // --- Operations ---

    /// Publish the raw (uncompiled) template under the given API key.
    pub fn publish(&self, api_key: &str) -> Result<String> {
        let snapshot = self.store.snapshot();
        self.publisher.publish(&snapshot.html, &snapshot.css, api_key)
    }

    /// Push all pending debounced work through and wait for it: compile,
    /// remote render, persistence write. One-shot callers and shutdown
    /// paths use this instead of waiting out the quiet windows.
    pub fn flush(&self) {
        self.compile_debouncer.flush();
        self.render_debouncer.flush();
        self.persist_debouncer.flush();
    }

    /// Graceful shutdown: persist pending edits, then stop the workers.
    pub fn close(mut self) {
        self.persist_debouncer.flush();
        self.store.unsubscribe(self.subscription);
        self.compile_debouncer.dispose();
        self.render_debouncer.dispose();
        self.persist_debouncer.dispose();
    }
}

fn endpoint(base: &str, path: &str) -> Result<Url> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), path);
    Url::parse(&joined)
        .map_err(|e| Error::ConfigError(format!("Invalid service URL '{}': {}", joined, e)))
}

fn default_state() -> PersistedState {
    PersistedState {
        html: defaults::HTML_EXAMPLE.to_string(),
        css: defaults::CSS_EXAMPLE.to_string(),
        params: defaults::default_params(),
    }
}
