//! Debounced remote rasterization.
//!
//! The renderer POSTs the raw (uncompiled) template to the hosted
//! rendering service and keeps the last good image as a data URI. It is
//! driven from a debounce worker thread, which owns the blocking HTTP
//! dispatch; callers only ever read the [`RemotePreview`] snapshot or
//! subscribe to updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use reqwest::blocking::Client;
use serde_json::{Map, Value};
use url::Url;

use crate::diagnostics::{DiagnosticSource, Diagnostics};
use crate::preview::{data_uri, RemotePreview};
use crate::store::StateSnapshot;

type PreviewObserver = Arc<dyn Fn(&RemotePreview) + Send + Sync>;

pub struct RemoteRenderer {
    client: Client,
    endpoint: Url,
    preview: Mutex<RemotePreview>,
    last_dispatched: Mutex<Option<String>>,
    observers: Mutex<HashMap<usize, PreviewObserver>>,
    next_observer_id: Mutex<usize>,
    diagnostics: Diagnostics,
}

impl RemoteRenderer {
    pub fn new(client: Client, endpoint: Url, diagnostics: Diagnostics) -> Self {
        Self {
            client,
            endpoint,
            preview: Mutex::new(RemotePreview::default()),
            last_dispatched: Mutex::new(None),
            observers: Mutex::new(HashMap::new()),
            next_observer_id: Mutex::new(0),
            diagnostics,
        }
    }

    /// Current preview state.
    pub fn preview(&self) -> RemotePreview {
        self.preview.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Observe preview updates (loading transitions and new images).
    /// Returns an id usable with [`RemoteRenderer::unsubscribe`].
    pub fn subscribe<F>(&self, observer: F) -> usize
    where
        F: Fn(&RemotePreview) + Send + Sync + 'static,
    {
        let id = {
            let mut next = self.next_observer_id.lock().unwrap_or_else(|e| e.into_inner());
            let id = *next;
            *next += 1;
            id
        };
        if let Ok(mut observers) = self.observers.lock() {
            observers.insert(id, Arc::new(observer));
        }
        id
    }

    pub fn unsubscribe(&self, id: usize) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.remove(&id);
        }
    }

    /// Render the settled state now, blocking the calling thread for the
    /// duration of the HTTP exchange.
    ///
    /// Dispatch is skipped when `snapshot` fingerprints identically to
    /// the last dispatched state. Every failure mode (network error,
    /// non-2xx, non-image content type) retains the previous image and
    /// records a diagnostic; the loading flag resets regardless of
    /// outcome.
    pub fn render_now(&self, snapshot: &StateSnapshot) {
        let fingerprint = snapshot.fingerprint();
        {
            let mut last = self.last_dispatched.lock().unwrap_or_else(|e| e.into_inner());
            if last.as_deref() == Some(fingerprint.as_str()) {
                log::debug!("remote render skipped: state unchanged");
                return;
            }
            *last = Some(fingerprint);
        }

        self.set_loading(true);
        match self.fetch_image(snapshot) {
            Ok((content_type, bytes)) => {
                let uri = data_uri(&content_type, &bytes);
                if let Ok(mut preview) = self.preview.lock() {
                    preview.image_data_uri = uri;
                }
            }
            // Every failure mode keeps the previous image.
            Err(message) => {
                self.diagnostics.record(DiagnosticSource::RemoteRender, message);
            }
        }
        self.set_loading(false);
    }

    fn fetch_image(&self, snapshot: &StateSnapshot) -> std::result::Result<(String, Vec<u8>), String> {
        let body = render_request_body(snapshot);
        let payload = serde_json::to_string(&body)
            .map_err(|e| format!("Failed to serialize render request: {}", e))?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .header("Accept", "image/*")
            .body(payload)
            .send()
            .map_err(|e| format!("Render request failed: {}", e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let bytes = response
            .bytes()
            .map_err(|e| format!("Failed to read render response: {}", e))?;

        if !status.is_success() {
            return Err(format!("Render service returned {}", status));
        }
        if !content_type.starts_with("image/") {
            return Err(format!(
                "Render service returned non-image content-type '{}'",
                content_type
            ));
        }
        Ok((content_type, bytes.to_vec()))
    }

    fn set_loading(&self, loading: bool) {
        let current = {
            match self.preview.lock() {
                Ok(mut preview) => {
                    preview.loading = loading;
                    preview.clone()
                }
                Err(_) => return,
            }
        };
        let observers: Vec<PreviewObserver> = self
            .observers
            .lock()
            .map(|o| o.values().cloned().collect())
            .unwrap_or_default();
        for observer in observers {
            observer(&current);
        }
    }
}

/// The render request body: `{ "body": html, "styles": css, ...params }`.
///
/// Parameter keys are spread at the top level, so a param named `body`
/// or `styles` silently overrides the template content. The hosted
/// service defines this shape; it is deliberately not guarded here.
fn render_request_body(snapshot: &StateSnapshot) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("body".to_string(), Value::String(snapshot.html.clone()));
    body.insert("styles".to_string(), Value::String(snapshot.css.clone()));
    for (key, value) in &snapshot.params {
        body.insert(key.clone(), value.clone());
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(html: &str, css: &str, params: &str) -> StateSnapshot {
        StateSnapshot {
            html: html.to_string(),
            css: css.to_string(),
            params: serde_json::from_str(params).unwrap(),
        }
    }

    #[test]
    fn request_body_spreads_params_at_top_level() {
        let body = render_request_body(&snapshot("<h1>{{title}}</h1>", "h1{}", r#"{"title": "T"}"#));
        assert_eq!(body.get("body").and_then(|v| v.as_str()), Some("<h1>{{title}}</h1>"));
        assert_eq!(body.get("styles").and_then(|v| v.as_str()), Some("h1{}"));
        assert_eq!(body.get("title").and_then(|v| v.as_str()), Some("T"));
    }

    #[test]
    fn reserved_keys_collide_with_params() {
        // Known sharp edge: a param named `body` overrides the template.
        let body = render_request_body(&snapshot("<h1>real</h1>", "", r#"{"body": "override"}"#));
        assert_eq!(body.get("body").and_then(|v| v.as_str()), Some("override"));
    }
}
