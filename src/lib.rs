//! OG Editor Engine
//!
//! A headless, UI-framework-agnostic engine for editing OpenGraph image
//! templates. The engine owns three editable buffers (HTML/Handlebars,
//! CSS, JSON params) and keeps two previews in sync: a locally compiled
//! HTML document and a remotely rasterized image fetched from a hosted
//! rendering service. Editable state is mirrored into durable local
//! storage, and templates can be published to the service under an API
//! key.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ogeditor::{EditorConfig, EditorPipeline, FileStorage};
//!
//! # fn main() -> ogeditor::Result<()> {
//! let pipeline = EditorPipeline::new(
//!     EditorConfig::default(),
//!     Arc::new(FileStorage::new("editor-state.json")),
//! )?;
//!
//! pipeline.set_params_text(r#"{ "title": "Launch day" }"#);
//! pipeline.flush();
//!
//! println!("{}", pipeline.preview_document());
//! println!("{}", pipeline.remote_preview().image_data_uri);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod compiler;
pub mod debounce;
pub mod defaults;
pub mod diagnostics;
pub mod pipeline;
pub mod preview;
pub mod publish;
pub mod storage;
pub mod store;

// Async-friendly editor API (worker-backed abstraction)
pub mod async_api;

pub use async_api::AsyncEditor;
pub use compiler::TemplateCompiler;
pub use debounce::{DebounceHandle, DebouncePolicy, Debouncer};
pub use diagnostics::{Diagnostic, DiagnosticSource, Diagnostics};
pub use pipeline::EditorPipeline;
pub use preview::{RemotePreview, TextSnapshot};
pub use publish::Publisher;
pub use storage::{FileStorage, MemoryStorage, PersistedState, Storage};
pub use store::{ParamSet, StateChange, StateSnapshot, Store, TemplateSource};

/// Configuration for the editor pipeline
///
/// The defaults point at the public hosted rendering service and use the
/// debounce windows the editor UI was tuned with: local re-compiles
/// settle after 500ms of quiet, remote renders and persistence writes
/// after 1s with a 5s staleness ceiling.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Base URL of the hosted rendering service
    pub service_url: String,
    /// Host used to build the shareable image URL
    pub image_host: String,
    /// User agent string to send with service requests
    pub user_agent: String,
    /// Timeout for service calls in milliseconds
    pub timeout_ms: u64,
    /// Quiet window for local template re-compiles
    pub compile_debounce: DebouncePolicy,
    /// Quiet window and staleness ceiling shared by the remote renderer
    /// and the persistence mirror (each gets its own instance)
    pub sync_debounce: DebouncePolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            service_url: "https://ssfy.sh/chrisvxd/og-impact".to_string(),
            image_host: "https://ogi.sh".to_string(),
            user_agent: "OGEditor/0.1 (headless)".to_string(),
            timeout_ms: 30000,
            compile_debounce: DebouncePolicy::trailing(500),
            sync_debounce: DebouncePolicy::with_max_wait(1000, 5000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert!(config.service_url.starts_with("https://"));
        assert_eq!(config.compile_debounce, DebouncePolicy::trailing(500));
        assert_eq!(config.sync_debounce, DebouncePolicy::with_max_wait(1000, 5000));
        assert_eq!(config.timeout_ms, 30000);
    }
}
