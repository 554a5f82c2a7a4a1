//! Async-friendly editor facade backed by a dedicated worker thread.
//!
//! The worker thread owns the synchronous [`EditorPipeline`] (and with
//! it the blocking HTTP client) and executes commands sent from async
//! tasks, so async hosts never block on a render or publish call.

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use tokio::sync::oneshot;

use crate::pipeline::EditorPipeline;
use crate::preview::{RemotePreview, TextSnapshot};
use crate::storage::Storage;
use crate::{EditorConfig, Error, Result};

enum Command {
    SetHtml(String, oneshot::Sender<()>),
    SetCss(String, oneshot::Sender<()>),
    SetParamsText(String, oneshot::Sender<bool>),
    CompiledHtml(oneshot::Sender<String>),
    PreviewDocument(oneshot::Sender<String>),
    Snapshot(oneshot::Sender<TextSnapshot>),
    Preview(oneshot::Sender<RemotePreview>),
    ShareUrl(oneshot::Sender<String>),
    Publish(String, oneshot::Sender<Result<String>>),
    Flush(oneshot::Sender<()>),
    Close(oneshot::Sender<()>),
}

/// A cloneable async handle to an editor pipeline.
#[derive(Clone)]
pub struct AsyncEditor {
    cmd_tx: Sender<Command>,
}

impl AsyncEditor {
    /// Create a new editor (spawns a worker thread that owns the pipeline).
    pub async fn new(config: EditorConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Initialize the pipeline on the worker thread
            let pipeline = match EditorPipeline::new(config, storage) {
                Ok(p) => p,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            // Command loop
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::SetHtml(html, resp) => {
                        pipeline.set_html(html);
                        let _ = resp.send(());
                    }
                    Command::SetCss(css, resp) => {
                        pipeline.set_css(css);
                        let _ = resp.send(());
                    }
                    Command::SetParamsText(text, resp) => {
                        let _ = resp.send(pipeline.set_params_text(text));
                    }
                    Command::CompiledHtml(resp) => {
                        let _ = resp.send(pipeline.compiled_html());
                    }
                    Command::PreviewDocument(resp) => {
                        let _ = resp.send(pipeline.preview_document());
                    }
                    Command::Snapshot(resp) => {
                        let _ = resp.send(pipeline.text_snapshot());
                    }
                    Command::Preview(resp) => {
                        let _ = resp.send(pipeline.remote_preview());
                    }
                    Command::ShareUrl(resp) => {
                        let _ = resp.send(pipeline.share_url());
                    }
                    Command::Publish(api_key, resp) => {
                        let _ = resp.send(pipeline.publish(&api_key));
                    }
                    Command::Flush(resp) => {
                        pipeline.flush();
                        let _ = resp.send(());
                    }
                    Command::Close(resp) => {
                        pipeline.close();
                        let _ = resp.send(());
                        return;
                    }
                }
            }
            // Channel closed without an explicit Close: drop the
            // pipeline, discarding pending debounced work.
        });

        let init_res = init_rx
            .await
            .map_err(|e| Error::InitializationError(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    pub async fn set_html(&self, html: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::SetHtml(html.to_string(), tx));
        rx.await
            .map_err(|e| Error::Other(format!("SetHtml canceled: {}", e)))
    }

    pub async fn set_css(&self, css: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::SetCss(css.to_string(), tx));
        rx.await
            .map_err(|e| Error::Other(format!("SetCss canceled: {}", e)))
    }

    /// Returns true when the text parsed and the parameter object advanced.
    pub async fn set_params_text(&self, text: &str) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(Command::SetParamsText(text.to_string(), tx));
        rx.await
            .map_err(|e| Error::Other(format!("SetParamsText canceled: {}", e)))
    }

    pub async fn compiled_html(&self) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::CompiledHtml(tx));
        rx.await
            .map_err(|e| Error::Other(format!("CompiledHtml canceled: {}", e)))
    }

    pub async fn preview_document(&self) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::PreviewDocument(tx));
        rx.await
            .map_err(|e| Error::Other(format!("PreviewDocument canceled: {}", e)))
    }

    pub async fn text_snapshot(&self) -> Result<TextSnapshot> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Snapshot(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Snapshot canceled: {}", e)))
    }

    pub async fn remote_preview(&self) -> Result<RemotePreview> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Preview(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Preview canceled: {}", e)))
    }

    pub async fn share_url(&self) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::ShareUrl(tx));
        rx.await
            .map_err(|e| Error::Other(format!("ShareUrl canceled: {}", e)))
    }

    pub async fn publish(&self, api_key: &str) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Publish(api_key.to_string(), tx));
        let res = rx
            .await
            .map_err(|e| Error::Other(format!("Publish canceled: {}", e)))?;
        res
    }

    /// Push all pending debounced work through and wait for it.
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Flush(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Flush canceled: {}", e)))
    }

    /// Shutdown the worker, persisting pending edits first.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))
    }
}
