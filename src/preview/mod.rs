//! Preview surfaces: the locally assembled document and the remotely
//! rendered image.

pub mod local;
pub mod remote;

pub use local::{preview_document, text_snapshot, TextSnapshot};
pub use remote::RemoteRenderer;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};
use url::Url;

/// State of the remotely rendered preview image.
///
/// `image_data_uri` is empty until the first successful render and keeps
/// its last good value across failed ones. `loading` is true while a
/// render request is outstanding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemotePreview {
    pub image_data_uri: String,
    pub loading: bool,
}

/// Inline-encode image bytes as a data URI.
pub fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

/// The shareable image URL displayed beside the remote preview:
/// `<image host>?template=<id>&<url-encoded params>`.
///
/// Non-string parameter values are carried in their JSON form.
pub fn share_url(image_host: &Url, template_id: &str, params: &Map<String, Value>) -> String {
    let mut url = image_host.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("template", template_id);
        for (key, value) in params {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            pairs.append_pair(key, &text);
        }
    }
    url.to_string()
}
