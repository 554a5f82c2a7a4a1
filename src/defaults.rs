//! Built-in example content used when durable storage is empty.

use serde_json::{Map, Value};

/// Example template shown on first launch
pub const HTML_EXAMPLE: &str = r#"<div class="Main">
  <div class="Inner">
    <div class="Content">
      <div class="Eyebrow">example.com</div>
      <h1>{{title}}</h1>
      <h2>Social previews, rendered for you</h2>
    </div>
  </div>
  <div class="Watermark"><span class="Watermark-logo">OG</span> IMPACT</div>
</div>
"#;

/// Example stylesheet shown on first launch
pub const CSS_EXAMPLE: &str = r#".Background {
  position: absolute;
  left: 0;
  top: 0;
  width: 100%;
  height: 100%;
  z-index: -1;
}

.Main {
  background: lightgray;
  font-family: "Avenir Next";
  position: relative;
  width: 100%;
  height: 100%;
  z-index: -2;
}

.Inner {
  align-items: center;
  display: flex;
  width: 100%;
  height: 100%;
}

.Content {
  padding: 32px;
  padding-top: 16px;
}

.Eyebrow {
  font-weight: 600;
  margin-bottom: 8px
}

h1, h2 {
  margin: 0;
  padding: 0;
  font-weight: 400;
  line-height: 1.2;
}

h1 {
  font-size: 48px;
  font-weight: 700;
  margin-bottom: 8px;
}

.Watermark {
  position: absolute;
  font-size: 18px;
  opacity: 0.8;
  left: 32px;
  bottom: 32px;
}

.Watermark-logo {
  font-weight: 700;
}

body, html {
  height: 100%;
  padding: 0;
  margin: 0;
}
"#;

/// Template id shown in the share URL before the user has published
pub const PLACEHOLDER_TEMPLATE_ID: &str = "a1b2c3d";

/// Example parameter set shown on first launch
pub fn default_params() -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("title".to_string(), Value::String("Hello, World!".to_string()));
    params
}
