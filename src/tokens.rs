//! Design token previews: a color palette and a type scale
//!
//! Input is a token document of the form
//! `{"global": {"<name>": {"$type": "color", "$value": "#fff"}, "fontSize": {...}}}`.

use crate::error::Result;
use handlebars::Handlebars;
use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub const SAMPLE_SENTENCE: &str = "The quick brown fox jumps over the lazy dog";

const PALETTE_TEMPLATE: &str = r#"<div class="token-palette" style="display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 20px; padding: 20px;">
{{#each swatches}}  <div style="text-align: center;">
    <div style="width: 100%; height: 100px; background: {{value}}; border-radius: 8px; border: 1px solid #ddd;"></div>
    <h4>{{name}}</h4>
    <code>{{value}}</code>
  </div>
{{/each}}</div>"#;

const TYPE_SCALE_TEMPLATE: &str = r#"<div class="token-type-scale" style="padding: 20px;">
  <h2>Font Families</h2>
{{#each families}}  <p style="font-family: {{value}}">{{name}}: {{../sample}}</p>
{{/each}}  <h2>Font Sizes</h2>
{{#each sizes}}  <p style="font-size: {{value}}px">{{name}} - {{value}}px</p>
{{/each}}</div>"#;

lazy_static! {
    static ref TEMPLATES: Handlebars<'static> = {
        let mut hb = Handlebars::new();
        hb.register_template_string("palette", PALETTE_TEMPLATE).unwrap();
        hb.register_template_string("type_scale", TYPE_SCALE_TEMPLATE).unwrap();
        hb
    };
}

/// A parsed token document
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenSet {
    global: Map<String, Value>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TokenEntry {
    pub name: String,
    pub value: String,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn token_value(token: &Value) -> Option<String> {
    token.get("$value").map(value_text)
}

impl TokenSet {
    pub fn parse(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        let global = match root.get("global") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        Ok(TokenSet { global })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Top-level tokens typed `color`, in document order
    pub fn colors(&self) -> Vec<TokenEntry> {
        self.global
            .iter()
            .filter(|(_, token)| token.get("$type").and_then(Value::as_str) == Some("color"))
            .filter_map(|(name, token)| {
                token_value(token).map(|value| TokenEntry {
                    name: name.clone(),
                    value,
                })
            })
            .collect()
    }

    fn group(&self, name: &str) -> Vec<TokenEntry> {
        match self.global.get(name) {
            Some(Value::Object(group)) => group
                .iter()
                .filter_map(|(name, token)| {
                    token_value(token).map(|value| TokenEntry {
                        name: name.clone(),
                        value,
                    })
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn font_families(&self) -> Vec<TokenEntry> {
        self.group("fontFamilies")
    }

    pub fn font_sizes(&self) -> Vec<TokenEntry> {
        self.group("fontSize")
    }
}

/// One swatch per color token
pub fn color_palette(tokens: &TokenSet) -> Result<String> {
    let data = serde_json::json!({ "swatches": tokens.colors() });
    Ok(TEMPLATES.render("palette", &data)?)
}

/// Font family samples followed by the font size ladder
pub fn type_scale(tokens: &TokenSet) -> Result<String> {
    let data = serde_json::json!({
        "families": tokens.font_families(),
        "sizes": tokens.font_sizes(),
        "sample": SAMPLE_SENTENCE,
    });
    Ok(TEMPLATES.render("type_scale", &data)?)
}
