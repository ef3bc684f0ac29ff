//! HTML for the component grid, the modal form and notifications
//!
//! Templates go through handlebars so every interpolated value is escaped.

use crate::cache::CachedRecord;
use crate::error::Result;
use crate::record::{RecordForm, Status};
use handlebars::Handlebars;
use lazy_static::lazy_static;
use serde::Serialize;

pub const PREVIEW_LIMIT: usize = 120;
pub const EXAMPLES_PREVIEW_LIMIT: usize = 100;
pub const DELETE_CONFIRMATION: &str =
    "Are you sure you want to delete this component? This action cannot be undone.";

const CARD_TEMPLATE: &str = r#"<a class="component-card" href="/components/key/{{key}}/edit" data-position="{{position}}">
  <div class="component-card-header">
    <h3 class="component-name">{{name}}</h3>
    <div class="component-meta">
      <span class="status-badge {{status_class}}">{{status}}</span>
      <span class="category-badge">{{category}}</span>
    </div>
  </div>
  <div class="component-content">
    <div class="content-section">
      <div class="content-label">Usage Guidelines</div>
      <div class="content-text">{{usage_preview}}</div>
    </div>
    <div class="content-section">
      <div class="content-label">Content Guidelines</div>
      <div class="content-text">{{content_preview}}</div>
    </div>
    {{#if examples_preview}}
    <div class="content-section">
      <div class="content-label">Examples</div>
      <div class="content-text content-examples">{{examples_preview}}</div>
    </div>
    {{/if}}
  </div>
</a>"#;

const EMPTY_TEMPLATE: &str = r#"<div class="empty-state">
  <h3>No components found</h3>
  <p>Try adjusting your filters or add a new component.</p>
  <a class="btn btn-primary" href="/components/new">Add Component</a>
</div>"#;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Design System CMS</title>
  <link rel="stylesheet" href="/static/cms.css">
</head>
<body>
  <header class="header">
    <h1>Design System CMS</h1>
    <form method="post" action="/refresh"><button class="btn" type="submit">Refresh</button></form>
    <a class="btn btn-primary" href="/components/new">Add Component</a>
  </header>
  <div id="messageContainer">
    {{#each notices}}<div class="message {{kind}}">{{text}}</div>{{/each}}
  </div>
  <form class="filters" method="get" action="/">
    <select name="category">
      <option value="">All Categories</option>
      {{#each categories}}<option value="{{value}}"{{#if selected}} selected{{/if}}>{{value}}</option>{{/each}}
    </select>
    <select name="status">
      <option value="">All Statuses</option>
      {{#each statuses}}<option value="{{value}}"{{#if selected}} selected{{/if}}>{{value}}</option>{{/each}}
    </select>
    <input type="search" name="q" value="{{search}}" placeholder="Search components...">
    <button class="btn" type="submit">Filter</button>
  </form>
  <main id="componentsGrid" class="components-grid">
{{{grid}}}
  </main>
{{{modal}}}
</body>
</html>"#;

const MODAL_TEMPLATE: &str = r#"<div id="componentModal" class="modal">
  <div class="modal-content">
    <div class="modal-header">
      <h2 id="modalTitle">{{title}}</h2>
      <form method="post" action="/modal/close"><input type="hidden" name="reason" value="close_button"><button class="close" type="submit">&times;</button></form>
    </div>
    {{#if confirm_delete}}
    <div class="confirm">
      <p>{{confirm_text}}</p>
      <form method="post" action="/components/delete/confirm"><button class="btn btn-danger" type="submit">Delete</button></form>
      <form method="post" action="/components/delete/cancel"><button class="btn" type="submit">Keep</button></form>
    </div>
    {{/if}}
    <form id="componentForm" method="post" action="/components">
      <label>Component Name <input name="name" value="{{form.name}}" required></label>
      <label>Figma Node ID <input name="figma_node_id" value="{{form.figma_node_id}}"></label>
      <label>Category <input name="category" value="{{form.category}}"></label>
      <label>Status
        <select name="status">
          {{#each statuses}}<option value="{{value}}"{{#if selected}} selected{{/if}}>{{value}}</option>{{/each}}
        </select>
      </label>
      <label>Usage Guidelines <textarea name="usage_guidelines">{{form.usage_guidelines}}</textarea></label>
      <label>Content Guidelines <textarea name="content_guidelines">{{form.content_guidelines}}</textarea></label>
      <label>Voice &amp; Tone <textarea name="voice_and_tone">{{form.voice_and_tone}}</textarea></label>
      <label>Do's <textarea name="dos">{{form.dos}}</textarea></label>
      <label>Don'ts <textarea name="donts">{{form.donts}}</textarea></label>
      <label>Content Examples <textarea name="content_examples">{{form.content_examples}}</textarea></label>
      <label>Character Limits <input name="character_limits" value="{{form.character_limits}}"></label>
      <label>Accessibility Notes <textarea name="accessibility_notes">{{form.accessibility_notes}}</textarea></label>
      <label>Updated By <input name="updated_by" value="{{form.updated_by}}"></label>
      <div class="modal-actions">
        <button class="btn btn-primary" type="submit">Save</button>
      </div>
    </form>
    <form method="post" action="/modal/close"><input type="hidden" name="reason" value="cancel"><button id="cancelBtn" class="btn" type="submit">Cancel</button></form>
    {{#if show_delete}}
    <form method="post" action="/components/delete"><button id="deleteBtn" class="btn btn-danger" type="submit">Delete</button></form>
    {{/if}}
  </div>
</div>"#;

lazy_static! {
    static ref TEMPLATES: Handlebars<'static> = {
        let mut hb = Handlebars::new();
        hb.set_strict_mode(false);
        hb.register_template_string("card", CARD_TEMPLATE).unwrap();
        hb.register_template_string("empty", EMPTY_TEMPLATE).unwrap();
        hb.register_template_string("page", PAGE_TEMPLATE).unwrap();
        hb.register_template_string("modal", MODAL_TEMPLATE).unwrap();
        hb
    };
}

/// First `max_chars` characters of `text` plus `...`, or `text` itself when short enough
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

/// What a component card shows
#[derive(Debug, Serialize, PartialEq)]
pub struct CardView {
    pub position: usize,
    pub key: String,
    pub name: String,
    pub status: String,
    pub status_class: String,
    pub category: String,
    pub usage_preview: String,
    pub content_preview: String,
    pub examples_preview: Option<String>,
}

impl CardView {
    pub fn new(position: usize, entry: &CachedRecord) -> Self {
        let record = &entry.record;
        let or = |value: &str, fallback: &str| {
            if value.is_empty() {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };

        CardView {
            position,
            key: entry.key.to_string(),
            name: or(&record.name, "Unnamed Component"),
            status: record.status_or_default().to_string(),
            status_class: record.status_or_default().to_lowercase(),
            category: or(&record.category, "Uncategorized"),
            usage_preview: truncate_text(
                &or(&record.usage_guidelines, "No usage guidelines provided"),
                PREVIEW_LIMIT,
            ),
            content_preview: truncate_text(
                &or(&record.content_guidelines, "No content guidelines provided"),
                PREVIEW_LIMIT,
            ),
            examples_preview: (!record.content_examples.is_empty())
                .then(|| truncate_text(&record.content_examples, EXAMPLES_PREVIEW_LIMIT)),
        }
    }
}

pub fn render_card(card: &CardView) -> Result<String> {
    Ok(TEMPLATES.render("card", card)?)
}

/// Cards for the filtered view, or the empty state when there are none
pub fn render_grid(cards: &[CardView]) -> Result<String> {
    if cards.is_empty() {
        return Ok(TEMPLATES.render("empty", &())?);
    }
    let rendered = cards
        .iter()
        .map(render_card)
        .collect::<Result<Vec<_>>>()?;
    Ok(rendered.join("\n"))
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OptionView {
    pub value: String,
    pub selected: bool,
}

pub fn status_options(selected: Option<&str>) -> Vec<OptionView> {
    Status::ALL
        .iter()
        .map(|s| OptionView {
            value: s.as_str().to_string(),
            selected: selected == Some(s.as_str()),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct NoticeView {
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ModalView {
    pub title: &'static str,
    pub show_delete: bool,
    pub confirm_delete: bool,
    pub confirm_text: &'static str,
    pub form: RecordForm,
    pub statuses: Vec<OptionView>,
}

pub fn render_modal(modal: &ModalView) -> Result<String> {
    Ok(TEMPLATES.render("modal", modal)?)
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub notices: Vec<NoticeView>,
    pub categories: Vec<OptionView>,
    pub statuses: Vec<OptionView>,
    pub search: String,
    pub grid: String,
    pub modal: String,
}

pub fn render_page(page: &PageView) -> Result<String> {
    Ok(TEMPLATES.render("page", page)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RecordCache;
    use crate::record::Record;

    fn entry(record: Record) -> CachedRecord {
        let mut cache = RecordCache::new();
        cache.push(2, record);
        cache.get(0).cloned().unwrap()
    }

    #[test]
    fn truncate_keeps_short_text() {
        let text = "a".repeat(120);
        assert_eq!(truncate_text(&text, 120), text);
        assert_eq!(truncate_text("", 120), "");
    }

    #[test]
    fn truncate_cuts_long_text_and_adds_ellipsis() {
        let text = "b".repeat(121);
        let out = truncate_text(&text, 120);
        assert_eq!(out.len(), 123);
        assert!(out.starts_with(&"b".repeat(120)));
        assert!(out.ends_with("..."));
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let text = "é".repeat(5);
        assert_eq!(truncate_text(&text, 3), "ééé...");
    }

    #[test]
    fn card_falls_back_for_empty_fields() {
        let card = CardView::new(3, &entry(Record {
            name: "Button".to_string(),
            ..Record::default()
        }));

        assert_eq!(card.position, 3);
        assert_eq!(card.status, "Draft");
        assert_eq!(card.status_class, "draft");
        assert_eq!(card.category, "Uncategorized");
        assert_eq!(card.usage_preview, "No usage guidelines provided");
        assert_eq!(card.content_preview, "No content guidelines provided");
        assert_eq!(card.examples_preview, None);
    }

    #[test]
    fn card_previews_are_truncated() {
        let card = CardView::new(0, &entry(Record {
            name: "Toast".to_string(),
            status: "Approved".to_string(),
            usage_guidelines: "u".repeat(200),
            content_examples: "e".repeat(150),
            ..Record::default()
        }));

        assert_eq!(card.status_class, "approved");
        assert_eq!(card.usage_preview.chars().count(), 123);
        assert_eq!(card.examples_preview.as_deref().map(str::len), Some(103));
    }

    #[test]
    fn card_html_escapes_user_text() {
        let card = CardView::new(0, &entry(Record {
            name: "<script>alert(1)</script>".to_string(),
            ..Record::default()
        }));
        let html = render_card(&card).unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(&format!("href=\"/components/key/{}/edit\"", card.key)));
        assert!(!html.contains("content-examples"));
    }

    #[test]
    fn empty_grid_offers_creation() {
        let html = render_grid(&[]).unwrap();
        assert!(html.contains("No components found"));
        assert!(html.contains("/components/new"));
    }

    #[test]
    fn status_options_mark_the_selection() {
        let options = status_options(Some("Review"));
        let selected: Vec<&str> = options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(selected, vec!["Review"]);
    }
}
