/*!
# Component CMS

A small content-management front end for design-system component
documentation, kept in a Google Sheets tab and served as a server-rendered
web app.

## Overview

Each sheet row after the header describes one component: name, Figma node id,
category, review status, usage and content guidelines, voice and tone, do's
and don'ts, examples, character limits, accessibility notes, last-updated
date and author. The app loads every row into memory, shows the rows as
cards that can be filtered by category, status and free text, and edits them
through a single modal form.

## Architecture

### Remote Tabular Store Adapter (`sheet`)
- Reads the configured range, maps rows by header name, drops nameless rows
- Writes one record per request to a fixed 14-column row (A through N)
- Remembers the sheet row of every record; appends go past the last used row
- Deletes by clearing the row in place, later rows never shift

### Record Cache & Filter Engine (`cache`)
- Authoritative, sheet-ordered record list
- Conjunctive category / status / search filter as a lazy view
- Stable in-memory keys that resolve back to positions

### Presentation/Interaction Controller (`controller`, `render`)
- Modal state machine: closed, creating, editing
- Card grid with truncated previews and an empty state
- Success and error notifications

### Design Tokens (`tokens`)
- Color palette and type scale previews from a token JSON file

## Modules

- **error**: error taxonomy and user-facing messages
- **config**: sheet configuration and validation
- **record**: record fields, column order, modal form
- **sheet**: store adapter, HTTP and in-memory transports
- **cache**: record cache and filters
- **render**: HTML templates
- **controller**: user actions
- **tokens**: design token previews
- **app**: routing (feature `web`)
*/

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod record;
pub mod render;
pub mod sheet;
pub mod tokens;

#[cfg(feature = "web")]
pub mod app;

pub use cache::{CachedRecord, Filter, RecordCache, RecordKey};
pub use config::SheetConfig;
pub use controller::{CloseReason, Controller, ModalState, Notice, NoticeKind};
pub use error::{CmsError, Result};
pub use record::{Record, RecordForm, Status};
pub use sheet::{
    HttpSheetTransport, MemorySheet, SheetAdapter, SheetContents, SheetRecord, SheetTransport,
};
pub use tokens::TokenSet;
