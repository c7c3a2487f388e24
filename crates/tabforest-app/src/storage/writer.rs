//! Snapshot writer
//!
//! Always writes the current format (version 2). Private tabs never reach
//! the output.

use std::io;

use serde::Serialize;
use serde_json::value::RawValue;

use tabforest_core::prelude::*;
use tabforest_core::{RecoverableBrowserState, RecoverableTab};

/// Format version written by [`BrowserStateWriter`]
pub const SNAPSHOT_VERSION: u32 = 2;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentOut<'a> {
    version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_tab_id: Option<&'a str>,
    sessions: Vec<EntryOut<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryOut<'a> {
    session: SessionOut<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    engine_session: Option<&'a RawValue>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionOut<'a> {
    url: &'a str,
    uuid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_uuid: Option<&'a str>,
    title: &'a str,
    reader_mode_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reader_mode_active_url: Option<&'a str>,
    last_access: i64,
}

impl<'a> From<&'a RecoverableTab> for EntryOut<'a> {
    fn from(tab: &'a RecoverableTab) -> Self {
        Self {
            session: SessionOut {
                url: &tab.url,
                uuid: tab.id.as_str(),
                context_id: tab.context_id.as_deref(),
                parent_uuid: tab.parent_id.as_ref().map(|p| p.as_str()),
                title: &tab.title,
                reader_mode_active: tab.reader.active,
                reader_mode_active_url: tab.reader.active_url.as_deref(),
                last_access: tab.last_access,
            },
            engine_session: tab.engine_state.as_ref().map(|s| s.as_raw()),
        }
    }
}

pub struct BrowserStateWriter;

impl BrowserStateWriter {
    pub fn write<W: io::Write>(state: &RecoverableBrowserState, writer: W) -> Result<()> {
        let sessions: Vec<EntryOut<'_>> = state
            .tabs
            .iter()
            .filter(|t| !t.private)
            .map(EntryOut::from)
            .collect();

        let selected_tab_id = state
            .selected_tab_id
            .as_ref()
            .filter(|id| sessions.iter().any(|s| s.session.uuid == id.as_str()))
            .map(|id| id.as_str());

        let document = DocumentOut {
            version: SNAPSHOT_VERSION,
            selected_tab_id,
            sessions,
        };

        serde_json::to_writer(writer, &document)?;
        Ok(())
    }
}
