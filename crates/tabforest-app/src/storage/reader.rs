//! Streaming reader for browser state snapshots
//!
//! The document is consumed token by token through serde seeds; tabs are
//! filtered as they stream past and engine blobs are handed to the engine
//! as raw JSON text. Nothing is buffered into a `serde_json::Value`.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::value::RawValue;

use tabforest_core::prelude::*;
use tabforest_core::{ReaderState, RecoverableBrowserState, RecoverableTab, TabId};
use tabforest_engine::Engine;

use crate::config::StorageSettings;

/// Version assumed for documents without a `version` key
const LEGACY_VERSION: u32 = 1;

pub type TabPredicate = Arc<dyn Fn(&RecoverableTab) -> bool + Send + Sync>;

/// How a snapshot is turned back into tabs
#[derive(Clone)]
pub struct ReadOptions {
    /// Keep the stored tab ids; otherwise every tab gets a fresh id
    pub restore_session_id: bool,
    /// Keep parent links; otherwise every restored tab becomes a root
    pub restore_parent_id: bool,
    /// Tabs rejected here are dropped while streaming
    pub predicate: Option<TabPredicate>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore_session_id(mut self, restore: bool) -> Self {
        self.restore_session_id = restore;
        self
    }

    pub fn restore_parent_id(mut self, restore: bool) -> Self {
        self.restore_parent_id = restore;
        self
    }

    pub fn filter(mut self, predicate: impl Fn(&RecoverableTab) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    fn accepts(&self, tab: &RecoverableTab) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(tab))
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            restore_session_id: true,
            restore_parent_id: true,
            predicate: None,
        }
    }
}

impl From<&StorageSettings> for ReadOptions {
    fn from(settings: &StorageSettings) -> Self {
        Self::default().restore_parent_id(settings.restore_parent_ids)
    }
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("restore_session_id", &self.restore_session_id)
            .field("restore_parent_id", &self.restore_parent_id)
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}

pub struct BrowserStateReader;

impl BrowserStateReader {
    /// Read a snapshot document.
    ///
    /// Returns `Ok(None)` when no tab survives filtering. Structural problems
    /// (missing `url`/`uuid`, unknown session keys, bad JSON) fail the whole
    /// read with [`Error::MalformedSnapshot`].
    pub fn read<E, R>(engine: &E, reader: R, options: &ReadOptions) -> Result<Option<RecoverableBrowserState>>
    where
        E: Engine,
        R: io::Read,
    {
        let mut de = serde_json::Deserializer::from_reader(reader);
        let document = DocumentSeed { engine, options }
            .deserialize(&mut de)
            .map_err(snapshot_error)?;
        de.end().map_err(snapshot_error)?;

        Ok(document.resolve())
    }
}

fn snapshot_error(e: serde_json::Error) -> Error {
    if e.is_io() {
        Error::Io(e.into())
    } else {
        Error::malformed_snapshot(e.to_string())
    }
}

/// Top-level fields, collected in whatever order the document has them
struct Document {
    version: u32,
    selected_index: Option<i64>,
    selected_tab_id: Option<String>,
    tabs: Vec<RecoverableTab>,
    /// Stored id to restored id, when ids were regenerated
    renamed: HashMap<TabId, TabId>,
}

impl Document {
    fn resolve(mut self) -> Option<RecoverableBrowserState> {
        if self.tabs.is_empty() {
            return None;
        }

        if !self.renamed.is_empty() {
            for tab in self.tabs.iter_mut() {
                if let Some(parent) = tab.parent_id.as_ref().and_then(|p| self.renamed.get(p)) {
                    tab.parent_id = Some(parent.clone());
                }
            }
        }

        let selected = if self.version >= 2 {
            self.selected_tab_id.map(TabId::new).map(|id| {
                self.renamed.get(&id).cloned().unwrap_or(id)
            })
        } else {
            self.selected_index
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| self.tabs.get(i))
                .map(|t| t.id.clone())
        };

        let selected_tab_id = selected
            .filter(|id| self.tabs.iter().any(|t| &t.id == id))
            .or_else(|| most_recently_accessed(&self.tabs));

        Some(RecoverableBrowserState {
            tabs: self.tabs,
            selected_tab_id,
        })
    }
}

/// First tab with the highest `last_access`
fn most_recently_accessed(tabs: &[RecoverableTab]) -> Option<TabId> {
    let mut best: Option<&RecoverableTab> = None;
    for tab in tabs {
        if best.map_or(true, |b| tab.last_access > b.last_access) {
            best = Some(tab);
        }
    }
    best.map(|t| t.id.clone())
}

struct DocumentSeed<'a, E> {
    engine: &'a E,
    options: &'a ReadOptions,
}

impl<'de, E: Engine> DeserializeSeed<'de> for DocumentSeed<'_, E> {
    type Value = Document;

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Document, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, E: Engine> Visitor<'de> for DocumentSeed<'_, E> {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a browser state document")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Document, A::Error> {
        let mut document = Document {
            version: LEGACY_VERSION,
            selected_index: None,
            selected_tab_id: None,
            tabs: Vec::new(),
            renamed: HashMap::new(),
        };

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "version" => document.version = map.next_value()?,
                "selectedIndex" => document.selected_index = map.next_value()?,
                "selectedTabId" => document.selected_tab_id = map.next_value()?,
                "sessions" => {
                    map.next_value_seed(SessionsSeed {
                        engine: self.engine,
                        options: self.options,
                        document: &mut document,
                    })?;
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(document)
    }
}

struct SessionsSeed<'a, E> {
    engine: &'a E,
    options: &'a ReadOptions,
    document: &'a mut Document,
}

impl<'de, E: Engine> DeserializeSeed<'de> for SessionsSeed<'_, E> {
    type Value = ();

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, E: Engine> Visitor<'de> for SessionsSeed<'_, E> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of sessions")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        while let Some(mut tab) = seq.next_element_seed(EntrySeed {
            engine: self.engine,
        })? {
            if !self.options.accepts(&tab) {
                trace!("Snapshot tab {} filtered out", tab.id);
                continue;
            }
            if !self.options.restore_session_id {
                let fresh = TabId::generate();
                self.document.renamed.insert(tab.id.clone(), fresh.clone());
                tab.id = fresh;
            }
            if !self.options.restore_parent_id {
                tab.parent_id = None;
            }
            self.document.tabs.push(tab);
        }
        Ok(())
    }
}

/// One element of `sessions`: `{ "session": {...}, "engineSession": ... }`
struct EntrySeed<'a, E> {
    engine: &'a E,
}

impl<'de, E: Engine> DeserializeSeed<'de> for EntrySeed<'_, E> {
    type Value = RecoverableTab;

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> std::result::Result<RecoverableTab, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, E: Engine> Visitor<'de> for EntrySeed<'_, E> {
    type Value = RecoverableTab;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a session entry")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<RecoverableTab, A::Error> {
        let mut session: Option<SessionRecord> = None;
        let mut engine_state = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "session" => session = Some(map.next_value()?),
                "engineSession" => {
                    let raw: Option<Box<RawValue>> = map.next_value()?;
                    engine_state = raw
                        .map(|raw| self.engine.create_session_state(&raw))
                        .transpose()
                        .map_err(de::Error::custom)?;
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        let session = session.ok_or_else(|| de::Error::missing_field("session"))?;
        let mut tab = session.into_tab();
        tab.engine_state = engine_state;
        Ok(tab)
    }
}

/// The `session` object; any key not listed here fails the read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SessionRecord {
    url: String,
    uuid: String,
    #[serde(default)]
    context_id: Option<String>,
    #[serde(default)]
    parent_uuid: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    reader_mode_active: bool,
    #[serde(default)]
    reader_mode_active_url: Option<String>,
    #[serde(default)]
    last_access: i64,
    /// Accepted and discarded
    #[serde(default, rename = "source")]
    _source: Option<IgnoredAny>,
}

impl SessionRecord {
    fn into_tab(self) -> RecoverableTab {
        RecoverableTab {
            id: TabId::new(self.uuid),
            parent_id: self.parent_uuid.filter(|p| !p.is_empty()).map(TabId::new),
            url: self.url,
            title: self.title.unwrap_or_default(),
            context_id: self.context_id,
            last_access: self.last_access,
            private: false,
            reader: ReaderState {
                active: self.reader_mode_active,
                active_url: self.reader_mode_active_url,
            },
            engine_state: None,
        }
    }
}
