//! Read-only access to the legacy document store.
//!
//! The import only ever needs two operations per collection: iterate every
//! document in the store's natural order, and look one up by id. The
//! [`LegacyStore`] trait captures exactly that so the import logic does not
//! depend on any particular document-store client. [`JsonDumpStore`] serves
//! a collection export (one JSON array per collection) from memory.
//!
//! Documents are decoded one at a time. A document that does not fit the
//! model is left out of its collection and kept as a [`RejectedDocument`],
//! so the imports can report it as a skipped record.

use std::collections::HashMap;
use std::path::Path;

use agenda_shared::constants::{LEGACY_ITEMS_FILE, LEGACY_NOTES_FILE, LEGACY_USERS_FILE};
use agenda_shared::legacy::{LegacyDocument, LegacyItem, LegacyNote, LegacyUser};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, StoreError};

/// Read interface of the legacy store. Never mutates it.
///
/// `get_*` with `required == true` turns a missing document into an error;
/// otherwise a missing document is `Ok(None)`.
pub trait LegacyStore: Send + Sync {
    fn find_all_users(&self) -> Result<Vec<LegacyUser>>;
    fn find_all_items(&self) -> Result<Vec<LegacyItem>>;
    fn find_all_notes(&self) -> Result<Vec<LegacyNote>>;

    fn get_item(&self, id: &str, required: bool) -> Result<Option<LegacyItem>>;
    fn get_note(&self, id: &str, required: bool) -> Result<Option<LegacyNote>>;

    /// Documents of `collection` that could not be decoded.
    fn rejected(&self, _collection: &str) -> Vec<RejectedDocument> {
        Vec::new()
    }
}

/// A legacy document left out because it does not fit the document model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedDocument {
    /// The document's `_id`, or `#<index>` when even that is unreadable.
    pub id: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Documents of one collection in export order, indexed by id.
#[derive(Debug, Clone)]
pub struct LegacyCollection<D> {
    docs: Vec<D>,
    by_id: HashMap<String, usize>,
    rejected: Vec<RejectedDocument>,
}

impl<D: LegacyDocument + Clone> LegacyCollection<D> {
    pub fn new(docs: Vec<D>) -> Self {
        Self::with_rejected(docs, Vec::new())
    }

    pub fn with_rejected(docs: Vec<D>, rejected: Vec<RejectedDocument>) -> Self {
        let mut by_id = HashMap::with_capacity(docs.len());
        for (idx, doc) in docs.iter().enumerate() {
            if by_id.contains_key(doc.id()) {
                tracing::warn!(
                    collection = D::COLLECTION,
                    id = doc.id(),
                    "duplicate legacy id, lookups return the first document"
                );
                continue;
            }
            by_id.insert(doc.id().to_string(), idx);
        }
        Self {
            docs,
            by_id,
            rejected,
        }
    }

    pub fn rejected(&self) -> &[RejectedDocument] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn find_all(&self) -> Vec<D> {
        self.docs.clone()
    }

    pub fn get_by_id(&self, id: &str, required: bool) -> Result<Option<D>> {
        match self.by_id.get(id) {
            Some(&idx) => Ok(Some(self.docs[idx].clone())),
            None if required => Err(StoreError::Legacy(format!(
                "{} document {id} not found",
                D::COLLECTION
            ))),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON dump
// ---------------------------------------------------------------------------

/// A legacy store loaded from a directory holding `users.json`,
/// `items.json` and `notes.json`.
#[derive(Debug, Clone)]
pub struct JsonDumpStore {
    users: LegacyCollection<LegacyUser>,
    items: LegacyCollection<LegacyItem>,
    notes: LegacyCollection<LegacyNote>,
}

impl JsonDumpStore {
    pub fn from_documents(
        users: Vec<LegacyUser>,
        items: Vec<LegacyItem>,
        notes: Vec<LegacyNote>,
    ) -> Self {
        Self {
            users: LegacyCollection::new(users),
            items: LegacyCollection::new(items),
            notes: LegacyCollection::new(notes),
        }
    }

    /// Load every collection file from `dir`. A missing file is an error:
    /// the seed runs once, and an incomplete dump would silently leave
    /// tables empty.
    pub fn open_dir(dir: &Path) -> Result<Self> {
        let store = Self {
            users: read_collection(&dir.join(LEGACY_USERS_FILE))?,
            items: read_collection(&dir.join(LEGACY_ITEMS_FILE))?,
            notes: read_collection(&dir.join(LEGACY_NOTES_FILE))?,
        };

        tracing::info!(
            dir = %dir.display(),
            users = store.users.len(),
            items = store.items.len(),
            notes = store.notes.len(),
            rejected = store.users.rejected().len()
                + store.items.rejected().len()
                + store.notes.rejected().len(),
            "loaded legacy dump"
        );

        Ok(store)
    }
}

/// Read one collection file. Only an unreadable file or a body that is not a
/// JSON array fails; individual documents are rejected one by one.
fn read_collection<D: DeserializeOwned + LegacyDocument + Clone>(
    path: &Path,
) -> Result<LegacyCollection<D>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        StoreError::Legacy(format!("cannot read {}: {e}", path.display()))
    })?;
    let values: Vec<Value> = serde_json::from_str(&raw)?;

    let mut docs = Vec::with_capacity(values.len());
    let mut rejected = Vec::new();
    for (idx, value) in values.into_iter().enumerate() {
        let id = document_id(&value).unwrap_or_else(|| format!("#{idx}"));
        match serde_json::from_value::<D>(value) {
            Ok(doc) => docs.push(doc),
            Err(e) => {
                tracing::warn!(
                    collection = D::COLLECTION,
                    id = %id,
                    error = %e,
                    "undecodable legacy document, leaving it out"
                );
                rejected.push(RejectedDocument {
                    id,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(LegacyCollection::with_rejected(docs, rejected))
}

/// `_id` as a plain string or an `{"$oid": ..}` wrapper.
fn document_id(value: &Value) -> Option<String> {
    match value.get("_id")? {
        Value::String(id) => Some(id.clone()),
        wrapped => wrapped.get("$oid")?.as_str().map(str::to_string),
    }
}

impl LegacyStore for JsonDumpStore {
    fn find_all_users(&self) -> Result<Vec<LegacyUser>> {
        Ok(self.users.find_all())
    }

    fn find_all_items(&self) -> Result<Vec<LegacyItem>> {
        Ok(self.items.find_all())
    }

    fn find_all_notes(&self) -> Result<Vec<LegacyNote>> {
        Ok(self.notes.find_all())
    }

    fn get_item(&self, id: &str, required: bool) -> Result<Option<LegacyItem>> {
        self.items.get_by_id(id, required)
    }

    fn get_note(&self, id: &str, required: bool) -> Result<Option<LegacyNote>> {
        self.notes.get_by_id(id, required)
    }

    fn rejected(&self, collection: &str) -> Vec<RejectedDocument> {
        let rejected = match collection {
            LegacyUser::COLLECTION => self.users.rejected(),
            LegacyItem::COLLECTION => self.items.rejected(),
            LegacyNote::COLLECTION => self.notes.rejected(),
            _ => &[],
        };
        rejected.to_vec()
    }
}
