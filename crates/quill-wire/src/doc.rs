use std::io::Read;

use bson::{Bson, Document};

use crate::error::WireError;
use crate::oid::Oid;

/// Key reserved for the document identity.
pub const ID_KEY: &str = "_id";
/// Key stamped with the collection name on documents that cross the wire.
pub const NS_KEY: &str = "_ns";
/// Key carried by a server error reply document.
pub const ERR_KEY: &str = "$err";

/// A document with its identity held out of band.
///
/// The body never contains `_id`; the identity slot owns it. A document
/// whose `_id` is not an object id keeps that value in the body and has an
/// empty slot, leaving it invisible to identity-based bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Doc {
    id: Option<Oid>,
    body: Document,
}

impl Doc {
    pub fn new() -> Self {
        Doc::default()
    }

    pub fn id(&self) -> Option<&Oid> {
        self.id.as_ref()
    }

    pub fn id_mut(&mut self) -> Option<&mut Oid> {
        self.id.as_mut()
    }

    pub fn set_id(&mut self, id: Oid) {
        self.id = Some(id);
    }

    /// Fill an empty identity slot with a fresh id.
    pub fn ensure_id(&mut self) -> &mut Oid {
        self.id.get_or_insert_with(Oid::new)
    }

    /// Insert a field. The reserved identity key routes to the slot when the
    /// value is an object id; any other `_id` value stays in the body.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Bson>) {
        let key = key.into();
        let value = value.into();
        if key == ID_KEY {
            if let Bson::ObjectId(id) = value {
                self.id = Some(Oid::from(id));
                return;
            }
        }
        self.body.insert(key, value);
    }

    /// Body lookup. The identity is read through [`id`](Doc::id).
    pub fn get(&self, key: &str) -> Option<&Bson> {
        self.body.get(key)
    }

    pub fn body(&self) -> &Document {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len() + usize::from(self.id.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exactly one field, and it is the identity.
    pub fn is_id_only(&self) -> bool {
        self.id.is_some() && self.body.is_empty()
    }

    /// Reassemble the full document, identity first.
    pub fn to_document(&self) -> Document {
        let mut out = Document::new();
        if let Some(id) = &self.id {
            out.insert(ID_KEY, id.object_id());
        }
        for (key, value) in &self.body {
            out.insert(key.clone(), value.clone());
        }
        out
    }

    pub fn into_document(self) -> Document {
        match self.id {
            Some(id) => {
                let mut out = Document::new();
                out.insert(ID_KEY, id.object_id());
                for (key, value) in self.body {
                    out.insert(key, value);
                }
                out
            }
            None => self.body,
        }
    }

    /// Append the document's wire bytes.
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        self.to_document().to_writer(buf)?;
        Ok(())
    }

    /// Decode one document from the reader, pulling an object id `_id` into
    /// the identity slot.
    pub fn read_from(reader: impl Read) -> Result<Self, WireError> {
        Ok(Doc::from(Document::from_reader(reader)?))
    }
}

impl From<Document> for Doc {
    fn from(mut body: Document) -> Self {
        let id = match body.get(ID_KEY) {
            Some(Bson::ObjectId(id)) => {
                let id = *id;
                body.remove(ID_KEY);
                Some(Oid::from(id))
            }
            _ => None,
        };
        Doc { id, body }
    }
}

impl From<Doc> for Document {
    fn from(doc: Doc) -> Self {
        doc.into_document()
    }
}
