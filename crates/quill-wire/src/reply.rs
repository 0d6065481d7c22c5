use std::collections::HashSet;

use bson::Bson;

use crate::doc::{Doc, ERR_KEY, NS_KEY};
use crate::error::WireError;
use crate::namespace;
use crate::oid::Oid;

// ── ReplyHeader ───────────────────────────────────────────────
//
// Layout:
//   [i32 reserved][i64 cursor id][i32 starting from][i32 returned]

/// Fixed header at the front of every query and get-more reply body.
#[derive(Debug, Clone, Copy)]
pub struct ReplyHeader {
    pub reserved: i32,
    pub cursor_id: i64,
    pub starting_from: i32,
    pub num_returned: i32,
}

impl ReplyHeader {
    pub const SIZE: usize = 20;

    /// Read the header from the front of a reply body without consuming it.
    pub fn read(reply: &[u8]) -> Result<Self, WireError> {
        if reply.len() < Self::SIZE {
            return Err(WireError::TruncatedReply(format!(
                "header needs {} bytes, got {}",
                Self::SIZE,
                reply.len()
            )));
        }
        Ok(ReplyHeader {
            reserved: get_i32(reply, 0),
            cursor_id: get_i64(reply, 4),
            starting_from: get_i32(reply, 12),
            num_returned: get_i32(reply, 16),
        })
    }

    /// True when the server holds more results behind a live cursor.
    pub fn has_more(&self) -> bool {
        self.num_returned > 0 && self.cursor_id > 0
    }
}

fn get_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

fn get_i64(bytes: &[u8], at: usize) -> i64 {
    i64::from_le_bytes(bytes[at..at + 8].try_into().unwrap())
}

// ── DocBatch ──────────────────────────────────────────────────

/// One parsed reply: the header plus the documents kept from it.
#[derive(Debug)]
pub struct DocBatch {
    header: ReplyHeader,
    docs: Vec<Doc>,
    bytes: usize,
}

impl DocBatch {
    /// Parse a reply body.
    ///
    /// Each kept document is stamped with its collection under `_ns`. When a
    /// dedup set is supplied, documents whose identity is already in the set
    /// are dropped and do not count toward the advertised total; kept
    /// identities are recorded into the set. A reply advertising more
    /// documents than it carries yields a short batch, not an error.
    pub fn parse(
        root: &str,
        full_name: &str,
        reply: &[u8],
        mut seen: Option<&mut HashSet<Oid>>,
    ) -> Result<Self, WireError> {
        let header = ReplyHeader::read(reply)?;
        let mut rest = &reply[ReplyHeader::SIZE..];
        let expected = header.num_returned.max(0) as usize;
        let local = namespace::strip_root(root, full_name);

        let mut docs = Vec::with_capacity(expected);
        while docs.len() < expected && !rest.is_empty() {
            let mut doc = Doc::read_from(&mut rest)?;
            if let Some(set) = seen.as_deref_mut() {
                match doc.id() {
                    Some(id) if set.contains(id) => continue,
                    Some(id) => {
                        set.insert(*id);
                    }
                    None => {}
                }
            }
            doc.insert(NS_KEY, local);
            docs.push(doc);
        }

        Ok(DocBatch {
            header,
            docs,
            bytes: reply.len(),
        })
    }

    pub fn header(&self) -> &ReplyHeader {
        &self.header
    }

    pub fn cursor_id(&self) -> i64 {
        self.header.cursor_id
    }

    pub fn has_more(&self) -> bool {
        self.header.has_more()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn docs(&self) -> &[Doc] {
        &self.docs
    }

    /// Size of the raw reply this batch was parsed from.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// The server signals a failed query with a single document under `$err`.
    pub fn error_message(&self) -> Option<String> {
        if self.docs.len() != 1 {
            return None;
        }
        match self.docs[0].get(ERR_KEY) {
            Some(Bson::String(msg)) => Some(msg.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        }
    }

    pub fn into_parts(self) -> (ReplyHeader, Vec<Doc>) {
        (self.header, self.docs)
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use bson::oid::ObjectId;

    use super::*;

    const ROOT: &str = "crm";
    const NS: &str = "crm.accounts";

    fn reply_claiming(cursor_id: i64, claimed: i32, docs: &[bson::Document]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf.extend_from_slice(&cursor_id.to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf.extend_from_slice(&claimed.to_le_bytes());
        for doc in docs {
            doc.to_writer(&mut buf).unwrap();
        }
        buf
    }

    fn reply(cursor_id: i64, docs: &[bson::Document]) -> Vec<u8> {
        reply_claiming(cursor_id, docs.len() as i32, docs)
    }

    #[test]
    fn header_round_trip() {
        let bytes = reply_claiming(99, 3, &[]);
        let header = ReplyHeader::read(&bytes).unwrap();
        assert_eq!(header.cursor_id, 99);
        assert_eq!(header.starting_from, 0);
        assert_eq!(header.num_returned, 3);
    }

    #[test]
    fn header_needs_twenty_bytes() {
        assert!(ReplyHeader::read(&[0u8; 19]).is_err());
        assert!(ReplyHeader::read(&[0u8; 20]).is_ok());
    }

    #[test]
    fn more_requires_results_and_cursor() {
        let case = |cursor_id, num_returned| ReplyHeader {
            reserved: 0,
            cursor_id,
            starting_from: 0,
            num_returned,
        };
        assert!(case(1, 1).has_more());
        assert!(!case(0, 1).has_more());
        assert!(!case(1, 0).has_more());
        assert!(!case(0, 0).has_more());
    }

    #[test]
    fn parse_stamps_collection() {
        let bytes = reply(0, &[doc! { "name": "Acme Corp" }]);
        let batch = DocBatch::parse(ROOT, NS, &bytes, None).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.docs()[0].get(NS_KEY),
            Some(&Bson::String("accounts".into()))
        );
        assert_eq!(batch.bytes(), bytes.len());
    }

    #[test]
    fn empty_reply_parses_empty() {
        let bytes = reply(0, &[]);
        let batch = DocBatch::parse(ROOT, NS, &bytes, None).unwrap();
        assert!(batch.is_empty());
        assert!(!batch.has_more());
    }

    #[test]
    fn short_reply_tolerated() {
        let bytes = reply_claiming(0, 3, &[doc! { "name": "Acme Corp" }]);
        let batch = DocBatch::parse(ROOT, NS, &bytes, None).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn without_set_duplicates_kept() {
        let id = ObjectId::new();
        let bytes = reply(0, &[doc! { "_id": id }, doc! { "_id": id }]);
        let batch = DocBatch::parse(ROOT, NS, &bytes, None).unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn set_suppresses_previously_seen() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let mut seen = HashSet::from([Oid::from(a)]);
        let bytes = reply(0, &[doc! { "_id": a }, doc! { "_id": b }]);
        let batch = DocBatch::parse(ROOT, NS, &bytes, Some(&mut seen)).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.docs()[0].id().map(Oid::object_id), Some(b));
        assert!(seen.contains(&Oid::from(b)));
    }

    #[test]
    fn set_suppresses_within_one_reply() {
        let a = ObjectId::new();
        let mut seen = HashSet::new();
        let bytes = reply(0, &[doc! { "_id": a }, doc! { "_id": a }]);
        let batch = DocBatch::parse(ROOT, NS, &bytes, Some(&mut seen)).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn identityless_documents_pass_the_set() {
        let mut seen = HashSet::new();
        let bytes = reply(0, &[doc! { "name": "Acme Corp" }, doc! { "name": "Acme Corp" }]);
        let batch = DocBatch::parse(ROOT, NS, &bytes, Some(&mut seen)).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(seen.is_empty());
    }

    #[test]
    fn error_reply_detected() {
        let bytes = reply(0, &[doc! { "$err": "bad query" }]);
        let batch = DocBatch::parse(ROOT, NS, &bytes, None).unwrap();
        assert_eq!(batch.error_message().as_deref(), Some("bad query"));
    }

    #[test]
    fn multi_document_reply_is_not_an_error() {
        let bytes = reply(0, &[doc! { "$err": "x" }, doc! { "name": "Acme Corp" }]);
        let batch = DocBatch::parse(ROOT, NS, &bytes, None).unwrap();
        assert!(batch.error_message().is_none());
    }

    #[test]
    fn torn_document_is_an_error() {
        let mut bytes = reply(0, &[doc! { "name": "Acme Corp" }]);
        bytes.truncate(bytes.len() - 3);
        assert!(DocBatch::parse(ROOT, NS, &bytes, None).is_err());
    }
}
