#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bson::{Bson, Document};
use quill_client::{Cursor, Database};
use quill_transport::{Transport, TransportError};

pub const ROOT: &str = "crm";
pub const COLLECTION: &str = "accounts";

// ── Scripted transport ──────────────────────────────────────────

/// One captured request body, tagged with the operation that carried it.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Insert(Vec<u8>),
    Delete(Vec<u8>),
    Update(Vec<u8>),
    Query(Vec<u8>),
    GetMore(Vec<u8>),
    KillCursors(Vec<u8>),
}

#[derive(Default)]
pub struct TransportState {
    pub sent: Vec<Sent>,
    pub replies: VecDeque<Vec<u8>>,
    pub fail_kill_cursors: bool,
}

/// Transport double: records every request body and answers queries from a
/// queue of scripted reply bodies. Clones share state, so a test keeps one
/// handle while the database owns the other.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<TransportState>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: Vec<u8>) {
        self.state.lock().unwrap().replies.push_back(reply);
    }

    pub fn fail_kill_cursors(&self) {
        self.state.lock().unwrap().fail_kill_cursors = true;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_kill_cursors(&self) -> Vec<Vec<u8>> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::KillCursors(body) => Some(body),
                _ => None,
            })
            .collect()
    }

    fn pop_reply(&self) -> Result<Vec<u8>, TransportError> {
        self.state
            .lock()
            .unwrap()
            .replies
            .pop_front()
            .ok_or_else(|| TransportError::Protocol("no scripted reply".to_string()))
    }
}

impl Transport for ScriptedTransport {
    fn insert(&mut self, msg: &[u8]) -> Result<(), TransportError> {
        self.state.lock().unwrap().sent.push(Sent::Insert(msg.to_vec()));
        Ok(())
    }

    fn delete(&mut self, msg: &[u8]) -> Result<(), TransportError> {
        self.state.lock().unwrap().sent.push(Sent::Delete(msg.to_vec()));
        Ok(())
    }

    fn update(&mut self, msg: &[u8]) -> Result<(), TransportError> {
        self.state.lock().unwrap().sent.push(Sent::Update(msg.to_vec()));
        Ok(())
    }

    fn kill_cursors(&mut self, msg: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(Sent::KillCursors(msg.to_vec()));
        if state.fail_kill_cursors {
            return Err(TransportError::Protocol("scripted failure".to_string()));
        }
        Ok(())
    }

    fn query(&mut self, msg: &[u8], reply: &mut Vec<u8>) -> Result<usize, TransportError> {
        self.state.lock().unwrap().sent.push(Sent::Query(msg.to_vec()));
        let scripted = self.pop_reply()?;
        reply.clear();
        reply.extend_from_slice(&scripted);
        Ok(reply.len())
    }

    fn get_more(&mut self, msg: &[u8], reply: &mut Vec<u8>) -> Result<usize, TransportError> {
        self.state.lock().unwrap().sent.push(Sent::GetMore(msg.to_vec()));
        let scripted = self.pop_reply()?;
        reply.clear();
        reply.extend_from_slice(&scripted);
        Ok(reply.len())
    }
}

pub fn scripted_db() -> (Database<ScriptedTransport>, ScriptedTransport) {
    let transport = ScriptedTransport::new();
    let handle = transport.clone();
    (Database::new(transport, ROOT), handle)
}

// ── Reply builders ──────────────────────────────────────────────

/// Build a reply body claiming `claimed` results regardless of how many
/// documents it actually carries.
pub fn reply_claiming(cursor_id: i64, claimed: i32, docs: &[Document]) -> Vec<u8> {
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

pub fn reply(cursor_id: i64, docs: &[Document]) -> Vec<u8> {
    reply_claiming(cursor_id, docs.len() as i32, docs)
}

// ── Request body inspection ─────────────────────────────────────

/// Split a request body that opens `[i32 reserved][cstring ns]` into the
/// namespace and everything after its NUL.
pub fn split_namespace(body: &[u8]) -> (&str, &[u8]) {
    let rest = &body[4..];
    let nul = rest.iter().position(|b| *b == 0).unwrap();
    let ns = std::str::from_utf8(&rest[..nul]).unwrap();
    (ns, &rest[nul + 1..])
}

pub fn read_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

pub fn read_i64(bytes: &[u8], at: usize) -> i64 {
    i64::from_le_bytes(bytes[at..at + 8].try_into().unwrap())
}

/// Decode the consecutive documents at the tail of a request body.
pub fn read_docs(mut bytes: &[u8]) -> Vec<Document> {
    let mut docs = Vec::new();
    while !bytes.is_empty() {
        docs.push(Document::from_reader(&mut bytes).unwrap());
    }
    docs
}

/// Drain a cursor, collecting each document's `name` field.
pub fn drain_names<T: Transport>(cursor: &mut Cursor<T>) -> Vec<String> {
    let mut names = Vec::new();
    while cursor.has_next().unwrap() {
        let doc = cursor.next().unwrap();
        names.push(doc.get("name").and_then(Bson::as_str).unwrap().to_string());
    }
    names
}
