//! Outgoing request payloads.
//!
//! Builders append an operation body to a caller-supplied buffer; the
//! transport owns the standard message header and framing. Integers are
//! little-endian, namespaces are NUL-terminated strings.
//!
//! Layout:
//!   insert        [i32 0][cstring ns][doc]
//!   delete        [i32 0][cstring ns][i32 id-only][doc selector]
//!   update        [i32 0][cstring ns][i32 upsert][doc selector][doc update]
//!   query         [i32 0][cstring ns][i32 skip][i32 limit][doc selector][doc fields?]
//!   get_more      [i32 0][cstring ns][i32 limit][i64 cursor id]
//!   kill_cursors  [i32 0][i32 count][i64 id]...

use crate::doc::Doc;
use crate::error::WireError;

const RESERVED: i32 = 0;

pub fn insert(buf: &mut Vec<u8>, full_name: &str, doc: &Doc) -> Result<(), WireError> {
    put_i32(buf, RESERVED);
    put_cstring(buf, full_name)?;
    doc.write_to(buf)
}

/// The id-only flag is set when the selector is a lone identity, letting the
/// server take its fast path.
pub fn delete(buf: &mut Vec<u8>, full_name: &str, selector: &Doc) -> Result<(), WireError> {
    put_i32(buf, RESERVED);
    put_cstring(buf, full_name)?;
    put_i32(buf, i32::from(selector.is_id_only()));
    selector.write_to(buf)
}

pub fn update(
    buf: &mut Vec<u8>,
    full_name: &str,
    upsert: bool,
    selector: &Doc,
    update: &Doc,
) -> Result<(), WireError> {
    put_i32(buf, RESERVED);
    put_cstring(buf, full_name)?;
    put_i32(buf, i32::from(upsert));
    selector.write_to(buf)?;
    update.write_to(buf)
}

pub fn query(
    buf: &mut Vec<u8>,
    full_name: &str,
    skip: i32,
    limit: i32,
    selector: &Doc,
    fields: Option<&Doc>,
) -> Result<(), WireError> {
    put_i32(buf, RESERVED);
    put_cstring(buf, full_name)?;
    put_i32(buf, skip);
    put_i32(buf, limit);
    selector.write_to(buf)?;
    match fields {
        Some(fields) => fields.write_to(buf),
        None => Ok(()),
    }
}

pub fn get_more(
    buf: &mut Vec<u8>,
    full_name: &str,
    limit: i32,
    cursor_id: i64,
) -> Result<(), WireError> {
    put_i32(buf, RESERVED);
    put_cstring(buf, full_name)?;
    put_i32(buf, limit);
    put_i64(buf, cursor_id);
    Ok(())
}

pub fn kill_cursors(buf: &mut Vec<u8>, cursor_ids: &[i64]) {
    put_i32(buf, RESERVED);
    put_i32(buf, cursor_ids.len() as i32);
    for id in cursor_ids {
        put_i64(buf, *id);
    }
}

fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_i64(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_cstring(buf: &mut Vec<u8>, s: &str) -> Result<(), WireError> {
    if s.as_bytes().contains(&0) {
        return Err(WireError::InvalidNamespace(s.to_string()));
    }
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(())
}
