use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::TransportError;
use crate::transport::Transport;

// ── Message framing ───────────────────────────────────────────
//
// Every request and reply starts with a 16-byte header:
//   [i32 total length][i32 request id][i32 response to][i32 opcode]
// The length counts the header itself. Integers are little-endian.

const HEADER_LEN: usize = 16;

const OP_REPLY: i32 = 1;
const OP_UPDATE: i32 = 2001;
const OP_INSERT: i32 = 2002;
const OP_QUERY: i32 = 2004;
const OP_GET_MORE: i32 = 2005;
const OP_DELETE: i32 = 2006;
const OP_KILL_CURSORS: i32 = 2007;

pub struct TcpTransport {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    next_request_id: i32,
}

impl TcpTransport {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)?;
        let reader = BufReader::new(stream.try_clone()?);
        let writer = BufWriter::new(stream);
        Ok(Self {
            reader,
            writer,
            next_request_id: 1,
        })
    }

    fn send(&mut self, opcode: i32, body: &[u8]) -> Result<i32, TransportError> {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);

        let total = (HEADER_LEN + body.len()) as i32;
        self.writer.write_all(&total.to_le_bytes())?;
        self.writer.write_all(&request_id.to_le_bytes())?;
        self.writer.write_all(&0i32.to_le_bytes())?;
        self.writer.write_all(&opcode.to_le_bytes())?;
        self.writer.write_all(body)?;
        self.writer.flush()?;
        Ok(request_id)
    }

    fn receive(&mut self, request_id: i32, reply: &mut Vec<u8>) -> Result<usize, TransportError> {
        let mut header = [0u8; HEADER_LEN];
        self.reader.read_exact(&mut header)?;
        let total = i32::from_le_bytes(header[0..4].try_into().unwrap());
        let response_to = i32::from_le_bytes(header[8..12].try_into().unwrap());
        let opcode = i32::from_le_bytes(header[12..16].try_into().unwrap());

        if total < HEADER_LEN as i32 {
            return Err(TransportError::Protocol(format!(
                "reply length {total} shorter than its header"
            )));
        }
        if opcode != OP_REPLY {
            return Err(TransportError::Protocol(format!(
                "unexpected reply opcode: {opcode}"
            )));
        }
        if response_to != request_id {
            return Err(TransportError::Protocol(format!(
                "reply to request {response_to}, expected {request_id}"
            )));
        }

        let body_len = total as usize - HEADER_LEN;
        reply.clear();
        reply.resize(body_len, 0);
        self.reader.read_exact(reply)?;
        Ok(body_len)
    }
}

impl Transport for TcpTransport {
    fn insert(&mut self, msg: &[u8]) -> Result<(), TransportError> {
        self.send(OP_INSERT, msg)?;
        Ok(())
    }

    fn delete(&mut self, msg: &[u8]) -> Result<(), TransportError> {
        self.send(OP_DELETE, msg)?;
        Ok(())
    }

    fn update(&mut self, msg: &[u8]) -> Result<(), TransportError> {
        self.send(OP_UPDATE, msg)?;
        Ok(())
    }

    fn kill_cursors(&mut self, msg: &[u8]) -> Result<(), TransportError> {
        self.send(OP_KILL_CURSORS, msg)?;
        Ok(())
    }

    fn query(&mut self, msg: &[u8], reply: &mut Vec<u8>) -> Result<usize, TransportError> {
        let request_id = self.send(OP_QUERY, msg)?;
        self.receive(request_id, reply)
    }

    fn get_more(&mut self, msg: &[u8], reply: &mut Vec<u8>) -> Result<usize, TransportError> {
        let request_id = self.send(OP_GET_MORE, msg)?;
        self.receive(request_id, reply)
    }
}
