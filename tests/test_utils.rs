//! Helpers for the integration tests: a scripted in-process server that
//! speaks just enough of the wire protocol, plus builders for the frames
//! it sends.

#![allow(dead_code)] // each integration test binary uses a subset

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::JoinHandle;

pub fn init_logger() {
    flexi_logger::Logger::try_with_env_or_str("info")
        .unwrap()
        .start()
        .ok();
}

// ---------------------------------------------------------------- server

pub struct MockServer {
    port: u16,
    handle: Option<JoinHandle<()>>,
}

impl MockServer {
    /// Starts a one-connection server; `script` runs in its own thread.
    pub fn start<F>(script: F) -> MockServer
    where
        F: FnOnce(&mut Session) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut session = Session { stream };
            script(&mut session);
        });
        MockServer {
            port,
            handle: Some(handle),
        }
    }

    pub fn url(&self) -> String {
        format!("edgedb://edgedb@127.0.0.1:{}/edgedb", self.port)
    }

    pub fn url_with(&self, options: &str) -> String {
        format!("{}?{}", self.url(), options)
    }

    /// Waits for the script to finish; propagates its panics into the test.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("mock server script panicked");
        }
    }
}

pub struct Session {
    stream: TcpStream,
}

impl Session {
    /// Reads one framed message, returning tag and body.
    pub fn read_frame(&mut self) -> (u8, Vec<u8>) {
        let mut head = [0_u8; 5];
        self.stream.read_exact(&mut head).unwrap();
        let len = u32::from_be_bytes([head[1], head[2], head[3], head[4]]) as usize;
        assert!(len >= 4, "frame length shorter than the length field");
        let mut body = vec![0_u8; len - 4];
        self.stream.read_exact(&mut body).unwrap();
        (head[0], body)
    }

    /// Reads one frame and asserts its tag.
    pub fn expect_frame(&mut self, tag: u8) -> Vec<u8> {
        let (got, body) = self.read_frame();
        assert_eq!(
            got, tag,
            "expected frame 0x{tag:02x} ({}), got 0x{got:02x} ({})",
            tag as char, got as char
        );
        body
    }

    pub fn send(&mut self, frame: &[u8]) {
        self.stream.write_all(frame).unwrap();
        self.stream.flush().unwrap();
    }

    /// Consumes the `ClientHandshake` and replies with key data, a server
    /// parameter and `ReadyForCommand{I}`.
    pub fn accept_handshake(&mut self) {
        let body = self.expect_frame(b'V');
        // major.minor == 0.13, two parameters, no extensions
        assert_eq!(&body[0..4], &[0, 0, 0, 13]);
        self.send(&server_key_data(&[7_u8; 32]));
        self.send(&parameter_status("suggested_pool_concurrency", "10"));
        self.send(&ready_for_command(b'I'));
    }
}

/// Cursor over a received frame body.
pub struct BodyReader {
    buf: Vec<u8>,
    pos: usize,
}

impl BodyReader {
    pub fn new(buf: Vec<u8>) -> BodyReader {
        BodyReader { buf, pos: 0 }
    }

    pub fn u8(&mut self) -> u8 {
        let v = self.buf[self.pos];
        self.pos += 1;
        v
    }

    pub fn u16(&mut self) -> u16 {
        u16::from_be_bytes(self.take(2).try_into().unwrap())
    }

    pub fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.take(4).try_into().unwrap())
    }

    pub fn bytes(&mut self) -> Vec<u8> {
        let len = self.u32() as usize;
        self.take(len).to_vec()
    }

    pub fn str_(&mut self) -> String {
        String::from_utf8(self.bytes()).unwrap()
    }

    pub fn rest(&mut self) -> Vec<u8> {
        let v = self.buf[self.pos..].to_vec();
        self.pos = self.buf.len();
        v
    }

    fn take(&mut self, n: usize) -> &[u8] {
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        slice
    }
}

// ------------------------------------------------------------- frames

/// Builder for one framed server message.
pub struct Frame {
    buf: Vec<u8>,
}

impl Frame {
    pub fn new(tag: u8) -> Frame {
        Frame {
            buf: vec![tag, 0, 0, 0, 0],
        }
    }

    pub fn u8(mut self, v: u8) -> Frame {
        self.buf.push(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Frame {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Frame {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn i32(mut self, v: i32) -> Frame {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn i64(mut self, v: i64) -> Frame {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn bytes(mut self, v: &[u8]) -> Frame {
        self.buf.extend_from_slice(&(v.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(v);
        self
    }

    pub fn str_(self, v: &str) -> Frame {
        self.bytes(v.as_bytes())
    }

    pub fn raw(mut self, v: &[u8]) -> Frame {
        self.buf.extend_from_slice(v);
        self
    }

    pub fn uuid(mut self, v: u128) -> Frame {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        let len = (self.buf.len() - 1) as u32;
        self.buf[1..5].copy_from_slice(&len.to_be_bytes());
        self.buf
    }
}

pub fn server_handshake(major: u16, minor: u16) -> Vec<u8> {
    Frame::new(b'v').u16(major).u16(minor).u16(0).finish()
}

pub fn authentication_ok() -> Vec<u8> {
    Frame::new(b'R').u32(0).finish()
}

pub fn authentication_sasl_required(methods: &[&str]) -> Vec<u8> {
    let mut frame = Frame::new(b'R').u32(0x0a).u32(methods.len() as u32);
    for method in methods {
        frame = frame.str_(method);
    }
    frame.finish()
}

pub fn authentication_sasl_continue(data: &[u8]) -> Vec<u8> {
    Frame::new(b'R').u32(0x0b).bytes(data).finish()
}

pub fn authentication_sasl_final(data: &[u8]) -> Vec<u8> {
    Frame::new(b'R').u32(0x0c).bytes(data).finish()
}

pub fn server_key_data(secret: &[u8; 32]) -> Vec<u8> {
    Frame::new(b'K').raw(secret).finish()
}

pub fn parameter_status(name: &str, value: &str) -> Vec<u8> {
    Frame::new(b'S').str_(name).str_(value).finish()
}

pub fn ready_for_command(tx_state: u8) -> Vec<u8> {
    Frame::new(b'Z').u16(0).u8(tx_state).finish()
}

pub fn command_complete(status: &str) -> Vec<u8> {
    Frame::new(b'C').u16(0).str_(status).finish()
}

pub fn prepare_complete(input_id: u128, output_id: u128) -> Vec<u8> {
    Frame::new(b'1')
        .u16(0) // headers
        .u8(b'o') // server-inferred cardinality
        .uuid(input_id)
        .uuid(output_id)
        .finish()
}

pub fn command_data_description(
    input_id: u128,
    input_descriptor: &[u8],
    output_id: u128,
    output_descriptor: &[u8],
) -> Vec<u8> {
    Frame::new(b'T')
        .u16(0) // headers
        .u8(b'o')
        .uuid(input_id)
        .bytes(input_descriptor)
        .uuid(output_id)
        .bytes(output_descriptor)
        .finish()
}

/// A `Data` message with one codec-encoded row.
pub fn data_row(row: &[u8]) -> Vec<u8> {
    Frame::new(b'D').u16(1).raw(row).finish()
}

pub fn error_response(code: u32, message: &str) -> Vec<u8> {
    Frame::new(b'E')
        .u8(120) // severity: error
        .u32(code)
        .str_(message)
        .u16(0) // attributes
        .finish()
}

pub fn log_message(text: &str) -> Vec<u8> {
    Frame::new(b'L')
        .u8(40) // info
        .u32(0)
        .str_(text)
        .u16(0)
        .finish()
}

// --------------------------------------------------- value payloads

/// A length-prefixed value block.
pub fn block(payload: &[u8]) -> Vec<u8> {
    let mut buf = (payload.len() as u32).to_be_bytes().to_vec();
    buf.extend_from_slice(payload);
    buf
}

/// A str value block.
pub fn str_block(v: &str) -> Vec<u8> {
    block(v.as_bytes())
}

/// An int64 value block.
pub fn int64_block(v: i64) -> Vec<u8> {
    block(&v.to_be_bytes())
}

// ----------------------------------------------------- descriptors

pub const STR_ID: u128 = 0x101;
pub const INT64_ID: u128 = 0x105;
pub const EMPTY_TUPLE_ID: u128 = 0xff;

/// Blob declaring one input shape with the given (flag, name, subtype)
/// fields.
pub fn input_shape_blob(shape_id: u128, fields: &[(u8, &str, u128)]) -> Vec<u8> {
    let mut blob = vec![8_u8]; // input shape
    blob.extend_from_slice(&shape_id.to_be_bytes());
    blob.extend_from_slice(&(fields.len() as u16).to_be_bytes());
    for (flags, name, subtype) in fields {
        blob.push(*flags);
        blob.extend_from_slice(&(name.len() as u32).to_be_bytes());
        blob.extend_from_slice(name.as_bytes());
        blob.extend_from_slice(&subtype.to_be_bytes());
    }
    blob
}

/// Blob declaring one object shape with the given fields.
pub fn shape_blob(shape_id: u128, fields: &[(u8, &str, u128)]) -> Vec<u8> {
    let mut blob = input_shape_blob(shape_id, fields);
    blob[0] = 1; // object shape
    blob
}

/// Blob declaring a base scalar (no body).
pub fn base_scalar_blob(id: u128) -> Vec<u8> {
    let mut blob = vec![2_u8];
    blob.extend_from_slice(&id.to_be_bytes());
    blob
}

// ---------------------------------------------------------- SCRAM

/// Server side of one SCRAM-SHA-256 exchange, for authentication tests.
pub struct ScramServer {
    pub salt: Vec<u8>,
    pub iterations: u32,
    pub server_nonce_suffix: String,
    password: String,
    auth_message: Option<String>,
    salted_password: Vec<u8>,
}

impl ScramServer {
    pub fn new(password: &str) -> ScramServer {
        let salt = b"0123456789abcdef".to_vec();
        let iterations = 4096;
        let mut salted_password = [0_u8; 32];
        pbkdf2::pbkdf2::<Hmac<Sha256>>(
            password.as_bytes(),
            &salt,
            iterations,
            &mut salted_password,
        )
        .unwrap();
        ScramServer {
            salt,
            iterations,
            server_nonce_suffix: "srvnonce".to_string(),
            password: password.to_string(),
            auth_message: None,
            salted_password: salted_password.to_vec(),
        }
    }

    /// Consumes the client-first message, returns the server-first message.
    pub fn first(&mut self, client_first: &[u8]) -> Vec<u8> {
        let client_first = std::str::from_utf8(client_first).unwrap();
        let bare = client_first.strip_prefix("n,,").unwrap();
        let client_nonce = bare
            .split(',')
            .find_map(|p| p.strip_prefix("r="))
            .unwrap()
            .to_string();
        let server_first = format!(
            "r={}{},s={},i={}",
            client_nonce,
            self.server_nonce_suffix,
            BASE64.encode(&self.salt),
            self.iterations
        );
        self.auth_message = Some(format!("{bare},{server_first}"));
        server_first.into_bytes()
    }

    /// Consumes the client-final message, verifies the proof, and returns
    /// the server-final message.
    pub fn last(&mut self, client_final: &[u8]) -> Vec<u8> {
        let client_final = std::str::from_utf8(client_final).unwrap();
        let (without_proof, proof) = client_final.rsplit_once(",p=").unwrap();
        let auth_message = format!("{},{}", self.auth_message.take().unwrap(), without_proof);

        let client_key = hmac(&self.salted_password, b"Client Key");
        let stored_key = sha256(&client_key);
        let signature = hmac(&stored_key, auth_message.as_bytes());
        let proof = BASE64.decode(proof).unwrap();
        let recovered_key: Vec<u8> = proof.iter().zip(&signature).map(|(a, b)| a ^ b).collect();
        assert_eq!(
            sha256(&recovered_key),
            stored_key,
            "client proof does not verify for password {:?}",
            self.password
        );

        let server_key = hmac(&self.salted_password, b"Server Key");
        let server_signature = hmac(&server_key, auth_message.as_bytes());
        format!("v={}", BASE64.encode(server_signature)).into_bytes()
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap();
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256(data: &[u8]) -> Vec<u8> {
    let mut sha = Sha256::new();
    sha.update(data);
    sha.finalize().to_vec()
}
