//! Binary glTF container framing.
//!
//! ```text
//! [magic "glTF"][version 2][total length]
//! [json length][b"JSON"][json payload, space padded]
//! [bin length ][b"BIN\0"][bin payload, zero padded]
//! ```
//!
//! All integers are little-endian `u32`.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{StructuralError, VrmError};
use crate::padded::{self, pad, BIN_PADDING, JSON_PADDING};

pub const MAGIC: [u8; 4] = *b"glTF";
pub const VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = u32::from_le_bytes(*b"JSON");
pub const CHUNK_BIN: u32 = u32::from_le_bytes(*b"BIN\0");

pub const HEADER_LEN: usize = 12;
pub const CHUNK_HEADER_LEN: usize = 8;

/// Frames `document` and `buffers` into a binary container.
///
/// The buffers are merged into a single BIN chunk and the first entry of the
/// document's `buffers` array gets the merged, unpadded length.
pub fn write_container<D>(document: &D, buffers: &[Bytes]) -> Result<Bytes, VrmError>
where
    D: Serialize + ?Sized,
{
    let mut document = serde_json::to_value(document).map_err(VrmError::Encoding)?;
    let bin = padded::concat(buffers);
    set_buffer_length(&mut document, bin.len())?;

    let json = serde_json::to_vec(&document).map_err(VrmError::Encoding)?;
    let json = pad(Bytes::from(json), JSON_PADDING);
    let bin = pad(bin, BIN_PADDING);

    let total = HEADER_LEN + CHUNK_HEADER_LEN + json.len() + CHUNK_HEADER_LEN + bin.len();
    let total_u32 = u32::try_from(total).map_err(|_| VrmError::TooLarge(total))?;

    let mut out = BytesMut::with_capacity(total);
    out.put_slice(&MAGIC);
    out.put_u32_le(VERSION);
    out.put_u32_le(total_u32);

    out.put_u32_le(json.len() as u32);
    out.put_u32_le(CHUNK_JSON);
    out.put_slice(&json);

    out.put_u32_le(bin.len() as u32);
    out.put_u32_le(CHUNK_BIN);
    out.put_slice(&bin);

    Ok(out.freeze())
}

fn set_buffer_length(document: &mut Value, length: usize) -> Result<(), VrmError> {
    let root = document.as_object_mut().ok_or(StructuralError::NotAnObject)?;
    match root.get_mut("buffers") {
        Some(Value::Array(buffers)) if !buffers.is_empty() => {
            let first = buffers[0]
                .as_object_mut()
                .ok_or(StructuralError::UnexpectedType("buffers"))?;
            first.insert("byteLength".to_owned(), json!(length));
        }
        Some(Value::Array(buffers)) => {
            if length > 0 {
                buffers.push(json!({ "byteLength": length }));
            }
        }
        Some(_) => return Err(StructuralError::UnexpectedType("buffers").into()),
        None => {
            if length > 0 {
                root.insert("buffers".to_owned(), json!([{ "byteLength": length }]));
            }
        }
    }
    Ok(())
}

/// A parsed container: the glTF document and its optional binary chunk.
#[derive(Clone, Debug)]
pub struct Container {
    pub document: Value,
    pub bin: Option<Bytes>,
}

impl Container {
    /// Parses a binary container, or a plain JSON glTF document.
    pub fn from_slice(src: &[u8]) -> Result<Self, VrmError> {
        if src.starts_with(&MAGIC) {
            let glb = gltf::Glb::from_slice(src)?;
            let document = serde_json::from_slice(&glb.json).map_err(StructuralError::Malformed)?;
            Ok(Self {
                document,
                bin: glb.bin.map(|bin| Bytes::copy_from_slice(&bin)),
            })
        } else {
            let document = serde_json::from_slice(src).map_err(StructuralError::Malformed)?;
            Ok(Self {
                document,
                bin: None,
            })
        }
    }
}
