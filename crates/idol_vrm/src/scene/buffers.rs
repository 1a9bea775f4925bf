use std::path::Path;

use anyhow::anyhow;
use base64::Engine;
use bytes::Bytes;
use gltf::json;
use serde_json::{json, Value};

use crate::error::VrmError;
use crate::padded::{pad, BIN_PADDING};

const VALID_MIME_TYPES: &[&str] = &["application/octet-stream", "application/gltf-buffer"];

/// Loads the raw data of every buffer declared by `root`.
///
/// Buffers without a `uri` come from the container's binary chunk.
pub(crate) fn load_buffers(
    root: &json::Root,
    bin: Option<&Bytes>,
    base: Option<&Path>,
) -> Result<Vec<Bytes>, VrmError> {
    let mut buffer_data = Vec::with_capacity(root.buffers.len());
    for buffer in &root.buffers {
        let data = match buffer.uri.as_deref() {
            Some(uri) => {
                let uri = percent_encoding::percent_decode_str(uri)
                    .decode_utf8()
                    .map_err(|_| VrmError::BufferFormatUnsupported)?;
                match DataUri::parse(&uri) {
                    Some(data_uri) if VALID_MIME_TYPES.contains(&data_uri.mime_type) => {
                        Bytes::from(data_uri.decode()?)
                    }
                    Some(_) => return Err(VrmError::BufferFormatUnsupported),
                    None => {
                        let path = match base {
                            Some(base) => base.join(&*uri),
                            None => Path::new(&*uri).to_owned(),
                        };
                        Bytes::from(std::fs::read(path)?)
                    }
                }
            }
            None => {
                let blob = bin.ok_or(VrmError::MissingBlob)?;
                // The chunk may carry padding past the declared length.
                let length = usize::try_from(buffer.byte_length.0)
                    .map_or(blob.len(), |length| length.min(blob.len()));
                blob.slice(..length)
            }
        };
        buffer_data.push(data);
    }

    Ok(buffer_data)
}

/// Rewrites `document` so every buffer view points into one merged buffer,
/// and returns the segments making up that buffer.
///
/// `root` is the typed form of `document`. All segments but the last are
/// padded to keep views aligned.
pub(crate) fn merge_buffers(
    document: &mut Value,
    root: &json::Root,
    buffers: &[Bytes],
) -> anyhow::Result<Vec<Bytes>> {
    let mut offsets = Vec::with_capacity(buffers.len());
    let mut segments = Vec::with_capacity(buffers.len());
    let mut length = 0;
    for (i, buffer) in buffers.iter().enumerate() {
        offsets.push(length);
        let segment = if i + 1 < buffers.len() {
            pad(buffer.clone(), BIN_PADDING)
        } else {
            buffer.clone()
        };
        length += segment.len();
        segments.push(segment);
    }

    if let Some(views) = document.get_mut("bufferViews").and_then(Value::as_array_mut) {
        for (i, (view, typed)) in views.iter_mut().zip(&root.buffer_views).enumerate() {
            let buffer = typed.buffer.value();
            let base = *offsets
                .get(buffer)
                .ok_or_else(|| anyhow!("buffer view {} references missing buffer {}", i, buffer))?;
            let offset = typed.byte_offset.map_or(Ok(0), |offset| usize::try_from(offset.0))?;

            view["buffer"] = json!(0);
            view["byteOffset"] = json!(base + offset);
        }
    }

    if let Some(root) = document.as_object_mut() {
        if buffers.is_empty() {
            root.remove("buffers");
        } else {
            root.insert("buffers".to_owned(), json!([{ "byteLength": length }]));
        }
    }

    Ok(segments)
}

struct DataUri<'a> {
    mime_type: &'a str,
    base64: bool,
    data: &'a str,
}

impl<'a> DataUri<'a> {
    fn parse(uri: &'a str) -> Option<DataUri<'a>> {
        let uri = uri.strip_prefix("data:")?;
        let (mime_type, data) = uri.split_once(',')?;

        let (mime_type, base64) = match mime_type.strip_suffix(";base64") {
            Some(mime_type) => (mime_type, true),
            None => (mime_type, false),
        };

        Some(DataUri {
            mime_type,
            base64,
            data,
        })
    }

    fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        if self.base64 {
            base64::engine::general_purpose::STANDARD.decode(self.data)
        } else {
            Ok(self.data.as_bytes().to_owned())
        }
    }
}
