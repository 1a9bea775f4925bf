use bytes::{BufMut, Bytes, BytesMut};

/// Chunk payloads are aligned to this many bytes.
pub const ALIGNMENT: usize = 4;

/// Fill byte for JSON chunk padding.
pub const JSON_PADDING: u8 = b' ';

/// Fill byte for BIN chunk padding.
pub const BIN_PADDING: u8 = 0;

/// Returns the smallest multiple of [`ALIGNMENT`] that is `>= len`.
pub fn padded_len(len: usize) -> usize {
    (len + ALIGNMENT - 1) / ALIGNMENT * ALIGNMENT
}

/// Pads `bytes` to a 4-byte boundary with `fill`.
///
/// Already aligned input is returned as-is without copying.
pub fn pad(bytes: Bytes, fill: u8) -> Bytes {
    let target = padded_len(bytes.len());
    if target == bytes.len() {
        return bytes;
    }

    let mut padded = BytesMut::with_capacity(target);
    padded.put_slice(&bytes);
    padded.put_bytes(fill, target - bytes.len());
    padded.freeze()
}

/// Concatenates `buffers` into one contiguous region, without padding.
pub fn concat(buffers: &[Bytes]) -> Bytes {
    match buffers {
        [] => Bytes::new(),
        [single] => single.clone(),
        _ => {
            let total = buffers.iter().map(Bytes::len).sum();
            let mut merged = BytesMut::with_capacity(total);
            for buffer in buffers {
                merged.put_slice(buffer);
            }
            merged.freeze()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_len_rounds_up_to_alignment() {
        for len in 0..64 {
            let padded = padded_len(len);
            assert_eq!(padded % ALIGNMENT, 0);
            assert!(padded >= len);
            assert!(padded - len < ALIGNMENT);
            assert_eq!(padded_len(padded), padded);
        }
    }

    #[test]
    fn ten_bytes_pad_to_twelve() {
        let input = Bytes::from_static(b"0123456789");

        let bin = pad(input.clone(), BIN_PADDING);
        assert_eq!(bin.len(), 12);
        assert_eq!(&bin[..10], b"0123456789");
        assert_eq!(&bin[10..], &[0, 0]);

        let json = pad(input, JSON_PADDING);
        assert_eq!(json.len(), 12);
        assert_eq!(&json[10..], &[0x20, 0x20]);
    }

    #[test]
    fn aligned_input_is_reused() {
        let input = Bytes::from(vec![1u8; 8]);
        let ptr = input.as_ptr();
        let output = pad(input, BIN_PADDING);
        assert_eq!(output.as_ptr(), ptr);
        assert_eq!(output.len(), 8);
    }

    #[test]
    fn concat_joins_in_order() {
        let merged = concat(&[
            Bytes::from_static(b"ab"),
            Bytes::new(),
            Bytes::from_static(b"cde"),
        ]);
        assert_eq!(&merged[..], b"abcde");
        assert!(concat(&[]).is_empty());
    }
}
