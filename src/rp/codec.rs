//! The framed length-prefixed dictionary encoding spoken by RP backends.
//!
//! Four value kinds: byte-strings (`<len>:<bytes>`), integers (`i<n>e`),
//! lists (`l<elements>e`), and dictionaries (`d<key-value-pairs>e`, keys are
//! byte-strings). The decoder's recursive descent needs exactly one byte of
//! lookahead to tell "another element" from "end of list/dict" (spec.md
//! §4.1, §9) -- [`PushbackReader`] supplies it.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{BridgeError, Result};
use crate::rp::message::RpValue;

/// Wraps an `AsyncRead` with one byte of lookahead.
///
/// Not an optimization -- the codec's recursive descent cannot otherwise
/// tell where a nested list or dictionary ends without reading one byte
/// past it and handing that byte back.
pub struct PushbackReader<R> {
    inner: R,
    pushed: Option<u8>,
}

impl<R: AsyncRead + Unpin> PushbackReader<R> {
    /// Wrap `inner` with pushback capacity.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pushed: None,
        }
    }

    async fn next_byte(&mut self) -> Result<u8> {
        if let Some(b) = self.pushed.take() {
            return Ok(b);
        }
        let mut buf = [0u8; 1];
        match self.inner.read_exact(&mut buf).await {
            Ok(_) => Ok(buf[0]),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(BridgeError::TransportClosed(
                    "unexpected end of stream while decoding RP message".to_string(),
                ))
            }
            Err(e) => Err(BridgeError::TransportClosed(e.to_string())),
        }
    }

    /// Return `b` to be the next byte read.
    fn push_back(&mut self, b: u8) {
        debug_assert!(self.pushed.is_none(), "pushback buffer already occupied");
        self.pushed = Some(b);
    }

    async fn read_n(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        if n > 0 {
            if let Some(b) = self.pushed.take() {
                buf[0] = b;
                if n > 1 {
                    self.inner
                        .read_exact(&mut buf[1..])
                        .await
                        .map_err(|e| BridgeError::TransportClosed(e.to_string()))?;
                }
            } else {
                self.inner
                    .read_exact(&mut buf)
                    .await
                    .map_err(|e| BridgeError::TransportClosed(e.to_string()))?;
            }
        }
        Ok(buf)
    }
}

/// Read one [`RpValue`] from `reader`.
///
/// # Errors
///
/// Returns [`BridgeError::Codec`] on malformed input, or
/// [`BridgeError::TransportClosed`] on an unexpected end of stream.
pub async fn decode_value<R: AsyncRead + Unpin>(reader: &mut PushbackReader<R>) -> Result<RpValue> {
    let kind = reader.next_byte().await?;
    match kind {
        b'i' => decode_integer(reader).await,
        b'l' => decode_list(reader).await,
        b'd' => decode_dict(reader).await,
        b'0'..=b'9' => decode_bytestring(reader, kind).await,
        other => Err(BridgeError::Codec(format!(
            "unexpected leading byte '{}' while decoding RP value",
            other as char
        ))),
    }
}

async fn read_until<R: AsyncRead + Unpin>(
    reader: &mut PushbackReader<R>,
    terminator: u8,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        let b = reader.next_byte().await?;
        if b == terminator {
            return Ok(out);
        }
        out.push(b);
    }
}

async fn decode_integer<R: AsyncRead + Unpin>(reader: &mut PushbackReader<R>) -> Result<RpValue> {
    let digits = read_until(reader, b'e').await?;
    let s = std::str::from_utf8(&digits)
        .map_err(|e| BridgeError::Codec(format!("non-UTF8 integer: {e}")))?;
    let n: i64 = s
        .parse()
        .map_err(|e| BridgeError::Codec(format!("malformed integer '{s}': {e}")))?;
    Ok(RpValue::Int(n))
}

async fn decode_bytestring<R: AsyncRead + Unpin>(
    reader: &mut PushbackReader<R>,
    first_digit: u8,
) -> Result<RpValue> {
    let mut digits = vec![first_digit];
    digits.extend(read_until(reader, b':').await?);
    let s = std::str::from_utf8(&digits)
        .map_err(|e| BridgeError::Codec(format!("non-UTF8 length prefix: {e}")))?;
    let len: usize = s
        .parse()
        .map_err(|e| BridgeError::Codec(format!("malformed length prefix '{s}': {e}")))?;
    let payload = reader.read_n(len).await?;
    let text = String::from_utf8(payload)
        .map_err(|e| BridgeError::Codec(format!("non-UTF8 byte-string payload: {e}")))?;
    Ok(RpValue::Str(text))
}

async fn decode_list<R: AsyncRead + Unpin>(reader: &mut PushbackReader<R>) -> Result<RpValue> {
    let mut items = Vec::new();
    loop {
        let b = reader.next_byte().await?;
        if b == b'e' {
            return Ok(RpValue::List(items));
        }
        reader.push_back(b);
        items.push(Box::pin(decode_value(reader)).await?);
    }
}

async fn decode_dict<R: AsyncRead + Unpin>(reader: &mut PushbackReader<R>) -> Result<RpValue> {
    let mut map = std::collections::BTreeMap::new();
    loop {
        let b = reader.next_byte().await?;
        if b == b'e' {
            return Ok(RpValue::Dict(map));
        }
        reader.push_back(b);
        let key = match Box::pin(decode_value(reader)).await? {
            RpValue::Str(s) => s,
            other => {
                return Err(BridgeError::Codec(format!(
                    "dictionary key must be a byte-string, got {other:?}"
                )))
            }
        };
        let value = Box::pin(decode_value(reader)).await?;
        map.insert(key, value);
    }
}

/// Encode `value` and write it to `writer`.
pub async fn encode_value<W: AsyncWrite + Unpin>(value: &RpValue, writer: &mut W) -> Result<()> {
    let bytes = encode_to_vec(value);
    writer
        .write_all(&bytes)
        .await
        .map_err(|e| BridgeError::TransportClosed(e.to_string()))?;
    writer
        .flush()
        .await
        .map_err(|e| BridgeError::TransportClosed(e.to_string()))?;
    Ok(())
}

pub(crate) fn encode_to_vec(value: &RpValue) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

fn encode_into(value: &RpValue, out: &mut Vec<u8>) {
    match value {
        RpValue::Str(s) => {
            out.extend(s.len().to_string().as_bytes());
            out.push(b':');
            out.extend(s.as_bytes());
        }
        RpValue::Int(n) => {
            out.push(b'i');
            out.extend(n.to_string().as_bytes());
            out.push(b'e');
        }
        RpValue::List(items) => {
            out.push(b'l');
            for item in items {
                encode_into(item, out);
            }
            out.push(b'e');
        }
        RpValue::Dict(map) => {
            out.push(b'd');
            for (k, v) in map {
                encode_into(&RpValue::Str(k.clone()), out);
                encode_into(v, out);
            }
            out.push(b'e');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    async fn roundtrip(v: &RpValue) -> RpValue {
        let bytes = encode_to_vec(v);
        let mut reader = PushbackReader::new(&bytes[..]);
        decode_value(&mut reader).await.unwrap()
    }

    #[tokio::test]
    async fn roundtrip_bytestring() {
        let v = RpValue::Str("hello world".to_string());
        assert_eq!(roundtrip(&v).await, v);
    }

    #[tokio::test]
    async fn roundtrip_integer() {
        let v = RpValue::Int(-42);
        assert_eq!(roundtrip(&v).await, v);
    }

    #[tokio::test]
    async fn roundtrip_list() {
        let v = RpValue::List(vec![RpValue::Int(1), RpValue::Str("a".to_string())]);
        assert_eq!(roundtrip(&v).await, v);
    }

    #[tokio::test]
    async fn roundtrip_nested_dict() {
        let mut inner = BTreeMap::new();
        inner.insert("x".to_string(), RpValue::Int(1));
        let mut outer = BTreeMap::new();
        outer.insert("op".to_string(), RpValue::Str("eval".to_string()));
        outer.insert("nested".to_string(), RpValue::Dict(inner));
        outer.insert(
            "status".to_string(),
            RpValue::List(vec![RpValue::Str("done".to_string())]),
        );
        let v = RpValue::Dict(outer);
        assert_eq!(roundtrip(&v).await, v);
    }

    #[tokio::test]
    async fn decode_known_wire_bytes() {
        // d3:ope4:evale3:id1:1e -- a dict {"op": "eval", "id": "1"}
        let wire = b"d2:op4:eval2:id1:1e";
        let mut reader = PushbackReader::new(&wire[..]);
        let v = decode_value(&mut reader).await.unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("op".to_string(), RpValue::Str("eval".to_string()));
        expected.insert("id".to_string(), RpValue::Str("1".to_string()));
        assert_eq!(v, RpValue::Dict(expected));
    }

    #[tokio::test]
    async fn malformed_leading_byte_is_codec_error() {
        let wire = b"x3:foo";
        let mut reader = PushbackReader::new(&wire[..]);
        let err = decode_value(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), "codec");
    }

    #[tokio::test]
    async fn truncated_stream_is_transport_closed() {
        let wire = b"5:hel";
        let mut reader = PushbackReader::new(&wire[..]);
        let err = decode_value(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), "transport-closed");
    }
}
