// Human-facing renderings of wire data: hex dumps and JSON.

use serde::{Serialize, Serializer};

/// Bytes shown by `hex_preview` before it truncates.
pub const PREVIEW_BYTES: usize = 256;

/// Classic dump: offset, hex column padded to a fixed width, ASCII column.
pub fn hex_dump(data: &[u8], bytes_per_line: usize) -> String {
    let bytes_per_line = bytes_per_line.max(1);
    let width = bytes_per_line * 3;
    let mut output = String::new();
    let mut offset = 0;

    for chunk in data.chunks(bytes_per_line) {
        let hex: String = chunk.iter().map(|b| format!("{:02x} ", b)).collect();
        let ascii: String = chunk
            .iter()
            .map(|b| {
                if (32..127).contains(b) {
                    *b as char
                } else {
                    '.'
                }
            })
            .collect();

        output.push_str(&format!("{:04x}  {:<width$} {}\n", offset, hex, ascii, width = width));
        offset += chunk.len();
    }
    output
}

/// Compact lowercase hex, cut off after `limit` bytes.
pub fn hex_preview(data: &[u8], limit: usize) -> String {
    let hex: String = data.iter().take(limit).map(|b| format!("{:02x}", b)).collect();
    if data.len() > limit {
        format!("{}... (truncated, {} total bytes)", hex, data.len())
    } else {
        hex
    }
}

/// `serialize_with` helper so byte payloads render as a length plus a hex
/// preview instead of a JSON array of numbers.
pub fn serialize_blob<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    let bytes = bytes.as_ref();
    serializer.serialize_str(&format!(
        "<{} bytes> {}",
        bytes.len(),
        hex_preview(bytes, 32)
    ))
}

pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(value)
}

pub fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
