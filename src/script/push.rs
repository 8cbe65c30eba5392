//! Push-data length prefixes
//!
//! Script byte streams carry data as `<length prefix> <bytes>`. Lengths
//! below `OP_PUSHDATA1` are the opcode itself; larger lengths use one of
//! the three size-tiered `OP_PUSHDATAn` opcodes followed by a little-endian
//! length field.

use super::error::ScriptError;
use super::opcodes::{OP_PUSHBYTES_75, OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4};

/// Encode the opcode(s) announcing that `n` bytes of data follow
pub fn encode_push_length(n: u32) -> Vec<u8> {
    if n < OP_PUSHDATA1 as u32 {
        vec![n as u8]
    } else if n <= 0xff {
        vec![OP_PUSHDATA1, n as u8]
    } else if n <= 0xffff {
        let mut out = vec![OP_PUSHDATA2];
        out.extend_from_slice(&(n as u16).to_le_bytes());
        out
    } else {
        let mut out = vec![OP_PUSHDATA4];
        out.extend_from_slice(&n.to_le_bytes());
        out
    }
}

/// Decode the push length at `pos`
///
/// On success `pos` is advanced past the length encoding so that it points
/// at the first byte of the pushed data. On failure `pos` is left untouched.
pub fn decode_push_length(script: &[u8], pos: &mut usize) -> Result<u32, ScriptError> {
    let start = *pos;
    let op = *script
        .get(start)
        .ok_or_else(|| ScriptError::malformed(format!("no push opcode at offset {}", start)))?;

    let width = match op {
        0..=OP_PUSHBYTES_75 => {
            *pos = start + 1;
            return Ok(op as u32);
        }
        OP_PUSHDATA1 => 1,
        OP_PUSHDATA2 => 2,
        OP_PUSHDATA4 => 4,
        _ => {
            return Err(ScriptError::malformed(format!(
                "opcode 0x{:02x} at offset {} is not a push",
                op, start
            )))
        }
    };

    let field = script
        .get(start + 1..start + 1 + width)
        .ok_or_else(|| ScriptError::malformed(format!("truncated push length at offset {}", start)))?;

    let mut le = [0u8; 4];
    le[..width].copy_from_slice(field);
    *pos = start + 1 + width;
    Ok(u32::from_le_bytes(le))
}

/// Serialize `data` as a single push: length prefix followed by the bytes
pub fn push_data(data: &[u8]) -> Vec<u8> {
    let mut out = encode_push_length(data.len() as u32);
    out.extend_from_slice(data);
    out
}

/// Read one push at `pos`, returning the pushed bytes and advancing `pos`
/// past them
pub fn read_push<'a>(script: &'a [u8], pos: &mut usize) -> Result<&'a [u8], ScriptError> {
    let mut cursor = *pos;
    let len = decode_push_length(script, &mut cursor)? as usize;
    let data = script
        .get(cursor..)
        .and_then(|rest| rest.get(..len))
        .ok_or_else(|| {
            ScriptError::malformed(format!(
                "push of {} bytes at offset {} runs past end of script",
                len, *pos
            ))
        })?;
    *pos = cursor + len;
    Ok(data)
}

/// Split a push-only script into its pushed items
///
/// Fails if any opcode in the script is not a push.
pub fn read_all_pushes(script: &[u8]) -> Result<Vec<&[u8]>, ScriptError> {
    let mut items = Vec::new();
    let mut pos = 0;
    while pos < script.len() {
        items.push(read_push(script, &mut pos)?);
    }
    Ok(items)
}
