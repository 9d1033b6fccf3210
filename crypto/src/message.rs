//! Signed-message framing.
//!
//! The digest of a signed message is
//! `sha256d(compact_size(|magic|) || magic || compact_size(|msg|) || msg)`.

use crate::sha256d;

/// Append a Bitcoin-style variable-length integer.
pub fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_compact_size(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

pub fn signed_message_hash(magic: &str, message: &str) -> [u8; 32] {
    let mut buf = Vec::with_capacity(magic.len() + message.len() + 10);
    write_var_bytes(&mut buf, magic.as_bytes());
    write_var_bytes(&mut buf, message.as_bytes());
    sha256d(&buf)
}
