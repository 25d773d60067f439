//! Short random identifiers for simulations.

use uuid::Uuid;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Minimum number of characters in a generated id.
pub const MIN_SHORT_ID_LEN: usize = 6;

/// Default length used when the caller has no preference.
pub const DEFAULT_SHORT_ID_LEN: usize = 12;

/// Bytes at or above this are discarded so every character is equally likely.
const BYTE_LIMIT: usize = 256 - 256 % ALPHABET.len();

/// Bytes 6 and 8 of a v4 UUID carry the version and variant bits.
const FIXED_UUID_BYTES: [usize; 2] = [6, 8];

fn alphabet_index(byte: u8) -> Option<usize> {
    let b = byte as usize;
    (b < BYTE_LIMIT).then_some(b % ALPHABET.len())
}

/// Random alphanumeric id of at least [`MIN_SHORT_ID_LEN`] characters.
///
/// Randomness comes from the random bytes of v4 UUIDs.
pub fn short_uuid(nchars: usize) -> String {
    let n = nchars.max(MIN_SHORT_ID_LEN);
    let mut out = String::with_capacity(n);
    while out.len() < n {
        let uuid = Uuid::new_v4();
        let random = uuid
            .as_bytes()
            .iter()
            .enumerate()
            .filter(|(i, _)| !FIXED_UUID_BYTES.contains(i))
            .filter_map(|(_, b)| alphabet_index(*b));
        for index in random {
            if out.len() == n {
                break;
            }
            out.push(ALPHABET[index] as char);
        }
    }
    out
}

/// Short id with the default length.
pub fn new_sim_id() -> String {
    short_uuid(DEFAULT_SHORT_ID_LEN)
}
