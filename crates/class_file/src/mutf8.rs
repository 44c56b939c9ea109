//! Decoding of the "modified UTF-8" used by CONSTANT_Utf8_info.
//!
//! https://docs.oracle.com/javase/specs/jvms/se19/html/jvms-4.html#jvms-4.4.7
//!
//! It differs from standard UTF-8 in two ways: the null code point is written
//! as the two bytes `0xc0 0x80`, and supplementary characters are written as a
//! surrogate pair of two three-byte sequences instead of one four-byte sequence.

/// Decodes `bytes`, replacing malformed sequences and unpaired surrogates with U+FFFD.
pub fn decode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let x = bytes[i];
        let width = match x {
            0x00..=0x7f => {
                s.push(x as char);
                1
            }
            0xc0..=0xdf => match bytes.get(i + 1) {
                Some(&y) if is_continuation(y) => {
                    push_code_point(&mut s, ((x as u32 & 0x1f) << 6) + (y as u32 & 0x3f));
                    2
                }
                _ => malformed(&mut s),
            },
            0xe0..=0xef => {
                if let Some(c) = supplementary(&bytes[i..]) {
                    s.push(c);
                    6
                } else {
                    match (bytes.get(i + 1), bytes.get(i + 2)) {
                        (Some(&y), Some(&z)) if is_continuation(y) && is_continuation(z) => {
                            push_code_point(
                                &mut s,
                                ((x as u32 & 0xf) << 12)
                                    + ((y as u32 & 0x3f) << 6)
                                    + (z as u32 & 0x3f),
                            );
                            3
                        }
                        _ => malformed(&mut s),
                    }
                }
            }
            // Stray continuation bytes and four-byte leaders never occur in this encoding.
            _ => malformed(&mut s),
        };

        i += width;
    }

    s
}

/// A six-byte surrogate pair: `u v w x y z` with `u == x == 0xed`.
fn supplementary(bytes: &[u8]) -> Option<char> {
    let &[u, v, w, x, y, z, ..] = bytes else {
        return None;
    };

    if u != 0xed
        || v & 0xf0 != 0xa0
        || !is_continuation(w)
        || x != 0xed
        || y & 0xf0 != 0xb0
        || !is_continuation(z)
    {
        return None;
    }

    char::from_u32(
        0x10000
            + ((v as u32 & 0x0f) << 16)
            + ((w as u32 & 0x3f) << 10)
            + ((y as u32 & 0x0f) << 6)
            + (z as u32 & 0x3f),
    )
}

fn is_continuation(b: u8) -> bool {
    b & 0xc0 == 0x80
}

fn push_code_point(s: &mut String, code_point: u32) {
    s.push(char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER));
}

fn malformed(s: &mut String) -> usize {
    s.push(char::REPLACEMENT_CHARACTER);
    1
}
