/// Decodes UTF-8 into code points, keeping the byte offset of each one.
///
/// Bytes that are not valid UTF-8 become positions of their own holding `None`,
/// so the offsets always cover the whole input. `offsets` gets one extra entry
/// for the end of the input.
pub fn decode_utf8(bytes: &[u8], chars: &mut Vec<Option<char>>, offsets: &mut Vec<usize>) {
    chars.clear();
    offsets.clear();

    let mut pos = 0;
    while pos < bytes.len() {
        let (valid, invalid) = match core::str::from_utf8(&bytes[pos..]) {
            Ok(s) => (s, 0),
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                let valid =
                    core::str::from_utf8(&bytes[pos..pos + valid_up_to]).unwrap_or_default();
                let invalid = e.error_len().unwrap_or(bytes.len() - pos - valid_up_to);
                (valid, invalid)
            }
        };
        for (i, c) in valid.char_indices() {
            offsets.push(pos + i);
            chars.push(Some(c));
        }
        pos += valid.len();
        for _ in 0..invalid {
            offsets.push(pos);
            chars.push(None);
            pos += 1;
        }
    }
    offsets.push(bytes.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> (Vec<Option<char>>, Vec<usize>) {
        let mut chars = vec![];
        let mut offsets = vec![];
        decode_utf8(bytes, &mut chars, &mut offsets);
        (chars, offsets)
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!((vec![], vec![0]), decode(b""));
    }

    #[test]
    fn test_decode_multibyte() {
        let (chars, offsets) = decode("a東京\n".as_bytes());
        assert_eq!(vec![Some('a'), Some('東'), Some('京'), Some('\n')], chars);
        assert_eq!(vec![0, 1, 4, 7, 8], offsets);
    }

    #[test]
    fn test_decode_invalid() {
        let (chars, offsets) = decode(b"a\xffb\xe3\x80");
        assert_eq!(vec![Some('a'), None, Some('b'), None, None], chars);
        assert_eq!(vec![0, 1, 2, 3, 4, 5], offsets);
    }

    #[test]
    fn test_decode_reuses_buffers() {
        let mut chars = vec![Some('x'); 10];
        let mut offsets = vec![3; 10];
        decode_utf8(b"ok", &mut chars, &mut offsets);
        assert_eq!(vec![Some('o'), Some('k')], chars);
        assert_eq!(vec![0, 1, 2], offsets);
    }
}
