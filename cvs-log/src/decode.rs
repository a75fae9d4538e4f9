use crate::Error;

/// Decodes `cvs log` / `rlog` output as UTF-8, falling back to a byte-wise
/// ISO-8859-1 (Latin-1) interpretation if the bytes aren't valid UTF-8. The
/// fallback is total (every byte maps to a `char`) so this never fails, and
/// it's deterministic, so cached deltas compare equal across runs regardless
/// of which encoding a given server happened to use.
pub(crate) fn decode(input: &[u8]) -> Result<String, Error> {
    match std::str::from_utf8(input) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Ok(input.iter().map(|&b| b as char).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode("héllo".as_bytes()).unwrap(), "héllo");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        // 0xe9 is 'é' in Latin-1 but not valid standalone UTF-8.
        assert_eq!(decode(&[b'h', 0xe9, b'i']).unwrap(), "h\u{e9}i");
    }
}
