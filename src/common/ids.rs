//! Artifact fingerprints, so logs can tell two model files apart.

const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over a byte stream. Not collision resistant.
#[derive(Copy, Clone, Debug)]
pub struct Fingerprinter {
    state: u64,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self {
            state: OFFSET_BASIS,
        }
    }

    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.state = bytes
            .iter()
            .fold(self.state, |h, &b| (h ^ u64::from(b)).wrapping_mul(PRIME));
        self
    }

    /// 16 lowercase hex digits.
    pub fn hex(&self) -> String {
        format!("{:016x}", self.state)
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn fingerprint(bytes: &[u8]) -> String {
    Fingerprinter::new().write(bytes).hex()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(fingerprint(b""), "cbf29ce484222325");
        assert_eq!(fingerprint(b"a"), "af63dc4c8601ec8c");
    }

    #[test]
    fn chunked_input_matches_whole() {
        let mut fp = Fingerprinter::default();
        fp.write(b"model").write(b".json");
        assert_eq!(fp.hex(), fingerprint(b"model.json"));
    }
}
