/// Opaque token grouping one page's assistant conversation. Minted once and
/// never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

const SUFFIX_LEN: usize = 9;

impl SessionToken {
    /// Build a token from an issue time and random bits.
    pub fn mint(issued_at_ms: i64, entropy: u64) -> Self {
        Self(format!("session_{issued_at_ms}_{}", base36(entropy, SUFFIX_LEN)))
    }

    /// Mint from the browser clock and `Math.random`.
    pub fn generate() -> Self {
        let entropy = (js_sys::Math::random() * 36f64.powi(SUFFIX_LEN as i32)) as u64;
        Self::mint(chrono::Utc::now().timestamp_millis(), entropy)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase base-36, left-padded with zeros and keeping the lowest `width` digits.
fn base36(mut value: u64, width: usize) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = vec![b'0'; width];
    for slot in out.iter_mut().rev() {
        *slot = DIGITS[(value % 36) as usize];
        value /= 36;
    }
    String::from_utf8_lossy(&out).into_owned()
}
