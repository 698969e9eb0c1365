//! Running XOR checksum shared by text sentences and binary segments.
//!
//! Text sentences fold the raw body bytes between `$`/`!` and `*`. Binary
//! segments fold the bytes of the emitted hex transcript (separators
//! included), so the trailer matches what downstream tools see.

/// XOR accumulator, reset at every sentence or segment start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum {
    value: u32,
}

impl Checksum {
    pub const fn new(seed: u32) -> Self {
        Self { value: seed }
    }

    /// Start a new sentence or segment.
    pub fn reset(&mut self, seed: u32) {
        self.value = seed;
    }

    /// XOR every byte of `bytes` into the accumulator.
    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.update_byte(b);
        }
    }

    pub fn update_byte(&mut self, byte: u8) {
        self.value ^= byte as u32;
    }

    /// Fold one received checksum digit into the accumulator.
    ///
    /// After two digits the accumulator is zero exactly when the digits
    /// equal the folded body, and `residual()` is `computed ^ received`.
    pub fn fold_nibble(&mut self, nibble: u8) {
        self.value ^= ((nibble & 0x0F) as u32) << 4;
        self.value <<= 4;
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Value reported in the `checksum error` annotation.
    pub fn residual(&self) -> u32 {
        self.value >> 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_checksum(body: &[u8]) -> Checksum {
        let mut csum = Checksum::new(0);
        csum.update(body);
        csum
    }

    #[test]
    fn test_known_sentence_checksums() {
        assert_eq!(body_checksum(b"GPVTG,,T,247.3,M,0.0,N").value(), 0x07);
        assert_eq!(body_checksum(b"POSMVCC,5143,4943").value(), 0x5E);
        assert_eq!(body_checksum(b"POSMACC,16644,-200,2024").value(), 0x46);
    }

    #[test]
    fn test_reset_discards_previous_value() {
        let mut csum = body_checksum(b"GPGGA");
        csum.reset(0x1F);
        assert_eq!(csum.value(), 0x1F);
        csum.reset(0);
        assert!(csum.is_zero());
    }

    #[test]
    fn test_matching_digits_leave_zero() {
        let mut csum = body_checksum(b"POSMVCC,5143,4943");
        csum.fold_nibble(0x5);
        csum.fold_nibble(0xE);
        assert!(csum.is_zero());
        assert_eq!(csum.residual(), 0);
    }

    #[test]
    fn test_mismatch_residual_is_xor_difference() {
        let mut csum = body_checksum(b"POSMVCC,5143,4943");
        csum.fold_nibble(0x5);
        csum.fold_nibble(0xF);
        assert!(!csum.is_zero());
        assert_eq!(csum.residual(), 0x01);

        let mut csum = body_checksum(b"GPVTG,,T,247.3,M,0.0,N");
        csum.fold_nibble(0x0);
        csum.fold_nibble(0x0);
        assert_eq!(csum.residual(), 0x07);
    }

    #[test]
    fn test_missing_digits_report_zero_residual() {
        // `*` directly followed by a line end: nonzero, yet nothing above bit 8.
        let csum = body_checksum(b"GPVTG,,T,247.3,M,0.0,N");
        assert!(!csum.is_zero());
        assert_eq!(csum.residual(), 0);
    }

    #[test]
    fn test_many_digits_do_not_overflow() {
        let mut csum = Checksum::new(0xFF);
        for _ in 0..32 {
            csum.fold_nibble(0xF);
        }
        assert_eq!(csum.value() & 0xF, 0);
    }
}
