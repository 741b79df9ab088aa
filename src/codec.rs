//! Radix codec: bytes to and from a base-N symbol string.
//!
//! Two wire layouts share the alphabet:
//!
//! *Standard layout* (payloads at or above the small-data threshold):
//!
//! ```text
//! <metaLenSymbol><lengthDigits...><checksumSymbol><dataDigits...>
//! ```
//!
//! `metaLenSymbol` is one digit giving the header symbol count (length
//! digits plus the checksum digit). `lengthDigits` is the payload byte
//! length base-N, most-significant digit first. The checksum digit holds
//! the sum of all data digit values mod N. The data digits are the
//! group-wise base-N conversion of a 4-byte big-endian length prefix
//! followed by the payload.
//!
//! *Small-data layout* (below the threshold, alphabets with N² >= 256):
//!
//! ```text
//! <marker><lengthDigits{1,2}><checksumSymbol><dataDigits...>
//! ```
//!
//! The marker is the reserved highest digit. The length field is one
//! digit when N exceeds the threshold, two otherwise. Each payload byte
//! packs into two digits (`b / N`, `b % N`), skipping big-number
//! conversion entirely.
//!
//! A checksum mismatch is reported, never fatal: partial recovery beats
//! hard failure for a locator that survived transit mostly intact.

use crate::alphabet::Alphabet;
use crate::backend::{digit_count, AcceleratedBackend, DigitBackend};
use crate::config::CodecConfig;
use crate::error::{BackendError, DecodeError, InlinkError};
use crate::parallel::ParallelBackend;
use crate::sequential::SequentialBackend;

/// Backend selection state. `Accelerated` only ever holds while the
/// parallel pipeline is believed healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Accelerated,
    Fallback,
}

/// Result of a decode: the recovered bytes plus the soft checksum
/// verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub bytes: Vec<u8>,
    pub checksum_ok: bool,
}

/// Byte-sequence to symbol-string codec over one immutable alphabet.
pub struct RadixCodec {
    alphabet: Alphabet,
    cfg: CodecConfig,
    sequential: SequentialBackend,
    parallel: Box<dyn AcceleratedBackend>,
    state: BackendState,
}

impl RadixCodec {
    pub fn new(alphabet: Alphabet, cfg: CodecConfig) -> Result<Self, InlinkError> {
        let parallel = Box::new(ParallelBackend::new(alphabet.radix(), cfg.group_width));
        Self::with_parallel(alphabet, cfg, parallel)
    }

    /// Construct with an explicit parallel backend. Used by tests and by
    /// callers bringing their own compute provider.
    pub fn with_parallel(
        alphabet: Alphabet,
        cfg: CodecConfig,
        parallel: Box<dyn AcceleratedBackend>,
    ) -> Result<Self, InlinkError> {
        cfg.validate()?;
        let sequential = SequentialBackend::new(alphabet.radix(), cfg.group_width);
        let state = if parallel.is_available() {
            BackendState::Accelerated
        } else {
            BackendState::Fallback
        };
        Ok(Self {
            alphabet,
            cfg,
            sequential,
            parallel,
            state,
        })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn backend_state(&self) -> BackendState {
        self.state
    }

    /// Re-initialize the parallel pipeline. Returns to `Accelerated` only
    /// on success.
    pub fn try_reenable(&mut self) -> bool {
        if self.parallel.reinitialize() {
            self.state = BackendState::Accelerated;
            true
        } else {
            false
        }
    }

    /// Projected symbol count for a payload of `byte_count` bytes:
    /// `ceil((byte_count + 4) * 8 / log2(N))`. Cheap pruning estimate, not
    /// an exact figure.
    pub fn estimate_encoded_length(&self, byte_count: usize) -> usize {
        (((byte_count + 4) * 8) as f64 / self.alphabet.bits_per_symbol()).ceil() as usize
    }

    /// Encode bytes into a symbol string.
    pub fn encode(&mut self, bytes: &[u8]) -> String {
        if self.small_eligible(bytes.len()) {
            self.encode_small(bytes)
        } else {
            self.encode_standard(bytes)
        }
    }

    /// Strict structured decode. `InvalidSymbol` and `LengthMismatch` may
    /// still be salvageable through [`decode_legacy`](Self::decode_legacy).
    pub fn decode(&mut self, input: &str) -> Result<Decoded, DecodeError> {
        let digits = self.digits_of(input)?;
        if digits.is_empty() {
            return Err(DecodeError::LengthMismatch("empty input".into()));
        }
        if self.small_supported() && digits[0] == self.alphabet.marker_digit() {
            self.decode_small(&digits)
        } else {
            self.decode_standard(&digits)
        }
    }

    /// Structured decode with automatic fallback to the legacy salvage
    /// path on recoverable failures.
    pub fn decode_lenient(&mut self, input: &str) -> Result<Decoded, DecodeError> {
        match self.decode(input) {
            Ok(decoded) => Ok(decoded),
            Err(DecodeError::Unrecoverable(msg)) => Err(DecodeError::Unrecoverable(msg)),
            Err(err) => {
                log::warn!("structured decode failed ({err}), trying legacy path");
                self.decode_legacy(input)
            }
        }
    }

    /// Best-effort salvage decode for inputs that fail structured parsing.
    /// Skips unrecognized symbols, estimates the payload size from the
    /// symbol count and recombines whatever digits survive.
    pub fn decode_legacy(&self, input: &str) -> Result<Decoded, DecodeError> {
        let total_symbols = input.chars().count();
        let digits: Vec<u32> = input
            .chars()
            .filter_map(|c| self.alphabet.digit(c))
            .collect();
        if digits.is_empty() {
            return Err(DecodeError::Unrecoverable(
                "no recognizable symbols".into(),
            ));
        }

        // Skip what looks like a standard header.
        let lead = digits[0] as usize;
        let body = if lead >= 2 && lead + 1 < digits.len() {
            &digits[lead + 1..]
        } else {
            &digits[..]
        };

        // Whole-body big-number recombination; manual byte-array long
        // arithmetic, most-significant byte first.
        let radix = self.alphabet.radix() as u64;
        let mut bytes: Vec<u8> = Vec::new();
        for &d in body {
            let mut carry = d as u64;
            for byte in bytes.iter_mut().rev() {
                let t = *byte as u64 * radix + carry;
                *byte = (t & 0xff) as u8;
                carry = t >> 8;
            }
            while carry > 0 {
                bytes.insert(0, (carry & 0xff) as u8);
                carry >>= 8;
            }
        }

        // A surviving length prefix wins over the estimate.
        if bytes.len() > 4 {
            let declared =
                u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
            if declared > 0 && declared <= bytes.len() - 4 {
                return Ok(Decoded {
                    bytes: bytes[4..4 + declared].to_vec(),
                    checksum_ok: false,
                });
            }
        }

        let estimated =
            ((total_symbols as f64 * self.cfg.legacy_length_ratio) as usize).max(1);
        let take = estimated.min(bytes.len());
        if take == 0 {
            return Err(DecodeError::Unrecoverable("nothing recoverable".into()));
        }
        Ok(Decoded {
            bytes: bytes[bytes.len() - take..].to_vec(),
            checksum_ok: false,
        })
    }

    // ------------------------------------------------------------------
    // Layout selection

    fn small_supported(&self) -> bool {
        let n = self.alphabet.radix();
        n * n >= 256
    }

    fn small_len_digits(&self) -> usize {
        if self.alphabet.radix() > self.cfg.small_threshold {
            1
        } else {
            2
        }
    }

    fn small_eligible(&self, byte_len: usize) -> bool {
        if !self.small_supported() {
            return false;
        }
        let capacity = self
            .alphabet
            .radix()
            .saturating_pow(self.small_len_digits() as u32);
        (byte_len == 0 || byte_len < self.cfg.small_threshold) && byte_len < capacity
    }

    // ------------------------------------------------------------------
    // Standard layout

    fn encode_standard(&mut self, bytes: &[u8]) -> String {
        assert!(bytes.len() <= u32::MAX as usize, "payload exceeds 4 GiB prefix range");
        let mut data = Vec::with_capacity(bytes.len() + 4);
        data.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        data.extend_from_slice(bytes);

        let digits = self.convert_encode(&data);
        let checksum = self.checksum(&digits);
        let len_digits = to_base_digits(bytes.len(), self.alphabet.radix());
        let header_count = len_digits.len() + 1;
        // The lead symbol may only collide with the marker when the small
        // layout is live, and there N >= 16 caps a u32 length at 8 digits,
        // so header_count tops out at 9, below every marker >= 15. For
        // smaller radixes the marker carries no meaning on decode.
        debug_assert!(
            !self.small_supported() || (header_count as u32) < self.alphabet.marker_digit()
        );

        let mut out = String::with_capacity(1 + header_count + digits.len());
        out.push(self.alphabet.symbol(header_count as u32));
        for d in len_digits {
            out.push(self.alphabet.symbol(d));
        }
        out.push(self.alphabet.symbol(checksum));
        for d in digits {
            out.push(self.alphabet.symbol(d));
        }
        out
    }

    fn decode_standard(&mut self, digits: &[u32]) -> Result<Decoded, DecodeError> {
        if digits.len() < 3 {
            return Err(DecodeError::LengthMismatch("input too short".into()));
        }
        let header_count = digits[0] as usize;
        if header_count < 2 || header_count + 1 > digits.len() {
            return Err(DecodeError::LengthMismatch(format!(
                "header of {header_count} symbols does not fit input"
            )));
        }
        let length = from_base_digits(&digits[1..header_count], self.alphabet.radix())
            .ok_or_else(|| DecodeError::LengthMismatch("length field overflow".into()))?;
        let checksum = digits[header_count];
        let data_digits = &digits[header_count + 1..];

        let total_bytes = length
            .checked_add(4)
            .ok_or_else(|| DecodeError::LengthMismatch("length field overflow".into()))?;
        let expected =
            digit_count(self.alphabet.radix(), self.cfg.group_width, total_bytes);
        if data_digits.len() != expected {
            return Err(DecodeError::LengthMismatch(format!(
                "expected {expected} data digits for {length} bytes, got {}",
                data_digits.len()
            )));
        }

        let checksum_ok = self.checksum(data_digits) == checksum;
        if !checksum_ok {
            log::warn!("checksum mismatch on decode, continuing best-effort");
        }

        let bytes = self.convert_decode(data_digits, total_bytes)?;
        let declared =
            u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let available = bytes.len() - 4;
        if declared == 0 {
            if available != 0 {
                return Err(DecodeError::LengthMismatch(
                    "zero declared length with data present".into(),
                ));
            }
        } else if declared > available {
            return Err(DecodeError::LengthMismatch(format!(
                "declared length {declared} exceeds available {available} bytes"
            )));
        }
        Ok(Decoded {
            bytes: bytes[4..4 + declared].to_vec(),
            checksum_ok,
        })
    }

    // ------------------------------------------------------------------
    // Small-data layout

    fn encode_small(&self, bytes: &[u8]) -> String {
        let radix = self.alphabet.radix() as u32;
        let mut digits = Vec::with_capacity(bytes.len() * 2);
        for &b in bytes {
            digits.push(b as u32 / radix);
            digits.push(b as u32 % radix);
        }
        let checksum = self.checksum(&digits);
        let field = self.small_len_digits();

        let mut out = String::with_capacity(1 + field + 1 + digits.len());
        out.push(self.alphabet.symbol(self.alphabet.marker_digit()));
        for d in to_base_digits_fixed(bytes.len(), self.alphabet.radix(), field) {
            out.push(self.alphabet.symbol(d));
        }
        out.push(self.alphabet.symbol(checksum));
        for d in digits {
            out.push(self.alphabet.symbol(d));
        }
        out
    }

    fn decode_small(&self, digits: &[u32]) -> Result<Decoded, DecodeError> {
        let field = self.small_len_digits();
        if digits.len() < 1 + field + 1 {
            return Err(DecodeError::LengthMismatch("input too short".into()));
        }
        let length = from_base_digits(&digits[1..1 + field], self.alphabet.radix())
            .ok_or_else(|| DecodeError::LengthMismatch("length field overflow".into()))?;
        let checksum = digits[1 + field];
        let data_digits = &digits[1 + field + 1..];
        if data_digits.len() != length * 2 {
            return Err(DecodeError::LengthMismatch(format!(
                "expected {} data digits for {length} bytes, got {}",
                length * 2,
                data_digits.len()
            )));
        }

        let checksum_ok = self.checksum(data_digits) == checksum;
        if !checksum_ok {
            log::warn!("checksum mismatch on decode, continuing best-effort");
        }

        let radix = self.alphabet.radix() as u32;
        let mut bytes = Vec::with_capacity(length);
        for pair in data_digits.chunks(2) {
            // A corrupted pair can exceed 255; keep the low byte and let
            // the checksum flag report it.
            let v = pair[0] * radix + pair[1];
            bytes.push(v as u8);
        }
        Ok(Decoded { bytes, checksum_ok })
    }

    // ------------------------------------------------------------------
    // Backend dispatch

    fn checksum(&self, digits: &[u32]) -> u32 {
        let n = self.alphabet.radix() as u64;
        digits.iter().fold(0u64, |acc, &d| (acc + d as u64) % n) as u32
    }

    fn use_parallel(&self, byte_len: usize) -> bool {
        byte_len >= self.cfg.parallel_threshold && self.state == BackendState::Accelerated
    }

    fn note_parallel_failure(&mut self, err: &BackendError) {
        match err {
            // Capacity is a property of the payload, not the device; the
            // pipeline stays eligible for smaller payloads.
            BackendError::CapacityExceeded { .. } => {
                log::debug!("payload over grid capacity, using sequential backend: {err}");
            }
            _ => {
                log::warn!("parallel backend failed ({err}), switching to fallback");
                self.state = BackendState::Fallback;
            }
        }
    }

    fn convert_encode(&mut self, data: &[u8]) -> Vec<u32> {
        if self.use_parallel(data.len()) {
            match self.parallel.encode_digits(data) {
                Ok(digits) => return digits,
                Err(err) => self.note_parallel_failure(&err),
            }
        }
        self.sequential.encode_groups(data)
    }

    fn convert_decode(
        &mut self,
        digits: &[u32],
        byte_len: usize,
    ) -> Result<Vec<u8>, DecodeError> {
        if self.use_parallel(byte_len) {
            match self.parallel.decode_digits(digits, byte_len) {
                Ok(bytes) => return Ok(bytes),
                Err(err) => self.note_parallel_failure(&err),
            }
        }
        self.sequential
            .decode_groups(digits, byte_len)
            .map_err(|e| DecodeError::LengthMismatch(format!("digit conversion failed: {e}")))
    }

    fn digits_of(&self, input: &str) -> Result<Vec<u32>, DecodeError> {
        input
            .chars()
            .map(|c| {
                self.alphabet
                    .digit(c)
                    .ok_or(DecodeError::InvalidSymbol(c))
            })
            .collect()
    }
}

// Most-significant digit first, at least one digit.
fn to_base_digits(mut value: usize, radix: usize) -> Vec<u32> {
    let mut digits = Vec::new();
    loop {
        digits.push((value % radix) as u32);
        value /= radix;
        if value == 0 {
            break;
        }
    }
    digits.reverse();
    digits
}

// Fixed-width variant, zero-padded. The caller guarantees the value fits.
fn to_base_digits_fixed(mut value: usize, radix: usize, width: usize) -> Vec<u32> {
    let mut digits = vec![0u32; width];
    for slot in (0..width).rev() {
        digits[slot] = (value % radix) as u32;
        value /= radix;
    }
    digits
}

fn from_base_digits(digits: &[u32], radix: usize) -> Option<usize> {
    let mut value = 0usize;
    for &d in digits {
        value = value.checked_mul(radix)?.checked_add(d as usize)?;
    }
    Some(value)
}
