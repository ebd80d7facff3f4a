//! Data segments: the first stage of the pipeline.
//!
//! A segment is a run of input characters packed in one of the QR modes. Byte mode accepts any
//! input; numeric and alphanumeric pack digits and upper-case URLs tighter and are picked
//! automatically when the whole text fits their character set.

use crate::error::QrError;
use crate::qrcode::Version;

/// The character set of alphanumeric mode, in code order.
static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// How the characters of a [`Segment`] are packed into bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
}

impl SegmentMode {
    /// The 4-bit mode indicator written before the character count.
    pub fn indicator(self) -> u32 {
        match self {
            SegmentMode::Numeric => 0b0001,
            SegmentMode::Alphanumeric => 0b0010,
            SegmentMode::Byte => 0b0100,
        }
    }

    /// Width of the character count field, which grows at versions 10 and 27.
    pub fn char_count_bits(self, version: Version) -> u8 {
        let widths: [u8; 3] = match self {
            SegmentMode::Numeric => [10, 12, 14],
            SegmentMode::Alphanumeric => [9, 11, 13],
            SegmentMode::Byte => [8, 16, 16],
        };
        widths[usize::from((version.value() + 7) / 17)]
    }
}

/// An append-only sequence of bits, most significant bit first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bits: Vec<bool>,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Appends the low `len` bits of `val`, high bit first.
    pub fn append_bits(&mut self, val: u32, len: u8) {
        debug_assert!(len <= 31 && val >> len == 0, "value does not fit in {len} bits");
        self.bits.extend((0..len).rev().map(|i| (val >> i) & 1 != 0));
    }

    pub fn extend_from(&mut self, other: &BitBuffer) {
        self.bits.extend_from_slice(&other.bits);
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Packs the bits into bytes. A trailing partial byte is padded with zeros.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &bit)| acc | (u8::from(bit) << (7 - i)))
            })
            .collect()
    }
}

/// A run of characters encoded in a single mode. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    mode: SegmentMode,
    num_chars: usize,
    data: BitBuffer,
}

impl Segment {
    /// Packs arbitrary bytes, eight bits each.
    pub fn make_bytes(data: &[u8]) -> Self {
        let mut bb = BitBuffer::new();
        for &b in data {
            bb.append_bits(u32::from(b), 8);
        }
        Self {
            mode: SegmentMode::Byte,
            num_chars: data.len(),
            data: bb,
        }
    }

    /// Packs decimal digits three at a time into 10 bits (7 or 4 bits for a short tail).
    pub fn make_numeric(text: &str) -> Result<Self, QrError> {
        if let Some(c) = text.chars().find(|c| !c.is_ascii_digit()) {
            return Err(QrError::Encoding(format!("{c:?} is not a decimal digit")));
        }
        Ok(Self::pack_numeric(text.as_bytes()))
    }

    /// Packs characters of the alphanumeric set in pairs into 11 bits (6 bits for a lone tail).
    pub fn make_alphanumeric(text: &str) -> Result<Self, QrError> {
        let codes = alphanumeric_codes(text)
            .map_err(|c| QrError::Encoding(format!("{c:?} is not in the alphanumeric set")))?;
        Ok(Self::pack_alphanumeric(&codes))
    }

    /// Splits `text` into segments, choosing the tightest mode that covers all of it.
    ///
    /// Empty text produces no segments at all.
    pub fn make_segments(text: &str) -> Vec<Self> {
        if text.is_empty() {
            return Vec::new();
        }
        let seg = match Charset::of(text) {
            Charset::Numeric => Self::pack_numeric(text.as_bytes()),
            Charset::Alphanumeric(codes) => Self::pack_alphanumeric(&codes),
            Charset::Bytes => Self::make_bytes(text.as_bytes()),
        };
        vec![seg]
    }

    // `digits` must be ASCII digits only.
    fn pack_numeric(digits: &[u8]) -> Self {
        let mut bb = BitBuffer::new();
        for group in digits.chunks(3) {
            let value = group
                .iter()
                .fold(0u32, |acc, &b| acc * 10 + u32::from(b - b'0'));
            // 1 digit -> 4 bits, 2 -> 7, 3 -> 10
            bb.append_bits(value, group.len() as u8 * 3 + 1);
        }
        Self {
            mode: SegmentMode::Numeric,
            num_chars: digits.len(),
            data: bb,
        }
    }

    fn pack_alphanumeric(codes: &[u32]) -> Self {
        let mut bb = BitBuffer::new();
        let pairs = codes.chunks_exact(2);
        let tail = pairs.remainder();
        for pair in pairs {
            bb.append_bits(pair[0] * 45 + pair[1], 11);
        }
        if let [last] = tail {
            bb.append_bits(*last, 6);
        }
        Self {
            mode: SegmentMode::Alphanumeric,
            num_chars: codes.len(),
            data: bb,
        }
    }

    pub fn mode(&self) -> SegmentMode {
        self.mode
    }

    pub fn num_chars(&self) -> usize {
        self.num_chars
    }

    pub fn data(&self) -> &BitBuffer {
        &self.data
    }

    /// Bits needed to store `segs` at `version`, headers included.
    ///
    /// Returns `None` if a segment has more characters than its count field can express.
    pub fn total_bits(segs: &[Self], version: Version) -> Option<usize> {
        segs.iter().try_fold(0usize, |acc, seg| {
            let ccbits = seg.mode.char_count_bits(version);
            if seg.num_chars >> ccbits != 0 {
                return None;
            }
            acc.checked_add(4 + usize::from(ccbits))?
                .checked_add(seg.data.len())
        })
    }

    /// Like [`Segment::total_bits`] but ignores count field overflow. Used for error reports.
    pub(crate) fn payload_bits(segs: &[Self], version: Version) -> usize {
        segs.iter()
            .map(|seg| 4 + usize::from(seg.mode.char_count_bits(version)) + seg.data.len())
            .sum()
    }

    pub fn is_numeric(text: &str) -> bool {
        text.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}

/// The narrowest character set that covers a whole text.
enum Charset {
    Numeric,
    Alphanumeric(Vec<u32>),
    Bytes,
}

impl Charset {
    fn of(text: &str) -> Self {
        if Segment::is_numeric(text) {
            Charset::Numeric
        } else if let Ok(codes) = alphanumeric_codes(text) {
            Charset::Alphanumeric(codes)
        } else {
            Charset::Bytes
        }
    }
}

/// Alphanumeric code of every character, or the first character outside the set.
fn alphanumeric_codes(text: &str) -> Result<Vec<u32>, char> {
    text.chars()
        .map(|c| ALPHANUMERIC_CHARSET.find(c).map(|i| i as u32).ok_or(c))
        .collect()
}
