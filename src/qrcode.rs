//! QR code symbol construction.
//!
//! This module lays out a QR Code Model 2 symbol: function patterns, format and version
//! information, the zig-zag placement of codewords, and the choice of data mask. Versions 1 to
//! 40 and all four error correction levels are supported.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::ecc;
use crate::error::QrError;
use crate::segment::Segment;

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

/// A QR Code symbol, a square grid of dark and light modules.
///
/// Instances are immutable once built. Construct one with [`QrCode::encode_text`], or with
/// [`QrCode::encode_segments`] / [`QrCode::encode_codewords`] for finer control.
///
/// # Example
///
/// ```rust
/// use qrserve::qrcode::{EcLevel, QrCode};
///
/// let qr = QrCode::encode_text("https://example.com", EcLevel::High).unwrap();
/// assert_eq!(qr.size(), qr.version().value() as i32 * 4 + 17);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrCode {
    version: Version,

    /// Width and height in modules, 21 to 177.
    size: i32,

    ec_level: EcLevel,

    mask: Mask,

    /// Row-major, `true` is dark.
    modules: Vec<bool>,

    /// Modules that belong to function patterns or the format/version areas; never masked.
    is_function: Vec<bool>,
}

impl QrCode {
    /// Encodes `text` at the smallest version that fits, with automatic mode and mask selection.
    ///
    /// # Errors
    ///
    /// [`QrError::CapacityExceeded`] if the text is too long for version 40 at `ecl`.
    pub fn encode_text(text: &str, ecl: EcLevel) -> Result<Self, QrError> {
        let segs = Segment::make_segments(text);
        Self::encode_segments(&segs, ecl)
    }

    pub fn encode_segments(segs: &[Segment], ecl: EcLevel) -> Result<Self, QrError> {
        let (version, data) = ecc::encode_data(segs, ecl)?;
        Ok(Self::encode_codewords(version, ecl, &data))
    }

    /// Builds the symbol from already padded data codewords.
    ///
    /// # Panics
    ///
    /// Panics if `data` does not hold exactly the data codeword count of `version` at `ecl`.
    pub fn encode_codewords(version: Version, ecl: EcLevel, data: &[u8]) -> Self {
        let size = version.size();
        let cells = (size * size) as usize;
        let mut qr = Self {
            version,
            size,
            ec_level: ecl,
            mask: Mask::new(0),
            modules: vec![false; cells],
            is_function: vec![false; cells],
        };
        qr.draw_function_patterns();
        let codewords = ecc::add_ecc_and_interleave(data, version, ecl);
        qr.draw_codewords(&codewords);

        let penalties = qr.score_masks();
        let mut best = Mask::new(0);
        for mask in Mask::all() {
            // strictly lower only, so ties keep the lower index
            if penalties[mask.index()] < penalties[best.index()] {
                best = mask;
            }
        }
        qr.apply_mask(best);
        qr.draw_format_bits(best);
        qr.mask = best;

        debug!(
            version = version.value(),
            ec_level = %ecl,
            mask = best.value(),
            penalty = penalties[best.index()],
            "built symbol"
        );
        qr
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Width and height in modules.
    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn error_correction_level(&self) -> EcLevel {
        self.ec_level
    }

    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns `true` for a dark module. Coordinates outside the symbol read as light.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        (0..self.size).contains(&x) && (0..self.size).contains(&y) && self.modules[self.index(x, y)]
    }

    /// The penalty every candidate mask would score on this symbol's data.
    ///
    /// The applied mask is always the first minimum of this array.
    pub fn mask_penalties(&self) -> [i32; 8] {
        let mut unmasked = self.clone();
        unmasked.apply_mask(self.mask);
        unmasked.score_masks()
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.size + x) as usize
    }

    fn set_function_module(&mut self, x: i32, y: i32, dark: bool) {
        let i = self.index(x, y);
        self.modules[i] = dark;
        self.is_function[i] = true;
    }

    /// Timing, finder and alignment patterns, plus placeholders for format and version bits.
    fn draw_function_patterns(&mut self) {
        let size = self.size;
        for i in 0..size {
            self.set_function_module(6, i, i % 2 == 0);
            self.set_function_module(i, 6, i % 2 == 0);
        }

        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(size - 4, 3);
        self.draw_finder_pattern(3, size - 4);

        let positions = self.version.alignment_pattern_positions();
        let last = positions.len().saturating_sub(1);
        for (i, &x) in positions.iter().enumerate() {
            for (j, &y) in positions.iter().enumerate() {
                let overlaps_finder =
                    (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
                if !overlaps_finder {
                    self.draw_alignment_pattern(x, y);
                }
            }
        }

        // Reserved now, overwritten once the mask is known.
        self.draw_format_bits(Mask::new(0));
        self.draw_version();
    }

    /// A 7x7 finder centred on (x, y) with its light separator, clipped to the symbol.
    fn draw_finder_pattern(&mut self, x: i32, y: i32) {
        for dy in -4i32..=4 {
            for dx in -4i32..=4 {
                let (xx, yy) = (x + dx, y + dy);
                if (0..self.size).contains(&xx) && (0..self.size).contains(&yy) {
                    let ring = dx.abs().max(dy.abs());
                    self.set_function_module(xx, yy, ring != 2 && ring != 4);
                }
            }
        }
    }

    fn draw_alignment_pattern(&mut self, x: i32, y: i32) {
        for dy in -2i32..=2 {
            for dx in -2i32..=2 {
                let ring = dx.abs().max(dy.abs());
                self.set_function_module(x + dx, y + dy, ring != 1);
            }
        }
    }

    /// Both copies of the 15-bit format word, and the always-dark module.
    fn draw_format_bits(&mut self, mask: Mask) {
        let bits = format_bits(self.ec_level, mask);
        let bit = |i: u32| (bits >> i) & 1 != 0;
        let size = self.size;

        // around the top-left finder
        for i in 0..6 {
            self.set_function_module(8, i, bit(i as u32));
        }
        self.set_function_module(8, 7, bit(6));
        self.set_function_module(8, 8, bit(7));
        self.set_function_module(7, 8, bit(8));
        for i in 9..15 {
            self.set_function_module(14 - i, 8, bit(i as u32));
        }

        // split between the top-right and bottom-left finders
        for i in 0..8 {
            self.set_function_module(size - 1 - i, 8, bit(i as u32));
        }
        for i in 8..15 {
            self.set_function_module(8, size - 15 + i, bit(i as u32));
        }
        self.set_function_module(8, size - 8, true);
    }

    /// The two 6x3 version blocks, present from version 7 on.
    fn draw_version(&mut self) {
        let Some(bits) = version_bits(self.version) else {
            return;
        };
        for i in 0..18 {
            let dark = (bits >> i) & 1 != 0;
            let a = self.size - 11 + i % 3;
            let b = i / 3;
            self.set_function_module(a, b, dark);
            self.set_function_module(b, a, dark);
        }
    }

    /// Places the codewords MSB first, two columns at a time, sweeping up then down from the
    /// bottom-right corner and hopping over the vertical timing pattern.
    fn draw_codewords(&mut self, codewords: &[u8]) {
        assert_eq!(
            codewords.len(),
            self.version.raw_data_modules() / 8,
            "codeword count does not match version"
        );
        let total_bits = codewords.len() * 8;
        let mut i = 0usize;
        let mut right = self.size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            let upward = (right + 1) & 2 == 0;
            for vert in 0..self.size {
                let y = if upward { self.size - 1 - vert } else { vert };
                for x in [right, right - 1] {
                    let idx = self.index(x, y);
                    if self.is_function[idx] || i >= total_bits {
                        continue;
                    }
                    self.modules[idx] = (codewords[i >> 3] >> (7 - (i & 7))) & 1 != 0;
                    i += 1;
                }
            }
            right -= 2;
        }
        // Leftover remainder modules stay light.
        debug_assert_eq!(i, total_bits);
    }

    /// XORs `mask` onto every non-function module. Applying the same mask twice undoes it.
    fn apply_mask(&mut self, mask: Mask) {
        for y in 0..self.size {
            for x in 0..self.size {
                let idx = self.index(x, y);
                if !self.is_function[idx] && mask.inverts(x, y) {
                    self.modules[idx] = !self.modules[idx];
                }
            }
        }
    }

    /// Scores each mask against the current, unmasked, data layout. Leaves the modules unmasked.
    fn score_masks(&mut self) -> [i32; 8] {
        let mut scores = [0; 8];
        for mask in Mask::all() {
            self.apply_mask(mask);
            self.draw_format_bits(mask);
            scores[mask.index()] = self.penalty_score();
            self.apply_mask(mask);
        }
        scores
    }

    fn penalty_score(&self) -> i32 {
        let size = self.size;
        let mut result = 0;

        for y in 0..size {
            result += self.line_penalty((0..size).map(|x| self.modules[self.index(x, y)]));
        }
        for x in 0..size {
            result += self.line_penalty((0..size).map(|y| self.modules[self.index(x, y)]));
        }

        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color = self.modules[self.index(x, y)];
                if color == self.modules[self.index(x + 1, y)]
                    && color == self.modules[self.index(x, y + 1)]
                    && color == self.modules[self.index(x + 1, y + 1)]
                {
                    result += PENALTY_N2;
                }
            }
        }

        let dark = self.modules.iter().filter(|&&m| m).count() as i32;
        let total = size * size;
        // Smallest k such that the dark share is within (45 - 5k)% .. (55 + 5k)%.
        let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result + k * PENALTY_N4
    }

    /// Run-length (N1) and finder-like (N3) penalties for one row or column.
    fn line_penalty(&self, line: impl Iterator<Item = bool>) -> i32 {
        let mut result = 0;
        let mut run_color = false;
        let mut run_len = 0;
        let mut history = RunHistory::new(self.size);
        for color in line {
            if color == run_color {
                run_len += 1;
                if run_len == 5 {
                    result += PENALTY_N1;
                } else if run_len > 5 {
                    result += 1;
                }
            } else {
                history.push(run_len);
                if !run_color {
                    result += history.count_finder_like() * PENALTY_N3;
                }
                run_color = color;
                run_len = 1;
            }
        }
        result + history.terminate(run_color, run_len) * PENALTY_N3
    }
}

/// The last seven run lengths of a row or column, newest first.
///
/// The light area beyond the symbol edge is folded into the first and last runs.
struct RunHistory {
    size: i32,
    runs: [i32; 7],
}

impl RunHistory {
    fn new(size: i32) -> Self {
        Self { size, runs: [0; 7] }
    }

    fn push(&mut self, mut run_len: i32) {
        if self.runs[0] == 0 {
            run_len += self.size;
        }
        self.runs.copy_within(0..6, 1);
        self.runs[0] = run_len;
    }

    /// Counts dark:light:dark:light:dark runs of 1:1:3:1:1 with at least four light modules on
    /// one side. Must be called right after a light run has been pushed.
    fn count_finder_like(&self) -> i32 {
        let r = &self.runs;
        let n = r[1];
        let core = n > 0 && r[2] == n && r[3] == n * 3 && r[4] == n && r[5] == n;
        i32::from(core && r[0] >= n * 4 && r[6] >= n) + i32::from(core && r[6] >= n * 4 && r[0] >= n)
    }

    fn terminate(mut self, run_color: bool, mut run_len: i32) -> i32 {
        if run_color {
            self.push(run_len);
            run_len = 0;
        }
        run_len += self.size;
        self.push(run_len);
        self.count_finder_like()
    }
}

/// 15-bit format word: level and mask, BCH(15,5) protected and XOR-masked with 0x5412.
pub fn format_bits(ecl: EcLevel, mask: Mask) -> u32 {
    let data = (ecl.format_bits() << 3) | u32::from(mask.value());
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | rem) ^ 0x5412
}

/// 18-bit version word, BCH(18,6) protected. `None` below version 7.
pub fn version_bits(version: Version) -> Option<u32> {
    let ver = u32::from(version.value());
    if ver < 7 {
        return None;
    }
    let mut rem = ver;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
    }
    Some((ver << 12) | rem)
}

/// Error correction level.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum EcLevel {
    /// Tolerates ~7% erroneous codewords.
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl EcLevel {
    /// Row index into the block tables.
    pub(crate) fn ordinal(self) -> usize {
        match self {
            EcLevel::Low => 0,
            EcLevel::Medium => 1,
            EcLevel::Quartile => 2,
            EcLevel::High => 3,
        }
    }

    /// The two level bits of the format word.
    fn format_bits(self) -> u32 {
        match self {
            EcLevel::Low => 0b01,
            EcLevel::Medium => 0b00,
            EcLevel::Quartile => 0b11,
            EcLevel::High => 0b10,
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            EcLevel::Low => "L",
            EcLevel::Medium => "M",
            EcLevel::Quartile => "Q",
            EcLevel::High => "H",
        };
        f.write_str(letter)
    }
}

impl FromStr for EcLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(EcLevel::Low),
            "M" => Ok(EcLevel::Medium),
            "Q" => Ok(EcLevel::Quartile),
            "H" => Ok(EcLevel::High),
            other => Err(format!("unknown error correction level {other:?}, expected L, M, Q or H")),
        }
    }
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Version(u8);

impl Version {
    pub const MIN: Version = Version(1);
    pub const MAX: Version = Version(40);

    /// # Panics
    ///
    /// Panics if `ver` is outside `1..=40`.
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Side length in modules.
    pub const fn size(self) -> i32 {
        self.0 as i32 * 4 + 17
    }

    /// Modules left for data and EC codewords once every function pattern is placed, remainder
    /// bits included.
    pub fn raw_data_modules(self) -> usize {
        let ver = usize::from(self.0);
        let mut result = (16 * ver + 128) * ver + 64;
        if ver >= 2 {
            let num_align = ver / 7 + 2;
            result -= (25 * num_align - 10) * num_align - 55;
            if ver >= 7 {
                result -= 36;
            }
        }
        result
    }

    /// Centre coordinates of the alignment patterns, ascending, on both axes.
    pub fn alignment_pattern_positions(self) -> Vec<i32> {
        let ver = i32::from(self.0);
        if ver == 1 {
            return Vec::new();
        }
        let num_align = ver / 7 + 2;
        let step = (ver * 8 + num_align * 3 + 5) / (num_align * 4 - 4) * 2;
        let mut positions: Vec<i32> = (0..num_align - 1)
            .map(|i| self.size() - 7 - i * step)
            .collect();
        positions.push(6);
        positions.reverse();
        positions
    }
}

/// A data mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Mask(u8);

impl Mask {
    /// # Panics
    ///
    /// Panics if `mask` is above 7.
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "Mask value out of range");
        Self(mask)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Mask> {
        (0..8).map(Mask)
    }

    fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Whether the module at (x, y) flips under this mask.
    fn inverts(self, x: i32, y: i32) -> bool {
        match self.0 {
            0 => (x + y) % 2 == 0,
            1 => y % 2 == 0,
            2 => x % 3 == 0,
            3 => (x + y) % 3 == 0,
            4 => (x / 3 + y / 2) % 2 == 0,
            5 => x * y % 2 + x * y % 3 == 0,
            6 => (x * y % 2 + x * y % 3) % 2 == 0,
            7 => ((x + y) % 2 + x * y % 3) % 2 == 0,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bits_known_values() {
        assert_eq!(format_bits(EcLevel::Low, Mask::new(0)), 0b111011111000100);
        assert_eq!(format_bits(EcLevel::Medium, Mask::new(0)), 0b101010000010010);
        assert_eq!(format_bits(EcLevel::High, Mask::new(4)), 0b000011101100010);
        assert_eq!(format_bits(EcLevel::Quartile, Mask::new(7)), 0b010101111101101);
    }

    #[test]
    fn test_version_bits_known_values() {
        assert_eq!(version_bits(Version::new(6)), None);
        assert_eq!(version_bits(Version::new(7)), Some(0x07C94));
        assert_eq!(version_bits(Version::new(21)), Some(0x15683));
        assert_eq!(version_bits(Version::new(40)), Some(0x28C69));
    }

    #[test]
    fn test_alignment_positions() {
        assert!(Version::new(1).alignment_pattern_positions().is_empty());
        assert_eq!(Version::new(2).alignment_pattern_positions(), vec![6, 18]);
        assert_eq!(Version::new(7).alignment_pattern_positions(), vec![6, 22, 38]);
        assert_eq!(
            Version::new(32).alignment_pattern_positions(),
            vec![6, 34, 60, 86, 112, 138]
        );
        assert_eq!(
            Version::new(40).alignment_pattern_positions(),
            vec![6, 30, 58, 86, 114, 142, 170]
        );
    }

    #[test]
    fn test_raw_data_modules() {
        assert_eq!(Version::new(1).raw_data_modules(), 208);
        assert_eq!(Version::new(2).raw_data_modules(), 359);
        assert_eq!(Version::new(7).raw_data_modules(), 1568);
        assert_eq!(Version::new(40).raw_data_modules(), 29648);
    }

    #[test]
    fn test_function_modules_cover_everything_but_data() {
        for ver in [1u8, 2, 6, 7, 14, 40] {
            let version = Version::new(ver);
            let data = vec![0u8; ecc::num_data_codewords(version, EcLevel::Low)];
            let qr = QrCode::encode_codewords(version, EcLevel::Low, &data);
            let free = qr.is_function.iter().filter(|&&f| !f).count();
            assert_eq!(free, version.raw_data_modules(), "version {ver}");
        }
    }

    #[test]
    fn test_finder_and_timing_patterns() {
        let qr = QrCode::encode_text("hello", EcLevel::High).unwrap();
        let size = qr.size();
        assert_eq!(size, 21);
        for (cx, cy) in [(3, 3), (size - 4, 3), (3, size - 4)] {
            assert!(qr.get_module(cx, cy));
            assert!(qr.get_module(cx - 3, cy - 3));
            assert!(!qr.get_module(cx - 2, cy));
        }
        for i in 8..size - 8 {
            assert_eq!(qr.get_module(i, 6), i % 2 == 0);
            assert_eq!(qr.get_module(6, i), i % 2 == 0);
        }
        assert!(qr.get_module(8, size - 8));
        assert!(!qr.get_module(-1, 0));
        assert!(!qr.get_module(0, size));
    }

    #[test]
    fn test_format_info_readback() {
        let qr = QrCode::encode_text("https://example.com/doc?id=42", EcLevel::High).unwrap();
        let mut read = 0u32;
        for i in 0..6 {
            read |= u32::from(qr.get_module(8, i)) << i;
        }
        read |= u32::from(qr.get_module(8, 7)) << 6;
        read |= u32::from(qr.get_module(8, 8)) << 7;
        read |= u32::from(qr.get_module(7, 8)) << 8;
        for i in 9..15 {
            read |= u32::from(qr.get_module(14 - i, 8)) << i;
        }
        assert_eq!(read, format_bits(EcLevel::High, qr.mask()));
        assert_eq!(qr.error_correction_level(), EcLevel::High);
    }

    #[test]
    fn test_version_info_readback() {
        let text = format!("https://example.com/{}", "x".repeat(150));
        let qr = QrCode::encode_text(&text, EcLevel::High).unwrap();
        assert_eq!(qr.version().value(), 13);
        let bits = version_bits(qr.version()).unwrap();
        let size = qr.size();
        for i in 0..18 {
            let expected = (bits >> i) & 1 != 0;
            let (a, b) = (size - 11 + i % 3, i / 3);
            assert_eq!(qr.get_module(a, b), expected, "top-right block, bit {i}");
            assert_eq!(qr.get_module(b, a), expected, "bottom-left block, bit {i}");
        }
    }

    #[test]
    fn test_mask_is_first_minimum() {
        for text in ["", "12345", "HELLO WORLD", "https://example.com/doc?id=42"] {
            let qr = QrCode::encode_text(text, EcLevel::High).unwrap();
            let penalties = qr.mask_penalties();
            let chosen = penalties[usize::from(qr.mask().value())];
            assert!(penalties.iter().all(|&p| chosen <= p), "{text:?}: {penalties:?}");
            let first_min = penalties.iter().position(|&p| p == chosen).unwrap();
            assert_eq!(first_min, usize::from(qr.mask().value()));
        }
    }

    #[test]
    fn test_known_mask_choices() {
        let qr = QrCode::encode_text("https://example.com/", EcLevel::High).unwrap();
        assert_eq!((qr.version().value(), qr.mask().value()), (3, 3));
        let qr = QrCode::encode_text("https://example.com/doc?id=42", EcLevel::High).unwrap();
        assert_eq!((qr.version().value(), qr.mask().value()), (4, 1));
    }

    fn version_1_symbol(dark: impl Fn(i32, i32) -> bool) -> QrCode {
        let version = Version::new(1);
        let size = version.size();
        QrCode {
            version,
            size,
            ec_level: EcLevel::Low,
            mask: Mask::new(0),
            modules: (0..size * size).map(|i| dark(i % size, i / size)).collect(),
            is_function: vec![false; (size * size) as usize],
        }
    }

    #[test]
    fn test_penalty_uniform_symbol() {
        // N1: 42 lines of 21 -> 42 * (3 + 16) = 798
        // N2: 20 * 20 blocks * 3 = 1200
        // N4: 0% or 100% dark -> k = 9 -> 90
        assert_eq!(version_1_symbol(|_, _| false).penalty_score(), 2088);
        assert_eq!(version_1_symbol(|_, _| true).penalty_score(), 2088);
    }

    #[test]
    fn test_penalty_checkerboard_is_zero() {
        let qr = version_1_symbol(|x, y| (x + y) % 2 == 0);
        assert_eq!(qr.penalty_score(), 0);
    }

    #[test]
    fn test_line_penalty_runs() {
        let qr = version_1_symbol(|_, _| false);
        let alternating = |n: usize| (0..n).map(|i| i % 2 == 0);

        assert_eq!(qr.line_penalty(alternating(21)), 0);
        // a run of five scores 3, each extra module 1 more
        let run_of_5 = [true; 5].into_iter().chain([false]).chain(alternating(15));
        assert_eq!(qr.line_penalty(run_of_5), 3);
        let run_of_7 = [true; 7].into_iter().chain([false]).chain(alternating(13));
        assert_eq!(qr.line_penalty(run_of_7), 5);
    }

    #[test]
    fn test_line_penalty_finder_like() {
        let qr = version_1_symbol(|_, _| false);
        let finder = [true, false, true, true, true, false, true];

        // light on both sides counts twice; the trailing light run of 14 adds 3 + 9
        let at_edge = finder.into_iter().chain([false; 14]);
        assert_eq!(qr.line_penalty(at_edge), 2 * 40 + 12);

        let inset = [false; 4].into_iter().chain(finder).chain([false; 10]);
        assert_eq!(qr.line_penalty(inset), 2 * 40 + 8);

        // 1:1:3:1:3 is not finder-like
        let broken = [true, true, true, false]
            .into_iter()
            .chain(finder)
            .chain([true, true])
            .chain([false; 8]);
        assert_eq!(qr.line_penalty(broken), 6);
    }

    #[test]
    fn test_deterministic() {
        let text = "https://example.com/a/rather/long/path?with=query&and=more#fragment";
        let a = QrCode::encode_text(text, EcLevel::High).unwrap();
        let b = QrCode::encode_text(text, EcLevel::High).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.mask(), b.mask());
    }

    #[test]
    fn test_mask_involution() {
        let mut qr = QrCode::encode_text("involution", EcLevel::Medium).unwrap();
        let before = qr.clone();
        for mask in Mask::all() {
            qr.apply_mask(mask);
            qr.apply_mask(mask);
            assert_eq!(qr, before);
        }
    }

    #[test]
    fn test_ec_level_parse() {
        assert_eq!("h".parse::<EcLevel>(), Ok(EcLevel::High));
        assert_eq!(" Q ".parse::<EcLevel>(), Ok(EcLevel::Quartile));
        assert!("X".parse::<EcLevel>().is_err());
        assert_eq!(EcLevel::Medium.to_string(), "M");
    }
}
