//! Codeword assembly and Reed–Solomon error correction.
//!
//! Takes the segments from [`crate::segment`], picks the smallest version that fits, pads the bit
//! stream out to the version's capacity and interleaves the data and error correction codewords
//! in the order the symbol builder places them.

use tracing::debug;

use crate::error::QrError;
use crate::qrcode::{EcLevel, Version};
use crate::segment::{BitBuffer, Segment};

/// Alternating filler bytes appended after the terminator.
const PAD_BYTES: [u32; 2] = [0xEC, 0x11];

/// Returns the smallest version that holds `segs` at `ecl`, together with its data codewords
/// (segments, terminator, bit padding and pad bytes).
pub fn encode_data(segs: &[Segment], ecl: EcLevel) -> Result<(Version, Vec<u8>), QrError> {
    let mut version = Version::MIN;
    let used_bits = loop {
        let capacity_bits = num_data_codewords(version, ecl) * 8;
        match Segment::total_bits(segs, version) {
            Some(used) if used <= capacity_bits => break used,
            _ if version == Version::MAX => {
                return Err(QrError::CapacityExceeded {
                    used_bits: Segment::payload_bits(segs, version),
                    capacity_bits,
                });
            }
            _ => version = Version::new(version.value() + 1),
        }
    };

    let capacity_bits = num_data_codewords(version, ecl) * 8;
    let mut bb = BitBuffer::new();
    for seg in segs {
        bb.append_bits(seg.mode().indicator(), 4);
        bb.append_bits(seg.num_chars() as u32, seg.mode().char_count_bits(version));
        bb.extend_from(seg.data());
    }
    debug_assert_eq!(bb.len(), used_bits);

    let terminator = (capacity_bits - bb.len()).min(4);
    bb.append_bits(0, terminator as u8);
    let to_byte_boundary = bb.len().wrapping_neg() & 7;
    bb.append_bits(0, to_byte_boundary as u8);
    for &pad in PAD_BYTES.iter().cycle() {
        if bb.len() >= capacity_bits {
            break;
        }
        bb.append_bits(pad, 8);
    }
    debug_assert_eq!(bb.len(), capacity_bits);

    debug!(
        version = version.value(),
        ec_level = %ecl,
        used_bits,
        capacity_bits,
        "selected symbol version"
    );
    Ok((version, bb.to_bytes()))
}

/// Splits `data` into the RS blocks of `version`/`ecl`, appends each block's EC codewords and
/// interleaves everything into the final codeword sequence.
///
/// # Panics
///
/// Panics if `data` is not exactly [`num_data_codewords`] long.
pub fn add_ecc_and_interleave(data: &[u8], version: Version, ecl: EcLevel) -> Vec<u8> {
    assert_eq!(
        data.len(),
        num_data_codewords(version, ecl),
        "data codeword count does not match version and level"
    );
    let num_blocks = num_blocks(version, ecl);
    let block_ecc_len = ecc_codewords_per_block(version, ecl);
    let raw_codewords = version.raw_data_modules() / 8;
    // Short blocks come first; long blocks carry one more data codeword.
    let num_short_blocks = num_blocks - raw_codewords % num_blocks;
    let short_data_len = raw_codewords / num_blocks - block_ecc_len;

    let rs = ReedSolomon::new(block_ecc_len);
    let mut blocks: Vec<(&[u8], Vec<u8>)> = Vec::with_capacity(num_blocks);
    let mut rest = data;
    for i in 0..num_blocks {
        let len = short_data_len + usize::from(i >= num_short_blocks);
        let (block, tail) = rest.split_at(len);
        blocks.push((block, rs.remainder(block)));
        rest = tail;
    }
    debug_assert!(rest.is_empty());

    let mut result = Vec::with_capacity(raw_codewords);
    for i in 0..=short_data_len {
        result.extend(blocks.iter().filter_map(|(block, _)| block.get(i).copied()));
    }
    for i in 0..block_ecc_len {
        result.extend(blocks.iter().map(|(_, ecc)| ecc[i]));
    }
    debug_assert_eq!(result.len(), raw_codewords);
    result
}

/// Number of 8-bit data codewords (EC excluded) in a symbol of `version` at `ecl`.
pub fn num_data_codewords(version: Version, ecl: EcLevel) -> usize {
    version.raw_data_modules() / 8 - ecc_codewords_per_block(version, ecl) * num_blocks(version, ecl)
}

pub fn ecc_codewords_per_block(version: Version, ecl: EcLevel) -> usize {
    usize::from(ECC_CODEWORDS_PER_BLOCK[ecl.ordinal()][usize::from(version.value() - 1)])
}

pub fn num_blocks(version: Version, ecl: EcLevel) -> usize {
    usize::from(NUM_ERROR_CORRECTION_BLOCKS[ecl.ordinal()][usize::from(version.value() - 1)])
}

/// A Reed–Solomon generator of fixed degree over GF(256).
///
/// The generator is the product of `(x - α^i)` for `i` in `0..degree`, with α = 2.
#[derive(Clone, Debug)]
pub struct ReedSolomon {
    /// Coefficients from highest to lowest power, leading 1 omitted.
    divisor: Vec<u8>,
}

impl ReedSolomon {
    /// # Panics
    ///
    /// Panics if `degree` is outside `1..=255`.
    pub fn new(degree: usize) -> Self {
        assert!((1..=255).contains(&degree), "Reed-Solomon degree out of range");
        let mut divisor = vec![0u8; degree];
        divisor[degree - 1] = 1;

        // Multiply in (x - α^i) one root at a time.
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = gf_mul(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = gf_mul(root, 0x02);
        }
        Self { divisor }
    }

    pub fn degree(&self) -> usize {
        self.divisor.len()
    }

    /// The EC codewords for `data`: the remainder of `data(x) * x^degree` divided by the generator.
    pub fn remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.degree()];
        for &b in data {
            let factor = b ^ result[0];
            result.rotate_left(1);
            if let Some(last) = result.last_mut() {
                *last = 0;
            }
            for (r, &d) in result.iter_mut().zip(&self.divisor) {
                *r ^= gf_mul(d, factor);
            }
        }
        result
    }
}

/// Multiplication in GF(2^8) modulo x^8 + x^4 + x^3 + x^2 + 1.
pub fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let sum = usize::from(GF_LOG[usize::from(a)]) + usize::from(GF_LOG[usize::from(b)]);
    GF_EXP[sum % 255]
}

const GF_TABLES: ([u8; 256], [u8; 256]) = build_gf_tables();
static GF_EXP: [u8; 256] = GF_TABLES.0;
static GF_LOG: [u8; 256] = GF_TABLES.1;

const fn build_gf_tables() -> ([u8; 256], [u8; 256]) {
    let mut exp = [0u8; 256];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= 0x11D;
        }
        i += 1;
    }
    exp[255] = exp[0];
    (exp, log)
}

// Indexed by [ec level ordinal][version - 1].
static ECC_CODEWORDS_PER_BLOCK: [[u8; 40]; 4] = [
    [
        7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30,
        30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // L
    [
        10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // M
    [
        13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30,
        30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Q
    [
        17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // H
];

static NUM_ERROR_CORRECTION_BLOCKS: [[u8; 40]; 4] = [
    [
        1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12, 13, 14,
        15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // L
    [
        1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21, 23,
        25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // M
    [
        1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Q
    [
        1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35,
        37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // H
];
