//! Canonical binary encoding of gridded permutations and tilings.
//!
//! The wire form is a flat array of unsigned 16-bit words, serialized
//! little-endian. A gridded permutation is its pattern's graded rank (or an
//! index into a caller-supplied pattern table) followed by its cells
//! flattened `col, row, col, row, ...`; a tiling is the obstruction count,
//! the obstructions, the requirement-list count, and each list preceded by
//! its length. Because tilings are canonical after construction, the
//! encoding doubles as a deduplication key.
//!
//! # Invariants
//! - `decompress(compress(x)) == x` for every valid `x`, with or without a
//!   pattern table (the same table on both sides).
//! - Corrupt or truncated buffers fail with a [`CodecError`]; no input
//!   causes an out-of-bounds read.

use crate::griddedperm::{GriddedPerm, RequirementList};
use crate::perm::{Perm, PermError};
use crate::tiling::Tiling;
use std::collections::BTreeMap;
use std::fmt;

/// Error raised while encoding or decoding the binary form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ended before the structure it promised.
    Truncated,
    /// The buffer holds words past the end of the encoded tiling.
    TrailingData { words: usize },
    /// The byte buffer is not a whole number of 16-bit words.
    OddByteLength { bytes: usize },
    /// A pattern rank does not fit in a 16-bit word; supply a pattern
    /// table to encode longer patterns.
    RankOverflow { rank: u64 },
    /// A cell coordinate does not fit in a 16-bit word.
    CoordinateOverflow { value: usize },
    /// A count field does not fit in a 16-bit word.
    CountOverflow { count: usize },
    /// The pattern is not present in the supplied table.
    PatternNotInTable(Perm),
    /// The buffer references a table entry that does not exist.
    UnknownTableIndex { index: u16 },
    /// A rank in the buffer decodes to no pattern.
    BadRank(PermError),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Truncated => write!(f, "buffer ended mid-structure"),
            CodecError::TrailingData { words } => {
                write!(f, "{} unread words after the encoded tiling", words)
            }
            CodecError::OddByteLength { bytes } => {
                write!(f, "buffer of {} bytes is not a whole number of words", bytes)
            }
            CodecError::RankOverflow { rank } => {
                write!(f, "pattern rank {} does not fit in 16 bits", rank)
            }
            CodecError::CoordinateOverflow { value } => {
                write!(f, "cell coordinate {} does not fit in 16 bits", value)
            }
            CodecError::CountOverflow { count } => {
                write!(f, "count {} does not fit in 16 bits", count)
            }
            CodecError::PatternNotInTable(patt) => {
                write!(f, "pattern {} is not in the pattern table", patt)
            }
            CodecError::UnknownTableIndex { index } => {
                write!(f, "pattern table has no entry {}", index)
            }
            CodecError::BadRank(err) => write!(f, "undecodable pattern rank: {}", err),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::BadRank(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PermError> for CodecError {
    fn from(err: PermError) -> CodecError {
        CodecError::BadRank(err)
    }
}

/// A shared pattern dictionary substituting table indices for explicit
/// ranks, for deduplication across many tilings.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: Vec<Perm>,
    index: BTreeMap<Perm, u16>,
}

impl PatternTable {
    /// Builds a table from the given patterns; duplicates collapse to their
    /// first index.
    pub fn new(patterns: Vec<Perm>) -> Result<PatternTable, CodecError> {
        if patterns.len() > usize::from(u16::MAX) + 1 {
            return Err(CodecError::CountOverflow {
                count: patterns.len(),
            });
        }
        let mut index = BTreeMap::new();
        for (i, patt) in patterns.iter().enumerate() {
            index.entry(patt.clone()).or_insert(i as u16);
        }
        Ok(PatternTable { patterns, index })
    }

    pub fn get(&self, index: u16) -> Option<&Perm> {
        self.patterns.get(usize::from(index))
    }

    pub fn index_of(&self, patt: &Perm) -> Option<u16> {
        self.index.get(patt).copied()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

struct Reader<'a> {
    words: &'a [u16],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn next(&mut self) -> Result<u16, CodecError> {
        let word = *self.words.get(self.pos).ok_or(CodecError::Truncated)?;
        self.pos += 1;
        Ok(word)
    }

    fn remaining(&self) -> usize {
        self.words.len() - self.pos
    }
}

fn word_of(value: usize, err: fn(usize) -> CodecError) -> Result<u16, CodecError> {
    u16::try_from(value).map_err(|_| err(value))
}

impl GriddedPerm {
    /// Appends the word encoding of this gridded permutation to `out`.
    pub fn compress_into(
        &self,
        out: &mut Vec<u16>,
        table: Option<&PatternTable>,
    ) -> Result<(), CodecError> {
        let head = match table {
            Some(table) => table
                .index_of(self.patt())
                .ok_or_else(|| CodecError::PatternNotInTable(self.patt().clone()))?,
            None => {
                let rank = self.patt().rank();
                u16::try_from(rank).map_err(|_| CodecError::RankOverflow { rank })?
            }
        };
        out.push(head);
        for &(col, row) in self.pos() {
            out.push(word_of(col, |value| CodecError::CoordinateOverflow { value })?);
            out.push(word_of(row, |value| CodecError::CoordinateOverflow { value })?);
        }
        Ok(())
    }

    /// The word encoding of this gridded permutation alone.
    pub fn compress(&self, table: Option<&PatternTable>) -> Result<Vec<u16>, CodecError> {
        let mut out = Vec::with_capacity(1 + 2 * self.len());
        self.compress_into(&mut out, table)?;
        Ok(out)
    }

    fn read_from(reader: &mut Reader<'_>, table: Option<&PatternTable>) -> Result<Self, CodecError> {
        let head = reader.next()?;
        let patt = match table {
            Some(table) => table
                .get(head)
                .cloned()
                .ok_or(CodecError::UnknownTableIndex { index: head })?,
            None => Perm::unrank(u64::from(head))?,
        };
        let mut pos = Vec::with_capacity(patt.len());
        for _ in 0..patt.len() {
            let col = usize::from(reader.next()?);
            let row = usize::from(reader.next()?);
            pos.push((col, row));
        }
        Ok(GriddedPerm::assemble(patt, pos))
    }

    /// Decodes one gridded permutation from a word buffer, which must hold
    /// exactly that encoding.
    pub fn decompress(words: &[u16], table: Option<&PatternTable>) -> Result<Self, CodecError> {
        let mut reader = Reader { words, pos: 0 };
        let gp = GriddedPerm::read_from(&mut reader, table)?;
        if reader.remaining() > 0 {
            return Err(CodecError::TrailingData {
                words: reader.remaining(),
            });
        }
        Ok(gp)
    }
}

impl Tiling {
    /// Encodes the tiling to its canonical little-endian byte form.
    pub fn compress(&self, table: Option<&PatternTable>) -> Result<Vec<u8>, CodecError> {
        let mut words = Vec::new();
        words.push(word_of(self.obstructions().len(), |count| {
            CodecError::CountOverflow { count }
        })?);
        for ob in self.obstructions() {
            ob.compress_into(&mut words, table)?;
        }
        words.push(word_of(self.requirements().len(), |count| {
            CodecError::CountOverflow { count }
        })?);
        for list in self.requirements() {
            words.push(word_of(list.len(), |count| CodecError::CountOverflow {
                count,
            })?);
            for req in list {
                req.compress_into(&mut words, table)?;
            }
        }
        let mut bytes = Vec::with_capacity(words.len() * 2);
        for word in words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        Ok(bytes)
    }

    /// Decodes a tiling from its canonical byte form, rebuilding canonical
    /// structure through the constructor.
    pub fn decompress(bytes: &[u8], table: Option<&PatternTable>) -> Result<Tiling, CodecError> {
        if bytes.len() % 2 != 0 {
            return Err(CodecError::OddByteLength { bytes: bytes.len() });
        }
        let words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let mut reader = Reader {
            words: &words,
            pos: 0,
        };

        let n_obs = usize::from(reader.next()?);
        let mut obstructions = Vec::with_capacity(n_obs);
        for _ in 0..n_obs {
            obstructions.push(GriddedPerm::read_from(&mut reader, table)?);
        }
        let n_lists = usize::from(reader.next()?);
        let mut requirements: Vec<RequirementList> = Vec::with_capacity(n_lists);
        for _ in 0..n_lists {
            let len = usize::from(reader.next()?);
            let mut list = Vec::with_capacity(len);
            for _ in 0..len {
                list.push(GriddedPerm::read_from(&mut reader, table)?);
            }
            requirements.push(list);
        }
        if reader.remaining() > 0 {
            return Err(CodecError::TrailingData {
                words: reader.remaining(),
            });
        }
        Ok(Tiling::new(obstructions, requirements))
    }
}
