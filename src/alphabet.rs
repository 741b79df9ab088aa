//! Ordered symbol table backing the radix codec.
//!
//! An [`Alphabet`] is built once from a string of unique locator-safe
//! characters and is read-only afterwards. Digit values are the symbol's
//! position in the source string; the highest digit value doubles as the
//! reserved marker for the small-data wire layout.

use std::collections::HashMap;

use crate::error::AlphabetError;

/// Minimum number of symbols in a usable alphabet.
pub const MIN_RADIX: usize = 10;
/// Maximum number of symbols in a usable alphabet.
pub const MAX_RADIX: usize = 200;

/// Immutable ordered set of N unique symbols with both lookup directions.
#[derive(Debug, Clone)]
pub struct Alphabet {
    symbols: Vec<char>,
    index: HashMap<char, u32>,
}

impl Alphabet {
    /// Validate and build an alphabet from its symbol string.
    pub fn new(symbols: &str) -> Result<Self, AlphabetError> {
        let chars: Vec<char> = symbols.chars().collect();
        if chars.len() < MIN_RADIX || chars.len() > MAX_RADIX {
            return Err(AlphabetError::BadSize {
                min: MIN_RADIX,
                max: MAX_RADIX,
                got: chars.len(),
            });
        }
        let mut index = HashMap::with_capacity(chars.len());
        for (i, &c) in chars.iter().enumerate() {
            if c.is_control() || c.is_whitespace() {
                return Err(AlphabetError::UnsafeSymbol(c));
            }
            if index.insert(c, i as u32).is_some() {
                return Err(AlphabetError::DuplicateSymbol(c));
            }
        }
        Ok(Self { symbols: chars, index })
    }

    /// Number of symbols, i.e. the radix N.
    pub fn radix(&self) -> usize {
        self.symbols.len()
    }

    /// Symbol for a digit value. Digits are produced internally and are
    /// always below the radix.
    pub fn symbol(&self, digit: u32) -> char {
        self.symbols[digit as usize]
    }

    /// Digit value for a symbol, or `None` for foreign characters.
    pub fn digit(&self, c: char) -> Option<u32> {
        self.index.get(&c).copied()
    }

    /// Reserved digit introducing the small-data layout.
    pub fn marker_digit(&self) -> u32 {
        (self.symbols.len() - 1) as u32
    }

    /// Bits of information carried by one symbol.
    pub fn bits_per_symbol(&self) -> f64 {
        (self.symbols.len() as f64).log2()
    }
}
