// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Short-name generator.
//!
//! Names are drawn in bijective base-n over an alphabet of ASCII letters
//! permuted once from a seed: every one-letter name first, then every
//! two-letter name, and so on. The same seed always yields the same sequence.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use estrim_core::lexical::is_reserved;

const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Deterministic sequence of short binding names.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    alphabet: Vec<char>,
    iteration: usize,
}

impl NameGenerator {
    /// A generator whose alphabet is permuted by `seed`.
    pub fn new(seed: u64) -> Self {
        let mut alphabet: Vec<char> = LETTERS.chars().collect();
        let mut rng = StdRng::seed_from_u64(seed);
        alphabet.shuffle(&mut rng);
        NameGenerator {
            alphabet,
            iteration: 0,
        }
    }

    /// The next symbol of the raw sequence, reserved words included.
    pub fn next_symbol(&mut self) -> String {
        let symbol = encode(self.iteration, &self.alphabet);
        self.iteration += 1;
        symbol
    }

    /// The next symbol that is not reserved and for which `taken` is false.
    pub fn next_available(&mut self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let symbol = self.next_symbol();
            if !is_reserved(&symbol) && !taken(&symbol) {
                return symbol;
            }
        }
    }
}

/// Bijective base-n: 0 is the first letter, n is the first two-letter name.
fn encode(mut iteration: usize, alphabet: &[char]) -> String {
    let radix = alphabet.len();
    let mut digits = vec![alphabet[iteration % radix]];
    iteration /= radix;
    while iteration > 0 {
        iteration -= 1;
        digits.push(alphabet[iteration % radix]);
        iteration /= radix;
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = NameGenerator::new(7);
        let mut b = NameGenerator::new(7);
        for _ in 0..200 {
            assert_eq!(a.next_symbol(), b.next_symbol());
        }
    }

    #[test]
    fn different_seeds_permute_differently() {
        let first: Vec<String> = {
            let mut generator = NameGenerator::new(1);
            (0..52).map(|_| generator.next_symbol()).collect()
        };
        let second: Vec<String> = {
            let mut generator = NameGenerator::new(2);
            (0..52).map(|_| generator.next_symbol()).collect()
        };
        assert_ne!(first, second);
    }

    #[test]
    fn one_letter_names_come_first() {
        let mut generator = NameGenerator::new(0);
        let singles: HashSet<String> = (0..52).map(|_| generator.next_symbol()).collect();
        assert_eq!(singles.len(), 52);
        assert!(singles.iter().all(|name| name.len() == 1));
        assert_eq!(generator.next_symbol().len(), 2);
    }

    #[test]
    fn sequence_is_injective_across_lengths() {
        let mut generator = NameGenerator::new(3);
        let total = 52 + 52 * 52 + 10;
        let names: HashSet<String> = (0..total).map(|_| generator.next_symbol()).collect();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn bijective_encoding() {
        let alphabet = ['a', 'b'];
        let names: Vec<String> = (0..7).map(|i| encode(i, &alphabet)).collect();
        assert_eq!(names, ["a", "b", "aa", "ab", "ba", "bb", "aaa"]);
    }

    #[test]
    fn skips_reserved_and_taken() {
        let mut generator = NameGenerator::new(0);
        let mut seen = HashSet::new();
        for _ in 0..52 * 52 {
            let name = generator.next_available(|candidate| candidate.starts_with('a'));
            assert!(!is_reserved(&name));
            assert!(!name.starts_with('a'));
            assert!(seen.insert(name));
        }
    }
}
