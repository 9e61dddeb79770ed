//! Per-file password generation
//!
//! Every registered file gets its own generated password; the session
//! passphrase only ever protects the manifest. Generated passwords have a
//! fixed composition so that a leaked one says nothing about the others:
//! 20 characters, exactly 4 digits, exactly 5 symbols, at least one
//! uppercase letter, and no character appears twice.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;

/// Total password length in characters.
pub const PASSWORD_LEN: usize = 20;

/// Exact number of digit characters per password.
const DIGIT_COUNT: usize = 4;

/// Exact number of symbol characters per password.
const SYMBOL_COUNT: usize = 5;

const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"~!@#$%^&*()_|[]<>?,./";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Generate a fresh password.
///
/// Characters within each class are drawn without replacement, and one
/// uppercase letter is reserved up front, so the composition constraints
/// hold by construction. The assembled password is shuffled so class
/// positions are not predictable.
pub fn generate() -> String {
    let mut rng = OsRng;

    let mut chars: Vec<u8> = Vec::with_capacity(PASSWORD_LEN);

    chars.extend(DIGITS.choose_multiple(&mut rng, DIGIT_COUNT));
    chars.extend(SYMBOLS.choose_multiple(&mut rng, SYMBOL_COUNT));

    let reserved_upper = *UPPERCASE.choose(&mut rng).unwrap_or(&b'A');
    chars.push(reserved_upper);

    // Fill the rest from the remaining letters, excluding the reserved
    // uppercase so no character repeats.
    let mut letters: Vec<u8> = UPPERCASE
        .iter()
        .chain(LOWERCASE.iter())
        .copied()
        .filter(|&c| c != reserved_upper)
        .collect();
    letters.shuffle(&mut rng);
    chars.extend(letters.into_iter().take(PASSWORD_LEN - chars.len()));

    chars.shuffle(&mut rng);

    // Every source byte is printable ASCII.
    String::from_utf8_lossy(&chars).into_owned()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_length() {
        assert_eq!(generate().len(), PASSWORD_LEN);
    }

    #[test]
    fn test_exact_digit_count() {
        for _ in 0..50 {
            let pw = generate();
            let digits = pw.bytes().filter(|b| b.is_ascii_digit()).count();
            assert_eq!(digits, DIGIT_COUNT, "password {pw:?}");
        }
    }

    #[test]
    fn test_exact_symbol_count() {
        for _ in 0..50 {
            let pw = generate();
            let symbols = pw.bytes().filter(|b| SYMBOLS.contains(b)).count();
            assert_eq!(symbols, SYMBOL_COUNT, "password {pw:?}");
        }
    }

    #[test]
    fn test_at_least_one_uppercase() {
        for _ in 0..50 {
            let pw = generate();
            assert!(
                pw.bytes().any(|b| b.is_ascii_uppercase()),
                "password {pw:?}"
            );
        }
    }

    #[test]
    fn test_no_repeated_characters() {
        for _ in 0..50 {
            let pw = generate();
            let unique: HashSet<u8> = pw.bytes().collect();
            assert_eq!(unique.len(), PASSWORD_LEN, "password {pw:?}");
        }
    }

    #[test]
    fn test_only_known_character_classes() {
        let pw = generate();
        for b in pw.bytes() {
            assert!(
                b.is_ascii_digit()
                    || b.is_ascii_alphabetic()
                    || SYMBOLS.contains(&b),
                "unexpected byte {b:#x} in {pw:?}"
            );
        }
    }

    #[test]
    fn test_successive_passwords_differ() {
        assert_ne!(generate(), generate());
    }
}
