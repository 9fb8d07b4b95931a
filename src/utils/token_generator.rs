//! Deterministic short tokens derived from numeric link ids.
//!
//! Implements the hashids scheme: a salted consistent shuffle of the
//! alphabet, a lottery character, guard characters and alphabet padding up
//! to a minimum length. Encoding is injective and reversible, so no
//! uniqueness retry is ever needed. Tokens are not secret: anyone knowing the
//! salt can compute them.

/// 36-character lowercase alphanumeric alphabet.
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz1234567890";
pub const DEFAULT_MIN_LENGTH: usize = 6;

const DEFAULT_SEPARATORS: &str = "cfhistuCFHISTU";
const MIN_ALPHABET_LENGTH: usize = 16;
const SEP_DIV: f64 = 3.5;
const GUARD_DIV: f64 = 12.0;

/// Invalid token generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenConfigError {
    #[error("token alphabet must contain only ASCII characters")]
    NonAsciiAlphabet,

    #[error("token alphabet must not contain whitespace")]
    WhitespaceInAlphabet,

    #[error("token alphabet needs at least {min} unique characters, got {0}", min = MIN_ALPHABET_LENGTH)]
    AlphabetTooShort(usize),
}

/// Encodes ids into tokens and back.
///
/// Construction validates the configuration once; encoding never fails.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    salt: Vec<u8>,
    min_length: usize,
    alphabet: Vec<u8>,
    separators: Vec<u8>,
    guards: Vec<u8>,
}

impl TokenGenerator {
    /// Creates a generator for the given salt, minimum length and alphabet.
    ///
    /// # Errors
    ///
    /// Returns [`TokenConfigError`] if the alphabet is not ASCII, contains
    /// whitespace, or has fewer than 16 unique characters.
    pub fn new(salt: &str, min_length: usize, alphabet: &str) -> Result<Self, TokenConfigError> {
        if !alphabet.is_ascii() {
            return Err(TokenConfigError::NonAsciiAlphabet);
        }
        if alphabet.bytes().any(|b| b.is_ascii_whitespace()) {
            return Err(TokenConfigError::WhitespaceInAlphabet);
        }

        let mut unique: Vec<u8> = Vec::with_capacity(alphabet.len());
        for b in alphabet.bytes() {
            if !unique.contains(&b) {
                unique.push(b);
            }
        }
        if unique.len() < MIN_ALPHABET_LENGTH {
            return Err(TokenConfigError::AlphabetTooShort(unique.len()));
        }

        let salt = salt.as_bytes().to_vec();

        let mut separators: Vec<u8> = DEFAULT_SEPARATORS
            .bytes()
            .filter(|b| unique.contains(b))
            .collect();
        let mut alphabet: Vec<u8> = unique
            .into_iter()
            .filter(|b| !separators.contains(b))
            .collect();
        consistent_shuffle(&mut separators, &salt);

        if separators.is_empty() || alphabet.len() as f64 / separators.len() as f64 > SEP_DIV {
            let target = ((alphabet.len() as f64 / SEP_DIV).ceil() as usize).max(2);
            if target > separators.len() {
                let missing = target - separators.len();
                separators.extend(alphabet.drain(..missing));
            } else {
                separators.truncate(target);
            }
        }

        consistent_shuffle(&mut alphabet, &salt);

        let guard_count = (alphabet.len() as f64 / GUARD_DIV).ceil() as usize;
        let guards: Vec<u8> = if alphabet.len() < 3 {
            separators.drain(..guard_count).collect()
        } else {
            alphabet.drain(..guard_count).collect()
        };

        Ok(Self {
            salt,
            min_length,
            alphabet,
            separators,
            guards,
        })
    }

    /// Creates a generator over [`DEFAULT_ALPHABET`].
    ///
    /// # Errors
    ///
    /// Never fails for the default alphabet; the signature mirrors [`Self::new`].
    pub fn with_default_alphabet(salt: &str, min_length: usize) -> Result<Self, TokenConfigError> {
        Self::new(salt, min_length, DEFAULT_ALPHABET)
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Derives the token for `id`. Same input, same output.
    pub fn encode(&self, id: u64) -> String {
        let numbers_hash = (id % 100) as usize;
        let lottery = self.alphabet[numbers_hash % self.alphabet.len()];
        let mut alphabet = self.alphabet_for(lottery);

        let mut token = vec![lottery];
        token.extend(to_alphabet(id, &alphabet));

        if token.len() < self.min_length {
            let guard = self.guards[(numbers_hash + usize::from(token[0])) % self.guards.len()];
            token.insert(0, guard);

            if token.len() < self.min_length {
                let guard =
                    self.guards[(numbers_hash + usize::from(token[2])) % self.guards.len()];
                token.push(guard);
            }
        }

        let half = alphabet.len() / 2;
        while token.len() < self.min_length {
            let key = alphabet.clone();
            consistent_shuffle(&mut alphabet, &key);

            let mut padded = Vec::with_capacity(token.len() + alphabet.len());
            padded.extend_from_slice(&alphabet[half..]);
            padded.extend_from_slice(&token);
            padded.extend_from_slice(&alphabet[..half]);
            token = padded;

            let excess = token.len().saturating_sub(self.min_length);
            if excess > 0 {
                let start = excess / 2;
                token = token[start..start + self.min_length].to_vec();
            }
        }

        token.into_iter().map(char::from).collect()
    }

    /// Recovers the id a token was derived from.
    ///
    /// Returns `None` for anything [`Self::encode`] would not have produced.
    pub fn decode(&self, token: &str) -> Option<u64> {
        if token.is_empty() || !token.is_ascii() {
            return None;
        }

        let parts: Vec<&[u8]> = token
            .as_bytes()
            .split(|b| self.guards.contains(b))
            .collect();
        let core = match parts.len() {
            2 | 3 => parts[1],
            _ => parts[0],
        };

        let (&lottery, hash) = core.split_first()?;
        if hash.is_empty() || hash.iter().any(|b| self.separators.contains(b)) {
            return None;
        }

        let alphabet = self.alphabet_for(lottery);
        let id = from_alphabet(hash, &alphabet)?;

        (self.encode(id) == token).then_some(id)
    }

    /// Alphabet shuffled by `lottery + salt + alphabet`, cut to alphabet length.
    fn alphabet_for(&self, lottery: u8) -> Vec<u8> {
        let mut alphabet = self.alphabet.clone();

        let mut key = Vec::with_capacity(1 + self.salt.len() + alphabet.len());
        key.push(lottery);
        key.extend_from_slice(&self.salt);
        key.extend_from_slice(&alphabet);
        key.truncate(alphabet.len());

        consistent_shuffle(&mut alphabet, &key);
        alphabet
    }
}

fn consistent_shuffle(alphabet: &mut [u8], salt: &[u8]) {
    if salt.is_empty() {
        return;
    }

    let mut v = 0;
    let mut p = 0usize;
    for i in (1..alphabet.len()).rev() {
        v %= salt.len();
        let integer = usize::from(salt[v]);
        p += integer;
        let j = (integer + v + p) % i;
        alphabet.swap(i, j);
        v += 1;
    }
}

fn to_alphabet(mut input: u64, alphabet: &[u8]) -> Vec<u8> {
    let base = alphabet.len() as u64;
    let mut out = Vec::new();
    loop {
        out.push(alphabet[(input % base) as usize]);
        input /= base;
        if input == 0 {
            break;
        }
    }
    out.reverse();
    out
}

fn from_alphabet(input: &[u8], alphabet: &[u8]) -> Option<u64> {
    let base = alphabet.len() as u64;
    input.iter().try_fold(0u64, |acc, c| {
        let digit = alphabet.iter().position(|a| a == c)? as u64;
        acc.checked_mul(base)?.checked_add(digit)
    })
}
