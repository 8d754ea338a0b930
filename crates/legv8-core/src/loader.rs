//! Program image loading.
//!
//! Images are text files with one hexadecimal instruction word per line.
//! A `0x` prefix is optional; blank lines and `#` or `//` comments are
//! ignored, including trailing comments after a word.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::decoder::INSTRUCTION_BYTES;
use crate::memory::{RegionMemory, REGION_BYTES};
use crate::MemoryBus;

/// Maximum number of words that fit in the text region.
#[allow(clippy::cast_possible_truncation)]
pub const MAX_PROGRAM_WORDS: usize = (REGION_BYTES / INSTRUCTION_BYTES) as usize;

/// Failure while reading or parsing a program image.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A line did not contain a valid 32-bit hexadecimal word.
    #[error("line {line}: invalid instruction word `{text}`")]
    InvalidWord {
        /// 1-based line number.
        line: usize,
        /// Offending text after comment stripping.
        text: String,
    },
    /// The image has more words than the text region holds.
    #[error(
        "program has {words} words but the text region holds at most {max}",
        max = MAX_PROGRAM_WORDS
    )]
    ImageTooLarge {
        /// Number of words in the image.
        words: usize,
    },
}

/// Parses a program image into instruction words.
///
/// # Errors
///
/// Returns [`LoadError::InvalidWord`] for the first malformed line and
/// [`LoadError::ImageTooLarge`] when the image exceeds the text region.
pub fn parse_program(text: &str) -> Result<Vec<u32>, LoadError> {
    let mut words = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let invalid = || LoadError::InvalidWord {
            line: index + 1,
            text: line.to_string(),
        };
        let digits = line
            .strip_prefix("0x")
            .or_else(|| line.strip_prefix("0X"))
            .unwrap_or(line)
            .replace('_', "");
        if !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let word = u32::from_str_radix(&digits, 16).map_err(|_| invalid())?;
        words.push(word);
    }

    if words.len() > MAX_PROGRAM_WORDS {
        return Err(LoadError::ImageTooLarge { words: words.len() });
    }

    Ok(words)
}

/// Reads and parses a program image from disk.
///
/// # Errors
///
/// Returns [`LoadError::Io`] when the file cannot be read, or any error from
/// [`parse_program`].
pub fn load_program_file(path: &Path) -> Result<Vec<u32>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_program(&text)
}

/// Writes `words` consecutively starting at `base`.
pub fn load_program(memory: &mut RegionMemory, words: &[u32], base: u64) {
    let mut addr = base;
    for word in words {
        memory.write_word(addr, *word);
        addr = addr.wrapping_add(INSTRUCTION_BYTES);
    }
    tracing::debug!(base, words = words.len(), "program loaded");
}

fn strip_comment(line: &str) -> &str {
    let end = [line.find('#'), line.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}
