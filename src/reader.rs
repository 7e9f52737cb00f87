// SPDX-License-Identifier: Apache-2.0

//! Incremental (tail) reading of a single log file.
//!
//! Reads open the file with plain shared read access so an external writer
//! can keep appending; nothing here ever takes an exclusive lock. Only
//! newline-terminated lines are returned: a partially flushed trailing
//! fragment stays in the file for the next pass, which is what lets the
//! caller count consumed lines without ever re-reading bytes.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read the lines of `path` appended after the first `skip` lines.
///
/// Returns only complete lines, in file order, with line endings stripped
/// and invalid UTF-8 replaced lossily. The caller owns committing
/// `skip + returned.len()` back to the file state once the lines have been
/// parsed and appended.
pub fn read_new_lines(path: &Path, skip: u64) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    // Advance past the lines consumed by previous passes
    for _ in 0..skip {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            // Shorter than expected (e.g. truncated in place); nothing new
            return Ok(Vec::new());
        }
    }

    let mut lines = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }

        // An unterminated final line is a partial flush; leave it for the
        // next pass
        if buf.last() != Some(&b'\n') {
            break;
        }

        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }

        lines.push(String::from_utf8_lossy(&buf).into_owned());
    }

    Ok(lines)
}
