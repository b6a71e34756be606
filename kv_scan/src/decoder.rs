//! Decoding of the two-element scan reply.
//!
//! ```text
//! *2
//! [cursor: string]
//! *N [element]...[element]
//! ```

use crate::reply::ReplyReader;
use crate::{ScanError, ScanResult};

/// Decode one scan reply into `(page, cursor)`.
///
/// A null marker inside the page is recorded as an empty string. Any other
/// element failure aborts the page and the elements read so far are dropped.
pub fn read_scan_reply(rd: &mut ReplyReader) -> ScanResult<(Vec<String>, String)> {
    let n = rd.read_array_len()?;
    if n != 2 {
        return Err(ScanError::Protocol(format!(
            "got {} elements in scan reply, expected 2",
            n
        )));
    }

    let cursor = rd.read_string()?;

    let n = rd.read_array_len()?;
    let mut page = Vec::with_capacity(n);
    for i in 0..n {
        match rd.read_string() {
            Ok(element) => page.push(element),
            Err(ScanError::Nil) => {
                tracing::debug!("Nil element at index {} of scan page, recorded as empty", i);
                page.push(String::new());
            }
            Err(e) => return Err(e),
        }
    }

    Ok((page, cursor))
}
