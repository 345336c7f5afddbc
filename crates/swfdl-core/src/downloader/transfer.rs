//! One streamed GET into a `PartFile`.

use std::cell::Cell;
use std::str;
use std::time::Duration;

use crate::fetch::{prepare_easy, RequestHeaders};
use crate::retry::TransferError;
use crate::storage::PartFile;

/// Report progress at most every this many bytes (plus once at the end).
const PROGRESS_STEP: u64 = 64 * 1024;

/// Streams the body of `url` into `part`, calling `on_progress(bytes_done, total)`
/// as data arrives. HTTP statuses >= 400 abort before any body is written.
pub(crate) fn stream_to<F>(
    url: &str,
    headers: &RequestHeaders,
    timeout: Duration,
    part: &mut PartFile,
    mut on_progress: F,
) -> Result<(), TransferError>
where
    F: FnMut(u64, Option<u64>),
{
    let mut easy = prepare_easy(url, headers, timeout)?;
    easy.fail_on_error(true)?;
    // Large files may take longer than `timeout` overall; only a stalled
    // transfer (under 1 byte/s for `timeout`) is treated as timed out.
    easy.timeout(Duration::ZERO)?;
    easy.low_speed_limit(1)?;
    easy.low_speed_time(timeout)?;

    let total: Cell<Option<u64>> = Cell::new(None);
    let mut storage_error: Option<std::io::Error> = None;
    let mut last_reported = 0u64;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(line) = str::from_utf8(data) {
                let line = line.trim();
                if line.starts_with("HTTP/") {
                    total.set(None);
                } else if let Some((name, value)) = line.split_once(':') {
                    if name.trim().eq_ignore_ascii_case("content-length") {
                        total.set(value.trim().parse().ok());
                    }
                }
            }
            true
        })?;
        transfer.write_function(|data| match part.write_chunk(data) {
            Ok(()) => {
                let done = part.written();
                if done - last_reported >= PROGRESS_STEP {
                    last_reported = done;
                    on_progress(done, total.get());
                }
                Ok(data.len())
            }
            Err(e) => {
                storage_error = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };

    if let Some(e) = storage_error {
        return Err(TransferError::Storage(e));
    }
    if let Err(e) = performed {
        if e.is_http_returned_error() {
            let code = easy.response_code()?;
            return Err(TransferError::Http(code));
        }
        return Err(TransferError::Curl(e));
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(TransferError::Http(code));
    }
    on_progress(part.written(), total.get());
    Ok(())
}
