//! Arrow IPC stream decoding.

use std::io::Cursor;

use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::StreamReader;
use arrow::record_batch::RecordBatch;

use crate::config::BatchPolicy;
use crate::error::BulkCopyError;

/// Schema plus the batches selected by the [`BatchPolicy`].
#[derive(Debug)]
pub struct Decoded {
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
}

/// Decodes an IPC stream held in `bytes`.
///
/// A stream with a schema but no batches is a decode error. Under
/// [`BatchPolicy::FirstOnly`] only the first batch is kept. The reader has no
/// way to skip a message, so noticing a trailing batch costs one more batch
/// decode; its result is only used for the warning, and a trailing batch that
/// fails to decode is reported as such rather than failing the load.
pub fn decode_stream(bytes: &[u8], policy: BatchPolicy) -> Result<Decoded, BulkCopyError> {
    let mut reader = StreamReader::try_new(Cursor::new(bytes), None)?;
    let schema = reader.schema();

    let first = reader
        .next()
        .transpose()?
        .ok_or_else(|| BulkCopyError::decode("stream contains no record batches"))?;

    let batches = match policy {
        BatchPolicy::FirstOnly => {
            if let Some(trailing) = reader.next() {
                bulkcopy_log!(
                    log::Level::Warn,
                    "decode_trailing_batches_ignored",
                    "rows_loaded={} trailing_decodable={} policy=first_only",
                    first.num_rows(),
                    trailing.is_ok()
                );
            }
            vec![first]
        }
        BatchPolicy::All => {
            let mut batches = vec![first];
            for batch in reader.by_ref() {
                batches.push(batch?);
            }
            batches
        }
        BatchPolicy::RejectMultiple => {
            if reader.next().is_some() {
                return Err(BulkCopyError::decode(
                    "stream contains more than one record batch",
                ));
            }
            vec![first]
        }
    };

    Ok(Decoded { schema, batches })
}
