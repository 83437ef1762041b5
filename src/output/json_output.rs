//! JSON output: a pretty-printed array of records

use crate::output::traits::{OutputResult, RecordWriter};
use crate::record::HarvestedRecord;
use std::io::Write;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWriter;

impl RecordWriter for JsonWriter {
    fn write_records(&self, records: &[HarvestedRecord], out: &mut dyn Write) -> OutputResult<()> {
        serde_json::to_writer_pretty(&mut *out, records)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}
