//! CSV output: one row per record
//!
//! Scalar fields map to their own columns. Nested values (tax regime,
//! financials, people, websites, activities, procurement) are embedded as
//! compact JSON so no information is lost. Phones and emails are joined with
//! `"; "`.

use crate::output::traits::{OutputResult, RecordWriter};
use crate::record::HarvestedRecord;
use serde::Serialize;
use std::io::Write;

const COLUMNS: [&str; 22] = [
    "identifier",
    "registration_number",
    "tax_id",
    "tax_registration_code",
    "statistics_code",
    "address",
    "short_name",
    "full_name",
    "status",
    "status_class",
    "legal_form",
    "ownership_form",
    "tax_regime",
    "financials",
    "leadership",
    "founders",
    "sanctions",
    "phones",
    "emails",
    "websites",
    "activities",
    "procurement",
];

const LIST_SEPARATOR: &str = "; ";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvWriter;

impl RecordWriter for CsvWriter {
    fn write_records(&self, records: &[HarvestedRecord], out: &mut dyn Write) -> OutputResult<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(COLUMNS)?;
        for record in records {
            writer.write_record(row(record)?)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn row(harvested: &HarvestedRecord) -> OutputResult<Vec<String>> {
    let r = &harvested.record;
    let scalar = |v: &Option<String>| v.clone().unwrap_or_default();

    Ok(vec![
        harvested.identifier.clone(),
        scalar(&r.registration_number),
        scalar(&r.tax_id),
        scalar(&r.tax_registration_code),
        scalar(&r.statistics_code),
        scalar(&r.address),
        scalar(&r.short_name),
        scalar(&r.full_name),
        r.status.as_ref().map(|s| s.text.clone()).unwrap_or_default(),
        r.status_class().as_str().to_string(),
        scalar(&r.legal_form),
        scalar(&r.ownership_form),
        embedded(&r.tax_regime)?,
        embedded(&r.financials)?,
        embedded(&r.leadership)?,
        embedded(&r.founders)?,
        scalar(&r.sanctions),
        r.contacts.phones.join(LIST_SEPARATOR),
        r.contacts.emails.join(LIST_SEPARATOR),
        embedded(&r.contacts.websites)?,
        embedded(&r.activities)?,
        embedded(&r.procurement)?,
    ])
}

/// Compact JSON for a nested value, empty for `None`
fn embedded<T: Serialize>(value: &T) -> OutputResult<String> {
    let json = serde_json::to_string(value)?;
    Ok(if json == "null" { String::new() } else { json })
}
