//! Detail extractor: profile page markup to [`CompanyRecord`]
//!
//! The page is read section by section. Each section is a pure function from
//! the parsed document to `Result<Field, ExtractionFailure>`; a failed section
//! falls back to its default value and is logged, and never affects its
//! siblings. Extraction as a whole cannot fail.
//!
//! Sections and the markup they key on:
//! - identity: copy-target anchors (`#copy-inn`, `#copy-ogrn`, ...) and headings
//! - status: success / danger / special-status styled blocks, in that order
//! - attributes: label-keyed blocks (legal form, ownership form, tax regime)
//! - financials: the statement period header and its sibling line items
//! - people: officer block, managing organization block, founders block
//! - contacts: `tel:` / `mailto:` anchors and the websites list
//! - activities: the last striped table on the page
//! - procurement: the public procurement section

mod contacts;
mod dom;
mod financials;
mod identity;
mod people;
mod procurement;

use crate::record::CompanyRecord;
use scraper::Html;
use thiserror::Error;

/// Why a single section could not be extracted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("section not found: {0}")]
    Missing(&'static str),

    #[error("malformed {what}: {detail}")]
    Malformed { what: &'static str, detail: String },

    #[error("invalid selector: {0}")]
    Selector(&'static str),
}

/// A contained failure, kept for inspection by callers and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFailure {
    pub section: &'static str,
    pub failure: ExtractionFailure,
}

/// Collects section failures while the record is assembled
#[derive(Debug, Default)]
struct SectionReport {
    failures: Vec<SectionFailure>,
}

impl SectionReport {
    /// Unwraps a section result, recording and logging a failure
    fn take<T>(&mut self, section: &'static str, result: Result<T, ExtractionFailure>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(failure) => {
                match &failure {
                    ExtractionFailure::Missing(_) => {
                        tracing::debug!("Section '{}' absent: {}", section, failure)
                    }
                    _ => tracing::warn!("Section '{}' skipped: {}", section, failure),
                }
                self.failures.push(SectionFailure { section, failure });
                None
            }
        }
    }

    fn or_default<T: Default>(
        &mut self,
        section: &'static str,
        result: Result<T, ExtractionFailure>,
    ) -> T {
        self.take(section, result).unwrap_or_default()
    }
}

/// Extracts a company record from a profile page
///
/// # Example
///
/// ```
/// use registry_harvest::extract;
///
/// let record = extract(r#"<h1 class="mb-2">ООО Пример</h1>"#);
/// assert_eq!(record.short_name.as_deref(), Some("ООО Пример"));
/// ```
pub fn extract(markup: &str) -> CompanyRecord {
    extract_with_report(markup).0
}

/// Extracts a company record and returns the contained section failures
pub fn extract_with_report(markup: &str) -> (CompanyRecord, Vec<SectionFailure>) {
    let document = Html::parse_document(markup);
    let mut report = SectionReport::default();

    let ids = identity::copy_targets(&document);
    let ids = report.or_default("identity", ids);

    let record = CompanyRecord {
        registration_number: ids.registration_number,
        tax_id: ids.tax_id,
        tax_registration_code: ids.tax_registration_code,
        statistics_code: ids.statistics_code,
        address: ids.address,
        short_name: report.take("short_name", identity::short_name(&document)),
        full_name: report.take("full_name", identity::full_name(&document)),
        status: report.take("status", identity::status(&document)),
        legal_form: report.take("legal_form", identity::legal_form(&document)),
        ownership_form: report.take("ownership_form", identity::ownership_form(&document)),
        tax_regime: report.take("tax_regime", identity::tax_regime(&document)),
        financials: report.take("financials", financials::statement(&document)),
        leadership: report.or_default("leadership", people::leadership(&document)),
        founders: report.or_default("founders", people::founders(&document)),
        sanctions: report.take("sanctions", identity::sanctions(&document)),
        contacts: report.or_default("contacts", contacts::contacts(&document)),
        activities: report.or_default("activities", contacts::activities(&document)),
        procurement: report.or_default("procurement", procurement::procurement(&document)),
    };

    (record, report.failures)
}
