//! Identity, status and label-keyed attribute sections

use crate::extract::dom::{
    find, following_elements, labelled_div, labelled_value, next_sibling_divs, has_class,
    non_empty_text, selector, text,
};
use crate::extract::ExtractionFailure;
use crate::record::{CompanyStatus, StatusClass, StatusMarker, TaxRegime};
use scraper::Html;

/// Registry codes and address exposed as copy targets
#[derive(Debug, Default)]
pub(crate) struct CopyTargets {
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub tax_registration_code: Option<String>,
    pub statistics_code: Option<String>,
    pub address: Option<String>,
}

pub(crate) fn copy_targets(document: &Html) -> Result<CopyTargets, ExtractionFailure> {
    let value = |css: &'static str| -> Result<Option<String>, ExtractionFailure> {
        Ok(find(document, css)?.and_then(non_empty_text))
    };

    Ok(CopyTargets {
        registration_number: value("#copy-ogrn")?,
        tax_id: value("#copy-inn")?,
        tax_registration_code: value("#copy-kpp")?,
        statistics_code: value("#copy-okpo")?,
        address: value("#copy-address")?,
    })
}

pub(crate) fn short_name(document: &Html) -> Result<String, ExtractionFailure> {
    find(document, "h1.mb-2")?
        .and_then(non_empty_text)
        .ok_or(ExtractionFailure::Missing("short name heading"))
}

pub(crate) fn full_name(document: &Html) -> Result<String, ExtractionFailure> {
    find(document, "div.fw-bold.mb-2")?
        .and_then(non_empty_text)
        .ok_or(ExtractionFailure::Missing("full name block"))
}

/// Status markers in priority order
const STATUS_MARKERS: [(&str, StatusMarker); 3] = [
    ("div.text-success.fw-bold", StatusMarker::Success),
    ("div.text-danger.fw-bold", StatusMarker::Danger),
    ("div.fw-bold.special-status", StatusMarker::Special),
];

pub(crate) fn status(document: &Html) -> Result<CompanyStatus, ExtractionFailure> {
    for (css, marker) in STATUS_MARKERS {
        if let Some(block) = find(document, css)? {
            let text = text(block);
            return Ok(CompanyStatus {
                class: StatusClass::classify(&text),
                text,
                marker,
            });
        }
    }
    Err(ExtractionFailure::Missing("status block"))
}

pub(crate) fn legal_form(document: &Html) -> Result<String, ExtractionFailure> {
    labelled_value(document, "Организационно-правовая форма")
}

pub(crate) fn ownership_form(document: &Html) -> Result<String, ExtractionFailure> {
    labelled_value(document, "Форма собственности")
}

const TAX_REGIME_LABEL: &str = "Система налогообложения";

/// Tax regime: the value block plus its grey comment line
pub(crate) fn tax_regime(document: &Html) -> Result<TaxRegime, ExtractionFailure> {
    let bold = selector("div.fw-bold")?;
    let label = document
        .select(&bold)
        .find(|d| text(*d) == TAX_REGIME_LABEL)
        .ok_or(ExtractionFailure::Missing("tax regime label"))?;

    // The comment line is itself a sibling div, so a lone comment is not a value.
    let value = next_sibling_divs(label)
        .next()
        .filter(|d| !has_class(*d, "text-secondary"))
        .and_then(non_empty_text);
    let comment = next_sibling_divs(label)
        .find(|d| has_class(*d, "text-secondary"))
        .and_then(non_empty_text);

    if value.is_none() && comment.is_none() {
        return Err(ExtractionFailure::Malformed {
            what: "tax regime",
            detail: "label has no value".to_string(),
        });
    }

    Ok(TaxRegime { value, comment })
}

pub(crate) fn sanctions(document: &Html) -> Result<String, ExtractionFailure> {
    let label = labelled_div(document, "Санкционные списки")?
        .ok_or(ExtractionFailure::Missing("sanctions block"))?;

    following_elements(document, label)
        .find(|e| e.value().name() == "div")
        .and_then(non_empty_text)
        .ok_or(ExtractionFailure::Malformed {
            what: "sanctions block",
            detail: "no text after label".to_string(),
        })
}
