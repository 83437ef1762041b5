//! Leadership and founders sections

use crate::extract::dom::{
    attr, find, find_in, following_elements, has_class, non_empty_text, selector, text,
};
use crate::extract::ExtractionFailure;
use crate::record::{Founders, Leadership};
use scraper::{ElementRef, Html};

const MANAGING_ORGANIZATION_LABEL: &str = "Управляющая организация";
const FOUNDER_KEYWORD: &str = "Учредител";
const NO_DATA_MARKER: &str = "Нет сведений";

/// Officer block first, then managing organization, else `Absent`
pub(crate) fn leadership(document: &Html) -> Result<Leadership, ExtractionFailure> {
    if let Some(block) = find(document, "div.flex-grow-1.ms-3")? {
        return individual(block);
    }

    if let Some(block) = managing_organization_block(document)? {
        return managing_organization(document, block);
    }

    Ok(Leadership::Absent)
}

fn individual(block: ElementRef<'_>) -> Result<Leadership, ExtractionFailure> {
    let anchor = find_in(block, "a")?.ok_or_else(|| ExtractionFailure::Malformed {
        what: "officer block",
        detail: "no profile link".to_string(),
    })?;

    Ok(Leadership::Individual {
        role: find_in(block, "strong.fw-bold")?.and_then(non_empty_text),
        name: text(anchor),
        link: attr(anchor, "href").unwrap_or_default(),
        tax_id: find_in(block, "span.copy")?.and_then(non_empty_text),
    })
}

fn managing_organization_block(document: &Html) -> Result<Option<ElementRef<'_>>, ExtractionFailure> {
    let blocks = selector("div.mb-3")?;
    let labels = selector("div.fw-bold")?;
    Ok(document.select(&blocks).find(|block| {
        block
            .select(&labels)
            .any(|label| text(label) == MANAGING_ORGANIZATION_LABEL)
    }))
}

fn managing_organization<'a>(
    document: &'a Html,
    block: ElementRef<'a>,
) -> Result<Leadership, ExtractionFailure> {
    let label = find_in(block, "div.fw-bold")?.map(text).unwrap_or_default();
    let anchor = find_in(block, "a")?.ok_or_else(|| ExtractionFailure::Malformed {
        what: "managing organization block",
        detail: "no organization link".to_string(),
    })?;

    // The "since" line may sit inside the block or right after it.
    let since = following_elements(document, block)
        .find(|e| e.value().name() == "div" && has_class(*e, "text-secondary"))
        .and_then(non_empty_text);

    Ok(Leadership::ManagingOrganization {
        org_type: label,
        name: text(anchor),
        link: attr(anchor, "href").unwrap_or_default(),
        since,
    })
}

/// Founder link, declared absence of data, or no founders block at all
pub(crate) fn founders(document: &Html) -> Result<Founders, ExtractionFailure> {
    let block = founders_block(document)?.ok_or(ExtractionFailure::Missing("founders block"))?;

    let links = selector("a[href]")?;
    let founder = block
        .select(&links)
        .find(|a| !has_class(*a, "history"));

    if let Some(anchor) = founder {
        return Ok(Founders::Founder {
            name: text(anchor),
            link: attr(anchor, "href").unwrap_or_default(),
            since: find_in(block, "div.text-secondary")?.and_then(non_empty_text),
        });
    }

    let note = block
        .text()
        .map(str::trim)
        .find(|t| t.contains(NO_DATA_MARKER))
        .unwrap_or("Нет данных");

    Ok(Founders::NoDataDeclared {
        note: note.to_string(),
    })
}

fn founders_block(document: &Html) -> Result<Option<ElementRef<'_>>, ExtractionFailure> {
    let blocks = selector("div.mb-3")?;
    let titles = selector("strong.fw-bold, strong.fu-bold")?;
    Ok(document.select(&blocks).find(|block| {
        block
            .select(&titles)
            .any(|title| text(title).contains(FOUNDER_KEYWORD))
    }))
}
