//! Financial statement section
//!
//! The statement is a bold period header followed by sibling blocks, one per
//! line item. Each item holds a `a.link-pseudo` label, the value as loose text,
//! and optionally a change badge. The walk stops at the first sibling that is
//! not shaped like a line item.

use crate::extract::dom::{attr, find_in, next_sibling_divs, selector, text};
use crate::extract::ExtractionFailure;
use crate::record::{FinancialChange, FinancialLineItem, FinancialStatement};
use scraper::{ElementRef, Html};

const PERIOD_MARKER: &str = "Финансовая отчетность";

pub(crate) fn statement(document: &Html) -> Result<FinancialStatement, ExtractionFailure> {
    let bold = selector("div.fw-bold")?;
    let header = document
        .select(&bold)
        .find(|d| text(*d).contains(PERIOD_MARKER))
        .ok_or(ExtractionFailure::Missing("financial statement header"))?;

    let mut items = Vec::new();
    for sibling in next_sibling_divs(header) {
        match line_item(sibling)? {
            Some(item) => items.push(item),
            None => break,
        }
    }

    Ok(FinancialStatement {
        period: text(header),
        items,
    })
}

/// Reads one line item, `None` when the block is not shaped like one
fn line_item(block: ElementRef<'_>) -> Result<Option<FinancialLineItem>, ExtractionFailure> {
    let Some(label) = find_in(block, "a.link-pseudo")? else {
        return Ok(None);
    };
    let change = find_in(block, "span.financial-statement-change")?;

    let mut excluded = vec![label];
    excluded.extend(change);

    Ok(Some(FinancialLineItem {
        name: text(label),
        value: value_segment(block, &excluded).unwrap_or_default(),
        change: change.map(|badge| FinancialChange {
            magnitude: text(badge),
            tooltip: attr(badge, "data-bs-title"),
        }),
    }))
}

/// First non-empty text segment that is not inside an excluded element
fn value_segment(block: ElementRef<'_>, excluded: &[ElementRef<'_>]) -> Option<String> {
    block.descendants().find_map(|node| {
        let segment = node.value().as_text()?.trim();
        if segment.is_empty() {
            return None;
        }
        let inside_excluded = node
            .ancestors()
            .any(|ancestor| excluded.iter().any(|e| (**e).id() == ancestor.id()));
        if inside_excluded {
            None
        } else {
            Some(segment.to_string())
        }
    })
}
