//! Small DOM helpers shared by the section extractors

use crate::extract::ExtractionFailure;
use scraper::{ElementRef, Html, Selector};

/// Parses a static CSS selector
pub(crate) fn selector(css: &'static str) -> Result<Selector, ExtractionFailure> {
    Selector::parse(css).map_err(|_| ExtractionFailure::Selector(css))
}

/// First document match for a selector
pub(crate) fn find<'a>(
    document: &'a Html,
    css: &'static str,
) -> Result<Option<ElementRef<'a>>, ExtractionFailure> {
    let selector = selector(css)?;
    Ok(document.select(&selector).next())
}

/// First match for a selector below an element
pub(crate) fn find_in<'a>(
    scope: ElementRef<'a>,
    css: &'static str,
) -> Result<Option<ElementRef<'a>>, ExtractionFailure> {
    let selector = selector(css)?;
    Ok(scope.select(&selector).next())
}

/// Non-empty, trimmed text segments of an element in document order
pub(crate) fn segments<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    element.text().map(str::trim).filter(|s| !s.is_empty())
}

/// Element text with whitespace runs collapsed to single spaces
pub(crate) fn text(element: ElementRef<'_>) -> String {
    segments(element)
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Element text, or `None` when it is empty
pub(crate) fn non_empty_text(element: ElementRef<'_>) -> Option<String> {
    Some(text(element)).filter(|t| !t.is_empty())
}

/// Text of the element's direct text children only, whitespace collapsed
pub(crate) fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

pub(crate) fn attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element.value().attr(name).map(str::to_string)
}

/// Element siblings that follow this one
pub(crate) fn next_sibling_elements<'a>(
    element: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.next_siblings().filter_map(ElementRef::wrap)
}

/// Following sibling `div`s
pub(crate) fn next_sibling_divs<'a>(
    element: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    next_sibling_elements(element).filter(|e| e.value().name() == "div")
}

/// Elements after this one in document order, its own descendants included
pub(crate) fn following_elements<'a>(
    document: &'a Html,
    element: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let target = (*element).id();
    document
        .tree
        .root()
        .descendants()
        .skip_while(move |node| node.id() != target)
        .skip(1)
        .filter_map(ElementRef::wrap)
}

/// A `div` labelled with exactly `label`
///
/// Tries a div whose own text is the label first, then a bold div whose full
/// text is the label (labels wrapped in inline markup).
pub(crate) fn labelled_div<'a>(
    document: &'a Html,
    label: &str,
) -> Result<Option<ElementRef<'a>>, ExtractionFailure> {
    let divs = selector("div")?;
    if let Some(found) = document.select(&divs).find(|d| own_text(*d) == label) {
        return Ok(Some(found));
    }

    let bold = selector("div.fw-bold")?;
    Ok(document.select(&bold).find(|d| text(*d) == label))
}

/// Value of a label-keyed block: the label's next sibling `div`
pub(crate) fn labelled_value(
    document: &Html,
    label: &'static str,
) -> Result<String, ExtractionFailure> {
    let block = labelled_div(document, label)?.ok_or(ExtractionFailure::Missing(label))?;
    let value = next_sibling_divs(block)
        .next()
        .ok_or(ExtractionFailure::Malformed {
            what: label,
            detail: "label has no value block".to_string(),
        })?;
    Ok(text(value))
}
