//! Contacts and activities sections

use crate::extract::dom::{attr, find, find_in, next_sibling_elements, selector, text};
use crate::extract::ExtractionFailure;
use crate::record::{Activity, Contacts, Website};
use scraper::Html;

pub(crate) fn contacts(document: &Html) -> Result<Contacts, ExtractionFailure> {
    let phones = selector(r#"a.link-black[href^="tel:"]"#)?;
    let emails = selector(r#"a[href^="mailto:"]"#)?;

    Ok(Contacts {
        phones: document
            .select(&phones)
            .map(text)
            .filter(|t| !t.is_empty())
            .collect(),
        emails: document
            .select(&emails)
            .map(text)
            .filter(|t| !t.is_empty())
            .collect(),
        websites: websites(document)?,
    })
}

/// External links listed after the company name heading, up to the next heading
fn websites(document: &Html) -> Result<Vec<Website>, ExtractionFailure> {
    let Some(heading) = find(document, "strong.fw-bold.d-block.mt-3.mb-1")? else {
        return Ok(Vec::new());
    };

    let mut websites = Vec::new();
    for sibling in next_sibling_elements(heading) {
        match sibling.value().name() {
            "strong" => break,
            "a" => {
                if let Some(url) = attr(sibling, "href").filter(|h| h.starts_with("http")) {
                    websites.push(Website {
                        name: text(sibling),
                        url,
                    });
                }
            }
            _ => {}
        }
    }
    Ok(websites)
}

/// Rows of the last activities table on the page
pub(crate) fn activities(document: &Html) -> Result<Vec<Activity>, ExtractionFailure> {
    let tables = selector("table.table.table-md.table-striped")?;
    let table = document
        .select(&tables)
        .last()
        .ok_or(ExtractionFailure::Missing("activities table"))?;

    let rows = selector("tr")?;
    let cells = selector("td")?;

    let mut activities = Vec::new();
    for row in table.select(&rows) {
        let cols: Vec<_> = row.select(&cells).collect();
        if cols.len() < 2 {
            continue;
        }

        let description = cols[1];
        let (href, text_value) = match find_in(description, "a")? {
            Some(link) => (attr(link, "href").unwrap_or_default(), text(link)),
            None => (String::new(), text(description)),
        };
        let note = find_in(description, "span.extra-tip")?
            .map(text)
            .unwrap_or_default();

        activities.push(Activity {
            code: text(cols[0]),
            text: text_value,
            href,
            note,
        });
    }
    Ok(activities)
}
