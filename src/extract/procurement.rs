//! Public procurement section
//!
//! The section sits at a fixed position among the page's `section.x-section`
//! blocks. When that slot does not mention procurement the first section that
//! does is used instead.

use crate::extract::dom::{find_in, segments, selector, text};
use crate::extract::ExtractionFailure;
use crate::record::{MoneyAmount, Procurement};
use scraper::{ElementRef, Html};

/// Zero-based position of the procurement section on the profile page
const PROCUREMENT_SECTION_INDEX: usize = 9;

const NO_PARTICIPATION_MARKER: &str = "Нет сведений об участии компании";
const CUSTOMER_TAB: &str = "Заказчик";
const SUPPLIER_TAB: &str = "Поставщик";

pub(crate) fn procurement(document: &Html) -> Result<Procurement, ExtractionFailure> {
    let section = procurement_section(document)?;

    let body = segments(section).collect::<Vec<_>>().join(" ");
    if body.contains(NO_PARTICIPATION_MARKER) {
        return Ok(Procurement::NoParticipation);
    }

    let contract_count = contract_count(section)?;
    let total = total_amount(section)?;
    let (customer, supplier) = role_amounts(section)?;

    Ok(Procurement::Present {
        contract_count,
        total,
        customer,
        supplier,
    })
}

fn procurement_section(document: &Html) -> Result<ElementRef<'_>, ExtractionFailure> {
    let sections = selector("section.x-section")?;
    let sections: Vec<_> = document.select(&sections).collect();

    let at_slot = sections.get(PROCUREMENT_SECTION_INDEX).copied();
    at_slot
        .filter(|s| mentions_procurement(*s))
        .or_else(|| sections.iter().copied().find(|s| mentions_procurement(*s)))
        .or(at_slot)
        .ok_or(ExtractionFailure::Missing("procurement section"))
}

fn mentions_procurement(section: ElementRef<'_>) -> bool {
    text(section).to_lowercase().contains("госзакуп")
}

fn contract_count(section: ElementRef<'_>) -> Result<u32, ExtractionFailure> {
    let block = find_in(section, "div.mb-2")?.ok_or_else(|| malformed("no contract count block"))?;
    let summary = text(block);
    let first = summary
        .split_whitespace()
        .next()
        .ok_or_else(|| malformed("empty contract count"))?;
    first
        .parse()
        .map_err(|_| malformed(format!("contract count '{}' is not a number", first)))
}

fn total_amount(section: ElementRef<'_>) -> Result<MoneyAmount, ExtractionFailure> {
    let link = find_in(section, "a.link-black")?.ok_or_else(|| malformed("no total amount"))?;
    let figure = text(link);
    let first = figure
        .split_whitespace()
        .next()
        .ok_or_else(|| malformed("empty total amount"))?;
    let unit = find_in(link, "span")?
        .map(text)
        .ok_or_else(|| malformed("total amount has no unit"))?;

    Ok(MoneyAmount {
        amount: parse_amount(first)?,
        unit,
    })
}

/// Amounts on the customer and supplier tabs
fn role_amounts(
    section: ElementRef<'_>,
) -> Result<(Option<MoneyAmount>, Option<MoneyAmount>), ExtractionFailure> {
    let buttons = selector("button.nav-link")?;
    let mut customer = None;
    let mut supplier = None;

    for button in section.select(&buttons) {
        let Some(badge) = find_in(button, "span.text-muted.fw-400")? else {
            continue;
        };
        let badge = text(badge);
        let mut parts = badge.split_whitespace();
        let Some(figure) = parts.next() else {
            continue;
        };
        let unit = parts.collect::<Vec<_>>().join(" ");
        if unit.is_empty() {
            continue;
        }

        let amount = MoneyAmount {
            amount: parse_amount(figure)?,
            unit,
        };
        let label = text(button);
        if label.contains(CUSTOMER_TAB) {
            customer = Some(amount);
        } else if label.contains(SUPPLIER_TAB) {
            supplier = Some(amount);
        }
    }

    Ok((customer, supplier))
}

/// Parses a figure written with a decimal comma
fn parse_amount(figure: &str) -> Result<f64, ExtractionFailure> {
    figure
        .replace(',', ".")
        .parse()
        .map_err(|_| malformed(format!("amount '{}' is not a number", figure)))
}

fn malformed(detail: impl Into<String>) -> ExtractionFailure {
    ExtractionFailure::Malformed {
        what: "procurement section",
        detail: detail.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_section_at(index: usize, section: &str) -> String {
        let mut html = String::from("<html><body>");
        for i in 0..12 {
            if i == index {
                html.push_str(section);
            } else {
                html.push_str(&format!("<section class=\"x-section\"><p>Раздел {}</p></section>", i));
            }
        }
        html.push_str("</body></html>");
        html
    }

    const PRESENT: &str = r#"
        <section class="x-section">
          <h2>Госзакупки</h2>
          <div class="mb-2">42 контракта</div>
          <a class="link-black" href="/id/1/contracts">1,5 <span>млрд руб.</span></a>
          <ul class="nav">
            <li><button class="nav-link">Заказчик <span class="text-muted fw-400">120,3 млн руб.</span></button></li>
            <li><button class="nav-link">Поставщик <span class="text-muted fw-400">1,38 млрд руб.</span></button></li>
          </ul>
        </section>
    "#;

    #[test]
    fn test_procurement_present() {
        let page = page_with_section_at(PROCUREMENT_SECTION_INDEX, PRESENT);
        let procurement = procurement(&Html::parse_document(&page)).unwrap();
        assert_eq!(
            procurement,
            Procurement::Present {
                contract_count: 42,
                total: MoneyAmount {
                    amount: 1.5,
                    unit: "млрд руб.".to_string()
                },
                customer: Some(MoneyAmount {
                    amount: 120.3,
                    unit: "млн руб.".to_string()
                }),
                supplier: Some(MoneyAmount {
                    amount: 1.38,
                    unit: "млрд руб.".to_string()
                }),
            }
        );
    }

    #[test]
    fn test_procurement_no_participation() {
        let section = r#"<section class="x-section"><h2>Госзакупки</h2>
            <p>Нет сведений об участии компании в госзакупках</p></section>"#;
        let page = page_with_section_at(PROCUREMENT_SECTION_INDEX, section);
        assert_eq!(
            procurement(&Html::parse_document(&page)).unwrap(),
            Procurement::NoParticipation
        );
    }

    #[test]
    fn test_procurement_found_out_of_slot() {
        let page = page_with_section_at(4, PRESENT);
        assert!(matches!(
            procurement(&Html::parse_document(&page)).unwrap(),
            Procurement::Present {
                contract_count: 42,
                ..
            }
        ));
    }

    #[test]
    fn test_procurement_unparseable_count_is_malformed() {
        let section = PRESENT.replace("42 контракта", "много контрактов");
        let page = page_with_section_at(PROCUREMENT_SECTION_INDEX, &section);
        assert!(matches!(
            procurement(&Html::parse_document(&page)),
            Err(ExtractionFailure::Malformed { .. })
        ));
    }

    #[test]
    fn test_procurement_section_missing() {
        let document = Html::parse_document("<section class='x-section'>Адрес</section>");
        assert_eq!(
            procurement(&document),
            Err(ExtractionFailure::Missing("procurement section"))
        );
    }
}
