//! Company record data model
//!
//! Every field is optional or has a default so a record can be built from a
//! page where any number of sections are missing. Deserialization is strict:
//! a cached record must carry every field under its own name.

use serde::{Deserialize, Serialize};

/// Structured company profile extracted from a registry page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyRecord {
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub tax_registration_code: Option<String>,
    pub statistics_code: Option<String>,
    pub address: Option<String>,
    pub short_name: Option<String>,
    pub full_name: Option<String>,

    pub status: Option<CompanyStatus>,
    pub legal_form: Option<String>,
    pub ownership_form: Option<String>,
    pub tax_regime: Option<TaxRegime>,

    pub financials: Option<FinancialStatement>,
    pub leadership: Leadership,
    pub founders: Founders,
    pub sanctions: Option<String>,
    pub contacts: Contacts,
    pub activities: Vec<Activity>,
    pub procurement: Procurement,
}

impl CompanyRecord {
    /// Coarse status classification, `Unknown` when no status block was found
    pub fn status_class(&self) -> StatusClass {
        self.status
            .as_ref()
            .map(|s| s.class)
            .unwrap_or(StatusClass::Unknown)
    }
}

/// A record paired with the identifier it was harvested for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestedRecord {
    pub identifier: String,
    #[serde(flatten)]
    pub record: CompanyRecord,
}

/// Status text as displayed on the page plus where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyStatus {
    pub text: String,
    pub marker: StatusMarker,
    pub class: StatusClass,
}

/// The visual marker the status text was found under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMarker {
    Success,
    Danger,
    Special,
}

/// Coarse classification of a company's status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Active,
    Bankrupt,
    Liquidated,
    Excluded,
    Unknown,
}

impl StatusClass {
    /// Classifies raw status text
    ///
    /// Checks run from the most to the least severe so texts such as
    /// "Действует, в процессе банкротства" classify as bankrupt.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("банкрот") {
            Self::Bankrupt
        } else if lower.contains("ликвид") {
            Self::Liquidated
        } else if lower.contains("исключ") {
            Self::Excluded
        } else if lower.contains("не действ") {
            Self::Unknown
        } else if lower.contains("действ") {
            Self::Active
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Bankrupt => "bankrupt",
            Self::Liquidated => "liquidated",
            Self::Excluded => "excluded",
            Self::Unknown => "unknown",
        }
    }
}

/// Taxation system with its free-text comment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxRegime {
    pub value: Option<String>,
    pub comment: Option<String>,
}

/// Financial statement block: a period label and its line items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub period: String,
    pub items: Vec<FinancialLineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialLineItem {
    pub name: String,
    pub value: String,
    pub change: Option<FinancialChange>,
}

/// Year-over-year change badge attached to a line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialChange {
    pub magnitude: String,
    pub tooltip: Option<String>,
}

/// Who runs the company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Leadership {
    Individual {
        role: Option<String>,
        name: String,
        link: String,
        tax_id: Option<String>,
    },
    ManagingOrganization {
        #[serde(rename = "type")]
        org_type: String,
        name: String,
        link: String,
        since: Option<String>,
    },
    #[default]
    Absent,
}

/// Outcome of the founders lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Founders {
    Founder {
        name: String,
        link: String,
        since: Option<String>,
    },
    NoDataDeclared {
        note: String,
    },
    #[default]
    ExtractionFailed,
}

/// Contact details; every list may be empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contacts {
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub websites: Vec<Website>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Website {
    pub name: String,
    pub url: String,
}

/// One row of the activities table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub code: String,
    pub text: String,
    pub href: String,
    pub note: String,
}

/// Public procurement summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Procurement {
    NoParticipation,
    #[default]
    Unavailable,
    Present {
        contract_count: u32,
        total: MoneyAmount,
        customer: Option<MoneyAmount>,
        supplier: Option<MoneyAmount>,
    },
}

/// A figure with its display unit, e.g. `1.5` + `"млрд руб."`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyAmount {
    pub amount: f64,
    pub unit: String,
}
