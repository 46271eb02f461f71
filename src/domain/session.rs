use std::collections::BTreeMap;

use serde::Serialize;

use super::{Catalog, Ledger};

/// JSON body sent to the counting endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountSubmission {
    pub username: String,
    pub count_type: String,
    #[serde(flatten)]
    pub counts: BTreeMap<String, u64>,
}

/// One operator's counting attempt: the ledger plus who counted and what kind
/// of count it is. Lives only for the duration of the process.
#[derive(Debug)]
pub struct Session {
    pub ledger: Ledger,
    operator: Option<String>,
    count_type: String,
}

impl Session {
    pub fn new(catalog: Catalog, count_type: impl Into<String>) -> Self {
        Self {
            ledger: Ledger::new(catalog),
            operator: None,
            count_type: count_type.into(),
        }
    }

    pub fn set_operator(&mut self, name: impl Into<String>) {
        self.operator = Some(name.into());
    }

    /// Operator name with surrounding whitespace removed, or `None` if blank.
    pub fn operator(&self) -> Option<&str> {
        self.operator
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn count_type(&self) -> &str {
        &self.count_type
    }

    /// Build the submission body, or `None` while no operator is set.
    pub fn submission(&self) -> Option<CountSubmission> {
        let username = self.operator()?.to_string();
        Some(CountSubmission {
            username,
            count_type: self.count_type.clone(),
            counts: self.ledger.to_payload(),
        })
    }
}
