use crate::error::{Result, SalesPulseError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Field stamped on every aggregated record with the calendar name of its month.
pub const MONTH_NAME_FIELD: &str = "month_name";
/// Field stamped on every aggregated record with the 1-based month number.
pub const MONTH_INDEX_FIELD: &str = "month_index";

/// A calendar month slot, stored zero-based (0 = Janeiro).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(usize);

impl Month {
    pub fn from_index(index: usize) -> Result<Self> {
        if index >= MONTH_NAMES.len() {
            return Err(SalesPulseError::InvalidMonthIndex(index));
        }
        Ok(Self(index))
    }

    pub fn all() -> impl Iterator<Item = Month> {
        (0..MONTH_NAMES.len()).map(Month)
    }

    /// Zero-based storage slot.
    pub fn index(self) -> usize {
        self.0
    }

    /// One-based calendar number, as written into `month_index`.
    pub fn number(self) -> u32 {
        self.0 as u32 + 1
    }

    pub fn name(self) -> &'static str {
        MONTH_NAMES[self.0]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One spreadsheet row: column name to scalar cell value, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesRecord(Map<String, Value>);

impl SalesRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Inserts a cell, replacing any earlier value under the same column.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn column_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The 1-based month stamped during aggregation, if present and in range.
    pub fn month_index(&self) -> Option<u32> {
        self.0
            .get(MONTH_INDEX_FIELD)
            .and_then(|v| {
                v.as_u64().or_else(|| {
                    v.as_f64()
                        .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                        .map(|f| f as u64)
                })
            })
            .filter(|n| (1..=12).contains(n))
            .map(|n| n as u32)
    }

    pub fn stamp_month(&mut self, month: Month) {
        self.insert(MONTH_NAME_FIELD, month.name());
        self.insert(MONTH_INDEX_FIELD, month.number());
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for SalesRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = SalesRecord::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

pub type MonthlyDataset = Vec<SalesRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body accepted by the analysis endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub sales_data: Vec<SalesRecord>,
    #[serde(default)]
    pub loaded_sheets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_month_lookup() {
        let march = Month::from_index(2).unwrap();
        assert_eq!(march.name(), "Março");
        assert_eq!(march.number(), 3);
        assert!(matches!(
            Month::from_index(12),
            Err(SalesPulseError::InvalidMonthIndex(12))
        ));
        assert_eq!(Month::all().count(), 12);
    }

    #[test]
    fn test_stamp_month_appends_derived_fields() {
        let mut record: SalesRecord = [("produto", json!("Café")), ("valor", json!(12.5))]
            .into_iter()
            .collect();
        record.stamp_month(Month::from_index(11).unwrap());

        assert_eq!(record.get(MONTH_NAME_FIELD), Some(&json!("Dezembro")));
        assert_eq!(record.month_index(), Some(12));
        let columns: Vec<&str> = record.columns().collect();
        assert_eq!(columns, vec!["produto", "valor", "month_name", "month_index"]);
    }

    #[test]
    fn test_month_index_from_client_json() {
        let index_of = |v: Value| {
            [(MONTH_INDEX_FIELD, v)]
                .into_iter()
                .collect::<SalesRecord>()
                .month_index()
        };
        assert_eq!(index_of(json!(1)), Some(1));
        assert_eq!(index_of(json!(1.0)), Some(1));
        assert_eq!(index_of(json!(12.0)), Some(12));
        assert_eq!(index_of(json!(1.5)), None);
        assert_eq!(index_of(json!(0)), None);
        assert_eq!(index_of(json!(13.0)), None);
        assert_eq!(index_of(json!(-1.0)), None);
        assert_eq!(index_of(json!("1")), None);
    }

    #[test]
    fn test_analyze_request_uses_camel_case() {
        let body = json!({
            "question": "Qual o total?",
            "salesData": [{ "valor": 10 }],
            "loadedSheets": ["Janeiro"]
        });
        let request: AnalyzeRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.sales_data.len(), 1);
        assert_eq!(request.loaded_sheets, vec!["Janeiro".to_string()]);

        let missing: AnalyzeRequest = serde_json::from_value(json!({})).unwrap();
        assert!(missing.question.is_empty());
        assert!(missing.sales_data.is_empty());
    }
}
