//! PQL statements for the legacy `get*ByStatement` calls.

use crate::admanager::soap::xml::XmlElement;

/// Page size used when no explicit limit is set.
pub const SUGGESTED_PAGE_LIMIT: u32 = 500;

/// A value bound to a `:name` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    /// An integer, sent as `NumberValue`.
    Number(i64),
}

impl BindValue {
    const fn xsi_type(&self) -> &'static str {
        match self {
            Self::Number(_) => "NumberValue",
        }
    }

    fn literal(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Builds a filter statement: an optional WHERE clause, a limit and the
/// bind variables it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementBuilder {
    where_clause: Option<String>,
    limit: u32,
    values: Vec<(String, BindValue)>,
}

impl Default for StatementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            where_clause: None,
            limit: SUGGESTED_PAGE_LIMIT,
            values: Vec::new(),
        }
    }

    /// Sets the WHERE condition, without the `WHERE` keyword.
    #[must_use]
    pub fn where_clause(mut self, condition: impl Into<String>) -> Self {
        self.where_clause = Some(condition.into());
        self
    }

    #[must_use]
    pub fn with_bind_variable(mut self, key: impl Into<String>, value: BindValue) -> Self {
        self.values.push((key.into(), value));
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// The PQL query text.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut query = String::new();
        if let Some(condition) = &self.where_clause {
            query.push_str("WHERE ");
            query.push_str(condition);
            query.push(' ');
        }
        query.push_str(&format!("LIMIT {}", self.limit));
        query
    }

    /// The statement as a SOAP element named `element_name`.
    #[must_use]
    pub fn to_element(&self, element_name: &str) -> XmlElement {
        let mut statement = XmlElement::new(element_name).with_text_child("query", self.to_query());
        for (key, value) in &self.values {
            statement = statement.with_child(
                XmlElement::new("values").with_text_child("key", key).with_child(
                    XmlElement::new("value")
                        .with_attribute("xsi:type", value.xsi_type())
                        .with_text_child("value", value.literal()),
                ),
            );
        }
        statement
    }
}
