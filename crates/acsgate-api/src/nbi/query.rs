// Device query builder
//
// The NBI accepts a MongoDB-style JSON predicate in the `query` parameter,
// plus `projection`, `limit`, `skip`, and a JSON `sort` document. These
// types build those parameters without hand-assembling JSON strings.

use serde_json::{Map, Value, json};

/// A structured device predicate (`{"_id": "..."}`, `{"_lastInform": {"$gte": "..."}}`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Map<String, Value>);

impl Filter {
    /// The empty filter: matches every device.
    pub fn all() -> Self {
        Self::default()
    }

    /// Exact match on a single device id.
    pub fn by_id(device_id: &str) -> Self {
        Self::all().equals("_id", device_id)
    }

    /// Field equality (`{"field": value}`).
    pub fn equals(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_owned(), value.into());
        self
    }

    /// Regex match (`{"field": {"$regex": pattern, "$options": "i"}}`).
    pub fn regex(mut self, field: &str, pattern: &str, case_insensitive: bool) -> Self {
        let mut clause = Map::new();
        clause.insert("$regex".into(), Value::from(pattern));
        if case_insensitive {
            clause.insert("$options".into(), Value::from("i"));
        }
        self.0.insert(field.to_owned(), Value::Object(clause));
        self
    }

    /// Lower-bounded range (`{"field": {"$gte": value}}`).
    ///
    /// Timestamps are passed as ISO-8601 strings; the controller compares
    /// them in its own time domain.
    pub fn gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0
            .insert(field.to_owned(), json!({ "$gte": value.into() }));
        self
    }

    /// Disjunction of sub-filters (`{"$or": [...]}`). Empty input is a no-op.
    pub fn any_of(mut self, branches: Vec<Filter>) -> Self {
        if !branches.is_empty() {
            let arr = branches.into_iter().map(|f| Value::Object(f.0)).collect();
            self.0.insert("$or".into(), Value::Array(arr));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON text for the `query` parameter.
    pub fn to_query_string(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    fn as_i8(self) -> i8 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

/// A single-field sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    fn to_query_string(&self) -> String {
        let mut doc = Map::new();
        doc.insert(self.field.clone(), Value::from(self.order.as_i8()));
        Value::Object(doc).to_string()
    }
}

/// A bounded, projected, sortable device query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceQuery {
    pub filter: Filter,
    pub projection: Vec<String>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub sort: Option<Sort>,
}

impl DeviceQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Query-string pairs in the order the NBI documents them.
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("query", self.filter.to_query_string())];
        if !self.projection.is_empty() {
            params.push(("projection", self.projection.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(skip) = self.skip {
            params.push(("skip", skip.to_string()));
        }
        if let Some(ref sort) = self.sort {
            params.push(("sort", sort.to_query_string()));
        }
        params
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn filter_builds_mongo_style_predicates() {
        let filter = Filter::all()
            .equals("_tags", "vip")
            .gte("_lastInform", "2024-01-01T00:00:00Z")
            .any_of(vec![Filter::all().regex("_id", "bm632", true)]);

        let parsed: Value = serde_json::from_str(&filter.to_query_string()).unwrap();
        assert_eq!(
            parsed,
            json!({
                "_tags": "vip",
                "_lastInform": { "$gte": "2024-01-01T00:00:00Z" },
                "$or": [ { "_id": { "$regex": "bm632", "$options": "i" } } ]
            })
        );
    }

    #[test]
    fn empty_or_is_skipped() {
        assert!(Filter::all().any_of(Vec::new()).is_empty());
    }

    #[test]
    fn params_include_only_set_fields() {
        let q = DeviceQuery::new(Filter::by_id("abc"))
            .projection(["_id", "_lastInform"])
            .limit(50)
            .sort(Sort::new("_lastInform", SortOrder::Descending));

        let params = q.to_params();
        assert_eq!(
            params,
            vec![
                ("query", r#"{"_id":"abc"}"#.to_owned()),
                ("projection", "_id,_lastInform".to_owned()),
                ("limit", "50".to_owned()),
                ("sort", r#"{"_lastInform":-1}"#.to_owned()),
            ]
        );
    }
}
