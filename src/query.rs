//! Query builder and assembler
//!
//! Provides a fluent API for describing a `_find` query and compiling it into
//! the request document: selector + sort + fields + skip/limit.

use crate::condition::Condition;
use crate::config::CompilerConfig;
use crate::error::Result;
use crate::normalizer::normalize;
use crate::selector::{existence_constraint, RawSelector, Selector, SelectorDoc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

/// Sort direction
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
    /// Any other direction value the store understands, sent unchanged.
    Native(Value),
}

impl SortDirection {
    fn to_value(&self) -> Value {
        match self {
            SortDirection::Asc => Value::from("asc"),
            SortDirection::Desc => Value::from("desc"),
            SortDirection::Native(v) => v.clone(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
            SortDirection::Native(v) => write!(f, "{}", v),
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// Projection
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Fields {
    /// Return whole documents.
    #[default]
    Unset,
    /// Explicitly request no fields.
    Empty,
    /// Output name → source field, in output order.
    Named(Vec<(String, String)>),
}

/// Transport options carried through untouched
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
}

/// Description of a `_find` query against one database
///
/// # Example
/// ```
/// use couchfind::query::{database, SortDirection};
/// use couchfind::condition::Condition;
///
/// let query = database("users")
///     .filter(Condition::between("age", 18, 65))
///     .order_by("name", SortDirection::Asc)
///     .limit(10)
///     .assemble()
///     .unwrap();
/// assert_eq!(query.limit(), Some(10));
/// ```
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    database: String,
    condition: Condition,
    raw_selector: Option<RawSelector>,
    raw_query: Map<String, Value>,
    fields: Fields,
    source: Option<Value>,
    order_by: Vec<SortSpec>,
    limit_value: Option<u64>,
    offset_value: u64,
    options: RequestOptions,
    config: CompilerConfig,
}

impl QuerySpec {
    /// Create a new query against a database
    pub fn database(name: impl Into<String>) -> Self {
        Self {
            database: name.into(),
            ..Self::default()
        }
    }

    /// Replace the condition
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// AND another condition onto the current one
    pub fn and_filter(mut self, condition: Condition) -> Self {
        self.condition = if self.condition.is_empty() {
            condition
        } else {
            Condition::and(vec![std::mem::take(&mut self.condition), condition])
        };
        self
    }

    /// Selector override, AND-ed with the compiled condition
    pub fn raw_selector(mut self, raw: impl Into<RawSelector>) -> Self {
        self.raw_selector = Some(raw.into());
        self
    }

    /// Extra top-level request key such as `use_index` or `bookmark`
    pub fn raw_query(mut self, key: impl Into<String>, value: Value) -> Self {
        self.raw_query.insert(key.into(), value);
        self
    }

    /// Project onto these fields; an empty list is an explicit empty projection
    pub fn fields<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields_as(names.into_iter().map(|n| {
            let n: String = n.into();
            (n.clone(), n)
        }))
    }

    /// Project onto `(output name, source field)` pairs
    ///
    /// The store cannot alias fields, so only source names go on the wire. Output
    /// names stay on the spec ([`QuerySpec::field_spec`]) for the record-mapping side.
    pub fn fields_as<I, A, B>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(a, b)| (a.into(), b.into()))
            .collect();
        self.fields = if pairs.is_empty() {
            Fields::Empty
        } else {
            Fields::Named(pairs)
        };
        self
    }

    /// Request an empty projection
    pub fn no_fields(mut self) -> Self {
        self.fields = Fields::Empty;
        self
    }

    pub fn source(mut self, source: Value) -> Self {
        self.source = Some(source);
        self
    }

    /// Sort by field; call repeatedly for secondary keys
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    /// Limit number of results
    pub fn limit(mut self, n: u64) -> Self {
        self.limit_value = Some(n);
        self
    }

    /// Skip results (offset)
    pub fn offset(mut self, n: u64) -> Self {
        self.offset_value = n;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn field_spec(&self) -> &Fields {
        &self.fields
    }

    /// Compile into the request document
    pub fn assemble(&self) -> Result<CompiledQuery> {
        let pk = &self.config.primary_key;

        let fields = match &self.fields {
            Fields::Unset => None,
            Fields::Empty => Some(Vec::new()),
            Fields::Named(pairs) if pairs.is_empty() => Some(Vec::new()),
            Fields::Named(pairs) => {
                let sources: Vec<String> = pairs.iter().map(|(_, src)| src.clone()).collect();
                let mut out = Vec::with_capacity(sources.len() + 2);
                for required in [pk, &self.config.revision_field] {
                    if !sources.contains(required) {
                        out.push(required.clone());
                    }
                }
                out.extend(sources);
                Some(out)
            }
        };

        let skip = (self.offset_value > 0).then_some(self.offset_value);

        let compiled = normalize(&self.condition)?;
        let compiled = (!compiled.is_empty()).then_some(compiled);
        let selector = match (self.raw_selector.clone(), compiled) {
            (Some(raw), None) => SelectorDoc::from_raw(raw),
            (Some(raw), Some(compiled)) => SelectorDoc::and_raw(raw, compiled),
            (None, Some(compiled)) => SelectorDoc::Structured(compiled),
            (None, None) => SelectorDoc::Structured(Selector::single(pk.as_str(), existence_constraint())),
        };

        // Every sort key must also appear in the selector for the index to be usable.
        let mut injected = Selector::new();
        for spec in &self.order_by {
            if !selector.constrains(&spec.field) && !injected.contains_key(&spec.field) {
                log::trace!("injecting existence constraint for sort field {}", spec.field);
                injected.insert(spec.field.as_str(), existence_constraint());
            }
        }
        let selector = selector.with_constraints(injected);

        let sort = if self.order_by.is_empty() {
            None
        } else {
            Some(
                self.order_by
                    .iter()
                    .map(|s| {
                        let mut entry = Map::new();
                        entry.insert(s.field.clone(), s.direction.to_value());
                        Value::Object(entry)
                    })
                    .collect(),
            )
        };

        log::debug!(
            "compiled find on {}: selector keys {:?}, {} sort keys, limit {:?}, skip {:?}",
            self.database,
            selector.as_selector().map(|s| s.keys().cloned().collect::<Vec<_>>()),
            self.order_by.len(),
            self.limit_value,
            skip
        );

        Ok(CompiledQuery {
            database: self.database.clone(),
            selector,
            sort,
            fields,
            source: self.source.clone(),
            limit: self.limit_value,
            skip,
            extra: self.raw_query.clone(),
            options: self.options.clone(),
        })
    }
}

/// Create a query against a database
pub fn database(name: impl Into<String>) -> QuerySpec {
    QuerySpec::database(name)
}

/// Compiled `_find` request, ready for a transport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    #[serde(skip)]
    database: String,
    selector: SelectorDoc,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<String>>,
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    source: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip: Option<u64>,
    #[serde(skip)]
    extra: Map<String, Value>,
    #[serde(skip)]
    options: RequestOptions,
}

impl CompiledQuery {
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn selector(&self) -> &SelectorDoc {
        &self.selector
    }

    pub fn sort(&self) -> Option<&[Value]> {
        self.sort.as_deref()
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn source(&self) -> Option<&Value> {
        self.source.as_ref()
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// JSON request body. Extra keys fill in only where the compiled query left a gap.
    pub fn to_body(&self) -> Result<Value> {
        let mut body = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut body {
            for (k, v) in &self.extra {
                if !map.contains_key(k) {
                    map.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(body)
    }

    /// Compact JSON text of [`CompiledQuery::to_body`]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_body()?)?)
    }
}
