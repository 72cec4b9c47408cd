//! In-memory evaluation of a descriptor over a document set.

use super::descriptor::{Clause, QueryDescriptor, SortDirection};
use crate::types::Document;
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

/// Whether `doc` passes every equality filter in `descriptor`.
pub fn matches(descriptor: &QueryDescriptor, doc: &Document) -> bool {
    descriptor.clauses().iter().all(|clause| match clause {
        Clause::Equals { field, value } => match field_of(doc, field) {
            Some(v) => value.matches(&v),
            None => false,
        },
        _ => true,
    })
}

/// Filter, sort and limit `docs` into a full ordered result set.
///
/// Without sort clauses results are ordered by document id. Documents
/// missing a sort field order before those that have it.
pub fn apply<'a, I>(descriptor: &QueryDescriptor, docs: I) -> Vec<Document>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut out: Vec<Document> = docs
        .into_iter()
        .filter(|doc| matches(descriptor, doc))
        .cloned()
        .collect();

    let sort: Vec<(&str, SortDirection)> = descriptor
        .clauses()
        .iter()
        .filter_map(|c| match c {
            Clause::OrderBy { field, direction } => Some((field.as_str(), *direction)),
            _ => None,
        })
        .collect();

    out.sort_by(|a, b| compare_docs(a, b, &sort).then_with(|| a.id.cmp(&b.id)));

    if let Some(n) = descriptor.limit_count() {
        out.truncate(n);
    }
    out
}

fn compare_docs(a: &Document, b: &Document, sort: &[(&str, SortDirection)]) -> Ordering {
    for (field, direction) in sort {
        let ord = match (field_of(a, field), field_of(b, field)) {
            (Some(x), Some(y)) => compare_values(&x, &y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
        }
    }
    Ordering::Equal
}

/// `id` resolves to the document id unless the document stores its own.
fn field_of<'a>(doc: &'a Document, field: &str) -> Option<Cow<'a, Value>> {
    match doc.get(field) {
        Some(v) => Some(Cow::Borrowed(v)),
        None if field == "id" => Some(Cow::Owned(Value::String(doc.id.clone()))),
        None => None,
    }
}

pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
