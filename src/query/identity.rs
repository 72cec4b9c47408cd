//! Content-derived identity for live queries.

use super::descriptor::{Clause, FieldValue, QueryDescriptor};
use crate::error::{BindingError, Result};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identity of a `(collection, descriptor)` pair.
///
/// Built from the canonical encoding of the descriptor's clauses, never from
/// where the descriptor lives in memory, so a freshly built descriptor with
/// the same content compares equal to the previous one. Comparison is exact
/// over the encoded bytes; no hash stands in for equality.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryIdentity {
    collection: String,
    canonical: Vec<u8>,
}

impl QueryIdentity {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Canonical MessagePack encoding of the clause sequence.
    pub fn canonical_bytes(&self) -> &[u8] {
        &self.canonical
    }

    /// Short digest for log fields. Not used for comparison.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.collection.as_bytes());
        hasher.update([0u8]);
        hasher.update(&self.canonical);
        let digest = hasher.finalize();
        hex::encode(&digest[..6])
    }
}

impl fmt::Debug for QueryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryIdentity({}#{})", self.collection, self.fingerprint())
    }
}

impl fmt::Display for QueryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.collection, self.fingerprint())
    }
}

/// Resolve the identity of a live query.
///
/// Pure: equal inputs by content always give equal identities, and
/// content-distinct inputs always give distinct ones. Malformed input fails
/// with [`BindingError::InvalidDescriptor`] before anything is subscribed.
pub fn resolve(collection: &str, descriptor: &QueryDescriptor) -> Result<QueryIdentity> {
    validate_collection(collection)?;
    descriptor.validate()?;

    let clauses: Vec<Clause> = descriptor.clauses().iter().map(canonical_clause).collect();
    let canonical = rmp_serde::to_vec(&clauses)?;

    Ok(QueryIdentity {
        collection: collection.to_string(),
        canonical,
    })
}

/// Clause in the form used for encoding, with `-0.0` written as `0.0`.
fn canonical_clause(clause: &Clause) -> Clause {
    match clause {
        Clause::Equals {
            field,
            value: FieldValue::Float(x),
        } if *x == 0.0 => Clause::Equals {
            field: field.clone(),
            value: FieldValue::Float(0.0),
        },
        other => other.clone(),
    }
}

pub(crate) fn validate_collection(collection: &str) -> Result<()> {
    if collection.trim().is_empty() {
        return Err(BindingError::invalid("collection name must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::descriptor::{equals, limit, order_by, SortDirection};

    fn listings_by(category: &str) -> QueryDescriptor {
        QueryDescriptor::new()
            .equals("category", category)
            .order_by("createdAt", SortDirection::Desc)
    }

    #[test]
    fn test_rebuilt_descriptor_same_identity() {
        let a = resolve("listings", &listings_by("jobs")).unwrap();
        let b = resolve("listings", &listings_by("jobs")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_content_change_changes_identity() {
        let jobs = resolve("listings", &listings_by("jobs")).unwrap();
        let rentals = resolve("listings", &listings_by("rentals")).unwrap();
        let other_collection = resolve("drafts", &listings_by("jobs")).unwrap();
        assert_ne!(jobs, rentals);
        assert_ne!(jobs, other_collection);
    }

    #[test]
    fn test_signed_zero_same_identity() {
        let positive: QueryDescriptor = vec![equals("price", 0.0)].into();
        let negative: QueryDescriptor = vec![equals("price", -0.0)].into();
        assert_eq!(positive, negative);
        assert_eq!(
            resolve("listings", &positive).unwrap(),
            resolve("listings", &negative).unwrap()
        );
    }

    #[test]
    fn test_clause_order_is_significant() {
        let a: QueryDescriptor = vec![order_by("price", SortDirection::Asc), limit(5)].into();
        let b: QueryDescriptor = vec![limit(5), order_by("price", SortDirection::Asc)].into();
        assert_ne!(resolve("listings", &a).unwrap(), resolve("listings", &b).unwrap());
    }

    #[test]
    fn test_value_types_are_distinct() {
        let as_string: QueryDescriptor = vec![equals("floor", "1")].into();
        let as_int: QueryDescriptor = vec![equals("floor", 1)].into();
        let as_float: QueryDescriptor = vec![equals("floor", 1.0)].into();
        let ids = [
            resolve("flats", &as_string).unwrap(),
            resolve("flats", &as_int).unwrap(),
            resolve("flats", &as_float).unwrap(),
        ];
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
    }

    #[test]
    fn test_collection_name_not_merged_into_clauses() {
        // "ab" + [] must not collide with "a" + something that encodes as "b"
        let a = resolve("ab", &QueryDescriptor::new()).unwrap();
        let b = resolve("a", &QueryDescriptor::new()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_collection_rejected() {
        let err = resolve("  ", &QueryDescriptor::new()).unwrap_err();
        assert!(matches!(err, BindingError::InvalidDescriptor(_)));
    }
}
