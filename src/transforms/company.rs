//! Foreign-key association of users with companies.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::record::{as_integer, fields, Record, RecordError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// What to do with a user whose `company_id` matches no company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Drop the user from the output.
    #[default]
    Exclude,
    /// Keep the user unchanged, `company_id` included.
    Keep,
}

/// Lookup from company `id` to the company record.
///
/// When ids repeat, the later record wins.
#[derive(Debug, Clone, Default)]
pub struct CompanyIndex {
    companies: HashMap<i64, Record>,
}

impl CompanyIndex {
    /// Index a company collection by `id`.
    ///
    /// # Errors
    /// `MissingField` for a company without `id`, `InvalidFieldValue` when
    /// the id is not an integer. Integral floats such as `3.0` are accepted.
    pub fn build(companies: &[Record]) -> Result<Self, RecordError> {
        let mut index = HashMap::with_capacity(companies.len());

        for company in companies {
            let id = company.require_i64(fields::ID)?;
            if index.insert(id, company.clone()).is_some() {
                tracing::debug!(id, "Duplicate company id, keeping the later record");
            }
        }

        Ok(Self { companies: index })
    }

    pub fn get(&self, id: i64) -> Option<&Record> {
        self.companies.get(&id)
    }

    /// Resolve a raw `company_id` value. Integral floats match the same id
    /// as the integer; any other non-integer value never resolves.
    pub fn resolve(&self, company_id: &Value) -> Option<&Record> {
        as_integer(company_id).and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

/// Replaces each user's `company_id` with the full `company` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyAssociator {
    unmatched: UnmatchedPolicy,
}

impl CompanyAssociator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unmatched_policy(unmatched: UnmatchedPolicy) -> Self {
        Self { unmatched }
    }

    /// Join `users` to `companies` on `company_id` = `id`.
    ///
    /// Unresolved ids are reported to `sink`, one diagnostic per user, and
    /// handled according to the [`UnmatchedPolicy`]. Output keeps input order.
    ///
    /// # Errors
    /// `MissingField` when a user has no `company_id` at all, which includes
    /// users that were already associated.
    pub fn associate(
        &self,
        users: &[Record],
        companies: &[Record],
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Vec<Record>, RecordError> {
        let index = CompanyIndex::build(companies)?;
        let mut associated = Vec::with_capacity(users.len());

        for user in users {
            let company_id = user.require(fields::COMPANY_ID)?;

            match index.resolve(company_id) {
                Some(company) => {
                    let mut joined = user.without_field(fields::COMPANY_ID);
                    joined.insert(fields::COMPANY, company.clone().into_value());
                    associated.push(joined);
                }
                None => {
                    sink.report(Diagnostic::unknown_company(user, company_id));
                    if self.unmatched == UnmatchedPolicy::Keep {
                        associated.push(user.clone());
                    }
                }
            }
        }

        tracing::debug!(
            users = users.len(),
            companies = index.len(),
            associated = associated.len(),
            "Associated users with companies"
        );
        Ok(associated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticCollector, DiagnosticKind};
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn companies() -> Vec<Record> {
        vec![
            record(json!({"id": 1, "name": "Head Journal", "headquarters": "San Francisco", "industry": "Tech"})),
            record(json!({"id": 2, "name": "Au Revoir Health", "headquarters": "Paris", "industry": "Health"})),
            record(json!({"id": 3, "name": "Solomon Sisters Bank", "headquarters": "London", "industry": "Finance"})),
        ]
    }

    fn user(forename: &str, company_id: Value) -> Record {
        record(json!({
            "forename": forename,
            "surname": "Smith",
            "date_of_birth": "2000/12/30",
            "location": "London",
            "company_id": company_id
        }))
    }

    #[test]
    fn test_associate_replaces_company_id() {
        let users = vec![user("Bob", json!(3))];
        let mut sink = DiagnosticCollector::new();

        let result = CompanyAssociator::new()
            .associate(&users, &companies(), &mut sink)
            .unwrap();

        let expected = record(json!({
            "forename": "Bob",
            "surname": "Smith",
            "date_of_birth": "2000/12/30",
            "location": "London",
            "company": {
                "id": 3,
                "name": "Solomon Sisters Bank",
                "headquarters": "London",
                "industry": "Finance"
            }
        }));
        assert_eq!(result, vec![expected]);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_associate_excludes_unmatched_with_one_warning_each() {
        let users = vec![
            user("Ann", json!(1)),
            user("Ben", json!(42)),
            user("Cat", json!(2)),
            user("Dan", json!("3")),
        ];
        let mut sink = DiagnosticCollector::new();

        let result = CompanyAssociator::new()
            .associate(&users, &companies(), &mut sink)
            .unwrap();

        assert_eq!(result.len(), 2);
        for (joined, original) in result.iter().zip([&users[0], &users[2]]) {
            assert!(!joined.contains("company_id"));
            assert_eq!(
                joined.get("company").and_then(|c| c.get("id")),
                original.get("company_id")
            );
        }
        assert_eq!(sink.count(DiagnosticKind::UnknownCompany), 2);
        assert_eq!(sink.diagnostics()[0].message, "User Ben Smith has unrecognized company id: 42.");
        assert_eq!(sink.diagnostics()[1].message, "User Dan Smith has unrecognized company id: \"3\".");
    }

    #[test]
    fn test_keep_policy_passes_unmatched_through() {
        let users = vec![user("Ben", json!(42)), user("Bob", json!(3))];
        let mut sink = DiagnosticCollector::new();

        let result = CompanyAssociator::with_unmatched_policy(UnmatchedPolicy::Keep)
            .associate(&users, &companies(), &mut sink)
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0], users[0]);
        assert!(result[1].contains("company"));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_associate_is_not_idempotent() {
        let users = vec![user("Bob", json!(3))];
        let mut sink = DiagnosticCollector::new();
        let associator = CompanyAssociator::new();

        let once = associator.associate(&users, &companies(), &mut sink).unwrap();
        let err = associator.associate(&once, &companies(), &mut sink).unwrap_err();

        assert!(matches!(err, RecordError::MissingField { ref field, .. } if field == "company_id"));
    }

    #[test]
    fn test_duplicate_company_ids_last_wins() {
        let mut list = companies();
        list.push(record(json!({"id": 3, "name": "Solomon Brothers"})));

        let index = CompanyIndex::build(&list).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.get(3).unwrap().get("name"), Some(&json!("Solomon Brothers")));
    }

    #[test]
    fn test_company_without_id_is_fatal() {
        let list = vec![record(json!({"name": "Nameless Ltd"}))];
        let err = CompanyIndex::build(&list).unwrap_err();
        assert!(matches!(err, RecordError::MissingField { ref record, .. } if record == "Nameless Ltd"));
    }

    #[test]
    fn test_resolve_only_integers() {
        let index = CompanyIndex::build(&companies()).unwrap();
        assert!(index.resolve(&json!(2)).is_some());
        assert!(index.resolve(&json!(2.0)).is_some());
        assert!(index.resolve(&json!(2.5)).is_none());
        assert!(index.resolve(&json!("2")).is_none());
        assert!(index.resolve(&Value::Null).is_none());
    }

    #[test]
    fn test_integral_float_ids_match_on_both_sides() {
        let list = vec![
            record(json!({"id": 1, "name": "Head Journal"})),
            record(json!({"id": 3.0, "name": "Solomon Sisters Bank"})),
        ];
        let users = vec![user("Bob", json!(3)), user("Ann", json!(1.0)), user("Ben", json!(1.5))];
        let mut sink = DiagnosticCollector::new();

        let result = CompanyAssociator::new().associate(&users, &list, &mut sink).unwrap();

        let names: Vec<_> = result
            .iter()
            .map(|r| r.get("company").and_then(|c| c.get("name")).cloned())
            .collect();
        assert_eq!(
            names,
            vec![Some(json!("Solomon Sisters Bank")), Some(json!("Head Journal"))]
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.diagnostics()[0].message, "User Ben Smith has unrecognized company id: 1.5.");
    }

    #[test]
    fn test_fractional_company_id_is_fatal() {
        let list = vec![record(json!({"id": 2.5, "name": "Half Ltd"}))];
        let err = CompanyIndex::build(&list).unwrap_err();
        assert!(matches!(err, RecordError::InvalidFieldValue { expected: "integer", .. }));
    }
}
