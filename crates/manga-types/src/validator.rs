use std::{
    collections::{BTreeMap, HashSet},
    hash::Hash,
};

use serde::Serialize;

/// Collects field level validation failures for one request.
///
/// Checks never short circuit, so all violations are reported together.
/// Only the first message recorded for a field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn into_errors(self) -> BTreeMap<String, String> {
        self.errors
    }
}

impl From<garde::Report> for Validator {
    fn from(report: garde::Report) -> Self {
        let mut v = Validator::new();
        for (path, error) in report.iter() {
            let field = path.to_string();
            let field = if field.is_empty() {
                "value".to_string()
            } else {
                field
            };
            v.add_error(field, error.message());
        }
        v
    }
}

pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}

#[cfg(test)]
mod tests {
    use garde::Validate;

    use super::*;

    #[test]
    fn test_first_message_wins() {
        let mut v = Validator::new();
        assert!(v.valid());

        v.check(true, "title", "must be provided");
        assert!(v.valid());

        v.check(false, "title", "must be provided");
        v.check(false, "title", "must not be more than 500 bytes long");
        v.check(false, "year", "must be provided");

        assert!(!v.valid());
        assert_eq!(2, v.errors().len());
        assert_eq!("must be provided", v.errors()["title"]);
        assert_eq!("must be provided", v.errors()["year"]);
    }

    #[test]
    fn test_serializes_as_map() {
        let mut v = Validator::new();
        v.add_error("page", "must be greater than zero");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(
            serde_json::json!({"page": "must be greater than zero"}),
            json
        );
    }

    #[test]
    fn test_helpers() {
        assert!(permitted_value(&"id", &["id", "-id"]));
        assert!(!permitted_value(&"ID", &["id", "-id"]));

        assert!(unique::<String>(&[]));
        assert!(unique(&["a", "b"]));
        assert!(!unique(&["a", "b", "a"]));
    }

    #[derive(Validate)]
    struct Signup {
        #[garde(email)]
        email: String,
        #[garde(length(min = 8))]
        password: String,
    }

    #[test]
    fn test_from_garde_report() {
        let signup = Signup {
            email: "nobody".into(),
            password: "short".into(),
        };
        let report = signup.validate().unwrap_err();
        let v = Validator::from(report);
        assert!(!v.valid());
        assert!(v.errors().contains_key("email"));
        assert!(v.errors().contains_key("password"));
    }
}
