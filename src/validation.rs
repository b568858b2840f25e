use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Schema check run on a request body before it reaches the store.
pub trait Validate {
    fn validate(&self) -> Result<(), Violations>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every rule a payload broke, in the order the rules ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self(vec![Violation::new(field, message)])
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(Violation::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Present and not blank.
    pub fn required(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if value.is_none_or(|v| v.trim().is_empty()) {
            self.push(field, format!("{field} is required"));
        }
        self
    }

    pub fn max_length(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(value) = value {
            if value.chars().count() > max {
                self.push(field, format!("{field} must be at most {max} characters"));
            }
        }
        self
    }

    pub fn range_i32(&mut self, field: &str, value: Option<i32>, min: i32, max: i32) -> &mut Self {
        if let Some(value) = value {
            if !(min..=max).contains(&value) {
                self.push(field, format!("{field} must be between {min} and {max}"));
            }
        }
        self
    }

    pub fn range_f64(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) -> &mut Self {
        if let Some(value) = value {
            if !value.is_finite() || value < min || value > max {
                self.push(field, format!("{field} must be between {min} and {max}"));
            }
        }
        self
    }

    /// Only checked when present; pair with `required` for mandatory ISBNs.
    pub fn isbn(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        static RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^[0-9][0-9-]{8,15}[0-9Xx]$").expect("ISBN pattern is valid"));

        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            if !RE.is_match(value) {
                self.push(
                    field,
                    format!("{field} must be 10 to 17 digits or hyphens, optionally ending in X"),
                );
            }
        }
        self
    }
}

impl std::fmt::Display for Violations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_violation() {
        let mut violations = Violations::new();
        violations
            .required("title", None)
            .required("isbn", Some("   "))
            .max_length("summary", Some("abcdef"), 5)
            .range_i32("year", Some(0), 1, 9999)
            .range_f64("price", Some(f64::NAN), 0.0, 10.0);

        let fields: Vec<_> = violations.as_slice().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["title", "isbn", "summary", "year", "price"]);
        assert!(violations.into_result().is_err());
    }

    #[test]
    fn absent_optional_values_pass() {
        let mut violations = Violations::new();
        violations
            .max_length("bio", None, 10)
            .range_i32("year", None, 1, 9999)
            .range_f64("price", None, 0.0, 10.0)
            .isbn("isbn", None);

        assert_eq!(violations.into_result(), Ok(()));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut violations = Violations::new();
        violations.max_length("lastName", Some("Čapek"), 5);
        assert!(violations.is_empty());
    }

    #[test]
    fn isbn_shapes() {
        for good in ["0441013597", "978-0441013593", "0-8044-2957-X"] {
            let mut violations = Violations::new();
            violations.isbn("isbn", Some(good));
            assert!(violations.is_empty(), "{good} should be accepted");
        }
        for bad in ["123", "978_0441013593", "X441013597", "978-0441013593-0000"] {
            let mut violations = Violations::new();
            violations.isbn("isbn", Some(bad));
            assert!(!violations.is_empty(), "{bad} should be rejected");
        }
    }

    #[test]
    fn display_joins_messages() {
        let mut violations = Violations::single("title", "title is required");
        violations.push("isbn", "isbn is required");
        assert_eq!(
            violations.to_string(),
            "title: title is required; isbn: isbn is required"
        );
    }
}
