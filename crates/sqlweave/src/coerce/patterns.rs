//! Regex tables used to recognise semantic types in text samples.

use crate::dialect::SemanticType;
use regex::Regex;
use std::sync::OnceLock;

/// Candidate types in priority order, each with the patterns that recognise it.
///
/// A column matches a type when every sampled value matches at least one of
/// that type's patterns; the first matching type wins.
const TABLE: &[(SemanticType, &[&str])] = &[
    (
        SemanticType::EpochTime,
        &[r"^\d{10}(\.\d+)?$", r"^\d{13}$", r"^\d{16}$"],
    ),
    (
        SemanticType::Date,
        &[
            r"^\d{4}-\d{2}-\d{2}$",
            r"^\d{2}/\d{2}/\d{4}$",
            r"^\d{2}-\d{2}-\d{4}$",
            r"^\d{1,2}-\w{3}-\d{4}$",
            r"^\w{3}\s+\d{1,2},?\s+\d{4}$",
        ],
    ),
    (
        SemanticType::Time,
        &[
            r"^\d{1,2}:\d{2}(:\d{2})?(\s*[AP]M)?$",
            r"^\d{2}:\d{2}:\d{2}\.\d{3}$",
        ],
    ),
    (
        SemanticType::Timestamp,
        &[
            r"^\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}(\.\d+)?$",
            r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z?$",
        ],
    ),
    (SemanticType::Integer, &[r"^-?\d+$"]),
    (
        SemanticType::Float,
        &[r"^-?\d*\.\d+$", r"^-?\d+\.?\d*[eE][+-]?\d+$"],
    ),
    (SemanticType::Boolean, &[r"(?i)^(true|false|yes|no|y|n|0|1)$"]),
    (
        SemanticType::Uuid,
        &[r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"],
    ),
    (
        SemanticType::Email,
        &[r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"],
    ),
    (SemanticType::Url, &[r"^https?://[^\s]+$"]),
    (SemanticType::Json, &[r"^\{.*\}$", r"^\[.*\]$"]),
];

type Compiled = Vec<(SemanticType, Vec<Regex>)>;

fn compiled() -> &'static Compiled {
    static PATTERNS: OnceLock<Compiled> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        TABLE
            .iter()
            .map(|(ty, pats)| {
                let res = pats
                    .iter()
                    .map(|p| Regex::new(p).expect("invalid built-in inference regex"))
                    .collect();
                (*ty, res)
            })
            .collect()
    })
}

/// Types whose regex is only a shape check and must also parse.
fn confirm(ty: SemanticType, value: &str) -> bool {
    match ty {
        SemanticType::Uuid => uuid::Uuid::parse_str(value).is_ok(),
        SemanticType::Url => url::Url::parse(value).is_ok(),
        _ => true,
    }
}

fn covers(ty: SemanticType, res: &[Regex], value: &str) -> bool {
    res.iter().any(|re| re.is_match(value)) && confirm(ty, value)
}

/// Whether `value` is recognised as `ty`.
pub fn matches(ty: SemanticType, value: &str) -> bool {
    compiled()
        .iter()
        .find(|(t, _)| *t == ty)
        .is_some_and(|(t, res)| covers(*t, res, value))
}

/// First type in priority order whose patterns cover every sample.
///
/// Returns `None` for an empty sample or when no type covers it.
pub fn classify<'a, I>(samples: I) -> Option<SemanticType>
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: Clone,
{
    let samples = samples.into_iter();
    if samples.clone().next().is_none() {
        return None;
    }
    compiled().iter().find_map(|(ty, res)| {
        samples
            .clone()
            .all(|v| covers(*ty, res, v))
            .then_some(*ty)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order() {
        assert_eq!(classify(["1700000000"]), Some(SemanticType::EpochTime));
        assert_eq!(classify(["2021-01-01", "06/15/2021"]), Some(SemanticType::Date));
        assert_eq!(classify(["9:30 PM", "12:00:01"]), Some(SemanticType::Time));
        assert_eq!(
            classify(["2021-01-01 10:00:00", "2021-01-01T10:00:00.5Z"]),
            Some(SemanticType::Timestamp)
        );
        assert_eq!(classify(["1", "2", "3"]), Some(SemanticType::Integer));
        assert_eq!(classify(["1.5", "-2e3"]), Some(SemanticType::Float));
        assert_eq!(classify(["true", "no", "1"]), Some(SemanticType::Boolean));
        assert_eq!(classify(["https://x.io/a"]), Some(SemanticType::Url));
        assert_eq!(classify(["{\"a\": 1}", "[1]"]), Some(SemanticType::Json));
        assert_eq!(classify(["hello", "1"]), None);
        assert_eq!(classify(std::iter::empty()), None);
    }

    #[test]
    fn single_type_match() {
        assert!(matches(SemanticType::Uuid, "67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert!(matches(SemanticType::Email, "a.b@example.org"));
        assert!(!matches(SemanticType::Email, "a@b"));
        assert!(!matches(SemanticType::Url, "http://[::1"));
        assert!(!matches(SemanticType::String, "anything"));
    }
}
