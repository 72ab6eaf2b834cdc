//! Safe SQL identifier handling.
//!
//! [`Ident`] is a single table/column name that has passed validation against
//! `[A-Za-z0-9_]+`. Dotted (`schema.table`) and pre-quoted names are rejected
//! outright: every identifier is quoted by the target dialect at render time,
//! so accepting multi-part or quoted input would let callers smuggle quote
//! characters into the SQL text.
//!
//! # Example
//! ```
//! use sqlweave::{Dialect, Ident};
//!
//! let t = Ident::parse("users")?;
//! assert_eq!(t.quoted(Dialect::Mysql), "`users`");
//! assert!(Ident::parse("public.users").is_err());
//! # Ok::<(), sqlweave::WeaveError>(())
//! ```

use crate::dialect::Dialect;
use crate::error::{WeaveError, WeaveResult};
use std::fmt;

/// A validated SQL identifier (table or column name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    /// Validate a name, failing with [`WeaveError::InvalidIdentifier`].
    pub fn parse(name: &str) -> WeaveResult<Self> {
        if is_valid(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(WeaveError::InvalidIdentifier(name.to_string()))
        }
    }

    /// The bare name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the identifier wrapped in the dialect's quote character.
    pub fn quoted(&self, dialect: Dialect) -> String {
        let q = dialect.quote_char();
        let mut out = String::with_capacity(self.0.len() + 2);
        out.push(q);
        out.push_str(&self.0);
        out.push(q);
        out
    }
}

/// Returns `true` if `name` is non-empty and made only of ASCII letters, digits
/// and underscores.
pub fn is_valid(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b == b'_' || b.is_ascii_alphanumeric())
}

/// Validate every name in a list, failing on the first invalid one.
pub fn parse_all<I, S>(names: I) -> WeaveResult<Vec<Ident>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|n| Ident::parse(n.as_ref())).collect()
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> WeaveResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> WeaveResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> WeaveResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> WeaveResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> WeaveResult<Ident> {
        if is_valid(&self) {
            Ok(Ident(self))
        } else {
            Err(WeaveError::InvalidIdentifier(self))
        }
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> WeaveResult<Ident> {
        Ident::parse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        let ident = Ident::parse("users").unwrap();
        assert_eq!(ident.as_str(), "users");
    }

    #[test]
    fn ident_allows_leading_digit_and_underscore() {
        assert!(Ident::parse("1st_place").is_ok());
        assert!(Ident::parse("_hidden").is_ok());
    }

    #[test]
    fn ident_quoted_per_dialect() {
        let ident = Ident::parse("order_id").unwrap();
        assert_eq!(ident.quoted(Dialect::Postgres), r#""order_id""#);
        assert_eq!(ident.quoted(Dialect::Mysql), "`order_id`");
        assert_eq!(ident.quoted(Dialect::Oracle), r#""order_id""#);
    }

    #[test]
    fn ident_rejects_empty() {
        assert!(Ident::parse("").is_err());
    }

    #[test]
    fn ident_rejects_dotted() {
        assert!(Ident::parse("public.users").is_err());
    }

    #[test]
    fn ident_rejects_space() {
        assert!(Ident::parse("my table").is_err());
        assert!(Ident::parse("tab\tname").is_err());
    }

    #[test]
    fn ident_rejects_injection() {
        assert!(Ident::parse("users; drop table users; --").is_err());
        assert!(Ident::parse("a'b").is_err());
        assert!(Ident::parse(r#""quoted""#).is_err());
        assert!(Ident::parse("back`tick").is_err());
    }

    #[test]
    fn ident_rejects_non_ascii() {
        assert!(Ident::parse("naïve").is_err());
    }

    #[test]
    fn parse_all_stops_on_first_bad_name() {
        let err = parse_all(["a", "b c", "d;"]).unwrap_err();
        assert!(matches!(err, WeaveError::InvalidIdentifier(ref s) if s == "b c"));
    }

    #[test]
    fn into_ident_for_owned_string() {
        let ident = String::from("email").into_ident().unwrap();
        assert_eq!(ident.to_string(), "email");
        assert!(String::from("e mail").into_ident().is_err());
    }
}
