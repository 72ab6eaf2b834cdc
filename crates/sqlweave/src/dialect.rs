//! Dialect profiles.
//!
//! Every grammar difference the engine knows about is a typed method on
//! [`Dialect`], backed by one static [`DialectProfile`] per variant. Adding a
//! dialect means adding a variant; every `match` below then fails to compile
//! until the new dialect is handled.

use crate::error::{WeaveError, WeaveResult};
use std::fmt;
use std::str::FromStr;

/// A supported SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Oracle,
    Mssql,
    Mysql,
    Postgres,
    Sqlite,
}

/// How a dialect's driver expects parameters to be marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `:name` (named mapping)
    NamedColon,
    /// `@name` (named mapping)
    NamedAt,
    /// `%(name)s` (named mapping)
    NamedPercent,
    /// `?` (positional sequence)
    Positional,
}

impl PlaceholderStyle {
    /// Whether the driver binds by name (mapping) rather than by position.
    pub fn is_named(self) -> bool {
        !matches!(self, Self::Positional)
    }
}

/// How `LIMIT`/`OFFSET` windows are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// `OFFSET n [LIMIT m]`
    OffsetLimit,
    /// `OFFSET n ROWS [FETCH NEXT m ROWS ONLY]`
    OffsetFetch,
    /// `[LIMIT m] [OFFSET n]`
    LimitOffset,
}

/// Which insert-or-update construct the dialect offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStrategy {
    /// `INSERT ... ON CONFLICT (...) DO UPDATE SET col = EXCLUDED.col`
    OnConflict,
    /// `INSERT ... ON DUPLICATE KEY UPDATE col = VALUES(col)`
    OnDuplicateKey,
    /// `MERGE INTO ... USING (VALUES (...)) ... WHEN MATCHED / NOT MATCHED`
    Merge,
}

/// Semantic column type, as inferred from tabular data or requested for DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    EpochTime,
    Date,
    Time,
    Timestamp,
    Integer,
    Float,
    Boolean,
    Uuid,
    Email,
    Url,
    Json,
    Interval,
    String,
}

impl SemanticType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EpochTime => "epochtime",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Uuid => "uuid",
            Self::Email => "email",
            Self::Url => "url",
            Self::Json => "json",
            Self::Interval => "interval",
            Self::String => "string",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value conversion applied to match a declared SQL base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Text,
    Integer,
    Float32,
    Float64,
    Boolean,
    DateTime { day_first: bool },
    Interval,
}

/// Static per-dialect grammar facts.
#[derive(Debug)]
pub struct DialectProfile {
    pub name: &'static str,
    pub placeholder: PlaceholderStyle,
    pub quote: char,
    pub pagination: Pagination,
    pub upsert: UpsertStrategy,
    /// Whether `CREATE TABLE IF NOT EXISTS` is accepted.
    pub create_if_not_exists: bool,
}

static ORACLE: DialectProfile = DialectProfile {
    name: "oracle",
    placeholder: PlaceholderStyle::NamedColon,
    quote: '"',
    pagination: Pagination::OffsetFetch,
    upsert: UpsertStrategy::Merge,
    create_if_not_exists: false,
};

static MSSQL: DialectProfile = DialectProfile {
    name: "mssql",
    placeholder: PlaceholderStyle::NamedAt,
    quote: '"',
    pagination: Pagination::OffsetFetch,
    upsert: UpsertStrategy::Merge,
    create_if_not_exists: true,
};

static MYSQL: DialectProfile = DialectProfile {
    name: "mysql",
    placeholder: PlaceholderStyle::Positional,
    quote: '`',
    pagination: Pagination::LimitOffset,
    upsert: UpsertStrategy::OnDuplicateKey,
    create_if_not_exists: true,
};

static POSTGRES: DialectProfile = DialectProfile {
    name: "postgresql",
    placeholder: PlaceholderStyle::NamedPercent,
    quote: '"',
    pagination: Pagination::OffsetLimit,
    upsert: UpsertStrategy::OnConflict,
    create_if_not_exists: true,
};

static SQLITE: DialectProfile = DialectProfile {
    name: "sqlite",
    placeholder: PlaceholderStyle::Positional,
    quote: '"',
    pagination: Pagination::OffsetLimit,
    upsert: UpsertStrategy::OnConflict,
    create_if_not_exists: true,
};

impl Dialect {
    /// Every registered dialect.
    pub const ALL: [Dialect; 5] = [
        Dialect::Oracle,
        Dialect::Mssql,
        Dialect::Mysql,
        Dialect::Postgres,
        Dialect::Sqlite,
    ];

    pub fn profile(self) -> &'static DialectProfile {
        match self {
            Self::Oracle => &ORACLE,
            Self::Mssql => &MSSQL,
            Self::Mysql => &MYSQL,
            Self::Postgres => &POSTGRES,
            Self::Sqlite => &SQLITE,
        }
    }

    pub fn name(self) -> &'static str {
        self.profile().name
    }

    pub fn quote_char(self) -> char {
        self.profile().quote
    }

    pub fn placeholder_style(self) -> PlaceholderStyle {
        self.profile().placeholder
    }

    pub fn pagination(self) -> Pagination {
        self.profile().pagination
    }

    pub fn upsert_strategy(self) -> UpsertStrategy {
        self.profile().upsert
    }

    /// Render the driver-native marker for parameter `name`.
    pub fn placeholder(self, name: &str) -> String {
        match self.placeholder_style() {
            PlaceholderStyle::NamedColon => format!(":{name}"),
            PlaceholderStyle::NamedAt => format!("@{name}"),
            PlaceholderStyle::NamedPercent => format!("%({name})s"),
            PlaceholderStyle::Positional => "?".to_string(),
        }
    }

    /// Render the pagination tail (with a leading space), or `""` when neither
    /// bound is set.
    pub fn render_pagination(self, offset: Option<u64>, limit: Option<u64>) -> String {
        if offset.is_none() && limit.is_none() {
            return String::new();
        }
        let off = offset.unwrap_or(0);
        match self.pagination() {
            Pagination::OffsetLimit => match limit {
                Some(lim) => format!(" OFFSET {off} LIMIT {lim}"),
                None => format!(" OFFSET {off}"),
            },
            Pagination::OffsetFetch => match limit {
                Some(lim) => format!(" OFFSET {off} ROWS FETCH NEXT {lim} ROWS ONLY"),
                None => format!(" OFFSET {off} ROWS"),
            },
            Pagination::LimitOffset => {
                let mut out = String::new();
                if let Some(lim) = limit {
                    out.push_str(&format!(" LIMIT {lim}"));
                }
                if off > 0 {
                    out.push_str(&format!(" OFFSET {off}"));
                }
                out
            }
        }
    }

    /// Wrap a placeholder compared against a date/datetime string literal.
    ///
    /// Only Oracle and SQL Server need the hint; other dialects compare the
    /// string directly.
    pub fn wrap_datetime(self, placeholder: &str) -> Option<String> {
        match self {
            Self::Oracle => Some(format!("TO_DATE({placeholder}, 'YYYY-MM-DD HH24:MI:SS')")),
            Self::Mssql => Some(format!("CAST({placeholder} AS DATETIME2)")),
            Self::Mysql | Self::Postgres | Self::Sqlite => None,
        }
    }

    /// Map a semantic type to this dialect's column type.
    pub fn sql_type(self, ty: SemanticType, varchar_length: u32) -> String {
        use SemanticType as T;
        let s = match (self, ty) {
            (Self::Oracle, T::Integer) => "NUMBER",
            (Self::Oracle, T::Float) => "BINARY_DOUBLE",
            (Self::Oracle, T::Boolean) => "NUMBER(1,0)",
            (Self::Oracle, T::Date | T::Time | T::Timestamp | T::EpochTime) => "DATE",
            (Self::Oracle, T::Interval) => "INTERVAL DAY TO SECOND",
            (Self::Oracle, _) => return format!("VARCHAR2({varchar_length})"),

            (Self::Mssql, T::Integer | T::Interval) => "BIGINT",
            (Self::Mssql, T::Float) => "FLOAT",
            (Self::Mssql, T::Boolean) => "BIT",
            (Self::Mssql, T::Date | T::Time | T::Timestamp | T::EpochTime) => "DATETIME",
            (Self::Mssql, _) => return format!("VARCHAR({varchar_length})"),

            (Self::Mysql, T::Integer | T::Interval) => "BIGINT",
            (Self::Mysql, T::Float) => "DOUBLE",
            (Self::Mysql, T::Boolean) => "TINYINT(1)",
            (Self::Mysql, T::Date | T::Time | T::Timestamp | T::EpochTime) => "DATETIME",
            (Self::Mysql, _) => return format!("VARCHAR({varchar_length})"),

            (Self::Postgres, T::Integer) => "BIGINT",
            (Self::Postgres, T::Float) => "DOUBLE PRECISION",
            (Self::Postgres, T::Boolean) => "BOOLEAN",
            (Self::Postgres, T::Date | T::Time | T::Timestamp | T::EpochTime) => "TIMESTAMP",
            (Self::Postgres, T::Interval) => "INTERVAL",
            (Self::Postgres, _) => return format!("VARCHAR({varchar_length})"),

            (Self::Sqlite, T::Integer | T::Boolean | T::Interval) => "INTEGER",
            (Self::Sqlite, T::Float) => "REAL",
            (Self::Sqlite, _) => "TEXT",
        };
        s.to_string()
    }

    /// Look up the coercion for a declared column type such as `VARCHAR(50)`
    /// or `TINYINT(1)`. Unknown base types coerce to text.
    pub fn coercion(self, declared: &str) -> Coercion {
        let declared = declared.trim().to_ascii_uppercase();
        let base = base_type(&declared);
        match (self, base.as_str()) {
            (Self::Oracle, "VARCHAR2") => Coercion::Text,
            (Self::Oracle, "NUMBER") => Coercion::Integer,
            (Self::Oracle, "BINARY_FLOAT") => Coercion::Float32,
            (Self::Oracle, "BINARY_DOUBLE") => Coercion::Float64,
            (Self::Oracle, "DATE") => Coercion::DateTime { day_first: true },
            (Self::Oracle, "INTERVAL DAY TO SECOND") => Coercion::Interval,

            (Self::Mssql, "VARCHAR") => Coercion::Text,
            (Self::Mssql, "BIGINT") => Coercion::Integer,
            (Self::Mssql, "REAL") => Coercion::Float32,
            (Self::Mssql, "FLOAT") => Coercion::Float64,
            (Self::Mssql, "BIT") => Coercion::Boolean,
            (Self::Mssql, "DATETIME") => Coercion::DateTime { day_first: false },

            (Self::Mysql, "VARCHAR") => Coercion::Text,
            (Self::Mysql, "BIGINT") => Coercion::Integer,
            (Self::Mysql, "FLOAT") => Coercion::Float32,
            (Self::Mysql, "DOUBLE") => Coercion::Float64,
            (Self::Mysql, "TINYINT") if declared.contains("(1)") => Coercion::Boolean,
            (Self::Mysql, "TINYINT") => Coercion::Integer,
            (Self::Mysql, "DATETIME") => Coercion::DateTime { day_first: false },

            (Self::Postgres, "VARCHAR" | "TEXT") => Coercion::Text,
            (Self::Postgres, "BIGINT") => Coercion::Integer,
            (Self::Postgres, "REAL") => Coercion::Float32,
            (Self::Postgres, "DOUBLE PRECISION") => Coercion::Float64,
            (Self::Postgres, "BOOLEAN") => Coercion::Boolean,
            (Self::Postgres, "TIMESTAMP") => Coercion::DateTime { day_first: false },
            (Self::Postgres, "INTERVAL") => Coercion::Interval,

            (Self::Sqlite, "TEXT") => Coercion::Text,
            (Self::Sqlite, "INTEGER") => Coercion::Integer,
            (Self::Sqlite, "REAL") => Coercion::Float64,

            _ => Coercion::Text,
        }
    }
}

/// Reduce a declared type to the name its coercion is keyed on.
///
/// Every parenthesized group is removed wherever it appears, whitespace is
/// collapsed, and `WITH[OUT] TIME ZONE` / `WITH LOCAL TIME ZONE` qualifiers are
/// dropped, so `INTERVAL DAY(2) TO SECOND(6)` becomes `INTERVAL DAY TO SECOND`
/// and `timestamp(3) without time zone` becomes `TIMESTAMP`.
pub fn base_type(declared: &str) -> String {
    let mut bare = String::with_capacity(declared.len());
    let mut depth = 0usize;
    for c in declared.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                bare.push(' ');
            }
            _ if depth == 0 => bare.push(c.to_ascii_uppercase()),
            _ => {}
        }
    }
    let words: Vec<&str> = bare.split_whitespace().collect();
    let words = match words.as_slice() {
        [head @ .., "WITH" | "WITHOUT", "TIME", "ZONE"] => head,
        [head @ .., "WITH", "LOCAL", "TIME", "ZONE"] => head,
        all => all,
    };
    words.join(" ")
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oracle" => Ok(Self::Oracle),
            "mssql" => Ok(Self::Mssql),
            "mysql" => Ok(Self::Mysql),
            "postgresql" | "postgres" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(WeaveError::unsupported(format!("unknown dialect {other:?}"))),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Dialect {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl serde::Serialize for Dialect {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

/// Parse a dialect name, failing with [`WeaveError::UnsupportedDialect`].
pub fn parse_dialect(name: &str) -> WeaveResult<Dialect> {
    name.parse()
}
