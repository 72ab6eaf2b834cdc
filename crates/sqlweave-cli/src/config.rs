use serde::Deserialize;
use sqlweave::BuilderConfig;
use std::path::Path;

/// Contents of a `sqlweave.toml` file.
///
/// ```toml
/// [builder]
/// dialect = "postgresql"
/// varchar_length = 255
/// log_sql = true
/// ```
///
/// String values may reference environment variables as `${NAME}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub builder: BuilderConfig,
}

impl ConfigFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
        Self::parse(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut table: toml::Table = toml::from_str(raw)?;
        for (_, value) in table.iter_mut() {
            expand_env(value)?;
        }
        Ok(toml::Value::Table(table).try_into()?)
    }
}

fn expand_env(value: &mut toml::Value) -> anyhow::Result<()> {
    match value {
        toml::Value::String(s) => *s = expand_env_vars(s)?,
        toml::Value::Array(items) => {
            for item in items {
                expand_env(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                expand_env(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlweave::Dialect;

    #[test]
    fn parse_builder_table() {
        let cfg = ConfigFile::parse(
            r#"
[builder]
dialect = "mysql"
varchar_length = 64
allow_full_mutation = true
"#,
        )
        .unwrap();
        assert_eq!(cfg.builder.dialect, Dialect::Mysql);
        assert_eq!(cfg.builder.varchar_length, 64);
        assert!(cfg.builder.allow_full_mutation);
        assert!(!cfg.builder.log_sql);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = ConfigFile::parse("").unwrap();
        assert_eq!(cfg.builder.dialect, Dialect::Postgres);
        assert_eq!(cfg.builder.max_sql_log_length, Some(200));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(ConfigFile::parse("[builder]\ndialekt = \"mysql\"").is_err());
        assert!(ConfigFile::parse("[database]\nurl = \"x\"").is_err());
    }

    #[test]
    fn env_expansion() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("SQLWEAVE_TEST_DIALECT", "oracle") };
        let cfg = ConfigFile::parse("[builder]\ndialect = \"${SQLWEAVE_TEST_DIALECT}\"").unwrap();
        assert_eq!(cfg.builder.dialect, Dialect::Oracle);

        assert!(expand_env_vars("${").is_err());
        assert!(expand_env_vars("${}").is_err());
        assert!(expand_env_vars("${SQLWEAVE_TEST_UNSET_VAR}").is_err());
        assert_eq!(expand_env_vars("plain").unwrap(), "plain");
    }
}
