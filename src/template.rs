//! Loading member tables from configuration sources.
//!
//! A template source is any [`config::Config`] with optional top-level
//! `public` and `private` tables. Every entry becomes a data member of the
//! corresponding table; callables are always attached in code.
//!
//! ```toml
//! [public]
//! name = "anonymous"
//!
//! [private]
//! counter = 0
//! ```

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use tracing::debug;

use crate::construct::{Builder, MemberTable};
use crate::error::{BuilderError, Result};
use crate::value::Value;

/// Prefix of environment variables that override file entries, for example
/// `CLASSBUILDER__PRIVATE__COUNTER=5`.
pub const ENV_PREFIX: &str = "CLASSBUILDER";

/// Layers an optional file with prefixed environment variables.
pub fn from_file(path: &Path) -> Result<Config> {
    let config = Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(config)
}

/// Adds the data members found in `config` to the builder's tables. Entries
/// are inserted in name order and replace members of the same name.
pub fn load_members(config: &Config, builder: &mut Builder) -> Result<()> {
    if let Some(members) = members(config, "public")? {
        extend(builder.public_mut(), members);
    }
    if let Some(members) = members(config, "private")? {
        extend(builder.private_mut(), members);
    }
    Ok(())
}

impl Builder {
    pub fn from_config(config: &Config) -> Result<Builder> {
        let mut builder = Builder::new();
        load_members(config, &mut builder)?;
        Ok(builder)
    }
}

fn extend(table: &mut MemberTable, members: Vec<(String, Value)>) {
    for (name, value) in members {
        table.insert(name, value);
    }
}

fn members(config: &Config, key: &str) -> Result<Option<Vec<(String, Value)>>> {
    let table = match config.get_table(key) {
        Ok(table) => table,
        Err(ConfigError::NotFound(_)) => return Ok(None),
        Err(e) => {
            return Err(BuilderError::Config(format!(
                "`{}` must be a table of members: {}",
                key, e
            )));
        }
    };
    let mut members = Vec::with_capacity(table.len());
    for (name, value) in table {
        let json: serde_json::Value = value.try_deserialize()?;
        members.push((name, Value::from(json)));
    }
    members.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(table = key, members = members.len(), "loaded members");
    Ok(Some(members))
}
