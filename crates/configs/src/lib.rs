//! TOML configuration for the auction engine.

use {
    anyhow::anyhow,
    serde::{Deserialize, Serialize},
    std::path::Path,
};

pub mod auction;

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    /// Timing parameters shared by all auctions.
    #[serde(default)]
    pub auction: auction::Params,
}

impl Configuration {
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        match toml::from_str(&std::fs::read_to_string(&path)?) {
            Ok(self_) => Ok(self_),
            Err(err) if std::env::var("TOML_TRACE_ERROR").is_ok_and(|v| v == "1") => Err(anyhow!(
                "failed to parse TOML config at {}: {err:#?}",
                path.as_ref().display()
            )),
            Err(_) => Err(anyhow!(
                "failed to parse TOML config at: {}. Set TOML_TRACE_ERROR=1 to print parsing \
                 error.",
                path.as_ref().display()
            )),
        }
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        Ok(std::fs::write(path, toml::to_string_pretty(self)?)?)
    }

    pub fn validate(self) -> anyhow::Result<Self> {
        self.auction.validate()?;
        Ok(self)
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Configuration {
    pub fn to_temp_path(&self) -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().expect("temp file creation should not fail");
        file.write_all(
            toml::to_string_pretty(self)
                .expect("serialization should not fail")
                .as_bytes(),
        )
        .expect("writing to temp file should not fail");
        file
    }
}
