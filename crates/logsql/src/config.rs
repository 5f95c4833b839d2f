use crate::error::{Error, Result};
use crate::loader::{Delimiter, HeaderMode};
use std::path::PathBuf;

/// Validated startup settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    /// Explicit separator; `None` means the default for the file's header mode.
    pub delimiter: Option<Delimiter>,
    pub max_width: Option<u16>,
}

impl Config {
    pub fn new(path: PathBuf, sep: Option<&str>, max_width: Option<u16>) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path));
        }

        let delimiter = sep.map(Delimiter::parse).transpose()?;

        Ok(Self {
            path,
            delimiter,
            max_width,
        })
    }

    pub fn header_mode(&self) -> HeaderMode {
        HeaderMode::for_path(&self.path)
    }

    /// The delimiter the file will be loaded with.
    pub fn effective_delimiter(&self) -> Delimiter {
        self.delimiter
            .clone()
            .unwrap_or_else(|| Delimiter::default_for(self.header_mode()))
    }
}
