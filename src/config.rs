// src/config.rs

use crate::error::{Result, WorksheetError};
use std::env;
use tracing::warn;

pub const DEFAULT_PAGE_SIZE: usize = 1000;

pub const ENV_PAGE_SIZE: &str = "WORKSHEET_PAGE_SIZE";
pub const ENV_CHECK_SIZE: &str = "WORKSHEET_CHECK_SIZE";

/// Knobs shared by the read entry points and the encoding check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Records per page for paged reads.
    pub page_size: usize,
    /// Bytes to validate when checking encoding; 0 scans the whole stream.
    pub check_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            check_size: 0,
        }
    }
}

impl ReaderConfig {
    /// Defaults overlaid with `WORKSHEET_PAGE_SIZE` / `WORKSHEET_CHECK_SIZE`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(v) = env_usize(ENV_PAGE_SIZE) {
            cfg.page_size = v;
        }
        if let Some(v) = env_usize(ENV_CHECK_SIZE) {
            cfg.check_size = v;
        }
        cfg.validate()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_check_size(mut self, check_size: usize) -> Self {
        self.check_size = check_size;
        self
    }

    pub fn validate(self) -> Result<Self> {
        if self.page_size == 0 {
            return Err(WorksheetError::InvalidPageSize(self.page_size));
        }
        Ok(self)
    }
}

fn env_usize(name: &str) -> Option<usize> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(name, value = %raw, error = %e, "ignoring unparseable setting");
            None
        }
    }
}
