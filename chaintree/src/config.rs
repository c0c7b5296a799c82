use crate::error::{Error, Result};

#[derive(Debug, Clone)]
/// Configuration for loading and querying tree tables
pub struct Config {
    /// log load progress every this many records
    pub progress_interval: u64,
    /// rows per page when dumping a table
    pub page_size: usize,
    /// resolve the root path of every node after a load and report broken ones.
    ///
    /// Off by default, dangling and cyclic parent links are then only found at query time.
    pub validate_on_load: bool,
    /// upper bound on the length of a resolved chain
    pub max_chain_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            progress_interval: 5000,
            page_size: 20,
            validate_on_load: false,
            max_chain_depth: 1 << 16,
        }
    }
}

impl Config {
    /// config with eager validation and chatty progress, for tests
    pub fn debug() -> Self {
        Self {
            progress_interval: 1,
            page_size: 4,
            validate_on_load: true,
            max_chain_depth: 1024,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(Error::InvalidConfig("progress_interval must be > 0"));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidConfig("page_size must be > 0"));
        }
        if self.max_chain_depth == 0 {
            return Err(Error::InvalidConfig("max_chain_depth must be > 0"));
        }
        Ok(())
    }
}
