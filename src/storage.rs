use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::blockchain::{Block, Chain, validate_chain};
use crate::error::{ChainError, Result};

/// JSON file holding this node's chain. Every write replaces the whole file
/// through a temp file and rename, so readers never see a partial chain.
#[derive(Debug, Clone)]
pub struct ChainStore {
    path: PathBuf,
}

impl ChainStore {
    pub fn new(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self {
            path: dir.as_ref().join(file_name),
        }
    }

    /// Store for the node listening on `port`: `<dir>/blockchain-<port>.json`.
    pub fn for_port(dir: impl AsRef<Path>, port: u16) -> Self {
        Self::new(dir, &format!("blockchain-{port}.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Chain> {
        let bytes = fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                ChainError::NotFound(format!("no chain at {}", self.path.display()))
            }
            _ => ChainError::Storage(e),
        })?;
        let chain: Chain = serde_json::from_slice(&bytes)?;
        if chain.is_empty() {
            return Err(ChainError::NotFound("No blockchain available".into()));
        }
        Ok(chain)
    }

    /// Atomically overwrite the stored chain.
    pub fn write(&self, chain: &[Block]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer(&mut tmp, chain)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| ChainError::Storage(e.error))?;

        debug!(
            "STORE - wrote {} blocks to {}",
            chain.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Read the chain, creating it from `genesis` when none exists yet.
    pub fn open_or_init(&self, genesis: impl FnOnce() -> Block) -> Result<Chain> {
        match self.read() {
            Ok(chain) => Ok(chain),
            Err(ChainError::NotFound(_)) => {
                let chain = vec![genesis()];
                self.write(&chain)?;
                info!("STORE - created genesis chain at {}", self.path.display());
                Ok(chain)
            }
            Err(e) => Err(e),
        }
    }

    /// Append `block` only if it extends the current tip.
    ///
    /// Callers serialize appends; the tip check turns a lost race into
    /// `StaleTip` instead of two blocks claiming the same height.
    pub fn append(&self, block: Block) -> Result<Chain> {
        let mut chain = self.read()?;
        let tip = chain
            .last()
            .ok_or_else(|| ChainError::NotFound("No blockchain available".into()))?;

        if tip.current_block_hash != block.previous_block_hash
            || block.block_index != chain.len() as u64
        {
            return Err(ChainError::StaleTip {
                expected: block.previous_block_hash,
                actual: tip.current_block_hash.clone(),
            });
        }

        chain.push(block);
        self.write(&chain)?;
        Ok(chain)
    }

    /// Swap the whole chain for `chain`. Only a valid chain is accepted.
    pub fn replace(&self, chain: &[Block]) -> Result<()> {
        validate_chain(chain)?;
        self.write(chain)?;
        info!(
            "STORE - replaced chain, new length {} ({})",
            chain.len(),
            self.path.display()
        );
        Ok(())
    }
}
