//! Query-time filters. A superset of the store's own `ChunkFilters`: this
//! crate adds glob matching on `file_path`, which the store has no index
//! for and applies post-hoc instead.

use globset::{Glob, GlobMatcher};
use mnemolite_common::{CoreError, LanguageTag};
use mnemolite_parser::ChunkKind;
use mnemolite_store::ChunkFilters as StoreFilters;

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub language: Option<LanguageTag>,
    pub chunk_type: Option<ChunkKind>,
    pub file_path_glob: Option<String>,
}

impl SearchFilters {
    pub fn to_store_filters(&self) -> StoreFilters {
        StoreFilters {
            language: self.language,
            kind: self.chunk_type,
            file_path_prefix: None,
        }
    }

    pub fn glob_matcher(&self) -> Result<Option<GlobMatcher>, CoreError> {
        match &self.file_path_glob {
            None => Ok(None),
            Some(pattern) => {
                let glob = Glob::new(pattern)
                    .map_err(|e| CoreError::invalid_input(format!("invalid file_path glob `{pattern}`: {e}")))?;
                Ok(Some(glob.compile_matcher()))
            }
        }
    }
}
