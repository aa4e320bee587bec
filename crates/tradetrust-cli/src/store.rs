//! Provenance source backed by recorded lookups.

use async_trait::async_trait;
use std::collections::HashMap;

use tradetrust_core::ProvenanceLookup;
use tradetrust_runtime::{CollaboratorError, LookupKind, ProvenanceQuery, ProvenanceSource};

/// Answers each lookup kind with a fixed, pre-recorded response.
pub struct StaticProvenance {
    lookups: HashMap<LookupKind, ProvenanceLookup>,
}

impl StaticProvenance {
    pub fn new(lookups: HashMap<LookupKind, ProvenanceLookup>) -> Self {
        Self { lookups }
    }
}

#[async_trait]
impl ProvenanceSource for StaticProvenance {
    async fn lookup(&self, query: &ProvenanceQuery) -> Result<ProvenanceLookup, CollaboratorError> {
        Ok(self
            .lookups
            .get(&query.kind)
            .cloned()
            .unwrap_or_else(ProvenanceLookup::unavailable))
    }
}
