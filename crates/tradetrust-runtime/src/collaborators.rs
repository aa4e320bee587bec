//! External collaborator interfaces.
//!
//! The provenance store and the certificate formatter live outside this
//! workspace. Implementations must be `Send + Sync`; the runtime shares them
//! behind `Arc` and wraps every call in the configured timeout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use tradetrust_core::ProvenanceLookup;

use crate::recovery::CertificateData;

/// Errors reported by collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Which workflow step a provenance lookup is for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Classification,
    Qualification,
    TariffRates,
    Certificate,
}

/// A provenance lookup request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProvenanceQuery {
    pub kind: LookupKind,

    /// Identifier of the looked-up data, usually the HS code
    pub subject: String,
}

impl ProvenanceQuery {
    pub fn new(kind: LookupKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
        }
    }
}

/// Source of provenance metadata (the provenance store).
#[async_trait]
pub trait ProvenanceSource: Send + Sync {
    /// Look up the provenance of one data item.
    ///
    /// "No data" is `Ok` with `success == false`; `Err` is reserved for the
    /// store itself failing.
    async fn lookup(&self, query: &ProvenanceQuery) -> Result<ProvenanceLookup, CollaboratorError>;
}

/// Renders a certificate of origin document.
#[async_trait]
pub trait CertificateFormatter: Send + Sync {
    async fn format(
        &self,
        data: &CertificateData,
        trust_score: f64,
    ) -> Result<String, CollaboratorError>;
}
