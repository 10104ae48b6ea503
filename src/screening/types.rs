//! Core data types and error definitions for the screening pipeline.

use crate::llm::LlmError;
use crate::storage::StoreError;
use serde::Serialize;
use thiserror::Error;

/// `document_type` tag marking a stored text file as a video link rather than a document.
pub const YOUTUBE_URL_TAG: &str = "youtube url";

/// Data type derived from a document's filename extension.
///
/// This classification is distinct from the uploader-declared `document_type` metadata
/// tag; it only describes the file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// `.pdf`
    PdfFile,
    /// `.docx`
    Docx,
    /// `.txt`
    Text,
    /// `.png`, `.jpg`, `.jpeg`
    Image,
}

impl DataType {
    /// Classify a storage key by its filename extension, case-insensitively.
    ///
    /// Returns `None` for unrecognized extensions; callers decide whether that is a
    /// skip (batch ingestion) or an error.
    pub fn from_key(key: &str) -> Option<Self> {
        let extension = key.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::PdfFile),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Text),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }

    /// Stable string form used in fragment labels and API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PdfFile => "pdf_file",
            Self::Docx => "docx",
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// One document in a batch that failed to ingest.
///
/// Failures are collected and reported alongside an otherwise-successful build; a
/// single bad document never aborts its siblings.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionFailure {
    /// Storage key of the offending document.
    pub key: String,
    /// Human-readable error detail.
    pub detail: String,
}

/// Outcome of assembling one tenant's corpus.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BuildReport {
    /// Documents successfully ingested into the agent.
    pub ingested: usize,
    /// Documents skipped because their extension maps to no known data type.
    pub skipped_unsupported: usize,
    /// Per-document failures encountered during the batch.
    pub failures: Vec<IngestionFailure>,
}

/// One stored document as reported to API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    /// Full storage key.
    pub key: String,
    /// Uploader-declared classification tag, case-folded.
    pub document_type: String,
    /// Extension-derived data type, when recognized.
    pub data_type: Option<DataType>,
    /// Time-limited download URL.
    pub download_url: String,
}

/// Errors emitted by the screening pipeline.
#[derive(Debug, Error)]
pub enum ScreeningError {
    /// The language-model gateway call failed or returned an unusable response.
    #[error("Language model request failed: {0}")]
    Llm(#[from] LlmError),
    /// The object store rejected or failed a request.
    #[error("Store request failed: {0}")]
    Store(#[from] StoreError),
    /// No stored document carries the requested category tag.
    #[error("No document with type '{category}' found for tenant '{tenant}'")]
    DocumentNotFound {
        /// Requested document category.
        category: String,
        /// Tenant whose namespace was searched.
        tenant: String,
    },
    /// A selected document's bytes are not decodable text.
    #[error("Document {key} is not valid UTF-8 text")]
    NotText {
        /// Storage key of the undecodable document.
        key: String,
    },
}
