// Utility modules for URL handling and error mapping

pub mod domain;
pub mod extraction_errors;
pub mod url_validator;

pub use domain::{link_host, registrable_domain, DomainIdentity};
pub use extraction_errors::{ExtractionError, ExtractionErrorResponse, ExtractionResult};
pub use url_validator::{normalize_input, UrlValidator, ValidatedUrl, ValidationError};
