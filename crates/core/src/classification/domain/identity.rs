use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentityError {
    #[error("reference identifier {identifier:?} has no numeric identity token ({token:?})")]
    MalformedIdentifier { identifier: String, token: String },
}

/// Maps a gallery identifier to the integer its category is decided by.
///
/// Naming conventions for reference images live behind this seam.
pub trait IdentityExtractor: Send + Sync {
    fn token(&self, identifier: &str) -> Result<i64, IdentityError>;
}

/// Reads the token from the file name: `portraits/sample/130.jpg` → `130`.
///
/// Takes the last path segment (either separator), drops the final
/// extension, and parses what remains as an integer.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileStemIdentity;

impl IdentityExtractor for FileStemIdentity {
    fn token(&self, identifier: &str) -> Result<i64, IdentityError> {
        let file_name = identifier.rsplit(['/', '\\']).next().unwrap_or(identifier);
        let stem = match file_name.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem,
            _ => file_name,
        };
        stem.parse().map_err(|_| IdentityError::MalformedIdentifier {
            identifier: identifier.to_string(),
            token: stem.to_string(),
        })
    }
}
