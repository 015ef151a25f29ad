//! Share-code issuance.

use tracing::{info, warn};
use uuid::Uuid;

use super::metadata::FileRepository;
use crate::{Result, ShareboxError};

/// Length of a share code in hex characters.
pub const SHARE_CODE_LENGTH: usize = 8;

/// Attempts before giving up on finding an unused code.
pub const MAX_SHARE_CODE_ATTEMPTS: usize = 5;

/// Issues public share codes for catalog rows.
pub struct ShareLinkIssuer<'a> {
    repo: &'a FileRepository<'a>,
}

impl<'a> ShareLinkIssuer<'a> {
    /// Create an issuer over the given catalog.
    pub fn new(repo: &'a FileRepository<'a>) -> Self {
        Self { repo }
    }

    /// Generate a candidate code: the first 8 hex digits of a UUID v4.
    pub fn generate_code() -> String {
        let mut code = Uuid::new_v4().simple().to_string();
        code.truncate(SHARE_CODE_LENGTH);
        code
    }

    /// Return the file's share code, issuing one if it has none.
    pub async fn issue(&self, file_id: i64) -> Result<String> {
        self.issue_with(file_id, Self::generate_code).await
    }

    /// [`ShareLinkIssuer::issue`] with a custom code source.
    pub(crate) async fn issue_with<F>(&self, file_id: i64, mut next_code: F) -> Result<String>
    where
        F: FnMut() -> String,
    {
        let record = self
            .repo
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| ShareboxError::NotFound(format!("file {file_id}")))?;
        if let Some(code) = record.share_code {
            return Ok(code);
        }

        for attempt in 1..=MAX_SHARE_CODE_ATTEMPTS {
            let candidate = next_code();
            match self.repo.attach_share_code(file_id, &candidate).await {
                Ok(updated) => {
                    // A concurrent issue may have attached its own code first.
                    let code = updated.share_code.unwrap_or(candidate);
                    info!(file_id, share_code = %code, "Share code issued");
                    return Ok(code);
                }
                Err(ShareboxError::Conflict(_)) => {
                    warn!(file_id, attempt, "Share code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(ShareboxError::Conflict(format!(
            "no free share code after {MAX_SHARE_CODE_ATTEMPTS} attempts"
        )))
    }
}
