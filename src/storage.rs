use std::path::PathBuf;

use tokio::fs;

/// Detects a MIME type from raw attachment bytes. The caller-declared
/// content type is never trusted; detection always runs on the decoded
/// content.
pub trait ContentSniffer: Send + Sync {
    fn sniff(&self, content: &[u8]) -> Option<&'static str>;
}

/// Magic-number based sniffer backed by the `infer` crate.
pub struct InferSniffer;

impl ContentSniffer for InferSniffer {
    fn sniff(&self, content: &[u8]) -> Option<&'static str> {
        infer::get(content).map(|kind| kind.mime_type())
    }
}

/// Writes attachment blobs under the configured upload root and hands back
/// the locator stored in the attachment row.
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn save(&self, stored_name: &str, content: &[u8]) -> std::io::Result<String> {
        fs::create_dir_all(&self.root).await?;
        let path = self.root.join(stored_name);
        fs::write(&path, content).await?;
        Ok(path.to_string_lossy().into_owned())
    }
}
