//! Screenshot export.
//!
//! Image attachments are copied out of the host's result into the report's
//! `screenshots/` directory under freshly generated names, so the Markdown
//! document can reference them with stable relative paths. Every other
//! attachment is ignored.
//!
//! Export is best-effort: an attachment that cannot be written is logged and
//! left out of the report, and never stops its siblings from being exported.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::host::{Attachment, AttachmentSource, ContentType};

/// Name of the screenshot directory inside the report directory.
pub const SCREENSHOTS_DIR: &str = "screenshots";

/// Display name used when an attachment has none.
pub const DEFAULT_SCREENSHOT_NAME: &str = "Screenshot";

/// Produces a new unique file stem for every exported attachment.
pub type IdGenerator = Box<dyn FnMut() -> String>;

/// The default identifier strategy: a random v4 UUID per call.
pub fn uuid_generator() -> IdGenerator {
    Box::new(|| uuid::Uuid::new_v4().to_string())
}

/// A screenshot stored alongside the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotRef {
    /// Display name.
    pub name: String,

    /// Path relative to the report directory, `/`-separated.
    pub path: String,
}

/// Errors that can occur while exporting a single attachment.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to create screenshot directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to save screenshot {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy screenshot {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes image attachments into the screenshot directory.
///
/// One exporter lives for a whole run, so identifiers come from a single
/// generator in the order attachments are processed across all tests.
pub struct AttachmentExporter {
    export_dir: PathBuf,
    generate_id: IdGenerator,
}

impl AttachmentExporter {
    /// Creates an exporter writing into `export_dir`.
    ///
    /// The directory does not need to exist yet; it is created before the
    /// first write.
    pub fn new(export_dir: impl Into<PathBuf>, generate_id: IdGenerator) -> Self {
        Self {
            export_dir: export_dir.into(),
            generate_id,
        }
    }

    /// Directory screenshots are written to.
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Export every image attachment, in order.
    ///
    /// Returns one [`ScreenshotRef`] per attachment that was written.
    pub fn export(&mut self, attachments: &[Attachment]) -> Vec<ScreenshotRef> {
        let mut screenshots = Vec::new();
        let mut dir_ready = false;

        for attachment in attachments {
            if !attachment.content_type.is_image() {
                continue;
            }
            let Some(source) = attachment.source() else {
                tracing::debug!(
                    "Skipping attachment {:?}: no body or path",
                    attachment.name
                );
                continue;
            };

            if !dir_ready {
                if let Err(e) = self.ensure_export_dir() {
                    tracing::warn!("{}", e);
                    continue;
                }
                dir_ready = true;
            }

            match self.export_one(attachment, source) {
                Ok(screenshot) => {
                    tracing::debug!("Exported screenshot: {}", screenshot.path);
                    screenshots.push(screenshot);
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }

        screenshots
    }

    fn ensure_export_dir(&self) -> Result<(), ExportError> {
        fs::create_dir_all(&self.export_dir).map_err(|source| ExportError::CreateDir {
            path: self.export_dir.clone(),
            source,
        })
    }

    fn export_one(
        &mut self,
        attachment: &Attachment,
        source: AttachmentSource<'_>,
    ) -> Result<ScreenshotRef, ExportError> {
        let id = (self.generate_id)();

        let file_name = match source {
            AttachmentSource::Inline(body) => {
                let file_name = format!("{}{}", id, inline_extension(&attachment.content_type));
                let dest = self.export_dir.join(&file_name);
                fs::write(&dest, body).map_err(|source| ExportError::Write { path: dest, source })?;
                file_name
            }
            AttachmentSource::File(from) => {
                let file_name = format!("{}{}", id, original_extension(from));
                let dest = self.export_dir.join(&file_name);
                fs::copy(from, &dest).map_err(|source| ExportError::Copy {
                    from: from.to_path_buf(),
                    to: dest,
                    source,
                })?;
                file_name
            }
        };

        Ok(ScreenshotRef {
            name: display_name(attachment),
            path: format!("{}/{}", SCREENSHOTS_DIR, file_name),
        })
    }
}

fn inline_extension(content_type: &ContentType) -> &'static str {
    match content_type {
        ContentType::Jpeg => ".jpg",
        _ => ".png",
    }
}

/// The source file's extension including the dot, or nothing.
fn original_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

fn display_name(attachment: &Attachment) -> String {
    attachment
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SCREENSHOT_NAME)
        .to_string()
}
