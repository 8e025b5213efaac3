//! Configuration types for document intake and conversion.
//!
//! All behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. One struct carries every knob (service location,
//! upload limits, preview size, timeouts) so a controller, the one-shot
//! helpers and the CLI all share the same defaults.

use crate::error::DocSwapError;
use crate::intake::MAX_UPLOAD_BYTES;
use crate::mode::ConversionMode;
use crate::preview::PREVIEW_LIMIT;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for an intake session and its conversion transactions.
///
/// Built via [`ClientConfig::builder()`] or using [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_docswap::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://converter.internal:8080")
///     .request_timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Root URL of the remote conversion service. Default: `http://127.0.0.1:5000`.
    ///
    /// A path prefix is kept: `http://host/api` posts to
    /// `http://host/api/convert/pdf-to-word`.
    pub base_url: String,

    /// Endpoint path for [`ConversionMode::PdfToWord`]. Default: `/convert/pdf-to-word`.
    pub pdf_to_word_path: String,

    /// Endpoint path for [`ConversionMode::WordToPdf`]. Default: `/convert/word-to-pdf`.
    pub word_to_pdf_path: String,

    /// Multipart field carrying the uploaded file. Default: `file`.
    pub field_name: String,

    /// Largest accepted upload in bytes, inclusive. Default: 5 MiB.
    pub max_upload_bytes: u64,

    /// Characters shown before the preview is truncated. Default: 500.
    pub preview_limit: usize,

    /// Boundary inserted between PDF pages in the preview text. Default: none.
    pub page_separator: PageSeparator,

    /// Whole-request timeout for the conversion call, in seconds. Default: 120.
    ///
    /// Converting a 5 MiB document server-side takes seconds, not minutes;
    /// 120 s leaves room for a slow converter without hanging the session.
    pub request_timeout_secs: u64,

    /// TCP connect timeout, in seconds. Default: 10.
    pub connect_timeout_secs: u64,

    /// Directory receiving converted downloads. Default: current directory.
    pub output_dir: PathBuf,

    /// Explicit libpdfium location (file or directory). Falls back to
    /// `PDFIUM_LIB_PATH`, then to the system library.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            pdf_to_word_path: "/convert/pdf-to-word".to_string(),
            word_to_pdf_path: "/convert/word-to-pdf".to_string(),
            field_name: "file".to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            preview_limit: PREVIEW_LIMIT,
            page_separator: PageSeparator::default(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
            output_dir: PathBuf::from("."),
            pdfium_library_path: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("pdf_to_word_path", &self.pdf_to_word_path)
            .field("word_to_pdf_path", &self.word_to_pdf_path)
            .field("field_name", &self.field_name)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("preview_limit", &self.preview_limit)
            .field("page_separator", &self.page_separator)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Endpoint path serving `mode`.
    pub fn endpoint_path(&self, mode: ConversionMode) -> &str {
        match mode {
            ConversionMode::PdfToWord => &self.pdf_to_word_path,
            ConversionMode::WordToPdf => &self.word_to_pdf_path,
        }
    }

    /// Full URL the upload for `mode` is posted to.
    pub fn endpoint_url(&self, mode: ConversionMode) -> Result<Url, DocSwapError> {
        let mut base = parse_base_url(&self.base_url)?;
        // Endpoint paths are resolved under the base path, not the host root.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let relative = self.endpoint_path(mode).trim_start_matches('/');
        base.join(relative).map_err(|e| {
            DocSwapError::InvalidConfig(format!(
                "endpoint '{}' is not a valid path: {e}",
                self.endpoint_path(mode)
            ))
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, DocSwapError> {
    let url = Url::parse(raw)
        .map_err(|e| DocSwapError::InvalidConfig(format!("base URL '{raw}' is invalid: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DocSwapError::InvalidConfig(format!(
            "base URL must be http or https, got '{other}'"
        ))),
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn pdf_to_word_path(mut self, path: impl Into<String>) -> Self {
        self.config.pdf_to_word_path = path.into();
        self
    }

    pub fn word_to_pdf_path(mut self, path: impl Into<String>) -> Self {
        self.config.word_to_pdf_path = path.into();
        self
    }

    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.config.field_name = name.into();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn preview_limit(mut self, chars: usize) -> Self {
        self.config.preview_limit = chars;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, DocSwapError> {
        let c = &self.config;
        parse_base_url(&c.base_url)?;
        for mode in ConversionMode::ALL {
            c.endpoint_url(mode)?;
        }
        if c.field_name.trim().is_empty() {
            return Err(DocSwapError::InvalidConfig(
                "Multipart field name must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(DocSwapError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        if c.preview_limit == 0 {
            return Err(DocSwapError::InvalidConfig(
                "Preview limit must be ≥ 1 character".into(),
            ));
        }
        if c.request_timeout_secs == 0 || c.connect_timeout_secs == 0 {
            return Err(DocSwapError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What to put between the text of consecutive PDF pages.
///
/// The default keeps pages glued together with nothing in between, so the
/// last word of a page can merge with the first word of the next. Pick
/// [`PageSeparator::Space`] or [`PageSeparator::Newline`] to keep them apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// Pages concatenated directly. (default)
    #[default]
    None,
    /// A single space between pages.
    Space,
    /// A blank line between pages: "\n\n".
    Newline,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// The string inserted before every page after the first.
    pub fn as_str(&self) -> &str {
        match self {
            PageSeparator::None => "",
            PageSeparator::Space => " ",
            PageSeparator::Newline => "\n\n",
            PageSeparator::Custom(s) => s,
        }
    }
}
