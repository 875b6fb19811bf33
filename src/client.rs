use ureq::http::header::CONTENT_TYPE;
use ureq::tls::{TlsConfig, TlsProvider};

use crate::api::{self, ExtractError, Response};
use crate::config::Target;
use crate::multipart;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the multipart form field that carries the file.
const FILE_FIELD: &str = "file";

/// Upper bound on the response body we are willing to buffer.
const RESPONSE_LIMIT: u64 = 10 << 20; // 10 MiB

/// Error type for a single file upload
#[derive(Debug)]
pub enum UploadError {
    /// Could not read the local file
    Read(io::Error),
    /// Error from the HTTP client
    Http(ureq::Error),
    /// Error reading the response body
    Body(ureq::Error),
    /// The response body is not a JSON object
    Parse(serde_json::Error),
    /// The result field could not be found in the response
    Extract(ExtractError),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::Read(e) => write!(f, "failed to read file: {}", e),
            UploadError::Http(e) => write!(f, "failed to request: {}", e),
            UploadError::Body(e) => {
                write!(f, "failed to read response body: {}", e)
            }
            UploadError::Parse(e) => {
                write!(f, "failed to parse response body: {}", e)
            }
            UploadError::Extract(e) => {
                write!(f, "failed to get upload url: {}", e)
            }
        }
    }
}

impl Error for UploadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            UploadError::Read(e) => Some(e),
            UploadError::Http(e) | UploadError::Body(e) => Some(e),
            UploadError::Parse(e) => Some(e),
            UploadError::Extract(e) => Some(e),
        }
    }
}

impl From<ExtractError> for UploadError {
    fn from(err: ExtractError) -> Self {
        UploadError::Extract(err)
    }
}

/// Blocking client that uploads files to a configured target
pub struct Client {
    /// HTTP agent for making requests
    agent: ureq::Agent,
}

impl Client {
    /// Create a new client. Without a `timeout`, requests wait indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::config::Config::builder()
            // Image hosts often report errors with a JSON body and a 4xx/5xx
            // status; the body is parsed either way.
            .http_status_as_error(false)
            .timeout_global(timeout)
            .tls_config(
                TlsConfig::builder().provider(TlsProvider::NativeTls).build(),
            )
            .build();
        let agent = ureq::Agent::new_with_config(config);
        Self { agent }
    }

    /// Upload a single file and return the URL found at the target's
    /// `ResultGetter` path in the response.
    pub fn upload(
        &self,
        path: &Path,
        target: &Target,
    ) -> Result<String, UploadError> {
        let content = std::fs::read(path).map_err(UploadError::Read)?;

        let filename = path.file_name().map(Path::new).unwrap_or(path);
        let content_type = multipart::mime_from_filename(filename);
        let mut builder = multipart::Builder::new();
        builder.add_file_bytes(FILE_FIELD, filename, content_type, &content);
        let body = builder.build();

        let start_time = Instant::now();

        let mut request = self.agent.post(&target.url);
        for (name, values) in &target.header {
            // The multipart boundary header always wins.
            if name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
                debug!("Ignoring configured {name} header");
                continue;
            }
            for value in values {
                request = request.header(name.as_str(), value.as_str());
            }
        }
        let response = request
            .header(CONTENT_TYPE, body.content_type.as_str())
            .send(&body.body[..])
            .map_err(UploadError::Http)?;

        let status = response.status();
        if !status.is_success() {
            warn!("{}: server responded with {status}", path.display());
        }

        let bytes = response
            .into_body()
            .with_config()
            .limit(RESPONSE_LIMIT)
            .read_to_vec()
            .map_err(UploadError::Body)?;

        debug!(
            "{}: request completed in {:?} with response size of {} bytes",
            path.display(),
            start_time.elapsed(),
            bytes.len(),
        );

        let resp: Response =
            serde_json::from_slice(&bytes).map_err(UploadError::Parse)?;
        let url = api::extract(&resp, &target.result_getter)?;
        Ok(url.to_string())
    }

    /// Upload every file in order, one request at a time.
    ///
    /// Returns one entry per input path: the URL, or an empty string if that
    /// upload failed. Failures are logged and never stop the batch.
    /// `on_start` is called with each path just before it is uploaded.
    pub fn upload_all(
        &self,
        paths: &[PathBuf],
        target: &Target,
        mut on_start: impl FnMut(&Path),
    ) -> Vec<String> {
        info!("Uploading {} file(s) to {}", paths.len(), target.url);
        paths
            .iter()
            .map(|path| {
                on_start(path);
                self.upload(path, target).unwrap_or_else(|err| {
                    error!("upload {} error: {}", path.display(), err);
                    String::new()
                })
            })
            .collect()
    }
}

// --- Tests ---
