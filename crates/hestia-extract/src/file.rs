//! Uploaded file metadata and relocation.
//!
//! The host's upload mechanism has already written each file to a
//! temporary location. [`FileBag`] holds the descriptors it produced and
//! moves valid uploads to their destination.
//!
//! Validity is never stored: [`FileBag::is_valid`] recomputes it from the
//! descriptor and the [`UploadPolicy`] every time it is asked.
//!
//! The destination name is the basename of the client-declared file name.
//! Stripping directory components is the only sanitization applied; callers
//! needing stronger guarantees must rename the file themselves.

use hestia_core::{HttpError, HttpResult, ParameterBag};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default upload size ceiling (5 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Default extension allow-list.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["jpg", "png", "gif", "pdf", "txt", "zip"];

/// Transfer outcome reported by the host's upload mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    /// The upload succeeded.
    #[default]
    Ok,
    /// The file exceeds the host's global size limit.
    IniSize,
    /// The file exceeds the form's declared size limit.
    FormSize,
    /// The file was only partially received.
    Partial,
    /// No file was sent.
    NoFile,
    /// The host has no temporary directory.
    NoTmpDir,
    /// The host failed to write the file.
    CantWrite,
    /// A host extension stopped the upload.
    Extension,
}

impl UploadStatus {
    /// Maps a numeric host error code. Unknown codes yield `None`.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::IniSize),
            2 => Some(Self::FormSize),
            3 => Some(Self::Partial),
            4 => Some(Self::NoFile),
            6 => Some(Self::NoTmpDir),
            7 => Some(Self::CantWrite),
            8 => Some(Self::Extension),
            _ => None,
        }
    }

    /// Returns the numeric host error code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::IniSize => 1,
            Self::FormSize => 2,
            Self::Partial => 3,
            Self::NoFile => 4,
            Self::NoTmpDir => 6,
            Self::CantWrite => 7,
            Self::Extension => 8,
        }
    }

    /// Returns `true` for a successful transfer.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Descriptor of one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-declared file name.
    pub name: String,
    /// Client-declared size in bytes.
    pub size: u64,
    /// Where the host stored the upload.
    pub tmp_path: PathBuf,
    /// Transfer outcome.
    pub status: UploadStatus,
    /// Client-declared media type.
    pub content_type: Option<String>,
}

impl UploadedFile {
    /// Creates a successful upload descriptor.
    pub fn new(name: impl Into<String>, size: u64, tmp_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            size,
            tmp_path: tmp_path.into(),
            status: UploadStatus::Ok,
            content_type: None,
        }
    }

    /// Sets the transfer outcome.
    #[must_use]
    pub fn with_status(mut self, status: UploadStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the media type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the lowercase extension of the declared name.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Returns the declared name without directory components.
    #[must_use]
    pub fn basename(&self) -> Option<&str> {
        Path::new(&self.name).file_name().and_then(|name| name.to_str())
    }
}

/// Which uploads are acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Lowercase extensions without the leading dot.
    pub allowed_extensions: Vec<String>,
    /// Largest accepted size in bytes.
    pub max_file_size: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(ToString::to_string).collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl UploadPolicy {
    /// Returns `true` if `file` satisfies the policy.
    #[must_use]
    pub fn accepts(&self, file: &UploadedFile) -> bool {
        file.status.is_ok()
            && file.size <= self.max_file_size
            && file
                .extension()
                .is_some_and(|ext| self.allowed_extensions.iter().any(|allowed| *allowed == ext))
    }
}

/// Uploaded files keyed by form field name.
///
/// # Example
///
/// ```
/// use hestia_extract::file::{FileBag, UploadStatus, UploadedFile};
///
/// let files = FileBag::new([
///     ("avatar", UploadedFile::new("me.JPG", 1024, "/tmp/php1")),
///     ("script", UploadedFile::new("run.sh", 10, "/tmp/php2")),
///     ("partial", UploadedFile::new("a.png", 10, "/tmp/php3").with_status(UploadStatus::Partial)),
/// ]);
///
/// assert!(files.is_valid("avatar"));
/// assert!(!files.is_valid("script"));
/// assert!(!files.is_valid("partial"));
/// assert!(!files.is_valid("missing"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileBag {
    files: ParameterBag<UploadedFile>,
    policy: UploadPolicy,
}

impl FileBag {
    /// Creates a bag with the default policy.
    pub fn new<K: Into<String>>(files: impl IntoIterator<Item = (K, UploadedFile)>) -> Self {
        Self {
            files: files.into_iter().collect(),
            policy: UploadPolicy::default(),
        }
    }

    /// Replaces the policy.
    #[must_use]
    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the policy.
    #[must_use]
    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Returns the descriptor for `field`.
    #[must_use]
    pub fn metadata(&self, field: &str) -> Option<&UploadedFile> {
        self.files.get(field)
    }

    /// Returns `true` if `field` has a descriptor.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.files.has(field)
    }

    /// Returns every descriptor.
    #[must_use]
    pub fn all(&self) -> &IndexMap<String, UploadedFile> {
        self.files.all()
    }

    /// Returns the number of descriptors.
    #[must_use]
    pub fn count(&self) -> usize {
        self.files.count()
    }

    /// Returns `true` if `field` exists and passes the policy.
    #[must_use]
    pub fn is_valid(&self, field: &str) -> bool {
        self.files.get(field).is_some_and(|file| self.policy.accepts(file))
    }

    /// Moves the upload for `field` into `target_dir`, keeping its basename.
    ///
    /// Returns `Ok(false)` without touching the filesystem when the upload
    /// is not valid. Directory creation, the writability check, a missing
    /// temporary file and the rename itself all fail with `Storage`.
    pub fn move_to(&self, field: &str, target_dir: impl AsRef<Path>) -> HttpResult<bool> {
        let Some(file) = self.files.get(field).filter(|file| self.policy.accepts(file)) else {
            return Ok(false);
        };
        let target_dir = target_dir.as_ref();

        fs::create_dir_all(target_dir).map_err(|e| {
            HttpError::storage_io(
                format!("Failed to create upload directory \"{}\".", target_dir.display()),
                target_dir,
                e,
            )
        })?;

        let writable = fs::metadata(target_dir).map(|meta| !meta.permissions().readonly());
        if !matches!(writable, Ok(true)) {
            return Err(HttpError::storage(
                format!("Upload directory \"{}\" is not writable.", target_dir.display()),
                target_dir,
            ));
        }

        if !file.tmp_path.is_file() {
            return Err(HttpError::storage(
                format!("Temporary upload \"{}\" does not exist.", file.tmp_path.display()),
                &file.tmp_path,
            ));
        }

        let Some(basename) = file.basename() else {
            return Err(HttpError::storage(
                format!("Upload name \"{}\" has no file name component.", file.name),
                target_dir,
            ));
        };
        let destination = target_dir.join(basename);

        fs::rename(&file.tmp_path, &destination).map_err(|e| {
            HttpError::storage_io(
                format!("Failed to move upload to \"{}\".", destination.display()),
                &destination,
                e,
            )
        })?;

        tracing::debug!(field, destination = %destination.display(), size = file.size, "upload moved");
        Ok(true)
    }
}
