use thiserror::Error;

/// Result type alias using GwError
pub type Result<T> = std::result::Result<T, GwError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure the gateway can report is one of these kinds. Each kind
/// maps to a stable wire code that HTTP clients can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GwErrorKind {
    // Query validation
    QueryRequired,
    MultiStatement,
    CommentsNotAllowed,
    NotReadOnly,
    InvalidParameterName,

    // Request shape
    InvalidJson,
    InvalidInput,
    NotFound,

    // Auth
    Unauthorised,

    // Execution
    RowLimitExceeded,
    ExecutionTimeout,
    Execution,
    ResourceUnavailable,

    // Startup / IO
    Config,
    Io,

    // Internal
    Internal,
}

impl GwErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            GwErrorKind::QueryRequired => "SQL_QUERY_REQUIRED",
            GwErrorKind::MultiStatement => "SQL_MULTI_STATEMENT",
            GwErrorKind::CommentsNotAllowed => "SQL_COMMENTS_NOT_ALLOWED",
            GwErrorKind::NotReadOnly => "SQL_NOT_READ_ONLY",
            GwErrorKind::InvalidParameterName => "SQL_INVALID_PARAMETER",
            GwErrorKind::InvalidJson => "INVALID_JSON",
            GwErrorKind::InvalidInput => "INVALID_INPUT",
            GwErrorKind::NotFound => "NOT_FOUND",
            GwErrorKind::Unauthorised => "UNAUTHORIZED",
            GwErrorKind::RowLimitExceeded => "SQL_ROW_LIMIT",
            GwErrorKind::ExecutionTimeout => "SQL_TIMEOUT",
            GwErrorKind::Execution => "DB_ERROR",
            GwErrorKind::ResourceUnavailable => "DB_UNAVAILABLE",
            GwErrorKind::Config => "CONFIG_INVALID",
            GwErrorKind::Io => "IO_ERROR",
            GwErrorKind::Internal => "INTERNAL",
        }
    }

    /// True for kinds raised by the query gate before anything executes
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GwErrorKind::QueryRequired
                | GwErrorKind::MultiStatement
                | GwErrorKind::CommentsNotAllowed
                | GwErrorKind::NotReadOnly
                | GwErrorKind::InvalidParameterName
        )
    }
}

/// Canonical structured error type
///
/// `message` is safe to show to an API caller. `detail` carries driver or
/// OS text and is only ever logged.
#[derive(Debug, Clone)]
pub struct GwError {
    kind: GwErrorKind,
    op: Option<String>,
    message: String,
    detail: Option<String>,
}

impl GwError {
    /// Create a new error with the specified kind
    pub fn new(kind: GwErrorKind) -> Self {
        Self {
            kind,
            op: None,
            message: String::new(),
            detail: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add caller-facing message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add internal detail (never sent to the caller)
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> GwErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the internal detail, if any
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl std::fmt::Display for GwError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for GwError {}

// ========== End Error Facility ==========

/// Why the query gate refused a query
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("Query is required")]
    QueryRequired,

    #[error("Multiple SQL statements are not allowed")]
    MultiStatement,

    #[error("SQL comments are not allowed")]
    CommentsNotAllowed,

    #[error("Only read-only SELECT or WITH queries are allowed")]
    NotReadOnly,

    #[error("Parameter names must be plain identifiers")]
    InvalidParameterName,
}

impl RejectReason {
    /// Error kind this reason maps to
    pub fn kind(&self) -> GwErrorKind {
        match self {
            RejectReason::QueryRequired => GwErrorKind::QueryRequired,
            RejectReason::MultiStatement => GwErrorKind::MultiStatement,
            RejectReason::CommentsNotAllowed => GwErrorKind::CommentsNotAllowed,
            RejectReason::NotReadOnly => GwErrorKind::NotReadOnly,
            RejectReason::InvalidParameterName => GwErrorKind::InvalidParameterName,
        }
    }

    /// Stable wire code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

impl From<RejectReason> for GwError {
    fn from(reason: RejectReason) -> Self {
        GwError::new(reason.kind())
            .with_op("validate_query")
            .with_message(reason.to_string())
    }
}

impl From<serde_json::Error> for GwError {
    fn from(err: serde_json::Error) -> Self {
        GwError::new(GwErrorKind::InvalidJson)
            .with_message("Invalid JSON body")
            .with_detail(err.to_string())
    }
}
