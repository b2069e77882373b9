//! Process exit codes
//!
//! Scripts wrapping `nexus3` rely on these values, so they must stay stable.

use nexus3_core::Error;

/// Exit code returned by every command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// A transfer touched zero files
    NoFiles = 1,
    /// Unexpected response from the service, including an aborted delete
    ApiError = 2,
    ConnectionError = 3,
    DownloadError = 4,
    InvalidCredentials = 5,
    /// Bad arguments or component path
    UsageError = 10,
    /// The operation is not available for the target (e.g. upload format)
    SubcommandError = 11,
    /// No cleanup policy matched
    PolicyNotFound = 20,
    RepositoryNotFound = 30,
    UnknownError = 99,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a core error onto the exit code reported for it
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::InvalidPath(_) | Error::InvalidArgument(_) => ExitCode::UsageError,
            Error::InvalidRepository(_) => ExitCode::RepositoryNotFound,
            Error::Api(_) => ExitCode::ApiError,
            Error::InvalidCredentials(_) => ExitCode::InvalidCredentials,
            Error::Download(_) => ExitCode::DownloadError,
            Error::NotImplemented(_) => ExitCode::SubcommandError,
            Error::Network(_) => ExitCode::ConnectionError,
            Error::Config(_) | Error::Io(_) | Error::Json(_) => ExitCode::UnknownError,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::NoFiles.as_i32(), 1);
        assert_eq!(ExitCode::ApiError.as_i32(), 2);
        assert_eq!(ExitCode::ConnectionError.as_i32(), 3);
        assert_eq!(ExitCode::DownloadError.as_i32(), 4);
        assert_eq!(ExitCode::InvalidCredentials.as_i32(), 5);
        assert_eq!(ExitCode::UsageError.as_i32(), 10);
        assert_eq!(ExitCode::SubcommandError.as_i32(), 11);
        assert_eq!(ExitCode::PolicyNotFound.as_i32(), 20);
        assert_eq!(ExitCode::RepositoryNotFound.as_i32(), 30);
        assert_eq!(ExitCode::UnknownError.as_i32(), 99);
    }

    #[test]
    fn test_from_error() {
        let cases = [
            (Error::InvalidPath("x".into()), ExitCode::UsageError),
            (Error::InvalidArgument("x".into()), ExitCode::UsageError),
            (Error::InvalidRepository("x".into()), ExitCode::RepositoryNotFound),
            (Error::Api("x".into()), ExitCode::ApiError),
            (Error::InvalidCredentials("x".into()), ExitCode::InvalidCredentials),
            (Error::Download("x".into()), ExitCode::DownloadError),
            (Error::NotImplemented("x".into()), ExitCode::SubcommandError),
            (Error::Network("x".into()), ExitCode::ConnectionError),
            (Error::Config("x".into()), ExitCode::UnknownError),
        ];
        for (error, expected) in cases {
            assert_eq!(ExitCode::from_error(&error), expected, "{error}");
        }
    }
}
