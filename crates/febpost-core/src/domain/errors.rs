use std::fmt::{Display, Formatter};

/// Exit status shared by every operator-facing failure: a missing argument, a
/// missing file, an unusable column set, or an I/O fault all terminate the
/// process with this code.
pub const OPERATOR_EXIT_CODE: i32 = 120;

/// Exit status when the nonlinear fit fails; the solver failure is surfaced
/// rather than remapped onto the operator code.
pub const FIT_FAILURE_EXIT_CODE: i32 = 1;

pub type PostResult<T> = Result<T, PostError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostErrorCategory {
    /// A required argument was not supplied.
    Configuration,
    /// A requested input path does not exist.
    NotFound,
    /// The input table lacks the columns a derivation needs.
    InsufficientInput,
    /// The requested computation is not implemented.
    Unsupported,
    /// There are no rows to operate on.
    EmptyInput,
    /// Reading or writing an artifact failed.
    IoSystem,
    /// The nonlinear solver did not converge.
    FitConvergence,
}

impl PostErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "CONFIGURATION",
            Self::NotFound => "NOT_FOUND",
            Self::InsufficientInput => "INSUFFICIENT_INPUT",
            Self::Unsupported => "UNSUPPORTED",
            Self::EmptyInput => "EMPTY_INPUT",
            Self::IoSystem => "IO_SYSTEM",
            Self::FitConvergence => "FIT_CONVERGENCE",
        }
    }
}

impl Display for PostErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Terminal processing error: a category for exit-code mapping, a stable
/// diagnostic code for tests and log scraping, and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PostError {
    category: PostErrorCategory,
    code: String,
    message: String,
}

impl PostError {
    fn new(
        category: PostErrorCategory,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn configuration(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(PostErrorCategory::Configuration, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(PostErrorCategory::NotFound, code, message)
    }

    pub fn insufficient_input(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(PostErrorCategory::InsufficientInput, code, message)
    }

    pub fn unsupported(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(PostErrorCategory::Unsupported, code, message)
    }

    pub fn empty_input(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(PostErrorCategory::EmptyInput, code, message)
    }

    pub fn io_system(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(PostErrorCategory::IoSystem, code, message)
    }

    pub fn fit_convergence(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(PostErrorCategory::FitConvergence, code, message)
    }

    pub fn category(&self) -> PostErrorCategory {
        self.category
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> i32 {
        match self.category {
            PostErrorCategory::FitConvergence => FIT_FAILURE_EXIT_CODE,
            _ => OPERATOR_EXIT_CODE,
        }
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        Some(format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

#[cfg(test)]
mod tests {
    use super::{FIT_FAILURE_EXIT_CODE, OPERATOR_EXIT_CODE, PostError, PostErrorCategory};

    #[test]
    fn operator_errors_share_the_reserved_exit_code() {
        let errors = [
            PostError::configuration("INPUT.FILE_REQUIRED", "file name must be specified"),
            PostError::not_found("INPUT.PATH_NOT_FOUND", "path does not exist"),
            PostError::insufficient_input("INPUT.FORCE_COMPONENTS", "no force columns"),
            PostError::unsupported("INPUT.DISPLACEMENT_MULTI_AXIS", "one axis only"),
            PostError::empty_input("INPUT.HYSTERESIS_EMPTY", "no rows"),
            PostError::io_system("IO.TABLE_READ", "read failed"),
        ];

        for error in errors {
            assert_eq!(error.exit_code(), OPERATOR_EXIT_CODE);
        }
    }

    #[test]
    fn fit_convergence_surfaces_the_solver_exit_code() {
        let error = PostError::fit_convergence("RUN.PEAK_FIT", "did not converge");
        assert_eq!(error.category(), PostErrorCategory::FitConvergence);
        assert_eq!(error.exit_code(), FIT_FAILURE_EXIT_CODE);
    }

    #[test]
    fn diagnostic_lines_carry_the_stable_code() {
        let error = PostError::io_system("IO.TABLE_READ", "failed to read 'febio4.out.csv'");
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [IO.TABLE_READ] failed to read 'febio4.out.csv'"
        );
        assert_eq!(
            error.fatal_exit_line().as_deref(),
            Some("FATAL EXIT CODE: 120")
        );
    }
}
