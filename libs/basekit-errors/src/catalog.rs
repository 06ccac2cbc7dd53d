//! Static error definitions for every failure basekit surfaces

use crate::problem::Problem;
use http::StatusCode;

/// Who is at fault for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    Server,
}

/// Static error definition from the catalog
#[derive(Debug, Clone, Copy)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    /// Convert this error definition into a Problem with the given detail
    #[inline]
    pub fn as_problem(&self, detail: impl Into<String>) -> Problem {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Problem::new(status, self.title, detail.into())
            .with_code(self.code)
            .with_type(self.type_url)
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        if self.status >= 400 && self.status < 500 {
            ErrorClass::Client
        } else {
            ErrorClass::Server
        }
    }
}

macro_rules! err_def {
    ($name:ident, $status:expr, $title:literal, $code:literal) => {
        pub const $name: ErrDef = ErrDef {
            status: $status,
            title: $title,
            code: $code,
            type_url: concat!("https://errors.basekit.dev/", $code),
        };
    };
}

err_def!(INVALID_FIELD, 400, "Invalid Field", "INVALID_FIELD");
err_def!(UNSUPPORTED_OPERATOR, 400, "Unsupported Operator", "UNSUPPORTED_OPERATOR");
err_def!(INVALID_VALUE, 400, "Invalid Value", "INVALID_VALUE");
err_def!(IMMUTABLE_FIELD, 400, "Immutable Field", "IMMUTABLE_FIELD");
err_def!(OBJECT_MISSING, 400, "Bad Request", "OBJECT_MISSING");
err_def!(NOT_FOUND, 404, "Not Found", "NOT_FOUND");
err_def!(MULTIPLE_RESULTS, 409, "Multiple Results", "MULTIPLE_RESULTS");
err_def!(CONSTRAINT_VIOLATION, 500, "Constraint Violation", "CONSTRAINT_VIOLATION");
err_def!(UNAUTHENTICATED, 401, "Unauthorized", "UNAUTHENTICATED");
err_def!(TOKEN_INVALID, 401, "Unauthorized", "TOKEN_INVALID");
err_def!(TOKEN_EXPIRED, 403, "Token expired", "TOKEN_EXPIRED");
err_def!(PERMISSION_DENIED, 403, "Forbidden", "PERMISSION_DENIED");
err_def!(INTERNAL, 500, "Internal Server Error", "INTERNAL");
