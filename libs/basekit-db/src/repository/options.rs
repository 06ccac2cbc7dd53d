/// Commit and refresh behaviour of a mutating repository call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Commit the session after the write. When `false` the change stays
    /// staged in the caller's session.
    pub commit: bool,
    /// Reload the row after the write so server-side defaults show up.
    pub refresh: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            commit: true,
            refresh: true,
        }
    }
}

impl WriteOptions {
    /// Stage the write without committing.
    #[must_use]
    pub const fn staged() -> Self {
        Self {
            commit: false,
            refresh: true,
        }
    }

    #[must_use]
    pub const fn without_refresh(self) -> Self {
        Self {
            refresh: false,
            ..self
        }
    }
}
