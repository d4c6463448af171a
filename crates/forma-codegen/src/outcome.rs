/// Result of a step that may deliberately decline to apply.
///
/// `Skip` lets the caller try another interpretation; `Fail` means the
/// problem has already been recorded as a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    Ok(T),
    Skip,
    Fail,
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Skip => Outcome::Skip,
            Outcome::Fail => Outcome::Fail,
        }
    }

    /// Runs `alternative` only when this outcome was skipped.
    pub fn or_else(self, alternative: impl FnOnce() -> Outcome<T>) -> Outcome<T> {
        match self {
            Outcome::Skip => alternative(),
            other => other,
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Outcome::Ok(value),
            None => Outcome::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_else_only_runs_after_skip() {
        assert_eq!(Outcome::Skip.or_else(|| Outcome::Ok(1)), Outcome::Ok(1));
        assert_eq!(Outcome::Fail.or_else(|| Outcome::Ok(1)), Outcome::Fail);
        assert_eq!(Outcome::Ok(2).or_else(|| Outcome::Ok(1)), Outcome::Ok(2));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Outcome::from(Some("x")).map(str::len), Outcome::Ok(1));
        assert_eq!(Outcome::<u8>::from(None), Outcome::Skip);
    }
}
