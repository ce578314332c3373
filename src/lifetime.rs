use core::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use crate::errors::ValidationErrorKind;

/// Policy governing instance reuse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lifetime {
    /// One instance per process
    Singleton,
    /// One instance per logical scope
    Scoped,
    /// New instance on each resolution
    #[default]
    Transient,
}

impl Lifetime {
    #[inline]
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Singleton, Self::Scoped, Self::Transient]
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

impl Display for Lifetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Lifetime {
    type Err = ValidationErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|lifetime| lifetime.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationErrorKind::UnknownLifetime { lifetime: s.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::Lifetime;
    use crate::errors::ValidationErrorKind;

    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_default_is_transient() {
        assert_eq!(Lifetime::default(), Lifetime::Transient);
    }

    #[test]
    #[traced_test]
    fn test_parse() {
        assert_eq!("Singleton".parse::<Lifetime>().unwrap(), Lifetime::Singleton);
        assert_eq!(" scoped ".parse::<Lifetime>().unwrap(), Lifetime::Scoped);
        assert_eq!("TRANSIENT".parse::<Lifetime>().unwrap(), Lifetime::Transient);
        assert_eq!(
            "forever".parse::<Lifetime>(),
            Err(ValidationErrorKind::UnknownLifetime {
                lifetime: "forever".into()
            })
        );
    }
}
