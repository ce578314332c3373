use globset::{Glob, GlobMatcher};
use tracing::warn;

/// Marker turning a consumer key into a wildcard rule
pub const WILDCARD_MARKER: char = '*';

#[inline]
#[must_use]
pub(crate) fn is_wildcard(consumer: &str) -> bool {
    consumer.contains(WILDCARD_MARKER)
}

/// Glob over consumer identifiers.
///
/// A pattern that doesn't compile is kept with no matcher and never matches.
#[derive(Debug, Clone)]
pub(crate) struct ConsumerPattern {
    source: String,
    matcher: Option<GlobMatcher>,
}

impl ConsumerPattern {
    pub(crate) fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let matcher = match Glob::new(&source) {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(err) => {
                warn!(pattern = %source, %err, "Invalid wildcard pattern, rule will never match");
                None
            }
        };

        Self { source, matcher }
    }

    #[inline]
    #[must_use]
    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    #[must_use]
    pub(crate) fn matches(&self, consumer: &str) -> bool {
        self.matcher.as_ref().is_some_and(|matcher| matcher.is_match(consumer))
    }
}
