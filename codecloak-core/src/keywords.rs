//! Reserved words a generated package segment must never collide with

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Java and Kotlin keywords plus soft keywords. A generated lowercase
/// identifier that lands on one of these would not survive compilation as a
/// package segment, so the allocator skips over it.
const JAVA_KOTLIN_KEYWORDS: &[&str] = &[
    "in", "is", "as", "if", "do", "by", "new", "try", "int", "for", "out", "var", "val", "fun",
    "byte", "void", "this", "else", "case", "open", "enum", "true", "false", "inner", "unit",
    "null", "char", "long", "super", "while", "break", "float", "final", "short", "const",
    "throw", "class", "catch", "return", "static", "import", "assert", "inline", "reified",
    "object", "sealed", "vararg", "suspend",
    "double", "native", "extends", "switch", "public", "package", "throws", "continue",
    "noinline", "lateinit", "internal", "companion",
    "default", "finally", "abstract", "private", "protected", "implements", "interface",
    "strictfp", "transient", "boolean", "volatile", "instanceof", "synchronized", "constructor",
];

static DEFAULT_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| JAVA_KOTLIN_KEYWORDS.iter().copied().collect());

/// Case-sensitive set of identifiers the package-name allocator must skip.
///
/// The standard constructor carries the full Java/Kotlin keyword set;
/// [`ReservedWords::only`] and [`ReservedWords::none`] exist for callers
/// that need exact control over the rejection behavior.
#[derive(Debug, Clone)]
pub struct ReservedWords {
    use_defaults: bool,
    extra: HashSet<String>,
}

impl Default for ReservedWords {
    fn default() -> Self {
        Self {
            use_defaults: true,
            extra: HashSet::new(),
        }
    }
}

impl ReservedWords {
    /// The standard Java/Kotlin keyword set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard set extended with project-specific words.
    pub fn with_extra<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            use_defaults: true,
            extra: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Exactly the given words, without the standard set.
    pub fn only<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            use_defaults: false,
            extra: words.into_iter().map(Into::into).collect(),
        }
    }

    /// An empty set, for raw sequential allocation.
    pub fn none() -> Self {
        Self::only(std::iter::empty::<String>())
    }

    pub fn contains(&self, word: &str) -> bool {
        (self.use_defaults && DEFAULT_SET.contains(word)) || self.extra.contains(word)
    }
}
