use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::HeaderError;

/// Control, format (zero-width included) and unassigned characters, except
/// whitespace: tabs and line breaks separate words like spaces do.
static NON_PRINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[[\p{C}&&[^\s]]\x{200B}-\x{200D}\x{FEFF}]").unwrap());

/// Ordered replacements, each applied to the output of the previous one.
static REPLACEMENTS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\\", "/"),
        (r"\) ", ")"),
        (r"\] ", "]"),
        (r"\} ", "}"),
        (r"@", "_at_"),
        (r"[(){}\[\]]", "_"),
        (r"\s+", "_"),
        (r"-", "_"),
        (r"[.,]", "_"),
        (r"::", "_"),
        (r"/", "_"),
        (r#"['"|*^&%$€£#]"#, "_"),
        (r"_+", "_"),
        (r"\A_+", ""),
        (r"_+\z", ""),
    ]
    .into_iter()
    .map(|(pattern, with)| (Regex::new(pattern).unwrap(), with))
    .collect()
});

/// Default header cleaning: `"  First name (user)"` becomes `"first_name_user"`.
///
/// Absent or empty cells fall back to `column{index}`; without an index that
/// is a `MissingHeaderColumn` error. The result may still be empty (e.g. a
/// cell of only punctuation); rejecting that is left to the caller.
pub fn normalize_column(raw: Option<&str>, index: Option<usize>) -> Result<String, HeaderError> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            return index
                .map(|i| format!("column{i}"))
                .ok_or(HeaderError::MissingHeaderColumn { index })
        }
    };

    let lowered = raw.trim().to_lowercase();
    let mut column = NON_PRINT.replace_all(&lowered, "").into_owned();
    for (pattern, with) in REPLACEMENTS.iter() {
        column = pattern.replace_all(&column, *with).into_owned();
    }
    Ok(column)
}

type SingleFn = dyn Fn(Option<&str>) -> String + Send + Sync;
type IndexedFn = dyn Fn(Option<&str>, usize) -> String + Send + Sync;

/// How raw header cells become column names.
///
/// Callables declare their arity through the variant they are built with:
/// `single` receives the cell only, `indexed` also receives its position.
#[derive(Clone, Default)]
pub enum HeaderNormalizer {
    #[default]
    Default,
    Single(Arc<SingleFn>),
    Indexed(Arc<IndexedFn>),
    /// Raw cell text looked up in a map; unmapped cells use the default.
    Mapping(Arc<HashMap<String, ColumnRename>>),
}

/// Target of a mapping normalizer entry.
#[derive(Clone, Debug)]
pub enum ColumnRename {
    Name(String),
    Normalizer(HeaderNormalizer),
}

impl From<&str> for ColumnRename {
    fn from(name: &str) -> Self {
        ColumnRename::Name(name.to_string())
    }
}

impl From<HeaderNormalizer> for ColumnRename {
    fn from(normalizer: HeaderNormalizer) -> Self {
        ColumnRename::Normalizer(normalizer)
    }
}

impl HeaderNormalizer {
    pub fn single<F>(f: F) -> Self
    where
        F: Fn(Option<&str>) -> String + Send + Sync + 'static,
    {
        HeaderNormalizer::Single(Arc::new(f))
    }

    pub fn indexed<F>(f: F) -> Self
    where
        F: Fn(Option<&str>, usize) -> String + Send + Sync + 'static,
    {
        HeaderNormalizer::Indexed(Arc::new(f))
    }

    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ColumnRename>,
    {
        HeaderNormalizer::Mapping(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Normalize one cell at `index`. Does not check for empty output.
    pub fn normalize(&self, raw: Option<&str>, index: usize) -> Result<String, HeaderError> {
        match self {
            HeaderNormalizer::Default => normalize_column(raw, Some(index)),
            HeaderNormalizer::Single(f) => Ok(f(raw)),
            HeaderNormalizer::Indexed(f) => Ok(f(raw, index)),
            HeaderNormalizer::Mapping(map) => match raw.and_then(|r| map.get(r)) {
                Some(ColumnRename::Name(name)) => Ok(name.clone()),
                Some(ColumnRename::Normalizer(inner)) => inner.normalize(raw, index),
                None => normalize_column(raw, Some(index)),
            },
        }
    }
}

impl fmt::Debug for HeaderNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderNormalizer::Default => f.write_str("Default"),
            HeaderNormalizer::Single(_) => f.write_str("Single(<fn>)"),
            HeaderNormalizer::Indexed(_) => f.write_str("Indexed(<fn>)"),
            HeaderNormalizer::Mapping(map) => f.debug_tuple("Mapping").field(map).finish(),
        }
    }
}
