use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::convert::{self, ConvertResult};
use crate::{CsvResult, TypeError, Value};

type ConvertFn = dyn Fn(Value) -> ConvertResult + Send + Sync;

/// A single-argument value conversion.
#[derive(Clone)]
pub struct Converter(Arc<ConvertFn>);

impl Converter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> ConvertResult + Send + Sync + 'static,
    {
        Converter(Arc::new(f))
    }

    pub fn call(&self, value: Value) -> ConvertResult {
        (self.0)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Converter(<fn>)")
    }
}

/// Converters keyed by type name.
///
/// Keys are compared after trimming and lowercasing, so `"Integer!"` and
/// `"integer!"` are the same type. `reset` restores the snapshot the registry
/// was created with.
///
/// A registry shared between threads must not be mutated while rows that
/// depend on it are being built; `RowBuilder` resolves its converters once,
/// at construction.
#[derive(Clone, Debug)]
pub struct ConverterRegistry {
    converters: BTreeMap<String, Converter>,
    defaults: Arc<BTreeMap<String, Converter>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// Registry holding the default converter set.
    pub fn new() -> Self {
        Self::with_defaults(default_converters())
    }

    /// Registry whose reset snapshot is `defaults`.
    pub fn with_defaults<K, I>(defaults: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Converter)>,
    {
        let defaults: BTreeMap<String, Converter> = defaults
            .into_iter()
            .map(|(k, c)| (to_key(k.as_ref()), c))
            .collect();
        Self {
            converters: defaults.clone(),
            defaults: Arc::new(defaults),
        }
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> Vec<&str> {
        self.converters.keys().map(String::as_str).collect()
    }

    pub fn register(&mut self, key: &str, converter: Converter) -> Result<&mut Self, TypeError> {
        let key = to_key(key);
        if self.converters.contains_key(&key) {
            return Err(TypeError::TypeExists(key));
        }
        self.converters.insert(key, converter);
        Ok(self)
    }

    pub fn unregister(&mut self, key: &str) -> Result<&mut Self, TypeError> {
        match self.converters.remove(&to_key(key)) {
            Some(_) => Ok(self),
            None => Err(TypeError::UnknownType(key.to_string())),
        }
    }

    pub fn lookup(&self, key: &str) -> Result<&Converter, TypeError> {
        self.converters
            .get(&to_key(key))
            .ok_or_else(|| TypeError::UnknownType(key.to_string()))
    }

    pub fn has(&self, key: &str) -> bool {
        self.converters.contains_key(&to_key(key))
    }

    /// `lookup(key)` then call it with `value`.
    pub fn apply(&self, value: Value, key: &str) -> CsvResult<Value> {
        Ok(self.lookup(key)?.call(value)?)
    }

    pub fn reset(&mut self) -> &mut Self {
        self.converters = (*self.defaults).clone();
        self
    }
}

fn to_key(key: &str) -> String {
    key.trim().to_lowercase()
}

fn default_converters() -> Vec<(&'static str, Converter)> {
    vec![
        ("decimal!", Converter::new(convert::strict_decimal)),
        ("integer!", Converter::new(convert::strict_integer)),
        ("date!", Converter::new(convert::strict_date)),
        ("datetime!", Converter::new(convert::strict_datetime)),
        ("symbol!", Converter::new(convert::strict_symbol)),
        ("downcase!", Converter::new(convert::strict_downcase)),
        ("upcase!", Converter::new(convert::strict_upcase)),
        ("boolean!", Converter::new(convert::strict_boolean)),
        ("strip!", Converter::new(convert::strict_strip)),
        ("decimal", Converter::new(convert::decimal)),
        ("decimal_or_zero", Converter::new(convert::decimal_or_zero)),
        ("integer", Converter::new(convert::integer)),
        ("integer_or_zero", Converter::new(convert::integer_or_zero)),
        ("date", Converter::new(convert::date)),
        ("datetime", Converter::new(convert::datetime)),
        ("symbol", Converter::new(convert::symbol)),
        ("downcase", Converter::new(convert::downcase)),
        ("upcase", Converter::new(convert::upcase)),
        ("boolean", Converter::new(convert::boolean)),
        ("strip", Converter::new(convert::strip)),
        ("sha256", Converter::new(convert::sha256)),
        ("hex", Converter::new(convert::random_hex)),
        ("nil", Converter::new(convert::nil)),
        ("blank", Converter::new(convert::blank)),
        ("header_column", Converter::new(convert::header_column)),
    ]
}
