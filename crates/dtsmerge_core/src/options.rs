use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use path_clean::PathClean;
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

use crate::error::ConfigError;

/// A path specifier: a single literal path or glob pattern, or a list of
/// segments joined into one path.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathSpec {
    Plain(String),
    Segments(Vec<String>),
}

impl PathSpec {
    /// The specifier as a single slash-joined string.
    pub fn raw(&self) -> String {
        match self {
            PathSpec::Plain(s) => s.clone(),
            PathSpec::Segments(parts) => parts.join("/"),
        }
    }

    /// Join the specifier onto `root` and lexically normalize the result.
    pub fn join(&self, root: &Path) -> PathBuf {
        root.join(self.raw()).clean()
    }

    /// Whether the specifier contains glob metacharacters.
    pub fn is_glob(&self) -> bool {
        has_glob_meta(&self.raw())
    }
}

impl From<&str> for PathSpec {
    fn from(s: &str) -> Self {
        PathSpec::Plain(s.to_string())
    }
}

pub(crate) fn has_glob_meta(s: &str) -> bool {
    s.chars().any(|c| matches!(c, '*' | '?' | '[' | '{'))
}

/// A replacement value: the scalar kinds the merger can stringify, or a
/// computation invoked with the token key. `Undefined` and `Compute` exist
/// only on the API side; JSON cannot express them.
#[derive(Clone)]
pub enum ReplaceValue {
    Str(String),
    Num(serde_json::Number),
    Bool(bool),
    Null,
    Undefined,
    Compute(Arc<dyn Fn(&str) -> ReplaceValue + Send + Sync>),
}

impl ReplaceValue {
    pub fn compute<F>(f: F) -> Self
    where
        F: Fn(&str) -> ReplaceValue + Send + Sync + 'static,
    {
        ReplaceValue::Compute(Arc::new(f))
    }

    /// Convert a JSON value, rejecting objects and arrays with the offending
    /// key and kind named.
    pub fn from_json(key: &str, value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Null => Ok(ReplaceValue::Null),
            Value::String(s) => Ok(ReplaceValue::Str(s)),
            Value::Number(n) => Ok(ReplaceValue::Num(n)),
            Value::Bool(b) => Ok(ReplaceValue::Bool(b)),
            Value::Array(_) => {
                Err(ConfigError::UnsupportedValue { key: key.to_string(), kind: "array" })
            }
            Value::Object(_) => {
                Err(ConfigError::UnsupportedValue { key: key.to_string(), kind: "object" })
            }
        }
    }

    /// Resolve the value to its replacement text. A computation is called
    /// with the token key and its result stringified in turn; the replacer
    /// does this once at compile time, never per match.
    pub fn stringify(&self, key: &str) -> String {
        match self {
            ReplaceValue::Str(s) => s.clone(),
            ReplaceValue::Num(n) => n.to_string(),
            ReplaceValue::Bool(b) => b.to_string(),
            ReplaceValue::Null => "null".to_string(),
            ReplaceValue::Undefined => "undefined".to_string(),
            ReplaceValue::Compute(f) => f(key).stringify(key),
        }
    }
}

impl fmt::Debug for ReplaceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            ReplaceValue::Num(n) => f.debug_tuple("Num").field(n).finish(),
            ReplaceValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            ReplaceValue::Null => f.write_str("Null"),
            ReplaceValue::Undefined => f.write_str("Undefined"),
            ReplaceValue::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

impl From<&str> for ReplaceValue {
    fn from(s: &str) -> Self {
        ReplaceValue::Str(s.to_string())
    }
}

impl From<String> for ReplaceValue {
    fn from(s: String) -> Self {
        ReplaceValue::Str(s)
    }
}

impl From<bool> for ReplaceValue {
    fn from(b: bool) -> Self {
        ReplaceValue::Bool(b)
    }
}

impl From<i64> for ReplaceValue {
    fn from(n: i64) -> Self {
        ReplaceValue::Num(serde_json::Number::from(n))
    }
}

fn de_values<'de, D>(deserializer: D) -> Result<BTreeMap<String, ReplaceValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    let mut values = BTreeMap::new();
    for (key, value) in raw {
        let parsed = ReplaceValue::from_json(&key, value).map_err(de::Error::custom)?;
        values.insert(key, parsed);
    }
    Ok(values)
}

/// The `replace` options block, deep-partial.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ReplaceOptions {
    /// `[prefix, suffix]` regex fragments bounding each token. When absent,
    /// tokens match on word boundaries and a trailing `.` suppresses the
    /// match (member access).
    pub delimiters: Option<[String; 2]>,

    /// Skip tokens sitting in assignment or type-annotation position.
    pub prevent_assignment: bool,

    #[serde(deserialize_with = "de_values")]
    pub values: BTreeMap<String, ReplaceValue>,
}

/// Deep-partial options accepted by [`dts_merger`](crate::dts_merger). Every
/// field is optional; the JSON form uses camelCase keys.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MergeOptions {
    /// Project root; defaults to the current working directory.
    pub root: Option<PathBuf>,

    /// Paths or glob patterns to search for declaration files. Defaults to
    /// the `src` directory.
    pub include: Vec<PathSpec>,

    /// Paths or glob patterns to skip. Excluded directories are not
    /// descended into.
    pub exclude: Vec<PathSpec>,

    /// Destination declaration file. Defaults to `dist/index.d.ts`.
    pub merge_into: Option<PathSpec>,

    /// Escalate a missing merge target from a warning to an error.
    pub fail_on_missing_target: bool,

    /// Run the replacer over the target's pre-existing content before
    /// appending anything.
    pub replace_target: bool,

    pub replace: ReplaceOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_empty_json() {
        let options: MergeOptions = serde_json::from_str("{}").unwrap();
        assert!(options.root.is_none());
        assert!(options.include.is_empty());
        assert!(options.exclude.is_empty());
        assert!(options.merge_into.is_none());
        assert!(!options.fail_on_missing_target);
        assert!(!options.replace_target);
        assert!(options.replace.values.is_empty());
    }

    #[test]
    fn test_options_from_camel_case_json() {
        let json = r#"{
            "include": ["src", ["types", "extra"]],
            "exclude": ["src/internal"],
            "mergeInto": ["dist", "index.d.ts"],
            "replaceTarget": true,
            "replace": {
                "preventAssignment": true,
                "values": { "__VERSION__": "1.2.3", "__DEV__": false, "__N__": 7, "__NIL__": null }
            }
        }"#;
        let options: MergeOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.include.len(), 2);
        assert_eq!(options.include[1].raw(), "types/extra");
        assert_eq!(options.merge_into.unwrap().raw(), "dist/index.d.ts");
        assert!(options.replace_target);
        assert!(options.replace.prevent_assignment);
        assert_eq!(options.replace.values.len(), 4);
        assert_eq!(options.replace.values["__VERSION__"].stringify("__VERSION__"), "1.2.3");
        assert_eq!(options.replace.values["__DEV__"].stringify("__DEV__"), "false");
        assert_eq!(options.replace.values["__N__"].stringify("__N__"), "7");
        assert_eq!(options.replace.values["__NIL__"].stringify("__NIL__"), "null");
    }

    #[test]
    fn test_options_reject_object_value() {
        let json = r#"{ "replace": { "values": { "BAD": { "nested": 1 } } } }"#;
        let err = serde_json::from_str::<MergeOptions>(json).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("BAD"), "unexpected message: {message}");
        assert!(message.contains("object"), "unexpected message: {message}");
    }

    #[test]
    fn test_options_reject_array_value() {
        let json = r#"{ "replace": { "values": { "BAD": [1, 2] } } }"#;
        let err = serde_json::from_str::<MergeOptions>(json).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_options_reject_wrong_delimiter_arity() {
        let json = r#"{ "replace": { "delimiters": ["<@"] } }"#;
        assert!(serde_json::from_str::<MergeOptions>(json).is_err());

        let json = r#"{ "replace": { "delimiters": ["<@", "@>", "!"] } }"#;
        assert!(serde_json::from_str::<MergeOptions>(json).is_err());
    }

    #[test]
    fn test_options_reject_unknown_field() {
        let json = r#"{ "includes": ["src"] }"#;
        assert!(serde_json::from_str::<MergeOptions>(json).is_err());
    }

    #[test]
    fn test_path_spec_glob_detection() {
        assert!(PathSpec::from("src/**/*.d.ts").is_glob());
        assert!(PathSpec::from("types/*.d.ts").is_glob());
        assert!(!PathSpec::from("src/types.d.ts").is_glob());
        assert!(!PathSpec::Segments(vec!["dist".into(), "index.d.ts".into()]).is_glob());
    }

    #[test]
    fn test_path_spec_join_cleans() {
        let joined = PathSpec::from("src/../types").join(Path::new("/project"));
        assert_eq!(joined, PathBuf::from("/project/types"));
    }

    #[test]
    fn test_stringify_scalars() {
        assert_eq!(ReplaceValue::Null.stringify("k"), "null");
        assert_eq!(ReplaceValue::Undefined.stringify("k"), "undefined");
        assert_eq!(ReplaceValue::from(true).stringify("k"), "true");
        assert_eq!(ReplaceValue::from(42i64).stringify("k"), "42");
        assert_eq!(ReplaceValue::from("text").stringify("k"), "text");
    }

    #[test]
    fn test_stringify_compute_receives_key() {
        let value = ReplaceValue::compute(|key| ReplaceValue::Str(format!("{key}_fn")));
        assert_eq!(value.stringify("K"), "K_fn");
    }

    #[test]
    fn test_stringify_compute_recurses() {
        let value = ReplaceValue::compute(|_| ReplaceValue::compute(|_| ReplaceValue::Bool(true)));
        assert_eq!(value.stringify("k"), "true");
    }
}
