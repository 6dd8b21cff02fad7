use std::{borrow::Cow, collections::HashMap};

use log::{debug, trace};
use regex::Regex;

use crate::{config::ReplaceConfig, error::ConfigError};

/// Compiled token replacer.
///
/// One regex per instance, reused across every [`apply`](Replacer::apply)
/// call in a run. Values are stringified at compile time, so a computation
/// runs once per run and every occurrence of a token receives the same text.
pub struct Replacer {
    matcher: Option<Regex>,
    replacements: HashMap<String, String>,
    prevent_assignment: bool,
    guard_member_access: bool,
}

impl Replacer {
    pub fn compile(cfg: &ReplaceConfig) -> Result<Self, ConfigError> {
        if cfg.values.is_empty() {
            trace!("No replacement values configured");
            return Ok(Replacer {
                matcher: None,
                replacements: HashMap::new(),
                prevent_assignment: false,
                guard_member_access: false,
            });
        }

        let mut replacements = HashMap::with_capacity(cfg.values.len());
        for (key, value) in &cfg.values {
            replacements.insert(key.clone(), value.stringify(key));
        }

        // Longest token first so "ABC" never half-matches via an "AB" entry.
        let mut keys: Vec<&String> = cfg.values.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = keys.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");

        let (prefix, suffix) = match &cfg.delimiters {
            Some((prefix, suffix)) => (prefix.as_str(), suffix.as_str()),
            None => (r"\b", r"\b"),
        };
        // The token group is named: custom delimiter fragments may carry
        // capture groups of their own, which would shift positional indices.
        let pattern = format!("(?:{prefix})(?P<tok>{alternation})(?:{suffix})");
        debug!("Compiled replace pattern: {}", pattern);
        let matcher = Regex::new(&pattern)
            .map_err(|err| ConfigError::InvalidDelimiters { detail: err.to_string() })?;

        Ok(Replacer {
            matcher: Some(matcher),
            replacements,
            prevent_assignment: cfg.prevent_assignment,
            guard_member_access: cfg.delimiters.is_none(),
        })
    }

    /// Substitute every non-suppressed match in `text`. Returns the input
    /// unchanged when no token matches.
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let Some(matcher) = &self.matcher else {
            return Cow::Borrowed(text);
        };

        let mut out = String::new();
        let mut last = 0;
        for caps in matcher.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(token) = caps.name("tok") else { continue };
            if self.suppressed(text, whole.start(), whole.end()) {
                trace!("Suppressed replacement of '{}' at {}", token.as_str(), whole.start());
                continue;
            }
            let Some(replacement) = self.replacements.get(token.as_str()) else {
                // The alternation is built from the table keys, so a miss
                // here means the pattern and table have diverged.
                debug_assert!(false, "token '{}' missing from replacement table", token.as_str());
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            out.push_str(replacement);
            last = whole.end();
        }

        if last == 0 {
            return Cow::Borrowed(text);
        }
        out.push_str(&text[last..]);
        Cow::Owned(out)
    }

    fn suppressed(&self, text: &str, start: usize, end: usize) -> bool {
        if self.guard_member_access && text[end..].starts_with('.') {
            return true;
        }
        if !self.prevent_assignment {
            return false;
        }
        follows_declaration_keyword(&text[..start]) || leads_assignment_operator(&text[end..])
    }
}

/// True when the text before a match ends with a bare `const`, `let` or
/// `var` keyword.
fn follows_declaration_keyword(before: &str) -> bool {
    let trimmed = before.trim_end();
    for keyword in ["const", "let", "var"] {
        if let Some(head) = trimmed.strip_suffix(keyword) {
            // The keyword must stand alone, not be the tail of an identifier.
            let standalone = head
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric() && c != '_' && c != '$');
            if standalone {
                return true;
            }
        }
    }
    false
}

/// True when the text after a match starts with a single `=` or `:`, i.e. an
/// assignment or type annotation. Behaves like a `[=:][^=:]` lookahead:
/// `==` and `::` do not suppress, and neither does a lone operator at the
/// end of the input, since the lookahead needs a continuation character.
fn leads_assignment_operator(after: &str) -> bool {
    let rest = after.trim_start();
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some('=') | Some(':'), Some(next)) => next != '=' && next != ':',
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReplaceValue;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn replacer_for(values: &[(&str, ReplaceValue)]) -> Replacer {
        let cfg = ReplaceConfig {
            values: values.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            ..Default::default()
        };
        Replacer::compile(&cfg).unwrap()
    }

    #[test]
    fn test_identity_when_no_token_matches() {
        let replacer = replacer_for(&[("__TOKEN__", ReplaceValue::from("x"))]);
        let text = "declare const unrelated: string;";
        assert!(matches!(replacer.apply(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_identity_with_empty_values() {
        let replacer = Replacer::compile(&ReplaceConfig::default()).unwrap();
        let text = "anything at all";
        assert_eq!(replacer.apply(text), text);
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let replacer = replacer_for(&[("__V__", ReplaceValue::from("X"))]);
        let out = replacer.apply("__V__ plus __V__ and __V__");
        assert_eq!(out, "X plus X and X");
    }

    #[test]
    fn test_word_boundary_prevents_partial_match() {
        let replacer = replacer_for(&[("FOO", ReplaceValue::from("bar"))]);
        assert_eq!(replacer.apply("FOOBAR FOO"), "FOOBAR bar");
    }

    #[test]
    fn test_longest_token_matched_first() {
        let replacer = replacer_for(&[
            ("AB", ReplaceValue::from("short")),
            ("ABC", ReplaceValue::from("long")),
        ]);
        assert_eq!(replacer.apply("ABC"), "long");
        assert_eq!(replacer.apply("AB C"), "short C");
    }

    #[test]
    fn test_member_access_guard_with_default_delimiters() {
        let replacer = replacer_for(&[("config", ReplaceValue::from("CFG"))]);
        assert_eq!(replacer.apply("config.value and config"), "config.value and CFG");
    }

    #[test]
    fn test_custom_delimiters_replace_whole_match() {
        let cfg = ReplaceConfig {
            delimiters: Some(("<@".to_string(), "@>".to_string())),
            values: BTreeMap::from([("foo".to_string(), ReplaceValue::from("bar"))]),
            ..Default::default()
        };
        let replacer = Replacer::compile(&cfg).unwrap();
        assert_eq!(replacer.apply("const a = '<@foo@>'; plain foo"), "const a = 'bar'; plain foo");
    }

    #[test]
    fn test_delimiters_with_capture_groups_still_replace() {
        let cfg = ReplaceConfig {
            delimiters: Some(("(<<)".to_string(), "(>>)".to_string())),
            values: BTreeMap::from([("FOO".to_string(), ReplaceValue::from("bar"))]),
            ..Default::default()
        };
        let replacer = Replacer::compile(&cfg).unwrap();
        assert_eq!(replacer.apply("a <<FOO>> b"), "a bar b");
    }

    #[test]
    fn test_custom_delimiters_skip_member_access_guard() {
        let cfg = ReplaceConfig {
            delimiters: Some((r"\b".to_string(), r"\b".to_string())),
            values: BTreeMap::from([("config".to_string(), ReplaceValue::from("CFG"))]),
            ..Default::default()
        };
        let replacer = Replacer::compile(&cfg).unwrap();
        assert_eq!(replacer.apply("config.value"), "CFG.value");
    }

    #[test]
    fn test_prevent_assignment_skips_declarations() {
        let cfg = ReplaceConfig {
            prevent_assignment: true,
            values: BTreeMap::from([("__V__".to_string(), ReplaceValue::from("X"))]),
            ..Default::default()
        };
        let replacer = Replacer::compile(&cfg).unwrap();

        assert_eq!(replacer.apply("const __V__ = 1;"), "const __V__ = 1;");
        assert_eq!(replacer.apply("let __V__ = 1;"), "let __V__ = 1;");
        assert_eq!(replacer.apply("var __V__ = 1;"), "var __V__ = 1;");
        assert_eq!(replacer.apply("__V__: string;"), "__V__: string;");
        // Free-standing occurrences are still replaced.
        assert_eq!(replacer.apply("use(__V__);"), "use(X);");
        // Equality comparison is not an assignment.
        assert_eq!(replacer.apply("if (__V__ === 1) {}"), "if (X === 1) {}");
        // A lone operator at end of input has no continuation character, so
        // it does not suppress.
        assert_eq!(replacer.apply("use __V__ ="), "use X =");
        assert_eq!(replacer.apply("use __V__:"), "use X:");
    }

    #[test]
    fn test_prevent_assignment_off_replaces_declarations() {
        let replacer = replacer_for(&[("__V__", ReplaceValue::from("X"))]);
        assert_eq!(replacer.apply("declare const __V__: string;"), "declare const X: string;");
    }

    #[test]
    fn test_prevent_assignment_ignores_identifier_tails() {
        let cfg = ReplaceConfig {
            prevent_assignment: true,
            values: BTreeMap::from([("__V__".to_string(), ReplaceValue::from("X"))]),
            ..Default::default()
        };
        let replacer = Replacer::compile(&cfg).unwrap();
        // "myvar" ends with "var" but is not a declaration keyword.
        assert_eq!(replacer.apply("myvar __V__;"), "myvar X;");
    }

    #[test]
    fn test_compute_value_invoked_once_per_compile() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let value = ReplaceValue::compute(move |key| {
            counter.fetch_add(1, Ordering::SeqCst);
            ReplaceValue::Str(format!("{key}_fn"))
        });

        let replacer = replacer_for(&[("K", value)]);
        assert_eq!(replacer.apply("K and K and K"), "K_fn and K_fn and K_fn");
        assert_eq!(replacer.apply("more K"), "more K_fn");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_regex_metacharacters_in_tokens_are_escaped() {
        let replacer = replacer_for(&[("a+b", ReplaceValue::from("sum"))]);
        assert_eq!(replacer.apply("x a+b y"), "x sum y");
        assert_eq!(replacer.apply("aab"), "aab");
    }

    #[test]
    fn test_stringified_scalar_values() {
        let replacer = replacer_for(&[
            ("__TRUE__", ReplaceValue::Bool(true)),
            ("__NULL__", ReplaceValue::Null),
            ("__UNDEF__", ReplaceValue::Undefined),
            ("__NUM__", ReplaceValue::from(12i64)),
        ]);
        assert_eq!(
            replacer.apply("__TRUE__ __NULL__ __UNDEF__ __NUM__"),
            "true null undefined 12"
        );
    }
}
