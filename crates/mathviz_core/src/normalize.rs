//! Textual repair of generated scene code.
//!
//! Repairs are ordered tables of `(find, replace)` pairs. Normalization
//! repeats passes while they shorten the text; the retry repair is a single
//! pass. Text outside the matched substrings is left untouched.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// One configured substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    /// Literal text (or regex when `regex` is set) to find
    pub find: String,
    /// Replacement; `$1`-style group references when `regex` is set
    pub replace: String,
    #[serde(default)]
    pub regex: bool,
}

impl Substitution {
    pub fn literal(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
            regex: false,
        }
    }

    pub fn regex(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
            regex: true,
        }
    }
}

/// Repairs applied to every generated script before the first render.
///
/// A doubled backslash or a doubled `\f` in front of `frac` collapses to `\frac`.
pub fn default_normalize_table() -> Vec<Substitution> {
    vec![
        Substitution::literal(r"\f\frac", r"\frac"),
        Substitution::literal(r"\\frac", r"\frac"),
    ]
}

/// Repairs applied once after a failed first render.
///
/// Restores `\frac{` where the escape was lost, either eaten into a form feed
/// or dropped entirely.
pub fn default_retry_table() -> Vec<Substitution> {
    vec![
        Substitution::literal("\u{0c}rac{", r"\frac{"),
        Substitution::regex(r"(^|[^A-Za-z\\])rac\{", r"${1}\frac{"),
    ]
}

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    Pattern(Regex),
}

#[derive(Debug, Clone)]
struct CompiledSubstitution {
    matcher: Matcher,
    replace: String,
}

impl CompiledSubstitution {
    fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.matcher {
            Matcher::Literal(find) => {
                if text.contains(find.as_str()) {
                    Cow::Owned(text.replace(find.as_str(), &self.replace))
                } else {
                    Cow::Borrowed(text)
                }
            }
            Matcher::Pattern(regex) => regex.replace_all(text, self.replace.as_str()),
        }
    }
}

/// A compiled, ordered substitution table.
#[derive(Debug, Clone)]
pub struct SubstitutionTable {
    entries: Vec<CompiledSubstitution>,
}

impl SubstitutionTable {
    /// Compile a table, rejecting empty patterns and invalid regexes.
    pub fn compile(substitutions: &[Substitution]) -> PipelineResult<Self> {
        let mut entries = Vec::with_capacity(substitutions.len());
        for sub in substitutions {
            if sub.find.is_empty() {
                return Err(PipelineError::Config(
                    "Substitution with empty pattern".to_string(),
                ));
            }
            let matcher = if sub.regex {
                let regex = Regex::new(&sub.find).map_err(|e| {
                    PipelineError::Config(format!("Invalid repair regex '{}': {}", sub.find, e))
                })?;
                Matcher::Pattern(regex)
            } else {
                Matcher::Literal(sub.find.clone())
            };
            entries.push(CompiledSubstitution {
                matcher,
                replace: sub.replace.clone(),
            });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One pass of every entry, in order.
    pub fn apply_once(&self, text: &str) -> String {
        let mut current = text.to_string();
        for entry in &self.entries {
            if let Cow::Owned(next) = entry.apply(&current) {
                current = next;
            }
        }
        current
    }

    /// Apply passes while each one shortens the text.
    ///
    /// Tables that only delete characters (the built-in normalize table)
    /// reach a fixpoint, so the result is idempotent. A pass that leaves the
    /// length unchanged or grows the text is kept and ends the loop, which
    /// makes entries like `rac{ -> \frac{` apply exactly once.
    pub fn apply(&self, text: &str) -> String {
        let mut current = text.to_string();
        loop {
            let next = self.apply_once(&current);
            let shrank = next.len() < current.len();
            if next.len() > current.len() {
                debug!("Repair pass grew text from {} to {} bytes", current.len(), next.len());
            }
            current = next;
            if !shrank {
                return current;
            }
        }
    }
}

/// Normalize code with the built-in table.
pub fn normalize(code: &str) -> String {
    static TABLE: OnceLock<SubstitutionTable> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            SubstitutionTable::compile(&default_normalize_table())
                .expect("built-in normalize table compiles")
        })
        .apply(code)
}
