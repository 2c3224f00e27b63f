//! The closed set of languages the judge accepts, and the registry binding
//! each one to a [`LanguagePolicy`](crate::config::LanguagePolicy).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, LanguagePolicy};

/// A submission's language tag.
///
/// Closed by design: adding a language means adding a variant here and a
/// matching entry in configuration, not introducing a new code path
/// elsewhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Python,
    C,
    Cpp,
    Go,
    Cs,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Java,
        Language::Python,
        Language::C,
        Language::Cpp,
        Language::Go,
        Language::Cs,
    ];

    /// The canonical lowercase tag used as a configuration key and route
    /// segment (e.g. `/cpp`).
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Cs => "cs",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(Language::Java),
            "python" => Ok(Language::Python),
            "c" => Ok(Language::C),
            "cpp" | "c++" => Ok(Language::Cpp),
            "go" | "golang" => Ok(Language::Go),
            "cs" | "csharp" | "c#" => Ok(Language::Cs),
            other => Err(UnknownLanguage(other.to_owned())),
        }
    }
}

/// The process-wide mapping from [`Language`] to its build-and-run policy.
///
/// Built once from [`Config`] at startup; cheap to clone (an `Arc` around an
/// immutable map), so handing a copy to every judging task costs a refcount
/// bump, not a map copy. Registration after startup (tests, plugins) is
/// expressed as constructing a new `LanguageRegistry`, not mutating this one
/// in place, which keeps concurrent readers lock-free.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    policies: Arc<HashMap<Language, LanguagePolicy>>,
}

impl LanguageRegistry {
    /// Build a registry from the subset of `config.languages` whose keys
    /// parse as a known [`Language`]. Keys that don't match a variant are
    /// ignored rather than rejected, since a configuration file is free to
    /// carry entries (e.g. a future language) the running binary doesn't yet
    /// recognize.
    pub fn from_config(config: &Config) -> Self {
        let mut policies = HashMap::with_capacity(Language::ALL.len());
        for (id, policy) in &config.languages {
            if let Ok(language) = id.parse::<Language>() {
                policies.insert(language, policy.clone());
            }
        }
        Self {
            policies: Arc::new(policies),
        }
    }

    /// Register (or replace) a single language's policy, returning a new
    /// registry. Existing clones of `self` are unaffected.
    #[must_use]
    pub fn register(&self, language: Language, policy: LanguagePolicy) -> Self {
        let mut policies = (*self.policies).clone();
        policies.insert(language, policy);
        Self {
            policies: Arc::new(policies),
        }
    }

    /// Look up the policy for a language.
    pub fn get(&self, language: Language) -> Result<&LanguagePolicy, UnknownLanguage> {
        self.policies
            .get(&language)
            .ok_or_else(|| UnknownLanguage(language.as_str().to_owned()))
    }

    /// Whether a language tag is recognized by this registry (used by the
    /// request validator, which must reject unrecognized languages before
    /// any sandbox work happens).
    pub fn contains(&self, language: Language) -> bool {
        self.policies.contains_key(&language)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Language, &LanguagePolicy)> {
        self.policies.iter()
    }
}
