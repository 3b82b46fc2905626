//! Lifecycle keyword classification of free-text `info` annotations.
//!
//! # Invariants
//! - Matching is case-insensitive substring matching (Unicode-aware).
//! - Keywords are matched literally; regex metacharacters are escaped.
//! - An empty keyword list never matches.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STOP_KEYWORDS: &[&str] = &["stop", "arrêt", "arret"];
pub const DEFAULT_DECEASED_KEYWORDS: &[&str] = &[
    "décès", "deces", "décédé", "decede", "deceased", "death", "died", "mort", "†",
];
pub const DEFAULT_DIVORCE_KEYWORDS: &[&str] = &["divorce", "divorcé", "divorced"];

static DEFAULT_CLASSIFIER: Lazy<LifecycleClassifier> = Lazy::new(|| {
    LifecycleClassifier::new(&LifecycleKeywords::default())
        .unwrap_or_else(|_| LifecycleClassifier::never_matching())
});

/// Configurable keyword lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleKeywords {
    pub stop: Vec<String>,
    pub deceased: Vec<String>,
    pub divorce: Vec<String>,
}

impl Default for LifecycleKeywords {
    fn default() -> Self {
        Self {
            stop: to_owned_list(DEFAULT_STOP_KEYWORDS),
            deceased: to_owned_list(DEFAULT_DECEASED_KEYWORDS),
            divorce: to_owned_list(DEFAULT_DIVORCE_KEYWORDS),
        }
    }
}

/// Kind of point-in-time event that ends a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalKind {
    Deceased,
    Divorced,
}

/// Classification of one `info` annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lifecycle {
    pub stop: bool,
    pub final_event: Option<FinalKind>,
}

impl Lifecycle {
    pub fn is_final(&self) -> bool {
        self.final_event.is_some()
    }

    /// Neither stop nor final: an open-ended position update.
    pub fn is_ordinary(&self) -> bool {
        !self.stop && self.final_event.is_none()
    }
}

/// Compiled keyword matchers.
#[derive(Debug, Clone)]
pub struct LifecycleClassifier {
    stop: Option<Regex>,
    deceased: Option<Regex>,
    divorce: Option<Regex>,
}

impl LifecycleClassifier {
    /// Compiles the keyword lists into case-insensitive matchers.
    pub fn new(keywords: &LifecycleKeywords) -> Result<Self, regex::Error> {
        Ok(Self {
            stop: compile(&keywords.stop)?,
            deceased: compile(&keywords.deceased)?,
            divorce: compile(&keywords.divorce)?,
        })
    }

    /// Shared classifier built from the default keyword lists.
    pub fn default_ref() -> &'static Self {
        &DEFAULT_CLASSIFIER
    }

    fn never_matching() -> Self {
        Self {
            stop: None,
            deceased: None,
            divorce: None,
        }
    }

    pub fn classify(&self, info: &str) -> Lifecycle {
        let matches = |matcher: &Option<Regex>| {
            matcher
                .as_ref()
                .map(|regex| regex.is_match(info))
                .unwrap_or(false)
        };

        let final_event = if matches(&self.deceased) {
            Some(FinalKind::Deceased)
        } else if matches(&self.divorce) {
            Some(FinalKind::Divorced)
        } else {
            None
        };

        Lifecycle {
            stop: matches(&self.stop),
            final_event,
        }
    }
}

/// Classifies `info` with the default keyword lists.
pub fn classify(info: &str) -> Lifecycle {
    DEFAULT_CLASSIFIER.classify(info)
}

fn compile(keywords: &[String]) -> Result<Option<Regex>, regex::Error> {
    let alternatives = keywords
        .iter()
        .map(|keyword| keyword.trim())
        .filter(|keyword| !keyword.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>();
    if alternatives.is_empty() {
        return Ok(None);
    }
    Regex::new(&format!("(?i)(?:{})", alternatives.join("|"))).map(Some)
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::{classify, FinalKind, LifecycleClassifier, LifecycleKeywords};

    #[test]
    fn classify_is_case_insensitive() {
        assert!(classify("STOP").stop);
        assert!(classify("Fin de suivi: Stop").stop);
        assert_eq!(classify("DÉCÈS à Nantes").final_event, Some(FinalKind::Deceased));
        assert_eq!(classify("Divorcé").final_event, Some(FinalKind::Divorced));
    }

    #[test]
    fn ordinary_info_has_no_markers() {
        let lifecycle = classify("Mariage à Paris");
        assert!(lifecycle.is_ordinary());
        assert!(classify("").is_ordinary());
    }

    #[test]
    fn deceased_wins_over_divorce_when_both_present() {
        assert_eq!(
            classify("divorce puis décès").final_event,
            Some(FinalKind::Deceased)
        );
    }

    #[test]
    fn stop_and_final_can_coexist() {
        let lifecycle = classify("stop (deceased)");
        assert!(lifecycle.stop);
        assert!(lifecycle.is_final());
    }

    #[test]
    fn custom_keywords_are_escaped_and_empty_lists_never_match() {
        let keywords = LifecycleKeywords {
            stop: vec!["end.".to_string()],
            deceased: Vec::new(),
            divorce: vec!["  ".to_string()],
        };
        let classifier = LifecycleClassifier::new(&keywords).unwrap();
        assert!(classifier.classify("the END.").stop);
        assert!(!classifier.classify("the endx").stop);
        assert!(classifier.classify("décès").is_ordinary());
    }
}
