use std::fmt;

use async_trait::async_trait;
use regex::Regex;

/// Label explaining why a message was flagged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViolationKind(pub String);

impl ViolationKind {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Violation(ViolationKind),
}

/// Decides whether message text breaks the rules.
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Verdict;
}

#[derive(Clone, Debug)]
pub struct KeywordRules {
    pub banned_words: Vec<String>,
    pub block_links: bool,
    pub max_mentions: usize,
}

// A run of this many identical characters counts as spam.
const SPAM_RUN: usize = 12;

/// Regex/keyword heuristic: profanity, links, then spam.
pub struct KeywordClassifier {
    banned: Option<Regex>,
    link: Option<Regex>,
    mention: Regex,
    max_mentions: usize,
}

impl KeywordClassifier {
    pub fn new(rules: KeywordRules) -> Self {
        let words = rules
            .banned_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>();
        let banned = if words.is_empty() {
            None
        } else {
            match Regex::new(&format!(r"(?i)\b(?:{})\b", words.join("|"))) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!("banned word filter disabled: {e}");
                    None
                }
            }
        };

        let link = rules.block_links.then(|| {
            Regex::new(r"(?i)(?:https?://|www\.|discord(?:\.gg|app\.com/invite|\.com/invite)/)\S+")
                .expect("valid regex")
        });

        Self {
            banned,
            link,
            mention: Regex::new(r"<@[!&]?\d+>").expect("valid regex"),
            max_mentions: rules.max_mentions,
        }
    }

    pub fn check(&self, text: &str) -> Verdict {
        if self.banned.as_ref().is_some_and(|re| re.is_match(text)) {
            return Verdict::Violation(ViolationKind::new("profanity"));
        }
        if self.link.as_ref().is_some_and(|re| re.is_match(text)) {
            return Verdict::Violation(ViolationKind::new("link"));
        }
        if longest_run(text) >= SPAM_RUN || self.mention.find_iter(text).count() > self.max_mentions
        {
            return Verdict::Violation(ViolationKind::new("spam"));
        }
        Verdict::Clean
    }
}

#[async_trait]
impl ContentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Verdict {
        self.check(text)
    }
}

fn longest_run(text: &str) -> usize {
    let mut best = 0;
    let mut run = 0;
    let mut prev = None;
    for c in text.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            run = 1;
            prev = Some(c);
        }
        best = best.max(run);
    }
    best
}
