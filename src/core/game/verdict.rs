use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Human,
    #[serde(rename = "AI")]
    Ai,
    Unknown,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Human => "Human",
            Verdict::Ai => "AI",
            Verdict::Unknown => "Unknown",
        }
    }

    /// Reads a stored verdict; anything unrecognized is `Unknown`.
    pub fn from_stored(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "human" => Verdict::Human,
            "ai" => Verdict::Ai,
            _ => Verdict::Unknown,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictExtraction {
    pub verdict: Verdict,
    pub cleaned: String,
}

fn verdict_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(?i)Final Verdict:\s*(Human|AI)").expect("verdict marker regex")
    })
}

fn verdict_line() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| Regex::new(r"(?im)^\s*Final Verdict:.*$").expect("verdict line regex"))
}

/// The marker is the only source of truth: no marker means `Unknown`, and
/// the text is then returned trimmed but otherwise untouched.
pub fn extract_verdict(raw: &str) -> VerdictExtraction {
    let trimmed = raw.trim();

    let Some(captures) = verdict_marker().captures(trimmed) else {
        return VerdictExtraction {
            verdict: Verdict::Unknown,
            cleaned: trimmed.to_string(),
        };
    };

    let verdict = match captures.get(1).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(token) if token == "human" => Verdict::Human,
        Some(_) => Verdict::Ai,
        None => Verdict::Unknown,
    };
    let cleaned = verdict_line().replace_all(trimmed, "").trim().to_string();

    VerdictExtraction { verdict, cleaned }
}
