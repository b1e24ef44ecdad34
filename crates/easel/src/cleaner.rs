// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

enum RuleAction {
    Replace(&'static str),
    Rewrite(fn(&Regex, &str) -> String),
}

struct CleanupRule {
    name: &'static str,
    pattern: Regex,
    action: RuleAction,
}
impl CleanupRule {
    fn replace(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            action: RuleAction::Replace(replacement),
        }
    }
    fn rewrite(name: &'static str, pattern: &str, f: fn(&Regex, &str) -> String) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            action: RuleAction::Rewrite(f),
        }
    }
    fn apply(&self, text: &str) -> String {
        match self.action {
            RuleAction::Replace(replacement) => {
                self.pattern.replace_all(text, replacement).into_owned()
            }
            RuleAction::Rewrite(f) => f(&self.pattern, text),
        }
    }
}

struct RecoveryMarker {
    pattern: Regex,
    keep_marker: bool,
}
impl RecoveryMarker {
    fn new(phrase: &str, keep_marker: bool) -> Self {
        Self {
            pattern: Regex::new(&format!("(?i){}", regex::escape(phrase))).unwrap(),
            keep_marker,
        }
    }
}

static VISUAL_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:chart|visual|graph)").unwrap());

fn strip_bold_ellipsis(pattern: &Regex, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        out.push_str(&text[last..whole.start()]);
        if VISUAL_REFERENCE.is_match(&text[whole.end()..]) {
            out.push_str(whole.as_str());
        } else {
            out.push_str(&caps[1]);
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

fn merge_fragment_chain(pattern: &Regex, text: &str) -> String {
    pattern
        .replace_all(text, |caps: &Captures| {
            let spaced = caps[0].replace('…', " ");
            let words: Vec<&str> = spaced.split_whitespace().collect();
            let mut merged = words.join(" ");
            if spaced.ends_with(' ') {
                merged.push(' ');
            }
            merged
        })
        .into_owned()
}

static RULES: Lazy<Vec<CleanupRule>> = Lazy::new(|| {
    vec![
        CleanupRule::replace("currency_artifacts", r"\$\?{2,}", "$"),
        CleanupRule::rewrite(
            "bold_trailing_ellipsis",
            r"(\*\*[^*\n]+\*\*)[ \t]*(?:\.{3,}|…+)",
            strip_bold_ellipsis,
        ),
        CleanupRule::replace("dot_runs", r"\.{4,}", "..."),
        CleanupRule::replace("ellipsis_runs", r"…{2,}", "…"),
        CleanupRule::replace("whitespace_runs", r"[ \t]{3,}", " "),
        CleanupRule::rewrite(
            "fragment_chains",
            r"(?:\p{L}+[ \t]*…[ \t]*){2,}\p{L}*",
            merge_fragment_chain,
        ),
        CleanupRule::replace(
            "apology_phrases",
            r"(?i)sorry,?\s+(?:it\s+)?(?:looks|seems)\s+like[^.!?\n]*[.!?]?[ \t]*|\boops\b[!.,]*[ \t]*|\blet me (?:try|fix) (?:that|this|again)[^.!?\n]*[.!?]?[ \t]*|\bi apologi[sz]e for the confusion[.!]?[ \t]*|\bwe\s+the\s+okay\b[ \t]*",
            "",
        ),
        CleanupRule::replace(
            "empty_parentheticals",
            r"\((?:[ \t]|[\p{P}&&[^()]])*\)",
            "",
        ),
        CleanupRule::replace("punctuation_lines", r"(?m)^[ \t\p{P}]{10,}$", ""),
        CleanupRule::replace("dot_only_lines", r"(?m)^[ \t.…]+$", ""),
    ]
});

static RECOVERY_MARKERS: Lazy<Vec<RecoveryMarker>> = Lazy::new(|| {
    vec![
        RecoveryMarker::new("Apologies for the glitch.", false),
        RecoveryMarker::new("Apologies for the confusion.", false),
        RecoveryMarker::new("Here's the corrected", true),
        RecoveryMarker::new("Here’s the corrected", true),
        RecoveryMarker::new("Here is the corrected", true),
    ]
});

static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([.!?])").unwrap());
/// Rules re-run after whitespace before punctuation is removed.
const REJOIN_RULES: [&str; 3] = ["dot_runs", "punctuation_lines", "dot_only_lines"];

static SEVERE_CORRUPTION: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\?(?:\s*\?){4,}",
        r"\.{15,}",
        r"…{8,}",
        r"(?is)\bsorry\b.*\boops\b.*\bapologies\b",
        r"(?i)\bwe\s*[….]+\s*the\s*[….]+\s*okay\s*[….]+\s*sorry",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

#[derive(Debug, Clone)]
pub struct TextCleaner {
    min_recovery_tail: usize,
}
impl Default for TextCleaner {
    fn default() -> Self {
        Self::new()
    }
}
impl TextCleaner {
    pub fn new() -> Self {
        Self {
            min_recovery_tail: 50,
        }
    }

    /// Repairs garbled model output before any extraction runs.
    pub fn clean(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }
        let mut text = raw.replace("\r\n", "\n");
        for rule in RULES.iter() {
            let next = rule.apply(&text);
            if next != text {
                debug!(rule = rule.name, "TextCleaner: rule rewrote text");
            }
            text = next;
        }
        if let Some(recovered) = self.recover_tail(&text) {
            text = recovered;
        }
        let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
        let mut text = SPACE_BEFORE_PUNCT
            .replace_all(text.trim(), "$1")
            .into_owned();
        // Joining can rebuild dot runs and punctuation-only lines.
        for rule in RULES.iter().filter(|r| REJOIN_RULES.contains(&r.name)) {
            text = rule.apply(&text);
        }
        EXCESS_NEWLINES
            .replace_all(text.trim(), "\n\n")
            .into_owned()
    }

    fn recover_tail(&self, text: &str) -> Option<String> {
        for marker in RECOVERY_MARKERS.iter() {
            let Some(found) = marker.pattern.find(text) else {
                continue;
            };
            let tail = &text[found.end()..];
            if tail.trim().chars().count() <= self.min_recovery_tail {
                continue;
            }
            debug!(
                marker = found.as_str(),
                dropped = found.start(),
                "TextCleaner: keeping text after recovery marker"
            );
            let start = if marker.keep_marker {
                found.start()
            } else {
                found.end()
            };
            return Some(text[start..].to_string());
        }
        None
    }

    /// Coarse screen for text too damaged to be worth charting.
    pub fn is_corrupted(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return true;
        }
        SEVERE_CORRUPTION.iter().any(|re| re.is_match(text))
    }
}
