//! Rule storage for interactive coding sessions.
//!
//! Rules are kept as an append-only log of `(code, phrase, added_at)` entries.
//! Removing a phrase retires its log entry instead of rewriting history, so
//! the global order of the remaining rules is exactly the order in which the
//! operator entered them. That order is the match precedence: a later entry
//! overrides an earlier one on every record both match.

use tracing::debug;

use readcode_model::Code;

/// One active rule as seen by the match pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule<'a> {
    pub code: Code,
    pub phrase: &'a str,
}

/// Phrases currently assigned to one code, in entry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGroup<'a> {
    pub code: Code,
    pub phrases: Vec<&'a str>,
}

#[derive(Debug, Clone)]
struct RuleEntry {
    code: Code,
    phrase: String,
    added_at: u64,
    retired: bool,
}

/// Ordered phrase rules owned by a coding session.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    log: Vec<RuleEntry>,
    codes: Vec<Code>,
    next_seq: u64,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a code with no phrases yet. Returns true when the code is new.
    pub fn declare_code(&mut self, code: Code) -> bool {
        if self.codes.contains(&code) {
            return false;
        }
        self.codes.push(code);
        debug!(%code, "code declared");
        true
    }

    /// Append `phrase` under `code`.
    ///
    /// Blank phrases are ignored entirely and leave the store unchanged.
    /// Duplicates are accepted and take the newest position in the global
    /// order. Returns true when a rule was added.
    pub fn add_phrase(&mut self, code: Code, phrase: impl Into<String>) -> bool {
        let phrase = phrase.into();
        if phrase.trim().is_empty() {
            debug!(%code, "blank phrase ignored");
            return false;
        }
        self.declare_code(code);
        let added_at = self.next_seq;
        self.next_seq += 1;
        debug!(%code, phrase = %phrase, added_at, "phrase added");
        self.log.push(RuleEntry {
            code,
            phrase,
            added_at,
            retired: false,
        });
        true
    }

    /// Remove one occurrence of `phrase` under `code`, the oldest one.
    ///
    /// Absent phrases are a silent no-op. The code stays listed even when its
    /// last phrase goes. Returns true when a rule was removed.
    pub fn remove_phrase(&mut self, code: Code, phrase: &str) -> bool {
        let target = self
            .log
            .iter_mut()
            .find(|entry| !entry.retired && entry.code == code && entry.phrase == phrase);
        match target {
            Some(entry) => {
                entry.retired = true;
                debug!(%code, phrase, added_at = entry.added_at, "phrase removed");
                true
            }
            None => {
                debug!(%code, phrase, "remove ignored: phrase not present");
                false
            }
        }
    }

    /// Active rules in global entry order, interleaved across codes.
    pub fn list_rules(&self) -> impl Iterator<Item = Rule<'_>> + '_ {
        self.log
            .iter()
            .filter(|entry| !entry.retired)
            .map(|entry| Rule {
                code: entry.code,
                phrase: entry.phrase.as_str(),
            })
    }

    /// Phrases for `code`; `None` when the code was never entered.
    pub fn phrases(&self, code: Code) -> Option<Vec<&str>> {
        if !self.codes.contains(&code) {
            return None;
        }
        Some(
            self.list_rules()
                .filter(|rule| rule.code == code)
                .map(|rule| rule.phrase)
                .collect(),
        )
    }

    /// Rules grouped by code in first-entered code order, including codes
    /// whose phrases were all removed.
    pub fn groups(&self) -> Vec<CodeGroup<'_>> {
        self.codes
            .iter()
            .map(|&code| CodeGroup {
                code,
                phrases: self
                    .list_rules()
                    .filter(|rule| rule.code == code)
                    .map(|rule| rule.phrase)
                    .collect(),
            })
            .collect()
    }

    pub fn contains_code(&self, code: Code) -> bool {
        self.codes.contains(&code)
    }

    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    /// Number of active rules.
    pub fn len(&self) -> usize {
        self.log.iter().filter(|entry| !entry.retired).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every rule and code, as when a new source table is loaded.
    pub fn clear(&mut self) {
        self.log.clear();
        self.codes.clear();
        self.next_seq = 0;
    }
}
