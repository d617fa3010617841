//! Last-rule-wins substring matching.

use tracing::trace;

use readcode_model::{Coding, SourceTable};

use crate::store::RuleStore;

/// Result of one match pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// One coding per record, in record order.
    pub codings: Vec<Coding>,
    /// Records each active rule matched, in rule order, counted before later
    /// rules override them.
    pub rule_hits: Vec<usize>,
}

/// Applies a [`RuleStore`] to record texts.
///
/// Every pass starts from unset codings and replays the active rules oldest
/// first. A record's final coding is the code of the last rule whose phrase
/// it contains, compared case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct MatchEngine<'a> {
    rules: &'a RuleStore,
}

impl<'a> MatchEngine<'a> {
    pub fn new(rules: &'a RuleStore) -> Self {
        Self { rules }
    }

    pub fn code_table(&self, table: &SourceTable) -> MatchOutcome {
        self.code_texts(table.texts())
    }

    pub fn code_texts<I, S>(&self, texts: I) -> MatchOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let folded: Vec<String> = texts
            .into_iter()
            .map(|text| text.as_ref().to_lowercase())
            .collect();
        let mut codings = vec![Coding::Unset; folded.len()];
        let mut rule_hits = Vec::new();

        for rule in self.rules.list_rules() {
            let needle = rule.phrase.to_lowercase();
            if needle.is_empty() {
                rule_hits.push(0);
                continue;
            }
            let mut hits = 0usize;
            for (coding, text) in codings.iter_mut().zip(&folded) {
                if text.contains(needle.as_str()) {
                    *coding = Coding::Coded(rule.code);
                    hits += 1;
                }
            }
            trace!(code = %rule.code, phrase = rule.phrase, hits, "rule applied");
            rule_hits.push(hits);
        }

        MatchOutcome { codings, rule_hits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readcode_model::Code;

    fn coded(value: i64) -> Coding {
        Coding::Coded(Code::new(value))
    }

    #[test]
    fn matching_ignores_case() {
        let mut store = RuleStore::new();
        store.add_phrase(Code::new(1), "Disease");
        let outcome = MatchEngine::new(&store).code_texts(["patient has disease", "clear"]);
        assert_eq!(outcome.codings, vec![coded(1), Coding::Unset]);
    }

    #[test]
    fn later_rule_overrides_regardless_of_code_value() {
        let mut store = RuleStore::new();
        store.add_phrase(Code::new(5), "a");
        store.add_phrase(Code::new(2), "a");
        let outcome = MatchEngine::new(&store).code_texts(["a"]);
        assert_eq!(outcome.codings, vec![coded(2)]);
    }

    #[test]
    fn shorter_later_phrase_beats_longer_earlier_one() {
        let mut store = RuleStore::new();
        store.add_phrase(Code::new(1), "pleural effusion");
        store.add_phrase(Code::new(2), "effusion");
        let outcome =
            MatchEngine::new(&store).code_texts(["small pleural effusion", "pericardial effusion"]);
        assert_eq!(outcome.codings, vec![coded(2), coded(2)]);
        assert_eq!(outcome.rule_hits, vec![1, 2]);
    }

    #[test]
    fn substring_match_crosses_word_boundaries() {
        let mut store = RuleStore::new();
        store.add_phrase(Code::new(7), "tension");
        let outcome = MatchEngine::new(&store).code_texts(["HYPERTENSION"]);
        assert_eq!(outcome.codings, vec![coded(7)]);
    }

    #[test]
    fn empty_texts_and_empty_store() {
        let store = RuleStore::new();
        let outcome = MatchEngine::new(&store).code_texts(["", "anything"]);
        assert_eq!(outcome.codings, vec![Coding::Unset, Coding::Unset]);
        assert!(outcome.rule_hits.is_empty());
    }

    #[test]
    fn matches_non_ascii_text() {
        let mut store = RuleStore::new();
        store.add_phrase(Code::new(3), "결절");
        store.add_phrase(Code::new(4), "ÉPANCHEMENT");
        let outcome = MatchEngine::new(&store).code_texts(["폐 결절 소견", "épanchement pleural"]);
        assert_eq!(outcome.codings, vec![coded(3), coded(4)]);
    }
}
