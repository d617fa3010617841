use std::time::Instant;

use tracing::{info, info_span};

use readcode_model::{FallbackPolicy, LabeledTable, SourceTable};

use crate::engine::MatchEngine;
use crate::fallback::apply_fallback;
use crate::store::RuleStore;

/// A labeled table together with match statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalized {
    pub table: LabeledTable,
    pub policy: FallbackPolicy,
    /// Records matched by no rule, whatever the policy did with them.
    pub unmatched: usize,
    /// Per-rule match counts aligned with [`RuleStore::list_rules`].
    pub rule_hits: Vec<usize>,
}

/// Label every record of `source` from scratch using the current rules.
pub fn finalize(source: &SourceTable, rules: &RuleStore, policy: FallbackPolicy) -> Finalized {
    let span = info_span!(
        "finalize",
        records = source.len(),
        rules = rules.len(),
        policy = %policy
    );
    let _guard = span.enter();
    let start = Instant::now();

    let outcome = MatchEngine::new(rules).code_table(source);
    let mut codings = outcome.codings;
    let unmatched = apply_fallback(&mut codings, policy);

    info!(
        records = source.len(),
        matched = source.len() - unmatched,
        unmatched,
        duration_ms = start.elapsed().as_millis(),
        "coding complete"
    );

    Finalized {
        table: LabeledTable {
            source: source.clone(),
            codings,
        },
        policy,
        unmatched,
        rule_hits: outcome.rule_hits,
    }
}
