//! Terminal rendering of session replies.

use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use readcode_model::{CODING_COLUMN, Code, Coding, FallbackPolicy};
use readcode_rules::{Finalized, RuleStore};

use crate::script::HELP;
use crate::session::{Reply, Session};

/// Text shown to the operator for `reply`.
pub fn render_reply(session: &Session, reply: &Reply) -> String {
    match reply {
        Reply::LoggedIn => "Logged in.".to_string(),
        Reply::Loaded {
            path,
            records,
            columns,
            text_column,
            dropped_coding_column,
        } => {
            let mut text = format!(
                "Loaded {} ({records} records, {columns} columns, text column {text_column:?}).",
                path.display()
            );
            if *dropped_coding_column {
                text.push_str(&format!(
                    " Its existing `{CODING_COLUMN}` column was dropped; the export writes a new one."
                ));
            }
            text
        }
        Reply::CodeDeclared { code, created } => {
            if *created {
                format!("Code {code} declared.")
            } else {
                format!("Code {code} already exists.")
            }
        }
        Reply::PhraseAdded {
            code,
            phrase,
            added,
        } => {
            if *added {
                format!("Added {phrase:?} to code {code}.")
            } else {
                "Blank phrase ignored.".to_string()
            }
        }
        Reply::PhraseRemoved {
            code,
            phrase,
            removed,
        } => {
            if *removed {
                format!("Removed {phrase:?} from code {code}.")
            } else {
                format!("Code {code} has no phrase {phrase:?}; nothing removed.")
            }
        }
        Reply::Rules => rules_listing(session.rules()),
        Reply::FallbackSet(policy) => format!("Unmatched records will be {}.", policy_label(*policy)),
        Reply::Finalized {
            records,
            unmatched,
            policy,
        } => format!(
            "Labeled {records} records; {unmatched} matched no rule and were {}.",
            policy_label(*policy)
        ),
        Reply::Preview { rows } => preview_table(session, *rows)
            .map(|table| table.to_string())
            .unwrap_or_else(|| "No source table loaded.".to_string()),
        Reply::Summary => match session.finalized() {
            Some(finalized) => format!(
                "{}\n{}",
                coding_table(finalized),
                rule_hits_table(session.rules(), finalized)
            ),
            None => "Nothing finalized yet.".to_string(),
        },
        Reply::Exported { path, format } => {
            format!("Wrote {} ({}).", path.display(), format.mime_type())
        }
        Reply::Help => HELP.to_string(),
        Reply::Quit => "Bye.".to_string(),
    }
}

fn policy_label(policy: FallbackPolicy) -> &'static str {
    match policy {
        FallbackPolicy::ZeroFill => "coded 0",
        FallbackPolicy::MissingFill => "left empty",
    }
}

/// Grouped view followed by match order, or a note when there are no codes.
pub fn rules_listing(rules: &RuleStore) -> String {
    if rules.codes().is_empty() {
        return "No codes entered yet.".to_string();
    }
    if rules.is_empty() {
        return rules_table(rules).to_string();
    }
    format!("{}\n{}", rules_table(rules), rule_order_table(rules))
}

/// Phrases grouped by code, codes in first-entry order.
pub fn rules_table(rules: &RuleStore) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Code"), header_cell("Phrases")]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for group in rules.groups() {
        let phrases = if group.phrases.is_empty() {
            dim_cell("(no phrases)")
        } else {
            Cell::new(group.phrases.join("\n"))
        };
        table.add_row(vec![code_cell(group.code), phrases]);
    }
    table
}

/// Active rules in match order; later rows win over earlier ones.
pub fn rule_order_table(rules: &RuleStore) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Code"),
        header_cell("Phrase"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    for (idx, rule) in rules.list_rules().enumerate() {
        table.add_row(vec![
            dim_cell(idx + 1),
            code_cell(rule.code),
            Cell::new(rule.phrase),
        ]);
    }
    table
}

/// First `rows` records, with the coding column once finalized.
pub fn preview_table(session: &Session, rows: usize) -> Option<Table> {
    let source = session.source()?;
    let finalized = session.finalized();

    let mut table = Table::new();
    let mut header: Vec<Cell> = source
        .table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if idx == source.table.text_column {
                header_cell(name).add_attribute(Attribute::Underlined)
            } else {
                header_cell(name)
            }
        })
        .collect();
    if finalized.is_some() {
        header.push(header_cell(CODING_COLUMN));
    }
    table.set_header(header);
    apply_table_style(&mut table);

    for (row, record) in source.table.records.iter().take(rows).enumerate() {
        let mut cells: Vec<Cell> = record.cells.iter().map(Cell::new).collect();
        if let Some(finalized) = finalized {
            cells.push(coding_cell(finalized.table.codings[row]));
        }
        table.add_row(cells);
    }
    if source.table.len() > rows {
        let remaining = source.table.len() - rows;
        let mut cells = vec![dim_cell(format!("... {remaining} more"))];
        cells.resize_with(table.column_count(), || dim_cell(""));
        table.add_row(cells);
    }
    Some(table)
}

/// Records per code, ascending, then unset records and the total.
pub fn coding_table(finalized: &Finalized) -> Table {
    let mut counts: BTreeMap<Code, usize> = BTreeMap::new();
    for coding in &finalized.table.codings {
        if let Some(code) = coding.code() {
            *counts.entry(code).or_default() += 1;
        }
    }

    let mut table = Table::new();
    table.set_header(vec![header_cell("Code"), header_cell("Records")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    for (code, count) in &counts {
        table.add_row(vec![code_cell(*code), Cell::new(count)]);
    }
    let unset = finalized.table.unset_count();
    if unset > 0 {
        table.add_row(vec![dim_cell("(empty)"), Cell::new(unset)]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(finalized.table.len()).add_attribute(Attribute::Bold),
    ]);
    table
}

/// Records each rule matched, including ones later rules overrode.
pub fn rule_hits_table(rules: &RuleStore, finalized: &Finalized) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Code"),
        header_cell("Phrase"),
        header_cell("Matches"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for (idx, (rule, hits)) in rules.list_rules().zip(&finalized.rule_hits).enumerate() {
        let hits_cell = if *hits == 0 {
            Cell::new(hits).fg(Color::Yellow)
        } else {
            Cell::new(hits)
        };
        table.add_row(vec![
            dim_cell(idx + 1),
            code_cell(rule.code),
            Cell::new(rule.phrase),
            hits_cell,
        ]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn code_cell(code: Code) -> Cell {
    Cell::new(code).fg(Color::Blue).add_attribute(Attribute::Bold)
}

fn coding_cell(coding: Coding) -> Cell {
    match coding {
        Coding::Unset => dim_cell(""),
        Coding::Coded(code) => code_cell(code),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
