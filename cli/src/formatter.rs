use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Row, Table};
use triage::{Facts, Response, RuleSet, Statistics};

/// A rule file found by `list`, with its statistics or the reason it failed to load
pub struct ListEntry {
    pub path: String,
    pub loaded: Result<Statistics, String>,
}

pub struct Formatter {}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    pub fn format_response(&self, response: &Response) -> String {
        let mut output = String::new();

        if !response.input_facts.is_empty() {
            output.push_str(&self.format_facts_table("Fact", &response.input_facts));
            output.push('\n');
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.add_row(Row::from(vec![Cell::new(format!(
            "{} = {}",
            response.rule_set, response.category
        ))]));

        let mut details = vec![response.message.clone()];
        if let Some(rule) = &response.chosen_rule {
            if !rule.description.is_empty() {
                details.push(rule.description.clone());
            }
            if let Some(source) = &rule.source {
                details.push(format!("Source: {}", source));
            }
        }
        if !response.fired_intermediate_rules.is_empty() {
            let fired: Vec<&str> = response
                .fired_intermediate_rules
                .iter()
                .map(|record| record.rule_id.as_str())
                .collect();
            details.push(format!("Derived by: {}", fired.join(" -> ")));
        }
        table.add_row(Row::from(vec![Cell::new(details.join("\n"))]));

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn format_facts_table(&self, header: &str, facts: &Facts) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new(header).set_alignment(CellAlignment::Left),
            Cell::new("Value").set_alignment(CellAlignment::Left),
        ]));

        for (name, value) in facts.iter() {
            table.add_row(Row::from(vec![
                Cell::new(name),
                Cell::new(value.to_string()).set_alignment(CellAlignment::Right),
            ]));
        }

        table.to_string()
    }

    pub fn format_rule_set(&self, rule_set: &RuleSet) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Rule set: {} ({} selection)\n\n",
            rule_set.name(),
            rule_set.selection().name()
        ));

        output.push_str(&format!("conclusion rules ({}):\n", rule_set.rules().len()));
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec!["ID", "Category", "Priority", "Conditions"]));
        for rule in rule_set.rules() {
            let conditions: Vec<String> = rule.conditions.iter().map(|c| c.to_string()).collect();
            table.add_row(Row::from(vec![
                Cell::new(&rule.id),
                Cell::new(rule.category()),
                Cell::new(rule.priority).set_alignment(CellAlignment::Right),
                Cell::new(if conditions.is_empty() {
                    "always".to_string()
                } else {
                    conditions.join("\nAND ")
                }),
            ]));
        }
        output.push_str(&table.to_string());
        output.push('\n');

        if !rule_set.intermediate_rules().is_empty() {
            output.push_str(&format!(
                "\nintermediate rules ({}):\n",
                rule_set.intermediate_rules().len()
            ));
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(Row::from(vec!["ID", "Priority", "Conditions", "Asserts"]));
            for rule in rule_set.intermediate_rules() {
                let conditions: Vec<String> =
                    rule.conditions.iter().map(|c| c.to_string()).collect();
                let asserts: Vec<String> = rule
                    .derived_facts
                    .iter()
                    .map(|(name, value)| format!("{} = {}", name, value))
                    .collect();
                table.add_row(Row::from(vec![
                    Cell::new(&rule.id),
                    Cell::new(rule.priority).set_alignment(CellAlignment::Right),
                    Cell::new(conditions.join("\nAND ")),
                    Cell::new(asserts.join("\n")),
                ]));
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        output
    }

    pub fn format_statistics(&self, statistics: &Statistics, warnings: &[String]) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Rule set: {} ({} selection)\n\n",
            statistics.name, statistics.selection
        ));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.add_row(Row::from(vec![
            Cell::new("Conclusion rules"),
            Cell::new(statistics.total_rules).set_alignment(CellAlignment::Right),
        ]));
        table.add_row(Row::from(vec![
            Cell::new("Intermediate rules"),
            Cell::new(statistics.total_intermediate_rules).set_alignment(CellAlignment::Right),
        ]));
        if let Some(range) = &statistics.priority_range {
            table.add_row(Row::from(vec![
                Cell::new("Priority range"),
                Cell::new(format!("{}..{}", range.min, range.max))
                    .set_alignment(CellAlignment::Right),
            ]));
        }
        for (category, count) in &statistics.counts_by_category {
            table.add_row(Row::from(vec![
                Cell::new(format!("Category {}", category)),
                Cell::new(count).set_alignment(CellAlignment::Right),
            ]));
        }
        output.push_str(&table.to_string());
        output.push('\n');

        if !warnings.is_empty() {
            output.push_str(&format!("\nwarnings ({}):\n", warnings.len()));
            for warning in warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        output
    }

    pub fn format_workspace_summary(&self, entries: &[ListEntry]) -> String {
        let valid = entries.iter().filter(|entry| entry.loaded.is_ok()).count();
        let mut output = format!(
            "Found {} rule file(s), {} valid\n\n",
            entries.len(),
            valid
        );
        for entry in entries {
            match &entry.loaded {
                Ok(stats) => output.push_str(&format!(
                    "{}: {} ({}), {} rules, {} intermediate rules\n",
                    entry.path,
                    stats.name,
                    stats.selection,
                    stats.total_rules,
                    stats.total_intermediate_rules
                )),
                Err(error) => {
                    let first_line = error.lines().next().unwrap_or_default();
                    output.push_str(&format!("{}: invalid ({})\n", entry.path, first_line))
                }
            }
        }
        output
    }
}
