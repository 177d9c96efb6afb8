//! Rendering of match reports and selection results.
//!
//! One serializable view per command, printed as text, a `tabled` table,
//! or single-line JSON.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::cli::AppContext;
use crate::core::matcher::MatchReport;
use crate::core::selector::ComboResult;
use crate::infra::utils::{NumberUtils, PluralUtils};

/// Bumped whenever a JSON field changes meaning
pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStatus
{
    Qualifying,
    Fallback,
    NoCandidate,
}

/// One selected item with its unit count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct ReportItem
{
    #[tabled(rename = "id")]
    pub id: String,

    #[tabled(rename = "item")]
    pub name: String,

    #[tabled(rename = "qty")]
    pub count: usize,

    /// Per-unit reference value
    #[tabled(rename = "value")]
    pub reference_value: u64,

    /// Per-unit effective cost
    #[tabled(rename = "cost")]
    pub acquisition_cost: u64,
}

/// One recognized inventory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct ReportMatch
{
    pub id: String,
    pub name: String,
    pub count: u32,
}

/// Matcher output as printed by `circle match`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary
{
    pub schema_version: u32,
    pub matched: Vec<ReportMatch>,
    pub unmatched: Vec<String>,
    pub unmatched_occurrences: usize,
}

impl MatchSummary
{
    pub fn new(report: &MatchReport) -> Self
    {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            matched: report
                .inventory
                .iter()
                .map(|e| ReportMatch {
                    id: e
                        .item
                        .id
                        .to_string(),
                    name: e
                        .item
                        .label()
                        .to_string(),
                    count: e.count,
                })
                .collect(),
            unmatched: report
                .unmatched
                .iter()
                .map(|l| l.to_string())
                .collect(),
            unmatched_occurrences: report.unmatched_occurrences,
        }
    }

    pub fn to_json(&self) -> Result<String>
    {
        serde_json::to_string(self).context("Failed to serialize match summary")
    }

    pub fn render_text(
        &self,
        ctx: &AppContext,
    ) -> String
    {
        let mut out = String::new();
        let units: u64 = self
            .matched
            .iter()
            .map(|m| u64::from(m.count))
            .sum();

        out.push_str(&format!(
            "{} {} ({} recognized)\n",
            styled(ctx, "Matched", |s| s.bold().to_string()),
            PluralUtils::count(self.matched.len(), "item"),
            PluralUtils::count(units as usize, "unit"),
        ));

        for m in &self.matched
        {
            out.push_str(&format!("  {}× {} [{}]\n", m.count, m.name, m.id));
        }

        if !self
            .unmatched
            .is_empty()
        {
            out.push_str(&format!(
                "{} {}\n",
                styled(ctx, "Unmatched:", |s| s.yellow().bold().to_string()),
                self.unmatched
                    .join(", ")
            ));
        }

        out
    }

    pub fn render_table(&self) -> String
    {
        let mut out = Table::new(&self.matched).to_string();

        if !self
            .unmatched
            .is_empty()
        {
            out.push_str(&format!("\nUnmatched: {}", self.unmatched.join(", ")));
        }

        out
    }
}

/// Full pipeline output as printed by `circle scan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport
{
    pub threshold: u64,
    pub max_slots: usize,
    pub status: SelectionStatus,
    pub total: u64,
    pub acquisition_cost: u64,

    /// Value still missing; zero when qualifying
    pub shortfall: u64,

    pub items: Vec<ReportItem>,

    /// Also carries `schema_version`
    #[serde(flatten)]
    pub matches: MatchSummary,
}

impl ScanReport
{
    pub fn new(
        report: &MatchReport,
        combo: Option<&ComboResult>,
        threshold: u64,
        max_slots: usize,
    ) -> Self
    {
        let matches = MatchSummary::new(report);

        let Some(combo) = combo
        else
        {
            return Self {
                threshold,
                max_slots,
                status: SelectionStatus::NoCandidate,
                total: 0,
                acquisition_cost: 0,
                shortfall: threshold,
                items: Vec::new(),
                matches,
            };
        };

        let status = if combo.qualifies(threshold)
        {
            SelectionStatus::Qualifying
        }
        else
        {
            SelectionStatus::Fallback
        };

        let items = combo
            .grouped()
            .into_iter()
            .map(|(item, count)| ReportItem {
                id: item
                    .id
                    .to_string(),
                name: item
                    .label()
                    .to_string(),
                count,
                reference_value: item.value(),
                acquisition_cost: item.cost(),
            })
            .collect();

        Self {
            threshold,
            max_slots,
            status,
            total: combo.total,
            acquisition_cost: combo.acquisition_cost,
            shortfall: NumberUtils::shortfall(threshold, combo.total),
            items,
            matches,
        }
    }

    pub fn to_json(&self) -> Result<String>
    {
        serde_json::to_string(self).context("Failed to serialize scan report")
    }

    fn status_line(
        &self,
        ctx: &AppContext,
    ) -> String
    {
        match self.status
        {
            SelectionStatus::Qualifying => styled(ctx, "qualifies", |s| s.green().bold().to_string()),
            SelectionStatus::Fallback => format!(
                "{} (short by {})",
                styled(ctx, "below threshold", |s| s.yellow().bold().to_string()),
                NumberUtils::roubles(self.shortfall)
            ),
            SelectionStatus::NoCandidate => styled(ctx, "no candidate", |s| s.red().bold().to_string()),
        }
    }

    pub fn render_text(
        &self,
        ctx: &AppContext,
    ) -> String
    {
        let mut out = self
            .matches
            .render_text(ctx);

        out.push('\n');
        out.push_str(&format!(
            "{} {} of {} slots: {}\n",
            styled(ctx, "Sacrifice", |s| s.bold().to_string()),
            PluralUtils::count(
                self.items
                    .iter()
                    .map(|i| i.count)
                    .sum(),
                "item"
            ),
            self.max_slots,
            self.status_line(ctx),
        ));

        for item in &self.items
        {
            out.push_str(&format!(
                "  {}× {}  value {}  cost {}\n",
                item.count,
                item.name,
                NumberUtils::roubles(item.reference_value),
                NumberUtils::roubles(item.acquisition_cost),
            ));
        }

        out.push_str(&format!(
            "Total value: {} / {}\n",
            NumberUtils::roubles(self.total),
            NumberUtils::roubles(self.threshold)
        ));
        out.push_str(&format!("Total cost:  {}\n", NumberUtils::roubles(self.acquisition_cost)));

        out
    }

    pub fn render_table(
        &self,
        ctx: &AppContext,
    ) -> String
    {
        let mut out = Table::new(&self.items).to_string();

        out.push_str(&format!(
            "\n{}: value {} / {}, cost {}",
            self.status_line(ctx),
            NumberUtils::roubles(self.total),
            NumberUtils::roubles(self.threshold),
            NumberUtils::roubles(self.acquisition_cost),
        ));

        if !self
            .matches
            .unmatched
            .is_empty()
        {
            out.push_str(&format!("\nUnmatched: {}", self.matches.unmatched.join(", ")));
        }

        out
    }
}

/// Apply `paint` unless colors are off
fn styled(
    ctx: &AppContext,
    text: &str,
    paint: impl Fn(&str) -> String,
) -> String
{
    if ctx.no_color { text.to_string() } else { paint(text) }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::catalog::ItemRecord;
    use crate::core::matcher::MatchedInventoryEntry;

    fn plain() -> AppContext
    {
        AppContext { quiet: false, no_color: true, verbose: false }
    }

    fn report() -> MatchReport
    {
        MatchReport {
            inventory: vec![
                MatchedInventoryEntry::new(ItemRecord::new("1", "Spark plug", 15_000).with_short_name("SPlug"), 2),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn missing_combo_is_no_candidate()
    {
        let view = ScanReport::new(&MatchReport::default(), None, 400_000, 5);

        assert_eq!(view.status, SelectionStatus::NoCandidate);
        assert_eq!(view.shortfall, 400_000);
        assert!(
            view.render_text(&plain())
                .contains("no candidate")
        );
    }

    #[test]
    fn fallback_reports_shortfall()
    {
        let combo = ComboResult {
            items: vec![ItemRecord::new("1", "Spark plug", 15_000).with_short_name("SPlug"); 2],
            total: 30_000,
            acquisition_cost: 30_000,
        };

        let view = ScanReport::new(&report(), Some(&combo), 400_000, 5);
        let text = view.render_text(&plain());

        assert_eq!(view.status, SelectionStatus::Fallback);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].count, 2);
        assert!(text.contains("short by ₽370,000"), "{text}");
        assert!(text.contains("2× SPlug"), "{text}");
    }

    #[test]
    fn json_flattens_match_summary()
    {
        let view = ScanReport::new(&report(), None, 1, 5);
        let json: serde_json::Value = serde_json::from_str(&view.to_json().unwrap()).unwrap();

        assert_eq!(json["status"], "no_candidate");
        assert_eq!(json["matched"][0]["count"], 2);
        assert!(json["unmatched"].is_array());
    }
}
