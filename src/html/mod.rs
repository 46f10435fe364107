//! HTML rendering of report datasets.
//!
//! Pages are assembled from the embedded templates in [`template`]: a head
//! with styles and the `pieChart` canvas script, one section per group, and
//! a foot. Chart data is embedded as JSON in inline scripts.

mod template;

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::{self, Write};
use std::str::FromStr;

use crate::config::ReportSettings;
use crate::error::{ReportError, Result};
use crate::ledger::quantize;
use crate::report::{project, LineItem, Report, ReportDataset, ReportGroup, SortKey};
use template::{CHART_HEIGHT, CHART_WIDTH, PAGE_FOOT, PAGE_HEAD};

/// Per-render state. Chart ids are `chart1`, `chart2`, ... in the order
/// charts are emitted.
#[derive(Debug, Default)]
pub struct RenderContext {
    charts: usize,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_chart_id(&mut self) -> String {
        self.charts += 1;
        format!("chart{}", self.charts)
    }

    /// Number of ids handed out so far.
    pub fn charts(&self) -> usize {
        self.charts
    }
}

/// Built-in page layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateKind {
    /// Accounts per month with percentages, line items and a pie chart.
    #[default]
    MonthlyPct,
    /// Same layout, every descendant account listed on its own.
    MonthlyExpanded,
    /// Account types per month with a balance row.
    MonthlyTypes,
}

impl TemplateKind {
    pub const NAMES: &'static str = "monthly-pct, monthly-expanded, monthly-types";

    pub fn name(self) -> &'static str {
        match self {
            TemplateKind::MonthlyPct => "monthly-pct",
            TemplateKind::MonthlyExpanded => "monthly-expanded",
            TemplateKind::MonthlyTypes => "monthly-types",
        }
    }

    /// The dataset this layout is rendered from.
    pub fn dataset<'a>(self, report: &Report<'a>) -> ReportDataset<'a> {
        match self {
            TemplateKind::MonthlyPct => report.dataset_monthly(),
            TemplateKind::MonthlyExpanded => report.dataset_monthly_expanded(),
            TemplateKind::MonthlyTypes => report.dataset_monthly_types(),
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TemplateKind {
    type Err = ReportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "monthly-pct" => Ok(TemplateKind::MonthlyPct),
            "monthly-expanded" => Ok(TemplateKind::MonthlyExpanded),
            "monthly-types" => Ok(TemplateKind::MonthlyTypes),
            _ => Err(ReportError::InvalidChoice {
                kind: "template",
                value: s.to_string(),
                expected: TemplateKind::NAMES,
            }),
        }
    }
}

/// Render `report` with the given layout into a complete HTML page.
pub fn render(
    report: &Report<'_>,
    kind: TemplateKind,
    settings: &ReportSettings,
    ctx: &mut RenderContext,
) -> Result<String> {
    let accounts: Vec<&str> = report
        .accounts()
        .iter()
        .map(|&id| report.ledger().account(id).fullname())
        .collect();
    let subtitle = format!(
        "{} to {}, accounts: {}",
        report.from(),
        report.till(),
        accounts.join(", ")
    );
    let dataset = kind.dataset(report);
    render_dataset(&dataset, kind, &subtitle, settings, ctx)
}

pub fn render_dataset(
    dataset: &ReportDataset<'_>,
    kind: TemplateKind,
    subtitle: &str,
    settings: &ReportSettings,
    ctx: &mut RenderContext,
) -> Result<String> {
    let mut out = fill_placeholders(
        PAGE_HEAD,
        &[
            ("REPORT_TITLE", &escape(&settings.title)),
            ("REPORT_SUBTITLE", &escape(subtitle)),
        ],
    );

    for group in dataset {
        let section = match kind {
            TemplateKind::MonthlyPct | TemplateKind::MonthlyExpanded => {
                render_account_group(group, settings, ctx)?
            }
            TemplateKind::MonthlyTypes => render_type_group(group, settings, ctx)?,
        };
        out.push_str(&section);
    }
    out.push_str(PAGE_FOOT);

    tracing::debug!(
        groups = dataset.len(),
        charts = ctx.charts(),
        template = %kind,
        "report rendered"
    );
    Ok(out)
}

fn render_account_group(
    group: &ReportGroup<'_>,
    settings: &ReportSettings,
    ctx: &mut RenderContext,
) -> Result<String> {
    let symbol = settings.currency_symbol.as_str();
    let sum = group.sum();
    let mut html = String::new();

    write_heading(&mut html, group, sum, symbol).map_err(|e| render_error(group, e))?;
    if group.visible().next().is_some() {
        write_account_table(&mut html, group, sum, symbol).map_err(|e| render_error(group, e))?;
    }
    write_chart(&mut html, group, settings, ctx)?;
    Ok(html)
}

fn render_type_group(
    group: &ReportGroup<'_>,
    settings: &ReportSettings,
    ctx: &mut RenderContext,
) -> Result<String> {
    let symbol = settings.currency_symbol.as_str();
    let balance = group.balance.unwrap_or_default();
    let mut html = String::new();

    write_heading(&mut html, group, balance, symbol).map_err(|e| render_error(group, e))?;
    write_type_table(&mut html, group, balance, symbol).map_err(|e| render_error(group, e))?;
    write_chart(&mut html, group, settings, ctx)?;
    Ok(html)
}

fn write_heading(out: &mut String, group: &ReportGroup<'_>, value: Decimal, symbol: &str) -> fmt::Result {
    writeln!(
        out,
        "<h2>{} <span class=\"nowrap\">{}</span></h2>",
        escape(&group.label),
        money(value, symbol)
    )
}

/// Nonzero entries by value, descending, with their share of the group sum.
fn write_account_table(
    out: &mut String,
    group: &ReportGroup<'_>,
    sum: Decimal,
    symbol: &str,
) -> fmt::Result {
    writeln!(out, "<table>")?;
    writeln!(
        out,
        "<tr><th>Account</th><th class=\"right\">Value</th><th class=\"pct\">%</th></tr>"
    )?;
    for entry in group
        .sorted_by(SortKey::Value, true)
        .into_iter()
        .filter(|e| !e.value.is_zero())
    {
        writeln!(
            out,
            "<tr><td class=\"nowrap\">{}</td><td class=\"right nowrap\">{}</td><td class=\"pct\">{:.1}%</td></tr>",
            escape(&entry.label),
            money(entry.value, symbol),
            group.percent(entry)
        )?;
        write_items(out, &entry.items, 3, false, symbol)?;
    }
    writeln!(
        out,
        "<tr class=\"bottom\"><td>Total</td><td class=\"right nowrap\">{}</td><td class=\"pct\"></td></tr>",
        money(sum, symbol)
    )?;
    writeln!(out, "</table>")
}

/// Nonzero type entries in type order, closed by the balance row.
fn write_type_table(
    out: &mut String,
    group: &ReportGroup<'_>,
    balance: Decimal,
    symbol: &str,
) -> fmt::Result {
    writeln!(out, "<table>")?;
    writeln!(out, "<tr><th>Type</th><th class=\"right\">Value</th></tr>")?;
    for entry in group.visible() {
        writeln!(
            out,
            "<tr><td class=\"nowrap\">{}</td><td class=\"right nowrap\">{}</td></tr>",
            escape(&entry.label),
            money(entry.value, symbol)
        )?;
        write_items(out, &entry.items, 2, true, symbol)?;
    }
    writeln!(
        out,
        "<tr class=\"bottom\"><td>Balance</td><td class=\"right nowrap\">{}</td></tr>",
        money(balance, symbol)
    )?;
    writeln!(out, "</table>")
}

/// Line items of an entry as a nested `items` table. Derived items show the
/// sign-normalized value and the account they are booked on.
fn write_items(
    out: &mut String,
    items: &[LineItem<'_>],
    colspan: usize,
    derived: bool,
    symbol: &str,
) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out, "<tr><td colspan=\"{colspan}\"><table class=\"items\">")?;
    for item in items {
        write!(
            out,
            "<tr><td class=\"nowrap\">{}</td><td>{}</td><td>{}</td>",
            item.transaction.date.format("%Y-%m-%d"),
            escape(&item.transaction.descr),
            escape(item.descr)
        )?;
        let value = if derived {
            write!(out, "<td class=\"nowrap\">{}</td>", escape(item.account.fullname()))?;
            item.value_derived
        } else {
            item.value
        };
        writeln!(out, "<td class=\"right nowrap\">{}</td></tr>", money(value, symbol))?;
    }
    writeln!(out, "</table></td></tr>")
}

fn write_chart(
    out: &mut String,
    group: &ReportGroup<'_>,
    settings: &ReportSettings,
    ctx: &mut RenderContext,
) -> Result<()> {
    let top = group.top(settings.chart_limit, settings.chart_remainder);
    if top.is_empty() {
        return Ok(());
    }
    let json = script_json(&project(&top)).map_err(|e| ReportError::Render {
        group: group.label.clone(),
        reason: e.to_string(),
    })?;
    let id = ctx.next_chart_id();
    writeln!(
        out,
        "<canvas id=\"{id}\" width=\"{CHART_WIDTH}\" height=\"{CHART_HEIGHT}\"></canvas>"
    )
    .and_then(|_| writeln!(out, "<script>pieChart(\"{id}\", {json});</script>"))
    .map_err(|e| render_error(group, e))
}

fn render_error(group: &ReportGroup<'_>, e: fmt::Error) -> ReportError {
    ReportError::Render {
        group: group.label.clone(),
        reason: e.to_string(),
    }
}

/// Replace placeholders in a single left-to-right pass, so substituted text
/// is never scanned again.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = values
            .iter()
            .filter_map(|&(key, value)| rest.find(key).map(|pos| (pos, key, value)))
            .min_by_key(|&(pos, _, _)| pos);
        match next {
            Some((pos, key, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Serialize `value` for an inline `<script>`; `</` is escaped so the data
/// cannot close the script element.
pub fn script_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn money(value: Decimal, symbol: &str) -> String {
    format!("{}{}", symbol, format_amount(value))
}

/// Two decimals with thousands separators, e.g. `-1,234.50`.
pub fn format_amount(value: Decimal) -> String {
    let rounded = quantize(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 1);
    if negative {
        grouped.push('-');
    }
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped}.{frac}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::fixtures::sample_ledger;
    use crate::ledger::{parse_date, AccountType, Item, Ledger, Transaction};
    use crate::report::ChartRemainder;
    use rust_decimal_macros::dec;

    fn report<'a>(ledger: &'a Ledger, from: &str, till: &str, accounts: &[&str]) -> Report<'a> {
        let mut report =
            Report::new(ledger, parse_date(from).unwrap(), parse_date(till).unwrap()).unwrap();
        for acc in accounts {
            report.add_account(ledger.lookup(acc).unwrap());
        }
        report
    }

    fn render_fresh(report: &Report<'_>, kind: TemplateKind) -> String {
        render(report, kind, &ReportSettings::default(), &mut RenderContext::new()).unwrap()
    }

    #[test]
    fn test_render_is_deterministic() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-03-01", "2018-06-30", &["Root/Foo", "Root/Bar"]);
        assert_eq!(
            render_fresh(&r, TemplateKind::MonthlyPct),
            render_fresh(&r, TemplateKind::MonthlyPct)
        );
    }

    #[test]
    fn test_chart_ids_unique_per_render() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-03-01", "2018-06-30", &["Root/Foo", "Root/Bar"]);
        let mut ctx = RenderContext::new();
        let html = render(&r, TemplateKind::MonthlyPct, &ReportSettings::default(), &mut ctx).unwrap();

        // March, April and June have bookings, May is empty
        assert_eq!(ctx.charts(), 3);
        for id in ["chart1", "chart2", "chart3"] {
            assert!(html.contains(&format!("<canvas id=\"{id}\"")));
            assert!(html.contains(&format!("pieChart(\"{id}\", [")));
        }
        assert!(!html.contains("chart4"));

        let again = render(&r, TemplateKind::MonthlyPct, &ReportSettings::default(), &mut ctx).unwrap();
        assert!(again.contains("<canvas id=\"chart4\""));
        assert!(!again.contains("<canvas id=\"chart1\""));
    }

    #[test]
    fn test_pct_layout() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-03-01", "2018-03-31", &["Root/Foo", "Root/Test"]);
        let html = render_fresh(&r, TemplateKind::MonthlyPct);
        assert!(html.contains("<h2>Mar 18 "));
        // Foo 9.50 of 11.50, Test 2.00 of 11.50
        assert!(html.contains("<td class=\"pct\">82.6%</td>"));
        assert!(html.contains("<td class=\"pct\">17.4%</td>"));
        assert!(html.contains("<table class=\"items\">"));
        assert!(html.contains("<td>AAA</td>"));
        assert!(html.contains("<tr class=\"bottom\"><td>Total</td><td class=\"right nowrap\">€11.50</td>"));

        let foo = html.find(">Root/Foo<").unwrap();
        let test = html.find(">Root/Test<").unwrap();
        assert!(foo < test, "entries sorted by value descending");
    }

    #[test]
    fn test_types_skip_zero_entries_and_show_balance() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-04-01", "2018-04-30", &["Root"]);
        let html = render_fresh(&r, TemplateKind::MonthlyTypes);
        assert!(!html.contains(">Asset<"));
        assert!(!html.contains(">Liability<"));
        assert!(html.contains("<td class=\"nowrap\">Profit</td><td class=\"right nowrap\">€5.00</td>"));
        assert!(html.contains("<td class=\"nowrap\">Root/Test</td><td class=\"right nowrap\">€5.00</td>"));
        assert!(html.contains("<tr class=\"bottom\"><td>Balance</td><td class=\"right nowrap\">€0.00</td>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut ledger = Ledger::new();
        let shop = ledger.add_account("R&D", AccountType::Expense).unwrap();
        let bank = ledger.add_account("Bank", AccountType::Asset).unwrap();
        let mut t = Transaction::new(parse_date("2024-03-05").unwrap(), "<script>alert(1)</script>");
        for (account, value) in [(shop, dec!(10)), (bank, dec!(-10))] {
            t.items.push(Item {
                descr: "\"quoted\"".to_string(),
                value,
                confirmed: true,
                account,
            });
        }
        ledger.add_transaction(t).unwrap();

        let r = report(&ledger, "2024-03-01", "2024-03-31", &["R&D"]);
        let html = render_fresh(&r, TemplateKind::MonthlyPct);
        assert!(html.contains(">R&amp;D<"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("&quot;quoted&quot;"));
        assert!(!html.contains("<script>alert"));
    }

    #[test]
    fn test_account_named_like_placeholder() {
        let mut ledger = Ledger::new();
        let odd = ledger.add_account("REPORT_TITLE", AccountType::Expense).unwrap();
        let bank = ledger.add_account("Bank", AccountType::Asset).unwrap();
        let mut t = Transaction::new(parse_date("2024-03-05").unwrap(), "Lunch");
        for (account, value) in [(odd, dec!(12)), (bank, dec!(-12))] {
            t.items.push(Item {
                descr: String::new(),
                value,
                confirmed: true,
                account,
            });
        }
        ledger.add_transaction(t).unwrap();

        let r = report(&ledger, "2024-03-01", "2024-03-31", &["REPORT_TITLE"]);
        let html = render_fresh(&r, TemplateKind::MonthlyPct);
        assert!(html.contains("accounts: REPORT_TITLE</p>"));
        assert!(html.contains("<h1>Accounting Report</h1>"));
        assert!(!html.contains("accounts: Accounting Report"));
    }

    #[test]
    fn test_fill_placeholders_single_pass() {
        let filled = fill_placeholders("[A] [B] [A]", &[("A", "B"), ("B", "A")]);
        assert_eq!(filled, "[B] [A] [B]");
    }

    #[test]
    fn test_chart_remainder_aggregate() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-03-01", "2018-03-31", &["Root"]);
        let settings = ReportSettings {
            chart_limit: 2,
            chart_remainder: ChartRemainder::Aggregate,
            ..Default::default()
        };
        let html = render(&r, TemplateKind::MonthlyExpanded, &settings, &mut RenderContext::new()).unwrap();
        // Root/Foo kept, Root/Bar, Root and Root/Test folded into one slice
        assert!(html.contains("pieChart(\"chart1\", [{\"number\":9.5,\"name\":\"Root/Foo\""));
        assert!(html.contains("\"name\":\"...\""));
        assert!(!html.contains("\"name\":\"Root/Test\""));
    }

    #[test]
    fn test_chart_limit_zero_shows_every_entry() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-03-01", "2018-03-31", &["Root"]);
        let settings = ReportSettings {
            chart_limit: 0,
            chart_remainder: ChartRemainder::Aggregate,
            ..Default::default()
        };
        let html = render(&r, TemplateKind::MonthlyExpanded, &settings, &mut RenderContext::new()).unwrap();
        assert!(!html.contains("\"name\":\"...\""));
        for name in ["Root/Foo", "Root/Bar", "Root", "Root/Test"] {
            assert!(html.contains(&format!("\"name\":\"{name}\"")), "{name} missing");
        }
    }

    #[test]
    fn test_script_json_escapes_closing_tags() {
        let json = script_json("a</script>b").unwrap();
        assert_eq!(json, r#""a<\/script>b""#);
    }

    #[test]
    fn test_empty_report_has_no_charts() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-05-01", "2018-05-31", &["Root/Foo"]);
        let mut ctx = RenderContext::new();
        let html = render(&r, TemplateKind::MonthlyExpanded, &ReportSettings::default(), &mut ctx).unwrap();
        assert_eq!(ctx.charts(), 0);
        assert!(html.contains("<h2>May 18 "));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(1234.5)), "1,234.50");
        assert_eq!(format_amount(dec!(-1234567)), "-1,234,567.00");
        assert_eq!(format_amount(dec!(999)), "999.00");
        assert_eq!(format_amount(dec!(-0.004)), "0.00");
    }

    #[test]
    fn test_template_kind_from_str() {
        assert_eq!(
            "monthly-types".parse::<TemplateKind>().unwrap(),
            TemplateKind::MonthlyTypes
        );
        assert_eq!(TemplateKind::MonthlyExpanded.to_string(), "monthly-expanded");
        assert!(matches!(
            "weekly".parse::<TemplateKind>(),
            Err(ReportError::InvalidChoice { kind: "template", .. })
        ));
    }
}
