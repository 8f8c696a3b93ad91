//! Column-position statement reader.
//!
//! The date column is found first (most common X among date-shaped
//! fragments), then the numeric columns to its right. Everything between the
//! two is description text. Rows are anchored on dates and matched to the
//! amount nearest in Y on the same page.

use chrono::NaiveDate;
use regex::Regex;
use spendlens_core::money::Money;
use spendlens_core::re;
use spendlens_core::rules::CategoryRules;
use spendlens_core::transaction::NewTransaction;
use std::collections::HashMap;

use super::{round_to, RawRow, StatementDocument, StatementExtractor, TextFragment};
use crate::dates::{expand_year, month_day};

re!(re_full_date, r"^(\d{1,2})/(\d{1,2})/(\d{4})$");
re!(re_dash_date, r"^\d{1,2}-\d{1,2}$");
re!(re_slash_date, r"^\d{1,2}/\d{1,2}$");
re!(re_strict_amount, r"^\d{1,3}(?:,\d{3})*\.\d{2}$");
re!(re_lenient_amount, r"^\$?-?\d{1,3}(?:,\d{3})*(?:\.\d{2})?$");
re!(re_pure_number, r"^[\d.]+$");
re!(re_payments_header, r"(?i)payments\s+made\s+by\s+(\w+\s+\w+)");
re!(re_transactions_header, r"(?i)transactions\s+by\s+(\w+\s+\w+)");
re!(re_statement_period, r"(\d{1,2})/(\d{1,2})/(\d{2,4})\s*[-\u{2013}]\s*(\d{1,2})/(\d{1,2})/(\d{2,4})");
re!(re_income_hint, r"(?i)\bach\b|internet transfer|payment");
re!(re_noise_line, r"(?i)^(?:statement|checking|everyday|access no|page \d|joint owner|\(continued|none$)");

/// Words that make up column headings and section banners.
const HEADING_WORDS: &[&str] = &[
    "date", "description", "amount", "total", "totals", "transaction", "transactions",
    "detail", "details", "balance", "posted", "posting", "type", "payments", "credits",
    "debits", "daily", "cash", "merchant", "reference",
];

const BANNER_PHRASES: &[&str] = &["beginning balance", "ending balance", "daily cash"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateShape {
    /// `MM/DD/YYYY`
    FullSlash,
    /// `MM-DD`, year from the statement period
    MonthDayDash,
    /// `MM/DD`, year from the statement period
    MonthDaySlash,
}

impl DateShape {
    fn regex(self) -> &'static Regex {
        match self {
            DateShape::FullSlash => re_full_date(),
            DateShape::MonthDayDash => re_dash_date(),
            DateShape::MonthDaySlash => re_slash_date(),
        }
    }

    fn parse(self, text: &str, years: &StatementYears) -> Option<NaiveDate> {
        match self {
            DateShape::FullSlash => {
                let c = re_full_date().captures(text)?;
                NaiveDate::from_ymd_opt(
                    c.get(3)?.as_str().parse().ok()?,
                    c.get(1)?.as_str().parse().ok()?,
                    c.get(2)?.as_str().parse().ok()?,
                )
            }
            DateShape::MonthDayDash | DateShape::MonthDaySlash => {
                let month: u32 = text.split(['-', '/']).next()?.parse().ok()?;
                month_day(text, years.year_for(month))
            }
        }
    }
}

/// Which numeric column carries the transaction amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountColumn {
    /// Leftmost numeric column; anything further right is a running balance.
    Leftmost,
    /// Rightmost numeric column; columns to the left are rewards or fees.
    Rightmost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// `Payments made by X` / `Transactions by X` sections, else keywords.
    Sections,
    /// A lone `-` just right of the amount marks money out.
    TrailingMinus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Needs a section header or a card issuer marker.
    CardMarkers,
    Always,
}

/// Geometry and conventions of one statement family.
#[derive(Debug, Clone)]
pub struct LayoutProfile {
    pub name: &'static str,
    pub date_shapes: Vec<DateShape>,
    pub detection: Detection,
    /// How far right of the date column amounts start.
    pub amount_offset: f64,
    /// Description text starts this far right of the date column.
    pub desc_offset: f64,
    /// ...and stops this far left of the first numeric column.
    pub desc_gap: f64,
    pub date_x_tolerance: f64,
    pub row_tolerance: f64,
    pub continuation_tolerance: f64,
    pub amount_column: AmountColumn,
    pub polarity: Polarity,
}

impl LayoutProfile {
    /// Credit card statements split into payment and purchase sections per
    /// cardholder, with full `MM/DD/YYYY` dates.
    pub fn sectioned_card() -> Self {
        Self {
            name: "sectioned-card",
            date_shapes: vec![DateShape::FullSlash],
            detection: Detection::CardMarkers,
            amount_offset: 200.0,
            desc_offset: 30.0,
            desc_gap: 20.0,
            date_x_tolerance: 5.0,
            row_tolerance: 6.0,
            continuation_tolerance: 20.0,
            amount_column: AmountColumn::Rightmost,
            polarity: Polarity::Sections,
        }
    }

    /// Bank account ledgers: `MM-DD` dates, an amount column followed by a
    /// running balance, debits flagged with a trailing minus.
    pub fn ledger() -> Self {
        Self {
            name: "ledger",
            date_shapes: vec![DateShape::MonthDayDash, DateShape::MonthDaySlash],
            detection: Detection::Always,
            amount_offset: 300.0,
            desc_offset: 15.0,
            desc_gap: 50.0,
            date_x_tolerance: 5.0,
            row_tolerance: 3.0,
            continuation_tolerance: 25.0,
            amount_column: AmountColumn::Leftmost,
            polarity: Polarity::TrailingMinus,
        }
    }
}

/// Statement period, used to place year-less dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StatementYears {
    start_year: i32,
    start_month: u32,
    end_year: i32,
}

impl StatementYears {
    fn detect(doc: &StatementDocument) -> Self {
        let period = doc.fragments.iter().find_map(|f| {
            let c = re_statement_period().captures(&f.text)?;
            let start_month: u32 = c.get(1)?.as_str().parse().ok()?;
            let start_year = expand_year(c.get(3)?.as_str().parse().ok()?);
            let end_year = expand_year(c.get(6)?.as_str().parse().ok()?);
            Some(StatementYears { start_year, start_month, end_year })
        });
        period.unwrap_or(StatementYears {
            start_year: doc.fallback_year,
            start_month: 1,
            end_year: doc.fallback_year,
        })
    }

    /// A December row on a December-January statement belongs to the start year.
    fn year_for(&self, month: u32) -> i32 {
        if self.start_year != self.end_year && month >= self.start_month {
            self.start_year
        } else {
            self.end_year
        }
    }
}

#[derive(Debug, Clone)]
struct Section {
    page: u32,
    y: f64,
    is_payments: bool,
    cardholder: String,
}

struct Row<'a> {
    y: f64,
    date: NaiveDate,
    parts: Vec<&'a str>,
}

pub struct SpatialTableExtractor {
    profile: LayoutProfile,
}

impl SpatialTableExtractor {
    pub fn new(profile: LayoutProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &LayoutProfile {
        &self.profile
    }

    fn recognized(&self, doc: &StatementDocument) -> bool {
        match self.profile.detection {
            Detection::Always => true,
            Detection::CardMarkers => {
                let text = doc.full_text();
                let has_section = doc
                    .fragments
                    .iter()
                    .any(|f| re_payments_header().is_match(&f.text) || re_transactions_header().is_match(&f.text));
                has_section
                    || text.contains("Apple Card")
                    || text.contains("Goldman Sachs")
                    || (text.contains("Payments") && text.contains("Transactions") && text.contains("Daily Cash"))
            }
        }
    }

    /// The profile's date shape with the most matching fragments.
    fn dominant_shape<'a>(&self, doc: &'a StatementDocument) -> Option<(DateShape, Vec<&'a TextFragment>)> {
        self.profile
            .date_shapes
            .iter()
            .map(|shape| {
                let hits: Vec<&TextFragment> =
                    doc.fragments.iter().filter(|f| shape.regex().is_match(&f.text)).collect();
                (*shape, hits)
            })
            .filter(|(_, hits)| !hits.is_empty())
            .fold(None, |best: Option<(DateShape, Vec<&TextFragment>)>, cur| match best {
                Some(b) if b.1.len() >= cur.1.len() => Some(b),
                _ => Some(cur),
            })
    }

    fn rows(&self, doc: &StatementDocument) -> Vec<RawRow> {
        if !self.recognized(doc) {
            return Vec::new();
        }
        let Some((shape, date_hits)) = self.dominant_shape(doc) else {
            return Vec::new();
        };
        let date_x = most_common_x(&date_hits);
        let p = &self.profile;

        let dates: Vec<&TextFragment> = date_hits
            .into_iter()
            .filter(|f| (f.x - date_x).abs() <= p.date_x_tolerance)
            .collect();

        let right_of_dates = |f: &&TextFragment| f.x > date_x + p.amount_offset;
        let mut numeric: Vec<&TextFragment> = doc
            .fragments
            .iter()
            .filter(|f| re_strict_amount().is_match(&f.text))
            .filter(right_of_dates)
            .collect();
        if numeric.is_empty() {
            numeric = doc
                .fragments
                .iter()
                .filter(|f| re_lenient_amount().is_match(&f.text))
                .filter(right_of_dates)
                .collect();
        }
        let Some((first_col_x, amount_x)) = numeric_columns(&numeric, p.amount_column) else {
            return Vec::new();
        };
        let amounts: Vec<&TextFragment> = numeric
            .into_iter()
            .filter(|f| (f.x - amount_x).abs() <= 30.0)
            .collect();

        let descs: Vec<&TextFragment> = doc
            .fragments
            .iter()
            .filter(|f| f.x > date_x + p.desc_offset && f.x < first_col_x - p.desc_gap)
            .filter(|f| f.text.chars().count() > 1)
            .filter(|f| !f.text.ends_with('%') && !re_pure_number().is_match(&f.text))
            .collect();

        let minus_signs: Vec<&TextFragment> = match p.polarity {
            Polarity::TrailingMinus => doc
                .fragments
                .iter()
                .filter(|f| f.text == "-" && f.x > amount_x + 20.0 && f.x < amount_x + 60.0)
                .collect(),
            Polarity::Sections => Vec::new(),
        };
        let sections = match p.polarity {
            Polarity::Sections => find_sections(&doc.fragments),
            Polarity::TrailingMinus => Vec::new(),
        };
        let years = StatementYears::detect(doc);

        let mut pages: Vec<u32> = dates.iter().map(|d| d.page).collect();
        pages.sort_unstable();
        pages.dedup();

        let mut out = Vec::new();
        for page in pages {
            let pg_dates = on_page(&dates, page);
            let pg_descs = on_page(&descs, page);
            let pg_amounts = on_page(&amounts, page);

            let mut rows: Vec<Row> = Vec::new();
            for date_frag in &pg_dates {
                let Some(date) = shape.parse(&date_frag.text, &years) else {
                    continue;
                };
                let parts: Vec<&str> = pg_descs
                    .iter()
                    .filter(|d| (d.y - date_frag.y).abs() < p.row_tolerance)
                    .map(|d| d.text.as_str())
                    .collect();
                if parts.is_empty() || is_heading_row(&parts.join(" ")) {
                    continue;
                }
                rows.push(Row { y: date_frag.y, date, parts });
            }

            for frag in &pg_descs {
                let has_date = pg_dates.iter().any(|d| (d.y - frag.y).abs() < p.row_tolerance);
                if has_date || is_noise_line(&frag.text) {
                    continue;
                }
                let nearest_above = rows
                    .iter_mut()
                    .filter(|r| {
                        let dist = r.y - frag.y;
                        dist > 0.0 && dist < p.continuation_tolerance
                    })
                    .min_by(|a, b| (a.y - frag.y).total_cmp(&(b.y - frag.y)));
                if let Some(row) = nearest_above {
                    row.parts.push(&frag.text);
                }
            }

            for row in rows {
                let Some(amount_frag) = pg_amounts
                    .iter()
                    .min_by(|a, b| (a.y - row.y).abs().total_cmp(&(b.y - row.y).abs()))
                else {
                    continue;
                };
                let Some(amount) = Money::parse(&amount_frag.text) else {
                    continue;
                };
                let description = row.parts.join(" ");

                let (is_income, cardholder) = match p.polarity {
                    Polarity::TrailingMinus => {
                        let has_minus = minus_signs
                            .iter()
                            .any(|m| m.page == page && (m.y - amount_frag.y).abs() < p.row_tolerance);
                        (!has_minus, None)
                    }
                    Polarity::Sections => match section_for(&sections, page, row.y) {
                        Some(s) => (s.is_payments, Some(s.cardholder.clone())),
                        None => (re_income_hint().is_match(&description), None),
                    },
                };

                out.push(RawRow {
                    date: row.date,
                    description,
                    amount: amount.abs(),
                    is_income,
                    cardholder,
                });
            }
        }
        out
    }
}

impl StatementExtractor for SpatialTableExtractor {
    fn name(&self) -> &'static str {
        self.profile.name
    }

    fn extract(&self, doc: &StatementDocument, rules: &CategoryRules) -> Vec<NewTransaction> {
        let account = doc.account_name();
        self.rows(doc)
            .into_iter()
            .map(|row| row.into_new_transaction(account, rules))
            .collect()
    }
}

/// Most frequent whole-number X; ties go to the smallest.
/// Fragments on `page`, top of the page first, then left to right.
fn on_page<'a>(list: &[&'a TextFragment], page: u32) -> Vec<&'a TextFragment> {
    let mut v: Vec<&TextFragment> = list.iter().copied().filter(|f| f.page == page).collect();
    v.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));
    v
}

fn most_common_x(frags: &[&TextFragment]) -> f64 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for f in frags {
        *counts.entry(round_to(f.x, 1.0)).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map_or(0.0, |(x, _)| x as f64)
}

/// `(leftmost column X, amount column X)` after clustering on a 10pt grid.
fn numeric_columns(frags: &[&TextFragment], which: AmountColumn) -> Option<(f64, f64)> {
    let mut xs: Vec<i64> = frags.iter().map(|f| round_to(f.x, 10.0)).collect();
    xs.sort_unstable();
    xs.dedup();
    let first = *xs.first()? as f64;
    let amount = match which {
        AmountColumn::Leftmost => first,
        AmountColumn::Rightmost => *xs.last()? as f64,
    };
    Some((first, amount))
}

fn find_sections(fragments: &[TextFragment]) -> Vec<Section> {
    fragments
        .iter()
        .filter_map(|f| {
            if let Some(c) = re_payments_header().captures(&f.text) {
                Some((f, true, c.get(1)?.as_str().to_string()))
            } else {
                let c = re_transactions_header().captures(&f.text)?;
                Some((f, false, c.get(1)?.as_str().to_string()))
            }
        })
        .map(|(f, is_payments, cardholder)| Section {
            page: f.page,
            y: f.y,
            is_payments,
            cardholder,
        })
        .collect()
}

/// Closest section header above the row on the same page.
fn section_for(sections: &[Section], page: u32, y: f64) -> Option<&Section> {
    sections
        .iter()
        .filter(|s| s.page == page && s.y > y)
        .min_by(|a, b| a.y.total_cmp(&b.y))
}

fn is_heading_row(text: &str) -> bool {
    let lower = text.to_lowercase();
    if BANNER_PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }
    lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .all(|w| HEADING_WORDS.contains(&w))
}

fn is_noise_line(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    is_heading_row(&lower)
        || re_noise_line().is_match(&lower)
        || re_payments_header().is_match(&lower)
        || re_transactions_header().is_match(&lower)
        || lower.starts_with("total")
}
