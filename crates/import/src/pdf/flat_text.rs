//! Line-oriented fallback for statements with no usable column geometry.

use spendlens_core::money::Money;
use spendlens_core::re;
use spendlens_core::rules::CategoryRules;
use spendlens_core::transaction::NewTransaction;

use super::{round_to, RawRow, StatementDocument, StatementExtractor, TextFragment};
use crate::dates::normalize_date;
use crate::normalize::UNKNOWN_TRANSACTION;

re!(re_slash_date, r"\b\d{1,2}/\d{1,2}/\d{2,4}\b");
re!(re_dash_date, r"\b\d{1,2}-\d{1,2}-\d{2,4}\b");
re!(re_iso_date, r"\b\d{4}-\d{2}-\d{2}\b");
re!(re_named_date, r"(?i)(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.? \d{1,2},? \d{2,4}");
re!(re_amount, r"-?\$?\d{1,3}(?:,\d{3})*\.\d{2}");
re!(re_leading_dash, r"^[-\u{2013}\u{2014}]\s*");

const MIN_LINE_LEN: usize = 10;

/// Finds a date and the first amount after it on each text line.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTextExtractor;

impl FlatTextExtractor {
    fn rows(&self, doc: &StatementDocument) -> Vec<RawRow> {
        lines(&doc.fragments)
            .iter()
            .filter_map(|line| parse_line(line))
            .collect()
    }
}

impl StatementExtractor for FlatTextExtractor {
    fn name(&self) -> &'static str {
        "flat-text"
    }

    fn extract(&self, doc: &StatementDocument, rules: &CategoryRules) -> Vec<NewTransaction> {
        let account = doc.account_name();
        self.rows(doc)
            .into_iter()
            .map(|row| row.into_new_transaction(account, rules))
            .collect()
    }
}

/// Rebuilds reading-order lines: top to bottom per page, left to right within a line.
fn lines(fragments: &[TextFragment]) -> Vec<String> {
    let mut sorted: Vec<&TextFragment> = fragments.iter().collect();
    sorted.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(round_to(b.y, 1.0).cmp(&round_to(a.y, 1.0)))
            .then(a.x.total_cmp(&b.x))
    });

    let mut out: Vec<String> = Vec::new();
    let mut current: Option<(u32, i64)> = None;
    for f in sorted {
        let key = (f.page, round_to(f.y, 1.0));
        match out.last_mut() {
            Some(line) if current == Some(key) => {
                line.push(' ');
                line.push_str(&f.text);
            }
            _ => out.push(f.text.clone()),
        }
        current = Some(key);
    }
    out
}

fn parse_line(line: &str) -> Option<RawRow> {
    let line = line.trim();
    if line.chars().count() <= MIN_LINE_LEN {
        return None;
    }

    let date_match = [re_slash_date(), re_dash_date(), re_iso_date(), re_named_date()]
        .into_iter()
        .find_map(|re| re.find(line))?;
    let date = normalize_date(date_match.as_str())?;

    let rest = &line[date_match.end()..];
    let amount_match = re_amount().find(rest)?;
    let amount = Money::parse(amount_match.as_str())?;
    if amount.is_zero() {
        return None;
    }

    let between = rest[..amount_match.start()].trim();
    let description = re_leading_dash().replace(between, "");
    let description = description.split_whitespace().collect::<Vec<_>>().join(" ");
    let description = if description.chars().count() < 2 {
        UNKNOWN_TRANSACTION.to_string()
    } else {
        description
    };

    Some(RawRow {
        date,
        description,
        amount: amount.abs(),
        is_income: false,
        cardholder: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use spendlens_core::category::Category;

    fn doc(fragments: Vec<TextFragment>) -> StatementDocument {
        StatementDocument::new("Savings.pdf", 2024, fragments)
    }

    #[test]
    fn fragments_regroup_into_lines() {
        let frags = vec![
            TextFragment::new(1, 200.0, 500.2, "12.00"),
            TextFragment::new(1, 10.0, 500.0, "01/02/2024"),
            TextFragment::new(1, 10.0, 480.0, "second"),
            TextFragment::new(2, 10.0, 900.0, "next page"),
            TextFragment::new(1, 80.0, 499.8, "COFFEE"),
        ];
        assert_eq!(lines(&frags), vec!["01/02/2024 COFFEE 12.00", "second", "next page"]);
    }

    #[test]
    fn parses_date_description_amount() {
        let row = parse_line("01/15/2024 - SHELL OIL 57444 $42.10 1,003.22").unwrap();
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(row.description, "SHELL OIL 57444");
        assert_eq!(row.amount.to_cents(), 4210);
    }

    #[test]
    fn named_and_iso_dates() {
        assert_eq!(
            parse_line("Mar 5, 2024 Grocery Outlet -23.45").unwrap().date,
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        let row = parse_line("2024-02-29 Payroll 2,000.00").unwrap();
        assert_eq!(row.amount.to_cents(), 200000);
    }

    #[test]
    fn short_description_becomes_unknown() {
        let row = parse_line("01/15/2024 - 42.10").unwrap();
        assert_eq!(row.description, "Unknown Transaction");
    }

    #[test]
    fn rejects_short_zero_and_impossible_lines() {
        assert!(parse_line("1/1/24 $1").is_none());
        assert!(parse_line("01/15/2024 Adjustment 0.00").is_none());
        assert!(parse_line("02/30/2024 Something 5.00").is_none());
        assert!(parse_line("No date here at all 5.00").is_none());
        assert!(parse_line("01/15/2024 no amount here").is_none());
    }

    #[test]
    fn extract_categorizes_rows() {
        let d = doc(vec![
            TextFragment::new(1, 10.0, 500.0, "01/02/2024"),
            TextFragment::new(1, 80.0, 500.0, "NETFLIX.COM"),
            TextFragment::new(1, 200.0, 500.0, "15.99"),
        ]);
        let txs = FlatTextExtractor.extract(&d, CategoryRules::builtin());
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].description, "Netflix");
        assert_eq!(txs[0].category, Category::Entertainment);
        assert_eq!(txs[0].account, "Savings");
    }
}
