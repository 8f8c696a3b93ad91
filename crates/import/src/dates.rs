use chrono::NaiveDate;

use spendlens_core::re;

re!(re_iso, r"^(\d{4})-(\d{1,2})-(\d{1,2})$");
re!(re_numeric, r"^(\d{1,2})[/\-](\d{1,2})[/\-](\d{2,4})$");
re!(re_month_name, r"^([A-Za-z]+)\.?\s+(\d{1,2}),?\s*(\d{2,4})$");

/// Parses the date shapes found on statements and exports: `YYYY-MM-DD`,
/// `M/D/YYYY`, `M-D-YY`, `Month D, YYYY`. Two-digit years are 20xx.
/// Impossible calendar dates are rejected.
pub fn normalize_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Some(c) = re_iso().captures(s) {
        let year: i32 = c.get(1)?.as_str().parse().ok()?;
        let month: u32 = c.get(2)?.as_str().parse().ok()?;
        let day: u32 = c.get(3)?.as_str().parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(c) = re_numeric().captures(s) {
        let month: u32 = c.get(1)?.as_str().parse().ok()?;
        let day: u32 = c.get(2)?.as_str().parse().ok()?;
        let year = expand_year(c.get(3)?.as_str().parse().ok()?);
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(c) = re_month_name().captures(s) {
        let month = month_to_num(c.get(1)?.as_str())?;
        let day: u32 = c.get(2)?.as_str().parse().ok()?;
        let year = expand_year(c.get(3)?.as_str().parse().ok()?);
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    None
}

/// `MM-DD` or `MM/DD` within a known statement year.
pub fn month_day(s: &str, year: i32) -> Option<NaiveDate> {
    let (m, d) = s.trim().split_once(['-', '/'])?;
    NaiveDate::from_ymd_opt(year, m.parse().ok()?, d.parse().ok()?)
}

pub fn expand_year(year: i32) -> i32 {
    if year < 100 {
        year + 2000
    } else {
        year
    }
}

/// Full or abbreviated English month name.
pub fn month_to_num(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let prefix = lower.get(..3)?;
    let n = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── normalize_date ────────────────────────────────────────────────────────

    #[test]
    fn iso_dates() {
        assert_eq!(normalize_date("2024-01-15"), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn us_slash_and_dash_dates() {
        assert_eq!(normalize_date("1/5/2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(normalize_date("01-05-24"), Some(ymd(2024, 1, 5)));
        assert_eq!(normalize_date(" 12/31/23 "), Some(ymd(2023, 12, 31)));
    }

    #[test]
    fn month_name_dates() {
        assert_eq!(normalize_date("January 5, 2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(normalize_date("Mar 9 2024"), Some(ymd(2024, 3, 9)));
        assert_eq!(normalize_date("Sept. 30, 2024"), Some(ymd(2024, 9, 30)));
    }

    #[test]
    fn impossible_dates_rejected() {
        assert_eq!(normalize_date("13/45/2024"), None);
        assert_eq!(normalize_date("2024-02-30"), None);
        assert_eq!(normalize_date("Foo 5, 2024"), None);
        assert_eq!(normalize_date("yesterday"), None);
    }

    // ── month_day ─────────────────────────────────────────────────────────────

    #[test]
    fn month_day_uses_given_year() {
        assert_eq!(month_day("11-15", 2025), Some(ymd(2025, 11, 15)));
        assert_eq!(month_day("2/29", 2023), None);
    }
}
