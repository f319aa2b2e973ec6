//! Year normalization for generated titles.
//!
//! Rules run in this exact order for the current calendar year `Y`:
//!
//! 1. `【20XX年最新】` / `【20XX年最新版】` → `【Y年最新版】`
//! 2. `20XX年最新` / `20XX年最新版` → `Y年最新版`
//! 3. `20XX年` → `Y年`
//!
//! Rule 1 must precede rule 3, otherwise a bracketed "latest" marker would
//! degrade to a bare year. The transform is total and idempotent.

use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BRACKETED_LATEST: Regex = Regex::new(r"【20\d{2}年最新版?】").unwrap();
    static ref BARE_LATEST: Regex = Regex::new(r"20\d{2}年最新版?").unwrap();
    static ref BARE_YEAR: Regex = Regex::new(r"20\d{2}年").unwrap();
}

/// Current calendar year in local time.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Normalizes every year token in `title` to the current year.
pub fn normalize_title(title: &str) -> String {
    normalize_title_for_year(title, current_year())
}

/// Normalizes every year token in `title` to `year`.
///
/// ```
/// use elicitation::normalize_title_for_year;
///
/// assert_eq!(
///     normalize_title_for_year("【2023年最新版】サービス比較", 2025),
///     "【2025年最新版】サービス比較"
/// );
/// ```
pub fn normalize_title_for_year(title: &str, year: i32) -> String {
    let bracketed = format!("【{year}年最新版】");
    let latest = format!("{year}年最新版");
    let bare = format!("{year}年");

    let step1 = BRACKETED_LATEST.replace_all(title, regex::NoExpand(&bracketed));
    let step2 = BARE_LATEST.replace_all(&step1, regex::NoExpand(&latest));
    let step3 = BARE_YEAR.replace_all(&step2, regex::NoExpand(&bare));
    step3.into_owned()
}

/// Templated title used for padding and for terminal fallbacks.
pub fn default_title(primary: &str, year: i32) -> String {
    normalize_title_for_year(&format!("【{year}年最新版】{primary}完全ガイド"), year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracketed_marker_is_rewritten() {
        assert_eq!(
            normalize_title_for_year("【2023年最新版】サービス比較", 2025),
            "【2025年最新版】サービス比較"
        );
        assert_eq!(
            normalize_title_for_year("【2019年最新】格安SIMまとめ", 2025),
            "【2025年最新版】格安SIMまとめ"
        );
    }

    #[test]
    fn bare_marker_gains_edition_suffix() {
        assert_eq!(
            normalize_title_for_year("2022年最新ガイド", 2025),
            "2025年最新版ガイド"
        );
        assert_eq!(
            normalize_title_for_year("2024年最新版の選び方", 2025),
            "2025年最新版の選び方"
        );
    }

    #[test]
    fn bare_year_is_replaced() {
        assert_eq!(normalize_title_for_year("2021年の動向", 2025), "2025年の動向");
        assert_eq!(
            normalize_title_for_year("2020年と2021年の比較", 2025),
            "2025年と2025年の比較"
        );
    }

    #[test]
    fn text_without_year_is_unchanged() {
        for s in ["サービス比較", "", "1999年の名作", "20年の歴史", "Top 10 tools"] {
            assert_eq!(normalize_title_for_year(s, 2025), s);
        }
    }

    #[test]
    fn all_rules_apply_in_one_title() {
        assert_eq!(
            normalize_title_for_year("【2023年最新】2022年最新版ランキングと2021年の振り返り", 2026),
            "【2026年最新版】2026年最新版ランキングと2026年の振り返り"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "【2023年最新版】サービス比較",
            "【2023年最新】サービス比較",
            "2022年最新ガイド",
            "2022年最新版ガイド",
            "2021年の動向",
            "【2021年】まとめ",
            "2023年最新最新",
            "no year here",
            "【2025年最新版】既に正規化済み",
        ];
        for s in inputs {
            let once = normalize_title_for_year(s, 2025);
            let twice = normalize_title_for_year(&once, 2025);
            assert_eq!(once, twice, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn default_title_is_a_fixed_point() {
        let t = default_title("ウォーターサーバー", 2025);
        assert_eq!(t, "【2025年最新版】ウォーターサーバー完全ガイド");
        assert_eq!(normalize_title_for_year(&t, 2025), t);
    }

    #[test]
    fn current_year_variant_uses_clock() {
        let y = current_year();
        assert_eq!(normalize_title("2001年の記録"), format!("{y}年の記録"));
    }
}
