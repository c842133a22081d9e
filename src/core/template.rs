//! Rename masks applied to files on transfer.
//!
//! A mask is plain text with `#XX` tokens. Tokens are expanded in a single
//! left-to-right pass, so text produced by one token (for example a source
//! name that itself contains `#DY`) is never expanded again. Unknown tokens
//! are copied through untouched.
//!
//! | Token | Expands to |
//! |-------|------------|
//! | `#DY` | year, 4 digits |
//! | `#YY` | year, 2 digits |
//! | `#DM` | month, 2 digits |
//! | `#DD` | day of month, 2 digits |
//! | `#DJ` | day of year, no padding |
//! | `#TH` | hour 00-23 |
//! | `#TM` | minute 00-59 |
//! | `#TS` | second 00-59 |
//! | `#TU` | milliseconds 000-999 |
//! | `#SP` | timestamp `yyyymmddHHMMSSnnnnnnnnn` |
//! | `#FN` | source name without extension |
//! | `#FE` | source extension including the dot |
//! | `#R1` | random number 0-9 |
//! | `#R2` | random number 00-99 |
//! | `#R4` | random number 0000-9999 |

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use rand::Rng;

/// Mask used when the caller does not ask for a rename
pub const DEFAULT_MASK: &str = "#FN#FE";

/// Help text listing every recognised token
pub const TOKEN_HELP: &str = "#DY = year 4 digits
#YY = year 2 digits
#DM = month number
#DD = day of month
#DJ = day of year
#TH = hour 2 digits 00-23h
#TM = minute 2 digits 00-59
#TS = second 2 digits 00-59
#TU = milliseconds 3 digits 000-999
#SP = timestamp format yyyymmddhhMMssnnnnnnnnn
#FN = file name without extension
#FE = file extension with dot
#R1 = random number 1 digit 0-9
#R2 = random number 2 digits 00-99
#R4 = random number 4 digits 0000-9999";

/// Returns the mask to use, falling back to [`DEFAULT_MASK`] when empty
pub fn effective_mask(mask: &str) -> &str {
    if mask.is_empty() {
        DEFAULT_MASK
    } else {
        mask
    }
}

/// Split a path-like name into base name and extension.
///
/// Both `/` and `\` are treated as separators so Windows-style names are
/// handled the same on every platform. The extension keeps its leading dot.
pub fn split_name(name: &str) -> (&str, &str) {
    let file = match name.rfind(['/', '\\']) {
        Some(pos) => &name[pos + 1..],
        None => name,
    };
    match file.rfind('.') {
        Some(pos) => (&file[..pos], &file[pos..]),
        None => (file, ""),
    }
}

/// Render `mask` for `source` using the local clock and the thread RNG
pub fn render(source: &str, mask: &str) -> String {
    render_at(source, mask, &Local::now(), &mut rand::rng())
}

/// Render `mask` for `source` at a fixed moment with the given RNG
pub fn render_at<Tz, R>(source: &str, mask: &str, now: &DateTime<Tz>, rng: &mut R) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
    R: Rng + ?Sized,
{
    let (base, ext) = split_name(source);
    let mut out = String::with_capacity(mask.len() + source.len());
    let mut rest = mask;

    while let Some(pos) = rest.find('#') {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let token = candidate.get(..3).unwrap_or(candidate);

        match expand(token, base, ext, now, rng) {
            Some(value) => {
                out.push_str(&value);
                rest = &candidate[token.len()..];
            }
            None => {
                out.push('#');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn expand<Tz, R>(token: &str, base: &str, ext: &str, now: &DateTime<Tz>, rng: &mut R) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
    R: Rng + ?Sized,
{
    let value = match token {
        "#DY" => format!("{:04}", now.year()),
        "#YY" => format!("{:02}", now.year().rem_euclid(100)),
        "#DM" => format!("{:02}", now.month()),
        "#DD" => format!("{:02}", now.day()),
        "#DJ" => now.ordinal().to_string(),
        "#TH" => format!("{:02}", now.hour()),
        "#TM" => format!("{:02}", now.minute()),
        "#TS" => format!("{:02}", now.second()),
        "#TU" => format!("{:03}", now.timestamp_subsec_millis().min(999)),
        "#SP" => now.format("%Y%m%d%H%M%S%9f").to_string(),
        "#FN" => base.to_string(),
        "#FE" => ext.to_string(),
        "#R1" => format!("{:01}", rng.random_range(0..10u32)),
        "#R2" => format!("{:02}", rng.random_range(0..100u32)),
        "#R4" => format!("{:04}", rng.random_range(0..10_000u32)),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn frozen() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_milli_opt(7, 8, 9, 42)
            .unwrap()
            .and_utc()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_split_name_separators() {
        assert_eq!(split_name("teste.txt"), ("teste", ".txt"));
        assert_eq!(split_name("XX/teste.txt"), ("teste", ".txt"));
        assert_eq!(split_name("/XX/teste.txt"), ("teste", ".txt"));
        assert_eq!(split_name("c:\\teste.txt"), ("teste", ".txt"));
        assert_eq!(split_name("a/b/archive.tar.gz"), ("archive.tar", ".gz"));
    }

    #[test]
    fn test_split_name_without_extension() {
        assert_eq!(split_name("dir/README"), ("README", ""));
        assert_eq!(split_name(""), ("", ""));
    }

    #[test]
    fn test_base_name_token() {
        let now = frozen();
        for source in ["teste.txt", "a/b/teste.txt", "/XX/teste.txt", "c:\\teste.txt"] {
            assert_eq!(render_at(source, "#FN", &now, &mut rng()), "teste");
        }
    }

    #[test]
    fn test_date_and_time_tokens() {
        let now = frozen();
        assert_eq!(
            render_at("teste.txt", "#FN_#DD#DM#DY_#TH#TM#TS#FE", &now, &mut rng()),
            "teste_05032024_070809.txt"
        );
        assert_eq!(render_at("xyz.txt", "#FN_#YY#FE", &now, &mut rng()), "xyz_24.txt");
        assert_eq!(render_at("f", "#TU", &now, &mut rng()), "042");
        assert_eq!(render_at("f", "#SP", &now, &mut rng()), "20240305070809042000000");
    }

    #[test]
    fn test_day_of_year_is_not_padded() {
        let now = frozen();
        // 31 (Jan) + 29 (Feb, leap year) + 5
        assert_eq!(render_at("abc.txt", "#FN_#DJ#FE", &now, &mut rng()), "abc_65.txt");

        let jan_first = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(render_at("abc.txt", "#FN_#DJ", &jan_first, &mut rng()), "abc_1");
    }

    #[test]
    fn test_current_day_of_year() {
        let now = Local::now();
        let rendered = render_at("abc.txt", "#FN_#DJ#FE", &now, &mut rng());
        assert_eq!(rendered, format!("abc_{}.txt", now.ordinal()));
    }

    #[test]
    fn test_random_token_widths() {
        let now = frozen();
        let mut rng = rng();
        for _ in 0..50 {
            let out = render_at("f", "#R1|#R2|#R4", &now, &mut rng);
            let parts: Vec<&str> = out.split('|').collect();
            assert_eq!(parts[0].len(), 1);
            assert_eq!(parts[1].len(), 2);
            assert_eq!(parts[2].len(), 4);
            assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
        }
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        let now = frozen();
        assert_eq!(render_at("a.txt", "#XX_#FN#", &now, &mut rng()), "#XX_a#");
        assert_eq!(render_at("a.txt", "##FN", &now, &mut rng()), "#a");
        assert_eq!(render_at("a.txt", "no tokens", &now, &mut rng()), "no tokens");
    }

    #[test]
    fn test_repeated_tokens() {
        let now = frozen();
        assert_eq!(render_at("a.txt", "#FN-#FN#FE#FE", &now, &mut rng()), "a-a.txt.txt");
    }

    #[test]
    fn test_expanded_text_is_not_expanded_again() {
        let now = frozen();
        assert_eq!(render_at("#DY.txt", "#FN", &now, &mut rng()), "#DY");
    }

    #[test]
    fn test_frozen_clock_is_idempotent() {
        let now = frozen();
        let mask = "#DY#YY#DM#DD#DJ#TH#TM#TS#TU#SP#FN#FE";
        let first = render_at("dir/report.csv", mask, &now, &mut rng());
        for _ in 0..5 {
            assert_eq!(render_at("dir/report.csv", mask, &now, &mut rng()), first);
        }
    }

    #[test]
    fn test_effective_mask_defaults() {
        assert_eq!(effective_mask(""), DEFAULT_MASK);
        assert_eq!(effective_mask("#FN"), "#FN");
        assert_eq!(render("x/report.csv", effective_mask("")), "report.csv");
    }

    #[test]
    fn test_non_ascii_mask() {
        let now = frozen();
        assert_eq!(render_at("é.txt", "ü#FN#é", &now, &mut rng()), "üé#é");
    }
}
