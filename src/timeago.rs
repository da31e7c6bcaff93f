//! Coarse "time ago" strings for post dates.
//!
//! Selection walks a table from the largest unit down and takes the first
//! whose span is strictly below the elapsed seconds, so e.g. exactly 60
//! seconds still reads as seconds. Locale strings live in the table, not in
//! the logic, so they can be swapped wholesale.

use crate::time::Timestamp;

struct Interval {
    seconds: i64,
    singular: &'static str,
    /// Stem the plural `s` is appended to. Portuguese "mês" pluralises
    /// irregularly to "meses", so the stem is carried per-row rather than
    /// derived from the singular.
    plural_stem: &'static str,
}

#[rustfmt::skip]
const INTERVALS: [Interval; 6] = [
    Interval { seconds: 31_536_000, singular: "ano",     plural_stem: "ano" },
    Interval { seconds: 2_592_000,  singular: "mês",     plural_stem: "mese" },
    Interval { seconds: 86_400,     singular: "dia",     plural_stem: "dia" },
    Interval { seconds: 3_600,      singular: "hora",    plural_stem: "hora" },
    Interval { seconds: 60,         singular: "minuto",  plural_stem: "minuto" },
    Interval { seconds: 1,          singular: "segundo", plural_stem: "segundo" },
];

const JUST_NOW: &str = "Recentemente";
const SUFFIX: &str = "atrás";

pub fn time_since(date: Timestamp, now: Timestamp) -> String {
    let elapsed = now.seconds_since(date);

    let interval = INTERVALS.iter().find(|i| i.seconds < elapsed);
    let Some(interval) = interval else {
        return JUST_NOW.into();
    };

    let count = elapsed / interval.seconds;
    if count == 1 {
        format!("1 {} {SUFFIX}", interval.singular)
    } else {
        format!("{count} {}s {SUFFIX}", interval.plural_stem)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn since(elapsed: i64) -> String {
        let now = Timestamp::from_unix(1_700_000_000);
        time_since(Timestamp::from_unix(1_700_000_000 - elapsed), now)
    }

    #[test]
    fn sub_second_is_the_sentinel() {
        assert_eq!(since(0), JUST_NOW);
    }

    #[test]
    fn future_dates_fall_back_to_the_sentinel() {
        assert_eq!(since(-30), JUST_NOW);
    }

    #[test]
    fn seconds_pluralise() {
        assert_eq!(since(45), "45 segundos atrás");
    }

    #[test]
    fn a_minute_and_a_half_is_one_minute() {
        assert_eq!(since(90), "1 minuto atrás");
    }

    #[test]
    fn exactly_a_minute_still_reads_as_seconds() {
        // unit spans must be strictly below the elapsed time
        assert_eq!(since(60), "60 segundos atrás");
    }

    #[test]
    fn forty_days_is_a_singular_month() {
        assert_eq!(since(40 * 86_400), "1 mês atrás");
    }

    #[test]
    fn months_pluralise_irregularly() {
        assert_eq!(since(70 * 86_400), "2 meses atrás");
    }

    #[test]
    fn years() {
        assert_eq!(since(2 * 31_536_000 + 1), "2 anos atrás");
    }
}
