//! Deterministic itinerary used when nothing could be parsed.
//!
//! Pure function of the anchor date: the same start date always yields the
//! same days, whatever was attempted before.

use chrono::{Days, NaiveDate};

use super::DayPlan;

/// Upper bound on the number of synthesized days.
pub const FALLBACK_MAX_DAYS: usize = 8;

/// `(place, address hint)` in visiting order.
const FALLBACK_ROUTE: &[(&str, &str)] = &[
    ("Ayvalık", "Ayvalık, Balıkesir"),
    ("Ayvalık", "Ayvalık, Balıkesir"),
    ("Foça", "Eski Foça, İzmir"),
    ("Foça", "Eski Foça, İzmir"),
    ("Kuşadası", "Kuşadası, Aydın"),
    ("Kuşadası", "Kuşadası, Aydın"),
    ("Akyaka (Gökova)", "Akyaka, Muğla"),
    ("Muğla", "Muğla Merkez"),
];

/// Build the fallback itinerary starting at `start_date`.
///
/// Stops early only if a date would fall off the end of the calendar.
pub fn fallback_itinerary(start_date: NaiveDate) -> Vec<DayPlan> {
    FALLBACK_ROUTE
        .iter()
        .cycle()
        .take(FALLBACK_MAX_DAYS)
        .enumerate()
        .map_while(|(idx, (place, address))| {
            let date = start_date.checked_add_days(Days::new(idx as u64))?;
            let day = idx as u32 + 1;
            Some(DayPlan {
                day,
                date,
                location_name: (*place).to_owned(),
                address_hint: (*address).to_owned(),
                details: format!("Day {day}: stay and explore around {place}"),
                notes: format!("Suggested area: {place}"),
                site_url: None,
                latitude: 0.0,
                longitude: 0.0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn eight_consecutive_days() {
        let days = fallback_itinerary(d(2025, 8, 13));
        assert_eq!(days.len(), FALLBACK_MAX_DAYS);
        for (idx, plan) in days.iter().enumerate() {
            assert_eq!(plan.day as usize, idx + 1);
            assert_eq!(plan.date, d(2025, 8, 13) + Days::new(idx as u64));
        }
        assert_eq!(days[0].location_name, "Ayvalık");
        assert_eq!(days[6].location_name, "Akyaka (Gökova)");
        assert_eq!(days[7].location_name, "Muğla");
        assert_eq!(days[7].date, d(2025, 8, 20));
    }

    #[test]
    fn text_mentions_day_and_place() {
        let days = fallback_itinerary(d(2025, 8, 13));
        assert_eq!(days[2].details, "Day 3: stay and explore around Foça");
        assert_eq!(days[2].notes, "Suggested area: Foça");
        assert_eq!(days[2].address_hint, "Eski Foça, İzmir");
    }

    #[test]
    fn deterministic() {
        assert_eq!(
            fallback_itinerary(d(2024, 2, 27)),
            fallback_itinerary(d(2024, 2, 27))
        );
    }

    #[test]
    fn crosses_month_and_leap_day() {
        let days = fallback_itinerary(d(2024, 2, 27));
        assert_eq!(days[2].date, d(2024, 2, 29));
        assert_eq!(days[3].date, d(2024, 3, 1));
    }

    #[test]
    fn truncates_at_calendar_end() {
        let days = fallback_itinerary(NaiveDate::MAX - Days::new(2));
        assert_eq!(days.len(), 3);
    }
}
