//! Appearance aggregation and statistics.
//!
//! This module groups raw appearance records by panelist and year and
//! computes the totals shown in the report. All outputs are sorted so the
//! result never depends on the order rows came back from the database.

use crate::models::{AppearanceRecord, ParticipantAppearances, YearlyCount};
use std::collections::{BTreeMap, BTreeSet};

/// Count appearances per (panelist, year), sorted by panelist id then year.
///
/// Only combinations that actually occur are emitted, so every count is at
/// least one.
pub fn count_by_participant_year(records: &[AppearanceRecord]) -> Vec<YearlyCount> {
    let mut counts: BTreeMap<(i64, i32), u32> = BTreeMap::new();

    for record in records {
        *counts
            .entry((record.participant_id, record.year()))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((participant_id, year), count)| YearlyCount {
            participant_id,
            year,
            count,
        })
        .collect()
}

/// Group records into report rows, sorted by display name then id.
pub fn group_by_participant(records: &[AppearanceRecord]) -> Vec<ParticipantAppearances> {
    // The smallest name wins when an id shows up under several spellings.
    let mut names: BTreeMap<i64, &str> = BTreeMap::new();
    for record in records {
        names
            .entry(record.participant_id)
            .and_modify(|name| {
                if record.name.as_str() < *name {
                    *name = record.name.as_str();
                }
            })
            .or_insert(record.name.as_str());
    }

    let mut grouped: BTreeMap<i64, Vec<YearlyCount>> = BTreeMap::new();
    for count in count_by_participant_year(records) {
        grouped.entry(count.participant_id).or_default().push(count);
    }

    let mut rows: Vec<ParticipantAppearances> = grouped
        .into_iter()
        .map(|(participant_id, counts)| ParticipantAppearances {
            participant_id,
            name: names
                .get(&participant_id)
                .map(|name| name.to_string())
                .unwrap_or_default(),
            counts,
        })
        .collect();

    // Case-insensitive, like the database collation; exact name and id break ties.
    rows.sort_by_cached_key(|row| {
        (
            row.name.to_lowercase(),
            row.name.clone(),
            row.participant_id,
        )
    });

    rows
}

/// Years in which at least one appearance was recorded, ascending.
pub fn observed_years(rows: &[ParticipantAppearances]) -> Vec<i32> {
    rows.iter()
        .flat_map(|row| row.counts.iter().map(|c| c.year))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Column years for the report: show years merged with observed years.
pub fn report_years(show_years: &[i32], rows: &[ParticipantAppearances]) -> Vec<i32> {
    let mut years: BTreeSet<i32> = show_years.iter().copied().collect();
    years.extend(observed_years(rows));
    years.into_iter().collect()
}

/// Sum of all appearances across every row.
pub fn total_appearances(rows: &[ParticipantAppearances]) -> u64 {
    rows.iter().map(ParticipantAppearances::total).sum()
}

/// Panelists with the most appearances, highest first.
pub fn most_frequent_participants(
    rows: &[ParticipantAppearances],
    n: usize,
) -> Vec<(&ParticipantAppearances, u64)> {
    let mut ranked: Vec<_> = rows.iter().map(|row| (row, row.total())).collect();

    // Stable sort keeps name order among ties.
    ranked.sort_by_key(|(_, total)| std::cmp::Reverse(*total));
    ranked.truncate(n);

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn record(id: i64, name: &str, year: i32, day: u32) -> AppearanceRecord {
        AppearanceRecord::new(id, name, NaiveDate::from_ymd_opt(year, 1, day).unwrap())
    }

    fn sample_records() -> Vec<AppearanceRecord> {
        vec![
            record(2, "Roy Blount Jr.", 2001, 6),
            record(1, "Faith Salie", 2019, 5),
            record(2, "Roy Blount Jr.", 2001, 13),
            record(1, "Faith Salie", 2020, 4),
            record(3, "Adam Felber", 2019, 12),
            record(1, "Faith Salie", 2019, 19),
            record(2, "Roy Blount Jr.", 1999, 2),
        ]
    }

    #[test]
    fn test_count_by_participant_year_example() {
        let records = vec![
            record(1, "P1", 2020, 4),
            record(1, "P1", 2020, 11),
            record(2, "P2", 2021, 9),
        ];

        let counts = count_by_participant_year(&records);

        assert_eq!(
            counts,
            vec![
                YearlyCount {
                    participant_id: 1,
                    year: 2020,
                    count: 2,
                },
                YearlyCount {
                    participant_id: 2,
                    year: 2021,
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn test_counts_are_positive() {
        let counts = count_by_participant_year(&sample_records());
        assert!(counts.iter().all(|c| c.count >= 1));
    }

    #[test]
    fn test_totals_match_record_counts() {
        let records = sample_records();
        let rows = group_by_participant(&records);

        let mut expected: HashMap<i64, u64> = HashMap::new();
        for r in &records {
            *expected.entry(r.participant_id).or_default() += 1;
        }

        assert_eq!(rows.len(), expected.len());
        for row in &rows {
            assert_eq!(Some(&row.total()), expected.get(&row.participant_id));
        }
        assert_eq!(total_appearances(&rows), records.len() as u64);
    }

    #[test]
    fn test_order_independence() {
        let records = sample_records();
        let mut reversed = records.clone();
        reversed.reverse();
        let mut rotated = records.clone();
        rotated.rotate_left(3);

        let baseline = group_by_participant(&records);
        assert_eq!(group_by_participant(&reversed), baseline);
        assert_eq!(group_by_participant(&rotated), baseline);
        assert_eq!(
            count_by_participant_year(&rotated),
            count_by_participant_year(&records)
        );
    }

    #[test]
    fn test_rows_sorted_by_name_and_years_ascending() {
        let rows = group_by_participant(&sample_records());

        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Adam Felber", "Faith Salie", "Roy Blount Jr."]);

        for row in &rows {
            assert!(row.counts.windows(2).all(|w| w[0].year < w[1].year));
        }
    }

    #[test]
    fn test_rows_sorted_ignoring_case() {
        let records = vec![
            record(1, "Zed Zimmer", 2010, 1),
            record(2, "de Vries", 2010, 2),
            record(3, "Adam Felber", 2010, 3),
            record(4, "DE VRIES", 2010, 4),
        ];

        let rows = group_by_participant(&records);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["Adam Felber", "DE VRIES", "de Vries", "Zed Zimmer"]);
    }

    #[test]
    fn test_conflicting_names_pick_smallest() {
        let records = vec![
            record(5, "Peter Sagal", 2010, 1),
            record(5, "Peter  Sagal", 2011, 1),
        ];
        let mut shuffled = records.clone();
        shuffled.reverse();

        assert_eq!(group_by_participant(&records)[0].name, "Peter  Sagal");
        assert_eq!(group_by_participant(&shuffled)[0].name, "Peter  Sagal");
    }

    #[test]
    fn test_empty_input() {
        assert!(count_by_participant_year(&[]).is_empty());
        assert!(group_by_participant(&[]).is_empty());
        assert_eq!(total_appearances(&[]), 0);
    }

    #[test]
    fn test_report_years_merges_show_years() {
        let rows = group_by_participant(&sample_records());

        assert_eq!(observed_years(&rows), vec![1999, 2001, 2019, 2020]);
        assert_eq!(
            report_years(&[1998, 1999, 2000], &rows),
            vec![1998, 1999, 2000, 2001, 2019, 2020]
        );
    }

    #[test]
    fn test_most_frequent_participants() {
        let rows = group_by_participant(&sample_records());
        let top = most_frequent_participants(&rows, 2);

        assert_eq!(top.len(), 2);
        // Faith Salie and Roy Blount Jr. both have three; name order breaks the tie.
        assert_eq!(top[0].0.name, "Faith Salie");
        assert_eq!(top[0].1, 3);
        assert_eq!(top[1].0.name, "Roy Blount Jr.");
    }
}
