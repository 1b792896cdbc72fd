// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Grade Arithmetic
//!
//! Oral-participation marks are recorded as symbols (`+++` .. `--`) mapping
//! to the German 1..6 scale. Averages are shown snapped to quarter steps
//! (`1`, `1−`, `1-2`, `2+`, `2`, ...) and coloured by band.
//!
//! The school year runs 1 Aug → 31 Jul with the second term starting 1 Feb;
//! classes may override the boundaries.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::GradebookError;
use crate::models::{Contribution, Student};

// =============================================================================
// Grade Symbols
// =============================================================================

/// A single recorded mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeSymbol {
    #[serde(rename = "+++")]
    Excellent,
    #[serde(rename = "++")]
    Good,
    #[serde(rename = "+")]
    Satisfactory,
    #[serde(rename = "o")]
    Neutral,
    #[serde(rename = "-")]
    Weak,
    #[serde(rename = "--")]
    Poor,
}

impl GradeSymbol {
    pub const ALL: [GradeSymbol; 6] = [
        GradeSymbol::Excellent,
        GradeSymbol::Good,
        GradeSymbol::Satisfactory,
        GradeSymbol::Neutral,
        GradeSymbol::Weak,
        GradeSymbol::Poor,
    ];

    /// Numeric grade, 1 (best) to 6.
    pub fn value(self) -> u8 {
        match self {
            GradeSymbol::Excellent => 1,
            GradeSymbol::Good => 2,
            GradeSymbol::Satisfactory => 3,
            GradeSymbol::Neutral => 4,
            GradeSymbol::Weak => 5,
            GradeSymbol::Poor => 6,
        }
    }

    /// ASCII spelling, as stored.
    pub fn as_str(self) -> &'static str {
        match self {
            GradeSymbol::Excellent => "+++",
            GradeSymbol::Good => "++",
            GradeSymbol::Satisfactory => "+",
            GradeSymbol::Neutral => "o",
            GradeSymbol::Weak => "-",
            GradeSymbol::Poor => "--",
        }
    }
}

/// Displays with the typographic minus sign.
impl fmt::Display for GradeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().replace('-', "\u{2212}"))
    }
}

impl FromStr for GradeSymbol {
    type Err = GradebookError;

    /// Accepts both `-` and the typographic minus `−`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('\u{2212}', "-");
        GradeSymbol::ALL
            .into_iter()
            .find(|symbol| symbol.as_str() == normalized)
            .ok_or_else(|| GradebookError::InvalidInput(format!("unknown grade symbol {s:?}")))
    }
}

// =============================================================================
// Averages & Labels
// =============================================================================

/// Quarter-step display ladder.
const GRADE_STEPS: [(f64, &str); 21] = [
    (1.00, "1"),
    (1.25, "1\u{2212}"),
    (1.50, "1-2"),
    (1.75, "2+"),
    (2.00, "2"),
    (2.25, "2\u{2212}"),
    (2.50, "2-3"),
    (2.75, "3+"),
    (3.00, "3"),
    (3.25, "3\u{2212}"),
    (3.50, "3-4"),
    (3.75, "4+"),
    (4.00, "4"),
    (4.25, "4\u{2212}"),
    (4.50, "4-5"),
    (4.75, "5+"),
    (5.00, "5"),
    (5.25, "5\u{2212}"),
    (5.50, "5-6"),
    (5.75, "6+"),
    (6.00, "6"),
];

/// Placeholder shown when there is no average.
pub const NO_GRADE: &str = "\u{2014}";

/// Arithmetic mean; `None` for no values.
pub fn average(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Snap an average to the nearest ladder step. Ties go to the better grade.
pub fn nearest_label(avg: Option<f64>) -> &'static str {
    let Some(avg) = avg.filter(|a| a.is_finite()) else {
        return NO_GRADE;
    };
    let mut best = GRADE_STEPS[0];
    let mut best_dist = (avg - best.0).abs();
    for step in GRADE_STEPS {
        let dist = (avg - step.0).abs();
        if dist < best_dist {
            best = step;
            best_dist = dist;
        }
    }
    best.1
}

/// One decimal with a German decimal comma, e.g. `2,3`.
pub fn format_average(avg: Option<f64>) -> String {
    match avg {
        Some(a) => format!("{:.1}", (a * 10.0).round() / 10.0).replace('.', ","),
        None => NO_GRADE.to_string(),
    }
}

/// Colour band for an average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeBand {
    /// No data or exactly "4".
    Neutral,
    A,
    B,
    C,
    D,
    E,
}

pub fn grade_band(avg: Option<f64>) -> GradeBand {
    match avg {
        None => GradeBand::Neutral,
        Some(a) if (a - 4.0).abs() < 0.051 => GradeBand::Neutral,
        Some(a) if a <= 2.0 => GradeBand::A,
        Some(a) if a <= 3.0 => GradeBand::B,
        Some(a) if a < 4.0 => GradeBand::C,
        Some(a) if a <= 5.0 => GradeBand::D,
        Some(_) => GradeBand::E,
    }
}

// =============================================================================
// School Year & Terms
// =============================================================================

/// Half of the school year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    First,
    Second,
}

impl Term {
    pub fn number(self) -> u8 {
        match self {
            Term::First => 1,
            Term::Second => 2,
        }
    }
}

/// Boundaries of one school year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolYear {
    pub start: NaiveDate,
    pub second_term_start: NaiveDate,
    pub end: NaiveDate,
}

// Aug 1, Feb 1 and Jul 31 exist in every year chrono can represent.
fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

impl SchoolYear {
    /// The school year containing `today`: Aug 1 / Feb 1 / Jul 31.
    pub fn default_for(today: NaiveDate) -> Self {
        let year = if today.month() >= 8 {
            today.year()
        } else {
            today.year() - 1
        };
        Self {
            start: ymd(year, 8, 1),
            second_term_start: ymd(year + 1, 2, 1),
            end: ymd(year + 1, 7, 31),
        }
    }

    /// Inclusive date range of a term.
    pub fn range(&self, term: Term) -> (NaiveDate, NaiveDate) {
        match term {
            Term::First => (
                self.start,
                self.second_term_start.pred_opt().unwrap_or(self.start),
            ),
            Term::Second => (self.second_term_start, self.end),
        }
    }

    /// Term containing `date`, or `None` outside the school year.
    pub fn term_of(&self, date: NaiveDate) -> Option<Term> {
        if date >= self.start && date < self.second_term_start {
            Some(Term::First)
        } else if date >= self.second_term_start && date <= self.end {
            Some(Term::Second)
        } else {
            None
        }
    }

    /// Term to preselect for `today`; the first term outside the year.
    pub fn current_term(&self, today: NaiveDate) -> Term {
        self.term_of(today).unwrap_or(Term::First)
    }
}

// =============================================================================
// Class Report
// =============================================================================

/// Averages of one student within one school year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub student_id: String,
    pub name: String,
    pub first_term: Option<f64>,
    pub second_term: Option<f64>,
    pub first_count: usize,
    pub second_count: usize,
}

impl ReportRow {
    pub fn label(&self, term: Term) -> &'static str {
        match term {
            Term::First => nearest_label(self.first_term),
            Term::Second => nearest_label(self.second_term),
        }
    }
}

/// Per-student term averages for one class, ordered by sort index.
///
/// Marks are grouped by where their date falls in `year`; marks outside it
/// are left out.
pub fn class_report(
    class_id: &str,
    year: &SchoolYear,
    students: &[Student],
    contributions: &[Contribution],
) -> Vec<ReportRow> {
    let mut by_student: HashMap<&str, [Vec<f64>; 2]> = HashMap::new();
    for contribution in contributions.iter().filter(|c| c.class_id == class_id) {
        let Some(term) = year.term_of(contribution.date) else {
            continue;
        };
        let slot = usize::from(term.number() - 1);
        by_student
            .entry(contribution.student_id.as_str())
            .or_default()[slot]
            .push(f64::from(contribution.value()));
    }

    let mut members: Vec<&Student> = students.iter().filter(|s| s.class_id == class_id).collect();
    members.sort_by_key(|s| s.sort_index);

    members
        .into_iter()
        .map(|student| {
            let [first, second] = by_student.remove(student.id.as_str()).unwrap_or_default();
            ReportRow {
                student_id: student.id.clone(),
                name: student.name.clone(),
                first_term: average(first.iter().copied()),
                second_term: average(second.iter().copied()),
                first_count: first.len(),
                second_count: second.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn symbols_map_to_values() {
        let values: Vec<u8> = GradeSymbol::ALL.iter().map(|s| s.value()).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn parses_typographic_minus() {
        assert_eq!("\u{2212}\u{2212}".parse::<GradeSymbol>().unwrap(), GradeSymbol::Poor);
        assert_eq!("-".parse::<GradeSymbol>().unwrap(), GradeSymbol::Weak);
        assert_eq!(" o ".parse::<GradeSymbol>().unwrap(), GradeSymbol::Neutral);
        assert!("++++".parse::<GradeSymbol>().is_err());
    }

    #[test]
    fn symbol_serializes_as_ascii_and_displays_with_minus() {
        assert_eq!(serde_json::to_string(&GradeSymbol::Poor).unwrap(), r#""--""#);
        assert_eq!(GradeSymbol::Weak.to_string(), "\u{2212}");
    }

    #[test]
    fn average_of_nothing_is_none() {
        assert_eq!(average(Vec::<f64>::new()), None);
        assert_eq!(average([1.0, 2.0, 4.0]), Some(7.0 / 3.0));
    }

    #[test]
    fn labels_snap_to_quarter_steps() {
        assert_eq!(nearest_label(None), NO_GRADE);
        assert_eq!(nearest_label(Some(1.0)), "1");
        assert_eq!(nearest_label(Some(2.3)), "2\u{2212}");
        assert_eq!(nearest_label(Some(2.5)), "2-3");
        assert_eq!(nearest_label(Some(3.8)), "4+");
        assert_eq!(nearest_label(Some(9.0)), "6");
    }

    #[test]
    fn label_ties_prefer_better_grade() {
        // 2.125 is equidistant from 2.00 and 2.25
        assert_eq!(nearest_label(Some(2.125)), "2");
    }

    #[test]
    fn averages_format_with_decimal_comma() {
        assert_eq!(format_average(Some(7.0 / 3.0)), "2,3");
        assert_eq!(format_average(None), NO_GRADE);
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(grade_band(None), GradeBand::Neutral);
        assert_eq!(grade_band(Some(4.0)), GradeBand::Neutral);
        assert_eq!(grade_band(Some(2.0)), GradeBand::A);
        assert_eq!(grade_band(Some(2.5)), GradeBand::B);
        assert_eq!(grade_band(Some(3.9)), GradeBand::C);
        assert_eq!(grade_band(Some(4.5)), GradeBand::D);
        assert_eq!(grade_band(Some(5.5)), GradeBand::E);
    }

    #[test]
    fn default_school_year_depends_on_month() {
        let autumn = SchoolYear::default_for(date(2025, 9, 15));
        assert_eq!(autumn.start, date(2025, 8, 1));
        assert_eq!(autumn.second_term_start, date(2026, 2, 1));
        assert_eq!(autumn.end, date(2026, 7, 31));

        let spring = SchoolYear::default_for(date(2026, 3, 1));
        assert_eq!(spring, autumn);
    }

    #[test]
    fn terms_split_on_second_term_start() {
        let year = SchoolYear::default_for(date(2025, 9, 1));
        assert_eq!(year.term_of(date(2026, 1, 31)), Some(Term::First));
        assert_eq!(year.term_of(date(2026, 2, 1)), Some(Term::Second));
        assert_eq!(year.term_of(date(2026, 8, 1)), None);
        assert_eq!(year.range(Term::First), (date(2025, 8, 1), date(2026, 1, 31)));
        assert_eq!(year.current_term(date(2024, 1, 1)), Term::First);
    }

    #[test]
    fn report_averages_per_term_in_sort_order() {
        let mut anna = Student::new("c1", "Anna Becker", 2);
        anna.id = "s1".into();
        let mut ben = Student::new("c1", "Ben Schulz", 1);
        ben.id = "s2".into();
        let outsider = Student::new("c2", "Cem Yilmaz", 0);

        let year = SchoolYear::default_for(date(2025, 9, 1));
        let autumn = date(2025, 10, 1);
        let spring = date(2026, 3, 1);
        let contributions = vec![
            Contribution::new("s1", "c1", autumn, GradeSymbol::Excellent, Term::First),
            Contribution::new("s1", "c1", autumn, GradeSymbol::Satisfactory, Term::First),
            Contribution::new("s1", "c1", spring, GradeSymbol::Poor, Term::Second),
            Contribution::new("s2", "c2", autumn, GradeSymbol::Poor, Term::First),
        ];

        let report = class_report("c1", &year, &[anna, ben, outsider], &contributions);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].name, "Ben Schulz");
        assert_eq!(report[0].first_term, None);
        assert_eq!(report[1].first_term, Some(2.0));
        assert_eq!(report[1].second_term, Some(6.0));
        assert_eq!((report[1].first_count, report[1].second_count), (2, 1));
        assert_eq!(report[1].label(Term::First), "2");
    }

    #[test]
    fn report_ignores_marks_from_other_school_years() {
        let mut anna = Student::new("c1", "Anna Becker", 0);
        anna.id = "s1".into();

        let year = SchoolYear::default_for(date(2025, 9, 1));
        let contributions = vec![
            Contribution::new("s1", "c1", date(2024, 10, 1), GradeSymbol::Poor, Term::First),
            Contribution::new("s1", "c1", date(2025, 10, 1), GradeSymbol::Excellent, Term::First),
        ];

        let report = class_report("c1", &year, &[anna], &contributions);
        assert_eq!(report[0].first_term, Some(1.0));
        assert_eq!(report[0].first_count, 1);
        assert_eq!(report[0].label(Term::First), "1");
    }

    #[test]
    fn report_groups_by_date_not_stored_term() {
        let mut anna = Student::new("c1", "Anna Becker", 0);
        anna.id = "s1".into();

        // Boundaries moved after the mark was recorded as first term
        let mut year = SchoolYear::default_for(date(2025, 9, 1));
        year.second_term_start = date(2026, 1, 1);
        let mark = Contribution::new("s1", "c1", date(2026, 1, 15), GradeSymbol::Good, Term::First);

        let report = class_report("c1", &year, &[anna], &[mark]);
        assert_eq!(report[0].first_term, None);
        assert_eq!(report[0].second_term, Some(2.0));
    }
}
