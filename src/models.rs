// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Gradebook Records
//!
//! Typed records for each encrypted collection. Every type implements
//! [`Record`], which ties it to its collection and storage key so the
//! record store can only put a student into `students`, a seat plan into
//! `seat_plans`, and so on.
//!
//! ## Record Categories
//!
//! - **Settings**: one record under the fixed key `"settings"`
//! - **Classes**: teaching groups with optional school-year overrides
//! - **Students**: members of a class, ordered by `sort_index`
//! - **Contributions**: single oral-participation marks
//! - **Seat plans**: one room layout per class, keyed by class id

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GradebookError, Result};
use crate::grades::{GradeSymbol, SchoolYear, Term};
use crate::storage::{Collection, Record};

/// New random record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Settings
// =============================================================================

/// Fixed storage key of the settings record.
pub const SETTINGS_ID: &str = "settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// How students of a class are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Manual order by `sort_index`.
    #[default]
    Manual,
    FirstName,
    LastName,
}

/// User preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub id: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub sort_mode_by_class: BTreeMap<String, SortMode>,
    pub school_year: SchoolYear,
}

impl Settings {
    /// Defaults for a fresh account, with the school year containing `today`.
    pub fn for_today(today: NaiveDate) -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            theme: Theme::default(),
            sort_mode_by_class: BTreeMap::new(),
            school_year: SchoolYear::default_for(today),
        }
    }

    pub fn sort_mode(&self, class_id: &str) -> SortMode {
        self.sort_mode_by_class
            .get(class_id)
            .copied()
            .unwrap_or_default()
    }

    /// School year for a class: its override, else the global one.
    pub fn school_year_for(&self, class: &SchoolClass) -> SchoolYear {
        class.school_year.unwrap_or(self.school_year)
    }
}

impl Record for Settings {
    const COLLECTION: Collection = Collection::Settings;

    fn storage_key(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Classes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolClass {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub teacher: String,
    /// Overrides the global school-year boundaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_year: Option<SchoolYear>,
    pub created_at: DateTime<Utc>,
}

impl SchoolClass {
    pub fn new(name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            subject: subject.into(),
            teacher: String::new(),
            school_year: None,
            created_at: Utc::now(),
        }
    }
}

impl Record for SchoolClass {
    const COLLECTION: Collection = Collection::Classes;

    fn storage_key(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Students
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub class_id: String,
    /// Full display name, e.g. "Anna Becker".
    pub name: String,
    #[serde(default)]
    pub sort_index: u32,
}

impl Student {
    pub fn new(class_id: impl Into<String>, name: impl Into<String>, sort_index: u32) -> Self {
        Self {
            id: new_id(),
            class_id: class_id.into(),
            name: name.into(),
            sort_index,
        }
    }

    /// Everything before the last word.
    pub fn first_name(&self) -> &str {
        let name = self.name.trim();
        match name.rsplit_once(char::is_whitespace) {
            Some((first, _)) => first.trim_end(),
            None => name,
        }
    }

    /// The last word, or empty for single-word names.
    pub fn last_name(&self) -> &str {
        match self.name.trim().rsplit_once(char::is_whitespace) {
            Some((_, last)) => last,
            None => "",
        }
    }
}

impl Record for Student {
    const COLLECTION: Collection = Collection::Students;

    fn storage_key(&self) -> &str {
        &self.id
    }
}

/// Order students of one class according to `mode`.
pub fn sort_students(students: &mut [Student], mode: SortMode) {
    match mode {
        SortMode::Manual => students.sort_by_key(|s| s.sort_index),
        SortMode::FirstName => students.sort_by(|a, b| {
            a.first_name()
                .to_lowercase()
                .cmp(&b.first_name().to_lowercase())
                .then_with(|| a.last_name().to_lowercase().cmp(&b.last_name().to_lowercase()))
        }),
        SortMode::LastName => students.sort_by(|a, b| {
            a.last_name()
                .to_lowercase()
                .cmp(&b.last_name().to_lowercase())
                .then_with(|| a.first_name().to_lowercase().cmp(&b.first_name().to_lowercase()))
        }),
    }
}

// =============================================================================
// Contributions
// =============================================================================

/// One oral-participation mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: String,
    pub student_id: String,
    pub class_id: String,
    pub date: NaiveDate,
    pub symbol: GradeSymbol,
    pub term: Term,
}

impl Contribution {
    pub fn new(
        student_id: impl Into<String>,
        class_id: impl Into<String>,
        date: NaiveDate,
        symbol: GradeSymbol,
        term: Term,
    ) -> Self {
        Self {
            id: new_id(),
            student_id: student_id.into(),
            class_id: class_id.into(),
            date,
            symbol,
            term,
        }
    }

    /// Numeric grade 1..6.
    pub fn value(&self) -> u8 {
        self.symbol.value()
    }
}

impl Record for Contribution {
    const COLLECTION: Collection = Collection::Contributions;

    fn storage_key(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Seat Plans
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutType {
    #[default]
    Grid,
    /// Only border seats are usable.
    UShape,
}

/// A student sitting at a zero-based seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub student_id: String,
    pub row: u32,
    pub col: u32,
}

/// Room layout of one class, stored under the class id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatPlan {
    pub class_id: String,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub layout: LayoutType,
    pub rows: u32,
    pub cols: u32,
    /// Columns followed by an aisle.
    #[serde(default)]
    pub aisle_cols: Vec<u32>,
    #[serde(default)]
    pub placements: Vec<Placement>,
}

impl SeatPlan {
    pub const DEFAULT_ROWS: u32 = 5;
    pub const DEFAULT_COLS: u32 = 6;

    pub fn new(class_id: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            room_name: String::new(),
            layout: LayoutType::Grid,
            rows: Self::DEFAULT_ROWS,
            cols: Self::DEFAULT_COLS,
            aisle_cols: Vec::new(),
            placements: Vec::new(),
        }
    }

    pub fn is_seat_usable(&self, row: u32, col: u32) -> bool {
        if row >= self.rows || col >= self.cols {
            return false;
        }
        match self.layout {
            LayoutType::Grid => true,
            LayoutType::UShape => {
                row == 0 || row == self.rows - 1 || col == 0 || col == self.cols - 1
            }
        }
    }

    pub fn student_at(&self, row: u32, col: u32) -> Option<&str> {
        self.placements
            .iter()
            .find(|p| p.row == row && p.col == col)
            .map(|p| p.student_id.as_str())
    }

    /// Seat a student, moving them if already placed and evicting any occupant.
    pub fn place(&mut self, student_id: &str, row: u32, col: u32) -> Result<()> {
        if !self.is_seat_usable(row, col) {
            return Err(GradebookError::InvalidInput(format!(
                "seat ({row}, {col}) is not usable in a {}x{} {:?} layout",
                self.rows, self.cols, self.layout
            )));
        }
        self.placements
            .retain(|p| p.student_id != student_id && !(p.row == row && p.col == col));
        self.placements.push(Placement {
            student_id: student_id.to_string(),
            row,
            col,
        });
        Ok(())
    }

    /// Seat a student of this plan's class.
    pub fn seat(&mut self, student: &Student, row: u32, col: u32) -> Result<()> {
        if student.class_id != self.class_id {
            return Err(GradebookError::InvalidInput(format!(
                "student {} belongs to class {}, not {}",
                student.id, student.class_id, self.class_id
            )));
        }
        self.place(&student.id, row, col)
    }

    /// Returns whether the student was seated.
    pub fn remove_student(&mut self, student_id: &str) -> bool {
        let before = self.placements.len();
        self.placements.retain(|p| p.student_id != student_id);
        self.placements.len() != before
    }

    /// Change dimensions or layout, dropping placements on seats that no
    /// longer exist.
    pub fn resize(&mut self, rows: u32, cols: u32, layout: LayoutType) -> Result<()> {
        if rows == 0 || cols == 0 {
            return Err(GradebookError::InvalidInput(
                "seat plan needs at least one row and column".into(),
            ));
        }
        self.rows = rows;
        self.cols = cols;
        self.layout = layout;
        self.aisle_cols.retain(|c| *c < cols);
        let placements = std::mem::take(&mut self.placements);
        self.placements = placements
            .into_iter()
            .filter(|p| self.is_seat_usable(p.row, p.col))
            .collect();
        Ok(())
    }
}

impl Record for SeatPlan {
    const COLLECTION: Collection = Collection::SeatPlans;

    fn storage_key(&self) -> &str {
        &self.class_id
    }
}
