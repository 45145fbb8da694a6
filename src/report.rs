//! Spreadsheet report rendering.
//!
//! Uses umya-spreadsheet to fill a pre-formatted template: the title cell gets
//! the report date and every team row gets its summary block.

use crate::config::ReportConfig;
use crate::summary::TeamSummary;
use chrono::NaiveDate;
use std::path::Path;
use thiserror::Error;
use umya_spreadsheet::{HorizontalAlignmentValues, Spreadsheet, VerticalAlignmentValues, Worksheet};

/// Placeholder in the title cell replaced by the report date
pub const DATE_PLACEHOLDER: &str = "DD|MM|YYYY";

/// Row height bounds, in points
const MIN_ROW_HEIGHT: f64 = 20.0;
const MAX_ROW_HEIGHT: f64 = 300.0;
const LINE_HEIGHT: f64 = 16.0;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read template {path}: {message}")]
    Template { path: String, message: String },
    #[error("failed to write report {path}: {message}")]
    Write { path: String, message: String },
    #[error("template has no worksheet")]
    NoWorksheet,
}

/// Row height that fits a block of `lines` lines.
pub fn row_height(lines: usize) -> f64 {
    (lines as f64 * LINE_HEIGHT).clamp(MIN_ROW_HEIGHT, MAX_ROW_HEIGHT)
}

/// A template workbook being filled in.
pub struct ReportWorkbook {
    book: Spreadsheet,
    layout: ReportConfig,
}

impl ReportWorkbook {
    /// Open the template named in `layout`.
    pub fn open(layout: &ReportConfig) -> Result<Self, ReportError> {
        let book = umya_spreadsheet::reader::xlsx::read(&layout.template).map_err(|e| {
            ReportError::Template {
                path: layout.template.display().to_string(),
                message: e.to_string(),
            }
        })?;
        Self::from_book(book, layout)
    }

    pub fn from_book(book: Spreadsheet, layout: &ReportConfig) -> Result<Self, ReportError> {
        if book.get_sheet(&0).is_none() {
            return Err(ReportError::NoWorksheet);
        }
        Ok(Self {
            book,
            layout: layout.clone(),
        })
    }

    fn sheet(&self) -> Result<&Worksheet, ReportError> {
        self.book.get_sheet(&0).ok_or(ReportError::NoWorksheet)
    }

    fn sheet_mut(&mut self) -> Result<&mut Worksheet, ReportError> {
        self.book.get_sheet_mut(&0).ok_or(ReportError::NoWorksheet)
    }

    /// Replace the date placeholder in the title cell. Returns whether it was present.
    pub fn stamp_title(&mut self, date: NaiveDate) -> Result<bool, ReportError> {
        let coordinate = self.layout.title_cell.clone();
        let sheet = self.sheet_mut()?;
        let title = sheet.get_value(coordinate.as_str());
        if !title.contains(DATE_PLACEHOLDER) {
            return Ok(false);
        }

        let stamped = title.replace(DATE_PLACEHOLDER, &date.format("%d-%b-%Y").to_string());
        sheet
            .get_cell_mut(coordinate.as_str())
            .set_value_string(stamped);
        Ok(true)
    }

    /// Every (row, team name) in the team column, from the first team row down.
    pub fn team_rows(&self) -> Result<Vec<(u32, String)>, ReportError> {
        let sheet = self.sheet()?;
        let last_row = sheet.get_highest_row();
        let rows = (self.layout.first_row..=last_row)
            .filter_map(|row| {
                let coordinate = format!("{}{}", self.layout.team_column, row);
                let team = sheet.get_value(coordinate.as_str()).trim().to_string();
                (!team.is_empty()).then_some((row, team))
            })
            .collect();
        Ok(rows)
    }

    /// Write a team's summary block into the summary column of `row`.
    pub fn write_summary(&mut self, row: u32, summary: &TeamSummary) -> Result<(), ReportError> {
        let coordinate = format!("{}{}", self.layout.summary_column, row);
        let sheet = self.sheet_mut()?;

        let cell = sheet.get_cell_mut(coordinate.as_str());
        cell.set_value_string(summary.to_string());
        let alignment = cell.get_style_mut().get_alignment_mut();
        alignment.set_wrap_text(true);
        alignment.set_horizontal(HorizontalAlignmentValues::Left);
        alignment.set_vertical(VerticalAlignmentValues::Center);

        sheet
            .get_row_dimension_mut(&row)
            .set_height(row_height(summary.line_count()))
            .set_custom_height(true);
        Ok(())
    }

    pub fn value(&self, coordinate: &str) -> Result<String, ReportError> {
        Ok(self.sheet()?.get_value(coordinate))
    }

    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        umya_spreadsheet::writer::xlsx::write(&self.book, path).map_err(|e| ReportError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
