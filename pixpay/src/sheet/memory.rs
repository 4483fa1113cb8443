//! In-memory payment sheet
//!
//! Holds the grid of cells directly, header row included, so it behaves like
//! the real sheet for both reads and single-cell writes.

use super::{PaymentSheet, SheetError};
use crate::record::PaymentRecord;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Payment sheet backed by a grid of strings
pub struct MemorySheet {
    /// Row 0 is the header row (sheet row 1)
    grid: Mutex<Vec<Vec<String>>>,
}

impl MemorySheet {
    pub fn new<H, R>(headers: H, rows: Vec<R>) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        let mut grid = vec![headers.into_iter().map(Into::into).collect::<Vec<String>>()];
        grid.extend(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect::<Vec<String>>()),
        );
        Self {
            grid: Mutex::new(grid),
        }
    }

    /// Read one cell by 1-based sheet coordinates; cells past a row's end are empty
    pub async fn cell(&self, row: u32, column: u32) -> Option<String> {
        if row == 0 || column == 0 {
            return None;
        }
        let grid = self.grid.lock().await;
        let cells = grid.get(row as usize - 1)?;
        Some(cells.get(column as usize - 1).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl PaymentSheet for MemorySheet {
    async fn records(&self) -> Result<Vec<PaymentRecord>, SheetError> {
        let grid = self.grid.lock().await;
        let Some((headers, rows)) = grid.split_first() else {
            return Ok(Vec::new());
        };
        Ok(rows
            .iter()
            .map(|cells| PaymentRecord::from_row(headers, cells))
            .collect())
    }

    async fn update_cell(&self, row: u32, column: u32, value: &str) -> Result<(), SheetError> {
        let mut grid = self.grid.lock().await;
        if row == 0 || column == 0 || row as usize > grid.len() {
            return Err(SheetError::OutOfRange { row, column });
        }

        let cells = &mut grid[row as usize - 1];
        let col = column as usize - 1;
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> MemorySheet {
        MemorySheet::new(
            ["nome_beneficiario", "chave_pix"],
            vec![vec!["Ana", "ana@example.com"], vec!["Bruno"]],
        )
    }

    #[tokio::test]
    async fn test_records_exclude_header() {
        let records = sheet().records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].pix_key, "ana@example.com");
        assert_eq!(records[1].beneficiary, "Bruno");
        assert_eq!(records[1].pix_key, "");
    }

    #[tokio::test]
    async fn test_update_extends_short_row() {
        let sheet = sheet();
        sheet.update_cell(3, 4, "code-1").await.unwrap();
        assert_eq!(sheet.cell(3, 4).await.as_deref(), Some("code-1"));
        assert_eq!(sheet.cell(3, 3).await.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_update_out_of_range() {
        let sheet = sheet();
        assert!(matches!(
            sheet.update_cell(4, 1, "x").await,
            Err(SheetError::OutOfRange { row: 4, column: 1 })
        ));
        assert!(sheet.update_cell(0, 1, "x").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_sheet() {
        let sheet = MemorySheet::new(Vec::<String>::new(), Vec::<Vec<String>>::new());
        // Header row exists but is empty, so no records
        assert!(sheet.records().await.unwrap().is_empty());
    }
}
