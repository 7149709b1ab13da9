//! Table extractor: turns the flat cell sequence of a tabular pane into rows.

use crate::error::Result;
use crate::pane::{PaneReader, PaneState};
use scout_core::{FieldSet, Table, TableRow};

/// Partition `cells` into rows of `fields.len()` cells, keyed in declared order.
///
/// Row `i` (1-based) holds cells `[(i-1)*n, i*n)`. A trailing partial row is
/// dropped and counted in [`Table::dropped_cells`].
#[must_use]
pub fn chunk_rows(cells: &[String], fields: &FieldSet) -> Table {
    let chunks = cells.chunks_exact(fields.len());
    let dropped_cells = chunks.remainder().len();

    let rows = chunks
        .enumerate()
        .map(|(i, chunk)| TableRow {
            index: i + 1,
            values: fields
                .names()
                .iter()
                .cloned()
                .zip(chunk.iter().cloned())
                .collect(),
        })
        .collect();

    Table {
        rows,
        dropped_cells,
    }
}

/// Reveal a tabular pane and chunk its cells.
///
/// Returns `None` if the pane reports an error.
pub async fn read_table(
    reader: &PaneReader<'_>,
    reveal: &str,
    cell_selector: &str,
    fields: &FieldSet,
) -> Result<Option<Table>> {
    reader.reveal(reveal).await?;

    if reader.await_outcome(cell_selector).await? == PaneState::Errored {
        tracing::debug!("Table behind {} reported an error", reveal);
        return Ok(None);
    }

    let cells = reader.view().read_all_text(cell_selector).await?;
    let table = chunk_rows(&cells, fields);

    if table.dropped_cells > 0 {
        tracing::warn!(
            "Table behind {} has {} cells, not a multiple of {} columns; dropped {} trailing cells",
            reveal,
            cells.len(),
            fields.len(),
            table.dropped_cells
        );
    }

    Ok(Some(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> FieldSet {
        FieldSet::new(names.iter().map(ToString::to_string).collect()).expect("field set")
    }

    fn cells(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{i}")).collect()
    }

    #[test]
    fn test_citation_pairs() {
        let table = chunk_rows(&cells(6), &fields(&["CitationOrigin", "Publication"]));

        assert_eq!(table.len(), 3);
        assert_eq!(table.dropped_cells, 0);
        for (i, row) in table.rows.iter().enumerate() {
            assert_eq!(row.index, i + 1);
            assert_eq!(row.get("CitationOrigin"), Some(format!("c{}", 2 * i).as_str()));
            assert_eq!(row.get("Publication"), Some(format!("c{}", 2 * i + 1).as_str()));
        }
    }

    #[test]
    fn test_row_i_field_j_is_cell_i_n_plus_j() {
        let family = fields(&[
            "Publication",
            "Application number",
            "Title",
            "Publication date",
            "Applicants",
        ]);
        let table = chunk_rows(&cells(15), &family);

        assert_eq!(table.len(), 3);
        for (i, row) in table.rows.iter().enumerate() {
            for (j, (field, text)) in row.values.iter().enumerate() {
                assert_eq!(field, &family.names()[j]);
                assert_eq!(text, &format!("c{}", i * 5 + j));
            }
        }
    }

    #[test]
    fn test_partial_row_is_dropped_and_counted() {
        let table = chunk_rows(&cells(7), &fields(&["a", "b", "c"]));
        assert_eq!(table.len(), 2);
        assert_eq!(table.dropped_cells, 1);
        assert_eq!(table.row(2).and_then(|r| r.get("c")), Some("c5"));
    }

    #[test]
    fn test_no_cells() {
        let table = chunk_rows(&[], &fields(&["a"]));
        assert!(table.is_empty());
        assert_eq!(table.dropped_cells, 0);
    }
}
