//! The sheet: grid storage, printable-area bookkeeping, and the
//! validate → cycle-check → commit → invalidate pipeline.
//!
//! The grid is jagged and grows on demand; a slot is `None` until its
//! position is first written (directly, or as an empty placeholder when
//! a formula references it). Slots are never deallocated - a cleared
//! cell keeps its dependent edges so later re-population invalidates
//! correctly. The printable bounding box is derived from per-axis
//! occupancy counters in O(1).

use std::fmt;

use rustc_hash::FxHashSet;

use tabula_core::{Position, SheetView, Size, Value};

use crate::cell::{Cell, Content};
use crate::dep_graph::DepGraph;
use crate::error::SheetError;
use crate::recalc::RecalcStats;

#[derive(Debug, Default)]
pub struct Sheet {
    rows: Vec<Vec<Option<Cell>>>,
    /// Non-empty-cell count per row index, trailing zeros trimmed.
    filled_by_row: Vec<u32>,
    /// Non-empty-cell count per column index, trailing zeros trimmed.
    filled_by_col: Vec<u32>,
    graph: DepGraph,
    last_recalc: RecalcStats,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell from raw input text.
    ///
    /// Validates the position, resolves content (formula parse errors
    /// surface here), rejects edits that would close a reference cycle,
    /// and only then commits: dependency edges are swapped atomically,
    /// occupancy tracks the empty↔non-empty transition, and every
    /// downstream cache is invalidated before the call returns. A
    /// rejected edit leaves the sheet as it was, apart from empty
    /// placeholder slots allocated for forward references.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SheetError> {
        validate(pos)?;
        let content = Content::from_input(text)?;
        let new_refs: Vec<Position> = content
            .referenced_cells()
            .iter()
            .copied()
            .filter(Position::is_valid)
            .collect();
        self.check_cycle(pos, &new_refs)?;

        for &target in &new_refs {
            self.ensure_cell(target);
        }
        let cell = self.ensure_cell(pos);
        let was_empty = cell.is_empty();
        let had_cache = cell.take_cache();
        cell.replace_content(content);
        let now_empty = cell.is_empty();

        self.graph.replace_refs(pos, new_refs);
        match (was_empty, now_empty) {
            (true, false) => self.mark_filled(pos),
            (false, true) => self.mark_emptied(pos),
            _ => {}
        }

        let downstream = self.invalidate_dependents(pos);
        self.last_recalc = RecalcStats {
            cells_invalidated: downstream + usize::from(had_cache),
        };
        Ok(())
    }

    /// The cell at `pos`, or `Ok(None)` for a slot that was never
    /// written - a valid outcome, distinct from an out-of-range position.
    pub fn cell(&self, pos: Position) -> Result<Option<&Cell>, SheetError> {
        validate(pos)?;
        Ok(self.slot(pos))
    }

    /// The computed value at `pos`; absent slots read as the empty value.
    pub fn value(&self, pos: Position) -> Result<Value, SheetError> {
        validate(pos)?;
        Ok(self
            .slot(pos)
            .map(|cell| cell.value(self))
            .unwrap_or_else(Value::empty))
    }

    /// Clear a cell: content becomes Empty, outgoing reference edges are
    /// dropped, dependent edges stay, and downstream caches invalidate.
    /// Clearing an absent slot is a no-op.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        validate(pos)?;
        let Some(cell) = self.slot_mut(pos) else {
            self.last_recalc = RecalcStats::default();
            return Ok(());
        };
        let was_empty = cell.is_empty();
        let had_cache = cell.take_cache();
        cell.replace_content(Content::Empty);

        self.graph.clear_refs(pos);
        if !was_empty {
            self.mark_emptied(pos);
        }

        let downstream = self.invalidate_dependents(pos);
        self.last_recalc = RecalcStats {
            cells_invalidated: downstream + usize::from(had_cache),
        };
        Ok(())
    }

    /// Minimal bounding box of all non-empty cells. O(1).
    pub fn printable_size(&self) -> Size {
        Size::new(self.filled_by_row.len(), self.filled_by_col.len())
    }

    /// What the last `set_cell`/`clear_cell` invalidated.
    pub fn recalc_stats(&self) -> RecalcStats {
        self.last_recalc
    }

    /// Dump computed values over the printable rectangle: fields
    /// tab-separated, rows newline-terminated, empty cells as empty
    /// fields. Read-only (caches may fill, never clear).
    pub fn write_values<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        self.write_grid(out, false)
    }

    /// Dump cell texts over the printable rectangle, same shape as
    /// `write_values`.
    pub fn write_texts<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        self.write_grid(out, true)
    }

    fn write_grid<W: fmt::Write>(&self, out: &mut W, as_text: bool) -> fmt::Result {
        let size = self.printable_size();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    out.write_char('\t')?;
                }
                if let Some(cell) = self.slot(Position::new(row, col)) {
                    if as_text {
                        out.write_str(&cell.text())?;
                    } else {
                        write!(out, "{}", cell.value(self))?;
                    }
                }
            }
            out.write_char('\n')?;
        }
        Ok(())
    }

    // =========================================================================
    // Cycle detection
    // =========================================================================

    /// Breadth-first closure over the candidate's referenced set,
    /// performed before any visible mutation. `refs` is the sorted,
    /// grid-valid reference list the formula at `target` would commit.
    ///
    /// Forward references are legal: a referenced position never written
    /// gets an empty placeholder cell, which is acyclic by construction.
    /// Termination: `seen` grows monotonically and is bounded by the
    /// number of cells in the sheet.
    fn check_cycle(&mut self, target: Position, refs: &[Position]) -> Result<(), SheetError> {
        if refs.is_empty() {
            return Ok(());
        }
        let mut seen: FxHashSet<Position> = FxHashSet::default();
        let mut frontier: Vec<Position> = refs.to_vec();

        while !frontier.is_empty() {
            if frontier.binary_search(&target).is_ok() {
                return Err(SheetError::CircularDependency(target));
            }
            let mut next: Vec<Position> = Vec::new();
            for pos in frontier.drain(..) {
                if !seen.insert(pos) {
                    continue;
                }
                self.ensure_cell(pos);
                next.extend_from_slice(self.graph.referenced_cells(pos));
            }
            next.sort_unstable();
            next.dedup();
            next.retain(|pos| !seen.contains(pos));
            frontier = next;
        }
        Ok(())
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Clear caches downstream of `start`, returning how many cells
    /// actually had one. The start's dependents are seeded
    /// unconditionally (its value changed even if nothing was cached
    /// there); past them, a cell whose cache was already clear stops the
    /// walk - its dependents were invalidated when it was.
    fn invalidate_dependents(&mut self, start: Position) -> usize {
        let mut cleared = 0usize;
        let mut work: Vec<Position> = self.graph.dependents(start).collect();
        while let Some(pos) = work.pop() {
            let Some(cell) = self.slot(pos) else { continue };
            if cell.take_cache() {
                cleared += 1;
                work.extend(self.graph.dependents(pos));
            }
        }
        cleared
    }

    // =========================================================================
    // Grid storage
    // =========================================================================

    fn slot(&self, pos: Position) -> Option<&Cell> {
        self.rows.get(pos.row)?.get(pos.col)?.as_ref()
    }

    fn slot_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.rows.get_mut(pos.row)?.get_mut(pos.col)?.as_mut()
    }

    /// Grow the grid to include `pos` and allocate its cell if absent.
    fn ensure_cell(&mut self, pos: Position) -> &mut Cell {
        if self.rows.len() <= pos.row {
            self.rows.resize_with(pos.row + 1, Vec::new);
        }
        let row = &mut self.rows[pos.row];
        if row.len() <= pos.col {
            row.resize_with(pos.col + 1, || None);
        }
        row[pos.col].get_or_insert_with(Cell::new)
    }

    // =========================================================================
    // Occupancy
    // =========================================================================

    fn mark_filled(&mut self, pos: Position) {
        if self.filled_by_row.len() <= pos.row {
            self.filled_by_row.resize(pos.row + 1, 0);
        }
        if self.filled_by_col.len() <= pos.col {
            self.filled_by_col.resize(pos.col + 1, 0);
        }
        self.filled_by_row[pos.row] += 1;
        self.filled_by_col[pos.col] += 1;
    }

    fn mark_emptied(&mut self, pos: Position) {
        self.filled_by_row[pos.row] -= 1;
        self.filled_by_col[pos.col] -= 1;
        // Shrink affects trailing empty runs only; interior gaps keep
        // the printable box extended.
        while self.filled_by_row.last() == Some(&0) {
            self.filled_by_row.pop();
        }
        while self.filled_by_col.last() == Some(&0) {
            self.filled_by_col.pop();
        }
    }
}

impl SheetView for Sheet {
    fn cell_value(&self, pos: Position) -> Option<Value> {
        self.slot(pos).map(|cell| cell.value(self))
    }
}

fn validate(pos: Position) -> Result<(), SheetError> {
    if pos.is_valid() {
        Ok(())
    } else {
        Err(SheetError::InvalidPosition(pos))
    }
}
