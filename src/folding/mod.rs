//! Indentation-based code folding.
//!
//! A line is foldable when the next line is indented deeper. Its region
//! runs to the last line before indentation drops back to the start line's
//! level (or to the end of the document). Collapsed regions hide the lines
//! after their start line; nested regions keep their own flag.

use std::collections::BTreeMap;

use crate::buffer::{Change, TextBuffer};
use crate::perf;

/// Placeholder shown in place of a collapsed region's hidden lines.
pub const DEFAULT_PLACEHOLDER: &str = "...";

/// Leading whitespace width of `line`, counting a tab as `tab_width`.
pub fn indent_level(line: &str, tab_width: usize) -> usize {
    let mut indent = 0;
    for c in line.chars() {
        match c {
            ' ' => indent += 1,
            '\t' => indent += tab_width,
            _ => break,
        }
    }
    indent
}

/// A collapsible line range keyed by its start line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldRegion {
    pub start_line: usize,
    pub end_line: usize,
    pub placeholder: String,
    pub collapsed: bool,
}

impl FoldRegion {
    /// Whether `line` is one of the lines this region hides when collapsed.
    pub const fn hides(&self, line: usize) -> bool {
        line > self.start_line && line <= self.end_line
    }

    /// Number of lines hidden when collapsed.
    pub const fn hidden_count(&self) -> usize {
        self.end_line - self.start_line
    }
}

/// Fold regions of one document.
#[derive(Debug, Clone)]
pub struct FoldingEngine {
    regions: BTreeMap<usize, FoldRegion>,
    tab_width: usize,
    placeholder: String,
}

impl FoldingEngine {
    pub fn new(tab_width: usize, placeholder: impl Into<String>) -> Self {
        Self {
            regions: BTreeMap::new(),
            tab_width,
            placeholder: placeholder.into(),
        }
    }

    pub const fn tab_width(&self) -> usize {
        self.tab_width
    }

    pub fn set_tab_width(&mut self, buffer: &TextBuffer, tab_width: usize) {
        if self.tab_width != tab_width {
            self.tab_width = tab_width;
            self.rescan(buffer);
        }
    }

    pub fn set_placeholder(&mut self, placeholder: &str) {
        self.placeholder = placeholder.to_string();
        for region in self.regions.values_mut() {
            region.placeholder = self.placeholder.clone();
        }
    }

    /// Indentation of buffer line `line`; past the end counts as 0.
    pub fn line_indent(&self, buffer: &TextBuffer, line: usize) -> usize {
        buffer
            .line_text(line)
            .map_or(0, |text| indent_level(&text, self.tab_width))
    }

    pub fn is_foldable(&self, buffer: &TextBuffer, line: usize) -> bool {
        line + 1 < buffer.line_count()
            && self.line_indent(buffer, line) < self.line_indent(buffer, line + 1)
    }

    /// Last line of the region starting at `start_line`.
    pub fn matching_end(&self, buffer: &TextBuffer, start_line: usize) -> usize {
        let start_indent = self.line_indent(buffer, start_line);
        let last = buffer.line_count() - 1;
        ((start_line + 1)..=last)
            .find(|&line| self.line_indent(buffer, line) <= start_indent)
            .map_or(last, |line| line - 1)
    }

    /// Rediscover every region. Regions that still start on the same line
    /// keep their collapsed flag.
    pub fn rescan(&mut self, buffer: &TextBuffer) {
        let _scope = perf::scope("folding.rescan");
        let indents: Vec<usize> = (0..buffer.line_count())
            .map(|line| self.line_indent(buffer, line))
            .collect();

        let mut regions = BTreeMap::new();
        for start in 0..indents.len().saturating_sub(1) {
            if indents[start] >= indents[start + 1] {
                continue;
            }
            let end = indents[start + 1..]
                .iter()
                .position(|&indent| indent <= indents[start])
                .map_or(indents.len() - 1, |i| start + i);
            let collapsed = self
                .regions
                .get(&start)
                .is_some_and(|region| region.collapsed);
            regions.insert(
                start,
                FoldRegion {
                    start_line: start,
                    end_line: end,
                    placeholder: self.placeholder.clone(),
                    collapsed,
                },
            );
        }
        self.regions = regions;
    }

    /// Follow a buffer change: regions the change touched are dropped,
    /// regions after it shift by the line delta, then everything is
    /// rescanned.
    pub fn apply_change(&mut self, buffer: &TextBuffer, change: &Change) {
        self.apply_changes(buffer, std::slice::from_ref(change));
    }

    /// Follow several changes already applied to `buffer`, in application
    /// order. Each change's line numbers are relative to the buffer as it
    /// was when that change happened, so regions are remapped through all
    /// of them before the single rescan.
    pub fn apply_changes(&mut self, buffer: &TextBuffer, changes: &[Change]) {
        let before = self.regions.len();
        for change in changes {
            self.remap(change);
        }
        tracing::debug!(
            dropped = before - self.regions.len(),
            changes = changes.len(),
            "fold regions invalidated"
        );
        self.rescan(buffer);
    }

    fn remap(&mut self, change: &Change) {
        let first = change.start_line;
        let last = change.old_end_line();
        let delta = change.line_delta();

        let regions = std::mem::take(&mut self.regions);
        for (start, mut region) in regions {
            if region.end_line < first {
                self.regions.insert(start, region);
            } else if region.start_line > last {
                let shifted = start.saturating_add_signed(delta);
                region.start_line = shifted;
                region.end_line = region.end_line.saturating_add_signed(delta);
                self.regions.insert(shifted, region);
            }
        }
    }

    pub fn region(&self, start_line: usize) -> Option<&FoldRegion> {
        self.regions.get(&start_line)
    }

    pub fn regions(&self) -> impl Iterator<Item = &FoldRegion> {
        self.regions.values()
    }

    /// Flip the region starting at `line`. Returns the new collapsed state,
    /// or `None` when no region starts there.
    pub fn toggle(&mut self, line: usize) -> Option<bool> {
        let region = self.regions.get_mut(&line)?;
        region.collapsed = !region.collapsed;
        Some(region.collapsed)
    }

    /// Collapse every expanded region in document order. Returns the start
    /// lines that changed.
    pub fn fold_all(&mut self) -> Vec<usize> {
        let _scope = perf::scope("folding.fold_all");
        self.set_all(true)
    }

    /// Expand every collapsed region in document order.
    pub fn unfold_all(&mut self) -> Vec<usize> {
        self.set_all(false)
    }

    pub fn is_line_visible(&self, line: usize) -> bool {
        !self
            .regions
            .range(..line)
            .any(|(_, region)| region.collapsed && region.hides(line))
    }

    /// Indices of the visible lines out of `line_count`.
    pub fn visible_lines(&self, line_count: usize) -> Vec<usize> {
        (0..line_count)
            .filter(|&line| self.is_line_visible(line))
            .collect()
    }

    /// Expand every collapsed region hiding `line`. Returns the start lines
    /// that were expanded.
    pub fn reveal_line(&mut self, line: usize) -> Vec<usize> {
        let mut expanded = Vec::new();
        for (start, region) in self.regions.range_mut(..line) {
            if region.collapsed && region.hides(line) {
                region.collapsed = false;
                expanded.push(*start);
            }
        }
        expanded
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    fn set_all(&mut self, collapsed: bool) -> Vec<usize> {
        let mut toggled = Vec::new();
        for (start, region) in &mut self.regions {
            if region.collapsed != collapsed {
                region.collapsed = collapsed;
                toggled.push(*start);
            }
        }
        toggled
    }
}

impl Default for FoldingEngine {
    fn default() -> Self {
        Self::new(4, DEFAULT_PLACEHOLDER)
    }
}
