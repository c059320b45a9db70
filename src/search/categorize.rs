//! Grouping of raw lookup results and the flat index the cursor moves over.

use ratatui::style::Color;

use crate::model::types::{Category, RawResults, ResultItem};
use crate::ui::components::theme::category_accent;

/// Items of one category in backend order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub category: Category,
    pub items: Vec<ResultItem>,
    /// Global index of the first item in this group.
    pub start: usize,
}

impl CategoryGroup {
    pub fn label(&self) -> &'static str {
        self.category.label()
    }

    pub fn icon(&self) -> &'static str {
        self.category.icon()
    }

    pub fn accent(&self) -> Color {
        category_accent(self.category)
    }

    /// Global indices covered by this group.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.items.len()
    }
}

/// One row of the flat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatEntry {
    pub global_index: usize,
    pub group: usize,
    pub item: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedResults {
    pub groups: Vec<CategoryGroup>,
    pub flat: Vec<FlatEntry>,
}

impl CategorizedResults {
    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    pub fn get(&self, global_index: usize) -> Option<(&ResultItem, &CategoryGroup)> {
        let entry = self.flat.get(global_index)?;
        let group = self.groups.get(entry.group)?;
        let item = group.items.get(entry.item)?;
        Some((item, group))
    }

    pub fn item(&self, global_index: usize) -> Option<&ResultItem> {
        self.get(global_index).map(|(item, _)| item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ResultItem, &CategoryGroup)> {
        self.flat.iter().filter_map(|entry| {
            let group = self.groups.get(entry.group)?;
            let item = group.items.get(entry.item)?;
            Some((entry.global_index, item, group))
        })
    }
}

/// Partition `raw` into groups following [`Category::PRIORITY`].
pub fn categorize(raw: &RawResults) -> CategorizedResults {
    let mut out = CategorizedResults::default();
    for category in Category::PRIORITY {
        let bucket = raw.bucket(category);
        if bucket.is_empty() {
            continue;
        }
        let group_idx = out.groups.len();
        let start = out.flat.len();
        for item_idx in 0..bucket.len() {
            out.flat.push(FlatEntry {
                global_index: start + item_idx,
                group: group_idx,
                item: item_idx,
            });
        }
        out.groups.push(CategoryGroup {
            category,
            items: bucket.to_vec(),
            start,
        });
    }
    out
}
