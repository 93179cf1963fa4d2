//! Aggregation of raw hits into line items.
//!
//! Two groupings are supported:
//!
//! - [`aggregate`] groups by `(sheet, name)` into flat [`LineItem`]s.
//! - [`aggregate_table`] groups by `(sheet, row)` into wide [`TableRow`]s,
//!   one named slot per rule column.
//!
//! Quantity rule for both: if any contributing hit is limited the quantity
//! is exactly 1, otherwise it is the sum of the hit quantities. Groups whose
//! quantity ends up 0 are dropped.

use std::collections::HashMap;

use crate::model::{LineItem, RawHit, TableRow, TableSlot};
use crate::types::SourceRef;

/// Maximum number of named slots kept per table row.
pub const MAX_TABLE_SLOTS: usize = 15;

/// Running quantity of a group of hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    sum: u32,
    limited: bool,
}

impl Tally {
    fn add(&mut self, hit: &RawHit) {
        self.sum = self.sum.saturating_add(hit.quantity);
        self.limited |= hit.is_limited;
    }

    fn quantity(&self) -> u32 {
        if self.limited {
            1
        } else {
            self.sum
        }
    }
}

/// Group hits by `(sheet, name)`. Output keeps first-seen order.
pub fn aggregate(hits: &[RawHit]) -> Vec<LineItem> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<(&RawHit, Tally)> = Vec::new();

    for hit in hits {
        let key = (hit.source.sheet.as_str(), hit.name.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((hit, Tally::default()));
            groups.len() - 1
        });
        groups[slot].1.add(hit);
    }

    groups
        .into_iter()
        .filter(|(_, tally)| tally.quantity() > 0)
        .map(|(first, tally)| LineItem {
            sheet: first.source.sheet.clone(),
            name: first.name.clone(),
            quantity: tally.quantity(),
            first_row: first.source.row,
            context: first.context.clone(),
            shape: first.shape.clone(),
        })
        .collect()
}

/// Group hits by `(sheet, row)` into wide rows. Output keeps first-seen order.
///
/// Each distinct `column_tag` becomes one slot; the first hit on a slot
/// supplies its value. Tags beyond [`MAX_TABLE_SLOTS`] are dropped.
pub fn aggregate_table(hits: &[RawHit]) -> Vec<TableRow> {
    struct PendingRow<'a> {
        source: &'a SourceRef,
        context: &'a str,
        slots: Vec<(&'a RawHit, Tally)>,
    }

    let mut index: HashMap<&SourceRef, usize> = HashMap::new();
    let mut rows: Vec<PendingRow<'_>> = Vec::new();

    for hit in hits {
        let row_slot = *index.entry(&hit.source).or_insert_with(|| {
            rows.push(PendingRow {
                source: &hit.source,
                context: &hit.context,
                slots: Vec::new(),
            });
            rows.len() - 1
        });
        let row = &mut rows[row_slot];
        match row
            .slots
            .iter()
            .position(|(first, _)| first.column_tag == hit.column_tag)
        {
            Some(pos) => row.slots[pos].1.add(hit),
            None if row.slots.len() < MAX_TABLE_SLOTS => {
                let mut tally = Tally::default();
                tally.add(hit);
                row.slots.push((hit, tally));
            }
            None => {}
        }
    }

    rows.into_iter()
        .filter_map(|row| {
            let slots: Vec<TableSlot> = row
                .slots
                .into_iter()
                .filter(|(_, tally)| tally.quantity() > 0)
                .map(|(first, tally)| TableSlot {
                    tag: first.column_tag.clone(),
                    value: first.name.clone(),
                    quantity: tally.quantity(),
                })
                .collect();
            (!slots.is_empty()).then(|| TableRow {
                source: row.source.clone(),
                context: row.context.to_string(),
                slots,
            })
        })
        .collect()
}
