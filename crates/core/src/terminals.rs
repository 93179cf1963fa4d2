//! Terminal numbering for the schematic terminal table.
//!
//! Prioritized items are flattened into a single queue, stable-sorted by
//! priority, and walked once. The walk hands out consecutive terminal
//! numbers, inserts a GND reference row at the start of every sensor run,
//! closes sensor runs after two or three members, and appends the bus
//! supply rows when the queue mentions a bus device.
//!
//! The marker literals (sensor letters, two-terminal keywords, footer
//! triggers) are business rules and live in [`TerminalMarkers`], which can
//! be overridden from configuration.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{PrioritizedItem, TableRow};
use crate::types::SourceRef;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Alternative name/priority column pairs per input row.
pub const MAX_ORDER_SLOTS: usize = 4;

/// Sort key of a priority that does not parse.
pub const UNPARSED_PRIORITY: i64 = 999_999;

pub const DEFAULT_START_TERMINAL: u32 = 3;
/// Highest accepted `start_terminal`.
pub const MAX_START_TERMINAL: u32 = 1_000_000;
/// Highest accepted width of a footer row.
pub const MAX_FOOTER_TERMINALS: u32 = 16;
/// Any capital `B` marks a sensor, so names like "Boiler" classify as
/// sensors too. Override the marker where such names occur.
pub const DEFAULT_SENSOR_LETTER: char = 'B';
pub const DEFAULT_SENSOR_PAIR: &str = "TT";
pub const DEFAULT_TWO_TERMINAL_KEYWORDS: &[&str] = &["230v", "power", "output", "valve", "pump"];
pub const DEFAULT_FOOTER_TRIGGERS: &[&str] = &["rs485", "modbus"];
pub const DEFAULT_RENAME_KEYWORD: &str = "model";
pub const DEFAULT_SEPARATOR_NAME: &str = "GND reference";

/// A sensor run closes once it has this many members...
const GROUP_PAIR: u32 = 2;
/// ...unless exactly one more sensor follows, which joins it; never more.
const GROUP_MAX: u32 = 3;

static STANDALONE_ONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b1\b").expect("valid regex"));

// ---------------------------------------------------------------------------
// Marker configuration
// ---------------------------------------------------------------------------

/// A fixed row appended after the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterRow {
    pub name: String,
    pub terminals: u32,
}

impl FooterRow {
    fn new(name: &str, terminals: u32) -> Self {
        Self {
            name: name.to_string(),
            terminals,
        }
    }
}

/// Overridable business literals of the terminal walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalMarkers {
    /// A name containing this letter (not followed by `/`) is a sensor.
    pub sensor_letter: char,
    /// A name containing this pair is a sensor.
    pub sensor_pair: String,
    /// Case-insensitive keywords of rows that take two terminals.
    pub two_terminal_keywords: Vec<String>,
    /// Case-insensitive keywords that switch the footer rows on.
    pub footer_triggers: Vec<String>,
    /// Keyword introducing the model qualifier in a row's context.
    pub rename_keyword: String,
    pub start_terminal: u32,
    pub separator_name: String,
    pub footer_rows: Vec<FooterRow>,
}

impl Default for TerminalMarkers {
    fn default() -> Self {
        Self {
            sensor_letter: DEFAULT_SENSOR_LETTER,
            sensor_pair: DEFAULT_SENSOR_PAIR.to_string(),
            two_terminal_keywords: DEFAULT_TWO_TERMINAL_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            footer_triggers: DEFAULT_FOOTER_TRIGGERS.iter().map(|s| s.to_string()).collect(),
            rename_keyword: DEFAULT_RENAME_KEYWORD.to_string(),
            start_terminal: DEFAULT_START_TERMINAL,
            separator_name: DEFAULT_SEPARATOR_NAME.to_string(),
            footer_rows: vec![
                FooterRow::new("-12V (GND)", 1),
                FooterRow::new("+12V", 1),
                FooterRow::new("RS485 bus", 2),
            ],
        }
    }
}

impl TerminalMarkers {
    /// Reject numbering settings the walk cannot count with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.start_terminal > MAX_START_TERMINAL {
            return Err(CoreError::Validation(format!(
                "start_terminal must be at most {MAX_START_TERMINAL}, got {}",
                self.start_terminal
            )));
        }
        for footer in &self.footer_rows {
            if footer.terminals == 0 || footer.terminals > MAX_FOOTER_TERMINALS {
                return Err(CoreError::Validation(format!(
                    "footer row '{}' must take 1 to {MAX_FOOTER_TERMINALS} terminals, got {}",
                    footer.name, footer.terminals
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Input and output rows
// ---------------------------------------------------------------------------

/// One name with its (unparsed) priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSlot {
    pub name: String,
    pub priority: String,
}

/// Tags of one name/priority column pair in a [`TableRow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPair {
    pub name_tag: String,
    pub priority_tag: String,
}

/// One source row with up to [`MAX_ORDER_SLOTS`] alternative names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInputRow {
    pub source: SourceRef,
    pub context: String,
    pub slots: Vec<OrderSlot>,
}

impl OrderInputRow {
    pub fn from_item(item: &PrioritizedItem) -> Self {
        Self {
            source: item.item.source(),
            context: item.item.context.clone(),
            slots: vec![OrderSlot {
                name: item.item.name.clone(),
                priority: item.priority.to_string(),
            }],
        }
    }

    /// Pick the configured name/priority pairs out of a wide table row.
    /// Pairs whose name slot is missing are skipped.
    pub fn from_table_row(row: &TableRow, pairs: &[SlotPair]) -> Self {
        let slots = pairs
            .iter()
            .take(MAX_ORDER_SLOTS)
            .filter_map(|pair| {
                let name = row.slot(&pair.name_tag)?;
                Some(OrderSlot {
                    name: name.to_string(),
                    priority: row.slot(&pair.priority_tag).unwrap_or_default().to_string(),
                })
            })
            .collect();
        Self {
            source: row.source.clone(),
            context: row.context.clone(),
            slots,
        }
    }
}

/// A flattened queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    pub name: String,
    pub priority_text: String,
    pub priority: i64,
    pub source: SourceRef,
    pub context: String,
}

/// Terminal numbers taken by one row: `first` and the `count - 1` after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalLabel {
    pub first: u32,
    pub count: u32,
}

impl std::fmt::Display for TerminalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let numbers: Vec<String> = (self.first..self.first.saturating_add(self.count))
            .map(|n| n.to_string())
            .collect();
        f.write_str(&numbers.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Item,
    Separator,
    Footer,
}

/// One emitted row of the terminal table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedRow {
    /// 1-based emission index.
    pub index: usize,
    pub terminals: TerminalLabel,
    pub name: String,
    pub source: Option<SourceRef>,
    /// Priority text as found in the source.
    pub priority: String,
    pub kind: RowKind,
}

impl OrderedRow {
    pub fn terminal_label(&self) -> String {
        self.terminals.to_string()
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Build the model-qualifier pattern for `keyword`.
///
/// Matches `"<keyword> 1 <qualifier> (...)"` and captures `<qualifier>`.
pub fn rename_pattern(keyword: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?i)\b{}\s+1\s+([^()]+?)\s*\([^)]*\)",
        regex::escape(keyword.trim())
    ))
}

/// Replace the standalone token `1` in `name` with the model qualifier found
/// in `context`. Names are returned unchanged when the context has none.
pub fn rewrite_name(name: &str, context: &str, pattern: &Regex) -> String {
    let Some(qualifier) = pattern
        .captures(context)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|q| !q.is_empty())
    else {
        return name.to_string();
    };
    STANDALONE_ONE
        .replace_all(name, regex::NoExpand(qualifier))
        .into_owned()
}

/// Parse a priority cell; anything unparsable sorts last.
pub fn parse_priority(text: &str) -> i64 {
    text.trim().parse().unwrap_or(UNPARSED_PRIORITY)
}

/// Flatten input rows into a queue and stable-sort it by priority.
pub fn flatten_and_sort(rows: &[OrderInputRow]) -> Vec<OrderEntry> {
    let mut queue: Vec<OrderEntry> = rows
        .iter()
        .flat_map(|row| {
            row.slots
                .iter()
                .take(MAX_ORDER_SLOTS)
                .filter(|slot| !slot.name.trim().is_empty())
                .map(move |slot| OrderEntry {
                    name: slot.name.trim().to_string(),
                    priority_text: slot.priority.trim().to_string(),
                    priority: parse_priority(&slot.priority),
                    source: row.source.clone(),
                    context: row.context.clone(),
                })
        })
        .collect();
    queue.sort_by_key(|e| e.priority);
    queue
}

// ---------------------------------------------------------------------------
// Terminal assigner
// ---------------------------------------------------------------------------

/// The terminal-numbering state machine, configured with its markers.
#[derive(Debug, Clone)]
pub struct TerminalAssigner {
    markers: TerminalMarkers,
    rename: Regex,
    two_terminal: Vec<String>,
    footer_triggers: Vec<String>,
}

impl TerminalAssigner {
    pub fn new(markers: TerminalMarkers) -> Result<Self, CoreError> {
        markers.validate()?;
        let rename = rename_pattern(&markers.rename_keyword)
            .map_err(|e| CoreError::Validation(format!("Invalid rename keyword: {e}")))?;
        let lower = |v: &[String]| -> Vec<String> {
            v.iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        Ok(Self {
            two_terminal: lower(&markers.two_terminal_keywords),
            footer_triggers: lower(&markers.footer_triggers),
            markers,
            rename,
        })
    }

    pub fn markers(&self) -> &TerminalMarkers {
        &self.markers
    }

    /// Whether `name` is a sensor row.
    pub fn is_sensor(&self, name: &str) -> bool {
        let letter = self.markers.sensor_letter;
        let mut chars = name.chars().peekable();
        while let Some(c) = chars.next() {
            if c == letter && chars.peek() != Some(&'/') {
                return true;
            }
        }
        !self.markers.sensor_pair.is_empty() && name.contains(self.markers.sensor_pair.as_str())
    }

    /// Number of terminals `name` consumes.
    pub fn terminal_width(&self, name: &str) -> u32 {
        let lower = name.to_lowercase();
        if self.two_terminal.iter().any(|k| lower.contains(k.as_str())) {
            2
        } else {
            1
        }
    }

    pub fn rewrite(&self, name: &str, context: &str) -> String {
        rewrite_name(name, context, &self.rename)
    }

    fn wants_footer(&self, queue: &[OrderEntry]) -> bool {
        queue.iter().any(|e| {
            let lower = e.name.to_lowercase();
            self.footer_triggers.iter().any(|t| lower.contains(t.as_str()))
        })
    }

    /// Order prioritized line items (one slot per item).
    pub fn order_items(&self, items: &[PrioritizedItem]) -> Vec<OrderedRow> {
        let rows: Vec<OrderInputRow> = items.iter().map(OrderInputRow::from_item).collect();
        self.order(&rows)
    }

    /// Flatten, sort and number `rows`.
    pub fn order(&self, rows: &[OrderInputRow]) -> Vec<OrderedRow> {
        self.assign(&flatten_and_sort(rows))
    }

    /// Walk an already sorted queue and emit the numbered rows.
    pub fn assign(&self, queue: &[OrderEntry]) -> Vec<OrderedRow> {
        let names: Vec<String> = queue
            .iter()
            .map(|e| self.rewrite(&e.name, &e.context))
            .collect();
        let sensors: Vec<bool> = names.iter().map(|n| self.is_sensor(n)).collect();

        let mut walk = Walk::new(self.markers.start_terminal);
        for (i, entry) in queue.iter().enumerate() {
            let name = &names[i];
            if !sensors[i] {
                walk.emit(
                    name.clone(),
                    self.terminal_width(name),
                    Some(entry.source.clone()),
                    entry.priority_text.clone(),
                    RowKind::Item,
                );
                continue;
            }

            if walk.sensors_in_group == 0 {
                walk.emit(
                    self.markers.separator_name.clone(),
                    1,
                    None,
                    String::new(),
                    RowKind::Separator,
                );
            }
            walk.emit(
                name.clone(),
                self.terminal_width(name),
                Some(entry.source.clone()),
                entry.priority_text.clone(),
                RowKind::Item,
            );
            walk.sensors_in_group += 1;

            let lookahead = sensors[i + 1..].iter().take_while(|s| **s).count();
            if (walk.sensors_in_group == GROUP_PAIR && lookahead != 1)
                || walk.sensors_in_group >= GROUP_MAX
            {
                walk.sensors_in_group = 0;
            }
        }

        if self.wants_footer(queue) {
            for footer in &self.markers.footer_rows {
                walk.emit(
                    footer.name.clone(),
                    footer.terminals,
                    None,
                    String::new(),
                    RowKind::Footer,
                );
            }
        }
        walk.rows
    }
}

/// Running state of one walk.
struct Walk {
    terminal: u32,
    sensors_in_group: u32,
    rows: Vec<OrderedRow>,
}

impl Walk {
    fn new(start_terminal: u32) -> Self {
        Self {
            terminal: start_terminal,
            sensors_in_group: 0,
            rows: Vec::new(),
        }
    }

    fn emit(
        &mut self,
        name: String,
        width: u32,
        source: Option<SourceRef>,
        priority: String,
        kind: RowKind,
    ) {
        self.rows.push(OrderedRow {
            index: self.rows.len() + 1,
            terminals: TerminalLabel {
                first: self.terminal,
                count: width,
            },
            name,
            source,
            priority,
            kind,
        });
        self.terminal = self.terminal.saturating_add(width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assigner() -> TerminalAssigner {
        TerminalAssigner::new(TerminalMarkers::default()).unwrap()
    }

    fn entry(name: &str) -> OrderEntry {
        OrderEntry {
            name: name.to_string(),
            priority_text: "1".to_string(),
            priority: 1,
            source: SourceRef::new("S", 1),
            context: String::new(),
        }
    }

    fn queue(names: &[&str]) -> Vec<OrderEntry> {
        names.iter().map(|n| entry(n)).collect()
    }

    fn summary(rows: &[OrderedRow]) -> Vec<(String, String)> {
        rows.iter()
            .map(|r| (r.terminal_label(), r.name.clone()))
            .collect()
    }

    fn row(name: &str, priority: &str, row: u32) -> OrderInputRow {
        OrderInputRow {
            source: SourceRef::new("S", row),
            context: String::new(),
            slots: vec![OrderSlot {
                name: name.to_string(),
                priority: priority.to_string(),
            }],
        }
    }

    #[test]
    fn sensor_classification() {
        let a = assigner();
        assert!(a.is_sensor("Outdoor B1"));
        assert!(a.is_sensor("Flow TT2"));
        assert!(!a.is_sensor("B/W panel"));
        assert!(a.is_sensor("B/W panel B2"));
        assert!(!a.is_sensor("Lamp"));
    }

    #[test]
    fn default_letter_marks_any_capital_b() {
        let a = assigner();
        assert!(a.is_sensor("Boiler"));
        assert!(a.is_sensor("Buffer tank"));
        assert!(!a.is_sensor("boiler"));

        let strict = TerminalAssigner::new(TerminalMarkers {
            sensor_letter: 'Q',
            ..TerminalMarkers::default()
        })
        .unwrap();
        assert!(!strict.is_sensor("Boiler"));
        assert!(strict.is_sensor("Outdoor QAC31"));
    }

    #[test]
    fn terminal_width_keywords() {
        let a = assigner();
        assert_eq!(a.terminal_width("Heating PUMP"), 2);
        assert_eq!(a.terminal_width("Zone valve"), 2);
        assert_eq!(a.terminal_width("Lamp"), 1);
    }

    #[test]
    fn terminal_label_formats() {
        assert_eq!(TerminalLabel { first: 7, count: 1 }.to_string(), "7");
        assert_eq!(TerminalLabel { first: 7, count: 2 }.to_string(), "7, 8");
    }

    #[test]
    fn separator_before_sensor_run_and_pair_closes_before_non_sensor() {
        let rows = assigner().assign(&queue(&["Lamp L1", "Outdoor B1", "Flow TT2", "Lamp L2"]));
        assert_eq!(
            summary(&rows),
            vec![
                ("3".to_string(), "Lamp L1".to_string()),
                ("4".to_string(), "GND reference".to_string()),
                ("5".to_string(), "Outdoor B1".to_string()),
                ("6".to_string(), "Flow TT2".to_string()),
                ("7".to_string(), "Lamp L2".to_string()),
            ]
        );
        let separators = rows.iter().filter(|r| r.kind == RowKind::Separator).count();
        assert_eq!(separators, 1);
        assert_eq!(rows.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn non_sensor_inside_open_run_keeps_it_open() {
        let rows = assigner().assign(&queue(&["Outdoor B1", "Lamp", "Return B2"]));
        assert_eq!(
            summary(&rows),
            vec![
                ("3".to_string(), "GND reference".to_string()),
                ("4".to_string(), "Outdoor B1".to_string()),
                ("5".to_string(), "Lamp".to_string()),
                ("6".to_string(), "Return B2".to_string()),
            ]
        );
    }

    #[test]
    fn run_closed_at_two_needs_new_separator() {
        let rows = assigner().assign(&queue(&["B1", "B2", "Lamp", "B3"]));
        let separators = rows.iter().filter(|r| r.kind == RowKind::Separator).count();
        assert_eq!(separators, 2);
        assert_eq!(rows.last().map(|r| r.terminals.first), Some(8));
    }

    #[test]
    fn four_sensors_split_into_two_pairs() {
        let rows = assigner().assign(&queue(&["B1", "B2", "B3", "B4"]));
        let kinds: Vec<RowKind> = rows.iter().map(|r| r.kind).collect();
        use RowKind::*;
        assert_eq!(kinds, vec![Separator, Item, Item, Separator, Item, Item]);
    }

    #[test]
    fn three_sensors_stay_together() {
        let rows = assigner().assign(&queue(&["B1", "B2", "B3"]));
        let separators = rows.iter().filter(|r| r.kind == RowKind::Separator).count();
        assert_eq!(separators, 1);
    }

    #[test]
    fn five_sensors_split_two_then_three() {
        let rows = assigner().assign(&queue(&["B1", "B2", "B3", "B4", "B5"]));
        let kinds: Vec<RowKind> = rows.iter().map(|r| r.kind).collect();
        use RowKind::*;
        assert_eq!(
            kinds,
            vec![Separator, Item, Item, Separator, Item, Item, Item]
        );
    }

    #[test]
    fn two_terminal_rows_advance_by_two() {
        let rows = assigner().assign(&queue(&["Pump P1", "Lamp"]));
        assert_eq!(
            summary(&rows),
            vec![
                ("3, 4".to_string(), "Pump P1".to_string()),
                ("5".to_string(), "Lamp".to_string()),
            ]
        );
    }

    #[test]
    fn footer_rows_follow_bus_devices() {
        let rows = assigner().assign(&queue(&["Modbus gateway"]));
        assert_eq!(
            summary(&rows),
            vec![
                ("3".to_string(), "Modbus gateway".to_string()),
                ("4".to_string(), "-12V (GND)".to_string()),
                ("5".to_string(), "+12V".to_string()),
                ("6, 7".to_string(), "RS485 bus".to_string()),
            ]
        );
        assert!(rows[1..].iter().all(|r| r.kind == RowKind::Footer));
    }

    #[test]
    fn no_footer_without_trigger() {
        let rows = assigner().assign(&queue(&["Lamp"]));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn rewrite_replaces_standalone_one() {
        let pattern = rename_pattern("model").unwrap();
        assert_eq!(
            rewrite_name("Controller 1", "Heating controller model 1 RVS43 (230V)", &pattern),
            "Controller RVS43"
        );
        // Only whole tokens are replaced.
        assert_eq!(
            rewrite_name("P1 unit 1 x10", "model 1 AB (kW)", &pattern),
            "P1 unit AB x10"
        );
    }

    #[test]
    fn rewrite_without_qualifier_keeps_name() {
        let pattern = rename_pattern("model").unwrap();
        assert_eq!(rewrite_name("Controller 1", "no qualifier here", &pattern), "Controller 1");
        assert_eq!(rewrite_name("Controller 1", "model 2 X (y)", &pattern), "Controller 1");
    }

    #[test]
    fn walk_classifies_rewritten_names() {
        let mut e = entry("Sensor 1");
        e.context = "model 1 QAB21 (NTC)".to_string();
        let rows = assigner().assign(&[e]);
        assert_eq!(rows[0].name, "GND reference");
        assert_eq!(rows[1].name, "Sensor QAB21");
    }

    #[test]
    fn flatten_sorts_stably_and_unparsed_last() {
        let rows = vec![
            row("Late", "abc", 1),
            row("Second", "20", 2),
            row("First", "10", 3),
            row("AlsoSecond", "20", 4),
        ];
        let names: Vec<String> = flatten_and_sort(&rows).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["First", "Second", "AlsoSecond", "Late"]);
    }

    #[test]
    fn flatten_takes_up_to_four_slots_and_skips_blank_names() {
        let mut r = row("a", "1", 1);
        for (name, prio) in [("", "2"), ("c", "3"), ("d", "4"), ("e", "5")] {
            r.slots.push(OrderSlot {
                name: name.into(),
                priority: prio.into(),
            });
        }
        let names: Vec<String> = flatten_and_sort(&[r]).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a", "c", "d"]);
    }

    #[test]
    fn from_table_row_uses_slot_pairs() {
        use crate::model::TableSlot;
        let table_row = TableRow {
            source: SourceRef::new("S", 9),
            context: "ctx".into(),
            slots: vec![
                TableSlot { tag: "name_1".into(), value: "Boiler".into(), quantity: 1 },
                TableSlot { tag: "prio_1".into(), value: "15".into(), quantity: 1 },
                TableSlot { tag: "name_2".into(), value: "Pump".into(), quantity: 1 },
            ],
        };
        let pairs = vec![
            SlotPair { name_tag: "name_1".into(), priority_tag: "prio_1".into() },
            SlotPair { name_tag: "name_2".into(), priority_tag: "prio_2".into() },
            SlotPair { name_tag: "name_3".into(), priority_tag: "prio_3".into() },
        ];
        let input = OrderInputRow::from_table_row(&table_row, &pairs);
        assert_eq!(input.slots.len(), 2);
        assert_eq!(input.slots[0].priority, "15");
        assert_eq!(input.slots[1].priority, "");
        assert_eq!(input.context, "ctx");
    }

    #[test]
    fn oversized_start_terminal_is_rejected() {
        let markers = TerminalMarkers {
            start_terminal: u32::MAX,
            ..TerminalMarkers::default()
        };
        assert!(matches!(
            TerminalAssigner::new(markers),
            Err(CoreError::Validation(msg)) if msg.contains("start_terminal")
        ));
    }

    #[test]
    fn zero_width_footer_is_rejected() {
        let markers = TerminalMarkers {
            footer_rows: vec![FooterRow::new("Shield", 0)],
            ..TerminalMarkers::default()
        };
        assert!(matches!(markers.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn counter_saturates_instead_of_overflowing() {
        let mut walk = Walk::new(u32::MAX - 1);
        walk.emit("Pump".into(), 2, None, String::new(), RowKind::Item);
        walk.emit("Lamp".into(), 1, None, String::new(), RowKind::Item);
        assert_eq!(walk.rows[0].terminal_label(), format!("{}", u32::MAX - 1));
        assert_eq!(walk.terminal, u32::MAX);
    }

    #[test]
    fn custom_markers_are_honoured() {
        let markers = TerminalMarkers {
            sensor_letter: 'S',
            sensor_pair: String::new(),
            start_terminal: 10,
            footer_rows: vec![],
            ..TerminalMarkers::default()
        };
        let rows = TerminalAssigner::new(markers)
            .unwrap()
            .assign(&queue(&["Sensor", "RS485 meter"]));
        assert_eq!(rows[0].kind, RowKind::Separator);
        assert_eq!(rows[0].terminals.first, 10);
        assert_eq!(rows.len(), 3);
    }
}
