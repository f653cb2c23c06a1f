use crate::{FieldPath, Rule, ValueKind};

/// Field name of the synthetic checkbox column.
pub const SELECT_FIELD: &str = "__select__";

pub const DEFAULT_COLUMN_WIDTH: u32 = 140;
/// Lower bound applied to every data column's minimum width.
pub const MIN_COLUMN_WIDTH: u32 = 60;
pub const SELECT_COLUMN_WIDTH: u32 = 40;
pub const SELECT_COLUMN_MIN_WIDTH: u32 = 36;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Describes one grid column.
///
/// Built with [`Column::new`] and the `with_*` setters.
#[derive(Clone, Debug)]
pub struct Column {
    field: String,
    path: FieldPath,
    title: String,
    width: u32,
    min_width: u32,
    kind: ValueKind,
    align: Align,
    sortable: bool,
    editable: bool,
    resizable: bool,
    hidden: bool,
    selection: bool,
    rules: Vec<Rule>,
}

impl Column {
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            path: FieldPath::parse(&field),
            title: field.clone(),
            field,
            width: DEFAULT_COLUMN_WIDTH,
            min_width: MIN_COLUMN_WIDTH,
            kind: ValueKind::Text,
            align: Align::Left,
            sortable: true,
            editable: false,
            resizable: true,
            hidden: false,
            selection: false,
            rules: Vec::new(),
        }
    }

    /// The reserved checkbox column. It carries no field value.
    pub fn selection() -> Self {
        Self {
            title: String::new(),
            width: SELECT_COLUMN_WIDTH,
            min_width: SELECT_COLUMN_MIN_WIDTH,
            kind: ValueKind::Boolean,
            align: Align::Center,
            sortable: false,
            resizable: false,
            selection: true,
            ..Self::new(SELECT_FIELD)
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Sets the minimum width; data columns never go below [`MIN_COLUMN_WIDTH`].
    pub fn with_min_width(mut self, min_width: u32) -> Self {
        self.min_width = min_width.max(MIN_COLUMN_WIDTH);
        self
    }

    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn min_width(&self) -> u32 {
        self.min_width
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn align(&self) -> Align {
        self.align
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable && !self.selection
    }

    pub fn is_editable(&self) -> bool {
        self.editable && !self.selection
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable && !self.selection
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_selection(&self) -> bool {
        self.selection
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Ordered column set; order is display order.
#[derive(Clone, Debug, Default)]
pub struct Columns {
    columns: Vec<Column>,
}

impl Columns {
    /// Builds the column set, prepending the checkbox column when `checkbox` is set.
    ///
    /// Caller-supplied columns named [`SELECT_FIELD`] are dropped.
    pub fn new(columns: impl IntoIterator<Item = Column>, checkbox: bool) -> Self {
        let mut out = Vec::new();
        if checkbox {
            out.push(Column::selection());
        }
        out.extend(columns.into_iter().filter(|c| c.field != SELECT_FIELD));
        Self { columns: out }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.hidden)
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    /// Visible data columns: the fields the search filter looks at.
    pub fn searchable(&self) -> impl Iterator<Item = &Column> {
        self.visible().filter(|c| !c.selection)
    }

    pub fn has_selection_column(&self) -> bool {
        self.columns.iter().any(|c| c.selection)
    }

    pub fn get(&self, field: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.field == field)
    }

    fn get_mut(&mut self, field: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.field == field)
    }

    /// Position of `field` among visible columns.
    pub fn visible_index(&self, field: &str) -> Option<usize> {
        self.visible().position(|c| c.field == field)
    }

    /// Horizontal pixel offset of `field` within a row (sum of preceding visible widths).
    pub fn visible_offset(&self, field: &str) -> Option<u32> {
        let mut left = 0u32;
        for c in self.visible() {
            if c.field == field {
                return Some(left);
            }
            left = left.saturating_add(c.width);
        }
        None
    }

    /// Total width of all visible columns.
    pub fn total_width(&self) -> u32 {
        self.visible().fold(0u32, |acc, c| acc.saturating_add(c.width))
    }

    /// Sets a column width, clamped to its minimum. Returns whether anything changed.
    pub fn resize(&mut self, field: &str, width: u32) -> bool {
        let Some(col) = self.get_mut(field) else {
            return false;
        };
        if !col.is_resizable() {
            return false;
        }
        let width = width.max(col.min_width);
        if col.width == width {
            return false;
        }
        col.width = width;
        true
    }

    /// Spreads `container_width` evenly over visible data columns.
    ///
    /// The checkbox column keeps its fixed width; each data column gets at
    /// least [`MIN_COLUMN_WIDTH`].
    pub fn fit_to_width(&mut self, container_width: u32) -> bool {
        let fixed: u32 = self
            .visible()
            .filter(|c| c.selection)
            .map(|c| c.width)
            .sum();
        let free = self.searchable().count() as u32;
        if free == 0 {
            return false;
        }
        let each = (container_width.saturating_sub(fixed) / free).max(MIN_COLUMN_WIDTH);

        let mut changed = false;
        for col in self
            .columns
            .iter_mut()
            .filter(|c| !c.hidden && !c.selection)
        {
            if col.width != each {
                col.width = each;
                changed = true;
            }
        }
        changed
    }

    /// Shows or hides a column. Returns whether visibility changed.
    pub fn set_hidden(&mut self, field: &str, hidden: bool) -> bool {
        let Some(col) = self.get_mut(field) else {
            return false;
        };
        if col.hidden == hidden {
            return false;
        }
        col.hidden = hidden;
        true
    }
}
