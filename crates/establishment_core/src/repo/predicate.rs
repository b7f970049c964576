//! Filter predicates shared by page queries and their counts.
//!
//! # Responsibility
//! - Build the FROM/WHERE part of every list-family query once.
//! - Render both the page `SELECT` and its `COUNT(*)` from that one value.
//!
//! # Invariants
//! - Every predicate filters entity rows on `deleted_at IS NULL`.
//! - A count rendered from a predicate uses exactly the page's FROM, WHERE
//!   and binds; only ORDER BY and LIMIT/OFFSET differ.

use crate::model::category::Category;
use crate::model::location::LocationFilter;
use crate::repo::schema::{category_value, text_value, EntityTable, LOCATION_TABLE};
use rusqlite::types::Value;

/// Offset/limit window. `limit == 0` means "no window": every matching row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Every row, no LIMIT/OFFSET clause.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.limit == 0
    }
}

/// Which predicate a list's `total` is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountScope {
    /// Every active row of the kind, whatever the page filter.
    AllActive,
    /// The exact predicate of the page query.
    SameAsPage,
}

/// FROM/WHERE fragment plus its positional binds. Entity rows are aliased
/// `e`; location rows inside a filter subquery are aliased `l`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    from: String,
    conditions: Vec<String>,
    binds: Vec<Value>,
}

impl Predicate {
    /// Active rows of one entity table.
    pub fn active(table: EntityTable) -> Self {
        Self {
            from: format!("FROM {} e", table.table),
            conditions: vec!["e.deleted_at IS NULL".to_string()],
            binds: Vec::new(),
        }
    }

    /// Active entities with at least one active location of `category` that
    /// contains each filter field as a case-sensitive substring. Each entity
    /// matches once, however many such locations it has.
    pub fn by_location(table: EntityTable, category: Category, filter: &LocationFilter) -> Self {
        let mut predicate = Self::active(table);
        // `instr` matches literally and is case-sensitive; an empty needle matches.
        predicate.conditions.push(format!(
            "EXISTS (SELECT 1 FROM {LOCATION_TABLE} l
                     WHERE l.establishment_id = e.{}
                       AND l.category = ?
                       AND l.deleted_at IS NULL
                       AND instr(l.country, ?) > 0
                       AND instr(l.city, ?) > 0
                       AND instr(l.state_province, ?) > 0)",
            table.id_column
        ));
        predicate.binds.extend([
            category_value(category),
            text_value(&filter.country),
            text_value(&filter.city),
            text_value(&filter.state_province),
        ]);
        predicate
    }

    /// Active entities whose name contains `name`, ignoring ASCII case.
    pub fn by_name(table: EntityTable, name: &str) -> Self {
        let mut predicate = Self::active(table);
        predicate.push(
            &format!("instr(lower(e.{}), lower(?)) > 0", table.name_column),
            text_value(name),
        );
        predicate
    }

    fn push(&mut self, condition: &str, bind: Value) {
        self.conditions.push(condition.to_string());
        self.binds.push(bind);
    }

    fn where_clause(&self) -> String {
        format!("WHERE {}", self.conditions.join(" AND "))
    }

    /// `SELECT <columns> ... ORDER BY <order_by> [LIMIT ? OFFSET ?]`.
    pub fn select_sql(&self, columns: &str, order_by: &str, page: Page) -> (String, Vec<Value>) {
        let mut sql = format!(
            "SELECT {columns} {} {} ORDER BY {order_by}",
            self.from,
            self.where_clause()
        );
        let mut binds = self.binds.clone();

        if !page.is_unbounded() {
            sql.push_str(" LIMIT ? OFFSET ?");
            binds.push(Value::Integer(saturating_i64(page.limit)));
            binds.push(Value::Integer(saturating_i64(page.offset)));
        }

        (sql, binds)
    }

    /// `SELECT COUNT(*)` over the same FROM/WHERE/binds.
    pub fn count_sql(&self) -> (String, Vec<Value>) {
        (
            format!("SELECT COUNT(*) {} {}", self.from, self.where_clause()),
            self.binds.clone(),
        )
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
