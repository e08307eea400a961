use crate::{PLACEHOLDER, separated_by};

/// Dialect printer for the statements generated by the mapper.
///
/// Every method appends to `out`. The defaults print MySQL flavored SQL with
/// backtick quoted identifiers, a driver overrides what its dialect spells differently.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers (`name`) doubling inner backticks.
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(out, value, '`', "``");
        out.push('`');
    }

    /// Table names are written as given, they may already be qualified or quoted.
    fn write_table_name(&self, out: &mut String, value: &str) {
        out.push_str(value);
    }

    /// `(?,?,?)` with `count` placeholders.
    fn write_placeholders(&self, out: &mut String, count: usize) {
        out.push('(');
        separated_by(
            out,
            0..count,
            |out, _| {
                out.push_str(PLACEHOLDER);
            },
            ",",
        );
        out.push(')');
    }

    /// `INSERT INTO table (`a`,`b`) VALUES (?,?),(?,?)` for `rows` rows.
    fn write_insert(&self, out: &mut String, table: &str, columns: &[&str], rows: usize) {
        out.reserve(32 + columns.len() * (16 + rows * 2));
        out.push_str("INSERT INTO ");
        self.write_table_name(out, table);
        if columns.is_empty() {
            out.push_str(" DEFAULT VALUES");
            return;
        }
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, v| {
                self.write_identifier_quoted(out, v);
            },
            ",",
        );
        out.push_str(") VALUES ");
        separated_by(
            out,
            0..rows.max(1),
            |out, _| {
                self.write_placeholders(out, columns.len());
            },
            ",",
        );
    }

    /// `UPDATE table SET `a`=?,`b`=? WHERE `id`=? AND `version`=?`.
    fn write_update(&self, out: &mut String, table: &str, set: &[&str], filter: &[&str]) {
        out.reserve(32 + (set.len() + filter.len()) * 16);
        out.push_str("UPDATE ");
        self.write_table_name(out, table);
        if !set.is_empty() {
            out.push_str(" SET ");
            separated_by(
                out,
                set,
                |out, v| {
                    self.write_identifier_quoted(out, v);
                    out.push('=');
                    out.push_str(PLACEHOLDER);
                },
                ",",
            );
        }
        if !filter.is_empty() {
            out.push_str(" WHERE ");
            separated_by(
                out,
                filter,
                |out, v| {
                    self.write_identifier_quoted(out, v);
                    out.push('=');
                    out.push_str(PLACEHOLDER);
                },
                " AND ",
            );
        }
    }
}

/// Fallback generic SQL writer.
pub struct GenericSqlWriter {}

impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Default for GenericSqlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
