use std::fmt::Write;

use crate::mapping::table::{Column, StorageSchema, Table};

impl StorageSchema {
    /// Renders one `CREATE TABLE` statement per table, in declaration order.
    pub fn to_ddl(&self) -> String {
        let statements: Vec<String> = self.tables().map(render_table).collect();
        statements.join("\n")
    }
}

fn render_table(table: &Table) -> String {
    let columns: Vec<String> = table.columns.iter().map(render_column).collect();

    let mut out = String::new();
    let _ = writeln!(out, "CREATE TABLE {} (", table.name);
    let _ = writeln!(out, "    {}", columns.join(",\n    "));
    out.push_str(");\n");
    out
}

fn render_column(column: &Column) -> String {
    let mut out = format!("{} {}", column.name, column.column_type.sql_name());
    if !column.nullable {
        out.push_str(" NOT NULL");
    }
    if column.primary_key {
        out.push_str(" PRIMARY KEY");
    }
    if let Some(fk) = &column.foreign_key {
        let _ = write!(out, " REFERENCES {}({})", fk.table, fk.column);
        if let Some(clause) = fk.on_delete.sql_clause() {
            out.push(' ');
            out.push_str(clause);
        }
    }
    out
}
