// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal column-aligned table renderer for `list`-style commands.

pub struct Column {
    pub name: &'static str,
}

impl Column {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

/// Prints `rows` under `columns`, padding each column to the widest cell
/// (header included) seen in that column.
pub fn print_table(columns: &[Column], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.name.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<width$}", c.name, width = w))
        .collect();
    println!("{}", header.join("  "));

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", line.join("  "));
    }
}
