//! Parser for the `CREATE TABLE` statements of a DDL file.
//!
//! Only the subset the harness needs is understood: column names and types,
//! plus `INDEX(KEY=..., TS=...)` clauses that mark key and timestamp columns.
//! Table options after the column list are kept in the statement text but
//! otherwise ignored.
//!
//! ```sql
//! create table t1 (
//!     c1 string,
//!     c2 int,
//!     c3 timestamp,
//!     index(key=(c1, c2), ts=c3, ttl=0m)
//! );
//! ```

use crate::schema::{SchemaError, TableDescriptor};
use crate::types::SqlType;

/// Parse every `CREATE TABLE` statement in `text`, in order.
pub fn parse_ddl(text: &str) -> Result<Vec<TableDescriptor>, SchemaError> {
    let text = strip_line_comments(text);
    split_top_level(&text, ';')
        .into_iter()
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(parse_create_table)
        .collect()
}

/// Parse a single `CREATE TABLE` statement (without the trailing `;`).
pub fn parse_create_table(stmt: &str) -> Result<TableDescriptor, SchemaError> {
    let stmt = stmt.trim().trim_end_matches(';').trim();
    let open = stmt
        .find('(')
        .ok_or_else(|| ddl_error("missing column list", stmt))?;
    let close =
        matching_paren(stmt, open).ok_or_else(|| ddl_error("unbalanced parentheses", stmt))?;

    let name = table_name(&stmt[..open])
        .ok_or_else(|| ddl_error("expected CREATE TABLE <name>", stmt))?;

    let mut columns: Vec<(String, SqlType)> = Vec::new();
    let mut key_columns: Vec<String> = Vec::new();
    let mut ts_columns: Vec<String> = Vec::new();

    for item in split_top_level(&stmt[open + 1..close], ',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let lower = item.to_ascii_lowercase();

        if starts_with_keyword(&lower, "index") {
            parse_index(item, &mut key_columns, &mut ts_columns)?;
        } else if starts_with_keyword(&lower, "primary") {
            let keys = parenthesized(item).ok_or_else(|| ddl_error("malformed primary key", item))?;
            key_columns.extend(split_names(keys));
        } else {
            let mut words = item.split_whitespace();
            let column = words.next().map(unquote).unwrap_or_default();
            let type_word = words
                .next()
                .ok_or_else(|| ddl_error("column without type", item))?;
            let type_name = type_word.split('(').next().unwrap_or(type_word);
            let column_type: SqlType =
                type_name
                    .parse()
                    .map_err(|_| SchemaError::UnsupportedType {
                        table: name.clone(),
                        column: column.clone(),
                        type_name: type_name.to_string(),
                    })?;
            columns.push((column, column_type));
        }
    }

    if columns.is_empty() {
        return Err(ddl_error("table without columns", stmt));
    }

    let position_of = |column: &str| {
        columns
            .iter()
            .position(|(n, _)| n == column)
            .ok_or_else(|| SchemaError::ColumnNotFound {
                table: name.clone(),
                column: column.to_string(),
            })
    };

    let key_positions = key_columns
        .iter()
        .map(|c| position_of(c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut ts_positions = Vec::with_capacity(ts_columns.len());
    for column in &ts_columns {
        let position = position_of(column)?;
        let column_type = columns[position].1;
        if !column_type.can_carry_timestamp() {
            return Err(SchemaError::InvalidTimestampColumn {
                table: name.clone(),
                column: column.clone(),
                column_type,
            });
        }
        ts_positions.push(position);
    }

    TableDescriptor::new(name, columns, key_positions, ts_positions, format!("{stmt};"))
}

fn parse_index(
    item: &str,
    key_columns: &mut Vec<String>,
    ts_columns: &mut Vec<String>,
) -> Result<(), SchemaError> {
    let inner = parenthesized(item).ok_or_else(|| ddl_error("malformed index", item))?;
    for option in split_top_level(inner, ',') {
        let option = option.trim();
        if option.is_empty() {
            continue;
        }
        let (key, value) = option
            .split_once('=')
            .ok_or_else(|| ddl_error("expected key=value in index", option))?;
        match key.trim().to_ascii_lowercase().as_str() {
            "key" => key_columns.extend(split_names(value)),
            "ts" => ts_columns.push(unquote(value.trim())),
            // ttl, ttl_type and friends do not affect generation
            _ => {}
        }
    }
    Ok(())
}

/// `CREATE TABLE [IF NOT EXISTS] [db.]name`
fn table_name(head: &str) -> Option<String> {
    let words: Vec<&str> = head.split_whitespace().collect();
    let lower: Vec<String> = words.iter().map(|w| w.to_ascii_lowercase()).collect();
    let name = match lower.as_slice() {
        [c, t, _] if c == "create" && t == "table" => words[2],
        [c, t, i, n, e, _]
            if c == "create" && t == "table" && i == "if" && n == "not" && e == "exists" =>
        {
            words[5]
        }
        _ => return None,
    };
    let name = unquote(name);
    let name = name.rsplit('.').next().unwrap_or(&name).to_string();
    (!name.is_empty()).then_some(name)
}

fn starts_with_keyword(lower: &str, keyword: &str) -> bool {
    lower
        .strip_prefix(keyword)
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_whitespace() || c == '('))
}

/// Contents of the first balanced parenthesized group in `s`.
fn parenthesized(s: &str) -> Option<&str> {
    let open = s.find('(')?;
    let close = matching_paren(s, open)?;
    Some(&s[open + 1..close])
}

fn split_names(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(|n| unquote(n.trim()))
        .filter(|n| !n.is_empty())
        .collect()
}

fn unquote(s: &str) -> String {
    s.trim_matches(|c| c == '`' || c == '"').to_string()
}

fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote = false;
    for (idx, c) in s.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on `sep` where it is neither quoted nor nested in parentheses.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut start = 0;
    for (idx, c) in s.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth -= 1,
            c if c == sep && !in_quote && depth == 0 => {
                parts.push(&s[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn strip_line_comments(text: &str) -> String {
    text.lines()
        .map(|line| match line.find("--") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn ddl_error(reason: &str, near: &str) -> SchemaError {
    let near: String = near.chars().take(80).collect();
    SchemaError::Ddl(format!("{reason} near `{near}`"))
}
