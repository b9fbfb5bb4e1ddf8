//! SQL identifier quoting.
//!
//! Every identifier the compiler emits on its own (derived table names, column names,
//! aliases, CTE names) goes through [`append_ident`]. Quoted identifiers escape `"` as `""`.
//!
//! Caller-supplied names (explicit table annotations, table/column expressions) are SQL text
//! and are emitted verbatim instead; see [`crate::schema::TableName`].

/// Append `name` as a double-quoted identifier.
pub(crate) fn append_ident(out: &mut String, name: &str) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
            out.push('"');
        } else {
            out.push(ch);
        }
    }
    out.push('"');
}

/// Render `name` as a double-quoted identifier.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    append_ident(&mut out, name);
    out
}

/// Append `table.column` with both parts quoted.
pub(crate) fn append_qualified(out: &mut String, table: &str, column: &str) {
    append_ident(out, table);
    out.push('.');
    append_ident(out, column);
}
