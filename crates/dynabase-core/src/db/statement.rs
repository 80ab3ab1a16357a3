use crate::Error;
use rusqlite::{Connection, params_from_iter, types::Value};
use std::fmt::{self, Display};

/// Escape `%`, `_` and `\` so `text` matches literally inside a `LIKE`
/// pattern written with `ESCAPE '\'`.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }

    out
}

///
/// Insert
///
/// Single-row insert with positional parameters. Only the named columns are
/// written, so omitted columns take their default.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Insert {
    pub table: &'static str,
    pub columns: Vec<&'static str>,
    pub values: Vec<Value>,
}

impl Insert {
    #[must_use]
    pub const fn into(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn value(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.columns.push(column);
        self.values.push(value.into());
        self
    }

    /// Run the insert, returning the new row id.
    pub fn execute(&self, conn: &Connection) -> Result<i64, Error> {
        conn.execute(&self.to_string(), params_from_iter(&self.values))?;

        Ok(conn.last_insert_rowid())
    }
}

impl Display for Insert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = (1..=self.values.len()).map(|i| format!("?{i}")).collect();
        write!(
            f,
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            self.columns.join(", "),
            params.join(", ")
        )
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_positional_parameters() {
        let insert = Insert::into("label_ordinals")
            .value("prefix", "2.2.8.".to_string())
            .value("last_ordinal", 3i64);

        assert_eq!(
            insert.to_string(),
            "INSERT INTO label_ordinals (prefix, last_ordinal) VALUES (?1, ?2)"
        );
        assert_eq!(insert.values[1], Value::Integer(3));
    }

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("3.3.3969."), "3.3.3969.");
        assert_eq!(escape_like("_.%\\"), "\\_.\\%\\\\");
    }

    #[test]
    fn escaped_patterns_match_literally_in_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (label TEXT);").unwrap();
        for label in ["a_b.1", "axb.1", "a%b.1"] {
            Insert::into("t")
                .value("label", label.to_string())
                .execute(&conn)
                .unwrap();
        }

        let pattern = format!("{}%", escape_like("a_b."));
        let matched: Vec<String> = conn
            .prepare("SELECT label FROM t WHERE label LIKE ?1 ESCAPE '\\' ORDER BY label")
            .unwrap()
            .query_map([pattern], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(matched, vec!["a_b.1".to_string()]);
    }
}
