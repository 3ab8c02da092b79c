//! Helpers shared by the Postgres repositories.

use classroom_core::AppError;

/// True when the statement was rejected by a unique index.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err
        && db_err.is_unique_violation()
    {
        return true;
    }
    false
}

/// Maps a sqlx failure to an internal repository error, or to a conflict
/// carrying `conflict_message` when a unique index rejected the write.
pub(crate) fn map_write_error(err: sqlx::Error, conflict_message: &str) -> AppError {
    if is_unique_violation(&err) {
        return AppError::conflict(anyhow::anyhow!(conflict_message.to_string()));
    }
    AppError::database(err)
}

/// Escapes `LIKE` wildcards so user input matches literally under `ESCAPE '\'`.
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("Jane"), "Jane");
        assert_eq!(escape_like("%"), "\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}
