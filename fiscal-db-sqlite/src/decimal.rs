use fiscal_core::RepositoryError;
use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};

/// Get a decimal value from a row.
///
/// Decimals are written as TEXT; INTEGER and REAL values written by other
/// tools are accepted too. NULL reads as zero.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    // NULL values report the column's declared type, so test for them first.
    if value_ref.is_null() {
        return Ok(Decimal::ZERO);
    }

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            val.trim().parse::<Decimal>().map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to parse '{}' in column '{}' as decimal: {}",
                    val, column, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        _ => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            type_name, column
        ))),
    }
}

/// Get an optional decimal value from a row, returning None for NULL values.
pub fn get_optional_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Ok(None);
    }

    get_decimal(row, column).map(Some)
}

/// Text form of a decimal for storage. Trailing zeros are dropped so the
/// same value always produces the same text.
pub fn decimal_to_text(d: Decimal) -> String {
    d.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_test_db() -> sqlx::sqlite::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        sqlx::query(
            "CREATE TABLE test_decimals (
                id INTEGER PRIMARY KEY,
                int_value INTEGER,
                real_value REAL,
                text_value TEXT,
                blob_value BLOB
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create test table");
        pool
    }

    async fn fetch_single(
        pool: &sqlx::sqlite::SqlitePool,
        insert: &str,
        column: &str,
    ) -> sqlx::sqlite::SqliteRow {
        sqlx::query(insert)
            .execute(pool)
            .await
            .expect("Failed to insert test data");
        sqlx::query(&format!("SELECT {column} FROM test_decimals WHERE id = 1"))
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row")
    }

    #[tokio::test]
    async fn test_get_decimal_from_text_is_exact() {
        let pool = setup_test_db().await;
        let row = fetch_single(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, '8157.41')",
            "text_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(8157.41)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_unparsable_text() {
        let pool = setup_test_db().await;
        let row = fetch_single(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, 'not a number')",
            "text_value",
        )
        .await;

        let result = get_decimal(&row, "text_value");

        assert!(matches!(result, Err(RepositoryError::Database(msg))
            if msg.starts_with("Failed to parse 'not a number' in column 'text_value'")));
    }

    #[tokio::test]
    async fn test_get_decimal_from_integer() {
        let pool = setup_test_db().await;
        let row = fetch_single(
            &pool,
            "INSERT INTO test_decimals (id, int_value) VALUES (1, 2025)",
            "int_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "int_value"), Ok(dec!(2025)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_real() {
        let pool = setup_test_db().await;
        let row = fetch_single(
            &pool,
            "INSERT INTO test_decimals (id, real_value) VALUES (1, 190.4)",
            "real_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "real_value"), Ok(dec!(190.4)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_null_returns_zero() {
        let pool = setup_test_db().await;
        let row = fetch_single(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, NULL)",
            "text_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_get_decimal_unexpected_type() {
        let pool = setup_test_db().await;
        let row = fetch_single(
            &pool,
            "INSERT INTO test_decimals (id, blob_value) VALUES (1, X'00FF')",
            "blob_value",
        )
        .await;

        assert_eq!(
            get_decimal(&row, "blob_value"),
            Err(RepositoryError::Database(
                "Unexpected type 'BLOB' for column 'blob_value'".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_get_decimal_column_not_found() {
        let pool = setup_test_db().await;
        let row = fetch_single(&pool, "INSERT INTO test_decimals (id) VALUES (1)", "id").await;

        let result = get_decimal(&row, "nonexistent_column");

        assert!(matches!(result, Err(RepositoryError::Database(msg))
            if msg.starts_with("Column 'nonexistent_column' not found:")));
    }

    #[tokio::test]
    async fn test_get_optional_decimal_from_null_returns_none() {
        let pool = setup_test_db().await;
        let row = fetch_single(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, NULL)",
            "text_value",
        )
        .await;

        assert_eq!(get_optional_decimal(&row, "text_value"), Ok(None));
    }

    #[tokio::test]
    async fn test_get_optional_decimal_from_text() {
        let pool = setup_test_db().await;
        let row = fetch_single(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, '4664.68')",
            "text_value",
        )
        .await;

        assert_eq!(get_optional_decimal(&row, "text_value"), Ok(Some(dec!(4664.68))));
    }

    #[test]
    fn test_decimal_to_text_drops_trailing_zeros() {
        assert_eq!(decimal_to_text(dec!(249.00)), "249");
        assert_eq!(decimal_to_text(dec!(0.0750)), "0.075");
        assert_eq!(decimal_to_text(dec!(-22.77)), "-22.77");
    }
}
