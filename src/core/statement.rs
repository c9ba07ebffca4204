use crate::core::chunker::chunk;
use crate::core::values::{sql_literal, value_tuple};
use crate::domain::model::{GeneratedStatement, Operation, Row, TableUnit};
use crate::utils::error::{IbmiError, Result};

/// `INSERT INTO <table>(<cols>) VALUES (..),(..);`
///
/// 表格與欄位名稱原樣輸出 (需先經過識別字驗證)；沒有欄位或資料時回傳 `None`
pub fn insert_statement(table: &str, columns: &[String], rows: &[Row]) -> Option<GeneratedStatement> {
    if columns.is_empty() || rows.is_empty() {
        return None;
    }

    let values = rows
        .iter()
        .map(|row| value_tuple(row, columns))
        .collect::<Vec<_>>()
        .join(",");

    Some(GeneratedStatement {
        sql_text: format!("INSERT INTO {}({}) VALUES {};", table, columns.join(","), values),
        table_name: table.to_string(),
    })
}

/// 將一個 TableUnit 切塊後產生依序執行的 INSERT 語句
pub fn build_insert_queue(unit: TableUnit, chunk_size: usize) -> Result<Vec<GeneratedStatement>> {
    let TableUnit {
        table_name,
        column_names,
        records,
    } = unit;

    Ok(chunk(records, chunk_size)?
        .iter()
        .filter_map(|rows| insert_statement(&table_name, &column_names, rows))
        .collect())
}

/// 依操作名稱產生語句；只有 insert 會產生 SQL
pub fn build_statements(
    operation: &str,
    unit: TableUnit,
    chunk_size: usize,
) -> Result<Vec<GeneratedStatement>> {
    match operation.parse::<Operation>()? {
        Operation::Insert => build_insert_queue(unit, chunk_size),
        Operation::ExecuteQuery => Err(IbmiError::unsupported(operation)),
    }
}

/// `col=val,...`，不含更新鍵
pub fn update_set_clause(row: &Row, columns: &[String], update_key: &str) -> String {
    columns
        .iter()
        .filter(|column| column.as_str() != update_key)
        .map(|column| {
            let literal = row.get(column).map(sql_literal).unwrap_or_else(|| "NULL".to_string());
            format!("{}={}", column, literal)
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// 更新語句的 WHERE 條件 `key=val`
pub fn update_condition(row: &Row, update_key: &str) -> Result<String> {
    key_condition(row, update_key)
}

pub fn delete_condition(row: &Row, delete_key: &str) -> Result<String> {
    key_condition(row, delete_key)
}

fn key_condition(row: &Row, key: &str) -> Result<String> {
    let value = row.get(key).ok_or_else(|| IbmiError::ValidationError {
        message: format!("Key column '{}' is not part of the item", key),
    })?;
    Ok(format!("{}={}", key, sql_literal(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SqlValue;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn person(id: i64, name: &str) -> Row {
        vec![
            ("id", SqlValue::Number(id.into())),
            ("name", SqlValue::Text(name.to_string())),
        ]
        .into_iter()
        .collect()
    }

    fn unit(n: i64) -> TableUnit {
        TableUnit {
            table_name: "T1".to_string(),
            column_names: cols(&["id", "name"]),
            records: (1..=n).map(|i| person(i, "x")).collect(),
        }
    }

    #[test]
    fn test_insert_statement_text() {
        let rows = vec![person(1, "O'Brien"), person(2, "Lee")];
        let stmt = insert_statement("T1", &cols(&["id", "name"]), &rows).unwrap();
        assert_eq!(
            stmt.sql_text,
            "INSERT INTO T1(id,name) VALUES (1,'O''Brien'),(2,'Lee');"
        );
        assert_eq!(stmt.table_name, "T1");
    }

    #[test]
    fn test_insert_statement_skips_empty() {
        assert!(insert_statement("T1", &[], &[person(1, "a")]).is_none());
        assert!(insert_statement("T1", &cols(&["id"]), &[]).is_none());
    }

    #[test]
    fn test_build_insert_queue_chunks_in_order() {
        let statements = build_insert_queue(unit(2500), 1000).unwrap();
        assert_eq!(statements.len(), 3);

        let tuple_counts: Vec<usize> = statements
            .iter()
            .map(|s| s.sql_text.matches("),(").count() + 1)
            .collect();
        assert_eq!(tuple_counts, vec![1000, 1000, 500]);

        assert!(statements[0].sql_text.contains("VALUES (1,'x'),(2,'x')"));
        assert!(statements[1].sql_text.starts_with("INSERT INTO T1(id,name) VALUES (1001,'x')"));
        assert!(statements[2].sql_text.ends_with("(2500,'x');"));
    }

    #[test]
    fn test_build_statements_rejects_update_and_delete() {
        for op in ["update", "delete"] {
            let err = build_statements(op, unit(3), 1000).unwrap_err();
            assert!(matches!(err, IbmiError::UnsupportedOperation { .. }));
        }
        assert_eq!(build_statements("insert", unit(3), 1000).unwrap().len(), 1);
    }

    #[test]
    fn test_update_and_delete_clauses() {
        let row = person(7, "O'Neil");
        let columns = cols(&["id", "name"]);
        assert_eq!(update_set_clause(&row, &columns, "id"), "name='O''Neil'");
        assert_eq!(update_condition(&row, "id").unwrap(), "id=7");
        assert_eq!(delete_condition(&row, "id").unwrap(), "id=7");
        assert!(delete_condition(&row, "code").is_err());
    }
}
