use crate::domain::model::{Row, SqlValue};

/// 將單一值轉為 SQL 字面值
pub fn sql_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(text) => format!("'{}'", text.replace('\'', "''")),
        SqlValue::Number(number) => number.to_string(),
        SqlValue::Boolean(true) => "TRUE".to_string(),
        SqlValue::Boolean(false) => "FALSE".to_string(),
        SqlValue::Null => "NULL".to_string(),
    }
}

/// 依欄位順序取出每欄的字面值，缺少的欄位為 NULL
pub fn extract_values(row: &Row, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| row.get(column).map(sql_literal).unwrap_or_else(|| "NULL".to_string()))
        .collect()
}

/// `(v1,v2,...)`
pub fn value_tuple(row: &Row, columns: &[String]) -> String {
    format!("({})", extract_values(row, columns).join(","))
}
