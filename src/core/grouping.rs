use crate::domain::model::{Record, Row, TableUnit};
use crate::domain::ports::NodeParameters;
use crate::utils::error::{IbmiError, Result};
use crate::utils::validation::validate_identifier;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^}\s]+)\s*\}\}").expect("placeholder pattern is valid"))
}

/// 以項目欄位值替換表格名稱中的 `{{field}}`
pub fn render_table_name(template: &str, item: &Record) -> Result<String> {
    let mut missing = None;
    let rendered = placeholder_regex().replace_all(template, |caps: &regex::Captures| {
        let field = &caps[1];
        match item.get(field) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                missing.get_or_insert_with(|| field.to_string());
                String::new()
            }
        }
    });

    if let Some(field) = missing {
        return Err(IbmiError::ValidationError {
            message: format!(
                "Table name '{}' refers to field '{}' which is missing or not a scalar",
                template, field
            ),
        });
    }
    Ok(rendered.into_owned())
}

/// 逗號分隔的欄位清單，去除空白與空項目
pub fn parse_column_list(columns: &str) -> Vec<String> {
    columns
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// 依 (表格, 欄位清單) 將項目分組，保留首次出現的順序
pub fn group_records<P>(params: &P, items: &[Record]) -> Result<Vec<TableUnit>>
where
    P: NodeParameters + ?Sized,
{
    let mut units: Vec<TableUnit> = Vec::new();
    let mut index_by_key: HashMap<(String, Vec<String>), usize> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        let table = params.table(item, index)?;
        let columns = params.columns(item, index)?;

        validate_identifier("table", &table)?;
        for column in &columns {
            validate_identifier("columns", column)?;
        }

        let row = Row::project(item, &columns)?;

        match index_by_key.get(&(table.clone(), columns.clone())) {
            Some(&slot) => units[slot].records.push(row),
            None => {
                index_by_key.insert((table.clone(), columns.clone()), units.len());
                units.push(TableUnit {
                    table_name: table,
                    column_names: columns,
                    records: vec![row],
                });
            }
        }
    }

    tracing::debug!(
        "Grouped {} items into {} table unit(s)",
        items.len(),
        units.len()
    );
    Ok(units)
}
