use crate::core::node::IbmiNode;
use crate::core::{ConfigProvider, Driver, Pipeline, Record, Storage};
use crate::domain::ports::OutputFormat;
use crate::utils::error::Result;

pub struct ConnectorPipeline<S: Storage, D: Driver, C: ConfigProvider> {
    storage: S,
    node: IbmiNode<D, C>,
}

impl<S: Storage, D: Driver, C: ConfigProvider> ConnectorPipeline<S, D, C> {
    pub fn new(storage: S, driver: D, config: C) -> Self {
        Self {
            storage,
            node: IbmiNode::new(driver, config),
        }
    }

    fn config(&self) -> &C {
        self.node.params()
    }

    fn output_filename(&self, format: OutputFormat) -> String {
        let config = self.config();
        let filename = config
            .output_filename()
            .replace("{operation}", config.operation())
            .replace(
                "{timestamp}",
                &chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string(),
            );

        if filename.contains('.') {
            filename
        } else {
            format!("{}.{}", filename, format.extension())
        }
    }
}

/// JSON 陣列或單一物件轉為項目
pub fn parse_items(data: &[u8]) -> Result<Vec<Record>> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    match serde_json::from_slice::<serde_json::Value>(data)? {
        serde_json::Value::Array(values) => values.into_iter().map(Record::try_from).collect(),
        other => Ok(vec![Record::try_from(other)?]),
    }
}

/// 以所有項目的欄位聯集 (首次出現順序) 為表頭
pub fn records_to_csv(records: &[Record]) -> Result<String> {
    if records.is_empty() {
        return Ok(String::new());
    }

    let mut headers: Vec<&str> = Vec::new();
    for record in records {
        for key in record.data.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&headers)?;
    for record in records {
        let row = headers.iter().map(|header| match record.get(header) {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        });
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[async_trait::async_trait]
impl<S: Storage, D: Driver, C: ConfigProvider> Pipeline for ConnectorPipeline<S, D, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        match self.config().input_path() {
            Some(path) => {
                tracing::debug!("Reading input items from: {}", path);
                let data = self.storage.read_file(path).await?;
                parse_items(&data)
            }
            None => {
                tracing::debug!("No input file configured, running without items");
                Ok(Vec::new())
            }
        }
    }

    async fn transform(&self, data: Vec<Record>) -> Result<Vec<Record>> {
        self.node.execute(data).await
    }

    async fn load(&self, result: Vec<Record>) -> Result<String> {
        let format = self.config().output_format()?;
        let filename = self.output_filename(format);
        let payload = match format {
            OutputFormat::Json => serde_json::to_string_pretty(&result)?,
            OutputFormat::Csv => records_to_csv(&result)?,
        };

        tracing::debug!("Writing {} ({} bytes) to storage", filename, payload.len());
        self.storage.write_file(&filename, payload.as_bytes()).await?;

        Ok(format!("{}/{}", self.config().output_path(), filename))
    }
}
