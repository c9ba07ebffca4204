use anyhow::Result;
use async_trait::async_trait;
use ibmi_connector::core::{ConnectionPool, Driver, Record};
use ibmi_connector::domain::model::PoolConfig;
use ibmi_connector::{IbmiError, IbmiNode, NodeConfig};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// 每個連線池都拒絕所有語句
#[derive(Clone, Default)]
struct RejectingDriver {
    events: Arc<Mutex<Vec<String>>>,
}

struct RejectingPool {
    events: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ConnectionPool for RejectingPool {
    async fn query(&self, sql: &str) -> ibmi_connector::Result<Vec<Record>> {
        self.events.lock().unwrap().push(format!("query {}", sql));
        Err(IbmiError::execution(
            "[SQL0803] Duplicate key value specified.",
        ))
    }

    async fn close(&self) -> ibmi_connector::Result<()> {
        self.events.lock().unwrap().push("close".to_string());
        Ok(())
    }
}

#[async_trait]
impl Driver for RejectingDriver {
    type Pool = RejectingPool;

    async fn pool(&self, _config: &PoolConfig) -> ibmi_connector::Result<RejectingPool> {
        self.events.lock().unwrap().push("open".to_string());
        Ok(RejectingPool {
            events: Arc::clone(&self.events),
        })
    }
}

impl RejectingDriver {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

fn config(operation: &str, with_connection: bool, continue_on_fail: bool) -> NodeConfig {
    let connection = if with_connection {
        "[connection]\nhost = \"pub400.com\"\nuser = \"LOWCODE\"\npassword = \"secret\"\n"
    } else {
        ""
    };
    NodeConfig::from_toml_str(&format!(
        r#"
{connection}
[operation]
kind = "{operation}"
query = "SELECT * FROM LOWCODE1.PTBL"
table = "LOWCODE1.PTBL"
columns = "id,name"

[execution]
continue_on_fail = {continue_on_fail}
"#
    ))
    .expect("valid test config")
}

fn items() -> Vec<Record> {
    vec![
        Record::try_from(json!({"id": 1, "name": "Ann"})).unwrap(),
        Record::try_from(json!({"id": 2, "name": "Bob"})).unwrap(),
    ]
}

#[tokio::test]
async fn test_update_and_delete_are_rejected_without_statements() -> Result<()> {
    for operation in ["update", "delete"] {
        for continue_on_fail in [false, true] {
            let driver = RejectingDriver::default();
            let node = IbmiNode::new(driver.clone(), config(operation, true, continue_on_fail));

            let err = node.execute(items()).await.unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("The operation \"{}\" is not supported!", operation)
            );
            assert_eq!(driver.events(), vec!["open", "close"]);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_missing_credentials_is_fatal_even_when_continuing() -> Result<()> {
    let driver = RejectingDriver::default();
    let node = IbmiNode::new(driver.clone(), config("executeQuery", false, true));

    let err = node.execute(items()).await.unwrap_err();
    assert!(matches!(err, IbmiError::MissingCredentials));
    assert!(driver.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_insert_failure_aborts_and_closes_pool() -> Result<()> {
    let driver = RejectingDriver::default();
    let node = IbmiNode::new(driver.clone(), config("insert", true, false));

    let err = node.execute(items()).await.unwrap_err();
    assert_eq!(err.to_string(), "[SQL0803] Duplicate key value specified.");
    assert_eq!(
        driver.events(),
        vec![
            "open",
            "query INSERT INTO LOWCODE1.PTBL(id,name) VALUES (1,'Ann'),(2,'Bob');",
            "close",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_continue_on_fail_returns_untouched_input() -> Result<()> {
    for operation in ["insert", "executeQuery"] {
        let driver = RejectingDriver::default();
        let node = IbmiNode::new(driver.clone(), config(operation, true, true));

        let output = node.execute(items()).await?;
        assert_eq!(output, items());

        let events = driver.events();
        assert_eq!(events.first().map(String::as_str), Some("open"));
        assert_eq!(events.last().map(String::as_str), Some("close"));
        assert_eq!(events.iter().filter(|e| *e == "close").count(), 1);
    }
    Ok(())
}
