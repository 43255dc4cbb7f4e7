//! SQL execution tool backed by the trip warehouse.
//!
//! Query failures never bubble up as errors. They are rendered into the
//! tool's text reply so the model can read what went wrong and try a
//! corrected statement on the next round.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::ToolError;
use crate::tools::tool::{require_str, Tool, ToolOutput};
use crate::warehouse::Warehouse;

/// Fixed reply for valid queries that match no rows, so the model reports
/// "no results" instead of inventing an answer.
pub const EMPTY_RESULT_MESSAGE: &str =
    "La consulta se ejecutó correctamente, pero no devolvió resultados.";

/// Prefix for execution failures surfaced to the model.
const QUERY_ERROR_PREFIX: &str = "Error al ejecutar la consulta";

/// Runs a SQL statement against the CitiBike trip warehouse and renders the
/// result as a Markdown table.
pub struct RunSqlQueryTool {
    warehouse: Arc<dyn Warehouse>,
}

impl RunSqlQueryTool {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }
}

#[async_trait]
impl Tool for RunSqlQueryTool {
    fn name(&self) -> &str {
        "run_sql_query"
    }

    fn description(&self) -> &str {
        "Ejecuta una consulta SQL en la base de datos de BigQuery con los viajes de CitiBike \
         en Nueva York y devuelve el resultado como una tabla Markdown. La consulta debe usar \
         el dialecto SQL estándar de Google BigQuery."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "La consulta SQL completa a ejecutar en BigQuery."
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let query = require_str(&params, "query")?;
        tracing::info!(query, "Running SQL query");

        let start = Instant::now();
        let text = match self.warehouse.run_query(query).await {
            Ok(output) if output.is_empty() => EMPTY_RESULT_MESSAGE.to_string(),
            Ok(output) => output.to_markdown(),
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "Query failed");
                format!("{QUERY_ERROR_PREFIX}: {e}")
            }
        };
        Ok(ToolOutput::text(text, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::WarehouseError;
    use crate::warehouse::QueryOutput;

    enum FakeResult {
        Rows,
        Empty,
        Fail(fn() -> WarehouseError),
    }

    struct FakeWarehouse {
        result: FakeResult,
    }

    #[async_trait]
    impl Warehouse for FakeWarehouse {
        async fn run_query(&self, _sql: &str) -> Result<QueryOutput, WarehouseError> {
            match &self.result {
                FakeResult::Rows => Ok(QueryOutput {
                    columns: vec!["total".to_string()],
                    rows: vec![vec![Some("53108721".to_string())]],
                    truncated: false,
                }),
                FakeResult::Empty => Ok(QueryOutput {
                    columns: vec!["total".to_string()],
                    rows: Vec::new(),
                    truncated: false,
                }),
                FakeResult::Fail(make) => Err(make()),
            }
        }
    }

    fn tool_with(result: FakeResult) -> RunSqlQueryTool {
        RunSqlQueryTool::new(Arc::new(FakeWarehouse { result }))
    }

    #[tokio::test]
    async fn renders_rows_as_markdown_table() {
        let tool = tool_with(FakeResult::Rows);
        let output = tool
            .execute(json!({"query": "SELECT COUNT(*) AS total FROM t"}))
            .await
            .unwrap();
        assert_eq!(output.text, "| total    |\n|----------|\n| 53108721 |\n");
    }

    #[tokio::test]
    async fn empty_result_returns_fixed_sentence() {
        let tool = tool_with(FakeResult::Empty);
        let output = tool
            .execute(json!({"query": "SELECT 1 WHERE FALSE"}))
            .await
            .unwrap();
        assert_eq!(output.text, EMPTY_RESULT_MESSAGE);
    }

    #[tokio::test]
    async fn query_failure_becomes_tool_text() {
        let tool = tool_with(FakeResult::Fail(|| {
            WarehouseError::InvalidQuery("Unrecognized name: tripdur at [1:8]".to_string())
        }));
        let output = tool.execute(json!({"query": "SELECT tripdur"})).await.unwrap();
        assert!(output.text.starts_with("Error al ejecutar la consulta:"));
        assert!(output.text.contains("Unrecognized name: tripdur"));
    }

    #[tokio::test]
    async fn missing_query_param_is_rejected() {
        let tool = tool_with(FakeResult::Rows);
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters(_)));
    }

    #[test]
    fn schema_requires_query_string() {
        let tool = tool_with(FakeResult::Rows);
        let schema = tool.parameters_schema();
        assert_eq!(schema["required"][0], "query");
        assert_eq!(schema["properties"]["query"]["type"], "string");
    }
}
