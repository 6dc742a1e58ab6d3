//! Function inventory backed by AWS Lambda

use crate::error;
use async_trait::async_trait;
use aws_sdk_lambda::Client as LambdaClient;
use aws_sdk_lambda::types::FunctionConfiguration;
use promoter_core::{FunctionInventory, FunctionSummary, Page, Result};
use tracing::debug;

/// Lists the functions of one account/region
#[derive(Debug, Clone)]
pub struct LambdaFunctions {
    client: LambdaClient,
}

impl LambdaFunctions {
    /// Create a new function inventory
    pub fn new(client: LambdaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FunctionInventory for LambdaFunctions {
    async fn list_functions(
        &self,
        cursor: Option<String>,
        page_size: i32,
    ) -> Result<Page<FunctionSummary>> {
        let response = self
            .client
            .list_functions()
            .set_marker(cursor)
            .max_items(page_size)
            .send()
            .await
            .map_err(|e| error::remote("ListFunctions", e))?;

        let functions: Vec<FunctionSummary> =
            response.functions().iter().filter_map(function_summary).collect();
        debug!(count = functions.len(), "Listed functions");

        Ok(Page::new(
            functions,
            response.next_marker().map(str::to_string),
        ))
    }
}

/// Functions without both a name and an ARN cannot be associated and are skipped
fn function_summary(function: &FunctionConfiguration) -> Option<FunctionSummary> {
    Some(FunctionSummary::new(
        function.function_name()?,
        function.function_arn()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_summary() {
        let function = FunctionConfiguration::builder()
            .function_name("kraus-team7-foo")
            .function_arn("arn:aws:lambda:us-east-1:521208942562:function:kraus-team7-foo")
            .build();

        assert_eq!(
            function_summary(&function),
            Some(FunctionSummary::new(
                "kraus-team7-foo",
                "arn:aws:lambda:us-east-1:521208942562:function:kraus-team7-foo"
            ))
        );
    }

    #[test]
    fn test_function_without_arn_is_skipped() {
        let function = FunctionConfiguration::builder()
            .function_name("orphan")
            .build();
        assert_eq!(function_summary(&function), None);
    }
}
