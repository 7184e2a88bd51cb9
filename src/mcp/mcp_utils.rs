use crate::commands::Out;
use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{error, warn};

/// The human-readable message first, then the structured data as JSON when there is any.
pub(super) fn to_content<T>(out: Out<T>) -> Vec<Content>
where
    T: Debug + Clone + Serialize,
{
    let mut content = vec![Content::text(out.message())];
    if let Some(object) = out.structure() {
        match Content::json(object) {
            Ok(json) => content.push(json),
            Err(e) => error!("Unable to serialize JSON output: {e}"),
        };
    }
    content
}

/// Command failures become tool errors carrying the error type and message, they are never
/// protocol errors.
pub(super) fn tool_result<T>(result: crate::Result<Out<T>>) -> Result<CallToolResult, ErrorData>
where
    T: Debug + Clone + Serialize,
{
    Ok(match result {
        Ok(out) => CallToolResult::success(to_content(out)),
        Err(e) => {
            warn!("Tool call failed: {e}");
            CallToolResult::error(vec![Content::text(e.to_string())])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorType};
    use rmcp::model::RawContent;

    #[test]
    fn test_tool_result_success_has_json() {
        let out = Out::new("Saved!", vec![1, 2, 3]);
        let result = tool_result(Ok(out)).unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(result.content.len(), 2);
        assert!(matches!(&result.content[0].raw, RawContent::Text(t) if t.text == "Saved!"));
    }

    #[test]
    fn test_tool_result_error() {
        let err = Error::new(ErrorType::Store, anyhow::anyhow!("sheet unreachable"));
        let result = tool_result::<()>(Err(err)).unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert!(
            matches!(&result.content[0].raw, RawContent::Text(t) if t.text == "store error: sheet unreachable")
        );
    }
}
