//! Cursor command handlers

use crate::cli::{CursorAction, CursorArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use serde_json::json;

/// Handle the cursor command
pub async fn handle_cursor(
    args: CursorArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let registry = config.registry()?;
    let codec = registry.cursors();

    match args.action {
        CursorAction::Encode { offset, limit } => {
            let token = codec.offset_to_cursor(offset, limit);
            if output.is_human() {
                output.writeln(&token)
            } else {
                output.data(&json!({ "token": token, "offset": offset, "limit": limit }))
            }
        }
        CursorAction::Decode { token } => {
            let decoded = codec.try_cursor_to_offset(&token);
            let malformed = decoded.is_none();
            let cursor = decoded.unwrap_or_else(|| codec.cursor_to_offset(&token));
            if malformed {
                output.warning(&format!(
                    "Malformed cursor, using the first page with limit {}",
                    codec.default_limit()
                ))?;
            }

            if output.is_human() {
                output.field("Offset", &cursor.offset.to_string())?;
                output.field("Limit", &cursor.limit.to_string())
            } else {
                output.data(&json!({
                    "offset": cursor.offset,
                    "limit": cursor.limit,
                    "malformed": malformed,
                }))
            }
        }
    }
}
