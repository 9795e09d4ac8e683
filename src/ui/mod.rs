pub mod highlight;
pub mod output;

pub use output::{
    display_json, display_tool_error, display_tool_result, display_tools, format_notification,
    format_state_change,
};
