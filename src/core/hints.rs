//! Process-wide external hints.
//!
//! Two short-lived singletons feed classification: the last clipboard
//! capture (from the helper or the in-IDE copy hook) and the last AI-tool
//! command envelope. Both are owned by the coordinator and only touched
//! under its lock.

use serde::{Deserialize, Serialize};

use super::position::{Position, Range};
use super::time::WallClock;

/// Where a clipboard capture came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardKind {
    ClipboardCopy,
    IdeClipboardCopy,
}

/// The most recent clipboard capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipboardHint {
    pub text: String,
    pub ts: WallClock,
    pub kind: ClipboardKind,
    pub url: String,
    pub title: String,
    pub workspace_path: String,
    pub relative_path: String,
}

impl ClipboardHint {
    pub fn is_fresh(&self, now: WallClock, window_ms: u64) -> bool {
        self.ts > now.saturating_sub_ms(window_ms)
    }
}

/// AI command envelope types observed from the tool intake.
pub mod ai_kind {
    pub const INLINE_COMPLETION: &str = "inlineCompletion";
    pub const POST_INSERT_EDIT: &str = "postInsertEdit";
    pub const CREATE_FILE: &str = "createFile";

    pub const BEFORE_APPLY_PATCH: &str = "onBeforeApplyPatchTool";
    pub const AFTER_APPLY_PATCH: &str = "onAfterApplyPatchTool";
    pub const BEFORE_CREATE_FILE: &str = "onBeforeCreateFileTool";
    pub const AFTER_CREATE_FILE: &str = "onAfterCreateFileTool";
    pub const BEFORE_INSERT_EDIT: &str = "onBeforeInsertEditTool";
    pub const AFTER_INSERT_EDIT: &str = "onAfterInsertEditTool";
    pub const BEFORE_REPLACE_STRING: &str = "onBeforeReplaceStringTool";
    pub const AFTER_REPLACE_STRING: &str = "onAfterReplaceStringTool";
}

/// The last AI-tool invocation envelope.
///
/// The payload shape follows the intake wire format; field renames keep the
/// JSON keys the tool actually sends.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiCommand {
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(rename = "_timestamp")]
    pub ts: WallClock,
    #[serde(rename = "insertText", skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    #[serde(rename = "oldText", skip_serializing_if = "Option::is_none")]
    pub old_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    #[serde(rename = "_modelId", skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(rename = "_extensionName", skip_serializing_if = "Option::is_none")]
    pub extension_name: Option<String>,
    #[serde(rename = "_explanation", skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Companion document uri, when the envelope names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

impl AiCommand {
    /// Any of the before/after tool envelope types.
    pub fn is_tool_kind(&self) -> bool {
        self.is_before_tool() || self.is_after_tool()
    }

    pub fn is_before_tool(&self) -> bool {
        matches!(
            self.kind.as_str(),
            ai_kind::BEFORE_APPLY_PATCH
                | ai_kind::BEFORE_CREATE_FILE
                | ai_kind::BEFORE_INSERT_EDIT
                | ai_kind::BEFORE_REPLACE_STRING
        )
    }

    pub fn is_after_tool(&self) -> bool {
        matches!(
            self.kind.as_str(),
            ai_kind::AFTER_APPLY_PATCH
                | ai_kind::AFTER_CREATE_FILE
                | ai_kind::AFTER_INSERT_EDIT
                | ai_kind::AFTER_REPLACE_STRING
        )
    }

    /// Before-tool types whose document change arrives in a later batch.
    pub fn is_deferred_before_tool(&self) -> bool {
        matches!(
            self.kind.as_str(),
            ai_kind::BEFORE_INSERT_EDIT | ai_kind::BEFORE_REPLACE_STRING
        )
    }

    /// Tool name recorded as span metadata; non-tool kinds record the
    /// envelope type itself.
    pub fn ai_type_label(&self) -> &str {
        match self.kind.as_str() {
            ai_kind::BEFORE_APPLY_PATCH | ai_kind::AFTER_APPLY_PATCH => "applyPatch",
            ai_kind::BEFORE_CREATE_FILE | ai_kind::AFTER_CREATE_FILE => "createFile",
            ai_kind::BEFORE_INSERT_EDIT | ai_kind::AFTER_INSERT_EDIT => "insertEdit",
            ai_kind::BEFORE_REPLACE_STRING | ai_kind::AFTER_REPLACE_STRING => "replaceString",
            other => other,
        }
    }

    pub fn range_start(&self) -> Option<Position> {
        self.range.map(|r| r.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ai_command_parses_intake_payload() {
        let payload = serde_json::json!({
            "_type": "onAfterInsertEditTool",
            "_timestamp": 1_700_000_000_000u64,
            "insertText": "fn x() {}",
            "_modelId": "gpt-test",
            "_extensionName": "copilot",
            "unknownField": true,
        });
        let cmd: AiCommand = serde_json::from_value(payload).unwrap();
        assert_eq!(cmd.kind, ai_kind::AFTER_INSERT_EDIT);
        assert_eq!(cmd.ts, WallClock(1_700_000_000_000));
        assert!(cmd.is_after_tool());
        assert_eq!(cmd.ai_type_label(), "insertEdit");
    }

    #[test]
    fn deferred_before_tools_are_the_insert_and_replace_ones() {
        let mut cmd = AiCommand::default();
        for (kind, deferred) in [
            (ai_kind::BEFORE_INSERT_EDIT, true),
            (ai_kind::BEFORE_REPLACE_STRING, true),
            (ai_kind::BEFORE_APPLY_PATCH, false),
            (ai_kind::INLINE_COMPLETION, false),
        ] {
            cmd.kind = kind.to_string();
            assert_eq!(cmd.is_deferred_before_tool(), deferred, "{kind}");
        }
    }

    #[test]
    fn clipboard_freshness_window() {
        let hint = ClipboardHint {
            text: "x".into(),
            ts: WallClock(10_000),
            kind: ClipboardKind::ClipboardCopy,
            url: String::new(),
            title: String::new(),
            workspace_path: String::new(),
            relative_path: String::new(),
        };
        assert!(hint.is_fresh(WallClock(10_100), 200));
        assert!(!hint.is_fresh(WallClock(10_300), 200));
    }
}
