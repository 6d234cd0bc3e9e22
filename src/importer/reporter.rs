// ==========================================
// 数据包导入工具 - 消息报告
// ==========================================
// 职责: 导入过程中面向操作者的消息输出（info / warning / error）
// 实现: TracingReporter 输出到日志，MemoryReporter 收集消息供调用方读取
// ==========================================

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use tracing::{error, info, warn};

/// 消息级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageLevel::Info => write!(f, "info"),
            MessageLevel::Warning => write!(f, "warning"),
            MessageLevel::Error => write!(f, "error"),
        }
    }
}

/// 已报告的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedMessage {
    pub level: MessageLevel,
    pub message: String,
}

// ==========================================
// Reporter Trait
// ==========================================
pub trait Reporter: Send + Sync {
    fn print_message(&self, message: &str, level: MessageLevel);

    fn info(&self, message: &str) {
        self.print_message(message, MessageLevel::Info);
    }

    fn warning(&self, message: &str) {
        self.print_message(message, MessageLevel::Warning);
    }

    fn error(&self, message: &str) {
        self.print_message(message, MessageLevel::Error);
    }

    /// 逐行输出（空列表不输出）
    fn print_lines(&self, lines: &[String], level: MessageLevel) {
        for line in lines {
            self.print_message(line, level);
        }
    }
}

// ==========================================
// TracingReporter - 输出到 tracing
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn print_message(&self, message: &str, level: MessageLevel) {
        match level {
            MessageLevel::Info => info!(target: "data_install::report", "{}", message),
            MessageLevel::Warning => warn!(target: "data_install::report", "{}", message),
            MessageLevel::Error => error!(target: "data_install::report", "{}", message),
        }
    }
}

// ==========================================
// MemoryReporter - 收集消息
// ==========================================
#[derive(Debug, Default)]
pub struct MemoryReporter {
    messages: Mutex<Vec<ReportedMessage>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部消息快照
    pub fn messages(&self) -> Vec<ReportedMessage> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// 指定级别的消息文本
    pub fn messages_at(&self, level: MessageLevel) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.level == level)
            .map(|m| m.message)
            .collect()
    }

    pub fn count_at(&self, level: MessageLevel) -> usize {
        self.messages().iter().filter(|m| m.level == level).count()
    }
}

impl Reporter for MemoryReporter {
    fn print_message(&self, message: &str, level: MessageLevel) {
        let entry = ReportedMessage {
            level,
            message: message.to_string(),
        };
        match self.messages.lock() {
            Ok(mut messages) => messages.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

/// 同时输出到 tracing 与内存
#[derive(Debug, Default)]
pub struct TeeReporter {
    pub memory: MemoryReporter,
}

impl Reporter for TeeReporter {
    fn print_message(&self, message: &str, level: MessageLevel) {
        TracingReporter.print_message(message, level);
        self.memory.print_message(message, level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_collects_by_level() {
        let reporter = MemoryReporter::new();
        reporter.info("start");
        reporter.warning("row skipped");
        reporter.print_lines(&["a".to_string(), "b".to_string()], MessageLevel::Error);

        assert_eq!(reporter.messages().len(), 4);
        assert_eq!(reporter.messages_at(MessageLevel::Warning), vec!["row skipped"]);
        assert_eq!(reporter.count_at(MessageLevel::Error), 2);
    }
}
