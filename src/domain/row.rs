// ==========================================
// 数据包导入工具 - 行记录
// ==========================================
// 职责: 表头与位置值组合成有序的 列名 → 值 映射
// 约束: 表头长度必须与行长度一致
// 约束: 空白值视为缺失（用于默认值填充判断）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use serde::ser::{Serialize, SerializeMap, Serializer};

// ==========================================
// Row - 有序行记录
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// 表头与位置值组合（array_combine 语义）
    ///
    /// # 参数
    /// - header: 表头
    /// - values: 位置值
    /// - row_number: 行号（用于错误信息，从 1 开始）
    ///
    /// # 返回
    /// - Err(RowLengthMismatch): 表头长度 ≠ 行长度
    pub fn from_header(header: &[String], values: &[String], row_number: usize) -> ImportResult<Self> {
        if header.len() != values.len() {
            return Err(ImportError::RowLengthMismatch {
                row: row_number,
                expected: header.len(),
                actual: values.len(),
            });
        }

        let mut row = Row::new();
        for (column, value) in header.iter().zip(values.iter()) {
            row.set(column.as_str(), value.as_str());
        }
        Ok(row)
    }

    /// 批量组合
    pub fn zip_all(header: &[String], rows: &[Vec<String>]) -> ImportResult<Vec<Self>> {
        rows.iter()
            .enumerate()
            .map(|(idx, values)| Row::from_header(header, values, idx + 1))
            .collect()
    }

    /// 原始值（可能为空字符串）
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// 非空白值；空白视为缺失
    pub fn value(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|v| !v.trim().is_empty())
    }

    /// 字段存在且非空白
    pub fn is_present(&self, column: &str) -> bool {
        self.value(column).is_some()
    }

    /// 设置字段（已存在则覆盖，保持列顺序）
    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| name == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column.to_string(), value)),
        }
    }

    /// 仅在字段缺失（或空白）时设置默认值
    pub fn set_default(&mut self, column: &str, default: impl Into<String>) {
        if !self.is_present(column) {
            self.set(column, default);
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            let k: String = k.into();
            row.set(&k, v);
        }
        row
    }
}

// 序列化为 JSON 对象（保持列顺序）
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
