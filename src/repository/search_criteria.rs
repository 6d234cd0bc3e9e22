// ==========================================
// 数据包导入工具 - 查询条件
// ==========================================
// 职责: 平台仓储通用的过滤 + 分页条件（addFilter / setPageSize 语义）
// 约束: 字段名经白名单映射到列名，值一律参数化
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Value;

/// 过滤条件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionType {
    Eq,
    Neq,
}

impl ConditionType {
    fn sql_operator(&self) -> &'static str {
        match self {
            ConditionType::Eq => "=",
            ConditionType::Neq => "<>",
        }
    }
}

/// 过滤值
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Integer(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Integer(v as i64)
    }
}

impl FilterValue {
    fn to_sql_value(&self) -> Value {
        match self {
            FilterValue::Text(s) => Value::Text(s.clone()),
            FilterValue::Integer(i) => Value::Integer(*i),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: FilterValue,
    pub condition: ConditionType,
}

// ==========================================
// SearchCriteria
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchCriteria {
    pub filters: Vec<Filter>,
    pub page_size: Option<usize>,
    pub current_page: usize,
}

impl SearchCriteria {
    pub fn builder() -> SearchCriteriaBuilder {
        SearchCriteriaBuilder::default()
    }

    pub fn set_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// 页码从 1 开始
    pub fn set_current_page(mut self, page: usize) -> Self {
        self.current_page = page.max(1);
        self
    }

    /// 生成 WHERE / LIMIT 子句
    ///
    /// # 参数
    /// - entity: 实体名（用于错误信息）
    /// - columns: 逻辑字段 → 列名 白名单
    ///
    /// # 返回
    /// - (WHERE + LIMIT 子句, 参数列表)
    pub fn to_sql(
        &self,
        entity: &str,
        columns: &[(&str, &str)],
    ) -> RepositoryResult<(String, Vec<Value>)> {
        let mut clauses = Vec::with_capacity(self.filters.len());
        let mut values = Vec::with_capacity(self.filters.len());

        for filter in &self.filters {
            let column = columns
                .iter()
                .find(|(field, _)| *field == filter.field)
                .map(|(_, column)| *column)
                .ok_or_else(|| RepositoryError::UnsupportedSearchField {
                    entity: entity.to_string(),
                    field: filter.field.clone(),
                })?;
            values.push(filter.value.to_sql_value());
            clauses.push(format!(
                "{} {} ?{}",
                column,
                filter.condition.sql_operator(),
                values.len()
            ));
        }

        let mut sql = String::new();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if let Some(page_size) = self.page_size {
            let offset = self.current_page.saturating_sub(1) * page_size;
            sql.push_str(&format!(" LIMIT {} OFFSET {}", page_size, offset));
        }

        Ok((sql, values))
    }
}

// ==========================================
// SearchCriteriaBuilder
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SearchCriteriaBuilder {
    filters: Vec<Filter>,
}

impl SearchCriteriaBuilder {
    pub fn add_filter(
        mut self,
        field: &str,
        value: impl Into<FilterValue>,
        condition: ConditionType,
    ) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            value: value.into(),
            condition,
        });
        self
    }

    pub fn create(self) -> SearchCriteria {
        SearchCriteria {
            filters: self.filters,
            page_size: None,
            current_page: 1,
        }
    }
}

// ==========================================
// Searchable - 按条件查询列表
// ==========================================
pub trait Searchable<E> {
    fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<E>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[(&str, &str)] = &[("name", "b.name"), ("entity_id", "s.entity_id")];

    #[test]
    fn test_to_sql_with_page() {
        let criteria = SearchCriteria::builder()
            .add_filter("name", "Hero", ConditionType::Eq)
            .add_filter("entity_id", 5i64, ConditionType::Neq)
            .create()
            .set_page_size(1)
            .set_current_page(1);

        let (sql, values) = criteria.to_sql("banner", COLUMNS).unwrap();
        assert_eq!(sql, " WHERE b.name = ?1 AND s.entity_id <> ?2 LIMIT 1 OFFSET 0");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_to_sql_rejects_unknown_field() {
        let criteria = SearchCriteria::builder()
            .add_filter("name; DROP TABLE", "x", ConditionType::Eq)
            .create();
        assert!(matches!(
            criteria.to_sql("banner", COLUMNS),
            Err(RepositoryError::UnsupportedSearchField { .. })
        ));
    }

    #[test]
    fn test_to_sql_no_filters() {
        let (sql, values) = SearchCriteria::builder()
            .create()
            .to_sql("banner", COLUMNS)
            .unwrap();
        assert!(sql.is_empty());
        assert!(values.is_empty());
    }
}
