// ==========================================
// 数据包导入工具 - 公司组织结构仓储
// ==========================================
// 职责: company_structure 表的节点查询 / 插入 / 子树删除
// 约束: 路径与层级计算复用 StructureNode::child，保证与内存树一致
// 约束: 插入校验与子树删除范围由 StructureTree 计算
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::structure::{StructureNode, StructureTree};
use crate::domain::types::StructureEntityType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::search_criteria::{SearchCriteria, Searchable};
use rusqlite::{params, params_from_iter, Connection};
use std::sync::{Arc, Mutex};
use tracing::debug;

const STRUCTURE_COLUMNS: &[(&str, &str)] = &[
    ("structure_id", "structure_id"),
    ("parent_id", "parent_id"),
    ("entity_id", "entity_id"),
    ("entity_type", "entity_type"),
];

const SELECT_NODE: &str =
    "SELECT structure_id, parent_id, entity_id, entity_type, path, level FROM company_structure";

/// 组织结构仓储
pub trait StructureRepository: Searchable<StructureNode> + Send + Sync {
    /// 在父节点下插入实体节点
    ///
    /// # 错误
    /// - 父节点不存在: StructureError::ParentNotFound
    /// - 实体已有节点: StructureError::EntityAlreadyPlaced
    fn insert_under(
        &self,
        parent_id: i64,
        entity_id: i64,
        entity_type: StructureEntityType,
    ) -> RepositoryResult<StructureNode>;

    /// 删除节点及其子树，返回被删除的节点 ID
    fn delete_by_id(&self, structure_id: i64) -> RepositoryResult<Vec<i64>>;

    /// 载入整棵结构树
    fn load_tree(&self) -> RepositoryResult<StructureTree>;
}

// ==========================================
// SqliteStructureRepository - SQLite 实现
// ==========================================
pub struct SqliteStructureRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStructureRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_node(row: &rusqlite::Row) -> rusqlite::Result<StructureNode> {
        let raw_type: i32 = row.get(3)?;
        let entity_type = StructureEntityType::from_db_value(raw_type).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Integer,
                format!("未知结构实体类型: {}", raw_type).into(),
            )
        })?;
        Ok(StructureNode {
            structure_id: row.get(0)?,
            parent_id: row.get(1)?,
            entity_id: row.get(2)?,
            entity_type,
            path: row.get(4)?,
            level: row.get(5)?,
        })
    }

    /// 在给定连接（可为事务）上载入整棵树
    fn read_tree(conn: &Connection) -> RepositoryResult<StructureTree> {
        let mut stmt = conn.prepare(SELECT_NODE)?;
        let rows = stmt.query_map([], Self::map_node)?;
        Ok(StructureTree::from_nodes(rows.collect::<Result<Vec<_>, _>>()?))
    }
}

impl Searchable<StructureNode> for SqliteStructureRepository {
    fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<StructureNode>> {
        let (clause, values) = criteria.to_sql("company_structure", STRUCTURE_COLUMNS)?;
        let sql = format!("{}{}", SELECT_NODE, clause);
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), Self::map_node)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl StructureRepository for SqliteStructureRepository {
    fn insert_under(
        &self,
        parent_id: i64,
        entity_id: i64,
        entity_type: StructureEntityType,
    ) -> RepositoryResult<StructureNode> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let tree = Self::read_tree(&tx)?;
        let parent = tree
            .placement_parent(parent_id, entity_id, entity_type)?
            .clone();

        tx.execute(
            r#"
            INSERT INTO company_structure (parent_id, entity_id, entity_type, path, level)
            VALUES (?1, ?2, ?3, '', ?4)
            "#,
            params![
                parent.structure_id,
                entity_id,
                entity_type.to_db_value(),
                parent.level + 1
            ],
        )?;
        let node = parent.child(tx.last_insert_rowid(), entity_id, entity_type);
        tx.execute(
            "UPDATE company_structure SET path = ?1 WHERE structure_id = ?2",
            params![node.path, node.structure_id],
        )?;
        tx.commit()?;

        debug!(
            structure_id = node.structure_id,
            parent_id = parent.structure_id,
            entity_id,
            path = %node.path,
            "结构节点已插入"
        );
        Ok(node)
    }

    fn delete_by_id(&self, structure_id: i64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut tree = Self::read_tree(&tx)?;
        let removed = tree.delete_by_id(structure_id);
        if removed.is_empty() {
            return Ok(removed);
        }
        for id in &removed {
            tx.execute(
                "DELETE FROM company_structure WHERE structure_id = ?1",
                params![id],
            )?;
        }
        tx.commit()?;

        debug!(structure_id, removed = removed.len(), "结构子树已删除");
        Ok(removed)
    }

    fn load_tree(&self) -> RepositoryResult<StructureTree> {
        let conn = self.get_conn()?;
        Self::read_tree(&conn)
    }
}
