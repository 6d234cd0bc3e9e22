// ==========================================
// 数据包导入工具 - 内容块仓储
// ==========================================
// 职责: 动态内容块（banner）/ 店铺内容 / 客户分群 / 分群关联
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::content::{CustomerSegment, DynamicBlock};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::search_criteria::{SearchCriteria, Searchable};
use rusqlite::{params, params_from_iter, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const BANNER_COLUMNS: &[(&str, &str)] = &[("name", "name"), ("banner_id", "banner_id")];

const SEGMENT_COLUMNS: &[(&str, &str)] = &[("name", "name"), ("segment_id", "segment_id")];

/// 动态内容块仓储
pub trait BannerRepository: Searchable<DynamicBlock> + Send + Sync {
    /// 保存内容块（新建或更新）
    ///
    /// # 说明
    /// - 新建时回填 banner_id
    /// - store_contents 中的店铺内容按店铺覆盖，未出现的店铺保持不变
    fn save(&self, block: &DynamicBlock) -> RepositoryResult<DynamicBlock>;

    /// 整体替换内容块的分群关联
    fn save_banner_segments(&self, banner_id: i64, segment_ids: &[i64]) -> RepositoryResult<()>;

    fn list_banner_segments(&self, banner_id: i64) -> RepositoryResult<Vec<i64>>;
}

/// 客户分群仓储
pub trait SegmentRepository: Searchable<CustomerSegment> + Send + Sync {}

// ==========================================
// SqliteContentRepository - SQLite 实现
// ==========================================
pub struct SqliteContentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContentRepository {
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

    /// 新增客户分群
    pub fn create_segment(&self, name: &str) -> RepositoryResult<CustomerSegment> {
        let conn = self.get_conn()?;
        conn.execute("INSERT INTO customer_segment (name) VALUES (?1)", params![name])?;
        Ok(CustomerSegment {
            segment_id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    /// 内容块总数
    pub fn count_banners(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM banner", [], |row| row.get(0))?)
    }

    fn load_store_contents(
        conn: &Connection,
        banner_id: i64,
    ) -> RepositoryResult<BTreeMap<i64, String>> {
        let mut stmt = conn.prepare(
            "SELECT store_id, content FROM banner_content WHERE banner_id = ?1 ORDER BY store_id",
        )?;
        let rows = stmt.query_map(params![banner_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<Result<BTreeMap<_, _>, _>>()?)
    }
}

impl Searchable<DynamicBlock> for SqliteContentRepository {
    fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<DynamicBlock>> {
        let (clause, values) = criteria.to_sql("banner", BANNER_COLUMNS)?;
        let sql = format!(
            "SELECT banner_id, name, is_enabled, types FROM banner{}",
            clause
        );
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(DynamicBlock {
                banner_id: Some(row.get(0)?),
                name: row.get(1)?,
                is_enabled: row.get::<_, i32>(2)? != 0,
                types: row.get(3)?,
                store_contents: BTreeMap::new(),
            })
        })?;
        let mut blocks = rows.collect::<Result<Vec<_>, _>>()?;

        for block in blocks.iter_mut() {
            if let Some(id) = block.banner_id {
                block.store_contents = Self::load_store_contents(&conn, id)?;
            }
        }
        Ok(blocks)
    }
}

impl BannerRepository for SqliteContentRepository {
    fn save(&self, block: &DynamicBlock) -> RepositoryResult<DynamicBlock> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let banner_id = match block.banner_id {
            Some(id) => {
                let updated = tx.execute(
                    "UPDATE banner SET name = ?1, is_enabled = ?2, types = ?3 WHERE banner_id = ?4",
                    params![block.name, block.is_enabled as i32, block.types, id],
                )?;
                if updated == 0 {
                    return Err(RepositoryError::NotFound {
                        entity: "banner".to_string(),
                        id: id.to_string(),
                    });
                }
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO banner (name, is_enabled, types) VALUES (?1, ?2, ?3)",
                    params![block.name, block.is_enabled as i32, block.types],
                )?;
                tx.last_insert_rowid()
            }
        };

        for (store_id, content) in &block.store_contents {
            tx.execute(
                r#"
                INSERT INTO banner_content (banner_id, store_id, content) VALUES (?1, ?2, ?3)
                ON CONFLICT(banner_id, store_id) DO UPDATE SET content = excluded.content
                "#,
                params![banner_id, store_id, content],
            )?;
        }

        let store_contents = Self::load_store_contents(&tx, banner_id)?;
        tx.commit()?;

        Ok(DynamicBlock {
            banner_id: Some(banner_id),
            store_contents,
            ..block.clone()
        })
    }

    fn save_banner_segments(&self, banner_id: i64, segment_ids: &[i64]) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM banner_segment_link WHERE banner_id = ?1",
            params![banner_id],
        )?;
        for segment_id in segment_ids {
            tx.execute(
                "INSERT OR IGNORE INTO banner_segment_link (banner_id, segment_id) VALUES (?1, ?2)",
                params![banner_id, segment_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn list_banner_segments(&self, banner_id: i64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT segment_id FROM banner_segment_link WHERE banner_id = ?1 ORDER BY segment_id",
        )?;
        let rows = stmt.query_map(params![banner_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<i64>, _>>()?)
    }
}

impl Searchable<CustomerSegment> for SqliteContentRepository {
    fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<CustomerSegment>> {
        let (clause, values) = criteria.to_sql("customer_segment", SEGMENT_COLUMNS)?;
        let sql = format!("SELECT segment_id, name FROM customer_segment{}", clause);
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(CustomerSegment {
                segment_id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl SegmentRepository for SqliteContentRepository {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::content::ADMIN_STORE_ID;

    fn repo() -> SqliteContentRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        SqliteContentRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_save_new_then_update() {
        let repo = repo();
        let mut block = DynamicBlock::new("Hero");
        block.store_contents.insert(ADMIN_STORE_ID, "<p>hi</p>".to_string());
        let saved = repo.save(&block).unwrap();
        assert!(saved.banner_id.is_some());

        let mut again = saved.clone();
        again.is_enabled = false;
        again.store_contents.clear();
        again.store_contents.insert(1, "<p>fr</p>".to_string());
        let updated = repo.save(&again).unwrap();

        assert_eq!(updated.banner_id, saved.banner_id);
        assert!(!updated.is_enabled);
        assert_eq!(updated.store_contents.len(), 2);
        assert_eq!(repo.count_banners().unwrap(), 1);
    }

    #[test]
    fn test_segment_links_replaced() {
        let repo = repo();
        let s1 = repo.create_segment("VIP").unwrap();
        let s2 = repo.create_segment("New").unwrap();
        let block = repo.save(&DynamicBlock::new("Promo")).unwrap();
        let id = block.banner_id.unwrap();

        repo.save_banner_segments(id, &[s1.segment_id, s2.segment_id]).unwrap();
        repo.save_banner_segments(id, &[s2.segment_id]).unwrap();

        assert_eq!(repo.list_banner_segments(id).unwrap(), vec![s2.segment_id]);
    }
}
