// ==========================================
// 数据包导入工具 - B2B 仓储
// ==========================================
// 职责: 共享目录 / 客户组 / 公司 / 客户 / 团队 数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::b2b::{Company, Customer, CustomerGroup, SharedCatalog, Team};
use crate::domain::types::{CatalogType, StructureEntityType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::search_criteria::{SearchCriteria, Searchable};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const SHARED_CATALOG_COLUMNS: &[(&str, &str)] =
    &[("name", "name"), ("entity_id", "catalog_id")];

const CUSTOMER_GROUP_COLUMNS: &[(&str, &str)] = &[("code", "code"), ("id", "group_id")];

const COMPANY_COLUMNS: &[(&str, &str)] =
    &[("company_name", "company_name"), ("entity_id", "company_id")];

const CUSTOMER_COLUMNS: &[(&str, &str)] = &[("email", "email"), ("entity_id", "customer_id")];

const TEAM_COLUMNS: &[(&str, &str)] = &[
    ("name", "name"),
    ("company_id", "company_id"),
    ("team_id", "team_id"),
];

// ==========================================
// 仓储接口
// ==========================================

/// 共享目录仓储
pub trait SharedCatalogRepository: Searchable<SharedCatalog> + Send + Sync {
    /// 保存共享目录（新建或更新），返回带 catalog_id 的实体
    fn save(&self, catalog: &SharedCatalog) -> RepositoryResult<SharedCatalog>;

    /// 将公司分配到共享目录（每个公司至多属于一个目录）
    fn assign_companies(&self, catalog_id: i64, company_ids: &[i64]) -> RepositoryResult<usize>;

    fn list_catalog_companies(&self, catalog_id: i64) -> RepositoryResult<Vec<i64>>;
}

/// 客户组仓储
pub trait CustomerGroupRepository: Searchable<CustomerGroup> + Send + Sync {
    /// 按代码查找客户组，不存在则创建
    fn install_group(&self, code: &str) -> RepositoryResult<CustomerGroup>;
}

/// 公司仓储
pub trait CompanyRepository: Searchable<Company> + Send + Sync {}

/// 客户仓储
pub trait CustomerRepository: Searchable<Customer> + Send + Sync {}

/// 团队仓储
pub trait TeamRepository: Searchable<Team> + Send + Sync {
    fn save(&self, team: &Team) -> RepositoryResult<Team>;
}

// ==========================================
// SqliteB2bRepository - SQLite 实现
// ==========================================
pub struct SqliteB2bRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteB2bRepository {
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

    // ===== 主数据维护 =====

    /// 新增客户
    pub fn create_customer(&self, email: &str) -> RepositoryResult<Customer> {
        let conn = self.get_conn()?;
        conn.execute("INSERT INTO customer (email) VALUES (?1)", params![email])?;
        Ok(Customer {
            customer_id: conn.last_insert_rowid(),
            email: email.to_string(),
        })
    }

    /// 新增公司，同时为公司管理员建立组织结构根节点
    pub fn create_company(&self, company_name: &str, admin_email: &str) -> RepositoryResult<Company> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let admin_id: i64 = tx
            .query_row(
                "SELECT customer_id FROM customer WHERE email = ?1",
                params![admin_email],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "customer".to_string(),
                id: admin_email.to_string(),
            })?;

        tx.execute(
            "INSERT INTO company (company_name, super_user_id) VALUES (?1, ?2)",
            params![company_name, admin_id],
        )?;
        let company_id = tx.last_insert_rowid();

        tx.execute(
            r#"
            INSERT INTO company_structure (parent_id, entity_id, entity_type, path, level)
            VALUES (NULL, ?1, ?2, '', 0)
            "#,
            params![admin_id, StructureEntityType::Customer.to_db_value()],
        )?;
        let structure_id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE company_structure SET path = ?1 WHERE structure_id = ?2",
            params![structure_id.to_string(), structure_id],
        )?;
        tx.commit()?;

        Ok(Company {
            company_id,
            company_name: company_name.to_string(),
            super_user_id: admin_id,
        })
    }

    fn map_shared_catalog(row: &rusqlite::Row) -> rusqlite::Result<SharedCatalog> {
        Ok(SharedCatalog {
            catalog_id: Some(row.get(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            customer_group_id: row.get(3)?,
            created_by: row.get(4)?,
            tax_class_id: row.get(5)?,
            catalog_type: CatalogType::from_db_value(row.get(6)?),
        })
    }
}

impl Searchable<SharedCatalog> for SqliteB2bRepository {
    fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<SharedCatalog>> {
        let (clause, values) = criteria.to_sql("shared_catalog", SHARED_CATALOG_COLUMNS)?;
        let sql = format!(
            "SELECT catalog_id, name, description, customer_group_id, created_by, tax_class_id, type \
             FROM shared_catalog{}",
            clause
        );
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), Self::map_shared_catalog)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl SharedCatalogRepository for SqliteB2bRepository {
    fn save(&self, catalog: &SharedCatalog) -> RepositoryResult<SharedCatalog> {
        let conn = self.get_conn()?;
        let catalog_id = match catalog.catalog_id {
            Some(id) => {
                let updated = conn.execute(
                    r#"
                    UPDATE shared_catalog SET
                        name = ?1, description = ?2, customer_group_id = ?3,
                        created_by = ?4, tax_class_id = ?5, type = ?6
                    WHERE catalog_id = ?7
                    "#,
                    params![
                        catalog.name,
                        catalog.description,
                        catalog.customer_group_id,
                        catalog.created_by,
                        catalog.tax_class_id,
                        catalog.catalog_type.to_db_value(),
                        id,
                    ],
                )?;
                if updated == 0 {
                    return Err(RepositoryError::NotFound {
                        entity: "shared_catalog".to_string(),
                        id: id.to_string(),
                    });
                }
                id
            }
            None => {
                conn.execute(
                    r#"
                    INSERT INTO shared_catalog (
                        name, description, customer_group_id, created_by, tax_class_id, type, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                    params![
                        catalog.name,
                        catalog.description,
                        catalog.customer_group_id,
                        catalog.created_by,
                        catalog.tax_class_id,
                        catalog.catalog_type.to_db_value(),
                        Utc::now().to_rfc3339(),
                    ],
                )?;
                conn.last_insert_rowid()
            }
        };

        Ok(SharedCatalog {
            catalog_id: Some(catalog_id),
            ..catalog.clone()
        })
    }

    fn assign_companies(&self, catalog_id: i64, company_ids: &[i64]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut count = 0;
        for company_id in company_ids {
            tx.execute(
                r#"
                INSERT INTO shared_catalog_company (company_id, catalog_id) VALUES (?1, ?2)
                ON CONFLICT(company_id) DO UPDATE SET catalog_id = excluded.catalog_id
                "#,
                params![company_id, catalog_id],
            )?;
            count += 1;
        }
        tx.commit()?;
        Ok(count)
    }

    fn list_catalog_companies(&self, catalog_id: i64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT company_id FROM shared_catalog_company WHERE catalog_id = ?1 ORDER BY company_id",
        )?;
        let rows = stmt.query_map(params![catalog_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<i64>, _>>()?)
    }
}

impl Searchable<CustomerGroup> for SqliteB2bRepository {
    fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<CustomerGroup>> {
        let (clause, values) = criteria.to_sql("customer_group", CUSTOMER_GROUP_COLUMNS)?;
        let sql = format!("SELECT group_id, code FROM customer_group{}", clause);
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(CustomerGroup {
                group_id: row.get(0)?,
                code: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl CustomerGroupRepository for SqliteB2bRepository {
    fn install_group(&self, code: &str) -> RepositoryResult<CustomerGroup> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO customer_group (code, tax_class_id) VALUES (?1, ?2)",
            params![code, SharedCatalog::DEFAULT_TAX_CLASS_ID],
        )?;
        let group_id: i64 = conn.query_row(
            "SELECT group_id FROM customer_group WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        Ok(CustomerGroup {
            group_id,
            code: code.to_string(),
        })
    }
}

impl Searchable<Company> for SqliteB2bRepository {
    fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<Company>> {
        let (clause, values) = criteria.to_sql("company", COMPANY_COLUMNS)?;
        let sql = format!(
            "SELECT company_id, company_name, super_user_id FROM company{}",
            clause
        );
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(Company {
                company_id: row.get(0)?,
                company_name: row.get(1)?,
                super_user_id: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl CompanyRepository for SqliteB2bRepository {}

impl Searchable<Customer> for SqliteB2bRepository {
    fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<Customer>> {
        let (clause, values) = criteria.to_sql("customer", CUSTOMER_COLUMNS)?;
        let sql = format!("SELECT customer_id, email FROM customer{}", clause);
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(Customer {
                customer_id: row.get(0)?,
                email: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl CustomerRepository for SqliteB2bRepository {}

impl Searchable<Team> for SqliteB2bRepository {
    fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<Team>> {
        let (clause, values) = criteria.to_sql("company_team", TEAM_COLUMNS)?;
        let sql = format!("SELECT team_id, company_id, name FROM company_team{}", clause);
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(Team {
                team_id: Some(row.get(0)?),
                company_id: row.get(1)?,
                name: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl TeamRepository for SqliteB2bRepository {
    fn save(&self, team: &Team) -> RepositoryResult<Team> {
        let conn = self.get_conn()?;
        let team_id = match team.team_id {
            Some(id) => {
                conn.execute(
                    "UPDATE company_team SET name = ?1, company_id = ?2 WHERE team_id = ?3",
                    params![team.name, team.company_id, id],
                )?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO company_team (company_id, name, created_at) VALUES (?1, ?2, ?3)",
                    params![team.company_id, team.name, Utc::now().to_rfc3339()],
                )?;
                conn.last_insert_rowid()
            }
        };
        Ok(Team {
            team_id: Some(team_id),
            ..team.clone()
        })
    }
}
