// ==========================================
// 数据包导入工具 - 公司组织结构树
// ==========================================
// 职责: 显式树结构（父链接 + 物化路径）
// 约束: 每个实体（客户/团队）同一时刻至多一个节点
// 约束: path = 父节点 path + "/" + 本节点 ID；根节点 path = 本节点 ID
// 约束: level = 父节点 level + 1（公司管理员根 0，团队 1，成员 2）
// ==========================================

use crate::domain::types::StructureEntityType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// 结构树操作错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("父节点不存在: structure_id={0}")]
    ParentNotFound(i64),

    #[error("实体已存在结构节点: entity_id={entity_id}, entity_type={entity_type:?}")]
    EntityAlreadyPlaced {
        entity_id: i64,
        entity_type: StructureEntityType,
    },
}

// ==========================================
// StructureNode - 结构节点
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureNode {
    pub structure_id: i64,
    pub parent_id: Option<i64>,
    pub entity_id: i64,
    pub entity_type: StructureEntityType,
    pub path: String,
    pub level: i32,
}

impl StructureNode {
    /// 构造根节点
    pub fn root(structure_id: i64, entity_id: i64, entity_type: StructureEntityType) -> Self {
        Self {
            structure_id,
            parent_id: None,
            entity_id,
            entity_type,
            path: structure_id.to_string(),
            level: 0,
        }
    }

    /// 构造本节点之下的子节点
    pub fn child(
        &self,
        structure_id: i64,
        entity_id: i64,
        entity_type: StructureEntityType,
    ) -> StructureNode {
        StructureNode {
            structure_id,
            parent_id: Some(self.structure_id),
            entity_id,
            entity_type,
            path: format!("{}/{}", self.path, structure_id),
            level: self.level + 1,
        }
    }

    /// 路径中的祖先 ID（不含自身）
    pub fn ancestor_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .path
            .split('/')
            .filter_map(|s| s.parse::<i64>().ok())
            .collect();
        ids.pop();
        ids
    }

    /// 是否位于 ancestor 子树内（含自身）
    pub fn is_within(&self, ancestor: &StructureNode) -> bool {
        self.structure_id == ancestor.structure_id
            || self.path.starts_with(&format!("{}/", ancestor.path))
    }
}

// ==========================================
// StructureTree - 内存结构树
// ==========================================
// 由仓储载入；插入前的父节点 / 唯一性校验与子树删除范围均在此计算
#[derive(Debug, Clone, Default)]
pub struct StructureTree {
    nodes: BTreeMap<i64, StructureNode>,
}

impl StructureTree {
    /// 从扁平节点列表重建
    pub fn from_nodes(nodes: impl IntoIterator<Item = StructureNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.structure_id, n)).collect(),
        }
    }

    /// 校验实体能否挂到父节点下，返回父节点
    ///
    /// # 错误
    /// - ParentNotFound: 父节点不存在
    /// - EntityAlreadyPlaced: 实体已有节点
    pub fn placement_parent(
        &self,
        parent_id: i64,
        entity_id: i64,
        entity_type: StructureEntityType,
    ) -> Result<&StructureNode, StructureError> {
        let parent = self
            .nodes
            .get(&parent_id)
            .ok_or(StructureError::ParentNotFound(parent_id))?;
        if self.find_by_entity(entity_id, entity_type).is_some() {
            return Err(StructureError::EntityAlreadyPlaced {
                entity_id,
                entity_type,
            });
        }
        Ok(parent)
    }

    /// 按节点 ID 删除（连同子树）
    ///
    /// # 返回
    /// - 被删除的节点 ID 列表；节点不存在时为空
    pub fn delete_by_id(&mut self, structure_id: i64) -> Vec<i64> {
        let target = match self.nodes.get(&structure_id) {
            Some(node) => node.clone(),
            None => return Vec::new(),
        };
        let removed: Vec<i64> = self
            .nodes
            .values()
            .filter(|n| n.is_within(&target))
            .map(|n| n.structure_id)
            .collect();
        for id in &removed {
            self.nodes.remove(id);
        }
        removed
    }

    pub fn get(&self, structure_id: i64) -> Option<&StructureNode> {
        self.nodes.get(&structure_id)
    }

    pub fn find_by_entity(
        &self,
        entity_id: i64,
        entity_type: StructureEntityType,
    ) -> Option<&StructureNode> {
        self.nodes
            .values()
            .find(|n| n.entity_id == entity_id && n.entity_type == entity_type)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StructureNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 校验树不变量，返回违规描述
    pub fn violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for node in self.nodes.values() {
            if !seen.insert((node.entity_id, node.entity_type)) {
                problems.push(format!(
                    "实体重复节点: entity_id={}, entity_type={:?}",
                    node.entity_id, node.entity_type
                ));
            }
            match node.parent_id {
                None => {
                    if node.path != node.structure_id.to_string() || node.level != 0 {
                        problems.push(format!("根节点路径/层级错误: {}", node.structure_id));
                    }
                }
                Some(parent_id) => match self.nodes.get(&parent_id) {
                    None => problems.push(format!("孤立节点: {}", node.structure_id)),
                    Some(parent) => {
                        if node.path != format!("{}/{}", parent.path, node.structure_id) {
                            problems.push(format!("路径错误: {}", node.structure_id));
                        }
                        if node.level != parent.level + 1 {
                            problems.push(format!("层级错误: {}", node.structure_id));
                        }
                    }
                },
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StructureEntityType::{Customer, Team};

    /// admin(1) → team_a(2) → member 11(4)；admin(1) → team_b(3) → member 12(5)
    fn sample_tree() -> StructureTree {
        let admin = StructureNode::root(1, 10, Customer);
        let team_a = admin.child(2, 1, Team);
        let team_b = admin.child(3, 2, Team);
        let member_a = team_a.child(4, 11, Customer);
        let member_b = team_b.child(5, 12, Customer);
        StructureTree::from_nodes(vec![admin, team_a, team_b, member_a, member_b])
    }

    #[test]
    fn test_child_builds_paths_and_levels() {
        let tree = sample_tree();
        let member = tree.get(4).unwrap();

        assert_eq!(tree.get(2).unwrap().path, "1/2");
        assert_eq!(tree.get(2).unwrap().level, 1);
        assert_eq!(member.path, "1/2/4");
        assert_eq!(member.level, 2);
        assert_eq!(member.ancestor_ids(), vec![1, 2]);
        assert!(tree.violations().is_empty());
    }

    #[test]
    fn test_placement_parent_rejects_second_node() {
        let tree = sample_tree();

        assert_eq!(
            tree.placement_parent(3, 11, Customer).unwrap_err(),
            StructureError::EntityAlreadyPlaced {
                entity_id: 11,
                entity_type: Customer
            }
        );
        // 同 ID 不同类型不冲突
        assert_eq!(tree.placement_parent(3, 11, Team).unwrap().structure_id, 3);
        assert_eq!(
            tree.placement_parent(99, 13, Customer).unwrap_err(),
            StructureError::ParentNotFound(99)
        );
    }

    #[test]
    fn test_delete_removes_subtree_only() {
        let mut tree = sample_tree();

        let removed = tree.delete_by_id(2);
        assert_eq!(removed, vec![2, 4]);
        assert!(tree.find_by_entity(11, Customer).is_none());
        assert!(tree.get(5).is_some());
        assert!(tree.violations().is_empty());

        assert!(tree.delete_by_id(404).is_empty());
    }

    #[test]
    fn test_violations_detect_broken_links() {
        let admin = StructureNode::root(1, 10, Customer);
        let mut orphan = admin.child(2, 1, Team);
        orphan.parent_id = Some(77);
        let mut wrong_level = admin.child(3, 2, Team);
        wrong_level.level = 5;
        let duplicate = admin.child(4, 10, Customer);

        let tree = StructureTree::from_nodes(vec![admin, orphan, wrong_level, duplicate]);
        let problems = tree.violations();
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.contains("孤立节点")));
        assert!(problems.iter().any(|p| p.contains("层级错误")));
        assert!(problems.iter().any(|p| p.contains("实体重复节点")));
    }
}
