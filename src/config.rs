//! 配置模块，负责加载JSON配置文件
//!
//! 配置文件示例:
//!
//! ```json
//! {
//!   "strictness": "Lenient",
//!   "tables": { "Ticket": "tickets" },
//!   "relations": {
//!     "Ticket.Tags": { "table": "ticket_tags", "foreignKey": "ticket_id" }
//!   },
//!   "objectKeys": { "Ticket.Reviewer": "reviewer_user_id" },
//!   "maxInValues": 1000
//! }
//! ```

use crate::bind::{CompileOptions, Strictness};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// 集合成员到子表的映射
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationMapping {
    pub table: String,
    /// 子表中指向父行的列
    pub foreign_key: String,
    /// 父表主键列
    #[serde(default = "default_parent_key")]
    pub parent_key: String,
}

/// 过滤编译器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// 条件失败时是丢弃还是报错
    #[serde(default)]
    pub strictness: Strictness,
    /// 类型名到数据库表名的映射
    #[serde(default)]
    pub tables: HashMap<String, String>,
    /// `类型.成员` 到子表的映射
    #[serde(default)]
    pub relations: HashMap<String, RelationMapping>,
    /// `类型.成员` 到对象外键列的映射, 对象成员只能做 null 判断
    #[serde(default)]
    pub object_keys: HashMap<String, String>,
    /// IN 列表的最大长度, 超过时拆分为多个 IN
    #[serde(default = "default_max_in_values")]
    pub max_in_values: usize,
}

fn default_parent_key() -> String {
    "id".to_string()
}

fn default_max_in_values() -> usize {
    1000
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strictness: Strictness::default(),
            tables: HashMap::new(),
            relations: HashMap::new(),
            object_keys: HashMap::new(),
            max_in_values: default_max_in_values(),
        }
    }
}

impl FilterConfig {
    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.display().to_string()));
        }

        // 读取文件内容
        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;

        Self::from_json_str(&content).map_err(|source| ConfigError::Parse {
            path: path_ref.display().to_string(),
            source,
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions { strictness: self.strictness }
    }

    /// 获取类型对应的表名，如果不存在则返回 snake_case 的类型名
    pub fn get_table_name(&self, type_name: &str) -> String {
        self.tables
            .get(type_name)
            .cloned()
            .unwrap_or_else(|| to_snake_case(type_name))
    }

    /// 获取集合成员对应的子表映射, 未配置时按命名约定推导
    pub fn get_relation(&self, owner: &str, member_path: &str) -> RelationMapping {
        let key = format!("{}.{}", owner, member_path);
        if let Some(relation) = self.relations.get(&key) {
            return relation.clone();
        }
        let member = member_path.rsplit('.').next().unwrap_or(member_path);
        RelationMapping {
            table: to_snake_case(member),
            foreign_key: format!("{}_id", to_snake_case(owner)),
            parent_key: default_parent_key(),
        }
    }

    /// 获取对象成员对应的外键列, 未配置时为 `<扁平路径>_id`
    pub fn get_object_key(&self, owner: &str, member_path: &str) -> String {
        let key = format!("{}.{}", owner, member_path);
        if let Some(column) = self.object_keys.get(&key) {
            return column.clone();
        }
        let flattened = member_path.split('.').map(to_snake_case).collect::<Vec<_>>().join("_");
        format!("{}_id", flattened)
    }
}

/// `CreatedAt` -> `created_at`, `HTTPStatus` -> `http_status`
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
