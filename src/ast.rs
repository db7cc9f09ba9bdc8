//! Filter AST: 过滤条件树的节点定义
//!
//! 节点是纯数据, 反序列化时创建一次, 编译时消费一次, 之后不再修改。
//! JSON 线格式由 `kind` 字段区分节点类型, 其余字段使用 camelCase。

use serde::{Deserialize, Serialize};

/// 过滤树的节点, 三种变体构成封闭集合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FilterNode {
    /// 逻辑组合, 例如 `A AND B AND C`
    Group(Group),
    /// 针对单个成员路径的比较条件
    Condition(Condition),
    /// 针对集合成员的量词条件 (Any / All / HasElements)
    CollectionCondition(CollectionCondition),
}

/// 代表一组按同一组合符连接的子条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub combinator: Combinator,
    /// 子节点, 按声明顺序求值
    pub children: Vec<FilterNode>,
}

/// 代表对单个字段的比较, 例如 `Status == "Active"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// 点分隔的成员路径, 例如 `Owner.Name`
    pub path: String,
    pub operator: Operator,
    /// 字面量文本; `In` 运算符时为 JSON 编码的字符串数组
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ignore_case: bool,
}

/// 代表对集合成员的条件, 例如 `Tags.Any(Name contains "ops")`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCondition {
    pub path: String,
    pub operator: CollectionOperator,
    /// Any/All 必填, HasElements 不允许出现
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Box<FilterNode>>,
}

/// 组合符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combinator {
    And,
    Or,
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

/// 集合运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionOperator {
    HasElements,
    Any,
    All,
}

impl Combinator {
    pub const ALL: [Combinator; 2] = [Combinator::And, Combinator::Or];

    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::And => "And",
            Combinator::Or => "Or",
        }
    }
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::GreaterThan,
        Operator::GreaterOrEqual,
        Operator::LessThan,
        Operator::LessOrEqual,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::In,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "Equals",
            Operator::NotEquals => "NotEquals",
            Operator::GreaterThan => "GreaterThan",
            Operator::GreaterOrEqual => "GreaterOrEqual",
            Operator::LessThan => "LessThan",
            Operator::LessOrEqual => "LessOrEqual",
            Operator::Contains => "Contains",
            Operator::StartsWith => "StartsWith",
            Operator::EndsWith => "EndsWith",
            Operator::In => "In",
        }
    }
}

impl CollectionOperator {
    pub const ALL: [CollectionOperator; 3] = [
        CollectionOperator::HasElements,
        CollectionOperator::Any,
        CollectionOperator::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionOperator::HasElements => "HasElements",
            CollectionOperator::Any => "Any",
            CollectionOperator::All => "All",
        }
    }

    /// Any/All 需要子谓词
    pub fn requires_predicate(&self) -> bool {
        !matches!(self, CollectionOperator::HasElements)
    }
}

impl FilterNode {
    /// 判别字段的取值
    pub fn kind(&self) -> &'static str {
        match self {
            FilterNode::Group(_) => "Group",
            FilterNode::Condition(_) => "Condition",
            FilterNode::CollectionCondition(_) => "CollectionCondition",
        }
    }

    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Group(Group { combinator: Combinator::And, children })
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Group(Group { combinator: Combinator::Or, children })
    }

    /// 构造一个普通比较条件
    pub fn condition(path: impl Into<String>, operator: Operator, value: Option<&str>) -> Self {
        FilterNode::Condition(Condition {
            path: path.into(),
            operator,
            value: value.map(str::to_string),
            ignore_case: false,
        })
    }

    /// 构造一个 `In` 条件, 值列表会被编码为 JSON 数组
    pub fn is_in<S: AsRef<str>>(path: impl Into<String>, values: &[S]) -> Self {
        let values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
        let encoded = serde_json::to_string(&values).unwrap_or_else(|_| "[]".to_string());
        FilterNode::Condition(Condition {
            path: path.into(),
            operator: Operator::In,
            value: Some(encoded),
            ignore_case: false,
        })
    }

    pub fn has_elements(path: impl Into<String>) -> Self {
        FilterNode::CollectionCondition(CollectionCondition {
            path: path.into(),
            operator: CollectionOperator::HasElements,
            predicate: None,
        })
    }

    pub fn any(path: impl Into<String>, predicate: FilterNode) -> Self {
        FilterNode::CollectionCondition(CollectionCondition {
            path: path.into(),
            operator: CollectionOperator::Any,
            predicate: Some(Box::new(predicate)),
        })
    }

    pub fn all(path: impl Into<String>, predicate: FilterNode) -> Self {
        FilterNode::CollectionCondition(CollectionCondition {
            path: path.into(),
            operator: CollectionOperator::All,
            predicate: Some(Box::new(predicate)),
        })
    }

    /// 设置忽略大小写; 对非 `Condition` 节点无效
    pub fn ignoring_case(mut self) -> Self {
        if let FilterNode::Condition(condition) = &mut self {
            condition.ignore_case = true;
        }
        self
    }

    /// 树的深度, 叶子节点为 1
    pub fn depth(&self) -> usize {
        match self {
            FilterNode::Group(group) => {
                1 + group.children.iter().map(FilterNode::depth).max().unwrap_or(0)
            }
            FilterNode::Condition(_) => 1,
            FilterNode::CollectionCondition(collection) => {
                1 + collection.predicate.as_ref().map_or(0, |p| p.depth())
            }
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let node = FilterNode::and(vec![
            FilterNode::condition("Status", Operator::Equals, Some("Active")),
            FilterNode::any(
                "Tags",
                FilterNode::condition("Name", Operator::Contains, Some("ops")).ignoring_case(),
            ),
        ]);

        assert_eq!(node.kind(), "Group");
        assert_eq!(node.depth(), 3);
        match node {
            FilterNode::Group(group) => {
                assert_eq!(group.combinator, Combinator::And);
                assert_eq!(group.children.len(), 2);
            }
            _ => panic!("Expected Group"),
        }
    }

    #[test]
    fn test_in_builder_encodes_array() {
        let node = FilterNode::is_in("Status", &["Active", "Pending"]);
        match node {
            FilterNode::Condition(condition) => {
                assert_eq!(condition.operator, Operator::In);
                assert_eq!(condition.value.as_deref(), Some(r#"["Active","Pending"]"#));
            }
            _ => panic!("Expected Condition"),
        }
    }

    #[test]
    fn test_ignoring_case_only_touches_conditions() {
        let node = FilterNode::has_elements("Tags").ignoring_case();
        assert_eq!(node, FilterNode::has_elements("Tags"));
    }
}
