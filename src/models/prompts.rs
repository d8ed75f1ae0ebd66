use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 作业编号到题目文本的映射，会话内只读
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentPromptSet {
    prompts: BTreeMap<String, String>,
}

impl AssignmentPromptSet {
    pub fn new(prompts: BTreeMap<String, String>) -> Self {
        Self { prompts }
    }

    pub fn get(&self, assignment_id: &str) -> Option<&str> {
        self.prompts.get(assignment_id).map(String::as_str)
    }

    pub fn contains(&self, assignment_id: &str) -> bool {
        self.prompts.contains_key(assignment_id)
    }

    /// 所有作业编号
    pub fn assignment_ids(&self) -> impl Iterator<Item = &str> {
        self.prompts.keys().map(String::as_str)
    }

    /// 发给评分器的作业上下文：有题目文本时用题目，否则退回作业编号
    pub fn context_for<'a>(&'a self, assignment_id: &'a str) -> &'a str {
        self.get(assignment_id).unwrap_or(assignment_id)
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl FromIterator<(String, String)> for AssignmentPromptSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            prompts: iter.into_iter().collect(),
        }
    }
}
