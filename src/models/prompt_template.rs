//! 提示词模板
//!
//! 每个模块一份静态模板，只是数据；拼装提示词由 `services::prompt_builder` 负责

/// 模块专属的评分指令模板
#[derive(Debug)]
pub struct PromptTemplate {
    /// 提示词开头的考官角色
    pub examiner: &'static str,
    /// 引出检索到的参考资料的一行
    pub reference_intro: &'static str,
    /// 引出待评题目的一行
    pub task_line: &'static str,
    /// 模块专属的评分要求
    pub criteria: &'static [&'static str],
}
