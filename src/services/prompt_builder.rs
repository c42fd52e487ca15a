//! 提示词构建 - 能力层
//!
//! 纯函数：（题目、答案、检索结果、模板）→ 提示词文本。
//! 无论模板内容如何，提示词结尾固定是解析器依赖的 `Score:` / `Feedback:` 两行格式约定。

use crate::models::{PromptTemplate, ReferenceDocument};

/// 作为上下文的检索文档数上限
pub const MAX_CONTEXT_DOCUMENTS: usize = 3;

/// 缺少参考答案时的占位符
pub const MODEL_ANSWER_UNAVAILABLE: &str = "N/A";

const CONTEXT_SEPARATOR: &str = "\n---\n";

/// 构建评分提示词
///
/// # 参数
/// - `question`: 题目
/// - `student_answer`: 学生答案，原样嵌入
/// - `model_answer`: 参考答案，`None` 或空白时替换为 `N/A`
/// - `retrieved`: 最近邻参考文档，只取前三条
/// - `template`: 模块模板
pub fn build_prompt(
    question: &str,
    student_answer: &str,
    model_answer: Option<&str>,
    retrieved: &[ReferenceDocument],
    template: &PromptTemplate,
) -> String {
    let context = retrieved
        .iter()
        .take(MAX_CONTEXT_DOCUMENTS)
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    let model_answer = model_answer
        .filter(|answer| !answer.trim().is_empty())
        .unwrap_or(MODEL_ANSWER_UNAVAILABLE);

    let mut instructions = vec!["If the answer is blank or missing, assign a score of 0."];
    instructions.extend_from_slice(template.criteria);
    instructions.push("Score must be a number from 0 to 10.");
    let instructions = instructions
        .iter()
        .map(|line| format!("- {}", line))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"{examiner}

{reference_intro}
{context}

{task_line}

Question: {question}
Model Answer (if available): {model_answer}

Student's Answer:
"""{student_answer}"""

Instructions:
{instructions}

Respond in this exact format:
Score: <number>
Feedback: <your comment>
"#,
        examiner = template.examiner,
        reference_intro = template.reference_intro,
        context = context,
        task_line = template.task_line,
        question = question,
        model_answer = model_answer,
        student_answer = student_answer,
        instructions = instructions,
    )
}
