//! 响应解析 - 能力层
//!
//! 解析永不失败。不遵守 `Score:` / `Feedback:` 格式的响应得到 `0.0` / `"No feedback."`
//! 默认值，反思循环把它当作普通低分处理。

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

pub const DEFAULT_SCORE: f64 = 0.0;
pub const DEFAULT_FEEDBACK: &str = "No feedback.";

static SCORE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)score[:=]?\s*(\d+(?:\.\d+)?)").expect("分数正则合法")
});

/// 从模型原始文本中提取 `(score, feedback)`
pub fn parse_response(response: &str) -> (f64, String) {
    let score = extract_score(response).unwrap_or_else(|| {
        warn!("⚠️ 模型响应中没有分数，使用默认值 {}", DEFAULT_SCORE);
        DEFAULT_SCORE
    });

    let feedback = extract_feedback(response).unwrap_or_else(|| {
        warn!("⚠️ 模型响应中没有 Feedback 行，使用默认评语");
        DEFAULT_FEEDBACK.to_string()
    });

    (score, feedback)
}

/// 第一个 `score` 词，后跟可选的 `:`/`=` 和一个十进制数
fn extract_score(response: &str) -> Option<f64> {
    SCORE_PATTERN
        .captures(response)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 第一行以 `feedback` 开头的行中，第一个冒号之后的文本（可以为空）
///
/// 没有冒号时取 `feedback` 之后去掉分隔符的文本，为空则视为没有评语
fn extract_feedback(response: &str) -> Option<String> {
    let line = response
        .trim()
        .lines()
        .find(|line| line.to_lowercase().starts_with("feedback"))?;

    match line.split_once(':') {
        Some((_, rest)) => Some(rest.trim().to_string()),
        // "Feedback - text" 或 "Feedback text"
        None => {
            let text = line
                .get("feedback".len()..)
                .unwrap_or("")
                .trim_start_matches(|c: char| !c.is_alphanumeric())
                .trim();
            (!text.is_empty()).then(|| text.to_string())
        }
    }
}
