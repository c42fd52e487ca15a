use serde::{Deserialize, Serialize};

/// 参考文档的元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub question_id: String,
}

/// 模块语料中的一条（题目，参考答案）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    /// 在已加载语料中的位置
    pub id: usize,
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl ReferenceDocument {
    pub fn new(id: usize, question: &str, model_answer: &str, question_id: impl Into<String>) -> Self {
        Self {
            id,
            content: format!("Question: {}\nAnswer: {}", question, model_answer),
            metadata: DocumentMetadata {
                question_id: question_id.into(),
            },
        }
    }
}

/// 语料文件中的原始记录
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusRecord {
    #[serde(rename = "Question")]
    pub question: String,
    #[serde(rename = "Model Answer", default)]
    pub model_answer: Option<String>,
    #[serde(rename = "Question ID", deserialize_with = "deserialize_question_id")]
    pub question_id: String,
}

// 语料文件里的 Question ID 既有字符串也有整数
fn deserialize_question_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct QuestionIdVisitor;

    impl<'de> Visitor<'de> for QuestionIdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer question id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(QuestionIdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_joins_question_and_answer() {
        let doc = ReferenceDocument::new(0, "What is a view?", "A virtual table.", "DB-7");
        assert_eq!(doc.content, "Question: What is a view?\nAnswer: A virtual table.");
        assert_eq!(doc.metadata.question_id, "DB-7");
    }

    #[test]
    fn question_id_accepts_integers() {
        let record: CorpusRecord = serde_json::from_str(
            r#"{"Question": "q", "Model Answer": "a", "Question ID": 42}"#,
        )
        .unwrap();
        assert_eq!(record.question_id, "42");
    }
}
