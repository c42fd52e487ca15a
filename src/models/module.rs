//! 评分模块
//!
//! 五个已知模块及其固定配置：路由名、文件名、模型、采样温度、方法标记、提示词模板

use crate::models::prompt_template::PromptTemplate;

/// 拥有独立语料、提示词模板和模型的课程模块
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum GradingModule {
    /// C 语言程序设计
    CProgramming,
    /// 数据库
    Database,
    /// Python 程序设计
    PythonProgramming,
    /// 风险管理
    RiskManagement,
    /// Java 面向对象程序设计
    OopJava,
}

impl GradingModule {
    /// 所有已知模块，按注册顺序
    pub const ALL: [GradingModule; 5] = [
        GradingModule::CProgramming,
        GradingModule::Database,
        GradingModule::PythonProgramming,
        GradingModule::RiskManagement,
        GradingModule::OopJava,
    ];

    /// 路由键，与试卷中保存的名称完全一致
    pub fn name(self) -> &'static str {
        match self {
            GradingModule::CProgramming => "C Programming Module",
            GradingModule::Database => "Database Module",
            GradingModule::PythonProgramming => "Python Programming",
            GradingModule::RiskManagement => "Risk management",
            GradingModule::OopJava => "OOP Java Module",
        }
    }

    /// 文件路径中使用的短名
    pub fn slug(self) -> &'static str {
        match self {
            GradingModule::CProgramming => "cprog",
            GradingModule::Database => "database",
            GradingModule::PythonProgramming => "python",
            GradingModule::RiskManagement => "risk",
            GradingModule::OopJava => "java",
        }
    }

    /// 该模块使用的模型
    pub fn model_name(self) -> &'static str {
        match self {
            GradingModule::CProgramming | GradingModule::PythonProgramming => "deepseek-coder:6.7b",
            GradingModule::Database => "mistral:7b",
            GradingModule::RiskManagement => "llama3:8b",
            GradingModule::OopJava => "codellama:13b",
        }
    }

    /// 采样温度，非零才能让重评得到不同分数
    pub fn temperature(self) -> f32 {
        match self {
            GradingModule::PythonProgramming | GradingModule::OopJava => 0.7,
            _ => 0.8,
        }
    }

    /// 该模块评分结果附带的方法标记
    pub fn method(self) -> &'static str {
        match self {
            GradingModule::CProgramming | GradingModule::PythonProgramming => "deepseek-rag",
            GradingModule::Database => "mistral-rag",
            GradingModule::RiskManagement => "llama-rag",
            GradingModule::OopJava => "java-rag",
        }
    }

    pub fn corpus_file_name(self) -> String {
        format!("{}_questions.json", self.slug())
    }

    pub fn template(self) -> &'static PromptTemplate {
        match self {
            GradingModule::CProgramming => &C_PROGRAMMING_TEMPLATE,
            GradingModule::Database => &DATABASE_TEMPLATE,
            GradingModule::PythonProgramming => &PYTHON_TEMPLATE,
            GradingModule::RiskManagement => &RISK_TEMPLATE,
            GradingModule::OopJava => &JAVA_TEMPLATE,
        }
    }
}

impl std::fmt::Display for GradingModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ========== 提示词模板 ==========

static C_PROGRAMMING_TEMPLATE: PromptTemplate = PromptTemplate {
    examiner: "You are an expert C programming examiner.",
    reference_intro: "Use the reference below to help evaluate the answer:",
    task_line: "Evaluate the student's answer to the following C programming question ONLY:",
    criteria: &[
        "Evaluate based on clarity, correctness of syntax/logic, and completeness.",
        "Give helpful, specific feedback to help the student improve.",
    ],
};

static DATABASE_TEMPLATE: PromptTemplate = PromptTemplate {
    examiner: "You are an expert DBMS examiner.",
    reference_intro: "Use the reference below to help evaluate the answer:",
    task_line: "Evaluate the student's answer to the following question ONLY:",
    criteria: &[
        "Evaluate the response based on clarity, completeness, and correctness.",
        "Give helpful, specific feedback to help the student improve.",
        "Do NOT refer to unrelated topics like banking unless explicitly stated.",
    ],
};

static PYTHON_TEMPLATE: PromptTemplate = PromptTemplate {
    examiner: "You are an expert Python programming examiner.",
    reference_intro: "Use the reference below to help evaluate the answer:",
    task_line: "Evaluate the student's answer to the following question ONLY:",
    criteria: &[
        "Evaluate based on code correctness, logic, clarity, syntax, and relevance.",
        "Provide helpful, specific feedback that guides the student to improve.",
        "Do NOT introduce unrelated topics.",
    ],
};

static RISK_TEMPLATE: PromptTemplate = PromptTemplate {
    examiner: "You are an expert Risk Management examiner.",
    reference_intro: "Use the reference below to help evaluate the answer:",
    task_line: "Evaluate the student's answer to the following question ONLY:",
    criteria: &[
        "Evaluate the response based on clarity, completeness, and correctness.",
        "Give helpful, specific feedback to help the student improve.",
        "Do NOT refer to unrelated topics unless explicitly relevant.",
    ],
};

static JAVA_TEMPLATE: PromptTemplate = PromptTemplate {
    examiner: "You are an expert **Java Object-Oriented Programming (OOP)** examiner.",
    reference_intro: "Use the following reference material to help evaluate the student answer:",
    task_line: "Evaluate the student's answer to the question below:",
    criteria: &[
        "Evaluate based on OOP understanding, correctness, Java syntax, clarity, use of principles (like inheritance, encapsulation, etc.), and relevance.",
        "Provide constructive and specific feedback to help the student learn and improve.",
        "Avoid introducing unrelated concepts or over-correcting.",
    ],
};
