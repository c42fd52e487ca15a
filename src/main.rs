use anyhow::{bail, Context, Result};
use rag_grader::utils::logging;
use rag_grader::{Config, Grader, Submission};

const USAGE: &str = "usage:
  rag-grader --list
  rag-grader --warm-up
  rag-grader <module> <question> <student answer> [model answer] [mark]";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // 日志级别由配置决定
    let config = Config::load().context("加载配置失败")?;
    logging::init(config.verbose_logging);

    match args.first().map(String::as_str) {
        None | Some("-h") | Some("--help") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some("--list") => {
            for module in rag_grader::orchestrator::supported_module_ids() {
                println!("{}", module);
            }
            Ok(())
        }
        Some("--warm-up") => {
            let grader = Grader::initialize(config)?;
            let report = grader.warm_up().await;
            for (module, err) in &report.failed {
                eprintln!("{}: {}", module, err);
            }
            if !report.all_ready() {
                bail!("{} 个模块构建失败", report.failed.len());
            }
            Ok(())
        }
        Some(_) => grade_from_args(config, &args).await,
    }
}

async fn grade_from_args(config: Config, args: &[String]) -> Result<()> {
    let (module, question, student_answer) = match args {
        [module, question, answer, ..] => (module, question, answer),
        _ => bail!("expected <module> <question> <student answer>\n{}", USAGE),
    };
    let model_answer = args.get(3).filter(|a| !a.trim().is_empty()).cloned();
    let mark = args
        .get(4)
        .map(|m| m.parse::<f64>().with_context(|| format!("分值无效: {}", m)))
        .transpose()?;

    let grader = Grader::initialize(config)?;
    let submission = Submission {
        module: module.clone(),
        question: question.clone(),
        model_answer,
        student_answer: student_answer.clone(),
        question_mark: mark.unwrap_or(rag_grader::models::MAX_SCORE),
    };
    let graded = grader.grade_submission(&submission).await?;

    println!("Score: {}", graded.result.score);
    println!("Feedback: {}", graded.result.feedback);
    println!("Method: {}", graded.result.method);
    println!("Retry Count: {}", graded.result.retry_count);
    if let Some(mark) = mark {
        println!("Awarded: {:.2} / {}", graded.awarded_marks, mark);
    }
    Ok(())
}
