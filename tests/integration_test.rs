use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use submission_grader::config::Config;
use submission_grader::error::AdapterError;
use submission_grader::infrastructure::render_records;
use submission_grader::models::loaders::{load_batch, load_courses, load_prompts, prompt_path_for_course};
use submission_grader::models::{AssignmentPromptSet, Resolution, ScoringScale};
use submission_grader::orchestrator::{BatchOptions, BatchProcessor, GradingSession};
use submission_grader::services::{
    LlmScorer, RubricScore, ScoringAdapter, ScoringRequest, WarnWriter,
};
use submission_grader::utils::logging;
use submission_grader::workflow::GradingFlow;
use submission_grader::BatchStore;

const MARKUP: &str = r#"
<html><body>
<div class='discussion-card'>
    <span class='comment-author'>John Doe</span>
    <div class='comment-body-wrapper'>
        <p>Hello</p>
        <p>World</p>
        <a href='https://example.com/doc.txt'>doc</a>
        <a href='/user/42'>perfil</a>
    </div>
    <div class='attachments-link-summary'>https://example.com/img.png</div>
</div>
<div class='discussion-card'>
    <span class='comment-author'>Ana Gómez</span>
    <div class='comment-body-wrapper'><p>def suma(a, b): return a + b</p></div>
</div>
</body></html>
"#;

const COURSES: &str = r#"[
    {"id": 7, "curso": "Programación I", "centro": "Centro Norte", "slug": "programacion1",
     "estudiantes": [{"nombre_crea": "John Doe", "dni": "1"}, {"nombre_crea": "Jane Doe"}, {"nombre_crea": "Ana Gómez"}]},
    {"id": "8", "curso": "Vacío", "centro": "", "slug": "", "estudiantes": []}
]"#;

const PROMPTS: &str = r#"{"tarea1": "Escriba un programa que salude"}"#;

/// 按学生名给出结果的评分器，Ana 的回复不可解析
struct FakeAdapter {
    calls: AtomicUsize,
}

#[async_trait]
impl ScoringAdapter for FakeAdapter {
    async fn score(&self, request: &ScoringRequest) -> Result<RubricScore, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(request.assignment_context, "Escriba un programa que salude");
        if request.student_name == "Ana Gómez" {
            return Err(AdapterError::Malformed("respuesta sin JSON".to_string()));
        }
        Ok(RubricScore {
            total: 18,
            breakdown: [6, 5, 4, 3],
            comment: "Buen trabajo".to_string(),
        })
    }
}

fn flow(adapter: Arc<FakeAdapter>, prompts: AssignmentPromptSet) -> GradingFlow {
    GradingFlow::new(adapter, Arc::new(prompts), ScoringScale::Rubric)
}

#[tokio::test]
async fn test_prepare_evaluate_and_rerun() {
    logging::init(false);
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("estudiantes.json"), COURSES).unwrap();
    std::fs::write(dir.path().join("consignas_p1.json"), PROMPTS).unwrap();

    // 准备：抽取 + 对账 + 保存
    let courses = load_courses(&dir.path().join("estudiantes.json")).await.unwrap();
    let course = &courses[0];
    let prompts = load_prompts(&prompt_path_for_course(dir.path(), course)).await.unwrap();

    let session = GradingSession::start(course, &prompts, "tarea1", MARKUP).unwrap();
    let records = session.records();
    assert_eq!(records.len(), 3);
    assert_eq!(
        records[0].resolution,
        Resolution::Submitted(
            "Hello World\nAdjuntos:\nhttps://example.com/doc.txt\nhttps://example.com/img.png"
                .to_string()
        )
    );
    assert_eq!(records[1].resolution, Resolution::NotSubmitted);

    let batch_path = session.save(&BatchStore::new(dir.path().join("output"))).unwrap();
    assert!(batch_path.ends_with("programacion1/tarea1_entregas.json"));

    // 批量评分
    let adapter = Arc::new(FakeAdapter { calls: AtomicUsize::new(0) });
    let warn_path = dir.path().join("warn.txt");
    let processor = BatchProcessor::new(flow(adapter.clone(), prompts.clone()), BatchOptions::default())
        .with_warn_writer(WarnWriter::with_path(&warn_path));

    let graded_path = dir.path().join("graded").join("tarea1.json");
    let mut records = Vec::new();
    let report = processor
        .process_file(&batch_path, &graded_path, &mut records)
        .await
        .unwrap();

    assert_eq!(report.scored, 1);
    assert_eq!(report.fallback, 1);
    assert_eq!(report.auto_finalized, 1);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 2);

    let graded = load_batch(&graded_path).await.unwrap();
    assert_eq!(graded[0].score.total, 18);
    assert_eq!(graded[0].comment, "Buen trabajo");
    assert_eq!(graded[1].score.total, 0);
    assert_eq!(graded[1].comment, "");
    assert_eq!(graded[2].comment, "Evaluación completada");

    let warnings = std::fs::read_to_string(&warn_path).unwrap();
    assert!(warnings.starts_with("3 | Ana Gómez | tarea1 | "));

    // 再次运行：已评分的记录不变，也不再调用评分器
    let before = std::fs::read_to_string(&graded_path).unwrap();
    let report = processor
        .process_file(&graded_path, &graded_path, &mut records)
        .await
        .unwrap();
    let after = std::fs::read_to_string(&graded_path).unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 3);
    assert_eq!(before, after);

    let csv = render_records(&load_batch(&graded_path).await.unwrap());
    assert!(csv.contains("John Doe,tarea1,Graded,18,6,5,4,3,Buen trabajo"));
    assert!(csv.contains("Jane Doe,tarea1,Not submitted,0,0,0,0,0,"));
}

#[tokio::test]
async fn test_markup_without_cards_marks_everyone_not_submitted() {
    let courses: Vec<submission_grader::Course> = serde_json::from_str(COURSES).unwrap();
    let prompts: AssignmentPromptSet = serde_json::from_str(PROMPTS).unwrap();

    let session = GradingSession::start(&courses[0], &prompts, "tarea1", "no es html").unwrap();

    assert_eq!(session.stats().not_submitted, 3);
    assert!(session
        .records()
        .iter()
        .all(|r| r.resolution == Resolution::NotSubmitted));
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = Arc::new(FakeAdapter { calls: AtomicUsize::new(0) });
    let processor = BatchProcessor::new(flow(adapter, AssignmentPromptSet::default()), BatchOptions::default());

    let mut records = Vec::new();
    let result = tokio_test::block_on(processor.process_file(
        &dir.path().join("no_existe.json"),
        &dir.path().join("out.json"),
        &mut records,
    ));

    assert!(result.is_err());
    assert!(!dir.path().join("out.json").exists());
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_live_llm_scoring() {
    logging::init(true);
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    config.require_api_key().expect("需要 OPENAI_API_KEY");

    let scorer = LlmScorer::new(&config);
    let request = ScoringRequest {
        student_name: "John Doe".to_string(),
        submission_text: "print('Hola mundo')".to_string(),
        assignment_context: "Escriba un programa que imprima Hola mundo".to_string(),
    };

    let score = scorer.score(&request).await.expect("评分失败");
    let maxima = config.scoring_scale.maxima();
    for (value, max) in score.breakdown.iter().zip(maxima) {
        assert!((0..=max).contains(value));
    }
}
