//! 基于 LLM 的评分适配器
//!
//! 按评分细则构建提示词，调用 [`LlmService`]，再把模型回复解析成 [`RubricScore`]。

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::error::AdapterError;
use crate::models::{ScoringScale, CRITERIA_COUNT, CRITERIA_NAMES};
use crate::services::llm_service::LlmService;
use crate::services::scoring::{RubricScore, ScoringAdapter, ScoringRequest, FALLBACK_COMMENT};

/// LLM 评分器
pub struct LlmScorer {
    llm_service: LlmService,
    system_prompt: String,
}

impl LlmScorer {
    /// 创建评分器，提示词中的分值上限取自部署的评分尺度
    pub fn new(config: &Config) -> Self {
        Self {
            llm_service: LlmService::new(config),
            system_prompt: build_system_prompt(config.scoring_scale),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

#[async_trait]
impl ScoringAdapter for LlmScorer {
    async fn score(&self, request: &ScoringRequest) -> Result<RubricScore, AdapterError> {
        let user_prompt = build_user_prompt(request)?;
        let reply = self
            .llm_service
            .send_to_llm(&user_prompt, Some(&self.system_prompt))
            .await?;
        debug!(
            "模型 {} 返回 {} 字符",
            self.llm_service.model_name(),
            reply.len()
        );
        parse_evaluation(&reply)
    }
}

/// 构建系统提示词
pub fn build_system_prompt(scale: ScoringScale) -> String {
    let rubric: Vec<String> = CRITERIA_NAMES
        .iter()
        .zip(scale.maxima())
        .enumerate()
        .map(|(i, (name, max))| format!("{}. {} (máx. {} puntos)", i + 1, name, max))
        .collect();

    format!(
        r#"Eres un asistente educativo experto para evaluar entregas de programación.

Recibirás un objeto JSON con los siguientes campos:
- "nombre": nombre del estudiante
- "enunciado": consigna completa a evaluar (texto literal)
- "resolucion": texto enviado por el estudiante, que puede contener enlaces a código (por ejemplo, GitHub o Colab).

Debes:
- Comparar cuidadosamente la resolución del estudiante con el enunciado recibido.
- Si la resolución incluye enlaces, accede al código real en ellos (si es accesible) y analiza su contenido como parte de la evaluación. Si algún enlace no es accesible, acláralo en el comentario.
- Evalúa aplicando la siguiente rúbrica:

{}

Asigna un puntaje único a cada criterio, suma el total y justifica la calificación con un comentario claro y breve.

Devuelve SIEMPRE solo un objeto JSON bajo este JSON Schema:

{{
  "type": "object",
  "properties": {{
    "nombre": {{"type": "string"}},
    "calificacion": {{
      "type": "object",
      "properties": {{
        "total": {{"type": "integer"}},
        "detalle": {{
          "type": "array",
          "items": {{"type": "integer"}},
          "minItems": {count},
          "maxItems": {count}
        }}
      }},
      "required": ["total", "detalle"]
    }},
    "comentarios": {{"type": "string"}}
  }},
  "required": ["nombre", "calificacion", "comentarios"]
}}

No agregues texto antes ni después del JSON."#,
        rubric.join("\n"),
        count = CRITERIA_COUNT,
    )
}

/// 构建用户提示词
pub fn build_user_prompt(request: &ScoringRequest) -> Result<String, AdapterError> {
    let payload = json!({
        "nombre": request.student_name,
        "enunciado": request.assignment_context,
        "resolucion": request.submission_text,
    });
    let payload = serde_json::to_string_pretty(&payload)
        .map_err(|e| AdapterError::Malformed(e.to_string()))?;

    Ok(format!(
        "Evalúa la siguiente entrega usando el enunciado, la rúbrica y la resolución. \
         Devuelve solo el JSON requerido.\n\nDatos de la entrega:\n{}",
        payload
    ))
}

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    calificacion: Option<RawScore>,
    comentarios: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawScore {
    total: i32,
    detalle: Vec<i32>,
}

/// 去掉 Markdown 代码块包裹，只保留其中内容
pub fn strip_code_fence(reply: &str) -> Result<&str, AdapterError> {
    let fence = Regex::new(r"(?s)```(?:json)?(.*?)```")
        .map_err(|e| AdapterError::Malformed(e.to_string()))?;
    Ok(match fence.captures(reply).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => reply.trim(),
    })
}

/// 解析模型回复
///
/// 缺少 `comentarios` 时使用默认评语；缺少 `calificacion`
/// 或明细不是4项时视为无法解析。
pub fn parse_evaluation(reply: &str) -> Result<RubricScore, AdapterError> {
    let body = strip_code_fence(reply)?;
    let raw: RawEvaluation =
        serde_json::from_str(body).map_err(|e| AdapterError::Malformed(e.to_string()))?;

    let score = raw
        .calificacion
        .ok_or_else(|| AdapterError::Malformed("缺少 calificacion 字段".to_string()))?;

    let breakdown: [i32; CRITERIA_COUNT] = score.detalle.try_into().map_err(|d: Vec<i32>| {
        AdapterError::Malformed(format!("detalle 应有 {} 项，实际 {} 项", CRITERIA_COUNT, d.len()))
    })?;

    Ok(RubricScore {
        total: score.total,
        breakdown,
        comment: raw
            .comentarios
            .unwrap_or_else(|| FALLBACK_COMMENT.to_string()),
    })
}
