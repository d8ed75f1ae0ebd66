//! 提交内容抽取服务 - 业务能力层
//!
//! 只负责"从页面标记中读出提交内容"能力：
//! 按文档顺序扫描讨论卡片，把作者名与名单匹配键不区分大小写地比较，
//! 每个匹配键最多绑定一次（保留第一次出现）。

use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::error::{AppResult, GraderError};

/// 匹配键 → 规范化后的提交文本
pub type SubmissionMap = BTreeMap<String, String>;

/// 站内导航链接前缀，不属于提交内容
const INTERNAL_LINK_PREFIXES: [&str; 5] = ["/user/", "/comment/", "/discussion/", "/likes/", "/course/"];

/// 附件段落标题
const ATTACHMENTS_HEADER: &str = "Adjuntos:\n";

struct CardSelectors {
    card: Selector,
    author: Selector,
    body: Selector,
    paragraph: Selector,
    link: Selector,
    attachment: Selector,
}

impl CardSelectors {
    fn compile() -> AppResult<Self> {
        Ok(Self {
            card: parse_selector("div.discussion-card")?,
            author: parse_selector("span.comment-author")?,
            body: parse_selector("div.comment-body-wrapper")?,
            paragraph: parse_selector("p")?,
            link: parse_selector("a[href]")?,
            attachment: parse_selector("div.attachments-link-summary")?,
        })
    }
}

fn parse_selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|e| GraderError::StructuralParse(format!("{}: {}", css, e)))
}

/// 从页面标记中抽取提交内容
///
/// # 参数
/// - `markup`: 讨论页的完整标记
/// - `match_keys`: 名单匹配键（按名单顺序）
///
/// # 返回
/// 匹配键到提交文本的映射；没有卡片的匹配键不会出现在结果中
pub fn extract(markup: &str, match_keys: &[String]) -> AppResult<SubmissionMap> {
    let selectors = CardSelectors::compile()?;
    let document = Html::parse_document(markup);

    if !document.errors.is_empty() {
        warn!("⚠️ 页面标记存在 {} 处语法问题，已按容错方式解析", document.errors.len());
    }

    let mut consumed: HashSet<usize> = HashSet::new();
    let mut submissions = SubmissionMap::new();

    for card in document.select(&selectors.card) {
        let Some(author_tag) = card.select(&selectors.author).next() else {
            continue;
        };
        let author = author_tag.text().collect::<String>();
        let author = author.trim().to_uppercase();

        let matched = match_keys
            .iter()
            .enumerate()
            .find(|(i, key)| !consumed.contains(i) && key.to_uppercase() == author);

        if let Some((index, key)) = matched {
            consumed.insert(index);
            let text = card_submission_text(card, &selectors);
            debug!("匹配到 {}，提交内容 {} 字符", key, text.chars().count());
            submissions.insert(key.clone(), text);
        }
    }

    Ok(submissions)
}

/// 抽取失败时记录警告并返回空映射，调用方继续把所有学生视为未提交
pub fn extract_or_empty(markup: &str, match_keys: &[String]) -> SubmissionMap {
    match extract(markup, match_keys) {
        Ok(submissions) => submissions,
        Err(e) => {
            warn!("⚠️ 抽取提交内容失败，所有学生按未提交处理: {}", e);
            SubmissionMap::new()
        }
    }
}

fn card_submission_text(card: ElementRef<'_>, selectors: &CardSelectors) -> String {
    let (body_text, links) = match card.select(&selectors.body).next() {
        Some(body) => {
            let paragraphs: Vec<String> = body
                .select(&selectors.paragraph)
                .map(normalized_text)
                .filter(|t| !t.is_empty())
                .collect();
            let links: Vec<String> = body
                .select(&selectors.link)
                .filter_map(|a| a.value().attr("href"))
                .filter(|href| !is_internal_link(href))
                .map(str::to_string)
                .collect();
            (paragraphs.join(" "), links)
        }
        None => (String::new(), Vec::new()),
    };

    let attachments: Vec<String> = card
        .select(&selectors.attachment)
        .map(normalized_text)
        .collect();

    compose_submission(&body_text, merge_links(links, attachments))
}

fn is_internal_link(href: &str) -> bool {
    INTERNAL_LINK_PREFIXES
        .iter()
        .any(|prefix| href.starts_with(prefix))
}

/// 元素内所有文本节点去除首尾空白后用单个空格连接
fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 合并正文链接和附件，按首次出现顺序去重，正文链接在前
pub fn merge_links(inline: Vec<String>, attachments: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    inline
        .into_iter()
        .chain(attachments)
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// 正文加可选的附件段落，结果去除首尾空白
pub fn compose_submission(body_text: &str, links: Vec<String>) -> String {
    let mut text = body_text.to_string();
    if !links.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(ATTACHMENTS_HEADER);
        text.push_str(&links.join("\n"));
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    const BASIC: &str = r#"
    <div class='discussion-card'>
        <span class='comment-author'>John Doe</span>
        <div class='comment-body-wrapper'>
            <p>Hello</p>
            <p>World</p>
            <a href='https://example.com/doc.txt'>doc</a>
            <a href='/user/123'>ignore</a>
        </div>
        <div class='attachments-link-summary'>https://example.com/img.png</div>
    </div>
    <div class='discussion-card'>
        <span class='comment-author'>Someone Else</span>
        <div class='comment-body-wrapper'><p>Other</p></div>
    </div>
    "#;

    #[test]
    fn test_extract_basic_card() {
        let result = extract(BASIC, &keys(&["John Doe"])).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            result["John Doe"],
            "Hello World\nAdjuntos:\nhttps://example.com/doc.txt\nhttps://example.com/img.png"
        );
    }

    #[test]
    fn test_extract_ignores_unlisted_authors() {
        let html = r#"
        <div class='discussion-card'>
            <span class='comment-author'>Jane Doe</span>
            <div class='comment-body-wrapper'><p>Hi</p></div>
        </div>"#;
        let result = extract(html, &keys(&["John Doe"])).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_extract_matches_case_insensitively() {
        let html = r#"
        <div class='discussion-card'>
            <span class='comment-author'>  JOHN doe </span>
            <div class='comment-body-wrapper'><p>Hola</p></div>
        </div>"#;
        let result = extract(html, &keys(&["John Doe"])).unwrap();
        assert_eq!(result["John Doe"], "Hola");
    }

    #[test]
    fn test_first_card_wins_for_repeated_author() {
        let html = r#"
        <div class='discussion-card'>
            <span class='comment-author'>Ana Pérez</span>
            <div class='comment-body-wrapper'><p>primera</p></div>
        </div>
        <div class='discussion-card'>
            <span class='comment-author'>Ana Pérez</span>
            <div class='comment-body-wrapper'><p>segunda</p></div>
        </div>"#;
        let result = extract(html, &keys(&["Ana Pérez"])).unwrap();
        assert_eq!(result["Ana Pérez"], "primera");
    }

    #[test]
    fn test_attachment_only_submission() {
        let html = r#"
        <div class='discussion-card'>
            <span class='comment-author'>John Doe</span>
            <div class='attachments-link-summary'>tp1.py</div>
        </div>"#;
        let result = extract(html, &keys(&["John Doe"])).unwrap();
        assert_eq!(result["John Doe"], "Adjuntos:\ntp1.py");
    }

    #[test]
    fn test_internal_links_never_present() {
        let html = r#"
        <div class='discussion-card'>
            <span class='comment-author'>John Doe</span>
            <div class='comment-body-wrapper'>
                <p>Mi entrega</p>
                <a href='/user/1'>u</a><a href='/comment/2'>c</a><a href='/discussion/3'>d</a>
                <a href='/likes/4'>l</a><a href='/course/5'>k</a>
            </div>
        </div>"#;
        let result = extract(html, &keys(&["John Doe"])).unwrap();
        assert_eq!(result["John Doe"], "Mi entrega");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let roster = keys(&["John Doe", "Jane Doe"]);
        let first = extract(BASIC, &roster).unwrap();
        let second = extract(BASIC, &roster).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_merge_links_dedup_keeps_first_seen_order() {
        let merged = merge_links(keys(&["L1", "L2", "L1"]), keys(&["L3"]));
        assert_eq!(merged, keys(&["L1", "L2", "L3"]));

        let merged = merge_links(keys(&["L1"]), keys(&["L2", "L1"]));
        assert_eq!(merged, keys(&["L1", "L2"]));
    }

    #[test]
    fn test_compose_without_links() {
        assert_eq!(compose_submission("  texto  ", Vec::new()), "texto");
        assert_eq!(compose_submission("", Vec::new()), "");
    }

    #[test]
    fn test_tolerated_syntax_errors_still_extract() {
        let html = r#"
        <div class='discussion-card'>
            <span class='comment-author'>John Doe</span>
            <div class='comment-body-wrapper'><p>Hola mundo</p></div>
        </div>
        </span></td>"#;
        let document = Html::parse_document(html);
        assert!(!document.errors.is_empty());

        let result = extract(html, &keys(&["John Doe"])).unwrap();
        assert_eq!(result["John Doe"], "Hola mundo");
    }

    #[test]
    fn test_extract_or_empty_on_garbage_markup() {
        let result = extract_or_empty("<<<>>> </div></span>", &keys(&["John Doe"]));
        assert!(result.is_empty());
    }
}
