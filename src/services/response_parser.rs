//! 响应解析 - 业务能力层
//!
//! 把单批分析引擎返回的分节文本解析成 `PartialInsight`。
//!
//! ## 状态机
//!
//! ```text
//! 状态: None → Sentiment | Summary | Questions | Negative | Positive | Feedback | Keywords
//!
//! 输入行              动作
//! ─────────────────   ─────────────────────────────────────────────
//! 空行                跳过
//! 匹配某个标题前缀    flush(当前状态) → 切换到该标题状态 → 清空缓冲；
//!                     标题同行的剩余内容作为新缓冲的第一项
//! 其他行 @ None       丢弃（前言）
//! 其他行 @ 自由文本   整行（trim 后）追加到缓冲
//! 其他行 @ 列表       去掉项目符号后作为一项追加
//! 输入结束            flush(当前状态)
//! ```
//!
//! 任何输入都不会失败，最坏情况返回全空的 `PartialInsight`。

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::{InsightConfig, SectionHeaders};
use crate::models::PartialInsight;

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•+]|\d{1,3}[.)])\s+").expect("valid bullet pattern"));

static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^()]*\)\s*$").expect("valid counter pattern"));

/// 解析器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    None,
    Sentiment,
    Summary,
    Questions,
    Negative,
    Positive,
    Feedback,
    Keywords,
}

impl Section {
    fn is_free_text(self) -> bool {
        matches!(self, Section::Sentiment | Section::Summary)
    }
}

struct HeaderRule {
    section: Section,
    prefix: String,
    none_found: Option<String>,
}

/// 响应解析器（无状态，可在多次运行间复用）
pub struct ResponseParser {
    rules: Vec<HeaderRule>,
    strip_keyword_counts: bool,
}

impl ResponseParser {
    pub fn new(sections: &SectionHeaders, strip_keyword_counts: bool) -> Self {
        let rules = [
            (Section::Sentiment, &sections.sentiment),
            (Section::Summary, &sections.summary),
            (Section::Questions, &sections.questions),
            (Section::Negative, &sections.negative),
            (Section::Positive, &sections.positive),
            (Section::Feedback, &sections.feedback),
            (Section::Keywords, &sections.keywords),
        ]
        .into_iter()
        .map(|(section, spec)| HeaderRule {
            section,
            prefix: spec.header.clone(),
            none_found: spec
                .none_found
                .as_ref()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
        })
        .collect();

        Self {
            rules,
            strip_keyword_counts,
        }
    }

    pub fn from_config(config: &InsightConfig) -> Self {
        Self::new(&config.sections, config.strip_keyword_counts)
    }

    /// 解析一批的原始响应
    pub fn parse(&self, raw: &str) -> PartialInsight {
        let mut parsed = PartialInsight::default();
        let mut state = Section::None;
        let mut buffer: Vec<String> = Vec::new();
        let mut ignored = 0usize;

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some((next, rest)) = self.match_header(line) {
                self.flush(state, &mut buffer, &mut parsed);
                state = next;
                if !rest.is_empty() {
                    self.push_line(state, rest, &mut buffer);
                }
                continue;
            }

            if state == Section::None {
                ignored += 1;
                continue;
            }
            self.push_line(state, line, &mut buffer);
        }
        self.flush(state, &mut buffer, &mut parsed);

        if ignored > 0 {
            debug!("响应解析: 丢弃 {} 行标题前内容", ignored);
        }
        parsed
    }

    /// 返回匹配到的分节和标题行剩余内容
    fn match_header<'a>(&self, line: &'a str) -> Option<(Section, &'a str)> {
        self.rules.iter().find_map(|rule| {
            line.strip_prefix(rule.prefix.as_str()).map(|rest| {
                let rest = rest
                    .trim_start_matches(|c: char| matches!(c, '*' | ':' | '-') || c.is_whitespace())
                    .trim_end();
                (rule.section, rest)
            })
        })
    }

    fn push_line(&self, state: Section, line: &str, buffer: &mut Vec<String>) {
        if state.is_free_text() {
            buffer.push(line.to_string());
        } else {
            buffer.push(strip_bullet(line).to_string());
        }
    }

    fn flush(&self, state: Section, buffer: &mut Vec<String>, parsed: &mut PartialInsight) {
        let lines = std::mem::take(buffer);
        match state {
            Section::None => {}
            Section::Sentiment => parsed.sentiment = join_free_text(&lines),
            Section::Summary => parsed.summary = join_free_text(&lines),
            Section::Questions => parsed.question_comments = self.finish_list(state, lines),
            Section::Negative => parsed.negative_comments = self.finish_list(state, lines),
            Section::Positive => parsed.top_comments = self.finish_list(state, lines),
            Section::Feedback => parsed.feedback_comments = self.finish_list(state, lines),
            Section::Keywords => {
                let mut keywords = self.finish_list(state, lines);
                if self.strip_keyword_counts {
                    keywords = keywords
                        .into_iter()
                        .map(|k| COUNT_RE.replace(&k, "").trim().to_string())
                        .filter(|k| !k.is_empty())
                        .collect();
                }
                parsed.keywords = keywords;
            }
        }
    }

    /// 列表收尾：去空项，并按哨兵规则压掉"未找到"句子
    fn finish_list(&self, state: Section, lines: Vec<String>) -> Vec<String> {
        let items: Vec<String> = lines
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        if let [only] = items.as_slice() {
            if self.is_sentinel(state, only) {
                return Vec::new();
            }
        }
        items
    }

    fn is_sentinel(&self, state: Section, item: &str) -> bool {
        let Some(phrase) = self
            .rules
            .iter()
            .find(|rule| rule.section == state)
            .and_then(|rule| rule.none_found.as_deref())
        else {
            return false;
        };
        item.trim_matches(|c: char| c == '"' || c == '*' || c.is_whitespace())
            .to_lowercase()
            .starts_with(phrase)
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(&SectionHeaders::default(), true)
    }
}

fn strip_bullet(line: &str) -> &str {
    match BULLET_RE.find(line) {
        Some(m) => line[m.end()..].trim(),
        None => line,
    }
}

fn join_free_text(lines: &[String]) -> String {
    lines.join(" ").trim().to_string()
}
