//! LLM 分析引擎 - 基础设施层
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（Groq、OpenRouter 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::clients::prompts;
use crate::clients::traits::TextAnalysisEngine;
use crate::config::{Config, SectionHeaders};
use crate::error::{ClientError, ClientResult};

/// 基于聊天补全接口的分析引擎
pub struct LlmAnalysisEngine {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
    sections: SectionHeaders,
}

impl LlmAnalysisEngine {
    /// 创建新的分析引擎，`sections` 需与解析器使用同一份
    pub fn new(config: &Config, sections: SectionHeaders) -> Self {
        if config.llm_api_key.is_empty() {
            warn!("LLM_API_KEY 未配置，分析调用将会失败");
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
            sections,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已 trim）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> ClientResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let llm_err = |e| ClientError::llm(&self.model_name, e);

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(llm_err)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(llm_err)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(llm_err)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            llm_err(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                ClientError::EmptyResponse(format!("LLM 返回内容为空 (模型: {})", self.model_name))
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl TextAnalysisEngine for LlmAnalysisEngine {
    async fn analyze(&self, batch_lines: &[String], shared_context: &str) -> ClientResult<String> {
        if batch_lines.is_empty() {
            return Err(ClientError::Other("没有提供任何评论".to_string()));
        }
        let prompt = prompts::build_analysis_prompt(&self.sections, batch_lines, shared_context);
        self.send_to_llm(&prompt, Some(prompts::ANALYSIS_SYSTEM_MESSAGE)).await
    }

    async fn summarize_context(&self, context: &str) -> ClientResult<String> {
        let prompt = prompts::build_summary_prompt(context);
        self.send_to_llm(&prompt, Some(prompts::SUMMARY_SYSTEM_MESSAGE)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ResponseParser;

    fn create_test_engine() -> LlmAnalysisEngine {
        let config = Config::from_env();
        LlmAnalysisEngine::new(&config, SectionHeaders::default())
    }

    #[tokio::test]
    async fn test_analyze_rejects_empty_batch() {
        let engine = create_test_engine();
        let result = engine.analyze(&[], "context").await;
        assert!(matches!(result, Err(ClientError::Other(_))));
    }

    /// 需要真实的 LLM_API_KEY：
    /// ```bash
    /// cargo test test_analyze_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_analyze_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let engine = create_test_engine();
        let lines = vec![
            "Auteur: Alice | Date: 2024-05-01 | Commentaire: \"Super tuto, merci !\"",
            "Auteur: Bob | Date: 2024-05-02 | Commentaire: \"Le son est trop faible à la fin\"",
            "Auteur: Chloé | Date: 2024-05-02 | Commentaire: \"Comment faire l'effet à 2:10 ?\"",
        ]
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();

        let raw = engine
            .analyze(&lines, "Tutoriel de montage vidéo.")
            .await
            .expect("LLM 调用失败");
        println!("{}", raw);

        let parsed = ResponseParser::default().parse(&raw);
        assert!(!parsed.is_empty());
    }
}
