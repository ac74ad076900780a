//! LLM 服务 - 业务能力层
//!
//! 只负责"根据材料出题"能力，不关心对话流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务

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

use crate::config::Config;
use crate::error::GeneratorError;
use crate::models::QuestionCount;
use crate::services::question_generator::QuestionGenerator;
use crate::utils::logging::truncate_text;

const SYSTEM_PROMPT: &str = "Ти - експерт з створення тестових питань для навчання. \
Створюй якісні питання на основі наданих матеріалів.";

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成测试题
/// - 提供通用的 LLM 调用接口
/// - 不截断材料，截断由生成流程负责
/// - 不校验输出格式
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
    configured: bool,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
            configured: !config.llm_api_key.trim().is_empty(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（去掉首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, GeneratorError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| GeneratorError::api_failed(&self.model_name, e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| GeneratorError::api_failed(&self.model_name, e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens)
            .build()
            .map_err(|e| GeneratorError::api_failed(&self.model_name, e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            GeneratorError::api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| GeneratorError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content)
    }
}

/// 构建出题提示词
fn build_generation_prompt(materials: &str, count: QuestionCount) -> String {
    format!(
        "На основі наступних навчальних матеріалів створи {count} тестових питань з 4 варіантами відповідей (A, B, C, D).
Для кожного питання вкажи правильну відповідь.
Формат відповіді:
1. [Питання]
A) [варіант]
B) [варіант]
C) [варіант]
D) [варіант]
Правильна відповідь: [буква]
Навчальні матеріали:
{materials}
Створи {count} питань українською мовою:"
    )
}

#[async_trait]
impl QuestionGenerator for LlmService {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, text: &str, count: QuestionCount) -> Result<String, GeneratorError> {
        if !self.configured {
            return Err(GeneratorError::NotConfigured);
        }

        let prompt = build_generation_prompt(text, count);
        let result = self.send_to_llm(&prompt, Some(SYSTEM_PROMPT)).await?;
        debug!("生成结果: {}", truncate_text(&result, 200));
        Ok(result)
    }
}
