//! 题目生成能力接口
//!
//! 核心逻辑只依赖这个 trait，具体实现见 `LlmService`

use async_trait::async_trait;

use crate::error::GeneratorError;
use crate::models::QuestionCount;

/// 题目生成器
///
/// 输入材料文本和题目数量，输出编号题目 + 四个选项 + 正确答案的文本块。
/// 输出不做校验，原样交给用户
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// 是否已配置（例如是否提供了 API Key）
    fn is_configured(&self) -> bool;

    async fn generate(&self, text: &str, count: QuestionCount) -> Result<String, GeneratorError>;
}
