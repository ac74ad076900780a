//! AI 出题流程 - 业务能力层
//!
//! 材料记录 → 下载 → 解码 → 拼接 → 截断 → 生成 → 打包成文本文件

use std::sync::Arc;

use futures::future::join_all;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::GenerationError;
use crate::infrastructure::{ConversationChannel, OrgFileRepository};
use crate::models::{FileKind, FileRecord, GeneratedTest, QuestionCount};
use crate::services::question_generator::QuestionGenerator;
use crate::services::text_decoder::TextDecoder;
use crate::utils::logging::truncate_text;

/// 触发生成的按钮文本前缀
pub const GENERATE_PREFIX: &str = "Згенерувати";

/// 打包好的生成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub file_name: String,
    pub caption: String,
    pub test: GeneratedTest,
}

impl GeneratedArtifact {
    fn new(content: String, count: QuestionCount) -> Self {
        Self {
            file_name: format!("Згенерований_тест_{}_питань.txt", count),
            caption: format!("✅ Тест з {} питань успішно згенеровано!", count),
            test: GeneratedTest {
                content,
                question_count: count,
            },
        }
    }

    /// 文件内容（UTF-8）
    pub fn bytes(&self) -> Vec<u8> {
        self.test.content.as_bytes().to_vec()
    }
}

/// 从按钮文本中解析题目数量
///
/// 取第一个数字；不在 {10, 20, 30, 40} 中的一律视为 `UnsupportedCount`
pub fn parse_question_count(text: &str) -> Result<QuestionCount, GenerationError> {
    let unsupported = || GenerationError::UnsupportedCount {
        requested: text.trim().to_string(),
    };

    let re = Regex::new(r"(\d+)").map_err(|_| unsupported())?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .and_then(QuestionCount::from_u32)
        .ok_or_else(unsupported)
}

/// AI 出题流程
///
/// 职责：
/// - 检查材料是否存在（不假设只有一个）
/// - 并发下载并解码全部材料，保持记录顺序
/// - 只把前 `prefix_chars` 个字符交给生成器
/// - 不发送消息，发送由对话层负责
pub struct TestGenerationPipeline {
    repo: Arc<dyn OrgFileRepository>,
    channel: Arc<dyn ConversationChannel>,
    generator: Arc<dyn QuestionGenerator>,
    decoder: TextDecoder,
    prefix_chars: usize,
}

impl TestGenerationPipeline {
    pub fn new(
        repo: Arc<dyn OrgFileRepository>,
        channel: Arc<dyn ConversationChannel>,
        generator: Arc<dyn QuestionGenerator>,
        prefix_chars: usize,
    ) -> Self {
        Self {
            repo,
            channel,
            generator,
            decoder: TextDecoder::new(),
            prefix_chars,
        }
    }

    /// 生成器是否可用
    pub fn is_available(&self) -> bool {
        self.generator.is_configured()
    }

    /// 取出组织的全部材料，没有则返回 `NoMaterialsUploaded`
    pub async fn load_materials(&self, org_id: i64) -> Result<Vec<FileRecord>, GenerationError> {
        let materials = self.repo.list_files(org_id, FileKind::Material).await?;
        if materials.is_empty() {
            return Err(GenerationError::NoMaterialsUploaded);
        }
        debug!("组织 {} 共有 {} 份材料", org_id, materials.len());
        Ok(materials)
    }

    /// 下载并拼接材料文本，每份后面跟一个空行
    ///
    /// 下载或解码失败的文件按空内容处理
    pub async fn collect_material_text(&self, materials: &[FileRecord]) -> String {
        let downloads = materials.iter().map(|record| async move {
            match self.channel.fetch_blob(&record.blob_ref).await {
                Ok(bytes) => self.decoder.decode(&bytes),
                Err(e) => {
                    warn!("⚠️ 材料 {} 下载失败: {}", record.display_name, e);
                    String::new()
                }
            }
        });

        let mut combined = String::new();
        for text in join_all(downloads).await {
            combined.push_str(&text);
            combined.push_str("\n\n");
        }
        combined
    }

    /// 根据材料生成测试
    pub async fn generate(
        &self,
        materials: &[FileRecord],
        count: QuestionCount,
    ) -> Result<GeneratedArtifact, GenerationError> {
        let combined = self.collect_material_text(materials).await;
        if combined.trim().is_empty() {
            return Err(GenerationError::EmptyMaterialContent);
        }

        let prefix: String = combined.chars().take(self.prefix_chars).collect();
        debug!("材料内容: {}", truncate_text(&prefix, 100));

        info!("🤖 开始生成 {} 道题，材料 {} 字符", count, prefix.chars().count());
        let content = self.generator.generate(&prefix, count).await?;
        info!("✅ 生成完成，结果 {} 字符", content.chars().count());

        Ok(GeneratedArtifact::new(content, count))
    }
}
