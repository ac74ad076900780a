//! 文本解码能力 - 业务能力层
//!
//! 依次尝试 UTF-8 → Windows-1251 → Latin-1，全部失败时返回空串

use encoding_rs::WINDOWS_1251;
use tracing::debug;

/// 支持的编码（按尝试顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Windows1251,
    Latin1,
}

impl TextEncoding {
    pub const FALLBACK_ORDER: [TextEncoding; 3] = [
        TextEncoding::Utf8,
        TextEncoding::Windows1251,
        TextEncoding::Latin1,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Windows1251 => "windows-1251",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// 严格解码，有任何不可映射字节即失败
    fn decode_strict(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                std::str::from_utf8(bytes).ok().map(str::to_string)
            }
            TextEncoding::Windows1251 => WINDOWS_1251
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// 文本解码器
///
/// 严格 UTF-8 解码成功即接受；两种回退编码要求内容不含 NUL，
/// 因此二进制内容会返回空串
#[derive(Debug, Default, Clone, Copy)]
pub struct TextDecoder;

impl TextDecoder {
    pub fn new() -> Self {
        Self
    }

    /// 解码并返回使用的编码
    pub fn decode_with_encoding(&self, bytes: &[u8]) -> Option<(String, TextEncoding)> {
        TextEncoding::FALLBACK_ORDER.into_iter().find_map(|encoding| {
            encoding
                .decode_strict(bytes)
                .filter(|_| encoding == TextEncoding::Utf8 || !looks_binary(bytes))
                .map(|text| (text, encoding))
        })
    }

    /// 解码，失败返回空串
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self.decode_with_encoding(bytes) {
            Some((text, encoding)) => {
                debug!("按 {} 解码成功，{} 字符", encoding.label(), text.chars().count());
                text
            }
            None => {
                debug!("{} 字节内容无法按任何编码解码", bytes.len());
                String::new()
            }
        }
    }
}

/// 单字节编码能解码任何内容，只能靠 NUL 识别二进制
fn looks_binary(bytes: &[u8]) -> bool {
    bytes.contains(&0)
}
