//! 按钮文本与键盘布局
//!
//! 按钮文本只出现在这里，其余代码只认 `MenuCommand`

use phf::phf_map;

use crate::infrastructure::{InlineButton, Keyboard};
use crate::models::{FileKind, QuestionCount};

pub const ADMIN_ROLE: &str = "👑 Я Адміністратор";
pub const USER_ROLE: &str = "🎓 Я Користувач";

pub const MATERIALS: &str = "📚 Навчальні матеріали";
pub const TESTS: &str = "🧪 Тести";
pub const EXIT: &str = "🚪 Вийти";

pub const UPLOAD_MATERIAL: &str = "📤 Завантажити матеріал";
pub const VIEW_MATERIALS: &str = "👀 Переглянути матеріали";
pub const DELETE_MATERIAL: &str = "🗑 Видалити матеріал";
pub const MAIN_MENU: &str = "🏠 Головне меню";

pub const UPLOAD_TEST: &str = "📥 Завантажити тест";
pub const VIEW_TESTS: &str = "👁 Переглянути тести";
pub const DELETE_TEST: &str = "🗑 Видалити тест";
pub const GENERATE_AI: &str = "🤖 Згенерувати тест ШІ";

pub const PREVIEW_TEST: &str = "▶️ Пройти тест (Admin)";
pub const FORWARD_TEST: &str = "📤 Направити Користувачам";
pub const REGENERATE_TEST: &str = "🔄 Оновити тест";
pub const RETURN_TO_TESTS: &str = "↩️ Повернутися в Меню тестів";

pub const GENERATE_10: &str = "Згенерувати 10 питань";
pub const GENERATE_20: &str = "Згенерувати 20 питань";
pub const GENERATE_30: &str = "Згенерувати 30 питань";
pub const GENERATE_40: &str = "Згенерувати 40 питань";

pub const CONFIRM_DELETE: &str = "✅ Так, видалити";
pub const CANCEL_DELETE: &str = "❌ Скасувати";

/// 回调数据
pub const DELETE_CALLBACK_PREFIX: &str = "delete_";
pub const CANCEL_DELETE_CALLBACK: &str = "cancel_delete";

/// 菜单命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCommand {
    ChooseAdmin,
    ChooseUser,
    OpenMaterials,
    OpenTests,
    Exit,
    Upload(FileKind),
    View(FileKind),
    Delete(FileKind),
    BackToMain,
    OpenAiMenu,
    PreviewTest,
    ForwardTest,
    RegenerateTest,
    ReturnToTests,
}

static COMMANDS: phf::Map<&'static str, MenuCommand> = phf_map! {
    "👑 Я Адміністратор" => MenuCommand::ChooseAdmin,
    "🎓 Я Користувач" => MenuCommand::ChooseUser,
    "📚 Навчальні матеріали" => MenuCommand::OpenMaterials,
    "🧪 Тести" => MenuCommand::OpenTests,
    "🚪 Вийти" => MenuCommand::Exit,
    "📤 Завантажити матеріал" => MenuCommand::Upload(FileKind::Material),
    "👀 Переглянути матеріали" => MenuCommand::View(FileKind::Material),
    "🗑 Видалити матеріал" => MenuCommand::Delete(FileKind::Material),
    "📥 Завантажити тест" => MenuCommand::Upload(FileKind::Test),
    "👁 Переглянути тести" => MenuCommand::View(FileKind::Test),
    "🗑 Видалити тест" => MenuCommand::Delete(FileKind::Test),
    "🏠 Головне меню" => MenuCommand::BackToMain,
    "🤖 Згенерувати тест ШІ" => MenuCommand::OpenAiMenu,
    "▶️ Пройти тест (Admin)" => MenuCommand::PreviewTest,
    "📤 Направити Користувачам" => MenuCommand::ForwardTest,
    "🔄 Оновити тест" => MenuCommand::RegenerateTest,
    "↩️ Повернутися в Меню тестів" => MenuCommand::ReturnToTests,
};

/// 按钮文本 → 命令（忽略首尾空白）
pub fn command_for(text: &str) -> Option<MenuCommand> {
    COMMANDS.get(text.trim()).copied()
}

/// 出题按钮文本
pub fn generate_label(count: QuestionCount) -> &'static str {
    match count {
        QuestionCount::Ten => GENERATE_10,
        QuestionCount::Twenty => GENERATE_20,
        QuestionCount::Thirty => GENERATE_30,
        QuestionCount::Forty => GENERATE_40,
    }
}

pub fn roles() -> Keyboard {
    Keyboard::Reply {
        rows: vec![vec![ADMIN_ROLE, USER_ROLE]],
        one_time: true,
    }
}

pub fn main_menu() -> Keyboard {
    Keyboard::Reply {
        rows: vec![vec![MATERIALS], vec![TESTS], vec![EXIT]],
        one_time: false,
    }
}

pub fn materials_menu() -> Keyboard {
    Keyboard::Reply {
        rows: vec![
            vec![UPLOAD_MATERIAL, VIEW_MATERIALS],
            vec![DELETE_MATERIAL, MAIN_MENU],
        ],
        one_time: false,
    }
}

pub fn tests_menu() -> Keyboard {
    Keyboard::Reply {
        rows: vec![
            vec![UPLOAD_TEST, VIEW_TESTS],
            vec![DELETE_TEST, GENERATE_AI],
            vec![MAIN_MENU],
        ],
        one_time: false,
    }
}

pub fn ai_menu() -> Keyboard {
    Keyboard::Reply {
        rows: vec![
            vec![
                generate_label(QuestionCount::Ten),
                generate_label(QuestionCount::Twenty),
            ],
            vec![
                generate_label(QuestionCount::Thirty),
                generate_label(QuestionCount::Forty),
            ],
            vec![MAIN_MENU],
        ],
        one_time: false,
    }
}

pub fn ai_actions() -> Keyboard {
    Keyboard::Reply {
        rows: vec![
            vec![PREVIEW_TEST],
            vec![FORWARD_TEST],
            vec![REGENERATE_TEST],
            vec![RETURN_TO_TESTS],
        ],
        one_time: false,
    }
}

/// 删除确认内联键盘
pub fn delete_confirmation(file_id: i64) -> Keyboard {
    Keyboard::Inline(vec![vec![
        InlineButton {
            label: CONFIRM_DELETE,
            data: format!("{DELETE_CALLBACK_PREFIX}{file_id}"),
        },
        InlineButton {
            label: CANCEL_DELETE,
            data: CANCEL_DELETE_CALLBACK.to_string(),
        },
    ]])
}
