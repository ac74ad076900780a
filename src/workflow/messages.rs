//! 发给用户的文本

use chrono::{DateTime, Utc};

use crate::models::{FileKind, FileRecord};

pub const GREETING: &str = "Привіт! Будь ласка, оберіть свою роль:";
pub const CHOOSE_ROLE: &str = "Оберіть свою роль:";
pub const USER_ROLE_UNAVAILABLE: &str =
    "Цей режим поки що в розробці. Будь ласка, оберіть роль адміністратора.";
pub const ASK_ORG_NAME: &str = "Введіть назву вашої організації:";
pub const BLANK_ORG_NAME: &str =
    "Назва організації не може бути порожньою. Введіть назву вашої організації:";
pub const ORG_FOUND: &str = "Організацію знайдено. Введіть пароль адміністратора:";
pub const WRONG_PASSWORD: &str =
    "❌ Неправильний пароль. Спробуйте ще раз або почніть з початку /start.";
pub const EXIT_NOTICE: &str =
    "Ви вийшли з режиму адміністратора. Щоб почати знову, введіть /start";
pub const SESSION_BROKEN: &str =
    "Помилка: не вдалося визначити вашу організацію. Спробуйте /start.";

pub const MAIN_MENU: &str = "Головне меню:";
pub const MATERIALS_MENU: &str = "Меню навчальних матеріалів:";
pub const TESTS_MENU: &str = "Меню тестів:";
pub const RETURN_TO_TESTS: &str = "Повертаюсь до меню тестів:";

pub const SEND_FILE: &str = "Будь ласка, надішліть файл (документ, PDF, тощо) як вкладення.";
pub const EXPECTED_FILE: &str = "Очікується файл. Будь ласка, надішліть документ.";
pub const FILE_NOT_FOUND: &str = "❌ Файл не знайдено.";
pub const DELETE_CANCELLED: &str = "❌ Видалення скасовано.";
pub const DELETE_FAILED: &str = "❌ Помилка при видаленні.";
pub const DATABASE_FAILED: &str = "❌ Сталася помилка при роботі з базою даних. Спробуйте пізніше.";

pub const AI_NOT_CONFIGURED: &str =
    "❌ OpenAI API не налаштовано. Зверніться до адміністратора системи.";
pub const AI_CHOOSE_COUNT: &str = "🤖 Оберіть кількість питань для генерації:";
pub const AI_CHOOSE_COUNT_AGAIN: &str = "🤖 Оберіть кількість питань для повторної генерації:";
pub const UNSUPPORTED_COUNT: &str =
    "❌ Невідома кількість питань. Оберіть 10, 20, 30 або 40.";
pub const NO_MATERIALS: &str = "❌ Спочатку завантажте навчальні матеріали!";
pub const EMPTY_MATERIALS: &str =
    "❌ Не вдалося прочитати вміст матеріалів. Переконайтеся, що файли містять текст.";
pub const TEST_READY: &str = "✅ Тест успішно згенеровано! Оберіть наступну дію:";
pub const CHOOSE_NEXT_ACTION: &str = "Оберіть наступну дію:";
pub const FORWARD_UNAVAILABLE: &str = "🏗️ Функціонал відправки користувачам знаходиться в розробці. \
Спершу потрібно створити логіку проходження тестів.";
pub const PREVIEW_UNAVAILABLE: &str = "🚧 Функціонал проходження тесту знаходиться в розробці. \
Щоб його реалізувати, потрібно створити логіку перетворення текстового файлу тесту на запитання бота.";

pub fn new_org(min_len: usize) -> String {
    format!("Це нова організація. Придумайте пароль адміністратора (мін. {min_len} символи):")
}

pub fn password_too_short(min_len: usize) -> String {
    format!("Пароль занадто короткий. Спробуйте ще раз (мін. {min_len} символи):")
}

pub fn org_created(name: &str) -> String {
    format!("✅ Організацію '{name}' створено! Вхід виконано.")
}

pub fn org_already_exists(name: &str) -> String {
    format!("⚠️ Організація '{name}' вже існує. Введіть пароль адміністратора:")
}

pub fn logged_in(name: &str) -> String {
    format!("✅ Вхід виконано! Вітаємо в організації '{name}'.")
}

pub fn quota_exceeded(kind: FileKind) -> &'static str {
    match kind {
        FileKind::Material => {
            "⚠️ У вас вже завантажений матеріал. Спочатку видаліть існуючий, щоб завантажити новий."
        }
        FileKind::Test => {
            "⚠️ У вас вже завантажений тест. Спочатку видаліть існуючий, щоб завантажити новий."
        }
    }
}

pub fn nothing_stored(kind: FileKind) -> &'static str {
    match kind {
        FileKind::Material => "📭 Матеріали відсутні.",
        FileKind::Test => "📭 Тести відсутні.",
    }
}

pub fn files_found(kind: FileKind, count: usize) -> String {
    match kind {
        FileKind::Material => format!("📚 Знайдено матеріалів: {count}"),
        FileKind::Test => format!("🧪 Знайдено тестів: {count}"),
    }
}

pub fn file_saved(name: &str) -> String {
    format!("✅ Файл '{name}' успішно збережено.")
}

pub fn file_save_failed() -> &'static str {
    "❌ Сталася помилка при збереженні файлу."
}

pub fn file_resend_failed(name: &str) -> String {
    format!("❌ Помилка при відправці файлу '{name}'.")
}

pub fn file_deleted(name: &str) -> String {
    format!("✅ Файл '{name}' успішно видалено!")
}

pub fn generating(count: u32) -> String {
    format!("⏳ Генерую {count} питань на основі ваших матеріалів... Це може зайняти до 30 секунд.")
}

pub fn generation_failed(reason: &str) -> String {
    format!("❌ Помилка при генерації тесту: {reason}")
}

/// `dd.mm.YYYY HH:MM`
pub fn format_uploaded_at(at: &DateTime<Utc>) -> String {
    at.format("%d.%m.%Y %H:%M").to_string()
}

/// 文件说明文字
pub fn file_caption(record: &FileRecord) -> String {
    format!(
        "📄 {}\n📅 Завантажено: {}",
        record.display_name,
        format_uploaded_at(&record.uploaded_at)
    )
}

pub fn delete_prompt(record: &FileRecord) -> String {
    format!("{}\n\nВидалити цей файл?", file_caption(record))
}
