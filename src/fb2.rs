//! FB2 翻译流水线
//!
//! 解码 → 解析 → 更新语言标记 → 遍历翻译 → （可选）拉丁字母转写 → 序列化 → 写入。
//! 任何致命错误都发生在写入之前，失败时不会产生输出文件。

// 标准库导入
use std::path::{Path, PathBuf};
use std::time::Instant;

// 第三方crate导入
use tracing::{debug, info, warn};

// 本地模块导入
use crate::api_constants::service_config;
use crate::document::{decode_document_bytes, parse_document, write_document, Document};
use crate::error::Result;
use crate::stats::PerformanceStats;
use crate::translation_error;
use crate::translator::Translate;
use crate::transliterate::convert_tree_to_latin;
use crate::walker::{collect_units, TranslationSession, TranslationUnit};

/// FictionBook 2.0 命名空间
pub const FB2_NAMESPACE: &str = "http://www.gribuser.ru/xml/fictionbook/2.0";

/// 流水线选项
#[derive(Debug, Clone, Copy)]
pub struct TranslateOptions {
    /// 启用 (文本, 上下文) 缓存
    pub enable_cache: bool,
    /// 输出前转写为拉丁字母
    pub latin: bool,
    /// 输出缩进空格数，None 为紧凑输出
    pub indent: Option<usize>,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            enable_cache: true,
            latin: false,
            indent: Some(service_config::DEFAULT_INDENT),
        }
    }
}

/// 单次运行的结果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: PathBuf,
    /// 是否找到并更新了 title-info/lang
    pub language_updated: bool,
    /// 转写为拉丁字母的槽位数
    pub latin_slots: usize,
    pub stats: PerformanceStats,
}

/// 将 description/title-info/lang 设置为目标语言
///
/// 按本地名匹配，忽略命名空间前缀。找不到时返回 false，文档不变。
pub fn update_document_language(document: &mut Document, lang: &str) -> bool {
    let lang_element = document
        .root
        .find_descendant_mut("description")
        .and_then(|description| description.find_child_mut("title-info"))
        .and_then(|title_info| title_info.find_child_mut("lang"));

    match lang_element {
        Some(element) => {
            debug!(
                "🌐 文档语言: {} -> {}",
                element.text.as_deref().unwrap_or("(空)"),
                lang
            );
            element.text = Some(lang.to_string());
            true
        }
        None => {
            warn!("⚠️  文档缺少 description/title-info/lang，跳过语言标记");
            false
        }
    }
}

/// 检查根元素是否为 FictionBook
fn check_fiction_book(document: &Document) {
    if document.root.local_name() != "FictionBook" {
        warn!("⚠️  根元素不是FictionBook: {}", document.root.name);
    } else if document.root.attribute("xmlns") != Some(FB2_NAMESPACE) {
        debug!("根元素命名空间不是FB2 2.0");
    }
}

/// 翻译内存中的文档：更新语言、遍历翻译、可选转写
///
/// 返回 (性能统计, 是否更新了语言标记, 转写槽位数)。
pub async fn translate_document(
    document: &mut Document,
    translator: &dyn Translate,
    options: &TranslateOptions,
) -> (PerformanceStats, bool, usize) {
    let mut stats = PerformanceStats {
        elements: document.root.count_elements(),
        ..Default::default()
    };

    let language_updated = update_document_language(document, service_config::TARGET_LANGUAGE);
    stats.units_found = collect_units(&document.root).len();

    let translate_start = Instant::now();
    let mut session = TranslationSession::new(translator, options.enable_cache);
    session.walk(&mut document.root).await;
    stats.walk = session.into_stats();
    stats.translation_time = translate_start.elapsed();

    let latin_slots = if options.latin {
        let converted = convert_tree_to_latin(&mut document.root);
        info!("🔠 已转写为拉丁字母: {} 个文本槽", converted);
        converted
    } else {
        0
    };

    (stats, language_updated, latin_slots)
}

/// 读取文件并解码为UTF-8文本，返回 (文本, 原始字节数)
fn read_fb2_text(input: &Path) -> Result<(String, usize)> {
    let bytes = std::fs::read(input)
        .map_err(|e| translation_error!(file_op, input.display(), "读取", e))?;
    let text = decode_document_bytes(&bytes)?;
    Ok((text, bytes.len()))
}

/// 读取并解析FB2文件
pub fn load_fb2_file(input: &Path) -> Result<Document> {
    let (text, _) = read_fb2_text(input)?;
    let document = parse_document(&text)?;
    check_fiction_book(&document);
    Ok(document)
}

/// 翻译FB2文件并写入输出路径
pub async fn translate_fb2_file(
    input: &Path,
    output: &Path,
    translator: &dyn Translate,
    options: &TranslateOptions,
) -> Result<RunReport> {
    info!("📖 读取文件: {}", input.display());
    let read_start = Instant::now();
    let (text, input_size) = read_fb2_text(input)?;
    let file_read_time = read_start.elapsed();

    let parse_start = Instant::now();
    let mut document = parse_document(&text)?;
    check_fiction_book(&document);
    let parse_time = parse_start.elapsed();

    info!("🔄 开始翻译 (后端: {})", translator.name());
    let (mut stats, language_updated, latin_slots) =
        translate_document(&mut document, translator, options).await;

    info!("💾 写入文件: {}", output.display());
    let write_start = Instant::now();
    let output_size = write_document(&document, output, options.indent)?;

    stats.file_read_time = file_read_time;
    stats.parse_time = parse_time;
    stats.file_write_time = write_start.elapsed();
    stats.input_size = input_size;
    stats.output_size = output_size;

    Ok(RunReport {
        output_path: output.to_path_buf(),
        language_updated,
        latin_slots,
        stats,
    })
}

/// 列出文件中的翻译单元（不发起任何翻译请求）
pub fn list_translation_units(input: &Path) -> Result<Vec<TranslationUnit>> {
    let document = load_fb2_file(input)?;
    Ok(collect_units(&document.root))
}
