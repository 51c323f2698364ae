//! XML文档处理模块
//!
//! 提供FB2/XML的解码、解析、元素树模型和序列化功能。
//!
//! 元素树采用 text/tail 模型：
//! - **text**: 元素开始标签之后、第一个子元素之前的文本
//! - **tail**: 元素结束标签之后、下一个兄弟元素（或父元素结束）之前的文本

// 标准库导入
use std::borrow::Cow;
use std::io::Write as _;
use std::path::Path;
use std::sync::LazyLock;

// 第三方crate导入
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use tracing::{debug, warn};

// 本地模块导入
use crate::error::{Result, TranslationError};
use crate::translation_error;

/// XML元素节点
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// 原始标签名（保留命名空间前缀）
    pub name: String,
    /// 有序属性列表（保留原始属性名，包括 xmlns 声明）
    pub attributes: Vec<(String, String)>,
    /// 元素体文本
    pub text: Option<String>,
    /// 有序子元素
    pub children: Vec<Element>,
    /// 尾随文本
    pub tail: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
            tail: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// 去掉命名空间前缀后的本地名
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// 获取属性值
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// 按本地名查找直接子元素
    pub fn find_child_mut(&mut self, local_name: &str) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .find(|child| child.local_name() == local_name)
    }

    /// 按本地名查找第一个后代元素（文档顺序）
    pub fn find_descendant_mut(&mut self, local_name: &str) -> Option<&mut Element> {
        let path = {
            let mut stack: Vec<(Vec<usize>, &Element)> = vec![(Vec::new(), &*self)];
            let mut found = None;
            while let Some((path, node)) = stack.pop() {
                if !path.is_empty() && node.local_name() == local_name {
                    found = Some(path);
                    break;
                }
                for (index, child) in node.children.iter().enumerate().rev() {
                    let mut child_path = path.clone();
                    child_path.push(index);
                    stack.push((child_path, child));
                }
            }
            found?
        };
        self.node_at_mut(&path)
    }

    /// 按子元素索引路径定位节点
    pub fn node_at(&self, path: &[usize]) -> Option<&Element> {
        let mut node = self;
        for &index in path {
            node = node.children.get(index)?;
        }
        Some(node)
    }

    /// 按子元素索引路径定位可变节点
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut node = self;
        for &index in path {
            node = node.children.get_mut(index)?;
        }
        Some(node)
    }

    /// 子树中的元素总数（含自身）
    pub fn count_elements(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

// 逐层释放子树，深层嵌套时不会递归爆栈
impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

/// XML声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub standalone: Option<String>,
}

/// 根元素之前的序言节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrologItem {
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

/// 完整XML文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub declaration: Option<XmlDeclaration>,
    pub prolog: Vec<PrologItem>,
    pub root: Element,
}

/// 序列化选项
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOptions {
    /// 缩进空格数，None 表示紧凑输出
    pub indent: Option<usize>,
}

impl SerializeOptions {
    pub fn compact() -> Self {
        Self { indent: None }
    }

    pub fn indented(spaces: usize) -> Self {
        Self {
            indent: Some(spaces),
        }
    }
}

/// 按XML声明中的编码将字节解码为UTF-8字符串
pub fn decode_document_bytes(bytes: &[u8]) -> Result<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let label = declared_encoding(bytes);
    let encoding = match label.as_deref() {
        Some(label) => encoding_rs::Encoding::for_label(label.as_bytes()).ok_or_else(|| {
            translation_error!(xml_parse, format!("不支持的文档编码: {}", label))
        })?,
        None => encoding_rs::UTF_8,
    };

    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(translation_error!(
            xml_parse,
            format!("文档包含无效的{}字节序列", used.name())
        ));
    }
    if used != encoding_rs::UTF_8 {
        debug!("🔤 文档编码转换: {} -> UTF-8", used.name());
    }

    Ok(decoded.into_owned())
}

static ENCODING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"encoding\s*=\s*["']([A-Za-z0-9._-]+)["']"#).expect("编码声明正则表达式无效")
});

/// 从XML声明中读取编码标签
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head_len = bytes.len().min(256);
    let head = String::from_utf8_lossy(&bytes[..head_len]);
    if !head.starts_with("<?xml") {
        return None;
    }
    let declaration = &head[..head.find("?>")?];
    ENCODING_REGEX
        .captures(declaration)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 解析XML字符串为文档树
pub fn parse_document(xml: &str) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut declaration = None;
    let mut prolog = Vec::new();
    // 打开中的元素栈
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| translation_error!(xml_parse, e, position as u64))?;

        match event {
            Event::Decl(decl) => {
                declaration = Some(read_declaration(&decl)?);
            }
            Event::DocType(text) => {
                if root.is_some() || !open.is_empty() {
                    return Err(translation_error!(xml_parse, "DOCTYPE必须位于根元素之前", position as u64));
                }
                let doctype = bytes_to_string(Cow::Borrowed(&*text))?;
                prolog.push(PrologItem::DocType(doctype.trim_start().to_string()));
            }
            Event::Comment(text) => {
                if open.is_empty() && root.is_none() {
                    prolog.push(PrologItem::Comment(bytes_to_string(Cow::Borrowed(&*text))?));
                } else {
                    debug!("忽略元素树中的注释");
                }
            }
            Event::PI(pi) => {
                if open.is_empty() && root.is_none() {
                    prolog.push(PrologItem::ProcessingInstruction(bytes_to_string(
                        Cow::Borrowed(&*pi),
                    )?));
                } else {
                    debug!("忽略元素树中的处理指令");
                }
            }
            Event::Start(start) => {
                if open.is_empty() && root.is_some() {
                    return Err(translation_error!(xml_parse, "文档包含多个根元素", position as u64));
                }
                open.push(read_start(&start)?);
            }
            Event::Empty(start) => {
                let element = read_start(&start)?;
                match open.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => {
                        return Err(translation_error!(xml_parse, "文档包含多个根元素", position as u64));
                    }
                }
            }
            Event::End(_) => {
                // 结束标签名称匹配由 quick-xml 检查
                let element = open
                    .pop()
                    .ok_or_else(|| translation_error!(xml_parse, "多余的结束标签", position as u64))?;
                match open.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                let content = text
                    .unescape()
                    .map_err(|e| translation_error!(xml_parse, e, position as u64))?;
                append_text(&mut open, &content, position as u64)?;
            }
            Event::CData(cdata) => {
                let content = bytes_to_string(Cow::Borrowed(&*cdata))?;
                append_text(&mut open, &content, position as u64)?;
            }
            Event::Eof => break,
        }
    }

    if !open.is_empty() {
        return Err(translation_error!(
            xml_parse,
            format!("元素未闭合: <{}>", open.last().map(|e| e.name.as_str()).unwrap_or_default())
        ));
    }

    let root = root.ok_or_else(|| translation_error!(xml_parse, "文档缺少根元素"))?;
    Ok(Document {
        declaration,
        prolog,
        root,
    })
}

/// 将文本追加到当前元素的 text 槽或最后一个子元素的 tail 槽
fn append_text(open: &mut [Element], content: &str, position: u64) -> Result<()> {
    let Some(current) = open.last_mut() else {
        // 根元素之外只允许空白
        if content.trim().is_empty() {
            return Ok(());
        }
        return Err(translation_error!(xml_parse, "根元素之外存在文本内容", position));
    };

    let slot = match current.children.last_mut() {
        Some(last_child) => &mut last_child.tail,
        None => &mut current.text,
    };
    match slot {
        Some(existing) => existing.push_str(content),
        None => *slot = Some(content.to_string()),
    }
    Ok(())
}

fn read_start(start: &BytesStart<'_>) -> Result<Element> {
    let name = bytes_to_string(Cow::Borrowed(start.name().as_ref()))?;
    let mut element = Element::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| translation_error!(xml_parse, e))?;
        let key = bytes_to_string(Cow::Borrowed(attribute.key.as_ref()))?;
        let value = attribute.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<XmlDeclaration> {
    let version = bytes_to_string(decl.version()?)?;
    let standalone = match decl.standalone() {
        Some(value) => Some(bytes_to_string(
            value.map_err(|e| translation_error!(xml_parse, e))?,
        )?),
        None => None,
    };
    Ok(XmlDeclaration { version, standalone })
}

fn bytes_to_string(bytes: Cow<'_, [u8]>) -> Result<String> {
    String::from_utf8(bytes.into_owned())
        .map_err(|e| translation_error!(xml_parse, format!("无效的UTF-8内容: {}", e)))
}

/// 序列化文档为XML字符串
///
/// 缩进只插入在 text/tail 槽为空（None）的位置，已有文本（包括空白）原样输出。
pub fn serialize_document(document: &Document, options: &SerializeOptions) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    if let Some(declaration) = &document.declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new(
                &declaration.version,
                Some("UTF-8"),
                declaration.standalone.as_deref(),
            )))
            .map_err(serialization_error)?;
        write_raw(&mut writer, "\n")?;
    }

    for item in &document.prolog {
        let event = match item {
            PrologItem::Comment(text) => Event::Comment(BytesText::from_escaped(text.as_str())),
            PrologItem::ProcessingInstruction(text) => {
                Event::PI(quick_xml::events::BytesPI::new(text.as_str()))
            }
            PrologItem::DocType(text) => Event::DocType(BytesText::from_escaped(text.as_str())),
        };
        writer.write_event(event).map_err(serialization_error)?;
        write_raw(&mut writer, "\n")?;
    }

    write_element_tree(&mut writer, &document.root, options)?;
    if options.indent.is_some() {
        write_raw(&mut writer, "\n")?;
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| translation_error!(serialization, format!("UTF-8转换失败: {}", e)))
}

/// 遍历阶段标记
enum WritePhase {
    Open,
    Child(usize),
}

/// 使用显式栈序列化元素树，避免深层嵌套导致栈溢出
fn write_element_tree(
    writer: &mut Writer<Vec<u8>>,
    root: &Element,
    options: &SerializeOptions,
) -> Result<()> {
    let mut stack: Vec<(&Element, WritePhase)> = vec![(root, WritePhase::Open)];

    while let Some((node, phase)) = stack.pop() {
        let depth = stack.len();
        let pretty = options.indent.filter(|_| is_element_only(node));
        match phase {
            WritePhase::Open => {
                let mut start = BytesStart::new(node.name.as_str());
                for (key, value) in &node.attributes {
                    start.push_attribute((key.as_str(), value.as_str()));
                }
                if node.text.is_none() && node.children.is_empty() {
                    writer
                        .write_event(Event::Empty(start))
                        .map_err(serialization_error)?;
                    write_tail(writer, node)?;
                    continue;
                }
                writer
                    .write_event(Event::Start(start))
                    .map_err(serialization_error)?;
                if let Some(text) = &node.text {
                    write_text(writer, text)?;
                }
                stack.push((node, WritePhase::Child(0)));
            }
            WritePhase::Child(index) => {
                if let Some(child) = node.children.get(index) {
                    if let Some(spaces) = pretty {
                        write_raw(writer, &indentation(spaces, depth + 1))?;
                    }
                    stack.push((node, WritePhase::Child(index + 1)));
                    stack.push((child, WritePhase::Open));
                } else {
                    if let Some(spaces) = pretty {
                        write_raw(writer, &indentation(spaces, depth))?;
                    }
                    writer
                        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
                        .map_err(serialization_error)?;
                    write_tail(writer, node)?;
                }
            }
        }
    }

    Ok(())
}

/// 元素是否只包含子元素（text 和所有子元素 tail 均为 None）
fn is_element_only(node: &Element) -> bool {
    !node.children.is_empty()
        && node.text.is_none()
        && node.children.iter().all(|child| child.tail.is_none())
}

fn indentation(spaces: usize, depth: usize) -> String {
    format!("\n{}", " ".repeat(spaces * depth))
}

fn write_tail(writer: &mut Writer<Vec<u8>>, node: &Element) -> Result<()> {
    if let Some(tail) = &node.tail {
        write_text(writer, tail)?;
    }
    Ok(())
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<()> {
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(serialization_error)
}

fn write_raw(writer: &mut Writer<Vec<u8>>, raw: &str) -> Result<()> {
    writer
        .get_mut()
        .write_all(raw.as_bytes())
        .map_err(serialization_error)
}

fn serialization_error(error: impl std::fmt::Display) -> TranslationError {
    translation_error!(serialization, error)
}

/// 将文档写入文件
///
/// 先尝试带缩进的序列化，失败时退回紧凑序列化；两者都失败则返回错误。
/// 内容先写入目标目录下的临时文件，完成后再原子替换，不会留下不完整的输出文件。
/// 返回写入的字节数。
pub fn write_document(document: &Document, path: &Path, indent: Option<usize>) -> Result<usize> {
    let content = match serialize_document(document, &SerializeOptions { indent }) {
        Ok(content) => content,
        Err(e) if indent.is_some() => {
            warn!("⚠️  格式化输出失败，改用紧凑输出: {}", e);
            serialize_document(document, &SerializeOptions::compact())?
        }
        Err(e) => return Err(e),
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| translation_error!(file_op, parent.display(), "创建临时", e))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| translation_error!(file_op, temp_file.path().display(), "写入", e))?;
    temp_file
        .persist(path)
        .map_err(|e| translation_error!(file_op, path.display(), "保存", e.error))?;

    debug!("💾 已写入 {} ({} 字节)", path.display(), content.len());
    Ok(content.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0" xmlns:l="http://www.w3.org/1999/xlink"><body><p>Привет <emphasis>мир</emphasis>!</p><image l:href="#cover"/></body></FictionBook>"##;

    #[test]
    fn test_parse_text_and_tail_slots() {
        let doc = parse_document(SAMPLE).unwrap();
        assert_eq!(doc.root.name, "FictionBook");
        assert_eq!(doc.root.attributes.len(), 2);
        assert_eq!(doc.root.attribute("xmlns:l"), Some("http://www.w3.org/1999/xlink"));

        let p = doc.root.node_at(&[0, 0]).unwrap();
        assert_eq!(p.text.as_deref(), Some("Привет "));
        let emphasis = &p.children[0];
        assert_eq!(emphasis.text.as_deref(), Some("мир"));
        assert_eq!(emphasis.tail.as_deref(), Some("!"));

        let image = doc.root.node_at(&[0, 1]).unwrap();
        assert_eq!(image.local_name(), "image");
        assert_eq!(image.attribute("l:href"), Some("#cover"));
    }

    #[test]
    fn test_compact_round_trip_is_stable() {
        let doc = parse_document(SAMPLE).unwrap();
        let first = serialize_document(&doc, &SerializeOptions::compact()).unwrap();
        let reparsed = parse_document(&first).unwrap();
        assert_eq!(reparsed.root, doc.root);
        let second = serialize_document(&reparsed, &SerializeOptions::compact()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_indent_never_touches_existing_text() {
        let xml = "<root><a>x</a>\n  <b>y</b></root>";
        let doc = parse_document(xml).unwrap();
        let out = serialize_document(&doc, &SerializeOptions::indented(2)).unwrap();
        assert_eq!(out, "<root><a>x</a>\n  <b>y</b></root>\n");
    }

    #[test]
    fn test_indent_element_only_content() {
        let xml = "<root><a><b>y</b></a><c/></root>";
        let doc = parse_document(xml).unwrap();
        let out = serialize_document(&doc, &SerializeOptions::indented(1)).unwrap();
        assert_eq!(out, "<root>\n <a>\n  <b>y</b>\n </a>\n <c/>\n</root>\n");
    }

    #[test]
    fn test_escaping_round_trip() {
        let xml = r#"<root title="a &amp; b">1 &lt; 2 &amp; <![CDATA[<raw>]]></root>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.root.attribute("title"), Some("a & b"));
        assert_eq!(doc.root.text.as_deref(), Some("1 < 2 & <raw>"));
        let out = serialize_document(&doc, &SerializeOptions::compact()).unwrap();
        let reparsed = parse_document(&out).unwrap();
        assert_eq!(reparsed.root, doc.root);
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        assert!(parse_document("<root><a></root>").is_err());
        assert!(parse_document("<root>").is_err());
        assert!(parse_document("").is_err());
        assert!(parse_document("<a/><b/>").is_err());
        assert!(parse_document("text<root/>").is_err());
    }

    #[test]
    fn test_prolog_is_preserved() {
        let xml = "<?xml version=\"1.0\"?>\n<!-- header --><root/>";
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.prolog, vec![PrologItem::Comment(" header ".to_string())]);
        let out = serialize_document(&doc, &SerializeOptions::compact()).unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- header -->\n<root/>"
        );
    }

    #[test]
    fn test_standalone_declaration_and_full_prolog_round_trip() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<!DOCTYPE FictionBook>
<?xml-stylesheet type="text/css" href="book.css"?>
<FictionBook note='say "hi" &amp; go'><p>Tom &amp; "Jerry" &lt;3</p></FictionBook>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(
            doc.declaration,
            Some(XmlDeclaration {
                version: "1.0".to_string(),
                standalone: Some("yes".to_string()),
            })
        );
        assert_eq!(doc.prolog.len(), 2);
        assert_eq!(doc.prolog[0], PrologItem::DocType("FictionBook".to_string()));
        assert!(matches!(
            &doc.prolog[1],
            PrologItem::ProcessingInstruction(pi) if pi.starts_with("xml-stylesheet")
        ));
        assert_eq!(doc.root.attribute("note"), Some(r#"say "hi" & go"#));
        assert_eq!(doc.root.children[0].text.as_deref(), Some(r#"Tom & "Jerry" <3"#));

        let first = serialize_document(&doc, &SerializeOptions::compact()).unwrap();
        assert!(first.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
        let reparsed = parse_document(&first).unwrap();
        assert_eq!(reparsed, doc);
        let second = serialize_document(&reparsed, &SerializeOptions::compact()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_declared_encoding_variants() {
        assert_eq!(
            declared_encoding(b"<?xml version='1.0' encoding = 'windows-1251'?><a/>").as_deref(),
            Some("windows-1251")
        );
        assert_eq!(
            declared_encoding(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><a/>").as_deref(),
            Some("UTF-8")
        );
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><a/>"), None);
        assert_eq!(declared_encoding(b"<a encoding=\"koi8-r\"/>"), None);
    }

    #[test]
    fn test_decode_windows_1251() {
        let (encoded, _, _) = encoding_rs::WINDOWS_1251.encode("<p>Привет</p>");
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"windows-1251\"?>".to_vec();
        bytes.extend_from_slice(&encoded);
        let decoded = decode_document_bytes(&bytes).unwrap();
        assert!(decoded.ends_with("<p>Привет</p>"));
    }

    #[test]
    fn test_find_descendant_in_document_order() {
        let mut root = Element::new("root")
            .with_child(Element::new("a").with_child(Element::new("lang").with_text("ru")))
            .with_child(Element::new("lang").with_text("en"));
        let found = root.find_descendant_mut("lang").unwrap();
        assert_eq!(found.text.as_deref(), Some("ru"));
        assert_eq!(root.count_elements(), 4);
    }

    #[test]
    fn test_serialize_built_tree() {
        let root = Element::new("p")
            .with_attribute("id", "x")
            .with_text("a ")
            .with_child(Element::new("b").with_text("bold").with_tail(" & c"));
        let doc = Document {
            declaration: None,
            prolog: Vec::new(),
            root,
        };
        let out = serialize_document(&doc, &SerializeOptions::indented(2)).unwrap();
        assert_eq!(out, "<p id=\"x\">a <b>bold</b> &amp; c</p>\n");
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let depth = 10_000;
        let xml = format!("{}{}", "<d>".repeat(depth), "</d>".repeat(depth));
        let doc = parse_document(&xml).unwrap();
        let out = serialize_document(&doc, &SerializeOptions::compact()).unwrap();
        // 最内层 <d></d> 输出为 <d/>
        assert_eq!(out.len(), xml.len() - 3);
    }

    #[test]
    fn test_write_document_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fb2");
        let doc = parse_document("<root><p>text</p></root>").unwrap();
        let written = write_document(&doc, &path, Some(1)).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.len(), written);
        assert!(content.contains("<p>text</p>"));
    }
}
