//! 元素树遍历与翻译回写
//!
//! 按文档顺序遍历元素树，把每个有意义的 text/tail 槽作为独立的翻译单元提交给
//! [`Translate`]，成功的结果原样写回同一个槽位。
//!
//! 遍历顺序（先序）：
//! 1. 节点自身的 text
//! 2. 依次处理每个子元素的完整子树
//! 3. 节点自身的 tail
//!
//! 遍历使用显式栈和阶段标记，不依赖递归，任意深度的文档都不会爆栈。

// 标准库导入
use std::collections::HashMap;
use std::fmt;

// 第三方crate导入
use tracing::{debug, info, warn};

// 本地模块导入
use crate::document::Element;
use crate::translator::Translate;

/// 上下文路径分隔符
pub const CONTEXT_SEPARATOR: &str = "/";

/// tail 槽上下文的结尾标记
pub const TAIL_MARKER: &str = "tail";

/// 去掉首尾空白后超过该字符数的槽才会被翻译
pub const MIN_TRANSLATABLE_CHARS: usize = 2;

/// 文本槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// 元素体文本
    Body,
    /// 尾随文本
    Tail,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Body => f.write_str("text"),
            Slot::Tail => f.write_str("tail"),
        }
    }
}

/// 翻译单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    /// 从根元素出发的子元素索引路径
    pub path: Vec<usize>,
    /// 槽位
    pub slot: Slot,
    /// 槽中原始文本（未去除空白）
    pub text: String,
    /// 祖先标签路径
    pub context: String,
}

/// 构建节点上下文：祖先标签（根到父）加上自身标签，用分隔符连接
pub fn build_context<S: AsRef<str>>(ancestors: &[S], tag: &str) -> String {
    let mut context = String::new();
    for segment in ancestors.iter().map(AsRef::as_ref).chain(std::iter::once(tag)) {
        if !context.is_empty() {
            context.push_str(CONTEXT_SEPARATOR);
        }
        context.push_str(segment);
    }
    context
}

/// tail 槽上下文：节点上下文后追加 tail 标记
pub fn tail_context(node_context: &str) -> String {
    format!("{}{}{}", node_context, CONTEXT_SEPARATOR, TAIL_MARKER)
}

/// 判断槽位是否需要翻译
///
/// 去除首尾空白后字符数（Unicode标量）严格大于2才算合格；空白只用于判断，不修改存储值。
pub fn qualifies(slot: Option<&str>) -> bool {
    slot.is_some_and(|text| text.trim().chars().count() > MIN_TRANSLATABLE_CHARS)
}

/// 单次运行的翻译统计
///
/// `attempted == translated + cached + failed`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    /// 提交的翻译单元数
    pub attempted: usize,
    /// 由翻译后端成功翻译的单元数
    pub translated: usize,
    /// 翻译失败、保留原文的单元数
    pub failed: usize,
    /// 命中缓存的单元数
    pub cached: usize,
}

impl WalkStats {
    /// 成功写回的单元数（含缓存命中）
    pub fn succeeded(&self) -> usize {
        self.translated + self.cached
    }

    /// 成功率（百分比）
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 100.0;
        }
        self.succeeded() as f64 / self.attempted as f64 * 100.0
    }
}

/// 遍历阶段标记
#[derive(Debug, Clone, Copy)]
enum Phase {
    Body,
    Child(usize),
    Tail,
}

/// 按文档顺序列出所有翻译单元
pub fn collect_units(root: &Element) -> Vec<TranslationUnit> {
    let mut units = Vec::new();
    // 栈中每一帧对应一个打开的元素：(元素, 阶段)
    let mut stack: Vec<(&Element, Phase)> = vec![(root, Phase::Body)];
    // 与栈帧对应的子元素索引路径和标签路径
    let mut path: Vec<usize> = Vec::new();
    let mut tags: Vec<&str> = Vec::new();

    while let Some(frame) = stack.last_mut() {
        let (node, phase) = (frame.0, frame.1);
        match phase {
            Phase::Body => {
                frame.1 = Phase::Child(0);
                tags.push(&node.name);
                if qualifies(node.text.as_deref()) {
                    units.push(TranslationUnit {
                        path: path.clone(),
                        slot: Slot::Body,
                        text: node.text.clone().unwrap_or_default(),
                        context: build_context(&tags[..tags.len() - 1], &node.name),
                    });
                }
            }
            Phase::Child(index) => match node.children.get(index) {
                Some(child) => {
                    frame.1 = Phase::Child(index + 1);
                    path.push(index);
                    stack.push((child, Phase::Body));
                }
                None => frame.1 = Phase::Tail,
            },
            Phase::Tail => {
                if qualifies(node.tail.as_deref()) {
                    units.push(TranslationUnit {
                        path: path.clone(),
                        slot: Slot::Tail,
                        text: node.tail.clone().unwrap_or_default(),
                        context: tail_context(&tags.join(CONTEXT_SEPARATOR)),
                    });
                }
                stack.pop();
                tags.pop();
                path.pop();
            }
        }
    }

    units
}

/// 单次运行的翻译会话
///
/// 持有翻译后端引用、(文本, 上下文) 缓存和统计数据，生命周期为一次文档处理。
pub struct TranslationSession<'a> {
    translator: &'a dyn Translate,
    cache: Option<HashMap<(String, String), String>>,
    stats: WalkStats,
}

impl<'a> TranslationSession<'a> {
    pub fn new(translator: &'a dyn Translate, enable_cache: bool) -> Self {
        Self {
            translator,
            cache: enable_cache.then(HashMap::new),
            stats: WalkStats::default(),
        }
    }

    pub fn into_stats(self) -> WalkStats {
        self.stats
    }

    /// 翻译单个文本片段，失败（包括空结果）返回 None
    pub async fn translate(&mut self, text: &str, context: &str) -> Option<String> {
        self.stats.attempted += 1;

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&(text.to_string(), context.to_string())) {
                self.stats.cached += 1;
                debug!("💾 缓存命中 [{}]", context);
                return Some(hit.clone());
            }
        }

        match self.translator.attempt_translate(text, context).await {
            Ok(translated) if !translated.trim().is_empty() => {
                self.stats.translated += 1;
                if let Some(cache) = &mut self.cache {
                    cache.insert((text.to_string(), context.to_string()), translated.clone());
                }
                Some(translated)
            }
            Ok(_) => {
                self.stats.failed += 1;
                warn!("❌ {} 返回空译文 [{}]", self.translator.name(), context);
                None
            }
            Err(e) => {
                self.stats.failed += 1;
                warn!("❌ 翻译失败 [{}]: {}", context, e);
                None
            }
        }
    }

    /// 遍历元素树并就地回写译文
    ///
    /// 每个单元等待翻译结果后再处理下一个；失败的槽保持原值。
    pub async fn walk(&mut self, root: &mut Element) {
        let units = collect_units(root);
        info!("📝 发现 {} 个待翻译片段", units.len());

        for (index, unit) in units.into_iter().enumerate() {
            debug!(
                "🔤 [{}] {} {} ({} 字符)",
                index + 1,
                unit.context,
                unit.slot,
                unit.text.chars().count()
            );
            let Some(translated) = self.translate(&unit.text, &unit.context).await else {
                continue;
            };
            match root.node_at_mut(&unit.path) {
                Some(node) => match unit.slot {
                    Slot::Body => node.text = Some(translated),
                    Slot::Tail => node.tail = Some(translated),
                },
                None => warn!("⚠️  翻译单元路径失效: {:?}", unit.path),
            }
        }

        info!(
            "📊 翻译完成: 成功率 {:.1}% (翻译 {} / 缓存 {} / 失败 {})",
            self.stats.success_rate(),
            self.stats.translated,
            self.stats.cached,
            self.stats.failed
        );
    }
}

/// 便捷函数：创建会话、遍历并返回统计
pub async fn translate_tree(
    root: &mut Element,
    translator: &dyn Translate,
    enable_cache: bool,
) -> WalkStats {
    let mut session = TranslationSession::new(translator, enable_cache);
    session.walk(root).await;
    session.into_stats()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{parse_document, serialize_document, SerializeOptions};
    use crate::error::Result;
    use crate::translation_error;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 记录调用并按脚本返回结果的翻译后端
    #[derive(Default)]
    struct ScriptedTranslator {
        calls: Mutex<Vec<(String, String)>>,
        failing: Vec<&'static str>,
    }

    impl ScriptedTranslator {
        fn failing_on(texts: &[&'static str]) -> Self {
            Self {
                failing: texts.to_vec(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Translate for ScriptedTranslator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn attempt_translate(&self, text: &str, context: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), context.to_string()));
            if self.failing.contains(&text) {
                return Err(translation_error!(empty, "scripted"));
            }
            Ok(format!("[{}]", text))
        }
    }

    #[test]
    fn test_build_context() {
        assert_eq!(build_context::<&str>(&[], "root"), "root");
        assert_eq!(build_context(&["root", "a"], "b"), "root/a/b");
        assert_eq!(tail_context("root/a/b"), "root/a/b/tail");
    }

    #[test]
    fn test_qualifies() {
        assert!(!qualifies(None));
        assert!(!qualifies(Some("")));
        assert!(!qualifies(Some("   \n\t")));
        assert!(!qualifies(Some(".")));
        assert!(!qualifies(Some("  ab  ")));
        assert!(!qualifies(Some("да")));
        assert!(qualifies(Some(" abc ")));
        assert!(qualifies(Some("мир")));
    }

    #[test]
    fn test_collect_order_and_contexts() {
        let doc = parse_document("<root><p>Привет мир</p>hello</root>").unwrap();
        let units = collect_units(&doc.root);
        let pairs: Vec<(&str, &str, Slot)> = units
            .iter()
            .map(|u| (u.text.as_str(), u.context.as_str(), u.slot))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Привет мир", "root/p", Slot::Body),
                ("hello", "root/p/tail", Slot::Tail),
            ]
        );
        assert_eq!(units[1].path, vec![0]);
    }

    #[test]
    fn test_nested_tail_comes_after_subtree() {
        let xml = "<r>intro<a>alpha<b>beta</b>after-b</a>after-a<c>gamma</c></r>";
        let doc = parse_document(xml).unwrap();
        let contexts: Vec<String> = collect_units(&doc.root)
            .into_iter()
            .map(|u| format!("{}={}", u.context, u.text))
            .collect();
        assert_eq!(
            contexts,
            vec![
                "r=intro",
                "r/a=alpha",
                "r/a/b=beta",
                "r/a/b/tail=after-b",
                "r/a/tail=after-a",
                "r/c=gamma",
            ]
        );
    }

    #[tokio::test]
    async fn test_walk_writes_back_and_skips_short_slots() {
        let mut doc = parse_document("<root><p>Привет мир</p>.<q>ok</q></root>").unwrap();
        let translator = ScriptedTranslator::default();
        let stats = translate_tree(&mut doc.root, &translator, true).await;

        assert_eq!(translator.calls(), vec![("Привет мир".to_string(), "root/p".to_string())]);
        assert_eq!(doc.root.children[0].text.as_deref(), Some("[Привет мир]"));
        assert_eq!(doc.root.children[0].tail.as_deref(), Some("."));
        assert_eq!(doc.root.children[1].text.as_deref(), Some("ok"));
        assert_eq!(stats, WalkStats { attempted: 1, translated: 1, failed: 0, cached: 0 });
    }

    #[tokio::test]
    async fn test_failure_preserves_original() {
        let mut doc = parse_document("<root><p>Здраво</p><p>Привет</p></root>").unwrap();
        let translator = ScriptedTranslator::failing_on(&["Здраво"]);
        let stats = translate_tree(&mut doc.root, &translator, false).await;

        assert_eq!(doc.root.children[0].text.as_deref(), Some("Здраво"));
        assert_eq!(doc.root.children[1].text.as_deref(), Some("[Привет]"));
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.translated, 1);
    }

    #[tokio::test]
    async fn test_cache_serves_duplicates_once() {
        let xml = "<root><p>Глава первая</p><p>Глава первая</p><p>Глава первая</p>Глава первая</root>";
        let mut doc = parse_document(xml).unwrap();
        let translator = ScriptedTranslator::default();
        let stats = translate_tree(&mut doc.root, &translator, true).await;

        // 三个 body 共享同一个 (文本, 上下文)，tail 上下文不同
        assert_eq!(translator.calls().len(), 2);
        assert_eq!(stats, WalkStats { attempted: 4, translated: 2, failed: 0, cached: 2 });
        for p in &doc.root.children[..3] {
            assert_eq!(p.text.as_deref(), Some("[Глава первая]"));
        }
        assert_eq!(doc.root.children[2].tail.as_deref(), Some("[Глава первая]"));
    }

    #[tokio::test]
    async fn test_without_cache_output_is_identical() {
        let xml = "<root><p>Глава первая</p><p>Глава первая</p></root>";
        let mut cached = parse_document(xml).unwrap();
        let mut uncached = parse_document(xml).unwrap();
        let translator = ScriptedTranslator::default();

        translate_tree(&mut cached.root, &translator, true).await;
        let stats = translate_tree(&mut uncached.root, &translator, false).await;

        assert_eq!(cached.root, uncached.root);
        assert_eq!(stats.cached, 0);
        assert_eq!(stats.translated, 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let xml = "<root><p>Здраво</p><p>Здраво</p></root>";
        let mut doc = parse_document(xml).unwrap();
        let translator = ScriptedTranslator::failing_on(&["Здраво"]);
        let stats = translate_tree(&mut doc.root, &translator, true).await;

        assert_eq!(translator.calls().len(), 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.cached, 0);
    }

    #[tokio::test]
    async fn test_structure_and_attributes_are_invariant() {
        let xml = r##"<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0" xmlns:l="http://www.w3.org/1999/xlink"><body name="main"><section id="s1"><title><p>Глава один</p></title><p>Текст <emphasis>важный</emphasis>, и <a l:href="#n1" type="note">1</a> конец.</p><empty-line/></section></body></FictionBook>"##;
        let mut doc = parse_document(xml).unwrap();
        let before = doc.clone();
        let translator = ScriptedTranslator::default();
        translate_tree(&mut doc.root, &translator, true).await;

        assert_same_shape(&before.root, &doc.root);
        let out = serialize_document(&doc, &SerializeOptions::compact()).unwrap();
        assert!(out.contains(r##"<a l:href="#n1" type="note">1</a>[ конец.]"##));
        assert!(out.contains("<emphasis>[важный]</emphasis>[, и ]"));
    }

    /// 比较两棵树的标签、属性、子元素顺序和不合格槽位
    fn assert_same_shape(before: &Element, after: &Element) {
        let mut stack = vec![(before, after)];
        while let Some((b, a)) = stack.pop() {
            assert_eq!(b.name, a.name);
            assert_eq!(b.attributes, a.attributes);
            assert_eq!(b.children.len(), a.children.len());
            if !qualifies(b.text.as_deref()) {
                assert_eq!(b.text, a.text);
            }
            if !qualifies(b.tail.as_deref()) {
                assert_eq!(b.tail, a.tail);
            }
            stack.extend(b.children.iter().zip(a.children.iter()));
        }
    }

    #[tokio::test]
    async fn test_submission_order_is_deterministic() {
        let xml = "<r><a>один<b>два</b>три</a>четыре<c>пять</c></r>";
        let first = ScriptedTranslator::default();
        let second = ScriptedTranslator::default();
        translate_tree(&mut parse_document(xml).unwrap().root, &first, true).await;
        translate_tree(&mut parse_document(xml).unwrap().root, &second, true).await;
        assert_eq!(first.calls(), second.calls());
        assert_eq!(first.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_deep_tree_is_walked_iteratively() {
        let depth = 5_000;
        let xml = format!("{}текст{}", "<d>".repeat(depth), "</d>".repeat(depth));
        let mut doc = parse_document(&xml).unwrap();
        let translator = ScriptedTranslator::default();
        let stats = translate_tree(&mut doc.root, &translator, false).await;
        assert_eq!(stats.translated, 1);
        assert_eq!(translator.calls()[0].1.matches('d').count(), depth);
    }
}
