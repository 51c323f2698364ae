//! 内置词典后端
//!
//! 朴素的逐词替换：按词查表，保留首字母大小写，其余字符原样保留。
//! 一个词都没有命中时视为翻译失败，原文保持不变。

// 标准库导入
use std::collections::HashMap;
use std::sync::LazyLock;

// 第三方crate导入
use async_trait::async_trait;
use regex::Regex;

// 本地模块导入
use crate::error::Result;
use crate::translation_error;
use crate::translator::{Provider, Translate};

/// 俄语 → 塞尔维亚语（西里尔字母）常用词
const RU_SR_WORDS: &[(&str, &str)] = &[
    ("привет", "здраво"),
    ("здравствуйте", "здраво"),
    ("мир", "свет"),
    ("спасибо", "хвала"),
    ("пожалуйста", "молим"),
    ("да", "да"),
    ("нет", "не"),
    ("не", "не"),
    ("и", "и"),
    ("или", "или"),
    ("но", "али"),
    ("в", "у"),
    ("на", "на"),
    ("с", "са"),
    ("из", "из"),
    ("я", "ја"),
    ("ты", "ти"),
    ("он", "он"),
    ("она", "она"),
    ("мы", "ми"),
    ("вы", "ви"),
    ("они", "они"),
    ("это", "ово"),
    ("что", "што"),
    ("кто", "ко"),
    ("как", "како"),
    ("где", "где"),
    ("когда", "када"),
    ("почему", "зашто"),
    ("был", "био"),
    ("была", "била"),
    ("было", "било"),
    ("сказал", "рекао"),
    ("сказала", "рекла"),
    ("очень", "веома"),
    ("хорошо", "добро"),
    ("только", "само"),
    ("уже", "већ"),
    ("ещё", "још"),
    ("еще", "још"),
    ("тоже", "такође"),
    ("всегда", "увек"),
    ("никогда", "никад"),
    ("теперь", "сада"),
    ("сегодня", "данас"),
    ("завтра", "сутра"),
    ("вчера", "јуче"),
    ("человек", "човек"),
    ("день", "дан"),
    ("ночь", "ноћ"),
    ("утро", "јутро"),
    ("вечер", "вече"),
    ("время", "време"),
    ("жизнь", "живот"),
    ("любовь", "љубав"),
    ("война", "рат"),
    ("слово", "реч"),
    ("книга", "књига"),
    ("глава", "поглавље"),
    ("голова", "глава"),
    ("дом", "кућа"),
    ("город", "град"),
    ("друг", "пријатељ"),
    ("мать", "мајка"),
    ("отец", "отац"),
    ("сын", "син"),
    ("дочь", "ћерка"),
    ("вода", "вода"),
    ("рука", "рука"),
    ("глаза", "очи"),
];

// 连续字母组成一个词
static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}+").expect("词匹配正则表达式无效"));

pub struct DictionaryTranslator {
    words: HashMap<&'static str, &'static str>,
}

impl DictionaryTranslator {
    pub fn new() -> Self {
        Self {
            words: RU_SR_WORDS.iter().copied().collect(),
        }
    }

    /// 逐词替换，返回译文和命中的词数
    pub fn translate_words(&self, text: &str) -> (String, usize) {
        let mut hits = 0;
        let translated = WORD_REGEX.replace_all(text, |caps: &regex::Captures<'_>| {
            let word = &caps[0];
            let lower = word.to_lowercase();
            match self.words.get(lower.as_str()) {
                Some(replacement) => {
                    hits += 1;
                    match_case(word, replacement)
                }
                None => word.to_string(),
            }
        });
        (translated.into_owned(), hits)
    }
}

impl Default for DictionaryTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// 按原词的大小写形式调整替换词
fn match_case(original: &str, replacement: &str) -> String {
    let mut original_chars = original.chars();
    let first_upper = original_chars.next().is_some_and(char::is_uppercase);
    let all_upper = first_upper && original.chars().count() > 1 && original_chars.all(char::is_uppercase);

    if all_upper {
        replacement.to_uppercase()
    } else if first_upper {
        let mut chars = replacement.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else {
        replacement.to_string()
    }
}

#[async_trait]
impl Translate for DictionaryTranslator {
    fn name(&self) -> &str {
        Provider::Dictionary.as_str()
    }

    async fn attempt_translate(&self, text: &str, _context: &str) -> Result<String> {
        let (translated, hits) = self.translate_words(text);
        if hits == 0 {
            return Err(translation_error!(empty, Provider::Dictionary));
        }
        Ok(translated)
    }
}
