//! 塞尔维亚语西里尔字母 → 拉丁字母转写

// 本地模块导入
use crate::document::Element;

/// 西里尔字母到拉丁字母（Gaj 拉丁字母）对照表
const CYRILLIC_TO_LATIN: &[(char, &str)] = &[
    ('А', "A"), ('Б', "B"), ('В', "V"), ('Г', "G"), ('Д', "D"), ('Ђ', "Đ"),
    ('Е', "E"), ('Ж', "Ž"), ('З', "Z"), ('И', "I"), ('Ј', "J"), ('К', "K"),
    ('Л', "L"), ('Љ', "Lj"), ('М', "M"), ('Н', "N"), ('Њ', "Nj"), ('О', "O"),
    ('П', "P"), ('Р', "R"), ('С', "S"), ('Т', "T"), ('Ћ', "Ć"), ('У', "U"),
    ('Ф', "F"), ('Х', "H"), ('Ц', "C"), ('Ч', "Č"), ('Џ', "Dž"), ('Ш', "Š"),
    ('а', "a"), ('б', "b"), ('в', "v"), ('г', "g"), ('д', "d"), ('ђ', "đ"),
    ('е', "e"), ('ж', "ž"), ('з', "z"), ('и', "i"), ('ј', "j"), ('к', "k"),
    ('л', "l"), ('љ', "lj"), ('м', "m"), ('н', "n"), ('њ', "nj"), ('о', "o"),
    ('п', "p"), ('р', "r"), ('с', "s"), ('т', "t"), ('ћ', "ć"), ('у', "u"),
    ('ф', "f"), ('х', "h"), ('ц', "c"), ('ч', "č"), ('џ', "dž"), ('ш', "š"),
];

fn latin_for(c: char) -> Option<&'static str> {
    CYRILLIC_TO_LATIN
        .iter()
        .find(|(cyrillic, _)| *cyrillic == c)
        .map(|(_, latin)| *latin)
}

/// 逐字符转写，表外字符原样保留
pub fn convert_to_latin(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match latin_for(c) {
            Some(latin) => result.push_str(latin),
            None => result.push(c),
        }
    }
    result
}

/// 转写整棵树中所有 text 和 tail 槽，返回修改过的槽位数
pub fn convert_tree_to_latin(root: &mut Element) -> usize {
    let mut converted = 0;
    let mut stack: Vec<&mut Element> = vec![root];

    while let Some(node) = stack.pop() {
        for slot in [&mut node.text, &mut node.tail] {
            if let Some(text) = slot.as_mut() {
                let latin = convert_to_latin(text);
                if latin != *text {
                    *text = latin;
                    converted += 1;
                }
            }
        }
        stack.extend(node.children.iter_mut());
    }

    converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    #[test]
    fn test_digraphs_and_diacritics() {
        assert_eq!(convert_to_latin("Љубав и њива"), "Ljubav i njiva");
        assert_eq!(convert_to_latin("Џеп, ћерка, ђак, шума"), "Džep, ćerka, đak, šuma");
        assert_eq!(convert_to_latin("Здраво, свете!"), "Zdravo, svete!");
    }

    #[test]
    fn test_non_serbian_characters_untouched() {
        // 俄语特有字母不在表中
        assert_eq!(convert_to_latin("ыэ 123 abc"), "ыэ 123 abc");
    }

    #[test]
    fn test_tree_conversion_covers_text_and_tail() {
        let mut doc = parse_document("<r>Глава<p>Реч</p>крај<p>ok</p></r>").unwrap();
        let converted = convert_tree_to_latin(&mut doc.root);
        assert_eq!(converted, 3);
        assert_eq!(doc.root.text.as_deref(), Some("Glava"));
        assert_eq!(doc.root.children[0].text.as_deref(), Some("Reč"));
        assert_eq!(doc.root.children[0].tail.as_deref(), Some("kraj"));
        assert_eq!(doc.root.children[1].text.as_deref(), Some("ok"));
    }
}
