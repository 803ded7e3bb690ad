//! Text normalization for raw program-guide strings.
//!
//! Two passes are applied to every title and description:
//! - [`format_text`] folds full-width alphanumerics and punctuation to half-width, widens a few
//!   display punctuation marks, unifies line terminators, and rewrites recognized bracket tokens
//!   such as `[新]` into their enclosed-character code points.
//! - [`clean_text`] expands enclosed characters back into bracket tokens, drops broadcast
//!   annotation marks, strips program-block branding, and collapses whitespace.
//!
//! Rule order in [`clean_text`] is significant: later rules assume earlier ones already removed
//! enclosing brackets.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

const ZENKAKU_ALNUM: &str = "０１２３４５６７８９ＡＢＣＤＥＦＧＨＩＪＫＬＭＮＯＰＱＲＳＴＵＶＷＸＹＺａｂｃｄｅｆｇｈｉｊｋｌｍｎｏｐｑｒｓｔｕｖｗｘｙｚ";
const HANKAKU_ALNUM: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const ZENKAKU_SYMBOLS: &str = "＂＃＄％＆＇（）＋，－．／：；＜＝＞［＼］＾＿｀｛｜｝　";
const HANKAKU_SYMBOLS: &str = "\"#$%&'()+,-./:;<=>[\\]^_`{|} ";

/// Half-width marks widened for display, plus sharp/wave-dash unification.
const WIDENED_MARKS: [(char, char); 6] = [
    ('!', '！'),
    ('?', '？'),
    ('*', '＊'),
    ('~', '～'),
    ('♯', '#'),
    ('〜', '～'),
];

/// Enclosed characters used by Japanese program guides and their bracket-token spelling.
pub const ENCLOSED_CHARACTERS: [(char, &str); 45] = [
    ('\u{1f14a}', "[HV]"),
    ('\u{1f14c}', "[SD]"),
    ('\u{1f13f}', "[P]"),
    ('\u{1f146}', "[W]"),
    ('\u{1f14b}', "[MV]"),
    ('\u{1f210}', "[手]"),
    ('\u{1f211}', "[字]"),
    ('\u{1f212}', "[双]"),
    ('\u{1f213}', "[デ]"),
    ('\u{1f142}', "[S]"),
    ('\u{1f214}', "[二]"),
    ('\u{1f215}', "[多]"),
    ('\u{1f216}', "[解]"),
    ('\u{1f14d}', "[SS]"),
    ('\u{1f131}', "[B]"),
    ('\u{1f13d}', "[N]"),
    ('\u{1f217}', "[天]"),
    ('\u{1f218}', "[交]"),
    ('\u{1f219}', "[映]"),
    ('\u{1f21a}', "[無]"),
    ('\u{1f21b}', "[料]"),
    ('\u{1f21c}', "[前]"),
    ('\u{1f21d}', "[後]"),
    ('\u{1f21e}', "[再]"),
    ('\u{1f21f}', "[新]"),
    ('\u{1f220}', "[初]"),
    ('\u{1f221}', "[終]"),
    ('\u{1f222}', "[生]"),
    ('\u{1f223}', "[販]"),
    ('\u{1f224}', "[声]"),
    ('\u{1f225}', "[吹]"),
    ('\u{1f14e}', "[PPV]"),
    ('\u{1f200}', "[ほか]"),
    ('\u{1f226}', "[演]"),
    ('\u{1f227}', "[投]"),
    ('\u{1f228}', "[捕]"),
    ('\u{1f229}', "[一]"),
    ('\u{1f22a}', "[三]"),
    ('\u{1f22b}', "[遊]"),
    ('\u{1f22c}', "[左]"),
    ('\u{1f22d}', "[中]"),
    ('\u{1f22e}', "[右]"),
    ('\u{1f22f}', "[指]"),
    ('\u{1f230}', "[走]"),
    ('\u{1f231}', "[打]"),
];

/// Broadcast annotation marks removed when they form a whole bracketed unit.
const ANNOTATION_MARKS: &str = concat!(
    "新|終|再|交|映|手|声|多|副|字|文|CC|OP|二|S|B|SS|無|無料",
    "C|S1|S2|S3|MV|双|デ|D|N|W|P|H|HV|SD|天|解|料|前|後初|生|販|吹|PPV|",
    "演|移|他|収|・|英|韓|中|字/日|字/日英|3D|2K|4K|8K|5.1|7.1|22.2|60P|120P|d|HC|HDR|SHV|UHD|VOD|配|初",
);

/// One step of the branding/noise cascade.
enum NoiseRule {
    /// Replace every match of the pattern.
    Replace(&'static str, &'static str),
    /// A leading block-name prefix followed by a space, `・`, or an opening quote.
    Branding(&'static str),
}

use NoiseRule::{Branding, Replace};

const NOISE_RULES: &[NoiseRule] = &[
    Replace(r"※2K放送", ""),
    Replace(r"【無料】", ""),
    Replace(r"【KNTV】", ""),
    Replace(r"【中】", ""),
    Replace(r"【韓】", ""),
    Replace(r"【字幕】", ""),
    Replace(r"【字幕スーパー】", ""),
    Replace(r"【解説放送】", ""),
    Replace(r"\[釣り\]", ""),
    Replace(r"<独占>", ""),
    Replace(r"【独占】", ""),
    Replace(r"<独占放送>", ""),
    Replace(r"【独占放送】", ""),
    Replace(r"【最新作】", ""),
    Replace(r"【歌詞入り】", ""),
    Replace(r"【.{0,8}ドラマ】", ""),
    Replace(r"【ドラマ.{0,8}】", ""),
    Replace(r"【.{0,8}夜ドラ.{0,8}】", ""),
    Replace(r"【.{0,8}昼ドラ.{0,8}】", ""),
    Replace(r"【.{0,8}時代劇.{0,8}】", ""),
    Replace(r"【.{0,8}一挙.{0,8}】", ""),
    Replace(r"【.*?日本初.*?】", ""),
    Replace(r"【.*?初放送.*?】", ""),
    Replace(r"<.*?一挙.*?>", ""),
    Replace(r"^特: ", ""),
    Branding(r"アニメ"),
    Replace(r"^アニメ\d{1,2}・", ""),
    Replace(r"^アニメ\d{1,2}", ""),
    Branding(r"テレビアニメ"),
    Branding(r"TVアニメ"),
    Branding(r"ドラマ"),
    Branding(r"ドラマシリーズ"),
    Replace(r"^【連続テレビ小説】", "連続テレビ小説 "),
    Replace(r"^【(朝|昼|夕|夕方|夜)アンコール】", ""),
    Replace(r"^ドラマ\d{1,2}・", ""),
    Replace(r"^ドラマ\d{1,2}", ""),
    Branding(r"ドラマ(\+|パラビ|NEXT|プレミア23|チューズ！|ストリーム)"),
    Replace(r"^<BSフジ.*?>", ""),
    Replace(r"^<名作ドラマ劇場>", ""),
    Replace(r"^<(月|火|水|木|金|土|日)ドラ★イレブン>", ""),
    Replace(r"^<午後の名作ドラマ劇場>", ""),
    Branding(r"(月|火|水|木|金|土|日)(ドラ|曜劇場|曜ドラマ|曜ナイトドラマ)"),
    Replace(r"^(月|火|水|木|金|土|日)(ドラ|曜劇場|曜ドラマ|曜ナイトドラマ)\d{1,2}・", ""),
    Replace(r"^(月|火|水|木|金|土|日)(ドラ|曜劇場|曜ドラマ|曜ナイトドラマ)\d{1,2}", ""),
    Branding(r"(真夜中ドラマ|シンドラ|ドラマL|Zドラマ|よるおびドラマ|金曜ドラマDEEP)"),
    Replace(r"◆ドラマイズム】", "】"),
    Replace(r"<韓ドラ>", ""),
    Replace(r"【韓ドラ】", ""),
    Branding(r"韓ドラ"),
    Branding(r"タイドラマ"),
    Replace(r"^韓(☆|◆|◇)", ""),
    Replace(r"^韓ドラ(☆|◆|◇)", ""),
    Replace(r"^華(☆|◆|◇)", ""),
    Replace(r"^華ドラ(☆|◆|◇)", ""),
    Replace(r"^(中国|中華|韓国|韓ドラ)時代劇(☆|◆|◇)", ""),
    Replace(r"^(韓流プレミア|韓流朝ドラ\d{1,2}) ", ""),
    Branding(r"韓流プレミア"),
    Branding(r"(中|韓)(国|流)ドラマ"),
    Replace(r"^(中|韓)(国|流)ドラマ【", "【"),
    Replace(r"<時代劇.*?>", ""),
    Replace(r"\([0-9][0-9][0-9]ch(時代劇|中国ドラマ|韓国ドラマ)\)", ""),
    Replace(r"【時代劇】", ""),
    Branding(r"時代劇"),
    Branding(r"(中|韓)(国|流|国ファンタジー)時代劇"),
    Replace(r"^日5", ""),
    Replace(r"^アニメA・", ""),
    Replace(r"^<アニメギルド>", ""),
    Replace(r"<(M|T|W)ナイト>", ""),
    Replace(r"<ノイタミナ>", ""),
    Replace(r"<\+Ultra>", ""),
    Replace(r"<B8station>", ""),
    Replace(r"AnichU", ""),
    Replace(r"FRIDAY ANIME NIGHT", ""),
    Replace(r"^(月|火|水|木|金|土|日)曜アニメ・水もん ", ""),
    Replace(
        r"【(アニメ|アニメシャワー|アニメ特区|アニメイズム|スーパーアニメイズム|ヌマニメーション|ANiMAZiNG！！！|ANiMAZiNG2！！！)】",
        "",
    ),
];

static FORMAT_TABLE: LazyLock<HashMap<char, char>> = LazyLock::new(|| {
    let mut table: HashMap<char, char> = ZENKAKU_ALNUM.chars().zip(HANKAKU_ALNUM.chars()).collect();
    table.extend(ZENKAKU_SYMBOLS.chars().zip(HANKAKU_SYMBOLS.chars()));
    table.extend(WIDENED_MARKS);
    table
});

static SYMBOL_BY_TOKEN: LazyLock<HashMap<&'static str, char>> = LazyLock::new(|| {
    ENCLOSED_CHARACTERS
        .iter()
        .map(|(symbol, token)| (*token, *symbol))
        .collect()
});

static TOKEN_BY_SYMBOL: LazyLock<HashMap<char, &'static str>> =
    LazyLock::new(|| ENCLOSED_CHARACTERS.iter().copied().collect());

static BRACKET_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\[\]\s]{1,3}\]").expect("valid bracket token pattern"));

static MARK_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\((二|字|再)\)").expect("valid parenthesized mark pattern"),
        Regex::new(&format!(r"(?i)\[({ANNOTATION_MARKS})\]")).expect("valid bracket mark pattern"),
        Regex::new(&format!(r"(?i)【({ANNOTATION_MARKS})】")).expect("valid lenticular mark pattern"),
    ]
});

static COMPILED_NOISE_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    let mut compiled = Vec::new();
    for rule in NOISE_RULES {
        match rule {
            Replace(pattern, replacement) => compiled.push((compile(pattern), *replacement)),
            Branding(prefix) => {
                compiled.push((compile(&format!("^{prefix} ")), ""));
                compiled.push((compile(&format!("^{prefix}・")), ""));
                compiled.push((
                    compile(&format!("^(?:{prefix})「(?P<inner>[^「」]*)」$")),
                    "${inner}",
                ));
                compiled.push((compile(&format!("^{prefix}「")), "「"));
                compiled.push((
                    compile(&format!("^(?:{prefix})『(?P<inner>[^『』]*)』$")),
                    "${inner}",
                ));
                compiled.push((compile(&format!("^{prefix}『")), "『"));
            }
        }
    }
    compiled
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid noise pattern {pattern:?}: {err}"))
}

/// Canonicalize raw program text: half-width alphanumerics/punctuation, widened display marks,
/// `\n` line terminators, and enclosed-character code points for recognized bracket tokens.
///
/// Unrecognized bracket tokens are left untouched. Total: empty input yields empty output.
pub fn format_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let translated: String = unified
        .chars()
        .map(|ch| FORMAT_TABLE.get(&ch).copied().unwrap_or(ch))
        .collect();
    BRACKET_TOKEN
        .replace_all(&translated, |caps: &Captures<'_>| {
            let token = &caps[0];
            match SYMBOL_BY_TOKEN.get(token) {
                Some(symbol) => symbol.to_string(),
                None => token.to_string(),
            }
        })
        .into_owned()
}

/// Strip enclosed characters, annotation marks, and program-block branding from formatted text.
pub fn clean_text(text: &str) -> String {
    let mut result: String = text
        .chars()
        .map(|ch| match TOKEN_BY_SYMBOL.get(&ch) {
            Some(token) => (*token).to_string(),
            None => ch.to_string(),
        })
        .collect();

    for pattern in MARK_PATTERNS.iter() {
        result = pattern.replace_all(&result, " ").into_owned();
    }
    // Anchored branding rules must see the first real character, not the gap a leading mark left.
    result = collapse_whitespace(&result);
    for (pattern, replacement) in COMPILED_NOISE_RULES.iter() {
        result = pattern.replace_all(&result, *replacement).into_owned();
    }

    collapse_whitespace(result.trim())
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}
