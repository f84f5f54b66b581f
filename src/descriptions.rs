//! フレーバーテキスト（description）の生成
//!
//! テンプレートと4つの語彙リストから1件ずつ独立にランダム抽出して埋め込み、
//! 最後にプール全体を1回シャッフルする。

use rand::Rng;
use rand::seq::SliceRandom;

pub const TEMPLATES: [&str; 10] = [
    "A {color} {object} radiating {element}, suspended in a {context} of infinite stars.",
    "A celestial {object} glowing with {color} light, guarding a {context} of cosmic secrets.",
    "A {color} {object} pulsating with {element}, floating amidst a {context} of ethereal energy.",
    "A majestic {object} cloaked in {color} stardust, reigning over a {context} of galactic wonder.",
    "A {color} {object} forged in a {context}, shimmering with {element} of celestial origin.",
    "A radiant {object} bathed in {color} hues, emerging from a {context} of cosmic chaos.",
    "A {color} {object} channeling {element}, orbiting a {context} of astral beauty.",
    "A mystical {object} aglow with {color} essence, drifting through a {context} of nebulae.",
    "A {color} {object} imbued with {element}, standing sentinel in a {context} of cosmic void.",
    "A celestial {object} wrapped in {color} energy, illuminating a {context} of starlit dreams.",
];

pub const OBJECTS: [&str; 20] = [
    "guardian", "portal", "orb", "relic", "monolith", "amulet", "spire", "sentinel",
    "vortex", "crystal", "totem", "shard", "beacon", "obelisk", "diadem", "vessel",
    "specter", "construct", "entity", "flame",
];

pub const COLORS: [&str; 15] = [
    "azure", "crimson", "violet", "emerald", "golden", "silver", "amethyst", "sapphire",
    "ruby", "obsidian", "turquoise", "iridescent", "neon", "indigo", "celestial blue",
];

pub const ELEMENTS: [&str; 10] = [
    "stardust", "plasma", "ether", "cosmic fire", "void essence", "lunar mist",
    "solar flares", "nebula wisps", "astral light", "quantum energy",
];

pub const CONTEXTS: [&str; 10] = [
    "nebula", "galactic rift", "star cluster", "cosmic storm", "etheric plane",
    "void expanse", "celestial abyss", "astral sea", "supernova remnant", "cosmic horizon",
];

/// テンプレートに埋め込む4つの値
#[derive(Debug, Clone, Copy)]
pub struct Slots<'a> {
    pub object: &'a str,
    pub color: &'a str,
    pub element: &'a str,
    pub context: &'a str,
}

/// プレースホルダを置換する。テンプレートに無いスロットは無視される
pub fn render(template: &str, slots: &Slots) -> String {
    template
        .replace("{object}", slots.object)
        .replace("{color}", slots.color)
        .replace("{element}", slots.element)
        .replace("{context}", slots.context)
}

fn pick<'a, R: Rng + ?Sized>(list: &[&'a str], rng: &mut R) -> &'a str {
    // 語彙リストは全て定数で空ではない
    list.choose(rng).copied().unwrap_or_default()
}

/// 1件分をランダムに生成（各リストから復元抽出）
pub fn random_description<R: Rng + ?Sized>(rng: &mut R) -> String {
    let template = pick(&TEMPLATES, rng);
    let slots = Slots {
        object: pick(&OBJECTS, rng),
        color: pick(&COLORS, rng),
        element: pick(&ELEMENTS, rng),
        context: pick(&CONTEXTS, rng),
    };
    render(template, &slots)
}

/// n 件の description プールを生成
pub fn generate_pool<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<String> {
    (0..n).map(|_| random_description(rng)).collect()
}

/// プール全体を1回だけシャッフルする
pub fn permute<R: Rng + ?Sized>(mut pool: Vec<String>, rng: &mut R) -> Vec<String> {
    pool.shuffle(rng);
    pool
}

pub fn generate_descriptions<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<String> {
    let pool = generate_pool(n, rng);
    permute(pool, rng)
}
