//! Unicode tables for LaTeX macros.

/// Replacement text for argument-less macros.
pub(crate) fn symbol(name: &str) -> Option<&'static str> {
    let text = match name {
        // Text symbols
        "ss" => "ß",
        "SS" => "SS",
        "o" => "ø",
        "O" => "Ø",
        "ae" => "æ",
        "AE" => "Æ",
        "oe" => "œ",
        "OE" => "Œ",
        "aa" => "å",
        "AA" => "Å",
        "l" => "ł",
        "L" => "Ł",
        "i" => "ı",
        "j" => "ȷ",
        "S" | "textsection" => "§",
        "P" | "textparagraph" => "¶",
        "dag" | "textdagger" => "†",
        "ddag" | "textdaggerdbl" => "‡",
        "copyright" | "textcopyright" => "©",
        "textregistered" => "®",
        "texttrademark" => "™",
        "pounds" | "textsterling" => "£",
        "euro" | "texteuro" => "€",
        "textyen" => "¥",
        "ldots" | "dots" | "textellipsis" => "…",
        "textbackslash" => "\\",
        "textasciitilde" => "~",
        "textasciicircum" => "^",
        "textbar" => "|",
        "textless" => "<",
        "textgreater" => ">",
        "textendash" => "–",
        "textemdash" => "—",
        "textquoteleft" => "‘",
        "textquoteright" => "’",
        "textquotedblleft" => "“",
        "textquotedblright" => "”",
        "guillemotleft" | "guillemetleft" => "«",
        "guillemotright" | "guillemetright" => "»",
        "textdegree" | "degree" => "°",
        "textbullet" => "•",
        "textperthousand" => "‰",
        "textmu" | "micro" => "µ",
        "textonehalf" => "½",
        "textcelsius" => "℃",
        "LaTeX" => "LaTeX",
        "LaTeXe" => "LaTeX2e",
        "TeX" => "TeX",
        "BibTeX" => "BibTeX",
        "slash" => "/",
        "newline" | "linebreak" | "par" => "\n",
        "quad" | "qquad" | "enspace" | "thinspace" | "space" | "hfill" => " ",
        // Greek
        "alpha" => "α",
        "beta" => "β",
        "gamma" => "γ",
        "delta" => "δ",
        "epsilon" => "ϵ",
        "varepsilon" => "ε",
        "zeta" => "ζ",
        "eta" => "η",
        "theta" => "θ",
        "vartheta" => "ϑ",
        "iota" => "ι",
        "kappa" => "κ",
        "lambda" => "λ",
        "mu" => "μ",
        "nu" => "ν",
        "xi" => "ξ",
        "pi" => "π",
        "varpi" => "ϖ",
        "rho" => "ρ",
        "varrho" => "ϱ",
        "sigma" => "σ",
        "varsigma" => "ς",
        "tau" => "τ",
        "upsilon" => "υ",
        "phi" => "ϕ",
        "varphi" => "φ",
        "chi" => "χ",
        "psi" => "ψ",
        "omega" => "ω",
        "Gamma" => "Γ",
        "Delta" => "Δ",
        "Theta" => "Θ",
        "Lambda" => "Λ",
        "Xi" => "Ξ",
        "Pi" => "Π",
        "Sigma" => "Σ",
        "Upsilon" => "Υ",
        "Phi" => "Φ",
        "Psi" => "Ψ",
        "Omega" => "Ω",
        // Math operators and relations
        "times" => "×",
        "div" => "÷",
        "pm" => "±",
        "mp" => "∓",
        "cdot" => "⋅",
        "ast" => "∗",
        "star" => "⋆",
        "circ" => "∘",
        "bullet" => "∙",
        "oplus" => "⊕",
        "otimes" => "⊗",
        "leq" | "le" => "≤",
        "geq" | "ge" => "≥",
        "ll" => "≪",
        "gg" => "≫",
        "neq" | "ne" => "≠",
        "approx" => "≈",
        "sim" => "∼",
        "simeq" => "≃",
        "cong" => "≅",
        "equiv" => "≡",
        "propto" => "∝",
        "lesssim" => "≲",
        "gtrsim" => "≳",
        "infty" => "∞",
        "partial" => "∂",
        "nabla" => "∇",
        "sum" => "∑",
        "prod" => "∏",
        "int" => "∫",
        "oint" => "∮",
        "in" => "∈",
        "notin" => "∉",
        "ni" => "∋",
        "subset" => "⊂",
        "subseteq" => "⊆",
        "supset" => "⊃",
        "supseteq" => "⊇",
        "cup" => "∪",
        "cap" => "∩",
        "setminus" => "∖",
        "emptyset" | "varnothing" => "∅",
        "forall" => "∀",
        "exists" => "∃",
        "neg" | "lnot" => "¬",
        "wedge" | "land" => "∧",
        "vee" | "lor" => "∨",
        "perp" => "⊥",
        "parallel" => "∥",
        "mid" => "∣",
        "angle" => "∠",
        "prime" => "′",
        "ell" => "ℓ",
        "hbar" => "ℏ",
        "Re" => "ℜ",
        "Im" => "ℑ",
        "aleph" => "ℵ",
        "cdots" => "⋯",
        "vdots" => "⋮",
        "ddots" => "⋱",
        "to" | "rightarrow" => "→",
        "gets" | "leftarrow" => "←",
        "Rightarrow" | "implies" => "⇒",
        "Leftarrow" => "⇐",
        "leftrightarrow" => "↔",
        "Leftrightarrow" | "iff" => "⇔",
        "mapsto" => "↦",
        "uparrow" => "↑",
        "downarrow" => "↓",
        "langle" => "⟨",
        "rangle" => "⟩",
        "lfloor" => "⌊",
        "rfloor" => "⌋",
        "lceil" => "⌈",
        "rceil" => "⌉",
        "lbrace" => "{",
        "rbrace" => "}",
        "vert" => "|",
        "Vert" => "‖",
        "backslash" => "\\",
        // Named functions
        "log" => "log",
        "ln" => "ln",
        "exp" => "exp",
        "sin" => "sin",
        "cos" => "cos",
        "tan" => "tan",
        "sinh" => "sinh",
        "cosh" => "cosh",
        "tanh" => "tanh",
        "arg" => "arg",
        "det" => "det",
        "dim" => "dim",
        "max" => "max",
        "min" => "min",
        "sup" => "sup",
        "inf" => "inf",
        "lim" => "lim",
        "deg" => "deg",
        "Pr" => "Pr",
        _ => return None,
    };
    Some(text)
}

/// Replacement for control symbols (`\%`, `\,`, ...).
pub(crate) fn control_symbol(symbol: &str) -> Option<&'static str> {
    let text = match symbol {
        "%" => "%",
        "&" => "&",
        "#" => "#",
        "$" => "$",
        "_" => "_",
        "{" => "{",
        "}" => "}",
        "|" => "‖",
        "\\" => "\n",
        "," | ";" | ":" | ">" | " " | "\t" | "\n" | "\r" => " ",
        "!" | "/" | "-" | "@" => "",
        _ => return None,
    };
    Some(text)
}

/// Combining mark for an accent macro.
pub(crate) fn accent_mark(name: &str) -> Option<char> {
    let mark = match name {
        "'" => '\u{0301}',
        "`" => '\u{0300}',
        "^" => '\u{0302}',
        "\"" => '\u{0308}',
        "~" => '\u{0303}',
        "=" => '\u{0304}',
        "." => '\u{0307}',
        "u" => '\u{0306}',
        "v" => '\u{030C}',
        "H" => '\u{030B}',
        "c" => '\u{0327}',
        "d" => '\u{0323}',
        "b" => '\u{0331}',
        "r" => '\u{030A}',
        "k" => '\u{0328}',
        "t" => '\u{0361}',
        _ => return None,
    };
    Some(mark)
}

/// Precomposed letters as `(base, composed)` pairs, keyed by combining mark.
const PRECOMPOSED: &[(char, &str)] = &[
    ('\u{0301}', "aáeéiíoóuúyýAÁEÉIÍOÓUÚYÝcćCĆnńNŃsśSŚzźZŹlĺLĹrŕRŔgǵ"),
    ('\u{0300}', "aàeèiìoòuùAÀEÈIÌOÒUÙ"),
    ('\u{0302}', "aâeêiîoôuûAÂEÊIÎOÔUÛcĉgĝhĥjĵsŝwŵyŷ"),
    ('\u{0308}', "aäeëiïoöuüyÿAÄEËIÏOÖUÜYŸ"),
    ('\u{0303}', "aãnñoõiĩuũAÃNÑOÕ"),
    ('\u{0304}', "aāeēiīoōuūAĀEĒIĪOŌUŪ"),
    ('\u{0307}', "cċeėgġzżCĊEĖGĠIİZŻ"),
    ('\u{0306}', "aăgğuŭAĂGĞUŬ"),
    ('\u{030C}', "cčdďeěnňrřsštťzžCČDĎEĚNŇRŘSŠTŤZŽ"),
    ('\u{030B}', "oőuűOŐUŰ"),
    ('\u{0327}', "cçsştţCÇSŞTŢ"),
    ('\u{030A}', "aåuůAÅUŮ"),
    ('\u{0328}', "aąeęAĄEĘ"),
];

/// Apply a combining mark to a letter.
///
/// Returns the precomposed character where one exists, otherwise the base
/// followed by the mark. Dotless `ı` composes like `i`.
pub(crate) fn compose(mark: char, base: char) -> String {
    let base = if base == 'ı' { 'i' } else { base };
    let composed = PRECOMPOSED
        .iter()
        .find(|(m, _)| *m == mark)
        .and_then(|(_, pairs)| {
            let chars: Vec<char> = pairs.chars().collect();
            chars
                .chunks_exact(2)
                .find(|pair| pair[0] == base)
                .map(|pair| pair[1])
        });
    match composed {
        Some(c) => c.to_string(),
        None => [base, mark].iter().collect(),
    }
}
