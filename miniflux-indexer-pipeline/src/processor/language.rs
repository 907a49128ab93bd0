//! Language detection built on `whatlang`.

use whatlang::Lang;

/// The only language that is segmented before indexing.
pub const TOKENIZABLE_LANGUAGE: Lang = Lang::Cmn;

/// Code recorded when no language can be detected.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Detect the dominant language of `text`.
///
/// Short or ambiguous text yields the best guess even when the detector
/// marks it unreliable; text without any detectable script yields `None`.
pub fn detect_language(text: &str) -> Option<Lang> {
    whatlang::detect(text).map(|info| info.lang())
}

/// Code stored in the completion record: ISO 639-1, or [`UNKNOWN_LANGUAGE`].
pub fn language_code(language: Option<Lang>) -> &'static str {
    language.map_or(UNKNOWN_LANGUAGE, iso639_1)
}

/// Whether text in `language` must be segmented.
pub fn is_tokenizable(language: Option<Lang>) -> bool {
    language == Some(TOKENIZABLE_LANGUAGE)
}

/// Two-letter ISO 639-1 code of a detected language.
pub fn iso639_1(lang: Lang) -> &'static str {
    match lang {
        Lang::Epo => "eo",
        Lang::Eng => "en",
        Lang::Rus => "ru",
        Lang::Cmn => "zh",
        Lang::Spa => "es",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Ben => "bn",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ukr => "uk",
        Lang::Kat => "ka",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        Lang::Jpn => "ja",
        Lang::Heb => "he",
        Lang::Yid => "yi",
        Lang::Pol => "pl",
        Lang::Amh => "am",
        Lang::Jav => "jv",
        Lang::Kor => "ko",
        Lang::Nob => "nb",
        Lang::Dan => "da",
        Lang::Swe => "sv",
        Lang::Fin => "fi",
        Lang::Tur => "tr",
        Lang::Nld => "nl",
        Lang::Hun => "hu",
        Lang::Ces => "cs",
        Lang::Ell => "el",
        Lang::Bul => "bg",
        Lang::Bel => "be",
        Lang::Mar => "mr",
        Lang::Kan => "kn",
        Lang::Ron => "ro",
        Lang::Slv => "sl",
        Lang::Hrv => "hr",
        Lang::Srp => "sr",
        Lang::Mkd => "mk",
        Lang::Lit => "lt",
        Lang::Lav => "lv",
        Lang::Est => "et",
        Lang::Tam => "ta",
        Lang::Vie => "vi",
        Lang::Urd => "ur",
        Lang::Tha => "th",
        Lang::Guj => "gu",
        Lang::Uzb => "uz",
        Lang::Pan => "pa",
        Lang::Aze => "az",
        Lang::Ind => "id",
        Lang::Tel => "te",
        Lang::Pes => "fa",
        Lang::Mal => "ml",
        Lang::Ori => "or",
        Lang::Mya => "my",
        Lang::Nep => "ne",
        Lang::Sin => "si",
        Lang::Khm => "km",
        Lang::Tuk => "tk",
        Lang::Aka => "ak",
        Lang::Zul => "zu",
        Lang::Sna => "sn",
        Lang::Afr => "af",
        Lang::Lat => "la",
        Lang::Slk => "sk",
        Lang::Cat => "ca",
        Lang::Tgl => "tl",
        Lang::Hye => "hy",
    }
}
