//! Number formats and their classification
//!
//! A number format is an id plus a format code. Ids below 164 are built in
//! and their codes are fixed; higher ids are defined per document.

/// A resolved number format
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberFormat {
    /// numFmtId
    pub id: u32,
    /// Format code, e.g. `yyyy-mm-dd`
    pub code: String,
}

impl NumberFormat {
    // Built-in format IDs
    /// 0 - General
    pub const ID_GENERAL: u32 = 0;
    /// 1 - 0
    pub const ID_NUMBER_INT: u32 = 1;
    /// 2 - 0.00
    pub const ID_NUMBER_DEC2: u32 = 2;
    /// 14 - mm-dd-yy
    pub const ID_DATE_SHORT: u32 = 14;
    /// 21 - h:mm:ss
    pub const ID_TIME_24H_SEC: u32 = 21;
    /// 22 - m/d/yy h:mm
    pub const ID_DATETIME: u32 = 22;
    /// 49 - @
    pub const ID_TEXT: u32 = 49;

    /// First id handed out for formats created by this crate
    pub const FIRST_CUSTOM_ID: u32 = 164;

    /// Create a format from an id and code
    pub fn new<S: Into<String>>(id: u32, code: S) -> Self {
        Self {
            id,
            code: code.into(),
        }
    }

    /// Built-in format by ID, if the id is in the fixed table
    pub fn builtin(id: u32) -> Option<Self> {
        builtin_format_code(id).map(|code| Self::new(id, code))
    }

    /// Check whether the id belongs to the built-in range
    pub fn is_builtin(&self) -> bool {
        self.id < Self::FIRST_CUSTOM_ID
    }

    /// Classify this format's code
    pub fn kind(&self) -> ValueKind {
        classify(&self.code)
    }
}

/// Get built-in format code by ID
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// Built-in id whose code is exactly `code`
pub fn builtin_format_id(code: &str) -> Option<u32> {
    (0..NumberFormat::FIRST_CUSTOM_ID).find(|&id| builtin_format_code(id) == Some(code))
}

/// How a stored number should be typed, as implied by its format code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Plain number shown with decimals, exponent, fraction or `General`
    GeneralNumber,
    /// Number shown without a fractional part (`0`, `#,##0`)
    IntegerDisplay,
    /// Calendar date
    Date,
    /// Time of day or elapsed time
    Time,
    /// Date and time
    DateTime,
    /// Text placeholder (`@`)
    Text,
    /// No recognizable tokens; treated like [`ValueKind::GeneralNumber`]
    Unknown,
}

impl ValueKind {
    /// True for `Date`, `Time` and `DateTime`
    pub fn is_temporal(&self) -> bool {
        matches!(self, ValueKind::Date | ValueKind::Time | ValueKind::DateTime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Year,
    Day,
    M,
    Hour,
    Minute,
    Second,
    AmPm,
    Digit,
    Decimal,
    Exponent,
    Fraction,
    Percent,
    Text,
    General,
}

/// The first `;`-separated section, honouring quotes, escapes and brackets
fn first_section(code: &str) -> &str {
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;

    for (i, c) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !in_quotes => escaped = true,
            '"' if !in_brackets => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            ';' if !in_quotes && !in_brackets => return &code[..i],
            _ => {}
        }
    }
    code
}

fn tokenize(section: &str) -> Vec<Token> {
    let chars: Vec<char> = section.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let starts_with = |i: usize, word: &str| {
        let len = word.chars().count();
        i + len <= chars.len()
            && chars[i..i + len]
                .iter()
                .zip(word.chars())
                .all(|(a, b)| a.eq_ignore_ascii_case(&b))
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    i += 1;
                }
            }
            '\\' | '_' | '*' => i += 1,
            '[' => {
                let start = i + 1;
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                let inner: String = chars[start..i.min(chars.len())].iter().collect();
                let inner = inner.to_ascii_lowercase();
                let elapsed = |letter: char| !inner.is_empty() && inner.chars().all(|c| c == letter);
                if elapsed('h') {
                    tokens.push(Token::Hour);
                } else if elapsed('m') {
                    tokens.push(Token::Minute);
                } else if elapsed('s') {
                    tokens.push(Token::Second);
                }
            }
            _ if starts_with(i, "general") => {
                tokens.push(Token::General);
                i += "general".len() - 1;
            }
            _ if starts_with(i, "am/pm") => {
                tokens.push(Token::AmPm);
                i += "am/pm".len() - 1;
            }
            _ if starts_with(i, "a/p") => {
                tokens.push(Token::AmPm);
                i += "a/p".len() - 1;
            }
            'e' | 'E' if matches!(chars.get(i + 1), Some('+') | Some('-')) => {
                tokens.push(Token::Exponent);
                i += 1;
            }
            'y' | 'Y' | 'e' | 'E' | 'd' | 'D' | 'm' | 'M' | 'h' | 'H' | 's' | 'S' => {
                let lower = c.to_ascii_lowercase();
                while i + 1 < chars.len() && chars[i + 1].to_ascii_lowercase() == lower {
                    i += 1;
                }
                tokens.push(match lower {
                    'y' | 'e' => Token::Year,
                    'd' => Token::Day,
                    'm' => Token::M,
                    'h' => Token::Hour,
                    _ => Token::Second,
                });
            }
            '0' | '#' | '?' => tokens.push(Token::Digit),
            '.' => tokens.push(Token::Decimal),
            '/' => tokens.push(Token::Fraction),
            '%' => tokens.push(Token::Percent),
            '@' => tokens.push(Token::Text),
            _ => {}
        }
        i += 1;
    }

    tokens
}

fn is_datetime_token(t: Token) -> bool {
    matches!(
        t,
        Token::Year
            | Token::Day
            | Token::M
            | Token::Hour
            | Token::Minute
            | Token::Second
            | Token::AmPm
    )
}

/// Decide for each `m` run whether it means minutes: it does when the
/// nearest date/time token before it is an hour, or the nearest after it is
/// a second.
fn resolve_minutes(tokens: &mut [Token]) {
    let positions: Vec<usize> = (0..tokens.len())
        .filter(|&i| is_datetime_token(tokens[i]))
        .collect();

    for (k, &pos) in positions.iter().enumerate() {
        if tokens[pos] != Token::M {
            continue;
        }
        let prev = k.checked_sub(1).map(|j| tokens[positions[j]]);
        let next = positions.get(k + 1).map(|&j| tokens[j]);
        if matches!(prev, Some(Token::Hour)) || matches!(next, Some(Token::Second)) {
            tokens[pos] = Token::Minute;
        }
    }
}

/// Classify a number format code
///
/// # Examples
/// ```
/// use gridstream_core::style::{classify, ValueKind};
///
/// assert_eq!(classify("yyyy-mm-dd"), ValueKind::Date);
/// assert_eq!(classify("h:mm"), ValueKind::Time);
/// assert_eq!(classify("#,##0"), ValueKind::IntegerDisplay);
/// ```
pub fn classify(code: &str) -> ValueKind {
    let mut tokens = tokenize(first_section(code));
    resolve_minutes(&mut tokens);

    let has = |t: Token| tokens.contains(&t);
    let date = has(Token::Year) || has(Token::Day) || has(Token::M);
    let time = has(Token::Hour) || has(Token::Minute) || has(Token::Second) || has(Token::AmPm);

    match (date, time) {
        (true, true) => return ValueKind::DateTime,
        (true, false) => return ValueKind::Date,
        (false, true) => return ValueKind::Time,
        (false, false) => {}
    }

    if has(Token::Text) {
        ValueKind::Text
    } else if has(Token::Digit) {
        if has(Token::Decimal) || has(Token::Exponent) || has(Token::Fraction) || has(Token::Percent)
        {
            ValueKind::GeneralNumber
        } else {
            ValueKind::IntegerDisplay
        }
    } else if has(Token::General) {
        ValueKind::GeneralNumber
    } else {
        ValueKind::Unknown
    }
}
