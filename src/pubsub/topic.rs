//! Разбор путей тем: определение разделителя, вычисление префиксов
//! и строковые помощники для wildcard-подписок.

/// Разделитель сегментов в имени темы.
///
/// Порядок проверки фиксирован: `:` ищется раньше `.`, поэтому тема
/// `"a:b.c"` считается разделённой двоеточием.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Colon,
    Dot,
}

impl Delimiter {
    /// Символ разделителя.
    pub const fn as_char(self) -> char {
        match self {
            Delimiter::Colon => ':',
            Delimiter::Dot => '.',
        }
    }
}

/// Определяет разделитель по первому вхождению в имя темы.
///
/// Возвращает `None`, если ни `:`, ни `.` не встречаются — такая тема
/// не имеет предков.
pub fn detect_delimiter(topic: &str) -> Option<Delimiter> {
    if topic.contains(':') {
        Some(Delimiter::Colon)
    } else if topic.contains('.') {
        Some(Delimiter::Dot)
    } else {
        None
    }
}

/// Все собственные префиксы пути темы, от короткого к длинному.
///
/// `"a:b:c"` даёт `["a", "a:b"]`; тема без разделителя — пустой список.
/// Сама тема в список не входит.
pub fn ancestor_paths(topic: &str) -> Vec<String> {
    let Some(delimiter) = detect_delimiter(topic) else {
        return Vec::new();
    };
    let sep = delimiter.as_char();
    let segments: Vec<&str> = topic.split(sep).collect();

    let mut paths = Vec::with_capacity(segments.len().saturating_sub(1));
    let mut prefix = String::new();
    for segment in &segments[..segments.len() - 1] {
        if !prefix.is_empty() {
            prefix.push(sep);
        }
        prefix.push_str(segment);
        paths.push(prefix.clone());
    }
    paths
}

/// Заканчивается ли имя темы одиночным `*`.
pub fn ends_with_wildcard(topic: &str) -> bool {
    topic.ends_with('*')
}

/// Имя темы без завершающего `*`, либо `None`, если маркера не было.
///
/// Маркер не задаёт шаблон: `"x:*"` означает ровно `"x"`. Поэтому вместе
/// с маркером убирается и разделитель перед ним.
pub fn strip_wildcard(topic: &str) -> Option<&str> {
    let base = topic.strip_suffix('*')?;
    Some(
        base.strip_suffix(':')
            .or_else(|| base.strip_suffix('.'))
            .unwrap_or(base),
    )
}
