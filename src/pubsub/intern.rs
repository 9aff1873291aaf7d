use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Пул для повторного использования `Arc<str>` по одинаковым именам тем.
/// Одна и та же тема фигурирует как ключ реестра, имя канала и элемент
/// списков предков, поэтому интернирование заметно сокращает копии.
static TOPIC_INTERN: Lazy<DashMap<String, Arc<str>>> = Lazy::new(DashMap::new);

/// Возвращает interned `Arc<str>` для имени темы.
#[inline(always)]
pub(crate) fn intern_topic<S: AsRef<str>>(topic: S) -> Arc<str> {
    let key = topic.as_ref();
    if let Some(existing) = TOPIC_INTERN.get(key) {
        return existing.clone();
    }
    TOPIC_INTERN
        .entry(key.to_string())
        .or_insert_with(|| Arc::from(key))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Повторное интернирование одного имени возвращает тот же `Arc<str>`.
    #[test]
    fn intern_repeats_share_allocation() {
        let a1 = intern_topic("app:view");
        let a2 = intern_topic("app:view");
        assert_eq!(&*a1, "app:view");
        assert!(Arc::ptr_eq(&a1, &a2));
    }

    /// Для разных имён создаются разные `Arc<str>`.
    #[test]
    fn intern_different_topics() {
        let a1 = intern_topic("nav");
        let a2 = intern_topic("nav:menu");
        assert!(!Arc::ptr_eq(&a1, &a2));
    }
}
