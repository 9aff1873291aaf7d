use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use super::{
    intern_topic,
    topic::{ancestor_paths, detect_delimiter, Delimiter},
};

/// Callback подписчика: получает payload опубликованного сообщения.
pub type SubscriberFn = dyn Fn(&Value) + Send + Sync;

/// Идентификатор подписки: стабильный индекс слота внутри канала.
///
/// Индексы выдаются по порядку регистрации и никогда не переиспользуются:
/// отписка оставляет на месте слота tombstone, поэтому ранее выданные
/// идентификаторы остаются однозначными на всё время жизни канала.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) usize);

impl SubscriptionId {
    /// Индекс слота, как его выдал `subscribe`.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Именованный узел маршрутизации.
///
/// Канал, созданный явным вызовом `create` (корневой), один раз при
/// создании вычисляет список своих предков — всех собственных префиксов
/// имени. Каналы-заполнители, созданные под эти префиксы, предков не
/// вычисляют: разворачивание иерархии одноуровневое, без рекурсии.
pub struct Channel {
    name: Arc<str>,
    is_root: bool,
    delimiter: Option<Delimiter>,
    ancestors: Vec<Arc<str>>,
    subscribers: Mutex<Vec<Option<Arc<SubscriberFn>>>>,
}

impl Channel {
    pub(crate) fn new(name: Arc<str>, is_root: bool) -> Self {
        let delimiter = detect_delimiter(&name);
        let ancestors = if is_root {
            ancestor_paths(&name).into_iter().map(intern_topic).collect()
        } else {
            Vec::new()
        };
        Self {
            name,
            is_root,
            delimiter,
            ancestors,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Полное имя темы, под которым канал создан.
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Создан ли канал явно, а не как заполнитель под префикс.
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Разделитель, найденный в имени канала.
    pub fn delimiter(&self) -> Option<Delimiter> {
        self.delimiter
    }

    /// Префиксы-предки, от короткого к длинному. Пусто для заполнителей.
    pub fn ancestors(&self) -> &[Arc<str>] {
        &self.ancestors
    }

    pub(crate) fn push_subscriber(&self, callback: Arc<SubscriberFn>) -> SubscriptionId {
        let mut slots = self.subscribers.lock();
        slots.push(Some(callback));
        SubscriptionId(slots.len() - 1)
    }

    /// Tombstone слота: содержимое очищается, индекс остаётся занятым.
    pub(crate) fn clear_slot(&self, id: SubscriptionId) -> bool {
        let mut slots = self.subscribers.lock();
        match slots.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Количество слотов, включая tombstone-ы.
    pub fn slot_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Есть ли хотя бы один живой подписчик.
    pub fn has_subscribers(&self) -> bool {
        self.subscribers.lock().iter().any(Option::is_some)
    }

    /// Снимок живых подписчиков в порядке регистрации.
    ///
    /// Снимок берётся под замком, вызовы выполняются без него, поэтому
    /// callback может сам подписываться и публиковать. Подписчик,
    /// добавленный во время доставки, в текущий снимок не попадает.
    pub(crate) fn live_subscribers(&self) -> Vec<Arc<SubscriberFn>> {
        self.subscribers.lock().iter().flatten().cloned().collect()
    }

    /// Сбрасывает таблицу слотов целиком.
    ///
    /// В отличие от отписки индексы здесь обнуляются: ранее выданные
    /// `SubscriptionId` после сброса недействительны.
    pub fn clear_subscribers(&self) {
        self.subscribers.lock().clear();
    }
}
