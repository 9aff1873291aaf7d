use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace};

use super::{intern_topic, topic, Channel, SubscriptionId};

type TopicKey = Arc<str>;

/// Реестр тем с иерархической маршрутизацией.
///
/// Поддерживает:
/// - Ленивое создание каналов вместе с каналами-заполнителями под префиксы
/// - Подписки со стабильными идентификаторами слотов
/// - Доставку публикации в целевой канал и в каналы его префиксов
/// - Счётчики публикаций и "пустых" публикаций
///
/// Направление каскада фиксировано контрактом: публикация в глубокую тему
/// `a:b:c` доставляется и подписчикам широких префиксов `a`, `a:b`. Это
/// обратное по отношению к привычному иерархическому fan-out поведение —
/// намеренное, а не ошибка. Каскад строго двухуровневый: предки предков
/// не посещаются.
pub struct TopicRegistry {
    /// Темы → каналы.
    channels: DashMap<TopicKey, Arc<Channel>>,
    /// Имена тем в порядке создания.
    order: Mutex<Vec<TopicKey>>,
    /// Общее количество вызовов `publish`.
    pub publish_count: AtomicUsize,
    /// Публикации, не нашедшие канала или нашедшие пустую таблицу слотов.
    pub dropped_count: AtomicUsize,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            order: Mutex::new(Vec::new()),
            publish_count: AtomicUsize::new(0),
            dropped_count: AtomicUsize::new(0),
        }
    }

    /// Канал по имени, если он существует.
    fn channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.get(name).map(|entry| entry.value().clone())
    }

    /// Возвращает канал по имени, создавая его при отсутствии.
    ///
    /// Новый канал создаётся корневым; под каждый его префикс, ещё не
    /// известный реестру, создаётся канал-заполнитель. Инвариант: к
    /// моменту возврата каждая запись из списка предков корневого канала
    /// присутствует в реестре.
    fn ensure_channel(&self, name: &str) -> Arc<Channel> {
        if let Some(existing) = self.channel(name) {
            return existing;
        }
        let key = intern_topic(name);
        let root = Arc::new(Channel::new(key.clone(), true));
        self.channels.insert(key.clone(), root.clone());
        self.order.lock().push(key);
        debug!(topic = name, ancestors = root.ancestors().len(), "channel created");

        for path in root.ancestors() {
            if !self.channels.contains_key(&**path) {
                let placeholder = Arc::new(Channel::new(path.clone(), false));
                self.channels.insert(path.clone(), placeholder);
                self.order.lock().push(path.clone());
            }
        }
        root
    }

    /// Явное создание канала. Идемпотентно: повторный вызов — no-op.
    pub fn create(&self, topic: &str) -> &Self {
        self.ensure_channel(topic);
        self
    }

    /// Регистрирует подписчика и возвращает стабильный идентификатор слота.
    ///
    /// Завершающий `*` срезается до поиска: подписка на `"x:*"`
    /// эквивалентна подписке на `"x"`. Отсутствующий канал создаётся.
    pub fn subscribe(
        &self,
        topic: &str,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let base = topic::strip_wildcard(topic).unwrap_or(topic);
        let channel = self.ensure_channel(base);
        let id = channel.push_subscriber(Arc::new(callback));
        trace!(topic = base, id = id.index(), "subscribed");
        id
    }

    /// Снимает подписку, оставляя tombstone на месте слота.
    ///
    /// Best-effort: неизвестный канал и уже очищенный слот молча
    /// игнорируются.
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) {
        if let Some(channel) = self.channel(topic) {
            if channel.clear_slot(id) {
                trace!(topic, id = id.index(), "unsubscribed");
            }
        }
    }

    /// Публикует payload в тему.
    ///
    /// Контракт доставки:
    /// 1. Нет канала или его таблица слотов пуста — no-op, без ошибки.
    /// 2. Иначе payload получают все живые подписчики целевого канала
    ///    в порядке слотов.
    /// 3. Затем, если у канала записаны предки, payload получают живые
    ///    подписчики каждого предка, от короткого префикса к длинному.
    ///    Дальше предков каскад не идёт.
    pub fn publish(&self, topic: &str, payload: &Value) {
        self.publish_count.fetch_add(1, Ordering::Relaxed);

        let Some(target) = self.channel(topic) else {
            self.dropped_count.fetch_add(1, Ordering::Relaxed);
            trace!(topic, "publish into unknown channel dropped");
            return;
        };
        if target.slot_count() == 0 {
            self.dropped_count.fetch_add(1, Ordering::Relaxed);
            return;
        }

        for callback in target.live_subscribers() {
            callback(payload);
        }
        for path in target.ancestors() {
            self.deliver(path, payload);
        }
    }

    /// Доставка payload живым подписчикам одного канала, без каскада.
    fn deliver(&self, topic: &str, payload: &Value) {
        let Some(channel) = self.channel(topic) else {
            return;
        };
        for callback in channel.live_subscribers() {
            callback(payload);
        }
    }

    /// Известна ли тема реестру.
    pub fn contains(&self, topic: &str) -> bool {
        self.channels.contains_key(topic)
    }

    /// Есть ли у темы живые подписчики.
    pub fn has_subscribers(&self, topic: &str) -> bool {
        self.channel(topic).is_some_and(|c| c.has_subscribers())
    }

    /// Имена тем в порядке создания.
    pub fn topic_names(&self) -> Vec<Arc<str>> {
        self.order.lock().clone()
    }

    /// Сбрасывает таблицу подписчиков темы. См. [`Channel::clear_subscribers`].
    pub fn clear_subscribers(&self, topic: &str) {
        if let Some(channel) = self.channel(topic) {
            channel.clear_subscribers();
        }
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}
