use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::action::{Action, ActionFn, DefaultActionFn};
use crate::{error::StackResult, pubsub::TopicRegistry};

/// Запись стека.
struct StackEntry {
    action: Action,
    payload: Value,
    context: Option<Value>,
}

#[derive(Default)]
struct StackInner {
    /// Слотовая таблица записей: tombstone-ы остаются на месте, индексы
    /// никогда не переиспользуются и не сдвигаются.
    entries: Vec<Option<StackEntry>>,
    /// Именованные ключи → слот живой записи (`None` — ключ закрыт).
    named: HashMap<String, Option<usize>>,
    default_action: Option<Arc<DefaultActionFn>>,
    after_action: Option<Arc<ActionFn>>,
}

impl StackInner {
    fn push_entry(&mut self, action: Action, payload: Value, context: Option<Value>) -> usize {
        let slot = self.entries.len();
        self.entries.push(Some(StackEntry {
            action,
            payload,
            context,
        }));
        slot
    }

    fn clear_slot(&mut self, slot: usize) -> Option<usize> {
        match self.entries.get_mut(slot) {
            Some(entry @ Some(_)) => {
                *entry = None;
                Some(slot)
            }
            _ => None,
        }
    }

    fn is_live(&self, slot: usize) -> bool {
        self.entries.get(slot).is_some_and(Option::is_some)
    }
}

/// Стек отменяемых действий ("escape stack").
///
/// Упорядоченный реестр отложенных действий, адресуемых номером слота и,
/// опционально, строковым ключом. Последняя открытая запись разрешается
/// первой: внешний триггер вызывает [`execute`](Self::execute) без
/// аргумента, тот ищет ближайшую живую запись с вершины вниз и запускает
/// её, а при полностью пустом стеке срабатывает настраиваемое действие
/// по умолчанию.
///
/// Действия-темы выполняются публикацией через [`TopicRegistry`], поэтому
/// стек конструируется поверх конкретного реестра.
///
/// Вся таблица и карта ключей живут за одним замком; callback-и всегда
/// вызываются с отпущенным замком, так что из действия можно открывать,
/// закрывать и публиковать повторно.
pub struct ActionStack {
    registry: Arc<TopicRegistry>,
    inner: Mutex<StackInner>,
}

impl ActionStack {
    pub fn new(registry: Arc<TopicRegistry>) -> Self {
        Self {
            registry,
            inner: Mutex::new(StackInner::default()),
        }
    }

    /// Задаёт действие по умолчанию на этапе конструирования.
    pub fn with_default_action(self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.set_default_action(f);
        self
    }

    /// Задаёт сопутствующее действие на этапе конструирования.
    pub fn with_after_action(
        self,
        f: impl Fn(Option<&Value>, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.set_after_action(f);
        self
    }

    /// Действие по умолчанию: запускается, когда живых записей не нашлось.
    pub fn set_default_action(&self, f: impl Fn() + Send + Sync + 'static) {
        self.inner.lock().default_action = Some(Arc::new(f));
    }

    /// Сопутствующее действие: запускается сразу после успешного запуска
    /// любой записи, с теми же контекстом и payload-ом.
    pub fn set_after_action(&self, f: impl Fn(Option<&Value>, &Value) + Send + Sync + 'static) {
        self.inner.lock().after_action = Some(Arc::new(f));
    }

    /// Реестр, через который выполняются действия-темы.
    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    /// Кладёт запись в стек и возвращает номер её слота.
    pub fn add(&self, action: Action, payload: Value, context: Option<Value>) -> usize {
        self.inner.lock().push_entry(action, payload, context)
    }

    /// Динамический вариант [`add`](Self::add): действие приходит
    /// JSON-значением и отвергается, если это не строка-тема.
    pub fn add_value(
        &self,
        action: Value,
        payload: Value,
        context: Option<Value>,
    ) -> StackResult<usize> {
        Ok(self.add(Action::try_from(action)?, payload, context))
    }

    /// Tombstone записи без запуска. `None` — слот пуст или вне таблицы.
    pub fn remove(&self, slot: usize) -> Option<usize> {
        self.inner.lock().clear_slot(slot)
    }

    /// Запускает запись слота.
    ///
    /// - Тема без контекста: публикация через реестр, затем удаление.
    /// - Тема с контекстом: запуск пропускается, запись остаётся на месте
    ///   не запущенной и не удалённой. Поведение унаследовано контрактом;
    ///   диагностируется через `warn!`.
    /// - Callback: вызов с контекстом и payload-ом, затем удаление —
    ///   независимо от того, что callback сделал.
    ///
    /// После успешного запуска срабатывает сопутствующее действие.
    /// Возвращает номер слота при успехе, `None` — пустой слот или
    /// пропущенный запуск.
    pub fn run(&self, slot: usize) -> Option<usize> {
        let (action, payload, context, after) = {
            let inner = self.inner.lock();
            let entry = inner.entries.get(slot)?.as_ref()?;
            (
                entry.action.clone(),
                entry.payload.clone(),
                entry.context.clone(),
                inner.after_action.clone(),
            )
        };

        let removed = match action {
            Action::Topic(name) => {
                if context.is_some() {
                    warn!(
                        slot,
                        topic = %name,
                        "topic action with a context is never run; entry left in place"
                    );
                    return None;
                }
                self.registry.publish(&name, &payload);
                trace!(slot, topic = %name, "topic action published");
                self.remove(slot)
            }
            Action::Callback(f) => {
                f(context.as_ref(), &payload);
                self.remove(slot)
            }
        };

        if let Some(after) = after {
            after(context.as_ref(), &payload);
        }
        removed
    }

    /// Поиск с вершины вниз: разрешает ближайшую живую запись.
    ///
    /// - `Some(n)`: запустить слот `n`, если он жив, иначе шагнуть к
    ///   `n - 1`; на слоте `0` вместо шага срабатывает действие по
    ///   умолчанию.
    /// - `None`: начать с верхнего слота таблицы; для пустой таблицы
    ///   сразу срабатывает действие по умолчанию.
    ///
    /// Полностью затомбстоненный стек приводит к действию по умолчанию
    /// ровно один раз; без настроенного действия вызов просто возвращает
    /// `None`.
    pub fn execute(&self, slot: Option<usize>) -> Option<usize> {
        let start = match slot {
            Some(s) => s,
            None => {
                let len = self.inner.lock().entries.len();
                match len.checked_sub(1) {
                    Some(top) => top,
                    None => {
                        self.fire_default();
                        return None;
                    }
                }
            }
        };

        let mut current = start;
        loop {
            if self.inner.lock().is_live(current) {
                return self.run(current);
            }
            if current == 0 {
                self.fire_default();
                return None;
            }
            current -= 1;
        }
    }

    fn fire_default(&self) {
        let default = self.inner.lock().default_action.clone();
        match default {
            Some(f) => {
                debug!("no live entries; running default action");
                f();
            }
            None => trace!("no live entries and no default action"),
        }
    }

    /// Именованная регистрация с семантикой замены: живая запись,
    /// уже числящаяся за ключом, удаляется без запуска. Слот новой
    /// записи записывается за ключом.
    pub fn open(
        &self,
        key: &str,
        action: Action,
        payload: Value,
        context: Option<Value>,
    ) -> usize {
        let mut inner = self.inner.lock();
        if let Some(Some(previous)) = inner.named.get(key).copied() {
            if inner.clear_slot(previous).is_some() {
                debug!(key, slot = previous, "reopened key; previous entry discarded");
            }
        }
        let slot = inner.push_entry(action, payload, context);
        inner.named.insert(key.to_string(), Some(slot));
        slot
    }

    /// Закрывает ключ с запуском: записанный слот разрешается через
    /// [`execute`](Self::execute) (поиск с вершины вниз, не прямой
    /// запуск), затем запись за ключом очищается. Ключ без записи — no-op.
    pub fn close(&self, key: &str) {
        let slot = self.inner.lock().named.get(key).copied().flatten();
        if let Some(slot) = slot {
            self.execute(Some(slot));
            self.inner.lock().named.insert(key.to_string(), None);
        }
    }

    /// Закрывает ключ без запуска: запись удаляется напрямую, минуя
    /// выполнение, запись за ключом очищается.
    pub fn cancel(&self, key: &str) {
        let mut inner = self.inner.lock();
        if let Some(slot) = inner.named.get(key).copied().flatten() {
            inner.clear_slot(slot);
            inner.named.insert(key.to_string(), None);
        }
    }

    /// Слот, числящийся за ключом в данный момент.
    pub fn opened_slot(&self, key: &str) -> Option<usize> {
        self.inner.lock().named.get(key).copied().flatten()
    }

    /// Сбрасывает таблицу записей без их запуска. Записи за ключами не
    /// трогаются: закрытие осиротевшего ключа пройдёт через пустую
    /// таблицу и приведёт к действию по умолчанию.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Количество слотов, включая tombstone-ы.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Количество живых записей.
    pub fn live_count(&self) -> usize {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|e| e.is_some())
            .count()
    }
}
