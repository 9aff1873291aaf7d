use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace};

use super::state::{State, StateFn, StateSpec};
use crate::{pubsub::TopicRegistry, stack::ActionStack};

struct ModuleEntry {
    current: Option<String>,
    second: Option<String>,
    states: HashMap<String, State>,
}

/// Трекер состояний логических модулей.
///
/// Каждый модуль регистрирует набор именованных состояний с входными и
/// завершающими callback-ами. Переход прогоняет завершающий callback
/// старого состояния, затем входной нового, после чего рассылает
/// уведомление `модуль:состояние` через реестр тем — подписчики на сам
/// модуль (префикс) получают его наравне с подписчиками точной темы.
///
/// Машина держит и escape-стек поверх того же реестра: хост вешает на
/// него действие по умолчанию (сброс фокуса и т.п.) через
/// [`escape_stack`](Self::escape_stack).
pub struct StateMachine {
    registry: Arc<TopicRegistry>,
    escape: Arc<ActionStack>,
    modules: Mutex<HashMap<String, ModuleEntry>>,
}

impl StateMachine {
    pub fn new(registry: Arc<TopicRegistry>) -> Self {
        let escape = Arc::new(ActionStack::new(registry.clone()));
        Self {
            registry,
            escape,
            modules: Mutex::new(HashMap::new()),
        }
    }

    /// Реестр, через который рассылаются уведомления о переходах.
    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    /// Escape-стек машины.
    pub fn escape_stack(&self) -> &Arc<ActionStack> {
        &self.escape
    }

    /// Регистрирует модуль с набором состояний. `false`, если модуль
    /// уже зарегистрирован.
    pub fn register_module(
        &self,
        module: &str,
        specs: Vec<StateSpec>,
        initial: Option<&str>,
    ) -> bool {
        {
            let mut modules = self.modules.lock();
            if modules.contains_key(module) {
                return false;
            }
            modules.insert(
                module.to_string(),
                ModuleEntry {
                    current: initial.map(str::to_string),
                    second: None,
                    states: HashMap::new(),
                },
            );
        }
        for spec in specs {
            self.create_state_spec(module, spec);
        }
        debug!(module, "module registered");
        true
    }

    /// Добавляет состояние модулю. `false`, если модуль неизвестен или
    /// состояние с таким именем уже есть.
    pub fn create_state(
        &self,
        module: &str,
        name: &str,
        init: Option<Arc<StateFn>>,
        end: Option<Arc<StateFn>>,
    ) -> bool {
        let mut modules = self.modules.lock();
        let Some(entry) = modules.get_mut(module) else {
            return false;
        };
        if entry.states.contains_key(name) {
            return false;
        }
        entry
            .states
            .insert(name.to_string(), State::new(name, init, end));
        true
    }

    fn create_state_spec(&self, module: &str, spec: StateSpec) -> bool {
        let StateSpec { name, init, end } = spec;
        self.create_state(module, &name, init, end)
    }

    pub fn delete_module(&self, module: &str) {
        self.modules.lock().remove(module);
    }

    /// Текущее состояние модуля.
    pub fn current_state(&self, module: &str) -> Option<String> {
        self.modules.lock().get(module)?.current.clone()
    }

    /// Переводит модуль в новое состояние.
    ///
    /// Порядок: завершающий callback старого состояния (если есть),
    /// запись нового, входной callback нового (если есть), затем
    /// публикация `модуль:состояние` с данными перехода.
    pub fn change_state(&self, module: &str, new_state: &str, data: Option<&Value>) {
        let (end_cb, init_cb) = {
            let mut modules = self.modules.lock();
            let Some(entry) = modules.get_mut(module) else {
                trace!(module, "change_state on unknown module ignored");
                return;
            };
            let end_cb = entry
                .current
                .as_deref()
                .and_then(|current| entry.states.get(current))
                .and_then(State::end_callback);
            entry.current = Some(new_state.to_string());
            let init_cb = entry.states.get(new_state).and_then(State::init_callback);
            (end_cb, init_cb)
        };

        if let Some(end) = end_cb {
            end(data);
        }
        if let Some(init) = init_cb {
            init(data);
        }

        let topic = format!("{module}:{new_state}");
        self.registry
            .publish(&topic, data.unwrap_or(&Value::Null));
        debug!(module, state = new_state, "state changed");
    }

    /// Вторичное состояние модуля.
    pub fn second_state(&self, module: &str) -> Option<String> {
        self.modules.lock().get(module)?.second.clone()
    }

    /// Устанавливает вторичное состояние.
    ///
    /// Первая установка запускает только входной callback нового
    /// состояния. Последующие прогоняют завершающий callback текущего
    /// вторичного, затем входной нового; если у текущего вторичного нет
    /// записи состояния, смена пропускается целиком.
    pub fn set_second_state(&self, module: &str, new_state: &str, data: Option<&Value>) {
        let (end_cb, init_cb) = {
            let mut modules = self.modules.lock();
            let Some(entry) = modules.get_mut(module) else {
                return;
            };
            match entry.second.as_deref() {
                None => {
                    entry.second = Some(new_state.to_string());
                    (None, entry.states.get(new_state).and_then(State::init_callback))
                }
                Some(current) => {
                    if !entry.states.contains_key(current) {
                        return;
                    }
                    let end_cb = entry
                        .states
                        .get(current)
                        .and_then(State::end_callback);
                    entry.second = Some(new_state.to_string());
                    let init_cb =
                        entry.states.get(new_state).and_then(State::init_callback);
                    (end_cb, init_cb)
                }
            }
        };

        if let Some(end) = end_cb {
            end(data);
        }
        if let Some(init) = init_cb {
            init(data);
        }
    }
}
